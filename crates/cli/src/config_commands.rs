use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use pacer_config::validate::{self, Severity};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Print the resolved configuration with secrets redacted.
    Show,
}

pub fn handle_config(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Check { verbose } => check(path, verbose),
        ConfigAction::Show => show(path),
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn show(path: Option<&Path>) -> Result<()> {
    let config = crate::load_config(path)?;
    print!("{}", pacer_config::render_redacted(&config)?);
    Ok(())
}

fn check(path: Option<&Path>, verbose: bool) -> Result<()> {
    let result = validate::validate(path);

    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        anyhow::bail!("configuration has {errors} error(s)");
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn check_fails_on_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacer.toml");
        std::fs::write(&path, "[pacing]\nwords_per_minute = 0.0\n").unwrap();
        assert!(check(Some(&path), false).is_err());
    }

    #[test]
    fn check_passes_on_mirror_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacer.toml");
        std::fs::write(&path, "[generation]\nbackend = \"mirror\"\n").unwrap();
        check(Some(&path), true).unwrap();
    }

    #[test]
    fn show_renders_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacer.toml");
        std::fs::write(&path, "[agent]\nport = 6000\n").unwrap();
        show(Some(&path)).unwrap();
    }
}
