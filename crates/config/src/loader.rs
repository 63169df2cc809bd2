use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::PacerConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["pacer.toml", "pacer.yaml", "pacer.yml", "pacer.json"];

const REDACTED: &str = "[REDACTED]";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PacerConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./pacer.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/pacer/pacer.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PacerConfig::default()` if no config file is found or the file
/// fails to parse.
pub fn discover_and_load() -> PacerConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    PacerConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/pacer/
    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/pacer/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pacer").map(|d| d.config_dir().to_path_buf())
}

/// Apply process-environment overrides on top of a loaded config.
///
/// `HOST`, `PORT` and `PACER_WPM` replace file values. The backend API key
/// variable (`ANTHROPIC_API_KEY` / `OPENAI_API_KEY`) is only used when the
/// file supplies no key.
pub fn apply_env_overrides(config: PacerConfig) -> PacerConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: PacerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> PacerConfig {
    if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
        config.agent.host = host.trim().to_string();
    }

    if let Some(raw) = lookup("PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) => config.agent.port = port,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid PORT"),
        }
    }

    if let Some(raw) = lookup("PACER_WPM") {
        match raw.trim().parse::<f64>() {
            Ok(wpm) if wpm > 0.0 && wpm.is_finite() => config.pacing.words_per_minute = wpm,
            _ => warn!(value = %raw, "ignoring invalid PACER_WPM"),
        }
    }

    if !config.generation.has_api_key()
        && let Some(var) = config.generation.backend.api_key_env()
        && let Some(key) = lookup(var).filter(|k| !k.trim().is_empty())
    {
        debug!(var, "using API key from environment");
        config.generation.api_key = Some(Secret::new(key));
    }

    config
}

/// Serialize `config` to TOML with secrets replaced by a placeholder.
pub fn render_redacted(config: &PacerConfig) -> anyhow::Result<String> {
    let mut redacted = config.clone();
    if redacted.generation.api_key.is_some() {
        redacted.generation.api_key = Some(Secret::new(REDACTED.into()));
    }
    toml::to_string_pretty(&redacted).map_err(|e| anyhow::anyhow!("serialize config: {e}"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PacerConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, crate::schema::Backend, secrecy::ExposeSecret};

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacer.toml");
        std::fs::write(&path, "[agent]\nport = 6000\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.agent.port, 6000);
    }

    #[test]
    fn loads_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("pacer.yaml");
        std::fs::write(&yaml, "pacing:\n  words_per_minute: 55\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().pacing.words_per_minute, 55.0);

        let json = dir.path().join("pacer.json");
        std::fs::write(&json, r#"{"generation": {"backend": "mirror"}}"#).unwrap();
        assert_eq!(load_config(&json).unwrap().generation.backend, Backend::Mirror);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacer.ini");
        std::fs::write(&path, "port=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn env_overrides_replace_transport_and_pacing() {
        let cfg = apply_env_overrides_with(
            PacerConfig::default(),
            env(&[("HOST", "0.0.0.0"), ("PORT", "5381"), ("PACER_WPM", "90")]),
        );
        assert_eq!(cfg.agent.host, "0.0.0.0");
        assert_eq!(cfg.agent.port, 5381);
        assert_eq!(cfg.pacing.words_per_minute, 90.0);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let cfg = apply_env_overrides_with(
            PacerConfig::default(),
            env(&[("PORT", "not-a-port"), ("PACER_WPM", "-3")]),
        );
        assert_eq!(cfg.agent.port, 5380);
        assert_eq!(cfg.pacing.words_per_minute, 70.0);
    }

    #[test]
    fn api_key_env_only_fills_missing_key() {
        let cfg = apply_env_overrides_with(
            PacerConfig::default(),
            env(&[("ANTHROPIC_API_KEY", "sk-env")]),
        );
        assert_eq!(
            cfg.generation.api_key.as_ref().unwrap().expose_secret(),
            "sk-env"
        );

        let mut configured = PacerConfig::default();
        configured.generation.api_key = Some(Secret::new("sk-file".into()));
        let cfg = apply_env_overrides_with(configured, env(&[("ANTHROPIC_API_KEY", "sk-env")]));
        assert_eq!(
            cfg.generation.api_key.as_ref().unwrap().expose_secret(),
            "sk-file"
        );
    }

    #[test]
    fn api_key_env_follows_backend() {
        let mut cfg = PacerConfig::default();
        cfg.generation.backend = Backend::Openai;
        let cfg = apply_env_overrides_with(
            cfg,
            env(&[("ANTHROPIC_API_KEY", "sk-ant"), ("OPENAI_API_KEY", "sk-oai")]),
        );
        assert_eq!(
            cfg.generation.api_key.as_ref().unwrap().expose_secret(),
            "sk-oai"
        );
    }

    #[test]
    fn redacted_render_hides_api_key() {
        let mut cfg = PacerConfig::default();
        cfg.generation.api_key = Some(Secret::new("sk-very-secret".into()));
        let rendered = render_redacted(&cfg).unwrap();
        assert!(!rendered.contains("sk-very-secret"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("[agent]"));
    }
}
