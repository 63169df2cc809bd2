//! Configuration validation.
//!
//! Checks a TOML config for syntax errors, unknown (likely misspelled)
//! fields, type errors, and values that would make pacing misbehave.

use std::{collections::HashMap, path::Path};

use crate::schema::{Backend, PacerConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "value", "security", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "pacing.words_per_minute"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    Struct(HashMap::from([
        (
            "agent",
            Struct(HashMap::from([
                ("host", Leaf),
                ("port", Leaf),
                ("path", Leaf),
                ("reconnect_max_backoff_secs", Leaf),
            ])),
        ),
        ("pacing", Struct(HashMap::from([("words_per_minute", Leaf)]))),
        (
            "generation",
            Struct(HashMap::from([
                ("backend", Leaf),
                ("model", Leaf),
                ("api_key", Leaf),
                ("base_url", Leaf),
                ("max_tokens", Leaf),
                ("timeout_secs", Leaf),
                ("persona", Leaf),
                ("fallback_reply", Leaf),
                ("fallback_thinking_secs", Leaf),
            ])),
        ),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any. Ties go to the
/// alphabetically first name.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(c, d)| (*d, *c))
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered config file
/// when `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    match std::fs::read_to_string(&actual_path) {
        Ok(content) if is_toml => {
            let content = crate::env_subst::substitute_env(&content);
            let mut result = validate_toml_str(&content);
            result.config_path = Some(actual_path);
            result
        },
        Ok(_) => {
            let mut result = ValidationResult {
                diagnostics: Vec::new(),
                config_path: Some(actual_path.clone()),
            };
            match crate::loader::load_config(&actual_path) {
                Ok(config) => check_values(&config, &mut result.diagnostics),
                Err(e) => result.diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "type-error",
                    path: String::new(),
                    message: e.to_string(),
                }),
            }
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path),
        },
    }
}

/// Validate a TOML string without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);
    check_backend_name(&toml_value, &mut diagnostics);

    match toml::from_str::<PacerConfig>(toml_str) {
        Ok(config) => check_values(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.get(key.as_str()) {
            Some(child_schema) => {
                check_unknown_fields(child_value, child_schema, &path, diagnostics);
            },
            None => {
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "unknown-field",
                    path,
                    message,
                });
            },
        }
    }
}

fn check_backend_name(value: &toml::Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(name) = value
        .get("generation")
        .and_then(|g| g.get("backend"))
        .and_then(|b| b.as_str())
    else {
        return;
    };

    let known: Vec<&str> = Backend::ALL.iter().map(|b| b.as_str()).collect();
    if known.contains(&name) {
        return;
    }

    let message = match suggest(name, &known, 3) {
        Some(s) => format!("unknown backend \"{name}\" (did you mean \"{s}\"?)"),
        None => format!("unknown backend \"{name}\" (expected one of: {})", known.join(", ")),
    };
    diagnostics.push(Diagnostic {
        severity: Severity::Error,
        category: "value",
        path: "generation.backend".into(),
        message,
    });
}

fn check_values(config: &PacerConfig, diagnostics: &mut Vec<Diagnostic>) {
    let wpm = config.pacing.words_per_minute;
    if !(wpm.is_finite() && wpm > 0.0) {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "value",
            path: "pacing.words_per_minute".into(),
            message: format!("must be a positive number, got {wpm}"),
        });
    }

    if config.agent.port == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "value",
            path: "agent.port".into(),
            message: "port must be non-zero".into(),
        });
    }

    let fallback_secs = config.generation.fallback_thinking_secs;
    if !(fallback_secs.is_finite() && fallback_secs >= 0.0) {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "value",
            path: "generation.fallback_thinking_secs".into(),
            message: format!("must be zero or positive, got {fallback_secs}"),
        });
    }

    if config.generation.fallback_reply.trim().is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "value",
            path: "generation.fallback_reply".into(),
            message: "fallback reply must not be empty".into(),
        });
    }

    let backend = config.generation.backend;
    if backend.is_remote() && !config.generation.has_api_key() {
        let env_hint = backend
            .api_key_env()
            .map(|v| format!("; set {v} in the environment"))
            .unwrap_or_default();
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "security",
            path: "generation.api_key".into(),
            message: format!("no API key configured for {backend}{env_hint}"),
        });
    }

    if config.generation.timeout().is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "value",
            path: "generation.timeout_secs".into(),
            message: "backend calls are unbounded; a stalled request blocks the channel".into(),
        });
    }
}
