//! Configuration loading, validation, and env substitution.
//!
//! Config files: `pacer.toml`, `pacer.yaml`, or `pacer.json`
//! Searched in `./` then `~/.config/pacer/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
        render_redacted,
    },
    pacer_pacing::PacingConfig,
    schema::{AgentConfig, Backend, DEFAULT_FALLBACK_REPLY, GenerationConfig, PacerConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
