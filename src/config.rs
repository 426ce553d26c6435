//! Runtime configuration: the handful of limits and lexer knobs a host can
//! override via a `convo.toml` file or CLI flags, loaded with `serde`/`toml`
//! the way the teacher's engine-wide settings are plain config structs.

use serde::Deserialize;
use std::path::Path;

/// Bounds and lexer knobs for one running program.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Maximum nested function-call depth before a `RuntimeError` is raised
    /// instead of overflowing the host stack.
    pub max_call_depth: usize,
    /// Number of columns one tab character counts for during indentation
    /// measurement (§3 lexing rules).
    pub tab_width: usize,
    /// When true, a keyword spelled with different casing than its
    /// canonical form (e.g. `IF`, `If`) is a `SyntaxError` rather than a
    /// plain identifier.
    pub strict_keywords: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 512,
            tab_width: 4,
            strict_keywords: true,
        }
    }
}

impl RunnerConfig {
    /// Load from a TOML file, falling back to defaults for any field the
    /// file omits. Returns the default configuration unchanged if `path`
    /// does not exist, so a missing `convo.toml` is not an error.
    pub fn load(path: &Path) -> crate::error::ConvoResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::error::ConvoError::runtime(format!("could not read config '{}': {e}", path.display()), 0)
        })?;
        toml::from_str(&text).map_err(|e| {
            crate::error::ConvoError::runtime(format!("invalid config '{}': {e}", path.display()), 0).into()
        })
    }
}
