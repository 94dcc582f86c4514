//! Engine configuration.
//!
//! Read from a YAML file; every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```yaml
//! default_lang: es
//! cache_ttl_secs: 60
//! exercise_dir: ./exercises
//! messages:
//!   it: Esercizio non trovato
//! log_filter: dojo=debug
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{DojoError, ErrorContext};
use crate::locale::{Locales, DEFAULT_LANG};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub default_lang: String,
    pub cache_ttl_secs: u64,
    pub exercise_dir: Option<PathBuf>,
    /// Per-language overrides of the "exercise not found" text.
    pub messages: BTreeMap<String, String>,
    /// A `tracing` filter directive, used when `DOJO_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_lang: DEFAULT_LANG.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            exercise_dir: None,
            messages: BTreeMap::new(),
            log_filter: None,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, DojoError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| DojoError::Config {
            message: format!("invalid configuration: {e}"),
            ctx: ErrorContext::none(),
            source: Some(Box::new(e)),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DojoError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DojoError::io(format!("cannot read config {}", path.display()), e))?;
        Self::from_yaml_str(&text).map_err(|e| e.with_help(format!("in {}", path.display())))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn locales(&self) -> Locales {
        self.messages
            .iter()
            .fold(Locales::new(&self.default_lang), |locales, (lang, text)| {
                locales.with_message(lang, text.clone())
            })
    }
}
