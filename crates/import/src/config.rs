use serde::Deserialize;

use crate::error::ImportError;
use crate::header::{header_key, DEFAULT_IGNORED_HEADERS};
use crate::model::CanonicalField;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Header texts that never map to a contact field (serial-number columns).
    #[serde(default = "default_ignore_headers")]
    pub ignore_headers: Vec<String>,
    /// Fields whose blank cells inherit the value above (merged-looking cells).
    /// Empty by default: a blank cell is a missing value unless a field opts in.
    #[serde(default)]
    pub fill_down: Vec<CanonicalField>,
    /// How many reconciled rows the one-line summary lists before "+N more".
    #[serde(default = "default_display_limit")]
    pub display_limit: usize,
    #[serde(default)]
    pub commit: CommitConfig,
}

fn default_ignore_headers() -> Vec<String> {
    DEFAULT_IGNORED_HEADERS.iter().map(|s| s.to_string()).collect()
}

fn default_display_limit() -> usize {
    10
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            ignore_headers: default_ignore_headers(),
            fill_down: Vec::new(),
            display_limit: default_display_limit(),
            commit: CommitConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commit endpoint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CommitConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ImportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ImportError> {
        let config: ImportConfig =
            toml::from_str(input).map_err(|e| ImportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if self.display_limit == 0 {
            return Err(ImportError::ConfigValidation(
                "display_limit must be at least 1".into(),
            ));
        }

        if let Some(blank) = self.ignore_headers.iter().find(|h| header_key(h).is_empty()) {
            return Err(ImportError::ConfigValidation(format!(
                "ignore_headers entry {blank:?} has no letters or digits"
            )));
        }

        // An ignored header that is itself a field name would hide a required column
        for field in CanonicalField::ALL {
            if self
                .ignore_headers
                .iter()
                .any(|h| header_key(h) == field.key())
            {
                return Err(ImportError::ConfigValidation(format!(
                    "ignore_headers must not contain the field name '{field}'"
                )));
            }
        }

        if self.commit.timeout_secs == 0 {
            return Err(ImportError::ConfigValidation(
                "commit.timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
