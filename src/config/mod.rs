//! Run configuration consumed by the discovery pipeline.
//!
//! The CLI assembles a `Config` from flags and environment; strategy
//! selection validates it once, before any discovery starts.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

/// Fallback number of in-flight classification calls
pub const DEFAULT_PARALLELISM: usize = 10;

/// Fallback address naming pattern
pub const DEFAULT_NAME_PATTERN: &str = "res-";

/// Resource addressing platform a run targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    /// Azure Resource Manager, hierarchical ids
    Arm,
    /// Microsoft Graph, flat ids
    #[value(name = "msgraph")]
    MsGraph,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Arm => f.write_str("arm"),
            Platform::MsGraph => f.write_str("msgraph"),
        }
    }
}

/// Address naming pattern, expanding to `<prefix><index><suffix>`.
///
/// The pattern splits at its last `*`, which marks where the zero-based
/// index goes; without a `*` the whole pattern is the prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    prefix: String,
    suffix: String,
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.rfind('*') {
            Some(pos) => Self {
                prefix: pattern[..pos].to_string(),
                suffix: pattern[pos + 1..].to_string(),
            },
            None => Self {
                prefix: pattern.to_string(),
                suffix: String::new(),
            },
        }
    }

    /// The address name for position `index` within a batch
    pub fn name_for(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, index, self.suffix)
    }
}

impl Default for NamePattern {
    fn default() -> Self {
        Self::parse(DEFAULT_NAME_PATTERN)
    }
}

/// Everything a run needs to know, validated by strategy selection.
///
/// Exactly one scope descriptor may be set: explicit `resource_ids`, a
/// `resource_group_name`, a `predicate`, or a `mapping_file`.
#[derive(Debug, Clone)]
pub struct Config {
    pub platform: Platform,
    pub provider_name: String,
    pub subscription_id: String,
    pub parallelism: usize,
    pub name_pattern: NamePattern,

    pub resource_ids: Vec<String>,
    /// Explicit address name, honored only for a single-id scope
    pub resource_name: Option<String>,
    /// Explicit Terraform type overriding automatic classification
    pub resource_type: Option<String>,
    pub resource_group_name: Option<String>,
    pub predicate: Option<String>,
    pub mapping_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: Platform::Arm,
            provider_name: "azurerm".to_string(),
            subscription_id: String::new(),
            parallelism: DEFAULT_PARALLELISM,
            name_pattern: NamePattern::default(),
            resource_ids: Vec::new(),
            resource_name: None,
            resource_type: None,
            resource_group_name: None,
            predicate: None,
            mapping_file: None,
        }
    }
}
