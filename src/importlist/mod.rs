//! The assembled import list and its on-disk mapping format.
//!
//! An `ImportItem` pairs an Azure identity with the Terraform address and
//! import id it will be imported under. Lists can be written out as a
//! resource-mapping file (JSON or YAML, keyed by Azure id) and replayed
//! later by the mapping-file scope strategy.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::resourceid::ResourceId;

/// A Terraform resource address, rendered `<type>.<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TfAddr {
    pub tf_type: String,
    pub name: String,
}

impl TfAddr {
    pub fn new(tf_type: &str, name: &str) -> Self {
        Self {
            tf_type: tf_type.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for TfAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tf_type, self.name)
    }
}

/// One row of the final import list
#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    /// The Azure identity the row was discovered under
    pub azure_id: ResourceId,

    /// The provider-side import id
    pub tf_id: String,

    /// The address the resource will be imported at
    pub addr: TfAddr,

    /// The address as assigned at assembly time, kept for reference when
    /// the live address is edited downstream
    pub addr_cache: TfAddr,

    /// Whether the type came from automatic classification
    pub recommended: bool,
}

impl ImportItem {
    /// Whether the item carries a usable Terraform type
    pub fn is_resolved(&self) -> bool {
        !self.addr.tf_type.is_empty()
    }
}

/// Ordered sequence of import items, the product of a scope strategy
pub type ImportList = Vec<ImportItem>;

/// One entry of the resource-mapping file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub resource_id: String,
    pub resource_type: String,
    pub resource_name: String,
}

/// Convert an assembled list into its mapping-file form, keyed by Azure id.
/// Unresolved items are kept with an empty `resource_type` so a replayed
/// run sees the same scope.
pub fn to_mapping(list: &ImportList) -> BTreeMap<String, MappingEntry> {
    list.iter()
        .map(|item| {
            (
                item.azure_id.to_string(),
                MappingEntry {
                    resource_id: item.tf_id.clone(),
                    resource_type: item.addr.tf_type.clone(),
                    resource_name: item.addr.name.clone(),
                },
            )
        })
        .collect()
}

/// Read a resource-mapping file, JSON or YAML by extension.
///
/// Two entries claiming the same fully-specified address are rejected;
/// entries with an empty type or name are placeholders the strategy fills
/// in and do not conflict.
pub fn load_mapping_file(path: &Path) -> DiscoveryResult<BTreeMap<String, MappingEntry>> {
    let content = std::fs::read_to_string(path)?;
    let mapping: BTreeMap<String, MappingEntry> = if is_yaml(path) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    let mut seen = HashSet::new();
    for entry in mapping.values() {
        if entry.resource_type.is_empty() || entry.resource_name.is_empty() {
            continue;
        }
        if !seen.insert((entry.resource_type.clone(), entry.resource_name.clone())) {
            return Err(DiscoveryError::DuplicateAddress {
                resource_type: entry.resource_type.clone(),
                resource_name: entry.resource_name.clone(),
            });
        }
    }

    Ok(mapping)
}

/// Write the mapping form of `list` to `path`, JSON or YAML by extension
pub fn save_mapping_file(path: &Path, list: &ImportList) -> DiscoveryResult<()> {
    let mapping = to_mapping(list);
    let content = if is_yaml(path) {
        serde_yaml::to_string(&mapping)?
    } else {
        serde_json::to_string_pretty(&mapping)?
    };
    std::fs::write(path, content)?;
    Ok(())
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
