//! Scope replayed from a previously recorded mapping file.
//!
//! The file fixes types, names and import ids; nothing is rediscovered
//! or reclassified. Keys are walked in sorted order so the list is
//! deterministic for a given file.

use std::path::PathBuf;

use crate::cancel::CancelToken;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::importlist::{ImportItem, ImportList, TfAddr, load_mapping_file};
use crate::resourceid::{ArmId, GraphResourceId, ResourceId};

use super::{Provider, ScopeContext, ScopeStrategy};

pub struct MappingFileScope {
    ctx: ScopeContext,
    path: PathBuf,
}

impl MappingFileScope {
    pub fn new(ctx: ScopeContext, path: PathBuf) -> Self {
        Self { ctx, path }
    }
}

impl ScopeStrategy for MappingFileScope {
    fn scope_name(&self) -> String {
        self.path.display().to_string()
    }

    fn list_resource(&self, cancel: &CancelToken) -> DiscoveryResult<ImportList> {
        let mapping = load_mapping_file(&self.path)?;
        let mut list = ImportList::new();

        for (index, (azure_id, entry)) in mapping.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let azure_id = match self.ctx.provider {
                Provider::AzureAd => ResourceId::Graph(GraphResourceId::new(azure_id.clone())),
                Provider::AzureRm | Provider::AzApi => {
                    ResourceId::Arm(ArmId::parse(azure_id)?)
                }
            };
            let name = if entry.resource_name.is_empty() {
                self.ctx.name_pattern.name_for(index)
            } else {
                entry.resource_name.clone()
            };
            let addr = TfAddr::new(&entry.resource_type, &name);

            list.push(ImportItem {
                azure_id,
                tf_id: entry.resource_id.clone(),
                addr: addr.clone(),
                addr_cache: addr,
                recommended: false,
            });
        }

        Ok(list)
    }
}
