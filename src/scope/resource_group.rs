//! Scope over every resource inside one resource group.
//!
//! Discovery goes through Azure Resource Graph; the group's own identity
//! is prepended so the group becomes an import item as well.

use crate::cancel::CancelToken;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::importlist::ImportList;
use crate::resourceid::{ArmId, ResourceId};
use crate::resourceset::{AzureResource, AzureResourceSet};

use super::assembler::ImportAssembler;
use super::{ScopeContext, ScopeStrategy, resources_from_rows, run_arm_pipeline};

pub struct ResourceGroupScope {
    ctx: ScopeContext,
    resource_group_name: String,
}

impl ResourceGroupScope {
    pub fn new(ctx: ScopeContext, resource_group_name: String) -> Self {
        Self {
            ctx,
            resource_group_name,
        }
    }

    fn discover(&self, cancel: &CancelToken) -> DiscoveryResult<AzureResourceSet> {
        let Some(graph) = &self.ctx.graph else {
            return Err(DiscoveryError::Configuration(
                "Azure Resource Graph discovery requires an access token".to_string(),
            ));
        };

        let query = format!(
            "resources | where resourceGroup =~ '{}'",
            self.resource_group_name
        );
        let rows = graph.list_resources(&query, cancel)?;
        let mut resources = resources_from_rows(rows)?;
        resources.sort_by_key(|res| res.id.to_string().to_lowercase());

        let group_id = ArmId::resource_group(&self.ctx.subscription_id, &self.resource_group_name);
        resources.insert(0, AzureResource::new(ResourceId::Arm(group_id)));

        Ok(AzureResourceSet::new(resources))
    }
}

impl ScopeStrategy for ResourceGroupScope {
    fn scope_name(&self) -> String {
        self.resource_group_name.clone()
    }

    fn list_resource(&self, cancel: &CancelToken) -> DiscoveryResult<ImportList> {
        let set = self.discover(cancel)?;
        let assembler = ImportAssembler::new(self.ctx.mapper.as_ref(), &self.ctx.name_pattern);
        run_arm_pipeline(&self.ctx, set, &assembler, cancel)
    }
}
