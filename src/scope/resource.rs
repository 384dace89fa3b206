//! Scope over explicitly listed resource ids.
//!
//! On the ARM platform the ids are parsed, optionally hydrated with
//! their API bodies so synthesis rules can run, and pushed through the
//! full refinement pipeline. On the flat platform the ids are taken
//! verbatim under the caller's explicit type.

use crate::cancel::CancelToken;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::importlist::{ImportItem, ImportList, TfAddr};
use crate::resourceid::{ArmId, GraphResourceId, ResourceId};
use crate::resourceset::{AzureResource, AzureResourceSet, requires_properties};

use super::assembler::{ImportAssembler, address_name};
use super::{Provider, ScopeContext, ScopeStrategy, run_arm_pipeline};

pub struct ResourceScope {
    ctx: ScopeContext,
    resource_ids: Vec<String>,
    resource_type: Option<String>,
    resource_name: Option<String>,
}

impl ResourceScope {
    pub fn new(
        ctx: ScopeContext,
        resource_ids: Vec<String>,
        resource_type: Option<String>,
        resource_name: Option<String>,
    ) -> Self {
        Self {
            ctx,
            resource_ids,
            resource_type: resource_type.filter(|t| !t.is_empty()),
            resource_name: resource_name.filter(|n| !n.is_empty()),
        }
    }

    /// Flat-platform listing: the ids are opaque, the type is the
    /// caller's explicit one and the import id is the resource id itself.
    fn list_flat(&self, cancel: &CancelToken) -> DiscoveryResult<ImportList> {
        let tf_type = self.resource_type.as_deref().unwrap_or_default();
        let single = self.resource_ids.len() == 1;
        let mut list = ImportList::new();

        for (index, id) in self.resource_ids.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }
            let name = address_name(
                &self.ctx.name_pattern,
                self.resource_name.as_deref(),
                index,
                single,
            );
            let addr = TfAddr::new(tf_type, &name);
            list.push(ImportItem {
                azure_id: ResourceId::Graph(GraphResourceId::new(id.clone())),
                tf_id: id.clone(),
                addr: addr.clone(),
                addr_cache: addr,
                recommended: false,
            });
        }

        Ok(list)
    }

    fn list_arm(&self, cancel: &CancelToken) -> DiscoveryResult<ImportList> {
        let mut resources = Vec::with_capacity(self.resource_ids.len());
        for raw in &self.resource_ids {
            let id = ArmId::parse(raw)?;
            resources.push(AzureResource::new(ResourceId::Arm(id)));
        }
        let mut set = AzureResourceSet::new(resources);
        self.hydrate_properties(&mut set, cancel)?;

        let assembler = ImportAssembler::new(self.ctx.mapper.as_ref(), &self.ctx.name_pattern)
            .with_explicit(self.resource_type.as_deref(), self.resource_name.as_deref());
        run_arm_pipeline(&self.ctx, set, &assembler, cancel)
    }

    /// Fetch API bodies for resources whose synthesis rules need them.
    /// Without a Resource Graph client the bodies stay unset and the
    /// rules skip.
    fn hydrate_properties(
        &self,
        set: &mut AzureResourceSet,
        cancel: &CancelToken,
    ) -> DiscoveryResult<()> {
        let Some(graph) = &self.ctx.graph else {
            return Ok(());
        };

        for res in &mut set.resources {
            if res.properties.is_some() || !requires_properties(&res.id) {
                continue;
            }
            let query = format!("resources | where id =~ '{}'", res.id);
            let rows = graph.list_resources(&query, cancel)?;
            if let Some(row) = rows.into_iter().next() {
                res.properties = Some(row.data);
            }
        }

        Ok(())
    }
}

impl ScopeStrategy for ResourceScope {
    fn scope_name(&self) -> String {
        match self.resource_ids.as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            [first, ..] => format!("{} and more...", first),
        }
    }

    fn list_resource(&self, cancel: &CancelToken) -> DiscoveryResult<ImportList> {
        match self.ctx.provider {
            Provider::AzureAd => self.list_flat(cancel),
            Provider::AzureRm | Provider::AzApi => self.list_arm(cancel),
        }
    }
}
