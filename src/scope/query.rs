//! Scope over an Azure Resource Graph `where` predicate.

use crate::cancel::CancelToken;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::importlist::ImportList;
use crate::resourceset::AzureResourceSet;

use super::assembler::ImportAssembler;
use super::{ScopeContext, ScopeStrategy, resources_from_rows, run_arm_pipeline};

pub struct QueryScope {
    ctx: ScopeContext,
    predicate: String,
}

impl QueryScope {
    pub fn new(ctx: ScopeContext, predicate: String) -> Self {
        Self { ctx, predicate }
    }

    fn discover(&self, cancel: &CancelToken) -> DiscoveryResult<AzureResourceSet> {
        let Some(graph) = &self.ctx.graph else {
            return Err(DiscoveryError::Configuration(
                "Azure Resource Graph discovery requires an access token".to_string(),
            ));
        };

        let query = format!("resources | where {}", self.predicate);
        let rows = graph.list_resources(&query, cancel)?;
        let mut resources = resources_from_rows(rows)?;
        resources.sort_by_key(|res| res.id.to_string().to_lowercase());

        Ok(AzureResourceSet::new(resources))
    }
}

impl ScopeStrategy for QueryScope {
    fn scope_name(&self) -> String {
        self.predicate.clone()
    }

    fn list_resource(&self, cancel: &CancelToken) -> DiscoveryResult<ImportList> {
        let set = self.discover(cancel)?;
        let assembler = ImportAssembler::new(self.ctx.mapper.as_ref(), &self.ctx.name_pattern);
        run_arm_pipeline(&self.ctx, set, &assembler, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azgraph::{GraphRow, MockResourceGraphClient, ResourceGraphClient};
    use crate::config::NamePattern;
    use crate::scope::Provider;
    use crate::traits::NullTelemetry;
    use crate::typemap::StaticTypeMapper;
    use serde_json::json;
    use std::sync::Arc;

    const DISK_A: &str =
        "/subscriptions/sub-1/resourceGroups/rg-2/providers/Microsoft.Compute/disks/disk-a";
    const DISK_B: &str =
        "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Compute/disks/disk-b";

    fn row(id: &str) -> GraphRow {
        GraphRow {
            id: id.to_string(),
            data: json!({"id": id}),
        }
    }

    fn scope_with(rows: Vec<GraphRow>) -> (QueryScope, Arc<MockResourceGraphClient>) {
        let graph = Arc::new(MockResourceGraphClient::with_rows(rows));
        let ctx = ScopeContext {
            provider: Provider::AzureRm,
            subscription_id: "sub-1".to_string(),
            parallelism: 4,
            name_pattern: NamePattern::default(),
            mapper: Arc::new(StaticTypeMapper::new()),
            graph: Some(graph.clone() as Arc<dyn ResourceGraphClient>),
            telemetry: Arc::new(NullTelemetry),
        };
        (
            QueryScope::new(ctx, "type =~ 'microsoft.compute/disks'".to_string()),
            graph,
        )
    }

    #[test]
    fn test_predicate_is_wrapped_in_a_where_query() {
        let (scope, graph) = scope_with(vec![row(DISK_B)]);

        scope.list_resource(&CancelToken::new()).unwrap();

        assert_eq!(
            graph.recorded_queries(),
            vec!["resources | where type =~ 'microsoft.compute/disks'".to_string()]
        );
    }

    #[test]
    fn test_results_sorted_without_group_prepend() {
        let (scope, _) = scope_with(vec![row(DISK_A), row(DISK_B)]);

        let list = scope.list_resource(&CancelToken::new()).unwrap();

        assert_eq!(list.len(), 2);
        // rg-1 sorts before rg-2, so disk-b leads.
        assert_eq!(list[0].tf_id, DISK_B);
        assert_eq!(list[1].tf_id, DISK_A);
        assert_eq!(list[0].addr.to_string(), "azurerm_managed_disk.res-0");
    }

    #[test]
    fn test_empty_result_is_an_empty_list() {
        let (scope, _) = scope_with(Vec::new());

        let list = scope.list_resource(&CancelToken::new()).unwrap();

        assert!(list.is_empty());
    }

    #[test]
    fn test_malformed_row_id_fails() {
        let (scope, _) = scope_with(vec![row("not-an-arm-id")]);

        let result = scope.list_resource(&CancelToken::new());

        assert!(matches!(result, Err(DiscoveryError::InvalidResourceId(_))));
    }

    #[test]
    fn test_scope_name_is_the_predicate() {
        let (scope, _) = scope_with(Vec::new());

        assert_eq!(scope.scope_name(), "type =~ 'microsoft.compute/disks'");
    }
}
