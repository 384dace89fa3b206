//! Scope strategies: from run configuration to an import list.
//!
//! A strategy owns one way of determining which resources are in scope
//! (explicit ids, a resource group, an ARG predicate, or a recorded
//! mapping file). `new_strategy` validates the configuration once and
//! picks the strategy; after that, `list_resource` is the only entry
//! point the caller needs.

use std::fmt;
use std::sync::Arc;

use crate::azgraph::{GraphRow, ResourceGraphClient};
use crate::cancel::CancelToken;
use crate::config::{Config, NamePattern, Platform};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::importlist::ImportList;
use crate::resourceid::{ArmId, ResourceId};
use crate::resourceset::{AzureResource, AzureResourceSet};
use crate::traits::Telemetry;
use crate::typemap::TypeMapper;

pub mod assembler;
mod mapping_file;
mod query;
mod resource;
mod resource_group;

pub use assembler::ImportAssembler;

/// Terraform provider a run targets, validated against the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    AzureRm,
    AzApi,
    AzureAd,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::AzureRm => "azurerm",
            Provider::AzApi => "azapi",
            Provider::AzureAd => "azuread",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handles and settings shared by every strategy
#[derive(Clone)]
pub struct ScopeContext {
    pub provider: Provider,
    pub subscription_id: String,
    pub parallelism: usize,
    pub name_pattern: NamePattern,
    pub mapper: Arc<dyn TypeMapper>,
    pub graph: Option<Arc<dyn ResourceGraphClient>>,
    pub telemetry: Arc<dyn Telemetry>,
}

/// Trait for producing the import list of one scope
pub trait ScopeStrategy: Send + Sync {
    /// Short human-readable description of what is in scope
    fn scope_name(&self) -> String;

    /// Discover the scope's resources and assemble the import list
    fn list_resource(&self, cancel: &CancelToken) -> DiscoveryResult<ImportList>;
}

/// Validate the configuration and construct the strategy it describes.
///
/// Validation order: platform/provider pairing, then exactly one scope
/// descriptor, then platform constraints of the chosen scope, then
/// collaborator availability. Nothing runs past a failed check.
pub fn new_strategy(
    config: &Config,
    mapper: Arc<dyn TypeMapper>,
    graph: Option<Arc<dyn ResourceGraphClient>>,
    telemetry: Arc<dyn Telemetry>,
) -> DiscoveryResult<Box<dyn ScopeStrategy>> {
    let provider = validate_provider(config.platform, &config.provider_name)?;

    let resource_group_name = config
        .resource_group_name
        .as_deref()
        .filter(|name| !name.is_empty());
    let predicate = config.predicate.as_deref().filter(|p| !p.is_empty());

    let descriptors = [
        !config.resource_ids.is_empty(),
        resource_group_name.is_some(),
        predicate.is_some(),
        config.mapping_file.is_some(),
    ];
    match descriptors.iter().filter(|set| **set).count() {
        0 => {
            return Err(DiscoveryError::Configuration(
                "no scope specified: set resource ids, a resource group name, an ARG predicate or a mapping file"
                    .to_string(),
            ));
        }
        1 => {}
        _ => {
            return Err(DiscoveryError::Configuration(
                "conflicting scopes: resource ids, resource group name, ARG predicate and mapping file are mutually exclusive"
                    .to_string(),
            ));
        }
    }

    if resource_group_name.is_some() && config.platform != Platform::Arm {
        return Err(DiscoveryError::Configuration(
            "resource group name can only be specified for platform \"arm\"".to_string(),
        ));
    }
    if predicate.is_some() && config.platform != Platform::Arm {
        return Err(DiscoveryError::Configuration(
            "ARG predicate can only be specified for platform \"arm\"".to_string(),
        ));
    }
    if !config.resource_ids.is_empty()
        && config.platform != Platform::Arm
        && config
            .resource_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .is_none()
    {
        return Err(DiscoveryError::Configuration(
            "TF resource type must be specified for platform other than \"arm\"".to_string(),
        ));
    }

    if resource_group_name.is_some() || predicate.is_some() {
        if graph.is_none() {
            return Err(DiscoveryError::Configuration(
                "Azure Resource Graph discovery requires an access token".to_string(),
            ));
        }
        if config.subscription_id.is_empty() {
            return Err(DiscoveryError::Configuration(
                "subscription id is required for Azure Resource Graph discovery".to_string(),
            ));
        }
    }

    let ctx = ScopeContext {
        provider,
        subscription_id: config.subscription_id.clone(),
        parallelism: config.parallelism,
        name_pattern: config.name_pattern.clone(),
        mapper,
        graph,
        telemetry,
    };

    if !config.resource_ids.is_empty() {
        return Ok(Box::new(resource::ResourceScope::new(
            ctx,
            config.resource_ids.clone(),
            config.resource_type.clone(),
            config.resource_name.clone(),
        )));
    }
    if let Some(name) = resource_group_name {
        return Ok(Box::new(resource_group::ResourceGroupScope::new(
            ctx,
            name.to_string(),
        )));
    }
    if let Some(predicate) = predicate {
        return Ok(Box::new(query::QueryScope::new(ctx, predicate.to_string())));
    }
    if let Some(path) = &config.mapping_file {
        return Ok(Box::new(mapping_file::MappingFileScope::new(
            ctx,
            path.clone(),
        )));
    }

    Err(DiscoveryError::Configuration(
        "invalid scope configuration".to_string(),
    ))
}

fn validate_provider(platform: Platform, provider_name: &str) -> DiscoveryResult<Provider> {
    match (platform, provider_name) {
        (Platform::Arm, "azurerm") => Ok(Provider::AzureRm),
        (Platform::Arm, "azapi") => Ok(Provider::AzApi),
        (Platform::MsGraph, "azuread") => Ok(Provider::AzureAd),
        (Platform::Arm, "azuread") => Err(DiscoveryError::Configuration(
            "provider name expect to be one of \"azurerm\" or \"azapi\" for platform \"arm\""
                .to_string(),
        )),
        (Platform::MsGraph, "azurerm") | (Platform::MsGraph, "azapi") => {
            Err(DiscoveryError::Configuration(
                "provider name expect to be \"azuread\" for platform \"msgraph\"".to_string(),
            ))
        }
        (_, other) => Err(DiscoveryError::UnknownProvider(other.to_string())),
    }
}

/// Refine a discovered set and assemble it for the ARM-platform providers
pub(crate) fn run_arm_pipeline(
    ctx: &ScopeContext,
    mut set: AzureResourceSet,
    assembler: &ImportAssembler<'_>,
    cancel: &CancelToken,
) -> DiscoveryResult<ImportList> {
    set.populate(ctx.mapper.as_ref())?;
    set.reduce()?;
    let resources = match ctx.provider {
        Provider::AzureRm => set.to_tf_azurerm_resources(
            ctx.mapper.clone(),
            ctx.parallelism,
            ctx.telemetry.clone(),
            cancel,
        )?,
        Provider::AzApi => set.to_tf_azapi_resources(),
        Provider::AzureAd => {
            return Err(DiscoveryError::UnknownProvider(
                Provider::AzureAd.name().to_string(),
            ));
        }
    };
    assembler.assemble(&resources, cancel)
}

/// Parse Resource Graph rows into set entries, keeping the row document
/// as the resource's properties
pub(crate) fn resources_from_rows(rows: Vec<GraphRow>) -> DiscoveryResult<Vec<AzureResource>> {
    let mut resources = Vec::with_capacity(rows.len());
    for row in rows {
        let id = ArmId::parse(&row.id)?;
        resources.push(AzureResource::with_properties(ResourceId::Arm(id), row.data));
    }
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azgraph::MockResourceGraphClient;
    use crate::traits::NullTelemetry;
    use crate::typemap::StaticTypeMapper;
    use std::path::PathBuf;

    const DISK_ID: &str =
        "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Compute/disks/disk-1";

    fn strategy_for(config: &Config) -> DiscoveryResult<Box<dyn ScopeStrategy>> {
        new_strategy(
            config,
            Arc::new(StaticTypeMapper::new()),
            None,
            Arc::new(NullTelemetry),
        )
    }

    fn strategy_with_graph(config: &Config) -> DiscoveryResult<Box<dyn ScopeStrategy>> {
        let graph: Arc<dyn ResourceGraphClient> =
            Arc::new(MockResourceGraphClient::with_rows(Vec::new()));
        new_strategy(
            config,
            Arc::new(StaticTypeMapper::new()),
            Some(graph),
            Arc::new(NullTelemetry),
        )
    }

    fn configuration_message(result: DiscoveryResult<Box<dyn ScopeStrategy>>) -> String {
        match result {
            Err(DiscoveryError::Configuration(msg)) => msg,
            Err(other) => panic!("Expected a configuration error, got {:?}", other),
            Ok(_) => panic!("Expected a configuration error, got a strategy"),
        }
    }

    #[test]
    fn test_explicit_ids_select_resource_strategy() {
        let config = Config {
            resource_ids: vec![DISK_ID.to_string()],
            ..Config::default()
        };

        let strategy = strategy_for(&config).unwrap();
        assert_eq!(strategy.scope_name(), DISK_ID);
    }

    #[test]
    fn test_resource_group_selects_group_strategy() {
        let config = Config {
            subscription_id: "sub-1".to_string(),
            resource_group_name: Some("rg-1".to_string()),
            ..Config::default()
        };

        let strategy = strategy_with_graph(&config).unwrap();
        assert_eq!(strategy.scope_name(), "rg-1");
    }

    #[test]
    fn test_predicate_selects_query_strategy() {
        let config = Config {
            subscription_id: "sub-1".to_string(),
            predicate: Some("type =~ 'microsoft.compute/disks'".to_string()),
            ..Config::default()
        };

        let strategy = strategy_with_graph(&config).unwrap();
        assert_eq!(strategy.scope_name(), "type =~ 'microsoft.compute/disks'");
    }

    #[test]
    fn test_mapping_file_selects_mapping_strategy() {
        let config = Config {
            mapping_file: Some(PathBuf::from("/tmp/aztfmap.json")),
            ..Config::default()
        };

        let strategy = strategy_for(&config).unwrap();
        assert_eq!(strategy.scope_name(), "/tmp/aztfmap.json");
    }

    #[test]
    fn test_arm_platform_rejects_azuread_provider() {
        let config = Config {
            provider_name: "azuread".to_string(),
            resource_ids: vec![DISK_ID.to_string()],
            ..Config::default()
        };

        let msg = configuration_message(strategy_for(&config));
        assert_eq!(
            msg,
            "provider name expect to be one of \"azurerm\" or \"azapi\" for platform \"arm\""
        );
    }

    #[test]
    fn test_msgraph_platform_rejects_arm_providers() {
        let config = Config {
            platform: Platform::MsGraph,
            provider_name: "azurerm".to_string(),
            resource_ids: vec!["00000000-0000-0000-0000-000000000001".to_string()],
            ..Config::default()
        };

        let msg = configuration_message(strategy_for(&config));
        assert_eq!(
            msg,
            "provider name expect to be \"azuread\" for platform \"msgraph\""
        );
    }

    #[test]
    fn test_unrecognized_provider_name() {
        let config = Config {
            provider_name: "google".to_string(),
            resource_ids: vec![DISK_ID.to_string()],
            ..Config::default()
        };

        match strategy_for(&config) {
            Err(DiscoveryError::UnknownProvider(name)) => assert_eq!(name, "google"),
            other => panic!("Expected an unknown provider error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_scope_rejected() {
        let config = Config::default();

        let msg = configuration_message(strategy_for(&config));
        assert!(msg.contains("no scope specified"), "got: {}", msg);
    }

    #[test]
    fn test_conflicting_scopes_rejected() {
        let config = Config {
            resource_ids: vec![DISK_ID.to_string()],
            resource_group_name: Some("rg-1".to_string()),
            ..Config::default()
        };

        let msg = configuration_message(strategy_with_graph(&config));
        assert!(msg.contains("mutually exclusive"), "got: {}", msg);
    }

    #[test]
    fn test_group_scope_requires_arm_platform() {
        let config = Config {
            platform: Platform::MsGraph,
            provider_name: "azuread".to_string(),
            resource_group_name: Some("rg-1".to_string()),
            ..Config::default()
        };

        let msg = configuration_message(strategy_with_graph(&config));
        assert_eq!(
            msg,
            "resource group name can only be specified for platform \"arm\""
        );
    }

    #[test]
    fn test_predicate_requires_arm_platform() {
        let config = Config {
            platform: Platform::MsGraph,
            provider_name: "azuread".to_string(),
            predicate: Some("type =~ 'x'".to_string()),
            ..Config::default()
        };

        let msg = configuration_message(strategy_with_graph(&config));
        assert_eq!(msg, "ARG predicate can only be specified for platform \"arm\"");
    }

    #[test]
    fn test_flat_platform_ids_require_explicit_type() {
        let config = Config {
            platform: Platform::MsGraph,
            provider_name: "azuread".to_string(),
            resource_ids: vec!["00000000-0000-0000-0000-000000000001".to_string()],
            ..Config::default()
        };

        let msg = configuration_message(strategy_for(&config));
        assert_eq!(
            msg,
            "TF resource type must be specified for platform other than \"arm\""
        );
    }

    #[test]
    fn test_group_scope_requires_graph_client() {
        let config = Config {
            subscription_id: "sub-1".to_string(),
            resource_group_name: Some("rg-1".to_string()),
            ..Config::default()
        };

        let msg = configuration_message(strategy_for(&config));
        assert!(msg.contains("access token"), "got: {}", msg);
    }

    #[test]
    fn test_graph_scopes_require_a_subscription() {
        let config = Config {
            predicate: Some("type =~ 'x'".to_string()),
            ..Config::default()
        };

        let msg = configuration_message(strategy_with_graph(&config));
        assert!(msg.contains("subscription id"), "got: {}", msg);
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(Provider::AzureRm.name(), "azurerm");
        assert_eq!(Provider::AzApi.name(), "azapi");
        assert_eq!(Provider::AzureAd.to_string(), "azuread");
    }
}
