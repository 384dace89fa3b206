//! Terraform type mapping for ARM resources.
//!
//! `TypeMapper` is the seam between discovery and the classification
//! backend: given a raw ARM id it answers the candidate Terraform types
//! with their import ids, and given an explicit Terraform type it answers
//! the import id alone. `StaticTypeMapper` resolves from a built-in route
//! table and answers the ARM id itself as the import id; implementations
//! backed by provider APIs can be plugged in behind the same trait.

use std::collections::{HashMap, HashSet};
use std::fmt;

use lazy_static::lazy_static;

use crate::resourceid::ArmId;

/// Error types for type mapping operations
#[derive(Debug, Clone)]
pub enum MapperError {
    /// The queried string is not a valid ARM id
    InvalidId(String),

    /// The requested Terraform type is not a known mapping target
    UnknownType(String),

    /// The mapping backend failed
    Backend(String),
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperError::InvalidId(msg) => {
                write!(f, "{}", msg)
            }
            MapperError::UnknownType(tf_type) => {
                write!(f, "unknown Terraform resource type: {}", tf_type)
            }
            MapperError::Backend(msg) => {
                write!(f, "mapping backend error: {}", msg)
            }
        }
    }
}

impl std::error::Error for MapperError {}

/// One candidate mapping of an ARM resource onto a Terraform resource
#[derive(Debug, Clone, PartialEq)]
pub struct TfMapping {
    pub tf_type: String,
    pub tf_id: String,
}

/// Trait for resolving ARM resources to Terraform types and import ids.
///
/// Both operations are idempotent and side-effect-free from the caller's
/// perspective; they are invoked inline and from the bounded
/// classification pool.
pub trait TypeMapper: Send + Sync {
    /// Candidate Terraform mappings for a raw ARM id.
    ///
    /// An empty vector means the resource kind is unknown to the backend;
    /// more than one entry means the kind is ambiguous and needs an
    /// explicit type to settle.
    fn query_type_and_id(&self, azure_id: &str) -> Result<Vec<TfMapping>, MapperError>;

    /// The Terraform import id of `azure_id` under one specific type.
    fn query_id(&self, azure_id: &str, tf_type: &str) -> Result<String, MapperError>;
}

fn build_route_table() -> HashMap<&'static str, &'static [&'static str]> {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();

    // Scopes
    m.insert("MICROSOFT.RESOURCES/SUBSCRIPTIONS", &["azurerm_subscription"]);
    m.insert("MICROSOFT.RESOURCES/RESOURCEGROUPS", &["azurerm_resource_group"]);

    // Compute. Virtual machines stay ambiguous without the API body.
    m.insert(
        "MICROSOFT.COMPUTE/VIRTUALMACHINES",
        &["azurerm_linux_virtual_machine", "azurerm_windows_virtual_machine"],
    );
    m.insert("MICROSOFT.COMPUTE/DISKS", &["azurerm_managed_disk"]);

    // Networking
    m.insert("MICROSOFT.NETWORK/NETWORKINTERFACES", &["azurerm_network_interface"]);
    m.insert(
        "MICROSOFT.NETWORK/NETWORKSECURITYGROUPS",
        &["azurerm_network_security_group"],
    );
    m.insert("MICROSOFT.NETWORK/APPLICATIONGATEWAYS", &["azurerm_application_gateway"]);
    m.insert("MICROSOFT.NETWORK/VIRTUALNETWORKS", &["azurerm_virtual_network"]);
    m.insert("MICROSOFT.NETWORK/VIRTUALNETWORKS/SUBNETS", &["azurerm_subnet"]);
    m.insert("MICROSOFT.NETWORK/PUBLICIPADDRESSES", &["azurerm_public_ip"]);
    m.insert("MICROSOFT.NETWORK/LOADBALANCERS", &["azurerm_lb"]);

    // Storage
    m.insert("MICROSOFT.STORAGE/STORAGEACCOUNTS", &["azurerm_storage_account"]);

    // Key Vault
    m.insert("MICROSOFT.KEYVAULT/VAULTS", &["azurerm_key_vault"]);
    m.insert("MICROSOFT.KEYVAULT/VAULTS/KEYS", &["azurerm_key_vault_key"]);
    m.insert("MICROSOFT.KEYVAULT/VAULTS/SECRETS", &["azurerm_key_vault_secret"]);
    m.insert(
        "MICROSOFT.KEYVAULT/VAULTS/CERTIFICATES",
        &["azurerm_key_vault_certificate"],
    );

    // Containers
    m.insert(
        "MICROSOFT.CONTAINERSERVICE/MANAGEDCLUSTERS",
        &["azurerm_kubernetes_cluster"],
    );

    // App Service. Sites stay ambiguous without the API body.
    m.insert("MICROSOFT.WEB/SERVERFARMS", &["azurerm_service_plan"]);
    m.insert("MICROSOFT.WEB/SITES", &["azurerm_linux_web_app", "azurerm_windows_web_app"]);

    // Observability
    m.insert(
        "MICROSOFT.OPERATIONALINSIGHTS/WORKSPACES",
        &["azurerm_log_analytics_workspace"],
    );

    // Identity
    m.insert(
        "MICROSOFT.MANAGEDIDENTITY/USERASSIGNEDIDENTITIES",
        &["azurerm_user_assigned_identity"],
    );

    m
}

lazy_static! {
    static ref ROUTE_TABLE: HashMap<&'static str, &'static [&'static str]> = build_route_table();
    static ref KNOWN_TF_TYPES: HashSet<&'static str> =
        ROUTE_TABLE.values().flat_map(|types| types.iter().copied()).collect();
}

/// Table-driven mapper keyed by uppercase ARM route strings
pub struct StaticTypeMapper;

impl StaticTypeMapper {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaticTypeMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapper for StaticTypeMapper {
    fn query_type_and_id(&self, azure_id: &str) -> Result<Vec<TfMapping>, MapperError> {
        let id = ArmId::parse(azure_id).map_err(|err| MapperError::InvalidId(err.to_string()))?;
        let route = id.type_string().to_uppercase();
        let candidates = ROUTE_TABLE.get(route.as_str()).copied().unwrap_or(&[]);
        Ok(candidates
            .iter()
            .map(|tf_type| TfMapping {
                tf_type: tf_type.to_string(),
                tf_id: azure_id.to_string(),
            })
            .collect())
    }

    fn query_id(&self, azure_id: &str, tf_type: &str) -> Result<String, MapperError> {
        ArmId::parse(azure_id).map_err(|err| MapperError::InvalidId(err.to_string()))?;
        if !KNOWN_TF_TYPES.contains(tf_type) {
            return Err(MapperError::UnknownType(tf_type.to_string()));
        }
        Ok(azure_id.to_string())
    }
}

/// Mock mapper for testing: answers from the static table, optionally
/// failing every call or delaying it to exercise the classification pool.
#[cfg(test)]
pub struct MockTypeMapper {
    fail: bool,
    delay: Option<std::time::Duration>,
    inner: StaticTypeMapper,
}

#[cfg(test)]
#[allow(dead_code)]
impl MockTypeMapper {
    pub fn new() -> Self {
        Self {
            fail: false,
            delay: None,
            inner: StaticTypeMapper,
        }
    }

    /// A mapper whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            delay: None,
            inner: StaticTypeMapper,
        }
    }

    /// Sleep for `delay` before answering each call
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[cfg(test)]
impl TypeMapper for MockTypeMapper {
    fn query_type_and_id(&self, azure_id: &str) -> Result<Vec<TfMapping>, MapperError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(MapperError::Backend("mock mapper failure".to_string()));
        }
        self.inner.query_type_and_id(azure_id)
    }

    fn query_id(&self, azure_id: &str, tf_type: &str) -> Result<String, MapperError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(MapperError::Backend("mock mapper failure".to_string()));
        }
        self.inner.query_id(azure_id, tf_type)
    }
}
