//! The discovered Azure resource set and its two refinement passes.
//!
//! Discovery produces a flat list of Azure resources. Some Azure shapes
//! map to more than one Terraform resource: `populate` synthesizes the
//! managed and association resources implied by the API bodies (VM data
//! disks and their attachments, NIC security-group and application-gateway
//! backend-pool associations). Other Azure shapes map to fewer Terraform
//! resources: `reduce` folds Key Vault key/secret control-plane pairs into
//! the single certificate resource Terraform manages.
//!
//! Both passes read an immutable snapshot of the set and swap in a freshly
//! built list only on success; a failing pass leaves the set untouched.

mod convert;
mod path;

pub use convert::{MappingKind, TfResource};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::resourceid::{ArmId, ParseIdError, ResourceId};
use crate::typemap::TypeMapper;

const VIRTUAL_MACHINES_ROUTE: &str = "MICROSOFT.COMPUTE/VIRTUALMACHINES";
const NETWORK_INTERFACES_ROUTE: &str = "MICROSOFT.NETWORK/NETWORKINTERFACES";
const KEY_VAULT_KEYS_ROUTE: &str = "MICROSOFT.KEYVAULT/VAULTS/KEYS";
const KEY_VAULT_SECRETS_ROUTE: &str = "MICROSOFT.KEYVAULT/VAULTS/SECRETS";

/// Terraform identity embedded in a synthesized association resource
#[derive(Debug, Clone, PartialEq)]
pub struct PseudoResourceInfo {
    pub target_type: String,
    pub target_id: String,
}

/// One discovered Azure resource, optionally carrying its raw API body
/// and, for synthesized resources, the Terraform identity to import under
#[derive(Debug, Clone, PartialEq)]
pub struct AzureResource {
    pub id: ResourceId,
    pub properties: Option<Value>,
    pub pseudo: Option<PseudoResourceInfo>,
}

impl AzureResource {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            properties: None,
            pseudo: None,
        }
    }

    pub fn with_properties(id: ResourceId, properties: Value) -> Self {
        Self {
            id,
            properties: Some(properties),
            pseudo: None,
        }
    }

    fn synthesized(id: ResourceId, target_type: &str, target_id: String) -> Self {
        Self {
            id,
            properties: None,
            pseudo: Some(PseudoResourceInfo {
                target_type: target_type.to_string(),
                target_id,
            }),
        }
    }
}

/// Whether resources of this kind carry synthesis rules that read the API
/// body. Explicit-id discovery uses this to decide when fetching the body
/// pays off.
pub fn requires_properties(id: &ResourceId) -> bool {
    let route = id.type_string().to_uppercase();
    route == VIRTUAL_MACHINES_ROUTE || route == NETWORK_INTERFACES_ROUTE
}

/// The set of resources in scope, owned by one pipeline invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AzureResourceSet {
    pub resources: Vec<AzureResource>,
}

impl AzureResourceSet {
    pub fn new(resources: Vec<AzureResource>) -> Self {
        Self { resources }
    }

    /// Synthesize the managed and association resources implied by the API
    /// bodies in the set. Appends are deduplicated by resource identity, so
    /// running the pass again adds nothing.
    pub fn populate(&mut self, mapper: &dyn TypeMapper) -> DiscoveryResult<()> {
        let mut out = self.resources.clone();

        for res in &self.resources {
            if !route_matches(&res.id, VIRTUAL_MACHINES_ROUTE) {
                continue;
            }
            let ResourceId::Arm(vm_id) = &res.id else {
                continue;
            };
            populate_virtual_machine(res, vm_id, mapper, &mut out)?;
        }

        for res in &self.resources {
            if !route_matches(&res.id, NETWORK_INTERFACES_ROUTE) {
                continue;
            }
            let ResourceId::Arm(nic_id) = &res.id else {
                continue;
            };
            populate_nsg_association(res, nic_id, mapper, &mut out)?;
            populate_backend_pool_association(res, nic_id, mapper, &mut out)?;
        }

        self.resources = out;
        Ok(())
    }

    /// Fold Key Vault key/secret pairs into their certificate resource.
    ///
    /// A key and a secret sharing one vault and one trailing name are the
    /// two control-plane halves of a certificate; the merged resource takes
    /// the position of the later half. Unpaired halves are kept, appended
    /// in first-seen order.
    pub fn reduce(&mut self) -> DiscoveryResult<()> {
        let mut out: Vec<AzureResource> = Vec::new();
        let mut pending: IndexMap<(String, String), AzureResource> = IndexMap::new();

        for res in &self.resources {
            if !route_matches(&res.id, KEY_VAULT_KEYS_ROUTE)
                && !route_matches(&res.id, KEY_VAULT_SECRETS_ROUTE)
            {
                out.push(res.clone());
                continue;
            }
            // A route match implies a routed ARM id with a parent.
            let (Some(arm_id), Some(vault_id)) = (res.id.as_arm(), res.id.parent()) else {
                out.push(res.clone());
                continue;
            };
            let Some(trailing) = arm_id.segments().last() else {
                out.push(res.clone());
                continue;
            };

            let pair_key = (vault_id.to_string().to_uppercase(), trailing.resource_name.clone());
            if pending.shift_remove(&pair_key).is_some() {
                let cert_id = arm_id.with_trailing_type("certificates")?;
                out.push(AzureResource::new(ResourceId::Arm(cert_id)));
            } else {
                pending.insert(pair_key, res.clone());
            }
        }

        for (_, res) in pending {
            out.push(res);
        }

        self.resources = out;
        Ok(())
    }
}

fn route_matches(id: &ResourceId, upper_route: &str) -> bool {
    id.type_string().to_uppercase() == upper_route
}

/// Populate the managed data disks (and their attachments) referenced by a
/// virtual machine body.
fn populate_virtual_machine(
    res: &AzureResource,
    vm_id: &ArmId,
    mapper: &dyn TypeMapper,
    out: &mut Vec<AzureResource>,
) -> DiscoveryResult<()> {
    let disks = extract_ids(res, "properties.storageProfile.dataDisks.#.managedDisk.id")?;
    for disk in &disks {
        append_unique(out, AzureResource::new(ResourceId::Arm(disk.clone())));
    }
    if disks.is_empty() {
        return Ok(());
    }

    // Linux or Windows makes no difference here, the two share an id format.
    let vm_tf_id = mapper
        .query_id(&vm_id.to_string(), "azurerm_linux_virtual_machine")
        .map_err(|err| DiscoveryError::type_query(vm_id.to_string(), err))?;

    for disk in &disks {
        let disk_name = route_name(disk, 0)?;
        let assoc_id = vm_id.child("dataDisks", disk_name)?;
        append_unique(
            out,
            AzureResource::synthesized(
                ResourceId::Arm(assoc_id),
                "azurerm_virtual_machine_data_disk_attachment",
                format!("{}/dataDisks/{}", vm_tf_id, disk_name),
            ),
        );
    }
    Ok(())
}

/// Populate the security-group association of a network interface, if its
/// body references exactly one security group.
fn populate_nsg_association(
    res: &AzureResource,
    nic_id: &ArmId,
    mapper: &dyn TypeMapper,
    out: &mut Vec<AzureResource>,
) -> DiscoveryResult<()> {
    let nsgs = extract_ids(res, "properties.networkSecurityGroup.id")?;
    if nsgs.len() != 1 {
        return Ok(());
    }
    let nsg = &nsgs[0];

    let tf_nic_id = mapper
        .query_id(&nic_id.to_string(), "azurerm_network_interface")
        .map_err(|err| DiscoveryError::type_query(nic_id.to_string(), err))?;
    let tf_nsg_id = mapper
        .query_id(&nsg.to_string(), "azurerm_network_security_group")
        .map_err(|err| DiscoveryError::type_query(nsg.to_string(), err))?;

    // Hypothetical Azure id for the association:
    // <nic id>/networkSecurityGroups/<nsg name>
    let assoc_id = nic_id.child("networkSecurityGroups", route_name(nsg, 0)?)?;
    append_unique(
        out,
        AzureResource::synthesized(
            ResourceId::Arm(assoc_id),
            "azurerm_network_interface_security_group_association",
            format!("{}|{}", tf_nic_id, tf_nsg_id),
        ),
    );
    Ok(())
}

/// Populate the application-gateway backend-pool associations of a network
/// interface, one per pool reference of each ip configuration.
fn populate_backend_pool_association(
    res: &AzureResource,
    nic_id: &ArmId,
    mapper: &dyn TypeMapper,
    out: &mut Vec<AzureResource>,
) -> DiscoveryResult<()> {
    let tf_nic_id = mapper
        .query_id(&nic_id.to_string(), "azurerm_network_interface")
        .map_err(|err| DiscoveryError::type_query(nic_id.to_string(), err))?;

    let ip_configs = extract_ids(res, "properties.ipConfigurations.#.id")?;

    for (index, ip_config) in ip_configs.iter().enumerate() {
        let pool_path = format!(
            "properties.ipConfigurations.{}.properties.applicationGatewayBackendAddressPools.#.id",
            index
        );
        for pool in extract_ids(res, &pool_path)? {
            let gateway_id = pool.parent().ok_or_else(|| {
                DiscoveryError::InvalidResourceId(ParseIdError::new(
                    &pool.to_string(),
                    "backend address pool id has no parent resource",
                ))
            })?;
            let tf_gateway_id = mapper
                .query_id(&gateway_id.to_string(), "azurerm_application_gateway")
                .map_err(|err| DiscoveryError::type_query(gateway_id.to_string(), err))?;

            let pool_name = route_name(&pool, 1)?;
            let ip_config_name = route_name(ip_config, 1)?;
            // Hypothetical Azure id for the association:
            // <ip config id>/backendAddressPools/<pool name>
            let assoc_id = ip_config.child("backendAddressPools", pool_name)?;
            append_unique(
                out,
                AzureResource::synthesized(
                    ResourceId::Arm(assoc_id),
                    "azurerm_network_interface_application_gateway_backend_address_pool_association",
                    format!(
                        "{}/ipConfigurations/{}|{}/backendAddressPools/{}",
                        tf_nic_id, ip_config_name, tf_gateway_id, pool_name
                    ),
                ),
            );
        }
    }
    Ok(())
}

/// Parse the ARM ids referenced at `path` within the resource body.
/// A resource without a body yields no ids.
fn extract_ids(res: &AzureResource, path: &str) -> DiscoveryResult<Vec<ArmId>> {
    let Some(doc) = &res.properties else {
        return Ok(Vec::new());
    };
    let mut ids = Vec::new();
    for raw in path::extract_strings(doc, path) {
        ids.push(ArmId::parse(&raw)?);
    }
    Ok(ids)
}

fn route_name(id: &ArmId, index: usize) -> DiscoveryResult<&str> {
    match id.segments().get(index) {
        Some(segment) => Ok(&segment.resource_name),
        None => Err(DiscoveryError::InvalidResourceId(ParseIdError::new(
            &id.to_string(),
            format!("expected a route of at least {} segments", index + 1),
        ))),
    }
}

fn append_unique(out: &mut Vec<AzureResource>, candidate: AzureResource) {
    if out.iter().any(|existing| existing.id == candidate.id) {
        return;
    }
    out.push(candidate);
}
