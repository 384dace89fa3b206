//! Conversion of a refined resource set into provider-shaped Terraform
//! resources.
//!
//! The azurerm conversion classifies every non-synthesized resource
//! through the `TypeMapper`, fanning the calls out over a bounded worker
//! pool; the azapi conversion is a uniform passthrough. Both keep the
//! input order, which later address naming depends on.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::cancel::CancelToken;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::resourceid::ResourceId;
use crate::traits::{Telemetry, TraceLevel};
use crate::typemap::{MapperError, TypeMapper};

use super::AzureResourceSet;

/// How a Terraform identity was established for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    /// Automatic classification found exactly one candidate type
    Deduced,
    /// The identity was embedded by a synthesis rule
    Pseudo,
    /// Classification found no candidate, or several; type and id are empty
    Unresolved,
    /// Uniform passthrough onto a single provider type
    Passthrough,
}

/// One resource of the set with its Terraform identity settled
#[derive(Debug, Clone, PartialEq)]
pub struct TfResource {
    pub azure_id: ResourceId,
    pub tf_type: String,
    pub tf_id: String,
    pub kind: MappingKind,
}

impl AzureResourceSet {
    /// Map every resource of the set onto azurerm provider types.
    ///
    /// Synthesized resources already carry their identity and are filled
    /// inline; the rest are classified concurrently, at most `parallelism`
    /// calls in flight. A mapper failure or a cancellation fails the whole
    /// conversion.
    pub fn to_tf_azurerm_resources(
        &self,
        mapper: Arc<dyn TypeMapper>,
        parallelism: usize,
        telemetry: Arc<dyn Telemetry>,
        cancel: &CancelToken,
    ) -> DiscoveryResult<Vec<TfResource>> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(classify_parallel(self, mapper, parallelism, telemetry, cancel))
    }

    /// Map every non-synthesized resource of the set onto `azapi_resource`,
    /// with the ARM id doubling as the Terraform id.
    pub fn to_tf_azapi_resources(&self) -> Vec<TfResource> {
        self.resources
            .iter()
            .filter(|res| res.pseudo.is_none())
            .map(|res| TfResource {
                azure_id: res.id.clone(),
                tf_type: "azapi_resource".to_string(),
                tf_id: res.id.to_string(),
                kind: MappingKind::Passthrough,
            })
            .collect()
    }
}

async fn classify_parallel(
    set: &AzureResourceSet,
    mapper: Arc<dyn TypeMapper>,
    parallelism: usize,
    telemetry: Arc<dyn Telemetry>,
    cancel: &CancelToken,
) -> DiscoveryResult<Vec<TfResource>> {
    // Result slots are pre-sized so concurrent completions land back at
    // their input position.
    let mut slots: Vec<Option<TfResource>> = vec![None; set.resources.len()];
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut handles = Vec::new();

    for (index, res) in set.resources.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }

        if let Some(pseudo) = &res.pseudo {
            slots[index] = Some(TfResource {
                azure_id: res.id.clone(),
                tf_type: pseudo.target_type.clone(),
                tf_id: pseudo.target_id.clone(),
                kind: MappingKind::Pseudo,
            });
            continue;
        }

        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => permit.unwrap(),
            _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
        };

        let mapper = Arc::clone(&mapper);
        let azure_id = res.id.to_string();
        let handle = tokio::task::spawn_blocking(move || {
            let result = mapper.query_type_and_id(&azure_id);
            drop(permit);
            result
        });
        handles.push((index, res.id.to_string(), handle));
    }

    for (index, azure_id, handle) in handles {
        let result = tokio::select! {
            joined = handle => joined.unwrap_or_else(|e| {
                Err(MapperError::Backend(format!("Task panicked: {}", e)))
            }),
            _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
        };
        let candidates =
            result.map_err(|err| DiscoveryError::type_query(azure_id.clone(), err))?;

        let resource = &set.resources[index];
        slots[index] = Some(match candidates.as_slice() {
            [only] => TfResource {
                azure_id: resource.id.clone(),
                tf_type: only.tf_type.clone(),
                tf_id: only.tf_id.clone(),
                kind: MappingKind::Deduced,
            },
            others => {
                telemetry.trace(
                    TraceLevel::Warn,
                    &format!(
                        "classification of {} yielded {} candidate types, leaving it unresolved",
                        azure_id,
                        others.len()
                    ),
                );
                TfResource {
                    azure_id: resource.id.clone(),
                    tf_type: String::new(),
                    tf_id: String::new(),
                    kind: MappingKind::Unresolved,
                }
            }
        });
    }

    debug_assert!(slots.iter().all(Option::is_some));
    Ok(slots.into_iter().flatten().collect())
}
