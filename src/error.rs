use std::fmt;

use crate::resourceid::ParseIdError;
use crate::typemap::MapperError;

/// Error types for the discovery and mapping pipeline
#[derive(Debug)]
pub enum DiscoveryError {
    /// Invalid scope, platform or provider combination; raised before any
    /// discovery work starts
    Configuration(String),

    /// A supplied or extracted string is not a valid id in its scheme
    InvalidResourceId(ParseIdError),

    /// Type classification or id resolution failed for a resource
    TypeQuery {
        azure_id: String,
        source: MapperError,
    },

    /// A scope strategy encountered a provider name it does not recognize
    UnknownProvider(String),

    /// Azure Resource Graph listing failed
    ResourceGraph(String),

    /// The operation was cancelled before completion
    Cancelled,

    /// Two import items computed the same config address
    DuplicateAddress {
        resource_type: String,
        resource_name: String,
    },

    /// General I/O error
    Io(std::io::Error),

    /// Mapping file (de)serialization error
    Serialization(String),
}

impl DiscoveryError {
    pub fn type_query(azure_id: impl Into<String>, source: MapperError) -> Self {
        DiscoveryError::TypeQuery {
            azure_id: azure_id.into(),
            source,
        }
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Configuration(msg) => {
                write!(f, "{}", msg)
            }
            DiscoveryError::InvalidResourceId(err) => {
                write!(f, "{}", err)
            }
            DiscoveryError::TypeQuery { azure_id, source } => {
                write!(f, "querying type mapping for {}: {}", azure_id, source)
            }
            DiscoveryError::UnknownProvider(name) => {
                write!(f, "unknown resource provider type: {}", name)
            }
            DiscoveryError::ResourceGraph(msg) => {
                write!(f, "Azure Resource Graph request failed: {}", msg)
            }
            DiscoveryError::Cancelled => {
                write!(f, "operation cancelled")
            }
            DiscoveryError::DuplicateAddress {
                resource_type,
                resource_name,
            } => {
                write!(
                    f,
                    "duplicate Terraform address: {}.{}",
                    resource_type, resource_name
                )
            }
            DiscoveryError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            DiscoveryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::Io(err) => Some(err),
            DiscoveryError::InvalidResourceId(err) => Some(err),
            DiscoveryError::TypeQuery { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DiscoveryError {
    fn from(err: std::io::Error) -> Self {
        DiscoveryError::Io(err)
    }
}

impl From<ParseIdError> for DiscoveryError {
    fn from(err: ParseIdError) -> Self {
        DiscoveryError::InvalidResourceId(err)
    }
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(err: serde_json::Error) -> Self {
        DiscoveryError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DiscoveryError {
    fn from(err: serde_yaml::Error) -> Self {
        DiscoveryError::Serialization(err.to_string())
    }
}

/// Result type for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
