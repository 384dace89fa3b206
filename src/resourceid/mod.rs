//! Resource identity model covering the two Azure addressing schemes.
//!
//! ARM resources carry hierarchical ids rooted at a scope (tenant,
//! subscription or resource group) followed by a provider route of
//! type/name segment pairs. Microsoft Graph resources carry flat, opaque
//! string ids with no internal structure.

use std::fmt;

/// Error raised when a string is not a valid identifier in its scheme, or
/// when an id cannot be structurally extended.
#[derive(Debug, Clone)]
pub struct ParseIdError {
    pub input: String,
    pub reason: String,
}

impl ParseIdError {
    pub(crate) fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid resource id {:?}: {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Root scope an ARM id is anchored to.
#[derive(Debug, Clone)]
pub enum ArmScope {
    Tenant,
    Subscription {
        subscription_id: String,
    },
    ResourceGroup {
        subscription_id: String,
        name: String,
    },
}

impl PartialEq for ArmScope {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArmScope::Tenant, ArmScope::Tenant) => true,
            (
                ArmScope::Subscription { subscription_id: a },
                ArmScope::Subscription { subscription_id: b },
            ) => a.eq_ignore_ascii_case(b),
            (
                ArmScope::ResourceGroup {
                    subscription_id: a,
                    name: a_name,
                },
                ArmScope::ResourceGroup {
                    subscription_id: b,
                    name: b_name,
                },
            ) => a.eq_ignore_ascii_case(b) && a_name.eq_ignore_ascii_case(b_name),
            _ => false,
        }
    }
}

impl Eq for ArmScope {}

/// One type/name pair of a provider route.
#[derive(Debug, Clone)]
pub struct RouteSegment {
    pub resource_type: String,
    pub resource_name: String,
}

impl PartialEq for RouteSegment {
    fn eq(&self, other: &Self) -> bool {
        self.resource_type.eq_ignore_ascii_case(&other.resource_type)
            && self.resource_name.eq_ignore_ascii_case(&other.resource_name)
    }
}

impl Eq for RouteSegment {}

#[derive(Debug, Clone)]
struct ProviderRoute {
    namespace: String,
    segments: Vec<RouteSegment>,
}

impl PartialEq for ProviderRoute {
    fn eq(&self, other: &Self) -> bool {
        self.namespace.eq_ignore_ascii_case(&other.namespace) && self.segments == other.segments
    }
}

impl Eq for ProviderRoute {}

/// A hierarchical ARM resource id.
///
/// Comparison is ASCII-case-insensitive on every component, matching how
/// the Azure control plane treats ids. Rendering keeps value segments
/// verbatim and canonicalizes the keyword segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmId {
    scope: ArmScope,
    provider: Option<ProviderRoute>,
}

impl ArmId {
    /// Parse the canonical textual form of an ARM id.
    ///
    /// Scope-only ids ("/", "/subscriptions/<id>",
    /// "/subscriptions/<id>/resourceGroups/<name>") are valid; a provider
    /// route must consist of complete type/name pairs.
    pub fn parse(input: &str) -> Result<ArmId, ParseIdError> {
        let Some(rest) = input.strip_prefix('/') else {
            return Err(ParseIdError::new(input, "must begin with '/'"));
        };

        if rest.is_empty() {
            return Ok(ArmId {
                scope: ArmScope::Tenant,
                provider: None,
            });
        }

        let parts: Vec<&str> = rest.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(ParseIdError::new(input, "contains an empty path segment"));
        }

        let mut iter = parts.into_iter().peekable();

        let scope = if iter
            .peek()
            .is_some_and(|p| p.eq_ignore_ascii_case("subscriptions"))
        {
            iter.next();
            let Some(subscription_id) = iter.next() else {
                return Err(ParseIdError::new(input, "missing subscription id"));
            };
            if iter
                .peek()
                .is_some_and(|p| p.eq_ignore_ascii_case("resourcegroups"))
            {
                iter.next();
                let Some(name) = iter.next() else {
                    return Err(ParseIdError::new(input, "missing resource group name"));
                };
                ArmScope::ResourceGroup {
                    subscription_id: subscription_id.to_string(),
                    name: name.to_string(),
                }
            } else {
                ArmScope::Subscription {
                    subscription_id: subscription_id.to_string(),
                }
            }
        } else {
            ArmScope::Tenant
        };

        let provider = match iter.next() {
            None => None,
            Some(keyword) if keyword.eq_ignore_ascii_case("providers") => {
                let Some(namespace) = iter.next() else {
                    return Err(ParseIdError::new(input, "missing provider namespace"));
                };
                let mut segments = Vec::new();
                while let Some(resource_type) = iter.next() {
                    if resource_type.eq_ignore_ascii_case("providers") {
                        return Err(ParseIdError::new(
                            input,
                            "nested provider routes are not supported",
                        ));
                    }
                    let Some(resource_name) = iter.next() else {
                        return Err(ParseIdError::new(
                            input,
                            format!("type segment {:?} has no name", resource_type),
                        ));
                    };
                    segments.push(RouteSegment {
                        resource_type: resource_type.to_string(),
                        resource_name: resource_name.to_string(),
                    });
                }
                if segments.is_empty() {
                    return Err(ParseIdError::new(
                        input,
                        "provider route has no type/name segments",
                    ));
                }
                Some(ProviderRoute {
                    namespace: namespace.to_string(),
                    segments,
                })
            }
            Some(other) => {
                return Err(ParseIdError::new(
                    input,
                    format!("unexpected segment {:?}", other),
                ));
            }
        };

        Ok(ArmId { scope, provider })
    }

    /// Build the id of a resource group directly from its coordinates.
    pub fn resource_group(subscription_id: &str, name: &str) -> ArmId {
        ArmId {
            scope: ArmScope::ResourceGroup {
                subscription_id: subscription_id.to_string(),
                name: name.to_string(),
            },
            provider: None,
        }
    }

    #[allow(dead_code)]
    pub fn scope(&self) -> &ArmScope {
        &self.scope
    }

    /// Provider namespace of the route, if the id carries one.
    #[allow(dead_code)]
    pub fn namespace(&self) -> Option<&str> {
        self.provider.as_ref().map(|r| r.namespace.as_str())
    }

    /// Route segments in order; empty for scope-only ids.
    pub fn segments(&self) -> &[RouteSegment] {
        match &self.provider {
            Some(route) => &route.segments,
            None => &[],
        }
    }

    /// The id of the immediately containing resource, or `None` when no
    /// enclosing resource exists (scope-only ids and single-segment routes).
    pub fn parent(&self) -> Option<ArmId> {
        let route = self.provider.as_ref()?;
        if route.segments.len() < 2 {
            return None;
        }
        let mut parent = self.clone();
        if let Some(route) = parent.provider.as_mut() {
            route.segments.pop();
        }
        Some(parent)
    }

    /// The nearest enclosing scope boundary, or `None` for scope-only ids.
    #[allow(dead_code)]
    pub fn parent_scope(&self) -> Option<ArmId> {
        self.provider.as_ref()?;
        Some(ArmId {
            scope: self.scope.clone(),
            provider: None,
        })
    }

    /// A copy of this id with one more type/name pair appended to the
    /// route. Scope-only ids cannot be extended.
    pub fn child(&self, resource_type: &str, resource_name: &str) -> Result<ArmId, ParseIdError> {
        let mut child = self.clone();
        match child.provider.as_mut() {
            Some(route) => {
                route.segments.push(RouteSegment {
                    resource_type: resource_type.to_string(),
                    resource_name: resource_name.to_string(),
                });
                Ok(child)
            }
            None => Err(ParseIdError::new(
                &self.to_string(),
                "cannot append segments to a scope-level id",
            )),
        }
    }

    /// A copy of this id with the final route segment's type replaced.
    pub fn with_trailing_type(&self, resource_type: &str) -> Result<ArmId, ParseIdError> {
        let mut id = self.clone();
        match id.provider.as_mut().and_then(|r| r.segments.last_mut()) {
            Some(segment) => {
                segment.resource_type = resource_type.to_string();
                Ok(id)
            }
            None => Err(ParseIdError::new(
                &self.to_string(),
                "cannot rewrite the type of a scope-level id",
            )),
        }
    }

    /// Normalized type path of the id, derived from the type segments only.
    ///
    /// Routed ids yield "<namespace>/<type>/<type>/..."; scope-only ids
    /// yield the resource type of the scope itself.
    pub fn type_string(&self) -> String {
        match &self.provider {
            Some(route) => {
                let mut out = route.namespace.clone();
                for segment in &route.segments {
                    out.push('/');
                    out.push_str(&segment.resource_type);
                }
                out
            }
            None => match &self.scope {
                ArmScope::Tenant => "Microsoft.Resources/tenants".to_string(),
                ArmScope::Subscription { .. } => "Microsoft.Resources/subscriptions".to_string(),
                ArmScope::ResourceGroup { .. } => "Microsoft.Resources/resourceGroups".to_string(),
            },
        }
    }

    fn scope_string(&self) -> String {
        match &self.scope {
            ArmScope::Tenant => String::new(),
            ArmScope::Subscription { subscription_id } => {
                format!("/subscriptions/{}", subscription_id)
            }
            ArmScope::ResourceGroup {
                subscription_id,
                name,
            } => format!("/subscriptions/{}/resourceGroups/{}", subscription_id, name),
        }
    }
}

impl fmt::Display for ArmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.scope_string();
        match &self.provider {
            None => {
                if scope.is_empty() {
                    write!(f, "/")
                } else {
                    write!(f, "{}", scope)
                }
            }
            Some(route) => {
                write!(f, "{}/providers/{}", scope, route.namespace)?;
                for segment in &route.segments {
                    write!(f, "/{}/{}", segment.resource_type, segment.resource_name)?;
                }
                Ok(())
            }
        }
    }
}

/// A flat Microsoft Graph resource id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphResourceId(String);

impl GraphResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resource id in either addressing scheme.
///
/// Equality across variants is always false; within a variant it follows
/// the variant's own rules (structural and case-insensitive for ARM,
/// exact string equality for Graph).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceId {
    Arm(ArmId),
    Graph(GraphResourceId),
}

impl ResourceId {
    pub fn parent(&self) -> Option<ResourceId> {
        match self {
            ResourceId::Arm(id) => id.parent().map(ResourceId::Arm),
            ResourceId::Graph(_) => None,
        }
    }

    #[allow(dead_code)]
    pub fn parent_scope(&self) -> Option<ResourceId> {
        match self {
            ResourceId::Arm(id) => id.parent_scope().map(ResourceId::Arm),
            ResourceId::Graph(_) => None,
        }
    }

    /// Type path used for kind classification. Flat ids classify as
    /// themselves.
    pub fn type_string(&self) -> String {
        match self {
            ResourceId::Arm(id) => id.type_string(),
            ResourceId::Graph(id) => id.as_str().to_string(),
        }
    }

    pub fn as_arm(&self) -> Option<&ArmId> {
        match self {
            ResourceId::Arm(id) => Some(id),
            ResourceId::Graph(_) => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Arm(id) => id.fmt(f),
            ResourceId::Graph(id) => id.fmt(f),
        }
    }
}

impl From<ArmId> for ResourceId {
    fn from(id: ArmId) -> Self {
        ResourceId::Arm(id)
    }
}

impl From<GraphResourceId> for ResourceId {
    fn from(id: GraphResourceId) -> Self {
        ResourceId::Graph(id)
    }
}
