//! Assembly of converted resources into import items.
//!
//! The assembler owns the last step every ARM-platform strategy shares:
//! address naming, the explicit type override with its id re-query, and
//! the recommendation flag.

use crate::cancel::CancelToken;
use crate::config::NamePattern;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::importlist::{ImportItem, ImportList, TfAddr};
use crate::resourceset::{MappingKind, TfResource};
use crate::typemap::TypeMapper;

/// The address name for position `index` of a batch. An explicit name
/// wins only for a single-item batch; everything else gets the pattern's
/// indexed name.
pub(crate) fn address_name(
    pattern: &NamePattern,
    explicit: Option<&str>,
    index: usize,
    single: bool,
) -> String {
    if single {
        if let Some(name) = explicit {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }
    pattern.name_for(index)
}

/// Builds import items from converted resources
pub struct ImportAssembler<'a> {
    mapper: &'a dyn TypeMapper,
    pattern: &'a NamePattern,
    explicit_type: Option<&'a str>,
    explicit_name: Option<&'a str>,
}

impl<'a> ImportAssembler<'a> {
    pub fn new(mapper: &'a dyn TypeMapper, pattern: &'a NamePattern) -> Self {
        Self {
            mapper,
            pattern,
            explicit_type: None,
            explicit_name: None,
        }
    }

    /// Set the caller-supplied type and name overrides. Empty strings
    /// count as absent.
    pub fn with_explicit(
        mut self,
        explicit_type: Option<&'a str>,
        explicit_name: Option<&'a str>,
    ) -> Self {
        self.explicit_type = explicit_type.filter(|t| !t.is_empty());
        self.explicit_name = explicit_name.filter(|n| !n.is_empty());
        self
    }

    /// Turn converted resources into import items, in input order.
    ///
    /// `recommended` is set only for automatically classified resources
    /// with no explicit type in play. An explicit type that differs from
    /// the converted one re-queries the import id for that type and
    /// rewrites both the live and the cached address.
    pub fn assemble(
        &self,
        resources: &[TfResource],
        cancel: &CancelToken,
    ) -> DiscoveryResult<ImportList> {
        let single = resources.len() == 1;
        let mut list = ImportList::new();

        for (index, res) in resources.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let name = address_name(self.pattern, self.explicit_name, index, single);
            let addr = TfAddr::new(&res.tf_type, &name);
            let mut item = ImportItem {
                azure_id: res.azure_id.clone(),
                tf_id: res.tf_id.clone(),
                addr: addr.clone(),
                addr_cache: addr,
                recommended: res.kind == MappingKind::Deduced && self.explicit_type.is_none(),
            };

            if let Some(explicit) = self.explicit_type {
                if explicit != res.tf_type {
                    let azure_id = res.azure_id.to_string();
                    let tf_id = self
                        .mapper
                        .query_id(&azure_id, explicit)
                        .map_err(|err| DiscoveryError::type_query(azure_id, err))?;
                    item.tf_id = tf_id;
                    item.addr.tf_type = explicit.to_string();
                    item.addr_cache.tf_type = explicit.to_string();
                    item.recommended = false;
                }
            }

            list.push(item);
        }

        Ok(list)
    }
}
