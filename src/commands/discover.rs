use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};

use crate::azgraph::{ResourceGraphClient, RestResourceGraphClient};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::context::Context;
use crate::importlist::{ImportList, save_mapping_file};
use crate::scope;
use crate::traits::TraceLevel;
use crate::typemap::{StaticTypeMapper, TypeMapper};

pub struct DiscoverCommand;

impl DiscoverCommand {
    /// Execute a discovery run: pick the scope strategy, list the scope
    /// and print the resulting import list
    pub fn execute(
        ctx: &Context,
        config: &Config,
        access_token: Option<&str>,
        generate_mapping_file: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<()> {
        ctx.output.section("Resource Discovery");

        let mapper: Arc<dyn TypeMapper> = Arc::new(StaticTypeMapper::new());
        let graph = access_token.map(|token| {
            Arc::new(RestResourceGraphClient::new(&config.subscription_id, token))
                as Arc<dyn ResourceGraphClient>
        });

        let strategy = scope::new_strategy(config, mapper, graph, ctx.telemetry.clone())
            .context("Invalid run configuration")?;

        ctx.output
            .key_value("Platform", &config.platform.to_string());
        ctx.output.key_value("Provider", &config.provider_name);
        ctx.output
            .key_value_highlight("Scope", &strategy.scope_name());
        ctx.output.blank();

        ctx.telemetry.trace(
            TraceLevel::Info,
            &format!("listing scope {}", strategy.scope_name()),
        );
        let list = strategy.list_resource(cancel).context("Discovery failed")?;
        ctx.telemetry.trace(
            TraceLevel::Info,
            &format!("assembled {} import items", list.len()),
        );

        Self::render(ctx, &list);

        if let Some(path) = generate_mapping_file {
            save_mapping_file(path, &list)
                .with_context(|| format!("Failed to write mapping file {}", path.display()))?;
            ctx.output.blank();
            ctx.output
                .success(&format!("Mapping file written to {}", path.display()));
        }

        Ok(())
    }

    fn render(ctx: &Context, list: &ImportList) {
        if list.is_empty() {
            ctx.output.warning("No resources in scope");
            return;
        }

        ctx.output.table_header(&["Address", "Azure id", "Import id"]);
        let mut unresolved = 0;
        for item in list {
            let addr = if item.is_resolved() {
                item.addr.to_string()
            } else {
                unresolved += 1;
                "(unresolved)".to_string()
            };
            ctx.output
                .table_row(&[&addr, &item.azure_id.to_string(), &item.tf_id]);
        }

        ctx.output.blank();
        ctx.output
            .success(&format!("{} resources mapped", list.len() - unresolved));
        if unresolved > 0 {
            ctx.output.warning(&format!(
                "{} resources could not be classified automatically",
                unresolved
            ));
        }
    }
}
