mod azgraph;
mod cancel;
mod commands;
mod config;
mod context;
mod error;
mod importlist;
mod output;
mod resourceid;
mod resourceset;
mod scope;
mod traits;
mod typemap;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use cancel::CancelToken;
use commands::DiscoverCommand;
use config::{Config, DEFAULT_NAME_PATTERN, DEFAULT_PARALLELISM, NamePattern, Platform};
use context::Context;

#[derive(Parser)]
#[command(name = "aztfmap")]
#[command(about = "Map Azure resources to Terraform import addresses", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Resource addressing platform
    #[arg(long, global = true, value_enum, default_value_t = Platform::Arm)]
    platform: Platform,

    /// Terraform provider to map for
    #[arg(long, global = true, default_value = "azurerm")]
    provider_name: String,

    /// Azure subscription id
    #[arg(long, global = true, env = "AZTFMAP_SUBSCRIPTION_ID", default_value = "")]
    subscription_id: String,

    /// Bearer token for Azure Resource Graph requests
    #[arg(long, global = true, env = "AZTFMAP_ACCESS_TOKEN")]
    access_token: Option<String>,

    /// Number of in-flight classification calls
    #[arg(long, global = true, default_value_t = DEFAULT_PARALLELISM)]
    parallelism: usize,

    /// Address naming pattern; the last '*' marks where the index goes
    #[arg(long, global = true, default_value = DEFAULT_NAME_PATTERN)]
    name_pattern: String,

    /// Write the assembled list to this mapping file (JSON, or YAML by extension)
    #[arg(long, global = true)]
    generate_mapping_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Map explicitly listed resource ids
    Resource {
        /// Resource ids to map
        #[arg(required = true)]
        ids: Vec<String>,

        /// Terraform resource type overriding automatic classification
        #[arg(long = "type")]
        resource_type: Option<String>,

        /// Address name, honored only for a single id
        #[arg(long = "name")]
        resource_name: Option<String>,
    },

    /// Map every resource inside a resource group
    ResourceGroup {
        /// Resource group name
        name: String,
    },

    /// Map resources matching an Azure Resource Graph predicate
    Query {
        /// ARG `where` predicate
        predicate: String,
    },

    /// Replay a previously recorded mapping file
    MappingFile {
        /// Path to the mapping file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    let ctx = Context::new();

    let mut config = Config {
        platform: cli.global.platform,
        provider_name: cli.global.provider_name,
        subscription_id: cli.global.subscription_id,
        parallelism: cli.global.parallelism,
        name_pattern: NamePattern::parse(&cli.global.name_pattern),
        ..Config::default()
    };
    match cli.command {
        Commands::Resource {
            ids,
            resource_type,
            resource_name,
        } => {
            config.resource_ids = ids;
            config.resource_type = resource_type;
            config.resource_name = resource_name;
        }
        Commands::ResourceGroup { name } => {
            config.resource_group_name = Some(name);
        }
        Commands::Query { predicate } => {
            config.predicate = Some(predicate);
        }
        Commands::MappingFile { path } => {
            config.mapping_file = Some(path);
        }
    }

    let result = DiscoverCommand::execute(
        &ctx,
        &config,
        cli.global.access_token.as_deref(),
        cli.global.generate_mapping_file.as_deref(),
        &cancel,
    );
    ctx.telemetry.close();

    result
}
