// SPDX-FileCopyrightText: 2026 Pagebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pagebot - multi-tenant chat automation for Messenger pages and webchat.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod admin;
mod flows;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagebot_config::PagebotConfig;
use pagebot_core::types::MatchType;
use pagebot_core::{PagebotError, StorageAdapter};
use pagebot_storage::SqliteStorage;

use crate::flows::InstallOptions;

/// Pagebot - multi-tenant chat automation.
#[derive(Parser, Debug)]
#[command(name = "pagebot", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook and webchat server.
    Serve,
    /// Validate configuration and print a summary.
    Check,
    /// Import a flow JSON file into a page.
    Import {
        /// Page that will own the flow.
        #[arg(long)]
        page: String,
        /// File containing `{"name"?, "nodes", "edges"}`.
        file: PathBuf,
        /// Override the flow name.
        #[arg(long)]
        name: Option<String>,
        /// Use as the page's default flow (also activates it).
        #[arg(long)]
        default: bool,
        /// Make this the page's only active flow.
        #[arg(long)]
        activate: bool,
    },
    /// Built-in starter flows.
    Templates {
        #[command(subcommand)]
        action: Option<TemplateAction>,
    },
    /// Inspect and activate a page's flows.
    Flows {
        #[command(subcommand)]
        action: FlowAction,
    },
    /// Manage a page's keyword triggers.
    Keywords {
        #[command(subcommand)]
        action: KeywordAction,
    },
    /// Tenant message counters.
    Usage {
        #[command(subcommand)]
        action: UsageAction,
    },
}

#[derive(Subcommand, Debug)]
enum FlowAction {
    /// List a page's flows.
    List {
        #[arg(long)]
        page: String,
    },
    /// Make a flow the page's only active flow.
    Activate {
        flow_id: String,
        #[arg(long)]
        page: String,
    },
}

#[derive(Subcommand, Debug)]
enum KeywordAction {
    /// List a page's keywords in evaluation order.
    List {
        #[arg(long)]
        page: String,
    },
    /// Route messages matching KEYWORD into a flow.
    Add {
        keyword: String,
        #[arg(long)]
        page: String,
        /// Target flow id.
        #[arg(long)]
        flow: String,
        /// exact, contains or regex.
        #[arg(long = "match", default_value = "contains")]
        match_type: MatchType,
    },
    /// Delete a keyword by id.
    Delete {
        id: String,
        #[arg(long)]
        page: String,
    },
}

#[derive(Subcommand, Debug)]
enum UsageAction {
    /// Zero a tenant's message counter.
    Reset { tenant: String },
}

#[derive(Subcommand, Debug)]
enum TemplateAction {
    /// List the built-in templates.
    List,
    /// Copy a template into a page.
    Install {
        /// Template id, see `pagebot templates list`.
        id: String,
        #[arg(long)]
        page: String,
        /// Use as the page's default flow.
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => pagebot_config::load_and_validate_path(path),
        None => pagebot_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            pagebot_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli.command, config).await {
        eprintln!("pagebot: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Option<Commands>, config: PagebotConfig) -> Result<(), PagebotError> {
    let command = match command {
        Some(Commands::Serve) => {
            serve::init_tracing(&config.engine.log_level);
            return serve::run_serve(config).await;
        }
        Some(Commands::Check) => {
            print_lines(config_summary(&config));
            return Ok(());
        }
        Some(Commands::Templates {
            action: None | Some(TemplateAction::List),
        }) => {
            print_lines(flows::template_listing());
            return Ok(());
        }
        Some(command) => command,
        None => {
            println!("pagebot: use --help for available commands");
            return Ok(());
        }
    };

    serve::init_tracing(&config.engine.log_level);
    let storage = open_storage(&config).await?;
    let result = run_with_storage(command, &storage).await;
    storage.close().await?;
    print_lines(result?);
    Ok(())
}

/// Commands that read or write the database. Returns the lines to print.
async fn run_with_storage(
    command: Commands,
    storage: &dyn StorageAdapter,
) -> Result<Vec<String>, PagebotError> {
    match command {
        Commands::Import {
            page,
            file,
            name,
            default,
            activate,
        } => {
            let options = InstallOptions { default, activate };
            let record = flows::import_flow(storage, &page, &file, name, options).await?;
            Ok(vec![format!(
                "imported flow {} ({}) into page {page}",
                record.id, record.name
            )])
        }
        Commands::Templates {
            action: Some(TemplateAction::Install { id, page, default }),
        } => {
            let options = InstallOptions {
                default,
                activate: default,
            };
            let record = flows::install_template(storage, &page, &id, options).await?;
            Ok(vec![format!(
                "installed template {id} as flow {} in page {page}",
                record.id
            )])
        }
        Commands::Flows {
            action: FlowAction::List { page },
        } => flows::flow_listing(storage, &page).await,
        Commands::Flows {
            action: FlowAction::Activate { flow_id, page },
        } => {
            flows::activate_flow(storage, &page, &flow_id).await?;
            Ok(vec![format!("flow {flow_id} is now the active flow of page {page}")])
        }
        Commands::Keywords {
            action: KeywordAction::List { page },
        } => admin::keyword_listing(storage, &page).await,
        Commands::Keywords {
            action:
                KeywordAction::Add {
                    keyword,
                    page,
                    flow,
                    match_type,
                },
        } => {
            let rule = admin::add_keyword(storage, &page, &keyword, match_type, &flow).await?;
            Ok(vec![format!("added keyword {} ({match_type} \"{keyword}\" -> {flow})", rule.id)])
        }
        Commands::Keywords {
            action: KeywordAction::Delete { id, page },
        } => {
            admin::delete_keyword(storage, &page, &id).await?;
            Ok(vec![format!("deleted keyword {id}")])
        }
        Commands::Usage {
            action: UsageAction::Reset { tenant },
        } => {
            let previous = admin::reset_usage(storage, &tenant).await?;
            Ok(vec![format!("reset usage of tenant {tenant} (was {previous})")])
        }
        other => Err(PagebotError::Internal(format!(
            "command does not use storage: {other:?}"
        ))),
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

async fn open_storage(config: &PagebotConfig) -> Result<SqliteStorage, PagebotError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

/// Human-readable summary for `pagebot check`. Never prints secrets.
fn config_summary(config: &PagebotConfig) -> Vec<String> {
    let set = |key: &Option<String>| if key.is_some() { "set" } else { "unset" };
    vec![
        "configuration OK".to_string(),
        format!(
            "  server:    {}:{}",
            config.server.bind_address, config.server.port
        ),
        format!("  database:  {}", config.storage.database_path),
        format!(
            "  messenger: graph {} (app secret {})",
            config.messenger.graph_api_version,
            set(&config.messenger.app_secret)
        ),
        format!(
            "  ai:        default model {}, history {} messages",
            config.ai.default_model, config.ai.history_window
        ),
        format!(
            "  keys:      openai {}, anthropic {}, gemini {}",
            set(&config.providers.openai.api_key),
            set(&config.providers.anthropic.api_key),
            set(&config.providers.gemini.api_key)
        ),
        format!(
            "  quota:     starter {}, business {}, pro {}",
            config.quota.starter, config.quota.business, config.quota.pro
        ),
    ]
}
