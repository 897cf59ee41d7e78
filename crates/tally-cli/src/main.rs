//! Tally CLI - Bank statement importer and categorizer
//!
//! Usage:
//!   tally init                    Initialize database and default rules
//!   tally import --file CSV       Import a statement (auto-detects layout)
//!   tally rules add NAME PATTERN  Add a category rule
//!   tally serve --port 3000       Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tally_core::models::{RuleStatus, RuleUpdate, TransactionQuery};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file)
        }
        Commands::Transactions {
            transaction_type,
            category,
            from,
            to,
            page,
            per_page,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let query = TransactionQuery {
                transaction_type,
                category,
                start_date: from,
                end_date: to,
                page,
                per_page,
            };
            commands::cmd_transactions_list(&db, &query)
        }
        Commands::Categorize {
            id,
            category,
            clear,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let category = if clear { None } else { category };
            commands::cmd_categorize(&db, id, category.as_deref())
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_rules_list(&db, false),
                Some(RulesAction::List { all }) => commands::cmd_rules_list(&db, all),
                Some(RulesAction::Add {
                    category,
                    pattern,
                    position,
                }) => commands::cmd_rules_add(&db, &category, &pattern, position),
                Some(RulesAction::Update {
                    id,
                    category,
                    pattern,
                    position,
                    activate,
                    deactivate,
                }) => {
                    let status = match (activate, deactivate) {
                        (true, _) => Some(RuleStatus::Active),
                        (_, true) => Some(RuleStatus::Inactive),
                        _ => None,
                    };
                    let update = RuleUpdate {
                        category_name: category,
                        pattern,
                        status,
                        position,
                    };
                    commands::cmd_rules_update(&db, id, update)
                }
                Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&db, id),
                Some(RulesAction::Test { description, memo }) => {
                    commands::cmd_rules_test(&db, &description, memo.as_deref())
                }
            }
        }
        Commands::Recategorize => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_recategorize(&db)
        }
        Commands::Stats { json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_stats(&db, json)
        }
        Commands::Clear { yes } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_clear(&db, yes)
        }
        Commands::Serve {
            port,
            host,
            static_dir,
            allow_origins,
        } => {
            commands::cmd_serve(
                &cli.db,
                &host,
                port,
                cli.no_encrypt,
                static_dir,
                allow_origins,
            )
            .await
        }
    }
}
