//! BudgetWise CLI - Personal budgeting with spending forecasts
//!
//! Usage:
//!   budgetwise init                        Initialize database
//!   budgetwise transactions add -a 12 ...  Record a transaction
//!   budgetwise summary                     Balance, categories and budgets
//!   budgetwise serve --port 3000           Start web server

mod cli;
mod commands;


use std::path::PathBuf;

use anyhow::Result;
use budgetwise_core::{AIClient, Session, Settings};
use clap::Parser;
use tracing::warn;
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

    let settings = Settings::load().unwrap_or_else(|e| {
        warn!("Ignoring config file: {}", e);
        Settings::default().with_env_overrides(|key| std::env::var(key).ok())
    });
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.database_path));
    let session = Session::user(cli.user.clone(), None);

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
            dev_admin,
            static_dir,
        } => {
            commands::cmd_serve(
                &db_path,
                cli.no_encrypt,
                commands::ServeOptions {
                    host: &host,
                    port,
                    no_auth,
                    dev_admin,
                    dev_user: &cli.user,
                    static_dir: static_dir.as_deref(),
                },
            )
            .await
        }
        Commands::Categories => commands::cmd_categories(),
        Commands::Transactions { action } => {
            let store = commands::open_store(&db_path, cli.no_encrypt)?;
            match action {
                None => commands::cmd_transactions_list(&store, &session, 20),
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&store, &session, limit)
                }
                Some(TransactionsAction::Add(args)) => {
                    commands::cmd_transactions_add(&store, &session, args.into())
                        .await
                        .map(|_| ())
                }
                Some(TransactionsAction::Update { id, fields }) => {
                    commands::cmd_transactions_update(&store, &session, &id, fields.into()).await
                }
            }
        }
        Commands::Budgets { action } => {
            let store = commands::open_store(&db_path, cli.no_encrypt)?;
            match action {
                None | Some(BudgetsAction::List) => commands::cmd_budgets_list(&store, &session),
                Some(BudgetsAction::Set { category, amount }) => {
                    commands::cmd_budgets_set(&store, &session, category, amount).await
                }
            }
        }
        Commands::Summary { recent } => {
            let store = commands::open_store(&db_path, cli.no_encrypt)?;
            let recent = recent.unwrap_or(settings.recent_transactions);
            commands::cmd_summary(&store, &session, recent)
        }
        Commands::Trend { months } => {
            let store = commands::open_store(&db_path, cli.no_encrypt)?;
            let months = settings.trend_months_or_default(months);
            commands::cmd_trend(&store, &session, months)
        }
        Commands::Forecast { horizon } => {
            let store = commands::open_store(&db_path, cli.no_encrypt)?;
            let horizon = horizon.unwrap_or_else(|| settings.forecast_horizon.clone());
            commands::cmd_forecast(&store, &session, AIClient::from_env(), &horizon).await
        }
        Commands::Status => commands::cmd_status(&db_path, cli.no_encrypt).await,
        Commands::Admin { action } => {
            let store = commands::open_store(&db_path, cli.no_encrypt)?;
            let admin = Session::admin(cli.user.clone(), None);
            match action {
                AdminAction::Overview => commands::cmd_admin_overview(&store, &admin),
                AdminAction::Users => commands::cmd_admin_users(&store, &admin),
            }
        }
    }
}
