//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use budgetwise_core::categories::Category;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// BudgetWise - Track spending against your budgets
#[derive(Parser)]
#[command(name = "budgetwise")]
#[command(about = "Personal budgeting with spending forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (defaults to BUDGETWISE_DB or the config file, then budgetwise.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// User id to act as
    #[arg(short, long, default_value = "local", global = true)]
    pub user: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set BUDGETWISE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// Every request then acts as --user.
        #[arg(long)]
        no_auth: bool,

        /// With --no-auth, give the local user the admin claim
        #[arg(long, requires = "no_auth")]
        dev_admin: bool,

        /// Directory containing static files to serve (e.g., web/dist)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// List categories
    Categories,

    /// Manage transactions (list, add, update)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage budgets (list, set)
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetsAction>,
    },

    /// Show balance, spending by category and budget utilization
    Summary {
        /// Number of recent transactions to show
        #[arg(long)]
        recent: Option<usize>,
    },

    /// Show monthly income and expenses
    Trend {
        /// Number of months (max 24)
        #[arg(short, long)]
        months: Option<usize>,
    },

    /// Predict spending with the configured AI backend
    Forecast {
        /// Horizon label, e.g. "next month" or "next quarter"
        #[arg(long)]
        horizon: Option<String>,
    },

    /// Show database and service status
    Status,

    /// Cross-user views (runs with the admin claim)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

/// Fields shared by `transactions add` and `transactions update`
#[derive(clap::Args)]
pub struct TransactionArgs {
    /// Amount (positive)
    #[arg(short, long)]
    pub amount: Decimal,

    /// Category (e.g. Groceries, Transport, Income)
    #[arg(short, long)]
    pub category: Category,

    /// Merchant or payer
    #[arg(short, long)]
    pub merchant: String,

    /// Date (YYYY-MM-DD, default today)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Record as income instead of an expense
    #[arg(long)]
    pub income: bool,
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Maximum number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Record a transaction
    Add(TransactionArgs),

    /// Replace a transaction
    Update {
        /// Transaction id
        id: String,

        #[command(flatten)]
        fields: TransactionArgs,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// List budgets with spending
    List,

    /// Set the monthly budget for a category
    Set {
        /// Category to budget
        category: Category,

        /// Monthly amount
        amount: Decimal,
    },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// Platform totals
    Overview,

    /// One row per user
    Users,
}
