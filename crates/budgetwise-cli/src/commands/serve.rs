//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};

use super::open_db;

/// HS256 secret for identity tokens
pub const JWT_SECRET_ENV: &str = "BUDGETWISE_JWT_SECRET";
/// Comma-separated CORS origins
pub const ALLOWED_ORIGINS_ENV: &str = "BUDGETWISE_ALLOWED_ORIGINS";
/// Same as --no-auth when set to 1/true/yes
pub const NO_AUTH_ENV: &str = "BUDGETWISE_NO_AUTH";

pub struct ServeOptions<'a> {
    pub host: &'a str,
    pub port: u16,
    pub no_auth: bool,
    pub dev_admin: bool,
    pub dev_user: &'a str,
    pub static_dir: Option<&'a Path>,
}

/// Split a comma-separated env value, dropping blanks
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn cmd_serve(db_path: &Path, no_encrypt: bool, mut opts: ServeOptions<'_>) -> Result<()> {
    if std::env::var(NO_AUTH_ENV).is_ok_and(|v| is_truthy(&v)) {
        opts.no_auth = true;
    }

    println!("🚀 Starting BudgetWise web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", opts.host, opts.port);
    if let Some(dir) = opts.static_dir {
        println!("   Static files: {}", dir.display());
    }

    let jwt_secret = std::env::var(JWT_SECRET_ENV).ok().filter(|s| !s.is_empty());
    let allowed_origins = parse_list(&std::env::var(ALLOWED_ORIGINS_ENV).unwrap_or_default());

    if opts.no_auth {
        println!();
        println!("   ⚠️  Authentication DISABLED - do not expose to network!");
        println!(
            "      Requests act as '{}'{}",
            opts.dev_user,
            if opts.dev_admin { " (admin)" } else { "" }
        );
    } else if jwt_secret.is_some() {
        println!("   🔐 Authentication: identity tokens (HS256, {})", JWT_SECRET_ENV);
    } else {
        println!("   ❌ Authentication: {} not set, every token will be rejected", JWT_SECRET_ENV);
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    let config = budgetwise_server::ServerConfig {
        require_auth: !opts.no_auth,
        allowed_origins,
        jwt_secret,
        dev_user: opts.dev_user.to_string(),
        dev_admin: opts.dev_admin,
    };

    let static_dir_str = opts
        .static_dir
        .map(|p| p.to_str().context("static_dir path must be valid UTF-8"))
        .transpose()?;
    budgetwise_server::serve_with_config(db, opts.host, opts.port, static_dir_str, config).await?;

    Ok(())
}
