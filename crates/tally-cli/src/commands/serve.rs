//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::open_db;

pub async fn cmd_serve(
    db_path: &Path,
    host: &str,
    port: u16,
    no_encrypt: bool,
    static_dir: Option<PathBuf>,
    allowed_origins: Vec<String>,
) -> Result<()> {
    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    if let Some(dir) = &static_dir {
        println!("   Static files: {}", dir.display());
    }
    if allowed_origins.is_empty() {
        println!("   🌐 CORS: any origin (use --allow-origin to restrict)");
    } else {
        println!("   🌐 CORS: {}", allowed_origins.join(", "));
    }
    if no_encrypt {
        println!("   ⚠️  Encryption DISABLED (--no-encrypt)");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path, no_encrypt)?;

    // First start on a fresh database installs the default rules
    db.seed_default_rules()
        .context("Failed to seed default rules")?;

    let config = tally_server::ServerConfig {
        allowed_origins,
        static_dir,
    };

    tally_server::serve_with_config(db, host, port, config).await?;

    Ok(())
}
