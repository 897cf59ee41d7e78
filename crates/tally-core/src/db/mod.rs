//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `transactions` - Transaction storage, listing, manual overrides
//! - `transaction_filter` - WHERE clause builder for listings
//! - `rules` - Category rules, ordering, soft delete, default seed
//! - `recategorize` - Atomic recategorization pass over all transactions
//! - `stats` - Summary statistics

use chrono::{DateTime, NaiveDateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::{Error, Result};

mod recategorize;
mod rules;
mod stats;
mod transaction_filter;
mod transactions;

pub use rules::DEFAULT_RULES;
pub use transaction_filter::{FilterResult, TransactionFilter};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable holding the database passphrase
pub const DB_KEY_ENV: &str = "TALLY_DB_KEY";

const POOL_SIZE: u32 = 10;

/// Argon2 salt. Fixed, so a passphrase opens its database wherever the file lives.
const KEY_SALT: &[u8; 16] = b"tally-salt-v1-fx";

/// Stretch a passphrase into the hex key handed to SQLCipher
fn sqlcipher_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    let salt = SaltString::encode_b64(KEY_SALT)
        .map_err(|e| Error::Encryption(format!("Invalid key salt: {}", e)))?;
    let stretched = Argon2::default()
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Key derivation failed: {}", e)))?;
    let output = stretched
        .hash
        .ok_or_else(|| Error::Encryption("Key derivation produced no output".into()))?;

    Ok(hex::encode(output.as_bytes()))
}

/// SQLite `CURRENT_TIMESTAMP` text as UTC; unreadable values fall back to now
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Pooled handle on a Tally database file
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    path: String,
}

impl Database {
    /// Open an encrypted database keyed by `TALLY_DB_KEY`
    pub fn new(path: &str) -> Result<Self> {
        let passphrase = std::env::var(DB_KEY_ENV).map_err(|_| {
            Error::Encryption(format!(
                "{} is not set. Export a passphrase, or pass --no-encrypt to use a plain database.",
                DB_KEY_ENV
            ))
        })?;
        Self::open(path, Some(&passphrase))
    }

    /// Open a plain SQLite database
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::open(path, None)
    }

    /// Open `path`, keying every pooled connection when a passphrase is given,
    /// and bring the schema up to date
    pub fn open(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let builder = Pool::builder().max_size(POOL_SIZE);

        let pool = match passphrase {
            Some(passphrase) => {
                let pragma = format!("PRAGMA key = 'x\"{}\"';", sqlcipher_key(passphrase)?);
                builder.build(manager.with_init(move |conn| conn.execute_batch(&pragma)))?
            }
            None => builder.build(manager)?,
        };

        let db = Self {
            pool,
            path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Location of the database file
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fresh unencrypted database in the temp directory, for tests
    ///
    /// A real file is used since every pooled `:memory:` connection would be
    /// a separate empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(0);

        let file = format!(
            "tally_test_{}_{}.db",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        );
        let path = std::env::temp_dir().join(file);
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Canonical transactions from statement imports
            -- Amounts and balances are decimal strings to keep them exact
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                transaction_date DATE NOT NULL,
                post_date DATE,
                description TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',      -- bank-supplied label (schema 1 only)
                transaction_type TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL,
                memo TEXT,
                auto_category TEXT,                     -- rule engine result
                manual_category TEXT,                   -- user override, wins for display
                balance TEXT,
                check_number TEXT,
                schema_origin TEXT NOT NULL,            -- format1, format2
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(transaction_date);

            -- Category rules, evaluated in position order (first match wins)
            CREATE TABLE IF NOT EXISTS category_rules (
                id INTEGER PRIMARY KEY,
                category_name TEXT NOT NULL,
                pattern TEXT NOT NULL,
                position INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',  -- active, inactive (soft delete)
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_category_rules_order ON category_rules(status, position);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}
