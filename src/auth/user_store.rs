//! User Storage
//! Mission: Persist identity records with a storage-enforced unique email

use crate::auth::models::{Role, User};
use anyhow::Context;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// How long a writer waits for a competing SQLite lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key")]
    DuplicateKey,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence contract for identity records.
///
/// `insert_unique` must reject a second record with the same email at the
/// storage level, so concurrent registrations cannot both succeed.
pub trait CredentialStore: Send + Sync {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError>;
    fn insert_unique(&self, user: &User) -> Result<(), StoreError>;
}

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn connect(&self) -> anyhow::Result<Connection> {
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("Failed to open auth database at {}", self.db_path))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Initialize database schema
    fn init_db(&self) -> anyhow::Result<()> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                name TEXT,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create users table")?;

        info!("🔐 Auth database ready at {}", self.db_path);
        Ok(())
    }

    fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
        let id: String = row.get(0)?;
        let role: String = row.get(4)?;
        Ok(User {
            id: Uuid::parse_str(&id).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
            })?,
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            role: role.parse::<Role>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
            })?,
            created_at: row.get(5)?,
        })
    }

    fn query_one(&self, sql: &str, key: &str) -> Result<Option<User>, StoreError> {
        let conn = self.connect()?;
        let user = conn
            .query_row(sql, params![key], Self::row_to_user)
            .optional()
            .context("Failed to query users")?;
        Ok(user)
    }
}

impl CredentialStore for UserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.query_one(
            "SELECT id, email, name, password_hash, role, created_at
             FROM users WHERE email = ?1",
            email,
        )
    }

    fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        self.query_one(
            "SELECT id, email, name, password_hash, role, created_at
             FROM users WHERE id = ?1",
            &id.to_string(),
        )
    }

    fn insert_unique(&self, user: &User) -> Result<(), StoreError> {
        let conn = self.connect()?;
        let result = conn.execute(
            "INSERT INTO users (id, email, name, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id.to_string(),
                user.email,
                user.name,
                user.password_hash,
                user.role.as_str(),
                user.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateKey)
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to insert user").into()),
        }
    }
}

/// In-process store keyed by email, for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.lock().is_empty()
    }
}

impl CredentialStore for MemoryUserStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().get(&email.to_lowercase()).cloned())
    }

    fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().values().find(|u| u.id == *id).cloned())
    }

    fn insert_unique(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock();
        let key = user.email.to_lowercase();
        if users.contains_key(&key) {
            return Err(StoreError::DuplicateKey);
        }
        users.insert(key, user.clone());
        Ok(())
    }
}
