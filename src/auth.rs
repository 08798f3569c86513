use std::fmt;
use std::path::Path;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{info, warn};

/// Shortest password accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name to greet the user with.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Password must be at least {} characters", MIN_PASSWORD_LEN)]
    WeakPassword,
    #[error("An account with this email already exists")]
    EmailInUse,
    #[error("Sign-in was cancelled")]
    PopupClosed,
    #[error("Authentication provider error: {0}")]
    Provider(String),
}

impl From<rusqlite::Error> for AuthError {
    fn from(err: rusqlite::Error) -> Self {
        AuthError::Provider(err.to_string())
    }
}

/// Identity service the app signs users in through.
pub trait AuthProvider: fmt::Debug {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError>;
    fn sign_up(&mut self, email: &str, password: &str, display_name: &str) -> Result<User, AuthError>;
    fn sign_in_with_external_identity(&mut self) -> Result<User, AuthError>;
    fn sign_out(&mut self) -> Result<(), AuthError>;
    /// The user of a previous, still signed-in session.
    fn current_user(&self) -> Result<Option<User>, AuthError>;
}

/// Accounts and the signed-in session stored in a local SQLite database.
///
/// The external identity is the operating-system account running the app.
#[derive(Debug)]
pub struct SqliteAuthProvider {
    conn: Connection,
    external_account: Option<String>,
}

impl SqliteAuthProvider {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AuthError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AuthError::Provider(format!("Failed to create directory: {e}")))?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, AuthError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, AuthError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                display_name TEXT,
                password_hash TEXT,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS auth_session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                signed_in_at TEXT NOT NULL
            );
            "#,
        )?;

        let external_account = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|name| !name.trim().is_empty());

        Ok(Self {
            conn,
            external_account,
        })
    }

    /// Override the OS account used for external sign-in.
    pub fn with_external_account(mut self, account: Option<String>) -> Self {
        self.external_account = account;
        self
    }

    fn find_user(&self, email: &str) -> Result<Option<(User, Option<String>)>, AuthError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, email, display_name, password_hash, created_at FROM users WHERE email = ?1",
                [email],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, email, display_name, hash, created_at)| {
            Ok((
                User {
                    id,
                    email,
                    display_name,
                    created_at: parse_timestamp(&created_at)?,
                },
                hash,
            ))
        })
        .transpose()
    }

    fn insert_user(
        &self,
        email: &str,
        display_name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<User, AuthError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO users (email, display_name, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![email, display_name, password_hash, created_at.to_rfc3339()],
        )?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
            created_at,
        })
    }

    fn start_session(&self, user: &User) -> Result<(), AuthError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO auth_session (id, user_id, signed_in_at) VALUES (1, ?1, ?2)",
            params![user.id, Utc::now().to_rfc3339()],
        )?;
        info!(user_id = user.id, "signed in");
        Ok(())
    }
}

impl AuthProvider for SqliteAuthProvider {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        let Some((user, Some(hash))) = self.find_user(email)? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &hash)? {
            warn!(user_id = user.id, "wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.start_session(&user)?;
        Ok(user)
    }

    fn sign_up(&mut self, email: &str, password: &str, display_name: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if self.find_user(email)?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let hash = hash_password(password)?;
        let display_name = display_name.trim();
        let display_name = (!display_name.is_empty()).then_some(display_name);
        let user = self.insert_user(email, display_name, Some(&hash))?;
        info!(user_id = user.id, "account created");

        self.start_session(&user)?;
        Ok(user)
    }

    fn sign_in_with_external_identity(&mut self) -> Result<User, AuthError> {
        let account = self
            .external_account
            .clone()
            .ok_or_else(|| AuthError::Provider("no operating-system account available".into()))?;
        let email = format!("{account}@localhost");

        let user = match self.find_user(&email)? {
            Some((user, _)) => user,
            None => self.insert_user(&email, Some(&account), None)?,
        };

        self.start_session(&user)?;
        Ok(user)
    }

    fn sign_out(&mut self) -> Result<(), AuthError> {
        self.conn.execute("DELETE FROM auth_session", [])?;
        info!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Result<Option<User>, AuthError> {
        let email: Option<String> = self
            .conn
            .query_row(
                "SELECT u.email FROM auth_session s JOIN users u ON u.id = s.user_id WHERE s.id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match email {
            Some(email) => Ok(self.find_user(&email)?.map(|(user, _)| user)),
            None => Ok(None),
        }
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| AuthError::Provider(format!("bad timestamp {value:?}: {e}")))
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Provider(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::Provider(format!("invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
