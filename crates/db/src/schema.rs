//! Idempotent schema provisioning for the auth tables.
//!
//! Every statement is written with `IF NOT EXISTS` semantics so a run against
//! an already-migrated database changes nothing. Steps run in order and the
//! first failing statement aborts the run.

use sqlx::PgPool;

/// A named group of statements applied together.
#[derive(Debug, Clone, Copy)]
pub struct SchemaStep {
    pub name: &'static str,
    pub statements: &'static [&'static str],
}

/// A statement failed; nothing after it was attempted.
#[derive(Debug, thiserror::Error)]
#[error("schema step '{step}' failed: {source}")]
pub struct MigrationError {
    pub step: &'static str,
    #[source]
    pub source: sqlx::Error,
}

/// The ordered list of steps applied by [`ensure_schema`].
///
/// The base `users` / `sessions` tables come first so a fresh database works;
/// on a deployment where the identity subsystem already owns `users`, those
/// statements are no-ops. Column additions are independent of each other.
pub const STEPS: &[SchemaStep] = &[
    SchemaStep {
        name: "users base table",
        statements: &["CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'member',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"],
    },
    SchemaStep {
        name: "sessions table",
        statements: &[
            "CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            "CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at)",
        ],
    },
    SchemaStep {
        name: "user_settings table",
        statements: &["CREATE TABLE IF NOT EXISTS user_settings (
            id BIGSERIAL PRIMARY KEY,
            user_email TEXT NOT NULL UNIQUE,
            settings JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"],
    },
    SchemaStep {
        name: "user_settings email index",
        statements: &[
            "CREATE INDEX IF NOT EXISTS idx_user_settings_user_email ON user_settings(user_email)",
        ],
    },
    SchemaStep {
        name: "users.password_hash",
        statements: &["ALTER TABLE users ADD COLUMN IF NOT EXISTS password_hash TEXT"],
    },
    SchemaStep {
        name: "users.email_verified",
        statements: &[
            "ALTER TABLE users ADD COLUMN IF NOT EXISTS email_verified BOOLEAN DEFAULT false",
        ],
    },
    SchemaStep {
        name: "users password reset columns",
        statements: &["ALTER TABLE users
            ADD COLUMN IF NOT EXISTS reset_token TEXT,
            ADD COLUMN IF NOT EXISTS reset_token_expires TIMESTAMPTZ"],
    },
    SchemaStep {
        name: "users consent columns",
        statements: &["ALTER TABLE users
            ADD COLUMN IF NOT EXISTS accepted_terms BOOLEAN DEFAULT false,
            ADD COLUMN IF NOT EXISTS accepted_terms_at TIMESTAMPTZ,
            ADD COLUMN IF NOT EXISTS accepted_privacy BOOLEAN DEFAULT false,
            ADD COLUMN IF NOT EXISTS accepted_privacy_at TIMESTAMPTZ"],
    },
];

/// Apply every step in [`STEPS`]. Returns the number of steps applied.
pub async fn ensure_schema(pool: &PgPool) -> Result<usize, MigrationError> {
    for (index, step) in STEPS.iter().enumerate() {
        tracing::info!(
            step = step.name,
            progress = %format!("{}/{}", index + 1, STEPS.len()),
            "Applying schema step"
        );
        for statement in step.statements {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|source| {
                    tracing::error!(step = step.name, error = %source, "Schema step failed");
                    MigrationError {
                        step: step.name,
                        source,
                    }
                })?;
        }
    }
    tracing::info!(steps = STEPS.len(), "Schema is up to date");
    Ok(STEPS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_statement_is_idempotent() {
        for step in STEPS {
            for statement in step.statements {
                let upper = statement.to_uppercase();
                if upper.starts_with("ALTER TABLE") {
                    let adds = upper.matches("ADD COLUMN").count();
                    let guarded = upper.matches("ADD COLUMN IF NOT EXISTS").count();
                    assert_eq!(adds, guarded, "unguarded column in step '{}'", step.name);
                } else {
                    assert!(
                        upper.contains("IF NOT EXISTS"),
                        "step '{}' has an unguarded statement",
                        step.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_step_names_are_unique() {
        let mut names: Vec<_> = STEPS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), STEPS.len());
    }
}
