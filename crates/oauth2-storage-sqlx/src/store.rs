use async_trait::async_trait;
use oauth2_core::{AccessToken, StoreError};
use oauth2_ports::AccessTokenStore;
use sqlx::{Pool, Postgres, Sqlite};
use std::borrow::Cow;
use std::path::PathBuf;

const SELECT_COLUMNS: &str = "SELECT id, token, refresh_token, client_id, resource_owner_id, \
     scopes, expires_at, revoked_at, created_at FROM access_tokens";

#[derive(Clone, Debug)]
enum DatabasePool {
    Sqlite(Pool<Sqlite>),
    Postgres(Pool<Postgres>),
}

/// SQL-backed access token store (SQLite/Postgres) using SQLx.
///
/// Uniqueness of `token` and `refresh_token` is enforced by unique indexes, so
/// the check and the write are a single statement.
pub struct SqlxAccessTokenStore {
    pool: DatabasePool,
}

impl SqlxAccessTokenStore {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = if database_url.starts_with("postgres") {
            DatabasePool::Postgres(Pool::<Postgres>::connect(database_url).await?)
        } else {
            // Best-effort: a missing parent directory or file is reported by
            // sqlx on connect if we cannot create it here.
            if let Some(path) = sqlite_db_path(database_url) {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        let _ = std::fs::create_dir_all(parent);
                    }
                }
                if !path.as_os_str().is_empty() && !path.exists() {
                    let _ = std::fs::File::create(&path);
                }
            }

            let connect_url = sqlite_url_with_create_mode(database_url);
            DatabasePool::Sqlite(Pool::<Sqlite>::connect(connect_url.as_ref()).await?)
        };

        Ok(Self { pool })
    }

    async fn bootstrap_sqlite_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS access_tokens (
                id TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                refresh_token TEXT,
                client_id TEXT,
                resource_owner_id TEXT,
                scopes TEXT,
                expires_at TEXT,
                revoked_at TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        for statement in INDEXES {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    async fn bootstrap_postgres_schema(pool: &Pool<Postgres>) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS access_tokens (
                id TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                refresh_token TEXT,
                client_id TEXT,
                resource_owner_id TEXT,
                scopes TEXT,
                expires_at TIMESTAMPTZ,
                revoked_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        for statement in INDEXES {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    async fn fetch_one_by(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<AccessToken>, StoreError> {
        let token = match &self.pool {
            DatabasePool::Sqlite(pool) => {
                let sql = format!("{SELECT_COLUMNS} WHERE {column} = ?");
                sqlx::query_as::<_, AccessToken>(&sql)
                    .bind(value)
                    .fetch_optional(pool)
                    .await?
            }
            DatabasePool::Postgres(pool) => {
                let sql = format!("{SELECT_COLUMNS} WHERE {column} = $1");
                sqlx::query_as::<_, AccessToken>(&sql)
                    .bind(value)
                    .fetch_optional(pool)
                    .await?
            }
        };

        Ok(token)
    }
}

// Unique indexes make a colliding insert fail atomically. NULL refresh tokens
// never collide with each other.
const INDEXES: [&str; 4] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_access_tokens_token ON access_tokens(token)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_access_tokens_refresh_token ON access_tokens(refresh_token)",
    "CREATE INDEX IF NOT EXISTS idx_access_tokens_client_id ON access_tokens(client_id)",
    "CREATE INDEX IF NOT EXISTS idx_access_tokens_resource_owner_id ON access_tokens(resource_owner_id)",
];

#[async_trait]
impl AccessTokenStore for SqlxAccessTokenStore {
    async fn init(&self) -> Result<(), StoreError> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => Self::bootstrap_sqlite_schema(pool).await?,
            DatabasePool::Postgres(pool) => Self::bootstrap_postgres_schema(pool).await?,
        }
        Ok(())
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        // Keep readiness/liveness cheap: don't run bootstrap.
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }

        Ok(())
    }

    async fn insert(&self, token: &AccessToken) -> Result<(), StoreError> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO access_tokens (id, token, refresh_token, client_id, resource_owner_id, scopes, expires_at, revoked_at, created_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&token.id)
                .bind(&token.token)
                .bind(&token.refresh_token)
                .bind(&token.client_id)
                .bind(&token.resource_owner_id)
                .bind(&token.scopes)
                .bind(token.expires_at)
                .bind(token.revoked_at)
                .bind(token.created_at)
                .execute(pool)
                .await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO access_tokens (id, token, refresh_token, client_id, resource_owner_id, scopes, expires_at, revoked_at, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    "#,
                )
                .bind(&token.id)
                .bind(&token.token)
                .bind(&token.refresh_token)
                .bind(&token.client_id)
                .bind(&token.resource_owner_id)
                .bind(&token.scopes)
                .bind(token.expires_at)
                .bind(token.revoked_at)
                .bind(token.created_at)
                .execute(pool)
                .await?;
            }
        }

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<AccessToken>, StoreError> {
        self.fetch_one_by("token", token).await
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<AccessToken>, StoreError> {
        self.fetch_one_by("refresh_token", refresh_token).await
    }

    async fn update(&self, token: &AccessToken) -> Result<(), StoreError> {
        let result = match &self.pool {
            DatabasePool::Sqlite(pool) => sqlx::query(
                r#"
                UPDATE access_tokens
                SET token = ?, refresh_token = ?, client_id = ?, resource_owner_id = ?, scopes = ?,
                    expires_at = ?, revoked_at = ?, created_at = ?
                WHERE id = ?
                "#,
            )
            .bind(&token.token)
            .bind(&token.refresh_token)
            .bind(&token.client_id)
            .bind(&token.resource_owner_id)
            .bind(&token.scopes)
            .bind(token.expires_at)
            .bind(token.revoked_at)
            .bind(token.created_at)
            .bind(&token.id)
            .execute(pool)
            .await?
            .rows_affected(),
            DatabasePool::Postgres(pool) => sqlx::query(
                r#"
                UPDATE access_tokens
                SET token = $1, refresh_token = $2, client_id = $3, resource_owner_id = $4, scopes = $5,
                    expires_at = $6, revoked_at = $7, created_at = $8
                WHERE id = $9
                "#,
            )
            .bind(&token.token)
            .bind(&token.refresh_token)
            .bind(&token.client_id)
            .bind(&token.resource_owner_id)
            .bind(&token.scopes)
            .bind(token.expires_at)
            .bind(token.revoked_at)
            .bind(token.created_at)
            .bind(&token.id)
            .execute(pool)
            .await?
            .rows_affected(),
        };

        if result == 0 {
            return Err(StoreError::Backend(format!(
                "access token {} does not exist",
                token.id
            )));
        }
        Ok(())
    }

    async fn delete(&self, token: &AccessToken) -> Result<(), StoreError> {
        match &self.pool {
            DatabasePool::Sqlite(pool) => {
                sqlx::query("DELETE FROM access_tokens WHERE id = ?")
                    .bind(&token.id)
                    .execute(pool)
                    .await?;
            }
            DatabasePool::Postgres(pool) => {
                sqlx::query("DELETE FROM access_tokens WHERE id = $1")
                    .bind(&token.id)
                    .execute(pool)
                    .await?;
            }
        }

        Ok(())
    }
}

fn sqlite_db_path(database_url: &str) -> Option<PathBuf> {
    if !database_url.starts_with("sqlite:") || database_url.starts_with("sqlite::memory:") {
        return None;
    }

    let mut rest = &database_url["sqlite:".len()..];

    // Reduce multiple leading slashes of URL-ish forms to a single one.
    if rest.starts_with("///") {
        rest = &rest[2..];
    } else if rest.starts_with("//") {
        rest = &rest[1..];
    }

    let path_part = rest.split('?').next().unwrap_or(rest);
    if path_part.is_empty() {
        return None;
    }

    Some(PathBuf::from(path_part))
}

fn sqlite_url_with_create_mode(database_url: &str) -> Cow<'_, str> {
    if !database_url.starts_with("sqlite:")
        || database_url.starts_with("sqlite::memory:")
        || database_url.contains("mode=")
    {
        return Cow::Borrowed(database_url);
    }

    let sep = if database_url.contains('?') { '&' } else { '?' };
    Cow::Owned(format!("{database_url}{sep}mode=rwc"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SubsecRound, Utc};
    use oauth2_core::TokenTypeHint;

    async fn store(dir: &tempfile::TempDir) -> SqlxAccessTokenStore {
        let url = format!("sqlite://{}", dir.path().join("nested/tokens.db").display());
        let store = SqlxAccessTokenStore::new(&url).await.unwrap();
        store.init().await.unwrap();
        store
    }

    fn token(value: &str, refresh: Option<&str>) -> AccessToken {
        let mut token = AccessToken::new(
            value.to_string(),
            refresh.map(str::to_string),
            None,
            None,
            Some("read write".to_string()),
            Some(Utc::now().trunc_subsecs(3) + Duration::seconds(7200)),
        );
        token.created_at = token.created_at.trunc_subsecs(3);
        token
    }

    #[test]
    fn sqlite_paths_are_derived_from_urls() {
        assert_eq!(
            sqlite_db_path("sqlite:///tmp/oauth2.db?mode=rwc"),
            Some(PathBuf::from("/tmp/oauth2.db"))
        );
        assert_eq!(sqlite_db_path("sqlite::memory:"), None);
        assert_eq!(sqlite_db_path("postgres://localhost/db"), None);

        assert_eq!(
            sqlite_url_with_create_mode("sqlite:data/oauth2.db"),
            "sqlite:data/oauth2.db?mode=rwc"
        );
        assert_eq!(
            sqlite_url_with_create_mode("sqlite:data/oauth2.db?mode=ro"),
            "sqlite:data/oauth2.db?mode=ro"
        );
    }

    #[tokio::test]
    async fn round_trips_and_updates_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        store.healthcheck().await.unwrap();

        let mut record = token("access", Some("refresh"));
        store.insert(&record).await.unwrap();

        let found = store.find("access", TokenTypeHint::AccessToken).await.unwrap();
        assert_eq!(found.as_ref(), Some(&record));
        let found = store.find("refresh", TokenTypeHint::RefreshToken).await.unwrap();
        assert_eq!(found.as_ref(), Some(&record));

        record.revoked_at = Some(Utc::now().trunc_subsecs(3));
        store.update(&record).await.unwrap();
        let stored = store.find_by_token("access").await.unwrap().unwrap();
        assert!(stored.is_revoked());

        store.delete(&record).await.unwrap();
        store.delete(&record).await.unwrap();
        assert!(store.find_by_token("access").await.unwrap().is_none());
        assert!(store.update(&record).await.is_err());
    }

    #[tokio::test]
    async fn unique_indexes_report_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        store.insert(&token("a", Some("r1"))).await.unwrap();
        assert!(matches!(
            store.insert(&token("a", None)).await,
            Err(StoreError::Duplicate(_))
        ));
        assert!(matches!(
            store.insert(&token("b", Some("r1"))).await,
            Err(StoreError::Duplicate(_))
        ));

        store.insert(&token("c", None)).await.unwrap();
        store.insert(&token("d", None)).await.unwrap();
    }
}
