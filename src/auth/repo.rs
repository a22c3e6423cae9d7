use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Credential record. The hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_name(db: &PgPool, name: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, password_hash, created_at
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(db)
        .await
    }

    /// Insert a new credential. The `name` unique constraint surfaces as a
    /// database unique violation on duplicates.
    pub async fn create(db: &PgPool, name: &str, password_hash: &str) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, password_hash)
            VALUES ($1, $2)
            RETURNING id, name, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "merlin".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("merlin"));
        assert!(!json.contains("argon2id"));
    }
}
