use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::potions::dto::PotionBody;

/// Potion row as stored. Every data column is nullable; `ratings` is kept
/// as two flat columns and folded back into a sub-document at the DTO
/// boundary.
#[derive(Debug, Clone, FromRow)]
pub struct PotionRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub score: Option<f64>,
    pub ingredients: Option<serde_json::Value>,
    pub ratings_strength: Option<f64>,
    pub ratings_flavor: Option<f64>,
    pub try_date: Option<OffsetDateTime>,
    pub categories: Option<Vec<String>>,
    pub vendor_id: Option<String>,
}

const COLUMNS: &str = "id, name, price, score, ingredients, ratings_strength, ratings_flavor, \
                       try_date, categories, vendor_id";

pub async fn list(db: &PgPool) -> sqlx::Result<Vec<PotionRow>> {
    sqlx::query_as::<_, PotionRow>(&format!("SELECT {COLUMNS} FROM potions"))
        .fetch_all(db)
        .await
}

pub async fn list_names(db: &PgPool) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>("SELECT name FROM potions WHERE name IS NOT NULL")
        .fetch_all(db)
        .await
}

pub async fn list_by_vendor(db: &PgPool, vendor_id: &str) -> sqlx::Result<Vec<PotionRow>> {
    sqlx::query_as::<_, PotionRow>(&format!(
        "SELECT {COLUMNS} FROM potions WHERE vendor_id = $1"
    ))
    .bind(vendor_id)
    .fetch_all(db)
    .await
}

pub async fn list_in_price_range(db: &PgPool, min: f64, max: f64) -> sqlx::Result<Vec<PotionRow>> {
    sqlx::query_as::<_, PotionRow>(&format!(
        "SELECT {COLUMNS} FROM potions WHERE price BETWEEN $1 AND $2"
    ))
    .bind(min)
    .bind(max)
    .fetch_all(db)
    .await
}

pub async fn get(db: &PgPool, id: Uuid) -> sqlx::Result<Option<PotionRow>> {
    sqlx::query_as::<_, PotionRow>(&format!("SELECT {COLUMNS} FROM potions WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn insert(db: &PgPool, body: &PotionBody) -> sqlx::Result<PotionRow> {
    let ratings = body.ratings.clone().unwrap_or_default();
    sqlx::query_as::<_, PotionRow>(&format!(
        "INSERT INTO potions \
         (name, price, score, ingredients, ratings_strength, ratings_flavor, try_date, categories, vendor_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {COLUMNS}"
    ))
    .bind(&body.name)
    .bind(body.price)
    .bind(body.score)
    .bind(&body.ingredients)
    .bind(ratings.strength)
    .bind(ratings.flavor)
    .bind(body.try_date)
    .bind(&body.categories)
    .bind(&body.vendor_id)
    .fetch_one(db)
    .await
}

/// Partial update: absent fields keep their stored values. Returns `None`
/// when the id does not exist.
pub async fn update(db: &PgPool, id: Uuid, body: &PotionBody) -> sqlx::Result<Option<PotionRow>> {
    let ratings = body.ratings.clone().unwrap_or_default();
    sqlx::query_as::<_, PotionRow>(&format!(
        "UPDATE potions SET \
         name = COALESCE($2, name), \
         price = COALESCE($3, price), \
         score = COALESCE($4, score), \
         ingredients = COALESCE($5, ingredients), \
         ratings_strength = COALESCE($6, ratings_strength), \
         ratings_flavor = COALESCE($7, ratings_flavor), \
         try_date = COALESCE($8, try_date), \
         categories = COALESCE($9, categories), \
         vendor_id = COALESCE($10, vendor_id) \
         WHERE id = $1 \
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&body.name)
    .bind(body.price)
    .bind(body.score)
    .bind(&body.ingredients)
    .bind(ratings.strength)
    .bind(ratings.flavor)
    .bind(body.try_date)
    .bind(&body.categories)
    .bind(&body.vendor_id)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM potions WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
