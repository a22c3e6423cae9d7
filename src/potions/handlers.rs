use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    potions::{
        analytics::{self, CategoryEntry, CategoryScore, RatioEntry, SearchBucket, SearchQuery, VendorScore},
        dto::{Potion, PotionBody, PriceRangeParams},
        repo,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/potions", get(list_potions))
        .route("/potions/names", get(list_names))
        .route("/potions/vendor/:vendor_id", get(list_by_vendor))
        .route("/potions/price-range", get(price_range))
        .route("/potions/analytics/distinct-categories", get(distinct_categories))
        .route("/potions/analytics/average-score-by-vendor", get(average_score_by_vendor))
        .route("/potions/analytics/average-score-by-category", get(average_score_by_category))
        .route("/potions/analytics/strength-flavor-ratio", get(strength_flavor_ratio))
        .route("/potions/analytics/search", get(search))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/potions", post(create_potion))
        .route(
            "/potions/:id",
            get(get_potion).put(update_potion).delete(delete_potion),
        )
}

// --- public reads ---

#[instrument(skip(state))]
pub async fn list_potions(State(state): State<AppState>) -> Result<Json<Vec<Potion>>, ApiError> {
    let rows = repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(Potion::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_names(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(repo::list_names(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn list_by_vendor(
    State(state): State<AppState>,
    Path(vendor_id): Path<String>,
) -> Result<Json<Vec<Potion>>, ApiError> {
    let rows = repo::list_by_vendor(&state.db, &vendor_id).await?;
    Ok(Json(rows.into_iter().map(Potion::from).collect()))
}

#[instrument(skip(state))]
pub async fn price_range(
    State(state): State<AppState>,
    Query(p): Query<PriceRangeParams>,
) -> Result<Json<Vec<Potion>>, ApiError> {
    let rows = repo::list_in_price_range(&state.db, p.min, p.max).await?;
    Ok(Json(rows.into_iter().map(Potion::from).collect()))
}

// --- analytics ---

#[instrument(skip(state))]
pub async fn distinct_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryEntry>>, ApiError> {
    Ok(Json(analytics::distinct_categories(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn average_score_by_vendor(
    State(state): State<AppState>,
) -> Result<Json<Vec<VendorScore>>, ApiError> {
    Ok(Json(analytics::average_score_by_vendor(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn average_score_by_category(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryScore>>, ApiError> {
    Ok(Json(analytics::average_score_by_category(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn strength_flavor_ratio(
    State(state): State<AppState>,
) -> Result<Json<Vec<RatioEntry>>, ApiError> {
    Ok(Json(analytics::strength_flavor_ratio(&state.db).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub group_by: Option<String>,
    pub metric: Option<String>,
    pub field: Option<String>,
}

#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(p): Query<SearchParams>,
) -> Result<Json<Vec<SearchBucket>>, ApiError> {
    let query = SearchQuery::from_params(
        p.group_by.as_deref(),
        p.metric.as_deref(),
        p.field.as_deref(),
    )?;
    Ok(Json(query.run(&state.db).await?))
}

// --- authenticated reads/writes ---

#[instrument(skip(state, _user))]
pub async fn get_potion(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Potion>, ApiError> {
    let row = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("potion"))?;
    Ok(Json(Potion::from(row)))
}

#[instrument(skip(state, user, body))]
pub async fn create_potion(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<PotionBody>,
) -> Result<(StatusCode, Json<Potion>), ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty potion body".into()));
    }
    let row = repo::insert(&state.db, &body).await?;
    info!(potion_id = %row.id, user = %user.name, "potion created");
    Ok((StatusCode::CREATED, Json(Potion::from(row))))
}

#[instrument(skip(state, user, body))]
pub async fn update_potion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PotionBody>,
) -> Result<Json<Potion>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("empty potion body".into()));
    }
    let row = repo::update(&state.db, id, &body)
        .await?
        .ok_or(ApiError::NotFound("potion"))?;
    info!(potion_id = %id, user = %user.name, "potion updated");
    Ok(Json(Potion::from(row)))
}

#[instrument(skip(state, user))]
pub async fn delete_potion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<&'static str>, ApiError> {
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("potion"));
    }
    info!(potion_id = %id, user = %user.name, "potion deleted");
    Ok(Json("potion deleted"))
}
