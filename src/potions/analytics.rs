//! Aggregation over the potion collection. The search endpoint builds its
//! query from a closed set of typed parameters; nothing client-supplied is
//! ever spliced into SQL.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;
use crate::validate::FieldError;

/// Grouping dimension. Anything other than the two allowed values is
/// rejected rather than silently falling back to category grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Vendor,
    Category,
}

impl GroupBy {
    fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "vendor" => Ok(GroupBy::Vendor),
            "category" => Ok(GroupBy::Category),
            other => Err(ApiError::BadRequest(format!(
                "invalid groupBy '{other}', expected 'vendor' or 'category'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Avg,
    Sum,
    Count,
}

impl Metric {
    fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "avg" => Ok(Metric::Avg),
            "sum" => Ok(Metric::Sum),
            "count" => Ok(Metric::Count),
            other => Err(ApiError::BadRequest(format!(
                "invalid metric '{other}', expected 'avg', 'sum' or 'count'"
            ))),
        }
    }
}

/// The numeric attributes aggregation may target. Closed enumeration: the
/// client names a field, the builder maps it to a known column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    Score,
    Price,
    RatingsStrength,
    RatingsFlavor,
}

impl MetricField {
    fn parse(s: &str) -> Result<Self, ApiError> {
        match s {
            "score" => Ok(MetricField::Score),
            "price" => Ok(MetricField::Price),
            "ratings.strength" => Ok(MetricField::RatingsStrength),
            "ratings.flavor" => Ok(MetricField::RatingsFlavor),
            other => Err(ApiError::BadRequest(format!(
                "invalid field '{other}', expected 'score', 'price', 'ratings.strength' or 'ratings.flavor'"
            ))),
        }
    }

    fn column(self) -> &'static str {
        match self {
            MetricField::Score => "score",
            MetricField::Price => "price",
            MetricField::RatingsStrength => "ratings_strength",
            MetricField::RatingsFlavor => "ratings_flavor",
        }
    }
}

/// A validated search request, ready to be turned into SQL. Only
/// constructible through [`SearchQuery::from_params`], so `field` is always
/// present when the metric needs one.
#[derive(Debug)]
pub struct SearchQuery {
    group_by: GroupBy,
    metric: Metric,
    /// `None` only for `count`, which ignores the field's value.
    field: Option<MetricField>,
}

impl SearchQuery {
    /// Validate the raw query parameters. All three are required; every
    /// missing one is reported, not just the first.
    pub fn from_params(
        group_by: Option<&str>,
        metric: Option<&str>,
        field: Option<&str>,
    ) -> Result<Self, ApiError> {
        let mut missing = Vec::new();
        for (name, value) in [("groupBy", group_by), ("metric", metric), ("field", field)] {
            if value.is_none() {
                missing.push(FieldError {
                    message: format!("{name} is required"),
                    field: name.to_string(),
                });
            }
        }
        let (Some(group_by), Some(metric), Some(field)) = (group_by, metric, field) else {
            return Err(ApiError::Validation(missing));
        };

        let group_by = GroupBy::parse(group_by)?;
        let metric = Metric::parse(metric)?;
        let field = match metric {
            Metric::Count => None,
            Metric::Avg | Metric::Sum => Some(MetricField::parse(field)?),
        };
        Ok(Self { group_by, metric, field })
    }

    /// Assemble the aggregation SQL. Category grouping unnests the array
    /// first, so each category membership contributes its own row.
    pub fn to_sql(&self) -> String {
        let expr = match (self.metric, self.field) {
            (Metric::Count, _) => "COUNT(*)::double precision".to_string(),
            (Metric::Avg, Some(f)) => format!("AVG({})", f.column()),
            (Metric::Sum, Some(f)) => format!("SUM({})", f.column()),
            // from_params never builds avg/sum without a field
            (_, None) => unreachable!("avg/sum require a field"),
        };
        match self.group_by {
            GroupBy::Vendor => format!(
                "SELECT vendor_id AS group_key, {expr} AS result \
                 FROM potions GROUP BY vendor_id ORDER BY vendor_id"
            ),
            GroupBy::Category => format!(
                "SELECT category AS group_key, {expr} AS result \
                 FROM potions CROSS JOIN LATERAL unnest(categories) AS category \
                 GROUP BY category ORDER BY category"
            ),
        }
    }

    pub async fn run(&self, db: &PgPool) -> sqlx::Result<Vec<SearchBucket>> {
        sqlx::query_as::<_, SearchBucket>(&self.to_sql())
            .fetch_all(db)
            .await
    }
}

/// One group of the search result.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SearchBucket {
    pub group_key: Option<String>,
    pub result: Option<f64>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CategoryEntry {
    pub category: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VendorScore {
    pub vendor_id: Option<String>,
    pub avg_score: Option<f64>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category: String,
    pub avg_score: Option<f64>,
}

/// `ratio` stays `null` whenever flavor is absent or not above zero.
#[derive(Debug, Serialize, FromRow)]
pub struct RatioEntry {
    pub name: Option<String>,
    pub strength: Option<f64>,
    pub flavor: Option<f64>,
    pub ratio: Option<f64>,
}

pub async fn distinct_categories(db: &PgPool) -> sqlx::Result<Vec<CategoryEntry>> {
    sqlx::query_as::<_, CategoryEntry>(
        "SELECT DISTINCT category \
         FROM potions CROSS JOIN LATERAL unnest(categories) AS category \
         ORDER BY category",
    )
    .fetch_all(db)
    .await
}

pub async fn average_score_by_vendor(db: &PgPool) -> sqlx::Result<Vec<VendorScore>> {
    sqlx::query_as::<_, VendorScore>(
        "SELECT vendor_id, AVG(score) AS avg_score \
         FROM potions GROUP BY vendor_id ORDER BY vendor_id",
    )
    .fetch_all(db)
    .await
}

pub async fn average_score_by_category(db: &PgPool) -> sqlx::Result<Vec<CategoryScore>> {
    sqlx::query_as::<_, CategoryScore>(
        "SELECT category, AVG(score) AS avg_score \
         FROM potions CROSS JOIN LATERAL unnest(categories) AS category \
         GROUP BY category ORDER BY category",
    )
    .fetch_all(db)
    .await
}

const STRENGTH_FLAVOR_RATIO_SQL: &str =
    "SELECT name, ratings_strength AS strength, ratings_flavor AS flavor, \
     CASE WHEN ratings_flavor > 0 THEN ratings_strength / ratings_flavor END AS ratio \
     FROM potions";

pub async fn strength_flavor_ratio(db: &PgPool) -> sqlx::Result<Vec<RatioEntry>> {
    sqlx::query_as::<_, RatioEntry>(STRENGTH_FLAVOR_RATIO_SQL)
        .fetch_all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(g: &str, m: &str, f: &str) -> SearchQuery {
        SearchQuery::from_params(Some(g), Some(m), Some(f)).expect("valid params")
    }

    #[test]
    fn vendor_avg_score_sql() {
        let sql = query("vendor", "avg", "score").to_sql();
        assert_eq!(
            sql,
            "SELECT vendor_id AS group_key, AVG(score) AS result \
             FROM potions GROUP BY vendor_id ORDER BY vendor_id"
        );
    }

    #[test]
    fn category_grouping_unnests_first() {
        let sql = query("category", "sum", "price").to_sql();
        assert!(sql.contains("unnest(categories)"));
        assert!(sql.contains("SUM(price)"));
        assert!(sql.contains("GROUP BY category"));
    }

    #[test]
    fn count_ignores_field_value() {
        let q = query("category", "count", "anything-goes-here");
        assert_eq!(q.field, None);
        assert!(q.to_sql().contains("COUNT(*)"));
    }

    #[test]
    fn nested_rating_fields_map_to_columns() {
        let sql = query("vendor", "avg", "ratings.strength").to_sql();
        assert!(sql.contains("AVG(ratings_strength)"));
        let sql = query("vendor", "sum", "ratings.flavor").to_sql();
        assert!(sql.contains("SUM(ratings_flavor)"));
    }

    #[test]
    fn missing_params_all_reported() {
        let err = SearchQuery::from_params(None, Some("avg"), None).unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["groupBy", "field"]);
        assert_eq!(errors[0].message, "groupBy is required");
    }

    #[test]
    fn all_params_missing_reported_together() {
        let err = SearchQuery::from_params(None, None, None).unwrap_err();
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn unknown_group_by_is_rejected() {
        let err = SearchQuery::from_params(Some("brewer"), Some("avg"), Some("score")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("groupBy")));
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let err = SearchQuery::from_params(Some("vendor"), Some("median"), Some("score")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("metric")));
    }

    #[test]
    fn field_outside_allow_list_is_rejected() {
        let err =
            SearchQuery::from_params(Some("vendor"), Some("avg"), Some("name; DROP TABLE potions"))
                .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("field")));
    }

    #[test]
    fn search_bucket_serializes_group_key() {
        let bucket = SearchBucket { group_key: Some("v1".into()), result: Some(5.0) };
        let json = serde_json::to_value(&bucket).unwrap();
        assert_eq!(json, serde_json::json!({ "groupKey": "v1", "result": 5.0 }));
    }

    #[test]
    fn ratio_entry_keeps_null_ratio() {
        let entry = RatioEntry {
            name: Some("Flat Brew".into()),
            strength: Some(8.0),
            flavor: Some(0.0),
            ratio: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["ratio"].is_null());
        assert_eq!(json["strength"], 8.0);
    }

    #[test]
    fn ratio_guard_lives_in_the_query() {
        // flavor must be strictly positive before any division happens
        assert!(STRENGTH_FLAVOR_RATIO_SQL
            .contains("CASE WHEN ratings_flavor > 0 THEN ratings_strength / ratings_flavor END"));
    }

    #[test]
    fn vendor_score_wire_format() {
        let score = VendorScore { vendor_id: Some("v1".into()), avg_score: Some(5.0) };
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json, serde_json::json!({ "vendorId": "v1", "avgScore": 5.0 }));
    }
}
