use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::potions::repo::PotionRow;

/// The `ratings` sub-document: both marks optional, like every other field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ratings {
    pub strength: Option<f64>,
    pub flavor: Option<f64>,
}

/// Potion record as it appears on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Potion {
    pub id: Uuid,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub score: Option<f64>,
    /// Mixed-shape values, kept opaque.
    pub ingredients: Option<serde_json::Value>,
    pub ratings: Ratings,
    #[serde(with = "time::serde::rfc3339::option")]
    pub try_date: Option<OffsetDateTime>,
    pub categories: Option<Vec<String>>,
    pub vendor_id: Option<String>,
}

impl From<PotionRow> for Potion {
    fn from(r: PotionRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            price: r.price,
            score: r.score,
            ingredients: r.ingredients,
            ratings: Ratings {
                strength: r.ratings_strength,
                flavor: r.ratings_flavor,
            },
            try_date: r.try_date,
            categories: r.categories,
            vendor_id: r.vendor_id,
        }
    }
}

/// Create/update body. Everything optional; an update keeps stored values
/// for absent fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PotionBody {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub score: Option<f64>,
    pub ingredients: Option<serde_json::Value>,
    pub ratings: Option<Ratings>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub try_date: Option<OffsetDateTime>,
    pub categories: Option<Vec<String>>,
    pub vendor_id: Option<String>,
}

impl PotionBody {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.score.is_none()
            && self.ingredients.is_none()
            && self.ratings.is_none()
            && self.try_date.is_none()
            && self.categories.is_none()
            && self.vendor_id.is_none()
    }
}

/// Query parameters for `/potions/price-range`.
#[derive(Debug, Deserialize)]
pub struct PriceRangeParams {
    pub min: f64,
    pub max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_row() -> PotionRow {
        PotionRow {
            id: Uuid::new_v4(),
            name: Some("Elixir of Vigor".into()),
            price: Some(12.5),
            score: Some(4.0),
            ingredients: Some(serde_json::json!(["mandrake", { "herb": "sage", "grams": 3 }])),
            ratings_strength: Some(8.0),
            ratings_flavor: Some(4.0),
            try_date: Some(datetime!(2024-03-01 12:00 UTC)),
            categories: Some(vec!["healing".into(), "energy".into()]),
            vendor_id: Some("v1".into()),
        }
    }

    #[test]
    fn wire_format_is_camel_case_with_nested_ratings() {
        let json = serde_json::to_value(Potion::from(sample_row())).unwrap();
        assert_eq!(json["vendorId"], "v1");
        assert_eq!(json["ratings"]["strength"], 8.0);
        assert_eq!(json["ratings"]["flavor"], 4.0);
        assert_eq!(json["tryDate"], "2024-03-01T12:00:00Z");
        assert_eq!(json["categories"][1], "energy");
        // mixed-shape ingredients pass through untouched
        assert_eq!(json["ingredients"][1]["grams"], 3);
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let row = PotionRow {
            id: Uuid::new_v4(),
            name: None,
            price: None,
            score: None,
            ingredients: None,
            ratings_strength: None,
            ratings_flavor: None,
            try_date: None,
            categories: None,
            vendor_id: None,
        };
        let json = serde_json::to_value(Potion::from(row)).unwrap();
        assert!(json["name"].is_null());
        assert!(json["ratings"]["strength"].is_null());
    }

    #[test]
    fn body_empty_detection() {
        let body: PotionBody = serde_json::from_str("{}").unwrap();
        assert!(body.is_empty());
        let body: PotionBody = serde_json::from_str(r#"{"name":"Brew"}"#).unwrap();
        assert!(!body.is_empty());
    }

    #[test]
    fn body_accepts_camel_case_fields() {
        let body: PotionBody =
            serde_json::from_str(r#"{"vendorId":"v2","tryDate":"2024-05-04T00:00:00Z"}"#).unwrap();
        assert_eq!(body.vendor_id.as_deref(), Some("v2"));
        assert!(body.try_date.is_some());
    }
}
