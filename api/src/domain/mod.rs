use chrono::{DateTime, NaiveDateTime};
use common::persistence::models::{Car, NewCar};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;
use utoipa::ToSchema;

/// RFC 3339 timestamps are converted to UTC; naive ones are taken as UTC already.
fn deserialize_timestamp<'de, D>(de: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(de)? else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.naive_utc()));
    }
    raw.parse::<NaiveDateTime>()
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Candidate listing as accepted by `POST /cars` and `POST /cars/bulk`.
#[derive(Deserialize, ToSchema, Debug, Clone, Default)]
pub struct CarIn {
    pub vin: Option<String>,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub year: i32,
    #[schema(minimum = 0)]
    pub mileage: Option<i32>,
    #[schema(minimum = 0.0)]
    pub price: f64,
    pub currency: Option<String>,

    pub city: Option<String>,
    pub state: Option<String>,
    pub seller_type: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    #[schema(value_type = Option<String>, example = "2025-10-13T15:30:00")]
    pub posted_at: Option<NaiveDateTime>,

    pub source: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub auction_status: Option<String>,
    pub end_time: Option<String>,
    pub time_left: Option<String>,
    pub number_of_views: Option<i32>,
    pub number_of_bids: Option<i32>,

    pub description: Option<String>,
    pub highlights: Option<String>,
    pub equipment: Option<String>,
    pub modifications: Option<String>,
    pub known_flaws: Option<String>,
    pub service_history: Option<String>,
    pub ownership_history: Option<String>,
    pub seller_notes: Option<String>,
    pub other_items: Option<String>,

    pub engine: Option<String>,
    pub image_url: Option<String>,
    pub images: Option<Vec<String>>,

    pub location_address: Option<String>,
    pub location_url: Option<String>,
    pub seller_name: Option<String>,
    pub seller_url: Option<String>,
}

impl CarIn {
    /// Row to insert. A non-empty gallery is encoded into the blob column and, lacking an
    /// explicit `image_url`, its first entry becomes the canonical image.
    pub fn into_new_car(self, now: NaiveDateTime) -> NewCar {
        let images = self.images.filter(|images| !images.is_empty());
        let images_json = images.as_deref().and_then(encode_gallery);
        let image_url = match (self.image_url, &images) {
            (Some(url), Some(images)) if url.is_empty() => images.first().cloned(),
            (None, Some(images)) => images.first().cloned(),
            (url, _) => url,
        };

        NewCar {
            vin: self.vin,
            make: self.make,
            model: self.model,
            trim: self.trim,
            year: self.year,
            title: self.title,
            mileage: self.mileage,
            price: self.price,
            currency: self.currency,
            city: self.city,
            state: self.state,
            seller_type: self.seller_type,
            exterior_color: self.exterior_color,
            interior_color: self.interior_color,
            transmission: self.transmission,
            drivetrain: self.drivetrain,
            fuel_type: self.fuel_type,
            body_type: self.body_type,
            posted_at: Some(self.posted_at.unwrap_or(now)),
            source: self.source,
            url: self.url,
            auction_status: self.auction_status,
            end_time: self.end_time,
            time_left: self.time_left,
            number_of_views: self.number_of_views,
            number_of_bids: self.number_of_bids,
            description: self.description,
            highlights: self.highlights,
            equipment: self.equipment,
            modifications: self.modifications,
            known_flaws: self.known_flaws,
            service_history: self.service_history,
            ownership_history: self.ownership_history,
            seller_notes: self.seller_notes,
            other_items: self.other_items,
            engine: self.engine,
            image_url,
            images_json,
            location_address: self.location_address,
            location_url: self.location_url,
            seller_name: self.seller_name,
            seller_url: self.seller_url,
        }
    }
}

/// A listing as every endpoint returns it: the gallery blob is decoded into `images`.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct CarOut {
    pub id: i32,
    pub vin: Option<String>,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub year: i32,
    pub mileage: Option<i32>,
    pub price: f64,
    pub currency: Option<String>,

    pub city: Option<String>,
    pub state: Option<String>,
    pub seller_type: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub fuel_type: Option<String>,
    pub body_type: Option<String>,
    #[schema(value_type = Option<String>, example = "2025-10-13T15:30:00")]
    pub posted_at: Option<NaiveDateTime>,

    pub source: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub auction_status: Option<String>,
    pub end_time: Option<String>,
    pub time_left: Option<String>,
    pub number_of_views: Option<i32>,
    pub number_of_bids: Option<i32>,

    pub description: Option<String>,
    pub highlights: Option<String>,
    pub equipment: Option<String>,
    pub modifications: Option<String>,
    pub known_flaws: Option<String>,
    pub service_history: Option<String>,
    pub ownership_history: Option<String>,
    pub seller_notes: Option<String>,
    pub other_items: Option<String>,

    pub engine: Option<String>,
    pub image_url: Option<String>,
    pub images: Vec<String>,

    pub location_address: Option<String>,
    pub location_url: Option<String>,
    pub seller_name: Option<String>,
    pub seller_url: Option<String>,
}

impl From<Car> for CarOut {
    fn from(value: Car) -> Self {
        let images = decode_gallery(value.images_json.as_deref(), value.image_url.as_deref());
        Self {
            id: value.id,
            vin: value.vin,
            make: value.make,
            model: value.model,
            trim: value.trim,
            year: value.year,
            mileage: value.mileage,
            price: value.price,
            currency: value.currency,
            city: value.city,
            state: value.state,
            seller_type: value.seller_type,
            exterior_color: value.exterior_color,
            interior_color: value.interior_color,
            transmission: value.transmission,
            drivetrain: value.drivetrain,
            fuel_type: value.fuel_type,
            body_type: value.body_type,
            posted_at: value.posted_at,
            source: value.source,
            url: value.url,
            title: value.title,
            auction_status: value.auction_status,
            end_time: value.end_time,
            time_left: value.time_left,
            number_of_views: value.number_of_views,
            number_of_bids: value.number_of_bids,
            description: value.description,
            highlights: value.highlights,
            equipment: value.equipment,
            modifications: value.modifications,
            known_flaws: value.known_flaws,
            service_history: value.service_history,
            ownership_history: value.ownership_history,
            seller_notes: value.seller_notes,
            other_items: value.other_items,
            engine: value.engine,
            image_url: value.image_url,
            images,
            location_address: value.location_address,
            location_url: value.location_url,
            seller_name: value.seller_name,
            seller_url: value.seller_url,
        }
    }
}

/// Admin list columns.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AdminCarRow {
    pub id: i32,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub price: f64,
    pub mileage: Option<i32>,
    pub state: Option<String>,
    pub transmission: Option<String>,
    pub drivetrain: Option<String>,
    pub auction_status: Option<String>,
    pub vin: Option<String>,
    pub image_url: Option<String>,
}

impl From<Car> for AdminCarRow {
    fn from(value: Car) -> Self {
        Self {
            id: value.id,
            year: value.year,
            make: value.make,
            model: value.model,
            trim: value.trim,
            price: value.price,
            mileage: value.mileage,
            state: value.state,
            transmission: value.transmission,
            drivetrain: value.drivetrain,
            auction_status: value.auction_status,
            vin: value.vin,
            image_url: value.image_url,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct PaginatedCars {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<CarOut>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct AdminCarPage {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub items: Vec<AdminCarRow>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Default, PartialEq, Eq)]
pub struct BulkInsertResult {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct Status {
    pub status: String,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
        }
    }
}

pub fn encode_gallery(images: &[String]) -> Option<String> {
    serde_json::to_string(images).ok()
}

/// Gallery as clients see it. A blob that is missing, malformed, not a list, or holds no
/// usable entries falls back to `[image_url]`, or nothing.
pub fn decode_gallery(images_json: Option<&str>, image_url: Option<&str>) -> Vec<String> {
    let images = images_json
        .filter(|raw| !raw.is_empty())
        .map(|raw| match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(serde_json::Value::Array(entries)) => entries
                .into_iter()
                // null entries are dropped, other scalars keep their JSON text
                .filter_map(|entry| match entry {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.trim().is_empty())
                .collect(),
            Ok(other) => {
                debug!("gallery blob is not a list: `{other}`");
                Vec::new()
            }
            Err(e) => {
                debug!("gallery blob is not valid json: `{e}`");
                Vec::new()
            }
        })
        .unwrap_or_default();

    match image_url {
        Some(url) if images.is_empty() && !url.is_empty() => vec![url.to_owned()],
        _ => images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        "2025-01-02T03:04:05".parse().unwrap()
    }

    fn car_in(images: Option<Vec<&str>>, image_url: Option<&str>) -> CarIn {
        CarIn {
            make: "Porsche".into(),
            model: "911".into(),
            year: 1995,
            price: 95000.0,
            images: images.map(|v| v.into_iter().map(str::to_owned).collect()),
            image_url: image_url.map(str::to_owned),
            ..Default::default()
        }
    }

    #[test]
    fn test_gallery_sets_image_url_from_first_entry() {
        let new_car = car_in(Some(vec!["a.jpg", "b.jpg"]), None).into_new_car(now());
        assert_eq!(new_car.image_url.as_deref(), Some("a.jpg"));
        assert_eq!(new_car.images_json.as_deref(), Some(r#"["a.jpg","b.jpg"]"#));
        assert_eq!(new_car.posted_at, Some(now()));
    }

    #[test]
    fn test_explicit_image_url_wins() {
        let new_car = car_in(Some(vec!["a.jpg"]), Some("hero.jpg")).into_new_car(now());
        assert_eq!(new_car.image_url.as_deref(), Some("hero.jpg"));

        let new_car = car_in(Some(vec!["a.jpg"]), Some("")).into_new_car(now());
        assert_eq!(new_car.image_url.as_deref(), Some("a.jpg"));
    }

    #[test]
    fn test_empty_image_url_kept_without_gallery() {
        let new_car = car_in(None, Some("")).into_new_car(now());
        assert_eq!(new_car.image_url.as_deref(), Some(""));
        assert_eq!(new_car.images_json, None);

        let new_car = car_in(Some(vec![]), Some("")).into_new_car(now());
        assert_eq!(new_car.image_url.as_deref(), Some(""));
    }

    #[test]
    fn test_empty_gallery_stores_no_blob() {
        let new_car = car_in(Some(vec![]), None).into_new_car(now());
        assert_eq!(new_car.images_json, None);
        assert_eq!(new_car.image_url, None);
    }

    #[test]
    fn test_decode_gallery() {
        assert_eq!(
            decode_gallery(Some(r#"["a.jpg", "", "  ", null, 7, true]"#), None),
            vec!["a.jpg".to_string(), "7".to_string(), "true".to_string()]
        );
        assert_eq!(decode_gallery(Some("[]"), Some("x.jpg")), vec!["x.jpg"]);
        assert_eq!(decode_gallery(None, Some("x.jpg")), vec!["x.jpg"]);
        assert_eq!(decode_gallery(None, Some("")), Vec::<String>::new());
        assert_eq!(decode_gallery(None, None), Vec::<String>::new());
    }

    #[test]
    fn test_malformed_gallery_falls_back() {
        assert_eq!(decode_gallery(Some("{not json"), Some("x.jpg")), vec!["x.jpg"]);
        assert_eq!(decode_gallery(Some(r#"{"a": 1}"#), Some("x.jpg")), vec!["x.jpg"]);
        assert_eq!(decode_gallery(Some("\"a.jpg\""), None), Vec::<String>::new());
    }

    #[test]
    fn test_posted_at_accepts_offsets_and_naive() {
        let with_offset: CarIn = serde_json::from_str(
            r#"{"make":"a","model":"b","year":1,"price":1,"posted_at":"2025-01-02T05:04:05+02:00"}"#,
        )
        .unwrap();
        assert_eq!(with_offset.posted_at, Some(now()));

        let naive: CarIn = serde_json::from_str(
            r#"{"make":"a","model":"b","year":1,"price":1,"posted_at":"2025-01-02T03:04:05"}"#,
        )
        .unwrap();
        assert_eq!(naive.posted_at, Some(now()));

        assert!(
            serde_json::from_str::<CarIn>(
                r#"{"make":"a","model":"b","year":1,"price":1,"posted_at":"yesterday"}"#
            )
            .is_err()
        );
    }

    #[test]
    fn test_required_fields() {
        assert!(serde_json::from_str::<CarIn>(r#"{"make":"a","model":"b","year":1}"#).is_err());
    }
}
