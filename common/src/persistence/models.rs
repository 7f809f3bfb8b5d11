use crate::persistence::schema::cars;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

/// A stored vehicle listing, exactly as the `cars` row looks.
#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq)]
#[diesel(table_name = cars)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Car {
    pub id: i32,
    pub vin: Option<String>,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub year: i32,
    pub title: Option<String>,
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
    pub posted_at: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub url: Option<String>,
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
    pub images_json: Option<String>,
    pub location_address: Option<String>,
    pub location_url: Option<String>,
    pub seller_name: Option<String>,
    pub seller_url: Option<String>,
}

/// Row to insert. Also the body of an admin create, which takes columns verbatim.
#[derive(Insertable, Deserialize, Debug, Clone, Default, PartialEq)]
#[diesel(table_name = cars)]
#[serde(deny_unknown_fields)]
pub struct NewCar {
    pub vin: Option<String>,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub year: i32,
    pub title: Option<String>,
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
    pub posted_at: Option<NaiveDateTime>,
    pub source: Option<String>,
    pub url: Option<String>,
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
    pub images_json: Option<String>,
    pub location_address: Option<String>,
    pub location_url: Option<String>,
    pub seller_name: Option<String>,
    pub seller_url: Option<String>,
}

impl NewCar {
    /// The row as it would read back once the store assigned `id`.
    pub fn into_car(self, id: i32) -> Car {
        Car {
            id,
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
            posted_at: self.posted_at,
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
            image_url: self.image_url,
            images_json: self.images_json,
            location_address: self.location_address,
            location_url: self.location_url,
            seller_name: self.seller_name,
            seller_url: self.seller_url,
        }
    }
}

/// Absent field keeps the column, explicit `null` clears it.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Partial edit of any column but `id`. Outer `None` leaves the column untouched,
/// `Some(None)` writes NULL.
#[derive(AsChangeset, Deserialize, Debug, Clone, Default, PartialEq)]
#[diesel(table_name = cars)]
#[serde(deny_unknown_fields)]
pub struct CarChangeset {
    #[serde(default, deserialize_with = "double_option")]
    pub vin: Option<Option<String>>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub trim: Option<Option<String>>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub mileage: Option<Option<i32>>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub currency: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub state: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub seller_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub exterior_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub interior_color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub transmission: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub drivetrain: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub fuel_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub body_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub posted_at: Option<Option<NaiveDateTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub source: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub auction_status: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub time_left: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub number_of_views: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub number_of_bids: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub highlights: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equipment: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub modifications: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub known_flaws: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub service_history: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub ownership_history: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub seller_notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub other_items: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub engine: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub images_json: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub seller_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub seller_url: Option<Option<String>>,
}

impl CarChangeset {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the edit to an in-memory row, mirroring what the UPDATE does in the store.
    pub fn apply(self, car: &mut Car) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut car.vin, self.vin);
        set(&mut car.make, self.make);
        set(&mut car.model, self.model);
        set(&mut car.trim, self.trim);
        set(&mut car.year, self.year);
        set(&mut car.title, self.title);
        set(&mut car.mileage, self.mileage);
        set(&mut car.price, self.price);
        set(&mut car.currency, self.currency);
        set(&mut car.city, self.city);
        set(&mut car.state, self.state);
        set(&mut car.seller_type, self.seller_type);
        set(&mut car.exterior_color, self.exterior_color);
        set(&mut car.interior_color, self.interior_color);
        set(&mut car.transmission, self.transmission);
        set(&mut car.drivetrain, self.drivetrain);
        set(&mut car.fuel_type, self.fuel_type);
        set(&mut car.body_type, self.body_type);
        set(&mut car.posted_at, self.posted_at);
        set(&mut car.source, self.source);
        set(&mut car.url, self.url);
        set(&mut car.auction_status, self.auction_status);
        set(&mut car.end_time, self.end_time);
        set(&mut car.time_left, self.time_left);
        set(&mut car.number_of_views, self.number_of_views);
        set(&mut car.number_of_bids, self.number_of_bids);
        set(&mut car.description, self.description);
        set(&mut car.highlights, self.highlights);
        set(&mut car.equipment, self.equipment);
        set(&mut car.modifications, self.modifications);
        set(&mut car.known_flaws, self.known_flaws);
        set(&mut car.service_history, self.service_history);
        set(&mut car.ownership_history, self.ownership_history);
        set(&mut car.seller_notes, self.seller_notes);
        set(&mut car.other_items, self.other_items);
        set(&mut car.engine, self.engine);
        set(&mut car.image_url, self.image_url);
        set(&mut car.images_json, self.images_json);
        set(&mut car.location_address, self.location_address);
        set(&mut car.location_url, self.location_url);
        set(&mut car.seller_name, self.seller_name);
        set(&mut car.seller_url, self.seller_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_car() -> NewCar {
        NewCar {
            make: "Honda".into(),
            model: "Civic".into(),
            year: 2019,
            price: 15000.0,
            trim: Some("EX".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_changeset_distinguishes_absent_from_null() {
        let changes: CarChangeset =
            serde_json::from_str(r#"{"trim": null, "price": -1.0}"#).unwrap();
        assert_eq!(changes.trim, Some(None));
        assert_eq!(changes.price, Some(-1.0));
        assert_eq!(changes.city, None);
        assert!(!changes.is_empty());

        let mut car = new_car().into_car(1);
        car.city = Some("Austin".into());
        changes.apply(&mut car);

        assert_eq!(car.trim, None);
        assert_eq!(car.price, -1.0);
        assert_eq!(car.city.as_deref(), Some("Austin"));
    }

    #[test]
    fn test_changeset_rejects_unknown_column() {
        assert!(serde_json::from_str::<CarChangeset>(r#"{"id": 5}"#).is_err());
    }

    #[test]
    fn test_empty_changeset() {
        let changes: CarChangeset = serde_json::from_str("{}").unwrap();
        assert!(changes.is_empty());
    }
}
