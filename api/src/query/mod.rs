//! Listing filters: which query parameters exist, how each of them matches a row, and how
//! loosely typed query-string values turn into bounds.
//!
//! The same [`CarQuery`] is rendered to SQL by [`sql`] and evaluated in process by
//! [`CarQuery::matches`], so both stores agree on what a filter means.

pub mod sql;

use common::persistence::models::Car;
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Vin,
    Make,
    Model,
    Trim,
    Title,
    City,
    State,
    SellerType,
    ExteriorColor,
    InteriorColor,
    Transmission,
    Drivetrain,
    FuelType,
    BodyType,
    Engine,
    AuctionStatus,
}

impl TextField {
    pub fn value(self, car: &Car) -> Option<&str> {
        match self {
            Self::Vin => car.vin.as_deref(),
            Self::Make => Some(&car.make),
            Self::Model => Some(&car.model),
            Self::Trim => car.trim.as_deref(),
            Self::Title => car.title.as_deref(),
            Self::City => car.city.as_deref(),
            Self::State => car.state.as_deref(),
            Self::SellerType => car.seller_type.as_deref(),
            Self::ExteriorColor => car.exterior_color.as_deref(),
            Self::InteriorColor => car.interior_color.as_deref(),
            Self::Transmission => car.transmission.as_deref(),
            Self::Drivetrain => car.drivetrain.as_deref(),
            Self::FuelType => car.fuel_type.as_deref(),
            Self::BodyType => car.body_type.as_deref(),
            Self::Engine => car.engine.as_deref(),
            Self::AuctionStatus => car.auction_status.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeField {
    Year,
    Price,
    Mileage,
}

impl RangeField {
    pub fn parse(self, raw: &str) -> Option<Bound> {
        match self {
            Self::Year => parse_int(raw).map(Bound::Year),
            Self::Price => parse_float(raw).map(Bound::Price),
            Self::Mileage => parse_int(raw).map(Bound::Mileage),
        }
    }
}

/// A parsed numeric bound, typed by the column it applies to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bound {
    Year(i32),
    Price(f64),
    Mileage(i32),
}

impl Bound {
    fn compare(self, car: &Car) -> Option<Ordering> {
        match self {
            Self::Year(v) => Some(car.year.cmp(&v)),
            Self::Price(v) => car.price.partial_cmp(&v),
            Self::Mileage(v) => car.mileage.map(|m| m.cmp(&v)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matcher {
    /// Case-insensitive substring.
    Contains(TextField),
    AtLeast(RangeField),
    AtMost(RangeField),
    Exactly(RangeField),
}

#[derive(Clone, Copy, Debug)]
pub struct Filter {
    pub name: &'static str,
    pub matcher: Matcher,
}

const fn contains(name: &'static str, field: TextField) -> Filter {
    Filter {
        name,
        matcher: Matcher::Contains(field),
    }
}

const fn ranged(name: &'static str, matcher: Matcher) -> Filter {
    Filter { name, matcher }
}

pub const LISTING_FILTERS: [Filter; 21] = [
    contains("make", TextField::Make),
    contains("model", TextField::Model),
    contains("trim", TextField::Trim),
    contains("city", TextField::City),
    contains("state", TextField::State),
    contains("seller_type", TextField::SellerType),
    contains("exterior_color", TextField::ExteriorColor),
    contains("interior_color", TextField::InteriorColor),
    contains("transmission", TextField::Transmission),
    contains("drivetrain", TextField::Drivetrain),
    contains("fuel_type", TextField::FuelType),
    contains("body_type", TextField::BodyType),
    contains("engine", TextField::Engine),
    contains("auction_status", TextField::AuctionStatus),
    contains("title", TextField::Title),
    ranged("year_from", Matcher::AtLeast(RangeField::Year)),
    ranged("year_to", Matcher::AtMost(RangeField::Year)),
    ranged("price_min", Matcher::AtLeast(RangeField::Price)),
    ranged("price_max", Matcher::AtMost(RangeField::Price)),
    ranged("mileage_min", Matcher::AtLeast(RangeField::Mileage)),
    ranged("mileage_max", Matcher::AtMost(RangeField::Mileage)),
];

pub const LISTING_SEARCH: &[TextField] = &[
    TextField::Make,
    TextField::Model,
    TextField::Trim,
    TextField::City,
    TextField::State,
    TextField::Title,
];

pub const ADMIN_FILTERS: [Filter; 9] = [
    contains("make", TextField::Make),
    contains("model", TextField::Model),
    ranged("year", Matcher::Exactly(RangeField::Year)),
    contains("state", TextField::State),
    contains("seller_type", TextField::SellerType),
    contains("transmission", TextField::Transmission),
    contains("drivetrain", TextField::Drivetrain),
    contains("body_type", TextField::BodyType),
    contains("auction_status", TextField::AuctionStatus),
];

pub const ADMIN_SEARCH: &[TextField] = &[
    TextField::Vin,
    TextField::Make,
    TextField::Model,
    TextField::Trim,
    TextField::City,
    TextField::State,
    TextField::Title,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    YearDesc,
    YearAsc,
    MileageAsc,
    MileageDesc,
    PostedAtDesc,
}

impl SortKey {
    /// Only the public sort keys; anything else means "no particular order".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "price_asc" => Some(Self::PriceAsc),
            "price_desc" => Some(Self::PriceDesc),
            "year_desc" => Some(Self::YearDesc),
            "year_asc" => Some(Self::YearAsc),
            "mileage_asc" => Some(Self::MileageAsc),
            "mileage_desc" => Some(Self::MileageDesc),
            _ => None,
        }
    }

    /// Row order with postgres null placement: NULLS LAST ascending, NULLS FIRST descending.
    fn compare(self, a: &Car, b: &Car) -> Ordering {
        match self {
            Self::PriceAsc => a.price.total_cmp(&b.price),
            Self::PriceDesc => b.price.total_cmp(&a.price),
            Self::YearAsc => a.year.cmp(&b.year),
            Self::YearDesc => b.year.cmp(&a.year),
            Self::MileageAsc => nulls_last(&a.mileage, &b.mileage),
            Self::MileageDesc => nulls_last(&b.mileage, &a.mileage),
            Self::PostedAtDesc => nulls_last(&b.posted_at, &a.posted_at),
        }
    }
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Contains(TextField, String),
    AtLeast(Bound),
    AtMost(Bound),
    Exactly(Bound),
    /// Matches when any of the fields contains the needle.
    AnyContains(&'static [TextField], String),
}

impl Predicate {
    pub fn matches(&self, car: &Car) -> bool {
        match self {
            Self::Contains(field, needle) => contains_ignore_case(field.value(car), needle),
            Self::AtLeast(bound) => bound.compare(car).is_some_and(Ordering::is_ge),
            Self::AtMost(bound) => bound.compare(car).is_some_and(Ordering::is_le),
            Self::Exactly(bound) => bound.compare(car).is_some_and(Ordering::is_eq),
            Self::AnyContains(fields, needle) => fields
                .iter()
                .any(|field| contains_ignore_case(field.value(car), needle)),
        }
    }
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

/// Conjunction of predicates plus an optional sort key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CarQuery {
    pub predicates: Vec<Predicate>,
    pub sort: Option<SortKey>,
}

impl CarQuery {
    /// Builds the query from raw query-string pairs. Unknown keys are ignored, empty or
    /// unparsable values count as absent. Substring needles are used as given, whitespace
    /// included; only numeric bounds and the sort key are trimmed.
    pub fn from_params(
        filters: &[Filter],
        search_fields: &'static [TextField],
        params: &HashMap<String, String>,
    ) -> Self {
        let value = |name: &str| {
            params
                .get(name)
                .map(String::as_str)
                .filter(|v| !v.is_empty())
        };

        let mut predicates = filters
            .iter()
            .filter_map(|filter| {
                let raw = value(filter.name)?;
                match filter.matcher {
                    Matcher::Contains(field) => Some(Predicate::Contains(field, raw.to_owned())),
                    Matcher::AtLeast(field) => field.parse(raw).map(Predicate::AtLeast),
                    Matcher::AtMost(field) => field.parse(raw).map(Predicate::AtMost),
                    Matcher::Exactly(field) => field.parse(raw).map(Predicate::Exactly),
                }
            })
            .collect::<Vec<_>>();

        if let Some(search) = value("search") {
            predicates.push(Predicate::AnyContains(search_fields, search.to_owned()));
        }

        Self {
            predicates,
            sort: value("sort").map(str::trim).and_then(SortKey::parse),
        }
    }

    pub fn matches(&self, car: &Car) -> bool {
        self.predicates.iter().all(|p| p.matches(car))
    }

    /// Sort key first, then id so that pages never overlap.
    pub fn compare(&self, a: &Car, b: &Car) -> Ordering {
        self.sort
            .map_or(Ordering::Equal, |sort| sort.compare(a, b))
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// `"2020.5"` is 2020; out of range values saturate.
pub fn parse_int(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.trunc() as i32)
}

/// Thousands separators are dropped: `"12,500"` is 12500.
pub fn parse_float(raw: &str) -> Option<f64> {
    let raw = raw.trim().replace(',', "");
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::persistence::models::NewCar;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn car(id: i32, make: &str, model: &str, price: f64, mileage: Option<i32>) -> Car {
        NewCar {
            make: make.into(),
            model: model.into(),
            year: 2018,
            price,
            mileage,
            ..Default::default()
        }
        .into_car(id)
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("2020"), Some(2020));
        assert_eq!(parse_int(" 2020.5 "), Some(2020));
        assert_eq!(parse_int("-3.9"), Some(-3));
        assert_eq!(parse_int("1e3"), Some(1000));
        assert_eq!(parse_int("99999999999"), Some(i32::MAX));
        assert_eq!(parse_int(""), None);
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int("1,000"), None);
        assert_eq!(parse_int("inf"), None);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("12,500"), Some(12500.0));
        assert_eq!(parse_float("1,234.50"), Some(1234.5));
        assert_eq!(parse_float("  "), None);
        assert_eq!(parse_float("ten"), None);
        assert_eq!(parse_float("NaN"), None);
    }

    #[test]
    fn test_from_params_skips_empty_and_unparsable() {
        let query = CarQuery::from_params(
            &LISTING_FILTERS,
            LISTING_SEARCH,
            &params(&[
                ("make", ""),
                ("model", "civic"),
                ("year_from", "abc"),
                ("price_max", "20,000"),
                ("color", "red"),
                ("sort", "bogus"),
            ]),
        );

        assert_eq!(
            query.predicates,
            vec![
                Predicate::Contains(TextField::Model, "civic".into()),
                Predicate::AtMost(Bound::Price(20000.0)),
            ]
        );
        assert_eq!(query.sort, None);
    }

    #[test]
    fn test_substring_needles_keep_whitespace() {
        let query = CarQuery::from_params(
            &LISTING_FILTERS,
            LISTING_SEARCH,
            &params(&[("city", "york "), ("search", " "), ("year_from", " 2015 ")]),
        );
        assert_eq!(
            query.predicates,
            vec![
                Predicate::Contains(TextField::City, "york ".into()),
                Predicate::AtLeast(Bound::Year(2015)),
                Predicate::AnyContains(LISTING_SEARCH, " ".into()),
            ]
        );

        let mut new_york = car(1, "Ford", "Taurus", 1.0, None);
        new_york.city = Some("New York".into());
        assert!(!query.predicates[0].matches(&new_york));
    }

    #[test]
    fn test_search_expands_to_listing_fields() {
        let query = CarQuery::from_params(
            &LISTING_FILTERS,
            LISTING_SEARCH,
            &params(&[("search", "civic"), ("sort", "price_desc")]),
        );
        assert_eq!(
            query.predicates,
            vec![Predicate::AnyContains(LISTING_SEARCH, "civic".into())]
        );
        assert_eq!(query.sort, Some(SortKey::PriceDesc));

        assert!(query.matches(&car(1, "Honda", "Civic Si", 1.0, None)));
        assert!(!query.matches(&car(2, "Honda", "Accord", 1.0, None)));
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let query = CarQuery::from_params(
            &LISTING_FILTERS,
            LISTING_SEARCH,
            &params(&[("make", "HON"), ("price_min", "10000"), ("mileage_max", "50000")]),
        );

        assert!(query.matches(&car(1, "Honda", "Civic", 12000.0, Some(40000))));
        assert!(!query.matches(&car(2, "Honda", "Civic", 9000.0, Some(40000))));
        assert!(!query.matches(&car(3, "Toyota", "Camry", 12000.0, Some(40000))));
        // a missing mileage never satisfies a mileage bound
        assert!(!query.matches(&car(4, "Honda", "Civic", 12000.0, None)));
    }

    #[test]
    fn test_admin_year_is_exact() {
        let query =
            CarQuery::from_params(&ADMIN_FILTERS, ADMIN_SEARCH, &params(&[("year", "2018")]));
        assert_eq!(query.predicates, vec![Predicate::Exactly(Bound::Year(2018))]);
        assert!(query.matches(&car(1, "Honda", "Civic", 1.0, None)));
    }

    #[test]
    fn test_mileage_sort_puts_nulls_like_postgres() {
        let mut cars = vec![
            car(1, "A", "A", 1.0, None),
            car(2, "A", "A", 1.0, Some(500)),
            car(3, "A", "A", 1.0, Some(100)),
        ];

        let asc = CarQuery {
            sort: Some(SortKey::MileageAsc),
            ..Default::default()
        };
        cars.sort_by(|a, b| asc.compare(a, b));
        assert_eq!(cars.iter().map(|c| c.id).collect::<Vec<_>>(), vec![3, 2, 1]);

        let desc = CarQuery {
            sort: Some(SortKey::MileageDesc),
            ..Default::default()
        };
        cars.sort_by(|a, b| desc.compare(a, b));
        assert_eq!(cars.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
