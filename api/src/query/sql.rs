use crate::query::{Bound, CarQuery, Predicate, SortKey, TextField};
use common::persistence::schema::cars;
use diesel::dsl::count_star;
use diesel::expression::BoxableExpression;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Nullable};

pub type BoxedCars<'a> = cars::BoxedQuery<'a, Pg>;

type Condition = Box<dyn BoxableExpression<cars::table, Pg, SqlType = Nullable<Bool>>>;

/// `%needle%` with LIKE metacharacters escaped, so user input matches literally.
pub fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn ilike(field: TextField, needle: &str) -> Condition {
    let pattern = like_pattern(needle);
    match field {
        TextField::Vin => Box::new(cars::vin.ilike(pattern)),
        TextField::Make => Box::new(cars::make.ilike(pattern).nullable()),
        TextField::Model => Box::new(cars::model.ilike(pattern).nullable()),
        TextField::Trim => Box::new(cars::trim.ilike(pattern)),
        TextField::Title => Box::new(cars::title.ilike(pattern)),
        TextField::City => Box::new(cars::city.ilike(pattern)),
        TextField::State => Box::new(cars::state.ilike(pattern)),
        TextField::SellerType => Box::new(cars::seller_type.ilike(pattern)),
        TextField::ExteriorColor => Box::new(cars::exterior_color.ilike(pattern)),
        TextField::InteriorColor => Box::new(cars::interior_color.ilike(pattern)),
        TextField::Transmission => Box::new(cars::transmission.ilike(pattern)),
        TextField::Drivetrain => Box::new(cars::drivetrain.ilike(pattern)),
        TextField::FuelType => Box::new(cars::fuel_type.ilike(pattern)),
        TextField::BodyType => Box::new(cars::body_type.ilike(pattern)),
        TextField::Engine => Box::new(cars::engine.ilike(pattern)),
        TextField::AuctionStatus => Box::new(cars::auction_status.ilike(pattern)),
    }
}

fn at_least(bound: Bound) -> Condition {
    match bound {
        Bound::Year(v) => Box::new(cars::year.ge(v).nullable()),
        Bound::Price(v) => Box::new(cars::price.ge(v).nullable()),
        Bound::Mileage(v) => Box::new(cars::mileage.ge(v)),
    }
}

fn at_most(bound: Bound) -> Condition {
    match bound {
        Bound::Year(v) => Box::new(cars::year.le(v).nullable()),
        Bound::Price(v) => Box::new(cars::price.le(v).nullable()),
        Bound::Mileage(v) => Box::new(cars::mileage.le(v)),
    }
}

fn exactly(bound: Bound) -> Condition {
    match bound {
        Bound::Year(v) => Box::new(cars::year.eq(v).nullable()),
        Bound::Price(v) => Box::new(cars::price.eq(v).nullable()),
        Bound::Mileage(v) => Box::new(cars::mileage.eq(v)),
    }
}

fn condition(predicate: &Predicate) -> Option<Condition> {
    match predicate {
        Predicate::Contains(field, needle) => Some(ilike(*field, needle)),
        Predicate::AtLeast(bound) => Some(at_least(*bound)),
        Predicate::AtMost(bound) => Some(at_most(*bound)),
        Predicate::Exactly(bound) => Some(exactly(*bound)),
        Predicate::AnyContains(fields, needle) => fields
            .iter()
            .map(|field| ilike(*field, needle))
            .reduce(|acc, next| Box::new(acc.or(next))),
    }
}

/// `SELECT .. FROM cars WHERE <all predicates>`, without ordering or slicing.
pub fn filtered(query: &CarQuery) -> BoxedCars<'static> {
    query
        .predicates
        .iter()
        .filter_map(condition)
        .fold(cars::table.into_boxed(), |q, cond| q.filter(cond))
}

pub fn ordered(q: BoxedCars<'static>, sort: Option<SortKey>) -> BoxedCars<'static> {
    let q = match sort {
        Some(SortKey::PriceAsc) => q.order(cars::price.asc()),
        Some(SortKey::PriceDesc) => q.order(cars::price.desc()),
        Some(SortKey::YearDesc) => q.order(cars::year.desc()),
        Some(SortKey::YearAsc) => q.order(cars::year.asc()),
        Some(SortKey::MileageAsc) => q.order(cars::mileage.asc()),
        Some(SortKey::MileageDesc) => q.order(cars::mileage.desc()),
        Some(SortKey::PostedAtDesc) => q.order(cars::posted_at.desc()),
        None => q,
    };
    q.then_order_by(cars::id.asc())
}

/// Row count under the same predicates `filtered` applies.
pub fn counted(query: &CarQuery) -> cars::BoxedQuery<'static, Pg, diesel::sql_types::BigInt> {
    filtered(query).select(count_star())
}
