use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::courses::repo::Course;

/// Course as served to clients: price as a JSON number, timestamp RFC 3339.
#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub duration: String,
    pub price: f64,
    #[serde(with = "time::serde::rfc3339", rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

impl From<Course> for CourseResponse {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            instructor: c.instructor,
            duration: c.duration,
            // DECIMAL(10,2) values fit f64 without drift.
            price: c.price.to_f64().unwrap_or(0.0),
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub duration: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sample_course(price: Decimal) -> Course {
        Course {
            id: "1700000000000".into(),
            title: "Rust 101".into(),
            description: "Ownership and borrowing".into(),
            instructor: "A. Writer".into(),
            duration: "6 weeks".into(),
            price,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn zero_price_round_trips_without_drift() {
        let response = CourseResponse::from(sample_course(Decimal::new(0, 2)));
        assert_eq!(response.price, 0.0);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["price"], serde_json::json!(0.0));
    }

    #[test]
    fn two_decimal_prices_survive_conversion() {
        let response = CourseResponse::from(sample_course(Decimal::new(4999, 2)));
        assert_eq!(response.price, 49.99);
    }

    #[test]
    fn created_at_serializes_as_iso_timestamp() {
        let response = CourseResponse::from(sample_course(Decimal::ZERO));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["createdAt"], "1970-01-01T00:00:00Z");
    }
}
