use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    courses::{
        dto::{CourseResponse, CreateCourseRequest, DeletedResponse, UpdateCourseRequest},
        repo::{Course, CoursePatch, NewCourse},
    },
    error::{ApiError, JsonBody},
    state::AppState,
};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/:id",
            get(get_course).put(update_course).delete(delete_course),
        )
}

fn parse_price(price: f64) -> Result<Decimal, ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::Validation(
            "Price must be a non-negative number".into(),
        ));
    }
    Decimal::from_f64_retain(price)
        .ok_or_else(|| ApiError::Validation("Price must be a non-negative number".into()))
}

#[instrument(skip(state, _auth))]
pub async fn list_courses(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = Course::list_all(&state.db).await?;
    Ok(Json(courses.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, _auth))]
pub async fn get_course(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = Course::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;
    Ok(Json(course.into()))
}

#[instrument(skip(state, auth, body))]
pub async fn create_course(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    let (title, description, instructor, duration, price) = match (
        body.title,
        body.description,
        body.instructor,
        body.duration,
        body.price,
    ) {
        (Some(t), Some(d), Some(i), Some(du), Some(p)) => (t, d, i, du, p),
        _ => return Err(ApiError::Validation("Missing required fields".into())),
    };

    let course = Course::insert(
        &state.db,
        NewCourse {
            title,
            description,
            instructor,
            duration,
            price: parse_price(price)?,
        },
    )
    .await?;

    info!(course_id = %course.id, user_id = %auth.user.id, "course created");
    Ok((StatusCode::CREATED, Json(course.into())))
}

#[instrument(skip(state, auth, body))]
pub async fn update_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let patch = CoursePatch {
        title: body.title,
        description: body.description,
        instructor: body.instructor,
        duration: body.duration,
        price: body.price.map(parse_price).transpose()?,
    };

    let course = Course::update(&state.db, &id, patch)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    info!(course_id = %course.id, user_id = %auth.user.id, "course updated");
    Ok(Json(course.into()))
}

#[instrument(skip(state, auth))]
pub async fn delete_course(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let deleted = Course::delete(&state.db, &id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Course not found".into()));
    }

    info!(course_id = %id, user_id = %auth.user.id, "course deleted");
    Ok(Json(DeletedResponse {
        message: "Course deleted successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_price_accepts_zero_and_positive_values() {
        assert_eq!(parse_price(0.0).unwrap(), Decimal::ZERO);
        assert_eq!(parse_price(49.99).unwrap(), Decimal::from_f64_retain(49.99).unwrap());
    }

    #[test]
    fn parse_price_rejects_negative_and_non_finite() {
        assert!(parse_price(-0.01).is_err());
        assert!(parse_price(f64::NAN).is_err());
        assert!(parse_price(f64::INFINITY).is_err());
    }
}
