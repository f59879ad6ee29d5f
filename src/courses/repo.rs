use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::ids::timestamp_id;

/// Course row. `created_by` exists in the schema as a weak reference to the
/// creating user but is not populated by this layer.
#[derive(Debug, Clone, FromRow)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub duration: String,
    pub price: Decimal,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub instructor: String,
    pub duration: String,
    pub price: Decimal,
}

/// Partial update: each present field maps to exactly one column assignment
/// in a fixed query; absent fields leave the stored value untouched.
#[derive(Debug, Default, Clone)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructor: Option<String>,
    pub duration: Option<String>,
    pub price: Option<Decimal>,
}

impl CoursePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.instructor.is_none()
            && self.duration.is_none()
            && self.price.is_none()
    }
}

impl Course {
    /// All courses, newest first.
    pub async fn list_all(db: &PgPool) -> Result<Vec<Course>, ApiError> {
        let rows = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, instructor, duration, price, created_at
            FROM courses
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: &str) -> Result<Option<Course>, ApiError> {
        let row = sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, instructor, duration, price, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn insert(db: &PgPool, new: NewCourse) -> Result<Course, ApiError> {
        let id = timestamp_id();
        let row = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, title, description, instructor, duration, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, instructor, duration, price, created_at
            "#,
        )
        .bind(&id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.instructor)
        .bind(&new.duration)
        .bind(new.price)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    /// Apply a patch. NULL binds keep the stored column; an empty patch is a
    /// no-op that returns the unchanged row. None means no such course.
    pub async fn update(
        db: &PgPool,
        id: &str,
        patch: CoursePatch,
    ) -> Result<Option<Course>, ApiError> {
        if patch.is_empty() {
            return Self::find_by_id(db, id).await;
        }

        let row = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                instructor = COALESCE($4, instructor),
                duration = COALESCE($5, duration),
                price = COALESCE($6, price)
            WHERE id = $1
            RETURNING id, title, description, instructor, duration, price, created_at
            "#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.instructor)
        .bind(patch.duration)
        .bind(patch.price)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Whether a row was actually removed; deleting twice reports false the
    /// second time.
    pub async fn delete(db: &PgPool, id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_detected() {
        assert!(CoursePatch::default().is_empty());
    }

    #[test]
    fn patch_with_any_field_is_not_empty() {
        let patch = CoursePatch {
            price: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(!patch.is_empty());

        let patch = CoursePatch {
            title: Some("Rust 101".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
