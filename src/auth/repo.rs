use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::error::ApiError;
use crate::ids::timestamp_id;

/// User role as embedded in tokens and validated at registration. Rows carry
/// the raw column value; this enum guards the three-value set at the edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("role must be admin, instructor, or student")]
pub struct ParseRoleError;

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            _ => Err(ParseRoleError),
        }
    }
}

/// User record without the password column; safe to serialize.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339", rename = "createdAt")]
    pub created_at: OffsetDateTime,
}

/// Full user row, fetched only where credential checks need the hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithPassword {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

impl From<UserWithPassword> for User {
    fn from(u: UserWithPassword) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

impl User {
    /// Find a user by id, password excluded.
    pub async fn find_by_id(db: &PgPool, id: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

impl UserWithPassword {
    /// Find a user by email, matched case-insensitively.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<UserWithPassword>, ApiError> {
        let user = sqlx::query_as::<_, UserWithPassword>(
            r#"
            SELECT id, email, name, password, role, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}

/// Create a user with a hashed password. Duplicate emails (differing only in
/// case included) surface as a distinct conflict error, either from the
/// pre-check or from the unique index when two registrations race.
pub async fn create_user(
    db: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
    role: Role,
) -> Result<User, ApiError> {
    if UserWithPassword::find_by_email(db, email).await?.is_some() {
        return Err(ApiError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let id = timestamp_id();
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, password, role)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, email, name, role, created_at
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .bind(role.as_str())
    .fetch_one(db)
    .await
    .map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => {
            ApiError::Conflict("User with this email already exists".into())
        }
        other => other,
    })?;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_the_three_allowed_values() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("instructor").unwrap(), Role::Instructor);
        assert_eq!(Role::from_str("student").unwrap(), Role::Student);
    }

    #[test]
    fn role_rejects_anything_else() {
        assert!(Role::from_str("superuser").is_err());
        assert!(Role::from_str("Admin").is_err());
        assert!(Role::from_str("").is_err());
    }

    #[test]
    fn role_round_trips_through_display() {
        for role in [Role::Admin, Role::Instructor, Role::Student] {
            assert_eq!(Role::from_str(&role.to_string()).unwrap(), role);
        }
    }

    #[test]
    fn user_serialization_excludes_nothing_it_should_not() {
        let user = User {
            id: "1700000000000".into(),
            email: "a@x.com".into(),
            name: "A".into(),
            role: "student".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("a@x.com"));
        assert!(json.contains("createdAt"));
        assert!(!json.contains("password"));
    }
}
