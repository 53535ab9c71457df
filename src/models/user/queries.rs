use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use super::types::{NewUser, Role, User, UserDisplay, display_name};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

fn parse_role(raw: &str) -> Role {
    raw.parse().unwrap_or_else(|e| {
        log::warn!("{e}, treating as staff");
        Role::Staff
    })
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            role: parse_role(&row.role),
            id: row.id,
            email: row.email,
            password: row.password,
            first_name: row.first_name,
            last_name: row.last_name,
            is_active: row.is_active,
        }
    }
}

impl From<UserRow> for UserDisplay {
    fn from(row: UserRow) -> Self {
        UserDisplay {
            role: parse_role(&row.role),
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        }
    }
}

const SELECT_USER: &str = "\
    SELECT id, email, password, first_name, last_name, role, is_active, created_at \
    FROM users";

/// Find a user by email for authentication. Emails are stored lowercased.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE email = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(row.map(User::from))
}

pub async fn find_display_by_id(pool: &PgPool, id: i64) -> Result<Option<UserDisplay>, AppError> {
    let sql = format!("{SELECT_USER} WHERE id = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(UserDisplay::from))
}

/// Display names (`first last`) for the given user ids. Unknown ids are absent from the map.
pub async fn find_display_names(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, String>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, String, String)> = sqlx::query_as(
        "SELECT id, first_name, last_name FROM users WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, first, last)| (id, display_name(&first, &last)))
        .collect())
}

/// Create a new user. `new.password` must already be hashed.
pub async fn create(pool: &PgPool, new: &NewUser) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (email, password, first_name, last_name, role) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(new.email.trim().to_lowercase())
    .bind(&new.password)
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(new.role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}
