use actix_session::Session;

use crate::errors::AppError;
use crate::models::user::{Role, User};

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

/// The signed-in user's id, or 401.
pub fn require_user_id(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or(AppError::Unauthorized)
}

pub fn get_role(session: &Session) -> Option<Role> {
    session
        .get::<String>("role")
        .unwrap_or(None)
        .and_then(|r| r.parse().ok())
}

/// Single role check; returns the caller's role when it is one of `allowed`.
pub fn require_role(session: &Session, allowed: &[Role]) -> Result<Role, AppError> {
    require_user_id(session)?;
    let role = get_role(session)
        .ok_or_else(|| AppError::Session("No role in session".to_string()))?;

    if allowed.contains(&role) {
        Ok(role)
    } else {
        Err(AppError::PermissionDenied(format!("role '{role}' may not do this")))
    }
}

/// Store the identity of a freshly authenticated user.
pub fn start(session: &Session, user: &User) -> Result<(), AppError> {
    session.renew();
    session
        .insert("user_id", user.id)
        .and_then(|_| session.insert("email", &user.email))
        .and_then(|_| session.insert("role", user.role.as_str()))
        .map_err(|e| AppError::Session(format!("Failed to write session: {e}")))
}
