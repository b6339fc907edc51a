//! HTTP handlers for users, campaigns and vehicles (resources).

pub mod campaign;
pub mod resource;
pub mod user;

use crate::error::AppError;

/// Ids arrive as path segments or form fields. Anything that is not an integer cannot match a row,
/// so it is reported as not found rather than as a malformed request.
pub(crate) fn parse_id(id_str: &str, kind: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::NotFound(format!("{} '{}'", kind, id_str)))
}
