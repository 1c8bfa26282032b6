// handlers/mod.rs - Resource handlers
//
// Handlers never check permissions themselves; every route is registered
// through `api::registry::RouteRegistry`, which gates it before the handler
// runs. Routes that need the caller read the `Principal` the gate inserted.

pub mod auth;
pub mod categories;
pub mod comments;
pub mod languages;
pub mod notifications;
pub mod questions;
pub mod stories;
pub mod system;
pub mod users;

use uuid::Uuid;

use crate::database::{Record, Repository};
use crate::error::ApiError;

/// 422 unless `id` names an existing record in `repo`
pub(crate) async fn ensure_exists<T: Record>(
    repo: &dyn Repository<T>,
    id: Uuid,
    field: &str,
) -> Result<(), ApiError> {
    if repo.exists(id).await? {
        Ok(())
    } else {
        Err(ApiError::missing_reference(field, id))
    }
}
