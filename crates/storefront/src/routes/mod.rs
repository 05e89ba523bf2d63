//! Route handlers for the storefront API.

pub mod checkout;

use axum::Router;

use crate::state::AppState;

/// Assemble all storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(checkout::routes())
}
