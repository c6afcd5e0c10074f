//! Resource CRUD routes. Handlers resolve the resource from the path segment.

use crate::handlers::resource::{create, delete as delete_handler, list, patch, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    Router::new()
        .route("/:path_segment", get(list).post(create))
        .route(
            "/:path_segment/:id",
            get(read).put(update).patch(patch).delete(delete_handler),
        )
        .with_state(state)
}
