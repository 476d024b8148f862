//! HTTP surface of the backend, one router per audience.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod admin;
pub mod health;
pub mod player;
pub mod public;
pub mod sse;

/// Compose the API route trees and mount the Swagger UI at `/docs`.
pub fn router(state: SharedState) -> Router<()> {
    let api = health::router()
        .merge(sse::router())
        .merge(public::router())
        .merge(player::router())
        .merge(admin::router(state.clone()));

    let swagger: Router<SharedState> = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into();

    api.merge(swagger).with_state(state)
}
