//! Edge gateway for a retrieval-augmented chat API.
//!
//! An inbound chat request is authenticated ([`auth`]), validated
//! ([`validation`]), dispatched to the chat use case ([`usecase`]) and answered
//! either as one JSON document or as a Server-Sent-Events stream ([`sse`]).
//! [`gateway::ChatGateway`] drives a request through those steps; [`router`]
//! exposes it over HTTP.

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod response;
pub mod sse;
pub mod telemetry;
pub mod usecase;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use crate::{
    gateway::ChatGateway,
    handlers::AppState,
};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/v1/chat/completions", post(handlers::chat_completions))
        .with_state(state)
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
