//! Subgate HTTP API Service.
//!
//! This crate provides the HTTP API for the subgate order engine, including:
//!
//! - User registration and referral bookkeeping
//! - Offer placement, confirmation, rejection and status lookup
//! - Panel credential provisioning and bulk re-provisioning
//! - Shop settings administration
//! - Periodic maintenance sweeps
//!
//! # Authentication
//!
//! Every `/v1` endpoint requires the service API key in the `x-api-key`
//! header; `/health` is public. The key guard is disabled when no key is
//! configured, which is meant for local development only.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod notify;
pub mod orders;
pub mod routes;
pub mod state;

pub use config::{ServiceConfig, ShopSettings};
pub use error::ApiError;
pub use notify::{Notice, Notifier, NotifyError};
pub use routes::create_router;
pub use state::AppState;
