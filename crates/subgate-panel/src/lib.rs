//! Provisioning client for the session-cookie access panel.
//!
//! The panel is a dashboard managing one shared inbound; every subscription
//! becomes a named client on that inbound. This crate wraps the dashboard's
//! form-POST API behind [`PanelClient`]:
//!
//! - session handling: cookie cached per client, renewed once on rejection
//! - inbound discovery and one-time creation ([`PanelClient::init_inbound`])
//! - credential provisioning, lookup and soft deletion
//! - connection-string assembly from the inbound's stream settings
//!
//! Absent credentials are reported as `Ok(None)` / no-op deletes; a panel
//! `success: false` envelope is an operation rejection
//! ([`PanelError::Api`]), not an authorization failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod link;
mod wire;

pub use client::{Credential, PanelClient, PanelConfig};
pub use error::PanelError;
