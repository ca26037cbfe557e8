//! Subgate Client SDK.
//!
//! This crate provides a client library for collaborators (typically the
//! notification bot) to interact with the subgate API.
//!
//! # Example
//!
//! ```no_run
//! use subgate_client::{CreateOfferRequest, SubgateClient};
//!
//! # async fn example() -> Result<(), subgate_client::ClientError> {
//! let client = SubgateClient::new("http://subgate:8080", "your-api-key");
//!
//! // Place an order for tier "light" under the default promo
//! let detail = client
//!     .create_offer(CreateOfferRequest {
//!         user_id: 42,
//!         tier_id: "light".to_string(),
//!         promo_id: None,
//!     })
//!     .await?;
//!
//! println!("Offer {} priced at {}", detail.offer_id, detail.to_pay);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, SubgateClient};
pub use error::ClientError;
pub use types::*;
