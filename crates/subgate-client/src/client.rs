//! Subgate HTTP client implementation.

use reqwest::Client;
use std::time::Duration;

use subgate_core::User;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, CreateOfferRequest, OfferDetail, RecreateRequest, RecreateResponse,
    RegisterUserRequest, ShopSettings, StatusView,
};

/// Subgate API client.
///
/// Provides one typed method per service route. Every request carries the
/// shared `x-api-key`.
#[derive(Debug, Clone)]
pub struct SubgateClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SubgateClient {
    /// Create a new subgate client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the subgate service (e.g., `"http://subgate:8080"`)
    /// * `api_key` - Shared API key for authentication
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_options(base_url, api_key, ClientOptions::default())
    }

    /// Create a new subgate client with custom options.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        options: ClientOptions,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Register a user with the shop.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error;
    /// [`ClientError::Forbidden`] when the participant limit is reached.
    pub async fn register_user(&self, request: RegisterUserRequest) -> Result<User, ClientError> {
        let url = format!("{}/v1/users", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Place an order for a tier.
    ///
    /// Free-trial orders may come back already confirmed when the shop is
    /// configured to auto-accept them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn create_offer(
        &self,
        request: CreateOfferRequest,
    ) -> Result<OfferDetail, ClientError> {
        let url = format!("{}/v1/offers", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch the subscription status view for a user's latest offer.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the user has no active order;
    /// other errors if the request fails.
    pub async fn latest_offer(&self, user_id: i64) -> Result<StatusView, ClientError> {
        let url = format!("{}/v1/offers/latest?user_id={user_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Confirm a pending offer, provisioning its panel credential.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Conflict`] when the offer is already
    /// confirmed; other errors if the request fails.
    pub async fn confirm_offer(&self, offer_id: i64) -> Result<OfferDetail, ClientError> {
        let url = format!("{}/v1/offers/{offer_id}/confirm", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Reject a pending offer, deleting it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Conflict`] when the offer was already
    /// confirmed; other errors if the request fails.
    pub async fn reject_offer(&self, offer_id: i64) -> Result<(), ClientError> {
        let url = format!("{}/v1/offers/{offer_id}/reject", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        self.handle_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Recreate live panel credentials for the given users.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or any credential cannot be
    /// recreated.
    pub async fn recreate_offers(
        &self,
        users: Vec<i64>,
        notify: bool,
    ) -> Result<RecreateResponse, ClientError> {
        let url = format!("{}/v1/offers/recreate", self.base_url);
        let request = RecreateRequest { users, notify };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Fetch the current runtime shop settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn shop_settings(&self) -> Result<ShopSettings, ClientError> {
        let url = format!("{}/v1/admin/settings", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Replace the runtime shop settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the settings are invalid.
    pub async fn update_shop_settings(
        &self,
        settings: &ShopSettings,
    ) -> Result<ShopSettings, ClientError> {
        let url = format!("{}/v1/admin/settings", self.base_url);

        let response = self
            .client
            .put(&url)
            .header("x-api-key", &self.api_key)
            .json(settings)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.error.code.as_str();
                let message = api_error.error.message;
                tracing::debug!(code, status = status.as_u16(), "API error response");

                // Map specific error codes to typed errors
                match code {
                    "not_found" => Err(ClientError::NotFound(message)),
                    "conflict" => Err(ClientError::Conflict(message)),
                    "forbidden" => Err(ClientError::Forbidden(message)),
                    _ => Err(ClientError::Api {
                        code: code.to_string(),
                        message,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}
