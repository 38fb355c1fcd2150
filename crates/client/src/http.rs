//! HTTP implementation of the booking API.

use std::time::Duration;

use async_trait::async_trait;
use common::{AppointmentId, PaymentIntentId};
use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::BookingApi;
use crate::dto::{
    AppointmentRecord, CreateAppointmentRequest, CreateAppointmentResponse,
    CreatePaymentIntentRequest, PaymentIntentDto, PaymentIntentSnapshot, ServiceDto, SlotsRequest,
    SlotsResponse,
};
use crate::error::ApiError;

/// Connection settings for [`HttpBookingApi`].
///
/// The bearer token is the explicit session context: callers hand it in
/// rather than the client reading ambient state.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Session token sent as `Authorization: Bearer …`, when present.
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpConfig {
    /// Creates a config with the default 10 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the session token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// `reqwest`-backed booking API client.
pub struct HttpBookingApi {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpBookingApi {
    /// Builds a client from the given config.
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .authorize(self.client.post(self.url(path)).json(body))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn patch_empty(&self, path: &str) -> Result<(), ApiError> {
        let response = self
            .authorize(self.client.patch(self.url(path)))
            .send()
            .await?;
        Self::check_status(response).await.map(|_| ())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Maps non-success statuses onto the error taxonomy. The backend sends
    /// `{"error": "..."}` bodies; anything else falls back to the status
    /// text.
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<serde_json::Value>().await {
            Ok(body) => body
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            Err(_) => String::new(),
        };
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        } else {
            message
        };
        tracing::warn!(status = status.as_u16(), message = %message, "backend rejected request");

        Err(match status {
            StatusCode::CONFLICT => ApiError::Conflict(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Rejected {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_active_services(&self) -> Result<Vec<ServiceDto>, ApiError> {
        self.get_json("/services/active").await
    }

    async fn available_slots(&self, request: &SlotsRequest) -> Result<SlotsResponse, ApiError> {
        self.post_json("/appointments/available-slots", request)
            .await
    }

    async fn create_appointment(
        &self,
        request: &CreateAppointmentRequest,
    ) -> Result<AppointmentId, ApiError> {
        let response: CreateAppointmentResponse = self.post_json("/appointments", request).await?;
        Ok(response.id)
    }

    async fn cancel_appointment(&self, id: AppointmentId) -> Result<(), ApiError> {
        self.patch_empty(&format!("/appointments/{id}/cancel")).await
    }

    async fn complete_appointment(&self, id: AppointmentId) -> Result<(), ApiError> {
        self.patch_empty(&format!("/appointments/{id}/complete"))
            .await
    }

    async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<PaymentIntentDto, ApiError> {
        self.post_json("/payments", request).await
    }

    async fn get_payment_intent(
        &self,
        id: PaymentIntentId,
    ) -> Result<PaymentIntentSnapshot, ApiError> {
        self.get_json(&format!("/payments/{id}")).await
    }

    async fn list_my_appointments(&self) -> Result<Vec<AppointmentRecord>, ApiError> {
        self.get_json("/appointments/mine").await
    }
}
