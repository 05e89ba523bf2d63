//! Payment backend client.
//!
//! The backend exposes one initialization endpoint and one processing
//! endpoint per provider; the OTP check for Orange Money Côte d'Ivoire
//! rides on that provider's processing path. Everything is JSON over
//! HTTP and every call returns an explicit `Result` - the state machine
//! never sees an exception-shaped control flow.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use boutik_core::{Amount, CurrencyCode, Email, PaymentToken, PhoneNumber, ProductId, StoreId};

use crate::catalog::MethodId;

/// Processing path that also verifies one-time codes.
const OTP_ENDPOINT: &str = "process-orange-money-ci-payment";

/// Errors that can occur when talking to the payment backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        message: String,
    },

    /// Backend answered 200 but declined the operation.
    #[error("{message}")]
    Rejected {
        /// Backend-provided reason.
        message: String,
    },

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// A message safe to put in front of the customer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message } => message.clone(),
            Self::Http(_) | Self::Api { .. } | Self::Parse(_) => {
                "The payment service is unreachable. Please try again.".to_owned()
            }
        }
    }
}

/// Gateway connection settings.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL of the payment backend, without a trailing slash.
    pub base_url: String,
    /// Optional bearer key sent on every request.
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Customer identity block of the initialization request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: PhoneNumber,
}

/// Body of `POST /payment/initialize`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentRequest {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub product_name: String,
    pub amount: Amount,
    pub currency: CurrencyCode,
    pub customer: CustomerDetails,
    pub payment_method: MethodId,
    /// Country display name, as the backend expects it.
    pub payment_country: String,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    success: bool,
    #[serde(default)]
    data: Option<InitializeData>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    token: String,
}

/// Body of `POST /process-{method-id}-payment`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessPaymentRequest {
    /// E.164 number the provider should bill.
    pub phone_number: String,
    pub payment_token: PaymentToken,
    pub customer_name: String,
    pub customer_email: Email,
    pub amount: Amount,
    pub currency: CurrencyCode,
}

/// Successful processing outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPaymentResponse {
    /// Backend message, when one was provided.
    #[serde(default)]
    pub message: Option<String>,
    /// Where to send the customer for provider-hosted completion.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProcessWireResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    redirect_url: Option<String>,
}

/// Body of the OTP verification call.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub phone_number: String,
    pub otp: String,
    pub payment_token: PaymentToken,
    pub customer_name: String,
    pub customer_email: Email,
}

/// Outcome of an OTP verification. A wrong code is a normal outcome, not
/// an error: the customer may retry against the same token.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// The payment backend, as the orchestrator sees it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initialize a payment and obtain its token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] when the backend declines,
    /// or a transport-level variant when the call itself fails.
    async fn initialize_payment(
        &self,
        request: &InitializePaymentRequest,
    ) -> Result<PaymentToken, GatewayError>;

    /// Run a provider's processing step for an initialized payment.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Rejected`] when the provider declines,
    /// or a transport-level variant when the call itself fails.
    async fn process_payment(
        &self,
        method: &MethodId,
        request: &ProcessPaymentRequest,
    ) -> Result<ProcessPaymentResponse, GatewayError>;

    /// Verify a one-time code against an initialized payment.
    ///
    /// # Errors
    ///
    /// Returns a transport-level [`GatewayError`] when the call fails;
    /// a wrong code is reported through [`OtpOutcome::success`].
    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<OtpOutcome, GatewayError>;
}

/// HTTP implementation of [`PaymentGateway`].
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentGateway {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the API key
    /// is not a valid header value.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        if let Some(key) = &config.api_key {
            let value = format!("Bearer {}", key.expose_secret());
            headers.insert(
                "Authorization",
                HeaderValue::from_str(&value)
                    .map_err(|e| GatewayError::Parse(format!("invalid API key: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn post_json<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, GatewayError> {
        let url = format!("{}/{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn initialize_payment(
        &self,
        request: &InitializePaymentRequest,
    ) -> Result<PaymentToken, GatewayError> {
        let response: InitializeResponse = self.post_json("payment/initialize", request).await?;

        match (response.success, response.data) {
            (true, Some(data)) => Ok(PaymentToken::new(data.token)),
            (true, None) => Err(GatewayError::Parse(
                "initialization succeeded without a token".to_owned(),
            )),
            (false, _) => Err(GatewayError::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| "Payment could not be initialized.".to_owned()),
            }),
        }
    }

    async fn process_payment(
        &self,
        method: &MethodId,
        request: &ProcessPaymentRequest,
    ) -> Result<ProcessPaymentResponse, GatewayError> {
        let path = format!("process-{method}-payment");
        let response: ProcessWireResponse = self.post_json(&path, request).await?;

        if response.success {
            Ok(ProcessPaymentResponse {
                message: response.message,
                redirect_url: response.redirect_url,
            })
        } else {
            Err(GatewayError::Rejected {
                message: response
                    .message
                    .unwrap_or_else(|| "The payment was not accepted.".to_owned()),
            })
        }
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<OtpOutcome, GatewayError> {
        self.post_json(OTP_ENDPOINT, request).await
    }
}

/// Pull a human-readable message out of whatever shape a provider error
/// arrives in.
///
/// Providers are not consistent: some nest the message under `response`,
/// some put it at the top level, some return a bare string, and the
/// PayDunya-backed ones wrap it in `paydunya_response`. Checked in that
/// order.
#[must_use]
pub fn extract_error_message(payload: &serde_json::Value) -> Option<String> {
    let candidates = [
        payload.pointer("/response/message"),
        payload.pointer("/message"),
        Some(payload),
        payload.pointer("/paydunya_response/message"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str())
        .map(str::to_owned)
}
