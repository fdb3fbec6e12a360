//! Checkout gateway used to verify paid registrations.
//!
//! Provider sign-up is gated on a completed checkout session: the frontend
//! runs the payment and hands the session id back to us, and we retrieve the
//! session to check `payment_status` and read the registration details the
//! checkout flow stowed in its metadata. `StripeCheckout` talks to the real
//! API; `MockCheckout` serves development and tests.

use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Checkout gateway result.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Failure modes when retrieving a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout session `{0}` not found")]
    SessionNotFound(String),
    #[error("checkout gateway error: {0}")]
    Gateway(String),
}

/// A retrieved checkout session.
///
/// `metadata` carries the registration fields the checkout flow attached
/// when the session was created (email, pre-hashed password, profile and
/// listing details).
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub payment_status: String,
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// Whether the session's payment went through.
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// Abstraction over the checkout provider.
///
/// Object-safe so the account service can hold `Arc<dyn CheckoutGateway>`
/// and tests can swap in the mock.
pub trait CheckoutGateway: Send + Sync {
    /// Retrieve a checkout session by id.
    fn fetch_session(
        &self,
        session_id: &str,
    ) -> Pin<Box<dyn Future<Output = CheckoutResult<CheckoutSession>> + Send>>;
}

const STRIPE_API_BASE: &str = "https://api.stripe.com";

/// Gateway backed by the Stripe Checkout Sessions API.
#[derive(Clone)]
pub struct StripeCheckout {
    client: reqwest::Client,
    secret_key: String,
}

/// Wire shape of the fields we read from a Stripe session.
#[derive(Debug, Deserialize)]
struct StripeSessionPayload {
    payment_status: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl StripeCheckout {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key: secret_key.into(),
        }
    }

    /// Arc-wrapped instance for sharing across services.
    pub fn shared(secret_key: impl Into<String>) -> Arc<dyn CheckoutGateway> {
        Arc::new(Self::new(secret_key))
    }
}

impl CheckoutGateway for StripeCheckout {
    fn fetch_session(
        &self,
        session_id: &str,
    ) -> Pin<Box<dyn Future<Output = CheckoutResult<CheckoutSession>> + Send>> {
        let client = self.client.clone();
        let secret_key = self.secret_key.clone();
        let session_id = session_id.to_string();
        let url = format!("{}/v1/checkout/sessions/{}", STRIPE_API_BASE, session_id);

        Box::pin(async move {
            let response = client
                .get(&url)
                .bearer_auth(&secret_key)
                .send()
                .await
                .map_err(|err| CheckoutError::Gateway(err.to_string()))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(CheckoutError::SessionNotFound(session_id));
            }
            if !response.status().is_success() {
                return Err(CheckoutError::Gateway(format!(
                    "unexpected status {} retrieving session",
                    response.status()
                )));
            }

            let payload: StripeSessionPayload = response
                .json()
                .await
                .map_err(|err| CheckoutError::Gateway(err.to_string()))?;

            Ok(CheckoutSession {
                id: session_id,
                payment_status: payload.payment_status,
                metadata: payload.metadata,
            })
        })
    }
}

/// In-memory gateway for development and testing.
///
/// Sessions are registered up front with `insert_session`; lookups for
/// anything else report `SessionNotFound`, mirroring the real API.
#[derive(Clone, Default)]
pub struct MockCheckout {
    sessions: Arc<Mutex<HashMap<String, CheckoutSession>>>,
}

impl MockCheckout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arc-wrapped instance for sharing across services.
    pub fn shared() -> Arc<dyn CheckoutGateway> {
        Arc::new(Self::new())
    }

    /// Register a session the gateway should hand back.
    pub fn insert_session(&self, session: CheckoutSession) {
        let mut sessions = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sessions.insert(session.id.clone(), session);
    }
}

impl CheckoutGateway for MockCheckout {
    fn fetch_session(
        &self,
        session_id: &str,
    ) -> Pin<Box<dyn Future<Output = CheckoutResult<CheckoutSession>> + Send>> {
        let sessions = Arc::clone(&self.sessions);
        let session_id = session_id.to_string();

        Box::pin(async move {
            let sessions = sessions.lock().unwrap_or_else(PoisonError::into_inner);
            sessions
                .get(&session_id)
                .cloned()
                .ok_or(CheckoutError::SessionNotFound(session_id))
        })
    }
}
