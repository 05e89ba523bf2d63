//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use boutik_checkout::gateway::GatewayConfig;
use boutik_checkout::vault::{JsonFileStore, MemoryStore};
use boutik_checkout::{
    CheckoutOrchestrator, CustomerVault, GatewayError, HandlerRegistry, HttpPaymentGateway,
    OrderContext, PaymentGateway,
};

use crate::config::StorefrontConfig;

/// How long an untouched checkout session stays alive.
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on concurrently open checkout sessions.
const SESSION_CAPACITY: u64 = 10_000;

/// A live checkout, shared between the cache and in-flight requests.
pub type SharedCheckout = Arc<Mutex<CheckoutOrchestrator>>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// gateway client, the customer vault, the handler registry, and the live
/// checkout sessions.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    gateway: Arc<dyn PaymentGateway>,
    vault: Arc<CustomerVault>,
    registry: Arc<HandlerRegistry>,
    sessions: Cache<Uuid, SharedCheckout>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway HTTP client fails to build.
    pub fn new(config: StorefrontConfig) -> Result<Self, GatewayError> {
        let gateway = HttpPaymentGateway::new(&GatewayConfig {
            base_url: config.gateway_url.clone(),
            api_key: config.gateway_api_key.clone(),
        })?;

        let vault = CustomerVault::new(
            Box::new(MemoryStore::new()),
            Box::new(JsonFileStore::new(&config.vault_path)),
        );

        let sessions = Cache::builder()
            .max_capacity(SESSION_CAPACITY)
            .time_to_idle(SESSION_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway: Arc::new(gateway),
                vault: Arc::new(vault),
                registry: Arc::new(HandlerRegistry::from_catalog()),
                sessions,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Open a new checkout session and return its id.
    pub async fn open_checkout(&self, order: OrderContext) -> Uuid {
        let id = Uuid::new_v4();
        let checkout = CheckoutOrchestrator::new(
            order,
            Arc::clone(&self.inner.vault),
            Arc::clone(&self.inner.gateway),
            Arc::clone(&self.inner.registry),
        );
        self.inner
            .sessions
            .insert(id, Arc::new(Mutex::new(checkout)))
            .await;
        id
    }

    /// Look up a live checkout session.
    pub async fn checkout(&self, id: Uuid) -> Option<SharedCheckout> {
        self.inner.sessions.get(&id).await
    }

    /// Drop a checkout session (after terminal success).
    pub async fn close_checkout(&self, id: Uuid) {
        self.inner.sessions.invalidate(&id).await;
    }
}
