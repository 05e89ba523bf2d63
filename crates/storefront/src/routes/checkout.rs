//! Checkout route handlers.
//!
//! The checkout flow is stateful: opening a session creates an
//! orchestrator held in the state's session cache, and every subsequent
//! call drives that orchestrator under its own lock. The lock is what
//! serializes a double-clicked submit into one initialization request.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use boutik_checkout::orchestrator::Notice;
use boutik_checkout::{
    Catalog, CheckoutOrchestrator, CountryCode, FieldErrors, MethodId, OrderContext, SavedCustomer,
};
use boutik_core::{Amount, CheckoutPhase, CompletionShape, CurrencyCode, ProductId};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Checkout API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/checkout/countries", get(list_countries))
        .route("/api/checkout/countries/{code}/methods", get(list_methods))
        .route("/api/checkout/sessions", post(open_session))
        .route("/api/checkout/sessions/{id}", get(show_session))
        .route("/api/checkout/sessions/{id}/form", patch(update_form))
        .route(
            "/api/checkout/sessions/{id}/saved-customer",
            post(select_saved_customer),
        )
        .route("/api/checkout/sessions/{id}/submit", post(submit))
        .route("/api/checkout/sessions/{id}/otp", post(submit_otp))
        .route("/api/checkout/sessions/{id}/provider", post(run_provider))
        .route(
            "/api/checkout/sessions/{id}/provider-result",
            post(provider_result),
        )
        .route("/api/checkout/sessions/{id}/back", post(back_to_methods))
        .route("/api/checkout/sessions/{id}/notice", post(dismiss_notice))
}

// =============================================================================
// View Types
// =============================================================================

/// Country display data.
#[derive(Debug, Clone, Serialize)]
pub struct CountryView {
    pub code: &'static str,
    pub name: &'static str,
    pub dial_prefix: &'static str,
    pub currency: CurrencyCode,
}

/// Payment method display data.
#[derive(Debug, Clone, Serialize)]
pub struct MethodView {
    pub id: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub shape: CompletionShape,
}

/// Saved customer display data.
#[derive(Debug, Clone, Serialize)]
pub struct SavedCustomerView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: &'static str,
}

impl From<&SavedCustomer> for SavedCustomerView {
    fn from(customer: &SavedCustomer) -> Self {
        Self {
            name: customer.full_name(),
            email: customer.email.as_str().to_owned(),
            phone: customer.phone.digits().to_owned(),
            country: customer.country.as_str(),
        }
    }
}

/// Current form contents.
#[derive(Debug, Clone, Serialize)]
pub struct FormView {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub country: &'static str,
    pub method: Option<String>,
}

/// Full checkout snapshot returned by every session endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub id: Uuid,
    pub phase: CheckoutPhase,
    #[serde(flatten)]
    pub state: boutik_checkout::CheckoutState,
    pub form: FormView,
    pub errors: FieldErrors,
    pub methods: Vec<MethodView>,
    pub saved_customers: Vec<SavedCustomerView>,
    pub notice: Option<Notice>,
}

impl CheckoutView {
    fn build(id: Uuid, checkout: &CheckoutOrchestrator) -> Self {
        let form = checkout.form();
        Self {
            id,
            phase: checkout.phase(),
            state: checkout.state().clone(),
            form: FormView {
                email: form.email().to_owned(),
                first_name: form.first_name().to_owned(),
                last_name: form.last_name().to_owned(),
                phone: form.phone().to_owned(),
                country: form.country().as_str(),
                method: form.method().map(|m| m.as_str().to_owned()),
            },
            errors: form.errors().clone(),
            methods: checkout.available_methods().iter().map(method_view).collect(),
            saved_customers: checkout
                .saved_customers()
                .iter()
                .map(SavedCustomerView::from)
                .collect(),
            notice: checkout.notice().cloned(),
        }
    }
}

fn method_view(method: &boutik_checkout::PaymentMethod) -> MethodView {
    MethodView {
        id: method.id_str(),
        name: method.display_name(),
        country: method.country().as_str(),
        shape: method.shape(),
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Open-session request body.
#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub product_id: String,
    pub product_name: String,
    /// Price in minor units; the orchestrator falls back to its default
    /// when absent.
    pub amount: Option<u64>,
    pub currency: Option<CurrencyCode>,
}

/// Partial form update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFormRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub method: Option<String>,
}

/// Saved-customer selection body.
#[derive(Debug, Deserialize)]
pub struct SelectSavedCustomerRequest {
    pub index: usize,
}

/// One-time code body.
#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub code: String,
}

/// Outcome reported by an externally driven provider completion step.
#[derive(Debug, Deserialize)]
pub struct ProviderResultRequest {
    pub success: bool,
    /// Raw provider payload; the error message is dug out of it.
    #[serde(default)]
    pub payload: serde_json::Value,
}

// =============================================================================
// Handlers
// =============================================================================

/// List the supported checkout countries.
async fn list_countries() -> Json<Vec<CountryView>> {
    let countries = Catalog::countries()
        .iter()
        .map(|c| CountryView {
            code: c.code.as_str(),
            name: c.name,
            dial_prefix: c.dial_prefix,
            currency: c.currency,
        })
        .collect();
    Json(countries)
}

/// List payment methods for a country code. Unknown codes yield an empty
/// list rather than an error.
async fn list_methods(Path(code): Path<String>) -> Json<Vec<MethodView>> {
    Json(
        Catalog::methods_for_code(&code)
            .iter()
            .map(method_view)
            .collect(),
    )
}

/// Open a new checkout session for a product.
#[instrument(skip(state, body), fields(product = %body.product_id))]
async fn open_session(
    State(state): State<AppState>,
    Json(body): Json<OpenSessionRequest>,
) -> Result<Json<CheckoutView>> {
    let order = OrderContext {
        store_id: state.config().store_id.clone(),
        product_id: ProductId::new(body.product_id),
        product_name: body.product_name,
        amount: body.amount.map(Amount::from_minor),
        currency: body.currency.unwrap_or_default(),
    };

    let id = state.open_checkout(order).await;
    let checkout = state
        .checkout(id)
        .await
        .ok_or_else(|| AppError::Internal("session vanished on open".to_owned()))?;
    let guard = checkout.lock().await;
    Ok(Json(CheckoutView::build(id, &guard)))
}

async fn lookup(state: &AppState, id: Uuid) -> Result<crate::state::SharedCheckout> {
    state
        .checkout(id)
        .await
        .ok_or_else(|| AppError::NotFound("checkout session".to_owned()))
}

/// Current snapshot of a checkout session.
async fn show_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let guard = checkout.lock().await;
    Ok(Json(CheckoutView::build(id, &guard)))
}

/// Apply a partial form update.
#[instrument(skip(state, body))]
async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateFormRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;

    if let Some(country) = body.country {
        let code = CountryCode::parse(&country)
            .ok_or_else(|| AppError::BadRequest(format!("unknown country: {country}")))?;
        guard.set_country(code)?;
    }
    if let Some(email) = body.email {
        guard.set_email(&email)?;
    }
    if let Some(first_name) = body.first_name {
        guard.set_first_name(&first_name)?;
    }
    if let Some(last_name) = body.last_name {
        guard.set_last_name(&last_name)?;
    }
    if let Some(phone) = body.phone {
        guard.set_phone(&phone)?;
    }
    if let Some(method) = body.method {
        guard.set_method(MethodId::new(method))?;
    }

    Ok(Json(CheckoutView::build(id, &guard)))
}

/// Select (or toggle off) a saved customer.
async fn select_saved_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SelectSavedCustomerRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;
    guard.select_saved_customer(body.index)?;
    Ok(Json(CheckoutView::build(id, &guard)))
}

/// Submit the form and initialize the payment.
#[instrument(skip(state))]
async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;
    guard.submit().await?;
    Ok(Json(CheckoutView::build(id, &guard)))
}

/// Verify a one-time code.
#[instrument(skip(state, body))]
async fn submit_otp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<OtpRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;
    guard.submit_otp(&body.code).await?;
    let view = CheckoutView::build(id, &guard);
    drop(guard);
    reap_if_done(&state, id, &view).await;
    Ok(Json(view))
}

/// Drive the provider completion step server-side.
#[instrument(skip(state))]
async fn run_provider(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;
    guard.complete_via_provider().await?;
    let view = CheckoutView::build(id, &guard);
    drop(guard);
    reap_if_done(&state, id, &view).await;
    Ok(Json(view))
}

/// Record the outcome of an externally driven provider completion step.
#[instrument(skip(state, body))]
async fn provider_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ProviderResultRequest>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;

    if body.success {
        guard.provider_succeeded()?;
    } else {
        guard.provider_failed(&body.payload)?;
    }

    let view = CheckoutView::build(id, &guard);
    drop(guard);
    reap_if_done(&state, id, &view).await;
    Ok(Json(view))
}

/// Drop a session from the cache once it has reached terminal success;
/// the snapshot in hand is the last thing the client sees for this id.
async fn reap_if_done(state: &AppState, id: Uuid, view: &CheckoutView) {
    if view.phase == CheckoutPhase::Succeeded {
        state.close_checkout(id).await;
    }
}

/// Abandon the completion step and return to the form.
async fn back_to_methods(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;
    guard.back_to_methods()?;
    Ok(Json(CheckoutView::build(id, &guard)))
}

/// Dismiss the current notice.
async fn dismiss_notice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckoutView>> {
    let checkout = lookup(&state, id).await?;
    let mut guard = checkout.lock().await;
    guard.dismiss_notice();
    Ok(Json(CheckoutView::build(id, &guard)))
}
