//! End-to-end checkout state machine scenarios against a scripted
//! payment backend.

use std::sync::Arc;

use boutik_integration_tests::{MockGateway, checkout_with, order, order_without_amount};

use boutik_checkout::{CheckoutError, CheckoutState, CountryCode, MethodId};
use boutik_core::CheckoutPhase;

fn fill_ci(checkout: &mut boutik_checkout::CheckoutOrchestrator, method: &str) {
    checkout.set_email("kone@example.ci").expect("email");
    checkout.set_first_name("Mariam").expect("first name");
    checkout.set_last_name("Koné").expect("last name");
    checkout.set_phone("0712345678").expect("phone");
    checkout.set_method(MethodId::new(method)).expect("method");
}

fn fill_zm(checkout: &mut boutik_checkout::CheckoutOrchestrator) {
    checkout.set_country(CountryCode::ZM).expect("country");
    checkout.set_email("banda@example.zm").expect("email");
    checkout.set_first_name("Chanda").expect("first name");
    checkout.set_last_name("Banda").expect("last name");
    checkout.set_phone("961234567").expect("phone");
    checkout
        .set_method(MethodId::new("mtn-momo-zambia"))
        .expect("method");
}

#[tokio::test]
async fn orange_money_ci_lands_in_otp_challenge() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "orange-money-ci");

    checkout.submit().await.expect("submit");

    // The catalog shape for this provider is redirect; the method id
    // overrides it.
    assert_eq!(
        checkout.state(),
        &CheckoutState::OtpChallenge { expected_len: 4 }
    );
    assert_eq!(checkout.phase(), CheckoutPhase::AwaitingCompletion);
}

#[tokio::test]
async fn sibling_ci_provider_lands_in_redirect_handoff() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");

    checkout.submit().await.expect("submit");
    assert_eq!(checkout.state(), &CheckoutState::RedirectHandoff);
}

#[tokio::test]
async fn initialization_request_carries_the_wire_contract() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");

    checkout.submit().await.expect("submit");

    let requests = gateway.init_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.store_id.as_str(), "btk-7201");
    assert_eq!(request.amount.minor(), 6500);
    assert_eq!(request.payment_method.as_str(), "wave-ci");
    assert_eq!(request.payment_country, "Côte d'Ivoire");
    assert_eq!(request.customer.first_name, "Mariam");
    assert_eq!(request.customer.phone.digits(), "0712345678");
}

#[tokio::test]
async fn missing_amount_falls_back_to_one_thousand_minor_units() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order_without_amount(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");

    checkout.submit().await.expect("submit");

    assert_eq!(gateway.init_requests()[0].amount.minor(), 1000);
}

#[tokio::test]
async fn declined_initialization_recovers_to_the_form() {
    let gateway = Arc::new(MockGateway::new());
    gateway.queue_init_failure("store closed");

    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");

    let error = checkout.submit().await.expect_err("should decline");
    assert!(matches!(error, CheckoutError::Initialization(_)));
    assert_eq!(checkout.state(), &CheckoutState::CollectingInfo);
    assert!(checkout.session().is_none());
    assert_eq!(checkout.notice().expect("notice").message, "store closed");

    // Nothing was consumed: the customer resubmits the same form.
    checkout.submit().await.expect("second submit");
    assert_eq!(checkout.state(), &CheckoutState::RedirectHandoff);
    assert!(checkout.session().expect("session").token.is_some());
}

#[tokio::test]
async fn provider_error_keeps_the_payment_token() {
    let gateway = Arc::new(MockGateway::new());
    gateway.queue_init_token("tok-X");

    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");
    checkout.submit().await.expect("submit");

    let token_before = checkout
        .session()
        .expect("session")
        .token
        .clone()
        .expect("token");

    let message = checkout
        .provider_failed(&serde_json::json!({
            "response": {"message": "solde insuffisant"}
        }))
        .expect("callback");

    assert_eq!(message, "solde insuffisant");
    assert_eq!(checkout.state(), &CheckoutState::RedirectHandoff);
    assert_eq!(
        checkout.session().expect("session").token.clone().expect("token"),
        token_before,
    );
}

#[tokio::test]
async fn provider_error_message_extraction_is_defensive() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");
    checkout.submit().await.expect("submit");

    // Bare string payload.
    let message = checkout
        .provider_failed(&serde_json::json!("operator timeout"))
        .expect("callback");
    assert_eq!(message, "operator timeout");

    // PayDunya envelope.
    let message = checkout
        .provider_failed(&serde_json::json!({
            "paydunya_response": {"message": "transaction annulée"}
        }))
        .expect("callback");
    assert_eq!(message, "transaction annulée");

    // Unrecognized shape falls back to a generic message.
    let message = checkout
        .provider_failed(&serde_json::json!({"code": 17}))
        .expect("callback");
    assert!(message.contains("Try again"));
}

#[tokio::test]
async fn otp_retries_reuse_the_same_token() {
    let gateway = Arc::new(MockGateway::new());
    gateway.queue_init_token("tok-otp");
    gateway.queue_otp_outcome(false, "wrong code");
    gateway.queue_otp_outcome(true, "");

    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "orange-money-ci");
    checkout.submit().await.expect("submit");

    assert!(!checkout.submit_otp("1111").await.expect("first try"));
    assert_eq!(checkout.notice().expect("notice").message, "wrong code");
    assert_eq!(
        checkout.state(),
        &CheckoutState::OtpChallenge { expected_len: 4 }
    );

    assert!(checkout.submit_otp("2222").await.expect("second try"));
    assert_eq!(checkout.state(), &CheckoutState::Succeeded);

    // Both verifications carried the same token and an E.164 number.
    let requests = gateway.otp_requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.payment_token.as_str() == "tok-otp"));
    assert!(requests.iter().all(|r| r.phone_number == "+2250712345678"));
}

#[tokio::test]
async fn short_otp_never_reaches_the_gateway() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "orange-money-ci");
    checkout.submit().await.expect("submit");

    let error = checkout.submit_otp("12").await.expect_err("too short");
    assert!(matches!(error, CheckoutError::OtpFormat { expected: 4 }));
    assert!(gateway.otp_requests().is_empty());
}

#[tokio::test]
async fn direct_provider_finalizes_server_side() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_zm(&mut checkout);

    checkout.submit().await.expect("submit");
    assert_eq!(checkout.state(), &CheckoutState::DirectResult);

    checkout.complete_via_provider().await.expect("finalize");
    assert_eq!(checkout.state(), &CheckoutState::Succeeded);

    let requests = gateway.process_requests();
    assert_eq!(requests.len(), 1);
    let (method, request) = &requests[0];
    assert_eq!(method.as_str(), "mtn-momo-zambia");
    assert_eq!(request.phone_number, "+260961234567");
    assert_eq!(request.customer_name, "Chanda Banda");
}

#[tokio::test]
async fn failed_direct_finalization_is_retryable() {
    let gateway = Arc::new(MockGateway::new());
    gateway.queue_process_failure("wallet unreachable");

    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_zm(&mut checkout);
    checkout.submit().await.expect("submit");

    let error = checkout.complete_via_provider().await.expect_err("fails");
    assert!(matches!(error, CheckoutError::Provider(_)));
    assert_eq!(checkout.state(), &CheckoutState::DirectResult);
    assert!(checkout.session().expect("session").token.is_some());

    // Second attempt succeeds without re-initializing.
    checkout.complete_via_provider().await.expect("retry");
    assert_eq!(checkout.state(), &CheckoutState::Succeeded);
    assert_eq!(gateway.init_requests().len(), 1);
}

#[tokio::test]
async fn backing_out_discards_the_token_and_unlocks_the_method() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");
    checkout.submit().await.expect("submit");

    // The session is bound to wave-ci; switching methods is refused.
    assert!(matches!(
        checkout.set_method(MethodId::new("moov-ci")),
        Err(CheckoutError::InvalidTransition(_))
    ));

    checkout.back_to_methods().expect("back");
    assert!(checkout.session().is_none());
    checkout.set_method(MethodId::new("moov-ci")).expect("retry");

    checkout.submit().await.expect("resubmit");
    assert_eq!(gateway.init_requests().len(), 2);
    assert_eq!(gateway.init_requests()[1].payment_method.as_str(), "moov-ci");
}

#[tokio::test]
async fn submit_after_success_is_refused() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");
    checkout.submit().await.expect("submit");
    checkout.provider_succeeded().expect("success");

    assert_eq!(checkout.state(), &CheckoutState::Succeeded);
    assert!(matches!(
        checkout.submit().await,
        Err(CheckoutError::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn successful_submit_remembers_the_customer() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    fill_ci(&mut checkout, "wave-ci");

    assert!(checkout.saved_customers().is_empty());
    checkout.submit().await.expect("submit");

    let saved = checkout.saved_customers();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].email.as_str(), "kone@example.ci");
    assert_eq!(saved[0].country, CountryCode::CI);
}

#[tokio::test]
async fn validation_failure_never_contacts_the_gateway() {
    let gateway = Arc::new(MockGateway::new());
    let mut checkout = checkout_with(order(), Arc::clone(&gateway));
    checkout.set_email("not-an-email").expect("email");

    let error = checkout.submit().await.expect_err("invalid form");
    assert!(matches!(error, CheckoutError::Validation(_)));
    assert!(gateway.init_requests().is_empty());
}
