
use std::time::Duration;

use miette::Diagnostic;
use serde_json::json;
use payslip_rs::error::{ErrorDetail, ErrorResponse};
use payslip_rs::entities::PayrollRecord;
use payslip_rs::{ApiEndpoint, Config, Error, Session};
use test_utils::{ADMIN, MockBackend};

#[test]
fn test_message_detail_handling() {
    let body = json!({"detail": "Employee not found"}).to_string();
    let response = ErrorResponse::parse(&body).expect("detail body should parse");

    assert!(matches!(response.detail, ErrorDetail::Message(_)));
    assert_eq!(response.to_string(), "Employee not found");
    assert_eq!(response.field(), None);
}

#[test]
fn test_field_error_handling() {
    let body = json!({
        "detail": [
            {"loc": ["body", "base_salary"], "msg": "value is not a valid float", "type": "type_error.float"},
            {"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error.email"}
        ]
    })
    .to_string();
    let response = ErrorResponse::parse(&body).expect("field errors should parse");

    assert_eq!(response.field().as_deref(), Some("base_salary"));
    assert_eq!(
        response.to_string(),
        "base_salary: value is not a valid float; email: value is not a valid email address"
    );
}

#[test]
fn test_non_backend_bodies_are_ignored() {
    assert!(ErrorResponse::parse("<html>Bad Gateway</html>").is_none());
    assert!(ErrorResponse::parse(r#"{"error": "nope"}"#).is_none());
}

#[test]
fn test_error_codes_and_display() {
    let error = Error::Validation {
        field: Some("amount".into()),
        message: "amount must be greater than zero".into(),
    };
    assert_eq!(
        error.to_string(),
        "invalid input for `amount`: amount must be greater than zero"
    );
    assert_eq!(
        error.code().map(|c| c.to_string()).as_deref(),
        Some("payslip_rs::validation")
    );
    assert!(!error.is_transient());

    let limited = Error::RateLimitExceeded {
        retry_after: Some(Duration::from_secs(2)),
        url: "http://localhost/api/payroll".into(),
        response_body: None,
    };
    assert!(limited.is_transient());
    assert_eq!(limited.url(), Some("http://localhost/api/payroll"));
}

#[tokio::test]
async fn test_unreachable_backend_is_a_request_error() {
    test_utils::do_setup();
    // Nothing listens on the discard port.
    let config = Config::new("http://127.0.0.1:9/api")
        .unwrap()
        .with_request_timeout(Duration::from_secs(2));
    let session = Session::new(config).unwrap();

    match session.login(ADMIN.0, ADMIN.1).await {
        Err(e @ (Error::Request { .. } | Error::Timeout { .. })) => {
            assert!(e.is_transient());
            assert!(e.span_trace().is_some());
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_expired_token_is_an_authentication_error() {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let session = backend.session();
    session
        .client()
        .set_credential(Some(payslip_rs::AccessToken::new("token-stale".into())))
        .await;

    let result: payslip_rs::Result<Vec<PayrollRecord>> = session.client().get(ApiEndpoint::Payroll).await;
    match result {
        Err(Error::Authentication { message }) => assert_eq!(message, "Invalid token"),
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn long_retry_after_is_capped_by_the_request_timeout() {
    test_utils::do_setup();
    let backend = MockBackend::start().await;
    let config = backend.config().with_request_timeout(Duration::from_secs(1));
    let ctx = Session::new(config)
        .unwrap()
        .login(ADMIN.0, ADMIN.1)
        .await
        .unwrap();

    backend.with_state(|s| s.throttle(1, 3600));
    let started = std::time::Instant::now();
    let records = ctx.payroll().unwrap().list().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(started.elapsed() < Duration::from_secs(10));
}
