//! Authentication flow tests against a mock gateway

mod common;

use common::{MockData, MockServerFactory, TestConfig};
use rivian_telemetry::{
    Error,
    types::{CsrfTokens, LoginOutcome, OtpChallenge, Session},
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_csrf_bootstrap_retries_until_success() {
    let server = MockServerFactory::new().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "CreateCSRFToken" })))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    MockServerFactory::setup_csrf(&server).await;

    let auth = TestConfig::auth_client(&server);
    let tokens = auth.bootstrap_csrf().await.unwrap();

    assert_eq!(tokens, CsrfTokens::new("csrf-token-1", "app-session-1"));
    assert_eq!(MockServerFactory::count(&server, "CreateCSRFToken").await, 3);
}

#[tokio::test]
async fn test_csrf_bootstrap_retries_on_graphql_errors() {
    let server = MockServerFactory::new().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "CreateCSRFToken" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockData::graphql_error("rate limited", "RATE_LIMITED")),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    MockServerFactory::setup_csrf(&server).await;

    let auth = TestConfig::auth_client(&server);
    let err = auth.create_csrf_token().await.unwrap_err();
    assert!(matches!(err, Error::CsrfBootstrap { .. }));
    assert!(err.to_string().contains("rate limited"));

    let tokens = auth.csrf_tokens().await.unwrap();
    assert_eq!(tokens.csrf_token, "csrf-token-1");
}

#[tokio::test]
async fn test_csrf_pair_bootstrapped_once_per_client() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(&server, "Login", MockData::login_response()).await;

    let auth = TestConfig::auth_client(&server);
    auth.login("me@example.com", "pw").await.unwrap();
    auth.login("me@example.com", "pw").await.unwrap();
    auth.authorized_headers(&Session::new("a", "r", "u"))
        .await
        .unwrap();

    assert_eq!(MockServerFactory::count(&server, "CreateCSRFToken").await, 1);
    assert_eq!(MockServerFactory::count(&server, "Login").await, 2);
}

#[tokio::test]
async fn test_login_without_mfa() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "operationName": "Login",
            "variables": { "email": "me@example.com", "password": "hunter2" }
        })))
        .and(header("Csrf-Token", "csrf-token-1"))
        .and(header("A-Sess", "app-session-1"))
        .and(header("Apollographql-Client-Name", "com.rivian.ios.consumer-apollo-ios"))
        .and(header_exists("Dc-Cid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockData::login_response()))
        .expect(1)
        .mount(&server)
        .await;

    let auth = TestConfig::auth_client(&server);
    let outcome = auth.login("me@example.com", "hunter2").await.unwrap();

    assert_eq!(
        outcome,
        LoginOutcome::Authenticated(Session::new("access-1", "refresh-1", "user-session-1"))
    );
}

#[tokio::test]
async fn test_login_with_otp() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(&server, "Login", MockData::mfa_response()).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "operationName": "LoginWithOTP",
            "variables": {
                "email": "me@example.com",
                "otpCode": "123456",
                "otpToken": "otp-token-1"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockData::otp_response()))
        .expect(1)
        .mount(&server)
        .await;

    let auth = TestConfig::auth_client(&server);
    let challenge = match auth.login("me@example.com", "hunter2").await.unwrap() {
        LoginOutcome::OtpRequired(challenge) => challenge,
        other => panic!("expected OTP challenge, got {:?}", other),
    };
    assert_eq!(
        challenge,
        OtpChallenge {
            username: "me@example.com".to_string(),
            otp_token: "otp-token-1".to_string(),
        }
    );

    let session = auth.complete_otp(&challenge, " 123456\n").await.unwrap();
    assert_eq!(
        session,
        Session::new("access-otp", "refresh-otp", "user-session-otp")
    );
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(
        &server,
        "Login",
        MockData::graphql_error("Invalid email or password", "BAD_USER_INPUT"),
    )
    .await;

    let auth = TestConfig::auth_client(&server);
    let err = auth.login("me@example.com", "wrong").await.unwrap_err();

    assert!(err.is_auth_failure());
    assert!(err.to_string().contains("Invalid email or password"));
}

#[tokio::test]
async fn test_login_http_rejection_is_auth_error() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation_status(&server, "Login", 401).await;

    let auth = TestConfig::auth_client(&server);
    let err = auth.login("me@example.com", "wrong").await.unwrap_err();

    assert!(matches!(err, Error::Auth { operation: Some(ref op), .. } if op == "Login"));
}

#[tokio::test]
async fn test_otp_mismatch_is_auth_error() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(
        &server,
        "LoginWithOTP",
        MockData::graphql_error("Invalid OTP", "BAD_USER_INPUT"),
    )
    .await;

    let auth = TestConfig::auth_client(&server);
    let challenge = OtpChallenge {
        username: "me@example.com".to_string(),
        otp_token: "otp-token-1".to_string(),
    };
    let err = auth.complete_otp(&challenge, "000000").await.unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_incomplete_token_payload_is_auth_error() {
    let server = MockServerFactory::new().await;
    MockServerFactory::setup_csrf(&server).await;
    MockServerFactory::setup_operation(
        &server,
        "Login",
        json!({ "data": { "login": { "__typename": "MobileLoginResponse", "accessToken": "a" } } }),
    )
    .await;

    let auth = TestConfig::auth_client(&server);
    let err = auth.login("me@example.com", "pw").await.unwrap_err();

    assert!(err.is_auth_failure());
}
