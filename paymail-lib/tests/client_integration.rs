//! Integration tests for the paymail client.
//!
//! Every endpoint operation is exercised against a wiremock server standing
//! in for a paymail provider.
//!
//! ```bash
//! cargo test -p paymail-lib --test client_integration
//! ```

use paymail_lib::endpoints::{P2PMetadata, P2PTransaction, PaymentRequest};
use paymail_lib::{
    ClientOptions, PaymailClient, PaymailErrorCode, SenderRequest, BRFC_P2P_PAYMENT_DESTINATION,
    BRFC_PAYMENT_DESTINATION, BRFC_PKI, BRFC_PKI_ALTERNATE, BRFC_SENDER_VALIDATION,
};
use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const ALIAS: &str = "mrz";
const DOMAIN: &str = "test.com";
const PUBKEY: &str = "031b8c93100d35bd448f4646cc4678f278351b439b52b303ea31ec9edb5475e73f";
const PRIVATE_KEY: &str = "54035dd4c7dda99ac473905a3d82f7864322b49bab1ff441cc457183b9bd8abd";
const SCRIPT: &str = "76a9143e2d1d795f8acaa7957045cc59376177eb04a3c588ac";
const SCRIPT_ADDRESS: &str = "16fkwYn8feXEbK7iCTg5KMx9Rx9GzZ9HuE";
const OTHER_SCRIPT: &str = "76a9147f11c8f67a2781df0400ebfb1f31b4c72a780b9d88ac";
const OTHER_ADDRESS: &str = "1Cat862cjhp8SgLLMvin5gyk5UScasg1P9";

fn client() -> PaymailClient {
    PaymailClient::new(
        ClientOptions::default()
            .with_require_https(false)
            .with_retry_count(0),
    )
    .unwrap()
}

fn template(server: &MockServer, endpoint: &str) -> String {
    format!("{}/v1/bsvalias/{}/{{alias}}@{{domain.tld}}", server.uri(), endpoint)
}

fn endpoint_path(endpoint: &str) -> String {
    format!("/v1/bsvalias/{}/{}@{}", endpoint, ALIAS, DOMAIN)
}

fn sender_request() -> SenderRequest {
    SenderRequest::new("mrz@moneybutton.com", "2020-04-09T16:08:06.419Z")
        .with_amount(550)
        .with_purpose("message to receiver")
}

// ============================================================================
// Capabilities
// ============================================================================

#[tokio::test]
async fn test_get_capabilities() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/.well-known/bsvalias"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bsvalias": "1.0",
            "capabilities": {
                "6745385c3fc0": false,
                "pki": format!("{}/v1/bsvalias/id/{{alias}}@{{domain.tld}}", base),
                "paymentDestination": format!("{}/v1/bsvalias/address/{{alias}}@{{domain.tld}}", base),
                "2a40af698840": format!("{}/v1/bsvalias/p2p-payment-destination/{{alias}}@{{domain.tld}}", base),
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let addr = server.address();
    let response = client()
        .get_capabilities(&addr.ip().to_string(), addr.port())
        .await
        .unwrap();

    assert_eq!(response.standard.status_code, 200);
    assert_eq!(response.bsv_alias, "1.0");
    assert_eq!(response.len(), 4);
    assert!(!response.get_bool(BRFC_SENDER_VALIDATION, ""));
    assert_eq!(
        response.get_string(BRFC_PKI, BRFC_PKI_ALTERNATE),
        format!("{}/v1/bsvalias/id/{{alias}}@{{domain.tld}}", base)
    );
    assert!(response.has(BRFC_PAYMENT_DESTINATION, ""));
    assert!(response.has(BRFC_P2P_PAYMENT_DESTINATION, ""));
}

#[tokio::test]
async fn test_get_capabilities_typographic_quotes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/bsvalias"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\u{201c}bsvalias\u{201d}: \u{201c}1.0\u{201d}, \u{201c}capabilities\u{201d}: {\u{201c}pki\u{201d}: \u{201c}https://test.com/id\u{201d}}}",
        ))
        .mount(&server)
        .await;

    let addr = server.address();
    let response = client()
        .get_capabilities(&addr.ip().to_string(), addr.port())
        .await
        .unwrap();
    assert_eq!(response.bsv_alias, "1.0");
    assert_eq!(response.get_string(BRFC_PKI, ""), "https://test.com/id");
}

#[tokio::test]
async fn test_get_capabilities_missing_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/.well-known/bsvalias"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "capabilities": { "pki": "https://test.com/id" }
        })))
        .mount(&server)
        .await;

    let addr = server.address();
    let err = client()
        .get_capabilities(&addr.ip().to_string(), addr.port())
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::MalformedResponse);
    let response = err.response().unwrap();
    assert_eq!(response.get_string(BRFC_PKI, ""), "https://test.com/id");
}

#[tokio::test]
async fn test_get_capabilities_failed_status() {
    for status in [404u16, 400] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/bsvalias"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "code": "not-found",
                "message": "nothing here"
            })))
            .mount(&server)
            .await;

        let addr = server.address();
        let err = client()
            .get_capabilities(&addr.ip().to_string(), addr.port())
            .await
            .unwrap_err();
        let response = err.response().unwrap();
        assert_eq!(response.standard.status_code, status);
        assert!(response.is_empty());
    }
}

#[tokio::test]
async fn test_get_capabilities_preconditions() {
    let client = client();
    let err = client.get_capabilities("", 443).await.unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);
    assert!(err.response().is_none());

    let err = client.get_capabilities("test.com", 0).await.unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);
}

// ============================================================================
// Status classification
// ============================================================================

#[tokio::test]
async fn test_not_found_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint_path("id")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client()
        .get_pki(&template(&server, "id"), ALIAS, DOMAIN)
        .await
        .unwrap_err();
    assert!(err.error.is_not_found());
    assert_eq!(err.response().unwrap().standard.status_code, 404);
}

#[tokio::test]
async fn test_bad_response_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint_path("id")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "invalid-parameter",
            "message": "invalid paymail"
        })))
        .mount(&server)
        .await;

    let err = client()
        .get_pki(&template(&server, "id"), ALIAS, DOMAIN)
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::BadResponse);
    assert_eq!(
        err.to_string(),
        "bad response from paymail provider: code 400, message: invalid paymail"
    );
    assert_eq!(err.response().unwrap().standard.status_code, 400);
}

#[tokio::test]
async fn test_bad_response_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint_path("id")))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let err = client()
        .get_pki(&template(&server, "id"), ALIAS, DOMAIN)
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::Serialization);
    assert_eq!(err.response().unwrap().standard.status_code, 500);
}

#[tokio::test]
async fn test_not_modified_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint_path("public-profile")))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let err = client()
        .get_public_profile(&template(&server, "public-profile"), ALIAS, DOMAIN)
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::Serialization);
    assert_eq!(err.response().unwrap().standard.status_code, 304);
}

#[tokio::test]
async fn test_https_required_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = PaymailClient::new(ClientOptions::default()).unwrap();
    let err = client
        .get_pki(&template(&server, "id"), ALIAS, DOMAIN)
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);
    assert!(err.response().is_none());
}

#[tokio::test]
async fn test_connection_failure_after_retries() {
    let client = PaymailClient::new(
        ClientOptions::default()
            .with_require_https(false)
            .with_retry_count(2),
    )
    .unwrap();

    // nothing listens on port 1 locally
    let err = client
        .get_pki("http://127.0.0.1:1/id/{alias}@{domain.tld}", ALIAS, DOMAIN)
        .await
        .unwrap_err();
    assert!(matches!(
        err.error.code(),
        PaymailErrorCode::ConnectionFailed | PaymailErrorCode::ConnectionTimeout
    ));
    assert!(err.response().is_none());
}

#[tokio::test]
async fn test_request_tracing_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint_path("public-profile")))
        .and(header("user-agent", "paymail-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "avatar": "https://github.com/mrz1836.png",
            "name": "MrZ"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PaymailClient::new(
        ClientOptions::default()
            .with_require_https(false)
            .with_user_agent("paymail-tests")
            .with_request_tracing(),
    )
    .unwrap();
    let response = client
        .get_public_profile(&template(&server, "public-profile"), ALIAS, DOMAIN)
        .await
        .unwrap();

    assert_eq!(response.name, "MrZ");
    let trace = response.standard.tracing.as_ref().unwrap();
    assert_eq!(trace.attempts, 1);
}

// ============================================================================
// PKI
// ============================================================================

#[tokio::test]
async fn test_get_pki() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint_path("id")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bsvalias": "1.0",
            "handle": "mrz@test.com",
            "pubkey": PUBKEY
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client()
        .get_pki(&template(&server, "id"), ALIAS, DOMAIN)
        .await
        .unwrap();
    assert_eq!(response.bsv_alias, "1.0");
    assert_eq!(response.handle, "mrz@test.com");
    assert_eq!(response.pub_key, PUBKEY);
}

#[tokio::test]
async fn test_get_pki_contract_violations() {
    let cases = [
        (json!({"bsvalias": "1.0", "handle": "other@test.com", "pubkey": PUBKEY}), "does not match"),
        (json!({"bsvalias": "1.0", "handle": "mrz@test.com"}), "missing a pubkey"),
        (json!({"bsvalias": "1.0", "handle": "mrz@test.com", "pubkey": "031b8c"}), "required length"),
    ];

    for (body, message) in cases {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(endpoint_path("id")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client()
            .get_pki(&template(&server, "id"), ALIAS, DOMAIN)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(message), "{}", err);
        assert!(err.response().is_some());
    }
}

#[tokio::test]
async fn test_get_pki_preconditions() {
    let client = client();
    for (url, alias, domain) in [
        ("", ALIAS, DOMAIN),
        ("http://test.com/id/{alias}@{domain.tld}", "", DOMAIN),
        ("http://test.com/id/{alias}@{domain.tld}", ALIAS, ""),
    ] {
        let err = client.get_pki(url, alias, domain).await.unwrap_err();
        assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);
        assert!(err.response().is_none());
    }
}

// ============================================================================
// Address resolution
// ============================================================================

#[tokio::test]
async fn test_resolve_address() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint_path("address")))
        .and(body_partial_json(json!({
            "senderHandle": "mrz@moneybutton.com",
            "dt": "2020-04-09T16:08:06.419Z",
            "amount": 550
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": SCRIPT })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client()
        .resolve_address(&template(&server, "address"), ALIAS, DOMAIN, &sender_request())
        .await
        .unwrap();
    assert_eq!(response.output, SCRIPT);
    assert_eq!(response.address, SCRIPT_ADDRESS);
}

#[tokio::test]
async fn test_resolve_address_with_signed_request() {
    let server = MockServer::start().await;
    let mut request = sender_request();
    request.signature = request.sign(PRIVATE_KEY).unwrap();

    Mock::given(method("POST"))
        .and(path(endpoint_path("address")))
        .and(body_partial_json(json!({ "signature": request.signature })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": OTHER_SCRIPT })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client()
        .resolve_address(&template(&server, "address"), ALIAS, DOMAIN, &request)
        .await
        .unwrap();
    assert_eq!(response.address, OTHER_ADDRESS);
}

#[tokio::test]
async fn test_resolve_address_bad_output() {
    for (body, code) in [
        (json!({}), PaymailErrorCode::MalformedResponse),
        (json!({ "output": "6a0568656c6c6f" }), PaymailErrorCode::InvalidScript),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint_path("address")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client()
            .resolve_address(&template(&server, "address"), ALIAS, DOMAIN, &sender_request())
            .await
            .unwrap_err();
        assert_eq!(err.error.code(), code);
        assert!(err.response().unwrap().address.is_empty());
    }
}

#[tokio::test]
async fn test_resolve_address_requires_sender_fields() {
    let client = client();
    let url = "http://test.com/address/{alias}@{domain.tld}";

    let missing_dt = SenderRequest::new("mrz@moneybutton.com", "");
    let err = client
        .resolve_address(url, ALIAS, DOMAIN, &missing_dt)
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);

    let missing_handle = SenderRequest::new("", "2020-04-09T16:08:06.419Z");
    let err = client
        .resolve_address(url, ALIAS, DOMAIN, &missing_handle)
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);
}

// ============================================================================
// P2P payment destination
// ============================================================================

#[tokio::test]
async fn test_get_p2p_payment_destination() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint_path("p2p-payment-destination")))
        .and(body_partial_json(json!({ "satoshis": 1000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outputs": [
                { "script": SCRIPT, "satoshis": 600 },
                { "script": OTHER_SCRIPT, "satoshis": 400 },
                { "script": "", "satoshis": 0 }
            ],
            "reference": "z0bac4ec-6f15-42de-9ef4-e60bfdabf4f7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client()
        .get_p2p_payment_destination(
            &template(&server, "p2p-payment-destination"),
            ALIAS,
            DOMAIN,
            &PaymentRequest { satoshis: 1000 },
        )
        .await
        .unwrap();

    assert_eq!(response.reference, "z0bac4ec-6f15-42de-9ef4-e60bfdabf4f7");
    assert_eq!(response.outputs.len(), 3);
    assert_eq!(response.outputs[0].address, SCRIPT_ADDRESS);
    assert_eq!(response.outputs[0].satoshis, 600);
    assert_eq!(response.outputs[1].address, OTHER_ADDRESS);
    assert!(response.outputs[2].address.is_empty());
}

#[tokio::test]
async fn test_get_p2p_payment_destination_contract_violations() {
    let cases = [
        (json!({ "outputs": [{ "script": SCRIPT }] }), "reference"),
        (json!({ "outputs": [], "reference": "abc" }), "output"),
        (json!({ "outputs": [{ "script": "6a0568656c6c6f" }], "reference": "abc" }), ""),
    ];

    for (body, message) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(endpoint_path("p2p-payment-destination")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client()
            .get_p2p_payment_destination(
                &template(&server, "p2p-payment-destination"),
                ALIAS,
                DOMAIN,
                &PaymentRequest { satoshis: 100 },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains(message), "{}", err);
        assert!(err.response().is_some());
    }
}

#[tokio::test]
async fn test_get_p2p_payment_destination_requires_satoshis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client()
        .get_p2p_payment_destination(
            &template(&server, "p2p-payment-destination"),
            ALIAS,
            DOMAIN,
            &PaymentRequest::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);
    assert!(err.response().is_none());
}

// ============================================================================
// P2P transactions
// ============================================================================

fn transaction() -> P2PTransaction {
    P2PTransaction {
        hex: "0100000001abcd".to_string(),
        metadata: P2PMetadata {
            note: "thanks".to_string(),
            sender: "mrz@moneybutton.com".to_string(),
            ..Default::default()
        },
        reference: "z0bac4ec-6f15-42de-9ef4-e60bfdabf4f7".to_string(),
    }
}

#[tokio::test]
async fn test_send_p2p_transaction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint_path("receive-transaction")))
        .and(body_partial_json(json!({
            "hex": "0100000001abcd",
            "reference": "z0bac4ec-6f15-42de-9ef4-e60bfdabf4f7",
            "metadata": { "note": "thanks", "sender": "mrz@moneybutton.com" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "txid": "9e9f4f1e8b0ac1dbbd8c4c4a1f31b6e52aa03ed2b6c4c0c8b02b9b7c33a1a2b3",
            "note": "received"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client()
        .send_p2p_transaction(&template(&server, "receive-transaction"), ALIAS, DOMAIN, &transaction())
        .await
        .unwrap();
    assert_eq!(
        response.tx_id,
        "9e9f4f1e8b0ac1dbbd8c4c4a1f31b6e52aa03ed2b6c4c0c8b02b9b7c33a1a2b3"
    );
    assert_eq!(response.note, "received");
}

#[tokio::test]
async fn test_send_p2p_transaction_missing_txid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint_path("receive-transaction")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "note": "received" })))
        .mount(&server)
        .await;

    let err = client()
        .send_p2p_transaction(&template(&server, "receive-transaction"), ALIAS, DOMAIN, &transaction())
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::MalformedResponse);
    assert_eq!(err.response().unwrap().note, "received");
}

#[tokio::test]
async fn test_send_p2p_transaction_preconditions() {
    let client = client();
    let url = "http://test.com/receive-transaction/{alias}@{domain.tld}";

    let mut missing_hex = transaction();
    missing_hex.hex.clear();
    let err = client
        .send_p2p_transaction(url, ALIAS, DOMAIN, &missing_hex)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("hex is required"));

    let mut missing_reference = transaction();
    missing_reference.reference.clear();
    let err = client
        .send_p2p_transaction(url, ALIAS, DOMAIN, &missing_reference)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("reference is required"));
}

// ============================================================================
// Public profile and public key verification
// ============================================================================

#[tokio::test]
async fn test_get_public_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint_path("public-profile")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "avatar": "https://github.com/mrz1836.png",
            "name": "MrZ"
        })))
        .mount(&server)
        .await;

    let response = client()
        .get_public_profile(&template(&server, "public-profile"), ALIAS, DOMAIN)
        .await
        .unwrap();
    assert_eq!(response.avatar, "https://github.com/mrz1836.png");
    assert_eq!(response.name, "MrZ");
}

#[tokio::test]
async fn test_verify_pub_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", endpoint_path("verify-pubkey"), PUBKEY)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bsvalias": "1.0",
            "handle": "mrz@test.com",
            "pubkey": PUBKEY,
            "match": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!(
        "{}/v1/bsvalias/verify-pubkey/{{alias}}@{{domain.tld}}/{{pubkey}}",
        server.uri()
    );
    let response = client()
        .verify_pub_key(&url, ALIAS, DOMAIN, PUBKEY)
        .await
        .unwrap();
    assert!(response.matches);
    assert_eq!(response.handle, "mrz@test.com");
    assert_eq!(response.pub_key, PUBKEY);
}

#[tokio::test]
async fn test_verify_pub_key_requires_key() {
    let err = client()
        .verify_pub_key(
            "http://test.com/verify-pubkey/{alias}@{domain.tld}/{pubkey}",
            ALIAS,
            DOMAIN,
            "",
        )
        .await
        .unwrap_err();
    assert_eq!(err.error.code(), PaymailErrorCode::InvalidData);
}
