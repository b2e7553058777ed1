//! Integration tests for the service client with a mock server

#[cfg(test)]
mod tests {
    use crate::config::{ServiceConfig, TimeoutConfig};
    use crate::error::ErrorKind;
    use crate::service::client::TpServiceClient;
    use crate::service::request::{CheckOptions, ComplianceOptions};
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::assert_ok;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_PROGRAM: &str = "/PROG TEST\n/MN\n1: J P[1] 100% FINE;\n/END\n";

    fn create_test_client(base_url: &str) -> TpServiceClient {
        let config = ServiceConfig::new()
            .with_base_url(base_url)
            .with_timeouts(TimeoutConfig::quick());
        TpServiceClient::new(config).expect("failed to create client")
    }

    fn diagnostics_body(entries: serde_json::Value) -> serde_json::Value {
        json!({ "diagnostics": entries })
    }

    #[tokio::test]
    async fn test_check_empty_batch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .and(header("Content-Type", "text/plain; charset=utf-8"))
            .and(query_param("lsp", "true"))
            .and(query_param("fix", "false"))
            .and(query_param("fix_unsafe", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(diagnostics_body(json!([]))))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let batch = assert_ok!(
            client
                .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
                .await
        );
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_check_parses_diagnostics() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(200).set_body_json(diagnostics_body(json!([
                {
                    "range": {"start": {"line": 2, "character": 3}, "end": {"line": 2, "character": 9}},
                    "severity": 1,
                    "message": "undefined position register P[1]",
                    "code": "TP011",
                    "source": "tpcheck"
                }
            ]))))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let batch = assert_ok!(
            client
                .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
                .await
        );
        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.diagnostics[0].message,
            "undefined position register P[1]"
        );
    }

    #[tokio::test]
    async fn test_check_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::RateLimited);
        assert_eq!(error.status_code(), Some(429));
        assert!(error.is_retriable());
    }

    #[tokio::test]
    async fn test_format_returns_text_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/format"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(SAMPLE_PROGRAM)
                    .insert_header("Content-Type", "text/plain; charset=utf-8"),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let formatted = assert_ok!(client.format("/PROG  TEST\n/END\n", None).await);
        assert_eq!(formatted.content, SAMPLE_PROGRAM);
    }

    #[tokio::test]
    async fn test_compliance_query_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/compliance"))
            .and(query_param("lsp", "true"))
            .and(query_param("select", "ruleA,ruleB"))
            .and(query_param("ignore", "ruleC"))
            .and(query_param_is_missing("severity"))
            .and(query_param_is_missing("standard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(diagnostics_body(json!([]))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let options = ComplianceOptions {
            select: vec!["ruleA".to_string(), "ruleB".to_string()],
            ignore: vec!["ruleC".to_string()],
            ..Default::default()
        };

        let client = create_test_client(&mock_server.uri());
        assert_ok!(client.compliance(SAMPLE_PROGRAM, &options, None).await);
    }

    #[tokio::test]
    async fn test_server_error_is_retriable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Server);
        assert_eq!(error.status_code(), Some(503));
        assert!(error.is_retriable());
    }

    #[tokio::test]
    async fn test_client_error_is_not_retriable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(422).set_body_string("not a TP program"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Client);
        assert!(!error.is_retriable());
        assert!(error.to_string().contains("not a TP program"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{truncated", "application/json"),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidResponse);
        assert!(!error.is_retriable());
    }

    #[tokio::test]
    async fn test_unexpected_content_type_is_named() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<xml/>", "application/xml"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidResponse);
        assert!(error.to_string().contains("application/xml"));
    }

    #[tokio::test]
    async fn test_schema_violation_fails_open_to_empty_batch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(200).set_body_json(diagnostics_body(json!([
                {"range": "not a range", "severity": 1, "message": "bad"}
            ]))))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let batch = assert_ok!(
            client
                .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
                .await
        );
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        // nothing listens on this port
        let client = create_test_client("http://127.0.0.1:1");
        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Network);
        assert!(error.is_retriable());
        assert!(error.to_string().contains("unreachable"));
    }

    #[tokio::test]
    async fn test_deadline_aborts_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(diagnostics_body(json!([])))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let config = ServiceConfig::new()
            .with_base_url(mock_server.uri())
            .with_timeouts(TimeoutConfig::new().with_request_timeout_ms(100));
        let client = TpServiceClient::new(config).expect("failed to create client");

        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Aborted);
        assert!(!error.is_retriable());
    }

    #[tokio::test]
    async fn test_caller_cancellation_aborts_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(diagnostics_body(json!([])))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let token = CancellationToken::new();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), Some(token))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Aborted);
    }

    #[tokio::test]
    async fn test_retry_budget_retries_server_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&mock_server)
            .await;

        let config = ServiceConfig::new()
            .with_base_url(mock_server.uri())
            .with_timeouts(TimeoutConfig::quick())
            .with_max_retries(1);
        let client = TpServiceClient::new(config).expect("failed to create client");

        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Server);
    }

    #[tokio::test]
    async fn test_retry_budget_skips_client_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/check"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ServiceConfig::new()
            .with_base_url(mock_server.uri())
            .with_timeouts(TimeoutConfig::quick())
            .with_max_retries(3);
        let client = TpServiceClient::new(config).expect("failed to create client");

        let error = client
            .check(SAMPLE_PROGRAM, &CheckOptions::default(), None)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Client);
    }
}
