//! Mailjet send API (v3.1) transport.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::errors::Error;
use crate::message::OutboundMessage;
use crate::transport::{Delivery, MailTransport, TransportError, truncate_detail};

pub struct MailjetTransport {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    api_secret: String,
    timeout: Duration,
}

impl MailjetTransport {
    pub fn new(base_url: &Url, api_key: String, api_secret: String, timeout: Duration) -> Result<Self, Error> {
        // Without a trailing slash `join` would replace the last path segment of a proxied base
        let mut base_url = base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let endpoint = base_url.join("v3.1/send").map_err(|e| Error::Internal {
            operation: format!("build Mailjet endpoint: {e}"),
        })?;

        Ok(Self {
            client: http_client(timeout)?,
            endpoint,
            api_key,
            api_secret,
            timeout,
        })
    }
}

#[async_trait]
impl MailTransport for MailjetTransport {
    fn kind(&self) -> &'static str {
        "mailjet"
    }

    async fn send(&self, message: &OutboundMessage) -> Result<Delivery, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&message.to_mailjet_payload())
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        interpret_send_response(response, self.timeout).await
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .map_err(|e| Error::Internal {
            operation: format!("create HTTP client: {e}"),
        })
}

pub(crate) fn request_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::Connection(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(rename = "Messages", default)]
    messages: Vec<MessageResult>,
}

#[derive(Debug, Deserialize)]
struct MessageResult {
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "To", default)]
    to: Vec<RecipientResult>,
}

#[derive(Debug, Deserialize)]
struct RecipientResult {
    #[serde(rename = "MessageUUID")]
    message_uuid: Option<String>,
}

/// Turn a Mailjet-shaped answer into a delivery result.
///
/// Success needs a 2xx status *and* `Messages[0].Status` of `success` or `sent`. A 2xx without
/// that field is not treated as delivered.
pub(crate) async fn interpret_send_response(response: reqwest::Response, timeout: Duration) -> Result<Delivery, TransportError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| request_error(e, timeout))?;

    if !status.is_success() {
        return Err(TransportError::Rejected {
            status: Some(status.as_u16()),
            detail: truncate_detail(&body),
        });
    }

    let first = serde_json::from_str::<SendResponse>(&body)
        .ok()
        .and_then(|parsed| parsed.messages.into_iter().next());

    let Some(first) = first else {
        return Err(TransportError::UnexpectedResponse {
            status: status.as_u16(),
            detail: truncate_detail(&body),
        });
    };

    match first.status.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("success") | Some("sent") => Ok(Delivery {
            provider_status: Some(status.as_u16()),
            reference: first.to.into_iter().find_map(|r| r.message_uuid),
        }),
        Some(other) => Err(TransportError::Rejected {
            status: Some(status.as_u16()),
            detail: format!("message status '{other}': {}", truncate_detail(&body)),
        }),
        None => Err(TransportError::UnexpectedResponse {
            status: status.as_u16(),
            detail: truncate_detail(&body),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{install_crypto_provider, sample_message};
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer, timeout: Duration) -> MailjetTransport {
        install_crypto_provider();
        let base = Url::parse(&server.uri()).unwrap();
        MailjetTransport::new(&base, "public-key".to_string(), "private-key".to_string(), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_success_status_is_delivery() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3.1/send"))
            .and(header_exists("authorization"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Messages": [{
                    "Status": "success",
                    "To": [{"Email": "office@example.com", "MessageUUID": "1ab23cd4-e567-8901-2345-6789f0gh1i2j"}]
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let delivery = transport(&mock_server, Duration::from_secs(5))
            .send(&sample_message())
            .await
            .unwrap();

        assert_eq!(delivery.provider_status, Some(200));
        assert_eq!(delivery.reference.as_deref(), Some("1ab23cd4-e567-8901-2345-6789f0gh1i2j"));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        install_crypto_provider();
        for base in ["https://proxy.example.com/mailjet", "https://proxy.example.com/mailjet/"] {
            let transport = MailjetTransport::new(
                &Url::parse(base).unwrap(),
                "public-key".to_string(),
                "private-key".to_string(),
                Duration::from_secs(5),
            )
            .unwrap();
            assert_eq!(transport.endpoint.as_str(), "https://proxy.example.com/mailjet/v3.1/send");
        }

        let transport = MailjetTransport::new(
            &Url::parse("https://api.mailjet.com").unwrap(),
            "public-key".to_string(),
            "private-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(transport.endpoint.as_str(), "https://api.mailjet.com/v3.1/send");
    }

    #[tokio::test]
    async fn test_payload_sent_to_provider() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Messages": [{"Status": "success"}]})))
            .mount(&mock_server)
            .await;

        transport(&mock_server, Duration::from_secs(5))
            .send(&sample_message())
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["Messages"][0]["Subject"], "Besichtigung");
        assert_eq!(body["Messages"][0]["Headers"]["Reply-To"], "anna@example.com");
    }

    #[tokio::test]
    async fn test_error_status_in_body_is_rejection() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Messages": [{"Status": "error"}]})))
            .mount(&mock_server)
            .await;

        let result = transport(&mock_server, Duration::from_secs(5)).send(&sample_message()).await;
        assert!(matches!(result, Err(TransportError::Rejected { status: Some(200), .. })));
    }

    #[tokio::test]
    async fn test_2xx_without_status_is_not_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&mock_server)
            .await;

        let result = transport(&mock_server, Duration::from_secs(5)).send(&sample_message()).await;
        assert!(matches!(result, Err(TransportError::UnexpectedResponse { status: 200, .. })));
    }

    #[tokio::test]
    async fn test_auth_failure_is_rejection() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "ErrorMessage": "API key authentication/authorization failure",
                "StatusCode": 401
            })))
            .mount(&mock_server)
            .await;

        let result = transport(&mock_server, Duration::from_secs(5)).send(&sample_message()).await;
        match result {
            Err(TransportError::Rejected { status, detail }) => {
                assert_eq!(status, Some(401));
                assert!(detail.contains("authorization failure"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Messages": [{"Status": "success"}]}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let result = transport(&mock_server, Duration::from_millis(200)).send(&sample_message()).await;
        assert!(matches!(result, Err(TransportError::Timeout(_))));
    }
}
