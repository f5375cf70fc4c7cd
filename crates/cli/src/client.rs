//! Webhook client for posting reports to chat channels

use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use triage_lib::render::WebhookPayload;
use url::Url;

/// Errors delivering a payload to a webhook
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid webhook URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to send webhook request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("webhook rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Posts rendered reports to an incoming webhook
pub struct WebhookClient {
    client: Client,
    url: Url,
}

impl WebhookClient {
    /// Create a new webhook client
    pub fn new(url: &str) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(DeliveryError::Client)?;

        let url = Url::parse(url)?;

        Ok(Self { client, url })
    }

    /// Post a payload; any non-2xx answer is a delivery failure
    pub async fn send(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        debug!(host = ?self.url.host_str(), "Posting report to webhook");

        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(DeliveryError::Request)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_lib::render::Block;

    fn payload() -> WebhookPayload {
        WebhookPayload {
            text: "Kubernetes diagnostics for shop: 1 issues".to_string(),
            blocks: vec![Block::section("*Summary:*"), Block::Divider],
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn test_send_posts_json_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hooks/abc")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"blocks":[{"type":"section","text":{"type":"mrkdwn","text":"*Summary:*"}},{"type":"divider"}]}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let client = WebhookClient::new(&format!("{}/hooks/abc", server.url())).unwrap();
        client.send(&payload()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hooks/abc")
            .with_status(403)
            .with_body("invalid_token")
            .create_async()
            .await;

        let client = WebhookClient::new(&format!("{}/hooks/abc", server.url())).unwrap();
        let err = client.send(&payload()).await.unwrap_err();
        match err {
            DeliveryError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "invalid_token");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            WebhookClient::new("not a url"),
            Err(DeliveryError::InvalidUrl(_))
        ));
    }
}
