//! Agent webhook client with fixed-delay retries.

use std::time::Duration;

use agenthub_common::config::DispatchConfig;

/// Result of delivering one payload.
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    pub delivered: bool,
    pub attempts: u32,
    /// Parsed JSON body of the successful response, if it had one.
    pub response: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl WebhookClient {
    pub fn new(client: reqwest::Client, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.webhook_timeout_secs))
            .build()?;
        Ok(Self::new(
            client,
            config.max_attempts,
            Duration::from_secs(config.retry_delay_secs),
        ))
    }

    /// POST `payload` as JSON. Any 2xx is success; anything else is retried
    /// after `retry_delay` until `max_attempts` is exhausted.
    pub async fn post_json(&self, url: &str, payload: &serde_json::Value) -> WebhookOutcome {
        for attempt in 1..=self.max_attempts {
            match self.client.post(url).json(payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let response = resp.json::<serde_json::Value>().await.ok();
                    tracing::info!(%url, attempt, "Agent webhook delivered");
                    return WebhookOutcome {
                        delivered: true,
                        attempts: attempt,
                        response,
                    };
                }
                Ok(resp) => {
                    tracing::warn!(%url, attempt, status = %resp.status(), "Agent webhook rejected");
                }
                Err(e) => {
                    tracing::warn!(%url, attempt, error = %e, "Agent webhook request failed");
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        tracing::error!(%url, attempts = self.max_attempts, "Agent webhook gave up");
        WebhookOutcome {
            delivered: false,
            attempts: self.max_attempts,
            response: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(attempts: u32) -> WebhookClient {
        WebhookClient::new(reqwest::Client::new(), attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(mockito::Matcher::PartialJson(json!({"chat": {"id": "chat_1"}})))
            .with_status(200)
            .with_body(r#"{"content":"hello back"}"#)
            .expect(1)
            .create_async()
            .await;

        let outcome = client(3)
            .post_json(&format!("{}/hook", server.url()), &json!({"chat": {"id": "chat_1"}}))
            .await;

        assert!(outcome.delivered);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.response.unwrap()["content"], "hello back");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_until_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let outcome = client(3)
            .post_json(&format!("{}/hook", server.url()), &json!({}))
            .await;

        assert!(!outcome.delivered);
        assert_eq!(outcome.attempts, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_errors_count_as_failures() {
        // Port 9 (discard) is closed on test hosts, so every attempt fails fast.
        let outcome = client(2).post_json("http://127.0.0.1:9/hook", &json!({})).await;
        assert!(!outcome.delivered);
        assert_eq!(outcome.attempts, 2);
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(client(0).max_attempts, 1);
    }
}
