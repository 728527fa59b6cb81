use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{NotifyError, Notifier};

const PUSH_PATH: &str = "/v2/bot/message/push";

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// LINE Messaging API push client.
pub struct LineNotifier {
    client: reqwest::Client,
    push_url: String,
    access_token: String,
}

impl LineNotifier {
    pub fn new(api_base: &str, access_token: &str) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            push_url: format!("{}{}", api_base.trim_end_matches('/'), PUSH_PATH),
            access_token: access_token.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    async fn push_text(&self, to: &str, text: &str) -> Result<(), NotifyError> {
        let body = PushRequest {
            to,
            messages: [TextMessage { kind: "text", text }],
        };

        let response = self
            .client
            .post(&self.push_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
