use async_trait::async_trait;
use serde::Serialize;

use crate::{Dispatcher, Message, NotifyError};

#[derive(Debug, Clone, Default)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub token: String,
    pub country_code: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    message: &'a str,
}

/// Client for a WhatsApp HTTP gateway
pub struct WhatsAppClient {
    config: WhatsAppConfig,
    client: reqwest::Client,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn country_code(&self) -> &str {
        &self.config.country_code
    }

    pub async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.token)
            .json(&SendRequest {
                to: &message.phone,
                message: &message.body,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(status.as_u16(), text));
        }
        tracing::info!(phone = %message.phone, "whatsapp message sent");
        Ok(())
    }
}

#[async_trait]
impl Dispatcher for WhatsAppClient {
    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        WhatsAppClient::send(self, message).await
    }
}
