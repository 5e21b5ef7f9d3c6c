//! Telegram Bot API client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use notebot_core::{defaults, ChatTransport, Error, MessageOptions, Result, SentMessage};

use crate::error::{to_notebot_error, TelegramErrorCode};
use crate::types::*;

const PARSE_MODE_MARKDOWN: &str = "MarkdownV2";

/// Configuration for the Bot API client.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Base URL of the Bot API, without the `/bot<token>` suffix.
    pub api_url: String,
    /// Bot token.
    pub token: String,
    /// Long-poll timeout passed to getUpdates, in seconds.
    pub poll_timeout_secs: u64,
    /// Skip TLS verification (for intercepting proxies in local environments).
    pub skip_tls_verify: bool,
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

impl TelegramConfig {
    /// Config with default endpoint and poll timeout.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: defaults::TELEGRAM_API_URL.to_string(),
            token: token.into(),
            poll_timeout_secs: defaults::POLL_TIMEOUT_SECS,
            skip_tls_verify: false,
        }
    }
}

/// Client for the subset of the Bot API the bot uses.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    config: TelegramConfig,
}

impl TelegramClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let timeout =
            Duration::from_secs(config.poll_timeout_secs + defaults::HTTP_TIMEOUT_SLACK_SECS);
        let mut client_builder = Client::builder().timeout(timeout);

        if config.skip_tls_verify {
            warn!(subsystem = "telegram", "TLS certificate verification disabled");
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "telegram",
            api_url = %config.api_url,
            poll_timeout_secs = config.poll_timeout_secs,
            "Initializing Telegram client"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Invoke a Bot API method and return its raw envelope.
    async fn call_raw<P, R>(&self, method: &'static str, payload: &P) -> Result<ApiResponse<R>>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.token,
            method
        );

        // The URL embeds the token; strip it from transport errors.
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::from(e.without_url()))?;

        let status = response.status();
        let mut envelope: ApiResponse<R> = response.json().await.map_err(|e| {
            Error::Request(format!(
                "{} returned {} with unreadable body: {}",
                method,
                status,
                e.without_url()
            ))
        })?;
        if envelope.error_code.is_none() && !envelope.ok {
            envelope.error_code = Some(status.as_u16() as i32);
        }
        Ok(envelope)
    }

    /// Invoke a Bot API method and unwrap its envelope.
    async fn call<P, R>(&self, method: &'static str, payload: &P) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let envelope: ApiResponse<R> = self.call_raw(method, payload).await?;
        if !envelope.ok {
            let (code, description) = rejection(&envelope);
            debug!(
                subsystem = "telegram",
                method,
                ?code,
                description = %description,
                "Bot API call rejected"
            );
            return Err(to_notebot_error(code, method, &description));
        }
        envelope
            .result
            .ok_or_else(|| Error::Serialization(format!("{} returned no result", method)))
    }

    /// Fetch pending updates starting at `offset`, long-polling for new ones.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.config.poll_timeout_secs,
            allowed_updates: vec!["message", "callback_query"],
        };
        self.call("getUpdates", &request).await
    }

    /// Register the bot's command list with the client menu.
    pub async fn set_my_commands(&self, commands: &[(&str, &str)]) -> Result<()> {
        let request = SetMyCommandsRequest {
            commands: commands
                .iter()
                .map(|(command, description)| BotCommand {
                    command: command.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        };
        let _: bool = self.call("setMyCommands", &request).await?;
        info!(
            subsystem = "telegram",
            count = commands.len(),
            "Bot commands registered"
        );
        Ok(())
    }
}

fn rejection<R>(envelope: &ApiResponse<R>) -> (TelegramErrorCode, String) {
    let description = envelope
        .description
        .clone()
        .unwrap_or_else(|| "unknown error".to_string());
    let code = TelegramErrorCode::from_response(envelope.error_code.unwrap_or(0), &description);
    (code, description)
}

fn parse_mode(options: &MessageOptions) -> Option<&'static str> {
    options.markdown.then_some(PARSE_MODE_MARKDOWN)
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        options: MessageOptions,
    ) -> Result<SentMessage> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: parse_mode(&options),
            reply_markup: options.keyboard.as_ref().map(InlineKeyboardMarkup::from),
        };
        let message: Message = self.call("sendMessage", &request).await?;
        debug!(
            subsystem = "telegram",
            chat_id,
            message_id = message.message_id,
            "Message sent"
        );
        Ok(SentMessage {
            message_id: message.message_id,
        })
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        options: MessageOptions,
    ) -> Result<()> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text,
            parse_mode: parse_mode(&options),
            reply_markup: options.keyboard.as_ref().map(InlineKeyboardMarkup::from),
        };
        // The result is the edited Message, or `true` for inline messages.
        let envelope: ApiResponse<serde_json::Value> =
            self.call_raw("editMessageText", &request).await?;
        if envelope.ok {
            return Ok(());
        }
        match rejection(&envelope) {
            (TelegramErrorCode::NotModified, _) => {
                debug!(subsystem = "telegram", chat_id, message_id, "Edit was a no-op");
                Ok(())
            }
            (code, description) => Err(to_notebot_error(code, "editMessageText", &description)),
        }
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id: callback_id,
        };
        let _: bool = self.call("answerCallbackQuery", &request).await?;
        Ok(())
    }
}
