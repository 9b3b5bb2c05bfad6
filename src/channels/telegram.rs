//! Telegram channel — long-polls the Bot API for messages and button presses.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::channels::{Channel, EventStream, IncomingEvent, Messenger};
use crate::error::ChannelError;
use crate::router::{InboundEvent, Keyboard, Prompt};
use crate::session::UserId;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const POLL_TIMEOUT_SECS: u64 = 30;
const RETRY_DELAY_SECS: u64 = 5;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: SecretString,
    allowed_users: Vec<String>,
    client: reqwest::Client,
    stopped: Arc<AtomicBool>,
}

impl TelegramChannel {
    pub fn new(bot_token: SecretString, allowed_users: Vec<String>) -> Self {
        Self {
            bot_token,
            allowed_users,
            client: reqwest::Client::new(),
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    /// Send a single chunk (≤4096 chars), HTML first with plain-text fallback.
    async fn send_chunk(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<&Value>,
    ) -> Result<(), ChannelError> {
        let mut html_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            html_body["reply_markup"] = markup.clone();
        }

        let html_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&html_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if html_resp.status().is_success() {
            return Ok(());
        }

        let html_status = html_resp.status();
        tracing::warn!(
            status = ?html_status,
            "Telegram sendMessage with HTML failed; retrying without parse_mode"
        );

        let mut plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            plain_body["reply_markup"] = markup.clone();
        }
        let plain_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!("sendMessage failed (html: {html_status}, plain: {plain_err})"),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<EventStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let allowed_users = self.allowed_users.clone();
        let client = self.client.clone();
        let stopped = Arc::clone(&self.stopped);

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for updates...");

            while !stopped.load(Ordering::Relaxed) {
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": POLL_TIMEOUT_SECS,
                    "allowed_updates": ["message", "callback_query"]
                });

                let resp = match client
                    .post(api_url(&bot_token, "getUpdates"))
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(RETRY_DELAY_SECS)).await;
                        continue;
                    }
                };

                let data: Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(RETRY_DELAY_SECS)).await;
                        continue;
                    }
                };

                if data.get("ok").and_then(Value::as_bool) == Some(false) {
                    let description = data
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    tracing::warn!(description, "Telegram getUpdates rejected");
                    tokio::time::sleep(std::time::Duration::from_secs(RETRY_DELAY_SECS)).await;
                    continue;
                }

                let Some(results) = data.get("result").and_then(Value::as_array) else {
                    continue;
                };

                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(parsed) = parse_update(update) else {
                        continue;
                    };

                    let user_id_str = parsed.user_id.to_string();
                    let username = parsed.username.as_deref().unwrap_or("unknown");
                    if !check_user_allowed(&allowed_users, [username, user_id_str.as_str()]) {
                        tracing::warn!(
                            "Telegram: ignoring update from unauthorized user: \
                             username={username}, user_id={user_id_str}"
                        );
                        continue;
                    }

                    // Stops the button's loading spinner.
                    if let Some(query_id) = &parsed.callback_query_id {
                        let answer = client
                            .post(api_url(&bot_token, "answerCallbackQuery"))
                            .json(&serde_json::json!({ "callback_query_id": query_id }))
                            .send()
                            .await;
                        if let Err(e) = answer {
                            tracing::debug!("answerCallbackQuery failed: {e}");
                        }
                    }

                    tracing::debug!(
                        user_id = parsed.user_id,
                        chat_id = ?parsed.chat_id,
                        event = parsed.event.kind(),
                        "Telegram update received"
                    );
                    let incoming =
                        IncomingEvent::new("telegram", UserId::from(parsed.user_id), parsed.event);

                    if tx.send(incoming).is_err() {
                        tracing::info!("Telegram listener channel closed");
                        return;
                    }
                }
            }

            tracing::info!("Telegram polling stopped");
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        self.stopped.store(true, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl Messenger for TelegramChannel {
    /// Users talk to the bot in private chats, so the user id is the chat id.
    async fn send_prompt(&self, user_id: &UserId, prompt: &Prompt) -> Result<(), ChannelError> {
        let chunks = split_message(&prompt.text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let markup = prompt.keyboard.as_ref().map(reply_markup);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.iter().enumerate() {
            // Buttons go under the final chunk only.
            let chunk_markup = if i == last { markup.as_ref() } else { None };
            self.send_chunk(user_id.as_str(), chunk, chunk_markup).await?;
        }
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn api_url(bot_token: &SecretString, method: &str) -> String {
    format!(
        "{TELEGRAM_API_BASE}/bot{}/{method}",
        bot_token.expose_secret()
    )
}

/// The parts of a Bot API update the router cares about.
#[derive(Debug, Clone, PartialEq)]
struct ParsedUpdate {
    user_id: i64,
    username: Option<String>,
    chat_id: Option<i64>,
    event: InboundEvent,
    callback_query_id: Option<String>,
}

/// Decode a text message or a button press. Anything else (stickers,
/// edits, photos) yields `None`.
fn parse_update(update: &Value) -> Option<ParsedUpdate> {
    if let Some(message) = update.get("message") {
        let text = message.get("text").and_then(Value::as_str)?;
        let from = message.get("from")?;
        return Some(ParsedUpdate {
            user_id: from.get("id").and_then(Value::as_i64)?,
            username: username(from),
            chat_id: message
                .get("chat")
                .and_then(|c| c.get("id"))
                .and_then(Value::as_i64),
            event: InboundEvent::from_text(text),
            callback_query_id: None,
        });
    }

    let query = update.get("callback_query")?;
    let from = query.get("from")?;
    let data = query.get("data").and_then(Value::as_str).unwrap_or_default();
    Some(ParsedUpdate {
        user_id: from.get("id").and_then(Value::as_i64)?,
        username: username(from),
        chat_id: query
            .get("message")
            .and_then(|m| m.get("chat"))
            .and_then(|c| c.get("id"))
            .and_then(Value::as_i64),
        event: InboundEvent::from_callback_data(data),
        callback_query_id: query.get("id").and_then(Value::as_str).map(String::from),
    })
}

fn username(from: &Value) -> Option<String> {
    from.get("username")
        .and_then(Value::as_str)
        .map(String::from)
}

/// `inline_keyboard` reply markup for a keyboard.
fn reply_markup(keyboard: &Keyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|b| serde_json::json!({ "text": b.label, "callback_data": b.callback_data }))
                .collect()
        })
        .collect();
    serde_json::json!({ "inline_keyboard": rows })
}

/// Check if any identity in the iterator matches the allowed users list.
fn check_user_allowed<'a>(
    allowed_users: &[String],
    identities: impl IntoIterator<Item = &'a str>,
) -> bool {
    let ids: Vec<&str> = identities.into_iter().collect();
    allowed_users
        .iter()
        .any(|u| u == "*" || ids.contains(&u.as_str()))
}

/// Split a message into chunks of at most `max_len` characters.
/// Tries to split on newlines, then spaces, then hard-cuts on a char boundary.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;

    loop {
        let Some((limit, _)) = remaining.char_indices().nth(max_len) else {
            chunks.push(remaining.to_string());
            break;
        };

        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
        if remaining.is_empty() {
            break;
        }
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::ActionId;
    use crate::router::Button;
    use crate::session::{Language, Profile};

    fn allowed(users: &[&str]) -> Vec<String> {
        users.iter().map(|s| s.to_string()).collect()
    }

    fn channel(users: &[&str]) -> TelegramChannel {
        TelegramChannel::new(SecretString::from("123:ABC".to_string()), allowed(users))
    }

    // ── Basic channel tests ─────────────────────────────────────────

    #[test]
    fn telegram_channel_name() {
        assert_eq!(channel(&["*"]).name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        assert_eq!(
            channel(&[]).api_url("getMe"),
            "https://api.telegram.org/bot123:ABC/getMe"
        );
    }

    // ── User allowlist tests ────────────────────────────────────────

    #[test]
    fn telegram_user_allowed_wildcard() {
        assert!(check_user_allowed(&allowed(&["*"]), ["anyone"]));
    }

    #[test]
    fn telegram_user_allowed_specific() {
        let list = allowed(&["alice", "bob"]);
        assert!(check_user_allowed(&list, ["alice"]));
        assert!(!check_user_allowed(&list, ["eve"]));
    }

    #[test]
    fn telegram_user_denied_empty() {
        assert!(!check_user_allowed(&allowed(&[]), ["anyone"]));
    }

    #[test]
    fn telegram_user_exact_match_not_substring() {
        let list = allowed(&["alice"]);
        assert!(!check_user_allowed(&list, ["alice_bot"]));
        assert!(!check_user_allowed(&list, ["malice"]));
    }

    #[test]
    fn telegram_user_allowed_by_numeric_id_identity() {
        let list = allowed(&["123456789"]);
        assert!(check_user_allowed(&list, ["unknown", "123456789"]));
        assert!(!check_user_allowed(&list, ["unknown", "987"]));
    }

    // ── Update parsing ──────────────────────────────────────────────

    #[test]
    fn parses_text_message() {
        let update = serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "from": {"id": 42, "username": "aigerim"},
                "chat": {"id": 42, "type": "private"},
                "text": "/start"
            }
        });
        let parsed = parse_update(&update).unwrap();
        assert_eq!(parsed.user_id, 42);
        assert_eq!(parsed.chat_id, Some(42));
        assert_eq!(parsed.username.as_deref(), Some("aigerim"));
        assert_eq!(parsed.event, InboundEvent::Start);
        assert!(parsed.callback_query_id.is_none());
    }

    #[test]
    fn parses_callback_query() {
        let update = serde_json::json!({
            "update_id": 11,
            "callback_query": {
                "id": "cbq-1",
                "from": {"id": 42},
                "message": {"message_id": 5, "chat": {"id": 42}},
                "data": "profile_doctor"
            }
        });
        let parsed = parse_update(&update).unwrap();
        assert_eq!(parsed.event, InboundEvent::ProfileSelect(Profile::Specialist));
        assert_eq!(parsed.callback_query_id.as_deref(), Some("cbq-1"));
        assert_eq!(parsed.username, None);
    }

    #[test]
    fn ignores_non_text_updates() {
        let sticker = serde_json::json!({
            "update_id": 12,
            "message": {"from": {"id": 1}, "chat": {"id": 1}, "sticker": {}}
        });
        assert!(parse_update(&sticker).is_none());

        let edited = serde_json::json!({"update_id": 13, "edited_message": {}});
        assert!(parse_update(&edited).is_none());
    }

    // ── Reply markup ────────────────────────────────────────────────

    #[test]
    fn reply_markup_is_inline_keyboard() {
        let keyboard = Keyboard::column([
            Button::action(ActionId::Form, Language::Ru),
            Button::action(ActionId::MainMenu, Language::Ru),
        ]);
        let markup = reply_markup(&keyboard);
        let rows = markup["inline_keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0]["callback_data"], "form");
        assert_eq!(rows[1][0]["callback_data"], "menu");
        assert!(!rows[0][0]["text"].as_str().unwrap().is_empty());
    }

    // ── Message splitting tests ─────────────────────────────────────

    #[test]
    fn split_message_short() {
        assert_eq!(split_message("Hello", 4096), vec!["Hello"]);
    }

    #[test]
    fn split_message_exact_limit() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4096);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks, vec!["a".repeat(2000), "b".repeat(3000)]);
    }

    #[test]
    fn split_message_over_limit_on_space() {
        let msg = format!("{} {}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks, vec!["a".repeat(2000), "b".repeat(3000)]);
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn split_message_counts_characters_not_bytes() {
        // Cyrillic is two bytes per char; 3000 chars fit in one message.
        let msg = "ж".repeat(3000);
        assert_eq!(split_message(&msg, 4096).len(), 1);

        let msg = "ж".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks[0].chars().count(), 4096);
        assert_eq!(chunks[1].chars().count(), 904);
    }
}
