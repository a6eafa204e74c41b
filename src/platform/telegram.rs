use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{Chat, MessageKind, ParseMode, UpdateKind, User};
use tracing::info;

use crate::dispatch::EventDispatcher;
use crate::event::{ChatInfo, Event, Sender};
use crate::platform::Notifier;

/// Delivers notifications through the Bot API with HTML parse mode
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, recipient: u64, html: &str) -> Result<()> {
        let chat_id = i64::try_from(recipient)
            .map(ChatId)
            .with_context(|| format!("Recipient id out of range: {}", recipient))?;
        self.bot
            .send_message(chat_id, html)
            .parse_mode(ParseMode::Html)
            .await
            .context("sendMessage failed")?;
        Ok(())
    }
}

fn sender_of(user: &User) -> Sender {
    Sender {
        id: user.id.0,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

fn chat_of(chat: &Chat) -> ChatInfo {
    ChatInfo {
        id: chat.id.0,
        title: chat.title().map(str::to_string),
        username: chat.username().map(str::to_string),
        first_name: chat.first_name().map(str::to_string),
        last_name: chat.last_name().map(str::to_string),
    }
}

fn message_text(msg: &Message) -> String {
    msg.text()
        .or_else(|| msg.caption())
        .unwrap_or_default()
        .to_string()
}

fn connection_id_of(msg: &Message) -> Option<String> {
    match &msg.kind {
        MessageKind::Common(common) => common
            .business_connection_id
            .as_ref()
            .map(|id| id.0.clone()),
        _ => None,
    }
}

/// Map a raw Bot API update onto the closed set of events the bot handles
fn to_event(update: Update) -> Event {
    match update.kind {
        UpdateKind::Message(msg) => match msg.text() {
            Some(text) => Event::PlainCommand {
                sender: msg.from.as_ref().map(sender_of),
                chat_id: msg.chat.id.0,
                text: text.to_string(),
            },
            None => Event::Other,
        },
        UpdateKind::BusinessMessage(msg) => match connection_id_of(&msg) {
            Some(connection_id) => Event::NewMessage {
                sender: msg.from.as_ref().map(sender_of),
                connection_id,
                chat: chat_of(&msg.chat),
                message_id: msg.id.0,
                text: message_text(&msg),
            },
            None => Event::Other,
        },
        UpdateKind::EditedBusinessMessage(msg) => match connection_id_of(&msg) {
            Some(connection_id) => Event::EditedMessage {
                sender: msg.from.as_ref().map(sender_of),
                connection_id,
                chat: chat_of(&msg.chat),
                message_id: msg.id.0,
                new_text: message_text(&msg),
            },
            None => Event::Other,
        },
        UpdateKind::DeletedBusinessMessages(deleted) => Event::DeletedMessages {
            connection_id: deleted.business_connection_id.0,
            chat: chat_of(&deleted.chat),
            message_ids: deleted.message_ids.iter().map(|id| id.0).collect(),
        },
        UpdateKind::BusinessConnection(connection) => Event::ConnectionStateChanged {
            connection_id: connection.id.0,
            user: sender_of(&connection.user),
            enabled: connection.is_enabled,
        },
        _ => Event::Other,
    }
}

/// Poll Telegram until Ctrl-C, feeding every update through the dispatcher
pub async fn run(bot: Bot, dispatcher: Arc<EventDispatcher>) -> Result<()> {
    info!("Starting Telegram polling...");

    let handler = dptree::endpoint(handle_update);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram polling stopped");
    Ok(())
}

async fn handle_update(update: Update, dispatcher: Arc<EventDispatcher>) -> ResponseResult<()> {
    dispatcher.dispatch(to_event(update)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contact() -> serde_json::Value {
        json!({ "id": 7, "is_bot": false, "first_name": "Alice", "username": "alice" })
    }

    fn private_chat() -> serde_json::Value {
        json!({ "id": 42, "type": "private", "first_name": "Alice", "username": "alice" })
    }

    fn parse(update: serde_json::Value) -> Event {
        let update: Update = serde_json::from_str(&update.to_string()).unwrap();
        to_event(update)
    }

    fn alice() -> Sender {
        Sender {
            id: 7,
            username: Some("alice".to_string()),
            first_name: "Alice".to_string(),
            last_name: None,
        }
    }

    fn alice_chat() -> ChatInfo {
        ChatInfo {
            id: 42,
            title: None,
            username: Some("alice".to_string()),
            first_name: Some("Alice".to_string()),
            last_name: None,
        }
    }

    #[test]
    fn test_business_message() {
        let event = parse(json!({
            "update_id": 1,
            "business_message": {
                "message_id": 10,
                "date": 1700000000,
                "chat": private_chat(),
                "from": contact(),
                "business_connection_id": "biz-1",
                "text": "hello"
            }
        }));

        assert_eq!(
            event,
            Event::NewMessage {
                sender: Some(alice()),
                connection_id: "biz-1".to_string(),
                chat: alice_chat(),
                message_id: 10,
                text: "hello".to_string(),
            }
        );
    }

    #[test]
    fn test_edited_business_message_uses_caption() {
        let event = parse(json!({
            "update_id": 2,
            "edited_business_message": {
                "message_id": 11,
                "date": 1700000000,
                "edit_date": 1700000100,
                "chat": private_chat(),
                "from": contact(),
                "business_connection_id": "biz-1",
                "photo": [{
                    "file_id": "photo-id",
                    "file_unique_id": "photo-uid",
                    "width": 90,
                    "height": 90
                }],
                "caption": "new caption"
            }
        }));

        assert_eq!(
            event,
            Event::EditedMessage {
                sender: Some(alice()),
                connection_id: "biz-1".to_string(),
                chat: alice_chat(),
                message_id: 11,
                new_text: "new caption".to_string(),
            }
        );
    }

    #[test]
    fn test_deleted_business_messages() {
        let event = parse(json!({
            "update_id": 3,
            "deleted_business_messages": {
                "business_connection_id": "biz-1",
                "chat": private_chat(),
                "message_ids": [10, 11]
            }
        }));

        assert_eq!(
            event,
            Event::DeletedMessages {
                connection_id: "biz-1".to_string(),
                chat: alice_chat(),
                message_ids: vec![10, 11],
            }
        );
    }

    #[test]
    fn test_business_connection() {
        let event = parse(json!({
            "update_id": 4,
            "business_connection": {
                "id": "biz-1",
                "user": contact(),
                "user_chat_id": 7,
                "date": 1700000000,
                "can_reply": true,
                "is_enabled": false
            }
        }));

        assert_eq!(
            event,
            Event::ConnectionStateChanged {
                connection_id: "biz-1".to_string(),
                user: alice(),
                enabled: false,
            }
        );
    }

    #[test]
    fn test_plain_text_message() {
        let event = parse(json!({
            "update_id": 5,
            "message": {
                "message_id": 12,
                "date": 1700000000,
                "chat": private_chat(),
                "from": contact(),
                "text": "/stats"
            }
        }));

        assert_eq!(
            event,
            Event::PlainCommand {
                sender: Some(alice()),
                chat_id: 42,
                text: "/stats".to_string(),
            }
        );
    }

    #[test]
    fn test_business_message_without_connection_is_ignored() {
        let event = parse(json!({
            "update_id": 6,
            "business_message": {
                "message_id": 13,
                "date": 1700000000,
                "chat": private_chat(),
                "from": contact(),
                "text": "hello"
            }
        }));

        assert_eq!(event, Event::Other);
    }
}
