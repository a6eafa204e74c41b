use std::sync::Arc;

use tracing::{debug, error, info};

use crate::event::{ChatInfo, Command, Event, Sender};
use crate::format::{self, Original};
use crate::platform::Notifier;
use crate::store::ShadowStore;

/// Routes inbound events to the shadow store and the operator.
/// Platform-agnostic: receives `Event`, delivers through a `Notifier`.
pub struct EventDispatcher {
    store: ShadowStore,
    notifier: Arc<dyn Notifier>,
    operator_id: u64,
}

impl EventDispatcher {
    pub fn new(store: ShadowStore, notifier: Arc<dyn Notifier>, operator_id: u64) -> Self {
        Self {
            store,
            notifier,
            operator_id,
        }
    }

    fn is_operator(&self, sender: Option<&Sender>) -> bool {
        sender.is_some_and(|s| s.id == self.operator_id)
    }

    /// Handle a single event. Never fails: delivery errors are logged and
    /// store changes already made stay in place.
    pub async fn dispatch(&self, event: Event) {
        match event {
            Event::PlainCommand {
                sender,
                chat_id,
                text,
            } => self.handle_command(sender.as_ref(), chat_id, &text).await,
            Event::NewMessage {
                sender,
                connection_id,
                chat,
                message_id,
                text,
            } => {
                if self.is_operator(sender.as_ref()) || text.is_empty() {
                    return;
                }
                debug!(
                    "Shadowing message {} in chat {} ({})",
                    message_id, chat.id, connection_id
                );
                self.store
                    .save(&connection_id, chat.id, message_id, &text)
                    .await;
            }
            Event::EditedMessage {
                sender,
                connection_id,
                chat,
                message_id,
                new_text,
            } => {
                self.handle_edit(sender.as_ref(), &connection_id, &chat, message_id, &new_text)
                    .await
            }
            Event::DeletedMessages {
                connection_id,
                chat,
                message_ids,
            } => self.handle_delete(&connection_id, &chat, &message_ids).await,
            Event::ConnectionStateChanged {
                connection_id,
                user,
                enabled,
            } => {
                info!(
                    "Business connection {} for {} {}",
                    connection_id,
                    format::user_name(&user),
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            Event::Other => debug!("Ignoring unsupported event"),
        }
    }

    async fn handle_command(&self, sender: Option<&Sender>, chat_id: i64, text: &str) {
        let Some(command) = Command::parse(text) else {
            return;
        };
        if !self.is_operator(sender) {
            debug!("Ignoring {:?} from non-operator in chat {}", command, chat_id);
            return;
        }

        let reply = match command {
            Command::Stats => format::stats_notification(self.store.count().await),
            Command::Test => format::test_notification(),
        };
        info!("Operator command {:?}", command);
        self.notify(&reply).await;
    }

    async fn handle_edit(
        &self,
        sender: Option<&Sender>,
        connection_id: &str,
        chat: &ChatInfo,
        message_id: i32,
        new_text: &str,
    ) {
        if self.is_operator(sender) {
            return;
        }

        let stored = self.store.get(connection_id, chat.id, message_id).await;
        let original = match stored.as_deref() {
            Some(text) => Original::Known(text),
            None => Original::Unknown,
        };
        debug!(
            "Edit of message {} in chat {} (original on record: {})",
            message_id,
            chat.id,
            stored.is_some()
        );

        let notification = format::edited_notification(sender, chat, original, new_text);
        self.notify(&notification).await;

        self.store
            .save(connection_id, chat.id, message_id, new_text)
            .await;
    }

    async fn handle_delete(&self, connection_id: &str, chat: &ChatInfo, message_ids: &[i32]) {
        for &message_id in message_ids {
            let Some(original) = self.store.get(connection_id, chat.id, message_id).await else {
                debug!(
                    "Deleted message {} in chat {} was not on record",
                    message_id, chat.id
                );
                continue;
            };

            // An edit may have emptied the text; nothing to recover then
            if !original.is_empty() {
                self.notify(&format::deleted_notification(chat, &original))
                    .await;
            }
            self.store.delete(connection_id, chat.id, message_id).await;
        }
    }

    async fn notify(&self, html: &str) {
        if let Err(e) = self.notifier.send_text(self.operator_id, html).await {
            error!("Failed to deliver notification: {:#}", e);
        }
    }
}
