/// Who sent a message, with the fields needed to display them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sender {
    pub id: u64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// The chat a message belongs to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatInfo {
    pub id: i64,
    pub title: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Everything the bot reacts to. The transport maps its native updates
/// onto this set; anything it cannot map becomes `Other`.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NewMessage {
        sender: Option<Sender>,
        connection_id: String,
        chat: ChatInfo,
        message_id: i32,
        text: String,
    },
    EditedMessage {
        sender: Option<Sender>,
        connection_id: String,
        chat: ChatInfo,
        message_id: i32,
        new_text: String,
    },
    DeletedMessages {
        connection_id: String,
        chat: ChatInfo,
        message_ids: Vec<i32>,
    },
    ConnectionStateChanged {
        connection_id: String,
        user: Sender,
        enabled: bool,
    },
    /// A plain (non-business) text message sent directly to the bot
    PlainCommand {
        sender: Option<Sender>,
        chat_id: i64,
        text: String,
    },
    Other,
}

/// Operator commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Stats,
    Test,
}

impl Command {
    /// Parse an exact command token. Group chats append `@botname`,
    /// which is accepted and ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.trim();
        let token = token.split_once('@').map_or(token, |(cmd, _)| cmd);
        match token {
            "/stats" => Some(Command::Stats),
            "/test" => Some(Command::Test),
            _ => None,
        }
    }
}
