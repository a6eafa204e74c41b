use crate::diff::render_diff;
use crate::event::{ChatInfo, Sender};

const SEPARATOR: &str = "━━━━━━━━━━━━━━━";

/// Escape the characters Telegram's HTML parse mode treats specially.
/// `&` goes first so the entities produced below are not escaped twice.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let name = match (first.unwrap_or(""), last.unwrap_or("")) {
        (first, "") => first.to_string(),
        ("", last) => last.to_string(),
        (first, last) => format!("{} {}", first, last),
    };
    (!name.is_empty()).then_some(name)
}

pub fn user_name(user: &Sender) -> String {
    if let Some(username) = user.username.as_deref().filter(|u| !u.is_empty()) {
        return format!("@{}", username);
    }
    join_name(Some(&user.first_name), user.last_name.as_deref())
        .unwrap_or_else(|| format!("User {}", user.id))
}

pub fn chat_title(chat: &ChatInfo) -> String {
    if let Some(title) = chat.title.as_deref().filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    if let Some(username) = chat.username.as_deref().filter(|u| !u.is_empty()) {
        return format!("@{}", username);
    }
    join_name(chat.first_name.as_deref(), chat.last_name.as_deref())
        .unwrap_or_else(|| format!("Chat {}", chat.id))
}

fn edit_header(sender: Option<&Sender>, chat: &ChatInfo) -> String {
    let title = escape_html(&chat_title(chat));
    match sender {
        Some(sender) => format!("✏️ <b>{}</b> | {}", escape_html(&user_name(sender)), title),
        None => format!("✏️ <b>{}</b>", title),
    }
}

/// What is known about the text before an edit
#[derive(Debug, Clone, Copy)]
pub enum Original<'a> {
    Unknown,
    Known(&'a str),
}

pub fn edited_notification(
    sender: Option<&Sender>,
    chat: &ChatInfo,
    original: Original<'_>,
    new_text: &str,
) -> String {
    let body = match original {
        Original::Known(old) if old == new_text => {
            "<i>Message edited (text unchanged)</i>".to_string()
        }
        Original::Known(old) => render_diff(old, new_text),
        Original::Unknown => format!(
            "<i>No original on record</i>\n{}",
            escape_html(new_text)
        ),
    };
    format!("{}\n{}\n{}", edit_header(sender, chat), SEPARATOR, body)
}

pub fn deleted_notification(chat: &ChatInfo, original: &str) -> String {
    format!(
        "🗑 <b>{}</b>\n{}\n{}",
        escape_html(&chat_title(chat)),
        SEPARATOR,
        escape_html(original)
    )
}

pub fn stats_notification(count: usize) -> String {
    format!("📊 Messages in store: <b>{}</b>", count)
}

pub fn test_notification() -> String {
    "✅ Bot is working".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat() -> ChatInfo {
        ChatInfo {
            id: 42,
            first_name: Some("Alice".to_string()),
            ..Default::default()
        }
    }

    fn sender() -> Sender {
        Sender {
            id: 7,
            username: Some("bob".to_string()),
            first_name: "Bob".to_string(),
            last_name: None,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&hi</b>"), "&lt;b&gt;&amp;hi&lt;/b&gt;");
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_user_name_resolution() {
        assert_eq!(user_name(&sender()), "@bob");

        let mut user = sender();
        user.username = None;
        user.last_name = Some("Smith".to_string());
        assert_eq!(user_name(&user), "Bob Smith");

        let nameless = Sender {
            id: 99,
            ..Default::default()
        };
        assert_eq!(user_name(&nameless), "User 99");
    }

    #[test]
    fn test_chat_title_resolution() {
        let mut chat = ChatInfo {
            id: -100,
            title: Some("Team".to_string()),
            username: Some("team_chat".to_string()),
            ..Default::default()
        };
        assert_eq!(chat_title(&chat), "Team");

        chat.title = None;
        assert_eq!(chat_title(&chat), "@team_chat");

        chat.username = None;
        chat.first_name = Some("Alice".to_string());
        chat.last_name = Some("Liddell".to_string());
        assert_eq!(chat_title(&chat), "Alice Liddell");

        assert_eq!(chat_title(&ChatInfo { id: 5, ..Default::default() }), "Chat 5");
    }

    #[test]
    fn test_edited_unchanged() {
        let text = edited_notification(Some(&sender()), &chat(), Original::Known("hello"), "hello");
        assert!(text.starts_with("✏️ <b>@bob</b> | Alice\n━━━━━━━━━━━━━━━\n"));
        assert!(text.contains("text unchanged"));
    }

    #[test]
    fn test_edited_with_diff() {
        let text = edited_notification(Some(&sender()), &chat(), Original::Known("hello"), "world");
        assert!(text.contains("<s>hello</s>"));
        assert!(text.contains("<b>world</b>"));
    }

    #[test]
    fn test_edited_without_original() {
        let text = edited_notification(Some(&sender()), &chat(), Original::Unknown, "<world>");
        assert!(text.contains("No original on record"));
        assert!(text.ends_with("&lt;world&gt;"));
    }

    #[test]
    fn test_deleted_escapes_text() {
        let text = deleted_notification(&chat(), "a & b");
        assert_eq!(text, "🗑 <b>Alice</b>\n━━━━━━━━━━━━━━━\na &amp; b");
    }

    #[test]
    fn test_header_escapes_names() {
        let chat = ChatInfo {
            id: 1,
            title: Some("<script>".to_string()),
            ..Default::default()
        };
        let text = deleted_notification(&chat, "x");
        assert!(text.starts_with("🗑 <b>&lt;script&gt;</b>"));
    }
}
