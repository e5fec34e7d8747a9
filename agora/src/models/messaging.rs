use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{CHAT, MEDIA_MESSAGE, MESSAGE, NOTIFICATION, TEXT_MESSAGE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub with_user_id: i64,
    /// Owner; the user who opened the chat.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Chat => CHAT);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewChat {
    pub with_user_id: i64,
}

payload!(NewChat => Chat);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    /// `MESSAGE_TYPE_TEXT` or `MESSAGE_TYPE_MEDIA`.
    #[serde(rename = "type")]
    pub message_type: i16,
    pub chat_id: i64,
    /// Sender.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Message => MESSAGE);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewMessage {
    pub chat_id: i64,
    #[serde(rename = "type")]
    pub message_type: i16,
}

payload!(NewMessage => Message);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessagePatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<i16>,
}

patch!(MessagePatch => Message);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMessage {
    pub id: i64,
    pub media_id: i64,
    pub message_id: i64,
    pub is_deleted: bool,
}

entity!(MediaMessage => MEDIA_MESSAGE);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewMediaMessage {
    pub message_id: i64,
    pub media_id: i64,
}

payload!(NewMediaMessage => MediaMessage);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaMessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<i64>,
}

patch!(MediaMessagePatch => MediaMessage);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMessage {
    pub id: i64,
    pub text: String,
    pub message_id: i64,
    pub is_deleted: bool,
}

entity!(TextMessage => TEXT_MESSAGE);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewTextMessage {
    pub message_id: i64,
    pub text: String,
}

payload!(NewTextMessage => TextMessage);

#[derive(Debug, Clone, Default, Serialize)]
pub struct TextMessagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

patch!(TextMessagePatch => TextMessage);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub text: String,
    pub read_at: Option<DateTime<Utc>>,
    /// `None` broadcasts to every user.
    pub for_user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Notification => NOTIFICATION);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewNotification {
    pub text: String,
    pub for_user_id: Option<i64>,
    pub read_at: Option<DateTime<Utc>>,
}

payload!(NewNotification => Notification);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<Option<DateTime<Utc>>>,
}

patch!(NotificationPatch => Notification);
