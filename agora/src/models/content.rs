use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{COMMENT, COMMENT_LIKE, MEDIA_OBJECT, POST, POST_LIKE, SAVED_POST, STORY, STORY_TEXT};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaObject {
    pub id: i64,
    pub file_path: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(MediaObject => MEDIA_OBJECT);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewMediaObject {
    pub file_path: Option<String>,
}

payload!(NewMediaObject => MediaObject);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MediaObjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<Option<String>>,
}

patch!(MediaObjectPatch => MediaObject);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: Option<String>,
    pub likes_count: Option<i64>,
    pub comments_count: i64,
    pub media_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Post => POST);

impl Post {
    /// Like count with NULL read as zero.
    pub fn likes(&self) -> i64 {
        self.likes_count.unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPost {
    pub text: Option<String>,
    pub media_id: Option<i64>,
}

payload!(NewPost => Post);

#[derive(Debug, Clone, Default, Serialize)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<Option<i64>>,
}

patch!(PostPatch => Post);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub likes_count: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Comment => COMMENT);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewComment {
    pub post_id: i64,
    pub text: String,
}

payload!(NewComment => Comment);

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

patch!(CommentPatch => Comment);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostLike {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(PostLike => POST_LIKE);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPostLike {
    pub post_id: i64,
}

payload!(NewPostLike => PostLike);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentLike {
    pub id: i64,
    pub comment_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(CommentLike => COMMENT_LIKE);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCommentLike {
    pub comment_id: i64,
}

payload!(NewCommentLike => CommentLike);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPost {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(SavedPost => SAVED_POST);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSavedPost {
    pub post_id: i64,
}

payload!(NewSavedPost => SavedPost);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    /// Six hex digits, no leading `#`.
    pub bg_color: String,
    pub media_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Story => STORY);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewStory {
    pub bg_color: String,
    pub media_id: Option<i64>,
}

payload!(NewStory => Story);

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<Option<i64>>,
}

patch!(StoryPatch => Story);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryText {
    pub id: i64,
    pub text: String,
    pub story_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(StoryText => STORY_TEXT);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewStoryText {
    pub story_id: i64,
    pub text: String,
}

payload!(NewStoryText => StoryText);

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoryTextPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

patch!(StoryTextPatch => StoryText);
