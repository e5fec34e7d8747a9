use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{BLOG, SUBSCRIPTION};

/// `user_id` follows `follow_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub follow_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Subscription => SUBSCRIPTION);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewSubscription {
    pub follow_id: i64,
}

payload!(NewSubscription => Subscription);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    /// Live subscriptions following the blog's owner.
    pub followers_count: i64,
    /// Live subscriptions held by the blog's owner.
    pub following_count: i64,
    pub nickname: String,
    pub picture_id: Option<i64>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

entity!(Blog => BLOG);

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewBlog {
    pub nickname: String,
    pub picture_id: Option<i64>,
}

payload!(NewBlog => Blog);

#[derive(Debug, Clone, Default, Serialize)]
pub struct BlogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture_id: Option<Option<i64>>,
}

patch!(BlogPatch => Blog);
