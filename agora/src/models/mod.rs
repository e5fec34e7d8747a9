//! Typed rows, creation inputs and patches for every table.
//!
//! Read models deserialize straight from stored rows. Creation inputs list the columns a
//! caller may supply; patches list the mutable ones, with `Option<Option<_>>` for nullable
//! columns so that `Some(None)` clears a value.

macro_rules! entity {
    ($entity:ty => $descriptor:path) => {
        impl $crate::types::Entity for $entity {
            fn descriptor() -> &'static $crate::types::TableDescriptor {
                &$descriptor
            }

            fn id(&self) -> i64 {
                self.id
            }
        }
    };
}

macro_rules! payload {
    ($input:ty => $entity:ty) => {
        impl $crate::repository::MutationPayloadBuilder for $input {
            type Entity = $entity;

            fn into_payload(self) -> $crate::errors::ValidationResult<$crate::repository::MutationPayload> {
                $crate::repository::MutationPayload::from_serialize(&self)
            }
        }
    };
}

macro_rules! patch {
    ($input:ty => $entity:ty) => {
        impl $crate::repository::UpdatePatchBuilder for $input {
            type Entity = $entity;

            fn into_patch(self) -> $crate::errors::ValidationResult<$crate::repository::MutationPatch> {
                $crate::repository::MutationPatch::from_serialize(&self)
            }
        }
    };
}

mod content;
mod messaging;
mod social;
mod users;

pub use content::{
    Comment, CommentLike, CommentPatch, MediaObject, MediaObjectPatch, NewComment, NewCommentLike, NewMediaObject,
    NewPost, NewPostLike, NewSavedPost, NewStory, NewStoryText, Post, PostLike, PostPatch, SavedPost, Story,
    StoryPatch, StoryText, StoryTextPatch,
};
pub use messaging::{
    Chat, MediaMessage, MediaMessagePatch, Message, MessagePatch, NewChat, NewMediaMessage, NewMessage,
    NewNotification, NewTextMessage, Notification, NotificationPatch, TextMessage, TextMessagePatch,
};
pub use social::{Blog, BlogPatch, NewBlog, NewSubscription, Subscription};
pub use users::{Country, CountryPatch, NewCountry, NewPerson, NewUser, Person, PersonPatch, User, UserPatch};
