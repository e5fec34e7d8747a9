use super::support::*;

#[tokio::test]
async fn updated_at_moves_only_on_real_changes() {
    let mut store = store();
    let (_, author) = register(&mut store, "ann@example.com").await;
    let target = post(&mut store, &author, "draft").await;
    let posts = Repo::<Post>::new();

    let same = posts
        .update(
            &mut store,
            &author,
            target.id,
            PostPatch {
                text: Some(Some("draft".to_string())),
                ..Default::default()
            },
        )
        .await
        .expect("no-op update");
    assert!(same.updated_at.is_none());

    let empty = posts
        .update(&mut store, &author, target.id, PostPatch::default())
        .await
        .expect("empty patch");
    assert_eq!(empty, target);

    let edited = posts
        .update(
            &mut store,
            &author,
            target.id,
            PostPatch {
                text: Some(Some("final".to_string())),
                ..Default::default()
            },
        )
        .await
        .expect("edit");
    assert_eq!(edited.text.as_deref(), Some("final"));
    let stamped = edited.updated_at.expect("updated_at stamped");
    assert!(stamped >= edited.created_at);
    assert_eq!(edited.created_at, target.created_at);
    assert_eq!(posts.get(&mut store, &author, target.id).await.expect("read"), edited);
}

#[tokio::test]
async fn managed_and_immutable_fields_cannot_be_patched() {
    let mut store = store();
    let (_, author) = register(&mut store, "bo@example.com").await;
    let target = post(&mut store, &author, "parent").await;
    let reply = comment(&mut store, &author, target.id, "child").await;
    let comments = Repo::<Comment>::new();

    let err = comments
        .update_json(
            &mut store,
            &author,
            reply.id,
            json!({"post_id": target.id + 1, "likes_count": 5, "user_id": 42, "mood": "happy"}),
        )
        .await
        .expect_err("bad patch");
    let RepoError::Validation(validation) = err else {
        panic!("expected validation error");
    };
    assert!(validation.has_code("patch.immutable_field"));
    assert!(validation.has_code("patch.unknown_field"));
    assert_eq!(
        validation
            .issues
            .iter()
            .filter(|issue| issue.code == "patch.immutable_field")
            .count(),
        3
    );

    let err = comments
        .update_json(&mut store, &author, reply.id, json!({"text": null}))
        .await
        .expect_err("required text");
    assert!(matches!(err, RepoError::Validation(ref v) if v.has_code("validation.required")));

    let err = Repo::<Story>::new()
        .update_json(&mut store, &author, 1, json!({"bg_color": "zzzzzz"}))
        .await
        .expect_err("missing story");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn patched_references_must_be_visible() {
    let mut store = store();
    let (_, author) = register(&mut store, "cy@example.com").await;
    let media = Repo::<MediaObject>::new();
    let kept = media
        .create(
            &mut store,
            &author,
            NewMediaObject {
                file_path: Some("kept.png".to_string()),
            },
        )
        .await
        .expect("media");
    let removed = media
        .create(
            &mut store,
            &author,
            NewMediaObject {
                file_path: Some("removed.png".to_string()),
            },
        )
        .await
        .expect("media");
    media.delete(&mut store, &author, removed.id).await.expect("delete media");

    let target = post(&mut store, &author, "with picture").await;
    let posts = Repo::<Post>::new();
    let err = posts
        .update(
            &mut store,
            &author,
            target.id,
            PostPatch {
                media_id: Some(Some(removed.id)),
                ..Default::default()
            },
        )
        .await
        .expect_err("deleted media");
    assert!(matches!(
        err,
        RepoError::ParentNotFound { ref field, id, .. } if field == "media_id" && id == removed.id
    ));

    let attached = posts
        .update(
            &mut store,
            &author,
            target.id,
            PostPatch {
                media_id: Some(Some(kept.id)),
                ..Default::default()
            },
        )
        .await
        .expect("attach media");
    assert_eq!(attached.media_id, Some(kept.id));

    let detached = posts
        .update(
            &mut store,
            &author,
            target.id,
            PostPatch {
                media_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("detach media");
    assert!(detached.media_id.is_none());
}

#[tokio::test]
async fn email_changes_respect_uniqueness() {
    let mut store = store();
    let (ann, ann_principal) = register(&mut store, "dee@example.com").await;
    let (bo, bo_principal) = register(&mut store, "eve@example.com").await;
    let users = Repo::<User>::new();
    let take_bo_address = || UserPatch {
        email: Some("EVE@example.com".to_string()),
        ..Default::default()
    };

    let err = users
        .update(&mut store, &ann_principal, ann.id, take_bo_address())
        .await
        .expect_err("taken email");
    assert!(matches!(
        err,
        RepoError::UniqueConstraintViolation { existing_id, .. } if existing_id == bo.id
    ));

    users.delete(&mut store, &bo_principal, bo.id).await.expect("close account");
    let moved = users
        .update(&mut store, &ann_principal, ann.id, take_bo_address())
        .await
        .expect("address released");
    assert_eq!(moved.email, "EVE@example.com");

    let (fresh, _) = register(&mut store, "dee@example.com").await;
    assert_ne!(fresh.id, ann.id);
}

#[tokio::test]
async fn password_changes_are_hashed() {
    let mut store = store();
    let (user, principal) = register(&mut store, "fay@example.com").await;
    let users = Repo::<User>::new();

    let err = users
        .update(
            &mut store,
            &principal,
            user.id,
            UserPatch {
                password: Some("tiny".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect_err("short password");
    assert!(matches!(err, RepoError::Validation(ref v) if v.has_code("validation.length")));

    let updated = users
        .update(
            &mut store,
            &principal,
            user.id,
            UserPatch {
                password: Some("brand-new-pass".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("new password");
    assert_ne!(updated.password, "brand-new-pass");
    assert_ne!(updated.password, user.password);

    assert!(
        authenticate(&mut store, "fay@example.com", "secret-pass")
            .await
            .expect("authenticate")
            .is_none()
    );
    assert!(
        authenticate(&mut store, "fay@example.com", "brand-new-pass")
            .await
            .expect("authenticate")
            .is_some()
    );
}

#[tokio::test]
async fn message_type_stays_within_known_kinds() {
    let mut store = store();
    let (_, owner) = register(&mut store, "gus@example.com").await;
    let (friend, _) = register(&mut store, "hal@example.com").await;
    let chat = Repo::<Chat>::new()
        .create(&mut store, &owner, NewChat { with_user_id: friend.id })
        .await
        .expect("chat");
    let messages = Repo::<Message>::new();
    let message = messages
        .create(
            &mut store,
            &owner,
            NewMessage {
                chat_id: chat.id,
                message_type: MESSAGE_TYPE_TEXT as i16,
            },
        )
        .await
        .expect("message");

    let err = messages
        .update(
            &mut store,
            &owner,
            message.id,
            MessagePatch {
                message_type: Some(9),
            },
        )
        .await
        .expect_err("unknown type");
    assert!(matches!(err, RepoError::Validation(ref v) if v.has_code("validation.enum")));

    let switched = messages
        .update(
            &mut store,
            &owner,
            message.id,
            MessagePatch {
                message_type: Some(MESSAGE_TYPE_MEDIA as i16),
            },
        )
        .await
        .expect("media type");
    assert_eq!(i64::from(switched.message_type), MESSAGE_TYPE_MEDIA);
}
