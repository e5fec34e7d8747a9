use super::support::*;

#[tokio::test]
async fn only_the_author_or_an_admin_edits_a_post() {
    let mut store = store();
    let (_, author) = register(&mut store, "ann@example.com").await;
    let (_, stranger) = register(&mut store, "bo@example.com").await;
    let (_, admin) = register_admin(&mut store, "root@example.com").await;
    let target = post(&mut store, &author, "mine").await;
    let posts = Repo::<Post>::new();

    let err = posts
        .update(
            &mut store,
            &stranger,
            target.id,
            PostPatch {
                text: Some(Some("hijacked".to_string())),
                ..Default::default()
            },
        )
        .await
        .expect_err("stranger edit");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = posts
        .delete(&mut store, &stranger, target.id)
        .await
        .expect_err("stranger delete");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let unchanged = posts.get(&mut store, &author, target.id).await.expect("read");
    assert_eq!(unchanged.text.as_deref(), Some("mine"));
    assert!(unchanged.updated_at.is_none());

    let moderated = posts
        .update(
            &mut store,
            &admin,
            target.id,
            PostPatch {
                text: Some(None),
                ..Default::default()
            },
        )
        .await
        .expect("admin edit");
    assert!(moderated.text.is_none());
    assert_eq!(moderated.user_id, target.user_id);
}

#[tokio::test]
async fn anonymous_callers_cannot_author_content() {
    let mut store = store();
    let err = Repo::<Post>::new()
        .create(
            &mut store,
            &Principal::anonymous(),
            NewPost {
                text: Some("hello".to_string()),
                media_id: None,
            },
        )
        .await
        .expect_err("anonymous post");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(store.fetch_ids("post").await.expect("ids").is_empty());
}

#[tokio::test]
async fn countries_are_managed_by_admins() {
    let mut store = store();
    let (_, user) = register(&mut store, "cy@example.com").await;
    let (_, admin) = register_admin(&mut store, "root@example.com").await;
    let countries = Repo::<Country>::new();
    let new_country = || NewCountry {
        name: "Portugal".to_string(),
    };

    let err = countries
        .create(&mut store, &user, new_country())
        .await
        .expect_err("user creates country");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = countries
        .create(&mut store, &Principal::system(), new_country())
        .await
        .expect_err("no acting user");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let country = countries
        .create(&mut store, &admin, new_country())
        .await
        .expect("admin creates country");
    assert_eq!(
        countries.get(&mut store, &user, country.id).await.expect("public").name,
        "Portugal"
    );

    let err = countries
        .update(
            &mut store,
            &user,
            country.id,
            CountryPatch {
                name: Some("Spain".to_string()),
            },
        )
        .await
        .expect_err("user renames country");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn users_read_only_themselves() {
    let mut store = store();
    let (ann, ann_principal) = register(&mut store, "dee@example.com").await;
    let (bo, bo_principal) = register(&mut store, "eve@example.com").await;
    let users = Repo::<User>::new();

    assert_eq!(
        users.get(&mut store, &ann_principal, ann.id).await.expect("self").email,
        "dee@example.com"
    );
    let err = users
        .get(&mut store, &ann_principal, bo.id)
        .await
        .expect_err("other user");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let err = users
        .get(&mut store, &Principal::anonymous(), bo.id)
        .await
        .expect_err("anonymous");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = users
        .list(&mut store, &bo_principal, &ListParams::new())
        .await
        .expect_err("list users");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    let listed = users
        .list(&mut store, &Principal::system(), &ListParams::new())
        .await
        .expect("admin list");
    assert_eq!(listed.total, 2);
}

#[tokio::test]
async fn chats_are_private_to_their_participants() {
    let mut store = store();
    let (_, owner) = register(&mut store, "fay@example.com").await;
    let (friend, friend_principal) = register(&mut store, "gus@example.com").await;
    let (_, outsider) = register(&mut store, "hal@example.com").await;

    let chat = Repo::<Chat>::new()
        .create(&mut store, &owner, NewChat { with_user_id: friend.id })
        .await
        .expect("chat");
    let err = Repo::<Chat>::new()
        .get(&mut store, &outsider, chat.id)
        .await
        .expect_err("outsider reads chat");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let messages = Repo::<Message>::new();
    let new_message = || NewMessage {
        chat_id: chat.id,
        message_type: MESSAGE_TYPE_MEDIA as i16,
    };
    let err = messages
        .create(&mut store, &outsider, new_message())
        .await
        .expect_err("outsider writes");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let sent = messages
        .create(&mut store, &owner, new_message())
        .await
        .expect("owner writes");
    let reply = messages
        .create(&mut store, &friend_principal, new_message())
        .await
        .expect("participant writes");
    assert_eq!(reply.user_id, friend.id);

    assert_eq!(
        messages
            .get(&mut store, &friend_principal, sent.id)
            .await
            .expect("participant reads")
            .chat_id,
        chat.id
    );
    let err = messages
        .get(&mut store, &outsider, sent.id)
        .await
        .expect_err("outsider reads");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let in_chat = ListParams::new().with_condition(FilterCondition::eq("chat_id", chat.id));
    assert_eq!(messages.list(&mut store, &owner, &in_chat).await.expect("list").total, 2);
    assert_eq!(messages.list(&mut store, &outsider, &in_chat).await.expect("list").total, 0);
}

#[tokio::test]
async fn message_parts_belong_to_the_sender() {
    let mut store = store();
    let (_, owner) = register(&mut store, "ivy@example.com").await;
    let (friend, friend_principal) = register(&mut store, "jo@example.com").await;
    let chat = Repo::<Chat>::new()
        .create(&mut store, &owner, NewChat { with_user_id: friend.id })
        .await
        .expect("chat");
    let message = Repo::<Message>::new()
        .create(
            &mut store,
            &owner,
            NewMessage {
                chat_id: chat.id,
                message_type: MESSAGE_TYPE_MEDIA as i16,
            },
        )
        .await
        .expect("message");
    let media = Repo::<MediaObject>::new()
        .create(
            &mut store,
            &owner,
            NewMediaObject {
                file_path: Some("voice.ogg".to_string()),
            },
        )
        .await
        .expect("media");

    let parts = Repo::<MediaMessage>::new();
    let err = parts
        .create(
            &mut store,
            &friend_principal,
            NewMediaMessage {
                message_id: message.id,
                media_id: media.id,
            },
        )
        .await
        .expect_err("not the sender");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let part = parts
        .create(
            &mut store,
            &owner,
            NewMediaMessage {
                message_id: message.id,
                media_id: media.id,
            },
        )
        .await
        .expect("sender attaches media");
    assert_eq!(part.media_id, media.id);
    assert!(!part.is_deleted);
}

#[tokio::test]
async fn story_captions_need_the_story_owner() {
    let mut store = store();
    let (_, author) = register(&mut store, "kim@example.com").await;
    let (_, stranger) = register(&mut store, "lee@example.com").await;
    let story = Repo::<Story>::new()
        .create(
            &mut store,
            &author,
            NewStory {
                bg_color: "123abc".to_string(),
                media_id: None,
            },
        )
        .await
        .expect("story");

    let err = Repo::<StoryText>::new()
        .create(
            &mut store,
            &stranger,
            NewStoryText {
                story_id: story.id,
                text: "not mine".to_string(),
            },
        )
        .await
        .expect_err("stranger caption");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(store.fetch_ids("story_text").await.expect("ids").is_empty());
}

#[tokio::test]
async fn notifications_reach_recipients_or_everyone() {
    let mut store = store();
    let (ann, ann_principal) = register(&mut store, "max@example.com").await;
    let (_, bo_principal) = register(&mut store, "ned@example.com").await;
    let (_, admin) = register_admin(&mut store, "root@example.com").await;
    let notifications = Repo::<Notification>::new();

    let err = notifications
        .create(
            &mut store,
            &ann_principal,
            NewNotification {
                text: "spam".to_string(),
                for_user_id: None,
                read_at: None,
            },
        )
        .await
        .expect_err("user notifies");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let broadcast = notifications
        .create(
            &mut store,
            &admin,
            NewNotification {
                text: "maintenance tonight".to_string(),
                for_user_id: None,
                read_at: None,
            },
        )
        .await
        .expect("broadcast");
    let direct = notifications
        .create(
            &mut store,
            &admin,
            NewNotification {
                text: "welcome".to_string(),
                for_user_id: Some(ann.id),
                read_at: None,
            },
        )
        .await
        .expect("direct");

    notifications
        .get(&mut store, &bo_principal, broadcast.id)
        .await
        .expect("broadcast is public");
    notifications
        .get(&mut store, &ann_principal, direct.id)
        .await
        .expect("recipient reads");
    let err = notifications
        .get(&mut store, &bo_principal, direct.id)
        .await
        .expect_err("not the recipient");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let visible_to_bo = notifications
        .list(&mut store, &bo_principal, &ListParams::new())
        .await
        .expect("list");
    assert_eq!(visible_to_bo.total, 1);
    assert_eq!(visible_to_bo.items[0].id, broadcast.id);

    let err = notifications
        .update(
            &mut store,
            &ann_principal,
            direct.id,
            NotificationPatch {
                read_at: Some(Some(chrono::Utc::now())),
                ..Default::default()
            },
        )
        .await
        .expect_err("recipient edits");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn roles_are_granted_by_admins_only() {
    let mut store = store();
    let err = Repo::<User>::new()
        .create(
            &mut store,
            &Principal::anonymous(),
            NewUser {
                email: "sneaky@example.com".to_string(),
                password: "secret-pass".to_string(),
                roles: vec![ROLE_ADMIN.to_string()],
            },
        )
        .await
        .expect_err("self-granted admin");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let (user, principal) = register(&mut store, "ok@example.com").await;
    let users = Repo::<User>::new();
    let err = users
        .update(
            &mut store,
            &principal,
            user.id,
            UserPatch {
                roles: Some(vec![ROLE_ADMIN.to_string()]),
                ..Default::default()
            },
        )
        .await
        .expect_err("self promotion");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let (_, admin) = register_admin(&mut store, "root@example.com").await;
    assert!(admin.is_admin());
    let promoted = users
        .update(
            &mut store,
            &admin,
            user.id,
            UserPatch {
                roles: Some(vec![ROLE_ADMIN.to_string()]),
                ..Default::default()
            },
        )
        .await
        .expect("admin promotes");
    assert!(Principal::from(&promoted).is_admin());
}
