use super::support::*;

#[tokio::test]
async fn deleted_post_hides_its_comments() {
    let mut store = store();
    let (_, author) = register(&mut store, "ann@example.com").await;
    let target = post(&mut store, &author, "going away").await;
    let reply = comment(&mut store, &author, target.id, "still here?").await;

    let comments = Repo::<Comment>::new();
    let by_post = ListParams::new().with_condition(FilterCondition::eq("post_id", target.id));
    assert_eq!(
        comments.list(&mut store, &author, &by_post).await.expect("list").total,
        1
    );

    Repo::<Post>::new()
        .delete(&mut store, &author, target.id)
        .await
        .expect("delete post");

    let err = comments
        .get(&mut store, &author, reply.id)
        .await
        .expect_err("comment under deleted post");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let listed = comments.list(&mut store, &author, &by_post).await.expect("list");
    assert_eq!(listed.total, 0);
    assert!(listed.items.is_empty());

    let everything = comments
        .list(&mut store, &Principal::system(), &ListParams::new())
        .await
        .expect("list all");
    assert_eq!(everything.total, 0);

    let stored = store.fetch_row("comment", reply.id).await.expect("fetch").expect("row kept");
    assert_eq!(stored["is_deleted"], json!(false));
}

#[tokio::test]
async fn deleted_row_is_gone_for_everyone() {
    let mut store = store();
    let (_, author) = register(&mut store, "bo@example.com").await;
    let target = post(&mut store, &author, "short lived").await;
    let posts = Repo::<Post>::new();
    posts.delete(&mut store, &author, target.id).await.expect("delete");

    for principal in [author.clone(), Principal::system(), Principal::anonymous()] {
        let err = posts
            .get(&mut store, &principal, target.id)
            .await
            .expect_err("deleted post");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    let err = posts
        .delete(&mut store, &author, target.id)
        .await
        .expect_err("second delete");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let stored = store.fetch_row("post", target.id).await.expect("fetch").expect("row kept");
    assert_eq!(stored["is_deleted"], json!(true));
}

#[tokio::test]
async fn story_text_follows_its_story() {
    let mut store = store();
    let (_, author) = register(&mut store, "cy@example.com").await;
    let story = Repo::<Story>::new()
        .create(
            &mut store,
            &author,
            NewStory {
                bg_color: "00FF00".to_string(),
                media_id: None,
            },
        )
        .await
        .expect("story");
    let caption = Repo::<StoryText>::new()
        .create(
            &mut store,
            &author,
            NewStoryText {
                story_id: story.id,
                text: "sunset".to_string(),
            },
        )
        .await
        .expect("caption");

    let texts = Repo::<StoryText>::new();
    assert_eq!(
        texts
            .get(&mut store, &Principal::anonymous(), caption.id)
            .await
            .expect("public caption")
            .text,
        "sunset"
    );

    Repo::<Story>::new()
        .delete(&mut store, &author, story.id)
        .await
        .expect("delete story");
    let err = texts
        .get(&mut store, &author, caption.id)
        .await
        .expect_err("hidden caption");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn message_parts_vanish_with_the_chat() {
    let mut store = store();
    let (_, owner) = register(&mut store, "dee@example.com").await;
    let (friend, _) = register(&mut store, "eve@example.com").await;
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
                message_type: MESSAGE_TYPE_TEXT as i16,
            },
        )
        .await
        .expect("message");
    let body = Repo::<TextMessage>::new()
        .create(
            &mut store,
            &owner,
            NewTextMessage {
                message_id: message.id,
                text: "see you".to_string(),
            },
        )
        .await
        .expect("body");

    Repo::<Chat>::new()
        .delete(&mut store, &owner, chat.id)
        .await
        .expect("delete chat");

    let err = Repo::<Message>::new()
        .get(&mut store, &owner, message.id)
        .await
        .expect_err("hidden message");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = Repo::<TextMessage>::new()
        .get(&mut store, &owner, body.id)
        .await
        .expect_err("hidden body");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = Repo::<TextMessage>::new()
        .create(
            &mut store,
            &owner,
            NewTextMessage {
                message_id: message.id,
                text: "anyone?".to_string(),
            },
        )
        .await
        .expect_err("body under hidden message");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn hidden_rows_cannot_be_changed() {
    let mut store = store();
    let (_, author) = register(&mut store, "fay@example.com").await;
    let target = post(&mut store, &author, "parent").await;
    let reply = comment(&mut store, &author, target.id, "child").await;
    Repo::<Post>::new()
        .delete(&mut store, &author, target.id)
        .await
        .expect("delete post");

    let comments = Repo::<Comment>::new();
    let err = comments
        .update(
            &mut store,
            &author,
            reply.id,
            CommentPatch {
                text: Some("edited".to_string()),
            },
        )
        .await
        .expect_err("update hidden comment");
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = comments
        .delete(&mut store, &Principal::system(), reply.id)
        .await
        .expect_err("delete hidden comment");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn reference_parents_do_not_hide_children() {
    let mut store = store();
    let (_, author) = register(&mut store, "gus@example.com").await;
    let media = Repo::<MediaObject>::new()
        .create(
            &mut store,
            &author,
            NewMediaObject {
                file_path: Some("a.jpg".to_string()),
            },
        )
        .await
        .expect("media");
    let target = Repo::<Post>::new()
        .create(
            &mut store,
            &author,
            NewPost {
                text: None,
                media_id: Some(media.id),
            },
        )
        .await
        .expect("post");

    Repo::<MediaObject>::new()
        .delete(&mut store, &author, media.id)
        .await
        .expect("delete media");
    let fetched = Repo::<Post>::new()
        .get(&mut store, &author, target.id)
        .await
        .expect("post stays visible");
    assert_eq!(fetched.media_id, Some(media.id));
}
