use futures::future::join_all;

use super::support::*;

#[tokio::test]
async fn comments_count_tracks_live_comments() {
    let mut store = store();
    let (_, author) = register(&mut store, "ann@example.com").await;
    let (_, reader) = register(&mut store, "bo@example.com").await;
    let target = post(&mut store, &author, "count me").await;

    let mut comments = Vec::new();
    for n in 0..5 {
        comments.push(comment(&mut store, &reader, target.id, &format!("comment {n}")).await);
    }
    assert_eq!(post_counts(&mut store, target.id).await, (0, 5));

    Repo::<Comment>::new()
        .delete(&mut store, &reader, comments[2].id)
        .await
        .expect("delete comment");
    assert_eq!(post_counts(&mut store, target.id).await, (0, 4));
}

#[tokio::test]
async fn concurrent_comments_are_all_counted() {
    const WRITERS: usize = 24;

    let mut store = store();
    let (_, author) = register(&mut store, "cy@example.com").await;
    let target = post(&mut store, &author, "busy thread").await;
    let post_id = target.id;

    let tasks = (0..WRITERS).map(|n| {
        let mut handle = store.clone();
        let author = author.clone();
        async move {
            Repo::<Comment>::new()
                .create(
                    &mut handle,
                    &author,
                    NewComment {
                        post_id,
                        text: format!("reply {n}"),
                    },
                )
                .await
        }
    });
    let results = join_all(tasks).await;
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(post_counts(&mut store, target.id).await, (0, WRITERS as i64));
    let reports = Repo::<Post>::new()
        .counter_drift(&mut store, &Principal::system(), target.id)
        .await
        .expect("drift check");
    assert!(reports.iter().all(|report| !report.drifted()));
}

#[tokio::test]
async fn unliking_decrements_by_exactly_one() {
    let mut store = store();
    let (_, author) = register(&mut store, "dee@example.com").await;
    let (_, fan) = register(&mut store, "eve@example.com").await;
    let target = post(&mut store, &author, "like me").await;

    let likes = Repo::<PostLike>::new();
    let like = likes
        .create(&mut store, &fan, NewPostLike { post_id: target.id })
        .await
        .expect("like");
    likes
        .create(&mut store, &author, NewPostLike { post_id: target.id })
        .await
        .expect("self like");
    assert_eq!(post_counts(&mut store, target.id).await, (2, 0));

    likes.delete(&mut store, &fan, like.id).await.expect("unlike");
    assert_eq!(post_counts(&mut store, target.id).await, (1, 0));

    let err = likes.delete(&mut store, &fan, like.id).await.expect_err("double unlike");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(post_counts(&mut store, target.id).await, (1, 0));
}

#[tokio::test]
async fn counters_never_drop_below_zero() {
    let mut store = store();
    let (_, author) = register(&mut store, "fay@example.com").await;
    let target = post(&mut store, &author, "stale counter").await;
    let like = Repo::<PostLike>::new()
        .create(&mut store, &author, NewPostLike { post_id: target.id })
        .await
        .expect("like");

    force_column(&mut store, "post", target.id, "likes_count", Value::Null).await;
    Repo::<PostLike>::new()
        .delete(&mut store, &author, like.id)
        .await
        .expect("unlike");
    assert_eq!(post_counts(&mut store, target.id).await, (0, 0));
}

#[tokio::test]
async fn second_like_by_the_same_user_conflicts() {
    let mut store = store();
    let (_, author) = register(&mut store, "gus@example.com").await;
    let target = post(&mut store, &author, "only once").await;
    let likes = Repo::<PostLike>::new();

    let first = likes
        .create(&mut store, &author, NewPostLike { post_id: target.id })
        .await
        .expect("like");
    let err = likes
        .create(&mut store, &author, NewPostLike { post_id: target.id })
        .await
        .expect_err("duplicate like");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(post_counts(&mut store, target.id).await, (1, 0));

    likes.delete(&mut store, &author, first.id).await.expect("unlike");
    likes
        .create(&mut store, &author, NewPostLike { post_id: target.id })
        .await
        .expect("like again after unlike");
    assert_eq!(post_counts(&mut store, target.id).await, (1, 0));
}

#[tokio::test]
async fn comment_likes_feed_the_comment_counter() {
    let mut store = store();
    let (_, author) = register(&mut store, "hal@example.com").await;
    let (_, fan) = register(&mut store, "ivy@example.com").await;
    let target = post(&mut store, &author, "thread").await;
    let reply = comment(&mut store, &author, target.id, "nice").await;

    Repo::<CommentLike>::new()
        .create(&mut store, &fan, NewCommentLike { comment_id: reply.id })
        .await
        .expect("like comment");
    let reply = Repo::<Comment>::new()
        .get(&mut store, &fan, reply.id)
        .await
        .expect("read comment");
    assert_eq!(reply.likes_count, 1);
}

#[tokio::test]
async fn subscriptions_update_blog_counters() {
    let mut store = store();
    let (writer, writer_principal) = register(&mut store, "jo@example.com").await;
    let (_, reader_principal) = register(&mut store, "kim@example.com").await;

    let blogs = Repo::<Blog>::new();
    let writer_blog = blogs
        .create(
            &mut store,
            &writer_principal,
            NewBlog {
                nickname: "jo_writes".to_string(),
                picture_id: None,
            },
        )
        .await
        .expect("writer blog");

    let subscription = Repo::<Subscription>::new()
        .create(&mut store, &reader_principal, NewSubscription { follow_id: writer.id })
        .await
        .expect("follow");

    let writer_blog = blogs
        .get(&mut store, &writer_principal, writer_blog.id)
        .await
        .expect("writer blog");
    assert_eq!(writer_blog.followers_count, 1);
    assert_eq!(writer_blog.following_count, 0);

    let reader_blog = blogs
        .create(
            &mut store,
            &reader_principal,
            NewBlog {
                nickname: "kim_reads".to_string(),
                picture_id: None,
            },
        )
        .await
        .expect("reader blog");
    assert_eq!(reader_blog.following_count, 1);
    assert_eq!(reader_blog.followers_count, 0);

    let err = Repo::<Subscription>::new()
        .create(&mut store, &reader_principal, NewSubscription { follow_id: writer.id })
        .await
        .expect_err("duplicate follow");
    assert_eq!(err.kind(), ErrorKind::Conflict);

    Repo::<Subscription>::new()
        .delete(&mut store, &reader_principal, subscription.id)
        .await
        .expect("unfollow");
    let writer_blog = blogs
        .get(&mut store, &writer_principal, writer_blog.id)
        .await
        .expect("writer blog");
    let reader_blog = blogs
        .get(&mut store, &reader_principal, reader_blog.id)
        .await
        .expect("reader blog");
    assert_eq!(writer_blog.followers_count, 0);
    assert_eq!(reader_blog.following_count, 0);
}

#[tokio::test]
async fn reconcile_repairs_drift() {
    let mut store = store();
    let (_, author) = register(&mut store, "lee@example.com").await;
    let target = post(&mut store, &author, "drifting").await;
    comment(&mut store, &author, target.id, "one").await;
    comment(&mut store, &author, target.id, "two").await;
    force_column(&mut store, "post", target.id, "comments_count", json!(9)).await;

    let posts = Repo::<Post>::new();
    let err = posts
        .counter_drift(&mut store, &author, target.id)
        .await
        .expect_err("not an admin");
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let system = Principal::system();
    let drift = posts
        .counter_drift(&mut store, &system, target.id)
        .await
        .expect("check");
    let comments = drift
        .iter()
        .find(|report| report.column == "comments_count")
        .expect("comments counter");
    assert_eq!(comments.previous, Some(9));
    assert_eq!(comments.current, 2);
    assert!(comments.drifted());
    assert_eq!(post_counts(&mut store, target.id).await, (0, 9));

    let repaired = posts
        .reconcile_all(&mut store, &system)
        .await
        .expect("reconcile");
    assert_eq!(repaired.iter().filter(|report| report.drifted()).count(), 1);
    assert_eq!(post_counts(&mut store, target.id).await, (0, 2));

    let again = posts
        .reconcile_counters(&mut store, &system, target.id)
        .await
        .expect("reconcile again");
    assert!(again.iter().all(|report| !report.drifted()));
}
