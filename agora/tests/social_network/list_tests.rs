use super::support::*;

async fn seed_posts(store: &mut MemoryStore, author: &Principal, count: usize) -> Vec<Post> {
    let mut posts = Vec::with_capacity(count);
    for n in 0..count {
        posts.push(post(store, author, &format!("post {n}")).await);
    }
    posts
}

#[tokio::test]
async fn pages_through_live_rows() {
    let mut store = store();
    let (_, author) = register(&mut store, "ann@example.com").await;
    let posts = seed_posts(&mut store, &author, 7).await;
    let repo = Repo::<Post>::new();
    repo.delete(&mut store, &author, posts[0].id).await.expect("delete");

    let first = repo
        .list_with_query(&mut store, &Principal::anonymous(), ListQuery::default())
        .await
        .expect("default page");
    assert_eq!(first.page, 1);
    assert_eq!(first.page_size, 25);
    assert_eq!(first.total, 6);
    assert!(!first.has_more());
    assert_eq!(first.items[0].id, posts[1].id);

    let second = repo
        .list(&mut store, &author, &ListParams::new().with_page(2, 4))
        .await
        .expect("second page");
    assert_eq!(second.total, 6);
    assert_eq!(
        second.items.iter().map(|post| post.id).collect::<Vec<_>>(),
        vec![posts[5].id, posts[6].id]
    );
    assert!(!second.has_more());

    let first_of_two = repo
        .list(&mut store, &author, &ListParams::new().with_page(1, 4))
        .await
        .expect("first page");
    assert_eq!(first_of_two.items.len(), 4);
    assert!(first_of_two.has_more());

    let beyond = repo
        .list(&mut store, &author, &ListParams::new().with_page(9, 4))
        .await
        .expect("past the end");
    assert!(beyond.items.is_empty());
    assert_eq!(beyond.total, 6);
}

#[tokio::test]
async fn filters_comments_by_post() {
    let mut store = store();
    let (_, author) = register(&mut store, "bo@example.com").await;
    let first = post(&mut store, &author, "first").await;
    let second = post(&mut store, &author, "second").await;
    for n in 0..3 {
        comment(&mut store, &author, first.id, &format!("on first {n}")).await;
    }
    comment(&mut store, &author, second.id, "on second").await;

    let comments = Repo::<Comment>::new();
    let on_first = comments
        .list_with_query(
            &mut store,
            &author,
            ListQuery {
                filter: vec![format!("post_id:eq:{}", first.id)],
                ..Default::default()
            },
        )
        .await
        .expect("filtered");
    assert_eq!(on_first.total, 3);
    assert!(on_first.items.iter().all(|comment| comment.post_id == first.id));

    let on_either = comments
        .list_with_query(
            &mut store,
            &author,
            ListQuery {
                filter: vec![format!("post_id:eq:{}|{}", first.id, second.id)],
                sort_by: Some("id".to_string()),
                sort_order: Some(SortOrder::Desc),
                ..Default::default()
            },
        )
        .await
        .expect("either post");
    assert_eq!(on_either.total, 4);
    assert_eq!(on_either.items[0].post_id, second.id);
}

#[tokio::test]
async fn admins_search_users_by_email() {
    let mut store = store();
    register(&mut store, "carol@example.com").await;
    register(&mut store, "dave@example.org").await;
    register(&mut store, "CAROLINE@example.net").await;

    let found = Repo::<User>::new()
        .list_with_query(
            &mut store,
            &Principal::system(),
            ListQuery {
                filter: vec!["email:contains:carol".to_string()],
                sort_by: Some("email".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("search");
    let emails: Vec<&str> = found.items.iter().map(|user| user.email.as_str()).collect();
    assert_eq!(emails, vec!["carol@example.com", "CAROLINE@example.net"]);
}

#[tokio::test]
async fn sorts_newest_first() {
    let mut store = store();
    let (_, author) = register(&mut store, "eve@example.com").await;
    seed_posts(&mut store, &author, 4).await;

    let newest = Repo::<Post>::new()
        .list(
            &mut store,
            &author,
            &ListParams::new().with_sort("created_at", SortOrder::Desc),
        )
        .await
        .expect("sorted");
    assert_eq!(newest.items.len(), 4);
    assert!(
        newest
            .items
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
}

#[tokio::test]
async fn rejects_unknown_sorts_and_filters() {
    let mut store = store();
    let (_, author) = register(&mut store, "fay@example.com").await;
    let posts = Repo::<Post>::new();

    let err = posts
        .list_with_query(
            &mut store,
            &author,
            ListQuery {
                sort_by: Some("likes_count".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect_err("unsupported sort");
    assert!(matches!(err, RepoError::InvalidRequest { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = posts
        .list(&mut store, &author, &ListParams::new().with_sort("nonsense", SortOrder::Asc))
        .await
        .expect_err("unknown column");
    assert!(matches!(err, RepoError::InvalidRequest { .. }));

    let err = posts
        .list_with_query(
            &mut store,
            &author,
            ListQuery {
                filter: vec!["text:eq:hello".to_string()],
                ..Default::default()
            },
        )
        .await
        .expect_err("unsupported filter");
    assert!(matches!(err, RepoError::InvalidRequest { .. }));
}

#[tokio::test]
async fn saved_posts_list_only_the_callers_own() {
    let mut store = store();
    let (_, author) = register(&mut store, "gus@example.com").await;
    let (_, reader) = register(&mut store, "hal@example.com").await;
    let (_, other_reader) = register(&mut store, "ivy@example.com").await;
    let target = post(&mut store, &author, "bookmark me").await;

    let saved = Repo::<SavedPost>::new();
    let mine = saved
        .create(&mut store, &reader, NewSavedPost { post_id: target.id })
        .await
        .expect("save");
    saved
        .create(&mut store, &other_reader, NewSavedPost { post_id: target.id })
        .await
        .expect("save");

    let listed = saved
        .list(&mut store, &reader, &ListParams::new())
        .await
        .expect("list");
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, mine.id);

    let everything = saved
        .list(&mut store, &Principal::system(), &ListParams::new())
        .await
        .expect("admin list");
    assert_eq!(everything.total, 2);

    let err = saved
        .get(&mut store, &other_reader, mine.id)
        .await
        .expect_err("someone else's bookmark");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn pages_far_past_the_end_are_empty() {
    let mut store = store();
    let (_, author) = register(&mut store, "jo@example.com").await;
    seed_posts(&mut store, &author, 3).await;

    let far = Repo::<Post>::new()
        .list_with_query(
            &mut store,
            &Principal::anonymous(),
            ListQuery {
                page: Some(u64::MAX),
                page_size: Some(100),
                ..Default::default()
            },
        )
        .await
        .expect("huge page");
    assert!(far.items.is_empty());
    assert_eq!(far.total, 3);
    assert_eq!(far.page, u64::MAX);
    assert!(!far.has_more());
}
