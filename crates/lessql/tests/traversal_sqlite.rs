mod common;

use lessql::{Direction, LogicErrorKind, Value};

fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

#[test]
fn sqlite_find_by_primary_key() {
    let (db, log) = common::blog();

    let editor = db.find("user", 2).expect("find user 2").expect("user 2 exists");
    let chief = db.find("user", 3).expect("find user 3").expect("user 3 exists");
    let missing = db.find("user", 42).expect("find user 42");

    assert!(editor.exists());
    assert!(chief.exists());
    assert!(missing.is_none());
    assert_eq!(editor.get("name").as_str(), Some("Editor"));
    assert_eq!(chief.get("name").as_str(), Some("Chief Editor"));
    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `user` WHERE `id` = '2'",
            "SELECT * FROM `user` WHERE `id` = '3'",
            "SELECT * FROM `user` WHERE `id` = '42'",
        ]
    );
}

#[test]
fn sqlite_traversal_uses_one_query_per_relation() {
    let (db, log) = common::blog();

    let mut posts = Vec::new();
    let ordered = db.table("post").order_by("date_published", Direction::Desc);
    for post in ordered.iter().expect("fetch posts") {
        let author = post.related("author").fetch().expect("fetch author");
        let editor = post.related("editor").fetch().expect("fetch editor");
        post.related("editor")
            .where_("id > ?", [0])
            .fetch()
            .expect("fetch filtered editor");

        if let Some(author) = &author {
            assert!(author.exists());
        }
        if let Some(editor) = &editor {
            assert!(editor.exists());
        }

        let categories: Vec<String> = post
            .related("categorizationList")
            .related_to("category")
            .iter()
            .expect("resolve categories")
            .filter_map(|category| category.get("title").as_str().map(str::to_string))
            .collect();

        post.related("categorizationList")
            .related_to("category")
            .where_("id > ?", [0])
            .fetch_all()
            .expect("fetch filtered categories");

        posts.push((
            post.get("title").as_str().map(str::to_string),
            author.and_then(|a| a.get("name").as_str().map(str::to_string)),
            editor.and_then(|e| e.get("name").as_str().map(str::to_string)),
            categories,
        ));
    }

    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `post` ORDER BY `date_published` DESC",
            "SELECT * FROM `user` WHERE `id` IN ( '2', '1' )",
            "SELECT * FROM `user` WHERE `id` IN ( '3', '2' )",
            "SELECT * FROM `user` WHERE id > ? AND `id` IN ( '3', '2' )",
            "SELECT * FROM `categorization` WHERE `post_id` IN ( '13', '11', '12' )",
            "SELECT * FROM `category` WHERE `id` IN ( '22', '23', '21' )",
            "SELECT * FROM `category` WHERE id > ? AND `id` IN ( '22', '23', '21' )",
        ]
    );

    let owned = |s: &str| Some(s.to_string());
    assert_eq!(
        posts,
        vec![
            (
                owned("Bar released"),
                owned("Editor"),
                owned("Chief Editor"),
                vec!["Tech".to_string()],
            ),
            (
                owned("Championship won"),
                owned("Writer"),
                None,
                vec!["Sports".to_string(), "Basketball".to_string()],
            ),
            (
                owned("Foo released"),
                owned("Writer"),
                owned("Editor"),
                vec!["Tech".to_string()],
            ),
        ]
    );
}

#[test]
fn sqlite_via_overrides_reference_key() {
    let (db, log) = common::blog();

    let post = db.find("post", 12).expect("find post").expect("post 12 exists");
    let author = post
        .related("user")
        .via("author_id")
        .expect("via on related result")
        .fetch()
        .expect("fetch author")
        .expect("author exists");
    let editor = post
        .related("user")
        .via("editor_id")
        .expect("via on related result")
        .fetch()
        .expect("fetch editor")
        .expect("editor exists");
    let posts = author
        .related("postList")
        .via("author_id")
        .expect("via on related result");

    assert_eq!(author.get("id"), Value::Int(1));
    assert_eq!(editor.get("id"), Value::Int(2));
    assert_eq!(posts.local_keys("id").expect("post ids"), ints(&[11, 12]));
    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `post` WHERE `id` = '12'",
            "SELECT * FROM `user` WHERE `id` = '1'",
            "SELECT * FROM `user` WHERE `id` = '2'",
            "SELECT * FROM `post` WHERE `author_id` = '1'",
        ]
    );
}

#[test]
fn sqlite_referenced_from_found_row() {
    let (db, log) = common::blog();

    let post = db.find("post", 11).expect("find post").expect("post 11 exists");
    let author = post
        .related("author")
        .fetch()
        .expect("fetch author")
        .expect("author exists");
    let categorizations = post
        .related("categorizationList")
        .fetch_all()
        .expect("fetch categorizations");

    assert_eq!(author.get("id"), Value::Int(1));
    assert_eq!(categorizations.len(), 2);
    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `post` WHERE `id` = '11'",
            "SELECT * FROM `user` WHERE `id` = '1'",
            "SELECT * FROM `categorization` WHERE `post_id` = '11'",
        ]
    );
}

#[test]
fn sqlite_back_reference_hint() {
    let (db, log) = common::blog();

    let users = db.table("user");
    for user in users.iter().expect("fetch users") {
        user.related("edit_postList")
            .fetch_all()
            .expect("fetch edited posts");
    }

    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `user`",
            "SELECT * FROM `post` WHERE `editor_id` IN ( '1', '2', '3' )",
        ]
    );
}

#[test]
fn sqlite_local_and_global_keys() {
    let (db, _log) = common::blog();

    let posts = db.table("post");
    for post in posts.iter().expect("fetch posts") {
        let id = post.get("id");
        let author_id = post.get("author_id");

        assert_eq!(post.local_keys("id"), vec![id.clone()]);
        assert_eq!(post.global_keys("id").expect("global ids"), ints(&[11, 12, 13]));
        assert_eq!(post.local_keys("author_id"), vec![author_id.clone()]);
        assert_eq!(
            post.global_keys("author_id").expect("global author ids"),
            ints(&[1, 2])
        );

        let users = post.related("author");
        assert_eq!(users.local_keys("id").expect("local user ids"), vec![author_id]);
        assert_eq!(users.global_keys("id").expect("global user ids"), ints(&[1, 2]));

        let related = post.related("categorizationList");
        for categorization in related.iter().expect("fetch categorizations") {
            assert_eq!(categorization.local_keys("post_id"), vec![id.clone()]);
            assert_eq!(
                categorization.global_keys("post_id").expect("global post ids"),
                ints(&[11, 12, 13])
            );
        }

        let categorizations = post.related("categorizationList");
        let categories = categorizations.related_to("category");
        assert_eq!(
            categorizations
                .global_keys("category_id")
                .expect("global category ids"),
            ints(&[22, 23, 21])
        );

        if id == Value::Int(11) {
            assert_eq!(
                categorizations
                    .local_keys("category_id")
                    .expect("local category ids"),
                ints(&[22, 23])
            );
            assert_eq!(categories.row_count().expect("category count"), 2);
            assert_eq!(categories.local_keys("id").expect("category ids"), ints(&[22, 23]));
        } else {
            assert_eq!(
                categorizations
                    .local_keys("category_id")
                    .expect("local category ids"),
                ints(&[21])
            );
        }
    }
}

#[test]
fn sqlite_nested_traversal_shares_fetches_across_iterations() {
    let (db, log) = common::blog();

    let posts = db.table("post");
    let mut titles = Vec::new();
    for post in posts.iter().expect("fetch posts") {
        let categorizations = post.related("categorizationList");
        for categorization in categorizations.iter().expect("fetch categorizations") {
            assert_eq!(
                categorization.global_keys("post_id").expect("global post ids"),
                ints(&[11, 12, 13])
            );
            let category = categorization
                .related("category")
                .fetch()
                .expect("fetch category")
                .expect("category exists");
            titles.push(category.get("title").as_str().map(str::to_string));
        }
    }

    let owned = |s: &str| Some(s.to_string());
    assert_eq!(
        titles,
        vec![owned("Sports"), owned("Basketball"), owned("Tech"), owned("Tech")]
    );
    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `post`",
            "SELECT * FROM `categorization` WHERE `post_id` IN ( '11', '12', '13' )",
            "SELECT * FROM `category` WHERE `id` IN ( '22', '23', '21' )",
        ]
    );
}

#[test]
fn sqlite_fetch_all_twice_returns_the_same_clean_rows() {
    let (db, log) = common::blog();

    let posts = db.table("post");
    let first = posts.fetch_all().expect("first fetch");
    let second = posts.fetch_all().expect("second fetch");

    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    for (a, b) in first.iter().zip(&second) {
        assert!(a.ptr_eq(b));
        assert!(a.modified().is_empty());
        assert!(a.is_clean());
        assert!(a.exists());
    }
    assert_eq!(log.statements(), vec!["SELECT * FROM `post`"]);
}

#[test]
fn sqlite_iteration_propagates_executor_errors() {
    let (db, _log) = common::blog();

    let err = db
        .table("no_such_table")
        .iter()
        .expect_err("table does not exist");
    assert!(err.is_executor_error(), "unexpected error: {err}");
    assert_eq!(err.logic_kind(), None);
}

#[test]
fn sqlite_bad_reference_reports_missing_key_column() {
    let (db, _log) = common::blog();

    let err = db
        .table("category")
        .related_to("post")
        .fetch_all()
        .expect_err("category rows have no post_id");
    assert_eq!(err.logic_kind(), Some(LogicErrorKind::MissingKeyColumn));
    assert!(
        err.to_string()
            .contains("\"post_id\" does not exist in \"category\" result"),
        "unexpected message: {err}"
    );
}
