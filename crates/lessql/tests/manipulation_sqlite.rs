mod common;

use common::data;
use lessql::{Data, Direction, InsertMethod, Param, Value};
use serde_json::json;

#[test]
fn sqlite_insert_methods() {
    let (db, log) = common::blog();
    let dummy = db.table("dummy");

    db.begin().expect("begin");
    dummy.insert(&[], InsertMethod::Default).expect("empty insert");
    dummy
        .insert(&[data([("id", 1.into()), ("test", 42.into())])], InsertMethod::Default)
        .expect("insert one");
    dummy
        .insert(
            &[
                data([("id", 2.into()), ("test", 1.into())]),
                data([("id", 3.into()), ("test", 2.into())]),
                data([("id", 4.into()), ("test", 3.into())]),
            ],
            InsertMethod::Default,
        )
        .expect("insert many");
    db.commit().expect("commit");

    assert_eq!(
        log.statements(),
        vec![
            "INSERT INTO `dummy` ( `id`, `test` ) VALUES ( '1', '42' )",
            "INSERT INTO `dummy` ( `id`, `test` ) VALUES ( '2', '1' )",
            "INSERT INTO `dummy` ( `id`, `test` ) VALUES ( '3', '2' )",
            "INSERT INTO `dummy` ( `id`, `test` ) VALUES ( '4', '3' )",
        ]
    );
}

#[test]
fn sqlite_insert_prepared_binds_values() {
    let (db, log) = common::blog();

    let rows: Vec<Data> = (1..=3).map(|i| data([("test", i.into())])).collect();
    let affected = db
        .table("dummy")
        .insert(&rows, InsertMethod::Prepared)
        .expect("prepared insert");

    assert_eq!(affected, 3);
    assert_eq!(
        log.statements(),
        vec!["INSERT INTO `dummy` ( `test` ) VALUES ( ? )"; 3]
    );
    assert_eq!(
        log.params(),
        vec![
            vec![Param::from(1)],
            vec![Param::from(2)],
            vec![Param::from(3)],
        ]
    );
    assert_eq!(db.table("dummy").count("*").expect("count"), 3);
}

#[test]
fn sqlite_insert_batch() {
    let (db, log) = common::blog();

    let rows: Vec<Data> = (1..=3).map(|i| data([("test", i.into())])).collect();
    db.table("dummy")
        .insert(&rows, InsertMethod::Batch)
        .expect("batch insert");

    assert_eq!(
        log.statements(),
        vec!["INSERT INTO `dummy` ( `test` ) VALUES ( '1' ), ( '2' ), ( '3' )"]
    );
}

#[test]
fn sqlite_update_scopes() {
    let (db, log) = common::blog();
    let dummy = db.table("dummy");
    let set_42 = data([("test", 42.into())]);

    dummy.update(&Data::new()).expect("empty update");
    dummy.update(&set_42).expect("update all");
    dummy.where_("test", [1]).update(&set_42).expect("update where");
    let before_fill = log.statements();

    common::fill_dummy(&db, &log);

    dummy
        .where_sql("test > 42", Vec::<Param>::new())
        .limit(2, Some(2))
        .expect("limit")
        .update(&set_42)
        .expect("limited update");
    dummy
        .where_sql("test > 42", Vec::<Param>::new())
        .order_by("test", Direction::Asc)
        .limit(2, None)
        .expect("limit")
        .update(&set_42)
        .expect("ordered limited update");
    dummy
        .where_sql("test > 42", Vec::<Param>::new())
        .order_by("test", Direction::Asc)
        .update(&set_42)
        .expect("ordered update");

    assert_eq!(
        before_fill,
        vec![
            "UPDATE `dummy` SET `test` = '42'",
            "UPDATE `dummy` SET `test` = '42' WHERE `test` = '1'",
        ]
    );
    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `dummy` WHERE test > 42 LIMIT 2 OFFSET 2",
            "UPDATE `dummy` SET `test` = '42' WHERE `id` IN ( '4', '5' )",
            "SELECT * FROM `dummy` WHERE test > 42 ORDER BY `test` ASC LIMIT 2",
            "UPDATE `dummy` SET `test` = '42' WHERE `id` IN ( '6', '1' )",
            "UPDATE `dummy` SET `test` = '42' WHERE test > 42",
        ]
    );
}

#[test]
fn sqlite_update_limited_by_primary_key() {
    let (db, log) = common::blog();

    db.table("category")
        .where_sql("id > 21", Vec::<Param>::new())
        .limit(2, None)
        .expect("limit")
        .update(&data([("title", "Test Category".into())]))
        .expect("update");

    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `category` WHERE id > 21 LIMIT 2",
            "UPDATE `category` SET `title` = 'Test Category' WHERE `id` IN ( '22', '23' )",
        ]
    );
}

#[test]
fn sqlite_delete_scopes() {
    let (db, log) = common::blog();
    let dummy = db.table("dummy");

    dummy.delete().expect("delete all");
    dummy.where_("test", [1]).delete().expect("delete where");
    let before_fill = log.statements();

    common::fill_dummy(&db, &log);

    dummy
        .where_sql("test > 42", Vec::<Param>::new())
        .limit(2, Some(2))
        .expect("limit")
        .delete()
        .expect("limited delete");
    dummy
        .where_sql("test > 42", Vec::<Param>::new())
        .order_by("test", Direction::Asc)
        .limit(2, None)
        .expect("limit")
        .delete()
        .expect("ordered limited delete");
    let affected = dummy
        .where_sql("test > 42", Vec::<Param>::new())
        .order_by("test", Direction::Asc)
        .delete()
        .expect("ordered delete");

    assert_eq!(affected, 2);
    assert_eq!(
        before_fill,
        vec!["DELETE FROM `dummy`", "DELETE FROM `dummy` WHERE `test` = '1'"]
    );
    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `dummy` WHERE test > 42 LIMIT 2 OFFSET 2",
            "DELETE FROM `dummy` WHERE `id` IN ( '4', '5' )",
            "SELECT * FROM `dummy` WHERE test > 42 ORDER BY `test` ASC LIMIT 2",
            "DELETE FROM `dummy` WHERE `id` IN ( '6', '1' )",
            "DELETE FROM `dummy` WHERE test > 42",
        ]
    );
}

#[test]
fn sqlite_delete_limited_by_primary_key() {
    let (db, log) = common::blog();

    db.table("category")
        .where_sql("id > 21", Vec::<Param>::new())
        .limit(2, None)
        .expect("limit")
        .delete()
        .expect("delete");

    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `category` WHERE id > 21 LIMIT 2",
            "DELETE FROM `category` WHERE `id` IN ( '22', '23' )",
        ]
    );
}

#[test]
fn sqlite_delete_limited_by_compound_key() {
    let (db, log) = common::blog();

    db.table("categorization")
        .where_sql("category_id > 21", Vec::<Param>::new())
        .limit(2, None)
        .expect("limit")
        .delete()
        .expect("delete");

    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `categorization` WHERE category_id > 21 LIMIT 2",
            "DELETE FROM `categorization` WHERE ( `category_id` = '22' AND `post_id` = '11' ) OR ( `category_id` = '23' AND `post_id` = '11' )",
        ]
    );
    assert_eq!(db.table("categorization").count("*").expect("count"), 2);
}

#[test]
fn sqlite_related_update_goes_through_primary_keys() {
    let (db, log) = common::blog();

    let post = db.find("post", 11).expect("find").expect("post 11 exists");
    post.related("author")
        .update(&data([("name", "Renamed".into())]))
        .expect("update related");

    assert_eq!(
        log.statements(),
        vec![
            "SELECT * FROM `post` WHERE `id` = '11'",
            "SELECT * FROM `user` WHERE `id` = '1'",
            "UPDATE `user` SET `name` = 'Renamed' WHERE `id` = '1'",
        ]
    );
}

#[test]
fn sqlite_aggregates() {
    let (db, _log) = common::blog();

    let users = db.table("user");
    let expected = i64::try_from(users.fetch_all().expect("fetch users").len())
        .expect("row count fits i64");
    assert_eq!(users.count("*").expect("count"), expected);
    assert_eq!(db.table("post").min("id").expect("min"), Value::Int(11));
    assert_eq!(db.table("post").max("id").expect("max"), Value::Int(13));
    assert_eq!(
        db.table("post")
            .where_("author_id", [1])
            .sum("id")
            .expect("sum"),
        Value::Int(23)
    );
}

#[test]
fn sqlite_result_json() {
    let (db, _log) = common::blog();

    let json = serde_json::to_string(&db.table("user").select(["id"])).expect("serialize");
    assert_eq!(json, r#"[{"id":1},{"id":2},{"id":3}]"#);
}

#[test]
fn sqlite_create_row_from_result_and_save() {
    let (db, _log) = common::blog();

    let row = db
        .table("user")
        .create_row(&json!({ "name": "foo" }))
        .expect("create row");
    assert_eq!(row.table(), "user");

    row.save().expect("save");
    let id = row.get("id");
    assert!(!id.is_null());

    let found = db.find("user", id).expect("find").expect("saved row exists");
    assert_eq!(found.get("name").as_str(), Some("foo"));
}
