use super::*;
use crate::{
    config::DbConfig,
    db::{Db, ReadConsistency},
    error::{ErrorClass, ErrorOrigin},
    key::Key,
    test_fixtures::{Employee, Task, Ticket, TicketNote, fixture_db, fixture_db_with},
    traits::EntityKind,
    types::Ref,
};

fn seeded_db() -> Db {
    let db = fixture_db();
    db.session()
        .in_transaction(|unit| {
            for id in ["ann", "bob"] {
                let employee = unit.register(Employee::new(id));
                unit.register(Task::new(employee, &format!("{id}-task")));
            }
            unit.register(Employee::new("cy"));
            unit.register(Ticket::new(7, "ticket"));
            Ok(())
        })
        .unwrap();

    db
}

// ---------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------

#[test]
fn parse_full_scan() {
    let query = parse_query("from Task").unwrap();

    assert_eq!(query.entity, "Task");
    assert_eq!(query.filter, None);
}

#[test]
fn parse_key_filter_with_mixed_case_keywords() {
    let query = parse_query("FROM Task Where id = 'emp'").unwrap();

    assert_eq!(
        query.filter,
        Some(KeyFilter {
            field: "id".to_string(),
            value: Key::text("emp"),
        })
    );
}

#[test]
fn parse_uint_literal_and_doubled_quote() {
    let query = parse_query("from Ticket where id = 42").unwrap();
    assert_eq!(query.filter.map(|f| f.value), Some(Key::uint(42)));

    let query = parse_query("from Employee where id = 'o''brien'").unwrap();
    assert_eq!(query.filter.map(|f| f.value), Some(Key::text("o'brien")));
}

#[test]
fn parse_errors_are_positioned() {
    assert_eq!(parse_query("   "), Err(QueryError::Empty));
    assert_eq!(
        parse_query("from"),
        Err(QueryError::UnexpectedEnd {
            expected: "entity name"
        })
    );
    assert_eq!(
        parse_query("select Task"),
        Err(QueryError::UnexpectedToken {
            expected: "from",
            found: "identifier 'select'".to_string(),
            offset: 0,
        })
    );
    assert_eq!(
        parse_query("from Task where id = 'emp"),
        Err(QueryError::UnterminatedText { offset: 21 })
    );
    assert_eq!(
        parse_query("from Task;"),
        Err(QueryError::InvalidCharacter {
            found: ';',
            offset: 9
        })
    );
    assert!(matches!(
        parse_query("from Ticket where id = 99999999999999999999"),
        Err(QueryError::IntegerOverflow { .. })
    ));
    assert!(matches!(
        parse_query("from Task where id = 'a' extra"),
        Err(QueryError::UnexpectedToken {
            expected: "end of query",
            ..
        })
    ));
}

// ---------------------------------------------------------------------
// bind
// ---------------------------------------------------------------------

#[test]
fn text_query_binds_to_key_access() {
    let parsed = parse_query("from Task where id = 'emp'").unwrap();

    assert_eq!(
        Access::from_text(Task::MODEL, &parsed),
        Ok(Access::Key(Key::text("emp")))
    );
}

#[test]
fn text_query_bind_errors() {
    let bind = |source: &str| Access::from_text(Task::MODEL, &parse_query(source).unwrap());

    assert!(matches!(
        bind("from Employee"),
        Err(QueryError::EntityMismatch { .. })
    ));
    assert!(matches!(
        bind("from Task where colour = 'red'"),
        Err(QueryError::UnknownField { .. })
    ));
    assert!(matches!(
        bind("from Task where name = 't1'"),
        Err(QueryError::NonKeyFilter { .. })
    ));
    assert!(matches!(
        bind("from Task where id = 3"),
        Err(QueryError::KeyKindMismatch { .. })
    ));
}

// ---------------------------------------------------------------------
// load
// ---------------------------------------------------------------------

#[test]
fn full_scan_returns_rows_in_key_order_with_relations() {
    let db = seeded_db();

    let response = db.session().load::<Task>().all().execute().unwrap();

    assert_eq!(response.keys(), vec![Key::text("ann"), Key::text("bob")]);
    for (key, task) in &response {
        assert_eq!(task.base.parent(), Some(&Ref::key(key.clone())));
    }
}

#[test]
fn key_loads_follow_request_order_and_skip_missing_rows() {
    let db = seeded_db();

    let response = db
        .session()
        .load::<Employee>()
        .keys(["bob", "nobody", "ann", "bob"])
        .execute()
        .unwrap();

    assert_eq!(response.keys(), vec![Key::text("bob"), Key::text("ann")]);
}

#[test]
fn missing_key_is_corruption_under_strict() {
    let db = seeded_db();

    let err = db
        .session()
        .load::<Employee>()
        .key("nobody")
        .consistency(ReadConsistency::Strict)
        .execute()
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Corruption);
    assert_eq!(err.origin, ErrorOrigin::Store);
}

#[test]
fn employee_without_task_is_corruption_under_strict() {
    let db = fixture_db_with(DbConfig {
        read_consistency: ReadConsistency::Strict,
        ..DbConfig::default()
    });
    db.session()
        .in_transaction(|unit| {
            unit.register(Employee::new("cy"));
            Ok(())
        })
        .unwrap();

    let err = db.session().load::<Employee>().key("cy").execute().unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Relation);
}

#[test]
fn load_rejects_keys_of_the_wrong_kind() {
    let db = seeded_db();

    let err = db.session().load::<Ticket>().key("seven").execute().unwrap_err();

    assert_eq!(err.class, ErrorClass::Unsupported);
    assert_eq!(err.origin, ErrorOrigin::Query);
}

#[test]
fn textual_query_loads_one_row() {
    let db = seeded_db();

    let task = db
        .session()
        .query::<Task>("from Task where id = 'bob'")
        .unwrap()
        .entity()
        .unwrap();

    assert_eq!(task.name, "bob-task");
}

#[test]
fn response_cardinality_errors() {
    let db = seeded_db();
    let session = db.session();

    let err = session.load::<Task>().all().execute().unwrap().entity().unwrap_err();
    assert_eq!(err.class, ErrorClass::Conflict);

    let err = session
        .load::<Task>()
        .key("cy")
        .execute()
        .unwrap()
        .entity()
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::NotFound);

    let none = session
        .load::<Task>()
        .key("cy")
        .execute()
        .unwrap()
        .try_entity()
        .unwrap();
    assert_eq!(none, None);
}

// ---------------------------------------------------------------------
// session reads
// ---------------------------------------------------------------------

#[test]
fn fetch_follows_a_key_reference() {
    let db = seeded_db();

    let employee = db.session().fetch(&Ref::<Employee>::key("ann")).unwrap();

    assert_eq!(employee.map(|e| e.task), Some(Some(Ref::key("ann"))));
}

#[test]
fn fetch_rejects_a_pending_reference() {
    let db = seeded_db();
    let mut unit = db.session().unit_of_work();
    let handle = unit.register(Employee::new("dee"));

    let err = db.session().fetch(&Ref::from(handle)).unwrap_err();

    assert_eq!(err.class, ErrorClass::Unsupported);
}

#[test]
fn load_with_parent_joins_on_the_shared_key() {
    let db = seeded_db();

    let joined = db.session().load_with_parent::<Task>("ann").unwrap().unwrap();
    assert_eq!(joined.parent.id, "ann");
    assert_eq!(joined.entity.primary_key(), joined.parent.primary_key());

    assert!(db.session().load_with_parent::<Task>("cy").unwrap().is_none());
    assert!(
        db.session()
            .load_with_parent::<TicketNote>(7u64)
            .unwrap()
            .is_none()
    );
}
