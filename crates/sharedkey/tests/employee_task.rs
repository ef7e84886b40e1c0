mod common;

use common::{Employee, Task, db};
use proptest::prelude::*;
use serde_json::{Value, json};
use sharedkey::{
    core::obs::{ExecKind, MetricsEvent, MetricsSink},
    db::ReadConsistency,
    error::{ErrorKind, IdentityErrorKind, StoreErrorKind},
    prelude::*,
};
use std::cell::Cell;

thread_local! {
    static LOADS: Cell<u64> = const { Cell::new(0) };
}

///
/// LoadCounter
///

struct LoadCounter;

impl MetricsSink for LoadCounter {
    fn record(&self, event: MetricsEvent) {
        if let MetricsEvent::ExecStart {
            kind: ExecKind::Load,
            ..
        } = event
        {
            LOADS.with(|loads| loads.set(loads.get() + 1));
        }
    }
}

static LOAD_COUNTER: LoadCounter = LoadCounter;

fn persist_pair(session: &DbSession, id: &str, name: &str) -> CommitResponse {
    session
        .in_transaction(|unit| {
            let employee = unit.register(Employee::new(id));
            let task = unit.register(Task::new(employee, name));
            unit.get_mut(employee)?.task = Some(task.into());
            Ok(())
        })
        .expect("commit employee and task")
}

// Employee rows with their dependent task embedded.
fn render_employees(session: &DbSession) -> Value {
    let employees = session
        .query::<Employee>("from Employee")
        .expect("query employees");

    let rows: Vec<Value> = employees
        .entities()
        .into_iter()
        .map(|employee| {
            let task = employee
                .task
                .as_ref()
                .and_then(|task| session.fetch(task).expect("fetch task"));

            json!({
                "id": employee.id,
                "task": task.map(|task| json!({
                    "id": task.primary_key().and_then(|key| key.as_text().map(str::to_string)),
                    "name": task.name,
                })),
            })
        })
        .collect();

    Value::Array(rows)
}

#[test]
fn committed_pair_is_returned_with_its_association() {
    let db = db();
    let session = DbSession::new(&db).debug();

    persist_pair(&session, "emp", "t1");

    assert_eq!(
        render_employees(&session),
        json!([{ "id": "emp", "task": { "id": "emp", "name": "t1" } }])
    );
    assert_eq!(session.query::<Employee>("from Employee").unwrap().count(), 1);
}

#[test]
fn dependent_key_is_copied_from_the_parent() {
    let db = db();
    let session = DbSession::new(&db);

    let response = session
        .in_transaction(|unit| {
            let employee = unit.register(Employee::new("emp"));
            unit.register(Task::new(employee, "t1"));
            Ok(())
        })
        .unwrap();

    assert_eq!(response.rows_written(), 2);
    let task = session
        .query::<Task>("from Task where id = 'emp'")
        .unwrap()
        .entity()
        .unwrap();
    assert_eq!(task.primary_key(), Some(Key::text("emp")));
}

#[test]
fn loading_the_dependent_dereferences_to_its_parent() {
    let db = db();
    let session = DbSession::new(&db);
    persist_pair(&session, "emp", "t1");

    let task = session.load::<Task>().key("emp").entity().unwrap();
    let parent = task.base.parent().expect("parent attached");
    let employee = session.fetch(parent).unwrap().expect("parent row");

    assert_eq!(employee, Employee {
        id: "emp".to_string(),
        task: Some(Ref::key("emp")),
    });

    let joined = session.load_with_parent::<Task>("emp").unwrap().unwrap();
    assert_eq!(joined.parent.id, "emp");
    assert_eq!(joined.entity.name, "t1");
}

#[test]
fn dependent_without_parent_is_rejected() {
    let db = db();
    let session = DbSession::new(&db);

    let err = session
        .in_transaction(|unit| {
            unit.register(Task {
                base: DerivedKey::unassociated(),
                name: "t1".to_string(),
            });
            Ok(())
        })
        .unwrap_err();

    assert_eq!(
        err.kind,
        ErrorKind::Identity(IdentityErrorKind::MissingAssociation)
    );
    assert_eq!(db.row_count::<Task>().unwrap(), 0);
}

#[test]
fn dependent_of_an_unknown_parent_is_an_orphan() {
    let db = db();
    let session = DbSession::new(&db);

    let err = session
        .in_transaction(|unit| {
            unit.register(Task::new(Ref::key("ghost"), "t1"));
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err.identity_kind(), Some(IdentityErrorKind::OrphanReference));
}

#[test]
fn failed_commit_leaves_no_rows_behind() {
    let db = db();
    let session = DbSession::new(&db);
    persist_pair(&session, "emp", "t1");

    let err = session
        .in_transaction(|unit| {
            let employee = unit.register(Employee::new("new"));
            unit.register(Task::new(employee, "t2"));
            unit.register(Employee::new("emp"));
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Store(StoreErrorKind::DuplicateKey));
    assert_eq!(db.row_count::<Employee>().unwrap(), 1);
    assert_eq!(db.row_count::<Task>().unwrap(), 1);
    assert!(session.load::<Employee>().key("new").try_entity().unwrap().is_none());
}

#[test]
fn employee_without_its_task_is_corruption_under_strict_reads() {
    let db = db();
    let session = DbSession::new(&db);
    session
        .in_transaction(|unit| {
            unit.register(Employee::new("solo"));
            Ok(())
        })
        .unwrap();

    let employee = session.load::<Employee>().key("solo").entity().unwrap();
    assert!(employee.task.is_none());

    let strict = session.clone().debug().consistency(ReadConsistency::Strict);
    let err = strict.load::<Employee>().key("solo").entity().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Store(StoreErrorKind::Corruption));

    let relaxed = strict
        .load::<Employee>()
        .key("solo")
        .consistency(ReadConsistency::MissingOk)
        .try_entity()
        .unwrap();
    assert!(relaxed.is_some());
}

#[test]
fn session_metrics_sink_receives_load_events() {
    let db = db();
    let session = DbSession::new(&db).metrics_sink(&LOAD_COUNTER);
    persist_pair(&session, "emp", "t1");

    LOADS.with(|loads| loads.set(0));
    session.load::<Task>().key("emp").entity().unwrap();

    assert_eq!(LOADS.with(Cell::get), 1);
}

#[test]
fn invalid_textual_query_is_reported_as_a_query_error() {
    let db = db();
    let session = DbSession::new(&db);

    let err = session.query::<Task>("from Task where name = 't1'").unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Query(_)));
}

proptest! {
    #[test]
    fn committed_dependent_always_shares_the_parent_key(
        ids in proptest::collection::btree_set("[a-z0-9]{1,12}", 1..8),
    ) {
        let db = db();
        let session = DbSession::new(&db);

        for id in &ids {
            persist_pair(&session, id, "task");
        }

        let tasks = session.load::<Task>().all().execute().unwrap();
        prop_assert_eq!(tasks.count(), ids.len());
        for (key, task) in &tasks {
            let pk = task.primary_key();
            prop_assert_eq!(pk.as_ref(), Some(key));
            let employee = session.fetch(task.base.parent().unwrap()).unwrap().unwrap();
            prop_assert_eq!(employee.primary_key(), task.primary_key());
        }
    }
}
