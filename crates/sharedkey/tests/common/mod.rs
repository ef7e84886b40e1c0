//! Employee/Task entity kinds as an application declares them.

#![allow(dead_code)]

use sharedkey::{core::error::InternalError, prelude::*};
use std::sync::Once;

///
/// Employee
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Employee {
    pub id: String,

    #[serde(skip)]
    pub task: Option<Ref<Task>>,
}

impl Employee {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            task: None,
        }
    }
}

static EMPLOYEE: EntityModel = EntityModel {
    path: Employee::PATH,
    entity_name: "Employee",
    primary_key: "id",
    fields: &[
        FieldModel::new("id", FieldKind::Key(KeyKind::Text)),
        FieldModel::new(
            "task",
            FieldKind::Relation(RelationModel::inverse(Task::PATH, "Task", "employee", false)),
        ),
    ],
    identity: IdentityModel::Natural,
};

impl Path for Employee {
    const PATH: &'static str = "demo::Employee";
}

impl EntityKind for Employee {
    const MODEL: &'static EntityModel = &EMPLOYEE;

    fn primary_key(&self) -> Option<Key> {
        Some(Key::text(&self.id))
    }

    fn relation(&self, field: &str) -> Option<RefTarget> {
        match field {
            "task" => self.task.as_ref().map(|task| task.target().clone()),
            _ => None,
        }
    }

    fn set_relation(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        match field {
            "task" => {
                self.task = target.map(Ref::from_target);
                true
            }
            _ => false,
        }
    }
}

///
/// Task
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Task {
    pub base: DerivedKey<Employee>,
    pub name: String,
}

impl Task {
    pub fn new(employee: impl Into<Ref<Employee>>, name: &str) -> Self {
        Self {
            base: DerivedKey::new(employee),
            name: name.to_string(),
        }
    }
}

static TASK: EntityModel = EntityModel {
    path: Task::PATH,
    entity_name: "Task",
    primary_key: "id",
    fields: &[
        FieldModel::new("id", FieldKind::Key(KeyKind::Text)),
        FieldModel::new(
            "employee",
            FieldKind::Relation(RelationModel::owning(Employee::PATH, "Employee")),
        ),
        FieldModel::new("name", FieldKind::Text),
    ],
    identity: IdentityModel::Derived {
        relation: "employee",
    },
};

impl Path for Task {
    const PATH: &'static str = "demo::Task";
}

impl EntityKind for Task {
    const MODEL: &'static EntityModel = &TASK;

    fn primary_key(&self) -> Option<Key> {
        self.base.id().cloned()
    }

    fn assign_primary_key(&mut self, key: Key) -> Result<(), InternalError> {
        self.base.assign(key);
        Ok(())
    }

    fn relation(&self, field: &str) -> Option<RefTarget> {
        match field {
            "employee" => self.base.relation_target(),
            _ => None,
        }
    }

    fn set_relation(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        match field {
            "employee" => {
                self.base.set_relation_target(target);
                true
            }
            _ => false,
        }
    }
}

impl DerivedEntity for Task {
    type Parent = Employee;
}

/// Route `tracing` output through the test harness; `RUST_LOG` filters it.
pub fn init_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn db() -> Db {
    init_tracing();

    Db::builder()
        .entity::<Employee>()
        .entity::<Task>()
        .build()
        .expect("demo schema is valid")
}
