//! Hand-written entity kinds shared by the inline test modules.
//!
//! `Employee` -> `Task` -> `Review` is a text-keyed derived-identity chain;
//! `Ticket` -> `TicketNote` is the unsigned-key variant with an optional
//! inverse side.

use crate::{
    config::DbConfig,
    db::Db,
    key::{Key, KeyKind},
    model::{EntityModel, FieldKind, FieldModel, IdentityModel, RelationModel},
    traits::{DerivedEntity, EntityKind, Path},
    types::{DerivedKey, Ref, RefTarget},
};
use serde::{Deserialize, Serialize};

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

static EMPLOYEE_MODEL: EntityModel = EntityModel {
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
    const PATH: &'static str = "test_fixtures::Employee";
}

impl EntityKind for Employee {
    const MODEL: &'static EntityModel = &EMPLOYEE_MODEL;

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

    #[serde(skip)]
    pub review: Option<Ref<Review>>,
}

impl Task {
    pub fn new(employee: impl Into<Ref<Employee>>, name: &str) -> Self {
        Self {
            base: DerivedKey::new(employee),
            name: name.to_string(),
            review: None,
        }
    }
}

static TASK_MODEL: EntityModel = EntityModel {
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
        FieldModel::new(
            "review",
            FieldKind::Relation(RelationModel::inverse(Review::PATH, "Review", "task", true)),
        ),
    ],
    identity: IdentityModel::Derived {
        relation: "employee",
    },
};

impl Path for Task {
    const PATH: &'static str = "test_fixtures::Task";
}

impl EntityKind for Task {
    const MODEL: &'static EntityModel = &TASK_MODEL;

    fn primary_key(&self) -> Option<Key> {
        self.base.id().cloned()
    }

    fn assign_primary_key(&mut self, key: Key) -> Result<(), crate::error::InternalError> {
        self.base.assign(key);
        Ok(())
    }

    fn relation(&self, field: &str) -> Option<RefTarget> {
        match field {
            "employee" => self.base.relation_target(),
            "review" => self.review.as_ref().map(|review| review.target().clone()),
            _ => None,
        }
    }

    fn set_relation(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        match field {
            "employee" => self.base.set_relation_target(target),
            "review" => self.review = target.map(Ref::from_target),
            _ => return false,
        }
        true
    }
}

impl DerivedEntity for Task {
    type Parent = Employee;
}

///
/// Review
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Review {
    pub base: DerivedKey<Task>,
    pub score: u64,
}

impl Review {
    pub fn new(task: impl Into<Ref<Task>>, score: u64) -> Self {
        Self {
            base: DerivedKey::new(task),
            score,
        }
    }
}

static REVIEW_MODEL: EntityModel = EntityModel {
    path: Review::PATH,
    entity_name: "Review",
    primary_key: "id",
    fields: &[
        FieldModel::new("id", FieldKind::Key(KeyKind::Text)),
        FieldModel::new(
            "task",
            FieldKind::Relation(RelationModel::owning(Task::PATH, "Task")),
        ),
        FieldModel::new("score", FieldKind::Uint),
    ],
    identity: IdentityModel::Derived { relation: "task" },
};

impl Path for Review {
    const PATH: &'static str = "test_fixtures::Review";
}

impl EntityKind for Review {
    const MODEL: &'static EntityModel = &REVIEW_MODEL;

    fn primary_key(&self) -> Option<Key> {
        self.base.id().cloned()
    }

    fn assign_primary_key(&mut self, key: Key) -> Result<(), crate::error::InternalError> {
        self.base.assign(key);
        Ok(())
    }

    fn relation(&self, field: &str) -> Option<RefTarget> {
        match field {
            "task" => self.base.relation_target(),
            _ => None,
        }
    }

    fn set_relation(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        match field {
            "task" => {
                self.base.set_relation_target(target);
                true
            }
            _ => false,
        }
    }
}

impl DerivedEntity for Review {
    type Parent = Task;
}

///
/// Ticket
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Ticket {
    pub id: Option<u64>,
    pub title: String,

    #[serde(skip)]
    pub note: Option<Ref<TicketNote>>,
}

impl Ticket {
    pub fn new(id: u64, title: &str) -> Self {
        Self {
            id: Some(id),
            title: title.to_string(),
            note: None,
        }
    }
}

static TICKET_MODEL: EntityModel = EntityModel {
    path: Ticket::PATH,
    entity_name: "Ticket",
    primary_key: "id",
    fields: &[
        FieldModel::new("id", FieldKind::Key(KeyKind::Uint)),
        FieldModel::new("title", FieldKind::Text),
        FieldModel::new(
            "note",
            FieldKind::Relation(RelationModel::inverse(
                TicketNote::PATH,
                "TicketNote",
                "ticket",
                true,
            )),
        ),
    ],
    identity: IdentityModel::Natural,
};

impl Path for Ticket {
    const PATH: &'static str = "test_fixtures::Ticket";
}

impl EntityKind for Ticket {
    const MODEL: &'static EntityModel = &TICKET_MODEL;

    fn primary_key(&self) -> Option<Key> {
        self.id.map(Key::Uint)
    }

    fn relation(&self, field: &str) -> Option<RefTarget> {
        match field {
            "note" => self.note.as_ref().map(|note| note.target().clone()),
            _ => None,
        }
    }

    fn set_relation(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        match field {
            "note" => {
                self.note = target.map(Ref::from_target);
                true
            }
            _ => false,
        }
    }
}

///
/// TicketNote
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TicketNote {
    pub base: DerivedKey<Ticket>,
    pub body: String,
}

impl TicketNote {
    pub fn new(ticket: impl Into<Ref<Ticket>>, body: &str) -> Self {
        Self {
            base: DerivedKey::new(ticket),
            body: body.to_string(),
        }
    }
}

static TICKET_NOTE_MODEL: EntityModel = EntityModel {
    path: TicketNote::PATH,
    entity_name: "TicketNote",
    primary_key: "id",
    fields: &[
        FieldModel::new("id", FieldKind::Key(KeyKind::Uint)),
        FieldModel::new(
            "ticket",
            FieldKind::Relation(RelationModel::owning(Ticket::PATH, "Ticket")),
        ),
        FieldModel::new("body", FieldKind::Text),
    ],
    identity: IdentityModel::Derived { relation: "ticket" },
};

impl Path for TicketNote {
    const PATH: &'static str = "test_fixtures::TicketNote";
}

impl EntityKind for TicketNote {
    const MODEL: &'static EntityModel = &TICKET_NOTE_MODEL;

    fn primary_key(&self) -> Option<Key> {
        self.base.id().cloned()
    }

    fn assign_primary_key(&mut self, key: Key) -> Result<(), crate::error::InternalError> {
        self.base.assign(key);
        Ok(())
    }

    fn relation(&self, field: &str) -> Option<RefTarget> {
        match field {
            "ticket" => self.base.relation_target(),
            _ => None,
        }
    }

    fn set_relation(&mut self, field: &str, target: Option<RefTarget>) -> bool {
        match field {
            "ticket" => {
                self.base.set_relation_target(target);
                true
            }
            _ => false,
        }
    }
}

impl DerivedEntity for TicketNote {
    type Parent = Ticket;
}

/// Database with every fixture entity registered.
pub fn fixture_db() -> Db {
    fixture_db_with(DbConfig::default())
}

pub fn fixture_db_with(config: DbConfig) -> Db {
    Db::builder()
        .config(config)
        .entity::<Employee>()
        .entity::<Task>()
        .entity::<Review>()
        .entity::<Ticket>()
        .entity::<TicketNote>()
        .build()
        .expect("fixture schema is valid")
}
