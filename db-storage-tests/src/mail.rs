use db_storage::{Entity, Related};

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Person {
    pub id: Option<i64>,
    pub name: String,
}

impl Person {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Two relations to the same type, one joined eagerly.
#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Letter {
    pub id: Option<i64>,
    pub subject: String,
    pub sender: Related<Person>,
    #[entity(lazy)]
    pub receiver: Related<Person>,
}

impl Letter {
    #[must_use]
    pub fn new(subject: &str, sender: Person, receiver: Person) -> Self {
        Self {
            subject: subject.to_string(),
            sender: Related::new(sender),
            receiver: Related::new(receiver),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Folder {
    pub id: Option<i64>,
    pub name: String,
    #[entity(lazy)]
    pub parent: Related<Folder>,
}

impl Folder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn within(name: &str, parent: Self) -> Self {
        Self {
            parent: Related::new(parent),
            ..Self::new(name)
        }
    }
}
