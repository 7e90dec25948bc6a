/// Loading and deletion behaviour of a to-one or to-many relation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationOptions {
    /// Install a proxy instead of joining the related rows.
    pub lazy: bool,
    /// Deleting a row also deletes the rows this relation points at.
    pub cascading_delete: bool,
}

impl RelationOptions {
    /// A relation fetched together with its owner.
    #[must_use]
    pub const fn eager() -> Self {
        Self {
            lazy: false,
            cascading_delete: false,
        }
    }

    /// A relation resolved on first access.
    #[must_use]
    pub const fn lazy() -> Self {
        Self {
            lazy: true,
            cascading_delete: false,
        }
    }

    #[must_use]
    pub const fn cascading(self) -> Self {
        Self {
            cascading_delete: true,
            ..self
        }
    }
}
