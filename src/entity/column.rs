use std::fmt::Display;

use sqlx::{Any, QueryBuilder};

use crate::{
    entity::{EntityRef, access::Accessor, relation::RelationOptions},
    query::{PushToQuery, quote},
    value::ColumnType,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName {
    table_or_alias: Option<String>,
    column_name: String,
}

impl ColumnName {
    pub fn new(column_name: impl Into<String>) -> Self {
        Self {
            table_or_alias: None,
            column_name: column_name.into(),
        }
    }

    pub fn qualified(table_or_alias: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            table_or_alias: Some(table_or_alias.into()),
            column_name: column_name.into(),
        }
    }

    /// The label this column is selected under, e.g. `order.customer_id`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.table_or_alias {
            Some(table_or_alias) => format!("{table_or_alias}.{}", self.column_name),
            None => self.column_name.clone(),
        }
    }
}

impl Display for ColumnName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(table_or_alias) = &self.table_or_alias {
            write!(f, "{}.", quote(table_or_alias))?;
        }
        write!(f, "{}", quote(&self.column_name))
    }
}

impl PushToQuery for ColumnName {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push(self.to_string());
    }
}

/// How an attribute maps onto the relational schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// A direct scalar column.
    Column {
        column: String,
        column_type: ColumnType,
        nullable: bool,
        unique: bool,
    },
    /// The column lives in this table and stores the target's identity.
    ToOne {
        target: EntityRef,
        column: String,
        options: RelationOptions,
    },
    /// The target table carries a `<backref>_id` column pointing back at this row.
    ToMany {
        target: EntityRef,
        backref: &'static str,
        options: RelationOptions,
    },
    /// A scalar column that is only fetched on demand.
    LazyAttribute {
        column: String,
        column_type: ColumnType,
        nullable: bool,
    },
}

impl Descriptor {
    /// The column this attribute occupies in its own table, if any.
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Column { column, .. }
            | Self::ToOne { column, .. }
            | Self::LazyAttribute { column, .. } => Some(column),
            Self::ToMany { .. } => None,
        }
    }

    #[must_use]
    pub const fn cascades(&self) -> bool {
        match self {
            Self::ToOne { options, .. } | Self::ToMany { options, .. } => options.cascading_delete,
            Self::Column { .. } | Self::LazyAttribute { .. } => false,
        }
    }
}

/// The column name of the backreference a to-many relation injects into its target.
pub(crate) fn backref_column(backref: &str) -> String {
    format!("{backref}_id")
}

/// A declared attribute: its name, its column descriptor and, unless it was injected by a
/// relation on another type, the accessor reaching the entity field.
pub struct Attribute {
    pub(crate) name: &'static str,
    pub(crate) descriptor: Descriptor,
    pub(crate) accessor: Option<Accessor>,
}

impl Attribute {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    /// Whether this attribute was injected by a to-many relation and has no backing field.
    #[must_use]
    pub const fn is_shadow(&self) -> bool {
        self.accessor.is_none()
    }

    pub(crate) const fn accessor(&self) -> Option<&Accessor> {
        self.accessor.as_ref()
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .field("shadow", &self.is_shadow())
            .finish()
    }
}
