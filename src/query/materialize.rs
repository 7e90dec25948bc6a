//! Rebuilds object graphs from flat, denormalized result rows.

use std::collections::HashMap;

use sqlx::any::AnyRow;

use super::{
    filter::Filters,
    plan::{Plan, label},
};
use crate::{
    entity::{Entity, EntityRef, column::Descriptor, proxy::ScalarKey},
    error::{Error, Result},
    schema::Schema,
    value::Value,
};

/// What one attribute of one materialized record holds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Slot {
    Value(Value),
    /// A to-one relation whose foreign key is `NULL`.
    Null,
    /// A to-one relation joined by the query, materialized as record `index`.
    One { index: usize, key: i64 },
    /// A to-one relation left to a proxy.
    Reference { key: i64, filters: Filters },
    Many(Vec<usize>),
    /// A to-many relation left to a proxy.
    Collection(Filters),
    Scalar(ScalarKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Open,
    Done,
}

#[derive(Debug)]
struct Record {
    entity: EntityRef,
    key: i64,
    slots: Vec<Option<Slot>>,
}

/// Type-erased records, one per distinct `(type, identity)` seen in the rows.
pub(crate) struct Graph<'s> {
    schema: &'s Schema,
    records: Vec<Record>,
    roots: Vec<usize>,
    seen: HashMap<(EntityRef, i64), usize>,
}

impl<'s> Graph<'s> {
    pub(crate) fn from_rows(schema: &'s Schema, plan: &Plan, rows: &[AnyRow]) -> Result<Self> {
        let mut graph = Self {
            schema,
            records: vec![],
            roots: vec![],
            seen: HashMap::new(),
        };

        for row in rows {
            if let Some(record) = graph.visit(plan, row, 0)? {
                if !graph.roots.contains(&record) {
                    graph.roots.push(record);
                }
            }
        }

        let mut marks = vec![Mark::New; graph.records.len()];
        for root in graph.roots.clone() {
            graph.break_cycles(root, &mut marks)?;
        }

        Ok(graph)
    }

    /// Records of the queried type, in first-seen order.
    pub(crate) fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub(crate) fn key(&self, index: usize) -> i64 {
        self.records[index].key
    }

    /// The foreign key stored in the to-one attribute at `attribute` of record `index`.
    pub(crate) fn foreign_key(&self, index: usize, attribute: usize) -> Option<i64> {
        match self.records[index].slots.get(attribute)? {
            Some(Slot::One { key, .. } | Slot::Reference { key, .. }) => Some(*key),
            _ => None,
        }
    }

    fn visit(&mut self, plan: &Plan, row: &AnyRow, table: usize) -> Result<Option<usize>> {
        let schema = self.schema;
        let planned = &plan.tables[table];
        let ty = schema.get(planned.entity)?;
        let alias = &planned.alias;

        let Some(key) = Value::decode_key(row, &label(alias, ty.identity_column()))? else {
            return Ok(None);
        };

        let record = match self.seen.get(&(ty.entity(), key)) {
            Some(existing) => *existing,
            None => {
                self.records.push(Record {
                    entity: ty.entity(),
                    key,
                    slots: vec![None; ty.attributes().len()],
                });
                self.seen.insert((ty.entity(), key), self.records.len() - 1);
                self.records.len() - 1
            }
        };

        for (index, attribute) in ty.attributes().iter().enumerate() {
            let edge = plan.edges.get(&(table, index)).copied();

            let slot = match attribute.descriptor() {
                Descriptor::Column {
                    column,
                    column_type,
                    ..
                } => Slot::Value(Value::decode(row, &label(alias, column), *column_type)?),
                Descriptor::LazyAttribute {
                    column,
                    column_type,
                    ..
                } => Slot::Scalar(ScalarKey {
                    table: ty.table(),
                    column: column.clone(),
                    identity_column: ty.identity_column().to_string(),
                    key,
                    column_type: *column_type,
                }),
                Descriptor::ToOne { target, column, .. } => {
                    match Value::decode_key(row, &label(alias, column))? {
                        None => Slot::Null,
                        Some(foreign) => {
                            let joined = match edge {
                                Some(edge) => self.visit(plan, row, edge)?,
                                None => None,
                            };

                            match joined {
                                Some(child) if self.records[child].key == foreign => {
                                    Slot::One {
                                        index: child,
                                        key: foreign,
                                    }
                                }
                                _ => Slot::Reference {
                                    key: foreign,
                                    filters: Filters::new().with(
                                        schema.get(*target)?.identity_attribute().name(),
                                        foreign,
                                    ),
                                },
                            }
                        }
                    }
                }
                Descriptor::ToMany { backref, .. } => match edge {
                    Some(edge) => {
                        let child = self.visit(plan, row, edge)?;
                        let mut children = match self.records[record].slots[index].take() {
                            Some(Slot::Many(e)) => e,
                            _ => vec![],
                        };

                        if let Some(child) = child {
                            if !children.contains(&child) {
                                children.push(child);
                            }
                        }

                        Slot::Many(children)
                    }
                    None => Slot::Collection(Filters::new().with(*backref, key)),
                },
            };

            let current = &mut self.records[record].slots[index];
            let downgrade = matches!(
                (&*current, &slot),
                (
                    Some(Slot::One { .. } | Slot::Many(_)),
                    Slot::Reference { .. } | Slot::Collection(_)
                )
            );
            if !downgrade {
                *current = Some(slot);
            }
        }

        Ok(Some(record))
    }

    /// Leave relations that lead back to a record on the path from its root to proxies, so every
    /// root builds a finite object tree.
    fn break_cycles(&mut self, record: usize, marks: &mut [Mark]) -> Result<()> {
        if marks[record] != Mark::New {
            return Ok(());
        }
        marks[record] = Mark::Open;

        let schema = self.schema;
        let ty = schema.get(self.records[record].entity)?;

        for (index, attribute) in ty.attributes().iter().enumerate() {
            let children = match &self.records[record].slots[index] {
                Some(Slot::One { index, .. }) => vec![*index],
                Some(Slot::Many(children)) => children.clone(),
                _ => continue,
            };

            if !children.iter().any(|e| marks[*e] == Mark::Open) {
                for child in children {
                    self.break_cycles(child, marks)?;
                }
                continue;
            }

            let key = self.records[record].key;
            let slot = &mut self.records[record].slots[index];
            match (attribute.descriptor(), slot.take()) {
                (Descriptor::ToOne { target, .. }, Some(Slot::One { key: foreign, .. })) => {
                    *slot = Some(Slot::Reference {
                        key: foreign,
                        filters: Filters::new()
                            .with(schema.get(*target)?.identity_attribute().name(), foreign),
                    });
                }
                (Descriptor::ToMany { backref, .. }, _) => {
                    *slot = Some(Slot::Collection(Filters::new().with(*backref, key)));
                }
                (_, other) => *slot = other,
            }
        }

        marks[record] = Mark::Done;

        Ok(())
    }

    /// Convert record `index` into a `T`, recursing into joined relations.
    pub(crate) fn build<T: Entity>(&self, index: usize) -> Result<T> {
        let ty = self.schema.entity::<T>()?;
        let record = self
            .records
            .get(index)
            .ok_or_else(|| Error::Schema(format!("no materialized record {index}")))?;

        if record.entity != ty.entity() {
            return Err(Error::Schema(format!(
                "materialized a `{}` where a `{}` was expected",
                record.entity.name(),
                ty.entity().name()
            )));
        }

        let mut entity = T::default();

        for (attribute, slot) in ty.attributes().iter().zip(&record.slots) {
            if let (Some(accessor), Some(slot)) = (attribute.accessor(), slot) {
                accessor.assign(&mut entity, slot, self)?;
            }
        }

        Ok(entity)
    }
}
