//! Filter trees passed to `pickup` and `drop`.

use std::{fmt::Debug, sync::Arc};

use crate::{
    entity::{Entity, EntityRef, Object},
    value::Value,
};

/// Which row of a to-many group a [`Limit`] keeps.
#[derive(Debug, Clone, PartialEq)]
pub enum LimitKind {
    /// The row(s) holding the greatest value, ties included.
    Max,
    /// The row(s) holding the smallest value, ties included.
    Min,
    /// The row(s) holding exactly this value.
    Fixed(Value),
}

/// Restricts a to-many group, reached while traversing a to-one relation, to the rows extremal
/// or equal on `attribute`.
///
/// It is only accepted as the filter value of a to-many attribute nested below a to-one
/// relation, and the group must be made of rows of the table being queried at that level:
///
/// ```ignore
/// // the item(s) with the largest quantity in order 7
/// Filters::new().with("order", Filters::new().with("id", 7).with("items", Limit::max("quantity")))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub(crate) attribute: String,
    pub(crate) kind: LimitKind,
}

impl Limit {
    #[must_use]
    pub fn max(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: LimitKind::Max,
        }
    }

    #[must_use]
    pub fn min(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: LimitKind::Min,
        }
    }

    #[must_use]
    pub fn fixed(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: LimitKind::Fixed(value.into()),
        }
    }
}

/// A related instance used as a filter value; reduced to its identity before querying.
#[derive(Clone)]
pub struct RelatedObject {
    pub(crate) entity: EntityRef,
    pub(crate) object: Arc<Object>,
}

impl RelatedObject {
    #[must_use]
    pub fn new<E: Entity>(entity: E) -> Self {
        Self {
            entity: EntityRef::of::<E>(),
            object: Arc::new(entity),
        }
    }
}

impl PartialEq for RelatedObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl Debug for RelatedObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelatedObject")
            .field("entity", &self.entity.name())
            .finish_non_exhaustive()
    }
}

/// The value an attribute is filtered on.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Equality. `Value::Null` adds no predicate.
    Eq(Value),
    /// `IS NULL`.
    Null,
    /// SQL `LIKE`, with `*` already translated to `%`.
    Like(String),
    /// Filters on the target of a to-one relation.
    Nested(Filters),
    Object(RelatedObject),
    Limit(Limit),
}

impl FilterValue {
    /// A `LIKE` pattern, where `*` matches any run of characters.
    #[must_use]
    pub fn like(pattern: &str) -> Self {
        Self::Like(pattern.replace('*', "%"))
    }

    #[must_use]
    pub fn object<E: Entity>(entity: E) -> Self {
        Self::Object(RelatedObject::new(entity))
    }
}

macro_rules! impl_from_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    Self::Eq(value.into())
                }
            }
        )+
    };
}

impl_from_value!(Value, bool, i32, i64, f64, String, &str, Vec<u8>);

impl<T> From<Option<T>> for FilterValue
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        Self::Eq(value.into())
    }
}

impl From<Filters> for FilterValue {
    fn from(value: Filters) -> Self {
        Self::Nested(value)
    }
}

impl From<Limit> for FilterValue {
    fn from(value: Limit) -> Self {
        Self::Limit(value)
    }
}

impl From<RelatedObject> for FilterValue {
    fn from(value: RelatedObject) -> Self {
        Self::Object(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One `_orderBy` entry: a direction for a column, or nested terms for a to-one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    Direction(Direction),
    Nested(Vec<(String, OrderBy)>),
}

impl From<Direction> for OrderBy {
    fn from(value: Direction) -> Self {
        Self::Direction(value)
    }
}

impl<S, O> From<Vec<(S, O)>> for OrderBy
where
    S: Into<String>,
    O: Into<Self>,
{
    fn from(value: Vec<(S, O)>) -> Self {
        Self::Nested(
            value
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An ordered set of attribute filters, plus the reserved `_orderBy`, `_limit` and `_offset`
/// keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<(String, FilterValue)>,
    order_by: Vec<(String, OrderBy)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `attribute` on `value`, replacing any earlier filter on it.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(attribute, value);
        self
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) {
        let attribute = attribute.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == attribute) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((attribute, value)),
        }
    }

    #[must_use]
    pub fn null(self, attribute: impl Into<String>) -> Self {
        self.with(attribute, FilterValue::Null)
    }

    #[must_use]
    pub fn like(self, attribute: impl Into<String>, pattern: &str) -> Self {
        self.with(attribute, FilterValue::like(pattern))
    }

    /// Append an `ORDER BY` term.
    #[must_use]
    pub fn order_by(mut self, attribute: impl Into<String>, order: impl Into<OrderBy>) -> Self {
        self.order_by.push((attribute.into(), order.into()));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == attribute).then_some(v))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = (&str, &mut FilterValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn ordering(&self) -> &[(String, OrderBy)] {
        &self.order_by
    }

    #[must_use]
    pub const fn row_limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub const fn row_offset(&self) -> Option<u64> {
        self.offset
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_translates_wildcards() {
        assert_eq!(FilterValue::like("B*b*"), FilterValue::Like("B%b%".to_string()));
    }

    #[test]
    fn later_filters_replace_earlier_ones() {
        let filters = Filters::new().with("name", "Bob").with("name", "Alice");

        assert_eq!(filters.entries().count(), 1);
        assert_eq!(filters.get("name"), Some(&FilterValue::Eq("Alice".into())));
    }

    #[test]
    fn nested_ordering_converts_from_pairs() {
        let filters = Filters::new().order_by("customer", vec![("name", Direction::Desc)]);

        assert_eq!(
            filters.ordering(),
            &[(
                "customer".to_string(),
                OrderBy::Nested(vec![("name".to_string(), OrderBy::Direction(Direction::Desc))])
            )]
        );
    }
}
