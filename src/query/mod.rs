pub mod filter;
pub(crate) mod materialize;
pub(crate) mod plan;
pub mod select;

use std::fmt::Display;

use sqlx::{Any, QueryBuilder};

use crate::{entity::column::ColumnName, value::Value};

/// This trait represents anything that can be pushed into a [`QueryBuilder`], i.e. any kind of
/// query fragment, like a condition or a list of values.
pub trait PushToQuery {
    /// Push the object's contents into a query builder.
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>);
}

impl<T> PushToQuery for &T
where
    T: PushToQuery + ?Sized,
{
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        (**self).push_to(builder);
    }
}

impl<T> PushToQuery for Vec<T>
where
    T: PushToQuery,
{
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push("(");
        self.iter().enumerate().for_each(|(i, e)| {
            if i > 0 {
                builder.push(", ");
            }
            e.push_to(builder);
        });
        builder.push(")");
    }
}

impl PushToQuery for String {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push(self);
    }
}

/// Quote an identifier, doubling any embedded quote characters.
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub(crate) struct BracketsExpr<T: PushToQuery>(T);

impl<T: PushToQuery> BracketsExpr<T> {
    pub(crate) const fn new(inner: T) -> Self {
        Self(inner)
    }
}

impl<T: PushToQuery> PushToQuery for BracketsExpr<T> {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push("(");
        self.0.push_to(builder);
        builder.push(")");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryExprOperand {
    Equals,
    Like,
    And,
    In,
    Gt,
    Lt,
}

impl Display for BinaryExprOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Equals => "=",
                Self::Like => "LIKE",
                Self::And => "AND",
                Self::In => "IN",
                Self::Gt => ">",
                Self::Lt => "<",
            }
        )
    }
}

/// A binary SQL expression, glued together with an operator.
///
/// Example: `left-side [operator] right-side`
pub(crate) struct BinaryExpr<T, C>
where
    T: PushToQuery,
    C: PushToQuery,
{
    a: T,
    b: C,
    operand: BinaryExprOperand,
}

impl<T, C> BinaryExpr<T, C>
where
    T: PushToQuery,
    C: PushToQuery,
{
    pub(crate) const fn new(left: T, right: C, operand: BinaryExprOperand) -> Self {
        Self {
            a: left,
            b: right,
            operand,
        }
    }
}

impl<T, C> PushToQuery for BinaryExpr<T, C>
where
    T: PushToQuery,
    C: PushToQuery,
{
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        self.a.push_to(builder);
        builder.push(format_args!(" {} ", self.operand));
        self.b.push_to(builder);
    }
}

pub(crate) enum SingletonExprOperand {
    IsNull,
}

impl Display for SingletonExprOperand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::IsNull => "IS NULL",
            }
        )
    }
}

pub(crate) struct SingletonExpr<T>
where
    T: PushToQuery,
{
    inner: T,
    operand: SingletonExprOperand,
}

impl<T> SingletonExpr<T>
where
    T: PushToQuery,
{
    pub(crate) const fn new(inner: T, operand: SingletonExprOperand) -> Self {
        Self { inner, operand }
    }
}

impl<T> PushToQuery for SingletonExpr<T>
where
    T: PushToQuery,
{
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        self.inner.push_to(builder);
        builder.push(format_args!(" {}", self.operand));
    }
}

/// A `WHERE`/`ON` predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Condition {
    Compare {
        column: ColumnName,
        operand: BinaryExprOperand,
        value: Value,
    },
    Columns {
        left: ColumnName,
        operand: BinaryExprOperand,
        right: ColumnName,
    },
    IsNull(ColumnName),
    All(Vec<Condition>),
}

impl Condition {
    pub(crate) const fn compare(column: ColumnName, operand: BinaryExprOperand, value: Value) -> Self {
        Self::Compare {
            column,
            operand,
            value,
        }
    }

    pub(crate) const fn columns(
        left: ColumnName,
        operand: BinaryExprOperand,
        right: ColumnName,
    ) -> Self {
        Self::Columns {
            left,
            operand,
            right,
        }
    }

    /// Glue `conditions` with `AND`, collapsing empty and single-element lists.
    pub(crate) fn all(mut conditions: Vec<Self>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(Self::All(conditions)),
        }
    }
}

fn push_glued(builder: &mut QueryBuilder<'_, Any>, parts: &[Condition], glue: BinaryExprOperand) {
    parts.iter().enumerate().for_each(|(i, e)| {
        if i > 0 {
            builder.push(format_args!(" {glue} "));
        }
        BracketsExpr::new(e).push_to(builder);
    });
}

impl PushToQuery for Condition {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        match self {
            Self::Compare {
                column,
                operand,
                value,
            } => BinaryExpr::new(column, value, *operand).push_to(builder),
            Self::Columns {
                left,
                operand,
                right,
            } => BinaryExpr::new(left, right, *operand).push_to(builder),
            Self::IsNull(column) => {
                SingletonExpr::new(column, SingletonExprOperand::IsNull).push_to(builder);
            }
            Self::All(parts) => push_glued(builder, parts, BinaryExprOperand::And),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn render(query: &impl PushToQuery) -> String {
        let mut builder = QueryBuilder::new("");
        query.push_to(&mut builder);
        builder.into_sql()
    }

    #[test]
    fn nested_conditions_are_bracketed() {
        let left = Condition::compare(
            ColumnName::qualified("a", "x"),
            BinaryExprOperand::Equals,
            Value::Int(1),
        );
        let right = Condition::IsNull(ColumnName::qualified("b", "y"));
        let inner = Condition::all(vec![left.clone(), right]).unwrap();
        let all = Condition::all(vec![inner, left]).unwrap();

        assert_eq!(
            render(&all),
            r#"(("a"."x" = ?) AND ("b"."y" IS NULL)) AND ("a"."x" = ?)"#
        );
    }

    #[test]
    fn single_conditions_collapse() {
        let only = Condition::IsNull(ColumnName::qualified("a", "x"));
        assert_eq!(Condition::all(vec![only.clone()]), Some(only));
        assert_eq!(Condition::all(vec![]), None);
    }

    #[test]
    fn identifiers_escape_quotes() {
        assert_eq!(quote("order"), r#""order""#);
        assert_eq!(quote(r#"we"ird"#), r#""we""ird""#);
    }
}
