//! Turns a filter tree into the column list, join plan and predicate tree of one `SELECT`.

use std::collections::HashMap;

use sqlx::{Any, QueryBuilder};

use super::{
    BinaryExprOperand, Condition, PushToQuery,
    filter::{Direction, FilterValue, Filters, Limit, LimitKind, OrderBy},
    quote,
};
use crate::{
    entity::{
        EntityRef,
        column::{ColumnName, Descriptor, backref_column},
    },
    error::{Error, Result},
    schema::{EntityType, Schema},
    value::{ColumnType, Value},
};

/// The label a column is selected under, and read back from by the materializer.
pub(crate) fn label(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

/// A table taking part in the query. Index `0` is the queried type.
#[derive(Debug)]
pub(crate) struct PlannedTable {
    pub(crate) entity: EntityRef,
    pub(crate) table: &'static str,
    /// The name this instance of the table is referred to by; the table name for its first join.
    pub(crate) alias: String,
}

#[derive(Debug)]
struct Join {
    table: &'static str,
    alias: Option<String>,
    on: Condition,
}

#[derive(Debug)]
pub(crate) struct Plan {
    pub(crate) tables: Vec<PlannedTable>,
    /// `(source table, attribute)` → joined table, for every relation the query traverses.
    pub(crate) edges: HashMap<(usize, usize), usize>,
    columns: Vec<ColumnName>,
    joins: Vec<Join>,
    /// Per table: the `AND` of the filters landing on it.
    predicates: Vec<Option<Condition>>,
    anti_joins: Vec<Condition>,
    order: Vec<(ColumnName, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Plan {
    /// Plan a `SELECT` of `root` rows matching `filters`.
    ///
    /// Related objects in `filters` must already carry an identity.
    pub(crate) fn build(schema: &Schema, root: &EntityType, filters: &Filters) -> Result<Self> {
        let mut planner = Planner {
            schema,
            plan: Self {
                tables: vec![PlannedTable {
                    entity: root.entity(),
                    table: root.table(),
                    alias: root.table().to_string(),
                }],
                edges: HashMap::new(),
                columns: vec![],
                joins: vec![],
                predicates: vec![None],
                anti_joins: vec![],
                order: vec![],
                limit: filters.row_limit(),
                offset: filters.row_offset(),
            },
            copies: 0,
            limits: 0,
        };

        let pending = planner.visit(0, root, filters, filters.ordering())?;
        planner.order(0, root, filters.ordering())?;

        if let Some(limit) = pending.first() {
            return Err(Error::invalid_filter(
                limit.owner,
                &limit.relation,
                "a LIMIT must be nested below a to-one relation",
            ));
        }

        Ok(planner.plan)
    }

    /// The `WHERE` predicate: every table's filters and every anti-join, `AND`-combined.
    pub(crate) fn condition(&self) -> Option<Condition> {
        let mut parts = self.predicates.iter().flatten().cloned().collect::<Vec<_>>();
        parts.extend(self.anti_joins.iter().cloned());

        Condition::all(parts)
    }

    /// Render the statement, see [`Select::query`](super::select::Select::query).
    pub(crate) fn sql(&self) -> String {
        let mut builder = QueryBuilder::new("");
        self.push_to(&mut builder);
        builder.into_sql()
    }
}

impl PushToQuery for Plan {
    fn push_to(&self, builder: &mut QueryBuilder<'_, Any>) {
        builder.push("SELECT ");

        self.columns.iter().enumerate().for_each(|(i, e)| {
            if i > 0 {
                builder.push(", ");
            }
            e.push_to(builder);
            builder.push(" AS ");
            builder.push(quote(&e.label()));
        });

        builder.push(" FROM ");
        builder.push(quote(self.tables[0].table));

        for join in &self.joins {
            builder.push(" LEFT JOIN ");
            builder.push(quote(join.table));
            if let Some(alias) = &join.alias {
                builder.push(" AS ");
                builder.push(quote(alias));
            }
            builder.push(" ON ");
            join.on.push_to(builder);
        }

        if let Some(condition) = self.condition() {
            builder.push(" WHERE ");
            condition.push_to(builder);
        }

        if !self.order.is_empty() {
            builder.push(" ORDER BY ");
            self.order.iter().enumerate().for_each(|(i, (column, direction))| {
                if i > 0 {
                    builder.push(", ");
                }
                column.push_to(builder);
                builder.push(format_args!(" {}", direction.keyword()));
            });
        }

        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                builder.push(format_args!(" LIMIT {limit}"));
                if let Some(offset) = offset {
                    builder.push(format_args!(" OFFSET {offset}"));
                }
            }
            (None, Some(offset)) => {
                builder.push(format_args!(" LIMIT {} OFFSET {offset}", i64::MAX));
            }
            (None, None) => {}
        }
    }
}

/// A [`Limit`] found on a to-many attribute, travelling up to the enclosing to-one level.
struct PendingLimit {
    owner: &'static str,
    relation: String,
    target: EntityRef,
    backref: String,
    limit: Limit,
}

struct Planner<'s> {
    schema: &'s Schema,
    plan: Plan,
    copies: usize,
    limits: usize,
}

impl<'s> Planner<'s> {
    fn find(&self, table: &str) -> Option<usize> {
        self.plan.tables.iter().position(|e| e.table == table)
    }

    /// Join `ty` for the relation `attribute` of table `source`.
    ///
    /// A table already in the plan is joined again as an aliased copy, so each relation path
    /// filters its own rows.
    fn join(
        &mut self,
        source: usize,
        attribute: usize,
        ty: &EntityType,
        on: impl FnOnce(&str) -> Condition,
    ) -> usize {
        let index = self.plan.tables.len();

        let alias = if self.find(ty.table()).is_some() {
            self.copies += 1;
            format!("{}__join{}", ty.table(), self.copies)
        } else {
            ty.table().to_string()
        };

        self.plan.joins.push(Join {
            table: ty.table(),
            alias: (alias != ty.table()).then(|| alias.clone()),
            on: on(&alias),
        });
        self.plan.tables.push(PlannedTable {
            entity: ty.entity(),
            table: ty.table(),
            alias,
        });
        self.plan.predicates.push(None);
        self.plan.edges.insert((source, attribute), index);

        index
    }

    /// Plan the attributes of `ty`, joined as table `table`: select its columns, attach its
    /// filters and follow its eager relations.
    ///
    /// Eager relations whose table is already in the plan are left to proxies, which bounds the
    /// recursion. Filtered or ordered relations are always joined.
    fn visit(
        &mut self,
        table: usize,
        ty: &'s EntityType,
        filters: &Filters,
        order: &[(String, OrderBy)],
    ) -> Result<Vec<PendingLimit>> {
        let schema = self.schema;
        let alias = self.plan.tables[table].alias.clone();

        for (name, _) in filters.entries() {
            ty.require(name)?;
        }
        for (name, _) in order {
            ty.require(name)?;
        }

        let mut predicates = vec![];
        let mut pending = vec![];

        for (index, attribute) in ty.attributes().iter().enumerate() {
            let name = attribute.name();
            let value = filters.get(name);
            let ordering = order.iter().find_map(|(k, v)| (k == name).then_some(v));

            match attribute.descriptor() {
                Descriptor::Column {
                    column,
                    column_type,
                    ..
                }
                | Descriptor::LazyAttribute {
                    column,
                    column_type,
                    ..
                } => {
                    let column = ColumnName::qualified(&alias, column);

                    if matches!(attribute.descriptor(), Descriptor::Column { .. }) {
                        self.plan.columns.push(column.clone());
                    }

                    if let Some(value) = value {
                        predicates.extend(scalar_predicate(ty, name, &column, *column_type, value)?);
                    }
                }
                Descriptor::ToOne {
                    target,
                    column,
                    options,
                } => {
                    let local = ColumnName::qualified(&alias, column);
                    let target_ty = schema.get(*target)?;

                    self.plan.columns.push(local.clone());

                    let mut nested = None;

                    match value {
                        None | Some(FilterValue::Eq(Value::Null)) => {}
                        Some(FilterValue::Eq(Value::Int(key))) => {
                            predicates.push(Condition::compare(
                                local.clone(),
                                BinaryExprOperand::Equals,
                                Value::Int(*key),
                            ));
                        }
                        Some(FilterValue::Null) => predicates.push(Condition::IsNull(local.clone())),
                        Some(FilterValue::Nested(filters)) => nested = Some(filters),
                        Some(FilterValue::Object(object)) => {
                            if object.entity != *target {
                                return Err(Error::invalid_filter(
                                    ty.table(),
                                    name,
                                    format!("expected a `{}` instance", target.name()),
                                ));
                            }

                            let Some(key) = target_ty.identity_of(&*object.object)? else {
                                return Err(Error::RelatedObjectNotFound {
                                    entity: ty.table(),
                                    attribute: name.to_string(),
                                    matches: 0,
                                });
                            };

                            predicates.push(Condition::compare(
                                local.clone(),
                                BinaryExprOperand::Equals,
                                Value::Int(key),
                            ));
                        }
                        Some(other) => {
                            return Err(Error::invalid_filter(
                                ty.table(),
                                name,
                                format!("a to-one relation cannot be filtered on {other:?}"),
                            ));
                        }
                    }

                    let nested_order = match ordering {
                        Some(OrderBy::Nested(terms)) => Some(terms.as_slice()),
                        _ => None,
                    };

                    let needed = nested.is_some() || nested_order.is_some();
                    let eager = !options.lazy && self.find(target_ty.table()).is_none();

                    if !needed && !eager {
                        continue;
                    }

                    let target_table = self.join(table, index, target_ty, |joined| {
                        Condition::columns(
                            local,
                            BinaryExprOperand::Equals,
                            ColumnName::qualified(joined, target_ty.identity_column()),
                        )
                    });

                    let empty = Filters::new();
                    let yielded = self.visit(
                        target_table,
                        target_ty,
                        nested.unwrap_or(&empty),
                        nested_order.unwrap_or_default(),
                    )?;

                    for limit in yielded {
                        predicates.extend(self.limit(table, ty, limit)?);
                    }
                }
                Descriptor::ToMany {
                    target,
                    backref,
                    options,
                } => {
                    let target_ty = schema.get(*target)?;

                    match value {
                        None => {}
                        Some(FilterValue::Limit(limit)) => pending.push(PendingLimit {
                            owner: ty.table(),
                            relation: name.to_string(),
                            target: *target,
                            backref: backref_column(backref),
                            limit: limit.clone(),
                        }),
                        Some(_) => {
                            return Err(Error::invalid_filter(
                                ty.table(),
                                name,
                                "to-many relations only accept a LIMIT",
                            ));
                        }
                    }

                    if !options.lazy && self.find(target_ty.table()).is_none() {
                        let owner = ColumnName::qualified(&alias, ty.identity_column());
                        let target_table = self.join(table, index, target_ty, |joined| {
                            Condition::columns(
                                ColumnName::qualified(joined, backref_column(backref)),
                                BinaryExprOperand::Equals,
                                owner,
                            )
                        });
                        self.visit(target_table, target_ty, &Filters::new(), &[])?;
                    }
                }
            }
        }

        self.plan.predicates[table] = Condition::all(predicates);

        Ok(pending)
    }

    /// Append the `ORDER BY` terms in the order they were given. Runs after [`visit`](Self::visit)
    /// has joined every table a nested term refers to.
    fn order(&mut self, table: usize, ty: &EntityType, terms: &[(String, OrderBy)]) -> Result<()> {
        let alias = self.plan.tables[table].alias.clone();

        for (name, term) in terms {
            let (index, attribute) = ty.require(name)?;

            match (attribute.descriptor(), term) {
                (
                    Descriptor::Column { column, .. }
                    | Descriptor::LazyAttribute { column, .. }
                    | Descriptor::ToOne { column, .. },
                    OrderBy::Direction(direction),
                ) => {
                    self.plan
                        .order
                        .push((ColumnName::qualified(&alias, column), *direction));
                }
                (Descriptor::ToOne { target, .. }, OrderBy::Nested(terms)) => {
                    let target_ty = self.schema.get(*target)?;
                    let target_table =
                        self.plan.edges.get(&(table, index)).copied().ok_or_else(|| {
                            Error::Schema(format!("`{}` was not joined for ordering", target_ty.table()))
                        })?;
                    self.order(target_table, target_ty, terms)?;
                }
                (Descriptor::ToMany { .. }, _) => {
                    return Err(Error::invalid_filter(
                        ty.table(),
                        name,
                        "cannot order by a to-many relation",
                    ));
                }
                (_, OrderBy::Nested(_)) => {
                    return Err(Error::invalid_filter(
                        ty.table(),
                        name,
                        "nested ordering on a scalar attribute",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Restrict `ty`, queried as table `table` at this level, to the rows picked by `pending`.
    fn limit(
        &mut self,
        table: usize,
        ty: &EntityType,
        pending: PendingLimit,
    ) -> Result<Option<Condition>> {
        if pending.target != ty.entity() {
            return Err(Error::invalid_filter(
                pending.owner,
                &pending.relation,
                format!("a LIMIT here must select `{}` rows", ty.table()),
            ));
        }

        let (_, attribute) = ty.require(&pending.limit.attribute)?;
        let Descriptor::Column {
            column,
            column_type,
            ..
        } = attribute.descriptor()
        else {
            return Err(Error::invalid_filter(
                ty.table(),
                attribute.name(),
                "a LIMIT must compare a plain column",
            ));
        };

        let alias = self.plan.tables[table].alias.clone();
        let limited = ColumnName::qualified(&alias, column);

        let operand = match &pending.limit.kind {
            LimitKind::Fixed(value) => {
                if value.is_null() || !value.fits(*column_type) {
                    return Err(Error::invalid_filter(
                        ty.table(),
                        attribute.name(),
                        format!("expected a {column_type} value, got {value:?}"),
                    ));
                }

                return Ok(Some(Condition::compare(
                    limited,
                    BinaryExprOperand::Equals,
                    value.clone(),
                )));
            }
            LimitKind::Max => BinaryExprOperand::Gt,
            LimitKind::Min => BinaryExprOperand::Lt,
        };

        self.limits += 1;
        let copy = format!("{alias}__limit{}", self.limits);

        self.plan.joins.push(Join {
            table: ty.table(),
            alias: Some(copy.clone()),
            on: Condition::All(vec![
                Condition::columns(
                    ColumnName::qualified(&copy, &pending.backref),
                    BinaryExprOperand::Equals,
                    ColumnName::qualified(&alias, &pending.backref),
                ),
                Condition::columns(ColumnName::qualified(&copy, column), operand, limited),
            ]),
        });
        self.plan.anti_joins.push(Condition::IsNull(ColumnName::qualified(
            copy,
            ty.identity_column(),
        )));

        Ok(None)
    }
}

fn scalar_predicate(
    ty: &EntityType,
    name: &str,
    column: &ColumnName,
    column_type: ColumnType,
    value: &FilterValue,
) -> Result<Option<Condition>> {
    Ok(match value {
        FilterValue::Eq(Value::Null) => None,
        FilterValue::Eq(value) if value.fits(column_type) => Some(Condition::compare(
            column.clone(),
            BinaryExprOperand::Equals,
            value.clone(),
        )),
        FilterValue::Eq(value) => {
            return Err(Error::invalid_filter(
                ty.table(),
                name,
                format!("expected a {column_type} value, got {value:?}"),
            ));
        }
        FilterValue::Null => Some(Condition::IsNull(column.clone())),
        FilterValue::Like(pattern) if column_type == ColumnType::Text => Some(Condition::compare(
            column.clone(),
            BinaryExprOperand::Like,
            Value::Text(pattern.clone()),
        )),
        FilterValue::Like(_) => {
            return Err(Error::invalid_filter(
                ty.table(),
                name,
                "LIKE needs a text column",
            ));
        }
        FilterValue::Nested(_) | FilterValue::Object(_) | FilterValue::Limit(_) => {
            return Err(Error::invalid_filter(
                ty.table(),
                name,
                "not a relation",
            ));
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{
        Declaration, Entity,
        field::{Lazy, Related, RelatedMany},
        relation::RelationOptions,
    };

    #[derive(Default)]
    struct Customer {
        id: Option<i64>,
        name: String,
    }

    #[derive(Default)]
    struct Order {
        id: Option<i64>,
        customer: Related<Customer>,
        billing: Related<Customer>,
        items: RelatedMany<Item>,
    }

    #[derive(Default)]
    struct Item {
        id: Option<i64>,
        quantity: i64,
        note: Lazy<Option<String>>,
    }

    impl Entity for Customer {
        const TABLE: &'static str = "customer";

        fn declare(declaration: &mut Declaration<Self>) {
            declaration
                .identity("id", "id", |e| &e.id, |e| &mut e.id)
                .column("name", "name", |e| &e.name, |e| &mut e.name);
        }
    }

    impl Entity for Order {
        const TABLE: &'static str = "order";

        fn declare(declaration: &mut Declaration<Self>) {
            declaration
                .identity("id", "id", |e| &e.id, |e| &mut e.id)
                .to_one(
                    "customer",
                    "customer_id",
                    RelationOptions::eager(),
                    |e| &e.customer,
                    |e| &mut e.customer,
                )
                .to_one(
                    "billing",
                    "billing_id",
                    RelationOptions::lazy(),
                    |e| &e.billing,
                    |e| &mut e.billing,
                )
                .to_many(
                    "items",
                    "order",
                    RelationOptions::lazy(),
                    |e| &e.items,
                    |e| &mut e.items,
                );
        }
    }

    impl Entity for Item {
        const TABLE: &'static str = "item";

        fn declare(declaration: &mut Declaration<Self>) {
            declaration
                .identity("id", "id", |e| &e.id, |e| &mut e.id)
                .column("quantity", "quantity", |e| &e.quantity, |e| &mut e.quantity)
                .lazy("note", "note", |e| &e.note, |e| &mut e.note);
        }
    }

    #[derive(Default)]
    struct Node {
        id: Option<i64>,
        name: String,
        parent: Related<Node>,
    }

    impl Entity for Node {
        const TABLE: &'static str = "node";

        fn declare(declaration: &mut Declaration<Self>) {
            declaration
                .identity("id", "id", |e| &e.id, |e| &mut e.id)
                .column("name", "name", |e| &e.name, |e| &mut e.name)
                .to_one(
                    "parent",
                    "parent_id",
                    RelationOptions::lazy(),
                    |e| &e.parent,
                    |e| &mut e.parent,
                );
        }
    }

    fn schema() -> Schema {
        Schema::builder()
            .register::<Customer>()
            .register::<Order>()
            .register::<Item>()
            .build()
            .unwrap()
    }

    fn sql<E: Entity>(filters: &Filters) -> Result<String> {
        let schema = schema();
        let plan = Plan::build(&schema, schema.entity::<E>()?, filters)?;
        Ok(plan.sql())
    }

    #[test]
    fn eager_relation_is_joined() {
        let filters = Filters::new().with("customer", Filters::new().with("name", "Bob"));

        assert_eq!(
            sql::<Order>(&filters).unwrap(),
            concat!(
                r#"SELECT "order"."id" AS "order.id", "order"."customer_id" AS "order.customer_id", "#,
                r#""customer"."id" AS "customer.id", "customer"."name" AS "customer.name", "#,
                r#""order"."billing_id" AS "order.billing_id" FROM "order" "#,
                r#"LEFT JOIN "customer" ON "order"."customer_id" = "customer"."id" "#,
                r#"WHERE "customer"."name" = ?"#
            )
        );
    }

    #[test]
    fn unfiltered_lazy_relation_is_skipped() {
        let sql = sql::<Item>(&Filters::new()).unwrap();

        assert_eq!(
            sql,
            r#"SELECT "item"."id" AS "item.id", "item"."quantity" AS "item.quantity", "item"."order_id" AS "item.order_id" FROM "item""#
        );
    }

    #[test]
    fn each_relation_to_one_table_gets_its_own_join() {
        let filters = Filters::new()
            .with("customer", Filters::new().with("name", "Bob"))
            .with("billing", Filters::new().with("name", "Alice"));

        let sql = sql::<Order>(&filters).unwrap();

        assert!(sql.contains(r#"LEFT JOIN "customer" ON "order"."customer_id" = "customer"."id""#));
        assert!(sql.contains(concat!(
            r#"LEFT JOIN "customer" AS "customer__join1" "#,
            r#"ON "order"."billing_id" = "customer__join1"."id""#
        )));
        assert!(sql.ends_with(
            r#"WHERE ("customer"."name" = ?) AND ("customer__join1"."name" = ?)"#
        ));
    }

    #[test]
    fn filtered_lazy_relation_is_joined_beside_an_eager_one() {
        let filters = Filters::new().with("billing", Filters::new().with("name", "Alice"));

        let sql = sql::<Order>(&filters).unwrap();

        assert!(sql.contains(r#"ON "order"."customer_id" = "customer"."id""#));
        assert!(sql.contains(r#""customer__join1"."name" AS "customer__join1.name""#));
        assert!(sql.ends_with(r#"WHERE "customer__join1"."name" = ?"#));
    }

    #[test]
    fn self_reference_joins_an_aliased_copy() {
        let schema = Schema::builder().register::<Node>().build().unwrap();
        let filters = Filters::new()
            .with("name", "a")
            .with("parent", Filters::new().with("name", "x"));

        let sql = Plan::build(&schema, schema.entity::<Node>().unwrap(), &filters)
            .unwrap()
            .sql();

        assert_eq!(
            sql,
            concat!(
                r#"SELECT "node"."id" AS "node.id", "node"."name" AS "node.name", "#,
                r#""node"."parent_id" AS "node.parent_id", "#,
                r#""node__join1"."id" AS "node__join1.id", "node__join1"."name" AS "node__join1.name", "#,
                r#""node__join1"."parent_id" AS "node__join1.parent_id" FROM "node" "#,
                r#"LEFT JOIN "node" AS "node__join1" ON "node"."parent_id" = "node__join1"."id" "#,
                r#"WHERE ("node"."name" = ?) AND ("node__join1"."name" = ?)"#
            )
        );
    }

    #[test]
    fn nested_ordering_follows_the_joined_copy() {
        let schema = Schema::builder().register::<Node>().build().unwrap();
        let filters = Filters::new().order_by("parent", vec![("name", Direction::Asc)]);

        let sql = Plan::build(&schema, schema.entity::<Node>().unwrap(), &filters)
            .unwrap()
            .sql();

        assert!(sql.ends_with(r#"ORDER BY "node__join1"."name" ASC"#));
    }

    #[test]
    fn max_limit_adds_anti_join() {
        let filters = Filters::new().with(
            "order",
            Filters::new().with("id", 7).with("items", Limit::max("quantity")),
        );

        let sql = sql::<Item>(&filters).unwrap();

        assert!(sql.contains(concat!(
            r#"LEFT JOIN "item" AS "item__limit1" ON ("item__limit1"."order_id" = "item"."order_id") "#,
            r#"AND ("item__limit1"."quantity" > "item"."quantity")"#
        )));
        assert!(sql.ends_with(r#"WHERE ("order"."id" = ?) AND ("item__limit1"."id" IS NULL)"#));
    }

    #[test]
    fn fixed_limit_is_a_plain_predicate() {
        let filters = Filters::new().with(
            "order",
            Filters::new().with("id", 7).with("items", Limit::fixed("quantity", 10)),
        );

        let sql = sql::<Item>(&filters).unwrap();

        assert!(!sql.contains("__limit"));
        assert!(sql.ends_with(r#"WHERE ("item"."quantity" = ?) AND ("order"."id" = ?)"#));
    }

    #[test]
    fn root_level_limit_is_rejected() {
        let filters = Filters::new().with("items", Limit::min("quantity"));

        assert!(matches!(
            sql::<Order>(&filters),
            Err(Error::InvalidFilterValue { .. })
        ));
    }

    #[test]
    fn wrong_value_kind_is_rejected() {
        let filters = Filters::new().with("quantity", "many");

        assert!(matches!(
            sql::<Item>(&filters),
            Err(Error::InvalidFilterValue { .. })
        ));
    }

    #[test]
    fn unknown_attributes_are_rejected() {
        let filters = Filters::new().with("colour", "red");

        assert!(matches!(
            sql::<Item>(&filters),
            Err(Error::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn ordering_and_paging_are_rendered() {
        let filters = Filters::new()
            .order_by("customer", vec![("name", Direction::Desc)])
            .order_by("id", Direction::Asc)
            .offset(5);

        let sql = sql::<Order>(&filters).unwrap();

        assert!(sql.ends_with(&format!(
            r#"ORDER BY "customer"."name" DESC, "order"."id" ASC LIMIT {} OFFSET 5"#,
            i64::MAX
        )));
    }
}
