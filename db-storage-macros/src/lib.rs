mod model;

use model::derive_entity;
use proc_macro::TokenStream;
use proc_macro_error2::proc_macro_error;

/// Implement `db_storage::Entity` for a struct with named fields.
///
/// The field kind follows its type: `Related<T>` declares a to-one relation, `RelatedMany<T>` a
/// to-many relation, `Lazy<V>` a lazily fetched column, anything else a plain column.
///
/// ```ignore
/// #[derive(Default, Entity)]
/// #[entity(table = "order")]
/// struct Order {
///     #[entity(identity)]
///     id: Option<i64>,
///     #[entity(column = "customer_id")]
///     customer: Related<Customer>,
///     #[entity(lazy, cascade, backref = "order")]
///     items: RelatedMany<Item>,
/// }
/// ```
#[proc_macro_error]
#[proc_macro_derive(Entity, attributes(entity))]
pub fn entity(input: TokenStream) -> TokenStream {
    derive_entity(input.into()).into()
}
