use db_storage::{Entity, Lazy, Related, RelatedMany};

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Customer {
    pub id: Option<i64>,
    #[entity(unique)]
    pub name: String,
    pub email: Option<String>,
}

impl Customer {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(table = "order")]
pub struct Order {
    pub id: Option<i64>,
    pub reference: String,
    pub customer: Related<Customer>,
    #[entity(lazy, backref = "order")]
    pub items: RelatedMany<Item>,
}

impl Order {
    #[must_use]
    pub fn new(reference: &str, customer: Customer) -> Self {
        Self {
            reference: reference.to_string(),
            customer: Related::new(customer),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Item {
    pub id: Option<i64>,
    pub product: String,
    pub quantity: i64,
    #[entity(lazy)]
    pub order: Related<Order>,
    pub note: Lazy<Option<String>>,
}

impl Item {
    #[must_use]
    pub fn new(product: &str, quantity: i64) -> Self {
        Self {
            product: product.to_string(),
            quantity,
            ..Self::default()
        }
    }
}
