use db_storage::{Entity, Related, RelatedMany};

/// Eagerly joins its lines, which are dropped along with it.
#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Invoice {
    pub id: Option<i64>,
    pub number: String,
    #[entity(cascade)]
    pub lines: RelatedMany<InvoiceLine>,
}

/// Carries no field for its `invoice_id` backreference.
#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[entity(table = "invoice_line")]
pub struct InvoiceLine {
    pub id: Option<i64>,
    pub label: String,
    pub amount: i64,
}

impl InvoiceLine {
    #[must_use]
    pub fn new(label: &str, amount: i64) -> Self {
        Self {
            label: label.to_string(),
            amount,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Account {
    pub id: Option<i64>,
    #[entity(unique)]
    pub login: String,
    #[entity(cascade)]
    pub settings: Related<Settings>,
}

#[derive(Debug, Default, Clone, PartialEq, Entity)]
pub struct Settings {
    pub id: Option<i64>,
    pub theme: String,
    pub dark: bool,
    pub ratio: f64,
    pub avatar: Option<Vec<u8>>,
}
