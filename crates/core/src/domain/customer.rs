use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub i64);

/// One row of the `Customer` table.
///
/// `id` stays `None` until the database assigns it on insert; records loaded
/// by VAT always carry it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: Option<CustomerId>,
    pub vat: i32,
    pub denomination: String,
    pub email: String,
}

impl CustomerRecord {
    pub fn new(vat: i32, denomination: impl Into<String>, email: impl Into<String>) -> Self {
        Self { id: None, vat, denomination: denomination.into(), email: email.into() }
    }

    pub fn with_id(
        id: CustomerId,
        vat: i32,
        denomination: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self { id: Some(id), vat, denomination: denomination.into(), email: email.into() }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
