use tokio::sync::RwLock;

use vatbook_core::domain::customer::{CustomerId, CustomerRecord};

use super::{CustomerGateway, GatewayError};

/// Table substitute for tests and demos: rows kept in insertion order, ids start at 1.
#[derive(Default)]
pub struct InMemoryCustomerGateway {
    table: RwLock<MemoryTable>,
}

#[derive(Default)]
struct MemoryTable {
    rows: Vec<CustomerRecord>,
    last_id: i64,
}

impl InMemoryCustomerGateway {
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl CustomerGateway for InMemoryCustomerGateway {
    async fn insert(&self, record: &mut CustomerRecord) -> Result<(), GatewayError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let id = CustomerId(table.last_id);

        let mut row = record.clone();
        row.id = Some(id);
        table.rows.push(row);

        record.id = Some(id);
        Ok(())
    }

    async fn find_by_vat(&self, vat: i32) -> Result<CustomerRecord, GatewayError> {
        let table = self.table.read().await;
        table
            .rows
            .iter()
            .find(|row| row.vat == vat)
            .cloned()
            .ok_or(GatewayError::NotFound { vat })
    }
}
