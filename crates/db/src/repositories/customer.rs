use sqlx::sqlite::{SqliteExecutor, SqliteRow};
use sqlx::Row;

use vatbook_core::domain::customer::{CustomerId, CustomerRecord};

use super::{CustomerGateway, GatewayError, LoadError, PersistenceCause};
use crate::DbPool;

// SQLite rejects DEFAULT inside VALUES; omitting `id` yields the same generated key.
const INSERT_CUSTOMER_SQL: &str =
    "INSERT INTO Customer (vat, denomination, email) VALUES (?, ?, ?) RETURNING id";

const FIND_CUSTOMER_BY_VAT_SQL: &str = "SELECT * FROM Customer c WHERE c.vat = ?";

pub struct SqlCustomerGateway {
    pool: DbPool,
}

impl SqlCustomerGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl CustomerGateway for SqlCustomerGateway {
    async fn insert(&self, record: &mut CustomerRecord) -> Result<(), GatewayError> {
        insert(&self.pool, record).await
    }

    async fn find_by_vat(&self, vat: i32) -> Result<CustomerRecord, GatewayError> {
        find_by_vat(&self.pool, vat).await
    }
}

/// Inserts `record` through any SQLite executor (pool, connection or transaction).
pub async fn insert<'e, E>(executor: E, record: &mut CustomerRecord) -> Result<(), GatewayError>
where
    E: SqliteExecutor<'e>,
{
    if let Some(existing) = record.id {
        tracing::warn!(
            event_name = "db.customer.insert_persisted",
            customer_id = existing.0,
            vat = record.vat,
            "inserting a record that already carries an id; a new row will be created"
        );
    }

    let row = sqlx::query(INSERT_CUSTOMER_SQL)
        .bind(record.vat)
        .bind(&record.denomination)
        .bind(&record.email)
        .fetch_optional(executor)
        .await
        .map_err(|error| {
            tracing::warn!(
                event_name = "db.customer.insert_failed",
                vat = record.vat,
                error = %error,
                "customer insert failed"
            );
            GatewayError::persistence("error inserting a new customer", error)
        })?;

    let id = generated_id(row.as_ref())
        .map_err(|cause| GatewayError::persistence("error getting new customer's id", cause))?;
    record.id = Some(id);

    tracing::info!(
        event_name = "db.customer.inserted",
        customer_id = id.0,
        vat = record.vat,
        "customer inserted"
    );
    Ok(())
}

/// Loads the customer with the given VAT; absence is `GatewayError::NotFound`.
pub async fn find_by_vat<'e, E>(executor: E, vat: i32) -> Result<CustomerRecord, GatewayError>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(FIND_CUSTOMER_BY_VAT_SQL)
        .bind(vat)
        .fetch_optional(executor)
        .await
        .map_err(|error| GatewayError::persistence("error fetching customer by vat", error))?;

    let Some(row) = row else {
        tracing::debug!(event_name = "db.customer.not_found", vat, "no customer for vat");
        return Err(GatewayError::NotFound { vat });
    };

    let customer = load(&row)
        .map_err(|error| GatewayError::persistence("error loading customer object", error))?;

    tracing::debug!(
        event_name = "db.customer.loaded",
        customer_id = customer.id.map(|id| id.0),
        vat,
        "customer loaded"
    );
    Ok(customer)
}

fn generated_id(row: Option<&SqliteRow>) -> Result<CustomerId, PersistenceCause> {
    let row = row.ok_or(PersistenceCause::MissingGeneratedKey)?;
    let id: i64 = row.try_get(0)?;
    Ok(CustomerId(id))
}

fn load(row: &SqliteRow) -> Result<CustomerRecord, LoadError> {
    let id: i64 = column(row, "id")?;
    let vat: i32 = column(row, "vat")?;
    let denomination = text_column(row, "denomination")?;
    let email = text_column(row, "email")?;

    Ok(CustomerRecord::with_id(CustomerId(id), vat, denomination, email))
}

fn column<'r, T>(row: &'r SqliteRow, name: &'static str) -> Result<T, LoadError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|source| LoadError { column: name, source })
}

// sqlx-sqlite decodes NULL TEXT into `""` for `String`, so nulls are rejected explicitly.
fn text_column(row: &SqliteRow, name: &'static str) -> Result<String, LoadError> {
    column::<Option<String>>(row, name)?.ok_or_else(|| LoadError {
        column: name,
        source: sqlx::Error::ColumnDecode {
            index: name.to_string(),
            source: Box::new(sqlx::error::UnexpectedNullError),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use vatbook_core::domain::customer::{CustomerId, CustomerRecord};

    use super::SqlCustomerGateway;
    use crate::repositories::{CustomerGateway, GatewayError, PersistenceCause};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    async fn setup_without_schema() -> sqlx::SqlitePool {
        connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect")
    }

    #[tokio::test]
    async fn insert_then_find_by_vat_returns_same_fields() {
        let gateway = SqlCustomerGateway::new(setup().await);
        let samples = [
            (123456789, "Acme Ltd", "a@acme.test"),
            (500100200, "Sociedade Anónima Ção", "geral@exemplo.pt"),
            (1, "", ""),
            (-42, "Negative Vat Co", "neg@vat.test"),
            (i32::MAX, "Max Corp", "max@corp.test"),
        ];

        for (vat, denomination, email) in samples {
            let mut record = CustomerRecord::new(vat, denomination, email);
            gateway.insert(&mut record).await.expect("insert");

            let found = gateway.find_by_vat(vat).await.expect("find");
            assert_eq!(found, record);
            assert_eq!(found.vat, vat);
            assert_eq!(found.denomination, denomination);
            assert_eq!(found.email, email);
            assert!(found.id.is_some());
        }
    }

    #[tokio::test]
    async fn concrete_scenario_assigns_first_id() {
        let gateway = SqlCustomerGateway::new(setup().await);
        let mut record = CustomerRecord::new(123456789, "Acme Ltd", "a@acme.test");

        gateway.insert(&mut record).await.expect("insert");
        assert_eq!(record.id, Some(CustomerId(1)));

        let found = gateway.find_by_vat(123456789).await.expect("find");
        assert_eq!(
            found,
            CustomerRecord::with_id(CustomerId(1), 123456789, "Acme Ltd", "a@acme.test")
        );

        let missing = gateway.find_by_vat(999999999).await.expect_err("absent vat");
        assert!(matches!(missing, GatewayError::NotFound { vat: 999999999 }));
    }

    #[tokio::test]
    async fn unknown_vat_is_not_found_rather_than_persistence() {
        let gateway = SqlCustomerGateway::new(setup().await);

        let error = gateway.find_by_vat(111111111).await.expect_err("empty table");

        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn generated_id_is_positive_and_stable_across_reads() {
        let gateway = SqlCustomerGateway::new(setup().await);
        let mut record = CustomerRecord::new(222333444, "Stable Lda", "s@stable.test");
        gateway.insert(&mut record).await.expect("insert");

        let id = record.id.expect("id assigned");
        assert!(id.0 > 0);

        for _ in 0..3 {
            let found = gateway.find_by_vat(222333444).await.expect("find");
            assert_eq!(found.id, Some(id));
        }
    }

    #[tokio::test]
    async fn distinct_inserts_never_share_ids() {
        let gateway = SqlCustomerGateway::new(setup().await);
        let mut ids = HashSet::new();

        for vat in 100000000..100000010 {
            let mut record = CustomerRecord::new(vat, format!("Customer {vat}"), "c@test.test");
            gateway.insert(&mut record).await.expect("insert");
            assert!(ids.insert(record.id.expect("id assigned")), "id collision for vat {vat}");
        }

        assert_eq!(ids.len(), 10);
    }

    #[tokio::test]
    async fn insert_failure_is_persistence_error_and_leaves_id_unset() {
        let gateway = SqlCustomerGateway::new(setup_without_schema().await);
        let mut record = CustomerRecord::new(123456789, "Acme Ltd", "a@acme.test");

        let error = gateway.insert(&mut record).await.expect_err("missing table");

        assert!(matches!(
            error,
            GatewayError::Persistence {
                context: "error inserting a new customer",
                source: PersistenceCause::Database(_),
            }
        ));
        assert_eq!(record.id, None);
    }

    #[tokio::test]
    async fn insert_on_closed_pool_is_persistence_error() {
        let pool = setup().await;
        pool.close().await;
        let gateway = SqlCustomerGateway::new(pool);
        let mut record = CustomerRecord::new(123456789, "Acme Ltd", "a@acme.test");

        let error = gateway.insert(&mut record).await.expect_err("closed pool");

        assert!(matches!(error, GatewayError::Persistence { .. }));
        assert!(!record.is_persisted());
    }

    #[tokio::test]
    async fn lookup_failure_is_persistence_error_not_not_found() {
        let gateway = SqlCustomerGateway::new(setup_without_schema().await);

        let error = gateway.find_by_vat(123456789).await.expect_err("missing table");

        assert!(!error.is_not_found());
        assert!(matches!(
            error,
            GatewayError::Persistence {
                context: "error fetching customer by vat",
                source: PersistenceCause::Database(_),
            }
        ));
    }

    #[tokio::test]
    async fn malformed_row_surfaces_as_persistence_wrapping_load_error() {
        let pool = setup().await;
        sqlx::query("INSERT INTO Customer (vat, denomination, email) VALUES (?, NULL, ?)")
            .bind(333444555_i32)
            .bind("broken@row.test")
            .execute(&pool)
            .await
            .expect("raw insert");
        let gateway = SqlCustomerGateway::new(pool);

        let error = gateway.find_by_vat(333444555).await.expect_err("null denomination");

        match error {
            GatewayError::Persistence {
                context: "error loading customer object",
                source: PersistenceCause::Load(load),
            } => assert_eq!(load.column, "denomination"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_email_is_reported_against_the_email_column() {
        let pool = setup().await;
        sqlx::query("INSERT INTO Customer (vat, denomination, email) VALUES (?, ?, NULL)")
            .bind(666777888_i32)
            .bind("No Mail Lda")
            .execute(&pool)
            .await
            .expect("raw insert");

        let error = super::find_by_vat(&pool, 666777888).await.expect_err("null email");

        match error {
            GatewayError::Persistence { source: PersistenceCause::Load(load), .. } => {
                assert_eq!(load.column, "email");
                assert!(matches!(load.source, sqlx::Error::ColumnDecode { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_text_columns_still_load() {
        let pool = setup().await;
        sqlx::query("INSERT INTO Customer (vat, denomination, email) VALUES (?, '', '')")
            .bind(888999000_i32)
            .execute(&pool)
            .await
            .expect("raw insert");

        let found = super::find_by_vat(&pool, 888999000).await.expect("empty strings are valid");

        assert_eq!(found.denomination, "");
        assert_eq!(found.email, "");
    }

    #[tokio::test]
    async fn duplicate_vat_returns_first_inserted_row() {
        let gateway = SqlCustomerGateway::new(setup().await);
        let mut first = CustomerRecord::new(444555666, "First", "first@dup.test");
        let mut second = CustomerRecord::new(444555666, "Second", "second@dup.test");
        gateway.insert(&mut first).await.expect("insert first");
        gateway.insert(&mut second).await.expect("insert second");

        assert_ne!(first.id, second.id);
        let found = gateway.find_by_vat(444555666).await.expect("find");
        assert_eq!(found, first);
    }

    #[tokio::test]
    async fn free_functions_accept_a_transaction_executor() {
        let pool = setup().await;

        let mut tx = pool.begin().await.expect("begin");
        let mut record = CustomerRecord::new(777888999, "Scoped Lda", "tx@scoped.test");
        super::insert(&mut *tx, &mut record).await.expect("insert in tx");
        let inside = super::find_by_vat(&mut *tx, 777888999).await.expect("find in tx");
        assert_eq!(inside, record);
        tx.rollback().await.expect("rollback");

        let after = super::find_by_vat(&pool, 777888999).await.expect_err("rolled back");
        assert!(after.is_not_found());
    }

    #[tokio::test]
    async fn inserting_a_persisted_record_creates_a_new_row() {
        let gateway = SqlCustomerGateway::new(setup().await);
        let mut record = CustomerRecord::new(121212121, "Twice", "twice@test.test");
        gateway.insert(&mut record).await.expect("first insert");
        let first_id = record.id;

        gateway.insert(&mut record).await.expect("second insert");

        assert!(record.id.is_some());
        assert_ne!(record.id, first_id);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Customer WHERE vat = ?")
            .bind(121212121_i32)
            .fetch_one(gateway.pool())
            .await
            .expect("count");
        assert_eq!(count, 2);
    }
}
