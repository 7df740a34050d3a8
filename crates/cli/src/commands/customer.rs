use crate::commands::{with_pool, CommandResult};
use vatbook_core::config::LoadOptions;
use vatbook_core::domain::customer::CustomerRecord;
use vatbook_db::{CustomerGateway, SqlCustomerGateway};

pub fn insert(
    options: LoadOptions,
    vat: i32,
    denomination: String,
    email: String,
) -> CommandResult {
    with_pool("customer.insert", options, |pool| async move {
        let gateway = SqlCustomerGateway::new(pool);
        let mut record = CustomerRecord::new(vat, denomination, email);
        gateway.insert(&mut record).await?;
        Ok(CommandResult::customer("customer.insert", "customer inserted", record))
    })
}

pub fn find(options: LoadOptions, vat: i32) -> CommandResult {
    with_pool("customer.find", options, |pool| async move {
        let record = SqlCustomerGateway::new(pool).find_by_vat(vat).await?;
        Ok(CommandResult::customer("customer.find", "customer found", record))
    })
}
