//! # Account Commands
//!
//! Account deletion removes the customer together with every order, line
//! and payment they own. Stock is not restored.

use serde::Serialize;

use crate::args::AccountCommand;
use crate::error::{CliError, CliResult, ErrorCode};
use crate::output::Output;
use emporium_db::Database;

#[derive(Debug, Clone, Serialize)]
pub struct AccountDeletedDto {
    pub customer_id: String,
    pub orders_deleted: u64,
}

pub async fn run(db: &Database, command: AccountCommand) -> CliResult<Output> {
    match command {
        AccountCommand::Delete { customer_id, yes } => delete(db, &customer_id, yes).await,
    }
}

async fn delete(db: &Database, customer_id: &str, confirmed: bool) -> CliResult<Output> {
    if !confirmed {
        return Err(CliError::new(
            ErrorCode::ConfirmationRequired,
            format!(
                "Deleting account {} removes all of its orders and payments. Re-run with --yes.",
                customer_id
            ),
        ));
    }

    let orders_deleted = db.fulfillment().delete_account(customer_id).await?;

    let dto = AccountDeletedDto {
        customer_id: customer_id.to_string(),
        orders_deleted,
    };
    let text = format!(
        "Deleted account {} and {} order(s)",
        dto.customer_id, dto.orders_deleted
    );
    Output::new(&dto, text)
}
