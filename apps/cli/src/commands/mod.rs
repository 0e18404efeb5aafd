//! # CLI Commands Module
//!
//! One file per top-level subcommand.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch)
//! ├── product.rs   ◄─── Catalog add / list / restock
//! ├── customer.rs  ◄─── Customer add / list / show (history + spend)
//! ├── order.rs     ◄─── Place / pay / cancel / show / list
//! └── account.rs   ◄─── Account deletion
//! ```
//!
//! Each command takes the open [`Database`] and its parsed arguments, and
//! returns an [`Output`] or a [`CliError`](crate::error::CliError).

pub mod account;
pub mod customer;
pub mod order;
pub mod product;

use emporium_db::Database;

use crate::args::Command;
use crate::error::CliResult;
use crate::output::Output;

/// Runs one parsed command against the database.
pub async fn dispatch(db: &Database, command: Command) -> CliResult<Output> {
    match command {
        Command::Product(cmd) => product::run(db, cmd).await,
        Command::Customer(cmd) => customer::run(db, cmd).await,
        Command::Order(cmd) => order::run(db, cmd).await,
        Command::Account(cmd) => account::run(db, cmd).await,
    }
}
