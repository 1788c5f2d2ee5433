// Application layer - the ledger service and its error type.
// Clients (the CLI today) go through LedgerService only; the balance and
// the category lists must never be written around it.

pub mod error;
mod service;

pub use error::*;
pub use service::*;
