pub mod aggregate;
pub mod ledger;
pub mod session;
