pub mod database;
pub mod env;
pub mod jwt;
pub mod ledger;
pub mod rate_limit;
