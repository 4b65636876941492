//! Database bootstrap for the district record cache

pub mod init;

pub use init::{create_schema, init_database};
