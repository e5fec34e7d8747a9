pub mod counters;
pub mod init;
pub mod schema;
