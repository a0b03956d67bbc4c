pub mod client;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod session;
