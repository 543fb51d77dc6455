// src/lib.rs
pub mod body;
pub mod check;
pub mod condition;
pub mod endpoint;
pub mod probes;
pub mod route;
pub mod server;
pub mod status;
