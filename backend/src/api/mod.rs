//! HTTP surface: server, wire types, and progress log streaming.

pub mod logs;
pub mod server;
pub mod types;
