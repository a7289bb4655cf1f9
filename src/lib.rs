pub mod chat;
pub mod config;
pub mod domain;
pub mod http;
pub mod id;
pub mod polls;
pub mod state;
pub mod version;
