pub mod chat;
pub mod config;
pub mod recommend;
pub mod stats;
