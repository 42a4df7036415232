pub mod api;
pub mod charts;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod server;
pub mod types;
pub mod view;
