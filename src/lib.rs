pub mod backend;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod notify;
pub mod provider;
pub mod state;
pub mod upload;
