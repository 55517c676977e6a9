pub mod app;
pub mod autosave;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod confirm;
mod error;
pub mod models;
pub mod mutators;
pub mod photo;
pub mod router;
pub mod sanitize;
pub mod shell;
pub mod storage;
pub mod store;
pub mod transfer;

pub use error::{Error, Result};
