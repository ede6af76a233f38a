pub mod args;
pub mod chat;
pub mod commands;
mod config;
mod db;
mod error;
pub mod model;
pub mod period;
pub mod report;
pub mod session;
mod store;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use db::Db;
pub use error::{Error, ErrorType, Result};
pub use store::EntryStore;
