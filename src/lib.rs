pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod server;
pub mod service;
pub mod startup;

pub use config::{Config, Secret};
pub use error::{NotebookError, StartupError};
