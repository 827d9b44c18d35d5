//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL and the additive column migration list
//! - `sqlite.rs`: pool construction and the administrator store

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbAdministrator, NewAdministrator};
pub use schema::SQLITE_INIT;
pub use sqlite::{AdminStorage, SqlitePool};
