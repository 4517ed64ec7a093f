//! # BoviTrack Database Crate
//!
//! The PostgreSQL persistence layer for farms, animals, their weight and
//! veterinary histories, signed-in users, and the Spanish-surface `fincas`
//! and `usuarios` tables.
//!
//! ## Public API
//!
//! - `Database`: the connection-pool gateway. Built once with
//!   [`Database::connect`] and shared by cloning. Offers parameterized
//!   `query`/`execute`, scoped `transaction`s, `run_migrations` and `close`.
//! - `DbRepository`: the entity-level data access methods, grouped per table.
//! - `DbError`: the error type of every fallible call in this crate.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{Database, SqlParam};
pub use error::DbError;
pub use repository::{DbRepository, FincaWithCount};
