//! # Database Operations
//!
//! The order repository contract and its PostgreSQL implementation.
//!
//! ## Key Components
//!
//! - [`repository`] - The [`OrderRepository`] trait every pipeline component talks to
//! - [`pg_repository`] - SQLx implementation over the order tables and stored routines
//! - [`connection`] - Pool construction from [`crate::config::DatabaseConfig`]

pub mod connection;
pub mod pg_repository;
pub mod repository;

pub use connection::DatabaseConnection;
pub use pg_repository::PgOrderRepository;
pub use repository::OrderRepository;
