//! Intake DB Library
//!
//! Metadata store for persisted uploads: the [`FileRepository`] trait, its PostgreSQL
//! implementation, an in-memory implementation and the schema migrations.

pub mod db;

pub use db::{
    create_pool, run_migrations, FileRepository, InMemoryFileRepository, LookupField,
    PgFileRepository,
};
