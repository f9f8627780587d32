//! MongoDB identifier sources for the id-diff engine.
//!
//! Connects to MongoDB endpoints (full URIs or bare `host:port`), reads the
//! `_id` index of a collection in either direction and converts the values
//! into [`id_diff::IdValue`]s. Also compares `dbHash` results of a database
//! across endpoints.

pub mod args;
pub mod connect;
pub mod convert;
pub mod cursor;
pub mod dbhash;
pub mod error;
pub mod namespace;

pub use args::MongoConnectArgs;
pub use connect::{connect, ConnectOptions, Credentials, Endpoint, MongoEndpoint, DEFAULT_AUTH_DB};
pub use convert::{id_from_bson, id_from_document};
pub use cursor::{MongoIdCursor, MongoIdSource};
pub use dbhash::{compare_hashes, fetch_db_hashes, format_table, CollectionHashes, DbHashes};
pub use error::{classify, NamespaceError};
pub use namespace::Namespace;
