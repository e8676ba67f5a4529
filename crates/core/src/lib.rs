//! ufs-core: one storage model over the local filesystem and object stores
//!
//! This crate provides:
//! - Configuration management
//! - Path parsing and the resolver that turns paths into entities
//! - `File`, `Directory` and `DirectoryPrefix` entities over both backends
//! - The `ObjectStore` trait and an in-memory implementation
//! - Batched deletes, cross-backend copies and archive pipelines
//!
//! This crate is independent of any specific S3 SDK; `ufs-s3` provides
//! the production `ObjectStore`.

pub mod archive;
pub mod checksum;
pub mod config;
pub mod entity;
pub mod error;
pub mod local;
pub mod memory;
pub mod object;
pub mod path;
pub mod resolver;
pub mod traits;
pub mod transfer;

pub use archive::ArchiveFormat;
pub use checksum::ChecksumAlgorithm;
pub use config::{Config, ConfigManager, S3Settings, StorageSettings};
pub use entity::{Directory, DirectoryPrefix, Entity, File, WriteMode};
pub use error::{BatchFailure, Error, Result};
pub use memory::MemoryStore;
pub use object::{DeleteReport, remove_many};
pub use path::{ObjectPath, Protocol, Role};
pub use resolver::Resolver;
pub use tokio_util::sync::CancellationToken;
pub use traits::{DeleteOutcome, KeyError, ListOptions, ListResult, ObjectInfo, ObjectStore};
pub use transfer::{NameSource, StagingArea, StagingDir};
