//! Transfer engine
//!
//! Cross-backend copies, staged archive pipelines, and the staging
//! directories that bridge them.

mod archive;
pub mod staging;
mod sync;

pub(crate) use archive::archive_directory;
pub use staging::{NameSource, RandomNames, StagingArea, StagingDir};
pub(crate) use sync::{copy_file, sync_files};
