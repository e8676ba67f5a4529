//! Archive pipeline
//!
//! A local source is encoded in place. Any other combination goes through a
//! staging directory: an object-store source is first downloaded into it,
//! the archive is encoded there, then moved or uploaded to the destination.
//! The staging directory is released on every exit path.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::archive::{self, ArchiveFormat};
use crate::entity::{Directory, File};
use crate::error::Result;
use crate::local::{LocalDirectory, run_blocking, walk, write_atomically};

pub(crate) async fn archive_directory(
    src: &Directory,
    dst: &File,
    format: ArchiveFormat,
) -> Result<usize> {
    format.validate_destination(dst.path())?;
    let ctx = src.context();
    ctx.ensure_active()?;

    let entries = match (src, dst) {
        (Directory::Local(local), File::Local(out)) => {
            encode_to(local.as_path().to_path_buf(), out.as_path(), format).await?
        }
        _ => {
            let stage = ctx.staging.acquire().await?;
            let result = staged(src, dst, format, stage.path()).await;
            let released = stage.release().await;
            let entries = result?;
            released?;
            entries
        }
    };

    info!(src = %src, dst = %dst, %format, entries, "Archived directory");
    Ok(entries)
}

async fn staged(src: &Directory, dst: &File, format: ArchiveFormat, stage: &Path) -> Result<usize> {
    let ctx = src.context();
    let tree = match src {
        Directory::Local(local) => local.as_path().to_path_buf(),
        Directory::Object(_) => {
            let tree = stage.join("tree");
            let root = format!("{}/", walk::path_string(tree.clone())?);
            let staged = Directory::Local(LocalDirectory::new(root, ctx.clone()));
            src.duplicate(&staged, true).await?;
            tree
        }
    };

    let encoded = stage.join(format!("archive{}", format.extension()));
    let entries = {
        let encoded = encoded.clone();
        run_blocking(move || archive::encode_directory(&tree, &encoded, format)).await?
    };
    ctx.ensure_active()?;

    match dst {
        File::Local(out) => {
            write_atomically(out.as_path(), |partial| async move {
                tokio::fs::copy(&encoded, &partial).await?;
                Ok(())
            })
            .await?;
        }
        File::Object(out) => {
            out.store()
                .upload_from_file(&encoded, out.location())
                .await?;
        }
    }
    Ok(entries)
}

async fn encode_to(tree: PathBuf, dst: &Path, format: ArchiveFormat) -> Result<usize> {
    write_atomically(dst, |partial| async move {
        run_blocking(move || archive::encode_directory(&tree, &partial, format)).await
    })
    .await
}
