//! Single-file and recursive transfers across backends

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::entity::{Directory, File};
use crate::error::{Error, Result};
use crate::local::{io_error, write_atomically};
use crate::path;
use crate::resolver::Context;

/// Copy one file's content to another, on any backend pair
///
/// Local destinations are written through a temporary sibling, so a failed
/// copy never leaves a half-written file behind.
pub(crate) async fn copy_file(src: &File, dst: &File) -> Result<()> {
    match (src, dst) {
        (File::Local(src), File::Local(dst)) => {
            write_atomically(dst.as_path(), |partial| async move {
                tokio::fs::copy(src.as_path(), &partial)
                    .await
                    .map_err(|e| io_error(e, src.path()))?;
                Ok(())
            })
            .await?;
        }
        (File::Local(src), File::Object(dst)) => {
            if !src.exists().await? {
                return Err(Error::NotFound(src.path().to_string()));
            }
            dst.store()
                .upload_from_file(src.as_path(), dst.location())
                .await?;
        }
        (File::Object(src), File::Local(dst)) => {
            write_atomically(dst.as_path(), |partial| async move {
                src.store().download_to_file(src.location(), &partial).await?;
                Ok(())
            })
            .await?;
        }
        (File::Object(src), File::Object(dst)) => {
            dst.store()
                .copy_object(src.location(), dst.location())
                .await?;
        }
    }

    debug!(src = %src, dst = %dst, "Copied file");
    Ok(())
}

/// Copy `sources` below `dst_root`, keeping their paths relative to `src_root`
///
/// Up to `concurrency` files are copied at once. Every failure is collected;
/// if any file failed the call returns `Error::Transfer` naming each one.
/// An empty source list succeeds without doing anything.
pub(crate) async fn sync_files(
    sources: Vec<File>,
    src_root: &str,
    dst_root: &Directory,
    ctx: &Context,
) -> Result<usize> {
    let pairs = sources
        .into_iter()
        .map(|src| {
            let relative = path::relative_to(src_root, src.path())?;
            let dst = dst_root.join_as_file(&[relative])?;
            Ok((src, dst))
        })
        .collect::<Result<Vec<_>>>()?;

    let total = pairs.len();
    if total == 0 {
        debug!(src = src_root, dst = %dst_root, "Nothing to copy");
        return Ok(0);
    }

    let cancel = &ctx.cancel;
    let results = stream::iter(pairs)
        .map(|(src, dst)| async move {
            if cancel.is_cancelled() {
                return (src, Err(Error::Cancelled));
            }
            let result = copy_file(&src, &dst).await;
            (src, result)
        })
        .buffer_unordered(ctx.settings.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut failed: Vec<(String, String)> = results
        .into_iter()
        .filter_map(|(src, result)| result.err().map(|e| (src.path().to_string(), e.to_string())))
        .collect();

    if !failed.is_empty() {
        failed.sort();
        warn!(src = src_root, dst = %dst_root, total, failed = failed.len(), "Copy finished with failures");
        return Err(Error::Transfer { total, failed });
    }

    info!(src = src_root, dst = %dst_root, files = total, "Copied directory");
    Ok(total)
}
