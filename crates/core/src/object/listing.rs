//! Paginated enumeration
//!
//! Results keep the order the store returns them in. S3-compatible stores
//! list keys in lexicographic order, so no local sort is applied.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::path::{ObjectPath, SEPARATOR};
use crate::traits::{ListOptions, ObjectInfo, ObjectStore};

/// List the objects whose keys start with `prefix.key`
///
/// Pages are requested until the store reports no more, or until a positive
/// `limit` is reached, in which case the last page is truncated and no
/// further page is requested. Without `recursive` the listing is delimited
/// at `/` and grouped sub-prefixes are skipped. Zero-byte directory marker
/// keys (ending in `/`) are never reported as files.
pub(crate) async fn list_objects(
    store: &dyn ObjectStore,
    prefix: &ObjectPath,
    recursive: bool,
    limit: Option<usize>,
    page_size: i32,
    cancel: &CancellationToken,
) -> Result<Vec<ObjectInfo>> {
    let limit = limit.filter(|&n| n > 0);
    let mut items = Vec::new();
    let mut continuation_token = None;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let max_keys = match limit {
            Some(limit) => {
                let remaining = i32::try_from(limit - items.len()).unwrap_or(i32::MAX);
                page_size.min(remaining)
            }
            None => page_size,
        };
        let options = ListOptions {
            prefix: prefix.key.clone(),
            delimiter: (!recursive).then(|| SEPARATOR.to_string()),
            max_keys: Some(max_keys),
            continuation_token: continuation_token.take(),
        };

        let page = store.list_objects(&prefix.bucket, options).await?;
        debug!(
            bucket = %prefix.bucket,
            prefix = %prefix.key,
            returned = page.items.len(),
            truncated = page.truncated,
            "Listed page"
        );

        for item in page.items {
            if item.is_dir || item.key.ends_with(SEPARATOR) {
                continue;
            }
            items.push(item);
            if limit.is_some_and(|limit| items.len() >= limit) {
                return Ok(items);
            }
        }

        match page.continuation_token {
            Some(token) if page.truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    Ok(items)
}
