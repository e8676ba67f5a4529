//! Batched bulk delete
//!
//! Deletion is best-effort, not transactional: keys are split into
//! fixed-size batches, each batch is one bulk-delete request, and a failed
//! batch is recorded without stopping the others. Callers get a
//! [`DeleteReport`] naming every batch that did not fully succeed.

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{MAX_DELETE_BATCH, StorageSettings};
use crate::error::{BatchFailure, Error, Result};
use crate::traits::ObjectStore;

/// Outcome of a batched delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Number of batch requests issued
    pub batches: usize,
    /// Keys the store confirmed as deleted
    pub deleted: Vec<String>,
    /// Batches with at least one key left behind, in submission order
    pub failures: Vec<BatchFailure>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Deleted keys, or `Error::PartialDelete` if any batch failed
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.failures.is_empty() {
            Ok(self.deleted)
        } else {
            Err(Error::PartialDelete {
                total_batches: self.batches,
                failures: self.failures,
            })
        }
    }
}

/// Delete `keys` from `bucket` in batches of `settings.delete_batch_size`
///
/// Up to `settings.concurrency` batches are in flight at once. Once `cancel`
/// fires no further batch is sent and the call returns `Error::Cancelled`,
/// discarding the results of batches already in flight.
pub async fn remove_many(
    store: &dyn ObjectStore,
    bucket: &str,
    keys: Vec<String>,
    settings: &StorageSettings,
    cancel: &CancellationToken,
) -> Result<DeleteReport> {
    if keys.is_empty() {
        return Ok(DeleteReport::default());
    }

    let batch_size = settings.delete_batch_size.clamp(1, MAX_DELETE_BATCH);
    let batches: Vec<Vec<String>> = keys.chunks(batch_size).map(<[String]>::to_vec).collect();
    let total = batches.len();
    debug!(bucket, keys = keys.len(), batches = total, "Deleting in batches");

    let results = stream::iter(batches.into_iter().enumerate())
        .map(|(index, batch)| async move {
            if cancel.is_cancelled() {
                return (index, batch, Err(Error::Cancelled));
            }
            let outcome = store.delete_objects(bucket, batch.clone()).await;
            (index, batch, outcome)
        })
        .buffer_unordered(settings.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut report = DeleteReport {
        batches: total,
        ..Default::default()
    };
    for (index, batch, outcome) in results {
        match outcome {
            Ok(outcome) => {
                report.deleted.extend(outcome.deleted);
                if let Some(first) = outcome.errors.first() {
                    let reason = first
                        .code
                        .clone()
                        .or_else(|| first.message.clone())
                        .unwrap_or_else(|| "unknown error".to_string());
                    warn!(bucket, batch = index, failed = outcome.errors.len(), %reason, "Batch partially failed");
                    report.failures.push(BatchFailure {
                        batch: index,
                        keys: outcome.errors.into_iter().map(|e| e.key).collect(),
                        reason,
                    });
                }
            }
            Err(e) => {
                warn!(bucket, batch = index, keys = batch.len(), error = %e, "Batch failed");
                report.failures.push(BatchFailure {
                    batch: index,
                    keys: batch,
                    reason: e.to_string(),
                });
            }
        }
    }
    report.failures.sort_by_key(|f| f.batch);

    info!(
        bucket,
        deleted = report.deleted.len(),
        failed_batches = report.failures.len(),
        "Batched delete finished"
    );
    Ok(report)
}
