//! Concurrent fan-out of block fetches with first-error cancellation.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_rpc_types::BlockNumberOrTag;
use tokio::task::JoinSet;
use tracing::debug;

use crate::block::{BlockRecord, BlockSource};
use crate::errors::{EntropyError, Result};

/// Distinct fetched blocks keyed by height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    blocks: BTreeMap<u64, BlockRecord>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a block, keyed by the height it reports. Returns `false` if that
    /// height was already present.
    pub fn insert(&mut self, record: BlockRecord) -> Result<bool> {
        let height = record.height()?;
        Ok(self.blocks.insert(height, record).is_none())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn contains(&self, height: u64) -> bool {
        self.blocks.contains_key(&height)
    }

    pub fn get(&self, height: u64) -> Option<&BlockRecord> {
        self.blocks.get(&height)
    }

    pub fn heights(&self) -> impl Iterator<Item = u64> + '_ {
        self.blocks.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &BlockRecord> {
        self.blocks.values()
    }
}

/// Fetch every height concurrently, one task per height.
///
/// The first failure aborts the remaining fetches and is returned; blocks
/// already received are discarded. Completion order does not affect the
/// result since blocks are keyed by the height they report.
pub async fn fetch_many<S>(source: Arc<S>, heights: &[u64]) -> Result<SampleSet>
where
    S: BlockSource + Send + Sync + ?Sized + 'static,
{
    let mut tasks = JoinSet::new();
    for &height in heights {
        let source = Arc::clone(&source);
        tasks.spawn(async move {
            source
                .fetch_block(BlockNumberOrTag::Number(height))
                .await
        });
    }

    let mut samples = SampleSet::new();
    while let Some(joined) = tasks.join_next().await {
        let record = match joined {
            Ok(Ok(record)) => record,
            Ok(Err(err)) => {
                tasks.abort_all();
                return Err(err);
            }
            Err(join_err) => {
                tasks.abort_all();
                return Err(EntropyError::Fetch(format!("fetch task failed: {join_err}")));
            }
        };

        if !samples.insert(record)? {
            debug!("duplicate height in sample, keeping one block");
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MockBlockSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn block_at(height: u64) -> BlockRecord {
        BlockRecord::new(format!("{height:#x}"), format!("{:#066x}", height + 1))
    }

    fn height_of(tag: BlockNumberOrTag) -> u64 {
        match tag {
            BlockNumberOrTag::Number(n) => n,
            other => panic!("unexpected tag {other:?}"),
        }
    }

    /// Answers each height after a height-specific delay, failing on one of them.
    struct ScriptedSource {
        fail_at: Option<u64>,
        delay_ms: fn(u64) -> u64,
        completed: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(fail_at: Option<u64>, delay_ms: fn(u64) -> u64) -> Self {
            Self {
                fail_at,
                delay_ms,
                completed: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl BlockSource for ScriptedSource {
        async fn fetch_block(&self, tag: BlockNumberOrTag) -> Result<BlockRecord> {
            let height = height_of(tag);
            tokio::time::sleep(Duration::from_millis((self.delay_ms)(height))).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            if self.fail_at == Some(height) {
                return Err(EntropyError::Fetch(format!("induced failure at {height}")));
            }
            Ok(block_at(height))
        }
    }

    #[tokio::test]
    async fn test_fetch_many_collects_distinct_heights() {
        let mut source = MockBlockSource::new();
        source
            .expect_fetch_block()
            .times(4)
            .returning(|tag| Ok(block_at(height_of(tag))));

        let samples = fetch_many(Arc::new(source), &[3, 7, 7, 42]).await.unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples.heights().collect::<Vec<_>>(), vec![3, 7, 42]);
        assert_eq!(samples.get(7).unwrap().hash, format!("{:#066x}", 8));
    }

    #[tokio::test]
    async fn test_fetch_many_ignores_completion_order() {
        let heights = [1, 2, 3, 4, 5, 6];
        let forward = fetch_many(Arc::new(ScriptedSource::new(None, |h| h * 5)), &heights)
            .await
            .unwrap();
        let backward = fetch_many(
            Arc::new(ScriptedSource::new(None, |h| 30 - h * 5)),
            &heights,
        )
        .await
        .unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.len(), heights.len());
    }

    #[tokio::test]
    async fn test_fetch_many_fails_fast_on_late_error() {
        // Every other fetch completes before the failing one.
        let source = ScriptedSource::new(Some(4), |h| if h == 4 { 50 } else { 1 });
        let err = fetch_many(Arc::new(source), &[1, 2, 3, 4, 5])
            .await
            .unwrap_err();

        assert!(matches!(err, EntropyError::Fetch(_)));
        assert!(err.to_string().contains("induced failure at 4"));
    }

    #[tokio::test]
    async fn test_fetch_many_cancels_in_flight_fetches() {
        // The failing fetch finishes first; the slow ones must not run to completion.
        let source = Arc::new(ScriptedSource::new(Some(1), |h| if h == 1 { 0 } else { 500 }));
        let err = fetch_many(Arc::clone(&source), &[1, 2, 3, 4])
            .await
            .unwrap_err();
        assert!(matches!(err, EntropyError::Fetch(_)));

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(source.completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_many_rejects_malformed_number() {
        let mut source = MockBlockSource::new();
        source
            .expect_fetch_block()
            .returning(|_| Ok(BlockRecord::new("not-a-number", "0x01")));

        let err = fetch_many(Arc::new(source), &[9]).await.unwrap_err();
        assert!(matches!(err, EntropyError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fetch_many_empty_batch() {
        let source = MockBlockSource::new();
        let samples = fetch_many(Arc::new(source), &[]).await.unwrap();
        assert!(samples.is_empty());
    }
}
