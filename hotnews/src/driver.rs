use chrono::{Local, NaiveDate};
use common::FeedSource;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::blocks::{self, DisplayBlock};
use crate::pipeline::SourcePipeline;

/// Fans source pipelines out onto tasks and concatenates their blocks in source order.
pub struct AggregationDriver {
    pipeline: Arc<SourcePipeline>,
    source_timeout: Duration,
    as_of: NaiveDate,
}

impl AggregationDriver {
    pub fn new(pipeline: SourcePipeline, source_timeout: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            source_timeout,
            as_of: Local::now().date_naive(),
        }
    }

    /// Date printed in every source header
    pub fn with_date(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Run every source concurrently and join them in the order given.
    ///
    /// A source whose task panics or outlives `source_timeout` contributes no blocks.
    pub async fn run(&self, sources: &[FeedSource]) -> Vec<DisplayBlock> {
        let handles: Vec<_> = sources
            .iter()
            .cloned()
            .map(|source| {
                let pipeline = Arc::clone(&self.pipeline);
                let as_of = self.as_of;
                let key = source.key.clone();
                let handle = tokio::spawn(async move {
                    let items = pipeline.build(&source).await;
                    debug!("=====> {}: {:?}", source.key, items);
                    blocks::render(&source.display_name, &items, as_of)
                });
                (key, handle)
            })
            .collect();

        let mut all_blocks = Vec::new();
        for (key, handle) in handles {
            let abort = handle.abort_handle();
            match tokio::time::timeout(self.source_timeout, handle).await {
                Ok(Ok(source_blocks)) => {
                    info!("source {} rendered {} blocks", key, source_blocks.len());
                    all_blocks.extend(source_blocks);
                }
                Ok(Err(join_err)) => {
                    error!("source {} pipeline failed: {}", key, join_err);
                }
                Err(_) => {
                    abort.abort();
                    error!("source {} timed out after {:?}, skipping", key, self.source_timeout);
                }
            }
        }
        all_blocks
    }
}
