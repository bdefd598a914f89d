use crate::core::{Pipeline, RawRecord, StoreReport};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Counters of one completed feed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub name: String,
    pub records_read: usize,
    pub rejected: usize,
    pub stored: StoreReport,
    pub batches: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: read {}, stored {} ({} new, {} replaced), rejected {} in {:?}",
            self.name,
            self.records_read,
            self.stored.total(),
            self.stored.inserted,
            self.stored.updated,
            self.rejected,
            self.elapsed
        )
    }
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    batch_size: usize,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            batch_size: DEFAULT_BATCH_SIZE,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Streams the whole feed through transform and load, one batch at a time.
    pub async fn run(&self) -> Result<RunSummary> {
        let name = self.pipeline.name();
        let started_at = Utc::now();
        let start = Instant::now();
        tracing::info!("Starting ETL for {}", name);

        let mut summary = RunSummary {
            name,
            records_read: 0,
            rejected: 0,
            stored: StoreReport::default(),
            batches: 0,
            started_at,
            elapsed: Duration::ZERO,
        };

        let records = self.pipeline.extract()?;
        self.monitor.log_stats("Extract started");

        let mut batch: Vec<RawRecord> = Vec::with_capacity(self.batch_size);
        for record in records {
            batch.push(record?);
            if batch.len() >= self.batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                self.process_batch(full, &mut summary).await?;
            }
        }
        if !batch.is_empty() {
            self.process_batch(batch, &mut summary).await?;
        }

        summary.elapsed = start.elapsed();
        self.monitor.log_final_stats();
        tracing::info!("{}", summary);
        Ok(summary)
    }

    async fn process_batch(&self, batch: Vec<RawRecord>, summary: &mut RunSummary) -> Result<()> {
        summary.records_read += batch.len();
        summary.batches += 1;

        let transformed = self.pipeline.transform(batch)?;
        summary.rejected += transformed.rejected;

        let report = self.pipeline.load(transformed).await?;
        summary.stored += report;

        tracing::debug!(
            "Batch {} done, {} records read so far",
            summary.batches,
            summary.records_read
        );
        self.monitor.log_stats(&format!("Batch {}", summary.batches));
        Ok(())
    }
}
