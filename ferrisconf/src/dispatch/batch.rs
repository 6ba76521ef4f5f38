//! Bounded multi-host runs.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::Dispatcher;
use crate::error::{Error, FatalError, Result};
use crate::host::Host;
use crate::report::fail;

/// Outcome of one host in a batch.
#[derive(Debug)]
pub struct HostOutcome<T> {
    /// Host name.
    pub host: String,

    /// What the operation returned.
    pub outcome: Result<T>,
}

/// Counts of outcomes in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Hosts whose operation succeeded.
    pub succeeded: usize,

    /// Hosts that failed with a [`HostError`](crate::error::HostError).
    pub host_failures: usize,

    /// Hosts that failed with a [`FatalError`].
    pub fatal: usize,
}

impl BatchSummary {
    fn record<T>(&mut self, outcome: &Result<T>) {
        match outcome {
            Ok(_) => self.succeeded += 1,
            Err(Error::Host(_)) => self.host_failures += 1,
            Err(Error::Fatal(_)) => self.fatal += 1,
        }
    }
}

/// Per-host outcomes, in input order, plus their summary.
#[derive(Debug)]
pub struct BatchReport<T> {
    /// One entry per input host, in input order.
    pub outcomes: Vec<HostOutcome<T>>,

    /// Counts over `outcomes`.
    pub summary: BatchSummary,
}

impl Dispatcher {
    /// Run `op` for every host, at most `limit` at a time.
    ///
    /// `limit` is clamped to `1..=Semaphore::MAX_PERMITS`, so `usize::MAX`
    /// means unbounded.
    ///
    /// Each host gets its own task; one host failing (or panicking) never
    /// stops the others. A panicked task is reported and recorded as
    /// [`FatalError::Aborted`].
    ///
    /// ```rust,no_run
    /// use std::path::PathBuf;
    /// use std::sync::Arc;
    /// use ferrisconf::{Dispatcher, Host, SanitizationRules};
    ///
    /// # async fn example(hosts: Vec<Arc<Host>>) -> Result<(), ferrisconf::Error> {
    /// let dispatcher = Dispatcher::builder().build()?;
    /// let rules = Arc::new(SanitizationRules::new().remove("^ntp clock-period"));
    ///
    /// let report = dispatcher
    ///     .run_batch(hosts, 16, move |dispatcher, host| {
    ///         let rules = rules.clone();
    ///         async move {
    ///             let path = PathBuf::from("backups").join(format!("{}.cfg", host.name));
    ///             dispatcher.check_connectivity(&host).await?;
    ///             dispatcher.get_config(&host, &path, &rules).await
    ///         }
    ///     })
    ///     .await;
    ///
    /// println!("{:?}", report.summary);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_batch<T, F, Fut>(
        &self,
        hosts: Vec<Arc<Host>>,
        limit: usize,
        op: F,
    ) -> BatchReport<T>
    where
        T: Send + 'static,
        F: Fn(Dispatcher, Arc<Host>) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let permits = Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)));
        let names: Vec<String> = hosts.iter().map(|h| h.name.clone()).collect();

        let mut tasks = JoinSet::new();
        for (index, host) in hosts.into_iter().enumerate() {
            let permits = permits.clone();
            let work = op(self.clone(), host);
            tasks.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await;
                // Inner task so a panic is caught with its index still known.
                (index, tokio::spawn(work).await)
            });
        }

        let mut slots: Vec<Option<Result<T>>> = names.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let Ok((index, finished)) = joined else {
                continue;
            };
            slots[index] = Some(finished.unwrap_or_else(|e| {
                Err(fail(
                    self.reporter.as_ref(),
                    &names[index],
                    FatalError::Aborted(e.to_string()),
                ))
            }));
        }

        let mut summary = BatchSummary::default();
        let outcomes = names
            .into_iter()
            .zip(slots)
            .map(|(host, slot)| {
                let outcome = slot.unwrap_or_else(|| {
                    Err(fail(
                        self.reporter.as_ref(),
                        &host,
                        FatalError::Aborted("task cancelled".to_string()),
                    ))
                });
                summary.record(&outcome);
                HostOutcome { host, outcome }
            })
            .collect();

        BatchReport { outcomes, summary }
    }
}
