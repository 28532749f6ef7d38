//! Generic poll-until-condition loop.
//!
//! Every waiter in this crate is built on [`poll_until`]: fetch, classify,
//! sleep, repeat until the classification is terminal or the time budget is
//! spent. The first fetch always happens, even with a zero timeout, and the
//! loop never sleeps after its final attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use cloudcafe_clients::ClientError;
use cloudcafe_types::WireStatus;
use thiserror::Error;
use tokio::time::Instant;

/// Time budget for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub timeout: Duration,
    pub interval: Duration,
    /// Keep polling through fetch errors instead of aborting on the first.
    pub tolerate_fetch_errors: bool,
}

impl PollConfig {
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            tolerate_fetch_errors: false,
        }
    }

    /// Both values in whole seconds, as the config file stores them.
    #[must_use]
    pub const fn from_secs(timeout: u64, interval: u64) -> Self {
        Self::new(Duration::from_secs(timeout), Duration::from_secs(interval))
    }

    #[must_use]
    pub const fn tolerating_fetch_errors(mut self) -> Self {
        self.tolerate_fetch_errors = true;
        self
    }
}

/// Classification of one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Done,
    Pending,
    Failed(String),
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error(
        "timed out after {elapsed:?} and {attempts} attempts{}",
        describe_last(.last_observed.as_deref())
    )]
    Timeout {
        attempts: u32,
        elapsed: Duration,
        last_observed: Option<String>,
    },
    #[error("wait failed after {attempts} attempts: {reason}")]
    Failed {
        reason: String,
        attempts: u32,
        elapsed: Duration,
    },
    #[error("fetch failed after {attempts} attempts: {source}")]
    Fetch {
        #[source]
        source: ClientError,
        attempts: u32,
        elapsed: Duration,
    },
}

fn describe_last(last: Option<&str>) -> String {
    last.map(|value| format!(" (last observed: {value})"))
        .unwrap_or_default()
}

impl WaitError {
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::Fetch { attempts, .. } => *attempts,
        }
    }

    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Timeout { elapsed, .. }
            | Self::Failed { elapsed, .. }
            | Self::Fetch { elapsed, .. } => *elapsed,
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Poll `fetch` until `check` returns [`Check::Done`] or [`Check::Failed`],
/// or `config.timeout` elapses. Returns the value that satisfied `check`.
pub async fn poll_until<T, F, Fut, C>(
    mut fetch: F,
    mut check: C,
    config: PollConfig,
) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
    C: FnMut(&T) -> Check,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;
    let mut last_observed = None;

    loop {
        attempts = attempts.saturating_add(1);
        match fetch().await {
            Ok(value) => match check(&value) {
                Check::Done => {
                    tracing::debug!(
                        attempts,
                        elapsed_ms = started.elapsed().as_millis(),
                        "Wait complete"
                    );
                    return Ok(value);
                }
                Check::Failed(reason) => {
                    return Err(WaitError::Failed {
                        reason,
                        attempts,
                        elapsed: started.elapsed(),
                    });
                }
                Check::Pending => {}
            },
            Err(err) if config.tolerate_fetch_errors => {
                tracing::debug!(attempts, error = %err, "Ignoring fetch error while polling");
                last_observed = Some(err.to_string());
            }
            Err(source) => {
                return Err(WaitError::Fetch {
                    source,
                    attempts,
                    elapsed: started.elapsed(),
                });
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= config.timeout {
            return Err(WaitError::Timeout {
                attempts,
                elapsed,
                last_observed,
            });
        }
        tokio::time::sleep(config.interval.min(config.timeout - elapsed)).await;
    }
}

/// What a status wait accepts.
///
/// `target` ends the wait. Any status in `errors`, or any status that
/// reports [`WireStatus::is_error`], fails it. When `transient` is set, a
/// status outside `transient` is also a failure, which turns the wait into a
/// check of the whole status progression.
#[derive(Debug, Clone)]
pub struct StatusExpectation<S> {
    pub target: S,
    pub errors: Vec<S>,
    pub transient: Option<Vec<S>>,
}

impl<S: WireStatus> StatusExpectation<S> {
    #[must_use]
    pub fn new(target: S) -> Self {
        Self {
            target,
            errors: Vec::new(),
            transient: None,
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = S>) -> Self {
        self.errors.extend(errors);
        self
    }

    #[must_use]
    pub fn allowing(mut self, transient: impl IntoIterator<Item = S>) -> Self {
        self.transient
            .get_or_insert_with(Vec::new)
            .extend(transient);
        self
    }

    #[must_use]
    pub fn check(&self, status: &S) -> Check {
        if *status == self.target {
            return Check::Done;
        }
        if status.is_error() || self.errors.contains(status) {
            return Check::Failed(format!(
                "entered error status `{status}` while waiting for `{}`",
                self.target
            ));
        }
        if let Some(transient) = &self.transient
            && !transient.contains(status)
        {
            return Check::Failed(format!(
                "unexpected status `{status}` while waiting for `{}`",
                self.target
            ));
        }
        Check::Pending
    }
}

impl<S: fmt::Display> fmt::Display for StatusExpectation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status `{}`", self.target)
    }
}

/// Poll `fetch` until `status_of` reports the expected status.
///
/// A timeout reports the last status seen.
pub async fn wait_for_status<T, S, F, Fut, G>(
    fetch: F,
    status_of: G,
    expectation: &StatusExpectation<S>,
    config: PollConfig,
) -> Result<T, WaitError>
where
    S: WireStatus,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
    G: Fn(&T) -> S,
{
    tracing::info!(
        target_status = %expectation.target,
        timeout_s = config.timeout.as_secs(),
        "Waiting for status"
    );
    let mut last_status: Option<S> = None;
    let result = poll_until(
        fetch,
        |value| {
            let status = status_of(value);
            let verdict = expectation.check(&status);
            last_status = Some(status);
            verdict
        },
        config,
    )
    .await;

    match result {
        Err(WaitError::Timeout {
            attempts,
            elapsed,
            last_observed,
        }) => Err(WaitError::Timeout {
            attempts,
            elapsed,
            last_observed: last_status.map(|s| s.to_string()).or(last_observed),
        }),
        other => other,
    }
}

/// Poll `fetch` until it fails with 404.
pub async fn wait_for_deletion<T, F, Fut>(fetch: F, config: PollConfig) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    wait_for_deletion_checked(fetch, |_| Check::Pending, config).await
}

/// [`wait_for_deletion`] that lets `check` fail fast on what is still
/// returned, e.g. a resource stuck in an error state.
pub async fn wait_for_deletion_checked<T, F, Fut, C>(
    mut fetch: F,
    mut check: C,
    config: PollConfig,
) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
    C: FnMut(&T) -> Check,
{
    poll_until(
        || {
            let pending = fetch();
            async move {
                match pending.await {
                    Ok(value) => Ok(Some(value)),
                    Err(err) if err.is_not_found() => Ok(None),
                    Err(err) => Err(err),
                }
            }
        },
        |observed| match observed {
            None => Check::Done,
            Some(value) => match check(value) {
                // Still present, so the resource is not gone yet.
                Check::Done => Check::Pending,
                other => other,
            },
        },
        config,
    )
    .await
    .map(|_| ())
}
