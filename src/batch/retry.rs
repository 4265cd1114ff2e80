use std::time::{Duration, Instant};

use rand::Rng;

use crate::cancellation::CancellationToken;
use crate::error::{TableError, TableResult};

use super::types::BatchWriteItem;

const DEFAULT_BASE: Duration = Duration::from_millis(50);
const DEFAULT_CAP: Duration = Duration::from_secs(20);
const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Exponential-backoff-with-full-jitter parameters for the batch retry
/// helper in front of `BatchWriteItem`/`BatchGetItem`.
///
/// At least one of `max_retries` or `overall_timeout` must be set; this is
/// enforced by `retry_with_backoff`, not by the constructor, so the default
/// (neither set) can still be used as a builder base.
#[derive(Clone)]
pub struct BatchRetryOptions {
    pub max_retries: Option<u32>,
    pub overall_timeout: Option<Duration>,
    backoff: Option<std::sync::Arc<dyn Fn(u32) -> Duration + Send + Sync>>,
}

impl std::fmt::Debug for BatchRetryOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRetryOptions")
            .field("max_retries", &self.max_retries)
            .field("overall_timeout", &self.overall_timeout)
            .field("backoff", &self.backoff.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Default for BatchRetryOptions {
    fn default() -> Self {
        Self {
            max_retries: None,
            overall_timeout: None,
            backoff: None,
        }
    }
}

impl BatchRetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn with_overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }

    pub fn with_backoff(mut self, backoff: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        self.backoff = Some(std::sync::Arc::new(backoff));
        self
    }

    fn is_configured(&self) -> bool {
        self.max_retries.is_some() || self.overall_timeout.is_some()
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Some(f) => f(attempt),
            None => default_backoff(attempt),
        }
    }
}

/// `min(cap, base * multiplier^attempt)` with full jitter: a uniformly
/// random delay in `[0, capped)`.
fn default_backoff(attempt: u32) -> Duration {
    let exp = DEFAULT_MULTIPLIER.powi(attempt as i32);
    let scaled = DEFAULT_BASE.as_secs_f64() * exp;
    let capped = scaled.min(DEFAULT_CAP.as_secs_f64());
    let jittered = rand::thread_rng().gen_range(0.0..=capped);
    Duration::from_secs_f64(jittered)
}

/// Retries `attempt` (which returns the still-unprocessed items) with
/// exponential backoff and full jitter until the unprocessed set is empty,
/// `max_retries` is exhausted, `overall_timeout` elapses, or `token` is
/// cancelled.
pub fn retry_with_backoff<F>(
    options: &BatchRetryOptions,
    token: &CancellationToken,
    mut attempt: F,
) -> TableResult<Vec<BatchWriteItem>>
where
    F: FnMut(Vec<BatchWriteItem>) -> TableResult<Vec<BatchWriteItem>>,
{
    Ok(retry_loop(options, token, Vec::new(), &mut attempt)?)
}

/// Entry point used by the facade/batch coordinator: runs `items` through
/// `attempt` (a single batch-write call returning unprocessed items),
/// retrying the unprocessed remainder.
pub fn run_batch_write<F>(
    options: &BatchRetryOptions,
    token: &CancellationToken,
    items: Vec<BatchWriteItem>,
    mut attempt: F,
) -> TableResult<Vec<BatchWriteItem>>
where
    F: FnMut(Vec<BatchWriteItem>) -> TableResult<Vec<BatchWriteItem>>,
{
    retry_loop(options, token, items, &mut attempt)
}

fn retry_loop<F>(
    options: &BatchRetryOptions,
    token: &CancellationToken,
    mut pending: Vec<BatchWriteItem>,
    attempt: &mut F,
) -> TableResult<Vec<BatchWriteItem>>
where
    F: FnMut(Vec<BatchWriteItem>) -> TableResult<Vec<BatchWriteItem>>,
{
    if !options.is_configured() {
        return Err(TableError::validation(
            "BatchRetryOptions requires max_retries or overall_timeout to be set",
        ));
    }

    let deadline = options.overall_timeout.map(|t| Instant::now() + t);
    let mut retry_count = 0u32;

    loop {
        if pending.is_empty() {
            return Ok(pending);
        }
        pending = attempt(pending)?;
        if pending.is_empty() || token.is_cancelled() {
            return Ok(pending);
        }
        if let Some(max) = options.max_retries {
            if retry_count >= max {
                return Ok(pending);
            }
        }
        if let Some(d) = deadline {
            if Instant::now() >= d {
                return Ok(pending);
            }
        }

        let delay = options.delay_for_attempt(retry_count);
        tracing::debug!(
            retry_count,
            unprocessed = pending.len(),
            delay_ms = delay.as_millis() as u64,
            "retrying unprocessed batch items"
        );
        std::thread::sleep(delay);
        retry_count += 1;

        if token.is_cancelled() {
            tracing::warn!(retry_count, "batch retry cancelled via token");
            return Ok(pending);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Item;

    fn items(n: usize) -> Vec<BatchWriteItem> {
        (0..n)
            .map(|i| BatchWriteItem::put(Item::new().with_s("pk", format!("item{i}"))))
            .collect()
    }

    #[test]
    fn requires_max_retries_or_timeout() {
        let options = BatchRetryOptions::new();
        let token = CancellationToken::new();
        let result = retry_with_backoff(&options, &token, |pending| Ok(pending));
        assert!(result.is_err());
    }

    #[test]
    fn retries_until_all_processed() {
        let options = BatchRetryOptions::new()
            .with_max_retries(5)
            .with_backoff(|_| Duration::from_millis(0));
        let token = CancellationToken::new();

        let mut call = 0;
        let result = run_batch_write(&options, &token, items(5), |pending| {
            call += 1;
            // first call processes everything but 2 items, second call finishes
            if call == 1 {
                Ok(pending.into_iter().take(2).collect())
            } else {
                Ok(Vec::new())
            }
        })
        .unwrap();

        assert!(result.is_empty());
        assert_eq!(call, 2);
    }

    #[test]
    fn stops_after_max_retries_with_items_remaining() {
        let options = BatchRetryOptions::new()
            .with_max_retries(2)
            .with_backoff(|_| Duration::from_millis(0));
        let token = CancellationToken::new();

        let result =
            run_batch_write(&options, &token, items(3), |pending| Ok(pending)).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn honors_cancellation() {
        let options = BatchRetryOptions::new()
            .with_max_retries(10)
            .with_backoff(|_| Duration::from_millis(0));
        let token = CancellationToken::new();
        token.cancel();

        let result = run_batch_write(&options, &token, items(3), |pending| Ok(pending)).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn default_backoff_is_bounded_by_cap() {
        for attempt in 0..10 {
            let d = default_backoff(attempt);
            assert!(d <= DEFAULT_CAP);
        }
    }
}
