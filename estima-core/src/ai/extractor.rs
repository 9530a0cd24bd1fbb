//! Requirement extraction pipeline
//!
//! One call lists the requirement titles in a need document, then a fixed
//! pool of workers describes the titles concurrently. Each item is retried
//! with doubling backoff; a failed item is reported without aborting the
//! batch.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::ai::client::{AiClient, AiError};
use crate::models::Need;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Number of concurrent description calls
    pub workers: usize,
    /// Attempts per title before giving up on it
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt
    pub initial_backoff: Duration,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// A requirement successfully extracted from a need document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRequirement {
    pub title: String,
    pub body: String,
}

/// The per-title result of an extraction run, in input order
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub title: String,
    pub body: Result<String, AiError>,
}

impl ExtractionOutcome {
    /// The extracted requirement, when the description call succeeded
    pub fn ok(&self) -> Option<ExtractedRequirement> {
        self.body.as_ref().ok().map(|body| ExtractedRequirement {
            title: self.title.clone(),
            body: body.clone(),
        })
    }
}

/// Extracts candidate requirements from a need's document body.
///
/// Fails only when the initial title listing fails; per-title description
/// failures are reported in the outcomes.
pub fn extract_requirements(
    client: &AiClient,
    need: &Need,
    config: &ExtractionConfig,
) -> Result<Vec<ExtractionOutcome>, AiError> {
    let titles = client.extract_titles(need)?.titles;
    if titles.is_empty() {
        return Ok(Vec::new());
    }

    let outcomes = describe_all(&titles, config.workers, |title| {
        with_retry(config, || {
            client
                .describe_requirement(title, need)
                .map(|r| r.description)
        })
    });

    Ok(outcomes)
}

/// Runs the description closure over every title through a fixed worker
/// pool, preserving input order in the result
fn describe_all<F>(titles: &[String], workers: usize, describe: F) -> Vec<ExtractionOutcome>
where
    F: Fn(&str) -> Result<String, AiError> + Sync,
{
    if titles.is_empty() {
        return Vec::new();
    }
    let workers = workers.clamp(1, titles.len());

    let (work_tx, work_rx) = mpsc::channel::<(usize, String)>();
    let work_rx = Arc::new(Mutex::new(work_rx));
    let (result_tx, result_rx) = mpsc::channel::<(usize, Result<String, AiError>)>();

    for (index, title) in titles.iter().enumerate() {
        // The receiver outlives every send
        let _ = work_tx.send((index, title.clone()));
    }
    drop(work_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let work_rx = Arc::clone(&work_rx);
            let result_tx = result_tx.clone();
            let describe = &describe;
            scope.spawn(move || loop {
                let job = work_rx.lock().unwrap().recv();
                let Ok((index, title)) = job else { break };
                let result = describe(&title);
                if result_tx.send((index, result)).is_err() {
                    break;
                }
            });
        }
        drop(result_tx);
    });

    let mut slots: Vec<Option<Result<String, AiError>>> =
        titles.iter().map(|_| None).collect();
    while let Ok((index, result)) = result_rx.recv() {
        slots[index] = Some(result);
    }

    titles
        .iter()
        .zip(slots)
        .map(|(title, slot)| ExtractionOutcome {
            title: title.clone(),
            body: slot.unwrap_or_else(|| {
                Err(AiError::InvalidResponse("worker dropped the item".into()))
            }),
        })
        .collect()
}

/// Retries a call with doubling backoff, up to the configured attempts.
/// Non-retryable errors fail immediately.
fn with_retry<F>(config: &ExtractionConfig, mut op: F) -> Result<String, AiError>
where
    F: FnMut() -> Result<String, AiError>,
{
    let mut backoff = config.initial_backoff;
    let mut attempt = 1;

    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                log::warn!("extraction attempt {} failed, retrying: {}", attempt, e);
                thread::sleep(backoff);
                backoff *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::AiMode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    fn fast_config() -> ExtractionConfig {
        ExtractionConfig {
            workers: 4,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_describe_all_preserves_order() {
        let titles: Vec<String> = (0..10).map(|i| format!("title-{i}")).collect();

        let outcomes = describe_all(&titles, 4, |title| Ok(format!("body of {title}")));

        assert_eq!(outcomes.len(), 10);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.title, format!("title-{i}"));
            assert_eq!(
                outcome.body.as_deref().unwrap(),
                format!("body of title-{i}")
            );
        }
    }

    #[test]
    fn test_failed_item_does_not_abort_batch() {
        let titles: Vec<String> = vec!["good".into(), "bad".into(), "also good".into()];

        let outcomes = describe_all(&titles, 2, |title| {
            if title == "bad" {
                Err(AiError::NotConfigured)
            } else {
                Ok("done".into())
            }
        });

        assert!(outcomes[0].ok().is_some());
        assert!(outcomes[1].ok().is_none());
        assert!(outcomes[2].ok().is_some());
    }

    #[test]
    fn test_single_worker_pool() {
        let titles: Vec<String> = vec!["a".into(), "b".into()];
        let outcomes = describe_all(&titles, 1, |_| Ok("x".into()));
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_retry_until_success() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(&fast_config(), || {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AiError::CliExecFailed("transient".into()))
            } else {
                Ok("ok".into())
            }
        });

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_exhaustion() {
        let attempts = AtomicU32::new(0);
        let result: Result<String, AiError> = with_retry(&fast_config(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(AiError::CliExecFailed("always".into()))
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_non_retryable_fails_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<String, AiError> = with_retry(&fast_config(), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(AiError::NotConfigured)
        });

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disabled_client_fails_the_listing() {
        let client = AiClient::with_mode(AiMode::Disabled);
        let need = Need::new("n".into(), "body".into(), Uuid::new_v4());

        let result = extract_requirements(&client, &need, &fast_config());
        assert!(matches!(result, Err(AiError::NotConfigured)));
    }
}
