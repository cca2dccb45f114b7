use std::future::Future;

use log::debug;

/// Runs `operation` up to `max_attempts` times (at least once), immediately
/// retrying after each failure. Returns the first success or the last error.
///
/// The closure receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(max_attempts: usize, mut operation: F) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => return Err(e),
            Err(e) => {
                debug!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_first_success_stops() {
        let calls = Cell::new(0);
        let result: Result<&str, String> = retry(4, |_| {
            calls.set(calls.get() + 1);
            async { Ok("done") }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_success_after_failures() {
        let result: Result<usize, String> = retry(4, |attempt| async move {
            if attempt < 3 {
                Err(format!("boom {}", attempt))
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = Cell::new(0);
        let result: Result<(), String> = retry(4, |attempt| {
            calls.set(calls.get() + 1);
            async move { Err(format!("boom {}", attempt)) }
        })
        .await;

        assert_eq!(result, Err("boom 4".to_string()));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let result: Result<(), String> =
            tokio_test::block_on(retry(0, |_| async { Err("nope".to_string()) }));
        assert_eq!(result, Err("nope".to_string()));
    }
}
