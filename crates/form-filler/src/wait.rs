use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;

use crate::errors::FillError;
use crate::session::Completion;

/// How a dependent step was released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    /// The prior step finished; `true` when it succeeded.
    Finished(bool),
    /// The bound elapsed first, or there was no prior step.
    TimedOut,
}

/// Waits until `prior` has finished or `bound` has elapsed, whichever comes first. Without a
/// prior step the full bound is waited, which keeps the worst case of the fixed-delay
/// choreography.
pub async fn settle(
    prior: Option<Completion>,
    bound: Duration,
    cancel: &CancellationToken,
) -> Result<Settled, FillError> {
    let wait = async {
        match prior {
            Some(prior) => match timeout(bound, prior.wait()).await {
                Ok(succeeded) => Settled::Finished(succeeded),
                Err(_) => Settled::TimedOut,
            },
            None => {
                sleep(bound).await;
                Settled::TimedOut
            }
        }
    };
    tokio::select! {
        _ = cancel.cancelled() => Err(FillError::Cancelled),
        settled = wait => Ok(settled),
    }
}

/// Polls `probe` every `interval` until it yields a value or `bound` elapses.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    bound: Duration,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<Option<T>, FillError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + bound;
    loop {
        if cancel.is_cancelled() {
            return Err(FillError::Cancelled);
        }
        if let Some(found) = probe().await {
            return Ok(Some(found));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        let next = (now + interval).min(deadline);
        tokio::select! {
            _ = cancel.cancelled() => return Err(FillError::Cancelled),
            _ = tokio::time::sleep_until(next) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::FillSession;

    #[tokio::test(start_paused = true)]
    async fn settle_returns_early_when_prior_finishes() {
        let session = FillSession::new();
        let prior = session.spawn_after(Duration::from_millis(150), "prior", async { Ok(0) });
        let start = Instant::now();
        let settled = settle(Some(prior), Duration::from_millis(600), session.token())
            .await
            .unwrap();
        assert_eq!(settled, Settled::Finished(true));
        assert_eq!(start.elapsed(), Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn settle_is_bounded_by_the_fixed_delay() {
        let session = FillSession::new();
        let prior = session.spawn_after(Duration::from_secs(5), "slow", async { Ok(0) });
        let start = Instant::now();
        let settled = settle(Some(prior), Duration::from_millis(400), session.token())
            .await
            .unwrap();
        assert_eq!(settled, Settled::TimedOut);
        assert_eq!(start.elapsed(), Duration::from_millis(400));
        session.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn poll_until_gives_up_at_the_bound() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let found: Option<()> = poll_until(
            Duration::from_millis(100),
            Duration::from_millis(350),
            &cancel,
            || async { None },
        )
        .await
        .unwrap();
        assert!(found.is_none());
        assert_eq!(start.elapsed(), Duration::from_millis(350));
    }
}
