//! Notification delivery with a small, flat retry budget.
//!
//! Push services rate limit (429) and have outages (5xx). Such failures are
//! retried after [`RETRY_DELAY`], at most [`MAX_RETRIES`] times, so a single
//! [`NotificationDispatcher::send`] makes at most `MAX_RETRIES + 1` delivery
//! attempts. Every other failure, including network errors that carry no
//! status code, is returned to the caller untouched on the first occurrence.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;

use crate::helpers::delivery::PushDelivery;
use crate::helpers::error::WebPushError;
use crate::helpers::message::SubscriptionInfo;

/// Retries allowed after the first delivery attempt.
pub const MAX_RETRIES: u32 = 2;
/// Fixed wait before each retry; there is no backoff.
pub const RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Flat wait before every retry.
    pub delay: Duration,
    /// Upper bound for one delivery attempt. Expiry counts as a transient failure.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: MAX_RETRIES,
            delay: RETRY_DELAY,
            attempt_timeout: None,
        }
    }
}

/// The result of one subscription's delivery in [`NotificationDispatcher::send_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    pub subscription: SubscriptionInfo,
    pub result: Result<(), WebPushError>,
}

impl DeliveryOutcome {
    /// The push service no longer knows the subscription; its owner should delete it.
    pub fn is_gone(&self) -> bool {
        matches!(&self.result, Err(error) if error.is_subscription_gone())
    }
}

pub struct NotificationDispatcher<D> {
    client: D,
    policy: RetryPolicy,
}

impl<D: PushDelivery> NotificationDispatcher<D> {
    pub fn new(client: D) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    pub fn with_policy(client: D, policy: RetryPolicy) -> Self {
        NotificationDispatcher { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Delivers `payload` to `subscription`, retrying transient failures.
    pub async fn send(
        &self,
        subscription: &SubscriptionInfo,
        payload: &str,
    ) -> Result<(), WebPushError> {
        self.send_with_retries(subscription, payload, self.policy.max_retries)
            .await
    }

    /// Like [`send`](Self::send) with an explicit number of retries left.
    ///
    /// Attempts are strictly sequential. The returned error is the one the last
    /// attempt failed with.
    pub async fn send_with_retries(
        &self,
        subscription: &SubscriptionInfo,
        payload: &str,
        mut remaining_attempts: u32,
    ) -> Result<(), WebPushError> {
        let mut attempt = 1;

        loop {
            info!(
                "Sending push notification to {} (attempt {}, {} retries left)",
                subscription.endpoint, attempt, remaining_attempts
            );

            let error = match self.attempt(subscription, payload).await {
                Ok(()) => return Ok(()),
                Err(error) => error,
            };

            if remaining_attempts == 0 || !error.is_transient() {
                debug!(
                    "Giving up on {} after {} attempt(s): {}",
                    subscription.endpoint, attempt, error
                );
                return Err(error);
            }

            warn!(
                "Push notification to {} failed with {}, retrying in {:?}",
                subscription.endpoint, error, self.policy.delay
            );
            tokio::time::sleep(self.policy.delay).await;

            remaining_attempts -= 1;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        subscription: &SubscriptionInfo,
        payload: &str,
    ) -> Result<(), WebPushError> {
        let delivery = self.client.deliver(subscription, payload);
        match self.policy.attempt_timeout {
            Some(timeout) => tokio::time::timeout(timeout, delivery)
                .await
                .unwrap_or(Err(WebPushError::Timeout)),
            None => delivery.await,
        }
    }
}

impl<D: PushDelivery + 'static> NotificationDispatcher<D> {
    /// Sends `payload` to every subscription concurrently. Each subscription
    /// gets its own retry budget; one slow or failing endpoint does not hold
    /// up the others. Outcomes come back in completion order, one per
    /// subscription; a task that panics is reported as
    /// [`WebPushError::Unspecified`].
    pub async fn send_all(
        self: &Arc<Self>,
        subscriptions: Vec<SubscriptionInfo>,
        payload: &str,
    ) -> Vec<DeliveryOutcome> {
        let payload: Arc<str> = Arc::from(payload);
        let mut tasks = JoinSet::new();

        for (index, subscription) in subscriptions.iter().cloned().enumerate() {
            let dispatcher = Arc::clone(self);
            let payload = Arc::clone(&payload);
            tasks.spawn(async move {
                let result = dispatcher.send(&subscription, &payload).await;
                (
                    index,
                    DeliveryOutcome {
                        subscription,
                        result,
                    },
                )
            });
        }

        let mut reported = vec![false; subscriptions.len()];
        let mut outcomes = Vec::with_capacity(subscriptions.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    reported[index] = true;
                    outcomes.push(outcome);
                }
                Err(err) => error!("Push notification task failed: {}", err),
            }
        }

        for (subscription, _) in subscriptions
            .into_iter()
            .zip(reported)
            .filter(|(_, reported)| !reported)
        {
            outcomes.push(DeliveryOutcome {
                subscription,
                result: Err(WebPushError::Unspecified),
            });
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(
            "Delivered push notification to {} of {} subscription(s)",
            outcomes.len() - failed,
            outcomes.len()
        );

        outcomes
    }
}
