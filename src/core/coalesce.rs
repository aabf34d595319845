use crate::domain::model::{CacheKey, GistPayload, UpstreamFailure};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

pub type FetchOutcome = std::result::Result<GistPayload, UpstreamFailure>;

#[derive(Debug, Clone)]
pub struct CoalescedOutcome {
    pub outcome: FetchOutcome,
    /// true 表示這個請求搭了別人的上游呼叫
    pub shared: bool,
}

/// 合併相同 key 的同時請求：第一個請求 (leader) 真正呼叫上游，
/// 其他請求 (follower) 等待並拿到同一個結果。
///
/// The in-flight map is never locked across an `.await`.
#[derive(Default)]
pub struct RequestCoalescer {
    in_flight: Mutex<HashMap<CacheKey, broadcast::Sender<FetchOutcome>>>,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn execute<F, Fut>(&self, key: CacheKey, fetch: F) -> CoalescedOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchOutcome>,
    {
        loop {
            let waiting = {
                let mut in_flight = self.lock();
                match in_flight.get(&key) {
                    Some(sender) => Some(sender.subscribe()),
                    None => {
                        let (sender, _) = broadcast::channel(1);
                        in_flight.insert(key.clone(), sender);
                        None
                    }
                }
            };

            match waiting {
                Some(mut receiver) => match receiver.recv().await {
                    Ok(outcome) => {
                        tracing::debug!("🔗 joined in-flight request for {}", key.query.user);
                        return CoalescedOutcome {
                            outcome,
                            shared: true,
                        };
                    }
                    // leader 被取消，重新競爭 leader
                    Err(_) => continue,
                },
                None => {
                    let mut guard = LeaderGuard::new(self, &key);
                    let outcome = fetch().await;
                    guard.complete(outcome.clone());
                    return CoalescedOutcome {
                        outcome,
                        shared: false,
                    };
                }
            }
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, broadcast::Sender<FetchOutcome>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Removes the in-flight entry when the leader finishes or is dropped.
/// After `complete` the guard is disarmed: the key may already belong to
/// the next leader.
struct LeaderGuard<'a> {
    coalescer: &'a RequestCoalescer,
    key: &'a CacheKey,
    armed: bool,
}

impl<'a> LeaderGuard<'a> {
    fn new(coalescer: &'a RequestCoalescer, key: &'a CacheKey) -> Self {
        Self {
            coalescer,
            key,
            armed: true,
        }
    }

    fn complete(&mut self, outcome: FetchOutcome) {
        self.armed = false;
        let sender = self.coalescer.lock().remove(self.key);
        if let Some(sender) = sender {
            // 沒有 follower 時 send 會回傳錯誤，可忽略
            let _ = sender.send(outcome);
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.coalescer.lock().remove(self.key);
        }
    }
}
