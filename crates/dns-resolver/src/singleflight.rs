//! Query de-duplication: concurrent queries for the same fingerprint
//! share the in-flight network transaction.
//!
//! The first asker of a key becomes the leader and does the work;
//! later askers subscribe to the leader's broadcast and wait.  If a
//! leader is cancelled mid-work (its future dropped), the waiters
//! notice the closed channel and the next one takes over as leader,
//! so the work continues as long as anyone still wants the answer.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

pub struct SingleFlight<K, V> {
    inflight: Arc<Mutex<HashMap<K, broadcast::Sender<V>>>>,
}

const MUTEX_POISON_MESSAGE: &str =
    "[INTERNAL ERROR] single-flight mutex poisoned, cannot recover from this - aborting";

impl<K, V> SingleFlight<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `work` under the key, unless someone else already is, in
    /// which case wait for their result instead.
    pub async fn run<F>(&self, key: K, work: F) -> V
    where
        F: Future<Output = V>,
    {
        tokio::pin!(work);

        loop {
            let role = {
                let mut map = self.inflight.lock().expect(MUTEX_POISON_MESSAGE);
                if let Some(sender) = map.get(&key) {
                    Role::Follower(sender.subscribe())
                } else {
                    let (sender, _) = broadcast::channel(1);
                    map.insert(key.clone(), sender.clone());
                    Role::Leader(sender)
                }
            };

            match role {
                Role::Leader(sender) => {
                    // the guard cleans up the map even if this future
                    // is dropped mid-work, so a waiter can take over
                    let _guard = RemoveOnDrop {
                        key: key.clone(),
                        map: Arc::clone(&self.inflight),
                    };
                    let value = work.as_mut().await;
                    let _ = sender.send(value.clone());
                    return value;
                }
                Role::Follower(mut receiver) => match receiver.recv().await {
                    Ok(value) => return value,
                    // leader went away without an answer: take over
                    Err(_) => continue,
                },
            }
        }
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

enum Role<V> {
    Leader(broadcast::Sender<V>),
    Follower(broadcast::Receiver<V>),
}

struct RemoveOnDrop<K: Eq + Hash, V> {
    key: K,
    map: Arc<Mutex<HashMap<K, broadcast::Sender<V>>>>,
}

impl<K: Eq + Hash, V> Drop for RemoveOnDrop<K, V> {
    fn drop(&mut self) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn concurrent_calls_share_one_execution() {
        let flight = Arc::new(SingleFlight::<&'static str, usize>::new());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let flight = Arc::clone(&flight);
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                flight
                    .run("key", async {
                        executions.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(20)).await;
                        42
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(42, handle.await.unwrap());
        }
        assert_eq!(1, executions.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn distinct_keys_do_not_share() {
        let flight = Arc::new(SingleFlight::<usize, usize>::new());
        let executions = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for key in 0..5 {
            let flight = Arc::clone(&flight);
            let executions = Arc::clone(&executions);
            handles.push(tokio::spawn(async move {
                flight
                    .run(key, async {
                        executions.fetch_add(1, Ordering::SeqCst);
                        sleep(Duration::from_millis(10)).await;
                        key
                    })
                    .await
            }));
        }

        for (key, handle) in handles.into_iter().enumerate() {
            assert_eq!(key, handle.await.unwrap());
        }
        assert_eq!(5, executions.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn follower_takes_over_from_cancelled_leader() {
        let flight = Arc::new(SingleFlight::<&'static str, usize>::new());

        let leader = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                flight
                    .run("key", async {
                        sleep(Duration::from_secs(60)).await;
                        1
                    })
                    .await
            })
        };

        // let the leader claim the key, then kill it
        sleep(Duration::from_millis(10)).await;
        let follower = {
            let flight = Arc::clone(&flight);
            tokio::spawn(async move {
                flight
                    .run("key", async {
                        sleep(Duration::from_millis(10)).await;
                        2
                    })
                    .await
            })
        };
        sleep(Duration::from_millis(10)).await;
        leader.abort();

        assert_eq!(2, follower.await.unwrap());
    }
}
