use std::{
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::debug;
use tokio::sync::watch::{channel as watch_channel, Receiver, Sender};

use crate::{CoalescionKey, CoalescionServiceConfig, Error, Registry};

type Outcome<Value, Failure> = Result<Arc<Value>, Error<Failure>>;

/// Task currently running for a key
pub struct InFlight<Value, Failure> {
    ticket: u64,
    receiver: Receiver<Option<Outcome<Value, Failure>>>,
}

impl<Value, Failure> Clone for InFlight<Value, Failure> {
    fn clone(&self) -> Self {
        Self {
            ticket: self.ticket,
            receiver: self.receiver.clone(),
        }
    }
}

impl<Value, Failure> fmt::Debug for InFlight<Value, Failure> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InFlight")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// Snapshot of the tasks currently running
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CoalescionStatus {
    pub in_flight: usize,
    /// Redacted keys, sorted
    pub keys: Vec<String>,
}

enum Role<Value, Failure> {
    Leader(Sender<Option<Outcome<Value, Failure>>>),
    Follower(Receiver<Option<Outcome<Value, Failure>>>),
    Rejected(usize),
}

/// Removes the leader's registry entry however the leader exits.
struct SettleGuard<'a, Id: CoalescionKey, Value, Failure> {
    registry: &'a Registry<Id, InFlight<Value, Failure>>,
    id: &'a Id,
    ticket: u64,
    settled: bool,
}

impl<Id: CoalescionKey, Value, Failure> SettleGuard<'_, Id, Value, Failure> {
    fn settle(&mut self) {
        if !self.settled {
            self.settled = true;
            let ticket = self.ticket;
            self.registry
                .delete_if(self.id, |in_flight| in_flight.ticket == ticket);
        }
    }
}

impl<Id: CoalescionKey, Value, Failure> Drop for SettleGuard<'_, Id, Value, Failure> {
    fn drop(&mut self) {
        self.settle();
    }
}

/// Runs at most one task per key, every concurrent caller shares its outcome.
pub struct CoalescionService<Id, Value, Failure> {
    config: Arc<CoalescionServiceConfig>,
    registry: Arc<Registry<Id, InFlight<Value, Failure>>>,
    tickets: Arc<AtomicU64>,
}

impl<Id, Value, Failure> Clone for CoalescionService<Id, Value, Failure> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: self.registry.clone(),
            tickets: self.tickets.clone(),
        }
    }
}

impl<Id: CoalescionKey, Value, Failure: Clone> CoalescionService<Id, Value, Failure> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: CoalescionServiceConfig) -> Self {
        Self::with_registry(config, Arc::new(Registry::new()))
    }

    /// Use existing storage, services sharing a registry also share tasks
    pub fn with_registry(
        config: CoalescionServiceConfig,
        registry: Arc<Registry<Id, InFlight<Value, Failure>>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry,
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &CoalescionServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<Registry<Id, InFlight<Value, Failure>>> {
        &self.registry
    }

    async fn wait_for(
        &self,
        mut receiver: Receiver<Option<Outcome<Value, Failure>>>,
    ) -> Outcome<Value, Failure> {
        receiver
            .wait_for(|v| v.is_some())
            .await
            .map_err(|_| Error::Abandoned)
            .and_then(|r| r.clone().unwrap_or(Err(Error::Abandoned)))
    }

    async fn lead<F, Fut>(
        &self,
        id: &Id,
        ticket: u64,
        send: Sender<Option<Outcome<Value, Failure>>>,
        func: F,
    ) -> Outcome<Value, Failure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Failure>>,
    {
        let mut guard = SettleGuard {
            registry: self.registry.as_ref(),
            id,
            ticket,
            settled: false,
        };

        let value = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, func()).await {
                Ok(value) => value.map(Arc::new).map_err(Error::Producer),
                Err(_) => {
                    debug!("Task for {} timed out after {timeout:?}.", id.redacted());
                    Err(Error::Timeout)
                }
            },
            None => func().await.map(Arc::new).map_err(Error::Producer),
        };

        // Free the key before anyone is woken up, so a caller reacting to
        // this outcome starts a new task instead of joining this one.
        guard.settle();

        send.send_modify(|opt| {
            opt.replace(value.clone());
        });

        value
    }

    /// Run `func` for `id`, or wait for the task already running for `id`
    pub async fn execute<F, Fut>(&self, id: Id, func: F) -> Outcome<Value, Failure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, Failure>>,
    {
        if id.is_blank() {
            return Err(Error::InvalidKey);
        }

        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let role = self.registry.with_entries(|entries| {
            if let Some(in_flight) = entries.get(&id) {
                return Role::Follower(in_flight.receiver.clone());
            }

            match self.config.max_concurrent {
                Some(max_concurrent) if entries.len() >= max_concurrent => {
                    Role::Rejected(max_concurrent)
                }
                _ => {
                    let (send, receiver) = watch_channel(None);
                    entries.insert(id.clone(), InFlight { ticket, receiver });
                    Role::Leader(send)
                }
            }
        });

        match role {
            Role::Leader(send) => self.lead(&id, ticket, send, func).await,
            Role::Follower(receiver) => {
                debug!("Joining task already running for {}.", id.redacted());
                self.wait_for(receiver).await
            }
            Role::Rejected(max) => Err(Error::MaxConcurrent { max }),
        }
    }

    /// Forget every running task
    ///
    /// Callers already waiting still receive their outcome, new callers start
    /// fresh tasks.
    pub fn clear_all(&self) -> usize {
        self.registry.clear()
    }

    pub fn status(&self) -> CoalescionStatus {
        let mut keys: Vec<String> = self
            .registry
            .keys()
            .iter()
            .map(CoalescionKey::redacted)
            .collect();
        keys.sort();

        CoalescionStatus {
            in_flight: keys.len(),
            keys,
        }
    }

    pub fn current_task_count(&self) -> usize {
        self.registry.len()
    }
}

impl<Id: CoalescionKey, Value, Failure: Clone> Default for CoalescionService<Id, Value, Failure> {
    fn default() -> Self {
        Self::from_config(CoalescionServiceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use futures::future::join_all;
    use tokio::time::sleep;

    use crate::{CoalescionService, CoalescionServiceConfig, Error, Registry};

    type Service = CoalescionService<String, u32, String>;

    #[tokio::test]
    async fn concurrent_callers_share_one_task() {
        let service = CoalescionService::<String, Vec<bool>, String>::new();
        let calls = AtomicUsize::new(0);

        let producer = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(50)).await;
            Ok(vec![true])
        };

        let results = join_all((0..5).map(|_| service.execute("ABC123".to_string(), producer)))
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|value| Arc::ptr_eq(value, &results[0])));
        assert_eq!(*results[0], vec![true]);
        assert_eq!(service.current_task_count(), 0);

        sleep(Duration::from_millis(10)).await;
        let again = service
            .execute("ABC123".to_string(), producer)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!Arc::ptr_eq(&again, &results[0]));
    }

    #[tokio::test]
    async fn settled_task_is_not_reused() {
        let service = Service::new();

        let first = service
            .execute("key".to_string(), || async { Ok(1) })
            .await
            .unwrap();
        assert!(service.registry().get(&"key".to_string()).is_none());

        let second = service
            .execute("key".to_string(), || async { Ok(2) })
            .await
            .unwrap();

        assert_eq!(*first, 1);
        assert_eq!(*second, 2);
    }

    #[tokio::test]
    async fn different_keys_run_separately() {
        let service = Service::new();
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            service.execute("K1".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(20)).await;
                Ok(1)
            }),
            service.execute("K2".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(20)).await;
                Ok(2)
            })
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(*a.unwrap(), 1);
        assert_eq!(*b.unwrap(), 2);
    }

    #[tokio::test]
    async fn errors_reach_every_caller_and_clean_up() {
        let service = Service::new();
        let calls = AtomicUsize::new(0);

        let failing = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(20)).await;
            Err("backend unreachable".to_string())
        };

        let results = join_all((0..3).map(|_| service.execute("key".to_string(), failing))).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(
                result.unwrap_err(),
                Error::Producer("backend unreachable".to_string())
            );
        }

        let recovered = service
            .execute("key".to_string(), || async { Ok(9) })
            .await
            .unwrap();
        assert_eq!(*recovered, 9);
    }

    #[tokio::test]
    async fn completion_handler_starts_fresh_task() {
        let service = Service::new();

        let first = service.execute("key".to_string(), || async { Ok(1) });
        let nested = async {
            let value = first.await.unwrap();
            service
                .execute("key".to_string(), || async move { Ok(*value + 1) })
                .await
        };

        assert_eq!(*nested.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn blank_keys_are_rejected() {
        let service = Service::new();
        let calls = AtomicUsize::new(0);

        let result = service
            .execute("  ".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await;

        assert_eq!(result.unwrap_err(), Error::InvalidKey);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn rejects_new_keys_over_capacity() {
        let service = Service::from_config(CoalescionServiceConfig {
            max_concurrent: Some(1),
            timeout: None,
        });

        let (a, b, c) = tokio::join!(
            service.execute("K1".to_string(), || async {
                sleep(Duration::from_millis(20)).await;
                Ok(1)
            }),
            service.execute("K2".to_string(), || async { Ok(2) }),
            service.execute("K1".to_string(), || async { Ok(3) })
        );

        assert_eq!(*a.unwrap(), 1);
        assert_eq!(b.unwrap_err(), Error::MaxConcurrent { max: 1 });
        assert_eq!(*c.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_reaches_every_caller() {
        let service = Service::from_config(CoalescionServiceConfig {
            max_concurrent: None,
            timeout: Some(Duration::from_millis(100)),
        });

        let slow = || async {
            sleep(Duration::from_secs(10)).await;
            Ok(1)
        };

        let results = join_all((0..3).map(|_| service.execute("key".to_string(), slow))).await;

        for result in results {
            assert_eq!(result.unwrap_err(), Error::Timeout);
        }
        assert!(service.registry().is_empty());

        let fast = service
            .execute("key".to_string(), || async { Ok(5) })
            .await
            .unwrap();
        assert_eq!(*fast, 5);
    }

    #[tokio::test]
    async fn dropped_leader_cleans_up() {
        let service = Service::new();

        let mut leader = Box::pin(service.execute("key".to_string(), || async {
            sleep(Duration::from_secs(60)).await;
            Ok(1)
        }));
        let mut follower = Box::pin(service.execute("key".to_string(), || async { Ok(2) }));

        // Register the leader, then the follower behind it.
        assert!(futures::poll!(leader.as_mut()).is_pending());
        assert!(futures::poll!(follower.as_mut()).is_pending());
        assert_eq!(service.current_task_count(), 1);

        drop(leader);

        assert_eq!(follower.await.unwrap_err(), Error::Abandoned);
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn clear_all_does_not_strand_waiters() {
        let service = Service::new();

        let (first, second) = tokio::join!(
            service.execute("key".to_string(), || async {
                sleep(Duration::from_millis(30)).await;
                Ok(1)
            }),
            async {
                sleep(Duration::from_millis(5)).await;
                assert_eq!(service.clear_all(), 1);

                // Nothing is registered any more, so this runs on its own.
                service
                    .execute("key".to_string(), || async {
                        sleep(Duration::from_millis(50)).await;
                        Ok(2)
                    })
                    .await
            }
        );

        assert_eq!(*first.unwrap(), 1);
        assert_eq!(*second.unwrap(), 2);
        assert!(service.registry().is_empty());
    }

    #[tokio::test]
    async fn status_lists_redacted_keys() {
        let service = Service::new();

        let ((), status) = tokio::join!(
            async {
                service
                    .execute(
                        "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
                        || async {
                            sleep(Duration::from_millis(20)).await;
                            Ok(1)
                        },
                    )
                    .await
                    .unwrap();
            },
            async {
                sleep(Duration::from_millis(5)).await;
                service.status()
            }
        );

        assert_eq!(status.in_flight, 1);
        assert_eq!(status.keys, vec!["7xKX...gAsU".to_string()]);
        assert_eq!(service.status().in_flight, 0);
    }

    #[tokio::test]
    async fn services_can_share_a_registry() {
        let registry = Arc::new(Registry::new());
        let a = Service::with_registry(CoalescionServiceConfig::default(), registry.clone());
        let b = Service::with_registry(CoalescionServiceConfig::default(), registry);
        let calls = AtomicUsize::new(0);

        let (x, y) = tokio::join!(
            a.execute("key".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(20)).await;
                Ok(1)
            }),
            b.execute("key".to_string(), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&x.unwrap(), &y.unwrap()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_flight_across_threads() {
        let service = Arc::new(CoalescionService::<String, usize, String>::new());
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles = (0..16)
            .map(|_| {
                let service = service.clone();
                let running = running.clone();
                let peak = peak.clone();
                tokio::spawn(async move {
                    service
                        .execute("wallet".to_string(), || async move {
                            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            sleep(Duration::from_millis(100)).await;
                            running.fetch_sub(1, Ordering::SeqCst);
                            Ok(now)
                        })
                        .await
                })
            })
            .collect::<Vec<_>>();

        for handle in join_all(handles).await {
            assert_eq!(*handle.unwrap().unwrap(), 1);
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert!(service.registry().is_empty());
    }
}
