//! Schedule engine — the single owner of the in-memory schedule book.
//!
//! Every read-modify-write goes through one [`tokio::sync::Mutex`]: the
//! polling cycle and management requests each take the lock, mutate the
//! [`ScheduleBook`], and commit the dirty keys to the store before
//! releasing it. Nothing sleeps while holding the lock except the actuator
//! itself during a ring.

use belfry_domain::action::ActionSpec;
use belfry_domain::book::{DocumentKey, ScheduleBook};
use belfry_domain::error::BelfryError;
use belfry_domain::time::Moment;
use belfry_domain::timeline::Decision;
use tokio::sync::{Mutex, Notify};

use crate::dispatcher::RingDispatcher;
use crate::ports::{Actuator, Clock, ScheduleStore};

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// The clock is not synchronized yet; nothing was evaluated.
    Unsynchronized,
    /// No schedule applies today.
    Idle,
    /// Slot `index` fired. `dispatched` is `false` for an ignored action.
    Fired {
        index: usize,
        late_by: i64,
        dispatched: bool,
    },
    /// The next trigger is this many seconds away.
    WaitUntil(i64),
    /// A trigger is due once the minimum gap elapses, in this many seconds.
    WaitForGap(i64),
    /// Nothing left to fire.
    Exhausted,
}

/// Mutex-guarded schedule book plus the ports it drives.
pub struct ScheduleEngine<S, A, C> {
    store: S,
    dispatcher: RingDispatcher<A>,
    clock: C,
    book: Mutex<ScheduleBook>,
    wake: Notify,
}

impl<S, A, C> ScheduleEngine<S, A, C>
where
    S: ScheduleStore,
    A: Actuator,
    C: Clock,
{
    pub fn new(store: S, actuator: A, clock: C, book: ScheduleBook) -> Self {
        Self {
            store,
            dispatcher: RingDispatcher::new(actuator),
            clock,
            book: Mutex::new(book),
            wake: Notify::new(),
        }
    }

    /// Read every document key from `store` and build the engine.
    ///
    /// # Errors
    ///
    /// Fails on a store read error, or with
    /// [`ValidationError::MalformedDocument`](belfry_domain::error::ValidationError::MalformedDocument)
    /// when a stored value has the wrong shape.
    pub async fn load(store: S, actuator: A, clock: C) -> Result<Self, BelfryError> {
        let mut documents = Vec::new();
        for key in DocumentKey::ALL {
            if let Some(value) = store.get(key).await? {
                documents.push((key, value));
            }
        }
        let book = ScheduleBook::from_documents(documents)?;
        tracing::info!(
            schedules = book.schedules().len(),
            active = book.active().names().len(),
            progress = book.state().progress,
            "schedule book loaded"
        );
        Ok(Self::new(store, actuator, clock, book))
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub fn actuator(&self) -> &A {
        self.dispatcher.actuator()
    }

    /// Wake the polling driver out of its current suspension.
    pub fn wake(&self) {
        self.wake.notify_one();
    }

    /// Resolve when [`wake`](Self::wake) is called.
    pub async fn woken(&self) {
        self.wake.notified().await;
    }

    /// Read the book under the lock.
    pub async fn read<T>(&self, f: impl FnOnce(&ScheduleBook, Moment) -> T) -> T {
        let book = self.book.lock().await;
        f(&book, self.clock.now())
    }

    /// Mutate the book, commit every dirty key, then wake the driver.
    ///
    /// The in-memory change is kept even when the commit fails; keys that
    /// could not be written stay dirty and are retried on the next commit.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, otherwise the first store write failure.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut ScheduleBook, Moment) -> Result<T, BelfryError>,
    ) -> Result<T, BelfryError> {
        let mut book = self.book.lock().await;
        let outcome = f(&mut book, self.clock.now());
        let committed = self.commit(&mut book).await;
        drop(book);
        self.wake();
        let value = outcome?;
        committed?;
        Ok(value)
    }

    async fn commit(&self, book: &mut ScheduleBook) -> Result<(), BelfryError> {
        let mut first_failure = None;
        for key in book.take_dirty() {
            let value = book.to_value(key)?;
            if let Err(err) = self.store.set(key, value).await {
                tracing::error!(%key, error = %err, "failed to save document key");
                book.touch(key);
                first_failure.get_or_insert(err);
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    /// Restore the default engine state and remove its keys from the store.
    ///
    /// # Errors
    ///
    /// Returns the first store failure.
    pub async fn reset_state(&self) -> Result<(), BelfryError> {
        let mut book = self.book.lock().await;
        book.reset_engine_state();
        for key in DocumentKey::ENGINE_STATE {
            self.store.remove(key).await?;
        }
        drop(book);
        self.wake();
        tracing::info!("engine state reset");
        Ok(())
    }

    /// Ring once, outside any schedule. Serialized with the polling cycle.
    ///
    /// # Errors
    ///
    /// Propagates the actuator's failure.
    pub async fn ring(&self, action: &ActionSpec) -> Result<bool, BelfryError> {
        let _book = self.book.lock().await;
        self.dispatcher.dispatch(action).await
    }

    /// One polling pass: reset, resolve, select and maybe fire.
    ///
    /// # Errors
    ///
    /// Returns a store failure from committing progress. The firing itself
    /// has already happened and stays recorded in memory.
    pub async fn cycle(&self) -> Result<Cycle, BelfryError> {
        if !self.clock.is_synchronized() {
            tracing::debug!("clock not synchronized, holding off");
            return Ok(Cycle::Unsynchronized);
        }

        let mut book = self.book.lock().await;
        let now = self.clock.now();

        let reset = book.reset(now);
        if reset.midnight_wrap {
            tracing::info!(
                midnight_resets = book.state().midnight_reset_count,
                "day boundary crossed, progress rewound"
            );
        }
        if reset.reopened {
            tracing::info!(%now, "completed run reopened");
        }

        let timeline = book.resolve(now);
        let decision = timeline.decide(book.state(), book.tunables(), now.time_of_day());
        let cycle = match decision {
            Decision::Idle => Cycle::Idle,
            Decision::WaitUntil(secs) => Cycle::WaitUntil(secs),
            Decision::WaitForGap(secs) => {
                tracing::debug!(wait = secs, gap = book.tunables().gap, "holding for gap");
                Cycle::WaitForGap(secs)
            }
            Decision::Exhausted => {
                tracing::debug!(progress = book.state().progress, "no eligible trigger");
                Cycle::Exhausted
            }
            Decision::Fire { index, late_by } => {
                let Some(slot) = timeline.get(index) else {
                    return Ok(Cycle::Exhausted);
                };
                if late_by > 0 {
                    tracing::info!(index, at = slot.time_of_day(), late_by, action = %slot.action, "catch-up ring");
                } else {
                    tracing::info!(index, at = slot.time_of_day(), action = %slot.action, "ring");
                }
                let dispatched = match self.dispatcher.dispatch(&slot.action).await {
                    Ok(dispatched) => dispatched,
                    Err(err) => {
                        tracing::error!(error = %err, action = %slot.action, "actuator failed");
                        false
                    }
                };
                if let Some(rollover) = book.record(&timeline, index, self.clock.now()) {
                    tracing::info!(
                        reverted = ?rollover.reverted,
                        retired = ?rollover.retired,
                        "day run complete, rollover maintenance done"
                    );
                }
                Cycle::Fired {
                    index,
                    late_by,
                    dispatched,
                }
            }
        };
        self.commit(&mut book).await?;
        Ok(cycle)
    }
}
