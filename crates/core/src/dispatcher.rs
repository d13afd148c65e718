//! Dispatcher - the admission loop
//!
//! The dispatcher waits until either a slot is free or no party can ever be
//! formed again. In the first case it takes one party out of the pool, claims
//! the next slot in round-robin order and spawns a [`Worker`] for it. In the
//! second case it drains the run and stops.
//!
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!        WAITING ──(slot free or pool exhausted)──► ADMITTING
//!                                                   │       │
//!                               can form a party ◄──┘       └──► cannot
//!                                      │                          │
//!                                      ▼                          ▼
//!                               FORMING_PARTY                 DRAINING
//!                                      │                          │
//!                                      ▼                          ▼
//!                                DISPATCHING ──► WAITING      TERMINATED
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinSet;
use tracing::{debug, info, trace};

use crate::config::{RunOptions, SimulationConfig};
use crate::events::SimulationEvent;
use crate::state::{SharedState, SimulationState};
use crate::worker::Worker;

/// Dispatcher state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherPhase {
    /// Blocked on the wait condition
    Waiting,
    /// Woken with the admission predicate satisfied
    Admitting,
    /// Taking a party out of the pool
    FormingParty,
    /// Binding the party to a slot and spawning its worker
    Dispatching,
    /// Pool exhausted; stopping the run
    Draining,
    /// Loop exited
    Terminated,
}

/// Uniform sampler for party durations in simulated seconds
pub struct DurationSampler {
    rng: StdRng,
    min: u32,
    max: u32,
}

impl DurationSampler {
    /// `min` must not exceed `max`; validated configs guarantee it
    pub fn new(min: u32, max: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, min, max }
    }

    pub fn sample(&mut self) -> u32 {
        self.rng.gen_range(self.min..=self.max)
    }
}

/// What the dispatcher ends with
pub struct DispatchOutcome {
    pub parties_dispatched: u64,
    /// Workers still owed a join
    pub workers: JoinSet<()>,
}

enum Admission {
    /// No free slot yet
    Blocked,
    Dispatched(Worker),
    Drained,
}

pub struct Dispatcher {
    shared: SharedState,
    sampler: DurationSampler,
    options: RunOptions,
    workers: JoinSet<()>,
    phase: DispatcherPhase,
    parties_dispatched: u64,
}

impl Dispatcher {
    pub fn new(shared: SharedState, config: &SimulationConfig, options: &RunOptions) -> Self {
        Self {
            shared,
            sampler: DurationSampler::new(config.min_duration, config.max_duration, options.seed),
            options: options.clone(),
            workers: JoinSet::new(),
            phase: DispatcherPhase::Waiting,
            parties_dispatched: 0,
        }
    }

    pub fn phase(&self) -> DispatcherPhase {
        self.phase
    }

    /// Run the admission loop until the pool is exhausted
    ///
    /// Workers spawned along the way are handed back unjoined; in-flight
    /// parties keep running after the drain.
    pub async fn run(mut self) -> DispatchOutcome {
        loop {
            self.transition(DispatcherPhase::Waiting);
            match self.try_admit() {
                Admission::Blocked => self.shared.changed().await,
                Admission::Dispatched(worker) => {
                    self.workers.spawn(worker.run());
                }
                Admission::Drained => break,
            }
        }

        self.transition(DispatcherPhase::Terminated);
        debug!(
            parties_dispatched = self.parties_dispatched,
            in_flight = self.workers.len(),
            "Dispatcher loop exited"
        );

        DispatchOutcome {
            parties_dispatched: self.parties_dispatched,
            workers: self.workers,
        }
    }

    /// One pass of the admission predicate under the lock
    fn try_admit(&mut self) -> Admission {
        let shared = self.shared.clone();
        let mut state = shared.lock();

        let can_form = state.pool.can_form_party();
        // Wait predicate: a free slot, or a pool that can never fill a party
        if can_form && !state.slots.has_free_slot() {
            return Admission::Blocked;
        }

        self.transition(DispatcherPhase::Admitting);
        if !can_form {
            return self.drain(&shared, &mut state);
        }
        let Some(slot) = state.slots.assign_next() else {
            return Admission::Blocked;
        };

        self.transition(DispatcherPhase::FormingParty);
        let Some(party) = state.pool.try_form_party() else {
            state.slots.mark_inactive(slot);
            return self.drain(&shared, &mut state);
        };

        self.transition(DispatcherPhase::Dispatching);
        let duration = self.sampler.sample();
        state.slots.record_service(slot, u64::from(duration));
        state.record_dispatch();
        self.parties_dispatched += 1;

        let remaining = state.pool.remaining();
        shared.emit(SimulationEvent::PartyDispatched {
            slot,
            duration,
            remaining,
        });
        shared.emit(SimulationEvent::SlotActive { slot, duration });
        info!(
            slot,
            duration,
            players = party.members.total(),
            active = state.slots.active_count(),
            tanks = remaining.tanks,
            healers = remaining.healers,
            dps = remaining.dps,
            "Party dispatched"
        );

        Admission::Dispatched(Worker::new(
            shared.clone(),
            slot,
            duration,
            self.options.scaled(duration),
        ))
    }

    fn drain(&mut self, shared: &SharedState, state: &mut SimulationState) -> Admission {
        self.transition(DispatcherPhase::Draining);
        if shared.drain(state) {
            info!(
                parties_dispatched = self.parties_dispatched,
                remaining = ?state.pool.remaining(),
                "Resources exhausted, draining"
            );
        }
        Admission::Drained
    }

    fn transition(&mut self, next: DispatcherPhase) {
        trace!(from = ?self.phase, to = ?next, "Dispatcher transition");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::events::{MemorySink, PARTY_DISPATCHED, RUN_DRAINED, SLOT_ACTIVE};
    use crate::pool::ResourceCounts;

    #[test]
    fn test_sampler_stays_in_range() {
        let mut sampler = DurationSampler::new(2, 5, Some(42));
        for _ in 0..500 {
            let duration = sampler.sample();
            assert!((2..=5).contains(&duration));
        }
    }

    #[test]
    fn test_sampler_fixed_range() {
        let mut sampler = DurationSampler::new(3, 3, None);
        assert_eq!(sampler.sample(), 3);
    }

    #[test]
    fn test_seeded_sampler_is_reproducible() {
        let mut a = DurationSampler::new(0, 100, Some(7));
        let mut b = DurationSampler::new(0, 100, Some(7));
        let first: Vec<_> = (0..20).map(|_| a.sample()).collect();
        let second: Vec<_> = (0..20).map(|_| b.sample()).collect();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatcher_fills_slots_then_drains() {
        let sink = Arc::new(MemorySink::new());
        let config =
            SimulationConfig::new(2, ResourceCounts::new(3, 3, 9)).with_duration_range(4, 4);
        let shared = SharedState::new(&config, sink.clone());
        let dispatcher = Dispatcher::new(shared.clone(), &config, &RunOptions::default());
        assert_eq!(dispatcher.phase(), DispatcherPhase::Waiting);

        let start = tokio::time::Instant::now();
        let mut outcome = dispatcher.run().await;
        // Third party had to wait for a slot to free up
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        assert_eq!(outcome.parties_dispatched, 3);
        assert!(!shared.is_running());

        while let Some(result) = outcome.workers.join_next().await {
            result.unwrap();
        }

        let slots: Vec<usize> = sink
            .events_of_type(PARTY_DISPATCHED)
            .into_iter()
            .filter_map(|event| match event {
                SimulationEvent::PartyDispatched { slot, .. } => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(slots.len(), 3);
        assert_eq!(&slots[..2], &[0, 1]);
        assert_eq!(shared.snapshot().active_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slot_active_emitted_with_dispatch() {
        let sink = Arc::new(MemorySink::new());
        let config =
            SimulationConfig::new(1, ResourceCounts::new(1, 1, 3)).with_duration_range(2, 2);
        let shared = SharedState::new(&config, sink.clone());

        let mut outcome = Dispatcher::new(shared.clone(), &config, &RunOptions::default())
            .run()
            .await;

        // Worker not polled yet; the dispatch already counts against the slot
        let types: Vec<_> = sink.events().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec![PARTY_DISPATCHED, SLOT_ACTIVE, RUN_DRAINED]);
        {
            let state = shared.lock();
            let slot = state.slots().slot(0).unwrap();
            assert!(slot.active);
            assert_eq!(slot.parties_served, 1);
            assert_eq!(slot.seconds_served, 2);
        }

        while let Some(result) = outcome.workers.join_next().await {
            result.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatcher_drains_immediately_without_players() {
        let config = SimulationConfig::new(3, ResourceCounts::new(0, 1, 3));
        let shared = SharedState::new(&config, Arc::new(MemorySink::new()));
        let dispatcher = Dispatcher::new(shared.clone(), &config, &RunOptions::default());

        let outcome = dispatcher.run().await;
        assert_eq!(outcome.parties_dispatched, 0);
        assert!(outcome.workers.is_empty());
        assert!(!shared.is_running());
    }
}
