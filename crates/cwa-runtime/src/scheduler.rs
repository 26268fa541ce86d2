//! Reaction timer implementations.
//!
//! [`TokioReactionTimer`] runs on wall-clock time inside the host loop;
//! [`SimClockTimer`] is polled by simulations that advance their own clock.

use crate::loops::host_loop::HostEvent;
use cwa_core::{ReactionTimer, TimerToken};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One spawned sleep per vehicle, reported back as a host event.
pub struct TokioReactionTimer {
    events: mpsc::UnboundedSender<HostEvent>,
    pending: HashMap<String, (TimerToken, JoinHandle<()>)>,
}

impl TokioReactionTimer {
    pub fn new(events: mpsc::UnboundedSender<HostEvent>) -> Self {
        Self {
            events,
            pending: HashMap::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Forget a timer that has fired.
    ///
    /// Returns false when `token` is not the vehicle's pending timer, i.e. the
    /// fire was replaced or cancelled while it sat in the queue.
    pub fn fired(&mut self, vehicle_id: &str, token: TimerToken) -> bool {
        if matches!(self.pending.get(vehicle_id), Some((pending, _)) if *pending == token) {
            self.pending.remove(vehicle_id);
            true
        } else {
            false
        }
    }

    /// Drop whatever timer the vehicle has pending, whatever its token.
    pub fn cancel_vehicle(&mut self, vehicle_id: &str) -> bool {
        match self.pending.remove(vehicle_id) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, handle)) in self.pending.drain() {
            handle.abort();
        }
    }
}

impl ReactionTimer for TokioReactionTimer {
    fn schedule(&mut self, vehicle_id: &str, token: TimerToken, delay: Duration) {
        let events = self.events.clone();
        let id = vehicle_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let event = HostEvent::ReactionTimerFired {
                vehicle_id: id,
                token,
            };
            if events.send(event).is_err() {
                tracing::debug!("host loop gone, reaction timer dropped");
            }
        });
        if let Some((_, previous)) = self.pending.insert(vehicle_id.to_string(), (token, handle)) {
            previous.abort();
        }
    }

    fn cancel(&mut self, vehicle_id: &str, token: TimerToken) {
        if matches!(self.pending.get(vehicle_id), Some((pending, _)) if *pending == token) {
            if let Some((_, handle)) = self.pending.remove(vehicle_id) {
                handle.abort();
            }
        }
    }
}

impl Drop for TokioReactionTimer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Timer driven by an external simulation clock in milliseconds.
#[derive(Debug, Default)]
pub struct SimClockTimer {
    now_ms: u64,
    due: HashMap<String, (TimerToken, u64)>,
}

impl SimClockTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Move the clock forward and return the timers that became due,
    /// earliest first.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<(String, TimerToken)> {
        self.now_ms = self.now_ms.max(now_ms);
        let mut due: Vec<(u64, String, TimerToken)> = self
            .due
            .iter()
            .filter(|(_, (_, at))| *at <= self.now_ms)
            .map(|(id, (token, at))| (*at, id.clone(), *token))
            .collect();
        due.sort();
        for (_, id, _) in &due {
            self.due.remove(id);
        }
        due.into_iter().map(|(_, id, token)| (id, token)).collect()
    }

    pub fn is_pending(&self, vehicle_id: &str) -> bool {
        self.due.contains_key(vehicle_id)
    }
}

impl ReactionTimer for SimClockTimer {
    fn schedule(&mut self, vehicle_id: &str, token: TimerToken, delay: Duration) {
        let at = self.now_ms + delay.as_millis() as u64;
        self.due.insert(vehicle_id.to_string(), (token, at));
    }

    fn cancel(&mut self, vehicle_id: &str, token: TimerToken) {
        if matches!(self.due.get(vehicle_id), Some((pending, _)) if *pending == token) {
            self.due.remove(vehicle_id);
        }
    }
}
