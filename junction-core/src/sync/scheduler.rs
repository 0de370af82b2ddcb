//! Periodic fetch, parse, apply cycle
//!
//! Each cycle either reconnects or fetches exactly once. Failures are
//! soft: they are reported as a [`SyncOutcome`] and the store is left
//! untouched. Nothing here ever aborts the control loop.

use crate::lane::LaneId;
use crate::store::{ChangeSet, LaneStateStore};
use crate::traits::{ParseError, SnapshotParser, Transport, TransportError};

use super::link::{LinkEvent, LinkState};

/// Result of one sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncOutcome {
    /// Link came up; fetch resumes next cycle
    Reconnected,
    /// Reconnect failed, still within the attempt bound
    Reconnecting { attempts: u8, error: TransportError },
    /// Reconnect failed and the attempt bound is exhausted
    LinkLost(TransportError),
    /// Fetch failed; store unchanged
    TransportFailed(TransportError),
    /// Payload did not parse; store unchanged
    ParseFailed(ParseError),
    /// Snapshot applied
    Applied(ChangeSet),
}

impl SyncOutcome {
    /// Lanes whose color changed in this cycle
    pub fn transitions(&self) -> impl Iterator<Item = LaneId> + '_ {
        let changes = match self {
            SyncOutcome::Applied(changes) => Some(changes),
            _ => None,
        };
        changes.into_iter().flat_map(|c| c.transitions())
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied(_))
    }
}

/// Fixed-period sync driver
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    period_ms: u64,
    max_reconnect_attempts: u8,
    next_due_ms: u64,
    link: LinkState,
}

impl SyncScheduler {
    /// Create a scheduler whose first cycle is due immediately
    pub fn new(period_ms: u32, max_reconnect_attempts: u8) -> Self {
        Self {
            period_ms: u64::from(period_ms.max(1)),
            max_reconnect_attempts,
            next_due_ms: 0,
            link: LinkState::default(),
        }
    }

    /// Make the next cycle due at `now_ms`
    pub fn start(&mut self, now_ms: u64) {
        self.next_due_ms = now_ms;
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.next_due_ms
    }

    /// Timestamp of the next cycle
    pub fn next_due_ms(&self) -> u64 {
        self.next_due_ms
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    /// Keep the grid aligned; skip missed periods instead of bursting
    fn schedule_next(&mut self, now_ms: u64) {
        self.next_due_ms += self.period_ms;
        if self.next_due_ms <= now_ms {
            self.next_due_ms = now_ms + self.period_ms;
        }
    }

    /// Run one fetch, parse, apply cycle
    ///
    /// A disconnected transport gets one reconnect attempt and no fetch.
    /// On success the snapshot replaces the store wholesale; on any
    /// failure the store is not touched.
    pub async fn run_cycle<T, P>(
        &mut self,
        now_ms: u64,
        transport: &mut T,
        parser: &P,
        store: &mut LaneStateStore,
        buf: &mut [u8],
    ) -> SyncOutcome
    where
        T: Transport + ?Sized,
        P: SnapshotParser + ?Sized,
    {
        self.schedule_next(now_ms);

        if !transport.is_connected() {
            self.link = self
                .link
                .transition(LinkEvent::Disconnected, self.max_reconnect_attempts);

            return match transport.reconnect().await {
                Ok(()) => {
                    self.link = self
                        .link
                        .transition(LinkEvent::Connected, self.max_reconnect_attempts);
                    SyncOutcome::Reconnected
                }
                Err(error) => {
                    self.link = self
                        .link
                        .transition(LinkEvent::AttemptFailed, self.max_reconnect_attempts);
                    match self.link {
                        LinkState::Connecting { attempts } => {
                            SyncOutcome::Reconnecting { attempts, error }
                        }
                        _ => SyncOutcome::LinkLost(error),
                    }
                }
            };
        }

        self.link = self
            .link
            .transition(LinkEvent::Connected, self.max_reconnect_attempts);

        let len = match transport.fetch_snapshot(buf).await {
            Ok(len) => len.min(buf.len()),
            Err(error) => return SyncOutcome::TransportFailed(error),
        };

        match parser.parse(&buf[..len]) {
            Ok(snapshot) => SyncOutcome::Applied(store.apply(snapshot)),
            Err(error) => SyncOutcome::ParseFailed(error),
        }
    }
}
