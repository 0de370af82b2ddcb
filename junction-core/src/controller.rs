//! Main control loop
//!
//! Owns every piece of state and runs one cooperative iteration per
//! [`Controller::poll`]: a sync cycle when due, pending signal writes,
//! then one render pass. The store has a single writer (the sync cycle)
//! and a single reader (the render pass), both on the caller's task.

use crate::blink::{BlinkClock, BlinkPhase};
use crate::config::TimingConfig;
use crate::fault::FaultLatch;
use crate::lane::{LaneId, NUM_LANES};
use crate::render::RenderLoop;
use crate::store::LaneStateStore;
use crate::sync::{LinkState, SyncOutcome, SyncScheduler};
use crate::traits::{ActuatorError, Actuators, SnapshotParser, Transport, TransportError};

/// Byte budget for one snapshot payload
pub const PAYLOAD_BUDGET: usize = 1024;

/// Traffic signal endpoint controller
pub struct Controller<T, P, A> {
    timing: TimingConfig,
    store: LaneStateStore,
    sync: SyncScheduler,
    blink: BlinkClock,
    render: RenderLoop,
    faults: FaultLatch,
    transport: T,
    parser: P,
    actuators: A,
    buf: [u8; PAYLOAD_BUDGET],
    /// Lanes whose signal head does not yet match the store
    pending_signal: [bool; NUM_LANES],
    last_actuator_error: Option<ActuatorError>,
}

impl<T, P, A> Controller<T, P, A>
where
    T: Transport,
    P: SnapshotParser,
    A: Actuators,
{
    pub fn new(timing: TimingConfig, transport: T, parser: P, actuators: A) -> Self {
        Self {
            timing,
            store: LaneStateStore::new(),
            sync: SyncScheduler::new(timing.sync_period_ms, timing.max_reconnect_attempts),
            blink: BlinkClock::new(0, timing.blink_half_period_ms),
            render: RenderLoop::new(timing.urgent_threshold_s, timing.transition_flash_ms),
            faults: FaultLatch::new(),
            transport,
            parser,
            actuators,
            buf: [0; PAYLOAD_BUDGET],
            pending_signal: [true; NUM_LANES],
            last_actuator_error: None,
        }
    }

    /// Bring every output to the startup state
    ///
    /// Signals go to the stored color (red) and displays are rendered once.
    /// The first sync cycle is due at `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        self.blink = BlinkClock::new(now_ms, self.timing.blink_half_period_ms);
        self.sync.start(now_ms);
        self.pending_signal = [true; NUM_LANES];
        self.render.invalidate();

        self.drive_signals();
        self.render_pass(now_ms);
    }

    /// Run one main-loop iteration
    ///
    /// Returns the sync outcome when a cycle ran. Actuator failures do not
    /// stop the loop; see [`Controller::take_actuator_error`].
    pub async fn poll(&mut self, now_ms: u64) -> Option<SyncOutcome> {
        let outcome = if self.sync.is_due(now_ms) {
            let outcome = self
                .sync
                .run_cycle(
                    now_ms,
                    &mut self.transport,
                    &self.parser,
                    &mut self.store,
                    &mut self.buf,
                )
                .await;
            self.handle_outcome(&outcome, now_ms);
            Some(outcome)
        } else {
            None
        };

        self.drive_signals();
        self.render_pass(now_ms);

        outcome
    }

    fn handle_outcome(&mut self, outcome: &SyncOutcome, now_ms: u64) {
        match outcome {
            SyncOutcome::Applied(changes) => {
                self.faults.clear();
                for lane in changes.transitions() {
                    self.pending_signal[lane.index()] = true;
                    self.render.trigger_flash(lane, now_ms);
                }
            }
            SyncOutcome::TransportFailed(error) => self.faults.record_transport(*error),
            SyncOutcome::ParseFailed(error) => self.faults.record_parse(error),
            SyncOutcome::LinkLost(_) => self.faults.record_transport(TransportError::NotConnected),
            SyncOutcome::Reconnected | SyncOutcome::Reconnecting { .. } => {}
        }
    }

    /// Write signal heads that do not yet match the store
    fn drive_signals(&mut self) {
        for lane in LaneId::all() {
            if !self.pending_signal[lane.index()] {
                continue;
            }
            let color = self.store.get(lane).color;
            match self.actuators.set_lane_signal(lane, color) {
                Ok(()) => self.pending_signal[lane.index()] = false,
                Err(e) => self.last_actuator_error = Some(e),
            }
        }
    }

    fn render_pass(&mut self, now_ms: u64) {
        let phase = self.blink.tick(now_ms);
        let fault = self.faults.display_fault();
        let store = &self.store;

        if let Err(e) = self
            .render
            .render(now_ms, phase, fault, |lane| store.get(lane), &mut self.actuators)
        {
            self.last_actuator_error = Some(e);
        }
    }

    /// Most recent actuator failure since the last call
    pub fn take_actuator_error(&mut self) -> Option<ActuatorError> {
        self.last_actuator_error.take()
    }

    /// Whether the lane's signal head still needs to be written
    pub fn signal_pending(&self, lane: LaneId) -> bool {
        self.pending_signal[lane.index()]
    }

    pub fn store(&self) -> &LaneStateStore {
        &self.store
    }

    pub fn faults(&self) -> &FaultLatch {
        &self.faults
    }

    pub fn link_state(&self) -> LinkState {
        self.sync.link_state()
    }

    pub fn blink_phase(&self) -> BlinkPhase {
        self.blink.phase()
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    pub fn actuators_mut(&mut self) -> &mut A {
        &mut self.actuators
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
