//! End-to-end control loop with the JSON parser

use std::collections::VecDeque;

use embassy_futures::block_on;

use junction_core::config::TimingConfig;
use junction_core::sync::SyncOutcome;
use junction_core::traits::{
    ActuatorError, Actuators, Transport, TransportError, PARSE_ERROR_CODE,
};
use junction_core::{Controller, DisplayContent, ErrorKind, LaneId, SignalColor, NUM_LANES};
use junction_protocol::JsonSnapshotParser;

const TRAFFIC_DATA: &str = include_str!("../test/traffic_data.json");
const POSITIONAL: &str = include_str!("../test/positional.json");

/// Serves queued HTTP results
struct FakeAuthority {
    responses: VecDeque<Result<&'static str, TransportError>>,
}

impl Transport for FakeAuthority {
    fn is_connected(&self) -> bool {
        true
    }

    async fn reconnect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn fetch_snapshot(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let body = self
            .responses
            .pop_front()
            .unwrap_or(Err(TransportError::NotConnected))?;
        buf[..body.len()].copy_from_slice(body.as_bytes());
        Ok(body.len())
    }
}

#[derive(Default)]
struct Outputs {
    signals: [Option<SignalColor>; NUM_LANES],
    displays: [Option<DisplayContent>; NUM_LANES],
}

impl Actuators for Outputs {
    fn set_lane_signal(&mut self, lane: LaneId, color: SignalColor) -> Result<(), ActuatorError> {
        self.signals[lane.index()] = Some(color);
        Ok(())
    }

    fn render_display(
        &mut self,
        lane: LaneId,
        content: DisplayContent,
    ) -> Result<(), ActuatorError> {
        self.displays[lane.index()] = Some(content);
        Ok(())
    }
}

fn controller(
    responses: &[Result<&'static str, TransportError>],
) -> Controller<FakeAuthority, JsonSnapshotParser, Outputs> {
    let transport = FakeAuthority {
        responses: responses.iter().copied().collect(),
    };
    let mut c = Controller::new(
        TimingConfig::default(),
        transport,
        JsonSnapshotParser,
        Outputs::default(),
    );
    c.start(0);
    c
}

fn lane(index: u8) -> LaneId {
    LaneId::new(index).unwrap()
}

#[test]
fn test_authority_snapshot_drives_outputs() {
    let mut c = controller(&[Ok(TRAFFIC_DATA)]);

    let outcome = block_on(c.poll(0)).unwrap();
    assert!(outcome.is_applied());

    // lane2 turned yellow and lane4 green
    let transitions: Vec<_> = outcome.transitions().collect();
    assert_eq!(transitions, vec![lane(1), lane(3)]);

    let out = c.actuators();
    assert_eq!(out.signals[0], Some(SignalColor::Red));
    assert_eq!(out.signals[1], Some(SignalColor::Yellow));
    assert_eq!(out.signals[3], Some(SignalColor::Green));
    assert_eq!(c.store().emergency_lane(), Some(lane(2)));

    // After the flash, on-phase blanks only the urgent (yellow) lane
    block_on(c.poll(300));
    let out = c.actuators();
    assert_eq!(out.displays[0], Some(DisplayContent::Digits(45)));
    assert_eq!(out.displays[1], Some(DisplayContent::Blank));
    assert_eq!(out.displays[3], Some(DisplayContent::Digits(12)));

    // Off-phase shows every countdown
    block_on(c.poll(500));
    let out = c.actuators();
    assert_eq!(out.displays[0], Some(DisplayContent::Digits(45)));
    assert_eq!(out.displays[1], Some(DisplayContent::Digits(3)));
}

#[test]
fn test_server_error_then_recovery() {
    let mut c = controller(&[
        Ok(TRAFFIC_DATA),
        Err(TransportError::Status(500)),
        Ok(POSITIONAL),
    ]);

    block_on(c.poll(0));
    let failed = block_on(c.poll(1000)).unwrap();
    assert_eq!(failed, SyncOutcome::TransportFailed(TransportError::Status(500)));
    for display in c.actuators().displays {
        assert_eq!(display, Some(DisplayContent::ErrorCode(ErrorKind::Transport, 500)));
    }
    assert_eq!(c.actuators().signals[3], Some(SignalColor::Green));

    block_on(c.poll(2000));
    assert!(!c.faults().is_faulted());
    assert_eq!(c.actuators().signals[0], Some(SignalColor::Green));
    assert_eq!(c.actuators().signals[3], Some(SignalColor::Red));
}

#[test]
fn test_malformed_body_shows_parse_code() {
    let mut c = controller(&[Ok(TRAFFIC_DATA), Ok("<html>502 Bad Gateway</html>")]);

    block_on(c.poll(0));
    let before = c.store().get(lane(0));

    let outcome = block_on(c.poll(1000)).unwrap();
    assert!(matches!(outcome, SyncOutcome::ParseFailed(_)));
    assert_eq!(c.store().get(lane(0)), before);
    assert_eq!(
        c.actuators().displays[2],
        Some(DisplayContent::ErrorCode(ErrorKind::Parse, PARSE_ERROR_CODE))
    );
}
