//! Test doubles shared by the unit tests

use std::collections::VecDeque;

use crate::lane::{LaneId, LaneState, SignalColor, Snapshot, NUM_LANES};
use crate::render::DisplayContent;
use crate::traits::{codes, ActuatorError, Actuators, ParseError, Transport, TransportError};

/// Actuators that record every write
#[derive(Debug, Default)]
pub struct RecordingActuators {
    signals: [Option<SignalColor>; NUM_LANES],
    signal_history: Vec<(LaneId, SignalColor)>,
    displays: [Option<DisplayContent>; NUM_LANES],
    display_history: [Vec<DisplayContent>; NUM_LANES],
    fail_signal: [bool; NUM_LANES],
    fail_display: [bool; NUM_LANES],
}

impl RecordingActuators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self, lane: LaneId) -> Option<SignalColor> {
        self.signals[lane.index()]
    }

    pub fn signal_writes(&self) -> usize {
        self.signal_history.len()
    }

    pub fn display(&self, lane: LaneId) -> Option<DisplayContent> {
        self.displays[lane.index()]
    }

    pub fn display_history(&self, lane: LaneId) -> &[DisplayContent] {
        &self.display_history[lane.index()]
    }

    pub fn display_writes(&self) -> usize {
        self.display_history.iter().map(Vec::len).sum()
    }

    pub fn fail_signal(&mut self, lane: LaneId, fail: bool) {
        self.fail_signal[lane.index()] = fail;
    }

    pub fn fail_display(&mut self, lane: LaneId, fail: bool) {
        self.fail_display[lane.index()] = fail;
    }
}

impl Actuators for RecordingActuators {
    fn set_lane_signal(&mut self, lane: LaneId, color: SignalColor) -> Result<(), ActuatorError> {
        if self.fail_signal[lane.index()] {
            return Err(ActuatorError::Gpio);
        }
        self.signals[lane.index()] = Some(color);
        self.signal_history.push((lane, color));
        Ok(())
    }

    fn render_display(
        &mut self,
        lane: LaneId,
        content: DisplayContent,
    ) -> Result<(), ActuatorError> {
        if self.fail_display[lane.index()] {
            return Err(ActuatorError::Bus);
        }
        self.displays[lane.index()] = Some(content);
        self.display_history[lane.index()].push(content);
        Ok(())
    }
}

/// Transport replaying scripted results
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    pub connected: bool,
    pub reconnects: VecDeque<Result<(), TransportError>>,
    pub responses: VecDeque<Result<Vec<u8>, TransportError>>,
    pub reconnect_calls: usize,
    pub fetch_calls: usize,
}

impl ScriptedTransport {
    pub fn online() -> Self {
        Self {
            connected: true,
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, body: &str) -> &mut Self {
        self.responses.push_back(Ok(body.as_bytes().to_vec()));
        self
    }

    pub fn fail(&mut self, error: TransportError) -> &mut Self {
        self.responses.push_back(Err(error));
        self
    }
}

impl Transport for ScriptedTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn reconnect(&mut self) -> Result<(), TransportError> {
        self.reconnect_calls += 1;
        let result = self.reconnects.pop_front().unwrap_or(Ok(()));
        self.connected = result.is_ok();
        result
    }

    async fn fetch_snapshot(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.fetch_calls += 1;
        let body = self
            .responses
            .pop_front()
            .unwrap_or(Err(TransportError::RequestFailed(codes::IO)))?;
        if body.len() > buf.len() {
            return Err(TransportError::RequestFailed(codes::OVERFLOW));
        }
        buf[..body.len()].copy_from_slice(&body);
        Ok(body.len())
    }
}

/// Parse `"G12,R0,Y3,R40"`: one color letter and countdown per lane
pub fn compact_parse(payload: &[u8]) -> Result<Snapshot, ParseError> {
    let text = core::str::from_utf8(payload).map_err(|_| ParseError::new("not utf-8"))?;
    let mut lanes = [LaneState::default(); NUM_LANES];
    let mut count = 0;

    for (i, entry) in text.split(',').enumerate() {
        if i >= NUM_LANES {
            return Err(ParseError::new("too many lanes"));
        }
        let color = SignalColor::from_name(entry).ok_or_else(|| ParseError::new("bad color"))?;
        let remaining_s = entry[1..]
            .parse()
            .map_err(|_| ParseError::new("bad countdown"))?;
        lanes[i] = LaneState::new(color, remaining_s);
        count += 1;
    }

    if count != NUM_LANES {
        return Err(ParseError::new("missing lane"));
    }
    Ok(Snapshot::new(lanes))
}

pub fn lane(index: u8) -> LaneId {
    LaneId::new(index).unwrap()
}
