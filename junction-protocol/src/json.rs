//! JSON snapshot decoding

use alloc::format;
use alloc::string::String;

use serde::Deserialize;
use serde_json::Value;

use junction_core::lane::{LaneState, SignalColor, Snapshot, NUM_LANES};
use junction_core::traits::{ParseError, SnapshotParser};

/// One lane object as sent by the authority
#[derive(Debug, Deserialize)]
struct WireLane {
    light: String,
    emergency: bool,
    remaining_time: u32,
    vehicle_count: u32,
    /// Fractional on the wire (bikes weigh 0.5)
    weight: f64,
}

/// First weight that no longer fits a `u32` after truncation
const WEIGHT_LIMIT: f64 = 4_294_967_296.0;

impl WireLane {
    fn into_state(self, number: usize) -> Result<LaneState, ParseError> {
        let color = SignalColor::from_name(&self.light).ok_or_else(|| {
            ParseError::from_fmt(format_args!("lane{}: unknown light {:?}", number, self.light))
        })?;

        // Anything that would saturate the integer weight is rejected too
        if !self.weight.is_finite() || self.weight < 0.0 || self.weight >= WEIGHT_LIMIT {
            return Err(ParseError::from_fmt(format_args!(
                "lane{}: invalid weight",
                number
            )));
        }

        Ok(LaneState {
            color,
            remaining_s: self.remaining_time,
            emergency: self.emergency,
            vehicle_count: self.vehicle_count,
            // Truncates toward zero
            weight: self.weight as u32,
        })
    }
}

/// Parser for the authority's JSON snapshot
///
/// All-or-nothing: any missing lane, missing field or out-of-range value
/// rejects the whole payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotParser;

impl JsonSnapshotParser {
    pub const fn new() -> Self {
        Self
    }
}

fn decode_lane(value: &Value, index: usize) -> Result<LaneState, ParseError> {
    let number = index + 1;
    let wire = WireLane::deserialize(value)
        .map_err(|e| ParseError::from_fmt(format_args!("lane{}: {}", number, e)))?;
    wire.into_state(number)
}

impl SnapshotParser for JsonSnapshotParser {
    fn parse(&self, payload: &[u8]) -> Result<Snapshot, ParseError> {
        let root: Value = serde_json::from_slice(payload)
            .map_err(|e| ParseError::from_fmt(format_args!("{}", e)))?;

        let mut lanes = [LaneState::default(); NUM_LANES];

        match &root {
            Value::Object(map) => {
                for (index, lane) in lanes.iter_mut().enumerate() {
                    let key = format!("lane{}", index + 1);
                    let value = map.get(key.as_str()).ok_or_else(|| {
                        ParseError::from_fmt(format_args!("missing {}", key))
                    })?;
                    *lane = decode_lane(value, index)?;
                }
            }
            Value::Array(items) => {
                if items.len() != NUM_LANES {
                    return Err(ParseError::from_fmt(format_args!(
                        "expected {} lanes, got {}",
                        NUM_LANES,
                        items.len()
                    )));
                }
                for (index, (lane, value)) in lanes.iter_mut().zip(items).enumerate() {
                    *lane = decode_lane(value, index)?;
                }
            }
            _ => return Err(ParseError::new("expected object or array")),
        }

        Ok(Snapshot::new(lanes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TRAFFIC_DATA: &str = include_str!("../test/traffic_data.json");
    const POSITIONAL: &str = include_str!("../test/positional.json");
    const MISSING_LANE: &str = include_str!("../test/missing_lane.json");
    const MISSING_FIELD: &str = include_str!("../test/missing_field.json");
    const SERVER_ERROR: &str = include_str!("../test/server_error.json");

    fn parse(payload: &str) -> Result<Snapshot, ParseError> {
        JsonSnapshotParser.parse(payload.as_bytes())
    }

    #[test]
    fn test_authority_payload() {
        let snapshot = parse(TRAFFIC_DATA).unwrap();

        assert_eq!(snapshot.lanes[0].color, SignalColor::Red);
        assert_eq!(snapshot.lanes[0].remaining_s, 45);
        assert_eq!(snapshot.lanes[1].color, SignalColor::Yellow);
        assert_eq!(snapshot.lanes[1].remaining_s, 3);
        assert_eq!(snapshot.lanes[2].vehicle_count, 7);
        assert!(snapshot.lanes[2].emergency);
        assert_eq!(snapshot.lanes[3].color, SignalColor::Green);
        assert_eq!(snapshot.lanes[3].remaining_s, 12);
    }

    #[test]
    fn test_fractional_weight_truncated() {
        let snapshot = parse(TRAFFIC_DATA).unwrap();
        // 4 cars + 1 bike = 4.5
        assert_eq!(snapshot.lanes[0].weight, 4);
        assert_eq!(snapshot.lanes[3].weight, 0);
    }

    #[test]
    fn test_positional_array() {
        let snapshot = parse(POSITIONAL).unwrap();
        assert_eq!(snapshot.lanes[0].color, SignalColor::Green);
        assert_eq!(snapshot.lanes[3].color, SignalColor::Red);
        assert_eq!(snapshot.lanes[3].remaining_s, 60);
    }

    #[test]
    fn test_missing_lane() {
        let err = parse(MISSING_LANE).unwrap_err();
        assert_eq!(err.message(), "missing lane3");
    }

    #[test]
    fn test_missing_field() {
        let err = parse(MISSING_FIELD).unwrap_err();
        assert!(err.message().starts_with("lane2: missing field `remaining_time`"));
    }

    #[test]
    fn test_error_body_rejected() {
        assert!(parse(SERVER_ERROR).is_err());
    }

    #[test]
    fn test_unknown_light() {
        let payload = TRAFFIC_DATA.replacen("\"yellow\"", "\"blue\"", 1);
        let err = parse(&payload).unwrap_err();
        assert!(err.message().starts_with("lane2: unknown light"));
    }

    #[test]
    fn test_light_first_char() {
        let payload = TRAFFIC_DATA.replacen("\"yellow\"", "\"Y\"", 1);
        assert_eq!(parse(&payload).unwrap().lanes[1].color, SignalColor::Yellow);
    }

    #[test]
    fn test_negative_countdown() {
        let payload = TRAFFIC_DATA.replacen("\"remaining_time\": 45", "\"remaining_time\": -1", 1);
        assert!(parse(&payload).is_err());
    }

    #[test]
    fn test_negative_weight() {
        let payload = TRAFFIC_DATA.replacen("\"weight\": 4.5", "\"weight\": -2", 1);
        let err = parse(&payload).unwrap_err();
        assert_eq!(err.message(), "lane1: invalid weight");
    }

    #[test]
    fn test_oversized_weight() {
        let payload = TRAFFIC_DATA.replacen("\"weight\": 4.5", "\"weight\": 4294967296", 1);
        let err = parse(&payload).unwrap_err();
        assert_eq!(err.message(), "lane1: invalid weight");

        let payload = TRAFFIC_DATA.replacen("\"weight\": 4.5", "\"weight\": 4294967295.5", 1);
        assert_eq!(parse(&payload).unwrap().lanes[0].weight, u32::MAX);
    }

    #[test]
    fn test_short_array() {
        let err = parse("[]").unwrap_err();
        assert_eq!(err.message(), "expected 4 lanes, got 0");
    }

    #[test]
    fn test_truncated_payload() {
        let cut = &TRAFFIC_DATA[..TRAFFIC_DATA.len() / 2];
        assert!(parse(cut).is_err());
    }

    proptest! {
        #[test]
        fn prop_never_panics(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = JsonSnapshotParser.parse(&payload);
        }
    }
}
