//! Build script for junction-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml at compile time
//! - Generates `node_config.rs` (authority, timing, pin map, pin claiming)

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lanes per node
const LANES: usize = 4;

/// Highest user GPIO on the RP2040
const MAX_GPIO: i64 = 29;

/// UART0 TX/RX to the ESP-01
const RESERVED: [i64; 2] = [0, 1];

/// Pin roles of one lane, in the order they are claimed
const ROLES: [&str; 5] = ["red", "yellow", "green", "display_clk", "display_dio"];

fn main() {
    setup_linker();
    let node = validate_config();
    generate_config(&node);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=WIFI_NETWORK");
    println!("cargo:rerun-if-env-changed=WIFI_PASSWORD");
}

/// Validated node configuration
struct Node {
    host: String,
    port: u16,
    path: String,
    timing: Timing,
    lanes: Vec<Lane>,
}

struct Timing {
    sync_period_ms: u32,
    blink_half_period_ms: u32,
    urgent_threshold_s: u32,
    transition_flash_ms: u32,
    max_reconnect_attempts: u8,
}

struct Lane {
    /// GPIO numbers in `ROLES` order
    pins: [u8; 5],
    active_low: bool,
}

/// Validate node.toml configuration at compile time
fn validate_config() -> Node {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a node.toml configuration file.           ║\n\
            ║  Please create one in the junction-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    let (host, port, path) = validate_authority(&config, &mut errors);
    let timing = validate_timing(&config, &mut errors);
    let lanes = validate_lanes(&config, &mut errors);

    report("Invalid node configuration", &errors);

    println!("cargo:warning=node.toml validated successfully");

    Node {
        host,
        port,
        path,
        timing,
        lanes,
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with every collected error, if any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_authority(config: &toml::Value, errors: &mut Vec<String>) -> (String, u16, String) {
    let authority = match config.get("authority") {
        Some(toml::Value::Table(t)) => t,
        _ => {
            errors.push("Missing [authority] section".to_string());
            return (String::new(), 0, String::new());
        }
    };

    let host = match authority.get("host") {
        Some(toml::Value::String(h)) if !h.is_empty() => h.clone(),
        _ => {
            errors.push("[authority] host must be a non-empty string".to_string());
            String::new()
        }
    };

    let port = match authority.get("port") {
        Some(toml::Value::Integer(p)) if (1..=65535).contains(p) => *p as u16,
        None => 80,
        _ => {
            errors.push("[authority] port must be 1-65535".to_string());
            0
        }
    };

    let path = match authority.get("path") {
        Some(toml::Value::String(p)) if p.starts_with('/') => p.clone(),
        None => "/traffic_data".to_string(),
        _ => {
            errors.push("[authority] path must start with '/'".to_string());
            String::new()
        }
    };

    (host, port, path)
}

/// Read an optional integer in `range`, falling back to `default`
fn timing_value(
    timing: Option<&toml::value::Table>,
    key: &str,
    default: i64,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> i64 {
    match timing.and_then(|t| t.get(key)) {
        None => default,
        Some(toml::Value::Integer(v)) if range.contains(v) => *v,
        Some(_) => {
            errors.push(format!(
                "[timing] {} must be {}-{}",
                key,
                range.start(),
                range.end()
            ));
            default
        }
    }
}

fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) -> Timing {
    let table = config.get("timing").and_then(|t| t.as_table());
    let max = u32::MAX as i64;

    Timing {
        sync_period_ms: timing_value(table, "sync_period_ms", 1000, 100..=max, errors) as u32,
        blink_half_period_ms: timing_value(table, "blink_half_period_ms", 500, 50..=max, errors)
            as u32,
        urgent_threshold_s: timing_value(table, "urgent_threshold_s", 5, 0..=9999, errors) as u32,
        transition_flash_ms: timing_value(table, "transition_flash_ms", 250, 0..=max, errors)
            as u32,
        max_reconnect_attempts: timing_value(table, "max_reconnect_attempts", 10, 1..=255, errors)
            as u8,
    }
}

/// Parse `"gpioN"` (or a bare integer) into a pin number
fn parse_pin(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(n) => Some(*n),
        toml::Value::String(s) => s
            .strip_prefix("gpio")
            .or_else(|| s.strip_prefix("GPIO"))
            .and_then(|n| n.parse().ok()),
        _ => None,
    }
}

fn validate_lanes(config: &toml::Value, errors: &mut Vec<String>) -> Vec<Lane> {
    let lanes = match config.get("lane") {
        Some(toml::Value::Array(a)) => a,
        _ => {
            errors.push(format!("Missing [[lane]] sections - exactly {} required", LANES));
            return Vec::new();
        }
    };

    if lanes.len() != LANES {
        errors.push(format!(
            "Found {} [[lane]] sections, exactly {} required",
            lanes.len(),
            LANES
        ));
    }

    let mut used: Vec<(i64, usize, &str)> = Vec::new();
    let mut parsed = Vec::new();

    for (i, lane) in lanes.iter().enumerate() {
        let number = i + 1;
        let lane = match lane.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("[[lane]] {} must be a table", number));
                continue;
            }
        };

        let mut pins = [0u8; 5];
        for (slot, role) in pins.iter_mut().zip(ROLES) {
            let pin = match lane.get(role).and_then(parse_pin) {
                Some(pin) => pin,
                None => {
                    errors.push(format!("lane{} {} missing or not \"gpioN\"", number, role));
                    continue;
                }
            };

            if !(0..=MAX_GPIO).contains(&pin) {
                errors.push(format!("lane{} {}: gpio{} does not exist", number, role, pin));
                continue;
            }
            if RESERVED.contains(&pin) {
                errors.push(format!(
                    "lane{} {}: gpio{} is reserved for the modem UART",
                    number, role, pin
                ));
                continue;
            }
            if let Some((_, other, other_role)) = used.iter().find(|(p, _, _)| *p == pin) {
                errors.push(format!(
                    "lane{} {}: gpio{} already used by lane{} {}",
                    number, role, pin, other, other_role
                ));
                continue;
            }

            used.push((pin, number, role));
            *slot = pin as u8;
        }

        let active_low = match lane.get("active_low") {
            None => false,
            Some(toml::Value::Boolean(b)) => *b,
            Some(_) => {
                errors.push(format!("lane{} active_low must be true or false", number));
                false
            }
        };

        parsed.push(Lane { pins, active_low });
    }

    parsed
}

/// Write `$OUT_DIR/node_config.rs`
fn generate_config(node: &Node) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut out = String::new();

    out.push_str("// Generated from node.toml by build.rs\n\n");
    out.push_str(&format!("pub const AUTHORITY_HOST: &str = {:?};\n", node.host));
    out.push_str(&format!("pub const AUTHORITY_PORT: u16 = {};\n", node.port));
    out.push_str(&format!("pub const AUTHORITY_PATH: &str = {:?};\n\n", node.path));

    let t = &node.timing;
    out.push_str("pub const TIMING: TimingConfig = TimingConfig {\n");
    out.push_str(&format!("    sync_period_ms: {},\n", t.sync_period_ms));
    out.push_str(&format!("    blink_half_period_ms: {},\n", t.blink_half_period_ms));
    out.push_str(&format!("    urgent_threshold_s: {},\n", t.urgent_threshold_s));
    out.push_str(&format!("    transition_flash_ms: {},\n", t.transition_flash_ms));
    out.push_str(&format!("    max_reconnect_attempts: {},\n", t.max_reconnect_attempts));
    out.push_str("};\n\n");

    out.push_str("pub const CHANNEL_MAP: ChannelMap = ChannelMap::new([\n");
    for lane in &node.lanes {
        let signal = if lane.active_low { "inverted" } else { "new" };
        out.push_str("    LaneChannels {\n");
        for (role, pin) in ROLES.iter().zip(lane.pins) {
            let ctor = if role.starts_with("display") { "new" } else { signal };
            out.push_str(&format!("        {}: PinConfig::{}({}),\n", role, ctor, pin));
        }
        out.push_str("    },\n");
    }
    out.push_str("]);\n\n");

    // Field moves need literal pin names, so claiming is generated too
    out.push_str("/// Take every lane pin from the peripherals, in lane and role order\n");
    out.push_str("macro_rules! take_lane_pins {\n");
    out.push_str("    ($p:expr) => {\n        [\n");
    for lane in &node.lanes {
        out.push_str("            [\n");
        for pin in lane.pins {
            out.push_str(&format!(
                "                embassy_rp::Peri::<embassy_rp::gpio::AnyPin>::from($p.PIN_{}),\n",
                pin
            ));
        }
        out.push_str("            ],\n");
    }
    out.push_str("        ]\n    };\n}\n");

    let mut f = File::create(out_dir.join("node_config.rs")).unwrap();
    f.write_all(out.as_bytes()).unwrap();
}
