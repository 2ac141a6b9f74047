//! track-replay: drive the tracking engine from a scripted status feed.
//!
//! Usage:
//!   track-replay replay --scenario alert.json [--output frames.jsonl] [--realtime]
//!   track-replay synthetic --victim -1.29,36.82 --distance 2.5 --seed 7 --output alert.json

mod scenario;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rescue_core::constants::SCALE_STREET;
use rescue_core::enums::TrackingStatus;
use rescue_core::events::TrackingEvent;
use rescue_core::state::TrackingFrame;
use rescue_core::types::Coordinate;
use rescue_tracking::{IntervalScheduler, TrackingEngine};

use scenario::{generate_synthetic, Scenario, ScriptedFeed, SyntheticParams};

fn main() {
    init_logging();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "replay" => cmd_replay(&args[2..]),
        "synthetic" => cmd_synthetic(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays a clean JSON-lines stream.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn print_usage() {
    eprintln!(
        "track-replay: responder tracking replay tool\n\
         \n\
         Commands:\n\
         \n\
         replay     Run a scenario through the engine, print frames/events as JSON lines\n\
         \n\
           --scenario <path>  Scenario JSON file\n\
           --output <path>    Write JSON lines here instead of stdout\n\
           --scale <N>        Override the scenario's projection scale\n\
           --realtime         Pace steps against the wall clock\n\
         \n\
         synthetic  Generate a scenario with a responder approaching the victim\n\
         \n\
           --victim <lat,lon> Victim position\n\
           --distance <km>    Starting responder distance (default: 2.0)\n\
           --seed <N>         RNG seed (default: 1)\n\
           --failure-rate <p> Share of polls that fail (default: 0.1)\n\
           --scale <N>        Projection scale (default: {SCALE_STREET})\n\
           --output <path>    Output scenario JSON path\n\
         \n\
         Set RUST_LOG=debug for engine diagnostics.\n"
    );
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    for i in 0..args.len() {
        if args[i] == name && i + 1 < args.len() {
            return Some(&args[i + 1]);
        }
    }
    None
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn parse_coordinate(value: &str) -> Option<Coordinate> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 2 {
        return None;
    }
    let lat: f64 = parts[0].trim().parse().ok()?;
    let lon: f64 = parts[1].trim().parse().ok()?;
    Coordinate::try_new(lat, lon).ok()
}

fn parse_number<T: std::str::FromStr>(args: &[String], name: &str, default: T) -> T {
    match flag_value(args, name) {
        Some(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                eprintln!("Error: invalid value for {name}: {raw}");
                process::exit(1);
            }
        },
        None => default,
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

// --- Replay command ---

/// One line of replay output.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ReplayLine<'a> {
    Frame(&'a TrackingFrame),
    Event(&'a TrackingEvent),
}

fn cmd_replay(args: &[String]) {
    let path = match flag_value(args, "--scenario") {
        Some(p) => PathBuf::from(p),
        None => fail("--scenario <path> is required"),
    };
    let mut scenario = match Scenario::load(&path) {
        Ok(s) => s,
        Err(e) => fail(format!("loading {}: {e}", path.display())),
    };
    if let Some(raw) = flag_value(args, "--scale") {
        match raw.parse() {
            Ok(scale) => scenario.config.projection_scale = scale,
            Err(_) => fail(format!("invalid value for --scale: {raw}")),
        }
    }

    let mut out: Box<dyn Write> = match flag_value(args, "--output") {
        Some(p) => match File::create(p) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => fail(format!("creating {p}: {e}")),
        },
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if let Err(e) = run_replay(&scenario, has_flag(args, "--realtime"), &mut out) {
        fail(e);
    }
    if let Err(e) = out.flush() {
        fail(format!("writing output: {e}"));
    }
}

fn run_replay(scenario: &Scenario, realtime: bool, out: &mut dyn Write) -> Result<(), String> {
    let feed = ScriptedFeed::from_scenario(scenario);
    let mut engine = TrackingEngine::new(scenario.config.clone(), IntervalScheduler::new(), feed)
        .map_err(|e| e.to_string())?;

    for session in &scenario.sessions {
        engine
            .open_session(session.id.clone(), session.victim)
            .map_err(|e| format!("session {}: {e}", session.id))?;
        if let Some(seed) = session.seed {
            if let Some(frame) = engine.seed_target(&session.id, seed).map_err(|e| e.to_string())? {
                write_line(out, &ReplayLine::Frame(&frame))?;
            }
        }
    }
    flush_events(&mut engine, out)?;

    info!(
        sessions = scenario.sessions.len(),
        duration_ms = scenario.duration_ms,
        step_ms = scenario.step_ms,
        "replaying scenario"
    );

    let step_ms = scenario.step_ms.max(1);
    let step_duration = Duration::from_millis(step_ms);
    let mut next_step_time = Instant::now();
    let mut frame_count = 0usize;
    let mut now_ms = 0u64;

    while now_ms < scenario.duration_ms {
        now_ms += step_ms;
        for frame in engine.advance(now_ms) {
            write_line(out, &ReplayLine::Frame(&frame))?;
            frame_count += 1;
        }
        flush_events(&mut engine, out)?;

        if scenario.stop_on_arrival && engine.sessions().all(|s| s.status() == TrackingStatus::Arrived) {
            info!(at_ms = now_ms, "all sessions arrived");
            break;
        }

        if realtime {
            out.flush().map_err(|e| e.to_string())?;
            next_step_time += step_duration;
            let now = Instant::now();
            if next_step_time > now {
                std::thread::sleep(next_step_time - now);
            } else if now - next_step_time > step_duration * 2 {
                // Fell behind: reset instead of bursting.
                warn!(at_ms = now_ms, "replay fell behind wall clock");
                next_step_time = now;
            }
        }
    }

    engine.shutdown();
    flush_events(&mut engine, out)?;
    info!(frames = frame_count, end_ms = now_ms, "replay finished");
    Ok(())
}

fn flush_events(
    engine: &mut TrackingEngine<IntervalScheduler, ScriptedFeed>,
    out: &mut dyn Write,
) -> Result<(), String> {
    for event in engine.drain_events() {
        write_line(out, &ReplayLine::Event(&event))?;
    }
    Ok(())
}

fn write_line(out: &mut dyn Write, line: &ReplayLine<'_>) -> Result<(), String> {
    let json = serde_json::to_string(line).map_err(|e| e.to_string())?;
    writeln!(out, "{json}").map_err(|e| e.to_string())
}

// --- Synthetic command ---

fn cmd_synthetic(args: &[String]) {
    let victim = match flag_value(args, "--victim").and_then(parse_coordinate) {
        Some(c) => c,
        None => fail("--victim <lat,lon> is required"),
    };
    let output = match flag_value(args, "--output") {
        Some(p) => PathBuf::from(p),
        None => fail("--output <path> is required"),
    };

    let params = SyntheticParams {
        victim,
        distance_km: parse_number(args, "--distance", 2.0),
        seed: parse_number(args, "--seed", 1),
        failure_rate: parse_number(args, "--failure-rate", 0.1),
        projection_scale: parse_number(args, "--scale", SCALE_STREET),
    };
    if params.distance_km.is_nan() || params.distance_km <= 0.0 {
        fail("--distance must be positive");
    }
    if !(0.0..1.0).contains(&params.failure_rate) {
        fail("--failure-rate must be in [0, 1)");
    }

    let scenario = generate_synthetic(&params);
    let reports = scenario.sessions.iter().map(|s| s.reports.len()).sum::<usize>();

    match scenario.save(&output) {
        Ok(()) => eprintln!(
            "Wrote {} ({reports} reports, {} ms)",
            output.display(),
            scenario.duration_ms
        ),
        Err(e) => fail(format!("writing {}: {e}", output.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_replay_reaches_victim() {
        let scenario = generate_synthetic(&SyntheticParams {
            victim: Coordinate::new(51.5007, -0.1246),
            distance_km: 1.0,
            seed: 42,
            failure_rate: 0.1,
            projection_scale: SCALE_STREET,
        });

        let mut out = Vec::new();
        run_replay(&scenario, false, &mut out).unwrap();
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        let arrivals = lines
            .iter()
            .filter(|v| v["kind"] == "event" && v["type"] == "Arrived")
            .count();
        assert_eq!(arrivals, 1);
        assert!(lines
            .iter()
            .any(|v| v["kind"] == "frame" && v["status"] == "EnRoute"));
        assert_eq!(
            lines.last().unwrap()["type"],
            "SessionClosed",
            "shutdown closes the session last"
        );
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("-1.29, 36.82"),
            Some(Coordinate::new(-1.29, 36.82))
        );
        assert_eq!(parse_coordinate("91,0"), None);
        assert_eq!(parse_coordinate("1.0"), None);
    }
}
