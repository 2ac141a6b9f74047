//! Replay scenarios: scripted status reports and the synthetic generator.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rescue_core::config::EngineConfig;
use rescue_core::constants::{EARTH_RADIUS_KM, MAX_LATITUDE};
use rescue_core::enums::AlertStatus;
use rescue_core::types::{Coordinate, SessionId, StatusRecord};
use rescue_core::TrackError;
use rescue_tracking::StatusFeed;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_duration_ms() -> u64 {
    300_000
}

fn default_step_ms() -> u64 {
    1000
}

/// A complete replay: engine settings, sessions and what the feed reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub config: EngineConfig,
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    /// End early once every session has arrived.
    #[serde(default)]
    pub stop_on_arrival: bool,
    pub sessions: Vec<ScenarioSession>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSession {
    pub id: SessionId,
    pub victim: Coordinate,
    /// Responder position known before the first poll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<Coordinate>,
    #[serde(default)]
    pub reports: Vec<ScriptedReport>,
}

/// What the status service answers from `at_ms` onward.
///
/// `error` simulates a transport failure; neither field means no response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedReport {
    pub at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<StatusRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScenarioError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// Status feed answering from a scenario's report timeline.
#[derive(Debug, Default)]
pub struct ScriptedFeed {
    timelines: HashMap<SessionId, Vec<ScriptedReport>>,
}

impl ScriptedFeed {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let timelines = scenario
            .sessions
            .iter()
            .map(|s| {
                let mut reports = s.reports.clone();
                reports.sort_by_key(|r| r.at_ms);
                (s.id.clone(), reports)
            })
            .collect();
        Self { timelines }
    }
}

impl StatusFeed for ScriptedFeed {
    fn fetch(
        &mut self,
        session_id: &SessionId,
        now_ms: u64,
    ) -> Result<Option<StatusRecord>, TrackError> {
        let Some(timeline) = self.timelines.get(session_id) else {
            return Err(TrackError::PollTransport(format!(
                "no alert {session_id} on the server"
            )));
        };
        let Some(report) = timeline.iter().rev().find(|r| r.at_ms <= now_ms) else {
            return Ok(None);
        };
        match (&report.error, &report.record) {
            (Some(reason), _) => Err(TrackError::PollTransport(reason.clone())),
            (None, record) => Ok(record.clone()),
        }
    }
}

/// Inputs for `generate_synthetic`.
#[derive(Debug, Clone)]
pub struct SyntheticParams {
    pub victim: Coordinate,
    pub distance_km: f64,
    pub seed: u64,
    pub failure_rate: f64,
    pub projection_scale: f64,
}

/// Extra replay time after the final report so the marker can settle.
const SETTLE_MS: u64 = 60_000;

/// Build a scenario where one responder drives in from a random bearing.
///
/// Deterministic for a given seed. The first poll finds the alert still
/// pending; the responder is then reported every poll interval along a
/// jittered approach, ending exactly on the victim.
pub fn generate_synthetic(params: &SyntheticParams) -> Scenario {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let config = EngineConfig::new(params.projection_scale);
    let poll_ms = config.poll_interval_ms;

    let bearing = rng.gen_range(0.0..360.0);
    let speed_kmh = config.assumed_speed_kmh * rng.gen_range(0.7..1.1);
    let km_per_poll = speed_kmh * poll_ms as f64 / 3_600_000.0;

    let mut reports = vec![ScriptedReport {
        at_ms: poll_ms,
        record: Some(StatusRecord::unassigned(AlertStatus::Pending, poll_ms)),
        error: None,
    }];

    let mut remaining = params.distance_km;
    let mut at_ms = poll_ms;
    let mut status = AlertStatus::Dispatched;
    while remaining > 0.0 {
        at_ms += poll_ms;
        if rng.gen_bool(params.failure_rate) {
            reports.push(ScriptedReport {
                at_ms,
                record: None,
                error: Some("synthetic outage".into()),
            });
            continue;
        }
        let lateral = rng.gen_range(-0.02..0.02) * remaining.min(1.0);
        let position = offset(&params.victim, bearing, remaining, lateral);
        reports.push(ScriptedReport {
            at_ms,
            record: Some(StatusRecord::at(position, status, at_ms)),
            error: None,
        });
        status = AlertStatus::InProgress;
        remaining -= km_per_poll;
    }

    at_ms += poll_ms;
    reports.push(ScriptedReport {
        at_ms,
        record: Some(StatusRecord::at(params.victim, AlertStatus::InProgress, at_ms)),
        error: None,
    });

    Scenario {
        config,
        duration_ms: at_ms + SETTLE_MS,
        step_ms: default_step_ms(),
        stop_on_arrival: true,
        sessions: vec![ScenarioSession {
            id: SessionId::from(format!("synthetic-{}", params.seed)),
            victim: params.victim,
            seed: None,
            reports,
        }],
    }
}

/// Point `along_km` from `origin` on `bearing_deg`, shifted `lateral_km`
/// to the right. Flat-earth approximation, fine at street distances.
fn offset(origin: &Coordinate, bearing_deg: f64, along_km: f64, lateral_km: f64) -> Coordinate {
    let km_per_degree = EARTH_RADIUS_KM.to_radians();
    let b = bearing_deg.to_radians();
    let north = along_km * b.cos() - lateral_km * b.sin();
    let east = along_km * b.sin() + lateral_km * b.cos();

    let latitude = (origin.latitude + north / km_per_degree).clamp(-MAX_LATITUDE + 1.0, MAX_LATITUDE - 1.0);
    let cos_lat = origin.latitude.to_radians().cos().max(0.01);
    let longitude = origin.longitude + east / (km_per_degree * cos_lat);
    // Keep within [-180, 180].
    let longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    Coordinate::new(latitude, longitude)
}
