use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::capture::ImagePayload;

/// Shown for every analysis failure; the console keeps the specific cause.
pub const ANALYSIS_ERROR_MESSAGE: &str = "No se pudo analizar la imagen. Asegúrate de que es \
una imagen clara de un partido de fútbol e intenta de nuevo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Loading,
    Report,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinProbability {
    pub home: f32,
    pub draw: f32,
    pub away: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProjections {
    pub over1_5: f32,
    pub over2_5: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPick {
    pub market: String,
    pub selection: String,
    pub probability: f32,
    pub insight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub team_home: String,
    pub team_away: String,
    pub score: String,
    pub competition: String,
    pub date: String,
    pub win_probability: WinProbability,
    pub goal_projections: GoalProjections,
    pub btts: f32,
    pub predicted_score: String,
    pub predicted_score_probability: f32,
    pub recommendation: PredictionPick,
    pub conservative_prediction: PredictionPick,
    pub risky_prediction: PredictionPick,
    pub statistical_tips: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BttsVerdict {
    Yes,
    No,
}

impl MatchReport {
    /// Verdict plus the percentage to display next to it. "SÍ" only above
    /// 50; at or below, the complement is shown as confidence in "NO".
    pub fn btts_verdict(&self) -> (BttsVerdict, f32) {
        if self.btts > 50.0 {
            (BttsVerdict::Yes, self.btts)
        } else {
            (BttsVerdict::No, 100.0 - self.btts)
        }
    }

    pub fn score_display(&self) -> &str {
        if self.score.trim().is_empty() {
            "VS"
        } else {
            &self.score
        }
    }
}

pub struct AppState {
    pub phase: Phase,
    pub generation: u64,
    pub report: Option<MatchReport>,
    pub report_elapsed: Option<Duration>,
    pub report_received_at: Option<String>,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub path_input: String,
    pub loading_since: Option<Instant>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Capture,
            generation: 0,
            report: None,
            report_elapsed: None,
            report_received_at: None,
            error: None,
            warning: None,
            path_input: String::new(),
            loading_since: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Back to the capture screen, dropping the report wholesale. Bumping the
    /// generation here is what makes any still-running analysis stale.
    pub fn reset_analysis(&mut self) {
        self.generation += 1;
        self.phase = Phase::Capture;
        self.report = None;
        self.report_elapsed = None;
        self.report_received_at = None;
        self.error = None;
        self.warning = None;
        self.loading_since = None;
        self.path_input.clear();
        self.push_log("[INFO] Reset to capture");
    }
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Analyze {
        generation: u64,
        payload: ImagePayload,
    },
}

pub enum Delta {
    ReportReady {
        generation: u64,
        report: MatchReport,
        elapsed: Duration,
    },
    AnalysisFailed {
        generation: u64,
        message: String,
    },
    Log(String),
}

/// Accepts a validated image for analysis. Returns the command to hand to the
/// provider thread, or `None` while a request is already in flight.
pub fn begin_analysis(state: &mut AppState, payload: ImagePayload) -> Option<ProviderCommand> {
    if state.phase == Phase::Loading {
        return None;
    }
    state.generation += 1;
    state.phase = Phase::Loading;
    state.report = None;
    state.report_elapsed = None;
    state.report_received_at = None;
    state.error = None;
    state.warning = None;
    state.loading_since = Some(Instant::now());
    state.push_log(format!(
        "[INFO] Analysis #{} dispatched ({})",
        state.generation, payload.mime
    ));
    Some(ProviderCommand::Analyze {
        generation: state.generation,
        payload,
    })
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::ReportReady {
            generation,
            report,
            elapsed,
        } => {
            if generation != state.generation {
                state.push_log(format!("[INFO] Stale analysis #{generation} discarded"));
                return;
            }
            state.phase = Phase::Report;
            state.report = Some(report);
            state.report_elapsed = Some(elapsed);
            state.report_received_at = Some(Local::now().format("%H:%M:%S").to_string());
            state.error = None;
            state.warning = None;
            state.loading_since = None;
            state.push_log(format!(
                "[INFO] Report ready in {:.1}s",
                elapsed.as_secs_f32()
            ));
        }
        Delta::AnalysisFailed {
            generation,
            message,
        } => {
            if generation != state.generation {
                state.push_log(format!("[INFO] Stale analysis #{generation} discarded"));
                return;
            }
            state.phase = Phase::Failed;
            state.report = None;
            state.report_elapsed = None;
            state.error = Some(message);
            state.loading_since = None;
            state.push_log(format!("[WARN] Analysis #{generation} failed"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Capture => "CAPTURA",
        Phase::Loading => "ANALIZANDO",
        Phase::Report => "REPORTE",
        Phase::Failed => "ERROR",
    }
}

pub fn btts_label(verdict: BttsVerdict) -> &'static str {
    match verdict {
        BttsVerdict::Yes => "SÍ",
        BttsVerdict::No => "NO",
    }
}
