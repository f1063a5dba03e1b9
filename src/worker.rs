use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::gemini::{self, GeminiConfig};
use crate::sample;
use crate::state::{ANALYSIS_ERROR_MESSAGE, Delta, ProviderCommand};

/// One request at a time: commands are handled in order on this thread, and
/// the UI does not submit while one is in flight. A reset on the UI side
/// only bumps the generation; the result of a superseded command still
/// arrives here and is dropped by `apply_delta`.
pub fn spawn_analysis_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let cfg = GeminiConfig::from_env();
        if cfg.demo {
            let _ = tx.send(Delta::Log(
                "[INFO] Demo provider active (GOLAZO_DEMO)".to_string(),
            ));
        } else if cfg.api_key.is_none() {
            let _ = tx.send(Delta::Log(
                "[WARN] GEMINI_API_KEY not set; analyses will fail".to_string(),
            ));
        } else {
            let _ = tx.send(Delta::Log(format!("[INFO] Model: {}", cfg.model)));
        }

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::Analyze {
                    generation,
                    payload,
                } => {
                    let started = Instant::now();
                    let result = if cfg.demo {
                        thread::sleep(Duration::from_millis(600));
                        Ok(sample::sample_report())
                    } else {
                        gemini::analyze_image(&cfg, &payload)
                    };
                    match result {
                        Ok(report) => {
                            let _ = tx.send(Delta::ReportReady {
                                generation,
                                report,
                                elapsed: started.elapsed(),
                            });
                        }
                        Err(err) => {
                            let _ =
                                tx.send(Delta::Log(format!("[WARN] Analysis error: {err:#}")));
                            let _ = tx.send(Delta::AnalysisFailed {
                                generation,
                                message: ANALYSIS_ERROR_MESSAGE.to_string(),
                            });
                        }
                    }
                }
            }
        }
    });
}
