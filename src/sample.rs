use rand::Rng;

use crate::state::{GoalProjections, MatchReport, PredictionPick, WinProbability};

/// Synthetic report for keyless/offline runs (GOLAZO_DEMO). Probabilities
/// are jittered so consecutive analyses look alive.
pub fn sample_report() -> MatchReport {
    let mut rng = rand::thread_rng();
    let win = jittered_win(&mut rng);
    let over1_5 = round1((78.0 + rng.gen_range(-5.0..5.0f32)).clamp(1.0, 99.0));
    let over2_5 = round1((55.0 + rng.gen_range(-6.0..6.0f32)).clamp(1.0, 99.0));
    let btts = round1((58.0 + rng.gen_range(-12.0..12.0f32)).clamp(1.0, 99.0));

    MatchReport {
        team_home: "Alpha FC".to_string(),
        team_away: "Omega CF".to_string(),
        score: "1-0".to_string(),
        competition: "Liga Demo".to_string(),
        date: "2026-06-14".to_string(),
        win_probability: win,
        goal_projections: GoalProjections { over1_5, over2_5 },
        btts,
        predicted_score: "2-1".to_string(),
        predicted_score_probability: round1(12.0 + rng.gen_range(-3.0..3.0f32)),
        recommendation: PredictionPick {
            market: "Doble Oportunidad".to_string(),
            selection: "1X".to_string(),
            probability: round1(74.0 + rng.gen_range(-4.0..4.0f32)),
            insight: "El local domina la posesión y llega con tres victorias seguidas en casa."
                .to_string(),
        },
        conservative_prediction: PredictionPick {
            market: "Over 1.5".to_string(),
            selection: "Total de Goles".to_string(),
            probability: over1_5,
            insight: "Ambos equipos promedian más de dos goles combinados por partido."
                .to_string(),
        },
        risky_prediction: PredictionPick {
            market: "Resultado Exacto".to_string(),
            selection: "2-1".to_string(),
            probability: round1(11.0 + rng.gen_range(-2.0..2.0f32)),
            insight: "Marcador más repetido en los últimos cruces directos.".to_string(),
        },
        statistical_tips: vec![
            "El local no pierde en casa desde hace ocho jornadas.".to_string(),
            "El visitante encaja gol en el 70% de sus salidas.".to_string(),
            "Cuatro de los últimos cinco cruces superaron los 2.5 goles.".to_string(),
            "El local abre el marcador antes del descanso en el 60% de sus partidos.".to_string(),
            "Se esperan córners altos: ambos promedian más de 10 por partido.".to_string(),
        ],
    }
}

fn jittered_win(rng: &mut impl Rng) -> WinProbability {
    let home = (48.0 + rng.gen_range(-6.0..6.0f32)).max(1.0);
    let draw = (26.0 + rng.gen_range(-4.0..4.0f32)).max(1.0);
    let away = (26.0 + rng.gen_range(-6.0..6.0f32)).max(1.0);
    let sum = home + draw + away;

    WinProbability {
        home: round1(home / sum * 100.0),
        draw: round1(draw / sum * 100.0),
        away: round1(away / sum * 100.0),
    }
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
