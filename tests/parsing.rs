use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use golazo_terminal::capture::ImagePayload;
use golazo_terminal::gemini::{build_request_body, parse_report_response, parse_report_text};
use golazo_terminal::state::BttsVerdict;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_envelope_fixture_into_full_report() {
    let raw = read_fixture("gemini_envelope.json");
    let report = parse_report_response(&raw).expect("fixture should parse");
    assert_eq!(report.team_home, "Deportivo Norte");
    assert_eq!(report.team_away, "Atlético Sur");
    assert_eq!(report.score, "1-0");
    assert_eq!(report.competition, "Copa de Verano");
    assert_eq!(report.date, "2026-06-14");
    assert_eq!(report.win_probability.home, 48.0);
    assert_eq!(report.win_probability.draw, 27.0);
    assert_eq!(report.win_probability.away, 25.0);
    assert_eq!(report.goal_projections.over1_5, 78.0);
    assert_eq!(report.goal_projections.over2_5, 55.5);
    assert_eq!(report.btts, 62.5);
    assert_eq!(report.predicted_score, "2-1");
    assert_eq!(report.predicted_score_probability, 14.5);
    assert_eq!(report.recommendation.market, "Doble Oportunidad");
    assert_eq!(report.recommendation.selection, "1X");
    assert_eq!(report.conservative_prediction.probability, 78.0);
    assert_eq!(report.risky_prediction.selection, "2-1");
    assert_eq!(report.statistical_tips.len(), 5);
}

#[test]
fn parses_bare_report_fixture() {
    let raw = read_fixture("report.json");
    let report = parse_report_text(&raw).expect("fixture should parse");
    assert_eq!(report.team_home, "Deportivo Norte");
    let (verdict, pct) = report.btts_verdict();
    assert_eq!(verdict, BttsVerdict::Yes);
    assert_eq!(pct, 62.5);
}

#[test]
fn fenced_report_still_parses() {
    let raw = read_fixture("report.json");
    let fenced = format!("```json\n{raw}\n```");
    let report = parse_report_text(&fenced).expect("fenced payload should parse");
    assert_eq!(report.team_away, "Atlético Sur");
}

#[test]
fn empty_candidate_text_is_an_error() {
    let raw = read_fixture("gemini_envelope_empty.json");
    assert!(parse_report_response(&raw).is_err());
}

#[test]
fn missing_required_field_is_an_error() {
    let raw = read_fixture("report.json");
    let mut value: Value = serde_json::from_str(&raw).expect("fixture should be json");
    value
        .as_object_mut()
        .expect("fixture is an object")
        .remove("btts");
    let broken = serde_json::to_string(&value).expect("fixture should reserialize");
    assert!(parse_report_text(&broken).is_err());
}

#[test]
fn non_json_reply_is_an_error() {
    assert!(parse_report_text("lo siento, no puedo analizar esta imagen").is_err());
    assert!(parse_report_response("<html>502</html>").is_err());
}

#[test]
fn request_body_carries_image_then_prompt() {
    let payload = ImagePayload {
        data: "aGVsbG8=".to_string(),
        mime: "image/png",
    };
    let body = build_request_body(&payload);

    let parts = body["contents"][0]["parts"].as_array().expect("parts array");
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["inlineData"]["mimeType"], "image/png");
    assert_eq!(parts[0]["inlineData"]["data"], "aGVsbG8=");
    let prompt = parts[1]["text"].as_str().expect("prompt text");
    assert!(prompt.contains("partido de fútbol"));
    assert!(prompt.contains("Recomendación Principal"));

    assert_eq!(body["generationConfig"]["temperature"], 0.4);
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert!(body["generationConfig"]["responseSchema"].is_object());
}
