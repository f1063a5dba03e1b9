use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, Paragraph, Wrap};

mod capture;
mod gemini;
mod http_client;
mod sample;
mod state;
mod worker;

use crate::capture::INVALID_IMAGE_WARNING;
use crate::state::{
    apply_delta, begin_analysis, btts_label, phase_label, AppState, BttsVerdict, MatchReport,
    Phase, PredictionPick, ProviderCommand, WinProbability, ANALYSIS_ERROR_MESSAGE,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        if self.state.help_overlay {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
            ) {
                self.state.help_overlay = false;
            }
            return;
        }

        match self.state.phase {
            Phase::Capture | Phase::Failed => self.on_capture_key(key),
            Phase::Loading => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') => self.state.help_overlay = true,
                KeyCode::Char('r') => self.state.reset_analysis(),
                _ => {}
            },
            Phase::Report => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') => self.state.help_overlay = true,
                KeyCode::Char('r') | KeyCode::Esc => self.state.reset_analysis(),
                _ => {}
            },
        }
    }

    // The path field swallows printable keys, so quit/help only react while
    // it is empty; Ctrl+C always works.
    fn on_capture_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit_path(),
            KeyCode::Backspace => {
                self.state.path_input.pop();
            }
            KeyCode::Esc => {
                if self.state.phase == Phase::Failed {
                    self.state.reset_analysis();
                } else {
                    self.state.path_input.clear();
                    self.state.warning = None;
                }
            }
            KeyCode::Char('q') if self.state.path_input.is_empty() => self.should_quit = true,
            KeyCode::Char('?') if self.state.path_input.is_empty() => {
                self.state.help_overlay = true;
            }
            KeyCode::Char(c) => self.state.path_input.push(c),
            _ => {}
        }
    }

    fn on_paste(&mut self, text: &str) {
        if !matches!(self.state.phase, Phase::Capture | Phase::Failed) {
            return;
        }
        let cleaned = capture::sanitize_path(text);
        if cleaned.is_empty() {
            return;
        }
        self.state.path_input = cleaned;
        self.submit_path();
    }

    fn submit_path(&mut self) {
        let raw = self.state.path_input.clone();
        if raw.trim().is_empty() {
            self.state.warning = Some("Escribe la ruta de una captura primero".to_string());
            return;
        }
        match capture::load_image_payload(&raw) {
            Ok(payload) => {
                self.state.warning = None;
                self.dispatch_analysis(payload);
            }
            Err(err) => {
                self.state.warning = Some(INVALID_IMAGE_WARNING.to_string());
                self.state.push_log(format!("[WARN] Image rejected: {err:#}"));
            }
        }
    }

    fn dispatch_analysis(&mut self, payload: capture::ImagePayload) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Analysis provider unavailable");
            return;
        };
        let Some(cmd) = begin_analysis(&mut self.state, payload) else {
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.phase = Phase::Failed;
            self.state.error = Some(ANALYSIS_ERROR_MESSAGE.to_string());
            self.state.loading_since = None;
            self.state.push_log("[WARN] Analysis provider is gone");
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    worker::spawn_analysis_provider(tx, cmd_rx);

    let mut app = App::new(Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        app.on_key(key);
                    }
                }
                Event::Paste(text) => app.on_paste(&text),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header =
        Paragraph::new(header_text(&app.state)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.phase {
        Phase::Capture | Phase::Loading | Phase::Failed => {
            render_capture(frame, chunks[1], &app.state)
        }
        Phase::Report => render_report(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Consola").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer =
        Paragraph::new(footer_text(&app.state)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let line1 = format!("  ,-.   GOLAZO TERMINAL | {}", phase_label(state.phase));
    let line2 = " ( o )  Analiza partidos con IA".to_string();
    let line3 = "  `-'".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    match state.phase {
        Phase::Capture => {
            "Enter Analizar | Ctrl+V Pegar ruta | Esc Limpiar | ? Ayuda / q Salir (campo vacío) | Ctrl+C Salir"
                .to_string()
        }
        Phase::Failed => {
            "Enter Reintentar | Esc Volver | ? Ayuda / q Salir (campo vacío) | Ctrl+C Salir"
                .to_string()
        }
        Phase::Loading => "r Cancelar | ? Ayuda | q Salir".to_string(),
        Phase::Report => "r Analizar otra imagen | Esc Volver | ? Ayuda | q Salir".to_string(),
    }
}

fn render_capture(frame: &mut Frame, area: Rect, state: &AppState) {
    let error_height = if state.error.is_some() { 3 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(error_height),
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    if let Some(error) = &state.error {
        let banner = Paragraph::new(error.clone())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, rows[0]);
    }

    let headline = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "Analiza partidos con ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "IA",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(
            "Sube una captura del partido y obtén el reporte estadístico al instante",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(headline, rows[1]);

    let input_block = Block::default()
        .title("Captura del partido")
        .borders(Borders::ALL);
    let inner = input_block.inner(rows[2]);
    frame.render_widget(input_block, rows[2]);
    if inner.height > 0 {
        let typing = matches!(state.phase, Phase::Capture | Phase::Failed);
        let cursor = if typing { "█" } else { "" };
        let path_style = if typing {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let input = Paragraph::new(vec![
            Line::from(vec![
                Span::styled("Ruta: ", Style::default().fg(Color::Gray)),
                Span::styled(format!("{}{cursor}", state.path_input), path_style),
            ]),
            Line::from(Span::styled(
                "Arrastra la imagen a la terminal, pega la ruta (Ctrl+V) o escríbela y pulsa Enter",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        frame.render_widget(input, inner);
    }

    let status = if let Some(warning) = &state.warning {
        Paragraph::new(warning.clone())
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true })
    } else {
        Paragraph::new("Formatos: PNG, JPG, JPEG, WEBP, GIF")
            .style(Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(status, rows[3]);

    if state.phase == Phase::Loading {
        let elapsed = state
            .loading_since
            .map(|since| since.elapsed())
            .unwrap_or(Duration::ZERO);
        let dots = ".".repeat(1 + (elapsed.as_millis() / 400) as usize % 3);
        let loading = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Analizando{dots} ({}s)", elapsed.as_secs()),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Procesando modelos estadísticos...",
                Style::default().fg(Color::Green),
            )),
        ]);
        frame.render_widget(loading, rows[4]);
    }
}

fn render_report(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(report) = &state.report else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Min(7),
        ])
        .split(area);

    render_match_banner(frame, rows[0], state, report);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(rows[1]);
    render_pick_card(frame, cards[0], "RECOMENDADO", &report.recommendation, Color::Green);
    render_predicted_score_card(frame, cards[1], report);
    render_btts_card(frame, cards[2], report);

    let strategy = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    render_pick_card(
        frame,
        strategy[0],
        "RESERVADA",
        &report.conservative_prediction,
        Color::Blue,
    );
    render_pick_card(
        frame,
        strategy[1],
        "ARRIESGADA",
        &report.risky_prediction,
        Color::Magenta,
    );

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(30),
            Constraint::Percentage(36),
        ])
        .split(rows[3]);
    render_win_distribution(frame, bottom[0], report);
    render_goal_projections(frame, bottom[1], report);

    let tips = Paragraph::new(tips_text(report))
        .block(
            Block::default()
                .title("Claves del Partido")
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(tips, bottom[2]);
}

fn render_match_banner(frame: &mut Frame, area: Rect, state: &AppState, report: &MatchReport) {
    let block = Block::default()
        .title("Reporte del Partido")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let team_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("LOCAL ", label_style),
            Span::styled(report.team_home.clone(), team_style),
            Span::styled(
                format!("   {}   ", report.score_display()),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(report.team_away.clone(), team_style),
            Span::styled(" VISITANTE", label_style),
        ]),
        Line::from(Span::styled(
            format!("{} | {}", report.competition, report.date),
            Style::default().fg(Color::Gray),
        )),
    ];
    let mut stamp = "Análisis generado por IA".to_string();
    if let Some(at) = &state.report_received_at {
        stamp.push_str(&format!(" · {at}"));
    }
    if let Some(elapsed) = state.report_elapsed {
        stamp.push_str(&format!(" · {:.1}s", elapsed.as_secs_f32()));
    }
    lines.push(Line::from(Span::styled(stamp, label_style)));

    let banner = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(banner, inner);
}

fn render_pick_card(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    pick: &PredictionPick,
    accent: Color,
) {
    let block = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            pick.market.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            pick.selection.clone(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(vec![
            Span::styled(
                format_pct(pick.probability),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" Prob. Estimada", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            Span::styled("Motivo: ", Style::default().fg(accent)),
            Span::raw(pick.insight.clone()),
        ]),
    ])
    .wrap(Wrap { trim: true });
    frame.render_widget(text, inner);
}

fn render_predicted_score_card(frame: &mut Frame, area: Rect, report: &MatchReport) {
    let block = Block::default()
        .title("MARCADOR PROBABLE")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            report.predicted_score.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Probabilidad: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_pct(report.predicted_score_probability),
                Style::default().fg(Color::Green),
            ),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(text, inner);
}

fn render_btts_card(frame: &mut Frame, area: Rect, report: &MatchReport) {
    let block = Block::default().title("AMBOS MARCAN").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let (verdict, pct) = report.btts_verdict();
    let color = match verdict {
        BttsVerdict::Yes => Color::Green,
        BttsVerdict::No => Color::Red,
    };
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            btts_label(verdict),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Probabilidad: ", Style::default().fg(Color::Gray)),
            Span::styled(format_pct(pct), Style::default().fg(color)),
        ]),
    ])
    .alignment(Alignment::Center);
    frame.render_widget(text, inner);
}

fn render_win_distribution(frame: &mut Frame, area: Rect, report: &MatchReport) {
    let block = Block::default()
        .title("Distribución de Victoria")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    frame.render_widget(win_bar_chart(&report.win_probability), chunks[0]);

    let win = &report.win_probability;
    let legend = Line::from(vec![
        Span::styled(
            format!("{} {:.0}%", report.team_home, win.home),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            format!("Empate {:.0}%", win.draw),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} {:.0}%", report.team_away, win.away),
            Style::default().fg(Color::Red),
        ),
    ]);
    frame.render_widget(Paragraph::new(legend), chunks[1]);
}

fn win_bar_chart(win: &WinProbability) -> BarChart<'static> {
    let home = Bar::default()
        .value(win.home.round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Green));
    let draw = Bar::default()
        .value(win.draw.round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Yellow));
    let away = Bar::default()
        .value(win.away.round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[home, draw, away]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

fn render_goal_projections(frame: &mut Frame, area: Rect, report: &MatchReport) {
    let block = Block::default()
        .title("Proyección de Goles")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);
    render_projection_gauge(frame, rows[0], "Over 1.5", report.goal_projections.over1_5);
    render_projection_gauge(frame, rows[1], "Over 2.5", report.goal_projections.over2_5);
}

fn render_projection_gauge(frame: &mut Frame, area: Rect, label: &str, pct: f32) {
    if area.height == 0 || area.width < 12 {
        return;
    }
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(9), Constraint::Min(5)])
        .split(area);
    frame.render_widget(Paragraph::new(label.to_string()), cols[0]);

    let ratio = f64::from(pct.clamp(0.0, 100.0)) / 100.0;
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
        .ratio(ratio)
        .label(format_pct(pct));
    frame.render_widget(gauge, cols[1]);
}

fn tips_text(report: &MatchReport) -> String {
    if report.statistical_tips.is_empty() {
        return "Sin claves disponibles".to_string();
    }
    report
        .statistical_tips
        .iter()
        .enumerate()
        .map(|(idx, tip)| format!("{:02}. {tip}", idx + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "Sin actividad".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_pct(value: f32) -> String {
    if (value - value.round()).abs() < 0.05 {
        format!("{value:.0}%")
    } else {
        format!("{value:.1}%")
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Golazo Terminal - Ayuda",
        "",
        "Captura:",
        "  Escribir         Añade caracteres a la ruta",
        "  Enter            Envía la imagen a analizar",
        "  Ctrl+V / soltar  Pega la ruta y analiza al momento",
        "  Esc              Limpia el campo / cierra el error",
        "  ? / q            Ayuda / salir (con el campo vacío)",
        "",
        "Reporte:",
        "  r                Analizar otra imagen",
        "  Esc              Volver a la captura",
        "",
        "Global:",
        "  Ctrl+C           Salir",
        "  ?                Cerrar esta ayuda",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Ayuda").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
