use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Playing => render_play(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_play(app: &App, area: Rect, buf: &mut Buffer) {
    let duel = &app.duel;

    // styles
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let blue_bold_style = Style::default().patch(bold_style).fg(Color::Blue);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let question = &duel.question().text;
    let mut question_lines =
        ((question.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16;
    if question.width() <= max_chars_per_line as usize {
        question_lines = 1;
    }

    let option_count = duel.question().options.len() as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Length(question_lines + 1),
                Constraint::Length(option_count + 1),
                Constraint::Length(2),
                Constraint::Min(1),
            ]
            .as_ref(),
        )
        .split(area);

    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(duel.config.player_name.clone(), bold_style),
            Span::styled("  gegen  ", dim_bold_style),
            Span::styled(duel.config.opponent_name.clone(), bold_style),
        ]),
        Line::from(Span::styled(
            format!(
                "Gerät: {}   Punkte: {}",
                duel.question().subject,
                duel.score()
            ),
            magenta_style,
        )),
    ])
    .alignment(Alignment::Center);
    header.render(chunks[0], buf);

    // Level 1 has no round counter, only the total time header.
    let timer_line = match duel.round_label() {
        Some(label) => format!("{}   {}", label, duel.timer_label()),
        None => format!("Gesamtzeit   {}", duel.timer_label()),
    };
    let timer = Paragraph::new(Span::styled(timer_line, dim_bold_style))
        .alignment(Alignment::Center);
    timer.render(chunks[1], buf);

    let question_widget = Paragraph::new(Span::styled(question.clone(), bold_style))
        .alignment(if question_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    question_widget.render(chunks[2], buf);

    let option_lines: Vec<Line> = duel
        .question()
        .options
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            let selected = duel.is_selected(&option.id);
            let marker = if selected { "[x]" } else { "[ ]" };
            let style = if selected {
                blue_bold_style
            } else {
                Style::default()
            };
            Line::from(Span::styled(
                format!("{} {}) {}", marker, idx + 1, option.label),
                style,
            ))
        })
        .collect();
    Paragraph::new(option_lines).render(chunks[3], buf);

    if let Some(status) = &app.status {
        let status_widget = Paragraph::new(Span::styled(
            status.clone(),
            magenta_style.patch(italic_style),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        status_widget.render(chunks[4], buf);
    }

    let instructions = Paragraph::new(Span::styled(
        "(1-4) Antwort wählen / (enter) abgeben / (esc) zurück zur Lobby",
        Style::default()
            .add_modifier(Modifier::DIM)
            .patch(italic_style),
    ))
    .alignment(Alignment::Center);
    instructions.render(chunks[5], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let duel = &app.duel;

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled("Duell beendet", bold_style)),
        Line::from(""),
        Line::from(Span::styled(
            format!(
                "{} / {} Punkte gegen {}",
                app.final_score.unwrap_or_default(),
                duel.settings.total_rounds,
                duel.config.opponent_name
            ),
            green_bold_style,
        )),
    ];

    if let Some(best) = app.best_score {
        lines.push(Line::from(Span::styled(
            format!("Bestwert auf Level {}: {} Punkte", duel.config.level, best),
            Style::default(),
        )));
    }

    if !app.recent.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Letzte Duelle",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )));
        for record in &app.recent {
            let secs = (Local::now() - record.timestamp).num_seconds().max(0) as u64;
            let ago = HumanTime::from(std::time::Duration::from_secs(secs))
                .to_text_en(Accuracy::Rough, Tense::Past);
            lines.push(Line::from(format!(
                "gegen {}: {} / {} ({})",
                record.opponent, record.score, record.total_rounds, ago
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(n)eues Duell / (esc)ape",
        Style::default()
            .add_modifier(Modifier::DIM)
            .patch(italic_style),
    )));

    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(1)].as_ref())
        .split(area);

    widget.render(chunks[0], buf);
}
