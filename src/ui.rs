use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use typrace::{
    leaderboard::{format_accuracy, standings},
    Phase, RaceSession,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn color_for(tag: &str) -> Color {
    match tag {
        "red" => Color::Red,
        "blue" => Color::Blue,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "purple" => Color::Magenta,
        "orange" => Color::Rgb(255, 165, 0),
        _ => Color::White,
    }
}

fn status_text(session: &RaceSession, elapsed: f64) -> String {
    match session.phase {
        Phase::NoSession => "no session yet".to_string(),
        Phase::Lobby => "waiting for the session owner to start".to_string(),
        Phase::Countdown => format!("Starting in {}", session.countdown_remaining),
        Phase::Racing => "go!".to_string(),
        Phase::Finished => format!("finished in {elapsed:.1}s"),
    }
}

fn legend_text(phase: Phase) -> &'static str {
    match phase {
        Phase::NoSession => "(c)reate session / (esc)ape",
        Phase::Lobby => "(enter) start / (ctrl+r) new passage / (esc)ape",
        Phase::Countdown | Phase::Racing => "(ctrl+r) reset / (esc)ape",
        Phase::Finished => "(ctrl+r) race again / (esc)ape",
    }
}

/// Passage with typed characters colored by correctness and the cursor underlined
fn passage_line(session: &RaceSession) -> Line<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = dim_bold_style.add_modifier(Modifier::UNDERLINED);

    let typed: Vec<char> = session.typed.chars().collect();
    let mut spans: Vec<Span> = session
        .passage
        .chars()
        .enumerate()
        .map(|(idx, expected)| match typed.get(idx) {
            Some(&c) if c == expected => Span::styled(expected.to_string(), green_bold_style),
            Some(&c) => Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            None if idx == typed.len() && session.phase == Phase::Racing => {
                Span::styled(expected.to_string(), underlined_dim_bold_style)
            }
            None => Span::styled(expected.to_string(), dim_bold_style),
        })
        .collect();

    let passage_len = session.passage.chars().count();
    if typed.len() > passage_len {
        let extra: String = typed[passage_len..].iter().collect();
        spans.push(Span::styled(extra, red_bold_style));
    }

    Line::from(spans)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.controller.current_state();
        let now = self.controller.now();
        let elapsed = session.elapsed_secs(now);

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2 + 2).max(1);
        let passage_lines =
            ((session.passage.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);
        let lanes = session.participants.len() as u16;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),                  // title
                Constraint::Length(1),                  // status
                Constraint::Length(passage_lines + 2),  // passage
                Constraint::Length(lanes),              // race track
                Constraint::Length(1),                  // stats
                Constraint::Min(0),                     // leaderboard
                Constraint::Length(1),                  // legend
            ])
            .split(area);

        let title = match session.session_id {
            Some(ref id) => format!("typrace · session {id}"),
            None => "typrace".to_string(),
        };
        Paragraph::new(Span::styled(title, bold_style))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let status_style = if session.phase == Phase::Countdown {
            bold_style.fg(Color::Magenta)
        } else {
            italic_style
        };
        Paragraph::new(Span::styled(status_text(session, elapsed), status_style))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(passage_line(session))
            .block(Block::default().borders(Borders::ALL).title("passage"))
            .wrap(Wrap { trim: false })
            .render(chunks[2], buf);

        let lane_areas = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Length(1); session.participants.len()])
            .split(chunks[3]);
        for (p, lane) in session.participants.iter().zip(lane_areas.iter()) {
            Gauge::default()
                .gauge_style(Style::default().fg(color_for(&p.color)))
                .ratio((p.progress / 100.0).clamp(0.0, 1.0))
                .label(format!("{} {} {:.0}%", p.avatar, p.name, p.progress))
                .render(*lane, buf);
        }

        if let Some(me) = session.local_player() {
            Paragraph::new(Span::styled(
                format!(
                    "{}s elapsed   {} wpm   {} acc",
                    elapsed.floor(),
                    me.speed,
                    format_accuracy(me.accuracy)
                ),
                bold_style,
            ))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
        }

        if !session.participants.is_empty() {
            let header = Row::new(vec!["#", "Player", "Speed (WPM)", "Accuracy", "Progress"])
                .style(bold_style.fg(Color::Yellow));
            let rows: Vec<Row> = standings(session)
                .into_iter()
                .map(|s| {
                    Row::new(vec![
                        Cell::from(s.rank.to_string()),
                        Cell::from(format!("{} {}", s.avatar, s.name))
                            .style(Style::default().fg(color_for(&s.color))),
                        Cell::from(s.speed.to_string()),
                        Cell::from(format_accuracy(s.accuracy)),
                        Cell::from(if s.finished {
                            "done".to_string()
                        } else {
                            format!("{:.0}%", s.progress)
                        }),
                    ])
                })
                .collect();

            Table::new(
                rows,
                [
                    Constraint::Length(3),
                    Constraint::Min(14),
                    Constraint::Length(12),
                    Constraint::Length(10),
                    Constraint::Length(9),
                ],
            )
            .header(header)
            .block(Block::default().borders(Borders::TOP).title("leaderboard"))
            .render(chunks[5], buf);
        }

        Paragraph::new(Span::styled(legend_text(session.phase), italic_style))
            .render(chunks[6], buf);
    }
}
