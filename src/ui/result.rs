use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph},
};

use crate::app::App;
use crate::quiz::CompletionReason;

const QUESTION_PREVIEW_LENGTH: usize = 55;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(completion) = app.completion() else {
        return;
    };
    let grade_color = get_grade_color(completion.score);

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(7),
        Constraint::Fill(1),
        Constraint::Length(2),
    ])
    .margin(1)
    .split(area);

    let headline = match completion.reason {
        CompletionReason::Finished => "QUIZ COMPLETED",
        CompletionReason::TimeExpired => "TIME'S UP",
    };

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(headline, Style::default().fg(Color::Cyan).bold())),
        Line::from(""),
        Line::from(Span::styled(
            format!("Your score: {}%", completion.score),
            Style::default().fg(grade_color).bold(),
        )),
        Line::from(Span::styled(
            format!(
                "You answered {} out of {} questions correctly.",
                completion.correct, completion.total
            ),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];

    let summary = Paragraph::new(content).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Color::DarkGray),
    );
    frame.render_widget(summary, chunks[1]);

    render_question_breakdown(frame, chunks[2], app, &completion.answers);
    render_controls(frame, chunks[3]);
}

fn get_grade_color(score: u32) -> Color {
    match score {
        90..=100 => Color::Green,
        70..=89 => Color::Cyan,
        50..=69 => Color::Yellow,
        _ => Color::Red,
    }
}

fn render_question_breakdown(frame: &mut Frame, area: Rect, app: &App, answers: &[Option<usize>]) {
    let lines: Vec<Line> = answers
        .iter()
        .zip(app.quiz().questions.iter())
        .enumerate()
        .map(|(index, (answer, question))| {
            let (symbol, color) = match answer {
                None => ("·", Color::DarkGray),
                Some(_) if question.is_correct(*answer) => ("+", Color::Green),
                Some(_) => ("-", Color::Red),
            };

            Line::from(vec![
                Span::styled(format!(" {} ", symbol), Style::default().fg(color)),
                Span::styled(
                    format!("{:2}. ", index + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(truncate_question(&question.text), Style::default().fg(Color::Gray)),
            ])
        })
        .collect();

    let widget = Paragraph::new(lines)
        .block(Block::default().padding(Padding::horizontal(1)))
        .scroll((app.result_scroll() as u16, 0));
    frame.render_widget(widget, area);
}

fn truncate_question(text: &str) -> String {
    let char_count = text.chars().count();
    if char_count > QUESTION_PREVIEW_LENGTH {
        let truncated: String = text.chars().take(QUESTION_PREVIEW_LENGTH).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let widget = Paragraph::new("j/k scroll  ·  r retake  ·  q quit")
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
