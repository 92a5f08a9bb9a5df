use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::models::Question;
use crate::quiz::format_clock;

const OPTION_LABELS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
const LOW_TIME_SECONDS: u32 = 60;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(question) = app.current_question() else {
        return;
    };
    let revealed = app.session().is_revealed();

    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(if revealed { 5 } else { 0 }),
        Constraint::Length(1),
    ])
    .margin(1)
    .split(area);

    render_header(frame, chunks[0], app);
    render_question_text(frame, chunks[1], &question.text);
    render_options(frame, chunks[2], question, app);
    if revealed {
        render_explanation(frame, chunks[3], question, app.session().selection());
    }
    render_controls(frame, chunks[4], revealed, app.session().is_last_question());
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let remaining = app.session().remaining_seconds();
    let clock_color = if remaining <= LOW_TIME_SECONDS {
        Color::Red
    } else {
        Color::DarkGray
    };

    let halves = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).split(area);

    let clock = Paragraph::new(format!("⏱ {}", format_clock(remaining))).fg(clock_color);
    let progress = Paragraph::new(format!(
        "{}/{}",
        app.current_question_number(),
        app.total_questions()
    ))
    .alignment(Alignment::Right)
    .fg(Color::DarkGray);

    frame.render_widget(clock, halves[0]);
    frame.render_widget(progress, halves[1]);
}

fn render_question_text(frame: &mut Frame, area: Rect, text: &str) {
    let widget = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .fg(Color::White)
        .bold();
    frame.render_widget(widget, area);
}

fn option_style(index: usize, question: &Question, app: &App) -> Style {
    let session = app.session();
    let selected = session.selection() == Some(index);

    if session.is_revealed() {
        if index == question.correct_answer {
            return Style::default().fg(Color::Green).bold();
        }
        if selected {
            return Style::default().fg(Color::Red).bold();
        }
        return Style::default().fg(Color::DarkGray);
    }

    if selected {
        Style::default().fg(Color::Yellow).bold()
    } else if index == app.cursor() {
        Style::default().fg(Color::Cyan).bold()
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn render_options(frame: &mut Frame, area: Rect, question: &Question, app: &App) {
    let mut lines: Vec<Line> = Vec::with_capacity(question.options.len() * 2);
    let selection = app.session().selection();

    for (index, option) in question.options.iter().enumerate() {
        let style = option_style(index, question, app);
        let marker = if index == app.cursor() && !app.session().is_revealed() {
            ">"
        } else {
            " "
        };
        let chosen = if selection == Some(index) { "●" } else { "○" };
        let label = OPTION_LABELS.get(index).copied().unwrap_or('?');

        lines.push(Line::from(vec![
            Span::styled(format!(" {} {} ", marker, chosen), style),
            Span::styled(format!("{}. ", label), style),
            Span::styled(option.as_str(), style),
        ]));
        lines.push(Line::from(""));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_explanation(frame: &mut Frame, area: Rect, question: &Question, selection: Option<usize>) {
    let (verdict, color) = if question.is_correct(selection) {
        ("Correct!", Color::Green)
    } else {
        ("Not quite.", Color::Red)
    };

    let content = vec![
        Line::from(Span::styled(verdict, Style::default().fg(color).bold())),
        Line::from(question.explanation.as_str().fg(Color::Blue)),
    ];

    let widget = Paragraph::new(content).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Color::DarkGray)
            .title(" Explanation ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect, revealed: bool, last: bool) {
    let hint = match (revealed, last) {
        (false, _) => "j/k navigate  ·  enter select  ·  c check  ·  p previous  ·  q quit",
        (true, false) => "enter / n next question  ·  p previous  ·  q quit",
        (true, true) => "enter / n finish quiz  ·  p previous  ·  q quit",
    };
    let widget = Paragraph::new(hint)
        .alignment(Alignment::Center)
        .fg(Color::DarkGray);
    frame.render_widget(widget, area);
}
