//! TUI rendering for the Mayday report form.
//!
//! This module handles all UI rendering logic using the `ratatui` crate:
//! the report form (phone, message, detected address, status line, submit
//! control), the footer, and the modal alert drawn over everything else.

use crate::alert::Alert;
use crate::app::{App, Focus};
use crate::events::StatusKind;
use ratatui::{prelude::*, widgets::*};

/// Renders one frame of the TUI based on current application state.
///
/// Draws the form column centered in the terminal, then the footer help
/// line, and finally the modal alert on top when one is showing.
///
/// # Arguments
///
/// * `f` - The ratatui frame to draw into (from `terminal.draw()`).
/// * `app` - Current application state (fields, focus, status, alert).
pub fn render(f: &mut Frame, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(64),
            Constraint::Min(1),
        ])
        .split(f.size());

    render_form(f, app, columns[1]);

    if let Some(alert) = &app.alert {
        render_alert(f, alert, f.size());
    }
}

/// The form column: banner, phone, message, address, status, submit, footer.
fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Banner
            Constraint::Length(3), // Phone
            Constraint::Length(5), // Message
            Constraint::Length(3), // Address (read-only)
            Constraint::Length(1), // Location status
            Constraint::Length(3), // Submit control
            Constraint::Min(0),
            Constraint::Length(1), // Footer
        ])
        .split(area);

    let banner = Paragraph::new(vec![
        Line::from(Span::styled(
            "🚨 Emergency Rescue Report",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Send your location and situation to the rescue team",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(banner, chunks[0]);

    render_input(
        f,
        chunks[1],
        " Phone number ",
        &app.phone,
        "e.g. 0912 345 678",
        app.focus == Focus::Phone && app.alert.is_none(),
    );
    render_input(
        f,
        chunks[2],
        " What happened? ",
        &app.message,
        "Describe the emergency and how many people are affected",
        app.focus == Focus::Message && app.alert.is_none(),
    );
    render_address(f, app, chunks[3]);
    render_status(f, app, chunks[4]);
    render_submit(f, app, chunks[5]);
    render_footer(f, app, chunks[7]);
}

/// An editable text box. Focused boxes get the cyan accent and a caret.
fn render_input(f: &mut Frame, area: Rect, title: &str, value: &str, hint: &str, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = Vec::new();
    if value.is_empty() && !focused {
        spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
    } else {
        spans.push(Span::raw(value.to_string()));
        if focused {
            spans.push(Span::styled("▎", Style::default().fg(Color::Cyan)));
        }
    }

    let input = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border_style),
        );
    f.render_widget(input, area);
}

/// The detected address, filled by the submission pipeline. Never editable.
fn render_address(f: &mut Frame, app: &App, area: Rect) {
    let content = if app.address.is_empty() {
        Span::styled(
            "Detected automatically when you send",
            Style::default().fg(Color::DarkGray),
        )
    } else {
        Span::styled(app.address.as_str(), Style::default().fg(Color::Yellow))
    };

    let address = Paragraph::new(Line::from(content)).block(
        Block::default()
            .title(" Your location ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(address, area);
}

fn render_status(f: &mut Frame, app: &App, area: Rect) {
    let Some(status) = &app.status else {
        return;
    };
    let color = match status.kind {
        StatusKind::Loading => Color::Yellow,
        StatusKind::Success => Color::Green,
        StatusKind::Error => Color::Red,
    };
    let line = Paragraph::new(Span::styled(
        format!(" {}", status.text),
        Style::default().fg(color),
    ));
    f.render_widget(line, area);
}

fn render_submit(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Submit && app.alert.is_none();
    let (label_style, border_style) = if !app.submit_enabled {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    } else if focused {
        (
            Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Red),
        )
    } else {
        (
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::DarkGray),
        )
    };

    let button = Paragraph::new(Span::styled(
        format!(" {} ", app.submit_label),
        label_style,
    ))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style),
    );
    f.render_widget(button, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let api = match app.api_online {
        Some(true) => Span::styled("● online", Style::default().fg(Color::Green)),
        Some(false) => Span::styled("○ offline", Style::default().fg(Color::Red)),
        None => Span::styled("… checking", Style::default().fg(Color::DarkGray)),
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(
            " Tab next field   Enter send   Esc quit   │   API: ",
            Style::default().fg(Color::DarkGray),
        ),
        api,
    ]))
    .alignment(Alignment::Center);
    f.render_widget(footer, area);
}

/// The modal alert, drawn last so it sits on top of the form. Dimmed while
/// fading out.
fn render_alert(f: &mut Frame, alert: &Alert, area: Rect) {
    let popup = popup_area(area, 60, 40);
    f.render_widget(Clear, popup);

    let accent = alert.severity.color();
    let dim = if alert.is_fading() {
        Modifier::DIM
    } else {
        Modifier::empty()
    };

    let block = Block::default()
        .title(format!(" {} {} ", alert.severity.glyph(), alert.severity.title()))
        .title_style(
            Style::default()
                .fg(accent)
                .add_modifier(Modifier::BOLD | dim),
        )
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(accent).add_modifier(dim));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let message = Paragraph::new(alert.message.as_str())
        .wrap(Wrap { trim: false })
        .style(Style::default().add_modifier(dim))
        .alignment(Alignment::Center);
    f.render_widget(message, sections[0]);

    let ok_style = if alert.ok_focused() && !alert.is_fading() {
        Style::default()
            .fg(Color::Black)
            .bg(accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray).add_modifier(dim)
    };
    let ok = Paragraph::new(Span::styled("[ OK ]", ok_style)).alignment(Alignment::Center);
    f.render_widget(ok, sections[1]);
}

/// Centers a `percent_x` by `percent_y` rectangle inside `area`.
fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
