use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Tabs, Wrap},
};
use crate::app::{App, FocusPane, InputMode, ResultsTab};
use briefgen_core::normalize::{priority_label, SummaryCounts};
use briefgen_core::selection::format_size;
use briefgen_core::{
    BriefResult, DeadlineUrgency, OutputLanguage, PriorityTier, SessionState, StatusMessage,
};

fn priority_color(tier: PriorityTier) -> Color {
    match tier {
        PriorityTier::Urgent => Color::Red,
        PriorityTier::Caution => Color::Yellow,
        PriorityTier::Normal => Color::Green,
    }
}

fn urgency_color(urgency: DeadlineUrgency) -> Color {
    match urgency {
        DeadlineUrgency::MostUrgent => Color::Red,
        DeadlineUrgency::ModeratelyUrgent => Color::Yellow,
        DeadlineUrgency::LeastUrgent => Color::Gray,
    }
}

fn pane_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [files_area, results_area] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(body_area);

    render_files_pane(app, frame, files_area);
    render_results_pane(app, frame, results_area);
    render_status(app, frame, status_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Creative Brief Generator ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!(" {}", app.config.service_url),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_files_pane(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, language_area, input_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(area);

    let selection = app.session.selection();
    let items: Vec<ListItem> = selection
        .files()
        .iter()
        .map(|file| {
            let kind_style = if file.kind().is_supported() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Red)
            };
            ListItem::new(Line::from(vec![
                Span::raw(file.name().to_string()),
                Span::styled(format!("  {}", format_size(file.size())), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("  {}", file.kind().label()), kind_style),
            ]))
        })
        .collect();

    let title = if selection.is_empty() {
        " Files ".to_string()
    } else {
        format!(" Files ({}, {}) ", selection.len(), format_size(selection.total_size()))
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(pane_border(app.focus == FocusPane::Files))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    if app.session.selection().is_empty() {
        let empty = Paragraph::new("No files selected. Press 'a' to add a file or paste a path.")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(pane_border(app.focus == FocusPane::Files))
                    .title(" Files "),
            );
        frame.render_widget(empty, list_area);
    } else {
        frame.render_stateful_widget(list, list_area, &mut app.file_state);
    }

    render_language(app.session.language(), frame, language_area);
    render_path_input(app, frame, input_area);
}

fn render_language(current: OutputLanguage, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for language in OutputLanguage::all() {
        let style = if language == current {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", language.as_str()), style));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Output language (l/L) "),
    );
    frame.render_widget(paragraph, area);
}

fn render_path_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .title(" Add file path ");

    let inner = block.inner(area);
    let input = Paragraph::new(app.path_input.as_str())
        .style(Style::default().fg(Color::White))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = app.path_cursor.min(inner.width.saturating_sub(1) as usize) as u16;
        frame.set_cursor_position((inner.x + cursor_x, inner.y));
    }
}

fn render_results_pane(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(pane_border(app.focus == FocusPane::Results))
        .title(" Results ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [tabs_area, content_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(inner);

    let tabs = [ResultsTab::Meetings, ResultsTab::Actions, ResultsTab::Brief];
    let selected = tabs.iter().position(|t| *t == app.results_tab).unwrap_or(0);
    let tab_titles: Vec<String> = tabs
        .iter()
        .map(|tab| match (tab, app.session.result()) {
            (ResultsTab::Meetings, Some(r)) => format!("{} ({})", tab.title(), r.meetings.len()),
            (ResultsTab::Actions, Some(r)) => format!("{} ({})", tab.title(), r.actions.len()),
            _ => tab.title().to_string(),
        })
        .collect();
    frame.render_widget(
        Tabs::new(tab_titles)
            .select(selected)
            .highlight_style(Style::default().fg(Color::Cyan).bold()),
        tabs_area,
    );

    let lines = match app.session.state() {
        SessionState::Idle => vec![Line::styled(
            "Add files and press 's' to generate a brief.",
            Style::default().fg(Color::DarkGray),
        )],
        SessionState::Submitting => vec![Line::styled(
            format!("Generating brief{}", ".".repeat(app.animation_frame as usize + 1)),
            Style::default().fg(Color::Yellow),
        )],
        SessionState::Failed { message } => vec![
            Line::styled("Brief generation failed", Style::default().fg(Color::Red).bold()),
            Line::raw(""),
            Line::raw(message.clone()),
            Line::raw(""),
            Line::styled(
                "Your files are still selected; press 's' to retry.",
                Style::default().fg(Color::DarkGray),
            ),
        ],
        SessionState::Succeeded { result, artifact } => match app.results_tab {
            ResultsTab::Meetings => meeting_lines(result),
            ResultsTab::Actions => action_lines(result),
            ResultsTab::Brief => brief_lines(result, artifact.is_some()),
        },
    };

    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.results_scroll, 0));
    frame.render_widget(content, content_area);
}

fn meeting_lines(result: &BriefResult) -> Vec<Line<'static>> {
    if result.meetings.is_empty() {
        return vec![Line::styled("No meetings proposed.", Style::default().fg(Color::DarkGray))];
    }

    let mut lines = Vec::new();
    for meeting in &result.meetings {
        let tier = meeting.priority_tier();
        lines.push(Line::from(vec![
            Span::styled(meeting.title.clone(), Style::default().bold()),
            Span::raw("  "),
            Span::styled(
                format!("[{}]", priority_label(&meeting.priority)),
                Style::default().fg(priority_color(tier)).bold(),
            ),
        ]));

        let mut when = format!("  {} · {} min", meeting.display_time(), meeting.duration_minutes);
        if !meeting.meeting_type.is_empty() {
            when.push_str(&format!(" · {}", meeting.meeting_type.replace('_', " ")));
        }
        lines.push(Line::styled(when, Style::default().fg(Color::Gray)));

        let attendees = meeting.attendees();
        if !attendees.is_empty() {
            lines.push(Line::raw("  Attendees:"));
            for attendee in attendees {
                let mut text = format!("    • {}", attendee.name);
                if let Some(role) = attendee.role {
                    text.push_str(&format!(" ({})", role));
                }
                lines.push(Line::raw(text));
            }
        }

        let agenda = meeting.agenda_lines();
        if !agenda.is_empty() {
            lines.push(Line::raw("  Agenda:"));
            for item in agenda {
                lines.push(Line::raw(format!("    {}", item)));
            }
        }

        if let Some(link) = &meeting.teams_link {
            lines.push(Line::styled(format!("  Join: {}", link), Style::default().fg(Color::Blue)));
        }
        lines.push(Line::raw(""));
    }
    lines
}

fn summary_line(counts: SummaryCounts) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {} high ", counts.high), Style::default().fg(Color::Red).bold()),
        Span::styled(format!(" {} medium ", counts.medium), Style::default().fg(Color::Yellow).bold()),
        Span::styled(format!(" {} low ", counts.low), Style::default().fg(Color::Green).bold()),
    ])
}

fn action_lines(result: &BriefResult) -> Vec<Line<'static>> {
    if result.actions.is_empty() {
        return vec![Line::styled("No action items.", Style::default().fg(Color::DarkGray))];
    }

    let mut lines = vec![summary_line(result.summary_counts()), Line::raw("")];
    for action in &result.actions {
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", priority_label(&action.priority)),
                Style::default().fg(priority_color(action.priority_tier())).bold(),
            ),
            Span::styled(action.task.clone(), Style::default().bold()),
        ]));

        let assignee = action.assignee();
        lines.push(Line::raw(format!(
            "  Assignee: {} ({}, {})",
            assignee.display_name(),
            assignee.display_role(),
            assignee.display_department()
        )));
        if !action.category.is_empty() {
            lines.push(Line::raw(format!("  Category: {}", action.category)));
        }
        lines.push(Line::from(vec![
            Span::raw("  Deadline: "),
            Span::styled(
                action.deadline_label(),
                Style::default().fg(urgency_color(action.deadline_urgency())),
            ),
        ]));
        lines.push(Line::raw(format!("  Deliverable: {}", action.deliverable_or_default())));
        if !action.dependencies.is_empty() {
            lines.push(Line::raw(format!("  Depends on: {}", action.dependencies.join(", "))));
        }
        lines.push(Line::raw(""));
    }
    lines
}

fn brief_lines(result: &BriefResult, has_artifact: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(result.summary_line(), Style::default().fg(Color::Cyan))];

    lines.push(if has_artifact {
        Line::styled("Document ready. Press 'w' to save it.", Style::default().fg(Color::Green))
    } else {
        Line::styled("Document download unavailable.", Style::default().fg(Color::Yellow))
    });
    lines.push(Line::raw(""));

    if let Some(brief) = &result.brief {
        lines.extend(brief.lines().map(|l| Line::raw(l.to_string())));
        lines.push(Line::raw(""));
    }
    if let Some(team) = &result.team_used {
        lines.push(Line::styled("Team used:", Style::default().bold()));
        lines.push(Line::raw(team.to_string()));
    }
    if let Some(info) = &result.file_info {
        lines.push(Line::styled("File info:", Style::default().bold()));
        lines.push(Line::raw(info.to_string()));
    }
    lines
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();

    if let Some(status) = app.session.status() {
        let style = match status {
            StatusMessage::Submitting => Style::default().fg(Color::Yellow),
            StatusMessage::Succeeded => Style::default().fg(Color::Green),
            StatusMessage::SucceededWithoutArtifact => Style::default().fg(Color::Yellow),
            StatusMessage::Failed(_) => Style::default().fg(Color::Red),
        };
        spans.push(Span::styled(format!(" {} ", status), style.bold()));
    }

    if let Some(notice) = &app.notice {
        spans.push(Span::styled(format!(" {}", notice), Style::default().fg(Color::Gray)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " PATH ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[("Enter", "add"), ("Esc", "cancel")],
        InputMode::Normal => &[
            ("a", "add"),
            ("d", "remove"),
            ("c", "clear"),
            ("l", "language"),
            ("s", "submit"),
            ("t", "tab"),
            ("w", "save"),
            ("Tab", "focus"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in keys {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
