use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use task_poll::{TaskLifecycle, TaskOutcome};

use crate::tui::types::{CreateForm, EditForm, LogsDialog, ScanDialog};

pub struct CreateDialog;

impl CreateDialog {
    pub fn render(form: &CreateForm, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let mut content_lines: Vec<Line> = Vec::new();
        for (index, label) in CreateForm::LABELS.iter().enumerate() {
            let value = form.field(index);
            let value_span = if index == form.focus {
                format!("{value}█").reversed()
            } else if value.is_empty() {
                "—".dim()
            } else {
                value.to_string().into()
            };
            content_lines.push(vec![format!("{label:>13}: ").into(), value_span].into());
        }
        content_lines.push("".into());
        content_lines.push(
            "Tab/Shift-Tab: field | Enter: create | Esc: cancel"
                .dim()
                .into(),
        );

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" New Pod ")
                    .bold()
                    .cyan(),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }
}

pub struct EditDialog;

impl EditDialog {
    pub fn render(form: &EditForm, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 20, area);
        frame.render_widget(Clear, popup_area);

        let content_lines: Vec<Line> = vec![
            vec!["Image: ".into(), format!("{}█", form.input).reversed()].into(),
            "".into(),
            "Enter: keep as unsaved edit | Esc: discard".dim().into(),
        ];

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Edit image: {} ", form.pod_id))
                    .bold()
                    .cyan(),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }
}

pub struct ConfirmDialog;

impl ConfirmDialog {
    pub fn render(title: &str, message: &str, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(50, 20, area);
        frame.render_widget(Clear, popup_area);

        let content_lines: Vec<Line> = vec![
            message.to_string().into(),
            "".into(),
            "Y/Enter: confirm | N/Esc: cancel".dim().into(),
        ];

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title.to_string())
                    .bold()
                    .yellow(),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

pub struct LogsDialogView;

impl LogsDialogView {
    pub fn render(dialog: &LogsDialog, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        // Tail: keep the newest lines that fit the popup.
        let visible = popup_area.height.saturating_sub(3) as usize;
        let mut content_lines: Vec<Line> = if dialog.view.progress.is_empty() {
            vec!["Connecting to container stream...".dim().into()]
        } else {
            let lines: Vec<&str> = dialog.view.progress.lines().collect();
            let skip = lines.len().saturating_sub(visible);
            lines[skip..]
                .iter()
                .map(|line| Line::from(line.to_string()))
                .collect()
        };
        content_lines.push("Press ESC to close this view".dim().into());

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Logs: {} ", dialog.pod_id))
                    .bold()
                    .cyan(),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }
}

pub struct ScanDialogView;

impl ScanDialogView {
    pub fn render(dialog: &ScanDialog, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let status: Span = match dialog.view.lifecycle {
            TaskLifecycle::Idle | TaskLifecycle::Starting => "starting...".yellow(),
            TaskLifecycle::Polling => "scanning...".yellow(),
            TaskLifecycle::Terminal(TaskOutcome::Success) => "completed".green(),
            TaskLifecycle::Terminal(TaskOutcome::Error) => "failed".red(),
            TaskLifecycle::Cancelled => "cancelled".dim(),
        };

        let mut content_lines: Vec<Line> = vec![
            vec!["Image: ".into(), dialog.image_url.clone().dim()].into(),
            vec!["Status: ".into(), status].into(),
            "".into(),
        ];

        for line in &dialog.view.progress {
            content_lines.push(line.clone().dim().into());
        }

        if let Some(result) = &dialog.view.result {
            content_lines.push("".into());
            content_lines.push("=== RESULT ===".bold().into());
            let pretty =
                serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
            for line in pretty.lines() {
                content_lines.push(line.to_string().into());
            }
        }

        content_lines.push("".into());
        content_lines.push("Press ESC to close this view".dim().into());

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Security scan: {} ", dialog.pod_id))
                    .bold()
                    .cyan(),
            )
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, popup_area);
    }
}

pub struct NoticeDialog;

impl NoticeDialog {
    pub fn render(message: &str, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(50, 20, area);
        frame.render_widget(Clear, popup_area);

        let content_lines: Vec<Line> = vec![
            message.to_string().red(),
            "".into(),
            "Press any key to dismiss".dim().into(),
        ]
        .into_iter()
        .map(Line::from)
        .collect();

        let paragraph = Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Action failed ")
                    .bold()
                    .red(),
            )
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
