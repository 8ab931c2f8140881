use api_types::{ResourceUsage, Server};
use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState};

/// Top-level server list with resource summaries.
pub struct ServerListView;

impl ServerListView {
    pub fn render(
        servers: &[Server],
        table_state: &mut TableState,
        last_refresh: Option<DateTime<Utc>>,
        last_refresh_error: Option<&str>,
        frame: &mut Frame,
        area: Rect,
    ) {
        let header_cells = ["Server", "CPU", "RAM", "Storage", "Pods"]
            .iter()
            .map(|header| Cell::from(*header).bold().cyan());
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let mut rows = Vec::new();
        for server in servers {
            rows.push(Row::new(vec![
                Cell::from(server.id.clone()),
                Cell::from(usage_text(&server.resources.cpu)),
                Cell::from(usage_text(&server.resources.ram)),
                Cell::from(usage_text(&server.resources.storage)),
                Cell::from(format!("{}", server.pods.len())),
            ]));
        }

        let widths = [
            Constraint::Min(16),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(6),
        ];

        let status = if let Some(error) = last_refresh_error {
            format!("refresh failing: {error}")
        } else if let Some(at) = last_refresh {
            format!("updated {}", at.format("%H:%M:%S"))
        } else {
            "loading...".to_string()
        };

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(
                        " Fleet ({} servers, {status}) | ↑/↓: Navigate | Enter: Open | R: Refresh | Q: Quit ",
                        servers.len()
                    ))
                    .bold(),
            )
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol(">> ");

        frame.render_stateful_widget(table, area, table_state);
    }
}

/// Detail view of the selected server: resource gauges plus its pod table.
pub struct PodView;

impl PodView {
    pub fn render(
        server: Option<&Server>,
        table_state: &mut TableState,
        frame: &mut Frame,
        area: Rect,
    ) {
        let Some(server) = server else {
            let placeholder = Paragraph::new("Server is no longer present in the snapshot".dim())
                .block(Block::default().borders(Borders::ALL).title(" Server "));
            frame.render_widget(placeholder, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        render_gauges(server, frame, chunks[0]);
        render_pod_table(server, table_state, frame, chunks[1]);
    }
}

fn render_gauges(server: &Server, frame: &mut Frame, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let gauges = [
        ("CPU", &server.resources.cpu),
        ("RAM", &server.resources.ram),
        ("Storage", &server.resources.storage),
    ];
    for ((title, usage), column) in gauges.into_iter().zip(columns.iter()) {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .gauge_style(Style::default().fg(Color::Blue))
            .ratio(usage.ratio())
            .label(usage_text(usage));
        frame.render_widget(gauge, *column);
    }
}

fn render_pod_table(server: &Server, table_state: &mut TableState, frame: &mut Frame, area: Rect) {
    let header_cells = ["Pod", "Image", "Status", "Namespace", "Route", "IP"]
        .iter()
        .map(|header| Cell::from(*header).bold().cyan());
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let mut rows = Vec::new();
    for pod in &server.pods {
        let image_cell = if pod.has_pending_edit() {
            let edit = pod.editing_image.as_deref().unwrap_or_default();
            Cell::from(format!("{edit} (edited)")).yellow()
        } else {
            Cell::from(pod.image_url.clone())
        };

        rows.push(Row::new(vec![
            Cell::from(pod.pod_id.clone()),
            image_cell,
            Cell::from(pod.status.clone()).fg(status_color(&pod.status)),
            Cell::from(pod.namespace.clone().unwrap_or_default()),
            Cell::from(pod.route.clone().unwrap_or_default()),
            Cell::from(
                pod.external_ip
                    .clone()
                    .or_else(|| pod.pod_ip.clone())
                    .unwrap_or_default(),
            )
            .dim(),
        ]));
    }

    let widths = [
        Constraint::Min(14),
        Constraint::Min(24),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Min(16),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(
                    " {} ({} pods) | C: Create | E: Edit image | U: Update | D: Delete | L: Logs | S: Scan | Esc: Back ",
                    server.id,
                    server.pods.len()
                ))
                .bold(),
        )
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol(">> ");

    frame.render_stateful_widget(table, area, table_state);
}

fn usage_text(usage: &ResourceUsage) -> String {
    format!("{} / {} {}", usage.allocated, usage.total, usage.unit)
}

/// The status vocabulary is owned by the service; coloring is best effort
/// over the values it is known to emit.
fn status_color(status: &str) -> Color {
    match status {
        "running" => Color::Green,
        "error" => Color::Red,
        "provisioning" | "updating" => Color::Yellow,
        _ => Color::Reset,
    }
}
