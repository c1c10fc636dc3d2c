//! Stateless render pass: one snapshot in, widgets out.
//!
//! Every logical field is drawn into exactly one named layout region and
//! nothing reads back from the terminal. A region whose rect degenerates
//! after layout (tiny window) is skipped, not an error, so markup drift in
//! the layout can never take the whole frame down.

use crate::app::{App, Panel};
use crate::poller::{safe_lock, DashboardState};
use crate::snapshot::{DashboardSnapshot, LOAD_WINDOW_POINTS};
use chrono::{Local, TimeZone};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Cell, Chart, Dataset, GraphType, List, ListItem, Paragraph, Row, Table},
    Frame,
};

const ACCENT: Color = Color::Cyan;
const OK: Color = Color::Green;
const WARN: Color = Color::Red;
const DIM: Color = Color::DarkGray;
const VALUE: Color = Color::Yellow;

/// A rect too small to hold a bordered widget is treated as a missing
/// target region: skip it, render everything else.
fn region_usable(area: Rect) -> bool {
    area.width >= 10 && area.height >= 3
}

pub fn render(f: &mut Frame, app: &App) {
    let state = safe_lock(&app.state);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // header
            Constraint::Length(5),  // KPI cards
            Constraint::Min(10),    // body
            Constraint::Length(3),  // footer
        ])
        .split(f.size());

    render_header(f, rows[0], &state);
    render_kpis(f, rows[1], &state);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[2]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(body[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Length(4),
        ])
        .split(body[1]);

    if let Some(snapshot) = &state.snapshot {
        render_blocks(
            f,
            left[0],
            snapshot,
            app.blocks_scroll,
            app.selected_panel == Panel::Blocks,
        );
        render_mempool(
            f,
            left[1],
            snapshot,
            app.mempool_scroll,
            app.selected_panel == Panel::Mempool,
        );
        render_revenue_chart(f, right[0], snapshot);
        render_load_chart(f, right[1], snapshot);
        render_validator_panel(f, right[2], snapshot);
    } else {
        render_waiting(f, rows[2]);
    }

    render_footer(f, rows[3], &state, app.selected_panel);
}

fn render_header(f: &mut Frame, area: Rect, state: &DashboardState) {
    if !region_usable(area) {
        return;
    }

    let online = state.snapshot.is_some() && state.last_error.is_none();
    let (dot, dot_color) = if online {
        ("● node online", OK)
    } else {
        ("○ node offline", DIM)
    };

    let (port, peers) = state
        .snapshot
        .as_ref()
        .map(|s| (s.stats.port, s.stats.peer_count))
        .unwrap_or((0, 0));

    let updated = state
        .last_updated
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let line = Line::from(vec![
        Span::styled(
            "NEXIS",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" explorer", Style::default().fg(DIM)),
        Span::raw("   "),
        Span::styled(dot, Style::default().fg(dot_color).add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled("port ", Style::default().fg(DIM)),
        Span::styled(format!("{port}"), Style::default().fg(VALUE)),
        Span::raw("  "),
        Span::styled("peers ", Style::default().fg(DIM)),
        Span::styled(format!("{peers}"), Style::default().fg(VALUE)),
        Span::raw("  "),
        Span::styled("updated ", Style::default().fg(DIM)),
        Span::styled(updated, Style::default().fg(VALUE)),
    ]);

    let header = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(ACCENT)))
        .alignment(Alignment::Left);
    f.render_widget(header, area);
}

fn render_kpis(f: &mut Frame, area: Rect, state: &DashboardState) {
    if !region_usable(area) {
        return;
    }

    let snapshot = state.snapshot.as_ref();
    let kpis = snapshot.map(|s| &s.kpis);

    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ])
        .split(area);

    let height = snapshot
        .map(|s| format_amount(s.stats.height as f64, 0))
        .unwrap_or_else(|| "---".to_string());
    let supply = snapshot
        .map(|s| format!("{} NXS", format_amount(s.stats.supply, 0)))
        .unwrap_or_else(|| "---".to_string());
    let revenue = kpis
        .map(|k| format!("{} NXS", format_amount(k.total_revenue, 2)))
        .unwrap_or_else(|| "---".to_string());
    let wallets = kpis
        .map(|k| format_amount(k.active_wallets as f64, 0))
        .unwrap_or_else(|| "---".to_string());
    let treasury = kpis
        .map(|k| format!("{} NXS", format_amount(k.treasury_estimate, 2)))
        .unwrap_or_else(|| "---".to_string());

    render_stat_card(f, cells[0], "block height", &height);
    render_stat_card(f, cells[1], "total supply", &supply);
    render_stat_card(f, cells[2], "total revenue", &revenue);
    render_stat_card(f, cells[3], "active wallets", &wallets);
    render_stat_card(f, cells[4], "treasury est.", &treasury);
}

fn render_stat_card(f: &mut Frame, area: Rect, label: &str, value: &str) {
    if !region_usable(area) {
        return;
    }
    let card = Paragraph::new(vec![
        Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(VALUE).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(label.to_string(), Style::default().fg(DIM))),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(DIM)));
    f.render_widget(card, area);
}

fn render_blocks(
    f: &mut Frame,
    area: Rect,
    snapshot: &DashboardSnapshot,
    scroll: usize,
    is_selected: bool,
) {
    if !region_usable(area) {
        return;
    }

    let header = Row::new(vec![
        Cell::from("block").style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Cell::from("hash").style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
        Cell::from("txs").style(Style::default().fg(VALUE).add_modifier(Modifier::BOLD)),
        Cell::from("time").style(Style::default().fg(OK).add_modifier(Modifier::BOLD)),
    ])
    .height(1);

    let rows: Vec<Row> = snapshot
        .recent_blocks
        .iter()
        .skip(scroll)
        .take((area.height as usize).saturating_sub(3))
        .map(|block| {
            Row::new(vec![
                Cell::from(format!("#{}", block.index))
                    .style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
                Cell::from(short_hash(&block.hash)).style(Style::default().fg(DIM)),
                Cell::from(format!("{}", block.transactions.len()))
                    .style(Style::default().fg(VALUE)),
                Cell::from(format_epoch_ms(block.timestamp)).style(Style::default().fg(OK)),
            ])
        })
        .collect();

    let border_style = if is_selected {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DIM)
    };

    let table = Table::new(
        rows,
        &[
            Constraint::Length(8),
            Constraint::Min(14),
            Constraint::Length(5),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" recent blocks ")
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    f.render_widget(table, area);
}

fn render_mempool(
    f: &mut Frame,
    area: Rect,
    snapshot: &DashboardSnapshot,
    scroll: usize,
    is_selected: bool,
) {
    if !region_usable(area) {
        return;
    }

    let border_style = if is_selected {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DIM)
    };
    let block = Block::default()
        .title(format!(" mempool ({} pending) ", snapshot.mempool.len()))
        .borders(Borders::ALL)
        .border_style(border_style);

    if snapshot.mempool.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "no pending transactions",
            Style::default().fg(DIM),
        )))
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = snapshot
        .mempool
        .iter()
        .skip(scroll)
        .take((area.height as usize).saturating_sub(2))
        .map(|tx| {
            ListItem::new(Line::from(vec![
                Span::styled(short_hash(&tx.transaction_id), Style::default().fg(DIM)),
                Span::raw("  "),
                Span::styled(
                    format!("{} NXS", format_amount(tx.value, 2)),
                    Style::default().fg(VALUE),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("fee {}", format_amount(tx.fee, 4)),
                    Style::default().fg(Color::Magenta),
                ),
            ]))
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn render_revenue_chart(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    if !region_usable(area) {
        return;
    }

    let block = Block::default()
        .title(" daily revenue (NXS) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    if snapshot.revenue_series.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "no revenue recorded yet",
            Style::default().fg(DIM),
        )))
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    // Bar-chart semantics: the full label/value arrays are replaced every
    // cycle since the series can gain new leading dates.
    let labeled: Vec<(String, u64)> = snapshot
        .revenue_series
        .iter()
        .map(|p| (short_date(&p.label).to_string(), p.value.max(0.0).round() as u64))
        .collect();
    let data: Vec<(&str, u64)> = labeled.iter().map(|(l, v)| (l.as_str(), *v)).collect();

    let chart = BarChart::default()
        .block(block)
        .data(&data)
        .bar_width(6)
        .bar_gap(1)
        .bar_style(Style::default().fg(ACCENT))
        .value_style(Style::default().fg(Color::Black).bg(ACCENT));
    f.render_widget(chart, area);
}

fn render_load_chart(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    if !region_usable(area) {
        return;
    }

    // The ring buffer lives inside the snapshot, so this chart and the
    // merger can never drift apart: the renderer only reads it.
    let points: Vec<(f64, f64)> = snapshot
        .load_series
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value))
        .collect();

    let first_label = snapshot
        .load_series
        .first()
        .map(|p| p.label.clone())
        .unwrap_or_default();
    let last_label = snapshot
        .load_series
        .last()
        .map(|p| p.label.clone())
        .unwrap_or_default();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(OK))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .title(" network load % ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(OK)),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, (LOAD_WINDOW_POINTS - 1) as f64])
                .labels(vec![
                    Span::styled(first_label, Style::default().fg(DIM)),
                    Span::styled(last_label, Style::default().fg(DIM)),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, 100.0])
                .labels(vec![
                    Span::styled("0", Style::default().fg(DIM)),
                    Span::styled("50", Style::default().fg(DIM)),
                    Span::styled("100", Style::default().fg(DIM)),
                ]),
        );
    f.render_widget(chart, area);
}

fn render_validator_panel(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
    if !region_usable(area) {
        return;
    }
    let kpis = &snapshot.kpis;
    let panel = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("cost / block  ", Style::default().fg(DIM)),
            Span::styled(
                format!("${}", format_amount(kpis.cost_per_block, 2)),
                Style::default().fg(WARN).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   avg fee  ", Style::default().fg(DIM)),
            Span::styled(
                format!("{} NXS", format_amount(kpis.avg_fee, 4)),
                Style::default().fg(VALUE).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("projected fees  ", Style::default().fg(DIM)),
            Span::styled(
                format!("{} NXS", format_amount(kpis.projected_fee_volume, 2)),
                Style::default().fg(OK).add_modifier(Modifier::BOLD),
            ),
        ]),
    ])
    .block(
        Block::default()
            .title(" validator economics ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(DIM)),
    );
    f.render_widget(panel, area);
}

fn render_waiting(f: &mut Frame, area: Rect) {
    if !region_usable(area) {
        return;
    }
    let waiting = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "waiting for first snapshot...",
            Style::default().fg(DIM),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(DIM)));
    f.render_widget(waiting, area);
}

fn render_footer(f: &mut Frame, area: Rect, state: &DashboardState, selected: Panel) {
    if !region_usable(area) {
        return;
    }

    let content = if let Some(error) = &state.last_error {
        Line::from(vec![
            Span::styled(
                "⚠ ",
                Style::default().fg(WARN).add_modifier(Modifier::BOLD),
            ),
            Span::styled(error.clone(), Style::default().fg(WARN)),
            Span::styled("  (showing last good data)", Style::default().fg(DIM)),
        ])
    } else {
        let blocks_style = if selected == Panel::Blocks {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DIM)
        };
        let mempool_style = if selected == Panel::Mempool {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DIM)
        };
        Line::from(vec![
            Span::styled("[q]", Style::default().fg(VALUE)),
            Span::raw(" quit  "),
            Span::styled("[tab]", Style::default().fg(ACCENT)),
            Span::raw(" "),
            Span::styled("blocks", blocks_style),
            Span::styled("·", Style::default().fg(DIM)),
            Span::styled("mempool", mempool_style),
            Span::raw("  "),
            Span::styled("[↑↓]", Style::default().fg(VALUE)),
            Span::raw(" scroll  "),
            Span::styled("[home]", Style::default().fg(VALUE)),
            Span::raw(" top  "),
            Span::styled(
                format!("cycle {}", state.cycles_completed),
                Style::default().fg(DIM),
            ),
        ])
    };

    let border_color = if state.last_error.is_some() { WARN } else { DIM };
    let footer = Paragraph::new(content)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border_color)));
    f.render_widget(footer, area);
}

/// Fixed-decimal display with thousands separators in the integer part.
pub fn format_amount(value: f64, decimals: usize) -> String {
    let formatted = format!("{value:.decimals$}");
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, fr)) => (i, Some(fr)),
        None => (formatted.as_str(), None),
    };
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(fr) => format!("{sign}{grouped}.{fr}"),
        None => format!("{sign}{grouped}"),
    }
}

/// First ten characters of a hash, ellipsized.
pub fn short_hash(hash: &str) -> String {
    match hash.get(..10) {
        Some(prefix) => format!("{prefix}..."),
        None => hash.to_string(),
    }
}

/// Epoch-ms timestamp as local wall-clock time.
pub fn format_epoch_ms(ms: i64) -> String {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// Drop the year from an ISO date key so bar labels stay narrow.
fn short_date(key: &str) -> &str {
    key.get(5..).filter(|s| !s.is_empty()).unwrap_or(key)
}
