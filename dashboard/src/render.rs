use beastiecore::feed::FeedMetrics;
use beastiecore::{ConnectionState, LiveTableModel, SortDirection};

const COLUMN_GAP: &str = "  ";

pub fn metrics_line(metrics: &FeedMetrics) -> String {
    format!(
        "total {} | good {} | bad {} | mode A {} | mode S short {} | mode S long {}",
        metrics.total,
        metrics.good,
        metrics.bad,
        metrics.mode_a_count,
        metrics.mode_s_short_count,
        metrics.mode_s_long_count
    )
}

/// Line shown under the table when the feed is no longer live.
pub fn status_line(state: &ConnectionState) -> Option<String> {
    match state {
        ConnectionState::Errored(error) => Some(format!(
            "connection lost: {error} (showing last received table)"
        )),
        ConnectionState::Retrying { attempt, error } => Some(format!(
            "connection lost: {error} (reconnect attempt {attempt} pending)"
        )),
        ConnectionState::Closed => Some("stream closed".to_string()),
        _ => None,
    }
}

/// Fixed-width table; the selected row is marked with `>`.
pub fn table(model: &LiveTableModel) -> String {
    let sort = model.sort_state();
    let headers: Vec<String> = model
        .columns()
        .iter()
        .map(|column| match sort {
            Some(state) if state.column == column.key => {
                let arrow = match state.direction {
                    SortDirection::Ascending => "^",
                    SortDirection::Descending => "v",
                };
                format!("{} {arrow}", column.title)
            }
            _ => column.title.to_string(),
        })
        .collect();
    let rows: Vec<(bool, Vec<String>)> = model
        .rows()
        .iter()
        .map(|record| {
            (
                model.selection() == Some(record.icao),
                model.render_row(record),
            )
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for (_, cells) in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, "  ", &headers, &widths);
    for (selected, cells) in &rows {
        push_line(&mut out, if *selected { "> " } else { "  " }, cells, &widths);
    }
    out
}

pub fn frame(model: &LiveTableModel, state: &ConnectionState) -> String {
    let mut out = String::new();
    if let Some(metrics) = model.metrics() {
        out.push_str(&metrics_line(metrics));
        out.push('\n');
    }
    out.push_str(&table(model));
    if let Some(line) = status_line(state) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn push_line(out: &mut String, marker: &str, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    out.push_str(marker);
    out.push_str(line.trim_end());
    out.push('\n');
}
