use crate::common::{Backend, BackendKey};
use crate::console::edits::PendingEdits;
use crate::utils::{fmt_age, fmt_usage};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Span,
    widgets::{Block, Cell, Row, StatefulWidget, Table, TableState},
};

/// State for the BackendTable widget.
///
/// The selection is a backend identity rather than an index, so it follows
/// its row across refreshes and filter changes.
#[derive(Debug, Default, Clone)]
pub struct BackendTableState {
    selected: Option<BackendKey>,
    table: TableState,
}

impl BackendTableState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the currently selected backend.
    pub fn selected(&self) -> Option<&BackendKey> {
        self.selected.as_ref()
    }

    /// Index of the selection within `rows`; a selection that is not among
    /// them moves to the first row.
    pub fn sync(&mut self, rows: &[&Backend]) -> Option<usize> {
        let index = self
            .selected
            .as_ref()
            .and_then(|key| rows.iter().position(|backend| backend.is_key(key)));

        match index {
            Some(index) => Some(index),
            None => {
                self.selected = rows.first().map(|backend| backend.key());
                self.selected.as_ref().map(|_| 0)
            }
        }
    }

    /// Move selection up.
    pub fn move_up(&mut self, rows: &[&Backend]) {
        if let Some(index) = self.sync(rows) {
            self.selected = Some(rows[index.saturating_sub(1)].key());
        }
    }

    /// Move selection down.
    pub fn move_down(&mut self, rows: &[&Backend]) {
        if let Some(index) = self.sync(rows) {
            let index = (index + 1).min(rows.len() - 1);
            self.selected = Some(rows[index].key());
        }
    }

    pub fn first(&mut self, rows: &[&Backend]) {
        self.selected = rows.first().map(|backend| backend.key());
    }

    pub fn last(&mut self, rows: &[&Backend]) {
        self.selected = rows.last().map(|backend| backend.key());
    }
}

/// The backend pool as a table, with pending weight edits overlaid.
///
/// ## Example
///
/// ```rust,ignore
/// let table = BackendTable::new(&rows, console.edits(), now)
///     .block(Block::bordered().title("Backends"));
///
/// frame.render_stateful_widget(table, area, &mut self.state.backends.table);
/// ```
#[derive(Debug)]
pub struct BackendTable<'a> {
    rows: &'a [&'a Backend],
    edits: &'a PendingEdits,
    /// Unix seconds the `last_seen` ages are relative to.
    now: i64,
    block: Option<Block<'a>>,
}

const SELECTED_STYLE: Style = Style::new()
    .fg(Color::Cyan)
    .bg(Color::Black)
    .add_modifier(Modifier::BOLD);

const HEADER_STYLE: Style = Style::new()
    .fg(Color::Blue)
    .add_modifier(Modifier::BOLD);

const DISABLED_STYLE: Style = Style::new().fg(Color::DarkGray);
const WARMING_STYLE: Style = Style::new().fg(Color::Yellow);

const HEADERS: [&str; 8] = [
    "BACKEND", "WEIGHT", "ENABLED", "WARMING", "SOURCE", "GPU", "VRAM", "SEEN",
];

impl<'a> BackendTable<'a> {
    pub fn new(rows: &'a [&'a Backend], edits: &'a PendingEdits, now: i64) -> Self {
        Self {
            rows,
            edits,
            now,
            block: None,
        }
    }

    /// Set the block to wrap the table in.
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn row(&self, backend: &Backend) -> Row<'a> {
        let weight = if self.edits.is_pending(&backend.key()) {
            Span::from(format!("{}*", self.edits.display_value(backend)))
                .yellow()
                .bold()
        } else {
            Span::from(self.edits.display_value(backend))
        };

        let style = if !backend.enabled {
            DISABLED_STYLE
        } else if backend.is_warming_up {
            WARMING_STYLE
        } else {
            Style::new()
        };

        Row::new(vec![
            Cell::from(backend.address()),
            Cell::from(weight),
            Cell::from(badge(backend.enabled)),
            Cell::from(badge(backend.is_warming_up)),
            Cell::from(backend.source.clone().unwrap_or_default()),
            Cell::from(fmt_usage(backend.gpu_usage.as_ref())),
            Cell::from(fmt_usage(backend.vram_usage.as_ref())),
            Cell::from(fmt_age(backend.last_seen, self.now)),
        ])
        .style(style)
    }
}

fn badge(value: bool) -> Span<'static> {
    if value {
        Span::from("YES").green()
    } else {
        Span::from("NO").red()
    }
}

impl<'a> StatefulWidget for BackendTable<'a> {
    type State = BackendTableState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let index = state.sync(self.rows);
        state.table.select(index);

        let rows: Vec<Row> = self.rows.iter().map(|backend| self.row(backend)).collect();
        let widths = [
            Constraint::Min(21),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(5),
        ];

        let mut table = Table::new(rows, widths)
            .header(Row::new(HEADERS).style(HEADER_STYLE))
            .row_highlight_style(SELECTED_STYLE)
            .highlight_symbol("> ");
        if let Some(block) = self.block {
            table = table.block(block);
        }

        StatefulWidget::render(table, area, buf, &mut state.table);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Snapshot;
    use serde_json::json;

    fn snapshot() -> Snapshot {
        Snapshot::from_payload(json!({
            "ok": true,
            "backends": [
                {
                    "ip": "10.0.0.1",
                    "port": 8000,
                    "weight": 1,
                    "enabled": true,
                    "source": "k8s",
                    "gpu_usage": 0.25
                },
                {
                    "ip": "10.0.0.2",
                    "port": 8000,
                    "weight": 2,
                    "enabled": false,
                    "source": "runtime"
                },
                {
                    "ip": "10.0.0.3",
                    "port": 8001,
                    "weight": 3,
                    "enabled": true,
                    "is_warming_up": true
                }
            ]
        }))
        .unwrap()
    }

    fn lines(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect())
            .collect()
    }

    #[test]
    fn test_render() {
        let snapshot = snapshot();
        let rows: Vec<&Backend> = snapshot.backends.iter().collect();
        let mut edits = PendingEdits::default();
        edits.set(BackendKey::new("10.0.0.2", 8000), "7");

        let mut state = BackendTableState::new();
        let mut buf = Buffer::empty(Rect::new(0, 0, 90, 4));
        BackendTable::new(&rows, &edits, 0).render(buf.area, &mut buf, &mut state);

        let lines = lines(&buf);
        assert!(lines[0].contains("BACKEND"));
        assert!(lines[1].starts_with("> 10.0.0.1:8000"));
        assert!(lines[1].contains("0.250"));
        assert!(lines[1].contains("YES"));
        assert!(lines[2].contains("7*"));
        assert!(lines[2].contains("NO"));
        assert!(lines[3].contains("10.0.0.3:8001"));

        // selection defaults to the first row
        assert_eq!(state.selected(), Some(&BackendKey::new("10.0.0.1", 8000)));
    }

    #[test]
    fn test_render_in_titled_block() {
        let snapshot = snapshot();
        let rows: Vec<&Backend> = snapshot.backends.iter().collect();
        let edits = PendingEdits::default();

        let mut state = BackendTableState::new();
        let mut buf = Buffer::empty(Rect::new(0, 0, 92, 6));
        BackendTable::new(&rows, &edits, 0)
            .block(Block::bordered().title("Backends"))
            .render(buf.area, &mut buf, &mut state);

        let lines = lines(&buf);
        assert!(lines[0].starts_with("┌Backends"));
        assert!(lines[1].contains("BACKEND"));
        assert!(lines[2].starts_with("│> 10.0.0.1:8000"));
        assert!(lines[5].starts_with("└"));
    }

    #[test]
    fn test_row_styles() {
        let snapshot = snapshot();
        let rows: Vec<&Backend> = snapshot.backends.iter().collect();
        let edits = PendingEdits::default();

        let mut state = BackendTableState::new();
        let mut buf = Buffer::empty(Rect::new(0, 0, 90, 4));
        BackendTable::new(&rows, &edits, 0).render(buf.area, &mut buf, &mut state);

        assert_eq!(buf[(2, 2)].fg, Color::DarkGray);
        assert_eq!(buf[(2, 3)].fg, Color::Yellow);
    }

    #[test]
    fn test_selection_follows_key() {
        let snapshot = snapshot();
        let rows: Vec<&Backend> = snapshot.backends.iter().collect();

        let mut state = BackendTableState::new();
        state.move_down(&rows);
        assert_eq!(state.selected(), Some(&BackendKey::new("10.0.0.2", 8000)));
        state.move_down(&rows);
        state.move_down(&rows);
        assert_eq!(state.selected(), Some(&BackendKey::new("10.0.0.3", 8001)));

        // same key, different position after filtering
        let filtered: Vec<&Backend> = rows.iter().copied().skip(1).collect();
        assert_eq!(state.sync(&filtered), Some(1));

        // a filtered-out selection re-anchors to the first visible row
        let only_first = &rows[..1];
        assert_eq!(state.sync(only_first), Some(0));
        assert_eq!(state.selected(), Some(&BackendKey::new("10.0.0.1", 8000)));

        state.last(&rows);
        state.move_up(&rows);
        assert_eq!(state.selected(), Some(&BackendKey::new("10.0.0.2", 8000)));

        assert_eq!(state.sync(&[]), None);
        assert_eq!(state.selected(), None);
    }
}
