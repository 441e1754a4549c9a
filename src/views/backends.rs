use super::{draw_dialog, draw_input, popup_area};
use crate::app::{App, AppView};
use crate::common::{BackendKey, Snapshot};
use crate::console::refresh::LoopState;
use crate::console::{Action, Status, StatusLevel};
use crate::constants::VERSION;
use crate::keymap::Command;
use crate::utils::fmt_timestamp;
use crate::widgets::{BackendTable, BackendTableState};
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
};
use tui_input::backend::crossterm::EventHandler;

const BROWSE_FOOTER: &str = concat!(
    "q quit | r refresh | a auto | s sync | e edit | w save | x discard | / filter | ",
    "p ping | l audit | n register | c settings",
);

/// Which part of the backend screen has the keyboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendsView {
    /// Table navigation, keys go through the keymap.
    Browse,
    Filter,
    EditWeight,
    Ping,
    AuditLog,
    Register,
}

#[derive(Debug, Default)]
pub struct BackendsState {
    pub table: BackendTableState,
    /// Substring filter over `ip:port`.
    pub filter: tui_input::Input,
    /// Weight editor of the selected row.
    pub weight: tui_input::Input,
    /// Backend the weight editor belongs to.
    pub editing: Option<BackendKey>,
}

impl App {
    pub(crate) fn draw_backends(&mut self, frame: &mut Frame, view: BackendsView) {
        let area = frame.area();

        let vertical = Layout::vertical([
            Constraint::Length(3), // Title
            Constraint::Length(1), // Snapshot meta
            Constraint::Length(3), // Filter
            Constraint::Min(0),    // Table
            Constraint::Length(6), // Status
            Constraint::Length(1), // Footer
        ]);
        let [title_area, meta_area, filter_area, table_area, status_area, footer_area] =
            vertical.areas(area);

        self.draw_backends_title(frame, title_area);

        frame.render_widget(
            Paragraph::new(self.meta_line()).style(Style::default().fg(Color::DarkGray)),
            meta_area,
        );

        draw_input(
            frame,
            filter_area,
            &self.state.backends.filter,
            "Filter (ip:port)",
            view == BackendsView::Filter,
        );

        let now = chrono::Utc::now().timestamp();
        let rows = self.console.visible(self.state.backends.filter.value());
        if !self.console.mirror().is_loaded() && rows.is_empty() {
            frame.render_widget(
                Paragraph::new("Loading backends...")
                    .block(Block::bordered())
                    .centered(),
                table_area,
            );
        } else if rows.is_empty() {
            frame.render_widget(
                Paragraph::new("No backends match")
                    .block(Block::bordered())
                    .centered(),
                table_area,
            );
        } else {
            let table = BackendTable::new(&rows, self.console.edits(), now).block(
                Block::bordered().title(format!(
                    "Backends ({}/{})",
                    rows.len(),
                    self.console.snapshot().len()
                )),
            );
            frame.render_stateful_widget(table, table_area, &mut self.state.backends.table);
        }

        draw_status(frame, status_area, self.console.status());

        let footer_text = match view {
            BackendsView::Browse => BROWSE_FOOTER,
            BackendsView::Filter => "Type to filter | Enter to keep | Esc to clear",
            BackendsView::EditWeight => "Enter to save | Esc to keep editing later",
            _ => "Enter to submit | Esc to close",
        };
        frame.render_widget(
            Paragraph::new(footer_text)
                .style(Style::default().fg(Color::DarkGray))
                .centered(),
            footer_area,
        );

        match view {
            BackendsView::EditWeight => self.draw_weight_editor(frame, area),
            BackendsView::Ping => self.draw_ping(frame, area),
            BackendsView::AuditLog => self.draw_audit(frame, area),
            BackendsView::Register => self.draw_register(frame, area),
            BackendsView::Browse | BackendsView::Filter => {}
        }
    }

    fn draw_backends_title(&self, frame: &mut Frame, area: Rect) {
        let auto = match self.console.auto_refresh() {
            LoopState::Running => Span::from(format!(
                "auto-refresh {} ms",
                self.console.refresh_interval().as_millis()
            ))
            .green(),
            LoopState::Stopped => Span::from("auto-refresh off").dim(),
        };
        let in_flight = match self.console.in_flight() {
            0 => Span::from("idle").dim(),
            n => Span::from(format!("{} in flight", n)).yellow(),
        };

        let title = Line::from(vec![
            Span::from(format!("Backend Pool v{}", VERSION)).bold().cyan(),
            Span::from("  |  "),
            Span::from(self.config.api_url()).dim(),
            Span::from("  |  "),
            auto,
            Span::from("  |  "),
            in_flight,
        ])
        .centered();
        frame.render_widget(Paragraph::new(title).block(Block::bordered()), area);
    }

    fn meta_line(&self) -> Line<'static> {
        let Some(refreshed_at) = self.console.mirror().refreshed_at() else {
            return Line::from(" not loaded yet");
        };

        Line::from(format!(
            " {}  |  refreshed {}",
            snapshot_meta(self.console.snapshot()),
            refreshed_at.format("%H:%M:%S")
        ))
    }

    fn draw_weight_editor(&mut self, frame: &mut Frame, area: Rect) {
        let title = match &self.state.backends.editing {
            Some(key) => format!("Weight of {}", key),
            None => "Weight".to_string(),
        };
        let dialog = popup_area(area, 44, 5);
        let inner = draw_dialog(frame, dialog, &title);
        draw_input(frame, inner, &self.state.backends.weight, "New weight", true);
    }

    pub(crate) fn handle_backends_input(&mut self, key: KeyEvent, view: BackendsView) {
        match view {
            BackendsView::Browse => self.handle_browse_input(key),
            BackendsView::Filter => match key.code {
                KeyCode::Enter => self.view = AppView::Backends(BackendsView::Browse),
                KeyCode::Esc => {
                    self.state.backends.filter.reset();
                    self.view = AppView::Backends(BackendsView::Browse);
                }
                _ => {
                    self.state.backends.filter.handle_event(&Event::Key(key));
                }
            },
            BackendsView::EditWeight => self.handle_weight_input(key),
            BackendsView::Ping => self.handle_ping_input(key),
            BackendsView::AuditLog => self.handle_audit_input(key),
            BackendsView::Register => self.handle_register_input(key),
        }
    }

    fn handle_browse_input(&mut self, key: KeyEvent) {
        let Some(command) = self.keymap.resolve(&key) else {
            return;
        };

        let rows = self.console.visible(self.state.backends.filter.value());
        let table = &mut self.state.backends.table;
        match command {
            Command::Quit => self.is_running = false,
            Command::Up => table.move_up(&rows),
            Command::Down => table.move_down(&rows),
            Command::Top => table.first(&rows),
            Command::Bottom => table.last(&rows),
            Command::Refresh => self.console.dispatch(Action::Refresh),
            Command::ToggleAutoRefresh => self.console.dispatch(Action::ToggleAutoRefresh),
            Command::Sync => self.console.dispatch(Action::Sync),
            Command::EditWeight => {
                table.sync(&rows);
                if let Some(selected) = table.selected().cloned() {
                    let text = rows
                        .iter()
                        .find(|backend| backend.is_key(&selected))
                        .map(|backend| self.console.edits().display_value(backend))
                        .unwrap_or_default();
                    self.state.backends.weight = tui_input::Input::new(text);
                    self.state.backends.editing = Some(selected);
                    self.view = AppView::Backends(BackendsView::EditWeight);
                }
            }
            Command::SaveWeight => {
                table.sync(&rows);
                if let Some(selected) = table.selected().cloned() {
                    self.console.dispatch(Action::SaveWeight(selected));
                }
            }
            Command::DiscardEdit => {
                table.sync(&rows);
                if let Some(selected) = table.selected().cloned() {
                    self.console.dispatch(Action::DiscardEdit(selected));
                }
            }
            Command::Filter => self.view = AppView::Backends(BackendsView::Filter),
            Command::ClearFilter => self.state.backends.filter.reset(),
            Command::Ping => self.view = AppView::Backends(BackendsView::Ping),
            Command::AuditLog => self.open_audit(),
            Command::Register => self.open_register(),
            Command::Settings => self.open_settings(),
        }
    }

    fn handle_weight_input(&mut self, key: KeyEvent) {
        let Some(editing) = self.state.backends.editing.clone() else {
            self.view = AppView::Backends(BackendsView::Browse);
            return;
        };

        match key.code {
            KeyCode::Enter => {
                self.console.dispatch(Action::SaveWeight(editing));
                self.state.backends.editing = None;
                self.view = AppView::Backends(BackendsView::Browse);
            }
            // the typed value stays pending
            KeyCode::Esc => {
                self.state.backends.editing = None;
                self.view = AppView::Backends(BackendsView::Browse);
            }
            _ => {
                let changed = self
                    .state
                    .backends
                    .weight
                    .handle_event(&Event::Key(key))
                    .is_some_and(|change| change.value);
                if changed && self.console.snapshot().contains(&editing) {
                    self.console.dispatch(Action::EditWeight {
                        key: editing,
                        text: self.state.backends.weight.value().to_string(),
                    });
                }
            }
        }
    }
}

/// Counts and timestamps of a snapshot, for the meta line.
pub fn snapshot_meta(snapshot: &Snapshot) -> String {
    format!(
        "{} backends ({} enabled, {} warming)  |  k8s {}  |  runtime {}  |  server {}",
        snapshot.len(),
        snapshot.enabled_count(),
        snapshot.warming_count(),
        fmt_timestamp(snapshot.k8s_updated_at),
        fmt_timestamp(snapshot.runtime_updated_at),
        fmt_timestamp(snapshot.updated_at),
    )
}

fn draw_status(frame: &mut Frame, area: Rect, status: &Status) {
    let color = match status.level {
        StatusLevel::Info => Color::White,
        StatusLevel::Busy => Color::Yellow,
        StatusLevel::Success => Color::Green,
        StatusLevel::Error => Color::Red,
    };
    frame.render_widget(
        Paragraph::new(status.text.as_str())
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title("Status")),
        area,
    );
}
