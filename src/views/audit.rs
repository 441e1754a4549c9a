use super::backends::BackendsView;
use super::{draw_dialog, draw_input, popup_area};
use crate::app::{App, AppView};
use crate::console::Action;
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};
use tui_input::backend::crossterm::EventHandler;

#[derive(Debug, Default)]
pub struct AuditState {
    /// Number of lines to tail.
    pub tail: tui_input::Input,
    /// Vertical scroll of the log pane.
    pub scroll: u16,
}

impl App {
    pub(crate) fn open_audit(&mut self) {
        if self.state.audit.tail.value().is_empty() {
            self.state.audit.tail = tui_input::Input::new(self.config.audit_tail.to_string());
        }
        self.view = AppView::Backends(BackendsView::AuditLog);
    }

    pub(crate) fn draw_audit(&mut self, frame: &mut Frame, area: Rect) {
        let dialog = popup_area(area, area.width.saturating_sub(4), area.height.saturating_sub(2));
        let inner = draw_dialog(frame, dialog, "Audit log");

        let [input_area, log_area, hint_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(inner);
        draw_input(frame, input_area, &self.state.audit.tail, "Tail lines", true);

        let diagnostics = self.console.diagnostics();
        let style = if diagnostics.audit_pending {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let total = diagnostics.log.lines().count() as u16;
        let visible = log_area.height.saturating_sub(1);
        self.state.audit.scroll = self.state.audit.scroll.min(total.saturating_sub(visible));

        frame.render_widget(
            Paragraph::new(diagnostics.log.as_str())
                .style(style)
                .scroll((self.state.audit.scroll, 0))
                .block(Block::default().borders(Borders::TOP)),
            log_area,
        );

        frame.render_widget(
            Paragraph::new("Enter to load | ↑↓ PgUp PgDn to scroll | Esc to close")
                .style(Style::default().fg(Color::DarkGray))
                .centered(),
            hint_area,
        );
    }

    pub(crate) fn handle_audit_input(&mut self, key: KeyEvent) {
        let audit = &mut self.state.audit;
        match key.code {
            KeyCode::Esc => self.view = AppView::Backends(BackendsView::Browse),
            KeyCode::Enter => {
                audit.scroll = 0;
                let tail = audit.tail.value().to_string();
                self.console.dispatch(Action::TailAuditLog(tail));
            }
            KeyCode::Up => audit.scroll = audit.scroll.saturating_sub(1),
            KeyCode::Down => audit.scroll = audit.scroll.saturating_add(1),
            KeyCode::PageUp => audit.scroll = audit.scroll.saturating_sub(10),
            KeyCode::PageDown => audit.scroll = audit.scroll.saturating_add(10),
            _ => {
                audit.tail.handle_event(&Event::Key(key));
            }
        }
    }
}
