use super::backends::BackendsView;
use super::{draw_dialog, draw_input, popup_area};
use crate::app::{App, AppView};
use crate::console::Action;
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Paragraph, Wrap},
};
use tui_input::backend::crossterm::EventHandler;

impl App {
    pub(crate) fn draw_ping(&mut self, frame: &mut Frame, area: Rect) {
        let dialog = popup_area(area, area.width.saturating_sub(8).min(90), 16);
        let inner = draw_dialog(frame, dialog, "Ping");

        let [input_area, output_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(inner);
        draw_input(frame, input_area, &self.state.ping, "IP address", true);

        let diagnostics = self.console.diagnostics();
        let style = if diagnostics.ping_pending {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(diagnostics.ping_output.as_str())
                .style(style)
                .wrap(Wrap { trim: false }),
            output_area,
        );
    }

    pub(crate) fn handle_ping_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.view = AppView::Backends(BackendsView::Browse),
            KeyCode::Enter => {
                let target = self.state.ping.value().to_string();
                self.console.dispatch(Action::Ping(target));
            }
            _ => {
                self.state.ping.handle_event(&Event::Key(key));
            }
        }
    }
}
