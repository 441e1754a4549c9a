use super::backends::BackendsView;
use super::{draw_dialog, draw_input, popup_area};
use crate::app::{App, AppView};
use crate::console::{Action, StatusLevel};
use crate::constants::DEFAULT_REGISTER_WEIGHT;
use crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::Line,
    widgets::Paragraph,
};
use tui_input::backend::crossterm::EventHandler;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RegisterField {
    #[default]
    Ip,
    Port,
    Weight,
}

impl RegisterField {
    fn next(self) -> Self {
        match self {
            RegisterField::Ip => RegisterField::Port,
            RegisterField::Port => RegisterField::Weight,
            RegisterField::Weight => RegisterField::Ip,
        }
    }

    fn prev(self) -> Self {
        match self {
            RegisterField::Ip => RegisterField::Weight,
            RegisterField::Port => RegisterField::Ip,
            RegisterField::Weight => RegisterField::Port,
        }
    }
}

#[derive(Debug, Default)]
pub struct RegisterState {
    pub field: RegisterField,
    pub ip: tui_input::Input,
    pub port: tui_input::Input,
    pub weight: tui_input::Input,
}

impl RegisterState {
    fn input_mut(&mut self) -> &mut tui_input::Input {
        match self.field {
            RegisterField::Ip => &mut self.ip,
            RegisterField::Port => &mut self.port,
            RegisterField::Weight => &mut self.weight,
        }
    }
}

impl App {
    pub(crate) fn open_register(&mut self) {
        self.state.register = RegisterState {
            weight: tui_input::Input::new(DEFAULT_REGISTER_WEIGHT.to_string()),
            ..RegisterState::default()
        };
        self.view = AppView::Backends(BackendsView::Register);
    }

    pub(crate) fn draw_register(&mut self, frame: &mut Frame, area: Rect) {
        let dialog = popup_area(area, 50, 13);
        let inner = draw_dialog(frame, dialog, "Register backend");

        let [ip_area, port_area, weight_area, message_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(inner);

        let register = &self.state.register;
        draw_input(frame, ip_area, &register.ip, "IP", register.field == RegisterField::Ip);
        draw_input(frame, port_area, &register.port, "Port", register.field == RegisterField::Port);
        draw_input(
            frame,
            weight_area,
            &register.weight,
            "Weight",
            register.field == RegisterField::Weight,
        );

        let status = self.console.status();
        let message = if status.level == StatusLevel::Error {
            Line::from(status.text.as_str()).red()
        } else {
            Line::from("Tab to switch field | Enter to register | Esc to close")
                .style(Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(Paragraph::new(message).centered(), message_area);
    }

    pub(crate) fn handle_register_input(&mut self, key: KeyEvent) {
        let register = &mut self.state.register;
        match key.code {
            KeyCode::Esc => self.view = AppView::Backends(BackendsView::Browse),
            KeyCode::Tab | KeyCode::Down => register.field = register.field.next(),
            KeyCode::BackTab | KeyCode::Up => register.field = register.field.prev(),
            KeyCode::Enter => {
                self.console.dispatch(Action::Register {
                    ip: register.ip.value().to_string(),
                    port: register.port.value().to_string(),
                    weight: register.weight.value().to_string(),
                });
                // invalid input is reported without a request, keep the dialog for fixing it
                if self.console.status().level != StatusLevel::Error {
                    self.view = AppView::Backends(BackendsView::Browse);
                }
            }
            _ => {
                register.input_mut().handle_event(&Event::Key(key));
            }
        }
    }
}
