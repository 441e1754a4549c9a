use super::backends::BackendsView;
use crate::app::{App, AppView};
use crate::config::Config;
use crate::constants::MIN_REFRESH_INTERVAL_MS;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style, Styled, Stylize},
    text::Line,
    widgets::{Block, Paragraph},
};
use tui_input::backend::crossterm::EventHandler;

/// Possible settings fields.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SettingsField {
    /// API Host.
    #[default]
    Host,
    /// API Port.
    Port,
    /// Auto-refresh period in milliseconds.
    RefreshInterval,
    /// Default audit log tail.
    AuditTail,
}

#[derive(Debug, Default)]
pub struct SettingsState {
    pub selected_field: SettingsField,
    /// Field editor, only meaningful while `editing`.
    pub input: tui_input::Input,
    pub editing: bool,
    /// Config being edited, applied on save.
    pub draft: Config,
    pub message: String,
}

impl App {
    pub(crate) fn open_settings(&mut self) {
        self.state.settings = SettingsState {
            draft: self.config.clone(),
            ..SettingsState::default()
        };
        self.view = AppView::Settings;
    }

    pub fn draw_settings(&mut self, frame: &mut Frame) {
        let area = frame.area();

        // Create layout
        let vertical = Layout::vertical([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Settings fields
            Constraint::Length(3), // Footer
        ]);
        let [title_area, settings_area, footer_area] = vertical.areas(area);

        // Title
        let title = Line::from("Settings").bold().blue().centered();
        frame.render_widget(Paragraph::new(title).block(Block::bordered()), title_area);

        let settings = &self.state.settings;
        let field_style = |field: SettingsField| {
            if settings.selected_field == field {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            }
        };

        // show the editor on the selected field, the draft value elsewhere
        let value = |field: SettingsField| {
            if settings.editing && settings.selected_field == field {
                format!("{}_", settings.input.value())
            } else {
                field_value(&settings.draft, field)
            }
        };

        let fields = [
            ("  API Host:          ", SettingsField::Host),
            ("  API Port:          ", SettingsField::Port),
            ("  Refresh (ms):      ", SettingsField::RefreshInterval),
            ("  Audit tail lines:  ", SettingsField::AuditTail),
        ];
        let mut settings_text = vec![Line::from("")];
        for (label, field) in fields {
            settings_text.push(Line::from(vec![
                label.into(),
                value(field).set_style(field_style(field)),
            ]));
            settings_text.push(Line::from(""));
        }
        settings_text.push(Line::from(vec![
            "  Current config: ".dim(),
            Config::current_location().dim(),
        ]));

        // Add status message below the current config line if present
        if !settings.message.is_empty() {
            settings_text.push(Line::from(""));
            settings_text.push(Line::from(format!("  {}", settings.message)).green());
        }

        frame.render_widget(
            Paragraph::new(settings_text)
                .block(Block::default().title("Use ↑↓ to select field, Enter to edit, s to save")),
            settings_area,
        );

        // Footer
        let footer_text = "Press Esc to go back  |  Enter to edit field  |  s to save";
        frame.render_widget(Paragraph::new(footer_text).centered(), footer_area);
    }

    pub fn handle_settings_input(&mut self, key: KeyEvent) {
        if self.state.settings.editing {
            match key.code {
                KeyCode::Enter => self.apply_edit(),
                KeyCode::Esc => {
                    self.state.settings.editing = false;
                    self.state.settings.message.clear();
                }
                _ => {
                    self.state.settings.input.handle_event(&Event::Key(key));
                }
            }
            return;
        }

        // Normal settings navigation
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => {
                self.view = AppView::Backends(BackendsView::Browse);
            }
            (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Up) => self.settings_up(),
            (_, KeyCode::Down) => self.settings_down(),
            (_, KeyCode::Enter) => self.start_edit(),
            (_, KeyCode::Char('s')) => self.save_config(),
            _ => {}
        }
    }

    fn settings_up(&mut self) {
        self.state.settings.selected_field = match self.state.settings.selected_field {
            SettingsField::Host => SettingsField::Host,
            SettingsField::Port => SettingsField::Host,
            SettingsField::RefreshInterval => SettingsField::Port,
            SettingsField::AuditTail => SettingsField::RefreshInterval,
        };
    }

    fn settings_down(&mut self) {
        self.state.settings.selected_field = match self.state.settings.selected_field {
            SettingsField::Host => SettingsField::Port,
            SettingsField::Port => SettingsField::RefreshInterval,
            SettingsField::RefreshInterval => SettingsField::AuditTail,
            SettingsField::AuditTail => SettingsField::AuditTail,
        };
    }

    fn start_edit(&mut self) {
        let settings = &mut self.state.settings;
        settings.input =
            tui_input::Input::new(field_value(&settings.draft, settings.selected_field));
        settings.editing = true;
        settings.message.clear();
    }

    fn apply_edit(&mut self) {
        let settings = &mut self.state.settings;
        let applied = apply_field(
            &mut settings.draft,
            settings.selected_field,
            settings.input.value(),
        );
        settings.message = match applied {
            Ok(message) | Err(message) => message.to_string(),
        };
        settings.editing = false;
    }

    fn save_config(&mut self) {
        match self.state.settings.draft.save() {
            Ok(_) => {
                self.config = self.state.settings.draft.clone();
                self.apply_config();
                self.state.settings.message =
                    format!("Configuration saved to {}", Config::current_location());
                tracing::info!(api = %self.config.api_url(), "configuration saved");
            }
            Err(e) => {
                self.state.settings.message = format!("Failed to save: {}", e);
            }
        }
    }
}

fn field_value(config: &Config, field: SettingsField) -> String {
    match field {
        SettingsField::Host => config.api_host.clone(),
        SettingsField::Port => config.api_port.to_string(),
        SettingsField::RefreshInterval => config.refresh_interval_ms.to_string(),
        SettingsField::AuditTail => config.audit_tail.to_string(),
    }
}

/// Validates `raw` into `config`, returning the message to show either way.
fn apply_field(
    config: &mut Config,
    field: SettingsField,
    raw: &str,
) -> Result<&'static str, &'static str> {
    let raw = raw.trim();
    match field {
        SettingsField::Host if raw.is_empty() => Err("Host cannot be empty!"),
        SettingsField::Host => {
            config.api_host = raw.to_string();
            Ok("Host updated (press 's' to save)")
        }
        SettingsField::Port => match raw.parse::<u16>() {
            Ok(port) if port > 0 => {
                config.api_port = port;
                Ok("Port updated (press 's' to save)")
            }
            _ => Err("Invalid port number!"),
        },
        SettingsField::RefreshInterval => match raw.parse::<u64>() {
            Ok(ms) if ms >= MIN_REFRESH_INTERVAL_MS => {
                config.refresh_interval_ms = ms;
                Ok("Refresh interval updated (press 's' to save)")
            }
            _ => Err("Invalid refresh interval (must be at least 250 ms)!"),
        },
        SettingsField::AuditTail => match raw.parse::<u32>() {
            Ok(lines) => {
                config.audit_tail = lines;
                Ok("Audit tail updated (press 's' to save)")
            }
            Err(_) => Err("Invalid number of lines!"),
        },
    }
}
