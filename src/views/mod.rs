/// Audit log viewer.
pub mod audit;
/// Backend table, the main screen.
pub mod backends;
/// Ping dialog.
pub mod ping;
/// Register backend dialog.
pub mod register;
/// View & edit settings.
pub mod settings;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Clear, Paragraph},
};

/// Centered rectangle of at most `width` x `height` inside `area`.
pub(crate) fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}

/// Clears `area` and draws a bordered dialog frame on it, returning the inner area.
pub(crate) fn draw_dialog(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    let block = Block::bordered()
        .title(format!(" {} ", title))
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    inner
}

/// Single-line input box; the cursor is placed only when `focused`.
pub(crate) fn draw_input(
    frame: &mut Frame,
    area: Rect,
    input: &tui_input::Input,
    title: &str,
    focused: bool,
) {
    // keep 2 for borders and 1 for cursor
    let width = area.width.max(3) - 3;
    let scroll = input.visual_scroll(width as usize);

    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let widget = Paragraph::new(input.value())
        .scroll((0, scroll as u16))
        .block(Block::bordered().title(title).border_style(style));
    frame.render_widget(widget, area);

    if focused {
        let x = input.visual_cursor().max(scroll) - scroll + 1;
        frame.set_cursor_position((area.x + x as u16, area.y + 1))
    }
}
