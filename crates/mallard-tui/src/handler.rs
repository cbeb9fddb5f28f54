use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use mallard_core::Scheduler;

use crate::app::App;
use crate::tui::AppEvent;

pub fn handle_event<S: Scheduler>(app: &mut App<S>, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // The next draw measures the new area and re-pins the viewport
        AppEvent::Resize => app.scroll_to_bottom(),
        AppEvent::Tick => app.tick(),
    }
}

fn handle_key<S: Scheduler>(app: &mut App<S>, key: KeyEvent) {
    // Global keys
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match key.code {
        KeyCode::Esc => app.quit(),

        // Plain Enter sends; Enter with a modifier starts a new line
        KeyCode::Enter => {
            if key
                .modifiers
                .intersects(KeyModifiers::SHIFT | KeyModifiers::ALT | KeyModifiers::CONTROL)
            {
                app.controller.input_mut().insert_newline();
            } else {
                app.submit();
            }
        }

        // Line editing
        KeyCode::Backspace => app.controller.input_mut().backspace(),
        KeyCode::Delete => app.controller.input_mut().delete(),
        KeyCode::Left => app.controller.input_mut().move_left(),
        KeyCode::Right => app.controller.input_mut().move_right(),
        KeyCode::Home => app.controller.input_mut().move_home(),
        KeyCode::End => app.controller.input_mut().move_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => app.controller.input_mut().insert_char(c),

        // Chat scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let half = app.half_page();
            app.scroll_up(half);
        }
        KeyCode::PageDown => {
            let half = app.half_page();
            app.scroll_down(half);
        }
        _ => {}
    }
}

fn handle_mouse<S: Scheduler>(app: &mut App<S>, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
