//! Keyboard handling. The demos only listen for a request to quit.

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// True for a window close request or a press of Escape.
pub fn is_exit_request(event: &WindowEvent) -> bool {
    match event {
        WindowEvent::CloseRequested => true,
        WindowEvent::KeyboardInput { event, .. } => is_exit_key(event.physical_key, event.state),
        _ => false,
    }
}

fn is_exit_key(key: PhysicalKey, state: ElementState) -> bool {
    state == ElementState::Pressed && key == PhysicalKey::Code(KeyCode::Escape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_request_exits() {
        assert!(is_exit_request(&WindowEvent::CloseRequested));
        assert!(!is_exit_request(&WindowEvent::Focused(true)));
    }

    #[test]
    fn only_pressing_escape_exits() {
        let escape = PhysicalKey::Code(KeyCode::Escape);
        assert!(is_exit_key(escape, ElementState::Pressed));
        assert!(!is_exit_key(escape, ElementState::Released));
        assert!(!is_exit_key(PhysicalKey::Code(KeyCode::Space), ElementState::Pressed));
    }
}
