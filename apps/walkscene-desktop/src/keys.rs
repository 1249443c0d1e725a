use walkscene_input::Direction;
use winit::keyboard::KeyCode;

/// Movement binding for a physical key: WASD and the arrow keys.
pub fn direction(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Direction::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Direction::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Direction::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Direction::Right),
        _ => None,
    }
}
