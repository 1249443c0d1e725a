use crate::pointer::PointerLock;
use crate::state::{Direction, InputState};
use glam::Vec2;

/// A high-level action produced by the host from raw device events.
///
/// The locomotion core consumes the state these actions produce, never raw
/// key codes or mouse packets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// A directional key went down.
    Press(Direction),
    /// A directional key went up.
    Release(Direction),
    /// Ask the host to capture the pointer (a click in the view).
    RequestLock,
    /// The host answered a lock request.
    LockResolved(bool),
    /// The capture session ended.
    Unlock,
    /// Drop every held direction, for when key-up events can no longer
    /// arrive (the window lost focus).
    ReleaseAll,
    /// Relative pointer motion in pixels.
    Look(Vec2),
}

impl Action {
    /// Fold this action into the input and lock state.
    ///
    /// Returns `true` if the host must be asked to capture the pointer.
    /// `Look` carries no state here; it is routed to the camera.
    pub fn apply(self, input: &mut InputState, lock: &mut PointerLock) -> bool {
        match self {
            Action::Press(d) => input.press(d),
            Action::Release(d) => input.release(d),
            Action::RequestLock => return lock.request(),
            Action::LockResolved(granted) => lock.resolve(granted),
            Action::Unlock => lock.release(),
            Action::ReleaseAll => input.clear(),
            Action::Look(_) => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_release_drive_input_state() {
        let mut input = InputState::new();
        let mut lock = PointerLock::new();
        Action::Press(Direction::Forward).apply(&mut input, &mut lock);
        assert!(input.forward);
        Action::Release(Direction::Forward).apply(&mut input, &mut lock);
        assert!(!input.forward);
    }

    #[test]
    fn release_all_clears_held_directions() {
        let mut input = InputState::new();
        let mut lock = PointerLock::new();
        for d in Direction::ALL {
            Action::Press(d).apply(&mut input, &mut lock);
        }
        assert!(!Action::ReleaseAll.apply(&mut input, &mut lock));
        assert!(!input.any());
    }

    #[test]
    fn lock_lifecycle_through_actions() {
        let mut input = InputState::new();
        let mut lock = PointerLock::new();
        assert!(Action::RequestLock.apply(&mut input, &mut lock));
        assert!(!lock.is_locked());
        Action::LockResolved(true).apply(&mut input, &mut lock);
        assert!(lock.is_locked());
        Action::Unlock.apply(&mut input, &mut lock);
        assert!(!lock.is_locked());
    }

    #[test]
    fn input_accepted_while_unlocked() {
        let mut input = InputState::new();
        let mut lock = PointerLock::new();
        Action::Press(Direction::Left).apply(&mut input, &mut lock);
        assert!(input.left);
        assert!(!lock.is_locked());
    }

    #[test]
    fn look_is_stateless() {
        let mut input = InputState::new();
        let mut lock = PointerLock::new();
        let ask = Action::Look(Vec2::new(3.0, -1.0)).apply(&mut input, &mut lock);
        assert!(!ask);
        assert_eq!(input, InputState::default());
    }
}
