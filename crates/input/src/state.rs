/// One of the four logical walking directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];
}

/// Held state of the four directional keys.
///
/// Each flag is edge-triggered: a press sets it, a release clears it.
/// Opposite directions may be held together; they cancel out downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, direction: Direction, held: bool) {
        match direction {
            Direction::Forward => self.forward = held,
            Direction::Backward => self.backward = held,
            Direction::Left => self.left = held,
            Direction::Right => self.right = held,
        }
    }

    pub fn press(&mut self, direction: Direction) {
        self.set(direction, true);
    }

    pub fn release(&mut self, direction: Direction) {
        self.set(direction, false);
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    /// Release every direction, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// All 16 combinations of held flags, in bit order.
    pub fn all_combinations() -> impl Iterator<Item = InputState> {
        (0u8..16).map(|bits| InputState {
            forward: bits & 1 != 0,
            backward: bits & 2 != 0,
            left: bits & 4 != 0,
            right: bits & 8 != 0,
        })
    }
}
