use log::{debug, warn};

/// The keys the frame loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Space,
    /// A number key, 1 through 9.
    Digit(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Released,
    Pressed,
}

impl Default for KeyState {
    fn default() -> Self { KeyState::Released }
}

/// A boolean that flips once per press-release cycle of a key, no matter how many key-down
/// events (auto-repeat, or several frames of a held key) arrive in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyToggle {
    state: KeyState,
    value: bool,
}

impl KeyToggle {
    pub fn new(value: bool) -> Self {
        Self { state: KeyState::Released, value }
    }

    pub fn value(&self) -> bool { self.value }

    pub fn state(&self) -> KeyState { self.state }

    /// Feeds one edge through the toggle. Returns `true` if the value flipped.
    pub fn edge(&mut self, edge: KeyEdge) -> bool {
        match (self.state, edge) {
            (KeyState::Released, KeyEdge::Down) => {
                self.state = KeyState::Pressed;
                self.value = !self.value;
                true
            }
            (KeyState::Pressed, KeyEdge::Up) => {
                self.state = KeyState::Released;
                false
            }
            _ => false,
        }
    }
}

/// Toggles and selections mutated by input and read by the render step each frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameState {
    pub lighting: KeyToggle,
    pub active_program: usize,
    pub close_requested: bool,
}

impl FrameState {
    pub fn show_lighting(&self) -> bool { self.lighting.value() }

    /// Applies one key edge. `program_count` bounds which digit keys select anything.
    pub fn apply(&mut self, key: Key, edge: KeyEdge, program_count: usize) {
        match (key, edge) {
            (Key::Escape, KeyEdge::Down) => self.close_requested = true,
            (Key::Space, _) => {
                if self.lighting.edge(edge) {
                    debug!("lighting {}", if self.show_lighting() { "on" } else { "off" });
                }
            }
            (Key::Digit(n), KeyEdge::Down) => {
                let index = (n as usize).wrapping_sub(1);
                if n >= 1 && index < program_count {
                    if self.active_program != index {
                        debug!("switching to shader program {}", n);
                    }
                    self.active_program = index;
                } else {
                    warn!("no shader program bound to key {} ({} loaded)", n, program_count);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn toggle_flips_once_per_press_release_cycle() {
        let mut toggle = KeyToggle::default();
        let mut flips = 0;

        for edge in &[KeyEdge::Down, KeyEdge::Down, KeyEdge::Up, KeyEdge::Down] {
            if toggle.edge(*edge) {
                flips += 1;
            }
        }

        assert_eq!(flips, 2);
        // Two flips from `false` land back on `false`.
        assert!(!toggle.value());
        assert_eq!(toggle.state(), KeyState::Pressed);
    }

    #[test]
    fn toggle_ignores_release_while_released() {
        let mut toggle = KeyToggle::new(true);

        assert!(!toggle.edge(KeyEdge::Up));
        assert!(toggle.value());
        assert_eq!(toggle.state(), KeyState::Released);
    }

    #[test]
    fn space_toggles_lighting() {
        let mut state = FrameState::default();

        state.apply(Key::Space, KeyEdge::Down, 2);
        assert!(state.show_lighting());
        state.apply(Key::Space, KeyEdge::Down, 2);
        assert!(state.show_lighting());
        state.apply(Key::Space, KeyEdge::Up, 2);
        state.apply(Key::Space, KeyEdge::Down, 2);
        assert!(!state.show_lighting());
    }

    #[test]
    fn digits_select_existing_programs_only() {
        let mut state = FrameState::default();

        state.apply(Key::Digit(2), KeyEdge::Down, 2);
        assert_eq!(state.active_program, 1);

        state.apply(Key::Digit(3), KeyEdge::Down, 2);
        assert_eq!(state.active_program, 1);

        state.apply(Key::Digit(0), KeyEdge::Down, 2);
        assert_eq!(state.active_program, 1);

        state.apply(Key::Digit(1), KeyEdge::Up, 2);
        assert_eq!(state.active_program, 1);

        state.apply(Key::Digit(1), KeyEdge::Down, 2);
        assert_eq!(state.active_program, 0);
    }

    #[test]
    fn escape_requests_close_on_press() {
        let mut state = FrameState::default();

        state.apply(Key::Escape, KeyEdge::Up, 1);
        assert!(!state.close_requested);
        state.apply(Key::Escape, KeyEdge::Down, 1);
        assert!(state.close_requested);
    }
}
