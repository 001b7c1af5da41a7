use std::collections::HashMap;

use glutin::event::VirtualKeyCode;

use pipeline::Key;

lazy_static! {
    static ref KEYMAP: HashMap<VirtualKeyCode, Key> = {
        let mut keys = HashMap::new();
        keys.insert(VirtualKeyCode::Escape, Key::Escape);
        keys.insert(VirtualKeyCode::Space, Key::Space);

        let digits = [
            VirtualKeyCode::Key1,
            VirtualKeyCode::Key2,
            VirtualKeyCode::Key3,
            VirtualKeyCode::Key4,
            VirtualKeyCode::Key5,
            VirtualKeyCode::Key6,
            VirtualKeyCode::Key7,
            VirtualKeyCode::Key8,
            VirtualKeyCode::Key9,
        ];
        for (n, code) in digits.iter().enumerate() {
            keys.insert(*code, Key::Digit(n as u8 + 1));
        }

        keys
    };
}

/// The frame loop key a window key maps to, if it has one.
pub fn lookup(code: VirtualKeyCode) -> Option<Key> {
    KEYMAP.get(&code).copied()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn number_row_maps_to_digits() {
        assert_eq!(lookup(VirtualKeyCode::Key1), Some(Key::Digit(1)));
        assert_eq!(lookup(VirtualKeyCode::Key9), Some(Key::Digit(9)));
    }

    #[test]
    fn only_bound_keys_map() {
        assert_eq!(lookup(VirtualKeyCode::Escape), Some(Key::Escape));
        assert_eq!(lookup(VirtualKeyCode::Space), Some(Key::Space));
        assert_eq!(lookup(VirtualKeyCode::Key0), None);
        assert_eq!(lookup(VirtualKeyCode::A), None);
    }
}
