use rdev::Key;

/// Key ↔ virtual-key-code pairs shared by the hook (recording direction)
/// and the injector (replay direction). Codes follow the Windows
/// virtual-key numbering, which is what ends up in the persisted file.
const KEY_CODES: &[(Key, u32)] = &[
    (Key::KeyA, 0x41),
    (Key::KeyB, 0x42),
    (Key::KeyC, 0x43),
    (Key::KeyD, 0x44),
    (Key::KeyE, 0x45),
    (Key::KeyF, 0x46),
    (Key::KeyG, 0x47),
    (Key::KeyH, 0x48),
    (Key::KeyI, 0x49),
    (Key::KeyJ, 0x4A),
    (Key::KeyK, 0x4B),
    (Key::KeyL, 0x4C),
    (Key::KeyM, 0x4D),
    (Key::KeyN, 0x4E),
    (Key::KeyO, 0x4F),
    (Key::KeyP, 0x50),
    (Key::KeyQ, 0x51),
    (Key::KeyR, 0x52),
    (Key::KeyS, 0x53),
    (Key::KeyT, 0x54),
    (Key::KeyU, 0x55),
    (Key::KeyV, 0x56),
    (Key::KeyW, 0x57),
    (Key::KeyX, 0x58),
    (Key::KeyY, 0x59),
    (Key::KeyZ, 0x5A),
    (Key::Num0, 0x30),
    (Key::Num1, 0x31),
    (Key::Num2, 0x32),
    (Key::Num3, 0x33),
    (Key::Num4, 0x34),
    (Key::Num5, 0x35),
    (Key::Num6, 0x36),
    (Key::Num7, 0x37),
    (Key::Num8, 0x38),
    (Key::Num9, 0x39),
    (Key::Escape, 0x1B),
    (Key::Backspace, 0x08),
    (Key::Tab, 0x09),
    (Key::Return, 0x0D),
    (Key::Space, 0x20),
    (Key::LeftArrow, 0x25),
    (Key::UpArrow, 0x26),
    (Key::RightArrow, 0x27),
    (Key::DownArrow, 0x28),
    (Key::Delete, 0x2E),
    (Key::Insert, 0x2D),
    (Key::Home, 0x24),
    (Key::End, 0x23),
    (Key::PageUp, 0x21),
    (Key::PageDown, 0x22),
    (Key::F1, 0x70),
    (Key::F2, 0x71),
    (Key::F3, 0x72),
    (Key::F4, 0x73),
    (Key::F5, 0x74),
    (Key::F6, 0x75),
    (Key::F7, 0x76),
    (Key::F8, 0x77),
    (Key::F9, 0x78),
    (Key::F10, 0x79),
    (Key::F11, 0x7A),
    (Key::F12, 0x7B),
    (Key::ShiftLeft, 0xA0),
    (Key::ShiftRight, 0xA1),
    (Key::ControlLeft, 0xA2),
    (Key::ControlRight, 0xA3),
    (Key::Alt, 0xA4),
    (Key::AltGr, 0xA5),
    (Key::MetaLeft, 0x5B),
    (Key::MetaRight, 0x5C),
    (Key::CapsLock, 0x14),
];

/// Convert a hook key to its virtual-key code; unmapped keys become 0
pub fn key_to_code(key: Key) -> u32 {
    if let Key::Unknown(code) = key {
        return code;
    }
    KEY_CODES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, code)| *code)
        .unwrap_or(0)
}

/// Convert a persisted virtual-key code back to an injectable key
///
/// Codes outside the table are passed through as `Key::Unknown`, letting
/// the platform layer decide whether it can synthesize them.
pub fn code_to_key(code: u32) -> Key {
    KEY_CODES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(key, _)| *key)
        .unwrap_or(Key::Unknown(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_letters_to_virtual_key_codes() {
        assert_eq!(key_to_code(Key::KeyA), 0x41);
        assert_eq!(key_to_code(Key::KeyZ), 0x5A);
        assert_eq!(key_to_code(Key::Return), 0x0D);
    }

    #[test]
    fn table_inverts_cleanly() {
        for (key, code) in KEY_CODES {
            assert_eq!(code_to_key(*code), *key);
            assert_eq!(key_to_code(*key), *code);
        }
    }

    #[test]
    fn unknown_codes_pass_through() {
        assert_eq!(code_to_key(0xFF), Key::Unknown(0xFF));
        assert_eq!(key_to_code(Key::Unknown(0xFF)), 0xFF);
    }
}
