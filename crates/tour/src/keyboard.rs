use foundation::time::Time;

/// Single-key commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    /// `E`: stop playback and rewind.
    CancelPlayback,
    /// `I`: show or hide the usage guide.
    ToggleHelp,
    /// `M`: zoom out to the whole map.
    Overview,
}

impl KeyCommand {
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'e' => Some(KeyCommand::CancelPlayback),
            'i' => Some(KeyCommand::ToggleHelp),
            'm' => Some(KeyCommand::Overview),
            _ => None,
        }
    }

    fn slot(self) -> usize {
        match self {
            KeyCommand::CancelPlayback => 0,
            KeyCommand::ToggleHelp => 1,
            KeyCommand::Overview => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not a command key, or typed into a text field.
    Ignored,
    Accepted(KeyCommand),
    /// Pressed again inside its cooldown window. The host shows a short
    /// notice with the remaining whole seconds.
    Suppressed {
        command: KeyCommand,
        remaining_secs: u64,
    },
}

impl KeyOutcome {
    pub fn notice(&self) -> Option<String> {
        match self {
            KeyOutcome::Suppressed { remaining_secs, .. } => {
                Some(format!("please wait {remaining_secs}s before trying again"))
            }
            _ => None,
        }
    }
}

/// Per-key cooldown tracking. Keys never share a window.
#[derive(Debug, Clone)]
pub struct KeyCooldowns {
    cooldown_ms: f64,
    last_accepted: [Option<Time>; 3],
}

impl KeyCooldowns {
    pub fn new(cooldown_ms: f64) -> Self {
        Self {
            cooldown_ms,
            last_accepted: [None; 3],
        }
    }

    pub fn press(&mut self, key: char, now: Time, text_input_focused: bool) -> KeyOutcome {
        if text_input_focused {
            return KeyOutcome::Ignored;
        }
        let Some(command) = KeyCommand::from_key(key) else {
            return KeyOutcome::Ignored;
        };

        let slot = &mut self.last_accepted[command.slot()];
        if let Some(last) = *slot {
            let elapsed = now.since(last);
            if elapsed <= self.cooldown_ms {
                let remaining_secs = ((self.cooldown_ms - elapsed) / 1000.0).ceil() as u64;
                return KeyOutcome::Suppressed {
                    command,
                    remaining_secs,
                };
            }
        }
        *slot = Some(now);
        KeyOutcome::Accepted(command)
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyCommand, KeyCooldowns, KeyOutcome};
    use foundation::time::Time;

    #[test]
    fn maps_keys_case_insensitively() {
        assert_eq!(KeyCommand::from_key('E'), Some(KeyCommand::CancelPlayback));
        assert_eq!(KeyCommand::from_key('i'), Some(KeyCommand::ToggleHelp));
        assert_eq!(KeyCommand::from_key('M'), Some(KeyCommand::Overview));
        assert_eq!(KeyCommand::from_key('x'), None);
    }

    #[test]
    fn repeat_inside_window_is_suppressed_with_remaining_time() {
        let mut keys = KeyCooldowns::new(1500.0);
        assert_eq!(
            keys.press('m', Time(0.0), false),
            KeyOutcome::Accepted(KeyCommand::Overview)
        );
        let repeat = keys.press('m', Time(200.0), false);
        assert_eq!(
            repeat,
            KeyOutcome::Suppressed {
                command: KeyCommand::Overview,
                remaining_secs: 2,
            }
        );
        assert!(repeat.notice().unwrap().contains('2'));
        assert_eq!(
            keys.press('m', Time(1000.0), false),
            KeyOutcome::Suppressed {
                command: KeyCommand::Overview,
                remaining_secs: 1,
            }
        );
        assert_eq!(
            keys.press('m', Time(1600.0), false),
            KeyOutcome::Accepted(KeyCommand::Overview)
        );
    }

    #[test]
    fn suppressed_press_does_not_extend_window() {
        let mut keys = KeyCooldowns::new(1500.0);
        keys.press('e', Time(0.0), false);
        keys.press('e', Time(1400.0), false);
        assert_eq!(
            keys.press('e', Time(1501.0), false),
            KeyOutcome::Accepted(KeyCommand::CancelPlayback)
        );
    }

    #[test]
    fn keys_cool_down_independently() {
        let mut keys = KeyCooldowns::new(1500.0);
        keys.press('m', Time(0.0), false);
        assert_eq!(
            keys.press('i', Time(10.0), false),
            KeyOutcome::Accepted(KeyCommand::ToggleHelp)
        );
        assert_eq!(
            keys.press('e', Time(20.0), false),
            KeyOutcome::Accepted(KeyCommand::CancelPlayback)
        );
    }

    #[test]
    fn text_input_focus_swallows_keys() {
        let mut keys = KeyCooldowns::new(1500.0);
        assert_eq!(keys.press('m', Time(0.0), true), KeyOutcome::Ignored);
        // Ignored presses do not start a cooldown.
        assert_eq!(
            keys.press('m', Time(1.0), false),
            KeyOutcome::Accepted(KeyCommand::Overview)
        );
    }
}
