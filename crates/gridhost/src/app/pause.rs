pub const PAUSE_LABEL: &str = "Pause";
pub const PLAY_LABEL: &str = "Play";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PauseToggle {
    paused: bool,
}

impl PauseToggle {
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Flips the state and returns the new `paused` value.
    pub fn toggle(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Text for the control: the action it would perform next.
    pub fn label(&self) -> &'static str {
        if self.paused {
            PLAY_LABEL
        } else {
            PAUSE_LABEL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_with_pause_label() {
        let toggle = PauseToggle::default();
        assert!(!toggle.is_paused());
        assert_eq!(toggle.label(), PAUSE_LABEL);
    }

    #[test]
    fn toggle_flips_state_and_label() {
        let mut toggle = PauseToggle::default();
        assert!(toggle.toggle());
        assert_eq!(toggle.label(), PLAY_LABEL);
    }

    #[test]
    fn toggling_twice_restores_state_and_label() {
        let mut toggle = PauseToggle::default();
        let original = toggle;

        toggle.toggle();
        toggle.toggle();

        assert_eq!(toggle, original);
        assert_eq!(toggle.label(), original.label());
    }
}
