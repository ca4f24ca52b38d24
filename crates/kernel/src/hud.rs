use serde::{Deserialize, Serialize};

/// Banner shown once the win threshold is reached.
pub const WIN_TEXT: &str = "You win!";

/// On-screen overlay state. Every overlay backend renders from this.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    score_text: String,
    win_visible: bool,
}

impl Hud {
    pub fn new() -> Self {
        let mut hud = Self::default();
        hud.set_score(0);
        hud
    }

    pub fn set_score(&mut self, score: u32) {
        self.score_text = format!("Points: {score}");
    }

    pub fn show_win(&mut self) {
        self.win_visible = true;
    }

    pub fn score_text(&self) -> &str {
        &self.score_text
    }

    pub fn win_visible(&self) -> bool {
        self.win_visible
    }

    pub fn win_text(&self) -> Option<&'static str> {
        self.win_visible.then_some(WIN_TEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_with_hidden_banner() {
        let hud = Hud::new();
        assert_eq!(hud.score_text(), "Points: 0");
        assert!(!hud.win_visible());
        assert_eq!(hud.win_text(), None);
    }

    #[test]
    fn score_and_banner_update() {
        let mut hud = Hud::new();
        hud.set_score(2);
        hud.show_win();
        assert_eq!(hud.score_text(), "Points: 2");
        assert_eq!(hud.win_text(), Some(WIN_TEXT));
    }
}
