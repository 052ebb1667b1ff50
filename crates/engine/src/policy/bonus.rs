use carepoints_core::CheckinRequest;
use serde::{Deserialize, Serialize};

/// Base points of a mood-score check-in
pub const CHECKIN_BASE_POINTS: i64 = 10;
const EMOTIONS_BONUS: i64 = 5;
const NOTES_BONUS: i64 = 10;
const GRATITUDE_BONUS: i64 = 15;
const PUBLIC_GRATITUDE_BONUS: i64 = 15;

/// Point breakdown of a check-in before the streak multiplier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinBonus {
    pub base: i64,
    pub emotions: i64,
    pub notes: i64,
    pub gratitude: i64,
    pub public_gratitude: i64,
}

impl CheckinBonus {
    pub fn for_request(request: &CheckinRequest) -> Self {
        let has_gratitude = !request.gratitude.trim().is_empty();
        Self {
            base: CHECKIN_BASE_POINTS,
            emotions: if request.emotions.is_empty() { 0 } else { EMOTIONS_BONUS },
            notes: if request.notes.trim().is_empty() { 0 } else { NOTES_BONUS },
            gratitude: if has_gratitude { GRATITUDE_BONUS } else { 0 },
            public_gratitude: if has_gratitude && request.public_gratitude {
                PUBLIC_GRATITUDE_BONUS
            } else {
                0
            },
        }
    }

    pub fn total(&self) -> i64 {
        self.base + self.extras()
    }

    /// Everything on top of the base points
    pub fn extras(&self) -> i64 {
        self.emotions + self.notes + self.gratitude + self.public_gratitude
    }
}

/// Length bonus for a journal entry: +5 at 50 words, +10 at 100
pub fn journal_bonus(content: &str) -> i64 {
    match content.split_whitespace().count() {
        n if n >= 100 => 10,
        n if n >= 50 => 5,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_checkin_is_base_only() {
        let request = CheckinRequest {
            mood_score: 6,
            ..Default::default()
        };
        let bonus = CheckinBonus::for_request(&request);
        assert_eq!(bonus.total(), 10);
        assert_eq!(bonus.extras(), 0);
    }

    #[test]
    fn test_full_checkin() {
        let request = CheckinRequest {
            mood_score: 8,
            emotions: vec!["calm".to_string()],
            notes: "slept well".to_string(),
            gratitude: "my sister".to_string(),
            public_gratitude: true,
        };
        assert_eq!(CheckinBonus::for_request(&request).total(), 55);
    }

    #[test]
    fn test_public_flag_needs_gratitude_text() {
        let request = CheckinRequest {
            mood_score: 4,
            gratitude: "   ".to_string(),
            public_gratitude: true,
            ..Default::default()
        };
        let bonus = CheckinBonus::for_request(&request);
        assert_eq!(bonus.gratitude, 0);
        assert_eq!(bonus.public_gratitude, 0);
    }

    #[test]
    fn test_journal_word_thresholds() {
        assert_eq!(journal_bonus("short entry"), 0);
        assert_eq!(journal_bonus(&"word ".repeat(49)), 0);
        assert_eq!(journal_bonus(&"word ".repeat(50)), 5);
        assert_eq!(journal_bonus(&"word ".repeat(100)), 10);
    }
}
