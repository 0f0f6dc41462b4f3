//! Response selection and decoration.
//!
//! A matched entry's reply is picked uniformly at random from its response
//! set. The random source is always passed in, so callers decide between
//! `rand::rng()` in production and a seeded `StdRng` in tests.
//!
//! With a personality mood, the reply becomes `"{prefix} {response} {suffix}"`
//! where prefix and suffix are also picked at random. An empty prefix or
//! suffix list leaves that side off.

use chrono::Timelike;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::corpus::{ConversationalEntry, Mood, PersonalityProfile};

/// Returned when a matched entry has no responses.
pub const FALLBACK_RESPONSE: &str = "I'm not sure how to respond to that.";

/// Picks and decorates replies for matched entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseSelector<'p> {
    mood: Option<&'p Mood>,
}

impl<'p> ResponseSelector<'p> {
    /// Selector that never decorates.
    pub fn plain() -> Self {
        Self { mood: None }
    }

    /// Selector decorating with one mood.
    pub fn with_mood(mood: &'p Mood) -> Self {
        Self { mood: Some(mood) }
    }

    /// Selector for `mood_name` in `profile`; plain when either is missing.
    pub fn from_profile(profile: Option<&'p PersonalityProfile>, mood_name: &str) -> Self {
        Self {
            mood: profile.and_then(|p| p.mood(mood_name)),
        }
    }

    pub fn is_decorated(&self) -> bool {
        self.mood
            .map(|m| !m.prefixes.is_empty() || !m.suffixes.is_empty())
            .unwrap_or(false)
    }

    /// Pick one reply for `entry`.
    pub fn select<R: Rng + ?Sized>(&self, entry: &ConversationalEntry, rng: &mut R) -> String {
        let Some(response) = entry.responses.choose(rng) else {
            tracing::debug!(entry = %entry.input, "Entry has no responses, using fallback");
            return FALLBACK_RESPONSE.to_string();
        };

        let Some(mood) = self.mood else {
            return response.clone();
        };

        let prefix = mood.prefixes.choose(rng);
        let suffix = mood.suffixes.choose(rng);

        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(prefix) = prefix {
            parts.push(prefix);
        }
        parts.push(response);
        if let Some(suffix) = suffix {
            parts.push(suffix);
        }
        parts.join(" ")
    }
}

/// Coarse time of day, used for the optional reply suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Before 12 is morning, before 17 afternoon, anything later evening.
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeOfDay::Morning
        } else if hour < 17 {
            TimeOfDay::Afternoon
        } else {
            TimeOfDay::Evening
        }
    }

    /// Current local time of day.
    pub fn now() -> Self {
        Self::from_hour(chrono::Local::now().hour())
    }

    pub fn emoji(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "🌅",
            TimeOfDay::Afternoon => "☀️",
            TimeOfDay::Evening => "🌙",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn thanks() -> ConversationalEntry {
        ConversationalEntry::new(
            "thanks",
            &["thx"],
            &["You're welcome!", "No problem!"],
        )
    }

    #[test]
    fn test_plain_selection_is_member_of_set() {
        let entry = thanks();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let reply = ResponseSelector::plain().select(&entry, &mut rng);
            assert!(entry.responses.contains(&reply), "unexpected reply {}", reply);
        }
    }

    #[test]
    fn test_selection_is_reproducible_with_seed() {
        let entry = thanks();
        let a: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| ResponseSelector::plain().select(&entry, &mut rng)).collect()
        };
        let b: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| ResponseSelector::plain().select(&entry, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_selection_covers_all_responses() {
        let entry = thanks();
        let mut rng = StdRng::seed_from_u64(1);
        let seen: std::collections::HashSet<String> = (0..200)
            .map(|_| ResponseSelector::plain().select(&entry, &mut rng))
            .collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_empty_responses_fall_back() {
        let entry = ConversationalEntry::new("hi", &[], &[]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            ResponseSelector::plain().select(&entry, &mut rng),
            FALLBACK_RESPONSE
        );
    }

    #[test]
    fn test_mood_wraps_response() {
        let entry = ConversationalEntry::new("hi", &[], &["Hello"]);
        let mood = Mood {
            prefixes: vec!["Hey!".to_string()],
            suffixes: vec!["😊".to_string()],
        };
        let mut rng = StdRng::seed_from_u64(3);
        let reply = ResponseSelector::with_mood(&mood).select(&entry, &mut rng);
        assert_eq!(reply, "Hey! Hello 😊");
    }

    #[test]
    fn test_mood_with_empty_side() {
        let entry = ConversationalEntry::new("hi", &[], &["Hello"]);
        let mood = Mood {
            prefixes: vec!["Sure.".to_string()],
            suffixes: vec![],
        };
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(
            ResponseSelector::with_mood(&mood).select(&entry, &mut rng),
            "Sure. Hello"
        );
    }

    #[test]
    fn test_empty_mood_is_unwrapped() {
        let entry = ConversationalEntry::new("hi", &[], &["Hello"]);
        let mood = Mood::default();
        let selector = ResponseSelector::with_mood(&mood);
        assert!(!selector.is_decorated());
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(selector.select(&entry, &mut rng), "Hello");
    }

    #[test]
    fn test_from_profile_missing_mood_is_plain() {
        let profile = PersonalityProfile::new().with_mood("friendly", &["Hey!"], &["😊"]);
        assert!(ResponseSelector::from_profile(Some(&profile), "friendly").is_decorated());
        assert!(!ResponseSelector::from_profile(Some(&profile), "grumpy").is_decorated());
        assert!(!ResponseSelector::from_profile(None, "friendly").is_decorated());
    }

    #[test]
    fn test_time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23).emoji(), "🌙");
    }
}
