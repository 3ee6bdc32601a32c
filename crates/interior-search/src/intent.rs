//! Room-type intent detection by keyword lookup.

/// A category and the phrases that signal it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRule {
    pub category: String,
    pub keywords: Vec<String>,
}

impl IntentRule {
    pub fn new(category: &str, keywords: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Ordered rule list. The first rule with a keyword contained in the
/// lower-cased query wins.
#[derive(Debug, Clone)]
pub struct IntentDetector {
    rules: Vec<IntentRule>,
}

impl Default for IntentDetector {
    fn default() -> Self {
        Self::new(vec![
            IntentRule::new("bedroom", &["bedroom", "bed room", "sleeping"]),
            IntentRule::new("kitchen", &["kitchen", "cooking", "pantry"]),
            IntentRule::new("living room", &["living room", "living area", "lounge", "drawing room", "family room"]),
            IntentRule::new("bathroom", &["bathroom", "bath room", "washroom", "toilet", "restroom", "shower"]),
            IntentRule::new("dining room", &["dining room", "dining area", "dining"]),
            IntentRule::new("home office", &["home office", "study room", "workspace", "office"]),
            IntentRule::new("entrance", &["entrance", "foyer", "entryway", "hallway", "main door"]),
            IntentRule::new("staircase", &["staircase", "stairs", "stairway"]),
        ])
    }
}

impl IntentDetector {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn detect(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|rule| rule.category.as_str())
    }
}

/// Detect with the built-in rules.
pub fn detect_intent(text: &str) -> Option<String> {
    IntentDetector::default().detect(text).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_rooms() {
        assert_eq!(detect_intent("I need a modern bedroom").as_deref(), Some("bedroom"));
        assert_eq!(detect_intent("Cozy LIVING ROOM with jhoola").as_deref(), Some("living room"));
        assert_eq!(detect_intent("wooden stairs").as_deref(), Some("staircase"));
        assert_eq!(detect_intent("colorful spaces"), None);
        assert_eq!(detect_intent(""), None);
    }

    #[test]
    fn earlier_category_wins() {
        assert_eq!(detect_intent("kitchen next to the bedroom").as_deref(), Some("bedroom"));
        assert_eq!(detect_intent("office in the dining area").as_deref(), Some("dining room"));
    }

    #[test]
    fn custom_rules_keep_their_order() {
        let d = IntentDetector::new(vec![IntentRule::new("balcony", &["Balcony"]), IntentRule::new("garden", &["balcony garden"])]);
        assert_eq!(d.detect("balcony garden ideas"), Some("balcony"));
        assert_eq!(d.rules().len(), 2);
    }
}
