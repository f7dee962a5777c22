//! Keyword table mapping questions to categories

use crate::config::ExtractConfig;

pub const GENERAL: &str = "General";
pub const REGISTRATION: &str = "Registration";

/// Keywords that route a question to the registration category
const REGISTRATION_KEYWORDS: &[&str] = &["register", "cost", "discount"];

#[derive(Debug, Clone)]
struct CategoryRule {
    label: String,
    /// Stored lowercased
    keywords: Vec<String>,
}

/// Ordered keyword rules; the first rule with a matching keyword wins
#[derive(Debug, Clone)]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
    default_label: String,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryRules {
    /// Rules with no entries; everything maps to `default_label`
    pub fn empty(default_label: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            default_label: default_label.into(),
        }
    }

    /// The built-in table: registration keywords, then "General"
    pub fn builtin() -> Self {
        let mut rules = Self::empty(GENERAL);
        rules.push(REGISTRATION, REGISTRATION_KEYWORDS.iter().copied());
        rules
    }

    /// Built-in table followed by the rules from the config file
    pub fn from_config(config: &ExtractConfig) -> Self {
        let mut rules = Self::builtin();
        rules.default_label = config.default_category.clone();
        for rule in &config.categories {
            rules.push(&rule.label, rule.keywords.iter().map(String::as_str));
        }
        rules
    }

    /// Append a rule with lower priority than every existing one
    pub fn push<'a>(&mut self, label: &str, keywords: impl IntoIterator<Item = &'a str>) {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        if keywords.is_empty() {
            return;
        }

        self.rules.push(CategoryRule {
            label: label.to_string(),
            keywords,
        });
    }

    /// Category for a question (case-insensitive keyword containment)
    pub fn categorize(&self, question: &str) -> &str {
        let question = question.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| question.contains(k.as_str())))
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.default_label.as_str())
    }

    /// Whether a label can be produced by this table
    pub fn is_known(&self, label: &str) -> bool {
        label == self.default_label || self.rules.iter().any(|r| r.label == label)
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }
}
