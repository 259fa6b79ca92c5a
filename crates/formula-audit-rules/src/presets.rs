//! Rule presets for common configurations.

use crate::{DeprecatedSuperclass, TestBlockPresent, TestBlockQuality};
use formula_audit_core::RuleBox;

/// Preset configurations for formula-audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// Rules every formula must pass.
    #[default]
    Audit,
    /// Audit rules plus the `test do` presence requirement.
    Strict,
}

impl Preset {
    /// Looks up a preset by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "audit" => Some(Self::Audit),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    /// Configuration name of this preset.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Audit => "audit",
            Self::Strict => "strict",
        }
    }

    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        match self {
            Self::Audit => audit_rules(),
            Self::Strict => strict_rules(),
        }
    }
}

/// Returns the default set of rules.
///
/// Includes:
/// - `deprecated-superclass` (FA001) - Replaces deprecated base classes
/// - `test-block-quality` (FA002) - Checks `test do` contents
#[must_use]
pub fn audit_rules() -> Vec<RuleBox> {
    vec![
        Box::new(DeprecatedSuperclass::new()),
        Box::new(TestBlockQuality::new()),
    ]
}

/// Returns the strict set of rules.
///
/// Includes all audit rules plus:
/// - `test-block-present` (FA003) - Requires a `test do` block
#[must_use]
pub fn strict_rules() -> Vec<RuleBox> {
    let mut rules = audit_rules();
    rules.push(Box::new(TestBlockPresent::new()));
    rules
}

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    strict_rules()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(rules: &[RuleBox]) -> Vec<&'static str> {
        rules.iter().map(|r| r.code()).collect()
    }

    #[test]
    fn test_preset_rules() {
        assert_eq!(codes(&Preset::Audit.rules()), ["FA001", "FA002"]);
        assert_eq!(codes(&Preset::Strict.rules()), ["FA001", "FA002", "FA003"]);
        assert_eq!(codes(&all_rules()), ["FA001", "FA002", "FA003"]);
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Preset::from_name("Strict"), Some(Preset::Strict));
        assert_eq!(Preset::from_name("audit"), Some(Preset::Audit));
        assert_eq!(Preset::from_name("recommended"), None);
        assert_eq!(Preset::default().name(), "audit");
    }
}
