// src/models/locator.rs

//! Declarative locator specifications.
//!
//! A [`LocatorSpec`] maps one logical UI target to an ordered list of
//! concrete selection strategies. Order encodes preference, from the most
//! specific selector to the most generic fallback.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the next page number at resolution time.
pub const NEXT_PAGE_PLACEHOLDER: &str = "{next_page}";

/// A single rule for finding one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Id(String),
    Name(String),
    Css(String),
    Xpath(String),
    ClassName(String),
    LinkText(String),
}

impl Strategy {
    /// Short kind label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Strategy::Id(_) => "id",
            Strategy::Name(_) => "name",
            Strategy::Css(_) => "css",
            Strategy::Xpath(_) => "xpath",
            Strategy::ClassName(_) => "class",
            Strategy::LinkText(_) => "link",
        }
    }

    /// The raw selector value.
    pub fn value(&self) -> &str {
        match self {
            Strategy::Id(v)
            | Strategy::Name(v)
            | Strategy::Css(v)
            | Strategy::Xpath(v)
            | Strategy::ClassName(v)
            | Strategy::LinkText(v) => v,
        }
    }

    /// Replace `{next_page}` in the selector value.
    pub fn with_next_page(&self, next_page: u32) -> Strategy {
        let value = self
            .value()
            .replace(NEXT_PAGE_PLACEHOLDER, &next_page.to_string());
        match self {
            Strategy::Id(_) => Strategy::Id(value),
            Strategy::Name(_) => Strategy::Name(value),
            Strategy::Css(_) => Strategy::Css(value),
            Strategy::Xpath(_) => Strategy::Xpath(value),
            Strategy::ClassName(_) => Strategy::ClassName(value),
            Strategy::LinkText(_) => Strategy::LinkText(value),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Strategy::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Strategy::Xpath(value.into())
    }

    pub fn id(value: impl Into<String>) -> Self {
        Strategy::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Strategy::Name(value.into())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.value())
    }
}

/// What an element must satisfy before a wait succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Attached to the DOM
    Present,
    /// Attached and displayed
    Visible,
    /// Displayed and enabled
    #[default]
    Clickable,
}

/// Ordered fallback chain for one logical target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorSpec {
    /// Logical target name, e.g. `export_button`
    pub target: String,

    /// Wait condition applied to every strategy
    #[serde(default)]
    pub condition: Condition,

    /// Strategies in preference order
    pub strategies: Vec<Strategy>,
}

impl LocatorSpec {
    pub fn new(target: impl Into<String>, condition: Condition, strategies: Vec<Strategy>) -> Self {
        Self {
            target: target.into(),
            condition,
            strategies,
        }
    }

    /// Copy of this spec with `{next_page}` substituted in every strategy.
    pub fn for_next_page(&self, next_page: u32) -> Self {
        Self {
            target: self.target.clone(),
            condition: self.condition,
            strategies: self
                .strategies
                .iter()
                .map(|s| s.with_next_page(next_page))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_deserialize_from_inline_tables() {
        let spec: LocatorSpec = toml::from_str(
            r#"
            target = "search_input"
            condition = "present"
            strategies = [
                { id = "search-input-field" },
                { name = "qs" },
                { css = "input[type='search']" },
                { xpath = "//input[contains(@placeholder, 'Search')]" },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(spec.condition, Condition::Present);
        assert_eq!(spec.strategies[0], Strategy::id("search-input-field"));
        assert_eq!(spec.strategies[1], Strategy::name("qs"));
        assert_eq!(spec.strategies[3].kind(), "xpath");
    }

    #[test]
    fn condition_defaults_to_clickable() {
        let spec: LocatorSpec =
            toml::from_str("target = \"x\"\nstrategies = [{ css = \"a\" }]").unwrap();
        assert_eq!(spec.condition, Condition::Clickable);
    }

    #[test]
    fn next_page_placeholder_is_substituted() {
        let spec = LocatorSpec::new(
            "next_page",
            Condition::Clickable,
            vec![
                Strategy::css("li.next-link"),
                Strategy::xpath("//a[contains(text(), '{next_page}')]"),
            ],
        );
        let resolved = spec.for_next_page(4);
        assert_eq!(resolved.strategies[0], Strategy::css("li.next-link"));
        assert_eq!(
            resolved.strategies[1],
            Strategy::xpath("//a[contains(text(), '4')]")
        );
    }

    #[test]
    fn display_includes_kind_and_value() {
        assert_eq!(Strategy::id("btn-google").to_string(), "id: btn-google");
    }
}
