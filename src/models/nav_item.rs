//! Navigation item model and predicates
//!
//! A navigation entry is either a link or a sub-menu. On the wire the two are
//! told apart by the presence of `href` (link) or `subitems` (menu).

use serde::{Deserialize, Serialize};

/// Navigation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavItem {
    Link(LinkNavItem),
    SubMenu(SubNavItem),
}

/// Entry pointing at a destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkNavItem {
    pub label: String,
    pub href: String,
    /// Open-target hint such as `_blank`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Pages for which this entry is highlighted
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_rule: Option<NavMatch>,
}

impl LinkNavItem {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            target: None,
            match_rule: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_match(mut self, rule: NavMatch) -> Self {
        self.match_rule = Some(rule);
        self
    }
}

/// Entry grouping other entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubNavItem {
    pub label: String,
    #[serde(default)]
    pub subitems: Vec<NavItem>,
}

/// Match rule: a single page or a set of pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NavMatch {
    Exact(String),
    AnyOf(Vec<String>),
}

impl NavMatch {
    fn matches(&self, page: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == page,
            Self::AnyOf(pages) => pages.iter().any(|p| p == page),
        }
    }
}

/// True iff the item carries a destination
pub fn is_link_item(item: &NavItem) -> bool {
    matches!(item, NavItem::Link(_))
}

/// True iff the item carries at least one sub-item
pub fn is_with_menu(item: &NavItem) -> bool {
    matches!(item, NavItem::SubMenu(menu) if !menu.subitems.is_empty())
}

/// Check if the item is active for the current page
///
/// Items without a match rule are never active, otherwise every link would
/// light up.
pub fn is_active(item: &NavItem, current_page: Option<&str>) -> bool {
    let NavItem::Link(link) = item else {
        return false;
    };
    match (&link.match_rule, current_page) {
        (Some(rule), Some(page)) => rule.matches(page),
        _ => false,
    }
}

/// Open-target hint of a link, `None` for menus
pub fn get_target(item: &NavItem) -> Option<&str> {
    match item {
        NavItem::Link(link) => link.target.as_deref(),
        NavItem::SubMenu(_) => None,
    }
}
