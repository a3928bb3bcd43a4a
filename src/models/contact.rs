//! Contact info block model

use serde::{Deserialize, Serialize};

/// Icon background style; changes presentation only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactIconVariant {
    /// Gradient icon tile, light title, dark description
    #[default]
    Gradient,
    /// Bare icon, tinted title, white description
    White,
}

impl std::fmt::Display for ContactIconVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gradient => write!(f, "gradient"),
            Self::White => write!(f, "white"),
        }
    }
}

/// Icon shown next to a contact entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContactIcon {
    At,
    Phone,
    MapPin,
    Sun,
}

/// One row of the contact block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactItem {
    pub title: String,
    pub description: String,
    pub icon: ContactIcon,
}

impl ContactItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>, icon: ContactIcon) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            icon,
        }
    }
}

/// Entries shown when the landing page supplies none
pub fn default_contact_items() -> Vec<ContactItem> {
    vec![
        ContactItem::new("Email", "hello@mantine.dev", ContactIcon::At),
        ContactItem::new("Phone", "+49 (800) 335 35 35", ContactIcon::Phone),
        ContactItem::new("Address", "844 Morris Park avenue", ContactIcon::MapPin),
        ContactItem::new("Working hours", "8 a.m. – 11 p.m.", ContactIcon::Sun),
    ]
}
