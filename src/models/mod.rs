//! Data models
//!
//! This module contains the data structures shared across sessionctl:
//! - Session snapshots and the backend request bodies
//! - Navigation items and their predicates
//! - Contact block entries

mod contact;
pub mod nav_item;
mod session;

pub use contact::{default_contact_items, ContactIcon, ContactIconVariant, ContactItem};
pub use nav_item::{get_target, is_active, is_link_item, is_with_menu, LinkNavItem, NavItem, NavMatch, SubNavItem};
pub use session::{
    ActivateSessionRequest, AllowedUser, Session, SessionAccessRequest, SessionIdRequest,
    SessionLookup,
};
