//! Presentational rendering
//!
//! Renders the session detail view and the contact block to HTML with Tera.
//! Templates are embedded in the binary and compiled once.
//! Rendering is a pure function of its input: no state, no side effects.

use once_cell::sync::OnceCell;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

use crate::models::{default_contact_items, ContactIconVariant, ContactItem};
use crate::services::SessionDetailView;

mod error;

pub use error::ThemeError;

/// Templates shipped with the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct Templates;

pub const SESSION_DETAIL_TEMPLATE: &str = "session_detail.html";
pub const CONTACT_LIST_TEMPLATE: &str = "contact_list.html";
pub const CONTACT_ICONS_TEMPLATE: &str = "contact_icons.html";

static RENDERER: OnceCell<Renderer> = OnceCell::new();

/// Tera instance loaded with the embedded templates
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, ThemeError> {
        let mut templates = Vec::new();
        for name in Templates::iter() {
            let file = Templates::get(&name).ok_or_else(|| ThemeError::NotFound(name.to_string()))?;
            let content = String::from_utf8(file.data.into_owned())
                .map_err(|e| ThemeError::TemplateError(format!("{} is not UTF-8: {}", name, e)))?;
            templates.push((name.to_string(), content));
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ThemeError::TemplateError(format!("Failed to load templates: {}", describe(&e))))?;
        tracing::debug!("Loaded {} templates", tera.get_template_names().count());

        Ok(Self { tera })
    }

    /// Shared renderer, built on first use
    pub fn global() -> Result<&'static Renderer, ThemeError> {
        RENDERER.get_or_try_init(Renderer::new)
    }

    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, ThemeError> {
        let context = TeraContext::from_serialize(data)
            .map_err(|e| ThemeError::TemplateError(format!("Invalid context for '{}': {}", template, e)))?;
        self.tera.render(template, &context).map_err(|e| {
            ThemeError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }
}

/// Flatten a Tera error chain into one message
fn describe(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

#[derive(Serialize)]
struct ContactContext<'a> {
    items: &'a [ContactItem],
    variant: ContactIconVariant,
}

/// Render the session detail view
pub fn render_session_detail(view: &SessionDetailView) -> Result<String, ThemeError> {
    Renderer::global()?.render(SESSION_DETAIL_TEMPLATE, view)
}

/// Render a stack of contact entries in one variant
pub fn render_contact_list(items: &[ContactItem], variant: ContactIconVariant) -> Result<String, ThemeError> {
    Renderer::global()?.render(CONTACT_LIST_TEMPLATE, &ContactContext { items, variant })
}

/// Render the two-column contact block
///
/// The left column shows `items` with gradient icons on a white box, the
/// right one the same items with white icons on a gradient box. `None` uses
/// the default entries.
pub fn render_contact_icons(items: Option<&[ContactItem]>) -> Result<String, ThemeError> {
    let defaults;
    let items = match items {
        Some(items) => items,
        None => {
            defaults = default_contact_items();
            &defaults
        }
    };
    Renderer::global()?.render(
        CONTACT_ICONS_TEMPLATE,
        &ContactContext {
            items,
            variant: ContactIconVariant::default(),
        },
    )
}
