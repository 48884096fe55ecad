//! The page renderer.
//!
//! Builds the template context for the configured revision and form state and
//! renders `index.html`. Every call produces the whole page; the only branch is
//! whether the contact form shows an acknowledgment.

use crate::contact::FormState;
use crate::content::{Card, ImagePlacement, SiteContent};
use crate::router::Response;
use crate::settings::Settings;
use crate::template::{self, Context, TemplateValue};
use crate::theme;

/// Template rendered for the page.
pub const PAGE_TEMPLATE: &str = "index.html";

fn card_value(card: &Card) -> TemplateValue {
    let bullets: Vec<TemplateValue> = card
        .bullets
        .iter()
        .map(|b| TemplateValue::object([("lead", b.lead), ("text", b.text)]))
        .collect();
    TemplateValue::object([
        ("icon", TemplateValue::from(card.icon)),
        ("title", TemplateValue::from(card.title)),
        ("bullets", TemplateValue::List(bullets)),
    ])
}

fn content_values(content: &SiteContent, context: &mut Context) {
    let text = [
        ("page_title", content.page_title),
        ("page_icon", content.page_icon),
        ("nav_title", content.nav_title),
        ("header", content.header),
        ("mission_heading", content.mission_heading),
        ("mission_body", content.mission_body),
        ("cta_label", content.cta_label),
        ("paths_heading", content.paths_heading),
        ("contact_heading", content.contact_heading),
        ("contact_blurb", content.contact_blurb),
        ("submit_label", content.submit_label),
        ("footer", content.footer),
    ];
    for (key, value) in text {
        context.insert(key.to_string(), value.into());
    }

    for (key, image) in [
        ("brand_image", &content.brand_image),
        ("hero_image", &content.hero_image),
    ] {
        context.insert(
            key.to_string(),
            TemplateValue::object([
                ("url", TemplateValue::from(image.url.clone())),
                ("alt", TemplateValue::from(image.alt)),
                ("width", TemplateValue::from(image.width)),
            ]),
        );
    }
    context.insert(
        "image_left".to_string(),
        (content.image_placement == ImagePlacement::Left).into(),
    );

    context.insert(
        "learning_paths".to_string(),
        content.learning_paths.to_vec().into(),
    );
    context.insert(
        "resources".to_string(),
        TemplateValue::List(
            content
                .resources
                .iter()
                .map(|r| TemplateValue::object([("label", r.label), ("href", r.href)]))
                .collect(),
        ),
    );
    context.insert(
        "cards".to_string(),
        TemplateValue::List(content.cards.iter().map(card_value).collect()),
    );

    for (key, field) in [
        ("name_field", content.name_field),
        ("email_field", content.email_field),
        ("message_field", content.message_field),
    ] {
        context.insert(
            key.to_string(),
            TemplateValue::object([("label", field.label), ("placeholder", field.placeholder)]),
        );
    }
}

/// Build the full template context for one render.
pub fn page_context(settings: &Settings, state: &FormState) -> Context {
    let revision = settings.revision;
    let mut context = Context::new();

    content_values(&revision.content(), &mut context);
    context.insert("revision".to_string(), revision.as_str().into());
    context.insert(
        "css".to_string(),
        theme::stylesheet(&revision.palette()).into(),
    );

    let submitted = state.request().cloned().unwrap_or_default();
    context.insert(
        "form".to_string(),
        TemplateValue::object([
            ("name", submitted.name),
            ("email", submitted.email),
            ("message", submitted.message),
        ]),
    );
    if let Some(ack) = state.acknowledgment() {
        context.insert("acknowledgment".to_string(), ack.into());
    }

    context.insert("debug".to_string(), settings.debug.into());
    context.insert("reload_url".to_string(), settings.reload_url().into());
    context
}

/// Render the page for `state`.
pub fn render_page(settings: &Settings, state: &FormState) -> Response {
    let context = page_context(settings, state);
    template::render_template(&settings.template.dir, PAGE_TEMPLATE, &context)
}
