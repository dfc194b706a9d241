//! A small greeting application used by the CLI and the integration tests.
//!
//! The tree is one shell holding a heading label, a name field, a greet
//! button and an output label. Pressing the button copies the name into the
//! output label; typing updates a character count in the heading.

use engine::{Application, MapResolver, SyncResult, Ui};
use schema::{Gradient, ImageRef, Rgba, SchemaResult};
use tracing::debug;

use crate::handles::{
    Alignment, Button, ButtonStyle, Composite, Display, Label, LabelStyle, Shell, Text,
};
use crate::text::TextAdapter;
use crate::types::widget_types;

pub const LOGO_RESOURCE: &str = "icons/logo.png";
pub const LOGO_URL: &str = "rwt-resources/icons/logo.png";

/// Application with the standard widget types and the text adapter, without
/// an entry point.
pub fn widget_application() -> SchemaResult<Application> {
    let mut resolver = MapResolver::new();
    resolver.register(LOGO_RESOURCE, LOGO_URL);
    Ok(Application::new(widget_types()?)
        .with_adapter(TextAdapter::new())
        .with_resolver(resolver))
}

/// The greeting demo.
pub fn demo_application() -> SchemaResult<Application> {
    Ok(widget_application()?.with_entry_point(build_demo))
}

fn build_demo(ui: &mut Ui<'_>) -> SyncResult<()> {
    let display = Display::create(ui)?;
    let shell = Shell::create_with_style(ui, display, &["TITLE", "CLOSE"])?;
    shell.set_text(ui, "widgetsync demo")?;
    shell.dispose_on_close(ui)?;

    let body = Composite::create(ui, shell)?;
    let heading = Label::create_with_style(ui, body, &[LabelStyle::ShadowIn])?;
    heading.set_text(ui, "Who are you?")?;
    heading.set_image(ui, Some(ImageRef::new(LOGO_RESOURCE, 32, 32)))?;
    heading.set_background_gradient(
        ui,
        Gradient::new(vec![Rgba::rgb(255, 255, 255), Rgba::rgb(200, 200, 255)], &[100], true)
            .ok(),
    )?;

    let name = Text::create(ui, body)?;
    name.set_message(ui, Some("Your name"))?;
    name.set_text_limit(ui, Some(40))?;

    let greet = Button::create(ui, body, ButtonStyle::Push)?;
    greet.set_text(ui, "Greet")?;

    let output = Label::create_with_style(ui, body, &[LabelStyle::Center])?;
    output.set_margins(ui, 8)?;

    name.on_modify(ui, move |ui, _| {
        let count = name.text(ui)?.chars().count();
        heading.set_text(ui, &format!("Who are you? ({count} characters)"))
    })?;
    greet.on_selection(ui, move |ui, _| {
        let who = name.text(ui)?;
        debug!(name = %who, "greeting");
        if who.is_empty() {
            output.set_alignment(ui, Alignment::Left)?;
            output.set_text(ui, "Nobody to greet")
        } else {
            output.set_alignment(ui, Alignment::Center)?;
            output.set_text(ui, &format!("Hello, {who}!"))
        }
    })?;

    shell.open(ui)
}
