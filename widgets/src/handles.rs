//! Typed handles over [`Ui`].
//!
//! A handle is a copyable object id tagged with its widget type. Every
//! accessor takes the `Ui` of the current `ProcessAction` phase, so handles
//! can be captured by event handlers and used in later requests.

use std::collections::BTreeMap;
use std::fmt;

use engine::{Event, ObjectId, SyncResult, Ui};
use schema::{Gradient, ImageRef, Rgba, Value};

use crate::text::clamp_selection;
use crate::types::{BUTTON, COMPOSITE, DISPLAY, LABEL, SHELL, TEXT};

/// Common behaviour of widget handles.
pub trait Widget: Copy {
    fn id(self) -> ObjectId;

    /// Destroys the widget and its children. Returns false if it was
    /// already gone.
    fn dispose(self, ui: &mut Ui<'_>) -> bool {
        ui.destroy(self.id())
    }

    #[must_use]
    fn is_disposed(self, ui: &Ui<'_>) -> bool {
        !ui.exists(self.id())
    }
}

/// Widgets that carry the common control properties.
pub trait Control: Widget {
    fn set_visible(self, ui: &mut Ui<'_>, visible: bool) -> SyncResult<()> {
        ui.set(self.id(), "visible", visible)
    }

    fn set_enabled(self, ui: &mut Ui<'_>, enabled: bool) -> SyncResult<()> {
        ui.set(self.id(), "enabled", enabled)
    }

    fn set_tool_tip(self, ui: &mut Ui<'_>, tool_tip: Option<&str>) -> SyncResult<()> {
        ui.set(self.id(), "toolTip", tool_tip)
    }

    fn set_foreground(self, ui: &mut Ui<'_>, color: Option<Rgba>) -> SyncResult<()> {
        ui.set(self.id(), "foreground", color)
    }

    fn set_background(self, ui: &mut Ui<'_>, color: Option<Rgba>) -> SyncResult<()> {
        ui.set(self.id(), "background", color)
    }
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(ObjectId);

        impl Widget for $name {
            fn id(self) -> ObjectId {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$name> for ObjectId {
            fn from(handle: $name) -> Self {
                handle.0
            }
        }
    };
}

handle!(
    /// The root of a session's widget tree.
    Display
);
handle!(
    /// A top-level window.
    Shell
);
handle!(Composite);
handle!(
    /// Static text and image with margins and an optional gradient.
    Label
);
handle!(Button);
handle!(
    /// Single-line text input.
    Text
);

impl Control for Composite {}
impl Control for Label {}
impl Control for Button {}
impl Control for Text {}

/// Anything that can contain controls.
pub trait Container: Widget {}

impl Container for Shell {}
impl Container for Composite {}

fn text_or_none(value: Value) -> Option<String> {
    match value {
        Value::Str(text) => Some(text),
        _ => None,
    }
}

impl Display {
    pub fn create(ui: &mut Ui<'_>) -> SyncResult<Self> {
        ui.create(DISPLAY, None).map(Self)
    }

    /// Control the client reported as focused.
    pub fn focus_control(self, ui: &Ui<'_>) -> SyncResult<Option<ObjectId>> {
        let value = ui.get(self.0, "focusControl")?;
        Ok(value.as_str().and_then(ObjectId::parse))
    }

    pub fn beep(self, ui: &mut Ui<'_>) -> SyncResult<()> {
        ui.call(self.0, "beep", BTreeMap::new())
    }
}

impl Shell {
    pub fn create(ui: &mut Ui<'_>, display: Display) -> SyncResult<Self> {
        ui.create(SHELL, Some(display.0)).map(Self)
    }

    pub fn create_with_style(
        ui: &mut Ui<'_>,
        display: Display,
        styles: &[&str],
    ) -> SyncResult<Self> {
        ui.create_with_style(SHELL, Some(display.0), styles).map(Self)
    }

    pub fn set_text(self, ui: &mut Ui<'_>, title: &str) -> SyncResult<()> {
        ui.set(self.0, "text", title)
    }

    /// Makes the shell visible.
    pub fn open(self, ui: &mut Ui<'_>) -> SyncResult<()> {
        ui.set(self.0, "visible", true)
    }

    pub fn is_active(self, ui: &Ui<'_>) -> SyncResult<bool> {
        Ok(ui.get(self.0, "active")?.as_bool().unwrap_or(false))
    }

    /// Disposes the shell when the client closes it.
    pub fn dispose_on_close(self, ui: &mut Ui<'_>) -> SyncResult<()> {
        ui.on(self.0, "Close", move |ui, _| {
            self.dispose(ui);
            Ok(())
        })
    }
}

impl Composite {
    pub fn create(ui: &mut Ui<'_>, parent: impl Container) -> SyncResult<Self> {
        ui.create(COMPOSITE, Some(parent.id())).map(Self)
    }
}

/// Horizontal placement of a label's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Style flags of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    ShadowIn,
    ShadowOut,
    ShadowNone,
    Center,
    Right,
}

impl LabelStyle {
    /// Flag sent in the create operation, if the style is a client style.
    const fn flag(self) -> Option<&'static str> {
        match self {
            Self::ShadowIn => Some("SHADOW_IN"),
            Self::ShadowOut => Some("SHADOW_OUT"),
            Self::ShadowNone => Some("SHADOW_NONE"),
            Self::Center | Self::Right => None,
        }
    }
}

impl Label {
    pub fn create(ui: &mut Ui<'_>, parent: impl Container) -> SyncResult<Self> {
        Self::create_with_style(ui, parent, &[])
    }

    /// Creates a label. Alignment styles become the initial alignment,
    /// shadow styles are sent as style flags.
    pub fn create_with_style(
        ui: &mut Ui<'_>,
        parent: impl Container,
        styles: &[LabelStyle],
    ) -> SyncResult<Self> {
        let flags: Vec<&str> = styles.iter().filter_map(|style| style.flag()).collect();
        let label = Self(ui.create_with_style(LABEL, Some(parent.id()), &flags)?);
        let alignment = styles.iter().rev().find_map(|style| match style {
            LabelStyle::Center => Some(Alignment::Center),
            LabelStyle::Right => Some(Alignment::Right),
            _ => None,
        });
        if let Some(alignment) = alignment {
            label.set_alignment(ui, alignment)?;
        }
        Ok(label)
    }

    pub fn text(self, ui: &Ui<'_>) -> SyncResult<Option<String>> {
        ui.get(self.0, "text").map(text_or_none)
    }

    pub fn set_text(self, ui: &mut Ui<'_>, text: &str) -> SyncResult<()> {
        ui.set(self.0, "text", text)
    }

    pub fn set_image(self, ui: &mut Ui<'_>, image: Option<ImageRef>) -> SyncResult<()> {
        ui.set(self.0, "image", image)
    }

    pub fn alignment(self, ui: &Ui<'_>) -> SyncResult<Alignment> {
        let value = ui.get(self.0, "alignment")?;
        Ok(value
            .as_str()
            .and_then(Alignment::from_name)
            .unwrap_or_default())
    }

    pub fn set_alignment(self, ui: &mut Ui<'_>, alignment: Alignment) -> SyncResult<()> {
        ui.set(self.0, "alignment", alignment.as_str())
    }

    pub fn set_left_margin(self, ui: &mut Ui<'_>, margin: i64) -> SyncResult<()> {
        ui.set(self.0, "leftMargin", margin)
    }

    pub fn set_top_margin(self, ui: &mut Ui<'_>, margin: i64) -> SyncResult<()> {
        ui.set(self.0, "topMargin", margin)
    }

    pub fn set_right_margin(self, ui: &mut Ui<'_>, margin: i64) -> SyncResult<()> {
        ui.set(self.0, "rightMargin", margin)
    }

    pub fn set_bottom_margin(self, ui: &mut Ui<'_>, margin: i64) -> SyncResult<()> {
        ui.set(self.0, "bottomMargin", margin)
    }

    /// Sets all four margins.
    pub fn set_margins(self, ui: &mut Ui<'_>, margin: i64) -> SyncResult<()> {
        self.set_left_margin(ui, margin)?;
        self.set_top_margin(ui, margin)?;
        self.set_right_margin(ui, margin)?;
        self.set_bottom_margin(ui, margin)
    }

    pub fn set_background_gradient(
        self,
        ui: &mut Ui<'_>,
        gradient: Option<Gradient>,
    ) -> SyncResult<()> {
        ui.set(self.0, "backgroundGradient", gradient)
    }

    /// Only takes effect before the label is first rendered.
    pub fn set_markup_enabled(self, ui: &mut Ui<'_>, enabled: bool) -> SyncResult<()> {
        ui.set(self.0, "markupEnabled", enabled)
    }
}

/// Kind of button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    #[default]
    Push,
    Check,
    Radio,
    Toggle,
}

impl ButtonStyle {
    const fn flag(self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::Check => "CHECK",
            Self::Radio => "RADIO",
            Self::Toggle => "TOGGLE",
        }
    }
}

impl Button {
    pub fn create(ui: &mut Ui<'_>, parent: impl Container, style: ButtonStyle) -> SyncResult<Self> {
        ui.create_with_style(BUTTON, Some(parent.id()), &[style.flag()])
            .map(Self)
    }

    pub fn text(self, ui: &Ui<'_>) -> SyncResult<Option<String>> {
        ui.get(self.0, "text").map(text_or_none)
    }

    pub fn set_text(self, ui: &mut Ui<'_>, text: &str) -> SyncResult<()> {
        ui.set(self.0, "text", text)
    }

    pub fn set_image(self, ui: &mut Ui<'_>, image: Option<ImageRef>) -> SyncResult<()> {
        ui.set(self.0, "image", image)
    }

    pub fn selection(self, ui: &Ui<'_>) -> SyncResult<bool> {
        Ok(ui.get(self.0, "selection")?.as_bool().unwrap_or(false))
    }

    pub fn set_selection(self, ui: &mut Ui<'_>, selected: bool) -> SyncResult<()> {
        ui.set(self.0, "selection", selected)
    }

    pub fn focus(self, ui: &mut Ui<'_>) -> SyncResult<()> {
        ui.call(self.0, "focus", BTreeMap::new())
    }

    pub fn on_selection<F>(self, ui: &mut Ui<'_>, handler: F) -> SyncResult<()>
    where
        F: FnMut(&mut Ui<'_>, &Event) -> SyncResult<()> + Send + 'static,
    {
        ui.on(self.0, "Selection", handler)
    }
}

impl Text {
    pub fn create(ui: &mut Ui<'_>, parent: impl Container) -> SyncResult<Self> {
        ui.create(TEXT, Some(parent.id())).map(Self)
    }

    pub fn text(self, ui: &Ui<'_>) -> SyncResult<String> {
        Ok(text_or_none(ui.get(self.0, "text")?).unwrap_or_default())
    }

    /// Replaces the content. The selection is clamped to the new content.
    pub fn set_text(self, ui: &mut Ui<'_>, text: &str) -> SyncResult<()> {
        let (start, end) = self.selection(ui)?;
        ui.set(self.0, "text", text)?;
        self.set_selection(ui, start, end)
    }

    /// Selected character range, start inclusive and end exclusive.
    pub fn selection(self, ui: &Ui<'_>) -> SyncResult<(i64, i64)> {
        let value = ui.get(self.0, "selection")?;
        let range = match value {
            Value::List(items) => match items.as_slice() {
                [start, end] => start.as_int().zip(end.as_int()),
                _ => None,
            },
            _ => None,
        };
        Ok(range.unwrap_or((0, 0)))
    }

    /// Selects a range, clamped to the current content.
    pub fn set_selection(self, ui: &mut Ui<'_>, start: i64, end: i64) -> SyncResult<()> {
        let length = self.text(ui)?.chars().count();
        let (start, end) = clamp_selection(start, end, length);
        ui.set(
            self.0,
            "selection",
            Value::List(vec![Value::Int(start), Value::Int(end)]),
        )
    }

    pub fn set_message(self, ui: &mut Ui<'_>, message: Option<&str>) -> SyncResult<()> {
        ui.set(self.0, "message", message)
    }

    pub fn set_editable(self, ui: &mut Ui<'_>, editable: bool) -> SyncResult<()> {
        ui.set(self.0, "editable", editable)
    }

    pub fn set_text_limit(self, ui: &mut Ui<'_>, limit: Option<i64>) -> SyncResult<()> {
        ui.set(self.0, "textLimit", limit)
    }

    pub fn focus(self, ui: &mut Ui<'_>) -> SyncResult<()> {
        ui.call(self.0, "focus", BTreeMap::new())
    }

    pub fn on_modify<F>(self, ui: &mut Ui<'_>, handler: F) -> SyncResult<()>
    where
        F: FnMut(&mut Ui<'_>, &Event) -> SyncResult<()> + Send + 'static,
    {
        ui.on(self.0, "Modify", handler)
    }

    pub fn on_default_selection<F>(self, ui: &mut Ui<'_>, handler: F) -> SyncResult<()>
    where
        F: FnMut(&mut Ui<'_>, &Event) -> SyncResult<()> + Send + 'static,
    {
        ui.on(self.0, "DefaultSelection", handler)
    }
}
