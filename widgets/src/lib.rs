//! Standard widgets for widgetsync.
//!
//! This crate provides the concrete widget set on top of the engine:
//! - Type definitions for Display, Shell, Composite, Label, Button and Text
//! - Typed handles so application code never spells property names
//! - A text adapter that validates client-reported selections
//! - A small demo application
//!
//! # Design Principles
//!
//! - **Definitions drive rendering** - Most widgets use the engine's generic
//!   adapter; only Text needs custom read validation.
//! - **Handles are ids** - A handle is `Copy` and owns nothing. All state
//!   stays in the session.

mod demo;
mod handles;
mod text;
mod types;

pub use demo::{demo_application, widget_application, LOGO_RESOURCE, LOGO_URL};
pub use handles::{
    Alignment, Button, ButtonStyle, Composite, Container, Control, Display, Label, LabelStyle,
    Shell, Text, Widget,
};
pub use text::{clamp_selection, TextAdapter};
pub use types::{
    button_type, composite_type, display_type, label_type, shell_type, text_type, widget_types,
    BUTTON, COMPOSITE, DEFAULT_LABEL_MARGIN, DISPLAY, LABEL, SHELL, TEXT,
};
