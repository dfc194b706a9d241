//! Property values as seen by the sync engine.

use crate::error::{GradientReason, SchemaError, SchemaResult};

/// An RGBA color. Encodes as `[r, g, b, a]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);

    /// Creates an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Creates a color with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the fixed-arity component array.
    #[must_use]
    pub const fn components(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A banded background gradient.
///
/// Invariant: `colors.len() == stops.len()`, `stops[0] == 0`, and stops are
/// strictly ascending percentages no greater than 100.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gradient {
    colors: Vec<Rgba>,
    stops: Vec<u8>,
    vertical: bool,
}

impl Gradient {
    /// Creates a gradient from colors and the percentages between them.
    ///
    /// `percents` has one entry less than `colors`; the leading `0` stop is
    /// implicit.
    pub fn new(colors: Vec<Rgba>, percents: &[u8], vertical: bool) -> SchemaResult<Self> {
        let mut stops = Vec::with_capacity(percents.len() + 1);
        stops.push(0);
        stops.extend_from_slice(percents);
        Self::from_stops(colors, stops, vertical)
    }

    /// Creates a gradient from explicit stops, including the leading `0`.
    pub fn from_stops(colors: Vec<Rgba>, stops: Vec<u8>, vertical: bool) -> SchemaResult<Self> {
        validate_gradient(&colors, &stops)?;
        Ok(Self {
            colors,
            stops,
            vertical,
        })
    }

    #[must_use]
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    #[must_use]
    pub fn stops(&self) -> &[u8] {
        &self.stops
    }

    #[must_use]
    pub const fn is_vertical(&self) -> bool {
        self.vertical
    }
}

fn validate_gradient(colors: &[Rgba], stops: &[u8]) -> SchemaResult<()> {
    if colors.is_empty() {
        return Err(SchemaError::InvalidGradient(GradientReason::NoColors));
    }
    if colors.len() != stops.len() {
        return Err(SchemaError::InvalidGradient(GradientReason::CountMismatch {
            colors: colors.len(),
            stops: stops.len(),
        }));
    }
    if stops[0] != 0 {
        return Err(SchemaError::InvalidGradient(
            GradientReason::FirstStopNotZero { found: stops[0] },
        ));
    }
    for (index, pair) in stops.windows(2).enumerate() {
        let (previous, current) = (pair[0], pair[1]);
        if current > 100 {
            return Err(SchemaError::InvalidGradient(
                GradientReason::StopOutOfRange {
                    index: index + 1,
                    value: current,
                },
            ));
        }
        if current <= previous {
            return Err(SchemaError::InvalidGradient(GradientReason::NotAscending {
                index: index + 1,
                previous,
                current,
            }));
        }
    }
    Ok(())
}

/// Reference to a registered binary resource (image).
///
/// The delivery URL is resolved at render time; only the resource name and
/// its dimensions take part in diffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub resource: String,
    pub width: u32,
    pub height: u32,
}

impl ImageRef {
    #[must_use]
    pub fn new(resource: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            resource: resource.into(),
            width,
            height,
        }
    }
}

/// A property value.
///
/// `Null` is the explicit reset sentinel and is encoded on the wire; an
/// absent property is never encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Color(Rgba),
    Gradient(Gradient),
    Image(ImageRef),
    List(Vec<Value>),
}

impl Value {
    /// Returns a short name of the value kind, used in error reports.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::Color(_) => "color",
            Self::Gradient(_) => "gradient",
            Self::Image(_) => "image",
            Self::List(_) => "list",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Rgba> for Value {
    fn from(value: Rgba) -> Self {
        Self::Color(value)
    }
}

impl From<Gradient> for Value {
    fn from(value: Gradient) -> Self {
        Self::Gradient(value)
    }
}

impl From<ImageRef> for Value {
    fn from(value: ImageRef) -> Self {
        Self::Image(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
