// File: crates/export-core/src/request.rs
// Summary: ExportRequest value, tabular row type, and RGBA colors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::format::ExportFormat;

/// One record of tabular chart data; keys keep insertion order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Straight (non-premultiplied) RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_opaque() {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color `{s}`"));
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        let nibble = |i: usize| {
            u8::from_str_radix(&hex[i..i + 1], 16)
                .map(|v| v * 17)
                .map_err(|e| e.to_string())
        };
        match hex.len() {
            3 => Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(format!("invalid color `{s}`: expected #rgb, #rrggbb or #rrggbbaa")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Describes one export operation. Built on a user action, dropped when the export ends.
#[derive(Debug)]
pub struct ExportRequest<'a, E: ?Sized> {
    pub format: ExportFormat,
    pub target: Option<&'a E>,
    pub rows: &'a [Row],
    pub title: &'a str,
    pub file_name_base: Option<&'a str>,
    pub background: Option<Color>,
    /// PNG: resolution multiplier. JPEG: encoder quality in `0..=1`.
    pub quality_or_scale: Option<f32>,
}

impl<'a, E: ?Sized> Clone for ExportRequest<'a, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, E: ?Sized> Copy for ExportRequest<'a, E> {}

impl<'a, E: ?Sized> ExportRequest<'a, E> {
    pub fn new(format: ExportFormat, title: &'a str) -> Self {
        Self {
            format,
            target: None,
            rows: &[],
            title,
            file_name_base: None,
            background: None,
            quality_or_scale: None,
        }
    }

    pub fn target(mut self, element: &'a E) -> Self {
        self.target = Some(element);
        self
    }

    pub fn rows(mut self, rows: &'a [Row]) -> Self {
        self.rows = rows;
        self
    }

    pub fn file_name_base(mut self, base: &'a str) -> Self {
        self.file_name_base = Some(base);
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    pub fn quality_or_scale(mut self, value: f32) -> Self {
        self.quality_or_scale = Some(value);
        self
    }

    /// Name the download is derived from: the explicit base if given, else the title.
    pub fn base_name(&self) -> &'a str {
        self.file_name_base.unwrap_or(self.title)
    }
}
