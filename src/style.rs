//! Style configuration – the six color roles, page geometry, and the named
//! text presets.
//!
//! Presets are resolved once per render call into a [`ResolvedStyles`] value
//! that is passed explicitly to every later stage; nothing reads ambient
//! style state.

use serde::{Deserialize, Serialize};

use crate::error::ForgeError;

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const GRAY: Self = Self {
        r: 0.35,
        g: 0.35,
        b: 0.35,
        a: 1.0,
    };

    /// Parse `RRGGBB` (a leading `#` is tolerated).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = normalize_hex(hex)?;
        let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
        Some(Self { r, g, b, a: 1.0 })
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Upper-case six hex digits with no `#`, or `None` if `raw` is not a color.
fn normalize_hex(raw: &str) -> Option<String> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_ascii_uppercase())
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Color roles
// ---------------------------------------------------------------------------

/// A named color slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleRole {
    Border,
    Header,
    Footer,
    Heading1,
    Heading2,
    Accent,
}

impl StyleRole {
    pub fn name(self) -> &'static str {
        match self {
            StyleRole::Border => "border",
            StyleRole::Header => "header",
            StyleRole::Footer => "footer",
            StyleRole::Heading1 => "heading1",
            StyleRole::Heading2 => "heading2",
            StyleRole::Accent => "accent",
        }
    }
}

pub const DEFAULT_BORDER: &str = "000080";
pub const DEFAULT_HEADER: &str = "4472C4";
pub const DEFAULT_HEADING1: &str = "2F5597";
pub const DEFAULT_HEADING2: &str = "5B9BD5";
pub const DEFAULT_ACCENT: &str = "70AD47";

/// Caller-supplied color configuration. Values are 6-hex-digit strings
/// without `#`; `footer` falls back to `header` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub border: String,
    pub header: String,
    pub footer: Option<String>,
    pub heading1: String,
    pub heading2: String,
    pub accent: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            border: DEFAULT_BORDER.to_string(),
            header: DEFAULT_HEADER.to_string(),
            footer: None,
            heading1: DEFAULT_HEADING1.to_string(),
            heading2: DEFAULT_HEADING2.to_string(),
            accent: DEFAULT_ACCENT.to_string(),
        }
    }
}

impl StyleConfig {
    /// Load a (possibly partial) JSON style file; missing roles keep defaults.
    pub fn from_json(json: &str) -> Result<Self, ForgeError> {
        serde_json::from_str(json).map_err(|e| ForgeError::Config(e.to_string()))
    }

    /// Raw hex for `role`, applying the footer → header fallback.
    pub fn hex(&self, role: StyleRole) -> &str {
        match role {
            StyleRole::Border => &self.border,
            StyleRole::Header => &self.header,
            StyleRole::Footer => self.footer.as_deref().unwrap_or(&self.header),
            StyleRole::Heading1 => &self.heading1,
            StyleRole::Heading2 => &self.heading2,
            StyleRole::Accent => &self.accent,
        }
    }

    /// `#RRGGBB` form used when talking to a charting capability.
    pub fn to_chart_hex(&self, role: StyleRole) -> Result<String, ForgeError> {
        normalize_hex(self.hex(role))
            .map(|h| format!("#{h}"))
            .ok_or_else(|| invalid_role(role, self.hex(role)))
    }

    /// Validate every role and produce concrete colors.
    pub fn resolve(&self) -> Result<Palette, ForgeError> {
        let color = |role: StyleRole| {
            Color::from_hex(self.hex(role)).ok_or_else(|| invalid_role(role, self.hex(role)))
        };
        Ok(Palette {
            border: color(StyleRole::Border)?,
            header: color(StyleRole::Header)?,
            footer: color(StyleRole::Footer)?,
            heading1: color(StyleRole::Heading1)?,
            heading2: color(StyleRole::Heading2)?,
            accent: color(StyleRole::Accent)?,
        })
    }
}

fn invalid_role(role: StyleRole, value: &str) -> ForgeError {
    ForgeError::Config(format!(
        "{} color {value:?} is not a 6-digit hex value",
        role.name()
    ))
}

/// Concrete colors for one render call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub border: Color,
    pub header: Color,
    pub footer: Color,
    pub heading1: Color,
    pub heading2: Color,
    pub accent: Color,
}

// ---------------------------------------------------------------------------
// Typography
// ---------------------------------------------------------------------------

/// One of the PDF base-14 families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Times,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Fully resolved style for one kind of paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub bold: bool,
    pub color: Color,
    /// Multiplier on `font_size`.
    pub line_height: f32,
    pub space_before: f32,
    pub space_after: f32,
    /// Left indent of wrapped lines (hanging indent for list items).
    pub indent: f32,
    pub align: TextAlign,
}

impl TextStyle {
    fn body(color: Color) -> Self {
        Self {
            font_size: 11.0,
            bold: false,
            color,
            line_height: 1.4,
            space_before: 0.0,
            space_after: 6.0,
            indent: 0.0,
            align: TextAlign::Left,
        }
    }

    fn heading(font_size: f32, color: Color) -> Self {
        Self {
            font_size,
            bold: true,
            color,
            line_height: 1.25,
            space_before: 12.0,
            space_after: 6.0,
            indent: 0.0,
            align: TextAlign::Left,
        }
    }

    pub fn line_height_pt(&self) -> f32 {
        self.font_size * self.line_height
    }
}

/// Font choice plus the base body size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub family: FontFamily,
    pub body_size: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            family: FontFamily::Helvetica,
            body_size: 11.0,
        }
    }
}

/// Every named preset for one render call.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyles {
    pub family: FontFamily,
    pub palette: Palette,
    pub title: TextStyle,
    pub subtitle: TextStyle,
    /// Index 0 is heading level 1.
    pub headings: [TextStyle; 4],
    pub body: TextStyle,
    pub list: TextStyle,
    pub header: TextStyle,
    pub footer: TextStyle,
    pub caption: TextStyle,
    pub chart_label: TextStyle,
}

impl ResolvedStyles {
    pub fn resolve(style: &StyleConfig, typography: &Typography) -> Result<Self, ForgeError> {
        let palette = style.resolve()?;
        let base = typography.body_size;

        let mut body = TextStyle::body(Color::BLACK);
        body.font_size = base;

        let mut list = body;
        list.indent = 18.0;
        list.space_after = 3.0;

        let title = TextStyle {
            font_size: 24.0,
            align: TextAlign::Center,
            space_before: 24.0,
            space_after: 12.0,
            ..TextStyle::heading(24.0, palette.heading1)
        };
        let subtitle = TextStyle {
            font_size: 16.0,
            bold: false,
            align: TextAlign::Center,
            ..TextStyle::heading(16.0, palette.heading2)
        };

        let header = TextStyle {
            font_size: 10.0,
            bold: true,
            align: TextAlign::Center,
            space_after: 0.0,
            ..TextStyle::body(palette.header)
        };
        let footer = TextStyle {
            font_size: 9.0,
            align: TextAlign::Center,
            space_after: 0.0,
            ..TextStyle::body(palette.footer)
        };
        let caption = TextStyle {
            font_size: 12.0,
            bold: true,
            align: TextAlign::Center,
            space_before: 12.0,
            ..TextStyle::body(Color::BLACK)
        };
        let chart_label = TextStyle {
            font_size: 8.0,
            align: TextAlign::Center,
            space_after: 0.0,
            ..TextStyle::body(Color::GRAY)
        };

        Ok(Self {
            family: typography.family,
            palette,
            title,
            subtitle,
            headings: [
                TextStyle::heading(base + 9.0, palette.heading1),
                TextStyle::heading(base + 5.0, palette.heading1),
                TextStyle::heading(base + 3.0, palette.heading2),
                TextStyle::heading(base + 1.0, palette.heading2),
            ],
            body,
            list,
            header,
            footer,
            caption,
            chart_label,
        })
    }

    /// Style for a heading level (clamped to 1–4).
    pub fn heading(&self, level: u8) -> &TextStyle {
        let idx = usize::from(level.clamp(1, 4)) - 1;
        &self.headings[idx]
    }
}

// ---------------------------------------------------------------------------
// Page geometry
// ---------------------------------------------------------------------------

/// Page geometry in PDF points (1 pt = 1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub page_width: f32,
    pub page_height: f32,
    /// Uniform content margin.
    pub margin: f32,
    /// Distance of the page frame from the paper edge.
    pub border_inset: f32,
    pub border_width: f32,
    pub title_logo_width: f32,
    pub header_logo_width: f32,
    /// Chart images are drawn at this fraction of the content width.
    pub chart_width_ratio: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            page_width: 595.28,
            page_height: 841.89,
            margin: 72.0,
            border_inset: 24.0,
            border_width: 0.5,
            title_logo_width: 200.0,
            header_logo_width: 48.0,
            chart_width_ratio: 1.0,
        }
    }
}

impl PageSetup {
    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin
    }
}
