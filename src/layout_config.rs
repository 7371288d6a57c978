//! Layout config – the page description handed from pagination to the PDF
//! renderer or to an external converter. It encodes exactly what goes on each
//! page; only the page-number fields are left for the renderer to resolve.

use serde::{Deserialize, Serialize};

use crate::style::{FontFamily, TextAlign};

/// Field token replaced by the current page number at render time.
pub const FIELD_PAGE: &str = "{PAGE}";
/// Field token replaced by the total page count at render time.
pub const FIELD_NUMPAGES: &str = "{NUMPAGES}";

/// A complete document layout ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Document title embedded in the PDF metadata.
    #[serde(default = "LayoutConfig::default_title")]
    pub title: String,
    /// Width of each page in PDF points (1 pt = 1/72 inch).
    pub page_width_pt: f32,
    /// Height of each page in PDF points.
    pub page_height_pt: f32,
    #[serde(default)]
    pub font_family: FontFamily,
    /// Ordered list of pages.
    pub pages: Vec<PageLayout>,
}

/// One page of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_index: usize,
    pub boxes: Vec<LayoutBox>,
}

/// A positioned rectangle with optional content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutBox {
    /// Position relative to page top-left, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,

    pub border: Option<BorderStyle>,

    /// Content (mutually exclusive in practice)
    pub text: Option<TextContent>,
    pub image: Option<ImageContent>,

    pub children: Vec<LayoutBox>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorderStyle {
    pub width: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    /// Pre-wrapped lines; a line with mixed weights is several entries sharing
    /// one `y_offset`.
    pub lines: Vec<TextLine>,
    pub font_size: f32,
    pub color: [f32; 4],
    pub line_height: f32,
    /// `Left` lines use their `x_offset`; other alignments are placed by the
    /// renderer after field substitution.
    #[serde(default)]
    pub align: TextAlign,
    /// Bullet or numeral drawn in the hanging indent (e.g. "•" or "3.").
    pub list_marker: Option<String>,
    /// Text contains `{PAGE}` / `{NUMPAGES}` fields.
    #[serde(default)]
    pub fields: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub bold: bool,
    /// X offset within the layout box
    pub x_offset: f32,
    /// Y offset from the top of the text content area
    pub y_offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    /// `data:<mime>;base64,<data>` URI.
    pub src: String,
    pub width: f32,
    pub height: f32,
}

impl LayoutConfig {
    /// Create an empty A4 layout config.
    pub fn a4() -> Self {
        Self {
            title: Self::default_title(),
            // A4: 210mm × 297mm = 595.28 × 841.89 points
            page_width_pt: 595.28,
            page_height_pt: 841.89,
            font_family: FontFamily::default(),
            pages: Vec::new(),
        }
    }

    fn default_title() -> String {
        "Case Study Report".to_string()
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialise from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl LayoutBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    /// Shift this box and all descendants vertically.
    pub fn translate_y(&mut self, dy: f32) {
        self.y += dy;
        for child in &mut self.children {
            child.translate_y(dy);
        }
    }

    /// Visit this box and every descendant, depth first.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a LayoutBox)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

impl TextContent {
    /// Concatenated text of all lines, one `\n` between distinct baselines.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        let mut last_y: Option<f32> = None;
        for line in &self.lines {
            if let Some(y) = last_y {
                if (line.y_offset - y).abs() > f32::EPSILON {
                    out.push('\n');
                }
            }
            out.push_str(&line.text);
            last_y = Some(line.y_offset);
        }
        out
    }
}
