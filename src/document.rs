//! Markup Renderer – composes classified lines, the logo, and the resolved
//! styles into a [`RenderedDocument`].
//!
//! Single pass over the input:
//! - everything before the first heading is skipped;
//! - a heading that follows body content starts a new page;
//! - chart directives are collected and laid out after the text, one chart
//!   per directive, titled "Data Visualization N".
//!
//! Per-line anomalies and optional enhancements (logo, one chart) degrade to
//! "dropped" with a warning. The output-path contract is checked before any
//! work is done.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chart::{ChartRenderer, ChartStyle};
use crate::error::{ForgeError, LogoError};
use crate::layout_config::{FIELD_NUMPAGES, FIELD_PAGE};
use crate::logo::{fetch_logo, HttpTransport, LogoImage, LogoReference};
use crate::markup::{classify_line, ChartSeries, MarkupLine, TextRun};
use crate::style::{Color, PageSetup, ResolvedStyles, StyleConfig, StyleRole, Typography};

/// Extension the final document must carry.
pub const OUTPUT_EXTENSION: &str = "pdf";

/// Title printed on the title page.
pub const REPORT_TITLE: &str = "CASE STUDY REPORT";

/// Glyph drawn for bullet items.
pub const BULLET_MARKER: &str = "\u{2022}";

/// Where the company logo goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogoPlacement {
    /// Centered above the report title on the first page.
    #[default]
    TitlePage,
    /// Small mark left of the running header on every page.
    HeaderCell,
}

/// One block in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Logo { image: LogoImage, width: f32 },
    Title(String),
    Subtitle(String),
    PageBreak,
    Heading { level: u8, text: String },
    Paragraph(Vec<TextRun>),
    ListItem { marker: String, text: String },
    Chart(ChartBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBlock {
    /// 1-based.
    pub number: usize,
    pub title: String,
    pub series: ChartSeries,
    /// Encoded image from the chart renderer.
    pub image: Vec<u8>,
    /// Height / width of the image.
    pub aspect_ratio: f32,
}

/// Running decoration applied to every page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDecoration {
    pub border_color: Color,
    pub header_text: String,
    pub header_logo: Option<LogoImage>,
    /// Footer text with `{PAGE}` / `{NUMPAGES}` fields left unresolved.
    pub footer_template: String,
}

/// The composed document, ready for layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub title: String,
    pub blocks: Vec<Block>,
    pub decoration: PageDecoration,
    pub styles: ResolvedStyles,
    pub page: PageSetup,
}

impl RenderedDocument {
    pub fn headings(&self) -> impl Iterator<Item = (u8, &str)> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Heading { level, text } => Some((*level, text.as_str())),
            _ => None,
        })
    }

    pub fn charts(&self) -> impl Iterator<Item = &ChartBlock> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Chart(c) => Some(c),
            _ => None,
        })
    }

    pub fn has_logo(&self) -> bool {
        self.decoration.header_logo.is_some()
            || self.blocks.iter().any(|b| matches!(b, Block::Logo { .. }))
    }
}

/// Identifies one output: where it goes and what it is called.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentIdentity {
    pub output: PathBuf,
    /// Company or document title used in the header and footer.
    pub title: String,
}

impl DocumentIdentity {
    pub fn new(output: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            title: title.into(),
        }
    }
}

/// Reject any output path that does not end in `.pdf`.
pub fn check_output_path(path: &Path) -> Result<(), ForgeError> {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(OUTPUT_EXTENSION));
    if ok {
        Ok(())
    } else {
        Err(ForgeError::InvalidOutputPath {
            path: path.to_path_buf(),
        })
    }
}

/// Per-render options.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub report_title: String,
    pub typography: Typography,
    pub page: PageSetup,
    pub logo_placement: LogoPlacement,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            report_title: REPORT_TITLE.to_string(),
            typography: Typography::default(),
            page: PageSetup::default(),
            logo_placement: LogoPlacement::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    BeforeContent,
    InSection { has_body: bool },
}

/// Composes documents. Collaborators are borrowed so callers (and tests) can
/// supply their own transport and chart renderer.
pub struct MarkupRenderer<'a> {
    charts: &'a dyn ChartRenderer,
    transport: Option<&'a dyn HttpTransport>,
    options: RenderOptions,
}

impl<'a> MarkupRenderer<'a> {
    pub fn new(charts: &'a dyn ChartRenderer) -> Self {
        Self {
            charts,
            transport: None,
            options: RenderOptions::default(),
        }
    }

    /// Transport used to download URL logo references.
    pub fn with_transport(mut self, transport: &'a dyn HttpTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(
        &self,
        text: &str,
        logo: Option<&LogoReference>,
        style: &StyleConfig,
        identity: &DocumentIdentity,
    ) -> Result<RenderedDocument, ForgeError> {
        check_output_path(&identity.output)?;
        let styles = ResolvedStyles::resolve(style, &self.options.typography)?;
        let accent = style.to_chart_hex(StyleRole::Accent)?;

        let logo = logo.and_then(|reference| self.load_logo(reference));
        let mut blocks = self.title_page(logo.as_ref(), &identity.title);

        let series = compose_content(text, &mut blocks);
        for (i, series) in series.into_iter().enumerate() {
            let number = i + 1;
            let chart_style = ChartStyle::new(format!("Data Visualization {number}"), &accent);
            match self.charts.render_bar_chart(&series, &chart_style) {
                Ok(image) => blocks.push(Block::Chart(ChartBlock {
                    number,
                    aspect_ratio: chart_style.aspect_ratio(),
                    title: chart_style.title,
                    series,
                    image,
                })),
                Err(e) => log::warn!("Skipping chart {number}: {e}"),
            }
        }

        let header_logo = match self.options.logo_placement {
            LogoPlacement::HeaderCell => logo,
            LogoPlacement::TitlePage => None,
        };
        let decoration = PageDecoration {
            border_color: styles.palette.border,
            header_text: identity.title.clone(),
            header_logo,
            footer_template: footer_template(&identity.title),
        };

        Ok(RenderedDocument {
            title: identity.title.clone(),
            blocks,
            decoration,
            styles,
            page: self.options.page,
        })
    }

    fn load_logo(&self, reference: &LogoReference) -> Option<LogoImage> {
        let result = match (reference, self.transport) {
            (LogoReference::Url(url), None) => {
                log::warn!("No transport configured to download logo {url}; skipping logo");
                return None;
            }
            (_, Some(transport)) => fetch_logo(transport, reference),
            (LogoReference::Bytes(_), None) => fetch_logo(&NoTransport, reference),
        };
        match result {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Failed to add logo: {e}");
                None
            }
        }
    }

    fn title_page(&self, logo: Option<&LogoImage>, title: &str) -> Vec<Block> {
        let mut blocks = Vec::new();
        if let (Some(image), LogoPlacement::TitlePage) = (logo, self.options.logo_placement) {
            blocks.push(Block::Logo {
                image: image.clone(),
                width: self.options.page.title_logo_width,
            });
        }
        blocks.push(Block::Title(self.options.report_title.clone()));
        if !title.trim().is_empty() {
            blocks.push(Block::Subtitle(title.to_string()));
        }
        blocks.push(Block::PageBreak);
        blocks
    }
}

/// `"<title> | Page {PAGE} of {NUMPAGES} | Confidential"`.
pub fn footer_template(title: &str) -> String {
    let page = format!("Page {FIELD_PAGE} of {FIELD_NUMPAGES} | Confidential");
    if title.trim().is_empty() {
        page
    } else {
        format!("{title} | {page}")
    }
}

/// Walk the lines, appending content blocks; returns the chart series found.
fn compose_content(text: &str, blocks: &mut Vec<Block>) -> Vec<ChartSeries> {
    let mut cursor = Cursor::BeforeContent;
    let mut charts = Vec::new();
    let mut skipped = 0usize;

    for raw in text.lines() {
        let line = classify_line(raw);
        if line == MarkupLine::Blank {
            continue;
        }

        let has_body = match cursor {
            Cursor::BeforeContent if !line.is_heading() => {
                skipped += 1;
                continue;
            }
            Cursor::BeforeContent => false,
            Cursor::InSection { has_body } => has_body,
        };

        match line {
            MarkupLine::Heading { level, text } => {
                if has_body {
                    blocks.push(Block::PageBreak);
                }
                blocks.push(Block::Heading { level, text });
                cursor = Cursor::InSection { has_body: false };
            }
            MarkupLine::ChartDirective(series) => {
                if series.is_empty() {
                    log::debug!("Dropping chart directive with no valid data: {raw:?}");
                } else {
                    charts.push(series);
                }
            }
            other => {
                if let Some(block) = body_block(other) {
                    blocks.push(block);
                    cursor = Cursor::InSection { has_body: true };
                }
            }
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} line(s) before the first heading");
    }
    charts
}

fn body_block(line: MarkupLine) -> Option<Block> {
    match line {
        MarkupLine::BoldText(runs) => Some(Block::Paragraph(runs)),
        MarkupLine::PlainText(text) => Some(Block::Paragraph(vec![TextRun::plain(text)])),
        MarkupLine::BulletItem(text) => Some(Block::ListItem {
            marker: BULLET_MARKER.to_string(),
            text,
        }),
        MarkupLine::NumberedItem { index, text } => Some(Block::ListItem {
            marker: format!("{index}."),
            text,
        }),
        MarkupLine::Heading { .. } | MarkupLine::ChartDirective(_) | MarkupLine::Blank => None,
    }
}

/// Transport for byte-only logo references; never reached over the network.
struct NoTransport;

impl NoTransport {
    fn unavailable(url: &str) -> LogoError {
        LogoError::Transport {
            url: url.to_string(),
            reason: "no transport configured".into(),
        }
    }
}

impl HttpTransport for NoTransport {
    fn head(&self, url: &str, _timeout: Duration) -> Result<u16, LogoError> {
        Err(Self::unavailable(url))
    }

    fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, LogoError> {
        Err(Self::unavailable(url))
    }
}
