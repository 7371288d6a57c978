//! Layout – turns the composed block list into a flat list of positioned
//! boxes in document coordinates (before page splitting).
//!
//! Every wrapped line of body text is its own box so paragraphs can split
//! across pages; headings, captions and chart groups carry `keep_with_next`
//! or stay whole.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};

use crate::chart::BarGeometry;
use crate::document::{Block, ChartBlock, RenderedDocument};
use crate::fonts::{wrap_runs, WrappedLine};
use crate::layout_config::{ImageContent, LayoutBox, TextContent, TextLine};
use crate::logo::LogoImage;
use crate::markup::TextRun;
use crate::style::{FontFamily, PageSetup, TextStyle};

/// A box positioned in document space (y grows down from the top of the
/// first page's content area).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub y: f32,
    pub height: f32,
    pub page_break_before: bool,
    /// Must land on the same page as the box after it.
    pub keep_with_next: bool,
    /// Content with page-absolute x and document-space y.
    pub layout: LayoutBox,
}

/// Gap between the chart image and its category labels.
const LABEL_GAP: f32 = 2.0;

struct LayoutBuilder<'a> {
    page: &'a PageSetup,
    family: FontFamily,
    cursor_y: f32,
    pending_break: bool,
    boxes: Vec<PositionedBox>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(page: &'a PageSetup, family: FontFamily) -> Self {
        Self {
            page,
            family,
            cursor_y: 0.0,
            pending_break: false,
            boxes: Vec::new(),
        }
    }

    fn push(&mut self, layout: LayoutBox, keep_with_next: bool) {
        let page_break_before = std::mem::take(&mut self.pending_break);
        self.cursor_y += layout.height;
        self.boxes.push(PositionedBox {
            y: layout.y,
            height: layout.height,
            page_break_before,
            keep_with_next,
            layout,
        });
    }

    /// One box per wrapped line. `marker` goes on the first line only.
    fn text_block(
        &mut self,
        runs: &[TextRun],
        style: &TextStyle,
        marker: Option<&str>,
        keep_with_next: bool,
    ) {
        let x = self.page.margin + style.indent;
        let width = (self.page.content_width() - style.indent).max(1.0);
        let line_height = style.line_height_pt();
        let lines = wrap_runs(runs, style.font_size, self.family, width);
        let last = lines.len().saturating_sub(1);

        self.cursor_y += style.space_before;
        for (i, line) in lines.iter().enumerate() {
            let mut lb = LayoutBox::new(x, self.cursor_y, width, line_height);
            lb.text = Some(text_content(
                line,
                style,
                if i == 0 { marker } else { None },
            ));
            // Keep a heading's wrapped lines together with what follows.
            self.push(lb, keep_with_next || i < last);
        }
        self.cursor_y += style.space_after;
    }

    fn logo(&mut self, image: &LogoImage, requested_width: f32) {
        let width = requested_width.min(self.page.content_width());
        let height = image.scaled_height(width);
        let x = self.page.margin + (self.page.content_width() - width) / 2.0;
        let mut lb = LayoutBox::new(x, self.cursor_y, width, height);
        lb.image = Some(ImageContent {
            src: data_uri(&image.bytes),
            width,
            height,
        });
        self.push(lb, true);
        self.cursor_y += 12.0;
    }

    fn chart(&mut self, chart: &ChartBlock, caption: &TextStyle, label: &TextStyle) {
        self.text_block(
            &[TextRun::plain(chart.title.clone())],
            caption,
            None,
            true,
        );

        let content_width = self.page.content_width();
        let width = content_width * self.page.chart_width_ratio.clamp(0.1, 1.0);
        let height = width * chart.aspect_ratio;
        let x = self.page.margin + (content_width - width) / 2.0;
        let label_height = label.line_height_pt();
        let top = self.cursor_y;

        let mut group = LayoutBox::new(x, top, width, height + LABEL_GAP + label_height);
        group.image = Some(ImageContent {
            src: data_uri(&chart.image),
            width,
            height,
        });

        let geometry = BarGeometry::default();
        let count = chart.series.len();
        let slot = if count == 0 {
            width
        } else {
            width * (geometry.plot_right - geometry.plot_left) / count as f32
        };
        for (center, text) in geometry.bar_centers(count).into_iter().zip(chart.series.labels()) {
            let mut child = LayoutBox::new(
                x + center * width - slot / 2.0,
                top + height + LABEL_GAP,
                slot,
                label_height,
            );
            child.text = Some(TextContent {
                lines: vec![TextLine {
                    text: text.to_string(),
                    bold: false,
                    x_offset: 0.0,
                    y_offset: 0.0,
                }],
                font_size: label.font_size,
                color: label.color.to_array(),
                line_height: label_height,
                align: label.align,
                list_marker: None,
                fields: false,
            });
            group.children.push(child);
        }

        self.push(group, false);
        self.cursor_y += caption.space_after;
    }
}

fn text_content(line: &WrappedLine, style: &TextStyle, marker: Option<&str>) -> TextContent {
    TextContent {
        lines: line
            .segments
            .iter()
            .map(|s| TextLine {
                text: s.text.clone(),
                bold: s.bold || style.bold,
                x_offset: s.x_offset,
                y_offset: 0.0,
            })
            .collect(),
        font_size: style.font_size,
        color: style.color.to_array(),
        line_height: style.line_height_pt(),
        align: style.align,
        list_marker: marker.map(str::to_string),
        fields: false,
    }
}

/// `data:<mime>;base64,<data>`, sniffing the mime type from the bytes.
pub fn data_uri(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or("image/png");
    format!("data:{mime};base64,{}", BASE64_STD.encode(bytes))
}

/// Lay out every block of `doc` in reading order.
pub fn compute_layout(doc: &RenderedDocument) -> Vec<PositionedBox> {
    let styles = &doc.styles;
    let mut builder = LayoutBuilder::new(&doc.page, styles.family);

    for block in &doc.blocks {
        match block {
            Block::Logo { image, width } => builder.logo(image, *width),
            Block::Title(text) => {
                builder.text_block(&[TextRun::plain(text.clone())], &styles.title, None, true)
            }
            Block::Subtitle(text) => {
                builder.text_block(&[TextRun::plain(text.clone())], &styles.subtitle, None, false)
            }
            Block::PageBreak => builder.pending_break = true,
            Block::Heading { level, text } => builder.text_block(
                &[TextRun::plain(text.clone())],
                styles.heading(*level),
                None,
                true,
            ),
            Block::Paragraph(runs) => builder.text_block(runs, &styles.body, None, false),
            Block::ListItem { marker, text } => builder.text_block(
                &[TextRun::plain(text.clone())],
                &styles.list,
                Some(marker.as_str()),
                false,
            ),
            Block::Chart(chart) => builder.chart(chart, &styles.caption, &styles.chart_label),
        }
    }

    builder.boxes
}
