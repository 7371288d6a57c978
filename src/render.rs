//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).
//!
//! Page-number fields are resolved here, per page, so the layout stays
//! independent of the final page count.

use std::collections::{HashMap, HashSet};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::ForgeError;
use crate::fonts::FontMetrics;
use crate::layout_config::*;
use crate::style::{FontFamily, TextAlign};

/// Space between a list marker and the item text.
const MARKER_GAP: f32 = 4.0;

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// Per-page values substituted into field text.
#[derive(Debug, Clone, Copy)]
struct PageFields {
    page: usize,
    num_pages: usize,
}

impl PageFields {
    fn apply(&self, text: &str) -> String {
        text.replace(FIELD_PAGE, &self.page.to_string())
            .replace(FIELD_NUMPAGES, &self.num_pages.to_string())
    }
}

struct PageContext<'a> {
    page_height: f32,
    family: FontFamily,
    metrics: FontMetrics,
    fields: PageFields,
    images: &'a HashMap<String, ImageResource>,
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images whose `src` is not a base64 data URI, or whose bytes cannot be
/// decoded, are skipped with a `log::warn`.
pub fn render_pdf(config: &LayoutConfig) -> Result<Vec<u8>, ForgeError> {
    if config.page_width_pt <= 0.0 || config.page_height_pt <= 0.0 {
        return Err(ForgeError::Render(format!(
            "invalid page size {}x{} pt",
            config.page_width_pt, config.page_height_pt
        )));
    }
    let page_w = Mm(config.page_width_pt * 0.352778); // pt → mm
    let page_h = Mm(config.page_height_pt * 0.352778);

    let mut doc = PdfDocument::new(&config.title);

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            lbox.visit(&mut |b| {
                if let Some(img) = &b.image {
                    all_srcs.insert(img.src.as_str());
                }
            });
        }
    }

    let mut image_resources: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in &all_srcs {
        let bytes = match parse_data_uri(src) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("Skipping image: {e}");
                continue;
            }
        };

        let dyn_img = match ::image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping image: decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        let raw = match RawImage::decode_from_bytes(&bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping image: PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        image_resources.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width,
                px_height,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let num_pages = config.pages.len().max(1);
    let metrics = FontMetrics::for_family(config.font_family);
    let mut pages = Vec::new();

    for (index, page_layout) in config.pages.iter().enumerate() {
        let ctx = PageContext {
            page_height: config.page_height_pt,
            family: config.font_family,
            metrics,
            fields: PageFields {
                page: index + 1,
                num_pages,
            },
            images: &image_resources,
        };
        let mut ops = Vec::new();
        for lbox in &page_layout.boxes {
            render_box(&mut ops, lbox, &ctx);
        }
        pages.push(PdfPage::new(page_w, page_h, ops));
    }

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    log::debug!("Rendered {num_pages} page(s), {} bytes", bytes.len());

    Ok(bytes)
}

fn builtin_font(family: FontFamily, bold: bool) -> BuiltinFont {
    match (family, bold) {
        (FontFamily::Helvetica, false) => BuiltinFont::Helvetica,
        (FontFamily::Helvetica, true) => BuiltinFont::HelveticaBold,
        (FontFamily::Times, false) => BuiltinFont::TimesRoman,
        (FontFamily::Times, true) => BuiltinFont::TimesBold,
        (FontFamily::Courier, false) => BuiltinFont::Courier,
        (FontFamily::Courier, true) => BuiltinFont::CourierBold,
    }
}

fn rgb(color: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: color[0],
        g: color[1],
        b: color[2],
        icc_profile: None,
    })
}

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Convert a UTF-8 string to raw Windows-1252 bytes then wrap in a String so
/// printpdf writes the bytes unchanged into the PDF stream (builtin fonts use
/// WinAnsiEncoding, so each glyph is one byte 0x00–0xFF).
fn to_winlatin(s: &str) -> String {
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20,
            c if (c as u32) < 256 => c as u8,
            _ => b'?',
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0x9F range; printpdf passes
    // these bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    unsafe {
        String::from_utf8_unchecked(bytes)
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let rest = src.strip_prefix("data:").ok_or_else(|| {
        let preview: String = src.chars().take(80).collect();
        format!("image src must be a base64 data URI, got {preview:?}")
    })?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(data.trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

#[allow(clippy::too_many_arguments)]
fn write_text(
    ops: &mut Vec<Op>,
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    line_height: f32,
    font: BuiltinFont,
    color: [f32; 4],
) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(size),
        font,
    });
    ops.push(Op::SetLineHeight {
        lh: Pt(line_height),
    });
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(to_winlatin(text))],
        font,
    });
    ops.push(Op::EndTextSection);
}

/// Lines of `text` grouped by baseline, with fields resolved.
fn baseline_groups(text: &TextContent, fields: PageFields) -> Vec<Vec<TextLine>> {
    let mut groups: Vec<Vec<TextLine>> = Vec::new();
    for line in &text.lines {
        let mut line = line.clone();
        if text.fields {
            line.text = fields.apply(&line.text);
        }
        match groups.last_mut() {
            Some(group) if (group[0].y_offset - line.y_offset).abs() <= f32::EPSILON => {
                group.push(line)
            }
            _ => groups.push(vec![line]),
        }
    }
    groups
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(ops: &mut Vec<Op>, lbox: &LayoutBox, ctx: &PageContext<'_>) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let pdf_y = ctx.page_height - lbox.y;

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });

        let x1 = lbox.x;
        let y1 = pdf_y - lbox.height;
        let x2 = lbox.x + lbox.width;
        let y2 = pdf_y;

        ops.push(Op::DrawLine {
            line: Line {
                points: vec![
                    point(x1, y2),
                    point(x2, y2),
                    point(x2, y1),
                    point(x1, y1),
                ],
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let ascender = ctx.metrics.ascender_pt(text.font_size);

        for group in baseline_groups(text, ctx.fields) {
            let width: f32 = group
                .iter()
                .map(|l| ctx.metrics.measure(&l.text, text.font_size, l.bold))
                .sum();
            let shift = match text.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((lbox.width - width) / 2.0).max(0.0),
                TextAlign::Right => (lbox.width - width).max(0.0),
            };
            let mut running = 0.0;
            for tline in &group {
                let w = ctx.metrics.measure(&tline.text, text.font_size, tline.bold);
                if !tline.text.is_empty() {
                    // Left-aligned lines carry wrap offsets; others flow.
                    let offset = match text.align {
                        TextAlign::Left => tline.x_offset,
                        _ => running,
                    };
                    write_text(
                        ops,
                        &tline.text,
                        lbox.x + shift + offset,
                        pdf_y - tline.y_offset - ascender,
                        text.font_size,
                        text.line_height,
                        builtin_font(ctx.family, tline.bold),
                        text.color,
                    );
                }
                running += w;
            }
        }

        // Marker sits right-aligned in the hanging indent.
        if let Some(marker) = &text.list_marker {
            let marker_w = ctx.metrics.measure(marker, text.font_size, false);
            write_text(
                ops,
                marker,
                lbox.x - MARKER_GAP - marker_w,
                pdf_y - ascender,
                text.font_size,
                text.line_height,
                builtin_font(ctx.family, false),
                text.color,
            );
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(res) = ctx.images.get(&img.src) {
            // translate_y = bottom edge of image in PDF coordinates.
            let img_bottom_y = ctx.page_height - lbox.y - img.height;

            // At dpi=72 printpdf renders 1 px = 1 pt, so
            // scale = desired_pt / px_dim.
            let scale_x = if res.px_width > 0 {
                img.width / res.px_width as f32
            } else {
                1.0
            };
            let scale_y = if res.px_height > 0 {
                img.height / res.px_height as f32
            } else {
                1.0
            };

            ops.push(Op::UseXobject {
                id: res.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(72.0),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, ctx);
    }
}
