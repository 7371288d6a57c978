//! Pagination – splits a flat list of positioned boxes into pages and adds
//! the running decoration (border, header, footer) to each one.
//!
//! Handles:
//! - page boundaries at the bottom margin
//! - explicit page breaks
//! - keep-with-next chains (headings, captions)

use crate::document::{PageDecoration, RenderedDocument};
use crate::layout::{data_uri, PositionedBox};
use crate::layout_config::*;
use crate::style::{PageSetup, ResolvedStyles, TextStyle};

/// Distance between the page frame and the header/footer text.
const DECORATION_PAD: f32 = 8.0;

/// Convert positioned boxes into a paginated, decorated LayoutConfig.
pub fn paginate(boxes: &[PositionedBox], doc: &RenderedDocument) -> LayoutConfig {
    let page = &doc.page;
    let mut config = LayoutConfig {
        title: doc.title.clone(),
        page_width_pt: page.page_width,
        page_height_pt: page.page_height,
        font_family: doc.styles.family,
        pages: Vec::new(),
    };

    let content_height = page.content_height();
    let mut current_page = PageLayout {
        page_index: 0,
        boxes: Vec::new(),
    };

    // Document-space y at which the current page begins.
    let mut page_start_doc_y = 0.0f32;

    for (i, pbox) in boxes.iter().enumerate() {
        let forced = pbox.page_break_before;
        let overflow = chain_bottom(boxes, i) - page_start_doc_y > content_height;

        if (forced || overflow) && !current_page.boxes.is_empty() {
            config.pages.push(std::mem::replace(
                &mut current_page,
                PageLayout {
                    page_index: config.pages.len() + 1,
                    boxes: Vec::new(),
                },
            ));
            page_start_doc_y = pbox.y;
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        let mut layout_box = pbox.layout.clone();
        layout_box.translate_y(page.margin + y_on_page - pbox.y);
        current_page.boxes.push(layout_box);
    }

    if !current_page.boxes.is_empty() || config.pages.is_empty() {
        config.pages.push(current_page);
    }

    for page_layout in &mut config.pages {
        let mut decoration = decoration_boxes(page, &doc.styles, &doc.decoration);
        decoration.append(&mut page_layout.boxes);
        page_layout.boxes = decoration;
    }

    log::debug!(
        "Paginated {} boxes onto {} page(s)",
        boxes.len(),
        config.pages.len()
    );
    config
}

/// Document-space bottom of box `i` plus every box it must stay with.
fn chain_bottom(boxes: &[PositionedBox], i: usize) -> f32 {
    let mut j = i;
    while boxes[j].keep_with_next && j + 1 < boxes.len() && !boxes[j + 1].page_break_before {
        j += 1;
    }
    boxes[j].y + boxes[j].height
}

/// Frame, header and footer for one page. The footer keeps its page fields.
fn decoration_boxes(
    page: &PageSetup,
    styles: &ResolvedStyles,
    decoration: &PageDecoration,
) -> Vec<LayoutBox> {
    let inset = page.border_inset;
    let mut frame = LayoutBox::new(
        inset,
        inset,
        page.page_width - 2.0 * inset,
        page.page_height - 2.0 * inset,
    );
    frame.border = Some(BorderStyle {
        width: page.border_width,
        color: decoration.border_color.to_array(),
    });

    let mut boxes = vec![frame];
    let header_y = inset + DECORATION_PAD;

    if let Some(logo) = &decoration.header_logo {
        // Fit inside the band between the frame and the content area.
        let max_height = (page.margin - header_y - 4.0).max(8.0);
        let mut width = page.header_logo_width;
        let mut height = logo.scaled_height(width);
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }
        let mut lb = LayoutBox::new(page.margin, header_y, width, height);
        lb.image = Some(ImageContent {
            src: data_uri(&logo.bytes),
            width,
            height,
        });
        boxes.push(lb);
    }

    if !decoration.header_text.trim().is_empty() {
        boxes.push(band_text(
            page,
            header_y,
            &decoration.header_text,
            &styles.header,
            false,
        ));
    }

    let footer_height = styles.footer.line_height_pt();
    let footer_y = page.page_height - inset - DECORATION_PAD - footer_height;
    boxes.push(band_text(
        page,
        footer_y,
        &decoration.footer_template,
        &styles.footer,
        true,
    ));
    boxes
}

fn band_text(page: &PageSetup, y: f32, text: &str, style: &TextStyle, fields: bool) -> LayoutBox {
    let mut lb = LayoutBox::new(page.margin, y, page.content_width(), style.line_height_pt());
    lb.text = Some(TextContent {
        lines: vec![TextLine {
            text: text.to_string(),
            bold: style.bold,
            x_offset: 0.0,
            y_offset: 0.0,
        }],
        font_size: style.font_size,
        color: style.color.to_array(),
        line_height: style.line_height_pt(),
        align: style.align,
        list_marker: None,
        fields,
    });
    lb
}
