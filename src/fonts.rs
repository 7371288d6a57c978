//! Text measurement and word wrapping for the PDF base-14 fonts.
//!
//! Builtin fonts carry no glyph tables we can read, so printable ASCII uses
//! the standard AFM advance widths; anything else falls back to an average
//! advance per face.

use crate::markup::TextRun;
use crate::style::FontFamily;

/// AFM advances (1/1000 em) for `' '..='~'`.
type AsciiWidths = [u16; 95];

#[rustfmt::skip]
const HELVETICA: AsciiWidths = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: AsciiWidths = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES: AsciiWidths = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: AsciiWidths = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

const COURIER: AsciiWidths = [600; 95];

/// Advance widths for one family, regular and bold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    regular: &'static AsciiWidths,
    bold: &'static AsciiWidths,
    /// Em fraction used for glyphs outside printable ASCII.
    pub regular_advance: f32,
    pub bold_advance: f32,
    pub ascender: f32,
}

impl FontMetrics {
    pub fn for_family(family: FontFamily) -> Self {
        match family {
            FontFamily::Helvetica => Self {
                regular: &HELVETICA,
                bold: &HELVETICA_BOLD,
                regular_advance: 0.5,
                bold_advance: 0.55,
                ascender: 0.75,
            },
            FontFamily::Times => Self {
                regular: &TIMES,
                bold: &TIMES_BOLD,
                regular_advance: 0.45,
                bold_advance: 0.5,
                ascender: 0.72,
            },
            FontFamily::Courier => Self {
                regular: &COURIER,
                bold: &COURIER,
                regular_advance: 0.6,
                bold_advance: 0.6,
                ascender: 0.7,
            },
        }
    }

    fn char_advance(&self, c: char, bold: bool) -> f32 {
        let (table, fallback) = if bold {
            (self.bold, self.bold_advance)
        } else {
            (self.regular, self.regular_advance)
        };
        match (c as u32).checked_sub(' ' as u32) {
            Some(i) if (i as usize) < table.len() => f32::from(table[i as usize]) / 1000.0,
            _ => fallback,
        }
    }

    pub fn measure(&self, text: &str, font_size: f32, bold: bool) -> f32 {
        text.chars().map(|c| self.char_advance(c, bold)).sum::<f32>() * font_size
    }

    pub fn ascender_pt(&self, font_size: f32) -> f32 {
        self.ascender * font_size
    }
}

/// One positioned piece of a wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub text: String,
    pub bold: bool,
    /// Offset from the start of the line.
    pub x_offset: f32,
}

/// A wrapped line made of one or more segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WrappedLine {
    pub segments: Vec<LineSegment>,
    pub width: f32,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Append `piece`, preceded by a space when `spaced` and the line is not
    /// empty.
    fn push_piece(
        &mut self,
        piece: &str,
        bold: bool,
        spaced: bool,
        metrics: &FontMetrics,
        font_size: f32,
    ) {
        let space = if spaced && !self.segments.is_empty() { " " } else { "" };
        let piece = format!("{space}{piece}");
        let piece_width = metrics.measure(&piece, font_size, bold);
        match self.segments.last_mut() {
            Some(last) if last.bold == bold => last.text.push_str(&piece),
            _ => self.segments.push(LineSegment {
                text: piece,
                bold,
                x_offset: self.width,
            }),
        }
        self.width += piece_width;
    }
}

/// Unbreakable pieces of text. A word spans runs when no whitespace separates
/// them, so `**x**,` stays one word.
fn split_words(runs: &[TextRun]) -> Vec<Vec<(&str, bool)>> {
    let mut words = Vec::new();
    let mut current: Vec<(&str, bool)> = Vec::new();
    for run in runs {
        let mut rest = run.text.as_str();
        while !rest.is_empty() {
            let Some(start) = rest.find(|c: char| !c.is_whitespace()) else {
                // Trailing whitespace ends the word.
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                break;
            };
            if start > 0 && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            rest = &rest[start..];
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            current.push((&rest[..end], run.bold));
            rest = &rest[end..];
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Word-wrap styled runs to `max_width` points.
///
/// Words keep the weight of the run they came from; a single word wider than
/// the line is placed on its own line rather than split.
pub fn wrap_runs(
    runs: &[TextRun],
    font_size: f32,
    family: FontFamily,
    max_width: f32,
) -> Vec<WrappedLine> {
    let metrics = FontMetrics::for_family(family);
    let mut lines = Vec::new();
    let mut current = WrappedLine::default();

    for word in split_words(runs) {
        let space = match (current.segments.is_empty(), word.first()) {
            (false, Some(&(_, bold))) => metrics.measure(" ", font_size, bold),
            _ => 0.0,
        };
        let candidate: f32 = space
            + word
                .iter()
                .map(|&(piece, bold)| metrics.measure(piece, font_size, bold))
                .sum::<f32>();
        if max_width > 0.0 && current.width + candidate > max_width && !current.segments.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for (i, &(piece, bold)) in word.iter().enumerate() {
            current.push_piece(piece, bold, i == 0, &metrics, font_size);
        }
    }

    if !current.segments.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Word-wrap single-weight text. Returns the plain line strings.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    family: FontFamily,
    max_width: f32,
) -> Vec<String> {
    let run = TextRun {
        text: text.to_string(),
        bold,
    };
    wrap_runs(std::slice::from_ref(&run), font_size, family, max_width)
        .iter()
        .map(WrappedLine::text)
        .collect()
}
