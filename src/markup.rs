//! Markup classification – turns each line of loosely structured text into
//! exactly one [`MarkupLine`].
//!
//! Rules are tried against the trimmed line in a fixed order:
//! heading, bold, bullet, numbered item, chart directive, plain text.
//! Classification is total: anything unmatched becomes [`MarkupLine::PlainText`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix that introduces a chart directive.
pub const CHART_PREFIX: &str = "GRAPH:";

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,4})\s(.*)$").unwrap());
static RE_BOLD_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*(.*?)\*\*").unwrap());
static RE_BOLD_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static RE_NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.(?:\s+(.*))?$").unwrap());

/// A run of text with a single weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

/// One labelled value of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Ordered `(label, value)` pairs from one `GRAPH:` directive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Largest finite value, or 0 for an empty or all-negative series.
    pub fn max_value(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.value)
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|p| p.label.as_str())
    }
}

/// A classified input line.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupLine {
    Heading { level: u8, text: String },
    /// Delimiters removed; `**…**` spans become bold runs.
    BoldText(Vec<TextRun>),
    BulletItem(String),
    /// `index` is the numeral exactly as written.
    NumberedItem { index: String, text: String },
    ChartDirective(ChartSeries),
    PlainText(String),
    Blank,
}

impl MarkupLine {
    pub fn is_heading(&self) -> bool {
        matches!(self, MarkupLine::Heading { .. })
    }
}

/// Classify a single line.
pub fn classify_line(raw: &str) -> MarkupLine {
    let line = raw.trim();
    if line.is_empty() {
        return MarkupLine::Blank;
    }

    if let Some(caps) = RE_HEADING.captures(line) {
        return MarkupLine::Heading {
            level: caps[1].len() as u8,
            text: caps[2].to_string(),
        };
    }

    if RE_BOLD_START.is_match(line) {
        return MarkupLine::BoldText(split_bold_runs(line));
    }

    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("• ")) {
        return MarkupLine::BulletItem(rest.to_string());
    }

    if let Some(caps) = RE_NUMBERED.captures(line) {
        return MarkupLine::NumberedItem {
            index: caps[1].to_string(),
            text: caps.get(2).map_or("", |m| m.as_str()).to_string(),
        };
    }

    if let Some(data) = line.strip_prefix(CHART_PREFIX) {
        return MarkupLine::ChartDirective(parse_chart_series(data));
    }

    MarkupLine::PlainText(line.to_string())
}

/// Classify every line of `text`, blanks included, in input order.
pub fn parse_markup(text: &str) -> Vec<MarkupLine> {
    text.lines().map(classify_line).collect()
}

/// Split a line on `**…**` spans. Text outside spans is normal weight; an
/// unmatched `**` is kept literally. Empty runs are omitted.
pub fn split_bold_runs(line: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut cursor = 0;
    for caps in RE_BOLD_SPAN.captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            runs.push(TextRun::plain(&line[cursor..whole.start()]));
        }
        if !inner.as_str().is_empty() {
            runs.push(TextRun::bold(inner.as_str()));
        }
        cursor = whole.end();
    }
    if cursor < line.len() {
        runs.push(TextRun::plain(&line[cursor..]));
    }
    runs
}

/// Parse `label,value;label,value;…`. Items that do not split into exactly two
/// comma-separated parts, or whose value does not parse as a number, are
/// dropped. `nan` and `inf` parse and are kept; drawing clamps them.
pub fn parse_chart_series(data: &str) -> ChartSeries {
    let points = data
        .trim()
        .split(';')
        .filter_map(|item| {
            let parts: Vec<&str> = item.split(',').collect();
            if parts.len() != 2 {
                return None;
            }
            let value: f64 = parts[1].trim().parse().ok()?;
            Some(ChartPoint {
                label: parts[0].trim().to_string(),
                value,
            })
        })
        .collect();
    ChartSeries { points }
}
