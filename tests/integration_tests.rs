//! Integration tests for the case-forge pipeline.
//!
//! These tests validate:
//! - Markup classification scenarios
//! - Logo resolution and placement with a stub transport
//! - Output-path contract and conversion failures
//! - Pagination, decoration and PDF output format

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use case_forge::chart::{ChartRenderer, ChartStyle, RasterBarChart};
use case_forge::convert::{CommandConverter, Converter, PdfConverter};
use case_forge::document::{
    Block, DocumentIdentity, LogoPlacement, MarkupRenderer, RenderOptions,
};
use case_forge::error::{ChartError, ForgeError, LogoError};
use case_forge::layout_config::LayoutConfig;
use case_forge::logo::{HttpTransport, LogoReference, LogoResolver};
use case_forge::markup::{parse_markup, ChartPoint, ChartSeries, MarkupLine};
use case_forge::pipeline::{compose, generate, layout_document, Collaborators, PipelineConfig};
use case_forge::render::render_pdf;
use case_forge::style::{StyleConfig, StyleRole};
use case_forge::templates;

// =====================================================================
// Helpers
// =====================================================================

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn sample_logo() -> Vec<u8> {
    STANDARD.decode(templates::SAMPLE_LOGO_PNG_BASE64).unwrap()
}

/// HEAD answers 200 only for `logo_url`; GET serves the sample logo there.
struct StubTransport {
    logo_url: Option<String>,
    heads: RefCell<Vec<String>>,
}

impl StubTransport {
    fn serving(url: &str) -> Self {
        Self {
            logo_url: Some(url.to_string()),
            heads: RefCell::new(Vec::new()),
        }
    }

    fn offline() -> Self {
        Self {
            logo_url: None,
            heads: RefCell::new(Vec::new()),
        }
    }

    fn is_logo(&self, url: &str) -> bool {
        self.logo_url.as_deref() == Some(url)
    }
}

impl HttpTransport for StubTransport {
    fn head(&self, url: &str, _timeout: Duration) -> Result<u16, LogoError> {
        self.heads.borrow_mut().push(url.to_string());
        if self.logo_url.is_none() {
            return Err(LogoError::Transport {
                url: url.to_string(),
                reason: "connection refused".into(),
            });
        }
        Ok(if self.is_logo(url) { 200 } else { 404 })
    }

    fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, LogoError> {
        if self.is_logo(url) {
            Ok(sample_logo())
        } else {
            Err(LogoError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}

/// Counts calls; draws nothing useful.
#[derive(Default)]
struct CountingCharts {
    calls: RefCell<Vec<ChartSeries>>,
}

impl ChartRenderer for CountingCharts {
    fn render_bar_chart(
        &self,
        series: &ChartSeries,
        style: &ChartStyle,
    ) -> Result<Vec<u8>, ChartError> {
        self.calls.borrow_mut().push(series.clone());
        RasterBarChart::default().render_bar_chart(series, style)
    }
}

/// Records the page count it was handed; writes nothing.
#[derive(Default)]
struct RecordingConverter {
    pages: RefCell<Vec<usize>>,
}

impl Converter for RecordingConverter {
    fn convert(&self, layout: &LayoutConfig, _output: &Path) -> Result<(), ForgeError> {
        self.pages.borrow_mut().push(layout.pages.len());
        Ok(())
    }
}

fn all_texts(layout: &LayoutConfig) -> Vec<String> {
    let mut out = Vec::new();
    for page in &layout.pages {
        for b in &page.boxes {
            b.visit(&mut |lb| {
                if let Some(t) = &lb.text {
                    out.push(t.plain_text());
                }
            });
        }
    }
    out
}

// =====================================================================
// Markup scenarios
// =====================================================================

#[test]
fn acme_scenario_classification() {
    let input = "# Acme Corp Case Study\nGROWTH: 10%\n- Revenue up\nGRAPH: Q1,10;Q2,bad;Q3,30";
    let lines = parse_markup(input);
    assert_eq!(
        lines[0],
        MarkupLine::Heading {
            level: 1,
            text: "Acme Corp Case Study".into()
        }
    );
    assert_eq!(lines[1], MarkupLine::PlainText("GROWTH: 10%".into()));
    assert_eq!(lines[2], MarkupLine::BulletItem("Revenue up".into()));
    match &lines[3] {
        MarkupLine::ChartDirective(series) => assert_eq!(
            series.points,
            vec![
                ChartPoint {
                    label: "Q1".into(),
                    value: 10.0
                },
                ChartPoint {
                    label: "Q3".into(),
                    value: 30.0
                },
            ]
        ),
        other => panic!("expected chart directive, got {other:?}"),
    }
}

#[test]
fn acme_scenario_renders_one_chart() {
    let charts = CountingCharts::default();
    let doc = MarkupRenderer::new(&charts)
        .render(
            "# Acme Corp Case Study\nGROWTH: 10%\n- Revenue up\nGRAPH: Q1,10;Q2,bad;Q3,30",
            None,
            &StyleConfig::default(),
            &DocumentIdentity::new("out/acme.pdf", "Acme Corp"),
        )
        .unwrap();

    assert_eq!(doc.headings().collect::<Vec<_>>(), vec![(1, "Acme Corp Case Study")]);
    let chart_blocks: Vec<_> = doc.charts().collect();
    assert_eq!(chart_blocks.len(), 1);
    assert_eq!(chart_blocks[0].title, "Data Visualization 1");
    assert_eq!(chart_blocks[0].series.len(), 2);
    assert_eq!(charts.calls.borrow().len(), 1);
}

#[test]
fn bullet_items_in_input_order() {
    let charts = RasterBarChart::default();
    let doc = MarkupRenderer::new(&charts)
        .render(
            "# List\n- Item A\n- Item B",
            None,
            &StyleConfig::default(),
            &DocumentIdentity::new("r.pdf", "X"),
        )
        .unwrap();
    let items: Vec<&str> = doc
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::ListItem { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(items, vec!["Item A", "Item B"]);
}

#[test]
fn degraded_input_still_renders() {
    let charts = CountingCharts::default();
    let doc = MarkupRenderer::new(&charts)
        .render(
            templates::degraded_template(),
            None,
            &StyleConfig::default(),
            &DocumentIdentity::new("r.pdf", "X"),
        )
        .unwrap();
    // Directives with at least one numeric pair reach the chart renderer.
    let calls = charts.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[1].len(), 2);
    let layout = layout_document(&doc);
    let texts = all_texts(&layout);
    assert!(!texts.iter().any(|t| t.contains("stray preamble")));
    assert!(texts.iter().any(|t| t == "**unterminated bold"));
}

// =====================================================================
// Style
// =====================================================================

#[test]
fn footer_color_defaults_to_header() {
    let style = StyleConfig::from_json(r#"{"header": "123456"}"#).unwrap();
    assert_eq!(style.hex(StyleRole::Footer), "123456");
    let palette = style.resolve().unwrap();
    assert_eq!(palette.footer, palette.header);
}

// =====================================================================
// Logo resolution and placement
// =====================================================================

#[test]
fn example_co_without_logo_returns_none() {
    let stub = StubTransport::offline();
    assert_eq!(LogoResolver::new(&stub).resolve("Example Co"), None);
    assert_eq!(stub.heads.borrow().len(), 5);
}

#[test]
fn resolved_logo_lands_on_title_page() {
    let stub = StubTransport::serving("https://logo.clearbit.com/acmecorp.io");
    let charts = RasterBarChart::default();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("acme.pdf");

    let composed = compose(
        templates::case_study_template(),
        &out,
        &PipelineConfig::default(),
        &Collaborators {
            transport: Some(&stub),
            charts: &charts,
            converter: &PdfConverter,
        },
    )
    .unwrap();

    assert_eq!(composed.company.as_deref(), Some("Acme Corp"));
    assert_eq!(
        composed.logo_url.as_deref(),
        Some("https://logo.clearbit.com/acmecorp.io")
    );
    assert!(matches!(composed.document.blocks[0], Block::Logo { .. }));
    assert!(composed.document.decoration.header_logo.is_none());

    let layout = layout_document(&composed.document);
    let logo_box = layout.pages[0]
        .boxes
        .iter()
        .find(|b| b.image.is_some())
        .unwrap();
    assert!((logo_box.width - 200.0).abs() < 0.01);
    // Centered within the margins.
    let center = logo_box.x + logo_box.width / 2.0;
    assert!((center - layout.page_width_pt / 2.0).abs() < 0.5);
}

#[test]
fn header_placement_repeats_logo_on_every_page() {
    let stub = StubTransport::serving("https://logo.clearbit.com/globex.com");
    let charts = RasterBarChart::default();
    let config = PipelineConfig {
        company: Some("Globex".into()),
        render: RenderOptions {
            logo_placement: LogoPlacement::HeaderCell,
            ..RenderOptions::default()
        },
        ..PipelineConfig::default()
    };
    let composed = compose(
        "# Intro\nbody\n# More\nbody",
        Path::new("globex.pdf"),
        &config,
        &Collaborators {
            transport: Some(&stub),
            charts: &charts,
            converter: &PdfConverter,
        },
    )
    .unwrap();
    assert!(!composed
        .document
        .blocks
        .iter()
        .any(|b| matches!(b, Block::Logo { .. })));

    let layout = layout_document(&composed.document);
    assert_eq!(layout.pages.len(), 3);
    for page in &layout.pages {
        assert_eq!(page.boxes.iter().filter(|b| b.image.is_some()).count(), 1);
    }
}

#[test]
fn undecodable_logo_bytes_degrade_to_no_logo() {
    let charts = RasterBarChart::default();
    let doc = MarkupRenderer::new(&charts)
        .render(
            "# T\nbody",
            Some(&LogoReference::Bytes(b"<html>404</html>".to_vec())),
            &StyleConfig::default(),
            &DocumentIdentity::new("r.pdf", "X"),
        )
        .unwrap();
    assert!(!doc.has_logo());
}

#[test]
fn skip_logo_makes_no_network_calls() {
    let stub = StubTransport::serving("https://logo.clearbit.com/acmecorp.com");
    let charts = RasterBarChart::default();
    let config = PipelineConfig {
        skip_logo: true,
        ..PipelineConfig::default()
    };
    let composed = compose(
        templates::case_study_template(),
        Path::new("r.pdf"),
        &config,
        &Collaborators {
            transport: Some(&stub),
            charts: &charts,
            converter: &PdfConverter,
        },
    )
    .unwrap();
    assert!(composed.logo_url.is_none());
    assert!(stub.heads.borrow().is_empty());
}

// =====================================================================
// Output contract
// =====================================================================

#[test]
fn report_txt_fails_before_any_work() {
    let stub = StubTransport::serving("https://logo.clearbit.com/acmecorp.com");
    let charts = CountingCharts::default();
    let converter = RecordingConverter::default();
    let err = generate(
        templates::case_study_template(),
        Path::new("report.txt"),
        &PipelineConfig::default(),
        &Collaborators {
            transport: Some(&stub),
            charts: &charts,
            converter: &converter,
        },
    )
    .unwrap_err();

    assert!(matches!(err, ForgeError::InvalidOutputPath { .. }));
    assert!(err.to_string().contains("report.txt"));
    assert!(stub.heads.borrow().is_empty());
    assert!(charts.calls.borrow().is_empty());
    assert!(converter.pages.borrow().is_empty());
}

// =====================================================================
// Pagination and PDF output
// =====================================================================

#[test]
fn multi_page_report_has_numbered_footers() {
    let charts = RasterBarChart::default();
    let converter = RecordingConverter::default();
    let report = generate(
        &templates::multi_page_template(),
        Path::new("globex.pdf"),
        &PipelineConfig::default(),
        &Collaborators {
            transport: None,
            charts: &charts,
            converter: &converter,
        },
    )
    .unwrap();

    assert_eq!(report.company.as_deref(), Some("Globex"));
    assert!(report.pages > 4, "got {} pages", report.pages);
    assert_eq!(*converter.pages.borrow(), vec![report.pages]);
}

#[test]
fn full_case_study_to_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reports").join("acme.pdf");
    let stub = StubTransport::serving("https://logo.clearbit.com/acmecorp.com");
    let charts = RasterBarChart::default();

    let report = generate(
        templates::case_study_template(),
        &out,
        &PipelineConfig::default(),
        &Collaborators {
            transport: Some(&stub),
            charts: &charts,
            converter: &PdfConverter,
        },
    )
    .unwrap();

    assert!(report.logo_url.is_some());
    let bytes = fs::read(&out).unwrap();
    assert_valid_pdf(&bytes);
}

#[test]
fn layout_json_roundtrip_renders() {
    let charts = RasterBarChart::default();
    let composed = compose(
        templates::case_study_template(),
        Path::new("acme.pdf"),
        &PipelineConfig::default(),
        &Collaborators {
            transport: None,
            charts: &charts,
            converter: &PdfConverter,
        },
    )
    .unwrap();
    let layout = layout_document(&composed.document);

    let json = layout.to_json().unwrap();
    let parsed = LayoutConfig::from_json(&json).unwrap();
    assert_eq!(parsed.pages.len(), layout.pages.len());
    assert_eq!(all_texts(&parsed), all_texts(&layout));
    assert!(json.contains("Data Visualization 2"));

    assert_valid_pdf(&render_pdf(&parsed).unwrap());
}

#[test]
fn headings_only_document() {
    let charts = RasterBarChart::default();
    let composed = compose(
        templates::headings_only_template(),
        Path::new("h.pdf"),
        &PipelineConfig::default(),
        &Collaborators {
            transport: None,
            charts: &charts,
            converter: &PdfConverter,
        },
    )
    .unwrap();
    // Consecutive headings never force a break: title page + one content page.
    let layout = layout_document(&composed.document);
    assert_eq!(layout.pages.len(), 2);
}

// =====================================================================
// External converter
// =====================================================================

#[cfg(unix)]
mod command_converter {
    use super::*;

    fn layout() -> LayoutConfig {
        let charts = RasterBarChart::default();
        let composed = compose(
            "# T\nbody",
            Path::new("t.pdf"),
            &PipelineConfig::default(),
            &Collaborators {
                transport: None,
                charts: &charts,
                converter: &PdfConverter,
            },
        )
        .unwrap();
        layout_document(&composed.document)
    }

    #[test]
    fn copies_page_description_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r.pdf");
        let record = dir.path().join("input-path.txt");
        let script = format!(
            "cp \"$0\" \"$1\" && printf %s \"$0\" > '{}'",
            record.display()
        );
        CommandConverter::new("sh")
            .args(["-c", script.as_str(), "{input}", "{output}"])
            .convert(&layout(), &out)
            .unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert!(LayoutConfig::from_json(&written).is_ok());
        let input_path = fs::read_to_string(&record).unwrap();
        assert!(!Path::new(&input_path).exists(), "temp input left behind");
    }

    #[test]
    fn non_zero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r.pdf");
        let err = CommandConverter::new("sh")
            .args([
                "-c",
                "echo partial > \"$0\"; echo broken >&2; exit 3",
                "{output}",
            ])
            .convert(&layout(), &out)
            .unwrap_err();
        match err {
            ForgeError::ConversionFailed { reason, .. } => assert!(reason.contains("broken")),
            other => panic!("expected ConversionFailed, got {other}"),
        }
        assert!(!out.exists(), "partial output left behind");
    }

    #[test]
    fn missing_output_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandConverter::new("true")
            .convert(&layout(), &dir.path().join("r.pdf"))
            .unwrap_err();
        assert!(matches!(err, ForgeError::ConversionFailed { .. }));
    }

    #[test]
    fn slow_converter_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandConverter::new("sleep")
            .args(["5"])
            .timeout(Duration::from_millis(200))
            .convert(&layout(), &dir.path().join("r.pdf"))
            .unwrap_err();
        assert!(matches!(err, ForgeError::ConversionTimedOut { .. }), "{err}");
    }

    #[test]
    fn timed_out_converter_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r.pdf");
        let err = CommandConverter::new("sh")
            .args(["-c", "echo partial > \"$0\"; exec sleep 5", "{output}"])
            .timeout(Duration::from_millis(500))
            .convert(&layout(), &out)
            .unwrap_err();
        assert!(matches!(err, ForgeError::ConversionTimedOut { .. }), "{err}");
        assert!(!out.exists(), "partial output left behind");
    }
}
