//! case-forge – command-line case-study → PDF generator.
//!
//! Reads structured case-study text (headings, lists, `GRAPH:` directives),
//! looks up the company logo, and writes a branded, paginated PDF.
//!
//! If `--output` is omitted the PDF goes to
//! `output/case_study_<Company>_<timestamp>.pdf`.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use case_forge::chart::RasterBarChart;
use case_forge::convert::{CommandConverter, Converter, PdfConverter};
use case_forge::document::{LogoPlacement, RenderOptions};
use case_forge::logo::{HttpTransport, ReqwestTransport};
use case_forge::pipeline::{
    default_output_path, generate, read_input, resolve_company, Collaborators, PipelineConfig,
};
use case_forge::{ForgeError, StyleConfig};

/// Generate a branded case-study PDF from structured text.
#[derive(Parser, Debug)]
#[command(name = "case-forge", version, about)]
struct Cli {
    /// Structured case-study text.
    #[arg(short, long)]
    input: PathBuf,

    /// Company name; overrides detection from the text.
    #[arg(long)]
    company: Option<String>,

    /// Output PDF path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON style file; individual color flags override it.
    #[arg(long, env = "CASE_FORGE_STYLE")]
    style: Option<PathBuf>,

    /// Page border color (6 hex digits).
    #[arg(long)]
    border_color: Option<String>,

    /// Header text color.
    #[arg(long)]
    header_color: Option<String>,

    /// Footer text color (defaults to the header color).
    #[arg(long)]
    footer_color: Option<String>,

    /// Color for heading levels 1 and 2.
    #[arg(long)]
    heading1_color: Option<String>,

    /// Color for heading levels 3 and 4.
    #[arg(long)]
    heading2_color: Option<String>,

    /// Chart bar color.
    #[arg(long)]
    accent_color: Option<String>,

    /// Where the company logo is drawn.
    #[arg(long, value_enum, default_value = "title")]
    logo_placement: PlacementArg,

    /// Do not look up a logo (no network access).
    #[arg(long)]
    no_logo: bool,

    /// External converter program; receives the page description as JSON.
    #[arg(long, env = "CASE_FORGE_CONVERTER")]
    converter: Option<String>,

    /// Converter argument; `{input}`, `{output}` and `{outdir}` are substituted.
    #[arg(long = "converter-arg", allow_hyphen_values = true)]
    converter_args: Vec<String>,

    /// Seconds to wait for the external converter.
    #[arg(long, default_value_t = 120)]
    converter_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PlacementArg {
    Title,
    Header,
}

impl From<PlacementArg> for LogoPlacement {
    fn from(v: PlacementArg) -> Self {
        match v {
            PlacementArg::Title => LogoPlacement::TitlePage,
            PlacementArg::Header => LogoPlacement::HeaderCell,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), ForgeError> {
    // Fail on a missing input before any other work.
    let text = read_input(&cli.input)?;
    let style = load_style(&cli)?;

    let config = PipelineConfig {
        style,
        render: RenderOptions {
            logo_placement: cli.logo_placement.into(),
            ..RenderOptions::default()
        },
        company: cli.company.clone(),
        fallback_title: file_stem(&cli.input),
        skip_logo: cli.no_logo,
    };

    let output = match &cli.output {
        Some(path) => path.clone(),
        None => {
            let company = resolve_company(&text, &config).or_else(|| file_stem(&cli.input));
            default_output_path(company.as_deref(), chrono::Local::now())
        }
    };

    let transport = if cli.no_logo {
        None
    } else {
        match ReqwestTransport::new() {
            Ok(t) => Some(t),
            Err(e) => {
                log::warn!("HTTP client unavailable, continuing without logo: {e}");
                None
            }
        }
    };

    let converter: Box<dyn Converter> = match &cli.converter {
        Some(program) => Box::new(
            CommandConverter::new(program)
                .args(cli.converter_args.iter().cloned())
                .timeout(Duration::from_secs(cli.converter_timeout)),
        ),
        None => Box::new(PdfConverter),
    };

    let charts = RasterBarChart::default();
    let collaborators = Collaborators {
        transport: transport.as_ref().map(|t| t as &dyn HttpTransport),
        charts: &charts,
        converter: converter.as_ref(),
    };

    let report = generate(&text, &output, &config, &collaborators)?;
    let pages = report.pages;
    eprintln!(
        "Wrote '{}' ({} page{})",
        report.output.display(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
    Ok(())
}

/// Defaults, then the style file, then individual flags.
fn load_style(cli: &Cli) -> Result<StyleConfig, ForgeError> {
    let mut style = match &cli.style {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| ForgeError::Io {
                path: path.clone(),
                source: e,
            })?;
            StyleConfig::from_json(&json)?
        }
        None => StyleConfig::default(),
    };

    let set = |slot: &mut String, value: &Option<String>| {
        if let Some(v) = value {
            *slot = v.clone();
        }
    };
    set(&mut style.border, &cli.border_color);
    set(&mut style.header, &cli.header_color);
    set(&mut style.heading1, &cli.heading1_color);
    set(&mut style.heading2, &cli.heading2_color);
    set(&mut style.accent, &cli.accent_color);
    if cli.footer_color.is_some() {
        style.footer = cli.footer_color.clone();
    }

    // Surface bad colors before any network work.
    style.resolve()?;
    Ok(style)
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}
