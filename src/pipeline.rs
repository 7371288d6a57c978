//! Pipeline – ties together company detection, logo lookup, markup
//! rendering, layout, pagination and conversion into a single call.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::chart::ChartRenderer;
use crate::company::extract_company_name;
use crate::convert::Converter;
use crate::document::{
    check_output_path, DocumentIdentity, MarkupRenderer, RenderOptions, RenderedDocument,
};
use crate::error::ForgeError;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::logo::{HttpTransport, LogoReference, LogoResolver};
use crate::pagination::paginate;
use crate::style::StyleConfig;

/// Name used in file names when no company is known.
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// Directory for generated reports when no output path is given.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Configuration for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub style: StyleConfig,
    pub render: RenderOptions,
    /// Explicit company name; wins over anything found in the text.
    pub company: Option<String>,
    /// Title used when no company is given or found. Never used for logo
    /// lookup.
    pub fallback_title: Option<String>,
    /// Skip the logo lookup entirely.
    pub skip_logo: bool,
}

/// Injected capabilities.
pub struct Collaborators<'a> {
    /// `None` disables every network call.
    pub transport: Option<&'a dyn HttpTransport>,
    pub charts: &'a dyn ChartRenderer,
    pub converter: &'a dyn Converter,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub output: PathBuf,
    pub company: Option<String>,
    pub logo_url: Option<String>,
    pub pages: usize,
}

/// Read the structured-text input.
pub fn read_input(path: &Path) -> Result<String, ForgeError> {
    if !path.is_file() {
        return Err(ForgeError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|e| ForgeError::io(path, e))
}

/// `output/case_study_<Company_Name>_<YYYY-mm-dd_HH-MM-SS>.pdf`.
pub fn default_output_path(company: Option<&str>, now: DateTime<Local>) -> PathBuf {
    let name: String = company
        .unwrap_or(UNKNOWN_COMPANY)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
        .collect();
    let name = if name.is_empty() {
        UNKNOWN_COMPANY.replace(' ', "_")
    } else {
        name
    };
    Path::new(DEFAULT_OUTPUT_DIR).join(format!(
        "case_study_{name}_{}.pdf",
        now.format("%Y-%m-%d_%H-%M-%S")
    ))
}

/// Lay out and paginate a composed document.
pub fn layout_document(doc: &RenderedDocument) -> LayoutConfig {
    let boxes = compute_layout(doc);
    paginate(&boxes, doc)
}

/// Company name by precedence: explicit, then extracted from `text`.
pub fn resolve_company(text: &str, config: &PipelineConfig) -> Option<String> {
    config
        .company
        .as_ref()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .or_else(|| extract_company_name(text))
}

/// A composed document plus what was learned while composing it.
#[derive(Debug, Clone)]
pub struct Composed {
    pub document: RenderedDocument,
    pub company: Option<String>,
    pub logo_url: Option<String>,
}

/// Compose the document without converting it.
pub fn compose(
    text: &str,
    output: &Path,
    config: &PipelineConfig,
    collaborators: &Collaborators<'_>,
) -> Result<Composed, ForgeError> {
    check_output_path(output)?;

    let company = resolve_company(text, config);
    match &company {
        Some(name) => log::info!("Company: {name}"),
        None => log::info!("No company name found in input"),
    }

    let logo_url = match (&company, collaborators.transport, config.skip_logo) {
        (Some(name), Some(transport), false) => LogoResolver::new(transport).resolve(name),
        _ => None,
    };

    let title = company
        .clone()
        .or_else(|| config.fallback_title.clone())
        .unwrap_or_default();
    let identity = DocumentIdentity::new(output, title);

    let mut renderer =
        MarkupRenderer::new(collaborators.charts).with_options(config.render.clone());
    if let Some(transport) = collaborators.transport {
        renderer = renderer.with_transport(transport);
    }
    let logo = logo_url.clone().map(LogoReference::Url);
    let document = renderer.render(text, logo.as_ref(), &config.style, &identity)?;
    Ok(Composed {
        document,
        company,
        logo_url,
    })
}

/// Full pipeline: structured text → final output file.
pub fn generate(
    text: &str,
    output: &Path,
    config: &PipelineConfig,
    collaborators: &Collaborators<'_>,
) -> Result<PipelineReport, ForgeError> {
    let composed = compose(text, output, config, collaborators)?;
    let layout = layout_document(&composed.document);
    collaborators.converter.convert(&layout, output)?;

    Ok(PipelineReport {
        output: output.to_path_buf(),
        company: composed.company,
        logo_url: composed.logo_url,
        pages: layout.pages.len(),
    })
}
