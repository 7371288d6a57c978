//! # case-forge – structured case-study text → branded, paginated PDF
//!
//! The pipeline stages are:
//!
//! 1. **Parse** – classify each input line ([`markup`])
//! 2. **Compose** – build title page, content blocks, charts and page
//!    decoration ([`document`]), with an optional company logo ([`logo`])
//! 3. **Layout** – word-wrap and position every block ([`layout`])
//! 4. **Paginate** – split into pages, add border, header and footer
//!    ([`pagination`])
//! 5. **Render** – emit PDF bytes via printpdf ([`render`])
//! 6. **Convert** – write the final file in-process or through an external
//!    program ([`convert`])
//!
//! [`pipeline`] runs all of them; the company name for the header and logo
//! lookup comes from [`company`] unless given explicitly.

pub mod chart;
pub mod company;
pub mod convert;
pub mod document;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod layout_config;
pub mod logo;
pub mod markup;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod style;
pub mod templates;

// Re-exports for convenience
pub use convert::{CommandConverter, Converter, PdfConverter};
pub use document::{DocumentIdentity, LogoPlacement, MarkupRenderer, RenderedDocument};
pub use error::{ChartError, ForgeError, LogoError};
pub use logo::{LogoReference, LogoResolver};
pub use pipeline::{generate, Collaborators, PipelineConfig, PipelineReport};
pub use style::StyleConfig;
