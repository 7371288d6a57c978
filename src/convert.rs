//! Conversion – realises the final file from the paginated page description.
//!
//! [`PdfConverter`] renders in-process with `printpdf`. [`CommandConverter`]
//! hands the page description to an external program and waits a bounded
//! time for it. Both refuse output paths that are not `.pdf`.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::document::check_output_path;
use crate::error::ForgeError;
use crate::layout_config::LayoutConfig;
use crate::render::render_pdf;

/// Default wait for an external converter.
pub const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Placeholders understood in [`CommandConverter`] arguments.
pub const ARG_INPUT: &str = "{input}";
pub const ARG_OUTPUT: &str = "{output}";
pub const ARG_OUTDIR: &str = "{outdir}";

/// Turns an intermediate page description into the final output file.
pub trait Converter {
    fn convert(&self, layout: &LayoutConfig, output: &Path) -> Result<(), ForgeError>;
}

fn ensure_parent_dir(output: &Path) -> Result<(), ForgeError> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| ForgeError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// In-process PDF output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfConverter;

impl Converter for PdfConverter {
    fn convert(&self, layout: &LayoutConfig, output: &Path) -> Result<(), ForgeError> {
        check_output_path(output)?;
        let bytes = render_pdf(layout)?;
        ensure_parent_dir(output)?;
        fs::write(output, &bytes).map_err(|e| ForgeError::io(output, e))?;
        log::info!(
            "Wrote '{}' ({} bytes, {} page(s))",
            output.display(),
            bytes.len(),
            layout.pages.len()
        );
        Ok(())
    }
}

/// Remove whatever a failed converter left at `output`.
fn discard_partial_output(output: &Path) {
    if !output.exists() {
        return;
    }
    match fs::remove_file(output) {
        Ok(()) => log::info!("Removed partial output '{}'", output.display()),
        Err(e) => log::warn!("Failed to remove partial output '{}': {e}", output.display()),
    }
}

/// External program invoked as
/// `program args...` with `{input}` (page description JSON), `{output}` and
/// `{outdir}` substituted. With no arguments, `{input} {output}` is used.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_CONVERTER_TIMEOUT,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let outdir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let template: Vec<String> = if self.args.is_empty() {
            vec![ARG_INPUT.into(), ARG_OUTPUT.into()]
        } else {
            self.args.clone()
        };
        template
            .iter()
            .map(|a| {
                a.replace(ARG_INPUT, &input.to_string_lossy())
                    .replace(ARG_OUTPUT, &output.to_string_lossy())
                    .replace(ARG_OUTDIR, &outdir.to_string_lossy())
            })
            .collect()
    }

    fn failed(&self, output: &Path, reason: impl Into<String>) -> ForgeError {
        ForgeError::ConversionFailed {
            output: output.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Wait for `child` within the timeout and check its exit status.
    fn wait(&self, child: &mut Child, output: &Path, log_path: &Path) -> Result<(), ForgeError> {
        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    if let Err(e) = child.kill() {
                        log::warn!("Failed to kill converter '{}': {e}", self.program);
                    }
                    let _ = child.wait();
                    return Err(ForgeError::ConversionTimedOut {
                        program: self.program.clone(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.failed(output, format!("waiting for converter: {e}"))),
            }
        };

        if !status.success() {
            let stderr = fs::read_to_string(log_path).unwrap_or_default();
            return Err(self.failed(
                output,
                format!("converter exited with {status}: {}", stderr.trim()),
            ));
        }
        Ok(())
    }
}

impl Converter for CommandConverter {
    fn convert(&self, layout: &LayoutConfig, output: &Path) -> Result<(), ForgeError> {
        check_output_path(output)?;
        ensure_parent_dir(output)?;

        // Removed on drop, on every return path below.
        let workdir = tempfile::Builder::new()
            .prefix("case-forge-")
            .tempdir()
            .map_err(|e| ForgeError::io(std::env::temp_dir(), e))?;
        let input: PathBuf = workdir.path().join("layout.json");
        let json = layout
            .to_json()
            .map_err(|e| self.failed(output, format!("serialising page description: {e}")))?;
        fs::write(&input, json).map_err(|e| ForgeError::io(&input, e))?;

        let log_path = workdir.path().join("converter.log");
        let log_file = File::create(&log_path).map_err(|e| ForgeError::io(&log_path, e))?;

        let args = self.expand_args(&input, output);
        log::info!("Running converter: {} {}", self.program, args.join(" "));
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log_file))
            .spawn()
            .map_err(|e| self.failed(output, format!("could not start '{}': {e}", self.program)))?;

        if let Err(e) = self.wait(&mut child, output, &log_path) {
            discard_partial_output(output);
            return Err(e);
        }
        if !output.exists() {
            return Err(self.failed(output, "converter produced no output file"));
        }
        log::info!("Converted '{}'", output.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_are_input_then_output() {
        let c = CommandConverter::new("conv");
        let args = c.expand_args(Path::new("/tmp/x/layout.json"), Path::new("out/r.pdf"));
        assert_eq!(args, vec!["/tmp/x/layout.json", "out/r.pdf"]);
    }

    #[test]
    fn placeholders_are_substituted() {
        let c = CommandConverter::new("soffice").args([
            "--headless",
            "--outdir",
            "{outdir}",
            "{input}",
        ]);
        let args = c.expand_args(Path::new("in.json"), Path::new("r.pdf"));
        assert_eq!(args, vec!["--headless", "--outdir", ".", "in.json"]);
    }

    #[test]
    fn pdf_converter_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("r.pdf");
        PdfConverter.convert(&LayoutConfig::a4(), &out).unwrap();
        let bytes = fs::read(&out).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn pdf_converter_rejects_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r.docx");
        let err = PdfConverter.convert(&LayoutConfig::a4(), &out).unwrap_err();
        assert!(matches!(err, ForgeError::InvalidOutputPath { .. }));
        assert!(!out.exists());
    }

    #[test]
    fn missing_program_is_conversion_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("r.pdf");
        let err = CommandConverter::new("definitely-not-a-real-converter-binary")
            .convert(&LayoutConfig::a4(), &out)
            .unwrap_err();
        assert!(matches!(err, ForgeError::ConversionFailed { .. }), "{err}");
    }
}
