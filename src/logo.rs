//! Logo Resolver – guesses a company's domain and probes a logo-by-domain
//! service for it.
//!
//! Absence of a logo is a normal outcome: [`LogoResolver::resolve`] returns
//! `None` and never an error. Network access goes through [`HttpTransport`]
//! so tests can substitute a stub.

use std::time::Duration;

use crate::error::LogoError;

/// Logo-by-domain endpoint; `{domain}` is replaced by each candidate.
pub const LOGO_ENDPOINT: &str = "https://logo.clearbit.com/{domain}";

/// Top-level domains tried, in priority order.
pub const CANDIDATE_TLDS: [&str; 5] = ["com", "org", "net", "io", "co"];

/// Per-probe timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for downloading the logo bytes.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimal blocking HTTP surface needed for logo work.
pub trait HttpTransport {
    /// Issue a HEAD request and return the status code.
    fn head(&self, url: &str, timeout: Duration) -> Result<u16, LogoError>;

    /// GET the body; any status other than 200 is [`LogoError::Status`].
    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, LogoError>;
}

/// [`HttpTransport`] over a blocking `reqwest` client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, LogoError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("case-forge/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| LogoError::Transport {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> LogoError {
    LogoError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

impl HttpTransport for ReqwestTransport {
    fn head(&self, url: &str, timeout: Duration) -> Result<u16, LogoError> {
        let response = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .map_err(|e| transport_error(url, e))?;
        Ok(response.status().as_u16())
    }

    fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, LogoError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|e| transport_error(url, e))?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(LogoError::Status {
                url: url.to_string(),
                status,
            });
        }
        let body = response.bytes().map_err(|e| transport_error(url, e))?;
        Ok(body.to_vec())
    }
}

/// Lower-cased name with all whitespace removed.
pub fn slugify(company_name: &str) -> String {
    company_name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Candidate domains for `company_name`, in probe order.
pub fn candidate_domains(company_name: &str) -> Vec<String> {
    let slug = slugify(company_name);
    if slug.is_empty() {
        return Vec::new();
    }
    CANDIDATE_TLDS
        .iter()
        .map(|tld| format!("{slug}.{tld}"))
        .collect()
}

/// Probes candidate domains against a logo endpoint.
pub struct LogoResolver<'a> {
    transport: &'a dyn HttpTransport,
    endpoint: String,
    timeout: Duration,
}

impl<'a> LogoResolver<'a> {
    pub fn new(transport: &'a dyn HttpTransport) -> Self {
        Self {
            transport,
            endpoint: LOGO_ENDPOINT.to_string(),
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Use a different endpoint template (must contain `{domain}`).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn logo_url(&self, domain: &str) -> String {
        self.endpoint.replace("{domain}", domain)
    }

    /// First logo URL whose probe answers 200, or `None`.
    ///
    /// Names containing "technologies" get one more attempt with that word
    /// shortened to "tech".
    pub fn resolve(&self, company_name: &str) -> Option<String> {
        log::info!("Searching for logo for: {company_name}");

        if let Some(url) = self.probe_candidates(company_name) {
            log::info!("Found logo: {url}");
            return Some(url);
        }

        let lowered = company_name.to_lowercase();
        if lowered.contains("technologies") {
            let alt = lowered.replace("technologies", "tech");
            if let Some(url) = self.resolve(&alt) {
                return Some(url);
            }
        }

        log::warn!("No logo found for {company_name}");
        None
    }

    fn probe_candidates(&self, company_name: &str) -> Option<String> {
        for domain in candidate_domains(company_name) {
            let url = self.logo_url(&domain);
            match self.transport.head(&url, self.timeout) {
                Ok(200) => return Some(url),
                Ok(status) => log::debug!("Logo probe {url} answered {status}"),
                Err(e) => log::debug!("Logo probe for {domain} failed: {e}"),
            }
        }
        None
    }
}

/// Where the company mark comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LogoReference {
    Url(String),
    Bytes(Vec<u8>),
}

/// Validated logo image.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoImage {
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl LogoImage {
    /// Height in points when drawn `width` points wide.
    pub fn scaled_height(&self, width: f32) -> f32 {
        if self.width_px == 0 {
            return width;
        }
        width * self.height_px as f32 / self.width_px as f32
    }
}

/// Download (if needed) and decode-check a logo.
pub fn fetch_logo(
    transport: &dyn HttpTransport,
    reference: &LogoReference,
) -> Result<LogoImage, LogoError> {
    let bytes = match reference {
        LogoReference::Url(url) => {
            log::info!("Downloading logo from URL: {url}");
            transport.get(url, FETCH_TIMEOUT)?
        }
        LogoReference::Bytes(bytes) => bytes.clone(),
    };
    let decoded =
        image::load_from_memory(&bytes).map_err(|e| LogoError::Undecodable(e.to_string()))?;
    log::debug!(
        "Logo decoded: {} bytes, {}x{} px",
        bytes.len(),
        decoded.width(),
        decoded.height()
    );
    Ok(LogoImage {
        width_px: decoded.width(),
        height_px: decoded.height(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Answers 200 for `ok_urls`, 404 otherwise; records every HEAD.
    struct StubTransport {
        ok_urls: Vec<String>,
        fail_with_error: bool,
        seen: RefCell<Vec<String>>,
    }

    impl StubTransport {
        fn new(ok_urls: &[&str]) -> Self {
            Self {
                ok_urls: ok_urls.iter().map(|s| s.to_string()).collect(),
                fail_with_error: false,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl HttpTransport for StubTransport {
        fn head(&self, url: &str, timeout: Duration) -> Result<u16, LogoError> {
            assert_eq!(timeout, PROBE_TIMEOUT);
            self.seen.borrow_mut().push(url.to_string());
            if self.fail_with_error {
                return Err(LogoError::Transport {
                    url: url.to_string(),
                    reason: "timed out".into(),
                });
            }
            Ok(if self.ok_urls.iter().any(|u| u == url) {
                200
            } else {
                404
            })
        }

        fn get(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, LogoError> {
            Err(LogoError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    #[test]
    fn candidates_in_priority_order() {
        assert_eq!(
            candidate_domains("Example Co"),
            vec![
                "exampleco.com",
                "exampleco.org",
                "exampleco.net",
                "exampleco.io",
                "exampleco.co"
            ]
        );
        assert!(candidate_domains("   ").is_empty());
    }

    #[test]
    fn stops_at_first_success() {
        let stub = StubTransport::new(&["https://logo.clearbit.com/acme.net"]);
        let url = LogoResolver::new(&stub).resolve("Acme");
        assert_eq!(url.as_deref(), Some("https://logo.clearbit.com/acme.net"));
        assert_eq!(stub.seen.borrow().len(), 3);
    }

    #[test]
    fn all_failures_return_none() {
        let stub = StubTransport::new(&[]);
        assert_eq!(LogoResolver::new(&stub).resolve("Example Co"), None);
        assert_eq!(stub.seen.borrow().len(), 5);
    }

    #[test]
    fn transport_errors_are_swallowed() {
        let mut stub = StubTransport::new(&[]);
        stub.fail_with_error = true;
        assert_eq!(LogoResolver::new(&stub).resolve("Example Co"), None);
        assert_eq!(stub.seen.borrow().len(), 5);
    }

    #[test]
    fn technologies_retries_as_tech() {
        let stub = StubTransport::new(&["https://logo.clearbit.com/acmetech.io"]);
        let url = LogoResolver::new(&stub).resolve("Acme Technologies");
        assert_eq!(url.as_deref(), Some("https://logo.clearbit.com/acmetech.io"));
        let seen = stub.seen.borrow();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen[0], "https://logo.clearbit.com/acmetechnologies.com");
        assert_eq!(seen[5], "https://logo.clearbit.com/acmetech.com");
    }

    #[test]
    fn custom_endpoint() {
        let stub = StubTransport::new(&["http://localhost/logo/acme.com"]);
        let url = LogoResolver::new(&stub)
            .with_endpoint("http://localhost/logo/{domain}")
            .resolve("ACME");
        assert_eq!(url.as_deref(), Some("http://localhost/logo/acme.com"));
    }

    #[test]
    fn fetch_rejects_undecodable_bytes() {
        let stub = StubTransport::new(&[]);
        let err = fetch_logo(&stub, &LogoReference::Bytes(b"<html>".to_vec())).unwrap_err();
        assert!(matches!(err, LogoError::Undecodable(_)));
    }

    #[test]
    fn fetch_propagates_status() {
        let stub = StubTransport::new(&[]);
        let err = fetch_logo(&stub, &LogoReference::Url("http://x/y.png".into())).unwrap_err();
        assert_eq!(
            err,
            LogoError::Status {
                url: "http://x/y.png".into(),
                status: 404
            }
        );
    }
}
