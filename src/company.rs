//! Company-name extraction from structured case-study text.
//!
//! Pattern based: labelled fields first, then anything carrying a corporate
//! suffix, then the document title with common case-study words removed.

use once_cell::sync::Lazy;
use regex::Regex;

const NAME: &str = r"[A-Za-z0-9 \t]+";
const SUFFIX: &str = r"(?:Inc\.?|LLC|Ltd\.?|GmbH|Corp\.?|Corporation|Company)";

static RE_LABELLED: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(r"Company:[ \t]*({NAME}{SUFFIX}?)"),
        format!(r"Client:[ \t]*({NAME}{SUFFIX}?)"),
        format!(r"Case Study:[ \t]*({NAME}{SUFFIX}?)"),
        format!(r"# ({NAME}{SUFFIX}?) Case Study"),
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RE_SUFFIXED: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"({NAME}{SUFFIX})")).unwrap());
static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*# (.*)$").unwrap());
static RE_TITLE_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Case Study|Integration|Solution|Implementation").unwrap());

/// Best guess at the company a case study is about, or `None`.
pub fn extract_company_name(text: &str) -> Option<String> {
    for re in RE_LABELLED.iter() {
        if let Some(caps) = re.captures(text) {
            let name = caps[1].trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }

    for caps in RE_SUFFIXED.captures_iter(text) {
        let candidate = caps[1].trim();
        if candidate.split_whitespace().count() <= 5 {
            return Some(candidate.to_string());
        }
    }

    let title = RE_TITLE.captures(text)?;
    let cleaned = RE_TITLE_NOISE.replace_all(&title[1], "");
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    if !words.is_empty() && words.len() <= 3 {
        return Some(words.join(" "));
    }
    None
}
