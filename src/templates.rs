//! Sample case-study inputs for testing and demonstration.
//!
//! Each sample exercises a different part of the markup grammar.

/// A 1×1 PNG, base64-encoded. Stands in for a downloaded logo.
pub const SAMPLE_LOGO_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// Full case study with every line kind.
pub fn case_study_template() -> &'static str {
    r#"Prepared by the solutions team.

# Acme Corp Case Study
Company: Acme Corp
Acme Corp runs regional logistics for 1.5 million parcels a month.

## Challenge
- Manual dispatch planning
- Carrier data arrived in 14 formats
**Root cause:** no shared data model between depots.

## Solution
1. Unified ingestion service
2. Route optimiser rollout
3. Depot dashboards

### Timeline
The rollout took **six weeks** across **twelve** depots.

## Results
- On-time delivery up 18%
- Fuel cost down 9%
GRAPH: Q1,72;Q2,81;Q3,88;Q4,93
GRAPH: Before,14;After,3
"#
}

/// Headings only; nothing else to lay out.
pub fn headings_only_template() -> &'static str {
    "# One\n## Two\n### Three\n#### Four\n"
}

/// Malformed directives and stray content that must degrade, not fail.
pub fn degraded_template() -> &'static str {
    r#"stray preamble that is skipped
# Findings
GRAPH: nothing here
GRAPH: Q1,10;Q2,bad;Q3,30
GRAPH: a,NaN;b,inf
**unterminated bold
10.no space numbered
"#
}

/// Enough body text to need several pages.
pub fn multi_page_template() -> String {
    let mut text = String::from("# Long Report\nClient: Globex\n");
    for section in 1..=4 {
        text.push_str(&format!("## Section {section}\n"));
        for line in 1..=40 {
            text.push_str(&format!(
                "Paragraph {line} of section {section} describes the engagement in enough \
                 words to wrap onto a second line at the default body size.\n"
            ));
        }
    }
    text
}
