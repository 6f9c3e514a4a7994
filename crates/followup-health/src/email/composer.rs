//! Turns an admin template body plus computed results into the final
//! report email HTML.

use super::links::harden_links;
use crate::scoring::CalculationResults;
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

const CONTENT_BLOCK_STYLE: &str = "background-color: #F8FAFC; border-radius: 8px; \
     padding: 24px; margin-bottom: 24px; color: #1E3A5F; line-height: 1.6;";

const FOOTER_LINE: &str = "This report was generated by the Follow-Up Health Dashboard.";

/// Values merged into `{{token}}` placeholders in the template body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailPlaceholders {
    pub grade: String,
    pub risk_low: String,
    pub risk_high: String,
    pub dropoff_percent: String,
    pub cta_url: String,
}

impl EmailPlaceholders {
    /// Currency figures use thousands separators, matching how the
    /// dashboard renders them.
    pub fn from_results(results: &CalculationResults, cta_url: impl Into<String>) -> Self {
        Self {
            grade: results.grade.to_string(),
            risk_low: format_thousands(results.revenue_at_risk.low),
            risk_high: format_thousands(results.revenue_at_risk.high),
            dropoff_percent: results.dropoff_percent.to_string(),
            cta_url: cta_url.into(),
        }
    }
}

/// Input to [`build_email_html`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    /// Admin template body; may be empty, plain text, or an HTML snippet.
    pub custom_content: String,
    pub placeholders: EmailPlaceholders,
}

/// Produce the complete standalone HTML document for the report email.
///
/// Plain-text bodies get newline-to-`<br>` conversion; bodies already
/// containing markup are left as written, apart from link hardening. A
/// blank body yields a document with an empty main section.
pub fn build_email_html(content: &EmailContent) -> String {
    let placeholders = &content.placeholders;
    let substituted = substitute_placeholders(
        content.custom_content.trim(),
        &[
            ("{{grade}}", &placeholders.grade),
            ("{{risk_low}}", &placeholders.risk_low),
            ("{{risk_high}}", &placeholders.risk_high),
            ("{{dropoff_percent}}", &placeholders.dropoff_percent),
            ("{{cta_url}}", &placeholders.cta_url),
        ],
    );

    let main = if substituted.trim().is_empty() {
        String::new()
    } else {
        let formatted = if contains_html(&substituted) {
            substituted
        } else {
            substituted.replace('\n', "<br>")
        };
        let hardened = harden_links(&formatted);
        format!("<div style=\"{CONTENT_BLOCK_STYLE}\">\n{hardened}\n</div>")
    };

    wrap_document(&main)
}

/// Single left-to-right pass over a closed token set. Substituted values
/// are emitted verbatim, so a value that itself contains a token is left
/// literal rather than expanded again.
fn substitute_placeholders(content: &str, tokens: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    'scan: while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        for (token, value) in tokens {
            if tail.starts_with(token) {
                out.push_str(value);
                rest = &tail[token.len()..];
                continue 'scan;
            }
        }

        // Unknown token opener stays literal.
        out.push_str("{{");
        rest = &tail[2..];
    }

    out.push_str(rest);
    out
}

fn html_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<[a-z][^>]*>").expect("tag pattern compiles"))
}

fn contains_html(content: &str) -> bool {
    html_tag().is_match(content)
}

fn wrap_document(main: &str) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str("</head>\n");
    writeln!(
        html,
        "<body style=\"font-family: 'Inter', Arial, sans-serif; line-height: 1.6; \
         color: #1E3A5F; max-width: 600px; margin: 0 auto; padding: 20px;\">"
    )
    .expect("write body open");

    if !main.is_empty() {
        html.push_str(main);
        html.push('\n');
    }

    writeln!(
        html,
        "<div style=\"margin-top: 32px; padding-top: 16px; border-top: 1px solid #E2E8F0; \
         text-align: center; color: #64748B; font-size: 12px;\">\n<p>{FOOTER_LINE}</p>\n</div>"
    )
    .expect("write footer");
    html.push_str("</body>\n</html>\n");

    html
}

fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}
