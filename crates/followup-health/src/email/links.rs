//! Anchor-tag hardening for admin-supplied HTML snippets.
//!
//! Templates are edited as free-form text, so anchors routinely arrive as
//! `<a href="www.clinic.example">`. This module is a bounded text
//! transform over the opening `<a ...>` tags only: schemeless hrefs get
//! an `https://` prefix (mailto:/tel: links already carry a scheme and
//! pass through), and `style`/`target`/`rel` defaults are appended only
//! when the attribute is absent. Existing attribute values are never
//! overwritten.

use regex::{Captures, Regex};
use std::sync::OnceLock;

const DEFAULT_LINK_STYLE: &str = "color: #0D9488;";

fn anchor_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\s[^>]*>").expect("anchor pattern compiles"))
}

fn href_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("href pattern compiles")
    })
}

fn style_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\sstyle\s*=").expect("style pattern compiles"))
}

fn target_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\starget\s*=").expect("target pattern compiles"))
}

fn rel_attr() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\srel\s*=").expect("rel pattern compiles"))
}

fn has_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("scheme pattern compiles"))
}

/// Rewrite every opening anchor tag in `html` per the rules above.
pub fn harden_links(html: &str) -> String {
    anchor_tag()
        .replace_all(html, |caps: &Captures<'_>| harden_anchor(&caps[0]))
        .into_owned()
}

fn harden_anchor(tag: &str) -> String {
    let mut tag = href_attr()
        .replace(tag, |caps: &Captures<'_>| {
            let (value, quote) = match (caps.get(1), caps.get(2)) {
                (Some(double), _) => (double.as_str(), '"'),
                (_, Some(single)) => (single.as_str(), '\''),
                _ => return caps[0].to_string(),
            };

            if value.is_empty() || has_scheme().is_match(value) {
                caps[0].to_string()
            } else {
                format!("href={quote}https://{value}{quote}")
            }
        })
        .into_owned();

    let mut additions = String::new();
    if !style_attr().is_match(&tag) {
        additions.push_str(&format!(" style=\"{DEFAULT_LINK_STYLE}\""));
    }
    if !target_attr().is_match(&tag) {
        additions.push_str(" target=\"_blank\"");
    }
    if !rel_attr().is_match(&tag) {
        additions.push_str(" rel=\"noopener noreferrer\"");
    }

    if !additions.is_empty() {
        // Anchors are not void elements, so a trailing '/' as in
        // `<a href="x" />` is stray markup; drop it rather than let the
        // appended attributes land after it.
        let body = tag
            .trim_end_matches('>')
            .trim_end()
            .trim_end_matches('/')
            .trim_end();
        tag = format!("{body}{additions}>");
    }

    tag
}
