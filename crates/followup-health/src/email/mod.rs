//! Report-email composition: placeholder merge, link hardening, and the
//! document shell, plus the admin template types and defaults.

mod composer;
mod links;
mod template;

pub use composer::{build_email_html, EmailContent, EmailPlaceholders};
pub use links::harden_links;
pub use template::{default_subject, EmailTemplate, TemplateConfig};
