use crate::scoring::{GradeRange, LetterGrade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin-editable template row, at most one per grade range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub grade_range: GradeRange,
    pub subject: String,
    pub body: String,
    /// Opaque JSON blob; see [`TemplateConfig::parse`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// The known optional fields inside a template's `config` blob.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateConfig {
    #[serde(default)]
    pub cta_url: Option<String>,
}

impl TemplateConfig {
    /// Malformed or absent JSON is treated as "no overrides", never an error.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|blob| serde_json::from_str(blob).ok())
            .unwrap_or_default()
    }
}

/// Subject line used when no template row exists for the grade range.
pub fn default_subject(grade: LetterGrade) -> String {
    format!("Your Follow-Up Health Score: {grade}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_cta_url() {
        let config = TemplateConfig::parse(Some(r#"{"cta_url":"https://clinic.example/start"}"#));
        assert_eq!(config.cta_url.as_deref(), Some("https://clinic.example/start"));
    }

    #[test]
    fn parse_tolerates_unknown_fields() {
        let config = TemplateConfig::parse(Some(r#"{"theme":"dark"}"#));
        assert_eq!(config, TemplateConfig::default());
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        assert_eq!(TemplateConfig::parse(Some("{not json")), TemplateConfig::default());
        assert_eq!(TemplateConfig::parse(None), TemplateConfig::default());
    }

    #[test]
    fn default_subject_includes_grade() {
        assert_eq!(
            default_subject(LetterGrade::BMinus),
            "Your Follow-Up Health Score: B-"
        );
    }
}
