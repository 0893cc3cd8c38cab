use serde::{Deserialize, Serialize};
use super::markup::render_markup;
use crate::error::{ContentError, ContentResult};

/// Fixed-shape case-study body, persisted as one JSON string in `content`.
///
/// Missing keys in stored JSON read as empty sections.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseStudySections {
    pub project_summary: String,
    pub process: String,
    pub results: String,
    pub conclusions: String,
    pub final_summary: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RenderedSection {
    pub key: &'static str,
    pub title: &'static str,
    pub html: String,
}

impl CaseStudySections {
    /// Read a stored `content` value. Anything that is not a sections object
    /// is older free-form content and becomes the project summary.
    pub fn parse(raw: &str) -> Self {
        match Self::parse_object(raw) {
            Ok(sections) => sections,
            Err(e) => {
                tracing::debug!("Case study content is not sections JSON ({}), using legacy layout", e);
                Self {
                    project_summary: raw.to_string(),
                    ..Self::default()
                }
            }
        }
    }

    // serde would also accept a positional array for a struct; only objects count
    fn parse_object(raw: &str) -> Result<Self, String> {
        match serde_json::from_str::<serde_json::Value>(raw).map_err(|e| e.to_string())? {
            value @ serde_json::Value::Object(_) => {
                serde_json::from_value(value).map_err(|e| e.to_string())
            }
            other => Err(format!("expected an object, found {}", json_kind(&other))),
        }
    }

    pub fn to_persisted(&self) -> ContentResult<String> {
        serde_json::to_string(self).map_err(|e| ContentError::Validation(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries().iter().all(|(_, _, text)| text.trim().is_empty())
    }

    /// (json key, display title, text) in display order
    pub fn entries(&self) -> [(&'static str, &'static str, &str); 5] {
        [
            ("projectSummary", "Project Summary", self.project_summary.as_str()),
            ("process", "Process", self.process.as_str()),
            ("results", "Results", self.results.as_str()),
            ("conclusions", "Conclusions", self.conclusions.as_str()),
            ("finalSummary", "Final Summary", self.final_summary.as_str()),
        ]
    }

    /// Non-empty sections rendered with the case-study markup grammar
    pub fn render(&self) -> Vec<RenderedSection> {
        self.entries()
            .into_iter()
            .filter(|(_, _, text)| !text.trim().is_empty())
            .map(|(key, title, text)| RenderedSection {
                key,
                title,
                html: render_markup(text),
            })
            .collect()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_falls_back_to_project_summary() {
        let raw = "We shot a **launch film** for the client.";
        let sections = CaseStudySections::parse(raw);
        assert_eq!(
            sections,
            CaseStudySections {
                project_summary: raw.to_string(),
                process: String::new(),
                results: String::new(),
                conclusions: String::new(),
                final_summary: String::new(),
            }
        );
    }

    #[test]
    fn json_that_is_not_an_object_falls_back() {
        assert_eq!(CaseStudySections::parse("42").project_summary, "42");
        assert_eq!(CaseStudySections::parse("[\"a\"]").project_summary, "[\"a\"]");
        assert_eq!(CaseStudySections::parse(r#"{"results":5}"#).project_summary, r#"{"results":5}"#);
    }

    #[test]
    fn camel_case_keys_round_trip() {
        let sections = CaseStudySections {
            project_summary: "Summary".into(),
            final_summary: "Done".into(),
            ..Default::default()
        };
        let stored = sections.to_persisted().unwrap();
        assert!(stored.contains("\"projectSummary\":\"Summary\""));
        assert!(stored.contains("\"finalSummary\":\"Done\""));
        assert_eq!(CaseStudySections::parse(&stored), sections);
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let sections = CaseStudySections::parse(r#"{"results":"2x reach"}"#);
        assert_eq!(sections.results, "2x reach");
        assert!(sections.project_summary.is_empty());
    }

    #[test]
    fn render_skips_empty_sections() {
        let sections = CaseStudySections {
            process: "- storyboard\n- shoot".into(),
            results: "   ".into(),
            ..Default::default()
        };
        let rendered = sections.render();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].key, "process");
        assert!(rendered[0].html.starts_with("<ul>"));
        assert!(!sections.is_empty());
        assert!(CaseStudySections::default().is_empty());
    }
}
