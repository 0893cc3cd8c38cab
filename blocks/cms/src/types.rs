use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studio_atoms::blocks::{BlockSequence, ContentBlock};
use studio_atoms::sections::{CaseStudySections, RenderedSection};

// ========== POST ==========

/// Blog post. `content` is the flattened copy of `content_blocks`, rewritten
/// on every save and never read back into blocks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Post {
    pub post_id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub content_blocks: BlockSequence,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostPayload {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content_blocks: Option<BlockSequence>,
    /// Plain body for clients that do not send blocks
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
}

/// Partial update; an empty string clears an optional field
#[derive(Debug, Deserialize, Default)]
pub struct UpdatePostPayload {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content_blocks: Option<BlockSequence>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
}

/// Public listing entry
#[derive(Debug, Serialize, Clone)]
pub struct PostSummary {
    pub post_id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
}

/// Public single-post response with the blocks already rendered
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub summary: PostSummary,
    pub html: String,
}

impl From<&Post> for PostSummary {
    fn from(post: &Post) -> Self {
        Self {
            post_id: post.post_id.clone(),
            title: post.title.clone(),
            slug: post.slug.clone(),
            excerpt: post.excerpt.clone(),
            image_url: post.image_url.clone(),
            published_at: post.published_at.clone(),
        }
    }
}

// ========== CASE STUDY ==========

/// Case study. `content_blocks` is an optional free-form body rendered after
/// the fixed sections; it never has a legacy flattened copy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CaseStudy {
    pub case_study_id: String,
    pub title: String,
    pub slug: String,
    pub client: Option<String>,
    pub category: Option<String>,
    pub sections: CaseStudySections,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_blocks: Option<BlockSequence>,
    pub image_url: Option<String>,
    pub gallery_images: Vec<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCaseStudyPayload {
    pub title: String,
    pub slug: Option<String>,
    pub client: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub sections: CaseStudySections,
    #[serde(default)]
    pub content_blocks: Vec<ContentBlock>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub gallery_images: Vec<String>,
    pub published_at: Option<String>,
}

/// Partial update; an empty string clears an optional field
#[derive(Debug, Deserialize, Default)]
pub struct UpdateCaseStudyPayload {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub client: Option<String>,
    pub category: Option<String>,
    pub sections: Option<CaseStudySections>,
    /// An empty list removes the block body
    pub content_blocks: Option<Vec<ContentBlock>>,
    pub image_url: Option<String>,
    pub gallery_images: Option<Vec<String>>,
    pub published_at: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CaseStudySummary {
    pub case_study_id: String,
    pub title: String,
    pub slug: String,
    pub client: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CaseStudyView {
    #[serde(flatten)]
    pub summary: CaseStudySummary,
    pub sections: Vec<RenderedSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    pub gallery_images: Vec<String>,
}

impl From<&CaseStudy> for CaseStudySummary {
    fn from(case_study: &CaseStudy) -> Self {
        Self {
            case_study_id: case_study.case_study_id.clone(),
            title: case_study.title.clone(),
            slug: case_study.slug.clone(),
            client: case_study.client.clone(),
            category: case_study.category.clone(),
            image_url: case_study.image_url.clone(),
            published_at: case_study.published_at.clone(),
        }
    }
}

// ========== HELPERS ==========

/// URL slug: lowercase ASCII alphanumerics, everything else collapsed to `-`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Explicit slug if given, else one derived from the title, else the id
pub fn resolve_slug(explicit: Option<&str>, title: &str, id: &str) -> String {
    let from_explicit = explicit.map(slugify).filter(|s| !s.is_empty());
    from_explicit
        .or_else(|| Some(slugify(title)).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| id.to_string())
}

/// Live when a publish time is set and has passed
pub fn is_published(published_at: Option<&str>, now: DateTime<Utc>) -> bool {
    published_at
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc) <= now)
        .unwrap_or(false)
}

/// Newest `published_at` first; entries without one go last
pub fn sort_newest_published_first<T>(items: &mut [T], published_at: impl Fn(&T) -> Option<&str>) {
    items.sort_by(|a, b| {
        let a = published_at(a).and_then(|ts| DateTime::parse_from_rfc3339(ts).ok());
        let b = published_at(b).and_then(|ts| DateTime::parse_from_rfc3339(ts).ok());
        b.cmp(&a)
    });
}

/// Apply an optional-field edit: `None` keeps, empty clears, anything else sets
pub fn apply_optional(target: &mut Option<String>, edit: Option<String>) {
    if let Some(value) = edit {
        let trimmed = value.trim();
        *target = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

/// Reject publish times that would never parse on read
pub fn validate_published_at(published_at: Option<&str>) -> Result<(), String> {
    match published_at.map(str::trim).filter(|ts| !ts.is_empty()) {
        Some(ts) if DateTime::parse_from_rfc3339(ts).is_err() => {
            Err(format!("published_at must be an RFC 3339 timestamp, got '{}'", ts))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Behind the Scenes: Our 2025 Reel!"), "behind-the-scenes-our-2025-reel");
        assert_eq!(slugify("  --Hello__World--  "), "hello-world");
        assert_eq!(slugify("Café"), "caf");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slug_resolution_order() {
        assert_eq!(resolve_slug(Some("My Custom"), "Title", "id-1"), "my-custom");
        assert_eq!(resolve_slug(None, "Launch Film", "id-1"), "launch-film");
        assert_eq!(resolve_slug(Some("???"), "日本", "id-1"), "id-1");
    }

    #[test]
    fn publish_window() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        assert!(is_published(Some("2026-05-01T12:00:00Z"), now));
        assert!(is_published(Some("2026-04-01T00:00:00+10:00"), now));
        assert!(!is_published(Some("2026-06-01T00:00:00Z"), now));
        assert!(!is_published(Some("yesterday"), now));
        assert!(!is_published(None, now));
    }

    #[test]
    fn newest_first() {
        let mut items = vec![
            ("a", Some("2026-01-01T00:00:00Z")),
            ("b", None),
            ("c", Some("2026-03-01T00:00:00Z")),
        ];
        sort_newest_published_first(&mut items, |(_, ts)| *ts);
        let order: Vec<_> = items.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn optional_edits() {
        let mut field = Some("old".to_string());
        apply_optional(&mut field, None);
        assert_eq!(field.as_deref(), Some("old"));
        apply_optional(&mut field, Some(" new ".into()));
        assert_eq!(field.as_deref(), Some("new"));
        apply_optional(&mut field, Some(String::new()));
        assert_eq!(field, None);
    }

    #[test]
    fn post_payload_rejects_empty_blocks() {
        let parsed = serde_json::from_str::<CreatePostPayload>(r#"{"title":"t","content_blocks":[]}"#);
        assert!(parsed.is_err());

        let parsed: CreatePostPayload = serde_json::from_str(
            r#"{"title":"t","content_blocks":[{"type":"text","body":"Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.content_blocks.map(|b| b.len()), Some(1));
    }
}
