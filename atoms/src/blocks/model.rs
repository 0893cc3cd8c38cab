use serde::{Deserialize, Serialize};

/// One unit of structured content.
///
/// Stored with an internal `type` tag. There is no order field: a block's
/// position in its [`super::BlockSequence`] is its rendering order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        /// Markdown
        body: String,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        /// Attribution
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source: Option<String>,
    },
}

impl ContentBlock {
    pub fn empty(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Text => Self::text(""),
            BlockKind::Image => Self::Image {
                url: String::new(),
                caption: None,
                source: None,
            },
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    pub fn image(url: impl Into<String>, caption: Option<String>, source: Option<String>) -> Self {
        Self::Image {
            url: url.into(),
            caption,
            source,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::Image { .. } => BlockKind::Image,
        }
    }

    /// Flattened form used in the legacy `content` column
    pub fn legacy_fragment(&self) -> String {
        match self {
            Self::Text { body } => body.clone(),
            Self::Image { url, caption, source } => {
                let mut marker = format!("[IMAGE: {}", url);
                if let Some(caption) = non_empty(caption) {
                    marker.push_str(" - ");
                    marker.push_str(caption);
                }
                if let Some(source) = non_empty(source) {
                    marker.push_str(" (Source: ");
                    marker.push_str(source);
                    marker.push(')');
                }
                marker.push(']');
                marker
            }
        }
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// A single-field edit. `Caption`/`Source` set to `None` or an empty string
/// clear the field.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "lowercase")]
pub enum BlockField {
    Body(String),
    Url(String),
    Caption(Option<String>),
    Source(Option<String>),
}

impl BlockField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Body(_) => "body",
            Self::Url(_) => "url",
            Self::Caption(_) => "caption",
            Self::Source(_) => "source",
        }
    }
}
