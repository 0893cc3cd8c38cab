use serde::{Deserialize, Serialize};
use crate::error::{MediaError, MediaResult};

pub const DEFAULT_MAX_WIDTH: u32 = 1920;
pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const DEFAULT_QUALITY: f32 = 0.85;

/// Encodings the optimizer can produce
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// Fully resolved resize/re-encode constraints.
///
/// [`OptimizeOptions::resolve`] and the presets validate their output. Values
/// built field by field are not checked; `quality_percent` still clamps.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct ImageConstraints {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    pub output_format: OutputFormat,
}

impl Default for ImageConstraints {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            output_format: OutputFormat::Webp,
        }
    }
}

impl ImageConstraints {
    /// 1200x800 webp, used for case-study galleries
    pub fn gallery() -> Self {
        Self {
            max_width: 1200,
            max_height: 800,
            quality: 0.85,
            output_format: OutputFormat::Webp,
        }
    }

    /// 400x300 webp, used for listing cards
    pub fn thumbnail() -> Self {
        Self {
            max_width: 400,
            max_height: 300,
            quality: 0.8,
            output_format: OutputFormat::Webp,
        }
    }

    /// Quality mapped onto the 1..=100 scale encoders expect
    pub fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Partial overrides; unset fields fall back to [`ImageConstraints::default`].
#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct OptimizeOptions {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub quality: Option<f32>,
    pub output_format: Option<OutputFormat>,
}

impl OptimizeOptions {
    pub fn resolve(&self) -> MediaResult<ImageConstraints> {
        let defaults = ImageConstraints::default();
        let resolved = ImageConstraints {
            max_width: self.max_width.unwrap_or(defaults.max_width),
            max_height: self.max_height.unwrap_or(defaults.max_height),
            quality: self.quality.unwrap_or(defaults.quality),
            output_format: self.output_format.unwrap_or(defaults.output_format),
        };

        if resolved.max_width == 0 || resolved.max_height == 0 {
            return Err(MediaError::InvalidOptions(
                "max_width and max_height must be positive".to_string(),
            ));
        }
        if !(resolved.quality > 0.0 && resolved.quality <= 1.0) {
            return Err(MediaError::InvalidOptions(format!(
                "quality must be in (0, 1], got {}",
                resolved.quality
            )));
        }

        Ok(resolved)
    }
}

/// Named constraint sets selectable from upload requests
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Default,
    Gallery,
    Thumbnail,
}

impl Preset {
    pub fn constraints(&self) -> ImageConstraints {
        match self {
            Self::Default => ImageConstraints::default(),
            Self::Gallery => ImageConstraints::gallery(),
            Self::Thumbnail => ImageConstraints::thumbnail(),
        }
    }
}

/// Raw upload as received from the editor
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Re-encoded, dimension-capped image ready for storage
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub file_name: String,
    pub mime_type: &'static str,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub original_size: usize,
    pub size_bytes: usize,
    pub bytes: Vec<u8>,
}

impl OptimizedImage {
    /// Percentage saved relative to the source; negative when the output grew
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.size_bytes as f64 / self.original_size as f64) * 100.0
    }
}

/// Logical upload namespace, used as the storage path prefix
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ContentArea {
    #[serde(rename = "blog")]
    Blog,
    #[serde(rename = "case-studies")]
    CaseStudies,
}

impl ContentArea {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::CaseStudies => "case-studies",
        }
    }

    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "blog" => Some(Self::Blog),
            "case-studies" => Some(Self::CaseStudies),
            _ => None,
        }
    }
}

/// What the editor gets back after a successful upload
#[derive(Debug, Serialize, Clone)]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub original_size: usize,
    pub size_bytes: usize,
}
