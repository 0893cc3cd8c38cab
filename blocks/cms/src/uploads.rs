use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::{Deserialize, Serialize};
use studio_atoms::media::{
    optimize_and_upload, upload_gallery, CancelFlag, ContentArea, ImageCodec, ImageOptimizer,
    ObjectStorage, Preset, SourceImage, UploadTarget, UploadedImage,
};

use crate::responses;

pub const MAX_GALLERY_FILES: usize = 24;

#[derive(Debug, Deserialize)]
pub struct UploadFile {
    pub file_name: String,
    /// Base64 bytes, optionally as a `data:` URL
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadPayload {
    #[serde(flatten)]
    pub file: UploadFile,
    #[serde(default)]
    pub preset: Preset,
}

#[derive(Debug, Deserialize)]
pub struct GalleryUploadPayload {
    pub files: Vec<UploadFile>,
    #[serde(default = "gallery_preset")]
    pub preset: Preset,
}

fn gallery_preset() -> Preset {
    Preset::Gallery
}

#[derive(Debug, Serialize)]
pub struct GalleryUploadResponse {
    pub urls: Vec<String>,
    pub images: Vec<UploadedImage>,
}

/// Decode the transported bytes of one file
pub fn decode_upload(file: UploadFile) -> Result<SourceImage, String> {
    let encoded = match file.data.split_once(',') {
        Some((header, rest)) if header.starts_with("data:") => rest,
        _ => file.data.as_str(),
    };
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("{} is not valid base64: {}", file.file_name, e))?;
    if bytes.is_empty() {
        return Err(format!("{} is empty", file.file_name));
    }
    Ok(SourceImage::new(file.file_name, bytes))
}

fn unknown_area(segment: &str) -> Result<Response<Body>, Error> {
    responses::error(
        StatusCode::NOT_FOUND,
        &format!("Unknown upload area '{}'", segment),
    )
}

/// POST /admin/uploads/{area}
pub async fn upload_image<C, S>(
    optimizer: &ImageOptimizer<C>,
    storage: &S,
    bucket: &str,
    area_segment: &str,
    body: &[u8],
    cancel: &CancelFlag,
) -> Result<Response<Body>, Error>
where
    C: ImageCodec,
    S: ObjectStorage + ?Sized,
{
    let Some(area) = ContentArea::from_path_segment(area_segment) else {
        return unknown_area(area_segment);
    };
    let req: UploadPayload = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return responses::bad_payload(e),
    };
    let source = match decode_upload(req.file) {
        Ok(source) => source,
        Err(msg) => return responses::error(StatusCode::BAD_REQUEST, &msg),
    };

    tracing::info!(
        "📥 Upload {} ({} bytes) to {} with {:?} preset",
        source.file_name,
        source.bytes.len(),
        area.prefix(),
        req.preset
    );

    let target = UploadTarget { bucket, area };
    match optimize_and_upload(optimizer, storage, target, source, req.preset.constraints(), cancel).await {
        Ok(image) => responses::json(StatusCode::CREATED, &image),
        Err(e) => {
            tracing::error!("❌ Upload to {} failed: {}", area.prefix(), e);
            responses::media_error(e)
        }
    }
}

/// POST /admin/uploads/{area}/gallery
///
/// Either every file is stored and all URLs come back, or the request fails.
pub async fn upload_gallery_images<C, S>(
    optimizer: &ImageOptimizer<C>,
    storage: &S,
    bucket: &str,
    area_segment: &str,
    body: &[u8],
    cancel: &CancelFlag,
) -> Result<Response<Body>, Error>
where
    C: ImageCodec,
    S: ObjectStorage + ?Sized,
{
    let Some(area) = ContentArea::from_path_segment(area_segment) else {
        return unknown_area(area_segment);
    };
    let req: GalleryUploadPayload = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return responses::bad_payload(e),
    };

    if req.files.is_empty() {
        return responses::error(StatusCode::BAD_REQUEST, "No files to upload");
    }
    if req.files.len() > MAX_GALLERY_FILES {
        return responses::error(
            StatusCode::BAD_REQUEST,
            &format!("At most {} files per gallery upload", MAX_GALLERY_FILES),
        );
    }

    // Nothing is optimized until every file decodes from its transport encoding
    let sources = match req
        .files
        .into_iter()
        .map(decode_upload)
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(sources) => sources,
        Err(msg) => return responses::error(StatusCode::BAD_REQUEST, &msg),
    };

    tracing::info!("📥 Gallery upload of {} files to {}", sources.len(), area.prefix());

    let target = UploadTarget { bucket, area };
    match upload_gallery(optimizer, storage, target, sources, req.preset.constraints(), cancel).await {
        Ok(images) => {
            let urls = images.iter().map(|image| image.url.clone()).collect();
            responses::json(StatusCode::CREATED, &GalleryUploadResponse { urls, images })
        }
        Err(e) => responses::media_error(e),
    }
}
