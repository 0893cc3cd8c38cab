use std::sync::Arc;
use futures::future::try_join_all;
use super::cancel::CancelFlag;
use super::codec::{ImageCodec, RasterCodec};
use super::model::{
    ContentArea, ImageConstraints, OptimizeOptions, OptimizedImage, SourceImage, UploadedImage,
};
use super::storage::ObjectStorage;
use crate::error::{MediaError, MediaResult};

/// Resize + re-encode transform applied to every upload before storage
pub struct ImageOptimizer<C: ImageCodec = RasterCodec> {
    codec: Arc<C>,
}

impl<C: ImageCodec> Clone for ImageOptimizer<C> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
        }
    }
}

impl ImageOptimizer<RasterCodec> {
    pub fn raster() -> Self {
        Self::new(RasterCodec)
    }
}

impl<C: ImageCodec> ImageOptimizer<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec: Arc::new(codec),
        }
    }

    /// Optimize with partial overrides merged onto the defaults
    pub async fn optimize(
        &self,
        source: SourceImage,
        options: OptimizeOptions,
    ) -> MediaResult<OptimizedImage> {
        let constraints = options.resolve()?;
        self.optimize_with(source, constraints).await
    }

    pub async fn optimize_for_gallery(&self, source: SourceImage) -> MediaResult<OptimizedImage> {
        self.optimize_with(source, ImageConstraints::gallery()).await
    }

    pub async fn optimize_for_thumbnail(&self, source: SourceImage) -> MediaResult<OptimizedImage> {
        self.optimize_with(source, ImageConstraints::thumbnail()).await
    }

    /// Decode, resize and encode on a blocking worker.
    ///
    /// The decoded bitmap lives only inside the worker closure and is dropped
    /// there on both the success and error paths.
    pub async fn optimize_with(
        &self,
        source: SourceImage,
        constraints: ImageConstraints,
    ) -> MediaResult<OptimizedImage> {
        let codec = Arc::clone(&self.codec);
        let optimized = tokio::task::spawn_blocking(move || {
            run_pipeline(codec.as_ref(), &source, &constraints)
        })
        .await
        .map_err(|e| MediaError::Task(e.to_string()))??;

        tracing::info!(
            "🖼️ Optimized {}: {} -> {} bytes ({:.1}% smaller), {}x{}",
            optimized.file_name,
            optimized.original_size,
            optimized.size_bytes,
            optimized.reduction_percent(),
            optimized.width,
            optimized.height,
        );

        Ok(optimized)
    }
}

/// Synchronous optimize pipeline over any codec
pub fn run_pipeline<C: ImageCodec + ?Sized>(
    codec: &C,
    source: &SourceImage,
    constraints: &ImageConstraints,
) -> MediaResult<OptimizedImage> {
    let bitmap = codec.decode(&source.bytes)?;
    let (width, height) = codec.dimensions(&bitmap);
    let (target_width, target_height) =
        target_dimensions(width, height, constraints.max_width, constraints.max_height);

    let resized = codec.resize(bitmap, target_width, target_height);
    let bytes = codec.encode(&resized, constraints.output_format, constraints.quality_percent())?;
    let format = constraints.output_format;

    Ok(OptimizedImage {
        file_name: replace_extension(&source.file_name, format.extension()),
        mime_type: format.mime_type(),
        format,
        width: target_width,
        height: target_height,
        original_size: source.bytes.len(),
        size_bytes: bytes.len(),
        bytes,
    })
}

/// Never upscales. Out-of-bounds images are clamped on their dominant axis
/// only: wide-or-square images by width, tall images by height. The other
/// axis follows the aspect ratio and is not re-checked afterwards.
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    if width == 0 || height == 0 {
        return (width, height);
    }

    let ratio = width as f64 / height as f64;
    if width >= height {
        let new_width = width.min(max_width);
        let new_height = (new_width as f64 / ratio).round().max(1.0) as u32;
        (new_width, new_height)
    } else {
        let new_height = height.min(max_height);
        let new_width = (new_height as f64 * ratio).round().max(1.0) as u32;
        (new_width, new_height)
    }
}

/// `holiday.photo.PNG` -> `holiday.photo.webp`; names without an extension
/// just gain one
pub fn replace_extension(file_name: &str, extension: &str) -> String {
    let base = match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    };
    let base = if base.is_empty() { "image" } else { base };
    format!("{}.{}", base, extension)
}

/// Where in the bucket an upload lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathLayout {
    Single,
    Gallery,
}

/// `<area>/<uuid>.<ext>` or `<area>/gallery/<uuid>.<ext>`; a fresh v4 id per
/// file keeps URLs collision-free and immutable
pub fn storage_path(area: ContentArea, layout: PathLayout, extension: &str) -> String {
    let id = uuid::Uuid::new_v4();
    match layout {
        PathLayout::Single => format!("{}/{}.{}", area.prefix(), id, extension),
        PathLayout::Gallery => format!("{}/gallery/{}.{}", area.prefix(), id, extension),
    }
}

/// Where optimized uploads are written
#[derive(Debug, Clone, Copy)]
pub struct UploadTarget<'a> {
    pub bucket: &'a str,
    pub area: ContentArea,
}

/// Optimize one file and store it; returns its public URL and metadata
pub async fn optimize_and_upload<C, S>(
    optimizer: &ImageOptimizer<C>,
    storage: &S,
    target: UploadTarget<'_>,
    source: SourceImage,
    constraints: ImageConstraints,
    cancel: &CancelFlag,
) -> MediaResult<UploadedImage>
where
    C: ImageCodec,
    S: ObjectStorage + ?Sized,
{
    upload_one(optimizer, storage, target, PathLayout::Single, source, constraints, cancel).await
}

/// Optimize and store a gallery batch concurrently.
///
/// All-or-nothing: if any file fails the whole batch fails and no URL list is
/// returned. Objects already written by the successful siblings stay in the
/// bucket unreferenced.
pub async fn upload_gallery<C, S>(
    optimizer: &ImageOptimizer<C>,
    storage: &S,
    target: UploadTarget<'_>,
    sources: Vec<SourceImage>,
    constraints: ImageConstraints,
    cancel: &CancelFlag,
) -> MediaResult<Vec<UploadedImage>>
where
    C: ImageCodec,
    S: ObjectStorage + ?Sized,
{
    let count = sources.len();
    let uploads = sources.into_iter().map(|source| {
        upload_one(optimizer, storage, target, PathLayout::Gallery, source, constraints, cancel)
    });

    match try_join_all(uploads).await {
        Ok(images) => {
            tracing::info!("✅ Gallery batch of {} stored under {}", count, target.area.prefix());
            Ok(images)
        }
        Err(e) => {
            tracing::error!("❌ Gallery batch of {} failed: {}", count, e);
            Err(e)
        }
    }
}

async fn upload_one<C, S>(
    optimizer: &ImageOptimizer<C>,
    storage: &S,
    target: UploadTarget<'_>,
    layout: PathLayout,
    source: SourceImage,
    constraints: ImageConstraints,
    cancel: &CancelFlag,
) -> MediaResult<UploadedImage>
where
    C: ImageCodec,
    S: ObjectStorage + ?Sized,
{
    cancel.check()?;
    let optimized = optimizer.optimize_with(source, constraints).await?;
    cancel.check()?;

    let path = storage_path(target.area, layout, optimized.format.extension());
    let OptimizedImage {
        mime_type,
        width,
        height,
        original_size,
        size_bytes,
        bytes,
        ..
    } = optimized;

    storage.upload(target.bucket, &path, bytes, mime_type).await?;
    cancel.check()?;

    Ok(UploadedImage {
        url: storage.public_url(target.bucket, &path),
        path,
        mime_type: mime_type.to_string(),
        width,
        height,
        original_size,
        size_bytes,
    })
}
