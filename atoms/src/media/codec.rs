use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageEncoder};
use super::model::OutputFormat;
use crate::error::{MediaError, MediaResult};

/// Decode / resize / encode capability the optimizer is generic over.
///
/// Kept as a trait so the optimizer can be exercised without a real raster
/// backend. Implementations are called from a blocking worker thread.
pub trait ImageCodec: Send + Sync + 'static {
    type Bitmap: Send + 'static;

    fn decode(&self, bytes: &[u8]) -> MediaResult<Self::Bitmap>;

    fn dimensions(&self, bitmap: &Self::Bitmap) -> (u32, u32);

    fn resize(&self, bitmap: Self::Bitmap, width: u32, height: u32) -> Self::Bitmap;

    /// `quality` is on the 1..=100 scale; PNG ignores it
    fn encode(&self, bitmap: &Self::Bitmap, format: OutputFormat, quality: u8) -> MediaResult<Vec<u8>>;
}

/// Production codec backed by the `image` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl ImageCodec for RasterCodec {
    type Bitmap = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> MediaResult<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| MediaError::decode(e.to_string()))
    }

    fn dimensions(&self, bitmap: &DynamicImage) -> (u32, u32) {
        bitmap.dimensions()
    }

    fn resize(&self, bitmap: DynamicImage, width: u32, height: u32) -> DynamicImage {
        if bitmap.dimensions() == (width, height) {
            return bitmap;
        }
        bitmap.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode(&self, bitmap: &DynamicImage, format: OutputFormat, quality: u8) -> MediaResult<Vec<u8>> {
        let (width, height) = bitmap.dimensions();
        if width == 0 || height == 0 {
            return Err(MediaError::encode(format!(
                "cannot encode a {}x{} image",
                width, height
            )));
        }

        let mut buf = Vec::new();
        let result = match format {
            // JPEG has no alpha channel
            OutputFormat::Jpeg => {
                let rgb = bitmap.to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ColorType::Rgb8,
                )
            }
            OutputFormat::Png => {
                let rgba = bitmap.to_rgba8();
                PngEncoder::new(&mut buf).write_image(rgba.as_raw(), width, height, ColorType::Rgba8)
            }
            OutputFormat::Webp => {
                let rgba = bitmap.to_rgba8();
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                    .encode_simple(false, f32::from(quality.clamp(1, 100)))
                    .map_err(|e| MediaError::encode(format!("webp encoder: {:?}", e)))?;
                buf.extend_from_slice(&encoded);
                Ok(())
            }
        };

        result.map_err(|e| MediaError::encode(format!("{} encoder: {}", format.extension(), e)))?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    // Textured enough that a lossy encoder has detail to throw away
    fn textured(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let grain = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) % 48;
            Rgb([((x + grain) % 256) as u8, ((y * 2 + grain) % 256) as u8, (grain * 5) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn webp_size_follows_quality() {
        let codec = RasterCodec;
        let bitmap = textured(320, 240);

        let low = codec.encode(&bitmap, OutputFormat::Webp, 10).unwrap();
        let high = codec.encode(&bitmap, OutputFormat::Webp, 95).unwrap();

        assert!(low.len() < high.len(), "q10={} q95={}", low.len(), high.len());
        let decoded = image::load_from_memory(&high).unwrap();
        assert_eq!(decoded.dimensions(), (320, 240));
    }

    #[test]
    fn zero_sized_bitmap_is_an_encode_error() {
        let err = RasterCodec
            .encode(&DynamicImage::new_rgba8(0, 10), OutputFormat::Webp, 80)
            .unwrap_err();
        assert!(matches!(err, MediaError::Encode(_)));
    }
}
