use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageBuffer, ImageOutputFormat, Rgb, Rgba};
use studio_atoms::media::{ImageOptimizer, OptimizeOptions, OutputFormat, SourceImage};
use studio_atoms::MediaError;

fn encoded(img: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    encoded(DynamicImage::ImageRgba8(img), ImageOutputFormat::Png)
}

#[tokio::test]
async fn wide_png_becomes_capped_webp() {
    let optimizer = ImageOptimizer::raster();
    let source = SourceImage::new("holiday.photo.png", gradient_png(2400, 1200));

    let optimized = optimizer.optimize(source, OptimizeOptions::default()).await.unwrap();

    assert_eq!((optimized.width, optimized.height), (1920, 960));
    assert_eq!(optimized.mime_type, "image/webp");
    assert_eq!(optimized.file_name, "holiday.photo.webp");
    assert_eq!(optimized.size_bytes, optimized.bytes.len());

    let decoded = image::load_from_memory(&optimized.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (1920, 960));
}

#[tokio::test]
async fn jpeg_output_respects_quality_and_thumbnail_bounds() {
    let optimizer = ImageOptimizer::raster();
    let img = ImageBuffer::from_fn(900, 1600, |x, y| Rgb([(x / 4) as u8, (y / 7) as u8, 60]));
    let bytes = encoded(DynamicImage::ImageRgb8(img), ImageOutputFormat::Png);

    let low = optimizer
        .optimize(
            SourceImage::new("tall.png", bytes.clone()),
            OptimizeOptions {
                max_width: Some(400),
                max_height: Some(300),
                quality: Some(0.2),
                output_format: Some(OutputFormat::Jpeg),
            },
        )
        .await
        .unwrap();
    let high = optimizer
        .optimize(
            SourceImage::new("tall.png", bytes),
            OptimizeOptions {
                max_width: Some(400),
                max_height: Some(300),
                quality: Some(0.95),
                output_format: Some(OutputFormat::Jpeg),
            },
        )
        .await
        .unwrap();

    // tall image: clamped by height
    assert_eq!(low.height, 300);
    assert_eq!(low.width, 169);
    assert_eq!(low.file_name, "tall.jpg");
    assert!(low.size_bytes < high.size_bytes);
}

#[tokio::test]
async fn webp_output_shrinks_with_quality() {
    let optimizer = ImageOptimizer::raster();
    let img = ImageBuffer::from_fn(800, 600, |x, y| {
        let grain = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) % 40;
        Rgb([((x / 4 + grain) % 256) as u8, ((y / 3 + grain) % 256) as u8, (90 + grain) as u8])
    });
    let bytes = encoded(DynamicImage::ImageRgb8(img), ImageOutputFormat::Png);

    let mut sizes = Vec::new();
    for quality in [0.1, 0.85, 1.0] {
        let optimized = optimizer
            .optimize(
                SourceImage::new("photo.png", bytes.clone()),
                OptimizeOptions { quality: Some(quality), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(optimized.mime_type, "image/webp");
        sizes.push(optimized.size_bytes);
    }

    assert!(sizes[0] < sizes[1] && sizes[1] < sizes[2], "sizes by quality: {:?}", sizes);
    assert!(sizes[1] < bytes.len(), "default quality {} vs source {}", sizes[1], bytes.len());
}

#[tokio::test]
async fn small_images_are_not_upscaled() {
    let optimizer = ImageOptimizer::raster();
    let optimized = optimizer
        .optimize_for_gallery(SourceImage::new("icon.png", gradient_png(120, 80)))
        .await
        .unwrap();
    assert_eq!((optimized.width, optimized.height), (120, 80));
}

#[tokio::test]
async fn non_image_bytes_are_a_decode_error() {
    let optimizer = ImageOptimizer::raster();
    let err = optimizer
        .optimize_for_thumbnail(SourceImage::new("notes.txt", b"just some text".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, MediaError::Decode(_)));
}
