// End-to-end batch export through files on disk

use image::{DynamicImage, Rgb, RgbImage};
use photo_watermark::export::*;
use photo_watermark::library::ImageLibrary;
use photo_watermark::watermark::{Anchor, WatermarkConfig, WatermarkRenderer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn write_photo(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]))
        .save(&path)
        .unwrap();
    path
}

fn text_config() -> WatermarkConfig {
    WatermarkConfig::text("SAMPLE")
        .with_opacity(100)
        .with_anchor(Anchor::Center)
}

#[test]
fn test_batch_with_one_corrupt_source() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let a = write_photo(input.path(), "a.png", 320, 240);
    let b = write_photo(input.path(), "b.jpg", 200, 300);
    let corrupt = input.path().join("broken.jpg");
    std::fs::write(&corrupt, b"\xFF\xD8 definitely not a jpeg").unwrap();

    let items: Vec<BatchItem> = [&a, &corrupt, &b].iter().map(|p| BatchItem::from_path(*p)).collect();
    let report = run_batch(
        &WatermarkRenderer::builtin_only(),
        &items,
        &text_config(),
        &ExportOptions::new(output.path()),
    );

    assert_eq!(report.success_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failed_files, vec!["broken.jpg".to_string()]);
    assert!(output.path().join("a.jpg").exists());
    assert!(output.path().join("b.jpg").exists());
}

#[test]
fn test_prefix_naming_with_png_output() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let photo = write_photo(input.path(), "photo.jpg", 160, 120);

    let mut options = ExportOptions::new(output.path());
    options.naming = NamingRule::Prefix("wm_".to_string());
    options.format = OutputFormat::Png;

    let written = export_single(
        &WatermarkRenderer::builtin_only(),
        &BatchItem::from_path(&photo),
        &text_config(),
        &options,
    )
    .unwrap();

    assert_eq!(written, output.path().join("wm_photo.png"));
    let decoded = image::open(&written).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (160, 120));
}

#[test]
fn test_watermark_changes_only_the_stamp_area() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let photo = input.path().join("flat.png");
    RgbImage::from_pixel(400, 300, Rgb([128, 128, 128]))
        .save(&photo)
        .unwrap();

    let mut options = ExportOptions::new(output.path());
    options.format = OutputFormat::Png;
    let written = export_single(
        &WatermarkRenderer::builtin_only(),
        &BatchItem::from_path(&photo),
        &text_config(),
        &options,
    )
    .unwrap();

    let result = image::open(&written).unwrap().to_rgb8();
    for (x, y) in [(0, 0), (399, 0), (0, 299), (399, 299)] {
        assert_eq!(*result.get_pixel(x, y), Rgb([128, 128, 128]));
    }
    assert!(result.pixels().any(|p| *p != Rgb([128, 128, 128])));
}

#[test]
fn test_resize_after_watermark() {
    let output = TempDir::new().unwrap();
    let host = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([20, 20, 20])));
    let mut options = ExportOptions::new(output.path());
    options.resize = Some(ResizeRule::Exact { width: 150, height: 150 });

    let written = export_single(
        &WatermarkRenderer::builtin_only(),
        &BatchItem::with_image("mem/wide.jpg", Arc::new(host)),
        &text_config(),
        &options,
    )
    .unwrap();

    let decoded = image::open(&written).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (150, 150));
}

#[test]
fn test_same_folder_requires_confirmation() {
    let input = TempDir::new().unwrap();
    let photo = write_photo(input.path(), "p.png", 10, 10);

    let mut library = ImageLibrary::new();
    library.add_image(&photo).unwrap();

    assert!(is_same_folder(input.path(), &library.paths()));
    assert!(matches!(
        check_output_folder(input.path(), &library.paths(), false),
        Err(ExportError::RequiresConfirmation(_))
    ));
}

#[tokio::test]
async fn test_worker_exports_library() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_photo(input.path(), "one.png", 120, 90);
    write_photo(input.path(), "two.png", 90, 120);

    let mut library = ImageLibrary::new();
    assert_eq!(library.add_folder(input.path()), 2);

    let mut options = ExportOptions::new(output.path());
    options.naming = NamingRule::Suffix(DEFAULT_SUFFIX.to_string());

    let worker = ExportWorker::spawn(Arc::new(WatermarkRenderer::builtin_only()));
    let handle = worker
        .submit(ExportJob {
            items: library.batch_items(),
            config: text_config(),
            options,
        })
        .unwrap();
    let report = handle.wait().await.unwrap();
    worker.shutdown().await.unwrap();

    assert_eq!(report.success_count, 2);
    assert!(output.path().join("one_watermarked.jpg").exists());
    assert!(output.path().join("two_watermarked.jpg").exists());
}
