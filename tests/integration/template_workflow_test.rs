// Saved templates driving an export

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use photo_watermark::export::{export_single, BatchItem, ExportOptions, OutputFormat};
use photo_watermark::store::{Settings, TemplateStore};
use photo_watermark::watermark::{Anchor, TemplateKind, WatermarkConfig, WatermarkRenderer};
use tempfile::TempDir;

#[test]
fn test_image_template_export() {
    let work = TempDir::new().unwrap();
    let logo = work.path().join("logo.png");
    RgbaImage::from_pixel(20, 20, Rgba([255, 0, 0, 255]))
        .save(&logo)
        .unwrap();
    let photo = work.path().join("photo.png");
    RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])).save(&photo).unwrap();

    let mut store = TemplateStore::open(&work.path().join("config")).unwrap();
    store
        .save_config(
            "corner",
            &WatermarkConfig::image(&logo)
                .with_opacity(100)
                .with_anchor(Anchor::TopLeft),
        )
        .unwrap();

    let config = store.load_config(TemplateKind::Image, "corner").unwrap();
    let mut options = ExportOptions::new(work.path().join("out"));
    options.format = OutputFormat::Png;
    let written = export_single(
        &WatermarkRenderer::builtin_only(),
        &BatchItem::from_path(&photo),
        &config,
        &options,
    )
    .unwrap();

    // 20x20 logo at round(80 * 0.05) = 4
    let result = image::open(&written).unwrap().to_rgb8();
    assert_eq!(*result.get_pixel(4, 4), Rgb([255, 0, 0]));
    assert_eq!(*result.get_pixel(23, 23), Rgb([255, 0, 0]));
    assert_eq!(*result.get_pixel(3, 3), Rgb([0, 0, 0]));
    assert_eq!(*result.get_pixel(24, 24), Rgb([0, 0, 0]));
}

#[test]
fn test_settings_default_watermark_is_usable() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load(dir.path());
    let config = WatermarkConfig::try_from(&settings.default_watermark).unwrap();
    assert_eq!(config.template_kind(), TemplateKind::Text);
    assert_eq!(config.opacity, 80);
}
