// Watermark engine unit tests: placement, blending and stamp building

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use photo_watermark::watermark::position::anchor_position;
use photo_watermark::watermark::transform::rotate_expand;
use photo_watermark::watermark::*;
use rstest::rstest;
use tempfile::TempDir;

fn dims(w: u32, h: u32) -> (ImageDimensions, WatermarkDimensions) {
    (
        ImageDimensions { width: 800, height: 600 },
        WatermarkDimensions { width: w, height: h },
    )
}

#[rstest]
#[case(Anchor::TopLeft, 35, 28)]
#[case(Anchor::TopCenter, 350, 28)]
#[case(Anchor::TopRight, 665, 28)]
#[case(Anchor::CenterLeft, 35, 275)]
#[case(Anchor::Center, 350, 275)]
#[case(Anchor::CenterRight, 665, 275)]
#[case(Anchor::BottomLeft, 35, 523)]
#[case(Anchor::BottomCenter, 350, 523)]
#[case(Anchor::BottomRight, 665, 523)]
fn test_anchor_offsets(#[case] anchor: Anchor, #[case] x: i32, #[case] y: i32) {
    let (image, stamp) = dims(100, 50);
    assert_eq!(anchor_position(anchor, &image, &stamp), PlacementPosition::new(x, y));
}

#[test]
fn test_every_anchor_keeps_stamp_inside() {
    let (image, stamp) = dims(300, 200);
    for anchor in Anchor::ALL {
        let pos = resolve_position(&image, &stamp, Placement::Anchor(anchor));
        assert!(pos.x >= 0 && pos.y >= 0);
        assert!(pos.x as u32 + stamp.width <= image.width);
        assert!(pos.y as u32 + stamp.height <= image.height);
    }
}

#[test]
fn test_oversized_stamp_clamps_to_origin() {
    let (image, stamp) = dims(1000, 700);
    let pos = resolve_position(&image, &stamp, Placement::Anchor(Anchor::BottomRight));
    assert_eq!(pos, PlacementPosition::new(0, 0));
}

#[test]
fn test_custom_position_clamped() {
    let (image, stamp) = dims(100, 50);
    let pos = resolve_position(&image, &stamp, Placement::Custom { x: 790, y: -5 });
    assert_eq!(pos, PlacementPosition::new(700, 0));
}

#[test]
fn test_zero_alpha_stamp_is_noop() {
    let host = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([10, 20, 30])));
    let stamp = Stamp::new(RgbaImage::from_pixel(5, 5, Rgba([255, 0, 0, 0])));
    let out = composite(&host, &stamp, PlacementPosition::new(3, 3));
    assert!(out.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
}

#[test]
fn test_opaque_stamp_replaces_and_leaves_rest() {
    let host = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([10, 20, 30])));
    let stamp = Stamp::new(RgbaImage::from_pixel(4, 4, Rgba([200, 100, 50, 255])));
    let out = composite(&host, &stamp, PlacementPosition::new(16, 16));

    for (x, y, p) in out.enumerate_pixels() {
        if x >= 16 && y >= 16 {
            assert_eq!(*p, Rgba([200, 100, 50, 255]));
        } else {
            assert_eq!(*p, Rgba([10, 20, 30, 255]));
        }
    }
}

#[test]
fn test_text_stamp_with_missing_font_is_not_empty() {
    let builder = TextStampBuilder::new(FontResolver::new(vec![], vec!["No Such Font".into()]));
    let style = TextStyle {
        font_family: "Definitely Not Installed".to_string(),
        ..TextStyle::new("Hello")
    };
    let stamp = builder.render(&style, 80, 0.0).unwrap();
    assert!(stamp.width() > 0 && stamp.height() > 0);
    assert!(stamp.pixels().any(|p| p[3] > 0));
}

#[test]
fn test_rgb_logo_at_half_opacity() {
    let dir = TempDir::new().unwrap();
    let logo = dir.path().join("logo.png");
    RgbImage::from_pixel(40, 20, Rgb([0, 0, 255])).save(&logo).unwrap();

    let builder = ImageStampBuilder::new();
    let spec = ImageSpec { path: logo, scale: 1.0 };
    let stamp = builder.render(&spec, 50, 0.0, None).unwrap();
    assert_eq!(stamp.dimensions(), (40, 20));
    assert!(stamp.pixels().all(|p| p[3] == 127));
}

#[test]
fn test_square_rotated_45_grows() {
    let square = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
    let rotated = rotate_expand(&square, 45.0);
    for side in [rotated.width(), rotated.height()] {
        assert!((140..=143).contains(&side), "side {}", side);
    }
}

#[test]
fn test_renderer_returns_original_on_failure() {
    let renderer = WatermarkRenderer::builtin_only();
    let host = DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 40, Rgb([1, 2, 3])));
    let config = WatermarkConfig::image("/nonexistent/logo.png");

    assert!(renderer.try_apply(&host, &config).is_err());
    assert_eq!(renderer.apply(&host, &config).to_rgb8(), host.to_rgb8());
}

#[test]
fn test_text_on_transparent_host_keeps_corners_clear() {
    let host = RgbaImage::from_fn(400, 300, |x, y| {
        let (dx, dy) = (x as i64 - 200, y as i64 - 150);
        if dx * dx + dy * dy <= 60 * 60 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    let renderer = WatermarkRenderer::builtin_only();
    let out = renderer
        .try_apply(&DynamicImage::ImageRgba8(host), &WatermarkConfig::text("TEST"))
        .unwrap();

    assert_eq!(out.dimensions(), (400, 300));
    for (x, y) in [(0, 0), (399, 0), (0, 299)] {
        assert_eq!(out.get_pixel(x, y)[3], 0, "corner ({}, {})", x, y);
    }
    assert_eq!(*out.get_pixel(200, 150), Rgba([255, 0, 0, 255]));
    // Stamp sits in the bottom-right quadrant, clear of the disc
    assert!(out
        .enumerate_pixels()
        .any(|(x, y, p)| x > 300 && y > 225 && p[3] > 0));
}

#[test]
fn test_template_record_defaults() {
    let record: TemplateRecord = serde_json::from_str(r#"{"type": "text"}"#).unwrap();
    let config = WatermarkConfig::try_from(&record).unwrap();

    assert_eq!(config.opacity, 80);
    assert_eq!(config.placement, Placement::Anchor(Anchor::BottomRight));
    match config.kind {
        WatermarkKind::Text(style) => {
            assert_eq!(style.text, "Watermark");
            assert_eq!(style.font_size, 24);
            assert_eq!(style.color, Color::white());
        }
        WatermarkKind::Image(_) => panic!("expected a text watermark"),
    }
}

#[test]
fn test_custom_without_coordinates_is_bottom_right() {
    let record: TemplateRecord =
        serde_json::from_str(r#"{"type": "text", "position": "custom"}"#).unwrap();
    let config = WatermarkConfig::try_from(record).unwrap();
    assert_eq!(config.placement, Placement::Anchor(Anchor::BottomRight));
}

#[test]
fn test_preview_fit_and_drag() {
    assert_eq!(fit_to_canvas((800, 600), (1, 600)), PreviewFit::NotReady);

    let fit = fit_to_canvas((800, 600), (400, 400));
    let point = canvas_to_image(fit, (800, 600), (200, 200)).unwrap();
    assert_eq!(point, (400, 300));

    let mut drag = DragState::new();
    drag.begin(200, 200);
    assert!(drag.is_dragging());
    let placement = drag.motion(200, 200, fit, (800, 600)).unwrap();
    assert_eq!(placement, Placement::Custom { x: 400, y: 300 });
    drag.end();
    assert!(!drag.is_dragging());
}
