// Export module unit tests: naming, formats, resize rules and reports

use photo_watermark::export::*;
use rstest::rstest;
use std::path::Path;

#[rstest]
#[case(NamingRule::Original, OutputFormat::Jpeg, "photo.jpg")]
#[case(NamingRule::Prefix(DEFAULT_PREFIX.to_string()), OutputFormat::Png, "wm_photo.png")]
#[case(NamingRule::Suffix(DEFAULT_SUFFIX.to_string()), OutputFormat::Jpeg, "photo_watermarked.jpg")]
#[case(NamingRule::Suffix("-x".to_string()), OutputFormat::Bmp, "photo-x.bmp")]
fn test_output_names(#[case] rule: NamingRule, #[case] format: OutputFormat, #[case] expected: &str) {
    assert_eq!(output_file_name(Path::new("in/photo.jpg"), &rule, format), expected);
}

#[test]
fn test_format_properties() {
    assert_eq!(OutputFormat::default(), OutputFormat::Jpeg);
    assert!(!OutputFormat::Jpeg.supports_transparency());
    assert!(OutputFormat::Png.supports_transparency());
    assert_eq!(OutputFormat::Tiff.to_string(), "tiff");
    assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
}

#[test]
fn test_default_options() {
    let options = ExportOptions::new("out");
    assert_eq!(options.quality, DEFAULT_QUALITY);
    assert_eq!(options.naming, NamingRule::Original);
    assert_eq!(options.format, OutputFormat::Jpeg);
    assert!(options.resize.is_none());
}

#[rstest]
#[case(ResizeRule::Percentage { percent: 50 }, (4000, 3000), (2000, 1500))]
#[case(ResizeRule::Percentage { percent: 33 }, (100, 100), (33, 33))]
#[case(ResizeRule::Percentage { percent: 200 }, (10, 5), (20, 10))]
#[case(ResizeRule::Exact { width: 1920, height: 1080 }, (4000, 3000), (1920, 1080))]
fn test_resize_targets(
    #[case] rule: ResizeRule,
    #[case] source: (u32, u32),
    #[case] expected: (u32, u32),
) {
    assert_eq!(rule.target_size(source.0, source.1), expected);
}

#[test]
fn test_report_summary_overflow() {
    let mut report = BatchReport::all_failed((0..12).map(|i| format!("img{}.jpg", i)).collect());
    report.success_count = 3;

    let summary = report.summary();
    assert!(summary.starts_with("Exported 3 image(s), 12 failed"));
    assert_eq!(summary.matches(".jpg").count(), 5);
    assert!(summary.ends_with("... 7 more"));
    assert_eq!(report.total(), 15);
}

#[test]
fn test_report_serializes() {
    let report = BatchReport {
        success_count: 2,
        failed_count: 1,
        failed_files: vec!["bad.jpg".to_string()],
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["success_count"], 2);
    assert_eq!(json["failed_files"][0], "bad.jpg");
}
