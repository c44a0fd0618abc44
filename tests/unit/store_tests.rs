// Template store and settings unit tests

use photo_watermark::store::*;
use photo_watermark::watermark::{
    Anchor, Placement, TemplateKind, TemplateRecord, WatermarkConfig, WatermarkKind,
};
use tempfile::TempDir;

#[test]
fn test_save_config_routes_by_kind() {
    let dir = TempDir::new().unwrap();
    let mut store = TemplateStore::open(dir.path()).unwrap();

    let text = WatermarkConfig::text("© Studio")
        .with_opacity(60)
        .with_placement(Placement::Custom { x: 12, y: 34 });
    store.save_config("studio", &text).unwrap();
    store
        .save_config("logo", &WatermarkConfig::image("/assets/logo.png").with_scale(0.5))
        .unwrap();

    assert_eq!(store.list(TemplateKind::Text), vec!["studio".to_string()]);
    assert_eq!(store.list(TemplateKind::Image), vec!["logo".to_string()]);

    let loaded = store.load_config(TemplateKind::Text, "studio").unwrap();
    assert_eq!(loaded.opacity, 60);
    assert_eq!(loaded.placement, Placement::Custom { x: 12, y: 34 });

    let logo = store.load_config(TemplateKind::Image, "logo").unwrap();
    match logo.kind {
        WatermarkKind::Image(spec) => assert_eq!(spec.scale, 0.5),
        WatermarkKind::Text(_) => panic!("expected an image watermark"),
    }
}

#[test]
fn test_export_then_import_into_fresh_store() {
    let source_dir = TempDir::new().unwrap();
    let target_dir = TempDir::new().unwrap();
    let exported = source_dir.path().join("share/studio.json");

    let mut source = TemplateStore::open(source_dir.path()).unwrap();
    source
        .save_config("studio", &WatermarkConfig::text("hello").with_anchor(Anchor::TopLeft))
        .unwrap();
    source.export_template(TemplateKind::Text, "studio", &exported).unwrap();

    let mut target = TemplateStore::open(target_dir.path()).unwrap();
    assert_eq!(target.import_templates(&exported).unwrap(), 1);
    let record = target.load(TemplateKind::Text, "studio").unwrap();
    assert_eq!(record.text, "hello");
    assert_eq!(record.position, "top_left");
}

#[test]
fn test_import_routes_mixed_records() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bundle.json");
    std::fs::write(
        &file,
        r#"{
            "sign": {"type": "text", "text": "Sig"},
            "badge": {"type": "image", "image_path": "/x/badge.png"},
            "  ": {"type": "text"}
        }"#,
    )
    .unwrap();

    let mut store = TemplateStore::open(&dir.path().join("store")).unwrap();
    assert_eq!(store.import_templates(&file).unwrap(), 2);
    assert_eq!(store.list(TemplateKind::Text), vec!["sign".to_string()]);
    assert_eq!(store.list(TemplateKind::Image), vec!["badge".to_string()]);
}

#[test]
fn test_import_rejects_invalid_json() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.json");
    std::fs::write(&file, "[1, 2").unwrap();

    let mut store = TemplateStore::open(dir.path()).unwrap();
    assert!(matches!(store.import_templates(&file), Err(StoreError::Json(_))));
}

#[test]
fn test_missing_template_errors() {
    let dir = TempDir::new().unwrap();
    let store = TemplateStore::open(dir.path()).unwrap();
    let err = store.load(TemplateKind::Image, "ghost").unwrap_err();
    assert_eq!(err.to_string(), "No image template named 'ghost'");
}

#[test]
fn test_settings_roundtrip() {
    let dir = TempDir::new().unwrap();
    let settings = Settings {
        last_output_folder: "/out".to_string(),
        last_input_folder: "/in".to_string(),
        last_watermark_template: Some("studio".to_string()),
        default_watermark: TemplateRecord {
            text: "Mine".to_string(),
            ..Default::default()
        },
    };
    settings.save(dir.path()).unwrap();

    assert_eq!(Settings::load(dir.path()), settings);
}
