use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use photo_watermark::config::AppConfig;
use photo_watermark::export::{
    check_output_folder, BatchReport, ExportError, ExportJob, ExportWorker, NamingRule,
    OutputFormat, ResizeRule,
};
use photo_watermark::library::ImageLibrary;
use photo_watermark::logging::{init_subscriber, LogFormat};
use photo_watermark::store::{Settings, TemplateStore};
use photo_watermark::watermark::{
    Anchor, Placement, TemplateKind, TemplateRecord, WatermarkConfig, WatermarkRenderer,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Photo Watermark - batch text and image watermarking for photos
#[derive(Parser, Debug)]
#[command(name = "photo-watermark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (pretty or json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark photos and export them to a folder
    Apply(ApplyArgs),

    /// Render a downscaled watermarked preview of one photo
    Preview {
        input: PathBuf,
        output: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,

        #[arg(long)]
        max_width: Option<u32>,

        #[arg(long)]
        max_height: Option<u32>,
    },

    /// Manage saved templates
    #[command(subcommand)]
    Templates(TemplatesCommand),
}

#[derive(clap::Args, Debug)]
struct ApplyArgs {
    /// Photo files or folders (folders are not searched recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output folder
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    watermark: WatermarkArgs,

    #[arg(long, value_enum)]
    naming: Option<NamingArg>,

    /// Prefix for `--naming prefix` (default wm_)
    #[arg(long)]
    prefix: Option<String>,

    /// Suffix for `--naming suffix` (default _watermarked)
    #[arg(long)]
    suffix: Option<String>,

    /// Output format: jpeg, png, bmp or tiff
    #[arg(long)]
    format: Option<OutputFormat>,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Resize to a percentage of the original size
    #[arg(long, conflicts_with = "resize")]
    resize_percent: Option<u32>,

    /// Resize to an exact WIDTH HEIGHT
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    resize: Option<Vec<u32>>,

    /// Allow writing into a folder that holds source photos
    #[arg(short, long)]
    yes: bool,
}

/// Where the watermark configuration comes from, in order of precedence:
/// a template file, a saved template, ad-hoc text or image, then the
/// default watermark from the settings.
#[derive(clap::Args, Debug, Default)]
struct WatermarkArgs {
    /// Saved template name
    #[arg(short, long)]
    template: Option<String>,

    /// Template set to look the name up in
    #[arg(long, value_enum, default_value = "text")]
    kind: KindArg,

    /// JSON template file (a record or an exported `{name: record}` map)
    #[arg(long, conflicts_with = "template")]
    template_file: Option<PathBuf>,

    /// Ad-hoc text watermark
    #[arg(long, conflicts_with_all = ["template", "template_file", "image"])]
    text: Option<String>,

    /// Ad-hoc image watermark
    #[arg(long, conflicts_with_all = ["template", "template_file"])]
    image: Option<PathBuf>,

    /// Override opacity (0-100)
    #[arg(long)]
    opacity: Option<u8>,

    /// Override rotation in degrees, counter-clockwise
    #[arg(long, allow_negative_numbers = true)]
    rotation: Option<f32>,

    /// Override position (anchor name such as bottom_right)
    #[arg(long)]
    position: Option<String>,
}

#[derive(Subcommand, Debug)]
enum TemplatesCommand {
    /// List saved template names
    List {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Print a template as JSON
    Show {
        name: String,
        #[arg(long, value_enum, default_value = "text")]
        kind: KindArg,
    },
    /// Save a watermark under a name
    Save {
        name: String,
        #[command(flatten)]
        watermark: WatermarkArgs,
    },
    /// Delete a template
    Delete {
        name: String,
        #[arg(long, value_enum, default_value = "text")]
        kind: KindArg,
    },
    /// Merge templates from an exported JSON file
    Import { file: PathBuf },
    /// Write one template to a JSON file
    Export {
        name: String,
        file: PathBuf,
        #[arg(long, value_enum, default_value = "text")]
        kind: KindArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum KindArg {
    #[default]
    Text,
    Image,
}

impl From<KindArg> for TemplateKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Text => TemplateKind::Text,
            KindArg::Image => TemplateKind::Image,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NamingArg {
    Original,
    Prefix,
    Suffix,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_subscriber(args.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        config_file = ?args.config.as_ref().map(|p| p.display().to_string()),
        store = %config.store.directory.display(),
        font_directories = config.fonts.directories.len(),
        "Configuration loaded"
    );

    match args.command {
        Command::Apply(apply) => run_apply(&config, apply).await,
        Command::Preview {
            input,
            output,
            watermark,
            max_width,
            max_height,
        } => run_preview(&config, &input, &output, &watermark, max_width, max_height),
        Command::Templates(cmd) => run_templates(&config, cmd),
    }
}

fn read_template_file(path: &Path) -> Result<TemplateRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file {}", path.display()))?;

    if let Ok(map) = serde_json::from_str::<BTreeMap<String, TemplateRecord>>(&raw) {
        if let Some(record) = map.into_values().next() {
            return Ok(record);
        }
    }
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid template file {}", path.display()))
}

fn resolve_watermark(config: &AppConfig, args: &WatermarkArgs) -> Result<WatermarkConfig> {
    let mut watermark = if let Some(file) = &args.template_file {
        WatermarkConfig::try_from(read_template_file(file)?)?
    } else if let Some(name) = &args.template {
        TemplateStore::open(&config.store.directory)?.load_config(args.kind.into(), name)?
    } else if let Some(text) = &args.text {
        WatermarkConfig::text(text.clone())
    } else if let Some(image) = &args.image {
        WatermarkConfig::image(image.clone())
    } else {
        let settings = Settings::load(&config.store.directory);
        WatermarkConfig::try_from(&settings.default_watermark)
            .context("Default watermark in settings is invalid")?
    };

    if let Some(opacity) = args.opacity {
        watermark = watermark.with_opacity(opacity);
    }
    if let Some(rotation) = args.rotation {
        watermark = watermark.with_rotation(rotation);
    }
    if let Some(position) = &args.position {
        let anchor = Anchor::from_name(position)
            .with_context(|| format!("Unknown position '{}'", position))?;
        watermark = watermark.with_placement(Placement::Anchor(anchor));
    }

    watermark.validate()?;
    Ok(watermark)
}

async fn run_apply(config: &AppConfig, args: ApplyArgs) -> Result<()> {
    let watermark = resolve_watermark(config, &args.watermark)?;

    let mut library = ImageLibrary::new();
    let mut unreadable = Vec::new();
    for input in &args.inputs {
        if input.is_dir() {
            let added = library.add_folder(input);
            tracing::info!(folder = %input.display(), added, "Folder loaded");
        } else if let Err(e) = library.add_image(input) {
            tracing::warn!(path = %input.display(), error = %e, "Skipping image");
            unreadable.push(
                input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| input.display().to_string()),
            );
        }
    }

    if library.is_empty() && unreadable.is_empty() {
        bail!("No supported images found in the given inputs");
    }

    match check_output_folder(&args.output, &library.paths(), args.yes) {
        Err(ExportError::RequiresConfirmation(dir)) => bail!(
            "Output folder {} contains source photos; pass --yes to write there anyway",
            dir.display()
        ),
        other => other?,
    }

    let mut options = config.export_options(&args.output);
    if let Some(naming) = args.naming {
        options.naming = match naming {
            NamingArg::Original => NamingRule::Original,
            NamingArg::Prefix => NamingRule::from_parts("prefix", args.prefix.as_deref())
                .unwrap_or(NamingRule::Original),
            NamingArg::Suffix => NamingRule::from_parts("suffix", args.suffix.as_deref())
                .unwrap_or(NamingRule::Original),
        };
    }
    if let Some(format) = args.format {
        options.format = format;
    }
    if let Some(quality) = args.quality {
        options.quality = quality;
    }
    options.resize = match (args.resize_percent, args.resize.as_deref()) {
        (Some(percent), _) => Some(ResizeRule::Percentage { percent }),
        (None, Some([width, height])) => Some(ResizeRule::Exact {
            width: *width,
            height: *height,
        }),
        _ => None,
    };
    options.validate()?;

    let renderer = Arc::new(WatermarkRenderer::new(config.font_resolver()));
    let worker = ExportWorker::spawn(renderer);
    let handle = worker.submit(ExportJob {
        items: library.batch_items(),
        config: watermark.clone(),
        options,
    })?;
    let mut report = handle.wait().await?;
    worker.shutdown().await?;

    merge_unreadable(&mut report, unreadable);
    println!("{}", report.summary());

    remember_run(config, &args, &watermark);
    Ok(())
}

fn merge_unreadable(report: &mut BatchReport, unreadable: Vec<String>) {
    report.failed_count += unreadable.len();
    report.failed_files.extend(unreadable);
}

fn remember_run(config: &AppConfig, args: &ApplyArgs, watermark: &WatermarkConfig) {
    let mut settings = Settings::load(&config.store.directory);
    settings.last_output_folder = args.output.display().to_string();
    if let Some(first) = args.inputs.first() {
        let folder = if first.is_dir() {
            first.as_path()
        } else {
            first.parent().unwrap_or(first.as_path())
        };
        settings.last_input_folder = folder.display().to_string();
    }
    if let Some(name) = &args.watermark.template {
        settings.last_watermark_template = Some(name.clone());
    }
    settings.default_watermark = watermark.to_record();

    if let Err(e) = settings.save(&config.store.directory) {
        tracing::warn!(error = %e, "Failed to save settings");
    }
}

fn run_preview(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    args: &WatermarkArgs,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> Result<()> {
    let watermark = resolve_watermark(config, args)?;

    let mut library = ImageLibrary::new();
    let entry = library
        .add_image(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    let (default_w, default_h) = config.preview_size();
    let max_size = (max_width.unwrap_or(default_w), max_height.unwrap_or(default_h));

    let renderer = WatermarkRenderer::new(config.font_resolver());
    let preview = renderer.render_preview(&entry.image, &watermark, max_size);

    let format = output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<OutputFormat>().ok())
        .unwrap_or(OutputFormat::Png);
    photo_watermark::export::save_image(
        &image::DynamicImage::ImageRgba8(preview),
        output,
        format,
        config.export.quality,
    )
    .with_context(|| format!("Failed to write preview {}", output.display()))?;

    println!("Preview written to {}", output.display());
    Ok(())
}

fn run_templates(config: &AppConfig, cmd: TemplatesCommand) -> Result<()> {
    let mut store = TemplateStore::open(&config.store.directory)?;

    match cmd {
        TemplatesCommand::List { kind } => {
            let kinds = match kind {
                Some(kind) => vec![kind.into()],
                None => vec![TemplateKind::Text, TemplateKind::Image],
            };
            for kind in kinds {
                for name in store.list(kind) {
                    println!("{}\t{}", kind.as_str(), name);
                }
            }
        }
        TemplatesCommand::Show { name, kind } => {
            let record = store.load(kind.into(), &name)?;
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        TemplatesCommand::Save { name, watermark } => {
            let resolved = resolve_watermark(config, &watermark)?;
            store.save_config(&name, &resolved)?;
            println!("Saved {} template '{}'", resolved.template_kind().as_str(), name.trim());
        }
        TemplatesCommand::Delete { name, kind } => {
            store.delete(kind.into(), &name)?;
            println!("Deleted '{}'", name);
        }
        TemplatesCommand::Import { file } => {
            let count = store.import_templates(&file)?;
            println!("Imported {} template(s)", count);
        }
        TemplatesCommand::Export { name, file, kind } => {
            store.export_template(kind.into(), &name, &file)?;
            println!("Exported '{}' to {}", name, file.display());
        }
    }

    Ok(())
}
