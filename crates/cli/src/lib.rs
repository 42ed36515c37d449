use annotation_model::{ImageAnnotation, Rect, Size, StampImage};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use editor_core::{EditorConfig, GestureEvent, Overlay, PageSession, PageViewport};
use pdf_engine::{blank_document, default_engine, OpenSource, PageSize, PdfEngine};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use storage::Storage;

/// Overrides the directory the editor config is read from and written to
pub const CONFIG_DIR_ENV: &str = "STAMPKIT_CONFIG_DIR";

#[derive(Debug, Parser)]
#[command(name = "stampkit")]
#[command(about = "Place image stamps on PDF pages")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Write a PDF with empty pages.
    Blank {
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        #[arg(long, default_value_t = 1)]
        pages: u32,
        #[arg(long, default_value_t = 612.0)]
        width: f32,
        #[arg(long, default_value_t = 792.0)]
        height: f32,
    },
    /// Place an image sticker on a page, replay gestures on it and commit it as a stamp.
    Stamp {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// JSON array of gesture events, in overlay coordinates
        #[arg(long)]
        script: Option<PathBuf>,
        #[arg(long, default_value_t = 400.0)]
        view_width: f32,
        #[arg(long, default_value_t = 800.0)]
        view_height: f32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective editor configuration.
    Config {
        /// Write the default configuration to the config directory
        #[arg(long)]
        init: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    page_sizes_pt: Vec<PageSizeOutput>,
    annotation_counts: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct StampOutput {
    output: String,
    page: u32,
    annotations: Vec<AnnotationOutput>,
}

#[derive(Debug, Serialize)]
struct AnnotationOutput {
    id: String,
    bounds: Rect,
    rotation: f32,
}

impl From<&ImageAnnotation> for AnnotationOutput {
    fn from(annotation: &ImageAnnotation) -> Self {
        Self {
            id: annotation.id().to_string(),
            bounds: annotation.bounds(),
            rotation: annotation.rotation(),
        }
    }
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Blank { output, pages, width, height } => run_blank(&output, pages, width, height),
        Commands::Stamp { file, image, page, script, view_width, view_height, output } => {
            run_stamp(StampArgs {
                file: &file,
                image: &image,
                page,
                script: script.as_deref(),
                view_size: Size::new(view_width, view_height),
                output: output.as_deref(),
            })
        }
        Commands::Config { init } => run_config(init),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let mut page_sizes_pt = Vec::with_capacity(page_count as usize);
    let mut annotation_counts = Vec::with_capacity(page_count as usize);
    for page_index in 0..page_count {
        let size = engine.page_size(handle, page_index)?;
        page_sizes_pt.push(PageSizeOutput { width: size.width_pt, height: size.height_pt });
        annotation_counts.push(engine.annotation_count(handle, page_index)?);
    }

    let payload = InfoOutput {
        path: file.display().to_string(),
        page_count,
        page_sizes_pt,
        annotation_counts,
    };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    engine.close(handle)?;

    Ok(())
}

fn run_blank(output: &Path, pages: u32, width: f32, height: f32) -> Result<()> {
    if pages == 0 {
        anyhow::bail!("--pages must be >= 1");
    }
    if !(width > 0.0 && height > 0.0) {
        anyhow::bail!("page size must be positive, got {width}x{height}");
    }

    let sizes = vec![PageSize { width_pt: width, height_pt: height }; pages as usize];
    let bytes = blank_document(&sizes).context("failed to build PDF")?;

    write_creating_parent(output, &bytes)?;
    println!("{}", output.display());

    Ok(())
}

struct StampArgs<'a> {
    file: &'a Path,
    image: &'a Path,
    page: u32,
    script: Option<&'a Path>,
    view_size: Size,
    output: Option<&'a Path>,
}

fn run_stamp(args: StampArgs<'_>) -> Result<()> {
    ensure_pdf_exists(args.file)?;

    if args.page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }
    let page_index = args.page - 1;

    let config = load_config()?;

    let image_bytes = fs::read(args.image)
        .with_context(|| format!("failed to read image {}", args.image.display()))?;
    let image = StampImage::decode(&image_bytes).context("failed to decode image")?;

    let events = match args.script {
        Some(path) => read_script(path)?,
        None => Vec::new(),
    };

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(args.file)).context("failed to open PDF")?;
    let page_size = engine.page_size(handle, page_index)?;

    let viewport = PageViewport::fit(
        args.view_size,
        Size::new(page_size.width_pt, page_size.height_pt),
    );
    let mut session = PageSession::new(page_index, viewport);
    let mut overlay = Overlay::new(viewport.overlay_bounds(), config);

    overlay.add_pending_annotation(image);
    for event in events {
        overlay.dispatch(event, &mut session);
    }
    if overlay.has_active_sticker() {
        overlay.commit(&mut session);
    }

    log::info!("committing {} annotations to page {}", session.annotations.len(), args.page);
    engine
        .add_image_stamps(handle, page_index, session.annotations.as_slice())
        .context("failed to write stamps")?;

    let output = args
        .output
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_stamped_output(args.file));
    let bytes = engine.save(handle).context("failed to serialize PDF")?;
    write_creating_parent(&output, &bytes)?;

    let payload = StampOutput {
        output: output.display().to_string(),
        page: args.page,
        annotations: session.annotations.iter().map(AnnotationOutput::from).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);

    engine.close(handle)?;

    Ok(())
}

fn run_config(init: bool) -> Result<()> {
    let storage = config_storage()?;

    let config = if init {
        let config = EditorConfig::default();
        let path = storage.save_config(&config).context("failed to write config")?;
        eprintln!("wrote {}", path.display());
        config
    } else {
        storage.load_config().context("failed to load config")?
    };

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn config_storage() -> Result<Storage> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => Ok(Storage::with_root(PathBuf::from(dir))),
        None => Storage::from_default_project().context("failed to resolve config directory"),
    }
}

fn load_config() -> Result<EditorConfig> {
    match config_storage() {
        Ok(storage) => storage.load_config().context("failed to load config"),
        Err(error) => {
            log::warn!("{error:#}; using default editor config");
            Ok(EditorConfig::default())
        }
    }
}

fn read_script(path: &Path) -> Result<Vec<GestureEvent>> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read gesture script {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("invalid gesture script {}", path.display()))
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn write_creating_parent(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

fn default_stamped_output(file: &Path) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("document");

    file.with_file_name(format!("{stem}-stamped.pdf"))
}
