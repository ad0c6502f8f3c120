use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use retouch_core::encode::write_export;
use retouch_core::transform::apply_crop;
use retouch_core::{
    decode_file, render_reference, Draft, EditorConfig, ExportFormat, FilterType, PixelBuffer,
    RenderIntent,
};
use retouch_gpu::{Editor, EditorError, GpuError};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "retouch")]
#[command(version, about = "Apply Retouch edits to images", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an image with its edit draft
    Render {
        /// Source image
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Draft file (defaults to the sidecar next to INPUT, if any)
        #[arg(short, long, value_name = "FILE")]
        draft: Option<PathBuf>,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Output format (png or jpeg)
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<ExportFormat>,

        /// Editor configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Also write a thumbnail of the result
        #[arg(long, value_name = "FILE")]
        thumbnail: Option<PathBuf>,

        /// Render on the CPU instead of the GPU
        #[arg(long)]
        cpu: bool,
    },

    /// List the filter catalog
    Filters,

    /// Print an unedited draft for INPUT
    DraftTemplate {
        /// Source image
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}

struct RenderArgs {
    input: PathBuf,
    draft: Option<PathBuf>,
    out: Option<PathBuf>,
    format: Option<ExportFormat>,
    config: Option<PathBuf>,
    thumbnail: Option<PathBuf>,
    cpu: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Render {
            input,
            draft,
            out,
            format,
            config,
            thumbnail,
            cpu,
        } => cmd_render(RenderArgs {
            input,
            draft,
            out,
            format,
            config,
            thumbnail,
            cpu,
        })
        .map(|path| println!("Wrote {}", path.display())),
        Commands::Filters => {
            cmd_filters();
            Ok(())
        }
        Commands::DraftTemplate { input } => cmd_draft_template(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_render(args: RenderArgs) -> Result<PathBuf, String> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path).map_err(|e| e.to_string())?,
        None => EditorConfig::default(),
    };

    let draft = match &args.draft {
        Some(path) => Some(Draft::load(path).map_err(|e| e.to_string())?),
        None => Draft::load_for(&args.input).map_err(|e| e.to_string())?,
    };
    if let Some(draft) = &draft {
        debug!(filter = %draft.filter(), "using draft");
    }

    let format = args
        .format
        .or_else(|| {
            args.out
                .as_ref()
                .and_then(|p| p.extension())
                .and_then(|e| ExportFormat::from_extension(&e.to_string_lossy()))
        })
        .unwrap_or(config.export_format);
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input, format));

    let source = decode_file(&args.input).map_err(|e| e.to_string())?;
    info!(
        input = %args.input.display(),
        width = source.width,
        height = source.height,
        "decoded source"
    );

    let pixels = if args.cpu {
        render_cpu(&source, draft.as_ref(), &config)
    } else {
        match render_gpu(source.clone(), draft.as_ref(), &config) {
            Ok(pixels) => pixels,
            Err(EditorError::Gpu(e @ (GpuError::NoAdapter | GpuError::DeviceRequest(_)))) => {
                warn!(error = %e, "GPU unavailable, rendering on the CPU");
                render_cpu(&source, draft.as_ref(), &config)
            }
            Err(e) => return Err(e.to_string()),
        }
    };

    write_export(&pixels, &out, format, config.jpeg_quality).map_err(|e| e.to_string())?;

    if let Some(path) = &args.thumbnail {
        let thumb = retouch_core::decode::generate_thumbnail(&pixels, config.thumbnail_max_dim)
            .map_err(|e| e.to_string())?;
        write_export(&thumb, path, ExportFormat::Png, config.jpeg_quality)
            .map_err(|e| e.to_string())?;
    }

    Ok(out)
}

fn render_gpu(
    source: PixelBuffer,
    draft: Option<&Draft>,
    config: &EditorConfig,
) -> Result<PixelBuffer, EditorError> {
    let editor = Editor::open_buffer(source, draft, config.clone(), (0, 0))?;
    let pixels = editor.export()?;
    editor.close();
    Ok(pixels)
}

fn render_cpu(source: &PixelBuffer, draft: Option<&Draft>, config: &EditorConfig) -> PixelBuffer {
    let Some(draft) = draft else {
        return render_reference(source, &RenderIntent::default());
    };

    let cropped = draft.crop().and_then(|rect| match apply_crop(source, &rect) {
        Ok((buffer, _)) => Some(buffer),
        Err(e) => {
            warn!(error = %e, "draft crop could not be applied");
            None
        }
    });
    let intent = draft_intent(draft, config);
    render_reference(cropped.as_ref().unwrap_or(source), &intent)
}

fn draft_intent(draft: &Draft, config: &EditorConfig) -> RenderIntent {
    RenderIntent {
        filter: draft.filter(),
        grayscale: draft.is_grayscale_enabled,
        adjustments: draft.adjustments.sanitized(),
        view: draft.view(config.zoom_limits()),
    }
}

fn default_output_path(input: &Path, format: ExportFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}_retouch.{}", format.extension()))
}

fn cmd_filters() {
    println!("{:<3} {:<12} {:<12} ADJUSTMENTS", "#", "NAME", "DISPLAY");
    for filter in FilterType::ALL {
        println!(
            "{:<3} {:<12} {:<12} {}",
            filter.ordinal(),
            filter.name(),
            filter.display_name(),
            if filter.supports_adjustments() { "yes" } else { "no" }
        );
    }
}

fn cmd_draft_template(input: &Path) -> Result<(), String> {
    let draft = Draft::new(&input.to_string_lossy());
    let json = draft.to_json().map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
