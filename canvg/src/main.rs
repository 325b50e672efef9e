use anyhow::{bail, Context};
use canvg_canvas2d::{Canvas2dContext, FontConfig};
use canvg_rs::{Canvg, CanvgOptions, ManualScheduler, RecordingContext};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Surface size used until the document states its own, matching an
/// unsized HTML canvas.
const DEFAULT_WIDTH: u32 = 300;
const DEFAULT_HEIGHT: u32 = 150;

/// canvg: A utility for rendering SVG documents to PNG images
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log render diagnostics at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an SVG file to a PNG image
    Render {
        /// Path to input SVG file
        #[arg(short, long)]
        input: String,

        /// Path to output PNG file to be created
        #[arg(short, long)]
        output: PathBuf,

        /// Output width in pixels. The drawing is fitted into it
        #[arg(long)]
        width: Option<f64>,

        /// Output height in pixels. Defaults to the width
        #[arg(long, requires = "width")]
        height: Option<f64>,

        /// Image scale factor applied after sizing
        #[arg(short, long, default_value = "1.0")]
        scale: f64,

        /// Pixels per inch stamped into the PNG
        #[arg(long)]
        ppi: Option<f32>,

        /// Additional directory of font files
        #[arg(long)]
        font_dir: Vec<PathBuf>,

        /// CSS color painted behind the drawing
        #[arg(short, long)]
        background: Option<String>,
    },

    /// Render an animated SVG file to a numbered PNG sequence
    Frames {
        /// Path to input SVG file
        #[arg(short, long)]
        input: String,

        /// Directory the frames are written to
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Number of frames to write
        #[arg(short, long, default_value = "30")]
        count: u32,

        /// Frames per second of animation time
        #[arg(long, default_value = "30")]
        fps: f64,
    },

    /// Print the drawing calls an SVG file produces
    Trace {
        /// Path to input SVG file
        #[arg(short, long)]
        input: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Render {
            input,
            output,
            width,
            height,
            scale,
            ppi,
            font_dir,
            background,
        } => render(
            &input,
            &output,
            RenderArgs {
                width,
                height,
                scale,
                ppi,
                font_dirs: font_dir,
                background,
            },
        ),
        Commands::Frames {
            input,
            output_dir,
            count,
            fps,
        } => frames(&input, &output_dir, count, fps),
        Commands::Trace { input } => trace(&input),
    }
}

struct RenderArgs {
    width: Option<f64>,
    height: Option<f64>,
    scale: f64,
    ppi: Option<f32>,
    font_dirs: Vec<PathBuf>,
    background: Option<String>,
}

fn new_surface(font_dirs: &[PathBuf]) -> anyhow::Result<Canvas2dContext> {
    let config = font_dirs
        .iter()
        .fold(FontConfig::default(), |config, dir| config.with_font_dir(dir.clone()));
    Ok(Canvas2dContext::builder(DEFAULT_WIDTH, DEFAULT_HEIGHT)
        .font_config(config)
        .build()?)
}

fn render(input: &str, output: &Path, args: RenderArgs) -> anyhow::Result<()> {
    if !(args.scale.is_finite() && args.scale > 0.0) {
        bail!("Scale must be a positive number, got {}", args.scale);
    }

    let ctx = new_surface(&args.font_dirs)?;
    let mut canvg = Canvg::from_source(ctx, input, CanvgOptions::default())
        .with_context(|| format!("Failed to load input file: {input}"))?;

    if let Some(width) = args.width {
        canvg.resize(width, args.height, Some("xMidYMid meet"));
    }
    canvg.render();

    if args.scale != 1.0 {
        let width = f64::from(canvg.context().width());
        let height = f64::from(canvg.context().height());
        // Pin the drawn coordinate system to the unscaled size first.
        canvg.resize(width, Some(height), None);
        let (width, height) = ((width * args.scale).round(), (height * args.scale).round());
        log::debug!(target: "canvg::render", "rescaling output to {width}x{height}");
        canvg.resize(width, Some(height), None);
        canvg.render();
    }

    let ctx = canvg.context_mut();
    if let Some(background) = &args.background {
        ctx.fill_background(background)
            .with_context(|| format!("Invalid background color: {background}"))?;
    }
    let png = ctx.to_png(args.ppi)?;
    std::fs::write(output, png)
        .with_context(|| format!("Failed to write PNG to {}", output.display()))?;
    Ok(())
}

fn frames(input: &str, output_dir: &Path, count: u32, fps: f64) -> anyhow::Result<()> {
    if !(fps.is_finite() && fps > 0.0) {
        bail!("Frames per second must be a positive number, got {fps}");
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let ctx = new_surface(&[])?;
    let options = CanvgOptions {
        enable_redraw: true,
        ignore_mouse: true,
        ..Default::default()
    };
    let mut canvg = Canvg::from_source(ctx, input, options)
        .with_context(|| format!("Failed to load input file: {input}"))?;
    canvg.ready();

    let host = ManualScheduler::new();
    canvg.start(host.clone());
    for index in 0..count {
        if index > 0 {
            host.advance(1000.0 / fps);
            canvg.tick();
        }
        let path = output_dir.join(format!("frame-{index:04}.png"));
        std::fs::write(&path, canvg.context().to_png(None)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    canvg.stop();
    log::info!(target: "canvg::screen", "wrote {count} frames to {}", output_dir.display());
    Ok(())
}

fn trace(input: &str) -> anyhow::Result<()> {
    let ctx = RecordingContext::new(DEFAULT_WIDTH, DEFAULT_HEIGHT);
    let mut canvg = Canvg::from_source(ctx, input, CanvgOptions::default())
        .with_context(|| format!("Failed to load input file: {input}"))?;
    canvg.render();
    for call in canvg.context().calls() {
        println!("{call:?}");
    }
    Ok(())
}
