use std::fs::File;
use std::future::{self, Future};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures::executor::block_on;
use image::RgbaImage;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use paperloom::capture::{CaptureConfig, CaptureError, RasterSource, RegionRasterizer};
use paperloom::coords::{NormalizerConfig, PageGeometry, RectSetNormalizer, RenderPoint, RenderRect};
use paperloom::panic_handler;
use paperloom::settings;

#[derive(Parser, Debug)]
#[command(name = "paperloom")]
#[command(version, about = "Selection geometry and region capture diagnostics")]
struct Args {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize render-space rects into a document location (JSON)
    Normalize {
        /// JSON array of {x, y, width, height}
        #[arg(long)]
        rects: String,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        /// Rendered page width in pixels
        #[arg(long)]
        page_width: f64,
        /// Rendered page height in pixels
        #[arg(long)]
        page_height: f64,
        #[arg(long, default_value_t = 0)]
        page_index: usize,
        /// Use the looser text-line thresholds
        #[arg(long)]
        text: bool,
    },
    /// Cut a region out of a rendered page image
    Capture {
        #[arg(long)]
        image: PathBuf,
        /// Drag rectangle as x,y,w,h in render pixels
        #[arg(long, value_parser = parse_rect)]
        rect: RenderRect,
        /// Surface scroll offset as x,y
        #[arg(long, value_parser = parse_point, default_value = "0,0")]
        scroll: RenderPoint,
        #[arg(long, default_value_t = 1.0)]
        dpr: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the effective settings
    Config,
}

/// A page image on disk standing in for a rendering surface
struct ImageFileSource {
    raster: RgbaImage,
    dpr: f64,
    scroll: RenderPoint,
}

impl RasterSource for ImageFileSource {
    fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    fn scroll_offset(&self) -> RenderPoint {
        self.scroll
    }

    fn rasterize(&self) -> impl Future<Output = Result<RgbaImage, CaptureError>> {
        future::ready(Ok(self.raster.clone()))
    }
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    parts
        .try_into()
        .map_err(|_| format!("expected {N} comma-separated numbers"))
}

fn parse_rect(s: &str) -> Result<RenderRect, String> {
    let [x, y, w, h] = parse_numbers::<4>(s)?;
    Ok(RenderRect::new(x, y, w, h))
}

fn parse_point(s: &str) -> Result<RenderPoint, String> {
    let [x, y] = parse_numbers::<2>(s)?;
    Ok(RenderPoint::new(x, y))
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Normalize {
            rects,
            scale,
            page_width,
            page_height,
            page_index,
            text,
        } => {
            if scale <= 0.0 || page_height <= 0.0 {
                bail!("scale and page height must be positive");
            }
            let raw: Vec<RenderRect> =
                serde_json::from_str(&rects).context("--rects is not a JSON rect array")?;
            let config = if text {
                NormalizerConfig::text_from_settings()
            } else {
                NormalizerConfig::region_from_settings()
            };
            let page = PageGeometry::at_origin(page_width, page_height, scale);
            let location = RectSetNormalizer::new(config).locate(page_index, &raw, &page);
            println!("{}", serde_json::to_string_pretty(&location)?);
        }
        Command::Capture {
            image,
            rect,
            scroll,
            dpr,
            out,
        } => {
            let raster = image::open(&image)
                .with_context(|| format!("Failed to open {image:?}"))?
                .to_rgba8();
            let source = ImageFileSource {
                raster,
                dpr,
                scroll,
            };
            let rasterizer = RegionRasterizer::new(CaptureConfig::from_settings());
            match block_on(rasterizer.capture(&source, rect))? {
                Some(blob) => {
                    std::fs::write(&out, &blob.bytes)
                        .with_context(|| format!("Failed to write {out:?}"))?;
                    info!("Wrote {}x{} capture to {out:?}", blob.width, blob.height);
                    println!("{}x{} -> {}", blob.width, blob.height, out.display());
                }
                None => println!("Region below the capture minimum, nothing written"),
            }
        }
        Command::Config => {
            print!("{}", settings::current().to_yaml()?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(level, Config::default(), File::create("paperloom.log")?)?;
    panic_handler::initialize_panic_handler();

    info!("Starting paperloom {}", env!("CARGO_PKG_VERSION"));
    match &args.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }

    let result = run(args.command);
    if let Err(e) = &result {
        error!("{e:?}");
    }
    result
}
