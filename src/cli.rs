// ============================================================================
// INKDESK CLI — headless processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   inkdesk cleanup -i scan.png -o clean.png --threshold 128
//   inkdesk cleanup -i scans/*.jpg --output-dir clean/ --style blue
//   inkdesk extract -i lineart.png -o lines.png --threshold 200
//   inkdesk compare --frame-a key1.png --frame-b key2.png --opacity 50 -o onion.png
//   inkdesk compare --frame-a key1.png --frame-b key2.png --flicker 8 --output-dir frames/
//
// All processing runs synchronously on the invoking thread; the per-pixel
// loops inside the ops parallelize across rows on their own.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::compare::{FrameSlot, LightTable, ViewMode};
use crate::io::{SaveFormat, encode_and_write, load_raster};
use crate::ops::cleanup::{InkStyle, cleanup};
use crate::ops::extract::extract_lines;
use crate::raster::Raster;
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// inkdesk headless sketch processor.
///
/// Clean up rough scans, extract line art onto transparency, and compare
/// keyframes, all without opening a window.
#[derive(Parser, Debug)]
#[command(
    name = "inkdesk",
    about = "Offline bitmap tools for hand-drawn animation",
    long_about = "Digitize hand-drawn animation frames from the terminal: threshold rough\n\
                  scans into clean line art, strip white paper into transparency for\n\
                  coloring, and render onion-skin or flicker comparisons of two keyframes.\n\n\
                  Example:\n  \
                  inkdesk cleanup -i scan.png -o clean.png --threshold 128\n  \
                  inkdesk extract -i scans/*.png --output-dir lines/ --threshold 200"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub tool: Tool,
}

#[derive(Subcommand, Debug)]
pub enum Tool {
    /// Threshold a rough scan into clean two-tone line art.
    Cleanup(CleanupArgs),
    /// Strip white paper into transparency, ready for coloring.
    Extract(ExtractArgs),
    /// Onion-skin or flicker-compare two keyframes.
    Compare(CompareArgs),
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Luminance cutoff separating ink from paper (0-255).
    /// Pixels averaging below this become ink; the rest become white paper.
    #[arg(short, long, default_value_t = 128, value_name = "0-255")]
    pub threshold: u8,

    /// Ink color: black, or non-photo blue for under-drawing.
    #[arg(short, long, value_enum, default_value_t = StyleArg::Bw)]
    pub style: StyleArg,

    #[command(flatten)]
    pub io: BatchIoArgs,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// White-removal cutoff (0-255). Pixels averaging above this are treated
    /// as paper and made transparent; higher values remove more light gray.
    #[arg(short, long, default_value_t = 200, value_name = "0-255")]
    pub threshold: u8,

    #[command(flatten)]
    pub io: BatchIoArgs,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Start keyframe (A).
    #[arg(long, value_name = "FILE")]
    pub frame_a: PathBuf,

    /// End keyframe (B). Must match frame A's dimensions.
    #[arg(long, value_name = "FILE")]
    pub frame_b: PathBuf,

    /// Onion-skin opacity of B over A, percent (0-100).
    #[arg(long, default_value_t = 50, value_name = "0-100")]
    pub opacity: u8,

    /// Render a flicker sequence instead of one onion-skin composite:
    /// writes COUNT alternating frames (A,B,A,...) to --output-dir.
    #[arg(long, value_name = "COUNT")]
    pub flicker: Option<u32>,

    /// Output file for the onion-skin composite.
    /// Defaults to "<frame A stem>_onion.png" next to frame A.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for --flicker frames.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Input/output arguments shared by the two batch transforms.
#[derive(Args, Debug)]
pub struct BatchIoArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "scans/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleArg {
    /// Pure black ink.
    Bw,
    /// Non-photo blue.
    Blue,
}

impl From<StyleArg> for InkStyle {
    fn from(s: StyleArg) -> Self {
        match s {
            StyleArg::Bw => InkStyle::BlackInk,
            StyleArg::Blue => InkStyle::NonPhotoBlue,
        }
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the selected tool and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    match args.tool {
        Tool::Cleanup(a) => {
            let threshold = a.threshold;
            let style: InkStyle = a.style.into();
            run_batch("cleanup", &a.io, &move |src| cleanup(src, threshold, style))
        }
        Tool::Extract(a) => {
            let threshold = a.threshold;
            run_batch("extract", &a.io, &move |src| extract_lines(src, threshold))
        }
        Tool::Compare(a) => run_compare(&a),
    }
}

// ============================================================================
// Batch transforms (cleanup / extract)
// ============================================================================

fn run_batch(tool: &str, io: &BatchIoArgs, op: &(dyn Fn(&Raster) -> Raster + Sync)) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&io.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && io.output.is_some() && io.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let format = parse_format(io.format.as_deref(), io.output.as_deref());
    if tool == "extract" && !format.preserves_alpha() {
        eprintln!(
            "warning: {} output cannot store transparency; extracted lines will sit on a flat background. Use png instead.",
            format.extension()
        );
    }

    // Create output directory if specified
    if let Some(dir) = &io.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || io.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            io.output.as_deref(),
            io.output_dir.as_deref(),
            format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(input_path, &output_path, op, format, io.quality) {
            Ok(()) => {
                log_info!("{}: {} -> {}", tool, input_path.display(), output_path.display());
                if io.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log_err!("{}: {}: {}", tool, input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn run_one(
    input: &Path,
    output: &Path,
    op: &(dyn Fn(&Raster) -> Raster + Sync),
    format: SaveFormat,
    quality: u8,
) -> Result<(), String> {
    let src = load_raster(input).map_err(|e| format!("load failed: {}", e))?;
    let result = op(&src);
    encode_and_write(&result, output, format, quality).map_err(|e| format!("save failed: {}", e))
}

// ============================================================================
// Keyframe comparison
// ============================================================================

fn run_compare(args: &CompareArgs) -> ExitCode {
    let start = Instant::now();

    let mut table = LightTable::new();
    table.set_opacity_percent(args.opacity.min(100));

    for (slot, path) in [(FrameSlot::A, &args.frame_a), (FrameSlot::B, &args.frame_b)] {
        let frame = match load_raster(path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        };
        if let Err(e) = table.set_frame(slot, frame) {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let outcome = match args.flicker {
        Some(count) => write_flicker_frames(&mut table, count, args.output_dir.as_deref()),
        None => write_onion_skin(&table, args),
    };

    match outcome {
        Ok(()) => {
            if args.verbose {
                println!("done ({:.0}ms)", start.elapsed().as_secs_f64() * 1000.0);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_err!("compare: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Write the blended onion-skin view to the requested (or derived) path.
fn write_onion_skin(table: &LightTable, args: &CompareArgs) -> Result<(), String> {
    let output = match &args.output {
        Some(p) => p.clone(),
        None => {
            let stem = args
                .frame_a
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("keyframe");
            let parent = args.frame_a.parent().unwrap_or(Path::new("."));
            parent.join(format!("{}_onion.png", stem))
        }
    };

    // Both frames are loaded, so display() always produces a composite.
    let composite = table.display().ok_or("no keyframes loaded")?;
    encode_and_write(&composite, &output, SaveFormat::Png, 90)?;
    log_info!("compare: onion skin -> {}", output.display());
    println!("→ {}", output.display());
    Ok(())
}

/// Drive the flicker alternation headlessly and dump the first `count`
/// displayed frames as a numbered PNG sequence.
fn write_flicker_frames(
    table: &mut LightTable,
    count: u32,
    output_dir: Option<&Path>,
) -> Result<(), String> {
    let dir = output_dir.ok_or("--flicker requires --output-dir for the frame sequence")?;
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("could not create output directory '{}': {}", dir.display(), e))?;

    table.set_mode(ViewMode::Flicker);
    for n in 0..count {
        let frame = table.display().ok_or("no keyframes loaded")?;
        let path = dir.join(format!("flicker_{:03}.png", n));
        encode_and_write(&frame, &path, SaveFormat::Png, 90)?;
        table.tick();
    }
    log_info!("compare: {} flicker frames -> {}", count, dir.display());
    println!("→ {} frames in {}", count, dir.display());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return match f.to_lowercase().as_str() {
            "jpeg" | "jpg" => SaveFormat::Jpeg,
            "webp"         => SaveFormat::Webp,
            "bmp"          => SaveFormat::Bmp,
            _              => SaveFormat::Png,
        };
    }

    if let Some(out) = output {
        return match out
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "jpg" | "jpeg" => SaveFormat::Jpeg,
            "webp"         => SaveFormat::Webp,
            "bmp"          => SaveFormat::Bmp,
            _              => SaveFormat::Png,
        };
    }

    SaveFormat::Png
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
