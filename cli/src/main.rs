use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use canvas::config::ViewerConfig;
use canvas::engine::{Action, EngineCore};
use canvas::error::{RenderError, ViewerError};
use canvas::input::{InputEvent, InputState};
use canvas::io::{SaveOutcome, TextFileIo};
use canvas::render::FrameCapture;
use canvas::viewbox::Point;
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::Level;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("invalid event on line {line}: {source}")]
    InvalidEvent { line: usize, source: serde_json::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "svgline", about = "Inspect, annotate and replay line drawings")]
struct Cli {
    /// Edge length of the square drawing surface in pixels.
    #[arg(long, env = "SVGLINE_SURFACE_SIZE")]
    surface_size: Option<f64>,

    /// Scroll delta that would collapse the zoom factor to zero.
    #[arg(long, env = "SVGLINE_SCROLL_SENSITIVITY")]
    scroll_sensitivity: Option<f64>,

    /// JSON viewer config; flags above override it.
    #[arg(long, env = "SVGLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Most verbose level written to stderr (error, warn, info, debug, trace).
    #[arg(long, env = "SVGLINE_LOG", default_value_t = Level::INFO)]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the viewbox and segment counts of a document.
    Info { file: PathBuf },
    /// Append user segments and export the result.
    Add(AddArgs),
    /// Feed a JSON-lines event script through the input state machine.
    Replay(ReplayArgs),
    /// Dump the transform and render buffers of the initial frame.
    Frame { file: PathBuf },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Where to write the exported document.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Overwrite `--output` if it already exists.
    #[arg(long, default_value_t = false)]
    force: bool,
}

#[derive(Args, Debug)]
struct AddArgs {
    file: PathBuf,

    /// Segment endpoints in document space, as x1,y1,x2,y2. Repeatable.
    #[arg(long = "segment", required = true, value_parser = parse_segment)]
    segments: Vec<(Point, Point)>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    file: PathBuf,

    #[arg(long, default_value = "-", help = "Event script path, or - for stdin")]
    events: String,

    #[command(flatten)]
    output: OutputArgs,
}

/// Filesystem-backed document I/O.
///
/// Writes decline rather than clobber an existing target unless `force` is set.
struct FsIo {
    input: PathBuf,
    output: Option<PathBuf>,
    force: bool,
}

impl TextFileIo for FsIo {
    fn read_text_file(&mut self) -> Result<String, ViewerError> {
        fs::read_to_string(&self.input).map_err(|e| ViewerError::ReadFailure(format!("{}: {e}", self.input.display())))
    }

    fn write_text_file(&mut self, content: &str) -> Result<SaveOutcome, ViewerError> {
        let Some(output) = &self.output else {
            return Ok(SaveOutcome::Declined);
        };
        if output.exists() && !self.force {
            tracing::warn!(path = %output.display(), "output exists; pass --force to overwrite");
            return Ok(SaveOutcome::Declined);
        }
        fs::write(output, content).map_err(|e| ViewerError::WriteFailure(format!("{}: {e}", output.display())))?;
        Ok(SaveOutcome::Saved)
    }
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).with_writer(io::stderr).init();

    if let Err(error) = run(cli) {
        tracing::error!(%error, "command failed");
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Info { file } => run_info(config, file),
        Command::Add(args) => run_add(config, args),
        Command::Replay(args) => run_replay(config, args),
        Command::Frame { file } => run_frame(config, file),
    }
}

fn load_config(cli: &Cli) -> Result<ViewerConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::Io { path: path.display().to_string(), source })?;
            ViewerConfig::from_json(&text)?
        }
        None => ViewerConfig::default(),
    };
    if let Some(size) = cli.surface_size {
        config.surface_size = size;
    }
    if let Some(sensitivity) = cli.scroll_sensitivity {
        config.scroll_sensitivity = sensitivity;
    }
    config.validate()?;
    Ok(config)
}

fn open(config: ViewerConfig, files: &mut FsIo) -> Result<EngineCore, CliError> {
    let mut core = EngineCore::new(config);
    core.open(files)?;
    Ok(core)
}

fn run_info(config: ViewerConfig, file: PathBuf) -> Result<(), CliError> {
    let mut files = FsIo { input: file, output: None, force: false };
    let core = open(config, &mut files)?;
    print_json(&summary(&core))
}

fn run_add(config: ViewerConfig, args: AddArgs) -> Result<(), CliError> {
    let mut files = FsIo { input: args.file, output: args.output.output, force: args.output.force };
    let mut core = open(config, &mut files)?;
    for (a, b) in args.segments {
        core.add_user_segment(a, b);
    }
    export(&core, &mut files)?;
    print_json(&summary(&core))
}

fn run_replay(config: ViewerConfig, args: ReplayArgs) -> Result<(), CliError> {
    let mut files = FsIo { input: args.file, output: args.output.output, force: args.output.force };
    let mut core = open(config, &mut files)?;

    let reader: Box<dyn BufRead> = if args.events == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.events).map_err(|source| CliError::Io { path: args.events.clone(), source })?;
        Box::new(BufReader::new(file))
    };

    let mut replayed = 0_usize;
    let mut renders = 0_usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| CliError::Io { path: args.events.clone(), source })?;
        let Some(event) = parse_event_line(&line, index + 1)? else {
            continue;
        };
        let actions = core.handle_event(&event);
        renders += actions.iter().filter(|a| matches!(a, Action::RenderNeeded)).count();
        replayed += 1;
    }
    tracing::info!(replayed, renders, "event script replayed");

    export(&core, &mut files)?;
    let mut out = summary(&core);
    out["replayed"] = json!(replayed);
    out["renders"] = json!(renders);
    out["state"] = json!(state_name(&core.input));
    print_json(&out)
}

fn run_frame(config: ViewerConfig, file: PathBuf) -> Result<(), CliError> {
    let mut files = FsIo { input: file, output: None, force: false };
    let core = open(config, &mut files)?;
    let mut capture = FrameCapture::new();
    let drawn = core.render(&mut capture)?;
    print_json(&json!({
        "viewbox": core.viewbox(),
        "segments": drawn,
        "frame": capture,
    }))
}

fn export(core: &EngineCore, files: &mut FsIo) -> Result<(), CliError> {
    if files.output.is_none() {
        return Ok(());
    }
    if core.export(files)? == SaveOutcome::Declined {
        tracing::warn!("export skipped");
    }
    Ok(())
}

fn summary(core: &EngineCore) -> Value {
    let (source, user, renderable) = core
        .scene()
        .map_or((0, 0, 0), |s| (s.source_segments().len(), s.user_segments().len(), s.renderable_count()));
    json!({
        "viewbox": core.viewbox(),
        "original_viewbox": core.original_viewbox(),
        "source_segments": source,
        "user_segments": user,
        "renderable_segments": renderable,
    })
}

fn state_name(state: &InputState) -> &'static str {
    match state {
        InputState::Idle => "idle",
        InputState::Dragging { .. } => "dragging",
        InputState::PlacingSegment { .. } => "placing_segment",
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn parse_segment(raw: &str) -> Result<(Point, Point), String> {
    let invalid = || format!("invalid segment `{raw}`; expected x1,y1,x2,y2");
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    match values.as_slice() {
        [x1, y1, x2, y2] if values.iter().all(|v| v.is_finite()) => Ok((Point::new(*x1, *y1), Point::new(*x2, *y2))),
        _ => Err(invalid()),
    }
}

/// Blank lines and `#` comments are skipped.
fn parse_event_line(line: &str, line_no: usize) -> Result<Option<InputEvent>, CliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| CliError::InvalidEvent { line: line_no, source })
}
