use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_model::{AnnotatorConfig, Color, ScreenPoint};
use pdf_engine::{DocumentWriter, LopdfWriter};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use storage::ConfigStore;
use viewer_core::{CaptureEvent, DocumentSession, StrokePad, Tool, Upload};

#[derive(Debug, Parser)]
#[command(name = "inkstamp-cli")]
#[command(about = "Annotate PDFs and bake the annotations into a copy")]
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
    /// Replay a gesture script against a PDF and export the annotated copy.
    Annotate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Directory holding config.json instead of the platform data dir.
        #[arg(long)]
        config_dir: Option<PathBuf>,
        /// Print the annotation listing before the output path.
        #[arg(long)]
        list: bool,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

/// Gesture script. Pointer positions are screen pixels; the current page is
/// rendered with its top-left corner at `origin`.
#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default)]
    origin: [f32; 2],
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Tool(Option<ToolName>),
    Color(String),
    Page(u32),
    Zoom(u16),
    Down([f32; 2]),
    Move([f32; 2]),
    Up([f32; 2]),
    /// Answer to the comment prompt; `null` cancels it.
    Comment(Option<String>),
    /// Strokes drawn on the signature pad, then saved.
    Sign(Vec<Vec<[f32; 2]>>),
    CancelSignature,
    /// Pick the n-th sidebar entry (0-based).
    Select(usize),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ToolName {
    Highlight,
    Underline,
    Comment,
    Signature,
}

impl From<ToolName> for Tool {
    fn from(name: ToolName) -> Self {
        match name {
            ToolName::Highlight => Tool::Highlight,
            ToolName::Underline => Tool::Underline,
            ToolName::Comment => Tool::Comment,
            ToolName::Signature => Tool::Signature,
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
        Commands::Annotate { file, script, output, config_dir, list } => {
            run_annotate(&file, &script, output.as_deref(), config_dir.as_deref(), list)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let writer = LopdfWriter::load(&bytes).context("failed to open PDF")?;

    let page_count = writer.page_count();
    let first_page_size_pt = if page_count > 0 {
        let size = writer.page_size(0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    Ok(())
}

fn run_annotate(
    file: &Path,
    script_path: &Path,
    output: Option<&Path>,
    config_dir: Option<&Path>,
    list: bool,
) -> Result<()> {
    ensure_pdf_exists(file)?;

    let config = load_config(config_dir)?;
    let script_bytes = fs::read(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let script: Script = serde_json::from_slice(&script_bytes)
        .with_context(|| format!("invalid gesture script {}", script_path.display()))?;

    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let page_count = LopdfWriter::load(&bytes).context("failed to open PDF")?.page_count();

    let name = file.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
    let upload = Upload { name, media_type: None, bytes };
    let mut session = DocumentSession::open(upload, config)
        .with_context(|| format!("not a PDF document: {}", file.display()))?;
    session.on_document_loaded(page_count);

    let origin = ScreenPoint::new(script.origin[0], script.origin[1]);
    for (index, step) in script.steps.into_iter().enumerate() {
        let event = apply_step(&mut session, origin, step)
            .with_context(|| format!("script step {index}"))?;
        log::debug!("step {index}: {event:?}");
    }

    let exported = session.export().context("failed to export annotated PDF")?;
    for skipped in &exported.report.skipped {
        eprintln!("warning: annotation {} skipped: {:?}", skipped.id, skipped.reason);
    }

    let output =
        output.map(ToOwned::to_owned).unwrap_or_else(|| file.with_file_name(&exported.file_name));
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, &exported.bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if list {
        for entry in session.sidebar() {
            let text = entry.text.as_deref().unwrap_or("");
            println!("{}\t{}\t{}\t{}", entry.page, entry.label, entry.color, text);
        }
    }
    println!("{}", output.display());

    Ok(())
}

fn apply_step(
    session: &mut DocumentSession,
    origin: ScreenPoint,
    step: Step,
) -> Result<CaptureEvent> {
    let surface = session.current_surface(origin);
    let point = |[x, y]: [f32; 2]| ScreenPoint::new(x, y);

    let event = match step {
        Step::Tool(tool) => {
            session.set_tool(tool.map(Tool::from));
            CaptureEvent::Ignored
        }
        Step::Color(hex) => {
            session.set_color(hex.parse::<Color>()?);
            CaptureEvent::Ignored
        }
        Step::Page(page) => {
            session.viewport_mut().go_to_page(page);
            CaptureEvent::Ignored
        }
        Step::Zoom(percent) => {
            session.viewport_mut().set_zoom_percent(percent);
            CaptureEvent::Ignored
        }
        Step::Down(at) => session.pointer_down(&surface, point(at)),
        Step::Move(at) => session.pointer_move(&surface, point(at)),
        Step::Up(at) => session.pointer_up(&surface, point(at)),
        Step::Comment(text) => session.submit_comment(text.as_deref()),
        Step::Sign(strokes) => {
            let mut pad = StrokePad::new(session.capture().color());
            for stroke in &strokes {
                let points: Vec<_> = stroke.iter().map(|[x, y]| (*x, *y)).collect();
                pad.draw_stroke(&points);
            }
            session.save_signature(&mut pad)
        }
        Step::CancelSignature => session.cancel_signature(),
        Step::Select(index) => {
            let entry = session
                .sidebar()
                .into_iter()
                .nth(index)
                .with_context(|| format!("no annotation at listing index {index}"))?;
            session.select_from_sidebar(entry.id);
            CaptureEvent::Selected(Some(entry.id))
        }
    };

    Ok(event)
}

fn load_config(config_dir: Option<&Path>) -> Result<AnnotatorConfig> {
    let store = ConfigStore::resolve(config_dir);
    store.load().with_context(|| match store.path() {
        Some(path) => format!("failed to load {}", path.display()),
        None => "failed to load config".to_owned(),
    })
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
