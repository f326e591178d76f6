//! Command-line front-end
//!
//! `inkpage replay` loads a document, replays a JSON session script against
//! it and exports the result. `inkpage config` prints the effective editor
//! configuration.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::config::{EditorConfig, StampPreset};
use crate::domain::{
    Alignment, Color, ImagePatch, ObjectId, ObjectKind, Point, Selection, TextPatch, ViewTransform,
};
use crate::services::{
    CommandLanguageModel, DocumentEncoder, DocumentSource, ImageDirRasterizer, JsonLayoutService,
    LanguageModel, PageRasterizer, PdfImageEncoder, TextLayoutService,
};
use crate::session::{EditorMsg, KeyCommand, ObjectMsg, PointerAction, StyleMsg, Tool};
use crate::workbench::{Collaborators, Workbench};

#[derive(Debug, Parser)]
#[command(name = "inkpage")]
#[command(about = "Annotate rasterized document pages and flatten the result")]
pub struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay a session script against a document and export it.
    Replay {
        /// Page image, or a directory of page images
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,
        /// JSON array of session steps
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
        /// Where to write the exported PDF
        #[arg(long, short)]
        output: PathBuf,
        /// Text layout sidecar; defaults to layout.json next to the document
        #[arg(long, value_name = "FILE")]
        layout: Option<PathBuf>,
    },
    /// Print the effective configuration.
    Config {
        /// Print the configuration file location instead
        #[arg(long)]
        path: bool,
    },
}

/// The object a script step acts on; defaults to the current selection
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Target {
    pub id: Option<ObjectId>,
    pub kind: Option<ObjectKind>,
}

/// One step of a session script
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum ScriptStep {
    Tool { tool: Tool },
    Page { index: usize },
    /// Display geometry of the active page, for pointer mapping
    View { origin: Point, width: f32, height: f32 },
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
    /// A full down-move-up gesture through the given points
    Stroke { points: Vec<Point> },
    Click { x: f32, y: f32 },
    Key { key: ScriptKey },
    Select {
        #[serde(flatten)]
        target: Target,
    },
    Deselect,
    UpdateText {
        #[serde(flatten)]
        target: Target,
        patch: TextPatch,
    },
    UpdateImage {
        #[serde(flatten)]
        target: Target,
        patch: ImagePatch,
    },
    Remove {
        #[serde(flatten)]
        target: Target,
    },
    ToFront {
        #[serde(flatten)]
        target: Target,
    },
    ToBack {
        #[serde(flatten)]
        target: Target,
    },
    ToggleLock {
        #[serde(flatten)]
        target: Target,
    },
    Duplicate {
        #[serde(flatten)]
        target: Target,
    },
    Align { alignment: Alignment },
    PenColor { color: Color },
    PenWidth { width: f32 },
    Opacity { opacity: f32 },
    FontFamily { family: String },
    FontSize { size: f32 },
    Background { color: Color },
    Bold { on: bool },
    Italic { on: bool },
    Underline { on: bool },
    Stamp { preset: StampPreset },
    /// Place an image file; relative paths resolve against the script
    Image { path: PathBuf },
    Instruction { text: String },
    ClearPage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptKey {
    Delete,
    Backspace,
    Escape,
    /// Ctrl+Z
    Undo,
    /// Ctrl+Y or Ctrl+Shift+Z
    Redo,
}

impl From<ScriptKey> for KeyCommand {
    fn from(key: ScriptKey) -> Self {
        match key {
            ScriptKey::Delete | ScriptKey::Backspace => KeyCommand::Delete,
            ScriptKey::Escape => KeyCommand::Escape,
            ScriptKey::Undo => KeyCommand::Undo,
            ScriptKey::Redo => KeyCommand::Redo,
        }
    }
}

pub fn parse_script(json: &str) -> Result<Vec<ScriptStep>> {
    serde_json::from_str(json).context("malformed session script")
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = match &cli.config {
        Some(path) => EditorConfig::load_from(path)?,
        None => EditorConfig::load(),
    };

    match cli.command {
        Commands::Replay {
            document,
            script,
            output,
            layout,
        } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("cannot start async runtime")?;
            runtime.block_on(run_replay(
                &config,
                &document,
                &script,
                &output,
                layout.as_deref(),
            ))
        }
        Commands::Config { path } => {
            if path {
                let location = cli.config.or_else(EditorConfig::default_path);
                match location {
                    Some(location) => println!("{}", location.display()),
                    None => anyhow::bail!("no configuration directory on this platform"),
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(())
        }
    }
}

async fn run_replay(
    config: &EditorConfig,
    document: &Path,
    script: &Path,
    output: &Path,
    layout: Option<&Path>,
) -> Result<()> {
    let json = tokio::fs::read_to_string(script)
        .await
        .with_context(|| format!("cannot read {}", script.display()))?;
    let steps = parse_script(&json)?;
    let script_dir = script.parent().unwrap_or(Path::new("."));

    let services = Collaborators {
        rasterizer: ImageDirRasterizer,
        layout: match layout {
            Some(path) => JsonLayoutService::with_sidecar(path),
            None => JsonLayoutService::new(),
        },
        encoder: PdfImageEncoder::new(ImageDirRasterizer),
        model: CommandLanguageModel::from_argv(&config.language_model_command),
    };
    let source = DocumentSource::Path(document.to_path_buf());
    let mut bench = Workbench::load_document(source, config, services).await?;

    for (index, step) in steps.into_iter().enumerate() {
        log::debug!("Step {}: {:?}", index, step);
        replay_step(&mut bench, step, script_dir).await;
    }

    let report = bench.export_to(output).await?;
    println!(
        "{}: {} of {} pages changed",
        output.display(),
        report.changed_pages.len(),
        bench.page_count()
    );
    Ok(())
}

fn resolve_target(selection: Option<Selection>, target: Target) -> Option<(ObjectId, ObjectKind)> {
    match (target.id, target.kind, selection) {
        (Some(id), Some(kind), _) => Some((id, kind)),
        (Some(id), None, Some(sel)) if sel.id == id => Some((id, sel.kind)),
        (Some(id), None, _) => Some((id, ObjectKind::Text)),
        (None, _, Some(sel)) => Some((sel.id, sel.kind)),
        (None, _, None) => None,
    }
}

/// Translate a script step into the editor message it stands for
///
/// Steps that need more than one message, or none, return `None`.
fn step_message(step: &ScriptStep, selection: Option<Selection>) -> Option<EditorMsg> {
    let object = |target: &Target, make: fn(ObjectId, ObjectKind) -> ObjectMsg| {
        resolve_target(selection, *target).map(|(id, kind)| EditorMsg::Object(make(id, kind)))
    };
    let msg = match step {
        ScriptStep::Tool { tool } => EditorMsg::SetTool(*tool),
        ScriptStep::Page { index } => EditorMsg::SetPage(*index),
        ScriptStep::Down { x, y } => EditorMsg::Pointer(PointerAction::Down(Point::new(*x, *y))),
        ScriptStep::Move { x, y } => EditorMsg::Pointer(PointerAction::Move(Point::new(*x, *y))),
        ScriptStep::Up { x, y } => EditorMsg::Pointer(PointerAction::Up(Point::new(*x, *y))),
        ScriptStep::Key { key } => EditorMsg::Key((*key).into()),
        ScriptStep::Select { target } => {
            let (id, kind) = resolve_target(None, *target)?;
            EditorMsg::Object(ObjectMsg::Select(Some(Selection { id, kind })))
        }
        ScriptStep::Deselect => EditorMsg::Object(ObjectMsg::Select(None)),
        ScriptStep::UpdateText { target, patch } => {
            let (id, _) = resolve_target(selection, *target)?;
            EditorMsg::Object(ObjectMsg::UpdateText(id, patch.clone()))
        }
        ScriptStep::UpdateImage { target, patch } => {
            let (id, _) = resolve_target(selection, *target)?;
            EditorMsg::Object(ObjectMsg::UpdateImage(id, patch.clone()))
        }
        ScriptStep::Remove { target } => return object(target, ObjectMsg::Remove),
        ScriptStep::ToFront { target } => return object(target, ObjectMsg::ToFront),
        ScriptStep::ToBack { target } => return object(target, ObjectMsg::ToBack),
        ScriptStep::ToggleLock { target } => return object(target, ObjectMsg::ToggleLock),
        ScriptStep::Duplicate { target } => return object(target, ObjectMsg::Duplicate),
        ScriptStep::Align { alignment } => EditorMsg::Object(ObjectMsg::Align(*alignment)),
        ScriptStep::PenColor { color } => EditorMsg::Style(StyleMsg::PenColor(*color)),
        ScriptStep::PenWidth { width } => EditorMsg::Style(StyleMsg::PenWidth(*width)),
        ScriptStep::Opacity { opacity } => EditorMsg::Style(StyleMsg::Opacity(*opacity)),
        ScriptStep::FontFamily { family } => EditorMsg::Style(StyleMsg::FontFamily(family.clone())),
        ScriptStep::FontSize { size } => EditorMsg::Style(StyleMsg::FontSize(*size)),
        ScriptStep::Background { color } => EditorMsg::Style(StyleMsg::Background(*color)),
        ScriptStep::Bold { on } => EditorMsg::Style(StyleMsg::Bold(*on)),
        ScriptStep::Italic { on } => EditorMsg::Style(StyleMsg::Italic(*on)),
        ScriptStep::Underline { on } => EditorMsg::Style(StyleMsg::Underline(*on)),
        ScriptStep::Stamp { preset } => EditorMsg::Stamp(*preset),
        ScriptStep::ClearPage => EditorMsg::ClearPage,
        ScriptStep::View { .. }
        | ScriptStep::Stroke { .. }
        | ScriptStep::Click { .. }
        | ScriptStep::Image { .. }
        | ScriptStep::Instruction { .. } => return None,
    };
    Some(msg)
}

async fn replay_step<R, T, E, M>(
    bench: &mut Workbench<R, T, E, M>,
    step: ScriptStep,
    script_dir: &Path,
) where
    R: PageRasterizer,
    T: TextLayoutService,
    E: DocumentEncoder,
    M: LanguageModel,
{
    match step {
        ScriptStep::View {
            origin,
            width,
            height,
        } => {
            let (page_w, page_h) = bench.editor().page_size();
            bench.editor_mut().set_view(ViewTransform {
                origin,
                display_size: (width, height),
                page_size: (page_w as f32, page_h as f32),
            });
        }
        ScriptStep::Stroke { points } => {
            let Some((first, rest)) = points.split_first() else {
                return;
            };
            bench
                .dispatch(EditorMsg::Pointer(PointerAction::Down(*first)))
                .await;
            for p in rest {
                bench.dispatch(EditorMsg::Pointer(PointerAction::Move(*p))).await;
            }
            let last = rest.last().unwrap_or(first);
            bench.dispatch(EditorMsg::Pointer(PointerAction::Up(*last))).await;
        }
        ScriptStep::Click { x, y } => {
            let at = Point::new(x, y);
            bench.dispatch(EditorMsg::Pointer(PointerAction::Down(at))).await;
            bench.dispatch(EditorMsg::Pointer(PointerAction::Up(at))).await;
        }
        ScriptStep::Image { path } => {
            let path = if path.is_absolute() {
                path
            } else {
                script_dir.join(path)
            };
            bench.place_image_file(&path).await;
        }
        ScriptStep::Instruction { text } => {
            let report = bench.apply_instruction(&text).await;
            log::info!("Instruction {:?}: {:?}", text, report);
        }
        step => match step_message(&step, bench.editor().selection()) {
            Some(msg) => {
                bench.dispatch(msg).await;
            }
            None => log::warn!("Skipping step without a target: {:?}", step),
        },
    }
}
