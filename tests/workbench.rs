use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use image::{Rgba, RgbaImage};

use inkpage::config::EditorConfig;
use inkpage::domain::{ObjectKind, Point, Selection};
use inkpage::render::FontBook;
use inkpage::services::{
    DocumentEncoder, DocumentSource, FlattenedPage, LanguageModel, PageRasterizer,
    TextLayoutService, TextRun,
};
use inkpage::session::{EditorMsg, KeyCommand, ObjectMsg, PointerAction, Tool};
use inkpage::workbench::{Collaborators, Workbench};

const GREY: [u8; 4] = [30, 30, 30, 255];

struct MemRasterizer {
    pages: usize,
    fail: bool,
}

impl PageRasterizer for MemRasterizer {
    async fn rasterize(&self, _source: &DocumentSource) -> Result<Vec<RgbaImage>> {
        if self.fail {
            bail!("corrupt file");
        }
        Ok((0..self.pages)
            .map(|_| RgbaImage::from_pixel(200, 200, Rgba(GREY)))
            .collect())
    }
}

#[derive(Default)]
struct MemLayout {
    runs: Vec<(usize, TextRun)>,
    fail: bool,
}

impl TextLayoutService for MemLayout {
    async fn text_runs(&self, _source: &DocumentSource, page: usize) -> Result<Vec<TextRun>> {
        if self.fail {
            bail!("layout unavailable");
        }
        Ok(self
            .runs
            .iter()
            .filter(|(p, _)| *p == page)
            .map(|(_, run)| run.clone())
            .collect())
    }
}

#[derive(Default, Clone)]
struct MemEncoder {
    received: Arc<Mutex<Vec<FlattenedPage>>>,
    fail: bool,
}

impl DocumentEncoder for MemEncoder {
    async fn encode(&self, _source: &DocumentSource, pages: Vec<FlattenedPage>) -> Result<Vec<u8>> {
        if self.fail {
            bail!("disk full");
        }
        self.received.lock().unwrap().extend(pages);
        Ok(b"%PDF-mock".to_vec())
    }
}

struct Canned(&'static str);

impl LanguageModel for Canned {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

type Bench = Workbench<MemRasterizer, MemLayout, MemEncoder, Canned>;

fn source() -> DocumentSource {
    DocumentSource::Bytes {
        name: "contract.pdf".into(),
        bytes: Arc::from(&b"%PDF"[..]),
    }
}

fn total_run() -> TextRun {
    TextRun {
        text: "Total".into(),
        x: 20.0,
        y: 40.0,
        width: 60.0,
        height: 10.0,
        font_size: 8.0,
    }
}

async fn open(pages: usize, layout: MemLayout, encoder: MemEncoder, reply: &'static str) -> Bench {
    let services = Collaborators {
        rasterizer: MemRasterizer { pages, fail: false },
        layout,
        encoder,
        model: Canned(reply),
    };
    Workbench::load_with_fonts(source(), &EditorConfig::default(), services, FontBook::empty())
        .await
        .unwrap()
}

async fn click(bench: &mut Bench, x: f32, y: f32) -> Option<u64> {
    let at = Point::new(x, y);
    let placed = bench.dispatch(EditorMsg::Pointer(PointerAction::Down(at))).await;
    bench.dispatch(EditorMsg::Pointer(PointerAction::Up(at))).await;
    placed
}

async fn stroke(bench: &mut Bench, from: Point, to: Point) {
    bench.dispatch(EditorMsg::Pointer(PointerAction::Down(from))).await;
    bench.dispatch(EditorMsg::Pointer(PointerAction::Move(to))).await;
    bench.dispatch(EditorMsg::Pointer(PointerAction::Up(to))).await;
}

#[tokio::test]
async fn test_load_failure_is_reported() {
    let services = Collaborators {
        rasterizer: MemRasterizer {
            pages: 1,
            fail: true,
        },
        layout: MemLayout::default(),
        encoder: MemEncoder::default(),
        model: Canned(""),
    };
    let err = Workbench::load_with_fonts(source(), &EditorConfig::default(), services, FontBook::empty())
        .await
        .err()
        .unwrap();
    let message = format!("{:#}", err);
    assert!(message.starts_with("failed to render document"), "{}", message);
    assert!(message.contains("corrupt file"));
}

#[tokio::test]
async fn test_document_without_pages_is_rejected() {
    let services = Collaborators {
        rasterizer: MemRasterizer {
            pages: 0,
            fail: false,
        },
        layout: MemLayout::default(),
        encoder: MemEncoder::default(),
        model: Canned(""),
    };
    let result =
        Workbench::load_with_fonts(source(), &EditorConfig::default(), services, FontBook::empty())
            .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_edit_text_hit_covers_and_copies_run() {
    let layout = MemLayout {
        runs: vec![(0, total_run())],
        fail: false,
    };
    let mut bench = open(2, layout, MemEncoder::default(), "").await;
    bench.dispatch(EditorMsg::SetTool(Tool::EditText)).await;

    let id = click(&mut bench, 30.0, 45.0).await.unwrap();

    let editor = bench.editor();
    assert_eq!(editor.tool(), Tool::Select);
    assert_eq!(editor.selection(), Some(Selection::text(id)));
    let page = editor.current();
    assert_eq!(page.redactions.len(), 1);
    let cover = page.redactions[0].rect;
    assert_eq!((cover.x, cover.y, cover.width, cover.height), (20.0, 40.0, 60.0, 16.0));
    let text = page.text(id).unwrap();
    assert_eq!(text.text, "Total");
    assert_eq!(text.font_size(), 16.0);
    assert_eq!((text.x, text.y), (20.0, 48.0));
}

#[tokio::test]
async fn test_edit_text_miss_changes_nothing() {
    let layout = MemLayout {
        runs: vec![(0, total_run())],
        fail: false,
    };
    let mut bench = open(1, layout, MemEncoder::default(), "").await;
    bench.dispatch(EditorMsg::SetTool(Tool::EditText)).await;

    assert_eq!(click(&mut bench, 150.0, 150.0).await, None);
    assert!(!bench.editor().current().has_content());
    assert_eq!(bench.editor().selection(), None);
}

#[tokio::test]
async fn test_edit_text_layout_failure_is_a_miss() {
    let layout = MemLayout {
        runs: vec![(0, total_run())],
        fail: true,
    };
    let mut bench = open(1, layout, MemEncoder::default(), "").await;
    bench.dispatch(EditorMsg::SetTool(Tool::EditText)).await;

    assert_eq!(click(&mut bench, 30.0, 45.0).await, None);
    assert!(!bench.editor().current().has_content());
}

#[tokio::test]
async fn test_export_sends_only_changed_pages() {
    let layout = MemLayout {
        runs: vec![(1, total_run())],
        fail: false,
    };
    let encoder = MemEncoder::default();
    let received = Arc::clone(&encoder.received);
    let mut bench = open(3, layout, encoder, "").await;

    bench.dispatch(EditorMsg::SetPage(1)).await;
    bench.dispatch(EditorMsg::SetTool(Tool::EditText)).await;
    click(&mut bench, 30.0, 45.0).await.unwrap();

    let report = bench.export().await.unwrap();
    assert_eq!(report.changed_pages, vec![1]);
    assert_eq!(report.bytes, b"%PDF-mock");

    let pages = received.lock().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_index, 1);
    // the redaction hides the original run
    assert_eq!(pages[0].bitmap.get_pixel(75, 42).0, [255, 255, 255, 255]);
    assert_eq!(pages[0].bitmap.get_pixel(150, 150).0, GREY);
}

#[tokio::test]
async fn test_encoder_failure_writes_nothing() {
    let encoder = MemEncoder {
        fail: true,
        ..Default::default()
    };
    let mut bench = open(1, MemLayout::default(), encoder, "").await;
    bench.dispatch(EditorMsg::SetTool(Tool::Draw)).await;
    stroke(&mut bench, Point::new(10.0, 10.0), Point::new(60.0, 60.0)).await;

    let dir = tempfile::tempdir().unwrap();
    let out: PathBuf = dir.path().join("out.pdf");
    let err = bench.export_to(&out).await.unwrap_err();
    assert!(format!("{:#}", err).starts_with("failed to export document"));
    assert!(!out.exists());
}

#[tokio::test]
async fn test_undo_redo_is_per_page() {
    let mut bench = open(2, MemLayout::default(), MemEncoder::default(), "").await;
    bench.dispatch(EditorMsg::SetTool(Tool::Draw)).await;
    stroke(&mut bench, Point::new(10.0, 10.0), Point::new(60.0, 60.0)).await;
    assert_eq!(bench.editor().tool(), Tool::Draw);

    bench.dispatch(EditorMsg::SetPage(1)).await;
    stroke(&mut bench, Point::new(20.0, 20.0), Point::new(80.0, 20.0)).await;
    bench.dispatch(EditorMsg::Key(KeyCommand::Undo)).await;

    let store = bench.editor().store();
    assert!(store.page(1).unwrap().paths.is_empty());
    assert_eq!(store.page(0).unwrap().paths.len(), 1);

    bench.dispatch(EditorMsg::Key(KeyCommand::Redo)).await;
    assert_eq!(bench.editor().store().page(1).unwrap().paths.len(), 1);
}

#[tokio::test]
async fn test_locked_text_survives_delete() {
    let mut bench = open(1, MemLayout::default(), MemEncoder::default(), "").await;
    bench.dispatch(EditorMsg::SetTool(Tool::Text)).await;
    click(&mut bench, 40.0, 40.0).await;
    let selected = bench.editor().selection().unwrap();
    assert_eq!(selected.kind, ObjectKind::Text);

    bench
        .dispatch(EditorMsg::Object(ObjectMsg::ToggleLock(selected.id, selected.kind)))
        .await;
    bench.dispatch(EditorMsg::Key(KeyCommand::Delete)).await;

    let page = bench.editor().current();
    assert!(page.text(selected.id).unwrap().locked);
    assert_eq!(bench.editor().selection(), Some(selected));
}

#[tokio::test]
async fn test_reorder_to_back() {
    let mut bench = open(1, MemLayout::default(), MemEncoder::default(), "").await;
    bench.dispatch(EditorMsg::SetTool(Tool::Text)).await;
    click(&mut bench, 40.0, 40.0).await;
    let first = bench.editor().selection().unwrap().id;
    bench.dispatch(EditorMsg::SetTool(Tool::Text)).await;
    click(&mut bench, 40.0, 120.0).await;
    let second = bench.editor().selection().unwrap().id;

    bench
        .dispatch(EditorMsg::Object(ObjectMsg::ToBack(second, ObjectKind::Text)))
        .await;
    let order: Vec<u64> = bench.editor().current().texts.iter().map(|t| t.id).collect();
    assert_eq!(order, vec![second, first]);
}

#[tokio::test]
async fn test_instruction_rewrites_then_exports() {
    let encoder = MemEncoder::default();
    let received = Arc::clone(&encoder.received);
    let mut bench = open(
        2,
        MemLayout::default(),
        encoder,
        r#"{"action":"replace","find":"New Text","replace":"Paid"}"#,
    )
    .await;
    bench.dispatch(EditorMsg::SetTool(Tool::Text)).await;
    click(&mut bench, 40.0, 40.0).await;
    let id = bench.editor().selection().unwrap().id;

    let report = bench.apply_instruction("change the text to Paid").await;
    assert_eq!(report.rewritten, vec![id]);
    assert_eq!(bench.editor().current().text(id).unwrap().text, "Paid");

    let report = bench.export().await.unwrap();
    assert_eq!(report.changed_pages, vec![0]);
    assert_eq!(received.lock().unwrap().len(), 1);
}
