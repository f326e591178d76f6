//! Instruction-driven edits of the active page
//!
//! An instruction runs through two independent passes. A color word
//! recolors the pen and every text object on the page. Edit verbs ask the
//! language model for a structured plan that either rewrites text in place
//! or deletes it behind a redaction. Model failures and unparseable replies
//! leave the page unchanged.

use serde::{Deserialize, Serialize};

use crate::domain::{
    CHAR_WIDTH_FACTOR, Color, ObjectId, ObjectKind, Rect, RedactionObject, TextObject,
};
use crate::services::LanguageModel;
use crate::session::Editor;

/// Color words recognized in instructions, checked in this order
pub const PALETTE: &[(&str, Color)] = &[
    ("blue", Color::rgb(0x25, 0x63, 0xeb)),
    ("red", Color::rgb(0xdc, 0x26, 0x26)),
    ("green", Color::rgb(0x16, 0xa3, 0x4a)),
    ("black", Color::rgb(0x00, 0x00, 0x00)),
    ("purple", Color::rgb(0x93, 0x33, 0xea)),
];

/// Words that make an instruction worth sending to the language model
const EDIT_VERBS: &[&str] = &["change", "replace", "typo", "remove", "delete"];

/// Height of a deletion redaction relative to the font size
const DELETE_HEIGHT_FACTOR: f32 = 1.2;

/// Structured edit returned by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum EditPlan {
    Replace { find: String, replace: String },
    Delete { target: String },
}

/// What an instruction changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssistReport {
    pub color: Option<Color>,
    pub plan: Option<EditPlan>,
    pub rewritten: Vec<ObjectId>,
    pub deleted: Vec<ObjectId>,
}

impl AssistReport {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.rewritten.is_empty() && self.deleted.is_empty()
    }
}

pub fn color_from_instruction(instruction: &str) -> Option<Color> {
    let lower = instruction.to_lowercase();
    PALETTE
        .iter()
        .find(|(word, _)| lower.contains(word))
        .map(|&(_, color)| color)
}

pub fn wants_structural_edit(instruction: &str) -> bool {
    let lower = instruction.to_lowercase();
    EDIT_VERBS.iter().any(|verb| lower.contains(verb))
}

pub fn build_prompt(instruction: &str, texts: &[&str]) -> String {
    let mut prompt = String::from(
        "You edit the text objects of one document page.\n\
         Reply with exactly one JSON object and nothing else, either\n\
         {\"action\":\"replace\",\"find\":\"<text to find>\",\"replace\":\"<replacement>\"}\n\
         or\n\
         {\"action\":\"delete\",\"target\":\"<text to delete>\"}\n\n",
    );
    prompt.push_str("Text objects on the page:\n");
    for text in texts {
        prompt.push_str(&format!("- {:?}\n", text));
    }
    prompt.push_str(&format!("\nInstruction: {}\n", instruction));
    prompt
}

/// Plan from a model reply; surrounding prose and code fences are ignored
pub fn parse_plan(reply: &str) -> Option<EditPlan> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<EditPlan>(&reply[start..=end]) {
        Ok(plan) => Some(plan),
        Err(e) => {
            log::warn!("Ignoring unparseable edit plan: {}", e);
            None
        }
    }
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Byte length of the prefix of `haystack` matching `needle` ignoring case
fn match_len(haystack: &str, needle: &str) -> Option<usize> {
    let mut chars = haystack.char_indices();
    for expected in needle.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(chars.next().map_or(haystack.len(), |(i, _)| i))
}

/// Replace every case-insensitive occurrence of `find`; `None` if there is none
pub fn replace_ignore_case(haystack: &str, find: &str, replace: &str) -> Option<String> {
    if find.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(haystack.len());
    let mut found = false;
    let mut rest = haystack;
    while !rest.is_empty() {
        if let Some(len) = match_len(rest, find) {
            out.push_str(replace);
            rest = &rest[len..];
            found = true;
            continue;
        }
        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    found.then_some(out)
}

/// Rectangle covering a text object's glyphs for deletion
pub fn deletion_cover(obj: &TextObject) -> Rect {
    let size = obj.font_size();
    Rect::new(
        obj.x,
        obj.y - size,
        obj.text.chars().count() as f32 * size * CHAR_WIDTH_FACTOR,
        size * DELETE_HEIGHT_FACTOR,
    )
}

impl Editor {
    /// Use `color` for the pen, new text and every text object on `page`
    pub fn recolor_page(&mut self, page: usize, color: Color) -> usize {
        self.set_pen_color(color);
        self.set_text_color(color);
        let Some(overlay) = self.page_mut(page) else {
            return 0;
        };
        overlay.update_texts_where(|t| {
            if t.color == color {
                return false;
            }
            t.color = color;
            true
        })
    }

    /// Apply an edit plan to `page`, filling in `report`
    pub fn apply_plan(&mut self, page: usize, plan: &EditPlan, report: &mut AssistReport) {
        match plan {
            EditPlan::Replace { find, replace } => {
                if find.is_empty() {
                    return;
                }
                let Some(overlay) = self.page_mut(page) else {
                    return;
                };
                let mut rewritten = Vec::new();
                overlay.update_texts_where(|t| {
                    let Some(text) = replace_ignore_case(&t.text, find, replace) else {
                        return false;
                    };
                    t.text = text;
                    rewritten.push(t.id);
                    true
                });
                report.rewritten.extend(rewritten);
            }
            EditPlan::Delete { target } => {
                if target.is_empty() {
                    return;
                }
                let Some(overlay) = self.page_mut(page) else {
                    return;
                };
                let doomed: Vec<(ObjectId, Rect)> = overlay
                    .texts
                    .iter()
                    .filter(|t| !t.locked && contains_ignore_case(&t.text, target))
                    .map(|t| (t.id, deletion_cover(t)))
                    .collect();
                for (id, rect) in doomed {
                    let redaction_id = self.allocate_id();
                    let Some(overlay) = self.page_mut(page) else {
                        return;
                    };
                    overlay.add_redaction(RedactionObject {
                        id: redaction_id,
                        rect,
                    });
                    overlay.remove(id, ObjectKind::Text);
                    report.deleted.push(id);
                }
                if self
                    .selection()
                    .is_some_and(|s| report.deleted.contains(&s.id))
                {
                    self.select(None);
                }
            }
        }
    }
}

/// Run an instruction against the active page
///
/// Never fails: model errors and unusable replies are logged and the
/// structural pass is skipped.
pub async fn run_instruction<L: LanguageModel>(
    editor: &mut Editor,
    model: &L,
    instruction: &str,
) -> AssistReport {
    let page = editor.active_page();
    let mut report = AssistReport::default();

    if let Some(color) = color_from_instruction(instruction) {
        let recolored = editor.recolor_page(page, color);
        log::debug!("Recolored {} text objects on page {}", recolored, page);
        report.color = Some(color);
    }

    if !wants_structural_edit(instruction) {
        return report;
    }

    let texts: Vec<String> = editor.current().texts.iter().map(|t| t.text.clone()).collect();
    let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
    let prompt = build_prompt(instruction, &text_refs);

    let reply = match model.complete(&prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            log::warn!("Language model failed: {:#}", e);
            return report;
        }
    };
    let Some(plan) = parse_plan(&reply) else {
        log::warn!("No edit plan in language model reply");
        return report;
    };

    editor.apply_plan(page, &plan, &mut report);
    log::info!(
        "Instruction applied: {} rewritten, {} deleted",
        report.rewritten.len(),
        report.deleted.len()
    );
    report.plan = Some(plan);
    report
}
