//! Active tool and its transition rules

use serde::{Deserialize, Serialize};

use crate::domain::{PaintMode, PathTool};

/// What a pointer gesture on the page means; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Select,
    Draw,
    Highlight,
    Whiteout,
    Text,
    Image,
    EditText,
    Stamp,
}

impl Tool {
    /// Tools that go back to `Select` after a single placement
    pub fn auto_reverts(self) -> bool {
        matches!(self, Tool::Text | Tool::Image | Tool::EditText | Tool::Stamp)
    }

    /// The tool active once this one has completed a gesture
    pub fn after_gesture(self) -> Tool {
        if self.auto_reverts() {
            Tool::Select
        } else {
            self
        }
    }

    pub fn path_tool(self) -> Option<PathTool> {
        match self {
            Tool::Draw => Some(PathTool::Freehand),
            Tool::Highlight => Some(PathTool::Highlight),
            Tool::Whiteout => Some(PathTool::Whiteout),
            _ => None,
        }
    }
}

impl PathTool {
    pub fn paint_mode(self) -> PaintMode {
        match self {
            PathTool::Highlight => PaintMode::Multiply,
            PathTool::Freehand | PathTool::Whiteout => PaintMode::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        for tool in [Tool::Text, Tool::Image, Tool::EditText, Tool::Stamp] {
            assert_eq!(tool.after_gesture(), Tool::Select);
            assert!(tool.path_tool().is_none());
        }
        for tool in [Tool::Draw, Tool::Highlight, Tool::Whiteout] {
            assert_eq!(tool.after_gesture(), tool);
            assert!(tool.path_tool().is_some());
        }
        assert_eq!(Tool::Select.after_gesture(), Tool::Select);
    }

    #[test]
    fn test_tool_names() {
        let tool: Tool = serde_json::from_str("\"edit-text\"").unwrap();
        assert_eq!(tool, Tool::EditText);
        assert_eq!(PathTool::Highlight.paint_mode(), PaintMode::Multiply);
    }
}
