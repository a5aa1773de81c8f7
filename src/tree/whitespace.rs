//! Formatting inference for inserted nodes.
//!
//! New nodes copy the layout of their neighbours: the nearest non-text
//! sibling's line break and indentation, or, when there is no sibling to
//! imitate, the parent's indentation plus one indent unit detected from the
//! document itself.

use std::collections::HashMap;

use super::{Document, NodeId, NodeKind};

/// The part of `whitespace` after its last line break.
///
/// Returns `""` when `whitespace` contains no line break.
pub(crate) fn indentation_of(whitespace: &str) -> &str {
    whitespace
        .rfind('\n')
        .map_or("", |pos| &whitespace[pos + 1..])
}

/// The line break used in `whitespace`, if it has one.
pub(crate) fn line_ending_of(whitespace: &str) -> Option<&'static str> {
    if whitespace.contains("\r\n") {
        Some("\r\n")
    } else if whitespace.contains('\n') {
        Some("\n")
    } else {
        None
    }
}

/// Reduces a sibling's whitespace to one line break plus its indentation.
fn collapse(whitespace: &str) -> String {
    match line_ending_of(whitespace) {
        Some(newline) => format!("{newline}{}", indentation_of(whitespace)),
        None => whitespace.to_string(),
    }
}

impl Document {
    /// The line break the document already uses, if any.
    #[must_use]
    pub fn detect_line_ending(&self) -> Option<&'static str> {
        self.descendants(self.root)
            .find_map(|id| line_ending_of(&self.node(id).preceding_whitespace))
    }

    /// The indentation step the document uses between nesting levels.
    ///
    /// Every element on its own line whose parent is also on its own line
    /// contributes the difference of the two indentations. The shortest step
    /// that occurs more than once wins, else the shortest step seen.
    #[must_use]
    pub fn detect_indent_unit(&self) -> Option<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for id in self.descendants(self.root) {
            let node = self.node(id);
            if !matches!(node.kind, NodeKind::Element(_))
                || line_ending_of(&node.preceding_whitespace).is_none()
            {
                continue;
            }
            let Some(parent) = self.parent_element(id) else {
                continue;
            };
            let parent_indent = self.line_indentation(parent);
            let indent = indentation_of(&node.preceding_whitespace);
            if let Some(step) = indent.strip_prefix(parent_indent.as_str()) {
                if !step.is_empty() && step.chars().all(|c| c == ' ' || c == '\t') {
                    *counts.entry(step).or_default() += 1;
                }
            }
        }
        counts
            .into_iter()
            .min_by_key(|&(step, count)| (count < 2, step.len(), step))
            .map(|(step, _)| step.to_string())
    }

    /// The indentation of the line a node starts on.
    ///
    /// A node that does not start its own line gets one indent unit per
    /// element ancestor.
    pub(crate) fn line_indentation(&self, id: NodeId) -> String {
        let whitespace = &self.node(id).preceding_whitespace;
        if line_ending_of(whitespace).is_some() {
            return indentation_of(whitespace).to_string();
        }
        let depth = self.depth(id);
        if depth == 0 {
            return String::new();
        }
        self.config.indent_string.repeat(depth)
    }

    pub(crate) fn newline(&self) -> String {
        self.detect_line_ending()
            .map_or_else(|| self.config.line_ending.clone(), str::to_string)
    }

    fn indent_unit(&self) -> String {
        self.detect_indent_unit()
            .unwrap_or_else(|| self.config.indent_string.clone())
    }

    /// Whitespace for a node about to be inserted into `parent` at `index`.
    pub(crate) fn infer_preceding_whitespace(&self, parent: NodeId, index: usize) -> String {
        if parent == self.root {
            return if index == 0 && self.xml_declaration.is_none() {
                String::new()
            } else {
                self.newline()
            };
        }

        let siblings = self.children(parent);
        let is_text = |id: &&NodeId| matches!(self.node(**id).kind, NodeKind::Text(_));
        let before = siblings[..index].iter().rev().find(|id| !is_text(id));
        let after = siblings[index..].iter().find(|id| !is_text(id));
        if let Some(&sibling) = before.or(after) {
            return collapse(&self.node(sibling).preceding_whitespace);
        }

        if siblings.iter().any(|id| is_text(&id)) {
            // Mixed content: whitespace would change the text.
            return String::new();
        }
        format!(
            "{}{}{}",
            self.newline(),
            self.line_indentation(parent),
            self.indent_unit()
        )
    }

    /// The closing whitespace an empty element needs once it gets a first
    /// child that starts on its own line.
    pub(crate) fn infer_closing_whitespace(
        &self,
        parent: NodeId,
        child_whitespace: &str,
    ) -> Option<String> {
        let element = self.element(parent)?;
        if !element.closing_whitespace.is_empty() || !element.children.is_empty() {
            return None;
        }
        let newline = line_ending_of(child_whitespace)?;
        Some(format!("{newline}{}", self.line_indentation(parent)))
    }
}
