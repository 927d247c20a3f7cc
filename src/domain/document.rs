//! Structured post content: the node tree, inline marks, and document
//! invariants.
//!
//! The serde derives on [`Node`] and [`Mark`] are the persisted content
//! exchange format itself: an explicit `type` discriminator per node, an
//! `attrs` object where a node carries attributes. Because the same
//! exhaustive enums back both editing and serialization, adding a node
//! type forces every consumer to handle it before the crate compiles.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::selection::NodePath;

/// Horizontal alignment for text blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Heading depth. H1 is reserved for the post title and never appears in
/// content; the type makes the other levels unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HeadingLevel {
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
        }
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = DomainError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            2 => Ok(Self::H2),
            3 => Ok(Self::H3),
            4 => Ok(Self::H4),
            other => Err(DomainError::invariant(format!(
                "heading level must be 2, 3, or 4, got {other}"
            ))),
        }
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.as_u8()
    }
}

/// Inline formatting annotation attached to a text run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Link { attrs: LinkAttrs },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttrs {
    pub href: String,
}

/// Mark discriminant, used for toggling and active-state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Strike,
    Link,
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Self::Bold => MarkKind::Bold,
            Self::Italic => MarkKind::Italic,
            Self::Underline => MarkKind::Underline,
            Self::Strike => MarkKind::Strike,
            Self::Link { .. } => MarkKind::Link,
        }
    }

    pub fn link_href(&self) -> Option<&str> {
        match self {
            Self::Link { attrs } => Some(&attrs.href),
            _ => None,
        }
    }
}

/// Insert `mark` into an ordered, de-duplicated mark list. An existing
/// mark of the same kind is replaced, which is how a link's href changes.
pub(crate) fn with_mark(marks: &[Mark], mark: Mark) -> Vec<Mark> {
    let mut next: Vec<Mark> = marks
        .iter()
        .filter(|existing| existing.kind() != mark.kind())
        .cloned()
        .collect();
    let at = next
        .iter()
        .position(|existing| existing.kind() > mark.kind())
        .unwrap_or(next.len());
    next.insert(at, mark);
    next
}

pub(crate) fn without_kind(marks: &[Mark], kind: MarkKind) -> Vec<Mark> {
    marks
        .iter()
        .filter(|mark| mark.kind() != kind)
        .cloned()
        .collect()
}

pub(crate) fn has_kind(marks: &[Mark], kind: MarkKind) -> bool {
    marks.iter().any(|mark| mark.kind() == kind)
}

/// Attributes shared by plain text blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockAttrs {
    #[serde(rename = "textAlign", default, skip_serializing_if = "is_left")]
    pub text_align: Align,
}

impl BlockAttrs {
    fn is_default(&self) -> bool {
        self.text_align == Align::Left
    }

    pub fn aligned(text_align: Align) -> Self {
        Self { text_align }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingAttrs {
    pub level: HeadingLevel,
    #[serde(rename = "textAlign", default, skip_serializing_if = "is_left")]
    pub text_align: Align,
}

fn is_left(align: &Align) -> bool {
    *align == Align::Left
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttrs {
    pub src: String,
    pub alt: String,
    pub title: String,
}

/// One element of the content tree. Block variants carry `content`
/// children; `HorizontalRule`, `Image`, and `Text` are leaves by
/// construction and cannot hold children at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Doc {
        content: Vec<Node>,
    },
    Paragraph {
        #[serde(default, skip_serializing_if = "BlockAttrs::is_default")]
        attrs: BlockAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Heading {
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    BulletList {
        content: Vec<Node>,
    },
    OrderedList {
        content: Vec<Node>,
    },
    ListItem {
        content: Vec<Node>,
    },
    Blockquote {
        content: Vec<Node>,
    },
    HorizontalRule,
    Image {
        attrs: ImageAttrs,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
}

impl Node {
    /// Plain paragraph with default alignment.
    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::Paragraph {
            attrs: BlockAttrs::default(),
            content,
        }
    }

    pub fn heading(level: HeadingLevel, content: Vec<Node>) -> Self {
        Self::Heading {
            attrs: HeadingAttrs {
                level,
                text_align: Align::Left,
            },
            content,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            text: value.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked_text(value: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self::Text {
            text: value.into(),
            marks,
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Self::Doc { content }
            | Self::Paragraph { content, .. }
            | Self::Heading { content, .. }
            | Self::BulletList { content }
            | Self::OrderedList { content }
            | Self::ListItem { content }
            | Self::Blockquote { content } => Some(content),
            Self::HorizontalRule | Self::Image { .. } | Self::Text { .. } => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Doc { content }
            | Self::Paragraph { content, .. }
            | Self::Heading { content, .. }
            | Self::BulletList { content }
            | Self::OrderedList { content }
            | Self::ListItem { content }
            | Self::Blockquote { content } => Some(content),
            Self::HorizontalRule | Self::Image { .. } | Self::Text { .. } => None,
        }
    }

    /// Whether this node may appear directly under the document root.
    pub fn is_block(&self) -> bool {
        !matches!(
            self,
            Self::Doc { .. } | Self::ListItem { .. } | Self::Text { .. }
        )
    }

    /// Paragraph or heading: the blocks that hold text runs and carry
    /// alignment.
    pub fn is_textblock(&self) -> bool {
        matches!(self, Self::Paragraph { .. } | Self::Heading { .. })
    }

    pub fn text_align(&self) -> Option<Align> {
        match self {
            Self::Paragraph { attrs, .. } => Some(attrs.text_align),
            Self::Heading { attrs, .. } => Some(attrs.text_align),
            _ => None,
        }
    }

    pub(crate) fn set_text_align(&mut self, align: Align) -> bool {
        let slot = match self {
            Self::Paragraph { attrs, .. } => &mut attrs.text_align,
            Self::Heading { attrs, .. } => &mut attrs.text_align,
            _ => return false,
        };
        if *slot == align {
            return false;
        }
        *slot = align;
        true
    }

    /// Whether the subtree holds anything a reader would see: non-blank
    /// text, an image, or a rule.
    pub fn has_visible_content(&self) -> bool {
        match self {
            Self::Text { text, .. } => !text.trim().is_empty(),
            Self::Image { .. } | Self::HorizontalRule => true,
            _ => self
                .children()
                .is_some_and(|children| children.iter().any(Self::has_visible_content)),
        }
    }
}

/// One text leaf in document order, with its location and marks.
#[derive(Debug, Clone)]
pub(crate) struct TextRun {
    pub path: NodePath,
    pub len: usize,
    pub marks: Vec<Mark>,
}

/// A validated content tree.
///
/// Construction and deserialization run the structural checks, so every
/// `Document` held by callers is valid; the structural operations produce
/// either a new valid document or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Node", into = "Node")]
pub struct Document {
    blocks: Vec<Node>,
}

impl Document {
    /// A document holding one empty paragraph: the state a fresh editor
    /// opens with and the state `clear_content` restores.
    pub fn empty() -> Self {
        Self {
            blocks: vec![Node::paragraph(Vec::new())],
        }
    }

    pub fn from_root(root: Node) -> Result<Self, DomainError> {
        Self::try_from(root)
    }

    pub fn from_blocks(blocks: Vec<Node>) -> Result<Self, DomainError> {
        validate_blocks(&blocks)?;
        Ok(Self { blocks })
    }

    /// Parse and validate a serialized content tree.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let root: Node =
            serde_json::from_str(json).map_err(|err| DomainError::malformed(err.to_string()))?;
        Self::try_from(root)
    }

    pub fn blocks(&self) -> &[Node] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Node> {
        &mut self.blocks
    }

    pub fn node_at(&self, path: &NodePath) -> Option<&Node> {
        let mut indices = path.indices().iter();
        let mut node = self.blocks.get(*indices.next()?)?;
        for &index in indices {
            node = node.children()?.get(index)?;
        }
        Some(node)
    }

    pub(crate) fn node_at_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut indices = path.indices().iter();
        let mut node = self.blocks.get_mut(*indices.next()?)?;
        for &index in indices {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// All text leaves in document order.
    pub(crate) fn text_runs(&self) -> Vec<TextRun> {
        let mut runs = Vec::new();
        for (index, block) in self.blocks.iter().enumerate() {
            collect_runs(block, NodePath::new(vec![index]), &mut runs);
        }
        runs
    }

    /// Paths of every paragraph and heading, in document order.
    pub(crate) fn textblock_paths(&self) -> Vec<NodePath> {
        let mut paths = Vec::new();
        for (index, block) in self.blocks.iter().enumerate() {
            collect_textblocks(block, NodePath::new(vec![index]), &mut paths);
        }
        paths
    }

    /// Merge adjacent text runs with identical marks and drop empty runs,
    /// so editing never accumulates fragmented text leaves.
    pub(crate) fn normalize(&mut self) {
        for block in &mut self.blocks {
            normalize_node(block);
        }
    }
}

impl TryFrom<Node> for Document {
    type Error = DomainError;

    fn try_from(root: Node) -> Result<Self, Self::Error> {
        match root {
            Node::Doc { content } => Self::from_blocks(content),
            _ => Err(DomainError::invariant("document root must be a doc node")),
        }
    }
}

impl From<Document> for Node {
    fn from(document: Document) -> Self {
        Node::Doc {
            content: document.blocks,
        }
    }
}

fn collect_runs(node: &Node, path: NodePath, out: &mut Vec<TextRun>) {
    match node {
        Node::Text { text, marks } => out.push(TextRun {
            path,
            len: text.chars().count(),
            marks: marks.clone(),
        }),
        _ => {
            if let Some(children) = node.children() {
                for (index, child) in children.iter().enumerate() {
                    collect_runs(child, path.child(index), out);
                }
            }
        }
    }
}

fn collect_textblocks(node: &Node, path: NodePath, out: &mut Vec<NodePath>) {
    if node.is_textblock() {
        out.push(path);
        return;
    }
    if let Some(children) = node.children() {
        for (index, child) in children.iter().enumerate() {
            collect_textblocks(child, path.child(index), out);
        }
    }
}

fn normalize_node(node: &mut Node) {
    if node.is_textblock() {
        if let Some(children) = node.children_mut() {
            let mut merged: Vec<Node> = Vec::with_capacity(children.len());
            for child in children.drain(..) {
                match child {
                    Node::Text { text, marks } => {
                        if text.is_empty() {
                            continue;
                        }
                        if let Some(Node::Text {
                            text: previous,
                            marks: previous_marks,
                        }) = merged.last_mut()
                        {
                            if *previous_marks == marks {
                                previous.push_str(&text);
                                continue;
                            }
                        }
                        merged.push(Node::Text { text, marks });
                    }
                    other => merged.push(other),
                }
            }
            *children = merged;
        }
        return;
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            normalize_node(child);
        }
    }
}

fn validate_blocks(blocks: &[Node]) -> Result<(), DomainError> {
    if blocks.is_empty() {
        return Err(DomainError::invariant(
            "document must contain at least one block",
        ));
    }
    for block in blocks {
        validate_block(block)?;
    }
    Ok(())
}

fn validate_block(node: &Node) -> Result<(), DomainError> {
    match node {
        Node::Doc { .. } => Err(DomainError::invariant("doc nodes cannot nest")),
        Node::Text { .. } => Err(DomainError::invariant(
            "text runs must sit inside a paragraph or heading",
        )),
        Node::ListItem { .. } => Err(DomainError::invariant("list items belong inside lists")),
        Node::Paragraph { content, .. } | Node::Heading { content, .. } => {
            for child in content {
                match child {
                    Node::Text { marks, .. } => validate_marks(marks)?,
                    _ => {
                        return Err(DomainError::invariant(
                            "paragraphs and headings hold only text runs",
                        ));
                    }
                }
            }
            Ok(())
        }
        Node::BulletList { content } | Node::OrderedList { content } => {
            if content.is_empty() {
                return Err(DomainError::invariant("lists must hold at least one item"));
            }
            for item in content {
                match item {
                    Node::ListItem { content } => {
                        if content.is_empty() {
                            return Err(DomainError::invariant(
                                "list items must hold at least one block",
                            ));
                        }
                        for block in content {
                            validate_block(block)?;
                        }
                    }
                    _ => {
                        return Err(DomainError::invariant("lists hold only list items"));
                    }
                }
            }
            Ok(())
        }
        Node::Blockquote { content } => {
            if content.is_empty() {
                return Err(DomainError::invariant(
                    "blockquotes must hold at least one block",
                ));
            }
            for block in content {
                validate_block(block)?;
            }
            Ok(())
        }
        Node::HorizontalRule | Node::Image { .. } => Ok(()),
    }
}

fn validate_marks(marks: &[Mark]) -> Result<(), DomainError> {
    for (index, mark) in marks.iter().enumerate() {
        if marks[..index].iter().any(|seen| seen.kind() == mark.kind()) {
            return Err(DomainError::invariant(
                "text runs carry at most one mark of each kind",
            ));
        }
    }
    Ok(())
}
