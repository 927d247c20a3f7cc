//! Pure structural operations over `(document, selection, params)`.
//!
//! Every operation returns the next document, or `None` when its
//! preconditions fail; callers never observe a partially-applied state.
//! The operations are deterministic, so a command log can be replayed
//! against a snapshot in tests without a rendering environment.

use crate::domain::document::{
    Align, BlockAttrs, Document, HeadingAttrs, HeadingLevel, ImageAttrs, LinkAttrs, Mark, MarkKind,
    Node, TextRun, has_kind, with_mark, without_kind,
};
use crate::domain::selection::{NodePath, Position, Selection};

/// Target shape for [`set_block_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Paragraph,
    Heading(HeadingLevel),
    BulletList,
    OrderedList,
    Blockquote,
}

/// Toggle a simple mark over the selection.
///
/// Mixed coverage turns the mark on for the whole range; only a uniformly
/// marked range toggles off. Links carry an href and go through
/// [`set_link`]/[`unset_link`] instead, and a collapsed cursor has no text
/// to mark.
pub fn toggle_mark(document: &Document, selection: &Selection, kind: MarkKind) -> Option<Document> {
    if kind == MarkKind::Link || selection.is_collapsed() {
        return None;
    }
    let runs = document.text_runs();
    let range = resolve_range(&runs, selection)?;
    let slices = selected_slices(&runs, range);
    if slices.is_empty() {
        return None;
    }

    let uniformly_active = slices
        .iter()
        .all(|slice| has_kind(&runs[slice.run].marks, kind));
    let mark = plain_mark(kind)?;

    let mut next = document.clone();
    for slice in slices.iter().rev() {
        let path = &runs[slice.run].path;
        if uniformly_active {
            edit_run(&mut next, path, slice.start, slice.end, &|marks| {
                *marks = without_kind(marks, kind);
            });
        } else {
            edit_run(&mut next, path, slice.start, slice.end, &|marks| {
                *marks = with_mark(marks, mark.clone());
            });
        }
    }
    next.normalize();
    (next != *document).then_some(next)
}

/// Apply a link across the selection, replacing any link already present.
///
/// A collapsed cursor inside a link run retargets the whole contiguous
/// run; a collapsed cursor elsewhere has nothing to link.
pub fn set_link(document: &Document, selection: &Selection, href: &str) -> Option<Document> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let runs = document.text_runs();
    let slices = link_target_slices(&runs, selection, LinkPrecondition::Any)?;

    let mark = Mark::Link {
        attrs: LinkAttrs {
            href: href.to_string(),
        },
    };
    let mut next = document.clone();
    for slice in slices.iter().rev() {
        edit_run(&mut next, &runs[slice.run].path, slice.start, slice.end, &|marks| {
            *marks = with_mark(marks, mark.clone());
        });
    }
    next.normalize();
    (next != *document).then_some(next)
}

/// Remove the link over the selection. A selection with no active link is
/// a no-op; a collapsed cursor clears the contiguous link run it sits in.
pub fn unset_link(document: &Document, selection: &Selection) -> Option<Document> {
    let runs = document.text_runs();
    let slices = link_target_slices(&runs, selection, LinkPrecondition::Required)?;

    let mut next = document.clone();
    for slice in slices.iter().rev() {
        edit_run(&mut next, &runs[slice.run].path, slice.start, slice.end, &|marks| {
            *marks = without_kind(marks, MarkKind::Link);
        });
    }
    next.normalize();
    (next != *document).then_some(next)
}

/// Href under the selection, for pre-filling a host-side link prompt.
pub(crate) fn link_href_at(document: &Document, selection: &Selection) -> Option<String> {
    let runs = document.text_runs();
    let index = if selection.is_collapsed() {
        runs.iter()
            .position(|run| run.path == selection.start().path)?
    } else {
        let range = resolve_range(&runs, selection)?;
        selected_slices(&runs, range).first()?.run
    };
    run_href(&runs[index]).map(str::to_string)
}

/// Retype or wrap the blocks the selection touches.
pub fn set_block_type(
    document: &Document,
    selection: &Selection,
    block: BlockType,
) -> Option<Document> {
    match block {
        BlockType::Paragraph => retype_textblocks(document, selection, None),
        BlockType::Heading(level) => retype_textblocks(document, selection, Some(level)),
        BlockType::BulletList => toggle_list(document, selection, ListKind::Bullet),
        BlockType::OrderedList => toggle_list(document, selection, ListKind::Ordered),
        BlockType::Blockquote => toggle_blockquote(document, selection),
    }
}

/// Set alignment on every paragraph and heading the selection touches.
pub fn set_text_align(document: &Document, selection: &Selection, align: Align) -> Option<Document> {
    let paths = touched_textblocks(document, selection);
    if paths.is_empty() {
        return None;
    }
    let mut next = document.clone();
    let mut changed = false;
    for path in &paths {
        if let Some(node) = next.node_at_mut(path) {
            changed |= node.set_text_align(align);
        }
    }
    changed.then_some(next)
}

/// Insert a horizontal rule after the block holding the selection focus.
pub fn insert_horizontal_rule(document: &Document, selection: &Selection) -> Option<Document> {
    Some(insert_block(document, selection, Node::HorizontalRule))
}

/// Insert an image block after the block holding the selection focus.
pub fn insert_image(
    document: &Document,
    selection: &Selection,
    attrs: ImageAttrs,
) -> Option<Document> {
    Some(insert_block(document, selection, Node::Image { attrs }))
}

/// Insert text at a collapsed cursor, inheriting the marks of the run it
/// lands in.
pub fn insert_text(document: &Document, selection: &Selection, text: &str) -> Option<Document> {
    if text.is_empty() || !selection.is_collapsed() {
        return None;
    }
    let position = selection.start();
    let mut next = document.clone();
    match next.node_at_mut(&position.path)? {
        Node::Text { text: existing, .. } => {
            let at = byte_offset(existing, position.offset);
            existing.insert_str(at, text);
        }
        node if node.is_textblock() => {
            let children = node.children_mut()?;
            if !children.is_empty() {
                return None;
            }
            children.push(Node::text(text));
        }
        _ => return None,
    }
    next.normalize();
    Some(next)
}

/// Reset the document to a single empty paragraph.
pub fn clear_content(document: &Document) -> Option<Document> {
    let empty = Document::empty();
    (*document != empty).then_some(empty)
}

// ---------------------------------------------------------------------------
// Selection resolution over the flattened run list.

#[derive(Debug, Clone, Copy)]
pub(crate) struct RunPoint {
    pub run: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedRange {
    pub start: RunPoint,
    pub end: RunPoint,
}

/// A positive-length span within one text run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slice {
    pub run: usize,
    pub start: usize,
    pub end: usize,
}

enum Bias {
    Forward,
    Backward,
}

/// Resolve both selection endpoints onto the run list. Endpoints that no
/// longer address a run snap inward to the nearest one.
pub(crate) fn resolve_range(runs: &[TextRun], selection: &Selection) -> Option<ResolvedRange> {
    let start = resolve_position(runs, selection.start(), Bias::Forward)?;
    let end = resolve_position(runs, selection.end(), Bias::Backward)?;
    if (start.run, start.offset) > (end.run, end.offset) {
        return None;
    }
    Some(ResolvedRange { start, end })
}

fn resolve_position(runs: &[TextRun], position: &Position, bias: Bias) -> Option<RunPoint> {
    if let Some(run) = runs.iter().position(|run| run.path == position.path) {
        return Some(RunPoint {
            run,
            offset: position.offset.min(runs[run].len),
        });
    }
    match bias {
        Bias::Forward => runs
            .iter()
            .position(|run| run.path > position.path)
            .map(|run| RunPoint { run, offset: 0 }),
        Bias::Backward => runs
            .iter()
            .rposition(|run| run.path < position.path)
            .map(|run| RunPoint {
                run,
                offset: runs[run].len,
            }),
    }
}

pub(crate) fn selected_slices(runs: &[TextRun], range: ResolvedRange) -> Vec<Slice> {
    (range.start.run..=range.end.run)
        .filter_map(|run| {
            let start = if run == range.start.run {
                range.start.offset
            } else {
                0
            };
            let end = if run == range.end.run {
                range.end.offset
            } else {
                runs[run].len
            };
            (start < end).then_some(Slice { run, start, end })
        })
        .collect()
}

/// Paragraphs and headings whose subtree intersects the selection.
pub(crate) fn touched_textblocks(document: &Document, selection: &Selection) -> Vec<NodePath> {
    let start = selection.start();
    let end = selection.end();
    document
        .textblock_paths()
        .into_iter()
        .filter(|path| {
            let before = *path < start.path && !start.path.starts_with(path);
            let after = *path > end.path;
            !(before || after)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Run editing.

/// Split the run at `path` around `[start, end)` (character offsets) and
/// apply `edit` to the marks of the covered segment.
fn edit_run(
    document: &mut Document,
    path: &NodePath,
    start: usize,
    end: usize,
    edit: &dyn Fn(&mut Vec<Mark>),
) {
    let Some((parent_path, index)) = path.parent() else {
        return;
    };
    let Some(children) = document
        .node_at_mut(&parent_path)
        .and_then(Node::children_mut)
    else {
        return;
    };
    let Some(Node::Text { text, marks }) = children.get(index) else {
        return;
    };
    let text = text.clone();
    let marks = marks.clone();

    let from = byte_offset(&text, start);
    let to = byte_offset(&text, end);
    let mut covered_marks = marks.clone();
    edit(&mut covered_marks);

    let mut replacement = Vec::with_capacity(3);
    if from > 0 {
        replacement.push(Node::Text {
            text: text[..from].to_string(),
            marks: marks.clone(),
        });
    }
    replacement.push(Node::Text {
        text: text[from..to].to_string(),
        marks: covered_marks,
    });
    if to < text.len() {
        replacement.push(Node::Text {
            text: text[to..].to_string(),
            marks,
        });
    }
    children.splice(index..=index, replacement);
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}

fn plain_mark(kind: MarkKind) -> Option<Mark> {
    match kind {
        MarkKind::Bold => Some(Mark::Bold),
        MarkKind::Italic => Some(Mark::Italic),
        MarkKind::Underline => Some(Mark::Underline),
        MarkKind::Strike => Some(Mark::Strike),
        MarkKind::Link => None,
    }
}

fn run_href(run: &TextRun) -> Option<&str> {
    run.marks.iter().find_map(Mark::link_href)
}

enum LinkPrecondition {
    /// Any text target will do (setting a link).
    Any,
    /// The target must already carry a link (unsetting one).
    Required,
}

fn link_target_slices(
    runs: &[TextRun],
    selection: &Selection,
    precondition: LinkPrecondition,
) -> Option<Vec<Slice>> {
    if selection.is_collapsed() {
        let at = runs
            .iter()
            .position(|run| run.path == selection.start().path)?;
        let href = run_href(&runs[at])?;
        return Some(contiguous_link_run(runs, at, href));
    }

    let range = resolve_range(runs, selection)?;
    let slices = selected_slices(runs, range);
    if slices.is_empty() {
        return None;
    }
    if matches!(precondition, LinkPrecondition::Required)
        && !slices
            .iter()
            .any(|slice| has_kind(&runs[slice.run].marks, MarkKind::Link))
    {
        return None;
    }
    Some(slices)
}

/// Whole-run slices for the maximal run of adjacent siblings sharing
/// `href` around `at`.
fn contiguous_link_run(runs: &[TextRun], at: usize, href: &str) -> Vec<Slice> {
    let same_link = |index: usize| {
        adjacent_siblings(&runs[at].path, &runs[index].path) && run_href(&runs[index]) == Some(href)
    };
    let mut first = at;
    while first > 0 && same_link(first - 1) {
        first -= 1;
    }
    let mut last = at;
    while last + 1 < runs.len() && same_link(last + 1) {
        last += 1;
    }
    (first..=last)
        .map(|run| Slice {
            run,
            start: 0,
            end: runs[run].len,
        })
        .collect()
}

fn adjacent_siblings(a: &NodePath, b: &NodePath) -> bool {
    match (a.parent(), b.parent()) {
        (Some((parent_a, _)), Some((parent_b, _))) => parent_a == parent_b,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Block-level transforms.

fn retype_textblocks(
    document: &Document,
    selection: &Selection,
    level: Option<HeadingLevel>,
) -> Option<Document> {
    let paths = touched_textblocks(document, selection);
    if paths.is_empty() {
        return None;
    }
    let mut next = document.clone();
    for path in &paths {
        let Some(node) = next.node_at_mut(path) else {
            continue;
        };
        let current = std::mem::replace(node, Node::HorizontalRule);
        *node = retype_one(current, level);
    }
    (next != *document).then_some(next)
}

fn retype_one(node: Node, level: Option<HeadingLevel>) -> Node {
    let (text_align, content) = match node {
        Node::Paragraph { attrs, content } => (attrs.text_align, content),
        Node::Heading { attrs, content } => (attrs.text_align, content),
        other => return other,
    };
    match level {
        None => Node::Paragraph {
            attrs: BlockAttrs::aligned(text_align),
            content,
        },
        Some(level) => Node::Heading {
            attrs: HeadingAttrs { level, text_align },
            content,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Ordered,
}

fn make_list(kind: ListKind, content: Vec<Node>) -> Node {
    match kind {
        ListKind::Bullet => Node::BulletList { content },
        ListKind::Ordered => Node::OrderedList { content },
    }
}

fn is_list_of(node: &Node, kind: ListKind) -> bool {
    matches!(
        (node, kind),
        (Node::BulletList { .. }, ListKind::Bullet) | (Node::OrderedList { .. }, ListKind::Ordered)
    )
}

fn is_any_list(node: &Node) -> bool {
    matches!(node, Node::BulletList { .. } | Node::OrderedList { .. })
}

/// List toggling over the touched top-level blocks: same-type lists
/// unwrap, other-type lists retarget, text blocks wrap into a new list.
/// Anything else in the range rejects the command.
fn toggle_list(document: &Document, selection: &Selection, kind: ListKind) -> Option<Document> {
    let (low, high) = touched_top_range(document, selection)?;
    let touched = &document.blocks()[low..=high];
    let mut next = document.clone();

    if touched.iter().all(|block| is_list_of(block, kind)) {
        let mut hoisted = Vec::new();
        for block in touched {
            let Some(items) = block.children() else {
                continue;
            };
            for item in items {
                if let Node::ListItem { content } = item {
                    hoisted.extend(content.iter().cloned());
                }
            }
        }
        next.blocks_mut().splice(low..=high, hoisted);
    } else if touched.iter().all(is_any_list) {
        for block in &mut next.blocks_mut()[low..=high] {
            let current = std::mem::replace(block, Node::HorizontalRule);
            *block = match current {
                Node::BulletList { content } | Node::OrderedList { content } => {
                    make_list(kind, content)
                }
                other => other,
            };
        }
    } else if touched.iter().all(Node::is_textblock) {
        let items: Vec<Node> = touched
            .iter()
            .cloned()
            .map(|block| Node::ListItem {
                content: vec![block],
            })
            .collect();
        next.blocks_mut()
            .splice(low..=high, [make_list(kind, items)]);
    } else {
        return None;
    }
    (next != *document).then_some(next)
}

fn toggle_blockquote(document: &Document, selection: &Selection) -> Option<Document> {
    let (low, high) = touched_top_range(document, selection)?;
    let touched = &document.blocks()[low..=high];
    let mut next = document.clone();

    if touched
        .iter()
        .all(|block| matches!(block, Node::Blockquote { .. }))
    {
        let mut hoisted = Vec::new();
        for block in touched {
            if let Node::Blockquote { content } = block {
                hoisted.extend(content.iter().cloned());
            }
        }
        next.blocks_mut().splice(low..=high, hoisted);
    } else {
        let wrapped = touched.to_vec();
        next.blocks_mut()
            .splice(low..=high, [Node::Blockquote { content: wrapped }]);
    }
    (next != *document).then_some(next)
}

fn touched_top_range(document: &Document, selection: &Selection) -> Option<(usize, usize)> {
    let low = selection.start().path.top_index()?;
    let high = selection.end().path.top_index()?;
    let last = document.blocks().len().checked_sub(1)?;
    Some((low.min(last), high.min(last)))
}

fn insert_block(document: &Document, selection: &Selection, block: Node) -> Document {
    let mut next = document.clone();
    let at = selection
        .focus
        .path
        .top_index()
        .map_or(next.blocks().len(), |index| {
            (index + 1).min(next.blocks().len())
        });
    next.blocks_mut().insert(at, block);
    next
}
