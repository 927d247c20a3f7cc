//! Toolbar format projection.
//!
//! One pure function computes every active-state the toolbar needs, so
//! highlighting logic cannot diverge across call sites. A mark or block
//! attribute is reported active only when it covers the entire selection;
//! mixed coverage resolves to inactive.

use crate::domain::document::{Align, Document, HeadingLevel, MarkKind, Node, has_kind};
use crate::domain::edits::{resolve_range, selected_slices, touched_textblocks};
use crate::domain::selection::{NodePath, Selection};

/// Uniform text-block kind under a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBlockKind {
    Paragraph,
    Heading(HeadingLevel),
}

/// Active-format projection consumed on every render. Safe to recompute
/// per interaction; it never mutates and never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub link: bool,
    /// `Some` when every touched text block shares one kind.
    pub text_block: Option<TextBlockKind>,
    pub bullet_list: bool,
    pub ordered_list: bool,
    pub blockquote: bool,
    /// `Some` when every touched text block shares one alignment.
    pub align: Option<Align>,
}

/// Resolve the toolbar state for `selection` over `document`.
pub fn resolve(document: &Document, selection: &Selection) -> FormatState {
    let mut state = FormatState::default();

    let runs = document.text_runs();
    let covered: Vec<usize> = if selection.is_collapsed() {
        runs.iter()
            .position(|run| run.path == selection.start().path)
            .into_iter()
            .collect()
    } else {
        resolve_range(&runs, selection)
            .map(|range| {
                selected_slices(&runs, range)
                    .into_iter()
                    .map(|slice| slice.run)
                    .collect()
            })
            .unwrap_or_default()
    };
    if !covered.is_empty() {
        let uniform =
            |kind: MarkKind| covered.iter().all(|&index| has_kind(&runs[index].marks, kind));
        state.bold = uniform(MarkKind::Bold);
        state.italic = uniform(MarkKind::Italic);
        state.underline = uniform(MarkKind::Underline);
        state.strike = uniform(MarkKind::Strike);
        state.link = uniform(MarkKind::Link);
    }

    let textblocks = touched_textblocks(document, selection);
    if textblocks.is_empty() {
        return state;
    }

    let mut kinds = textblocks.iter().filter_map(|path| {
        match document.node_at(path) {
            Some(Node::Paragraph { .. }) => Some(TextBlockKind::Paragraph),
            Some(Node::Heading { attrs, .. }) => Some(TextBlockKind::Heading(attrs.level)),
            _ => None,
        }
    });
    if let Some(first) = kinds.next() {
        if kinds.all(|kind| kind == first) {
            state.text_block = Some(first);
        }
    }

    let mut aligns = textblocks
        .iter()
        .filter_map(|path| document.node_at(path).and_then(Node::text_align));
    if let Some(first) = aligns.next() {
        if aligns.all(|align| align == first) {
            state.align = Some(first);
        }
    }

    state.bullet_list = textblocks
        .iter()
        .all(|path| has_ancestor(document, path, AncestorKind::BulletList));
    state.ordered_list = textblocks
        .iter()
        .all(|path| has_ancestor(document, path, AncestorKind::OrderedList));
    state.blockquote = textblocks
        .iter()
        .all(|path| has_ancestor(document, path, AncestorKind::Blockquote));

    state
}

#[derive(Debug, Clone, Copy)]
enum AncestorKind {
    BulletList,
    OrderedList,
    Blockquote,
}

fn has_ancestor(document: &Document, path: &NodePath, kind: AncestorKind) -> bool {
    let indices = path.indices();
    (1..indices.len()).any(|depth| {
        let prefix = NodePath::new(indices[..depth].to_vec());
        matches!(
            (document.node_at(&prefix), kind),
            (Some(Node::BulletList { .. }), AncestorKind::BulletList)
                | (Some(Node::OrderedList { .. }), AncestorKind::OrderedList)
                | (Some(Node::Blockquote { .. }), AncestorKind::Blockquote)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{LinkAttrs, Mark};
    use crate::domain::selection::Position;

    fn doc(blocks: Vec<Node>) -> Document {
        Document::from_blocks(blocks).expect("valid document")
    }

    fn path(indices: &[usize]) -> NodePath {
        NodePath::new(indices.to_vec())
    }

    fn select(from: (&[usize], usize), to: (&[usize], usize)) -> Selection {
        Selection::range(
            Position::new(path(from.0), from.1),
            Position::new(path(to.0), to.1),
        )
    }

    #[test]
    fn uniform_mark_coverage_reports_active() {
        let document = doc(vec![Node::paragraph(vec![
            Node::marked_text("all", vec![Mark::Bold]),
            Node::marked_text(" bold", vec![Mark::Bold, Mark::Italic]),
        ])]);
        let selection = select((&[0, 0], 0), (&[0, 1], 5));

        let state = resolve(&document, &selection);
        assert!(state.bold);
        assert!(!state.italic);
    }

    #[test]
    fn mixed_mark_coverage_resolves_to_inactive() {
        let document = doc(vec![Node::paragraph(vec![
            Node::marked_text("bold", vec![Mark::Bold]),
            Node::text("plain"),
        ])]);
        let selection = select((&[0, 0], 0), (&[0, 1], 5));

        let state = resolve(&document, &selection);
        assert!(!state.bold);
    }

    #[test]
    fn collapsed_cursor_reports_the_run_it_sits_in() {
        let document = doc(vec![Node::paragraph(vec![
            Node::text("plain "),
            Node::marked_text(
                "linked",
                vec![Mark::Link {
                    attrs: LinkAttrs {
                        href: "https://example.com".to_string(),
                    },
                }],
            ),
        ])]);
        let caret = Selection::caret(Position::new(path(&[0, 1]), 3));

        let state = resolve(&document, &caret);
        assert!(state.link);
        assert!(!state.bold);
    }

    #[test]
    fn block_kind_is_uniform_or_absent() {
        let document = doc(vec![
            Node::heading(HeadingLevel::H2, vec![Node::text("title")]),
            Node::paragraph(vec![Node::text("body")]),
        ]);

        let heading_only = Selection::caret(Position::new(path(&[0, 0]), 0));
        assert_eq!(
            resolve(&document, &heading_only).text_block,
            Some(TextBlockKind::Heading(HeadingLevel::H2))
        );

        let spanning = select((&[0, 0], 0), (&[1, 0], 4));
        assert_eq!(resolve(&document, &spanning).text_block, None);
    }

    #[test]
    fn list_and_quote_containment_follow_uniform_coverage() {
        let document = doc(vec![
            Node::BulletList {
                content: vec![Node::ListItem {
                    content: vec![Node::paragraph(vec![Node::text("inside")])],
                }],
            },
            Node::paragraph(vec![Node::text("outside")]),
        ]);

        let inside = Selection::caret(Position::new(path(&[0, 0, 0, 0]), 0));
        let state = resolve(&document, &inside);
        assert!(state.bullet_list);
        assert!(!state.ordered_list);
        assert!(!state.blockquote);

        let spanning = select((&[0, 0, 0, 0], 0), (&[1, 0], 3));
        assert!(!resolve(&document, &spanning).bullet_list);
    }

    #[test]
    fn alignment_reports_only_uniform_values() {
        let document = doc(vec![
            Node::Paragraph {
                attrs: crate::domain::document::BlockAttrs::aligned(Align::Center),
                content: vec![Node::text("centered")],
            },
            Node::paragraph(vec![Node::text("left")]),
        ]);

        let first = Selection::caret(Position::new(path(&[0, 0]), 0));
        assert_eq!(resolve(&document, &first).align, Some(Align::Center));

        let spanning = select((&[0, 0], 0), (&[1, 0], 4));
        assert_eq!(resolve(&document, &spanning).align, None);
    }

    #[test]
    fn empty_document_reports_paragraph_at_the_caret() {
        let document = Document::empty();
        let caret = Selection::document_start();

        let state = resolve(&document, &caret);
        assert_eq!(state.text_block, Some(TextBlockKind::Paragraph));
        assert_eq!(state.align, Some(Align::Left));
        assert!(!state.bold);
    }

    #[test]
    fn toggling_twice_restores_the_projection() {
        let document = doc(vec![Node::paragraph(vec![Node::text("hello world")])]);
        let selection = select((&[0, 0], 0), (&[0, 0], 5));
        let before = resolve(&document, &selection);

        let once = crate::domain::edits::toggle_mark(&document, &selection, MarkKind::Bold)
            .expect("applies");
        assert!(resolve(&once, &selection).bold);

        let twice =
            crate::domain::edits::toggle_mark(&once, &selection, MarkKind::Bold).expect("applies");
        assert_eq!(resolve(&twice, &selection), before);
    }
}
