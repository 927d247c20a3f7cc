#![deny(clippy::all, clippy::pedantic)]

//! The persisted content exchange format: explicit `type` discriminators,
//! `attrs` objects, and camelCase attribute names.

use pressbox::application::collaborators::PostPayload;
use pressbox::domain::document::{
    Align, BlockAttrs, Document, HeadingAttrs, HeadingLevel, ImageAttrs, LinkAttrs, Mark, Node,
};

fn sample_document() -> Document {
    Document::from_blocks(vec![
        Node::Heading {
            attrs: HeadingAttrs {
                level: HeadingLevel::H2,
                text_align: Align::Left,
            },
            content: vec![Node::text("Lançamento adiado")],
        },
        Node::Paragraph {
            attrs: BlockAttrs::aligned(Align::Justify),
            content: vec![
                Node::text("Segundo "),
                Node::marked_text(
                    "fontes",
                    vec![
                        Mark::Italic,
                        Mark::Link {
                            attrs: LinkAttrs {
                                href: "https://example.com/fontes".to_string(),
                            },
                        },
                    ],
                ),
                Node::marked_text(", nada confirmado.", vec![Mark::Bold]),
            ],
        },
        Node::BulletList {
            content: vec![
                Node::ListItem {
                    content: vec![Node::paragraph(vec![Node::text("Sem data nova")])],
                },
                Node::ListItem {
                    content: vec![Node::paragraph(vec![Node::marked_text(
                        "Ações caíram",
                        vec![Mark::Strike],
                    )])],
                },
            ],
        },
        Node::Blockquote {
            content: vec![Node::paragraph(vec![Node::marked_text(
                "Aguardem novidades.",
                vec![Mark::Underline],
            )])],
        },
        Node::HorizontalRule,
        Node::Image {
            attrs: ImageAttrs {
                src: "https://cdn.example.com/capa.png".to_string(),
                alt: "capa.png".to_string(),
                title: "capa.png".to_string(),
            },
        },
    ])
    .expect("valid document")
}

#[test]
fn documents_serialize_to_the_tagged_tree() {
    let json = serde_json::to_value(sample_document()).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "type": "doc",
            "content": [
                {
                    "type": "heading",
                    "attrs": { "level": 2 },
                    "content": [{ "type": "text", "text": "Lançamento adiado" }],
                },
                {
                    "type": "paragraph",
                    "attrs": { "textAlign": "justify" },
                    "content": [
                        { "type": "text", "text": "Segundo " },
                        {
                            "type": "text",
                            "text": "fontes",
                            "marks": [
                                { "type": "italic" },
                                { "type": "link", "attrs": { "href": "https://example.com/fontes" } },
                            ],
                        },
                        {
                            "type": "text",
                            "text": ", nada confirmado.",
                            "marks": [{ "type": "bold" }],
                        },
                    ],
                },
                {
                    "type": "bulletList",
                    "content": [
                        {
                            "type": "listItem",
                            "content": [{
                                "type": "paragraph",
                                "content": [{ "type": "text", "text": "Sem data nova" }],
                            }],
                        },
                        {
                            "type": "listItem",
                            "content": [{
                                "type": "paragraph",
                                "content": [{
                                    "type": "text",
                                    "text": "Ações caíram",
                                    "marks": [{ "type": "strike" }],
                                }],
                            }],
                        },
                    ],
                },
                {
                    "type": "blockquote",
                    "content": [{
                        "type": "paragraph",
                        "content": [{
                            "type": "text",
                            "text": "Aguardem novidades.",
                            "marks": [{ "type": "underline" }],
                        }],
                    }],
                },
                { "type": "horizontalRule" },
                {
                    "type": "image",
                    "attrs": {
                        "src": "https://cdn.example.com/capa.png",
                        "alt": "capa.png",
                        "title": "capa.png",
                    },
                },
            ],
        })
    );
}

#[test]
fn serialized_documents_parse_back_identically() {
    let document = sample_document();
    let json = serde_json::to_string(&document).expect("serialize");
    let parsed = Document::from_json(&json).expect("parse");
    assert_eq!(parsed, document);
}

#[test]
fn documents_with_explicit_left_alignment_parse_without_attrs() {
    let json = r#"{
        "type": "doc",
        "content": [
            { "type": "paragraph", "attrs": { "textAlign": "left" }, "content": [] },
            { "type": "paragraph" }
        ]
    }"#;
    let document = Document::from_json(json).expect("parse");
    assert_eq!(document.blocks()[0], document.blocks()[1]);
}

#[test]
fn invalid_trees_are_rejected() {
    // H1 is reserved for the post title.
    assert!(
        Document::from_json(
            r#"{"type":"doc","content":[{"type":"heading","attrs":{"level":1},"content":[]}]}"#
        )
        .is_err()
    );
    // Text cannot float at block level.
    assert!(
        Document::from_json(r#"{"type":"doc","content":[{"type":"text","text":"x"}]}"#).is_err()
    );
    // Lists hold only list items.
    assert!(
        Document::from_json(
            r#"{"type":"doc","content":[{"type":"bulletList","content":[{"type":"paragraph"}]}]}"#
        )
        .is_err()
    );
    // A document is never empty.
    assert!(Document::from_json(r#"{"type":"doc","content":[]}"#).is_err());
}

#[test]
fn save_payload_uses_camel_case_content_json() {
    let payload = PostPayload {
        title: "GTA 6 pode ser adiado".to_string(),
        slug: "gta-6-pode-ser-adiado".to_string(),
        excerpt: "Rumores.".to_string(),
        content_json: Document::empty(),
    };
    let json = serde_json::to_value(&payload).expect("serialize");
    assert_eq!(
        json,
        serde_json::json!({
            "title": "GTA 6 pode ser adiado",
            "slug": "gta-6-pode-ser-adiado",
            "excerpt": "Rumores.",
            "contentJson": {
                "type": "doc",
                "content": [{ "type": "paragraph" }],
            },
        })
    );
}
