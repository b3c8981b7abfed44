//! Rich text as delivered by the CMS, and its plain-text and HTML renderings.
//!
//! A rich text field is a flat list of blocks. Each block carries its text
//! and a list of spans that mark character ranges as bold, italic, links or
//! custom labels:
//!
//! ```json
//! [
//!   { "type": "heading2", "text": "Setup", "spans": [] },
//!   { "type": "paragraph", "text": "Run the installer.",
//!     "spans": [{ "start": 4, "end": 17, "type": "strong" }] },
//!   { "type": "list-item", "text": "one", "spans": [] },
//!   { "type": "list-item", "text": "two", "spans": [] }
//! ]
//! ```
//!
//! Span offsets count Unicode scalar values, not bytes. Offsets past the end
//! of the text are clamped and empty ranges are dropped, so malformed spans
//! degrade to plain text instead of failing the build.
//!
//! Lists have no container block: runs of consecutive `list-item` blocks
//! become one `<ul>`, runs of `o-list-item` one `<ol>`.

use crate::types::null_as_default;
use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A rich text field.
pub type RichText = Vec<Block>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: BlockKind,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,
    /// Image source, for `image` blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Oembed>,
}

impl Block {
    /// A block of the given kind with unstyled text.
    pub fn text(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    /// Block types this renderer does not know; rendered as paragraphs.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Oembed {
    pub html: Option<String>,
    pub embed_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: SpanData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Other,
}

/// Span payload. Hyperlinks use `url`/`target` (web links) or `uid`
/// (links to another post), labels use `label`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Plain text of a rich text field: block texts joined by a single space.
///
/// Image and embed blocks carry no readable text and are skipped.
pub fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter(|b| !matches!(b.kind, BlockKind::Image | BlockKind::Embed))
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a rich text field as HTML.
pub fn as_html(blocks: &[Block]) -> Markup {
    let mut parts = Vec::new();
    let mut iter = blocks.iter().peekable();

    while let Some(block) = iter.next() {
        match block.kind {
            BlockKind::ListItem | BlockKind::OListItem => {
                let kind = block.kind;
                let mut items = vec![block];
                while let Some(next) = iter.next_if(|b| b.kind == kind) {
                    items.push(next);
                }
                parts.push(render_list(kind, &items));
            }
            _ => parts.push(render_block(block)),
        }
    }

    html! {
        @for part in &parts {
            (part)
        }
    }
}

fn render_list(kind: BlockKind, items: &[&Block]) -> Markup {
    let lis = html! {
        @for item in items {
            li { (render_spans(&item.text, &item.spans, true)) }
        }
    };
    if kind == BlockKind::OListItem {
        html! { ol { (lis) } }
    } else {
        html! { ul { (lis) } }
    }
}

fn render_block(block: &Block) -> Markup {
    let preformatted = block.kind == BlockKind::Preformatted;
    let inner = render_spans(&block.text, &block.spans, !preformatted);

    match block.kind {
        BlockKind::Heading1 => html! { h1 { (inner) } },
        BlockKind::Heading2 => html! { h2 { (inner) } },
        BlockKind::Heading3 => html! { h3 { (inner) } },
        BlockKind::Heading4 => html! { h4 { (inner) } },
        BlockKind::Heading5 => html! { h5 { (inner) } },
        BlockKind::Heading6 => html! { h6 { (inner) } },
        BlockKind::Preformatted => html! { pre { (inner) } },
        BlockKind::ListItem | BlockKind::OListItem => html! { li { (inner) } },
        BlockKind::Image => match &block.url {
            Some(url) => html! {
                p.block-img {
                    img src=(url) alt=(block.alt.as_deref().unwrap_or(""));
                }
            },
            None => html! {},
        },
        BlockKind::Embed => match &block.oembed {
            // The embed snippet comes from the CMS's oEmbed provider and is
            // inserted as-is.
            Some(Oembed {
                html: Some(snippet),
                embed_url,
            }) => html! {
                div data-oembed=[embed_url.as_deref()] {
                    (PreEscaped(snippet))
                }
            },
            _ => html! {},
        },
        BlockKind::Paragraph | BlockKind::Other => html! { p { (inner) } },
    }
}

/// A span clamped to the block's character range.
#[derive(Clone, Copy)]
struct Mark<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

fn render_spans(text: &str, spans: &[Span], line_breaks: bool) -> Markup {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let marks: Vec<Mark<'_>> = spans
        .iter()
        .map(|span| Mark {
            start: span.start.min(len),
            end: span.end.min(len),
            span,
        })
        .filter(|m| m.start < m.end)
        .collect();

    render_range(&chars, 0, len, marks, line_breaks)
}

/// Render `chars[start..end]`, wrapping each mark around its range.
///
/// Marks are opened in order of start (longest first on ties). A mark that
/// overlaps the end of an enclosing one is split at the boundary, so the
/// output is always well-nested.
fn render_range(
    chars: &[char],
    start: usize,
    end: usize,
    mut marks: Vec<Mark<'_>>,
    line_breaks: bool,
) -> Markup {
    marks.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut queue: VecDeque<Mark<'_>> = marks.into();
    let mut parts = Vec::new();
    let mut cursor = start;

    while let Some(mark) = queue.pop_front() {
        if cursor < mark.start {
            parts.push(render_text(&chars[cursor..mark.start], line_breaks));
        }

        let mut inner = Vec::new();
        let mut rest = Vec::new();
        for other in queue.drain(..) {
            if other.start < mark.end {
                inner.push(Mark {
                    end: other.end.min(mark.end),
                    ..other
                });
                if other.end > mark.end {
                    rest.push(Mark {
                        start: mark.end,
                        ..other
                    });
                }
            } else {
                rest.push(other);
            }
        }
        rest.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        queue = rest.into();

        let content = render_range(chars, mark.start, mark.end, inner, line_breaks);
        parts.push(wrap_span(mark.span, content));
        cursor = mark.end;
    }

    if cursor < end {
        parts.push(render_text(&chars[cursor..end], line_breaks));
    }

    html! {
        @for part in &parts {
            (part)
        }
    }
}

fn render_text(chars: &[char], line_breaks: bool) -> Markup {
    let text: String = chars.iter().collect();
    if !line_breaks {
        return html! { (text) };
    }
    html! {
        @for (i, line) in text.split('\n').enumerate() {
            @if i > 0 {
                br;
            }
            (line)
        }
    }
}

fn wrap_span(span: &Span, inner: Markup) -> Markup {
    match span.kind {
        SpanKind::Strong => html! { strong { (inner) } },
        SpanKind::Em => html! { em { (inner) } },
        SpanKind::Hyperlink => match link_href(&span.data) {
            Some(href) => {
                let target = span.data.target.as_deref();
                html! {
                    a href=(href) target=[target] rel=[target.map(|_| "noopener noreferrer")] {
                        (inner)
                    }
                }
            }
            None => inner,
        },
        SpanKind::Label => html! {
            span class=[span.data.label.as_deref()] { (inner) }
        },
        SpanKind::Other => inner,
    }
}

/// Resolve a hyperlink target. Links to other posts resolve to their page;
/// script URLs are dropped.
fn link_href(data: &SpanData) -> Option<String> {
    if let Some(url) = &data.url {
        let lowered = url.trim_start().to_ascii_lowercase();
        if lowered.starts_with("javascript:") || lowered.starts_with("vbscript:") {
            return None;
        }
        return Some(url.clone());
    }
    data.uid
        .as_deref()
        .filter(|uid| crate::types::is_path_safe_uid(uid))
        .map(|uid| format!("/post/{}/", uid))
}
