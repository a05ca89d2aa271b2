//! Document serialization: a versioned JSON envelope and the HTML subset the
//! editor reads and writes.

use serde::{Deserialize, Serialize};

use crate::core::{
    BLOCKQUOTE, BubbleType, CHAT_BUBBLE, CODE_BLOCK, DIVIDER, Document, ElementNode, HEADING,
    LIST_ITEM, Marks, Node, PARAGRAPH, TextNode,
};

/// `data-node-type` value marking a chat bubble `div`.
const CHAT_BUBBLE_NODE_TYPE: &str = "chatBubble";

const DEFAULT_SCHEMA: &str = "jotter";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },
    #[error("unsupported schema `{schema}` version {version}")]
    UnsupportedSchema { schema: String, version: u32 },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Versioned JSON envelope for a stored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub document: Document,
}

impl DocValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            document,
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, MarkupError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, MarkupError> {
        let value: Self = serde_json::from_str(s)?;
        if value.schema != DEFAULT_SCHEMA || value.version > DEFAULT_VERSION {
            return Err(MarkupError::UnsupportedSchema {
                schema: value.schema,
                version: value.version,
            });
        }
        Ok(value)
    }
}

pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    write_blocks(&doc.children, &mut out);
    out
}

fn write_blocks(blocks: &[Node], out: &mut String) {
    let mut ix = 0;
    while ix < blocks.len() {
        match &blocks[ix] {
            Node::Element(el) if el.kind == LIST_ITEM => {
                let list_type = el.attr_str("list_type").unwrap_or("bulleted");
                let tag = if list_type == "ordered" { "ol" } else { "ul" };
                out.push_str(&format!("<{tag}>"));
                while let Some(Node::Element(item)) = blocks.get(ix) {
                    if item.kind != LIST_ITEM || item.attr_str("list_type").unwrap_or("bulleted") != list_type {
                        break;
                    }
                    out.push_str("<li><p>");
                    write_inlines(&item.children, out);
                    out.push_str("</p></li>");
                    ix += 1;
                }
                out.push_str(&format!("</{tag}>"));
                continue;
            }
            Node::Element(el) => write_element(el, out),
            Node::Void(v) if v.kind == DIVIDER => out.push_str("<hr>"),
            Node::Void(_) => {}
            Node::Text(t) => {
                out.push_str("<p>");
                write_text(t, out);
                out.push_str("</p>");
            }
        }
        ix += 1;
    }
}

fn write_element(el: &ElementNode, out: &mut String) {
    match el.kind.as_str() {
        HEADING => {
            let level = el.attr_u64("level").unwrap_or(1).clamp(1, 6);
            out.push_str(&format!("<h{level}>"));
            write_inlines(&el.children, out);
            out.push_str(&format!("</h{level}>"));
        }
        BLOCKQUOTE => {
            out.push_str("<blockquote>");
            write_blocks(&el.children, out);
            out.push_str("</blockquote>");
        }
        CHAT_BUBBLE => {
            let bubble_type = el
                .attr_str("bubble_type")
                .and_then(BubbleType::parse)
                .unwrap_or_default();
            out.push_str("<div class=\"chat-bubble\" data-type=\"");
            out.push_str(bubble_type.as_str());
            out.push_str("\" data-sender=\"");
            escape_into(el.attr_str("sender").unwrap_or(""), out);
            out.push_str("\" data-node-type=\"");
            out.push_str(CHAT_BUBBLE_NODE_TYPE);
            out.push_str("\">");
            write_inlines(&el.children, out);
            out.push_str("</div>");
        }
        CODE_BLOCK => {
            out.push_str("<pre><code>");
            escape_into(&el.text(), out);
            out.push_str("</code></pre>");
        }
        _ => {
            out.push_str("<p>");
            write_inlines(&el.children, out);
            out.push_str("</p>");
        }
    }
}

fn write_inlines(children: &[Node], out: &mut String) {
    for node in children {
        if let Node::Text(t) = node {
            write_text(t, out);
        }
    }
}

fn write_text(t: &TextNode, out: &mut String) {
    if t.text.is_empty() {
        return;
    }
    let m = &t.marks;
    let mut close: Vec<&str> = Vec::new();
    if let Some(href) = &m.link {
        out.push_str("<a href=\"");
        escape_into(href, out);
        out.push_str("\">");
        close.push("</a>");
    }
    for (on, open, end) in [
        (m.bold, "<strong>", "</strong>"),
        (m.italic, "<em>", "</em>"),
        (m.strikethrough, "<s>", "</s>"),
        (m.code, "<code>", "</code>"),
    ] {
        if on {
            out.push_str(open);
            close.push(end);
        }
    }
    escape_into(&t.text, out);
    for end in close.iter().rev() {
        out.push_str(end);
    }
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';').filter(|&i| i <= 10) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let decoded = match &rest[1..semi] {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            entity => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Html {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<Html>,
    },
    Text(String),
}

const VOID_TAGS: [&str; 4] = ["hr", "br", "img", "input"];

fn parse_tree(input: &str) -> Result<Vec<Html>, MarkupError> {
    // Each frame is an open element; the bottom frame is the synthetic root.
    let mut stack: Vec<(String, Vec<(String, String)>, Vec<Html>)> =
        vec![(String::new(), Vec::new(), Vec::new())];
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(lt) = rest.find('<') else {
            push_text(&mut stack, rest);
            break;
        };
        if lt > 0 {
            push_text(&mut stack, &rest[..lt]);
        }
        let tag_start = pos + lt;
        let Some(gt) = input[tag_start..].find('>') else {
            return Err(MarkupError::UnterminatedTag { offset: tag_start });
        };
        let tag = &input[tag_start + 1..tag_start + gt];
        pos = tag_start + gt + 1;

        if tag.starts_with('!') || tag.starts_with('?') {
            continue;
        }
        if let Some(name) = tag.strip_prefix('/') {
            let name = name.trim().to_ascii_lowercase();
            if let Some(depth) = stack.iter().rposition(|(open, _, _)| *open == name) {
                if depth == 0 {
                    continue;
                }
                while stack.len() > depth {
                    close_top(&mut stack);
                }
            }
            continue;
        }

        let self_closing = tag.ends_with('/');
        let tag = tag.trim_end_matches('/');
        let (name, attrs) = parse_tag(tag);
        if self_closing || VOID_TAGS.contains(&name.as_str()) {
            if let Some((_, _, children)) = stack.last_mut() {
                children.push(Html::Element {
                    name,
                    attrs,
                    children: Vec::new(),
                });
            }
        } else {
            stack.push((name, attrs, Vec::new()));
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    Ok(stack.pop().map(|(_, _, children)| children).unwrap_or_default())
}

fn push_text(stack: &mut [(String, Vec<(String, String)>, Vec<Html>)], text: &str) {
    if let Some((_, _, children)) = stack.last_mut() {
        children.push(Html::Text(unescape(text)));
    }
}

fn close_top(stack: &mut Vec<(String, Vec<(String, String)>, Vec<Html>)>) {
    if let Some((name, attrs, children)) = stack.pop() {
        if let Some((_, _, parent)) = stack.last_mut() {
            parent.push(Html::Element {
                name,
                attrs,
                children,
            });
        }
    }
}

fn parse_tag(tag: &str) -> (String, Vec<(String, String)>) {
    let tag = tag.trim();
    let name_end = tag.find(char::is_whitespace).unwrap_or(tag.len());
    let name = tag[..name_end].to_ascii_lowercase();
    let mut attrs = Vec::new();
    let mut rest = tag[name_end..].trim_start();

    while !rest.is_empty() {
        let key_end = rest
            .find(|c: char| c == '=' || c.is_whitespace())
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();
        let mut value = String::new();
        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (raw, remaining) = match after_eq.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(q).unwrap_or(body.len());
                    (&body[..end], body.get(end + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            value = unescape(raw);
            rest = remaining.trim_start();
        }
        if !key.is_empty() {
            attrs.push((key, value));
        }
    }
    (name, attrs)
}

/// Parses the HTML the editor produces back into a document.
///
/// Unknown tags are unwrapped and their content kept. An input without any
/// block content yields an empty document, which normalizes to one paragraph.
pub fn from_html(input: &str) -> Result<Document, MarkupError> {
    let tree = parse_tree(input)?;
    let mut blocks = Vec::new();
    read_blocks(&tree, &mut blocks);
    Ok(Document { children: blocks })
}

fn read_blocks(nodes: &[Html], out: &mut Vec<Node>) {
    let mut pending: Vec<Node> = Vec::new();
    for node in nodes {
        let (name, attrs, children) = match node {
            Html::Text(text) => {
                if !text.trim().is_empty() {
                    pending.push(Node::text(text.clone()));
                }
                continue;
            }
            Html::Element {
                name,
                attrs,
                children,
            } => (name.as_str(), attrs, children),
        };

        let block = match name {
            "div" if attr(attrs, "data-node-type") == Some(CHAT_BUBBLE_NODE_TYPE) => {
                let bubble_type = attr(attrs, "data-type")
                    .and_then(BubbleType::parse)
                    .unwrap_or_default();
                let sender = attr(attrs, "data-sender").unwrap_or("");
                Some(text_block(
                    CHAT_BUBBLE,
                    vec![
                        ("bubble_type", serde_json::Value::from(bubble_type.as_str())),
                        ("sender", serde_json::Value::from(sender)),
                    ],
                    children,
                ))
            }
            "p" => Some(text_block(PARAGRAPH, Vec::new(), children)),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level: u64 = name[1..].parse().unwrap_or(1);
                Some(text_block(
                    HEADING,
                    vec![("level", serde_json::Value::from(level))],
                    children,
                ))
            }
            "pre" => Some(Node::code_block(plain_text(children))),
            "hr" => Some(Node::divider()),
            "blockquote" => {
                let mut inner = Vec::new();
                read_blocks(children, &mut inner);
                Some(Node::blockquote(inner))
            }
            "ul" | "ol" => {
                flush_pending(&mut pending, out);
                let list_type = if name == "ol" { "ordered" } else { "bulleted" };
                read_list(children, list_type, out);
                continue;
            }
            "strong" | "b" | "em" | "i" | "s" | "strike" | "del" | "code" | "a" | "span" | "br" => {
                read_inlines(std::slice::from_ref(node), &Marks::default(), &mut pending);
                continue;
            }
            _ => {
                flush_pending(&mut pending, out);
                read_blocks(children, out);
                continue;
            }
        };

        flush_pending(&mut pending, out);
        out.extend(block);
    }
    flush_pending(&mut pending, out);
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn flush_pending(pending: &mut Vec<Node>, out: &mut Vec<Node>) {
    if pending.is_empty() {
        return;
    }
    out.push(Node::Element(ElementNode {
        kind: PARAGRAPH.to_string(),
        attrs: Default::default(),
        children: std::mem::take(pending),
    }));
}

fn read_list(items: &[Html], list_type: &str, out: &mut Vec<Node>) {
    for item in items {
        let Html::Element { name, children, .. } = item else {
            continue;
        };
        if name != "li" {
            continue;
        }
        let mut blocks = Vec::new();
        read_blocks(children, &mut blocks);
        if blocks.is_empty() {
            blocks.push(Node::paragraph(""));
        }
        for block in blocks {
            let Node::Element(mut el) = block else {
                continue;
            };
            if el.kind != PARAGRAPH && el.kind != HEADING {
                continue;
            }
            el.kind = LIST_ITEM.to_string();
            el.attrs.clear();
            el.attrs
                .insert("list_type".to_string(), serde_json::Value::from(list_type));
            out.push(Node::Element(el));
        }
    }
}

fn text_block(kind: &str, attrs: Vec<(&str, serde_json::Value)>, children: &[Html]) -> Node {
    let mut inlines = Vec::new();
    read_inlines(children, &Marks::default(), &mut inlines);
    Node::Element(ElementNode {
        kind: kind.to_string(),
        attrs: attrs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        children: inlines,
    })
}

fn read_inlines(nodes: &[Html], marks: &Marks, out: &mut Vec<Node>) {
    for node in nodes {
        match node {
            Html::Text(text) => {
                if !text.is_empty() {
                    out.push(Node::Text(TextNode {
                        text: text.clone(),
                        marks: marks.clone(),
                    }));
                }
            }
            Html::Element {
                name,
                attrs,
                children,
            } => {
                let mut marks = marks.clone();
                match name.as_str() {
                    "strong" | "b" => marks.bold = true,
                    "em" | "i" => marks.italic = true,
                    "s" | "strike" | "del" => marks.strikethrough = true,
                    "code" => marks.code = true,
                    "a" => {
                        marks.link = attrs
                            .iter()
                            .find(|(k, _)| k == "href")
                            .map(|(_, v)| v.clone());
                    }
                    "br" => {
                        out.push(Node::Text(TextNode {
                            text: "\n".to_string(),
                            marks,
                        }));
                        continue;
                    }
                    _ => {}
                }
                read_inlines(children, &marks, out);
            }
        }
    }
}

fn plain_text(nodes: &[Html]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Html::Text(text) => out.push_str(text),
            Html::Element { name, children, .. } => {
                if name == "br" {
                    out.push('\n');
                } else {
                    out.push_str(&plain_text(children));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_handles_named_and_numeric_entities() {
        assert_eq!(unescape("a &amp; b &lt;c&gt; &#65;&#x42; &bogus; &"), "a & b <c> AB &bogus; &");
    }

    #[test]
    fn parse_tree_recovers_from_unclosed_tags() {
        let tree = parse_tree("<p>one<strong>two</p><p>three</p>").unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn parse_tag_reads_quoted_attrs() {
        let (name, attrs) = parse_tag("a href=\"https://x.test/?a=1&amp;b=2\" target=_blank");
        assert_eq!(name, "a");
        assert_eq!(
            attrs,
            vec![
                ("href".to_string(), "https://x.test/?a=1&b=2".to_string()),
                ("target".to_string(), "_blank".to_string()),
            ]
        );
    }
}
