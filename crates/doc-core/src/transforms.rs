use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{
    BLOCKQUOTE, BubbleType, CHAT_BUBBLE, CODE_BLOCK, Document, ElementNode, HEADING, LIST_ITEM,
    Marks, Node, PARAGRAPH, Point, Selection, TextNode, children_ref, clamp_to_char_boundary,
    node_ref,
};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{ChildConstraint, PluginRegistry};

/// Read-only view of the state a structural transform runs against.
///
/// The chain builder feeds its draft document through the same transforms the
/// registry commands use, so they never touch an [`crate::Editor`] directly.
#[derive(Clone, Copy)]
pub struct BlockCx<'a> {
    pub doc: &'a Document,
    pub selection: &'a Selection,
    pub registry: &'a PluginRegistry,
}

impl<'a> BlockCx<'a> {
    pub fn new(doc: &'a Document, selection: &'a Selection, registry: &'a PluginRegistry) -> Self {
        Self {
            doc,
            selection,
            registry,
        }
    }

    pub fn focus_block(&self) -> Option<(&'a [usize], &'a ElementNode)> {
        let block_path = self.selection.focus.path.split_last().map(|(_, p)| p)?;
        match node_ref(self.doc, block_path)? {
            Node::Element(el) => Some((block_path, el)),
            _ => None,
        }
    }

    fn text_block(&self) -> Result<(&'a [usize], &'a ElementNode), TransformError> {
        let (path, el) = self.focus_block().ok_or(TransformError::NoActiveBlock)?;
        if !element_is_text_block(el, self.registry) {
            return Err(TransformError::NotTextBlock(el.kind.clone()));
        }
        Ok((path, el))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("no active block")]
    NoActiveBlock,
    #[error("active block `{0}` is not a text block")]
    NotTextBlock(String),
    #[error("selection must stay within a single block container")]
    MixedContainers,
    #[error("selection block range is out of bounds")]
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Bulleted,
    Ordered,
}

impl ListType {
    pub fn as_str(self) -> &'static str {
        match self {
            ListType::Bulleted => "bulleted",
            ListType::Ordered => "ordered",
        }
    }
}

pub fn element_is_text_block(el: &ElementNode, registry: &PluginRegistry) -> bool {
    match registry.node_specs().get(&el.kind) {
        Some(spec) => spec.children == ChildConstraint::InlineOnly,
        None => el.children.iter().any(|n| matches!(n, Node::Text(_))),
    }
}

/// Rebuilds `el` as `kind`, dropping attrs that only mean something on the old kind.
fn retarget(el: &ElementNode, kind: &str, extra: &[(&str, Value)]) -> Node {
    let mut attrs = el.attrs.clone();
    for key in ["level", "list_type", "list_index", "language", "bubble_type", "sender"] {
        attrs.remove(key);
    }
    for (key, value) in extra {
        attrs.insert((*key).to_string(), value.clone());
    }
    Node::Element(ElementNode {
        kind: kind.to_string(),
        attrs,
        children: el.children.clone(),
    })
}

fn replace_block(cx: &BlockCx<'_>, path: &[usize], next: Node, source: &str) -> Transaction {
    Transaction::new(Op::replace_node(path, next).into())
        .selection_after(cx.selection.clone())
        .source(source)
}

pub fn heading_level(el: &ElementNode) -> Option<u64> {
    (el.kind == HEADING).then(|| el.attr_u64("level").unwrap_or(1).clamp(1, 6))
}

pub fn set_heading(cx: &BlockCx<'_>, level: u64) -> Result<Transaction, TransformError> {
    let level = level.clamp(1, 6);
    let (path, el) = cx.text_block()?;
    if heading_level(el) == Some(level) {
        return Ok(Transaction::empty("command:block.set_heading"));
    }
    let next = retarget(el, HEADING, &[("level", Value::from(level))]);
    Ok(replace_block(cx, path, next, "command:block.set_heading"))
}

pub fn unset_heading(cx: &BlockCx<'_>) -> Result<Transaction, TransformError> {
    let (path, el) = cx.text_block()?;
    if el.kind != HEADING {
        return Ok(Transaction::empty("command:block.unset_heading"));
    }
    let next = retarget(el, PARAGRAPH, &[]);
    Ok(replace_block(cx, path, next, "command:block.unset_heading"))
}

pub fn toggle_heading(cx: &BlockCx<'_>, level: u64) -> Result<Transaction, TransformError> {
    let level = level.clamp(1, 6);
    let (path, el) = cx.text_block()?;
    let next = if heading_level(el) == Some(level) {
        retarget(el, PARAGRAPH, &[])
    } else {
        retarget(el, HEADING, &[("level", Value::from(level))])
    };
    Ok(replace_block(cx, path, next, "command:block.toggle_heading"))
}

pub fn active_list_type(cx: &BlockCx<'_>) -> Option<ListType> {
    let (_, el) = cx.focus_block()?;
    if el.kind != LIST_ITEM {
        return None;
    }
    match el.attr_str("list_type")? {
        "bulleted" => Some(ListType::Bulleted),
        "ordered" => Some(ListType::Ordered),
        _ => None,
    }
}

/// Turns the active block into a `list_item` of `list_type`, or back into a
/// paragraph when it already is one.
pub fn toggle_list(cx: &BlockCx<'_>, list_type: ListType) -> Result<Transaction, TransformError> {
    let (path, el) = cx.text_block()?;
    let source = format!("command:list.toggle_{}", list_type.as_str());

    let next = if active_list_type(cx) == Some(list_type) {
        retarget(el, PARAGRAPH, &[])
    } else {
        retarget(el, LIST_ITEM, &[("list_type", Value::from(list_type.as_str()))])
    };
    Ok(replace_block(cx, path, next, &source))
}

pub fn toggle_code_block(cx: &BlockCx<'_>) -> Result<Transaction, TransformError> {
    let (path, el) = cx.text_block()?;
    let next_kind = if el.kind == CODE_BLOCK {
        PARAGRAPH
    } else {
        CODE_BLOCK
    };
    let next = retarget(el, next_kind, &[]);
    Ok(replace_block(cx, path, next, "command:code_block.toggle"))
}

pub fn nearest_blockquote_path(doc: &Document, point_path: &[usize]) -> Option<Path> {
    let mut path: Path = point_path.to_vec();
    while !path.is_empty() {
        if let Some(Node::Element(el)) = node_ref(doc, &path) {
            if el.kind == BLOCKQUOTE {
                return Some(path);
            }
        }
        path.pop();
    }
    None
}

pub fn toggle_blockquote(cx: &BlockCx<'_>) -> Result<Transaction, TransformError> {
    if nearest_blockquote_path(cx.doc, &cx.selection.focus.path).is_some() {
        unwrap_nearest_blockquote(cx)
    } else {
        wrap_selection_in_blockquote(cx)
    }
}

fn ordered_points(sel: &Selection) -> (&Point, &Point) {
    if (&sel.anchor.path, sel.anchor.offset) <= (&sel.focus.path, sel.focus.offset) {
        (&sel.anchor, &sel.focus)
    } else {
        (&sel.focus, &sel.anchor)
    }
}

pub fn wrap_selection_in_blockquote(cx: &BlockCx<'_>) -> Result<Transaction, TransformError> {
    let (start, end) = ordered_points(cx.selection);
    let start_block = start
        .path
        .split_last()
        .map(|(_, p)| p)
        .ok_or(TransformError::NoActiveBlock)?;
    let end_block = end
        .path
        .split_last()
        .map(|(_, p)| p)
        .ok_or(TransformError::NoActiveBlock)?;

    let (&start_ix, parent) = start_block
        .split_last()
        .ok_or(TransformError::NoActiveBlock)?;
    let (&end_ix, end_parent) = end_block
        .split_last()
        .ok_or(TransformError::NoActiveBlock)?;
    if parent != end_parent {
        return Err(TransformError::MixedContainers);
    }
    let (start_ix, end_ix) = (start_ix.min(end_ix), start_ix.max(end_ix));

    let siblings = children_ref(cx.doc, parent).ok_or(TransformError::NoActiveBlock)?;
    if end_ix >= siblings.len() {
        return Err(TransformError::OutOfBounds);
    }

    let quote = Node::blockquote(siblings[start_ix..=end_ix].to_vec());

    let mut ops: Vec<Op> = Vec::new();
    for ix in (start_ix..=end_ix).rev() {
        let mut path = parent.to_vec();
        path.push(ix);
        ops.push(Op::RemoveNode { path });
    }
    let mut insert_path = parent.to_vec();
    insert_path.push(start_ix);
    ops.push(Op::InsertNode {
        path: insert_path,
        node: quote,
    });

    let depth = parent.len();
    let remap = |point: &Point| -> Point {
        if !point.path.starts_with(parent) || point.path.len() < depth + 2 {
            return point.clone();
        }
        let block_ix = point.path[depth];
        if block_ix < start_ix || block_ix > end_ix {
            return point.clone();
        }
        let mut path = parent.to_vec();
        path.push(start_ix);
        path.push(block_ix - start_ix);
        path.extend_from_slice(&point.path[depth + 1..]);
        Point::new(path, point.offset)
    };

    Ok(Transaction::new(ops)
        .selection_after(Selection {
            anchor: remap(&cx.selection.anchor),
            focus: remap(&cx.selection.focus),
        })
        .source("command:blockquote.wrap"))
}

pub fn unwrap_nearest_blockquote(cx: &BlockCx<'_>) -> Result<Transaction, TransformError> {
    let Some(quote_path) = nearest_blockquote_path(cx.doc, &cx.selection.focus.path) else {
        return Ok(Transaction::empty("command:blockquote.unwrap"));
    };
    let (&quote_ix, parent) = quote_path
        .split_last()
        .ok_or(TransformError::NoActiveBlock)?;
    let Some(Node::Element(quote)) = node_ref(cx.doc, &quote_path) else {
        return Err(TransformError::NoActiveBlock);
    };

    let mut ops = vec![Op::RemoveNode {
        path: quote_path.clone(),
    }];
    for (i, node) in quote.children.iter().enumerate() {
        let mut path = parent.to_vec();
        path.push(quote_ix + i);
        ops.push(Op::InsertNode {
            path,
            node: node.clone(),
        });
    }

    let remap = |point: &Point| -> Point {
        if point.path.len() <= quote_path.len() || !point.path.starts_with(&quote_path) {
            return point.clone();
        }
        let inner_ix = point.path[quote_path.len()];
        let mut path = parent.to_vec();
        path.push(quote_ix + inner_ix);
        path.extend_from_slice(&point.path[quote_path.len() + 1..]);
        Point::new(path, point.offset)
    };

    Ok(Transaction::new(ops)
        .selection_after(Selection {
            anchor: remap(&cx.selection.anchor),
            focus: remap(&cx.selection.focus),
        })
        .source("command:blockquote.unwrap"))
}

/// Inserts a divider at the active block.
///
/// An empty paragraph is replaced by the divider; any other block keeps its
/// content and gets the divider after it. The caret always lands in a fresh
/// paragraph following the divider.
pub fn insert_divider(cx: &BlockCx<'_>) -> Result<Transaction, TransformError> {
    let (block_path, el) = cx.focus_block().ok_or(TransformError::NoActiveBlock)?;
    let (&block_ix, parent) = block_path
        .split_last()
        .ok_or(TransformError::NoActiveBlock)?;

    let replace = el.kind == PARAGRAPH && el.children.iter().all(|n| match n {
        Node::Text(t) => t.text.is_empty(),
        _ => false,
    });

    let divider_ix = if replace { block_ix } else { block_ix + 1 };
    let at = |ix: usize| -> Path {
        let mut path = parent.to_vec();
        path.push(ix);
        path
    };

    let mut ops: Vec<Op> = Vec::new();
    if replace {
        ops.push(Op::RemoveNode {
            path: block_path.to_vec(),
        });
    }
    ops.push(Op::InsertNode {
        path: at(divider_ix),
        node: Node::divider(),
    });
    ops.push(Op::InsertNode {
        path: at(divider_ix + 1),
        node: Node::paragraph(""),
    });

    let mut caret = at(divider_ix + 1);
    caret.push(0);

    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(caret, 0)))
        .source("command:core.insert_divider"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Bold,
    Italic,
}

impl MarkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkKind::Bold => "bold",
            MarkKind::Italic => "italic",
        }
    }

    pub fn is_set(self, marks: &Marks) -> bool {
        match self {
            MarkKind::Bold => marks.bold,
            MarkKind::Italic => marks.italic,
        }
    }

    fn set(self, marks: &mut Marks, on: bool) {
        match self {
            MarkKind::Bold => marks.bold = on,
            MarkKind::Italic => marks.italic = on,
        }
    }
}

/// Marks of the text leaf holding the caret.
pub fn active_marks(cx: &BlockCx<'_>) -> Marks {
    match node_ref(cx.doc, &cx.selection.focus.path) {
        Some(Node::Text(t)) => t.marks.clone(),
        _ => Marks::default(),
    }
}

/// Flips `mark` over the selected text.
///
/// The mark is removed when every selected leaf already carries it and set on
/// all of them otherwise. Leaves are split at the selection edges, and the
/// selection is kept on the same text. A collapsed caret only affects an empty
/// leaf, so the next typed text picks the mark up; elsewhere it is a no-op.
pub fn toggle_mark(cx: &BlockCx<'_>, mark: MarkKind) -> Result<Transaction, TransformError> {
    let source = format!("command:marks.toggle_{}", mark.as_str());
    if cx.selection.is_collapsed() {
        return toggle_mark_at_caret(cx, mark, &source);
    }

    let (start, end) = ordered_points(cx.selection);
    let (start_block, end_block) = match (start.path.split_last(), end.path.split_last()) {
        (Some((_, s)), Some((_, e))) => (s, e),
        _ => return Err(TransformError::NoActiveBlock),
    };
    let (&start_ix, parent) = start_block
        .split_last()
        .ok_or(TransformError::NoActiveBlock)?;
    let (&end_ix, end_parent) = end_block
        .split_last()
        .ok_or(TransformError::NoActiveBlock)?;
    if parent != end_parent {
        return Err(TransformError::MixedContainers);
    }
    let siblings = children_ref(cx.doc, parent).ok_or(TransformError::NoActiveBlock)?;
    if end_ix >= siblings.len() {
        return Err(TransformError::OutOfBounds);
    }

    // (block index, block, selected byte range within the block's text)
    let mut spans: Vec<(usize, &ElementNode, usize, usize)> = Vec::new();
    for (ix, node) in siblings.iter().enumerate().take(end_ix + 1).skip(start_ix) {
        let Node::Element(el) = node else {
            continue;
        };
        if !element_is_text_block(el, cx.registry) {
            continue;
        }
        let total = inline_text_len(&el.children);
        let from = if ix == start_ix {
            global_offset(&el.children, start)
        } else {
            0
        };
        let to = if ix == end_ix {
            global_offset(&el.children, end)
        } else {
            total
        };
        if from < to {
            spans.push((ix, el, from, to));
        }
    }
    if spans.is_empty() {
        return Ok(Transaction::empty(source));
    }

    let all_set = spans.iter().all(|(_, el, from, to)| {
        leaves_in_range(&el.children, *from, *to).all(|t| mark.is_set(&t.marks))
    });
    let target = !all_set;

    let mut ops: Vec<Op> = Vec::new();
    let mut anchor = cx.selection.anchor.clone();
    let mut focus = cx.selection.focus.clone();
    for (ix, el, from, to) in spans {
        let children = remark_range(&el.children, from, to, |marks| mark.set(marks, target));
        let mut block_path = parent.to_vec();
        block_path.push(ix);

        for point in [&mut anchor, &mut focus] {
            if point.path.len() != block_path.len() + 1 || !point.path.starts_with(&block_path) {
                continue;
            }
            let global = global_offset(&el.children, point);
            let (leaf, offset) = locate_offset(&children, global, global == from);
            let mut path = block_path.clone();
            path.push(leaf);
            *point = Point::new(path, offset);
        }

        ops.extend(Op::replace_node(
            &block_path,
            Node::Element(ElementNode {
                kind: el.kind.clone(),
                attrs: el.attrs.clone(),
                children,
            }),
        ));
    }

    Ok(Transaction::new(ops)
        .selection_after(Selection { anchor, focus })
        .source(source))
}

fn toggle_mark_at_caret(
    cx: &BlockCx<'_>,
    mark: MarkKind,
    source: &str,
) -> Result<Transaction, TransformError> {
    let (path, el) = cx.text_block()?;
    let Some(Node::Text(leaf)) = node_ref(cx.doc, &cx.selection.focus.path) else {
        return Err(TransformError::NoActiveBlock);
    };
    if !leaf.text.is_empty() {
        return Ok(Transaction::empty(source));
    }

    let mut marks = leaf.marks.clone();
    mark.set(&mut marks, !mark.is_set(&leaf.marks));
    let leaf_ix = cx.selection.focus.path.last().copied().unwrap_or(0);
    let mut children = el.children.clone();
    children[leaf_ix] = Node::Text(TextNode {
        text: String::new(),
        marks,
    });
    let next = Node::Element(ElementNode {
        kind: el.kind.clone(),
        attrs: el.attrs.clone(),
        children,
    });
    Ok(replace_block(cx, path, next, source))
}

fn inline_text_len(children: &[Node]) -> usize {
    children
        .iter()
        .map(|n| match n {
            Node::Text(t) => t.text.len(),
            _ => 0,
        })
        .sum()
}

/// Byte offset of `point` counted across all text leaves of its block.
fn global_offset(children: &[Node], point: &Point) -> usize {
    let leaf_ix = point.path.last().copied().unwrap_or(0);
    let before = inline_text_len(&children[..leaf_ix.min(children.len())]);
    let within = match children.get(leaf_ix) {
        Some(Node::Text(t)) => point.offset.min(t.text.len()),
        _ => 0,
    };
    before + within
}

/// Leaf index and offset for a block-global byte offset. A boundary between
/// two leaves resolves to the start of the right one when `prefer_right`.
fn locate_offset(children: &[Node], global: usize, prefer_right: bool) -> (usize, usize) {
    let mut cursor = 0;
    let mut last_text = None;
    for (ix, node) in children.iter().enumerate() {
        let Node::Text(t) = node else {
            continue;
        };
        let end = cursor + t.text.len();
        if global < end || (global == end && !prefer_right) {
            return (ix, global.saturating_sub(cursor));
        }
        last_text = Some((ix, t.text.len()));
        cursor = end;
    }
    last_text.unwrap_or((0, 0))
}

fn leaves_in_range(children: &[Node], from: usize, to: usize) -> impl Iterator<Item = &TextNode> {
    let mut cursor = 0;
    children.iter().filter_map(move |n| {
        let Node::Text(t) = n else {
            return None;
        };
        let start = cursor;
        cursor += t.text.len();
        (start < to && cursor > from).then_some(t)
    })
}

/// Splits the leaves overlapping `from..to` at the range edges and applies
/// `apply` to the marks of the covered parts.
fn remark_range(
    children: &[Node],
    from: usize,
    to: usize,
    apply: impl Fn(&mut Marks),
) -> Vec<Node> {
    let mut out = Vec::with_capacity(children.len() + 2);
    let mut cursor = 0;
    for node in children {
        let Node::Text(t) = node else {
            out.push(node.clone());
            continue;
        };
        let start = cursor;
        cursor += t.text.len();
        if cursor <= from || start >= to {
            out.push(node.clone());
            continue;
        }

        let lo = clamp_to_char_boundary(&t.text, from.saturating_sub(start));
        let hi = clamp_to_char_boundary(&t.text, to - start);
        let mut covered = t.marks.clone();
        apply(&mut covered);
        for (text, marks) in [
            (&t.text[..lo], &t.marks),
            (&t.text[lo..hi], &covered),
            (&t.text[hi..], &t.marks),
        ] {
            if !text.is_empty() {
                out.push(Node::Text(TextNode {
                    text: text.to_string(),
                    marks: marks.clone(),
                }));
            }
        }
    }
    out
}

pub const CHAT_BUBBLE_PLACEHOLDER: &str = "Chat message content";

/// Inserts a chat bubble holding placeholder text at the active block.
///
/// Like [`insert_divider`], an empty paragraph is replaced and any other block
/// gets the bubble after it. The caret lands at the end of the bubble text.
pub fn set_chat_bubble(
    cx: &BlockCx<'_>,
    bubble_type: BubbleType,
    sender: &str,
) -> Result<Transaction, TransformError> {
    let (block_path, el) = cx.focus_block().ok_or(TransformError::NoActiveBlock)?;
    let (&block_ix, parent) = block_path
        .split_last()
        .ok_or(TransformError::NoActiveBlock)?;

    let replace = el.kind == PARAGRAPH && el.text().is_empty();
    let mut path = parent.to_vec();
    path.push(if replace { block_ix } else { block_ix + 1 });

    let mut ops: Vec<Op> = Vec::new();
    if replace {
        ops.push(Op::RemoveNode {
            path: block_path.to_vec(),
        });
    }
    ops.push(Op::InsertNode {
        path: path.clone(),
        node: Node::chat_bubble(bubble_type, sender, CHAT_BUBBLE_PLACEHOLDER),
    });

    path.push(0);
    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(
            path,
            CHAT_BUBBLE_PLACEHOLDER.len(),
        )))
        .source("command:chat_bubble.insert"))
}

pub fn chat_bubble_type(el: &ElementNode) -> Option<BubbleType> {
    if el.kind != CHAT_BUBBLE {
        return None;
    }
    Some(el.attr_str("bubble_type").and_then(BubbleType::parse).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retarget_drops_kind_specific_attrs() {
        let Node::Element(heading) = Node::heading(2, "x") else {
            panic!("expected element");
        };
        let Node::Element(item) = retarget(&heading, LIST_ITEM, &[("list_type", Value::from("ordered"))]) else {
            panic!("expected element");
        };
        assert!(item.attrs.get("level").is_none());
        assert_eq!(item.attr_str("list_type"), Some("ordered"));
        assert_eq!(item.text(), "x");
    }

    #[test]
    fn remark_range_splits_at_edges() {
        let children = vec![Node::text("hello")];
        let out = remark_range(&children, 1, 3, |m| m.bold = true);
        let texts: Vec<(&str, bool)> = out
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some((t.text.as_str(), t.marks.bold)),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![("h", false), ("el", true), ("lo", false)]);
    }

    #[test]
    fn locate_offset_resolves_boundaries_by_side() {
        let children = vec![Node::text("ab"), Node::text("cd")];
        assert_eq!(locate_offset(&children, 2, true), (1, 0));
        assert_eq!(locate_offset(&children, 2, false), (0, 2));
        assert_eq!(locate_offset(&children, 4, true), (1, 2));
    }
}
