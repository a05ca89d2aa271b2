//! Default edits for keys that no view plugin claimed.

use crate::core::{
    CODE_BLOCK, Document, ElementNode, HEADING, LIST_ITEM, Node, PARAGRAPH, Point, Selection,
    TextNode, clamp_to_char_boundary, node_ref,
};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::PluginRegistry;
use crate::transforms::{BlockCx, element_is_text_block};

fn child_path(parent: &[usize], ix: usize) -> Path {
    let mut path = parent.to_vec();
    path.push(ix);
    path
}

fn text_at<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a TextNode> {
    match node_ref(doc, path)? {
        Node::Text(t) => Some(t),
        _ => None,
    }
}

/// Paths of every text block in document order.
pub fn text_block_paths(doc: &Document, registry: &PluginRegistry) -> Vec<Path> {
    fn walk(children: &[Node], path: &mut Vec<usize>, registry: &PluginRegistry, out: &mut Vec<Path>) {
        for (ix, node) in children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            path.push(ix);
            if element_is_text_block(el, registry) {
                out.push(path.clone());
            } else {
                walk(&el.children, path, registry, out);
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(&doc.children, &mut Vec::new(), registry, &mut out);
    out
}

/// Removes the selected range when both ends sit in the same text leaf.
/// Other range selections collapse to their focus.
fn collapse_ops(cx: &BlockCx<'_>) -> (Vec<Op>, Point) {
    let sel = cx.selection;
    if sel.is_collapsed() || sel.anchor.path != sel.focus.path {
        return (Vec::new(), sel.focus.clone());
    }
    let start = sel.anchor.offset.min(sel.focus.offset);
    let end = sel.anchor.offset.max(sel.focus.offset);
    (
        vec![Op::RemoveText {
            path: sel.focus.path.clone(),
            range: start..end,
        }],
        Point::new(sel.focus.path.clone(), start),
    )
}

pub fn insert_text(cx: &BlockCx<'_>, text: &str) -> Transaction {
    let (mut ops, at) = collapse_ops(cx);
    ops.push(Op::InsertText {
        path: at.path.clone(),
        offset: at.offset,
        text: text.to_string(),
    });
    Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(at.path, at.offset + text.len())))
        .source("key:insert_text")
}

pub fn delete_backward(cx: &BlockCx<'_>) -> Transaction {
    let sel = cx.selection;
    if !sel.is_collapsed() {
        let (ops, at) = collapse_ops(cx);
        return Transaction::new(ops)
            .selection_after(Selection::collapsed(at))
            .source("key:delete_backward");
    }

    let focus = &sel.focus;
    let Some((&leaf_ix, block_path)) = focus.path.split_last() else {
        return Transaction::empty("key:delete_backward");
    };

    if focus.offset > 0 {
        if let Some(leaf) = text_at(cx.doc, &focus.path) {
            return remove_char_before(&focus.path, &leaf.text, focus.offset);
        }
    }
    if leaf_ix > 0 {
        let prev_path = child_path(block_path, leaf_ix - 1);
        if let Some(prev) = text_at(cx.doc, &prev_path) {
            if !prev.text.is_empty() {
                return remove_char_before(&prev_path, &prev.text, prev.text.len());
            }
        }
    }

    // Caret at the very start of its block.
    let Some(Node::Element(block)) = node_ref(cx.doc, block_path) else {
        return Transaction::empty("key:delete_backward");
    };
    if block.kind != PARAGRAPH {
        let next = Node::Element(ElementNode {
            kind: PARAGRAPH.to_string(),
            attrs: Default::default(),
            children: block.children.clone(),
        });
        return Transaction::new(Op::replace_node(block_path, next).into())
            .selection_after(sel.clone())
            .source("key:delete_backward:lift");
    }

    let Some((&block_ix, parent)) = block_path.split_last() else {
        return Transaction::empty("key:delete_backward");
    };
    let Some(prev_ix) = block_ix.checked_sub(1) else {
        return Transaction::empty("key:delete_backward");
    };
    let prev_path = child_path(parent, prev_ix);
    match node_ref(cx.doc, &prev_path) {
        Some(Node::Void(_)) => Transaction::new(vec![Op::RemoveNode { path: prev_path }])
            .selection_after(Selection::collapsed(Point::new(
                child_path(&child_path(parent, prev_ix), leaf_ix),
                0,
            )))
            .source("key:delete_backward:void"),
        Some(Node::Element(prev)) if element_is_text_block(prev, cx.registry) => {
            merge_into_previous(&prev_path, prev, block_path, block)
        }
        _ => Transaction::empty("key:delete_backward"),
    }
}

fn remove_char_before(path: &[usize], text: &str, offset: usize) -> Transaction {
    let end = clamp_to_char_boundary(text, offset);
    let start = clamp_to_char_boundary(text, end.saturating_sub(1));
    Transaction::new(vec![Op::RemoveText {
        path: path.to_vec(),
        range: start..end,
    }])
    .selection_after(Selection::collapsed(Point::new(path.to_vec(), start)))
    .source("key:delete_backward")
}

fn merge_into_previous(
    prev_path: &[usize],
    prev: &ElementNode,
    block_path: &[usize],
    block: &ElementNode,
) -> Transaction {
    let last_ix = prev.children.len().saturating_sub(1);
    let caret = match prev.children.last() {
        Some(Node::Text(last)) => Point::new(child_path(prev_path, last_ix), last.text.len()),
        _ => Point::new(child_path(prev_path, 0), 0),
    };
    let mut moved: &[Node] = &block.children;

    let mut ops = vec![Op::RemoveNode {
        path: block_path.to_vec(),
    }];

    // Same-mark text is folded into the previous leaf so the caret stays put.
    if let (Some(Node::Text(last)), Some(Node::Text(first))) = (prev.children.last(), moved.first()) {
        if last.marks == first.marks {
            ops.push(Op::InsertText {
                path: caret.path.clone(),
                offset: last.text.len(),
                text: first.text.clone(),
            });
            moved = &moved[1..];
        }
    }

    for (i, node) in moved.iter().enumerate() {
        ops.push(Op::InsertNode {
            path: child_path(prev_path, prev.children.len() + i),
            node: node.clone(),
        });
    }

    Transaction::new(ops)
        .selection_after(Selection::collapsed(caret))
        .source("key:delete_backward:merge")
}

/// Splits the active block at the caret.
///
/// Code blocks take a newline instead. Headings continue as paragraphs and an
/// empty list item leaves the list.
pub fn split_block(cx: &BlockCx<'_>) -> Transaction {
    let (mut ops, at) = collapse_ops(cx);
    let Some((leaf_ix, block_path)) = at.path.split_last().map(|(ix, p)| (*ix, p.to_vec())) else {
        return Transaction::empty("key:split_block");
    };
    let Some(Node::Element(block)) = node_ref(cx.doc, &block_path) else {
        return Transaction::empty("key:split_block");
    };

    if block.kind == CODE_BLOCK {
        ops.push(Op::InsertText {
            path: at.path.clone(),
            offset: at.offset,
            text: "\n".to_string(),
        });
        return Transaction::new(ops)
            .selection_after(Selection::collapsed(Point::new(at.path, at.offset + 1)))
            .source("key:split_block:newline");
    }

    if block.kind == LIST_ITEM && block.text().is_empty() {
        let next = Node::Element(ElementNode {
            kind: PARAGRAPH.to_string(),
            attrs: Default::default(),
            children: block.children.clone(),
        });
        ops.extend(Op::replace_node(&block_path, next));
        return Transaction::new(ops)
            .selection_after(Selection::collapsed(at))
            .source("key:split_block:exit_list");
    }

    let Some((&block_ix, parent)) = block_path.split_last() else {
        return Transaction::empty("key:split_block");
    };

    // The draft after `collapse_ops` is what the split must read from.
    let mut draft = block.clone();
    if let [Op::RemoveText { range, .. }] = ops.as_slice() {
        if let Some(Node::Text(t)) = draft.children.get_mut(leaf_ix) {
            t.text.replace_range(range.clone(), "");
        }
    }

    let mut tail: Vec<Node> = Vec::new();
    if let Some(Node::Text(leaf)) = draft.children.get(leaf_ix) {
        let offset = clamp_to_char_boundary(&leaf.text, at.offset);
        if offset < leaf.text.len() {
            ops.push(Op::RemoveText {
                path: at.path.clone(),
                range: offset..leaf.text.len(),
            });
        }
        tail.push(Node::Text(TextNode {
            text: leaf.text[offset..].to_string(),
            marks: leaf.marks.clone(),
        }));
    }
    for remove_ix in (leaf_ix + 1..draft.children.len()).rev() {
        ops.push(Op::RemoveNode {
            path: child_path(&block_path, remove_ix),
        });
    }
    tail.extend(draft.children.iter().skip(leaf_ix + 1).cloned());

    let (kind, attrs) = match block.kind.as_str() {
        HEADING => (PARAGRAPH.to_string(), Default::default()),
        _ => (block.kind.clone(), block.attrs.clone()),
    };
    let new_block_path = child_path(parent, block_ix + 1);
    ops.push(Op::InsertNode {
        path: new_block_path.clone(),
        node: Node::Element(ElementNode {
            kind,
            attrs,
            children: tail,
        }),
    });

    Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(child_path(&new_block_path, 0), 0)))
        .source("key:split_block")
}

pub fn move_left(cx: &BlockCx<'_>) -> Selection {
    let focus = &cx.selection.focus;
    if !cx.selection.is_collapsed() {
        return Selection::collapsed(focus.clone());
    }
    if focus.offset > 0 {
        if let Some(leaf) = text_at(cx.doc, &focus.path) {
            let offset = clamp_to_char_boundary(&leaf.text, focus.offset.saturating_sub(1));
            return Selection::collapsed(Point::new(focus.path.clone(), offset));
        }
    }
    let blocks = text_block_paths(cx.doc, cx.registry);
    let Some(ix) = block_index(&blocks, &focus.path) else {
        return cx.selection.clone();
    };
    match ix.checked_sub(1) {
        Some(prev) => Selection::collapsed(block_end(cx.doc, &blocks[prev])),
        None => cx.selection.clone(),
    }
}

pub fn move_right(cx: &BlockCx<'_>) -> Selection {
    let focus = &cx.selection.focus;
    if !cx.selection.is_collapsed() {
        return Selection::collapsed(focus.clone());
    }
    if let Some(leaf) = text_at(cx.doc, &focus.path) {
        if focus.offset < leaf.text.len() {
            let mut offset = focus.offset + 1;
            while offset < leaf.text.len() && !leaf.text.is_char_boundary(offset) {
                offset += 1;
            }
            return Selection::collapsed(Point::new(focus.path.clone(), offset));
        }
    }
    let blocks = text_block_paths(cx.doc, cx.registry);
    let Some(ix) = block_index(&blocks, &focus.path) else {
        return cx.selection.clone();
    };
    match blocks.get(ix + 1) {
        Some(next) => Selection::collapsed(Point::new(child_path(next, 0), 0)),
        None => cx.selection.clone(),
    }
}

pub fn move_vertical(cx: &BlockCx<'_>, down: bool) -> Selection {
    let focus = &cx.selection.focus;
    let blocks = text_block_paths(cx.doc, cx.registry);
    let Some(ix) = block_index(&blocks, &focus.path) else {
        return cx.selection.clone();
    };
    let target = if down { ix.checked_add(1) } else { ix.checked_sub(1) };
    let Some(path) = target.and_then(|t| blocks.get(t)) else {
        return cx.selection.clone();
    };
    let leaf_path = child_path(path, 0);
    let offset = text_at(cx.doc, &leaf_path)
        .map(|leaf| clamp_to_char_boundary(&leaf.text, focus.offset))
        .unwrap_or(0);
    Selection::collapsed(Point::new(leaf_path, offset))
}

fn block_index(blocks: &[Path], point_path: &[usize]) -> Option<usize> {
    let block_path = point_path.split_last().map(|(_, p)| p)?;
    blocks.iter().position(|p| p.as_slice() == block_path)
}

fn block_end(doc: &Document, block_path: &[usize]) -> Point {
    match node_ref(doc, block_path) {
        Some(Node::Element(el)) => {
            let last = el.children.len().saturating_sub(1);
            let len = match el.children.last() {
                Some(Node::Text(t)) => t.text.len(),
                _ => 0,
            };
            Point::new(child_path(block_path, last), len)
        }
        _ => Point::new(child_path(block_path, 0), 0),
    }
}
