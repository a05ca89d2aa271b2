use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::ChainError;
use crate::core::{
    AttrPatch, BLOCKQUOTE, BubbleType, CHAT_BUBBLE, CODE_BLOCK, DIVIDER, Document, Editor, HEADING,
    LIST_ITEM, Node, PARAGRAPH, Point, Selection, node_ref,
};
use crate::ops::Op;
use crate::transforms::{self, BlockCx, ListType, MarkKind};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("invalid args for `{command}`: {reason}")]
    InvalidArgs {
        command: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Chain(#[from] ChainError),
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("unknown query `{0}`")]
    Unknown(String),
    #[error("query `{query}` is missing `{arg}`")]
    MissingArg {
        query: &'static str,
        arg: &'static str,
    },
    #[error("query result did not decode: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate node spec kind: {0}")]
    DuplicateNodeKind(String),
    #[error("duplicate command id: {0}")]
    DuplicateCommand(String),
    #[error("duplicate query id: {0}")]
    DuplicateQuery(String),
}

pub type CommandHandler =
    Arc<dyn Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync>;
pub type QueryHandler = Arc<dyn Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandSpec {
    pub id: String,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&mut Editor, Option<Value>) -> Result<(), CommandError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Clone)]
pub struct QuerySpec {
    pub id: String,
    pub handler: QueryHandler,
}

impl QuerySpec {
    pub fn new(
        id: impl Into<String>,
        handler: impl Fn(&Editor, Option<Value>) -> Result<Value, QueryError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            handler: Arc::new(handler),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildConstraint {
    None,
    BlockOnly,
    InlineOnly,
    Any,
}

/// What a node kind may contain. Kinds without a spec accept anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    pub children: ChildConstraint,
}

impl NodeSpec {
    fn new(kind: &str, children: ChildConstraint) -> Self {
        Self {
            kind: kind.to_string(),
            children,
        }
    }

    fn text_block(kind: &str) -> Self {
        Self::new(kind, ChildConstraint::InlineOnly)
    }
}

pub trait NormalizePass: Send + Sync {
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op>;
}

pub trait EditorPlugin: Send + Sync {
    fn id(&self) -> &'static str;
    fn node_specs(&self) -> Vec<NodeSpec> {
        Vec::new()
    }
    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        Vec::new()
    }
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
    fn queries(&self) -> Vec<QuerySpec> {
        Vec::new()
    }
}

#[derive(Default)]
pub struct PluginRegistry {
    node_specs: HashMap<String, NodeSpec>,
    normalize_passes: Vec<Box<dyn NormalizePass>>,
    commands: HashMap<String, CommandSpec>,
    queries: HashMap<String, QuerySpec>,
}

impl PluginRegistry {
    pub fn core() -> Self {
        Self::builtin(vec![
            Box::new(CoreParagraphPlugin),
            Box::new(CoreDividerPlugin),
            Box::new(CoreNormalizePlugin),
            Box::new(CoreCommandsPlugin),
        ])
    }

    pub fn richtext() -> Self {
        Self::builtin(vec![
            Box::new(CoreParagraphPlugin),
            Box::new(CoreDividerPlugin),
            Box::new(CoreNormalizePlugin),
            Box::new(CoreCommandsPlugin),
            Box::new(HeadingPlugin),
            Box::new(CodeBlockPlugin),
            Box::new(BlockquotePlugin),
            Box::new(ListPlugin),
            Box::new(MarksPlugin),
            Box::new(ChatBubblePlugin),
        ])
    }

    fn builtin(plugins: Vec<Box<dyn EditorPlugin>>) -> Self {
        let mut registry = Self::default();
        for plugin in plugins {
            let id = plugin.id();
            if let Err(err) = registry.register_plugin(plugin) {
                tracing::error!(plugin = id, %err, "skipping built-in plugin");
            }
        }
        registry
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn EditorPlugin>) -> Result<(), RegistryError> {
        for spec in plugin.node_specs() {
            if self.node_specs.contains_key(&spec.kind) {
                return Err(RegistryError::DuplicateNodeKind(spec.kind));
            }
            self.node_specs.insert(spec.kind.clone(), spec);
        }

        self.normalize_passes.extend(plugin.normalize_passes());

        for cmd in plugin.commands() {
            if self.commands.contains_key(&cmd.id) {
                return Err(RegistryError::DuplicateCommand(cmd.id));
            }
            self.commands.insert(cmd.id.clone(), cmd);
        }

        for query in plugin.queries() {
            if self.queries.contains_key(&query.id) {
                return Err(RegistryError::DuplicateQuery(query.id));
            }
            self.queries.insert(query.id.clone(), query);
        }

        Ok(())
    }

    pub fn node_specs(&self) -> &HashMap<String, NodeSpec> {
        &self.node_specs
    }

    pub fn command(&self, id: &str) -> Option<CommandSpec> {
        self.commands.get(id).cloned()
    }

    pub fn query(&self, id: &str) -> Option<QuerySpec> {
        self.queries.get(id).cloned()
    }

    fn child_constraint(&self, kind: &str) -> ChildConstraint {
        self.node_specs
            .get(kind)
            .map(|s| s.children.clone())
            .unwrap_or(ChildConstraint::Any)
    }

    pub fn normalize(&self, doc: &Document) -> Vec<Op> {
        let mut ops: Vec<Op> = Vec::new();
        for pass in &self.normalize_passes {
            ops.extend(pass.run(doc, self));
            // Later passes compute paths against the unmodified doc.
            if !ops.is_empty() {
                break;
            }
        }
        ops
    }

    pub fn normalize_selection(&self, doc: &Document, selection: &Selection) -> Selection {
        let fallback = first_text_point(doc).unwrap_or(Point {
            path: vec![0],
            offset: 0,
        });

        let anchor = normalize_point_to_existing_text(doc, &selection.anchor)
            .or_else(|| normalize_point_to_existing_text(doc, &selection.focus))
            .unwrap_or(fallback);
        let focus = normalize_point_to_existing_text(doc, &selection.focus)
            .unwrap_or_else(|| anchor.clone());

        Selection { anchor, focus }
    }
}

/// Calls `visit` with the child list of the document and of every element
/// that holds blocks, together with the path of that list's parent.
fn for_each_container(
    doc: &Document,
    registry: &PluginRegistry,
    visit: &mut dyn FnMut(&[Node], &[usize]),
) {
    fn walk(
        children: &[Node],
        path: &mut Vec<usize>,
        registry: &PluginRegistry,
        visit: &mut dyn FnMut(&[Node], &[usize]),
    ) {
        visit(children, path);
        for (ix, node) in children.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };
            if registry.child_constraint(&el.kind) == ChildConstraint::InlineOnly
                || el.children.is_empty()
            {
                continue;
            }
            path.push(ix);
            walk(&el.children, path, registry, visit);
            path.pop();
        }
    }

    walk(&doc.children, &mut Vec::new(), registry, visit);
}

fn child_path(parent: &[usize], ix: usize) -> Vec<usize> {
    let mut path = parent.to_vec();
    path.push(ix);
    path
}

fn first_text_point(doc: &Document) -> Option<Point> {
    fn walk(children: &[Node], path: &mut Vec<usize>) -> Option<Point> {
        for (ix, node) in children.iter().enumerate() {
            path.push(ix);
            let found = match node {
                Node::Text(_) => Some(Point::new(path.clone(), 0)),
                Node::Element(el) => walk(&el.children, path),
                Node::Void(_) => None,
            };
            path.pop();
            if found.is_some() {
                return found;
            }
        }
        None
    }

    walk(&doc.children, &mut Vec::new())
}

fn normalize_point_to_existing_text(doc: &Document, point: &Point) -> Option<Point> {
    if point.path.is_empty() || doc.children.is_empty() {
        return None;
    }

    let mut resolved: Vec<usize> = Vec::new();
    let mut children: &[Node] = &doc.children;

    for &wanted in &point.path {
        if children.is_empty() {
            break;
        }
        let ix = wanted.min(children.len() - 1);
        resolved.push(ix);
        match &children[ix] {
            Node::Text(t) => {
                return Some(Point::new(resolved, point.offset.min(t.text.len())));
            }
            Node::Element(el) => children = &el.children,
            Node::Void(_) => break,
        }
    }

    match node_ref(doc, &resolved)? {
        Node::Text(t) => Some(Point::new(resolved, point.offset.min(t.text.len()))),
        Node::Element(el) => {
            let sub = Document {
                children: el.children.clone(),
            };
            let inner = first_text_point(&sub)?;
            resolved.extend(inner.path);
            Some(Point::new(resolved, 0))
        }
        Node::Void(_) => {
            // Land on the nearest text block after (or before) the void.
            let (&ix, parent) = resolved.split_last()?;
            let siblings = crate::core::children_ref(doc, parent)?;
            let candidates = (ix + 1..siblings.len()).chain((0..ix).rev());
            for candidate in candidates {
                if let Node::Element(el) = &siblings[candidate] {
                    let sub = Document {
                        children: el.children.clone(),
                    };
                    if let Some(inner) = first_text_point(&sub) {
                        let mut path = child_path(parent, candidate);
                        path.extend(inner.path);
                        return Some(Point::new(path, 0));
                    }
                }
            }
            None
        }
    }
}

fn cx(editor: &Editor) -> BlockCx<'_> {
    BlockCx::new(editor.doc(), editor.selection(), editor.registry())
}

struct CoreParagraphPlugin;

impl EditorPlugin for CoreParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(PARAGRAPH)]
    }
}

struct CoreDividerPlugin;

impl EditorPlugin for CoreDividerPlugin {
    fn id(&self) -> &'static str {
        "core.divider"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::new(DIVIDER, ChildConstraint::None)]
    }
}

struct CoreNormalizePlugin;

impl EditorPlugin for CoreNormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(EnsureTextBlockHasTextLeaf),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if doc.children.is_empty() {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

struct EnsureTextBlockHasTextLeaf;

impl NormalizePass for EnsureTextBlockHasTextLeaf {
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_container(doc, registry, &mut |children, parent| {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                if registry.child_constraint(&el.kind) != ChildConstraint::InlineOnly {
                    continue;
                }
                if !el.children.iter().any(|n| matches!(n, Node::Text(_))) {
                    let mut path = child_path(parent, ix);
                    path.push(0);
                    ops.push(Op::InsertNode {
                        path,
                        node: Node::text(""),
                    });
                }
            }
        });
        ops
    }
}

struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_container(doc, registry, &mut |children, parent| {
            for (block_ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                if registry.child_constraint(&el.kind) != ChildConstraint::InlineOnly {
                    continue;
                }
                let block_path = child_path(parent, block_ix);

                if el.children.len() >= 2 {
                    let empty = el
                        .children
                        .iter()
                        .position(|n| matches!(n, Node::Text(t) if t.text.is_empty()));
                    if let Some(empty_ix) = empty {
                        ops.push(Op::RemoveNode {
                            path: child_path(&block_path, empty_ix),
                        });
                        continue;
                    }
                }

                let mut ix = el.children.len();
                while ix > 0 {
                    ix -= 1;
                    let Node::Text(right) = &el.children[ix] else {
                        continue;
                    };

                    let mut start = ix;
                    while start > 0 {
                        let Some(Node::Text(left)) = el.children.get(start - 1) else {
                            break;
                        };
                        if left.marks != right.marks {
                            break;
                        }
                        start -= 1;
                    }
                    if start == ix {
                        continue;
                    }

                    let Some(Node::Text(first)) = el.children.get(start) else {
                        continue;
                    };
                    let appended: String = el.children[start + 1..=ix]
                        .iter()
                        .filter_map(|n| match n {
                            Node::Text(t) => Some(t.text.as_str()),
                            _ => None,
                        })
                        .collect();

                    ops.push(Op::InsertText {
                        path: child_path(&block_path, start),
                        offset: first.text.len(),
                        text: appended,
                    });
                    for remove_ix in (start + 1..=ix).rev() {
                        ops.push(Op::RemoveNode {
                            path: child_path(&block_path, remove_ix),
                        });
                    }
                    ix = start;
                }
            }
        });
        ops
    }
}

struct CoreCommandsPlugin;

impl EditorPlugin for CoreCommandsPlugin {
    fn id(&self) -> &'static str {
        "core.commands"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("core.insert_divider", |editor, _args| {
                Ok(editor.chain().insert_divider().run()?)
            }),
        ]
    }
}

struct HeadingPlugin;

impl EditorPlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(HEADING)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeHeadingLevels)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_heading", |editor, args| {
                let level = level_arg("block.set_heading", args.as_ref())?;
                Ok(editor.chain().set_heading(level).run()?)
            }),
            CommandSpec::new("block.unset_heading", |editor, _args| {
                Ok(editor.chain().unset_heading().run()?)
            }),
            CommandSpec::new("block.toggle_heading", |editor, args| {
                let level = level_arg("block.toggle_heading", args.as_ref())?;
                Ok(editor.chain().toggle_heading(level).run()?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.heading_level", |editor, _args| {
            let level = cx(editor).focus_block().and_then(|(_, el)| transforms::heading_level(el));
            Ok(level.map(Value::from).unwrap_or(Value::Null))
        })]
    }
}

fn level_arg(command: &'static str, args: Option<&Value>) -> Result<u64, CommandError> {
    match args.and_then(|v| v.get("level")) {
        None => Ok(1),
        Some(v) => v.as_u64().ok_or_else(|| CommandError::InvalidArgs {
            command,
            reason: format!("level must be an integer, got {v}"),
        }),
    }
}

struct NormalizeHeadingLevels;

impl NormalizePass for NormalizeHeadingLevels {
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_container(doc, registry, &mut |children, parent| {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                if el.kind != HEADING {
                    continue;
                }
                let level = el.attr_u64("level").unwrap_or(1).clamp(1, 6);
                if el.attr_u64("level") != Some(level) {
                    ops.push(Op::SetNodeAttrs {
                        path: child_path(parent, ix),
                        patch: AttrPatch::set("level", Value::from(level)),
                    });
                }
            }
        });
        ops
    }
}

struct CodeBlockPlugin;

impl EditorPlugin for CodeBlockPlugin {
    fn id(&self) -> &'static str {
        "code_block"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(CODE_BLOCK)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("code_block.toggle", |editor, _args| {
                Ok(editor.chain().toggle_code_block().run()?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("code_block.is_active", |editor, _args| {
            let active = cx(editor)
                .focus_block()
                .is_some_and(|(_, el)| el.kind == CODE_BLOCK);
            Ok(Value::Bool(active))
        })]
    }
}

struct BlockquotePlugin;

impl EditorPlugin for BlockquotePlugin {
    fn id(&self) -> &'static str {
        "blockquote"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::new(BLOCKQUOTE, ChildConstraint::BlockOnly)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeBlockquoteChildren)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("blockquote.toggle", |editor, _args| {
                Ok(editor.chain().toggle_blockquote().run()?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("blockquote.is_active", |editor, _args| {
            let active =
                transforms::nearest_blockquote_path(editor.doc(), &editor.selection().focus.path)
                    .is_some();
            Ok(Value::Bool(active))
        })]
    }
}

struct NormalizeBlockquoteChildren;

impl NormalizePass for NormalizeBlockquoteChildren {
    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        // Empty containers are skipped by the walker, so scan them here.
        fn scan(children: &[Node], parent: &mut Vec<usize>, ops: &mut Vec<Op>) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                if el.kind != BLOCKQUOTE {
                    continue;
                }
                parent.push(ix);
                if el.children.is_empty() {
                    ops.push(Op::InsertNode {
                        path: child_path(parent, 0),
                        node: Node::paragraph(""),
                    });
                } else {
                    scan(&el.children, parent, ops);
                }
                parent.pop();
            }
        }
        scan(&doc.children, &mut Vec::new(), &mut ops);
        ops
    }
}

struct ListPlugin;

impl EditorPlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(LIST_ITEM)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeOrderedListIndices)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("list.toggle_bulleted", |editor, _args| {
                Ok(editor.chain().toggle_bullet_list().run()?)
            }),
            CommandSpec::new("list.toggle_ordered", |editor, _args| {
                Ok(editor.chain().toggle_ordered_list().run()?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("list.active_type", |editor, _args| {
                Ok(transforms::active_list_type(&cx(editor))
                    .map(|t| Value::from(t.as_str()))
                    .unwrap_or(Value::Null))
            }),
            QuerySpec::new("list.is_active", |editor, args| {
                let expected: ListType = args
                    .as_ref()
                    .and_then(|v| v.get("type"))
                    .map(|v| serde_json::from_value(v.clone()))
                    .transpose()?
                    .ok_or(QueryError::MissingArg {
                        query: "list.is_active",
                        arg: "type",
                    })?;
                Ok(Value::Bool(
                    transforms::active_list_type(&cx(editor)) == Some(expected),
                ))
            }),
        ]
    }
}

struct NormalizeOrderedListIndices;

impl NormalizePass for NormalizeOrderedListIndices {
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_container(doc, registry, &mut |children, parent| {
            let mut counter: u64 = 0;
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    counter = 0;
                    continue;
                };
                if el.kind != LIST_ITEM {
                    counter = 0;
                    continue;
                }

                if el.attr_str("list_type") != Some(ListType::Ordered.as_str()) {
                    counter = 0;
                    if el.attrs.contains_key("list_index") {
                        ops.push(Op::SetNodeAttrs {
                            path: child_path(parent, ix),
                            patch: AttrPatch::remove("list_index"),
                        });
                    }
                    continue;
                }

                counter += 1;
                if el.attr_u64("list_index") != Some(counter) {
                    ops.push(Op::SetNodeAttrs {
                        path: child_path(parent, ix),
                        patch: AttrPatch::set("list_index", Value::from(counter)),
                    });
                }
            }
        });
        ops
    }
}

struct MarksPlugin;

impl EditorPlugin for MarksPlugin {
    fn id(&self) -> &'static str {
        "marks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("marks.toggle_bold", |editor, _args| {
                Ok(editor.chain().toggle_bold().run()?)
            }),
            CommandSpec::new("marks.toggle_italic", |editor, _args| {
                Ok(editor.chain().toggle_italic().run()?)
            }),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("marks.active", |editor, _args| {
                Ok(serde_json::to_value(transforms::active_marks(&cx(editor)))?)
            }),
            QuerySpec::new("marks.is_active", |editor, args| {
                let mark: MarkKind = args
                    .as_ref()
                    .and_then(|v| v.get("mark"))
                    .map(|v| serde_json::from_value(v.clone()))
                    .transpose()?
                    .ok_or(QueryError::MissingArg {
                        query: "marks.is_active",
                        arg: "mark",
                    })?;
                Ok(Value::Bool(mark.is_set(&transforms::active_marks(&cx(editor)))))
            }),
        ]
    }
}

struct ChatBubblePlugin;

impl EditorPlugin for ChatBubblePlugin {
    fn id(&self) -> &'static str {
        "chat_bubble"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block(CHAT_BUBBLE)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeChatBubbleAttrs)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("chat_bubble.insert", |editor, args| {
            let args = args.unwrap_or(Value::Null);
            let bubble_type = match args.get("type") {
                None => BubbleType::default(),
                Some(v) => v
                    .as_str()
                    .and_then(BubbleType::parse)
                    .ok_or_else(|| CommandError::InvalidArgs {
                        command: "chat_bubble.insert",
                        reason: format!("type must be \"sent\" or \"received\", got {v}"),
                    })?,
            };
            let sender = args.get("sender").and_then(Value::as_str).unwrap_or("");
            Ok(editor.chain().set_chat_bubble(bubble_type, sender).run()?)
        })]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("chat_bubble.active_type", |editor, _args| {
            let bubble_type = cx(editor)
                .focus_block()
                .and_then(|(_, el)| transforms::chat_bubble_type(el));
            Ok(bubble_type
                .map(|t| Value::from(t.as_str()))
                .unwrap_or(Value::Null))
        })]
    }
}

/// Falls back to a sent bubble with no sender when the attrs are missing or unknown.
struct NormalizeChatBubbleAttrs;

impl NormalizePass for NormalizeChatBubbleAttrs {
    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        for_each_container(doc, registry, &mut |children, parent| {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                if el.kind != CHAT_BUBBLE {
                    continue;
                }
                let mut patch = AttrPatch::default();
                if el.attr_str("bubble_type").and_then(BubbleType::parse).is_none() {
                    patch.set.insert(
                        "bubble_type".to_string(),
                        Value::from(BubbleType::default().as_str()),
                    );
                }
                if el.attr_str("sender").is_none() {
                    patch.set.insert("sender".to_string(), Value::from(""));
                }
                if !patch.set.is_empty() {
                    ops.push(Op::SetNodeAttrs {
                        path: child_path(parent, ix),
                        patch,
                    });
                }
            }
        });
        ops
    }
}
