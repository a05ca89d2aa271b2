use std::fmt;

use anyhow::{Context as _, Result, anyhow, bail};
use jotter_doc_core::{BubbleType, Chain, Key, Point, Selection};
use jotter_notes::NoteEditor;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Type(String),
    Key(Key),
    Click(usize),
    Select(Point, Point),
    Toolbar(Tool),
    Undo,
    Redo,
}

/// Formatting buttons outside the slash palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Bold,
    Italic,
    Heading(u64),
    BulletList,
    OrderedList,
    Blockquote,
    CodeBlock,
    Bubble(BubbleType),
}

impl Tool {
    fn parse(s: &str) -> Result<Self> {
        let tool = match s {
            "bold" => Tool::Bold,
            "italic" => Tool::Italic,
            "bullet" => Tool::BulletList,
            "ordered" => Tool::OrderedList,
            "quote" => Tool::Blockquote,
            "code" => Tool::CodeBlock,
            "sent" => Tool::Bubble(BubbleType::Sent),
            "received" => Tool::Bubble(BubbleType::Received),
            _ => match s.strip_prefix('h').map(str::parse::<u64>) {
                Some(Ok(level @ 1..=6)) => Tool::Heading(level),
                _ => bail!("unknown tool `{s}`"),
            },
        };
        Ok(tool)
    }

    fn name(self) -> String {
        match self {
            Tool::Bold => "bold".to_string(),
            Tool::Italic => "italic".to_string(),
            Tool::Heading(level) => format!("h{level}"),
            Tool::BulletList => "bullet".to_string(),
            Tool::OrderedList => "ordered".to_string(),
            Tool::Blockquote => "quote".to_string(),
            Tool::CodeBlock => "code".to_string(),
            Tool::Bubble(bubble_type) => bubble_type.as_str().to_string(),
        }
    }

    fn build(self, chain: Chain<'_>) -> Chain<'_> {
        let chain = chain.focus();
        match self {
            Tool::Bold => chain.toggle_bold(),
            Tool::Italic => chain.toggle_italic(),
            Tool::Heading(level) => chain.toggle_heading(level),
            Tool::BulletList => chain.toggle_bullet_list(),
            Tool::OrderedList => chain.toggle_ordered_list(),
            Tool::Blockquote => chain.toggle_blockquote(),
            Tool::CodeBlock => chain.toggle_code_block(),
            Tool::Bubble(BubbleType::Sent) => chain.set_chat_bubble(BubbleType::Sent, "You"),
            Tool::Bubble(BubbleType::Received) => {
                chain.set_chat_bubble(BubbleType::Received, "Friend")
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Type(text) => write!(f, "type {text}"),
            Step::Key(key) => write!(f, "key {key:?}"),
            Step::Click(ix) => write!(f, "click {ix}"),
            Step::Select(anchor, focus) => {
                write!(f, "select {} {}", format_point(anchor), format_point(focus))
            }
            Step::Toolbar(tool) => write!(f, "toolbar {}", tool.name()),
            Step::Undo => f.write_str("undo"),
            Step::Redo => f.write_str("redo"),
        }
    }
}

fn format_point(point: &Point) -> String {
    let path: Vec<String> = point.path.iter().map(ToString::to_string).collect();
    format!("{}:{}", path.join("."), point.offset)
}

/// Parses `0.1:4` as path `[0, 1]`, offset 4.
fn parse_point(s: &str) -> Result<Point> {
    let (path, offset) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("point `{s}` needs the form path:offset"))?;
    let path = path
        .split('.')
        .map(|ix| ix.parse::<usize>().with_context(|| format!("bad path index `{ix}`")))
        .collect::<Result<Vec<_>>>()?;
    let offset = offset
        .parse()
        .with_context(|| format!("bad offset `{offset}`"))?;
    Ok(Point::new(path, offset))
}

/// One step per line. Blank lines and `#` comments are skipped.
pub fn parse(source: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (ix, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_line(line).with_context(|| format!("line {}: `{line}`", ix + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_line(line: &str) -> Result<Step> {
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let step = match verb {
        // `type` keeps everything after the first space, including spaces
        "type" if !rest.is_empty() => Step::Type(rest.to_string()),
        "key" => Step::Key(rest.trim().parse()?),
        "click" => Step::Click(rest.trim().parse().context("bad item index")?),
        "select" => {
            let mut points = rest.split_whitespace();
            let (Some(anchor), Some(focus), None) = (points.next(), points.next(), points.next())
            else {
                bail!("select takes an anchor and a focus");
            };
            Step::Select(parse_point(anchor)?, parse_point(focus)?)
        }
        "toolbar" => Step::Toolbar(Tool::parse(rest.trim())?),
        "undo" => Step::Undo,
        "redo" => Step::Redo,
        _ => bail!("unknown step"),
    };
    Ok(step)
}

pub fn apply(editor: &mut NoteEditor, step: &Step) -> Result<()> {
    match step {
        Step::Type(text) => editor.type_text(text)?,
        Step::Key(key) => {
            editor.handle_key(*key)?;
        }
        Step::Click(ix) => {
            editor.click_popup_item(*ix)?;
        }
        Step::Select(anchor, focus) => editor.view_mut().set_selection(Selection {
            anchor: anchor.clone(),
            focus: focus.clone(),
        }),
        Step::Toolbar(tool) => editor.view_mut().run(|chain| tool.build(chain))?,
        Step::Undo => {
            editor.view_mut().undo();
        }
        Step::Redo => {
            editor.view_mut().redo();
        }
    }
    Ok(())
}
