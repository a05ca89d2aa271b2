mod demo;
mod render;
mod script;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use jotter_notes::{
    ContentStore, MemoryStore, NoteEditor, NoteEditorConfig, StaticSession, User, save_note,
};
use jotter_slash_menu::PaletteConfig;
use tracing_subscriber::EnvFilter;

use crate::render::{MonospaceGeometry, TextBackend, Transcript};

#[derive(Parser, Debug)]
#[command(name = "jotter-story")]
#[command(about = "Replays editing sessions through the slash-command palette")]
#[command(version)]
struct Cli {
    /// Script of editing events, one per line. Runs the built-in demo when omitted.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Palette settings as JSON.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let palette = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            PaletteConfig::from_json_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => PaletteConfig::default(),
    };

    let source = match &cli.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => demo::SCRIPT.to_string(),
    };
    let steps = script::parse(&source)?;

    let transcript = Transcript::default();
    let mut store = MemoryStore::new();
    let session = StaticSession::signed_in(User::new("story"));
    let note = store.create("story", "Story", "")?;

    let mut editor = NoteEditor::new(
        NoteEditorConfig {
            palette,
            ..NoteEditorConfig::default()
        },
        &note.content,
        Box::new(MonospaceGeometry::default()),
        Box::new(TextBackend::new(transcript.clone())),
    )?;
    let saved = transcript.clone();
    let pending = std::rc::Rc::new(std::cell::RefCell::new(None::<String>));
    let sink = pending.clone();
    editor.on_change(move |html| {
        saved.line(format!("  change: {html}"));
        *sink.borrow_mut() = Some(html.to_string());
    });

    for step in &steps {
        transcript.line(format!("> {step}"));
        if let Err(err) = script::apply(&mut editor, step) {
            transcript.line(format!("  error: {err:#}"));
        }
        if let Some(html) = pending.borrow_mut().take() {
            save_note(&mut store, &session, note.id, &html)?;
        }
    }
    editor.destroy();

    for line in transcript.take() {
        println!("{line}");
    }
    let stored = store.get(note.id)?;
    tracing::debug!(id = %stored.id, updated_at = %stored.updated_at, "final note state");
    println!();
    println!("{}", editor.html());
    Ok(())
}
