use jotter_doc_core::{CaretGeometry, Editor, Key, PointerEvent, Propagation, ViewError, ViewPlugin};

use crate::command::CommandRegistry;
use crate::config::PaletteConfig;
use crate::error::PaletteError;
use crate::executor;
use crate::geometry::Anchor;
use crate::list::CommandList;
use crate::popup::{ItemProps, ListProps, PopupBackend, PopupHandle};
use crate::trigger::{self, Detection, TriggerMatch};

pub const PLUGIN_ID: &str = "slash_menu";

/// Snapshot of the palette for hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerState {
    pub is_open: bool,
    pub anchor: Option<Anchor>,
    pub highlighted_index: Option<usize>,
}

struct OpenCycle {
    trigger: TriggerMatch,
    anchor: Anchor,
}

/// Slash-command palette driven by editor view updates.
///
/// Opens when the text right before a collapsed caret is exactly the trigger
/// character, and closes on anything else. While open it claims
/// `ArrowUp`, `ArrowDown` and `Enter`.
pub struct SlashPalette {
    config: PaletteConfig,
    registry: CommandRegistry,
    list: CommandList,
    popup: PopupHandle,
    open: Option<OpenCycle>,
}

impl SlashPalette {
    pub fn new(config: PaletteConfig, registry: CommandRegistry, backend: Box<dyn PopupBackend>) -> Self {
        let config = config.with_defaults();
        Self {
            list: CommandList::new(config.max_visible),
            config,
            registry,
            popup: PopupHandle::new(backend),
            open: None,
        }
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn state(&self) -> TriggerState {
        TriggerState {
            is_open: self.open.is_some(),
            anchor: self.open.as_ref().map(|cycle| cycle.anchor),
            highlighted_index: self.open.as_ref().and_then(|_| self.list.highlighted()),
        }
    }

    pub fn popup(&self) -> &PopupHandle {
        &self.popup
    }

    fn props(&self) -> ListProps {
        ListProps {
            items: self.registry.iter().map(ItemProps::from).collect(),
            highlighted: self.list.highlighted(),
            scroll_offset: self.list.scroll_offset(),
            max_visible: self.list.max_visible(),
            empty_label: self.config.empty_label.clone(),
        }
    }

    fn close(&mut self) {
        if self.open.take().is_some() {
            tracing::debug!("slash palette closed");
        }
        self.popup.close();
    }

    fn refresh(&mut self) {
        tracing::trace!(highlighted = ?self.list.highlighted(), "slash palette highlight moved");
        let props = self.props();
        self.popup.refresh(&props);
    }

    /// Runs the highlighted command. Returns whether a command ran.
    ///
    /// The cycle ends before the edit is applied, so a second confirm in the
    /// same cycle finds nothing to do.
    pub fn confirm(&mut self, editor: &mut Editor) -> Result<bool, PaletteError> {
        if self.open.is_none() {
            return Ok(false);
        }
        let Some(command) = self.list.highlighted().and_then(|ix| self.registry.get(ix)) else {
            return Ok(false);
        };
        let Some(cycle) = self.open.take() else {
            return Ok(false);
        };
        self.popup.close();
        tracing::debug!(command = command.title, "slash command confirmed");

        executor::execute(editor, &cycle.trigger, command).map_err(|err| {
            tracing::warn!(command = command.title, %err, "slash command rejected");
            PaletteError::from(err)
        })?;
        Ok(true)
    }

    /// Highlights row `index` and confirms it.
    pub fn click(&mut self, editor: &mut Editor, index: usize) -> Result<bool, PaletteError> {
        if self.open.is_none() || !self.list.select(index) {
            return Ok(false);
        }
        self.confirm(editor)
    }
}

impl ViewPlugin for SlashPalette {
    fn id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn update(&mut self, editor: &Editor, geometry: &dyn CaretGeometry) {
        let trigger = match trigger::detect(editor, self.config.trigger) {
            Detection::Open(trigger) => trigger,
            Detection::RangeSelection | Detection::Closed => {
                self.close();
                return;
            }
        };

        let rect = match geometry.coords_at(&trigger.caret) {
            Ok(rect) => rect,
            Err(err) => {
                tracing::debug!(%err, "no caret coordinates for slash palette");
                // Keep the popup where it is, but confirm must delete the `/` at the caret now.
                if let Some(open) = self.open.as_mut() {
                    open.trigger = trigger;
                }
                return;
            }
        };
        let anchor = Anchor::at_caret(rect);

        if self.open.is_none() {
            self.list.reset(self.registry.len());
            tracing::debug!(commands = self.registry.len(), "slash palette opened");
        }
        self.open = Some(OpenCycle { trigger, anchor });

        let props = self.props();
        self.popup.open(anchor, self.config.placement, &props);
    }

    fn handle_key(&mut self, editor: &mut Editor, key: Key) -> Result<Propagation, ViewError> {
        if self.open.is_none() {
            return Ok(Propagation::Continue);
        }
        match key {
            Key::ArrowUp => {
                self.list.move_up();
                self.refresh();
            }
            Key::ArrowDown => {
                self.list.move_down();
                self.refresh();
            }
            Key::Enter => {
                self.confirm(editor)?;
            }
            _ => return Ok(Propagation::Continue),
        }
        Ok(Propagation::Stop)
    }

    fn handle_pointer(&mut self, editor: &mut Editor, event: PointerEvent) -> Result<Propagation, ViewError> {
        if self.open.is_none() {
            return Ok(Propagation::Continue);
        }
        match event {
            PointerEvent::PopupItem(index) => {
                self.click(editor, index)?;
                Ok(Propagation::Stop)
            }
            PointerEvent::Outside => {
                self.close();
                Ok(Propagation::Continue)
            }
        }
    }

    fn destroy(&mut self) {
        self.open = None;
        self.popup.teardown();
    }
}
