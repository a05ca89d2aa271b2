use crate::command::SlashCommand;
use crate::geometry::{Anchor, Placement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemProps {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

impl From<&SlashCommand> for ItemProps {
    fn from(command: &SlashCommand) -> Self {
        Self {
            title: command.title,
            description: command.description,
            icon: command.icon,
        }
    }
}

/// Everything a renderer needs to draw the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListProps {
    pub items: Vec<ItemProps>,
    pub highlighted: Option<usize>,
    pub scroll_offset: usize,
    pub max_visible: usize,
    /// Shown instead of the list when `items` is empty.
    pub empty_label: String,
}

impl ListProps {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Rows inside the scroll window, paired with their list index.
    pub fn visible_items(&self) -> impl Iterator<Item = (usize, &ItemProps)> {
        self.items
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.max_visible)
    }
}

/// Draws the list into the panel's content element.
pub trait Renderer {
    fn mount(&mut self, props: &ListProps);
    fn update(&mut self, props: &ListProps);
    fn unmount(&mut self);
}

/// Floating surface pinned to an anchor.
///
/// A shown panel listens for outside clicks and window resizes; `hide` must
/// drop those listeners.
pub trait FloatingPanel {
    fn set_reference(&mut self, anchor: Anchor, placement: Placement);
    fn show(&mut self);
    fn hide(&mut self);
    fn destroy(&mut self);
}

pub trait PopupBackend {
    fn create_renderer(&mut self) -> Box<dyn Renderer>;
    fn create_panel(&mut self) -> Box<dyn FloatingPanel>;
}

struct Mounted {
    renderer: Box<dyn Renderer>,
    panel: Box<dyn FloatingPanel>,
    visible: bool,
}

/// One panel and one rendered list, created on first open and reused after.
pub struct PopupHandle {
    backend: Box<dyn PopupBackend>,
    mounted: Option<Mounted>,
}

impl PopupHandle {
    pub fn new(backend: Box<dyn PopupBackend>) -> Self {
        Self {
            backend,
            mounted: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.mounted.as_ref().is_some_and(|m| m.visible)
    }

    pub fn open(&mut self, anchor: Anchor, placement: Placement, props: &ListProps) {
        match &mut self.mounted {
            Some(mounted) => {
                mounted.renderer.update(props);
                mounted.panel.set_reference(anchor, placement);
                if !mounted.visible {
                    mounted.panel.show();
                    mounted.visible = true;
                }
            }
            None => {
                let mut renderer = self.backend.create_renderer();
                renderer.mount(props);
                let mut panel = self.backend.create_panel();
                panel.set_reference(anchor, placement);
                panel.show();
                self.mounted = Some(Mounted {
                    renderer,
                    panel,
                    visible: true,
                });
            }
        }
    }

    /// Pushes new props to a visible list.
    pub fn refresh(&mut self, props: &ListProps) {
        if let Some(mounted) = &mut self.mounted
            && mounted.visible
        {
            mounted.renderer.update(props);
        }
    }

    pub fn close(&mut self) {
        if let Some(mounted) = &mut self.mounted
            && mounted.visible
        {
            mounted.panel.hide();
            mounted.visible = false;
        }
    }

    pub fn teardown(&mut self) {
        let Some(mut mounted) = self.mounted.take() else {
            return;
        };
        if mounted.visible {
            mounted.panel.hide();
        }
        mounted.panel.destroy();
        mounted.renderer.unmount();
    }
}
