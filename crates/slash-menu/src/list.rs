/// Highlight and scroll state of the command list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandList {
    len: usize,
    highlighted: usize,
    scroll_offset: usize,
    max_visible: usize,
}

impl CommandList {
    pub fn new(max_visible: usize) -> Self {
        Self {
            len: 0,
            highlighted: 0,
            scroll_offset: 0,
            max_visible: max_visible.max(1),
        }
    }

    /// Starts over on a freshly displayed list.
    pub fn reset(&mut self, len: usize) {
        self.len = len;
        self.highlighted = 0;
        self.scroll_offset = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn highlighted(&self) -> Option<usize> {
        (self.len > 0).then_some(self.highlighted)
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub fn move_up(&mut self) {
        if self.len == 0 {
            return;
        }
        self.highlighted = (self.highlighted + self.len - 1) % self.len;
        self.ensure_highlighted_visible();
    }

    pub fn move_down(&mut self) {
        if self.len == 0 {
            return;
        }
        self.highlighted = (self.highlighted + 1) % self.len;
        self.ensure_highlighted_visible();
    }

    /// Highlights `index`. Returns false when it is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.highlighted = index;
        self.ensure_highlighted_visible();
        true
    }

    /// Nearest-edge scrolling: the window moves only as far as needed.
    fn ensure_highlighted_visible(&mut self) {
        if self.highlighted < self.scroll_offset {
            self.scroll_offset = self.highlighted;
        } else if self.highlighted >= self.scroll_offset + self.max_visible {
            self.scroll_offset = self.highlighted + 1 - self.max_visible;
        }
    }
}
