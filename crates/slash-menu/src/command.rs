use std::fmt;

use jotter_doc_core::Chain;

/// Structural edit appended to a chain that already removed the trigger.
pub type Action = for<'a> fn(Chain<'a>) -> Chain<'a>;

#[derive(Clone, Copy)]
pub struct SlashCommand {
    pub title: &'static str,
    pub description: &'static str,
    /// Presentation handle. Renderers decide how to draw it.
    pub icon: &'static str,
    pub action: Action,
}

impl fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashCommand")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

fn heading_1(chain: Chain<'_>) -> Chain<'_> {
    chain.set_heading(1)
}

fn heading_2(chain: Chain<'_>) -> Chain<'_> {
    chain.set_heading(2)
}

fn heading_3(chain: Chain<'_>) -> Chain<'_> {
    chain.set_heading(3)
}

fn bullet_list(chain: Chain<'_>) -> Chain<'_> {
    chain.toggle_bullet_list()
}

fn numbered_list(chain: Chain<'_>) -> Chain<'_> {
    chain.toggle_ordered_list()
}

fn blockquote(chain: Chain<'_>) -> Chain<'_> {
    chain.toggle_blockquote()
}

fn code_block(chain: Chain<'_>) -> Chain<'_> {
    chain.toggle_code_block()
}

fn horizontal_rule(chain: Chain<'_>) -> Chain<'_> {
    chain.insert_divider()
}

pub static DEFAULT_COMMANDS: [SlashCommand; 8] = [
    SlashCommand {
        title: "Heading 1",
        description: "Large section heading",
        icon: "H1",
        action: heading_1,
    },
    SlashCommand {
        title: "Heading 2",
        description: "Medium section heading",
        icon: "H2",
        action: heading_2,
    },
    SlashCommand {
        title: "Heading 3",
        description: "Small section heading",
        icon: "H3",
        action: heading_3,
    },
    SlashCommand {
        title: "Bullet List",
        description: "Create a simple bullet list",
        icon: "•",
        action: bullet_list,
    },
    SlashCommand {
        title: "Numbered List",
        description: "Create a numbered list",
        icon: "1.",
        action: numbered_list,
    },
    SlashCommand {
        title: "Blockquote",
        description: "Create a blockquote",
        icon: "\"",
        action: blockquote,
    },
    SlashCommand {
        title: "Code Block",
        description: "Create a code block",
        icon: "</>",
        action: code_block,
    },
    SlashCommand {
        title: "Horizontal Rule",
        description: "Insert a horizontal divider",
        icon: "—",
        action: horizontal_rule,
    },
];

/// Ordered, immutable view over a command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandRegistry {
    commands: &'static [SlashCommand],
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(&DEFAULT_COMMANDS)
    }
}

impl CommandRegistry {
    pub fn new(commands: &'static [SlashCommand]) -> Self {
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'static SlashCommand> {
        self.commands.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'static, SlashCommand> {
        self.commands.iter()
    }

    pub fn titles(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.title).collect()
    }
}
