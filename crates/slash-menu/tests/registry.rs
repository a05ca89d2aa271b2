mod common;

use jotter_slash_menu::{CommandRegistry, DEFAULT_COMMANDS, PaletteConfig, Placement};
use pretty_assertions::assert_eq;

#[test]
fn default_commands_keep_their_order() {
    assert_eq!(
        common::titles(&DEFAULT_COMMANDS),
        vec![
            "Heading 1",
            "Heading 2",
            "Heading 3",
            "Bullet List",
            "Numbered List",
            "Blockquote",
            "Code Block",
            "Horizontal Rule",
        ]
    );
    assert_eq!(CommandRegistry::default().titles(), common::titles(&DEFAULT_COMMANDS));
}

#[test]
fn default_commands_carry_labels() {
    let icons: Vec<_> = DEFAULT_COMMANDS.iter().map(|c| c.icon).collect();
    assert_eq!(icons, vec!["H1", "H2", "H3", "•", "1.", "\"", "</>", "—"]);
    assert_eq!(DEFAULT_COMMANDS[3].description, "Create a simple bullet list");
    assert_eq!(DEFAULT_COMMANDS[7].description, "Insert a horizontal divider");
}

#[test]
fn palette_config_defaults() {
    let config = PaletteConfig::default();
    assert_eq!(config.trigger, '/');
    assert_eq!(config.max_visible, 8);
    assert_eq!(config.placement, Placement::BottomStart);
    assert_eq!(config.empty_label, "No results");
}
