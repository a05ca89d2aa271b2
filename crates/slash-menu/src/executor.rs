use jotter_doc_core::{ChainError, Editor};

use crate::command::SlashCommand;
use crate::trigger::TriggerMatch;

/// Removes the trigger text and applies `command` as one transaction.
pub fn execute(editor: &mut Editor, trigger: &TriggerMatch, command: &SlashCommand) -> Result<(), ChainError> {
    let chain = editor
        .chain()
        .focus()
        .delete_range(trigger.path.clone(), trigger.range.clone());
    (command.action)(chain).run()
}
