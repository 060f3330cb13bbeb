use dlassist_actions::default_registry;

use crate::commands::CommandResult;

pub fn run() -> CommandResult {
    let names = default_registry().names();
    CommandResult::raw(0, names.join("\n"))
}
