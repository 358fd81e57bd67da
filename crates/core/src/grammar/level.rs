use std::collections::VecDeque;

use texfilter_tables::{ArgumentSpec, CommandDescriptor, CommandKind};

/// State of one group nesting level in the parser.
#[derive(Debug, Clone)]
pub struct ParserLevel<'t> {
    /// Tokens in this level are translatable by default.
    pub translatable: bool,
    /// Number of external arguments enclosing this level.
    pub externality: u32,
    /// Escapes are undone in this level.
    pub escape: bool,
    /// Translatable but opaque: content rides inside the enclosing tag.
    /// Used for non-translatable arguments of FORMAT commands.
    pub hidden: bool,
    /// Tag id of the command (or group) registered on this level.
    pub tag_id: i32,
    /// Next `[...]` is consumed.
    pub option_consumer: bool,
    /// Following `{...}` groups are consumed.
    pub argument_consumer: bool,
    command: Option<&'t CommandDescriptor>,
    arguments: VecDeque<ArgumentSpec>,
}

impl<'t> ParserLevel<'t> {
    /// The document level: translatable, escaped, not external.
    pub fn root() -> Self {
        Self::new(true, 0, true, false)
    }

    /// A fresh level with no command.
    pub fn new(translatable: bool, externality: u32, escape: bool, hidden: bool) -> Self {
        Self {
            translatable,
            externality,
            escape,
            hidden,
            tag_id: 0,
            option_consumer: false,
            argument_consumer: false,
            command: None,
            arguments: VecDeque::new(),
        }
    }

    /// Make `command` the level's current command.
    ///
    /// CONTROL commands swallow whatever options and arguments follow, so they
    /// turn on both consumer flags instead of queueing their arguments.
    pub fn register_command(&mut self, command: &'t CommandDescriptor) {
        self.command = Some(command);
        if command.kind == CommandKind::Control {
            self.option_consumer = true;
            self.argument_consumer = true;
            self.arguments.clear();
        } else {
            self.option_consumer = false;
            self.argument_consumer = false;
            self.arguments = command.args.iter().copied().collect();
        }
    }

    /// Drop the current command together with its tag and pending arguments.
    pub fn unregister_command(&mut self) {
        self.command = None;
        self.tag_id = 0;
        self.option_consumer = false;
        self.argument_consumer = false;
        self.arguments.clear();
    }

    /// Current command, if any.
    pub fn command(&self) -> Option<&'t CommandDescriptor> {
        self.command
    }

    /// The current command is a FORMAT command.
    pub fn has_format_command(&self) -> bool {
        self.command.is_some_and(CommandDescriptor::is_format)
    }

    /// The current command has a non-FORMAT kind.
    pub fn has_plain_command(&self) -> bool {
        self.command.is_some_and(|c| !c.is_format())
    }

    /// At least one declared argument is still expected.
    pub fn has_argument_in_queue(&self) -> bool {
        !self.arguments.is_empty()
    }

    /// Take the next expected argument.
    pub fn fetch_argument(&mut self) -> Option<ArgumentSpec> {
        self.arguments.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_command_consumes_everything() {
        let label = CommandDescriptor::new(
            CommandKind::Control,
            "label",
            None,
            vec![ArgumentSpec::PLAIN],
        );
        let mut level = ParserLevel::root();
        level.register_command(&label);
        assert!(level.option_consumer && level.argument_consumer);
        assert!(!level.has_argument_in_queue());
        assert!(level.has_plain_command());
    }

    #[test]
    fn unregister_clears_tag_and_queue() {
        let href = CommandDescriptor::new(
            CommandKind::Format,
            "href",
            Some("h".into()),
            vec![ArgumentSpec::new(true, true, false), ArgumentSpec::PLAIN],
        );
        let mut level = ParserLevel::root();
        level.register_command(&href);
        level.tag_id = 4;
        assert_eq!(level.fetch_argument(), Some(ArgumentSpec::new(true, true, false)));
        assert!(level.has_argument_in_queue());
        level.unregister_command();
        assert_eq!(level.tag_id, 0);
        assert!(level.command().is_none());
        assert!(!level.has_argument_in_queue());
    }
}
