use std::sync::Arc;

/// One named state of a machine definition.
///
/// States are declared on [`DefinitionBuilder`](crate::DefinitionBuilder);
/// the `initial`/`terminal` flags come from the builder marks. Terminal is
/// a marker, not a block: a terminal state without declared outgoing
/// transitions ignores every trigger, one with them can still be left.
#[derive(Debug, Clone)]
pub struct State {
    name: Arc<str>,
    initial: bool,
    terminal: bool,
}

impl State {
    pub(crate) fn new(name: Arc<str>, initial: bool, terminal: bool) -> Self {
        Self {
            name,
            initial,
            terminal,
        }
    }

    /// State name, unique within its definition.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for the state instances start in.
    pub fn is_initial(&self) -> bool {
        self.initial
    }

    /// Returns `true` for states marked terminal.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub(crate) fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}
