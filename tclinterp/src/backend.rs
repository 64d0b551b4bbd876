use std::sync::Arc;

use crate::{error::Result, list::split_list};

/// What a backend produced for a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The command's result.
    Value(String),
    /// The result is whatever evaluating this other command returns, e.g. a button's `invoke`
    /// running the button's `-command`.
    Eval(Vec<String>),
}

impl Reply {
    pub fn empty() -> Self {
        Reply::Value(String::new())
    }
}

impl From<String> for Reply {
    fn from(s: String) -> Self {
        Reply::Value(s)
    }
}

impl From<&str> for Reply {
    fn from(s: &str) -> Self {
        Reply::Value(s.to_owned())
    }
}

/// A command implemented in Rust, as seen by a backend: arguments without the command name in,
/// result or error message out.
pub type Invoke = Arc<dyn Fn(&[String]) -> std::result::Result<String, String> + Send + Sync>;

/// The thing that actually executes Tcl commands.
///
/// `TclInterp` handles threading and logging. Everything here except list handling is only ever
/// called from the interpreter's owner thread, and never with any of the interpreter's locks held,
/// so commands created with `create_command` may call back into the interpreter.
pub trait Backend: Send + Sync {
    fn call(&self, argv: &[String]) -> Result<Reply>;

    /// Evaluate a script.
    fn eval(&self, code: &str) -> Result<Reply> {
        self.call(&split_list(code)?)
    }

    fn init_tk(&self) -> Result<()> {
        self.call(&["package".to_owned(), "require".to_owned(), "Tk".to_owned()])?;
        Ok(())
    }

    /// Make `name` run `invoke`, shadowing any other command with that name.
    fn create_command(&self, name: &str, invoke: Invoke) -> Result<()>;

    fn delete_command(&self, name: &str) -> Result<()>;

    /// Handle one pending event without waiting. Returns whether there was one.
    fn do_one_event(&self) -> bool {
        false
    }

    fn delete(&self) {}
}
