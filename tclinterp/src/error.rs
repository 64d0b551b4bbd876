use std::{borrow::Cow, error, fmt};

/// Represents an error returned from the Tcl interpreter.
///
/// This is usually just the error message produced by the command that failed, passed through
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TclError(pub Cow<'static, str>);

impl TclError {
    pub fn new(s: impl Into<Cow<'static, str>>) -> Self {
        Self(s.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    /// The error Tcl commands produce when called with the wrong number of arguments.
    pub fn wrong_args(usage: &str) -> Self {
        Self::new(format!("wrong # args: should be \"{}\"", usage))
    }

    pub fn unknown_option(option: &str) -> Self {
        Self::new(format!("unknown option \"{}\"", option))
    }

    pub fn expected(what: &str, got: &str) -> Self {
        Self::new(format!("expected {} but got \"{}\"", what, got))
    }
}

impl fmt::Display for TclError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl error::Error for TclError {}

impl From<TclError> for std::io::Error {
    fn from(err: TclError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

pub type Result<T, E = TclError> = std::result::Result<T, E>;
