use std::{error, fmt};

use tclinterp::TclError;

/// Everything that can go wrong in this crate.
///
/// Validation errors are produced before anything is sent to Tcl. `Tcl` wraps a rejection
/// coming back from the interpreter, with the interpreter's message unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The option is not known to the config dict.
    UnknownOption(String),
    /// The option exists but must be changed through another API.
    DisabledOption {
        option: String,
        instruction: String,
    },
    Unsupported(String),
    /// The object is not (or no longer) part of a live widget.
    NotAttached(String),
    /// The operation would touch a slot that belongs to Tk, like the tree column.
    ReservedSlot(String),
    IndexOutOfRange {
        index: usize,
        len: usize,
    },
    TypeMismatch {
        path: String,
        expected: &'static str,
        actual: String,
    },
    /// Another object already owns this remote handle.
    IdentityConflict(String),
    Tcl(TclError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownOption(option) => write!(f, "unknown option {:?}", option),
            Error::DisabledOption {
                option,
                instruction,
            } => write!(
                f,
                "the {:?} option is not supported, {}",
                option, instruction
            ),
            Error::Unsupported(what) => write!(f, "unsupported: {}", what),
            Error::NotAttached(why) => write!(f, "not attached: {}", why),
            Error::ReservedSlot(why) => write!(f, "reserved slot: {}", why),
            Error::IndexOutOfRange { index, len } => write!(
                f,
                "index {} is out of range for a list of length {}",
                index, len
            ),
            Error::TypeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{} is a {} widget, not a {}",
                path, actual, expected
            ),
            Error::IdentityConflict(handle) => write!(
                f,
                "{:?} is already owned by another object",
                handle
            ),
            Error::Tcl(err) => write!(f, "{}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Tcl(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TclError> for Error {
    fn from(err: TclError) -> Self {
        Error::Tcl(err)
    }
}

impl Error {
    pub fn is_tcl(&self) -> bool {
        matches!(self, Error::Tcl(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
