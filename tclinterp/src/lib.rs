#![deny(unused_imports, unused_must_use)]

mod backend;
mod error;
mod interp;
mod list;
mod obj;
mod postoffice;
#[cfg(any(test, feature = "sim"))]
mod sim;
#[cfg(feature = "tk")]
mod tcl;
mod value;

pub use crate::backend::{Backend, Invoke, Reply};
pub use crate::error::{Result, TclError};
pub use crate::interp::{Command, CommandData, TclInterp};
pub use crate::list::{merge, parse_boolean, quote_element, split_list};
pub use crate::obj::{TclObj, ToTclObj};
#[cfg(any(test, feature = "sim"))]
pub use crate::sim::SimTk;
#[cfg(feature = "tk")]
pub use crate::tcl::TclBackend;
pub use crate::value::{ReturnType, TclValue};
