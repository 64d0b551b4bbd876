//! A simulated Tk that turns down chosen commands, to see what a rejection leaves behind.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::debug;
use parking_lot::Mutex;

use tclinterp::{Backend, Invoke, Reply, Result as TclResult, SimTk, TclError, TclInterp};

use crate::app::TkApp;

#[derive(Default)]
struct Inner {
    sim: SimTk,
    /// Argument prefixes of the calls to reject.
    rules: Mutex<Vec<Vec<String>>>,
    reject_deletes: AtomicBool,
}

#[derive(Clone, Default)]
pub struct Rejecting(Arc<Inner>);

impl Rejecting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an application on top of this backend.
    pub fn app(&self) -> TkApp {
        let interp = TclInterp::with_backend(self.clone()).unwrap();
        TkApp::with_interp(interp).unwrap()
    }

    /// Reject every call whose arguments start with `prefix`.
    pub fn reject(&self, prefix: &[&str]) {
        self.0
            .rules
            .lock()
            .push(prefix.iter().map(|s| s.to_string()).collect());
    }

    pub fn allow_all(&self) {
        self.0.rules.lock().clear();
    }

    pub fn reject_command_deletion(&self, reject: bool) {
        self.0.reject_deletes.store(reject, Ordering::SeqCst);
    }

    fn rejects(&self, argv: &[String]) -> bool {
        self.0
            .rules
            .lock()
            .iter()
            .any(|prefix| argv.starts_with(prefix))
    }
}

impl Backend for Rejecting {
    fn call(&self, argv: &[String]) -> TclResult<Reply> {
        if self.rejects(argv) {
            debug!("Rejecting {:?}", argv);
            return Err(TclError::new(format!("rejected: {}", argv.join(" "))));
        }
        self.0.sim.call(argv)
    }

    fn eval(&self, code: &str) -> TclResult<Reply> {
        self.0.sim.eval(code)
    }

    fn do_one_event(&self) -> bool {
        self.0.sim.do_one_event()
    }

    fn create_command(&self, name: &str, invoke: Invoke) -> TclResult<()> {
        self.0.sim.create_command(name, invoke)
    }

    fn delete_command(&self, name: &str) -> TclResult<()> {
        if self.0.reject_deletes.load(Ordering::SeqCst) {
            return Err(TclError::new(format!("rejected: delete {}", name)));
        }
        self.0.sim.delete_command(name)
    }

    fn delete(&self) {
        self.0.sim.delete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tclinterp::ReturnType;

    #[test]
    fn test_rejects_matching_calls_only() {
        let backend = Rejecting::new();
        let app = backend.app();
        backend.reject(&["winfo", "class"]);

        assert_eq!(
            app.call(&ReturnType::Str, &["winfo", "class", "."]).unwrap_err(),
            crate::Error::Tcl(TclError::new("rejected: winfo class ."))
        );
        assert!(app.call(&ReturnType::Bool, &["winfo", "exists", "."]).is_ok());

        backend.allow_all();
        assert_eq!(
            app.call(&ReturnType::Str, &["winfo", "class", "."]).unwrap(),
            "Tk"
        );
    }
}
