use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use tclinterp::TclValue;

type Func = Arc<dyn Fn(&[TclValue]) + Send + Sync>;

/// A list of functions to run when something happens.
///
/// Every function gets the arguments the event came with, already decoded. Most events have
/// none.
///
/// Clones share the same list, so connecting through one clone is visible through all of them.
#[derive(Clone, Default)]
pub struct Callback(Arc<Mutex<Vec<Func>>>);

impl Callback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `func` to be called when the callback runs.
    pub fn connect<F>(&self, func: F)
    where
        F: Fn(&[TclValue]) + Send + Sync + 'static,
    {
        self.0.lock().push(Arc::new(func));
    }

    /// Run every connected function, in the order they were connected.
    pub fn run(&self, args: &[TclValue]) {
        // Connected functions may connect more functions to this callback.
        let funcs = self.0.lock().clone();
        for func in funcs {
            func(args);
        }
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn same_as(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Callback({} connected)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let callback = Callback::new();

        for i in 0..3 {
            let log = log.clone();
            callback.connect(move |_| log.lock().push(i));
        }
        assert_eq!(callback.len(), 3);

        callback.run(&[]);
        callback.clone().run(&[]);
        assert_eq!(*log.lock(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_connect_while_running() {
        let count = Arc::new(AtomicUsize::new(0));
        let callback = Callback::new();

        {
            let inner = callback.clone();
            let count = count.clone();
            callback.connect(move |_| {
                let count = count.clone();
                inner.connect(move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                });
            });
        }

        callback.run(&[]);
        assert_eq!(callback.len(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_every_function_gets_the_arguments() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let callback = Callback::new();

        for _ in 0..2 {
            let log = log.clone();
            callback.connect(move |args| log.lock().push(args.to_vec()));
        }

        callback.run(&[TclValue::Int(4), TclValue::from("x")]);
        assert_eq!(
            *log.lock(),
            vec![vec![TclValue::Int(4), TclValue::from("x")]; 2]
        );
    }
}
