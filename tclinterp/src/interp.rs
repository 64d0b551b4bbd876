use std::{collections::HashMap, sync::Arc, thread, time::Duration};

use crossbeam_channel::RecvTimeoutError;
use log::{debug, trace};
use parking_lot::Mutex;

#[cfg(any(test, feature = "sim"))]
use crate::sim::SimTk;
#[cfg(feature = "tk")]
use crate::tcl::TclBackend;
use crate::{
    backend::{Backend, Reply},
    error::{Result, TclError},
    list::{parse_boolean, split_list},
    obj::{TclObj, ToTclObj},
    postoffice::{PostOffice, TclRequest, TclResponse},
    value::{ReturnType, TclValue},
};

/// How long `mainloop()` waits for requests from other threads between two rounds of Tcl events.
const IDLE_WAIT: Duration = Duration::from_millis(20);

/// Access a TclInterpData attribute through the Arc<Mutex<_>>.
macro_rules! attr {
    ($self:ident.$name:ident) => {
        $self.0.lock().$name
    };
}

mod createcommand;
pub use createcommand::{Command, CommandData};

struct TclInterpData {
    backend: Arc<dyn Backend>,
    commands: HashMap<String, Arc<CommandData>>,
    exit_var_name: String,
    deleted: bool,
    torn_down: bool,

    owner: thread::ThreadId,
    post_office: PostOffice,
}

/// A handle to a Tcl interpreter.
///
/// This type can be cloned to get another reference to the same interpreter. It is safe to have as
/// many of them around as you want, on as many threads as you want: calls made from any thread
/// other than the one that created the interpreter are posted to that thread and block until it
/// has served them (see [`TclInterp::update`] and [`TclInterp::mainloop`]).
///
/// Any of the methods of this struct that return a `Result` have the possibility to return an
/// `Err` if the interpreter is used post-deletion.
#[derive(Clone)]
pub struct TclInterp(Arc<Mutex<TclInterpData>>);

impl TclInterp {
    /// Create a new Tcl interpreter. The calling thread becomes its owner thread.
    ///
    /// # Errors
    /// This function fails if libtcl can not create or initialize the interpreter.
    #[cfg(feature = "tk")]
    pub fn new() -> Result<Self> {
        Self::with_backend(TclBackend::new()?)
    }

    /// Create a new interpreter backed by the built-in Tk simulator.
    #[cfg(any(test, feature = "sim"))]
    pub fn simulated() -> Result<Self> {
        Self::with_backend(SimTk::new())
    }

    /// Create a new interpreter that executes its commands with `backend`.
    ///
    /// The calling thread becomes the interpreter's owner thread.
    pub fn with_backend(backend: impl Backend + 'static) -> Result<Self> {
        let exit_var_name = format!("exit_var_{}", rand::random::<u64>());
        debug!("Creating exit variable {:?}", exit_var_name);

        let inst = Self(Arc::new(Mutex::new(TclInterpData {
            backend: Arc::new(backend),
            commands: Default::default(),
            exit_var_name: exit_var_name.clone(),
            deleted: false,
            torn_down: false,

            owner: thread::current().id(),
            post_office: PostOffice::new(),
        })));

        inst.call(&["set", &exit_var_name, "false"])?;
        Ok(inst)
    }

    fn backend(&self) -> Arc<dyn Backend> {
        attr!(self.backend).clone()
    }

    /// Run `f` right away on the main thread, or post it there from any other thread.
    fn on_main<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&TclInterp) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        if self.is_main_thread() {
            f(self)
        } else {
            let this = self.clone();
            self.run_on_main(move || f(&this))?
        }
    }

    /// Prepare this interpreter for Tk usage.
    pub fn init_tk(&self) -> Result<()> {
        self.on_main(|interp| {
            interp.check_alive()?;
            debug!("Initializing Tk");
            interp.backend().init_tk()
        })
    }

    pub fn deleted(&self) -> bool {
        attr!(self.deleted)
    }

    #[inline]
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == attr!(self.owner)
    }

    fn check_alive(&self) -> Result<()> {
        if self.deleted() {
            Err(TclError::new("Tried to use interpreter after deletion"))
        } else {
            Ok(())
        }
    }

    /// Evaluate a Tcl script.
    ///
    /// # Errors
    /// This function fails if there is an error evaluating the script.
    pub fn eval(&self, code: &str) -> Result<TclObj> {
        let code = code.to_owned();
        self.on_main(move |interp| {
            interp.check_alive()?;
            trace!("Evaluating code {:?}", code);

            match interp.backend().eval(&code)? {
                Reply::Value(value) => Ok(TclObj::from(value)),
                Reply::Eval(next) => interp.dispatch(next),
            }
        })
    }

    /// Evaluate a command given as a list of words.
    ///
    /// # Errors
    /// This function fails if there is an error evaluating the command.
    pub fn call<I>(&self, it: I) -> Result<TclObj>
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        let argv = it
            .into_iter()
            .map(|arg| arg.to_tcl_obj().into_string())
            .collect::<Vec<_>>();

        if self.is_main_thread() {
            self.dispatch(argv)
        } else {
            self.post_call(argv)
        }
    }

    /// Like `call()`, but decodes the reply according to `ty`.
    pub fn call_as<I>(&self, ty: &ReturnType, it: I) -> Result<TclValue>
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        let reply = self.call(it)?;
        ty.decode(&reply)
    }

    fn dispatch(&self, mut argv: Vec<String>) -> Result<TclObj> {
        loop {
            self.check_alive()?;
            trace!("Calling {:?}", argv);

            if argv.is_empty() {
                return Err(TclError::new("can not call an empty command"));
            }

            // The lock must not be held while the command runs, commands are free to call back
            // into the interpreter.
            let reply = self.backend().call(&argv)?;
            match reply {
                Reply::Value(value) => return Ok(TclObj::from(value)),
                Reply::Eval(next) => argv = next,
            }
        }
    }

    fn post(&self, request: TclRequest) -> Result<()> {
        self.check_alive()?;
        trace!("Posting {:?} to the main thread", request);

        let sender = attr!(self.post_office).sender.clone();
        sender
            .send(request)
            .map_err(|_| TclError::new("The interpreter's main thread is gone"))
    }

    fn post_call(&self, argv: Vec<String>) -> Result<TclObj> {
        let (reply_sender, reply_receiver) = crossbeam_channel::bounded(1);
        self.post(TclRequest::Call(argv, reply_sender))?;

        match reply_receiver.recv() {
            Ok(TclResponse::Call(result)) => result,
            Err(_) => Err(TclError::new("The request was dropped by the main thread")),
        }
    }

    /// Run `f` on the interpreter's main thread and return its result.
    ///
    /// On the main thread this just calls `f`. Anywhere else `f` is posted to the main thread and
    /// this blocks until the main thread has run it.
    pub fn run_on_main<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_main_thread() {
            return Ok(f());
        }

        let (reply_sender, reply_receiver) = crossbeam_channel::bounded(1);
        self.post(TclRequest::Run(Box::new(move || {
            // The requesting thread may have given up; nothing to do about that here.
            let _ = reply_sender.send(f());
        })))?;

        reply_receiver
            .recv()
            .map_err(|_| TclError::new("The request was dropped by the main thread"))
    }

    fn serve(&self, request: TclRequest) {
        trace!("Serving {:?}", request);

        match request {
            TclRequest::Call(argv, reply) => {
                let _ = reply.send(TclResponse::Call(self.dispatch(argv)));
            }
            TclRequest::Run(job) => job(),
        }
    }

    fn check_main_thread(&self, what: &str) -> Result<()> {
        if self.is_main_thread() {
            Ok(())
        } else {
            Err(TclError::new(format!(
                "{} can only be called from the interpreter's main thread",
                what
            )))
        }
    }

    /// Serve every request other threads have posted so far.
    ///
    /// Returns the number of requests served.
    pub fn update(&self) -> Result<usize> {
        self.check_main_thread("update()")?;

        let receiver = attr!(self.post_office).receiver.clone();
        let mut served = 0;
        while let Ok(request) = receiver.try_recv() {
            self.serve(request);
            served += 1;
        }
        Ok(served)
    }

    fn should_exit(&self, exit_var_name: &str) -> Result<bool> {
        // A deleted interpreter keeps the loop going until the backend has been torn down here.
        if self.deleted() {
            return Ok(attr!(self.torn_down));
        }

        match self.get_var(exit_var_name) {
            Ok(value) => Ok(value.as_str() == "true"),
            Err(_) if self.deleted() => Ok(attr!(self.torn_down)),
            Err(err) => Err(err),
        }
    }

    /// Handle Tcl events and requests from other threads until `quit()` is called or the
    /// interpreter is deleted.
    pub fn mainloop(&self) -> Result<()> {
        self.check_main_thread("mainloop()")?;

        let exit_var_name = attr!(self.exit_var_name).clone();
        self.call(&["set", &exit_var_name, "false"])?;

        let receiver = attr!(self.post_office).receiver.clone();
        while !self.should_exit(&exit_var_name)? {
            if self.backend().do_one_event() {
                while let Ok(request) = receiver.try_recv() {
                    self.serve(request);
                }
                continue;
            }

            match receiver.recv_timeout(IDLE_WAIT) {
                Ok(request) => self.serve(request),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!("Leaving the main loop");
        Ok(())
    }

    /// Make a running `mainloop()` return.
    pub fn quit(&self) -> Result<()> {
        let exit_var_name = attr!(self.exit_var_name).clone();
        self.call(&["set", &exit_var_name, "true"])?;
        Ok(())
    }

    pub fn get_var(&self, name: &str) -> Result<TclObj> {
        self.call(&["set", name])
    }

    pub fn set_var(&self, name: &str, value: impl ToTclObj) -> Result<TclObj> {
        self.call(vec![
            TclObj::from("set"),
            TclObj::from(name),
            value.to_tcl_obj(),
        ])
    }

    /// Split a Tcl list object into its parts.
    ///
    /// # Errors
    /// This function fails if `arg` can not be converted to a Tcl list.
    pub fn splitlist(&self, arg: impl ToTclObj) -> Result<Vec<String>> {
        split_list(arg.to_tcl_obj().as_str())
    }

    /// Convert a Tcl bool to a Rust bool.
    ///
    /// # Errors
    /// This function fails if `s` is not a Tcl bool.
    pub fn getboolean(&self, s: &str) -> Result<bool> {
        parse_boolean(s)
    }

    /// Delete the interpreter.
    ///
    /// After this function returns, every method that talks to the interpreter fails. Requests
    /// still waiting in the post office are answered with an error. The backend itself is torn
    /// down on the main thread: right away when called there, otherwise by the next `update()` or
    /// by a running `mainloop()`, which then returns.
    pub fn delete(&self) -> Result<()> {
        self.check_alive()?;
        debug!("Deleting interpreter");

        let (backend, post_office) = {
            let mut data = self.0.lock();
            data.deleted = true;
            data.commands.clear();
            (data.backend.clone(), data.post_office.clone())
        };

        while let Ok(request) = post_office.receiver.try_recv() {
            if let TclRequest::Call(_, reply) = request {
                let _ = reply.send(TclResponse::Call(Err(TclError::new(
                    "Tried to use interpreter after deletion",
                ))));
            }
        }

        let data = Arc::downgrade(&self.0);
        let tear_down = move || {
            backend.delete();
            if let Some(data) = data.upgrade() {
                data.lock().torn_down = true;
            }
        };

        if self.is_main_thread() {
            tear_down();
        } else {
            // `post()` refuses to talk to a deleted interpreter, this also wakes up `mainloop()`.
            let _ = post_office.sender.send(TclRequest::Run(Box::new(tear_down)));
        }

        Ok(())
    }
}
