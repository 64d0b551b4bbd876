use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Once, Weak},
};

use log::debug;
use parking_lot::Mutex;

use tclinterp::{ReturnType, TclError, TclInterp, TclObj, TclValue, ToTclObj};

use crate::{
    callback::Callback,
    error::{Error, Result},
    registry::Registry,
    widgets::{AnyWidget, Widget, Window},
};

static LOGGER_INIT: Once = Once::new();

#[derive(Default)]
struct Counters {
    widgets: HashMap<String, u64>,
    rows: u64,
    columns: u64,
    commands: u64,
}

struct AppData {
    interp: TclInterp,
    registry: Registry,
    counters: Mutex<Counters>,
}

/// A Tk application: the interpreter plus everything this crate tracks about it.
///
/// Every widget, row and column belongs to exactly one `TkApp`. Cloning gives another handle to
/// the same application. Widgets only keep an [`AppRef`], so the application goes away when the
/// last `TkApp` handle is dropped.
#[derive(Clone)]
pub struct TkApp(Arc<AppData>);

impl fmt::Debug for TkApp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TkApp({} widgets)", self.0.registry.len())
    }
}

/// A handle to a [`TkApp`] that doesn't keep it alive.
#[derive(Clone)]
pub(crate) struct AppRef(Weak<AppData>);

impl AppRef {
    pub(crate) fn upgrade(&self) -> Result<TkApp> {
        self.0
            .upgrade()
            .map(TkApp)
            .ok_or_else(|| Error::NotAttached("the application has been dropped".to_owned()))
    }
}

/// What a command created by [`TkApp::create_command`] carries around.
struct CommandCallback {
    app: AppRef,
    callback: Callback,
    arg_types: Vec<ReturnType>,
}

impl CommandCallback {
    fn decode(&self, args: &[&str]) -> Result<Vec<TclValue>> {
        if args.len() != self.arg_types.len() {
            return Err(Error::Tcl(TclError::new(format!(
                "expected {} arguments, got {} arguments",
                self.arg_types.len(),
                args.len()
            ))));
        }

        let app = self.app.upgrade()?;
        self.arg_types
            .iter()
            .zip(args)
            .map(|(ty, arg)| app.decode(ty, &TclObj::from(*arg)))
            .collect()
    }
}

impl TkApp {
    /// Create an application on a new Tcl interpreter with Tk loaded.
    #[cfg(feature = "tk")]
    pub fn new() -> Result<Self> {
        Self::with_interp(TclInterp::new()?)
    }

    /// Create an application on top of the built-in Tk simulator.
    #[cfg(any(test, feature = "sim"))]
    pub fn simulated() -> Result<Self> {
        Self::with_interp(TclInterp::simulated()?)
    }

    /// Create an application on top of an existing interpreter.
    ///
    /// The calling thread must be the interpreter's main thread.
    pub fn with_interp(interp: TclInterp) -> Result<Self> {
        LOGGER_INIT.call_once(|| {
            // Somebody else may have installed a logger already, that's fine.
            let _ = env_logger::try_init();
        });

        interp.init_tk()?;
        debug!("Tk initialized");

        let app = Self(Arc::new(AppData {
            interp,
            registry: Registry::default(),
            counters: Mutex::new(Counters::default()),
        }));
        Window::root(&app)?;
        Ok(app)
    }

    pub(crate) fn downgrade(&self) -> AppRef {
        AppRef(Arc::downgrade(&self.0))
    }

    /// The root window, `.`.
    pub fn root(&self) -> Result<Window> {
        Window::root(self)
    }

    pub fn interp(&self) -> &TclInterp {
        &self.0.interp
    }

    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    pub fn same_as(&self, other: &TkApp) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Decode `obj` as `ty`. Every widget path in the result gets a proxy in the registry.
    pub fn decode(&self, ty: &ReturnType, obj: &TclObj) -> Result<TclValue> {
        let value = ty.decode(obj)?;
        self.resolve_widgets(&value)?;
        Ok(value)
    }

    fn resolve_widgets(&self, value: &TclValue) -> Result<()> {
        match value {
            TclValue::Widget(path) => self.resolve_widget(path).map(drop),
            TclValue::List(items) | TclValue::Tuple(items) => {
                items.iter().try_for_each(|item| self.resolve_widgets(item))
            }
            _ => Ok(()),
        }
    }

    /// Call a Tcl command and decode its result as `ty`.
    ///
    /// Widget paths in the result are resolved like in [`decode()`](TkApp::decode), so
    /// [`widget_of()`](TkApp::widget_of) finds their proxies.
    pub fn call<I>(&self, ty: &ReturnType, args: I) -> Result<TclValue>
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        let value = self.0.interp.call_as(ty, args)?;
        self.resolve_widgets(&value)?;
        Ok(value)
    }

    /// Call a Tcl command that returns a widget path. `None` if it returns nothing.
    pub fn call_widget<I>(&self, args: I) -> Result<Option<AnyWidget>>
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        let value = self.call(&ReturnType::Widget, args)?;
        self.widget_of(&value)
    }

    /// Call a Tcl command that returns a list of widget paths.
    pub fn call_widgets<I>(&self, args: I) -> Result<Vec<AnyWidget>>
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        let value = self.call(&ReturnType::list_of(ReturnType::Widget), args)?;
        self.widgets_in(&value)
    }

    /// The proxy of a decoded `Widget` value. `None` for an empty value.
    pub fn widget_of(&self, value: &TclValue) -> Result<Option<AnyWidget>> {
        match value {
            TclValue::Widget(path) => self.resolve_widget(path).map(Some),
            TclValue::None => Ok(None),
            other => Err(Error::Unsupported(format!("{:?} is not a widget", other))),
        }
    }

    /// The proxies of a decoded list of widgets.
    pub fn widgets_in(&self, value: &TclValue) -> Result<Vec<AnyWidget>> {
        let items = value
            .as_list()
            .ok_or_else(|| Error::Unsupported(format!("{:?} is not a list of widgets", value)))?;

        let mut widgets = Vec::with_capacity(items.len());
        for item in items {
            if let Some(widget) = self.widget_of(item)? {
                widgets.push(widget);
            }
        }
        Ok(widgets)
    }

    /// Like `call()`, but turns a failure on a destroyed widget into `NotAttached`.
    pub fn widget_call<I>(&self, path: &str, ty: &ReturnType, args: I) -> Result<TclValue>
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        match self.call(ty, args) {
            Err(err) if err.is_tcl() && !self.window_exists(path) => {
                debug!("{} failed because it is gone: {}", path, err);
                Err(Error::NotAttached("the widget has been destroyed".to_owned()))
            }
            result => result,
        }
    }

    fn window_exists(&self, path: &str) -> bool {
        self.call(&ReturnType::Bool, &["winfo", "exists", path])
            .ok()
            .and_then(|exists| exists.as_bool())
            .unwrap_or(false)
    }

    /// Run `op` on the interpreter's main thread and wait for its result.
    ///
    /// Structural edits go through here as a whole, so that they never interleave with other
    /// edits of the same tree.
    pub fn needs_main_thread<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.0.interp.run_on_main(op)?
    }

    /// Run the event loop until `quit()` is called.
    pub fn run(&self) -> Result<()> {
        Ok(self.0.interp.mainloop()?)
    }

    pub fn quit(&self) -> Result<()> {
        Ok(self.0.interp.quit()?)
    }

    /// Serve everything other threads have asked the main thread to do so far.
    pub fn update(&self) -> Result<usize> {
        Ok(self.0.interp.update()?)
    }

    /// Forget every widget and delete the interpreter.
    pub fn delete(&self) -> Result<()> {
        self.0.registry.clear();
        Ok(self.0.interp.delete()?)
    }

    /// A fresh path for a widget of the given kind, like `.window1.treeview3`.
    pub fn next_widget_path(&self, parent: &str, name: &str) -> String {
        let mut counters = self.0.counters.lock();
        let counter = counters.widgets.entry(name.to_owned()).or_insert(0);
        *counter += 1;

        if parent == "." {
            format!(".{}{}", name, counter)
        } else {
            format!("{}.{}{}", parent, name, counter)
        }
    }

    pub fn next_row_id(&self) -> String {
        let mut counters = self.0.counters.lock();
        let id = format!("R{}", counters.rows);
        counters.rows += 1;
        id
    }

    pub fn next_column_id(&self) -> String {
        let mut counters = self.0.counters.lock();
        let id = format!("C{}", counters.columns);
        counters.columns += 1;
        id
    }

    /// Make `callback` invocable from Tcl. Returns the name of the new command.
    ///
    /// The command takes exactly one argument per entry of `arg_types`. Each argument is decoded
    /// with its type before `callback` runs with them; widget arguments are resolved to their
    /// proxies' paths. A wrong argument count is a Tcl error.
    pub fn create_command(&self, callback: Callback, arg_types: &[ReturnType]) -> Result<String> {
        let name = {
            let mut counters = self.0.counters.lock();
            counters.commands += 1;
            format!("mystk_command{}", counters.commands)
        };

        let data = CommandCallback {
            app: self.downgrade(),
            callback,
            arg_types: arg_types.to_vec(),
        };
        self.0
            .interp
            .createcommand(&name, Box::new(data), |data, args| {
                let command = data
                    .data
                    .downcast_ref::<CommandCallback>()
                    .ok_or_else(|| TclObj::from("command data is not a callback"))?;
                let args = command.decode(args).map_err(|err| match err {
                    Error::Tcl(err) => TclObj::from(err.message()),
                    other => TclObj::new(other.to_string()),
                })?;
                command.callback.run(&args);
                Ok(TclObj::empty())
            })?;

        debug!("Created command {} taking {:?}", name, arg_types);
        Ok(name)
    }

    pub fn delete_command(&self, name: &str) -> Result<()> {
        debug!("Deleting command {}", name);
        Ok(self.0.interp.deletecommand(name)?)
    }

    /// The proxy of the widget at `path`, creating a generic one if this crate didn't create
    /// the widget.
    pub fn resolve_widget(&self, path: &str) -> Result<AnyWidget> {
        self.0.registry.register_or_lookup(path, || {
            let class = self.0.interp.call_as(&ReturnType::Str, &["winfo", "class", path])?;
            Ok(AnyWidget::Other(Widget::wrap(
                self,
                path,
                class.as_str().unwrap_or_default(),
            )))
        })
    }
}
