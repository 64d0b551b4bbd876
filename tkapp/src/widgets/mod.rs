//! Widget proxies.

mod basic;
mod menu;
pub mod treeview;
mod window;

use std::{collections::HashMap, fmt, sync::Arc};

use log::{debug, warn};
use parking_lot::Mutex;

use tclinterp::{ReturnType, TclObj, TclValue, ToTclObj};

pub use self::basic::{Button, Entry, Frame, Label};
pub use self::menu::{Menu, MenuItem};
pub use self::treeview::Treeview;
pub use self::window::Window;
use crate::{
    app::{AppRef, TkApp},
    callback::Callback,
    config::{CgetConfigure, CommandList, ConfigDict, Direct, DirectConfigDict},
    error::{Error, Result},
};

struct WidgetCore {
    app: AppRef,
    path: String,
    class_name: String,
    config: DirectConfigDict,
    commands: CommandList,
    /// Event sequence -> the callback bound to it.
    bindings: Mutex<HashMap<String, Callback>>,
}

/// The part every widget proxy has: a path, a config dict and the commands it created.
#[derive(Clone)]
pub struct Widget(Arc<WidgetCore>);

impl Widget {
    /// Create a new Tk widget with `tcl_command` and wrap it.
    pub(crate) fn create(
        app: &TkApp,
        parent_path: &str,
        tcl_command: &str,
        name: &str,
        class_name: &str,
        options: Vec<(String, TclObj)>,
    ) -> Result<Self> {
        let path = app.next_widget_path(parent_path, name);

        let mut argv = vec![TclObj::from(tcl_command), TclObj::from(path.as_str())];
        for (option, value) in options {
            argv.push(TclObj::new(format!("-{}", option)));
            argv.push(value);
        }
        app.call(&ReturnType::Nothing, argv)?;
        debug!("Created {} {}", class_name, path);

        Ok(Self::wrap(app, &path, class_name))
    }

    /// A proxy for a widget that already exists.
    pub fn wrap(app: &TkApp, path: &str, class_name: &str) -> Self {
        Self(Arc::new(WidgetCore {
            app: app.downgrade(),
            path: path.to_owned(),
            class_name: class_name.to_owned(),
            config: ConfigDict::new(Direct::new(CgetConfigure::new(app, path))),
            commands: CommandList::default(),
            bindings: Mutex::new(HashMap::new()),
        }))
    }

    /// The application this widget belongs to. Fails once the application is dropped.
    pub fn app(&self) -> Result<TkApp> {
        self.0.app.upgrade()
    }

    pub fn path(&self) -> &str {
        &self.0.path
    }

    /// The Tk class, like `TLabel`.
    pub fn class_name(&self) -> &str {
        &self.0.class_name
    }

    pub fn config(&self) -> &DirectConfigDict {
        &self.0.config
    }

    pub(crate) fn commands(&self) -> &CommandList {
        &self.0.commands
    }

    pub fn same_as(&self, other: &Widget) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Call a Tcl command about this widget.
    pub fn call<I>(&self, ty: &ReturnType, args: I) -> Result<TclValue>
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        self.app()?.widget_call(&self.0.path, ty, args)
    }

    /// Make `callback` invocable from Tcl for as long as this widget lives.
    ///
    /// The command takes one argument per entry of `arg_types`, see
    /// [`TkApp::create_command`].
    pub fn create_command(&self, callback: Callback, arg_types: &[ReturnType]) -> Result<String> {
        let name = self.app()?.create_command(callback, arg_types)?;
        self.0.commands.lock().push(name.clone());
        Ok(name)
    }

    /// The callback bound to the event `sequence`, like `<Button-1>` or `<Key>`.
    ///
    /// It runs with the widget, the event's x and y and its keysym.
    pub fn bind(&self, sequence: &str) -> Result<Callback> {
        if let Some(callback) = self.0.bindings.lock().get(sequence) {
            return Ok(callback.clone());
        }

        let app = self.app()?;
        let callback = Callback::new();
        let command = app.create_command(
            callback.clone(),
            &[ReturnType::Widget, ReturnType::Int, ReturnType::Int, ReturnType::Str],
        )?;
        let script = format!("{} %W %x %y %K", command);
        if let Err(err) =
            self.call(&ReturnType::Nothing, &["bind", self.path(), sequence, script.as_str()])
        {
            if let Err(cleanup) = app.delete_command(&command) {
                warn!("Could not delete {} after failing to bind: {}", command, cleanup);
            }
            return Err(err);
        }
        self.0.commands.lock().push(command.clone());
        debug!("Bound {} on {} to {}", sequence, self.path(), command);

        Ok(self
            .0
            .bindings
            .lock()
            .entry(sequence.to_owned())
            .or_insert(callback)
            .clone())
    }

    /// Send the event `sequence` to the widget as if it happened, like `event generate`.
    pub fn event_generate<'a, I, V>(&self, sequence: &str, options: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: ToTclObj,
    {
        let mut argv = vec![
            TclObj::from("event"),
            TclObj::from("generate"),
            TclObj::from(self.path()),
            TclObj::from(sequence),
        ];
        for (option, value) in options {
            argv.push(TclObj::new(format!("-{}", option)));
            argv.push(value.to_tcl_obj());
        }
        self.call(&ReturnType::Nothing, argv)?;
        Ok(())
    }

    pub fn winfo_exists(&self) -> Result<bool> {
        let exists = self
            .app()?
            .call(&ReturnType::Bool, &["winfo", "exists", self.path()])?;
        Ok(exists.as_bool().unwrap_or(false))
    }

    pub fn winfo_children(&self) -> Result<Vec<AnyWidget>> {
        self.app()?
            .call_widgets(&["winfo", "children", self.path()])
    }

    pub fn winfo_toplevel(&self) -> Result<AnyWidget> {
        self.app()?
            .call_widget(&["winfo", "toplevel", self.path()])?
            .ok_or_else(|| Error::NotAttached(format!("{} has no toplevel", self.path())))
    }

    pub fn winfo_class(&self) -> Result<String> {
        let class = self.call(&ReturnType::Str, &["winfo", "class", self.path()])?;
        Ok(class.as_str().unwrap_or_default().to_owned())
    }

    /// The widgets packed into this one, in packing order.
    pub fn pack_slaves(&self) -> Result<Vec<AnyWidget>> {
        self.app()?.call_widgets(&["pack", "slaves", self.path()])
    }

    pub fn parent(&self) -> Result<Option<AnyWidget>> {
        match self.path().rfind('.') {
            Some(0) if self.path().len() > 1 => self.app()?.resolve_widget(".").map(Some),
            Some(i) if i > 0 => self.app()?.resolve_widget(&self.path()[..i]).map(Some),
            _ => Ok(None),
        }
    }

    /// Destroy the widget and its children.
    pub fn destroy(&self) -> Result<()> {
        let app = self.app()?;
        for child in self.winfo_children()? {
            child.destroy()?;
        }

        self.0.bindings.lock().clear();
        let commands = std::mem::take(&mut *self.0.commands.lock());
        for command in commands {
            if let Err(err) = app.delete_command(&command) {
                warn!("Could not delete {} of {}: {}", command, self.path(), err);
            }
        }

        self.call(&ReturnType::Nothing, &["destroy", self.path()])?;
        app.registry().forget(self.path());
        debug!("Destroyed {}", self.path());
        Ok(())
    }
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{} widget {}>", self.class_name(), self.path())
    }
}

/// Behaviour shared by all widget proxies.
pub trait TkWidget: Clone + Send + Sync + 'static {
    /// Name used in type mismatch errors.
    const KIND: &'static str;

    fn widget(&self) -> &Widget;
    fn into_any(self) -> AnyWidget;
    fn from_any(any: AnyWidget) -> Option<Self>;

    fn app(&self) -> Result<TkApp> {
        self.widget().app()
    }

    fn path(&self) -> &str {
        self.widget().path()
    }

    /// The string to use for this widget in Tcl commands.
    fn to_tcl(&self) -> &str {
        self.widget().path()
    }

    fn config(&self) -> &DirectConfigDict {
        self.widget().config()
    }

    fn destroy(&self) -> Result<()> {
        self.widget().destroy()
    }

    /// The proxy for `path`, which must be of this widget type.
    fn from_tcl(app: &TkApp, path: &str) -> Result<Self> {
        let any = app.resolve_widget(path)?;
        let actual = any.kind().to_owned();
        Self::from_any(any).ok_or_else(|| Error::TypeMismatch {
            path: path.to_owned(),
            expected: Self::KIND,
            actual,
        })
    }
}

impl TkWidget for Widget {
    const KIND: &'static str = "Widget";

    fn widget(&self) -> &Widget {
        self
    }

    fn into_any(self) -> AnyWidget {
        AnyWidget::Other(self)
    }

    fn from_any(any: AnyWidget) -> Option<Self> {
        Some(any.widget().clone())
    }
}

/// Widgets that can be managed with `pack`.
pub trait Packable: TkWidget {
    fn pack(&self) -> Result<()> {
        self.pack_with(Vec::<(&str, TclObj)>::new())
    }

    fn pack_with<'a, I, V>(&self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: ToTclObj,
    {
        let mut argv = vec![TclObj::from("pack"), TclObj::from(self.path())];
        for (option, value) in options {
            argv.push(TclObj::new(format!("-{}", option)));
            argv.push(value.to_tcl_obj());
        }
        self.widget().call(&ReturnType::Nothing, argv)?;
        Ok(())
    }

    fn pack_forget(&self) -> Result<()> {
        self.widget()
            .call(&ReturnType::Nothing, &["pack", "forget", self.path()])?;
        Ok(())
    }

    /// The pack options of this widget, without the leading dashes.
    fn pack_info(&self) -> Result<Vec<(String, String)>> {
        let info = self.widget().call(
            &ReturnType::list_of(ReturnType::Str),
            &["pack", "info", self.path()],
        )?;
        let flat = info.to_strings().unwrap_or_default();

        Ok(flat
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| {
                let option = pair[0].strip_prefix('-').unwrap_or(&pair[0]);
                (option.to_owned(), pair[1].clone())
            })
            .collect())
    }
}

/// Toplevel windows, managed by the window manager.
pub trait WindowManaged: TkWidget {
    /// Runs when the user asks the window manager to close the window.
    fn on_delete_window(&self) -> &Callback;

    fn title(&self) -> Result<String> {
        let title = self
            .widget()
            .call(&ReturnType::Str, &["wm", "title", self.path()])?;
        Ok(title.as_str().unwrap_or_default().to_owned())
    }

    fn set_title(&self, title: &str) -> Result<()> {
        self.widget()
            .call(&ReturnType::Nothing, &["wm", "title", self.path(), title])?;
        Ok(())
    }

    /// `normal`, `iconic`, `withdrawn` or `zoomed`.
    fn wm_state(&self) -> Result<String> {
        let state = self
            .widget()
            .call(&ReturnType::Str, &["wm", "state", self.path()])?;
        Ok(state.as_str().unwrap_or_default().to_owned())
    }

    fn set_wm_state(&self, state: &str) -> Result<()> {
        self.widget()
            .call(&ReturnType::Nothing, &["wm", "state", self.path(), state])?;
        Ok(())
    }

    fn withdraw(&self) -> Result<()> {
        self.widget()
            .call(&ReturnType::Nothing, &["wm", "withdraw", self.path()])?;
        Ok(())
    }

    fn deiconify(&self) -> Result<()> {
        self.widget()
            .call(&ReturnType::Nothing, &["wm", "deiconify", self.path()])?;
        Ok(())
    }
}

/// Any widget proxy, as stored in the registry.
#[derive(Clone)]
pub enum AnyWidget {
    Window(Window),
    Frame(Frame),
    Label(Label),
    Button(Button),
    Entry(Entry),
    Treeview(Treeview),
    Menu(Menu),
    Other(Widget),
}

impl AnyWidget {
    pub fn widget(&self) -> &Widget {
        match self {
            AnyWidget::Window(w) => w.widget(),
            AnyWidget::Frame(w) => w.widget(),
            AnyWidget::Label(w) => w.widget(),
            AnyWidget::Button(w) => w.widget(),
            AnyWidget::Entry(w) => w.widget(),
            AnyWidget::Treeview(w) => w.widget(),
            AnyWidget::Menu(w) => w.widget(),
            AnyWidget::Other(w) => w,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnyWidget::Window(_) => Window::KIND,
            AnyWidget::Frame(_) => Frame::KIND,
            AnyWidget::Label(_) => Label::KIND,
            AnyWidget::Button(_) => Button::KIND,
            AnyWidget::Entry(_) => Entry::KIND,
            AnyWidget::Treeview(_) => Treeview::KIND,
            AnyWidget::Menu(_) => Menu::KIND,
            AnyWidget::Other(_) => Widget::KIND,
        }
    }

    pub fn path(&self) -> &str {
        self.widget().path()
    }

    pub fn same_as(&self, other: &AnyWidget) -> bool {
        self.widget().same_as(other.widget())
    }

    pub fn destroy(&self) -> Result<()> {
        match self {
            AnyWidget::Treeview(treeview) => treeview.destroy(),
            AnyWidget::Menu(menu) => menu.destroy(),
            other => other.widget().destroy(),
        }
    }
}

impl fmt::Debug for AnyWidget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({:?})", self.kind(), self.widget())
    }
}
