use std::{
    fmt,
    sync::{Arc, Weak},
};

use log::{debug, warn};
use parking_lot::Mutex;

use tclinterp::{ReturnType, TclObj, ToTclObj};

use super::{AnyWidget, TkWidget, Widget};
use crate::{
    app::{AppRef, TkApp},
    callback::Callback,
    config::{CommandList, CommandTarget, ConfigDict, Direct, DirectConfigDict, EntryCgetConfigure},
    error::{Error, Result},
};

#[derive(Clone)]
struct MenuLink {
    app: AppRef,
    path: String,
}

enum ItemState {
    Detached,
    Attached { link: MenuLink, index: usize },
    /// Taken out of a menu. Tk forgets everything about removed entries, so these stay out.
    Removed,
}

struct ItemData {
    kind: &'static str,
    /// Options to send with the `insert` that attaches the item.
    staged: Mutex<Vec<(String, TclObj)>>,
    state: Mutex<ItemState>,
    config: DirectConfigDict,
    commands: CommandList,
}

impl CommandTarget for ItemData {
    fn locate(&self) -> Result<(TkApp, String, String)> {
        match &*self.state.lock() {
            ItemState::Attached { link, index } => {
                Ok((link.app.upgrade()?, link.path.clone(), index.to_string()))
            }
            _ => Err(not_in_menu(self.kind)),
        }
    }
}

fn not_in_menu(kind: &str) -> Error {
    Error::NotAttached(format!("the {} item is not in a menu", kind))
}

/// An entry of a [`Menu`]: a command, a check button, a radio button, a cascade or a separator.
///
/// Like treeview rows, items are created detached and get their options staged until they are
/// added to a menu.
#[derive(Clone)]
pub struct MenuItem(Arc<ItemData>);

impl MenuItem {
    fn with_kind(kind: &'static str) -> Self {
        Self(Arc::new_cyclic(|weak: &Weak<ItemData>| {
            let target: Weak<dyn CommandTarget> = weak.clone();
            let config = ConfigDict::new(Direct::new(EntryCgetConfigure::new(target)));
            config.set_types(vec![
                ("underline", ReturnType::Int),
                ("columnbreak", ReturnType::Bool),
                ("hidemargin", ReturnType::Bool),
                ("indicatoron", ReturnType::Bool),
                ("menu", ReturnType::Widget),
            ]);

            ItemData {
                kind,
                staged: Mutex::new(Vec::new()),
                state: Mutex::new(ItemState::Detached),
                config,
                commands: CommandList::default(),
            }
        }))
    }

    pub fn separator() -> Self {
        Self::with_kind("separator")
    }

    pub fn command(label: &str) -> Self {
        Self::with_kind("command").option("label", label)
    }

    pub fn checkbutton(label: &str) -> Self {
        Self::with_kind("checkbutton").option("label", label)
    }

    pub fn radiobutton(label: &str, value: &str) -> Self {
        Self::with_kind("radiobutton")
            .option("label", label)
            .option("value", value)
    }

    /// An item that opens `submenu`.
    pub fn cascade(label: &str, submenu: &Menu) -> Self {
        Self::with_kind("cascade")
            .option("label", label)
            .option("menu", submenu.path())
    }

    /// Stage an option for when the item is added. `command` is set with
    /// [`on_click()`](MenuItem::on_click) instead.
    pub fn option(self, option: &str, value: impl ToTclObj) -> Self {
        {
            let mut staged = self.0.staged.lock();
            staged.retain(|(name, _)| name != option);
            staged.push((option.to_owned(), value.to_tcl_obj()));
        }
        self
    }

    /// `command`, `checkbutton`, `radiobutton`, `cascade` or `separator`.
    pub fn kind(&self) -> &'static str {
        self.0.kind
    }

    pub fn config(&self) -> &DirectConfigDict {
        &self.0.config
    }

    pub fn is_attached(&self) -> bool {
        matches!(*self.0.state.lock(), ItemState::Attached { .. })
    }

    pub fn index(&self) -> Result<usize> {
        match &*self.0.state.lock() {
            ItemState::Attached { index, .. } => Ok(*index),
            _ => Err(not_in_menu(self.0.kind)),
        }
    }

    /// Runs when the item is chosen. Only for items in a menu.
    pub fn on_click(&self) -> Result<Callback> {
        self.0.config.callback("command")
    }

    /// Choose the item programmatically, like `pathName invoke`.
    pub fn invoke(&self) -> Result<()> {
        let (app, path, index) = self.0.locate()?;
        app.widget_call(
            &path,
            &ReturnType::Nothing,
            vec![path.clone(), "invoke".to_owned(), index],
        )?;
        Ok(())
    }

    fn same_item(&self, other: &MenuItem) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn attach(&self, app: &TkApp, link: &MenuLink, index: usize) {
        *self.0.state.lock() = ItemState::Attached {
            link: link.clone(),
            index,
        };
        if self.0.kind != "separator" {
            self.0.config.add_special("command", app, &self.0.commands);
        }
        debug!("Added {} item to {} at {}", self.0.kind, link.path, index);
    }

    fn remove(&self, app: &TkApp) {
        *self.0.state.lock() = ItemState::Removed;
        let commands = std::mem::take(&mut *self.0.commands.lock());
        for command in commands {
            if let Err(err) = app.delete_command(&command) {
                warn!("Could not delete {} of a {} item: {}", command, self.0.kind, err);
            }
        }
    }

    fn renumber(items: &[MenuItem]) {
        for (i, item) in items.iter().enumerate() {
            if let ItemState::Attached { index, .. } = &mut *item.0.state.lock() {
                *index = i;
            }
        }
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &*self.0.state.lock() {
            ItemState::Detached => write!(f, "<detached {} MenuItem>", self.0.kind),
            ItemState::Attached { index, .. } => {
                write!(f, "<{} MenuItem at {}>", self.0.kind, index)
            }
            ItemState::Removed => write!(f, "<removed {} MenuItem>", self.0.kind),
        }
    }
}

/// A `menu`, for menu bars and cascades. Its items are kept in the same order as Tk's entries.
///
/// Menus are created without a tear-off entry, so item indexes start at 0.
#[derive(Clone)]
pub struct Menu {
    widget: Widget,
    link: MenuLink,
    items: Arc<Mutex<Vec<MenuItem>>>,
}

impl Menu {
    pub fn new(parent: &impl TkWidget) -> Result<Self> {
        let app = parent.app()?;
        let widget = Widget::create(
            &app,
            parent.path(),
            "menu",
            "menu",
            "Menu",
            vec![("tearoff".to_owned(), TclObj::from("0"))],
        )?;
        widget.config().set_types([
            ("tearoff", ReturnType::Bool),
            ("borderwidth", ReturnType::Int),
        ]);

        let menu = Self {
            link: MenuLink {
                app: app.downgrade(),
                path: widget.path().to_owned(),
            },
            widget,
            items: Arc::new(Mutex::new(Vec::new())),
        };
        app.registry().register(menu.clone().into_any())?;
        Ok(menu)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<MenuItem> {
        let items = self.items.lock();
        items.get(index).cloned().ok_or(Error::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    pub fn to_vec(&self) -> Vec<MenuItem> {
        self.items.lock().clone()
    }

    /// Run `op` on the main thread.
    fn on_main<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Menu, TkApp) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let app = self.link.app.upgrade()?;
        let menu = self.clone();
        app.clone().needs_main_thread(move || op(menu, app))
    }

    /// Insert `item` before `index`. Indexes past the end append.
    pub fn insert(&self, index: usize, item: MenuItem) -> Result<()> {
        self.on_main(move |menu, app| menu.insert_now(&app, index, item))
    }

    pub fn push(&self, item: MenuItem) -> Result<()> {
        self.insert(usize::MAX, item)
    }

    fn insert_now(&self, app: &TkApp, index: usize, item: MenuItem) -> Result<()> {
        match &*item.0.state.lock() {
            ItemState::Detached => {}
            ItemState::Attached { .. } => {
                return Err(Error::Unsupported(format!(
                    "the {} item is already in a menu, remove it first",
                    item.kind()
                )))
            }
            ItemState::Removed => {
                return Err(Error::Unsupported(format!(
                    "the {} item has been removed from a menu and can't be added again",
                    item.kind()
                )))
            }
        }

        let index = index.min(self.len());
        let mut argv = vec![
            TclObj::from(self.path()),
            TclObj::from("insert"),
            index.to_tcl_obj(),
            TclObj::from(item.kind()),
        ];
        for (option, value) in item.0.staged.lock().iter() {
            argv.push(TclObj::new(format!("-{}", option)));
            argv.push(value.clone());
        }
        app.widget_call(self.path(), &ReturnType::Nothing, argv)?;
        item.0.staged.lock().clear();

        item.attach(app, &self.link, index);
        let mut items = self.items.lock();
        items.insert(index, item);
        MenuItem::renumber(&items);
        Ok(())
    }

    /// Take the item at `index` out of the menu. It can't be added to a menu again.
    pub fn remove(&self, index: usize) -> Result<MenuItem> {
        self.on_main(move |menu, app| menu.remove_now(&app, index))
    }

    fn remove_now(&self, app: &TkApp, index: usize) -> Result<MenuItem> {
        let item = self.get(index)?;
        app.widget_call(
            self.path(),
            &ReturnType::Nothing,
            vec![
                TclObj::from(self.path()),
                TclObj::from("delete"),
                index.to_tcl_obj(),
            ],
        )?;

        {
            let mut items = self.items.lock();
            items.retain(|i| !i.same_item(&item));
            MenuItem::renumber(&items);
        }
        item.remove(app);
        Ok(item)
    }

    /// Replace the item at `index`. Returns the old item.
    ///
    /// The new item goes in before the old one is deleted; if that delete fails, the new item is
    /// taken out again.
    pub fn set(&self, index: usize, item: MenuItem) -> Result<MenuItem> {
        self.on_main(move |menu, app| {
            let len = menu.len();
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }

            menu.insert_now(&app, index, item.clone())?;
            match menu.remove_now(&app, index + 1) {
                Ok(old) => Ok(old),
                Err(err) => {
                    if let Err(cleanup) = menu.remove_now(&app, index) {
                        warn!("Could not take the new {} item out again: {}", item.kind(), cleanup);
                    }
                    Err(err)
                }
            }
        })
    }
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Menu({:?}, {} items)", self.widget, self.len())
    }
}

impl TkWidget for Menu {
    const KIND: &'static str = "Menu";

    fn widget(&self) -> &Widget {
        &self.widget
    }

    fn into_any(self) -> AnyWidget {
        AnyWidget::Menu(self)
    }

    fn from_any(any: AnyWidget) -> Option<Self> {
        match any {
            AnyWidget::Menu(menu) => Some(menu),
            _ => None,
        }
    }

    fn destroy(&self) -> Result<()> {
        let app = self.app()?;
        let items = std::mem::take(&mut *self.items.lock());
        for item in items {
            item.remove(&app);
        }
        self.widget.destroy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tclinterp::TclValue;

    use crate::{testing::Rejecting, widgets::Window};

    fn menu() -> (TkApp, Menu) {
        let app = TkApp::simulated().unwrap();
        let window = Window::new(&app).unwrap();
        let menu = Menu::new(&window).unwrap();
        (app, menu)
    }

    fn remote_labels(menu: &Menu) -> Vec<String> {
        let app = menu.app().unwrap();
        let last = app
            .call(&ReturnType::Str, &[menu.path(), "index", "end"])
            .unwrap();
        let count = match last.as_str() {
            Some("none") => 0,
            Some(last) => last.parse::<usize>().unwrap() + 1,
            None => 0,
        };
        (0..count)
            .map(|i| {
                let kind = app
                    .call(&ReturnType::Str, vec![menu.path().to_owned(), "type".to_owned(), i.to_string()])
                    .unwrap();
                if kind == "separator" {
                    return "-".to_owned();
                }
                app.call(
                    &ReturnType::Str,
                    vec![
                        menu.path().to_owned(),
                        "entrycget".to_owned(),
                        i.to_string(),
                        "-label".to_owned(),
                    ],
                )
                .unwrap()
                .to_string()
            })
            .collect()
    }

    fn labels(menu: &Menu) -> Vec<String> {
        menu.to_vec()
            .iter()
            .map(|item| match item.kind() {
                "separator" => "-".to_owned(),
                _ => item.config().get("label").unwrap().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_items() {
        let (_app, menu) = menu();
        assert_eq!(menu.config().get("tearoff").unwrap(), TclValue::Bool(false));

        let open = MenuItem::command("Open").option("accelerator", "Ctrl+O");
        assert!(matches!(open.config().get("label"), Err(Error::NotAttached(_))));
        menu.push(open.clone()).unwrap();
        menu.push(MenuItem::separator()).unwrap();
        menu.insert(0, MenuItem::checkbutton("Wrap")).unwrap();
        menu.insert(99, MenuItem::radiobutton("Big", "big")).unwrap();

        assert_eq!(labels(&menu), vec!["Wrap", "Open", "-", "Big"]);
        assert_eq!(remote_labels(&menu), labels(&menu));
        assert_eq!(open.index().unwrap(), 1);
        assert_eq!(
            open.config().get("accelerator").unwrap(),
            TclValue::from("Ctrl+O")
        );
        assert_eq!(
            menu.get(3).unwrap().config().get("value").unwrap(),
            TclValue::from("big")
        );

        open.config().set("underline", 0).unwrap();
        assert_eq!(open.config().get("underline").unwrap(), TclValue::Int(0));
        assert!(matches!(menu.push(open.clone()), Err(Error::Unsupported(_))));
        assert!(matches!(
            menu.get(4).unwrap_err(),
            Error::IndexOutOfRange { index: 4, len: 4 }
        ));
    }

    #[test]
    fn test_remove_and_set() {
        let (app, menu) = menu();
        let a = MenuItem::command("A");
        let b = MenuItem::command("B");
        let c = MenuItem::command("C");
        for item in [&a, &b, &c] {
            menu.push(item.clone()).unwrap();
        }
        let command = {
            b.on_click().unwrap();
            b.config().get("command").unwrap().to_string()
        };

        let removed = menu.remove(1).unwrap();
        assert!(removed.same_item(&b));
        assert!(!b.is_attached());
        assert!(!app.interp().has_command(&command));
        assert_eq!(c.index().unwrap(), 1);
        assert_eq!(remote_labels(&menu), vec!["A", "C"]);
        assert!(matches!(menu.push(b.clone()), Err(Error::Unsupported(_))));

        let d = MenuItem::command("D");
        let old = menu.set(0, d.clone()).unwrap();
        assert!(old.same_item(&a));
        assert_eq!(remote_labels(&menu), vec!["D", "C"]);
        assert_eq!(d.index().unwrap(), 0);
        assert!(matches!(
            menu.set(2, MenuItem::separator()),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_on_click_and_invoke() {
        let (_app, menu) = menu();
        let item = MenuItem::command("Go");
        assert!(matches!(item.on_click(), Err(Error::NotAttached(_))));
        menu.push(MenuItem::separator()).unwrap();
        menu.push(item.clone()).unwrap();

        let clicks = Arc::new(AtomicUsize::new(0));
        {
            let clicks = clicks.clone();
            item.on_click().unwrap().connect(move |_| {
                clicks.fetch_add(1, Ordering::SeqCst);
            });
        }
        item.invoke().unwrap();
        menu.get(0).unwrap().invoke().unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        item.config().set("state", "disabled").unwrap();
        item.invoke().unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert!(matches!(
            item.config().set("command", "x"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            menu.get(0).unwrap().on_click(),
            Err(Error::UnknownOption(_))
        ));
    }

    #[test]
    fn test_cascade() {
        let (app, menu) = menu();
        let submenu = Menu::new(&menu).unwrap();
        let cascade = MenuItem::cascade("More", &submenu);
        menu.push(cascade.clone()).unwrap();

        let target = cascade.config().get("menu").unwrap();
        let resolved = app.widget_of(&target).unwrap().unwrap();
        assert!(resolved.same_as(&submenu.clone().into_any()));

        let close = MenuItem::command("Close");
        menu.push(close.clone()).unwrap();
        close.on_click().unwrap();
        let command = close.config().get("command").unwrap().to_string();

        menu.destroy().unwrap();
        assert!(!cascade.is_attached());
        assert!(menu.is_empty());
        assert!(!app.interp().has_command(&command));
        assert!(app.registry().lookup(submenu.path()).is_none());
    }

    #[test]
    fn test_rejected_remove_changes_nothing() {
        let backend = Rejecting::new();
        let app = backend.app();
        let menu = Menu::new(&app.root().unwrap()).unwrap();
        menu.push(MenuItem::command("A")).unwrap();
        menu.push(MenuItem::command("B")).unwrap();

        backend.reject(&[menu.path(), "delete"]);
        assert!(matches!(menu.remove(0), Err(Error::Tcl(_))));
        assert_eq!(labels(&menu), vec!["A", "B"]);
        assert_eq!(remote_labels(&menu), labels(&menu));
        assert_eq!(menu.get(1).unwrap().index().unwrap(), 1);
    }
}
