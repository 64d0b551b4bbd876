use std::{
    fmt,
    sync::{Arc, Weak},
};

use log::{debug, warn};
use parking_lot::Mutex;

use tclinterp::{ReturnType, TclObj, ToTclObj};

use super::TreeLink;
use crate::{
    app::{AppRef, TkApp},
    callback::Callback,
    config::{
        CommandList, CommandTarget, ConfigDict, Fallback, FallbackConfigDict, MultiHandler,
        MultiHandlerConfigDict, OptionCommand, OptionHandler,
    },
    error::{Error, Result},
};

/// Id of the tree column, the one showing the hierarchy.
pub const TREE_COLUMN: &str = "#0";

struct ColumnData {
    id: String,
    app: AppRef,
    commands: CommandList,
    link: Mutex<Option<TreeLink>>,
    column_config: FallbackConfigDict,
    heading: TreeviewColumnHeading,
    config: MultiHandlerConfigDict,
}

impl CommandTarget for ColumnData {
    fn locate(&self) -> Result<(TkApp, String, String)> {
        match &*self.link.lock() {
            Some(link) => Ok((link.app()?, link.path.clone(), self.id.clone())),
            None => Err(Error::NotAttached(format!(
                "column {} is not in a treeview",
                self.id
            ))),
        }
    }
}

/// The heading of a treeview column: `text`, `image`, `anchor` and the `command` run on click.
#[derive(Clone)]
pub struct TreeviewColumnHeading {
    config: FallbackConfigDict,
}

impl TreeviewColumnHeading {
    pub fn config(&self) -> &FallbackConfigDict {
        &self.config
    }

    /// Runs when the heading is clicked.
    pub fn on_click(&self) -> Result<Callback> {
        self.config.callback("command")
    }
}

/// A column of a treeview.
///
/// `configure -columns` makes Tk forget everything about the data columns, so both the column
/// and heading options are remembered here and written back whenever the column list changes.
#[derive(Clone)]
pub struct TreeviewColumn(Arc<ColumnData>);

impl TreeviewColumn {
    /// A detached column with a fresh id.
    pub fn new(app: &TkApp) -> Self {
        Self::named(app, &app.next_column_id())
    }

    pub fn named(app: &TkApp, id: &str) -> Self {
        Self(Arc::new_cyclic(|weak: &Weak<ColumnData>| {
            let target: Weak<dyn CommandTarget> = weak.clone();
            let commands = CommandList::default();

            let column_config =
                ConfigDict::new(Fallback::new(OptionCommand::new("column", target.clone())));
            column_config.set_types(vec![
                ("width", ReturnType::Int),
                ("minwidth", ReturnType::Int),
                ("stretch", ReturnType::Bool),
            ]);

            let heading_config =
                ConfigDict::new(Fallback::new(OptionCommand::new("heading", target)));
            heading_config.add_special("command", app, &commands);

            let column: Arc<dyn OptionHandler> = Arc::new(column_config.clone());
            let heading: Arc<dyn OptionHandler> = Arc::new(heading_config.clone());
            let config = ConfigDict::new(
                MultiHandler::new(vec![column.clone()])
                    .route("text", vec![heading.clone()])
                    .route("image", vec![heading.clone()])
                    .route("command", vec![heading.clone()])
                    .route("anchor", vec![column, heading]),
            );
            config.set_types(vec![
                ("width", ReturnType::Int),
                ("minwidth", ReturnType::Int),
                ("stretch", ReturnType::Bool),
            ]);

            ColumnData {
                id: id.to_owned(),
                app: app.downgrade(),
                commands,
                link: Mutex::new(None),
                column_config,
                heading: TreeviewColumnHeading {
                    config: heading_config,
                },
                config,
            }
        }))
    }

    fn stage_column(self, option: &str, value: impl ToTclObj) -> Self {
        self.0
            .column_config
            .dispatch()
            .stage(option, value.to_tcl_obj());
        self
    }

    fn stage_heading(self, option: &str, value: impl ToTclObj) -> Self {
        self.0
            .heading
            .config
            .dispatch()
            .stage(option, value.to_tcl_obj());
        self
    }

    pub fn text(self, text: &str) -> Self {
        self.stage_heading("text", text)
    }

    pub fn image(self, image: &str) -> Self {
        self.stage_heading("image", image)
    }

    /// Anchor of both the cells and the heading.
    pub fn anchor(self, anchor: &str) -> Self {
        self.stage_column("anchor", anchor)
            .stage_heading("anchor", anchor)
    }

    pub fn width(self, width: i64) -> Self {
        self.stage_column("width", width)
    }

    pub fn minwidth(self, minwidth: i64) -> Self {
        self.stage_column("minwidth", minwidth)
    }

    pub fn stretch(self, stretch: bool) -> Self {
        self.stage_column("stretch", stretch)
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn to_tcl(&self) -> &str {
        &self.0.id
    }

    /// Column and heading options together. `text`, `image` and `command` are heading options,
    /// `anchor` is set on both and everything else is a column option.
    pub fn config(&self) -> &MultiHandlerConfigDict {
        &self.0.config
    }

    pub fn column_config(&self) -> &FallbackConfigDict {
        &self.0.column_config
    }

    pub fn heading(&self) -> &TreeviewColumnHeading {
        &self.0.heading
    }

    pub fn is_attached(&self) -> bool {
        self.0.link.lock().is_some()
    }

    fn same_column(&self, other: &TreeviewColumn) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Bind the column to a treeview, then write the remembered options to Tk.
    fn attach(&self, link: &TreeLink) -> Result<()> {
        let first = self.0.link.lock().replace(link.clone()).is_none();
        if first {
            debug!("Attached column {} to {}", self.0.id, link.path);
        }
        self.0.column_config.dispatch().resync()?;
        self.0.heading.config.dispatch().resync()
    }

    fn delete_commands(&self) {
        let commands = std::mem::take(&mut *self.0.commands.lock());
        for command in commands {
            let deleted = self
                .0
                .app
                .upgrade()
                .and_then(|app| app.delete_command(&command));
            if let Err(err) = deleted {
                warn!("Could not delete {} of column {}: {}", command, self.0.id, err);
            }
        }
    }
}

impl PartialEq for TreeviewColumn {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TreeviewColumn {}

impl fmt::Debug for TreeviewColumn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<TreeviewColumn {}>", self.0.id)
    }
}

struct ColumnListInner {
    link: TreeLink,
    columns: Vec<TreeviewColumn>,
}

/// The columns of a treeview. The tree column is always first and can't be touched.
///
/// Tk has no way to add or remove a single column, so every change sends the whole list again
/// and then writes every column's options back.
#[derive(Clone)]
pub struct TreeviewColumnList(Arc<Mutex<ColumnListInner>>);

impl TreeviewColumnList {
    pub(super) fn new(link: TreeLink) -> Result<Self> {
        let tree_column = TreeviewColumn::named(&link.app()?, TREE_COLUMN);
        tree_column.attach(&link)?;
        Ok(Self(Arc::new(Mutex::new(ColumnListInner {
            link,
            columns: vec![tree_column],
        }))))
    }

    pub fn len(&self) -> usize {
        self.0.lock().columns.len()
    }

    /// Never true, the tree column is always there.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<TreeviewColumn> {
        let inner = self.0.lock();
        inner
            .columns
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: inner.columns.len(),
            })
    }

    pub fn to_vec(&self) -> Vec<TreeviewColumn> {
        self.0.lock().columns.clone()
    }

    pub fn position(&self, column: &TreeviewColumn) -> Option<usize> {
        self.0.lock().columns.iter().position(|c| c == column)
    }

    /// Insert `column` before `index`. Indexes past the end append.
    pub fn insert(&self, index: usize, column: TreeviewColumn) -> Result<()> {
        check_not_reserved(index, "insert a column before the tree column")?;
        self.edit(move |columns| {
            check_addable(columns, &column)?;
            let index = index.min(columns.len());
            columns.insert(index, column);
            Ok(None)
        })?;
        Ok(())
    }

    /// Insert a new column with the given heading text. Returns the new column.
    pub fn insert_text(&self, index: usize, text: &str) -> Result<TreeviewColumn> {
        let app = self.0.lock().link.app()?;
        let column = TreeviewColumn::new(&app).text(text);
        self.insert(index, column.clone())?;
        Ok(column)
    }

    pub fn push(&self, column: TreeviewColumn) -> Result<()> {
        self.insert(usize::MAX, column)
    }

    pub fn push_text(&self, text: &str) -> Result<TreeviewColumn> {
        self.insert_text(usize::MAX, text)
    }

    /// Replace the column at `index`. Returns the old column.
    pub fn set(&self, index: usize, column: TreeviewColumn) -> Result<TreeviewColumn> {
        check_not_reserved(index, "replace the tree column")?;
        let old = self.edit(move |columns| {
            let len = columns.len();
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            check_addable(columns, &column)?;
            Ok(Some(std::mem::replace(&mut columns[index], column)))
        })?;
        old.ok_or(Error::IndexOutOfRange { index, len: 0 })
    }

    /// Remove the column at `index`. Returns the removed column.
    pub fn remove(&self, index: usize) -> Result<TreeviewColumn> {
        check_not_reserved(index, "remove the tree column")?;
        let old = self.edit(move |columns| {
            let len = columns.len();
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
            Ok(Some(columns.remove(index)))
        })?;
        old.ok_or(Error::IndexOutOfRange { index, len: 0 })
    }

    /// Apply `change` to a copy of the columns, publish the result with `configure -columns`
    /// and commit it if Tk accepts it.
    ///
    /// A column that `change` returns has left the list; its heading command is deleted.
    fn edit<F>(&self, change: F) -> Result<Option<TreeviewColumn>>
    where
        F: FnOnce(&mut Vec<TreeviewColumn>) -> Result<Option<TreeviewColumn>> + Send + 'static,
    {
        let app = self.0.lock().link.app()?;
        let list = self.clone();

        app.needs_main_thread(move || {
            let (link, mut columns) = {
                let inner = list.0.lock();
                (inner.link.clone(), inner.columns.clone())
            };
            let removed = change(&mut columns)?;

            let tail = TclObj::list(columns.iter().skip(1).map(TreeviewColumn::id));
            link.app()?.widget_call(
                &link.path,
                &ReturnType::Nothing,
                vec![
                    TclObj::from(link.path.as_str()),
                    TclObj::from("configure"),
                    TclObj::from("-columns"),
                    tail,
                ],
            )?;
            debug!("Columns of {} are now {:?}", link.path, columns);

            list.0.lock().columns = columns.clone();
            if let Some(removed) = &removed {
                removed.delete_commands();
            }
            for column in &columns {
                column.attach(&link)?;
            }
            Ok(removed)
        })
    }

    /// Delete the heading commands of every column, for when the treeview is going away.
    pub(super) fn release(&self) {
        for column in self.to_vec() {
            column.delete_commands();
        }
    }
}

impl fmt::Debug for TreeviewColumnList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

fn check_not_reserved(index: usize, what: &str) -> Result<()> {
    if index == 0 {
        return Err(Error::ReservedSlot(format!(
            "can't {}, it must stay first",
            what
        )));
    }
    Ok(())
}

fn check_addable(columns: &[TreeviewColumn], column: &TreeviewColumn) -> Result<()> {
    if column.is_attached() {
        return Err(Error::Unsupported(format!(
            "column {} has already been added to a treeview",
            column.id()
        )));
    }
    if columns.iter().any(|c| c == column && !c.same_column(column)) {
        return Err(Error::IdentityConflict(column.id().to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tclinterp::TclValue;

    use crate::{
        testing::Rejecting,
        widgets::{TkWidget, Treeview, Window},
    };

    fn treeview() -> (TkApp, Treeview) {
        let app = TkApp::simulated().unwrap();
        let window = Window::new(&app).unwrap();
        let treeview = Treeview::new(&window).unwrap();
        (app, treeview)
    }

    fn remote_columns(treeview: &Treeview) -> Vec<String> {
        treeview
            .widget()
            .call(
                &ReturnType::list_of(ReturnType::Str),
                &[treeview.path(), "cget", "-columns"],
            )
            .unwrap()
            .to_strings()
            .unwrap()
    }

    #[test]
    fn test_reserved_tree_column() {
        let (app, treeview) = treeview();
        let columns = treeview.columns();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns.get(0).unwrap().id(), TREE_COLUMN);

        assert!(matches!(columns.remove(0), Err(Error::ReservedSlot(_))));
        assert!(matches!(
            columns.set(0, TreeviewColumn::new(&app)),
            Err(Error::ReservedSlot(_))
        ));
        assert!(matches!(
            columns.insert(0, TreeviewColumn::new(&app)),
            Err(Error::ReservedSlot(_))
        ));
        assert_eq!(columns.len(), 1);

        columns.insert(1, TreeviewColumn::new(&app)).unwrap();
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_tree_column_config() {
        let (_app, treeview) = treeview();
        let tree_column = treeview.columns().get(0).unwrap();
        tree_column.config().set("text", "Tree").unwrap();
        tree_column.config().set("width", 123).unwrap();
        assert_eq!(tree_column.config().get("text").unwrap(), TclValue::from("Tree"));
        assert_eq!(tree_column.config().get("width").unwrap(), TclValue::Int(123));
    }

    #[test]
    fn test_detached_column() {
        let (app, _treeview) = treeview();
        let column = TreeviewColumn::new(&app).text("staged");
        assert!(!column.is_attached());
        assert!(matches!(column.config().get("text"), Err(Error::NotAttached(_))));
        assert!(matches!(column.config().set("width", 1), Err(Error::NotAttached(_))));
        assert!(matches!(column.heading().on_click(), Err(Error::NotAttached(_))));
    }

    #[test]
    fn test_insert_flushes_staged_options() {
        let (app, treeview) = treeview();
        let columns = treeview.columns();

        let column = TreeviewColumn::new(&app)
            .text("Name")
            .width(120)
            .anchor("e")
            .stretch(false);
        columns.push(column.clone()).unwrap();

        assert!(column.is_attached());
        assert_eq!(remote_columns(&treeview), vec![column.id().to_owned()]);
        assert_eq!(column.config().get("text").unwrap(), TclValue::from("Name"));
        assert_eq!(column.config().get("width").unwrap(), TclValue::Int(120));
        assert_eq!(column.config().get("stretch").unwrap(), TclValue::Bool(false));
        assert_eq!(column.config().get("anchor").unwrap(), TclValue::from("e"));
        assert_eq!(
            column.heading().config().get("anchor").unwrap(),
            TclValue::from("e")
        );
        assert_eq!(
            column.config().keys().unwrap(),
            vec!["width", "minwidth", "stretch", "anchor", "id", "text", "image", "command"]
        );

        assert!(matches!(columns.push(column.clone()), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_multi_handler_routing() {
        let (app, treeview) = treeview();
        let column = treeview.columns().push_text("A").unwrap();

        column.config().set("anchor", "w").unwrap();
        assert_eq!(
            column.column_config().get("anchor").unwrap(),
            TclValue::from("w")
        );
        assert_eq!(
            column.heading().config().get("anchor").unwrap(),
            TclValue::from("w")
        );

        column.config().set("text", "B").unwrap();
        assert_eq!(
            column.heading().config().get("text").unwrap(),
            TclValue::from("B")
        );
        assert!(!column.column_config().contains("text"));
        assert!(matches!(
            column.config().set("command", "whatever"),
            Err(Error::Unsupported(_))
        ));

        let other = TreeviewColumn::new(&app);
        assert_ne!(column, other);
    }

    #[test]
    fn test_options_survive_column_edits() {
        let (app, treeview) = treeview();
        let columns = treeview.columns();
        let a = columns.push_text("A").unwrap();
        a.config().set("width", 50).unwrap();
        a.config().set("text", "Renamed").unwrap();

        let b = columns.push_text("B").unwrap();
        let c = TreeviewColumn::new(&app).text("C");
        columns.insert(1, c.clone()).unwrap();

        assert_eq!(columns.to_vec()[1..], [c.clone(), a.clone(), b.clone()]);
        assert_eq!(
            remote_columns(&treeview),
            vec![c.id().to_owned(), a.id().to_owned(), b.id().to_owned()]
        );
        assert_eq!(a.config().get("text").unwrap(), TclValue::from("Renamed"));
        assert_eq!(a.config().get("width").unwrap(), TclValue::Int(50));
        assert_eq!(b.config().get("text").unwrap(), TclValue::from("B"));

        let removed = columns.remove(1).unwrap();
        assert_eq!(removed, c);
        assert_eq!(remote_columns(&treeview), vec![a.id().to_owned(), b.id().to_owned()]);
        assert_eq!(a.config().get("text").unwrap(), TclValue::from("Renamed"));

        let d = TreeviewColumn::new(&app).text("D");
        let replaced = columns.set(2, d.clone()).unwrap();
        assert_eq!(replaced, b);
        assert_eq!(columns.to_vec()[1..], [a.clone(), d.clone()]);
        assert_eq!(d.config().get("text").unwrap(), TclValue::from("D"));

        assert_eq!(
            columns.remove(3).unwrap_err(),
            Error::IndexOutOfRange { index: 3, len: 3 }
        );
        assert!(matches!(columns.push(removed), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_identity_conflict() {
        let (app, treeview) = treeview();
        let columns = treeview.columns();
        let column = TreeviewColumn::named(&app, "name");
        columns.push(column).unwrap();

        let twin = TreeviewColumn::named(&app, "name");
        assert_eq!(
            columns.push(twin.clone()).unwrap_err(),
            Error::IdentityConflict("name".to_owned())
        );
        assert!(!twin.is_attached());
        assert_eq!(columns.len(), 2);
    }

    #[test]
    fn test_heading_command_survives() {
        let (app, treeview) = treeview();
        let columns = treeview.columns();
        let column = columns.push_text("Click").unwrap();

        let clicks = Arc::new(AtomicUsize::new(0));
        {
            let clicks = clicks.clone();
            column.heading().on_click().unwrap().connect(move |_| {
                clicks.fetch_add(1, Ordering::SeqCst);
            });
        }

        columns.insert_text(1, "Before").unwrap();
        columns.push_text("After").unwrap();

        let command = column.heading().config().get("command").unwrap();
        let command = command.as_str().unwrap().to_owned();
        assert!(!command.is_empty());
        app.call(&ReturnType::Nothing, &[command.as_str()]).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        let index = columns.position(&column).unwrap();
        columns.remove(index).unwrap();
        assert!(!app.interp().has_command(&command));
    }

    #[test]
    fn test_rejected_column_edit_changes_nothing() {
        let backend = Rejecting::new();
        let app = backend.app();
        let treeview = Treeview::new(&Window::new(&app).unwrap()).unwrap();
        let columns = treeview.columns();
        let a = columns.push_text("A").unwrap();
        a.config().set("width", 70).unwrap();

        backend.reject(&[treeview.path(), "configure", "-columns"]);
        let b = TreeviewColumn::new(&app).text("B");
        assert!(matches!(columns.push(b.clone()), Err(Error::Tcl(_))));
        assert!(matches!(columns.remove(1), Err(Error::Tcl(_))));

        assert_eq!(columns.to_vec()[1..], [a.clone()]);
        assert!(!b.is_attached());
        assert!(a.is_attached());
        assert_eq!(remote_columns(&treeview), vec![a.id().to_owned()]);
        assert_eq!(a.config().get("width").unwrap(), TclValue::Int(70));

        backend.allow_all();
        columns.push(b.clone()).unwrap();
        assert!(b.is_attached());
        assert_eq!(b.config().get("text").unwrap(), TclValue::from("B"));
    }
}
