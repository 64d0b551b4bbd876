use std::{
    fmt,
    sync::{Arc, Weak},
};

use log::{debug, warn};
use parking_lot::Mutex;

use tclinterp::{ReturnType, TclObj, TclValue, ToTclObj};

use super::TreeLink;
use crate::{
    app::TkApp,
    config::{CommandTarget, ConfigDict, Direct, DirectConfigDict, OptionCommand},
    error::{Error, Result},
};

struct RowState {
    link: Option<TreeLink>,
    parent: Weak<RowData>,
    list: Weak<Mutex<RowListInner>>,
    index: usize,
}

struct RowData {
    id: String,
    /// Options to send with the `insert` that attaches the row.
    staged: Mutex<Vec<(String, TclObj)>>,
    state: Mutex<RowState>,
    config: DirectConfigDict,
    subrows: TreeviewRowList,
}

impl CommandTarget for RowData {
    fn locate(&self) -> Result<(TkApp, String, String)> {
        match &self.state.lock().link {
            Some(link) => Ok((link.app()?, link.path.clone(), self.id.clone())),
            None => Err(not_in_treeview(&self.id)),
        }
    }
}

fn not_in_treeview(id: &str) -> Error {
    Error::NotAttached(format!("row {} is not in a treeview", id))
}

/// A row of a treeview, with its own subrows.
///
/// A new row is detached: it can be given options with the builder methods, but its config
/// can't be used before it's inserted into a [`TreeviewRowList`].
#[derive(Clone)]
pub struct TreeviewRow(Arc<RowData>);

impl TreeviewRow {
    /// A detached row with a fresh id.
    pub fn new(app: &TkApp) -> Self {
        Self::named(&app.next_row_id())
    }

    /// A detached row with the given id.
    pub fn named(id: &str) -> Self {
        let data = Arc::new_cyclic(|weak: &Weak<RowData>| {
            let target: Weak<dyn CommandTarget> = weak.clone();
            let config = ConfigDict::new(Direct::new(OptionCommand::new("item", target)));
            config.set_types(vec![
                ("values", ReturnType::list_of(ReturnType::Str)),
                ("text", ReturnType::Str),
                ("image", ReturnType::Str),
                ("open", ReturnType::Bool),
                ("tags", ReturnType::list_of(ReturnType::Str)),
            ]);

            RowData {
                id: id.to_owned(),
                staged: Mutex::new(Vec::new()),
                state: Mutex::new(RowState {
                    link: None,
                    parent: Weak::new(),
                    list: Weak::new(),
                    index: 0,
                }),
                config,
                subrows: TreeviewRowList::unbound(id, weak.clone()),
            }
        });
        Self(data)
    }

    fn stage(self, option: &str, value: impl ToTclObj) -> Self {
        {
            let mut staged = self.0.staged.lock();
            staged.retain(|(name, _)| name != option);
            staged.push((option.to_owned(), value.to_tcl_obj()));
        }
        self
    }

    pub fn values(self, values: impl ToTclObj) -> Self {
        self.stage("values", values)
    }

    pub fn text(self, text: &str) -> Self {
        self.stage("text", text)
    }

    pub fn image(self, image: &str) -> Self {
        self.stage("image", image)
    }

    pub fn open(self, open: bool) -> Self {
        self.stage("open", open)
    }

    pub fn tags(self, tags: Vec<&str>) -> Self {
        self.stage("tags", tags)
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn to_tcl(&self) -> &str {
        &self.0.id
    }

    /// The `item` options: `values`, `text`, `image`, `open` and `tags`.
    pub fn config(&self) -> &DirectConfigDict {
        &self.0.config
    }

    pub fn subrows(&self) -> &TreeviewRowList {
        &self.0.subrows
    }

    pub fn is_attached(&self) -> bool {
        self.0.state.lock().link.is_some()
    }

    /// The row this row is a subrow of. `None` for detached rows and top-level rows.
    pub fn parent(&self) -> Option<TreeviewRow> {
        self.0.state.lock().parent.upgrade().map(TreeviewRow)
    }

    /// Where the row is in its list.
    pub fn index(&self) -> Result<usize> {
        let state = self.0.state.lock();
        match state.link {
            Some(_) => Ok(state.index),
            None => Err(not_in_treeview(&self.0.id)),
        }
    }

    fn owning_list(&self) -> Result<TreeviewRowList> {
        self.0
            .state
            .lock()
            .list
            .upgrade()
            .map(TreeviewRowList)
            .ok_or_else(|| not_in_treeview(&self.0.id))
    }

    /// Move the row to another position of the list it's in.
    pub fn move_to(&self, index: usize) -> Result<()> {
        let from = self.index()?;
        self.owning_list()?.move_row(from, index)
    }

    /// `pathName selection add|remove` with this row.
    fn change_selection(&self, op: &'static str) -> Result<()> {
        let (app, path, id) = self.0.locate()?;
        app.clone().needs_main_thread(move || {
            let argv = vec![
                path.clone(),
                "selection".to_owned(),
                op.to_owned(),
                TclObj::list([id]).into_string(),
            ];
            app.widget_call(&path, &ReturnType::Nothing, argv)?;
            Ok(())
        })
    }

    /// The ids of every selected row of the treeview this row is in.
    fn selection(&self) -> Result<Vec<String>> {
        let (app, path, _) = self.0.locate()?;
        app.clone().needs_main_thread(move || {
            let selection = app.widget_call(
                &path,
                &ReturnType::list_of(ReturnType::Str),
                vec![path.clone(), "selection".to_owned()],
            )?;
            Ok(selection.to_strings().unwrap_or_default())
        })
    }

    pub fn select(&self) -> Result<()> {
        self.change_selection("add")
    }

    pub fn deselect(&self) -> Result<()> {
        self.change_selection("remove")
    }

    pub fn selected(&self) -> Result<bool> {
        Ok(self.selection()?.iter().any(|id| id == self.id()))
    }

    fn same_row(&self, other: &TreeviewRow) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn attach(&self, link: &TreeLink, list: &Arc<Mutex<RowListInner>>, owner: &Weak<RowData>) {
        {
            let mut state = self.0.state.lock();
            state.link = Some(link.clone());
            state.parent = owner.clone();
            state.list = Arc::downgrade(list);
        }
        self.0.subrows.0.lock().link = Some(link.clone());
        debug!("Attached row {} to {}", self.0.id, link.path);
    }

    fn detach(&self) {
        {
            let mut state = self.0.state.lock();
            state.link = None;
            state.parent = Weak::new();
            state.list = Weak::new();
            state.index = 0;
        }

        let subrows = {
            let mut inner = self.0.subrows.0.lock();
            inner.link = None;
            std::mem::take(&mut inner.rows)
        };
        for row in subrows {
            row.detach();
        }
        debug!("Detached row {}", self.0.id);
    }
}

impl PartialEq for TreeviewRow {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for TreeviewRow {}

impl fmt::Debug for TreeviewRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.0.state.lock();
        match &state.link {
            Some(_) => write!(f, "<TreeviewRow {} at {}>", self.0.id, state.index),
            None => write!(f, "<detached TreeviewRow {}>", self.0.id),
        }
    }
}

struct RowListInner {
    link: Option<TreeLink>,
    /// Tk id of the item whose children this list holds. Empty for the top level.
    root: String,
    owner: Weak<RowData>,
    rows: Vec<TreeviewRow>,
}

/// The rows of a treeview, or the subrows of a row.
///
/// The local list always has the same order as the children Tk reports for `root`. Every
/// structural change is done remotely first and runs as a whole on the main thread.
#[derive(Clone)]
pub struct TreeviewRowList(Arc<Mutex<RowListInner>>);

impl TreeviewRowList {
    pub(super) fn top_level(link: TreeLink) -> Self {
        Self(Arc::new(Mutex::new(RowListInner {
            link: Some(link),
            root: String::new(),
            owner: Weak::new(),
            rows: Vec::new(),
        })))
    }

    fn unbound(root: &str, owner: Weak<RowData>) -> Self {
        Self(Arc::new(Mutex::new(RowListInner {
            link: None,
            root: root.to_owned(),
            owner,
            rows: Vec::new(),
        })))
    }

    fn link(&self) -> Result<TreeLink> {
        let inner = self.0.lock();
        inner.link.clone().ok_or_else(|| {
            if inner.root.is_empty() {
                Error::NotAttached("the treeview has been destroyed".to_owned())
            } else {
                not_in_treeview(&inner.root)
            }
        })
    }

    /// Run `op` on the main thread with a handle to this list.
    fn on_main<F, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(TreeviewRowList, TreeLink) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let link = self.link()?;
        let list = self.clone();
        link.app()?.needs_main_thread(move || op(list, link))
    }

    fn renumber(rows: &[TreeviewRow]) {
        for (index, row) in rows.iter().enumerate() {
            row.0.state.lock().index = index;
        }
    }

    pub fn len(&self) -> usize {
        self.0.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<TreeviewRow> {
        let inner = self.0.lock();
        inner
            .rows
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfRange {
                index,
                len: inner.rows.len(),
            })
    }

    pub fn to_vec(&self) -> Vec<TreeviewRow> {
        self.0.lock().rows.clone()
    }

    pub fn position(&self, row: &TreeviewRow) -> Option<usize> {
        self.0.lock().rows.iter().position(|r| r == row)
    }

    /// Insert `row` before `index`. Indexes past the end append.
    pub fn insert(&self, index: usize, row: TreeviewRow) -> Result<()> {
        self.on_main(move |list, link| list.insert_now(&link, index, row))
    }

    pub fn push(&self, row: TreeviewRow) -> Result<()> {
        self.insert(usize::MAX, row)
    }

    /// Insert a new row with the given values. Returns the new row.
    pub fn insert_values(&self, index: usize, values: impl ToTclObj) -> Result<TreeviewRow> {
        let row = TreeviewRow::new(&self.link()?.app()?).values(values);
        self.insert(index, row.clone())?;
        Ok(row)
    }

    pub fn push_values(&self, values: impl ToTclObj) -> Result<TreeviewRow> {
        self.insert_values(usize::MAX, values)
    }

    fn insert_now(&self, link: &TreeLink, index: usize, row: TreeviewRow) -> Result<()> {
        if row.is_attached() {
            return Err(Error::Unsupported(format!(
                "row {} is already in a treeview, remove it first",
                row.id()
            )));
        }

        let (root, owner, index) = {
            let inner = self.0.lock();
            (
                inner.root.clone(),
                inner.owner.clone(),
                index.min(inner.rows.len()),
            )
        };

        let mut argv = vec![
            TclObj::from(link.path.as_str()),
            TclObj::from("insert"),
            TclObj::from(root),
            TclObj::new(index.to_string()),
            TclObj::from("-id"),
            TclObj::from(row.id()),
        ];
        for (option, value) in row.0.staged.lock().iter() {
            argv.push(TclObj::new(format!("-{}", option)));
            argv.push(value.clone());
        }
        link.app()?.widget_call(&link.path, &ReturnType::Nothing, argv)?;
        row.0.staged.lock().clear();

        {
            let mut inner = self.0.lock();
            inner.rows.insert(index, row.clone());
            Self::renumber(&inner.rows);
        }
        row.attach(link, &self.0, &owner);
        Ok(())
    }

    /// Replace the row at `index` with `row`.
    ///
    /// The new row is inserted before the old one is deleted. If Tk refuses to delete the old
    /// row, the new one is removed again.
    pub fn set(&self, index: usize, row: TreeviewRow) -> Result<()> {
        self.on_main(move |list, link| {
            let len = list.len();
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }

            list.insert_now(&link, index, row.clone())?;
            match list.remove_now(&link, index + 1) {
                Ok(_) => Ok(()),
                Err(err) => {
                    if let Err(cleanup) = list.remove_now(&link, index) {
                        warn!("Could not take row {} out again: {}", row.id(), cleanup);
                    }
                    Err(err)
                }
            }
        })
    }

    /// Remove the row at `index` from the treeview. The row and its subrows become detached.
    pub fn remove(&self, index: usize) -> Result<TreeviewRow> {
        self.on_main(move |list, link| list.remove_now(&link, index))
    }

    fn remove_now(&self, link: &TreeLink, index: usize) -> Result<TreeviewRow> {
        let row = self.get(index)?;

        link.app()?.widget_call(
            &link.path,
            &ReturnType::Nothing,
            vec![
                TclObj::from(link.path.as_str()),
                TclObj::from("delete"),
                TclObj::list([row.id()]),
            ],
        )?;

        {
            let mut inner = self.0.lock();
            inner.rows.retain(|r| !r.same_row(&row));
            Self::renumber(&inner.rows);
        }
        row.detach();
        Ok(row)
    }

    /// Remove every row with one `delete` call.
    pub fn clear(&self) -> Result<()> {
        self.on_main(|list, link| {
            let rows = list.to_vec();
            if rows.is_empty() {
                return Ok(());
            }

            link.app()?.widget_call(
                &link.path,
                &ReturnType::Nothing,
                vec![
                    TclObj::from(link.path.as_str()),
                    TclObj::from("delete"),
                    TclObj::list(rows.iter().map(TreeviewRow::id)),
                ],
            )?;

            list.0.lock().rows.clear();
            for row in rows {
                row.detach();
            }
            Ok(())
        })
    }

    /// Move the row at `from` so that it ends up at `to`, with Tk's `move`.
    ///
    /// The row keeps its subrows and its selection. `to` past the end means the last position.
    pub fn move_row(&self, from: usize, to: usize) -> Result<()> {
        self.on_main(move |list, link| list.move_now(&link, from, to))
    }

    fn move_now(&self, link: &TreeLink, from: usize, to: usize) -> Result<()> {
        let (row, root, to) = {
            let inner = self.0.lock();
            let len = inner.rows.len();
            let row = inner
                .rows
                .get(from)
                .cloned()
                .ok_or(Error::IndexOutOfRange { index: from, len })?;
            (row, inner.root.clone(), to.min(len - 1))
        };
        if from == to {
            return Ok(());
        }

        link.app()?.widget_call(
            &link.path,
            &ReturnType::Nothing,
            vec![
                link.path.clone(),
                "move".to_owned(),
                row.id().to_owned(),
                root,
                to.to_string(),
            ],
        )?;

        let mut inner = self.0.lock();
        let row = inner.rows.remove(from);
        inner.rows.insert(to, row);
        Self::renumber(&inner.rows);
        Ok(())
    }

    /// Sort the rows by the value in data column `column` (counting from 1), then sort every
    /// row's subrows the same way. Equal values keep their order. `reverse` sorts descending.
    pub fn sort(&self, column: usize, reverse: bool) -> Result<()> {
        if column < 1 {
            return Err(Error::IndexOutOfRange {
                index: column,
                len: 0,
            });
        }
        self.on_main(move |list, link| list.sort_now(&link, column, reverse))
    }

    fn sort_now(&self, link: &TreeLink, column: usize, reverse: bool) -> Result<()> {
        let rows = self.to_vec();

        let mut keyed = Vec::with_capacity(rows.len());
        for row in &rows {
            let values = row.config().get("values")?;
            let key = values
                .as_list()
                .and_then(|values| values.get(column - 1))
                .and_then(TclValue::as_str)
                .unwrap_or_default()
                .to_owned();
            keyed.push((key, row.clone()));
        }

        keyed.sort_by(|(a, _), (b, _)| if reverse { b.cmp(a) } else { a.cmp(b) });

        for (target, (_, row)) in keyed.iter().enumerate() {
            let current = row.index()?;
            if current != target {
                self.move_now(link, current, target)?;
            }
        }

        for row in &rows {
            row.subrows().sort_now(link, column, reverse)?;
        }
        Ok(())
    }

    /// Forget every row without telling Tk, for when the whole treeview is going away.
    pub(super) fn detach_all(&self) {
        let rows = {
            let mut inner = self.0.lock();
            inner.link = None;
            std::mem::take(&mut inner.rows)
        };
        for row in rows {
            row.detach();
        }
    }

    /// Depth-first search for the row with the given id.
    pub fn find(&self, id: &str) -> Option<TreeviewRow> {
        for row in self.to_vec() {
            if row.id() == id {
                return Some(row);
            }
            if let Some(found) = row.subrows().find(id) {
                return Some(found);
            }
        }
        None
    }
}

impl fmt::Debug for TreeviewRowList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn ids(list: &TreeviewRowList) -> Vec<String> {
        list.to_vec().iter().map(|row| row.id().to_owned()).collect()
    }

    fn children(treeview: &Treeview, id: &str) -> Vec<String> {
        treeview
            .widget()
            .call(
                &ReturnType::list_of(ReturnType::Str),
                &[treeview.path(), "children", id],
            )
            .unwrap()
            .to_strings()
            .unwrap()
    }

    #[test]
    fn test_detached_row() {
        let (app, _treeview) = treeview();
        let row = TreeviewRow::new(&app).values(vec!["a"]);

        assert!(!row.is_attached());
        assert!(matches!(row.config().get("values"), Err(Error::NotAttached(_))));
        assert!(matches!(row.config().set("text", "x"), Err(Error::NotAttached(_))));
        assert!(matches!(row.select(), Err(Error::NotAttached(_))));
        assert!(matches!(row.deselect(), Err(Error::NotAttached(_))));
        assert!(matches!(row.selected(), Err(Error::NotAttached(_))));
        assert!(matches!(row.index(), Err(Error::NotAttached(_))));
        assert!(matches!(
            row.subrows().push_values(vec!["x"]),
            Err(Error::NotAttached(_))
        ));
    }

    #[test]
    fn test_insert_and_values() {
        let (app, treeview) = treeview();
        let rows = treeview.rows();

        let row = TreeviewRow::new(&app).values(vec![1, 2]).text("hi");
        rows.push(row.clone()).unwrap();
        assert!(row.is_attached());
        assert_eq!(
            row.config().get("values").unwrap(),
            TclValue::from(vec!["1", "2"])
        );
        assert_eq!(row.config().get("text").unwrap(), TclValue::from("hi"));
        assert_eq!(row.config().get("open").unwrap(), TclValue::Bool(false));

        row.config().set("open", true).unwrap();
        assert_eq!(row.config().get("open").unwrap(), TclValue::Bool(true));
        assert_eq!(
            row.config().keys().unwrap(),
            vec!["text", "image", "values", "open", "tags"]
        );

        assert!(matches!(rows.push(row.clone()), Err(Error::Unsupported(_))));
        assert_eq!(rows.len(), 1);

        let twin = TreeviewRow::named(row.id());
        assert!(matches!(rows.push(twin.clone()), Err(Error::Tcl(_))));
        assert!(!twin.is_attached());
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_index_coherence() {
        let (_app, treeview) = treeview();
        let rows = treeview.rows();
        let r0 = rows.push_values(vec!["0"]).unwrap();
        let r1 = rows.push_values(vec!["1"]).unwrap();
        let r2 = rows.push_values(vec!["2"]).unwrap();

        let removed = rows.remove(1).unwrap();
        assert_eq!(removed, r1);
        assert!(!r1.is_attached());
        assert_eq!(rows.to_vec(), vec![r0.clone(), r2.clone()]);
        assert_eq!(r2.index().unwrap(), 1);

        let r3 = rows.insert_values(1, vec!["3"]).unwrap();
        assert_eq!(rows.to_vec(), vec![r0.clone(), r3.clone(), r2.clone()]);
        assert_eq!(r3.index().unwrap(), 1);
        assert_eq!(r2.index().unwrap(), 2);
        assert_eq!(children(&treeview, ""), ids(rows));

        assert_eq!(
            rows.remove(3).unwrap_err(),
            Error::IndexOutOfRange { index: 3, len: 3 }
        );
        assert_eq!(rows.len(), 3);

        let r4 = rows.insert_values(100, vec!["4"]).unwrap();
        assert_eq!(r4.index().unwrap(), 3);
        assert_eq!(children(&treeview, ""), ids(rows));
    }

    #[test]
    fn test_set_replaces() {
        let (app, treeview) = treeview();
        let rows = treeview.rows();
        let old = rows.push_values(vec!["old"]).unwrap();
        let keep = rows.push_values(vec!["keep"]).unwrap();

        let new = TreeviewRow::new(&app).values(vec!["new"]);
        rows.set(0, new.clone()).unwrap();
        assert_eq!(rows.to_vec(), vec![new.clone(), keep.clone()]);
        assert!(!old.is_attached());
        assert_eq!(new.index().unwrap(), 0);
        assert_eq!(children(&treeview, ""), ids(rows));

        assert_eq!(
            rows.set(2, TreeviewRow::new(&app)).unwrap_err(),
            Error::IndexOutOfRange { index: 2, len: 2 }
        );
    }

    #[test]
    fn test_subrows_and_detach() {
        let (_app, treeview) = treeview();
        let rows = treeview.rows();
        let parent = rows.push_values(vec!["p"]).unwrap();
        let child = parent.subrows().push_values(vec!["c"]).unwrap();
        let grandchild = child.subrows().push_values(vec!["g"]).unwrap();

        assert_eq!(child.parent(), Some(parent.clone()));
        assert_eq!(rows.get(0).unwrap().parent(), None);
        assert_eq!(children(&treeview, parent.id()), vec![child.id().to_owned()]);
        assert_eq!(treeview.find_row(grandchild.id()), Some(grandchild.clone()));

        rows.remove(0).unwrap();
        assert!(!parent.is_attached());
        assert!(!child.is_attached());
        assert!(!grandchild.is_attached());
        assert!(parent.subrows().is_empty());
        assert_eq!(treeview.find_row(child.id()), None);
    }

    #[test]
    fn test_move_keeps_children_and_selection() {
        let (_app, treeview) = treeview();
        let rows = treeview.rows();
        let a = rows.push_values(vec!["a"]).unwrap();
        let b = rows.push_values(vec!["b"]).unwrap();
        let c = rows.push_values(vec!["c"]).unwrap();
        let x = a.subrows().push_values(vec!["x"]).unwrap();
        let y = a.subrows().push_values(vec!["y"]).unwrap();
        a.select().unwrap();

        rows.move_row(0, 2).unwrap();
        assert_eq!(rows.to_vec(), vec![b.clone(), c.clone(), a.clone()]);
        assert_eq!(a.index().unwrap(), 2);
        assert_eq!(b.index().unwrap(), 0);
        assert_eq!(a.subrows().to_vec(), vec![x.clone(), y.clone()]);
        assert!(a.selected().unwrap());
        assert!(x.is_attached());
        assert_eq!(children(&treeview, ""), ids(rows));
        assert_eq!(children(&treeview, a.id()), ids(a.subrows()));

        a.move_to(0).unwrap();
        assert_eq!(rows.to_vec(), vec![a.clone(), b.clone(), c.clone()]);
        rows.move_row(1, 99).unwrap();
        assert_eq!(rows.to_vec(), vec![a, c, b]);
        assert_eq!(children(&treeview, ""), ids(rows));
    }

    #[test]
    fn test_selection() {
        let (_app, treeview) = treeview();
        let rows = treeview.rows();
        let a = rows.push_values(vec!["a"]).unwrap();
        let b = rows.push_values(vec!["b"]).unwrap();

        a.select().unwrap();
        b.select().unwrap();
        assert_eq!(treeview.selection().unwrap(), vec![a.clone(), b.clone()]);
        a.deselect().unwrap();
        assert!(!a.selected().unwrap());
        assert_eq!(treeview.selection().unwrap(), vec![b.clone()]);
        assert!(b.selected().unwrap());

        let a1 = a.subrows().push_values(vec!["a1"]).unwrap();
        assert!(!a1.selected().unwrap());
        a1.select().unwrap();
        assert!(a1.selected().unwrap());
        assert!(!a.selected().unwrap());
        a1.deselect().unwrap();

        rows.remove(1).unwrap();
        assert!(treeview.selection().unwrap().is_empty());
    }

    #[test]
    fn test_sort() {
        let (_app, treeview) = treeview();
        let rows = treeview.rows();
        let b = rows.push_values(vec!["b"]).unwrap();
        let a = rows.push_values(vec!["a"]).unwrap();
        let c = rows.push_values(vec!["c"]).unwrap();
        let e = a.subrows().push_values(vec!["e"]).unwrap();
        let d = a.subrows().push_values(vec!["d"]).unwrap();
        b.select().unwrap();

        rows.sort(1, false).unwrap();
        assert_eq!(rows.to_vec(), vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(a.subrows().to_vec(), vec![d.clone(), e.clone()]);
        assert_eq!(children(&treeview, ""), ids(rows));
        assert_eq!(children(&treeview, a.id()), ids(a.subrows()));
        assert!(b.selected().unwrap());

        rows.sort(1, true).unwrap();
        assert_eq!(rows.to_vec(), vec![c.clone(), b.clone(), a.clone()]);
        assert_eq!(a.subrows().to_vec(), vec![e.clone(), d.clone()]);
        assert_eq!(children(&treeview, ""), ids(rows));

        assert_eq!(
            rows.sort(0, false).unwrap_err(),
            Error::IndexOutOfRange { index: 0, len: 0 }
        );
    }

    #[test]
    fn test_sort_is_stable_and_handles_missing_values() {
        let (_app, treeview) = treeview();
        let rows = treeview.rows();
        let first = rows.push_values(vec!["x", "1"]).unwrap();
        let short = rows.push_values(vec!["y"]).unwrap();
        let second = rows.push_values(vec!["z", "1"]).unwrap();
        let zero = rows.push_values(vec!["w", "0"]).unwrap();

        rows.sort(2, false).unwrap();
        assert_eq!(rows.to_vec(), vec![short, zero, first, second]);
    }

    #[test]
    fn test_clear() {
        let (_app, treeview) = treeview();
        let rows = treeview.rows();
        let a = rows.push_values(vec!["a"]).unwrap();
        rows.push_values(vec!["b"]).unwrap();
        a.subrows().push_values(vec!["c"]).unwrap();

        rows.clear().unwrap();
        assert!(rows.is_empty());
        assert!(!a.is_attached());
        assert!(children(&treeview, "").is_empty());
        rows.clear().unwrap();
    }

    fn rejecting_treeview() -> (Rejecting, TkApp, Treeview) {
        let backend = Rejecting::new();
        let app = backend.app();
        let treeview = Treeview::new(&Window::new(&app).unwrap()).unwrap();
        (backend, app, treeview)
    }

    #[test]
    fn test_rejected_remove_changes_nothing() {
        let (backend, _app, treeview) = rejecting_treeview();
        let rows = treeview.rows();
        let a = rows.push_values(vec!["a"]).unwrap();
        let b = rows.push_values(vec!["b"]).unwrap();
        let c = rows.push_values(vec!["c"]).unwrap();
        let child = b.subrows().push_values(vec!["x"]).unwrap();

        backend.reject(&[treeview.path(), "delete"]);
        assert_eq!(
            rows.remove(1).unwrap_err(),
            Error::Tcl(tclinterp::TclError::new(format!(
                "rejected: {} delete {}",
                treeview.path(),
                b.id()
            )))
        );
        assert!(matches!(rows.clear(), Err(Error::Tcl(_))));

        assert_eq!(rows.to_vec(), vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(
            (a.index().unwrap(), b.index().unwrap(), c.index().unwrap()),
            (0, 1, 2)
        );
        assert!(b.is_attached());
        assert!(child.is_attached());
        assert_eq!(children(&treeview, ""), ids(rows));

        backend.allow_all();
        assert_eq!(rows.remove(1).unwrap(), b);
        assert_eq!(children(&treeview, ""), ids(rows));
    }

    #[test]
    fn test_rejected_move_changes_nothing() {
        let (backend, _app, treeview) = rejecting_treeview();
        let rows = treeview.rows();
        let a = rows.push_values(vec!["b"]).unwrap();
        let b = rows.push_values(vec!["a"]).unwrap();

        backend.reject(&[treeview.path(), "move"]);
        assert!(matches!(rows.move_row(0, 1), Err(Error::Tcl(_))));
        assert!(matches!(b.move_to(0), Err(Error::Tcl(_))));
        assert!(matches!(rows.sort(1, false), Err(Error::Tcl(_))));

        assert_eq!(rows.to_vec(), vec![a.clone(), b.clone()]);
        assert_eq!((a.index().unwrap(), b.index().unwrap()), (0, 1));
        assert_eq!(children(&treeview, ""), ids(rows));
    }

    #[test]
    fn test_rejected_set_keeps_the_old_row() {
        let (backend, app, treeview) = rejecting_treeview();
        let rows = treeview.rows();
        let old = rows.push_values(vec!["old"]).unwrap();

        backend.reject(&[treeview.path(), "delete"]);
        let new = TreeviewRow::new(&app).values(vec!["new"]);
        assert_eq!(
            rows.set(0, new.clone()).unwrap_err(),
            Error::Tcl(tclinterp::TclError::new(format!(
                "rejected: {} delete {}",
                treeview.path(),
                old.id()
            )))
        );

        // taking the new row out again is a delete too, so it stays in front
        assert_eq!(rows.to_vec(), vec![new.clone(), old.clone()]);
        assert_eq!(old.index().unwrap(), 1);
        assert_eq!(children(&treeview, ""), ids(rows));
    }
}
