//! `ttk::treeview` and its rows and columns.

mod column;
mod row;

use std::fmt;

use tclinterp::{ReturnType, TclObj, ToTclObj};

pub use self::column::{TreeviewColumn, TreeviewColumnHeading, TreeviewColumnList, TREE_COLUMN};
pub use self::row::{TreeviewRow, TreeviewRowList};
use super::{AnyWidget, Packable, TkWidget, Widget};
use crate::{
    app::{AppRef, TkApp},
    error::Result,
};

/// What rows and columns need to talk to their treeview.
#[derive(Clone)]
pub(crate) struct TreeLink {
    app: AppRef,
    path: String,
}

impl TreeLink {
    fn app(&self) -> Result<TkApp> {
        self.app.upgrade()
    }
}

/// A `ttk::treeview` with [`rows`](Treeview::rows) and [`columns`](Treeview::columns).
#[derive(Clone)]
pub struct Treeview {
    widget: Widget,
    rows: TreeviewRowList,
    columns: TreeviewColumnList,
}

impl Treeview {
    pub fn new(parent: &impl TkWidget) -> Result<Self> {
        Self::builder(parent)?.build()
    }

    pub fn builder<P: TkWidget>(parent: &P) -> Result<TreeviewBuilder> {
        Ok(TreeviewBuilder {
            app: parent.app()?,
            parent_path: parent.path().to_owned(),
            options: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
        })
    }

    /// The top-level rows.
    pub fn rows(&self) -> &TreeviewRowList {
        &self.rows
    }

    /// The columns, starting with the tree column.
    pub fn columns(&self) -> &TreeviewColumnList {
        &self.columns
    }

    fn view(&self, which: &str) -> Result<(f64, f64)> {
        let fractions = self.widget.call(
            &ReturnType::Tuple(vec![ReturnType::Float, ReturnType::Float]),
            &[self.path(), which],
        )?;
        let fractions = fractions.as_list().unwrap_or_default();
        let fraction = |i: usize| fractions.get(i).and_then(|f| f.as_float()).unwrap_or(0.0);
        Ok((fraction(0), fraction(1)))
    }

    /// The visible part of the horizontal scroll area, as fractions between 0 and 1.
    pub fn xview(&self) -> Result<(f64, f64)> {
        self.view("xview")
    }

    pub fn yview(&self) -> Result<(f64, f64)> {
        self.view("yview")
    }

    pub fn xview_moveto(&self, fraction: f64) -> Result<()> {
        self.widget.call(
            &ReturnType::Nothing,
            vec![
                self.path().to_tcl_obj(),
                TclObj::from("xview"),
                TclObj::from("moveto"),
                fraction.to_tcl_obj(),
            ],
        )?;
        Ok(())
    }

    pub fn yview_moveto(&self, fraction: f64) -> Result<()> {
        self.widget.call(
            &ReturnType::Nothing,
            vec![
                self.path().to_tcl_obj(),
                TclObj::from("yview"),
                TclObj::from("moveto"),
                fraction.to_tcl_obj(),
            ],
        )?;
        Ok(())
    }

    /// The selected rows, in tree order.
    pub fn selection(&self) -> Result<Vec<TreeviewRow>> {
        let ids = self.widget.call(
            &ReturnType::list_of(ReturnType::Str),
            &[self.path(), "selection"],
        )?;
        Ok(ids
            .to_strings()
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.find_row(id))
            .collect())
    }

    /// The row with the given id, at any depth.
    pub fn find_row(&self, id: &str) -> Option<TreeviewRow> {
        self.rows.find(id)
    }
}

impl fmt::Debug for Treeview {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Treeview({:?})", self.widget)
    }
}

impl TkWidget for Treeview {
    const KIND: &'static str = "Treeview";

    fn widget(&self) -> &Widget {
        &self.widget
    }

    fn into_any(self) -> AnyWidget {
        AnyWidget::Treeview(self)
    }

    fn from_any(any: AnyWidget) -> Option<Self> {
        match any {
            AnyWidget::Treeview(treeview) => Some(treeview),
            _ => None,
        }
    }

    fn destroy(&self) -> Result<()> {
        self.columns.release();
        self.rows.detach_all();
        self.widget.destroy()
    }
}

impl Packable for Treeview {}

/// Options, columns and rows for a new [`Treeview`].
pub struct TreeviewBuilder {
    app: TkApp,
    parent_path: String,
    options: Vec<(String, TclObj)>,
    columns: Vec<TreeviewColumn>,
    rows: Vec<TreeviewRow>,
}

impl TreeviewBuilder {
    /// Any widget option except `columns`.
    pub fn option(mut self, option: &str, value: impl ToTclObj) -> Self {
        self.options.push((option.to_owned(), value.to_tcl_obj()));
        self
    }

    /// `extended`, `browse` or `none`.
    pub fn selectmode(self, mode: &str) -> Self {
        self.option("selectmode", mode)
    }

    /// Number of visible rows.
    pub fn height(self, rows: i64) -> Self {
        self.option("height", rows)
    }

    /// Any of `tree` and `headings`.
    pub fn show(self, parts: Vec<&str>) -> Self {
        self.option("show", parts)
    }

    pub fn column(mut self, column: TreeviewColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// A new column with the given heading text.
    pub fn column_text(self, text: &str) -> Self {
        let column = TreeviewColumn::new(&self.app).text(text);
        self.column(column)
    }

    pub fn row(mut self, row: TreeviewRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn row_values(self, values: impl ToTclObj) -> Self {
        let row = TreeviewRow::new(&self.app).values(values);
        self.row(row)
    }

    pub fn build(self) -> Result<Treeview> {
        let widget = Widget::create(
            &self.app,
            &self.parent_path,
            "ttk::treeview",
            "treeview",
            "Treeview",
            self.options,
        )?;

        let config = widget.config();
        config.set_types(vec![
            ("selectmode", ReturnType::Str),
            ("height", ReturnType::Int),
            ("show", ReturnType::list_of(ReturnType::Str)),
        ]);
        config.disable("columns", "use Treeview::columns() instead");

        let link = TreeLink {
            app: self.app.downgrade(),
            path: widget.path().to_owned(),
        };
        let treeview = Treeview {
            rows: TreeviewRowList::top_level(link.clone()),
            columns: TreeviewColumnList::new(link)?,
            widget,
        };

        for column in self.columns {
            treeview.columns.push(column)?;
        }
        for row in self.rows {
            treeview.rows.push(row)?;
        }

        self.app.registry().register(treeview.clone().into_any())?;
        Ok(treeview)
    }
}
