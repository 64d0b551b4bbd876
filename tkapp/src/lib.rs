//! Typed Tk widgets on top of `tclinterp`.
//!
//! Options are read and written through [`ConfigDict`]s, callbacks are [`Callback`]s, and a
//! [`Treeview`]'s rows and columns and a [`Menu`]'s items are lists that stay in sync with Tk.

#![deny(unused_imports, unused_must_use)]

mod app;
mod callback;
pub mod config;
mod error;
mod font;
mod registry;
#[cfg(test)]
mod testing;
pub mod widgets;

pub use crate::app::TkApp;
pub use crate::callback::Callback;
pub use crate::config::{
    ConfigDict, DirectConfigDict, FallbackConfigDict, MultiHandlerConfigDict, OptionHandler,
};
pub use crate::error::{Error, Result};
pub use crate::font::{Font, FontDescription, FontMetrics, NamedFont};
pub use crate::registry::Registry;
pub use crate::widgets::{
    treeview::{
        TreeviewColumn, TreeviewColumnHeading, TreeviewColumnList, TreeviewRow, TreeviewRowList,
    },
    AnyWidget, Button, Entry, Frame, Label, Menu, MenuItem, Packable, TkWidget, Treeview, Widget,
    Window, WindowManaged,
};

pub use tclinterp::{ReturnType, TclError, TclValue, ToTclObj};

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn test_small_app() {
        let app = TkApp::simulated().unwrap();
        let window = Window::new(&app).unwrap();
        window.set_title("Files").unwrap();

        let treeview = Treeview::builder(&window)
            .unwrap()
            .column_text("Name")
            .row_values(vec!["b"])
            .row_values(vec!["a"])
            .build()
            .unwrap();
        treeview.pack().unwrap();

        let sorted = Arc::new(AtomicUsize::new(0));
        let button = Button::new(&window, "Sort").unwrap();
        {
            let treeview = treeview.clone();
            let sorted = sorted.clone();
            button.on_click().unwrap().connect(move |_| {
                if treeview.rows().sort(1, false).is_ok() {
                    sorted.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
        button.pack_with([("side", "bottom")]).unwrap();

        button.invoke().unwrap();
        assert_eq!(sorted.load(Ordering::SeqCst), 1);
        let first = treeview.rows().get(0).unwrap();
        assert_eq!(
            first.config().get("values").unwrap(),
            TclValue::from(vec!["a"])
        );

        let slaves = window.widget().pack_slaves().unwrap();
        assert_eq!(slaves.len(), 2);
        assert_eq!(slaves[0].kind(), "Treeview");
        assert_eq!(slaves[1].kind(), "Button");

        app.delete().unwrap();
        assert!(app.registry().is_empty());
    }
}
