use std::fmt;

use tclinterp::{ReturnType, TclObj, TclValue, ToTclObj};

use super::{AnyWidget, Packable, TkWidget, Widget};
use crate::{callback::Callback, error::Result};

macro_rules! widget_kind {
    ($ty:ident, $kind:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}({:?})", $kind, self.0)
            }
        }

        impl TkWidget for $ty {
            const KIND: &'static str = $kind;

            fn widget(&self) -> &Widget {
                &self.0
            }

            fn into_any(self) -> AnyWidget {
                AnyWidget::$ty(self)
            }

            fn from_any(any: AnyWidget) -> Option<Self> {
                match any {
                    AnyWidget::$ty(widget) => Some(widget),
                    _ => None,
                }
            }
        }

        impl Packable for $ty {}
    };
}

fn register<W: TkWidget>(widget: W) -> Result<W> {
    widget.app()?.registry().register(widget.clone().into_any())?;
    Ok(widget)
}

/// `ttk::frame`, a container for other widgets.
#[derive(Clone)]
pub struct Frame(Widget);

impl Frame {
    pub fn new(parent: &impl TkWidget) -> Result<Self> {
        let widget = Widget::create(
            &parent.app()?,
            parent.path(),
            "ttk::frame",
            "frame",
            "TFrame",
            Vec::new(),
        )?;
        register(Self(widget))
    }
}

widget_kind!(Frame, "Frame");

/// `ttk::label`.
#[derive(Clone)]
pub struct Label(Widget);

impl Label {
    pub fn new(parent: &impl TkWidget, text: &str) -> Result<Self> {
        let widget = Widget::create(
            &parent.app()?,
            parent.path(),
            "ttk::label",
            "label",
            "TLabel",
            vec![("text".to_owned(), TclObj::from(text))],
        )?;
        register(Self(widget))
    }
}

widget_kind!(Label, "Label");

/// `ttk::button`. Its `command` option is a callback option.
#[derive(Clone)]
pub struct Button(Widget);

impl Button {
    pub fn new(parent: &impl TkWidget, text: &str) -> Result<Self> {
        let widget = Widget::create(
            &parent.app()?,
            parent.path(),
            "ttk::button",
            "button",
            "TButton",
            vec![("text".to_owned(), TclObj::from(text))],
        )?;
        widget
            .config()
            .add_special("command", &widget.app()?, widget.commands());
        register(Self(widget))
    }

    /// Runs when the button is clicked.
    pub fn on_click(&self) -> Result<Callback> {
        self.0.config().callback("command")
    }

    /// Click the button programmatically. Does nothing if it's disabled.
    pub fn invoke(&self) -> Result<()> {
        self.0
            .call(&ReturnType::Nothing, &[self.path(), "invoke"])?;
        Ok(())
    }
}

widget_kind!(Button, "Button");

/// `ttk::entry`, a single line of editable text.
#[derive(Clone)]
pub struct Entry(Widget);

impl Entry {
    pub fn new(parent: &impl TkWidget) -> Result<Self> {
        let widget = Widget::create(
            &parent.app()?,
            parent.path(),
            "ttk::entry",
            "entry",
            "TEntry",
            Vec::new(),
        )?;
        widget.config().set_types([
            ("width", ReturnType::Int),
            ("exportselection", ReturnType::Bool),
        ]);
        register(Self(widget))
    }

    pub fn text(&self) -> Result<String> {
        let text = self.0.call(&ReturnType::Str, &[self.path(), "get"])?;
        Ok(text.as_str().unwrap_or_default().to_owned())
    }

    /// Replace the whole text. Both edits happen on the main thread without anything in between.
    pub fn set_text(&self, text: &str) -> Result<()> {
        let widget = self.0.clone();
        let text = text.to_owned();
        self.app()?.needs_main_thread(move || {
            widget.call(&ReturnType::Nothing, &[widget.path(), "delete", "0", "end"])?;
            widget.call(&ReturnType::Nothing, &[widget.path(), "insert", "0", text.as_str()])?;
            Ok(())
        })
    }

    /// Where the insertion cursor is, in characters from the start.
    pub fn cursor_pos(&self) -> Result<usize> {
        match self.0.call(&ReturnType::Int, &[self.path(), "index", "insert"])? {
            TclValue::Int(pos) => Ok(pos.max(0) as usize),
            _ => Ok(0),
        }
    }

    pub fn set_cursor_pos(&self, pos: usize) -> Result<()> {
        self.0.call(
            &ReturnType::Nothing,
            vec![TclObj::from(self.path()), TclObj::from("icursor"), pos.to_tcl_obj()],
        )?;
        Ok(())
    }
}

widget_kind!(Entry, "Entry");
