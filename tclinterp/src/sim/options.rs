//! Option tables of the simulated widgets, items, columns and headings.

use crate::{
    error::{Result, TclError},
    list::{merge, parse_boolean},
};

pub const ANCHORS: &[&str] = &["n", "ne", "e", "se", "s", "sw", "w", "nw", "center"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Str,
    Int,
    Bool,
    Anchor,
    OneOf(&'static [&'static str]),
    ReadOnly,
}

impl OptionKind {
    /// Validate `value` and bring it to the form `cget` reports.
    fn normalize(self, name: &str, value: &str) -> Result<String> {
        match self {
            OptionKind::Str => Ok(value.to_owned()),
            OptionKind::Int => value
                .trim()
                .parse::<i64>()
                .map(|n| n.to_string())
                .map_err(|_| TclError::expected("integer", value)),
            OptionKind::Bool => parse_boolean(value).map(|b| if b { "1" } else { "0" }.to_owned()),
            OptionKind::Anchor if ANCHORS.contains(&value) => Ok(value.to_owned()),
            OptionKind::Anchor => Err(TclError::new(format!(
                "bad anchor \"{}\": must be n, ne, e, se, s, sw, w, nw, or center",
                value
            ))),
            OptionKind::OneOf(choices) if choices.contains(&value) => Ok(value.to_owned()),
            OptionKind::OneOf(choices) => Err(TclError::new(format!(
                "bad {} \"{}\": must be {}",
                name,
                value,
                choices.join(", ")
            ))),
            OptionKind::ReadOnly => Err(TclError::new("Attempt to change read-only option")),
        }
    }
}

#[derive(Debug)]
pub struct OptionSpec {
    pub name: &'static str,
    pub db_name: &'static str,
    pub db_class: &'static str,
    pub default: &'static str,
    pub kind: OptionKind,
}

const fn opt(
    name: &'static str,
    db_name: &'static str,
    db_class: &'static str,
    default: &'static str,
    kind: OptionKind,
) -> OptionSpec {
    OptionSpec {
        name,
        db_name,
        db_class,
        default,
        kind,
    }
}

use OptionKind::*;

pub static TOPLEVEL_OPTIONS: &[OptionSpec] = &[
    opt("background", "background", "Background", "#d9d9d9", Str),
    opt("borderwidth", "borderWidth", "BorderWidth", "0", Int),
    opt("height", "height", "Height", "0", Int),
    opt("menu", "menu", "Menu", "", Str),
    opt("relief", "relief", "Relief", "flat", Str),
    opt("width", "width", "Width", "0", Int),
];

pub static FRAME_OPTIONS: &[OptionSpec] = &[
    opt("borderwidth", "borderWidth", "BorderWidth", "", Int),
    opt("cursor", "cursor", "Cursor", "", Str),
    opt("height", "height", "Height", "0", Int),
    opt("padding", "padding", "Pad", "", Str),
    opt("relief", "relief", "Relief", "", Str),
    opt("style", "style", "Style", "", Str),
    opt("takefocus", "takeFocus", "TakeFocus", "", Str),
    opt("width", "width", "Width", "0", Int),
];

pub static LABEL_OPTIONS: &[OptionSpec] = &[
    opt("anchor", "anchor", "Anchor", "", Anchor),
    opt("background", "frameColor", "FrameColor", "", Str),
    opt("compound", "compound", "Compound", "", Str),
    opt("cursor", "cursor", "Cursor", "", Str),
    opt("font", "font", "Font", "", Str),
    opt("foreground", "textColor", "TextColor", "", Str),
    opt("image", "image", "Image", "", Str),
    opt("justify", "justify", "Justify", "", Str),
    opt("padding", "padding", "Pad", "", Str),
    opt("relief", "relief", "Relief", "", Str),
    opt("style", "style", "Style", "", Str),
    opt("takefocus", "takeFocus", "TakeFocus", "", Str),
    opt("text", "text", "Text", "", Str),
    opt("textvariable", "textVariable", "Variable", "", Str),
    opt("underline", "underline", "Underline", "-1", Int),
    opt("width", "width", "Width", "", Int),
    opt("wraplength", "wrapLength", "WrapLength", "", Str),
];

pub static BUTTON_OPTIONS: &[OptionSpec] = &[
    opt("command", "command", "Command", "", Str),
    opt("compound", "compound", "Compound", "", Str),
    opt("cursor", "cursor", "Cursor", "", Str),
    opt(
        "default",
        "default",
        "Default",
        "normal",
        OneOf(&["normal", "active", "disabled"]),
    ),
    opt("image", "image", "Image", "", Str),
    opt("padding", "padding", "Pad", "", Str),
    opt("state", "state", "State", "normal", Str),
    opt("style", "style", "Style", "", Str),
    opt("takefocus", "takeFocus", "TakeFocus", "ttk::takefocus", Str),
    opt("text", "text", "Text", "", Str),
    opt("textvariable", "textVariable", "Variable", "", Str),
    opt("underline", "underline", "Underline", "-1", Int),
    opt("width", "width", "Width", "", Int),
];

pub static TREEVIEW_OPTIONS: &[OptionSpec] = &[
    opt("columns", "columns", "Columns", "", Str),
    opt("cursor", "cursor", "Cursor", "", Str),
    opt("displaycolumns", "displayColumns", "DisplayColumns", "#all", Str),
    opt("height", "height", "Height", "10", Int),
    opt("padding", "padding", "Pad", "", Str),
    opt(
        "selectmode",
        "selectMode",
        "SelectMode",
        "extended",
        OneOf(&["extended", "browse", "none"]),
    ),
    opt("show", "show", "Show", "tree headings", Str),
    opt("style", "style", "Style", "", Str),
    opt("takefocus", "takeFocus", "TakeFocus", "ttk::takefocus", Str),
    opt("xscrollcommand", "xScrollCommand", "ScrollCommand", "", Str),
    opt("yscrollcommand", "yScrollCommand", "ScrollCommand", "", Str),
];

pub static ENTRY_OPTIONS: &[OptionSpec] = &[
    opt("cursor", "cursor", "Cursor", "xterm", Str),
    opt("exportselection", "exportSelection", "ExportSelection", "1", Bool),
    opt("font", "font", "Font", "TkTextFont", Str),
    opt("foreground", "textColor", "TextColor", "", Str),
    opt("invalidcommand", "invalidCommand", "InvalidCommand", "", Str),
    opt(
        "justify",
        "justify",
        "Justify",
        "left",
        OneOf(&["left", "center", "right"]),
    ),
    opt("show", "show", "Show", "", Str),
    opt("state", "state", "State", "normal", Str),
    opt("style", "style", "Style", "", Str),
    opt("takefocus", "takeFocus", "TakeFocus", "ttk::takefocus", Str),
    opt("textvariable", "textVariable", "Variable", "", Str),
    opt("validate", "validate", "Validate", "none", Str),
    opt("validatecommand", "validateCommand", "ValidateCommand", "", Str),
    opt("width", "width", "Width", "20", Int),
    opt("xscrollcommand", "xScrollCommand", "ScrollCommand", "", Str),
];

pub static MENU_OPTIONS: &[OptionSpec] = &[
    opt("activebackground", "activeBackground", "Foreground", "#ececec", Str),
    opt("activeforeground", "activeForeground", "Background", "#000000", Str),
    opt("background", "background", "Background", "#d9d9d9", Str),
    opt("borderwidth", "borderWidth", "BorderWidth", "1", Int),
    opt("cursor", "cursor", "Cursor", "arrow", Str),
    opt("font", "font", "Font", "TkMenuFont", Str),
    opt("foreground", "foreground", "Foreground", "#000000", Str),
    opt("postcommand", "postCommand", "Command", "", Str),
    opt("relief", "relief", "Relief", "raised", Str),
    opt("tearoff", "tearOff", "TearOff", "1", Bool),
    opt("title", "title", "Title", "", Str),
    opt(
        "type",
        "type",
        "Type",
        "normal",
        OneOf(&["menubar", "normal", "tearoff"]),
    ),
];

macro_rules! menu_entry_options {
    ($($extra:expr),* $(,)?) => {
        &[
            opt("activebackground", "", "", "", Str),
            opt("activeforeground", "", "", "", Str),
            opt("accelerator", "", "", "", Str),
            opt("background", "", "", "", Str),
            opt("bitmap", "", "", "", Str),
            opt("columnbreak", "", "", "0", Bool),
            opt("command", "", "", "", Str),
            opt("compound", "", "", "none", Str),
            opt("font", "", "", "", Str),
            opt("foreground", "", "", "", Str),
            opt("hidemargin", "", "", "0", Bool),
            opt("image", "", "", "", Str),
            opt("label", "", "", "", Str),
            opt(
                "state",
                "",
                "",
                "normal",
                OneOf(&["active", "normal", "disabled"]),
            ),
            opt("underline", "", "", "-1", Int),
            $($extra,)*
        ]
    };
}

pub static COMMAND_ENTRY_OPTIONS: &[OptionSpec] = menu_entry_options!();

pub static CHECKBUTTON_ENTRY_OPTIONS: &[OptionSpec] = menu_entry_options!(
    opt("indicatoron", "", "", "1", Bool),
    opt("offvalue", "", "", "0", Str),
    opt("onvalue", "", "", "1", Str),
    opt("selectcolor", "", "", "", Str),
    opt("selectimage", "", "", "", Str),
    opt("variable", "", "", "", Str),
);

pub static RADIOBUTTON_ENTRY_OPTIONS: &[OptionSpec] = menu_entry_options!(
    opt("indicatoron", "", "", "1", Bool),
    opt("selectcolor", "", "", "", Str),
    opt("selectimage", "", "", "", Str),
    opt("value", "", "", "", Str),
    opt("variable", "", "", "selectedButton", Str),
);

pub static CASCADE_ENTRY_OPTIONS: &[OptionSpec] =
    menu_entry_options!(opt("menu", "", "", "", Str));

pub static SEPARATOR_ENTRY_OPTIONS: &[OptionSpec] = &[opt("background", "", "", "", Str)];

pub static ITEM_OPTIONS: &[OptionSpec] = &[
    opt("text", "text", "Text", "", Str),
    opt("image", "image", "Image", "", Str),
    opt("values", "values", "Values", "", Str),
    opt("open", "open", "Open", "0", Bool),
    opt("tags", "tags", "Tags", "", Str),
];

pub static COLUMN_OPTIONS: &[OptionSpec] = &[
    opt("width", "width", "Width", "200", Int),
    opt("minwidth", "minWidth", "MinWidth", "20", Int),
    opt("stretch", "stretch", "Stretch", "1", Bool),
    opt("anchor", "anchor", "Anchor", "w", Anchor),
    opt("id", "id", "ID", "", ReadOnly),
];

pub static HEADING_OPTIONS: &[OptionSpec] = &[
    opt("text", "text", "Text", "", Str),
    opt("image", "image", "Image", "", Str),
    opt("anchor", "anchor", "Anchor", "center", Anchor),
    opt("command", "command", "Command", "", Str),
];

pub static PACK_OPTIONS: &[OptionSpec] = &[
    opt("anchor", "", "", "center", Anchor),
    opt("expand", "", "", "0", Bool),
    opt("fill", "", "", "none", OneOf(&["none", "x", "y", "both"])),
    opt("ipadx", "", "", "0", Int),
    opt("ipady", "", "", "0", Int),
    opt("padx", "", "", "0", Int),
    opt("pady", "", "", "0", Int),
    opt("side", "", "", "top", OneOf(&["top", "bottom", "left", "right"])),
];

/// Current values of one set of options, in declaration order.
#[derive(Debug, Clone)]
pub struct OptionTable {
    specs: &'static [OptionSpec],
    values: Vec<String>,
}

impl OptionTable {
    pub fn new(specs: &'static [OptionSpec]) -> Self {
        Self {
            specs,
            values: specs.iter().map(|spec| spec.default.to_owned()).collect(),
        }
    }

    fn position(&self, option: &str) -> Result<usize> {
        option
            .strip_prefix('-')
            .and_then(|name| self.specs.iter().position(|spec| spec.name == name))
            .ok_or_else(|| TclError::unknown_option(option))
    }

    pub fn get(&self, option: &str) -> Result<&str> {
        let i = self.position(option)?;
        Ok(&self.values[i])
    }

    pub fn set(&mut self, option: &str, value: &str) -> Result<()> {
        let i = self.position(option)?;
        let spec = &self.specs[i];

        self.values[i] = if value.is_empty() && spec.default.is_empty() && spec.kind != ReadOnly {
            String::new()
        } else {
            spec.kind.normalize(spec.name, value)?
        };
        Ok(())
    }

    /// Set an option without validation, for values only the simulator itself may change.
    pub fn force(&mut self, option: &str, value: &str) -> Result<()> {
        let i = self.position(option)?;
        self.values[i] = value.to_owned();
        Ok(())
    }

    /// Apply `-option value` pairs. Either all of them are applied or none is.
    pub fn set_pairs(&mut self, args: &[String]) -> Result<()> {
        if args.len() % 2 != 0 {
            return Err(TclError::new(format!(
                "value for \"{}\" missing",
                args[args.len() - 1]
            )));
        }

        let mut staged = self.clone();
        for pair in args.chunks(2) {
            staged.set(&pair[0], &pair[1])?;
        }
        *self = staged;
        Ok(())
    }

    fn describe_at(&self, i: usize) -> String {
        let spec = &self.specs[i];
        merge(&[
            format!("-{}", spec.name),
            spec.db_name.to_owned(),
            spec.db_class.to_owned(),
            spec.default.to_owned(),
            self.values[i].clone(),
        ])
    }

    /// The flat `-option value ...` list item-like commands report.
    pub fn flat(&self) -> String {
        merge(
            self.specs
                .iter()
                .zip(&self.values)
                .flat_map(|(spec, value)| vec![format!("-{}", spec.name), value.clone()]),
        )
    }

    /// `configure` as widgets implement it.
    pub fn configure(&mut self, args: &[String]) -> Result<String> {
        match args {
            [] => Ok(merge(
                (0..self.specs.len()).map(|i| self.describe_at(i)),
            )),
            [option] => {
                let i = self.position(option)?;
                Ok(self.describe_at(i))
            }
            _ => self.set_pairs(args).map(|()| String::new()),
        }
    }

    /// The query/set convention of `item`, `column` and `heading`.
    pub fn query(&mut self, args: &[String]) -> Result<String> {
        match args {
            [] => Ok(self.flat()),
            [option] => self.get(option).map(str::to_owned),
            _ => self.set_pairs(args).map(|()| String::new()),
        }
    }
}
