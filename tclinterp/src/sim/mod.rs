//! An in-process stand-in for Tcl/Tk.
//!
//! `SimTk` keeps the state Tk would keep (variables, the window tree, option values, treeview
//! items, menu entries, pack and wm bookkeeping, named fonts and event bindings) and answers the
//! commands the binding layer issues the way Tk answers them. Nothing is ever drawn.

mod entry;
mod font;
mod menu;
mod options;
mod treeview;

use std::{collections::HashMap, fmt};

use log::{trace, warn};
use parking_lot::Mutex;

use self::{
    entry::EntryState,
    font::Fonts,
    menu::MenuState,
    options::{
        OptionTable, BUTTON_OPTIONS, ENTRY_OPTIONS, FRAME_OPTIONS, LABEL_OPTIONS, MENU_OPTIONS,
        PACK_OPTIONS, TOPLEVEL_OPTIONS, TREEVIEW_OPTIONS,
    },
    treeview::TreeState,
};
use crate::{
    backend::{Backend, Invoke, Reply},
    error::{Result, TclError},
    list::{merge, quote_element, split_list},
};

const TK_VERSION: &str = "8.6";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetKind {
    Root,
    Toplevel,
    Frame,
    Label,
    Button,
    Entry,
    Treeview,
    Menu,
}

impl WidgetKind {
    fn from_command(command: &str) -> Option<Self> {
        match command {
            "toplevel" => Some(WidgetKind::Toplevel),
            "ttk::frame" => Some(WidgetKind::Frame),
            "ttk::label" => Some(WidgetKind::Label),
            "ttk::button" => Some(WidgetKind::Button),
            "ttk::entry" => Some(WidgetKind::Entry),
            "ttk::treeview" => Some(WidgetKind::Treeview),
            "menu" => Some(WidgetKind::Menu),
            _ => None,
        }
    }

    fn class(self) -> &'static str {
        match self {
            WidgetKind::Root => "Tk",
            WidgetKind::Toplevel => "Toplevel",
            WidgetKind::Frame => "TFrame",
            WidgetKind::Label => "TLabel",
            WidgetKind::Button => "TButton",
            WidgetKind::Entry => "TEntry",
            WidgetKind::Treeview => "Treeview",
            WidgetKind::Menu => "Menu",
        }
    }

    fn options(self) -> OptionTable {
        OptionTable::new(match self {
            WidgetKind::Root | WidgetKind::Toplevel => TOPLEVEL_OPTIONS,
            WidgetKind::Frame => FRAME_OPTIONS,
            WidgetKind::Label => LABEL_OPTIONS,
            WidgetKind::Button => BUTTON_OPTIONS,
            WidgetKind::Entry => ENTRY_OPTIONS,
            WidgetKind::Treeview => TREEVIEW_OPTIONS,
            WidgetKind::Menu => MENU_OPTIONS,
        })
    }

    fn is_toplevel(self) -> bool {
        matches!(self, WidgetKind::Root | WidgetKind::Toplevel)
    }

    fn subcommands(self) -> &'static str {
        match self {
            WidgetKind::Button => "cget, configure, or invoke",
            WidgetKind::Treeview => {
                "cget, children, column, configure, delete, exists, heading, index, insert, \
                 item, move, parent, selection, xview, or yview"
            }
            WidgetKind::Entry => "cget, configure, delete, get, icursor, index, or insert",
            WidgetKind::Menu => {
                "add, cget, configure, delete, entrycget, entryconfigure, index, insert, invoke, \
                 or type"
            }
            _ => "cget or configure",
        }
    }
}

#[derive(Debug)]
struct WmState {
    title: String,
    state: String,
    protocols: Vec<(String, String)>,
}

#[derive(Debug)]
struct Window {
    kind: WidgetKind,
    parent: Option<String>,
    children: Vec<String>,
    options: OptionTable,
    /// Master and pack options, if the window is packed.
    packed: Option<(String, OptionTable)>,
    slaves: Vec<String>,
    wm: Option<WmState>,
    tree: Option<TreeState>,
    menu: Option<MenuState>,
    entry: Option<EntryState>,
    /// Event sequences and their scripts, in the order they were first bound.
    bindings: Vec<(String, String)>,
}

impl Window {
    fn new(kind: WidgetKind, parent: Option<String>) -> Result<Self> {
        Ok(Self {
            kind,
            parent,
            children: Vec::new(),
            options: kind.options(),
            packed: None,
            slaves: Vec::new(),
            wm: if kind.is_toplevel() {
                Some(WmState {
                    title: "tk".to_owned(),
                    state: "normal".to_owned(),
                    protocols: Vec::new(),
                })
            } else {
                None
            },
            tree: if kind == WidgetKind::Treeview {
                Some(TreeState::new()?)
            } else {
                None
            },
            menu: if kind == WidgetKind::Menu {
                Some(MenuState::new())
            } else {
                None
            },
            entry: if kind == WidgetKind::Entry {
                Some(EntryState::new())
            } else {
                None
            },
            bindings: Vec::new(),
        })
    }
}

#[derive(Debug, Default)]
struct SimState {
    vars: HashMap<String, String>,
    windows: HashMap<String, Window>,
    fonts: Fonts,
    tk_loaded: bool,
}

fn bad_window(path: &str) -> TclError {
    TclError::new(format!("bad window path name \"{}\"", path))
}

fn parent_path(path: &str) -> Option<&str> {
    match path.rfind('.') {
        Some(0) if path.len() > 1 => Some("."),
        Some(i) if i > 0 => Some(&path[..i]),
        _ => None,
    }
}

/// The value of the last `-option value` pair for `option` in `args`.
fn find_option<'a>(args: &'a [String], option: &str) -> Option<&'a str> {
    args.chunks(2)
        .filter(|pair| pair.len() == 2 && pair[0] == option)
        .map(|pair| pair[1].as_str())
        .last()
}

fn format(args: &[String]) -> Result<String> {
    let (format, mut values) = match args {
        [format, values @ ..] => (format, values.iter()),
        _ => return Err(TclError::wrong_args("format formatString ?arg ...?")),
    };

    let mut out = String::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let spec = chars
            .next()
            .ok_or_else(|| TclError::new("format string ended in middle of field specifier"))?;
        if spec == '%' {
            out.push('%');
            continue;
        }

        let value = values
            .next()
            .ok_or_else(|| TclError::new("not enough arguments for all format specifiers"))?;
        match spec {
            's' => out.push_str(value),
            'd' => {
                let n = value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| TclError::expected("integer", value))?;
                out.push_str(&n.to_string());
            }
            other => {
                return Err(TclError::new(format!(
                    "bad field specifier \"{}\"",
                    other
                )))
            }
        }
    }
    Ok(out)
}

impl SimState {
    fn window(&self, path: &str) -> Result<&Window> {
        self.windows.get(path).ok_or_else(|| bad_window(path))
    }

    fn window_mut(&mut self, path: &str) -> Result<&mut Window> {
        self.windows.get_mut(path).ok_or_else(|| bad_window(path))
    }

    fn set(&mut self, args: &[String]) -> Result<String> {
        match args {
            [name] => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| TclError::new(format!("can't read \"{}\": no such variable", name))),
            [name, value] => {
                self.vars.insert(name.clone(), value.clone());
                Ok(value.clone())
            }
            _ => Err(TclError::wrong_args("set varName ?newValue?")),
        }
    }

    fn package(&mut self, args: &[String]) -> Result<String> {
        match args {
            [require, package] if require == "require" && package == "Tk" => {
                if !self.tk_loaded {
                    self.windows
                        .insert(".".to_owned(), Window::new(WidgetKind::Root, None)?);
                    self.tk_loaded = true;
                }
                Ok(TK_VERSION.to_owned())
            }
            [require, package] if require == "require" => Err(TclError::new(format!(
                "can't find package {}",
                package
            ))),
            _ => Err(TclError::wrong_args("package require package")),
        }
    }

    fn create_widget(&mut self, kind: WidgetKind, args: &[String]) -> Result<String> {
        let (path, options) = match args {
            [path, options @ ..] => (path, options),
            _ => return Err(TclError::wrong_args("widget pathName ?-option value ...?")),
        };

        let parent = parent_path(path).ok_or_else(|| bad_window(path))?;
        if path.ends_with('.') || path.contains("..") || !self.windows.contains_key(parent) {
            return Err(bad_window(path));
        }
        if self.windows.contains_key(path.as_str()) {
            let name = &path[path.rfind('.').map_or(0, |i| i + 1)..];
            return Err(TclError::new(format!(
                "window name \"{}\" already exists in parent",
                name
            )));
        }

        let mut window = Window::new(kind, Some(parent.to_owned()))?;
        window.options.set_pairs(options)?;
        if let Some(tree) = &mut window.tree {
            tree.set_columns(split_list(window.options.get("-columns")?)?)?;
        }

        self.window_mut(parent)?.children.push(path.clone());
        self.windows.insert(path.clone(), window);
        Ok(path.clone())
    }

    fn unpack(&mut self, path: &str) {
        let master = match self.windows.get_mut(path).and_then(|w| w.packed.take()) {
            Some((master, _)) => master,
            None => return,
        };
        if let Some(master) = self.windows.get_mut(&master) {
            master.slaves.retain(|slave| slave != path);
        }
    }

    fn destroy_window(&mut self, path: &str) {
        let children = match self.windows.get(path) {
            Some(window) => window.children.clone(),
            None => return,
        };
        for child in children {
            self.destroy_window(&child);
        }

        self.unpack(path);
        if let Some(window) = self.windows.remove(path) {
            for slave in window.slaves {
                if let Some(slave) = self.windows.get_mut(&slave) {
                    slave.packed = None;
                }
            }
            if let Some(parent) = window.parent.and_then(|p| self.windows.get_mut(&p)) {
                parent.children.retain(|child| child != path);
            }
        }
    }

    fn destroy(&mut self, args: &[String]) -> Result<String> {
        for path in args {
            self.destroy_window(path);
            if path == "." {
                self.windows.clear();
                self.tk_loaded = false;
            }
        }
        Ok(String::new())
    }

    fn winfo(&self, args: &[String]) -> Result<String> {
        let (option, path) = match args {
            [option, path] => (option.as_str(), path.as_str()),
            _ => return Err(TclError::wrong_args("winfo option ?arg ...?")),
        };

        match option {
            "exists" => Ok(if self.windows.contains_key(path) { "1" } else { "0" }.to_owned()),
            "children" => self.window(path).map(|window| merge(&window.children)),
            "class" => self.window(path).map(|window| window.kind.class().to_owned()),
            "toplevel" => {
                let mut path = path;
                loop {
                    let window = self.window(path)?;
                    match &window.parent {
                        Some(parent) if !window.kind.is_toplevel() => path = parent.as_str(),
                        _ => return Ok(path.to_owned()),
                    }
                }
            }
            other => Err(TclError::new(format!(
                "bad option \"{}\": must be children, class, exists, or toplevel",
                other
            ))),
        }
    }

    fn pack_configure(&mut self, args: &[String]) -> Result<String> {
        let split = args
            .iter()
            .position(|arg| !arg.starts_with('.'))
            .unwrap_or(args.len());
        let (slaves, options) = args.split_at(split);
        if slaves.is_empty() {
            return Err(TclError::wrong_args("pack configure slave ?slave ...? ?options?"));
        }

        let master = find_option(options, "-in").map(str::to_owned);
        let options = options
            .chunks(2)
            .filter(|pair| pair[0] != "-in")
            .flatten()
            .cloned()
            .collect::<Vec<_>>();

        for slave in slaves {
            let window = self.window(slave)?;
            if window.kind.is_toplevel() {
                return Err(TclError::new(format!(
                    "can't pack \"{}\": it's a top-level window",
                    slave
                )));
            }

            let master = match &master {
                Some(master) => master.clone(),
                None => window.parent.clone().ok_or_else(|| bad_window(slave))?,
            };
            self.window(&master)?;

            let mut table = match &window.packed {
                Some((old_master, table)) if *old_master == master => table.clone(),
                _ => OptionTable::new(PACK_OPTIONS),
            };
            table.set_pairs(&options)?;

            let already_there = matches!(&window.packed, Some((old, _)) if *old == master);
            if !already_there {
                self.unpack(slave);
                self.window_mut(&master)?.slaves.push(slave.clone());
            }
            self.window_mut(slave)?.packed = Some((master, table));
        }
        Ok(String::new())
    }

    fn pack(&mut self, args: &[String]) -> Result<String> {
        match args {
            [first, ..] if first.starts_with('.') => self.pack_configure(args),
            [command, rest @ ..] if command == "configure" => self.pack_configure(rest),
            [command, rest @ ..] if command == "forget" => {
                for slave in rest {
                    self.unpack(slave);
                }
                Ok(String::new())
            }
            [command, master] if command == "slaves" => {
                self.window(master).map(|window| merge(&window.slaves))
            }
            [command, slave] if command == "info" => match &self.window(slave)?.packed {
                Some((master, table)) => {
                    let mut info = vec!["-in".to_owned(), master.clone()];
                    info.extend(split_list(&table.flat())?);
                    Ok(merge(info))
                }
                None => Err(TclError::new(format!("window \"{}\" isn't packed", slave))),
            },
            _ => Err(TclError::wrong_args("pack option arg ?arg ...?")),
        }
    }

    fn wm(&mut self, args: &[String]) -> Result<String> {
        let (option, path, rest) = match args {
            [option, path, rest @ ..] => (option.as_str(), path, rest),
            _ => return Err(TclError::wrong_args("wm option window ?arg ...?")),
        };

        let wm = self
            .window_mut(path)?
            .wm
            .as_mut()
            .ok_or_else(|| TclError::new(format!("window \"{}\" isn't a top-level window", path)))?;

        match (option, rest) {
            ("title", []) => Ok(wm.title.clone()),
            ("title", [title]) => {
                wm.title = title.clone();
                Ok(String::new())
            }
            ("state", []) => Ok(wm.state.clone()),
            ("state", [state]) => match state.as_str() {
                "normal" | "iconic" | "withdrawn" | "zoomed" => {
                    wm.state = state.clone();
                    Ok(String::new())
                }
                _ => Err(TclError::new(format!(
                    "bad argument \"{}\": must be normal, iconic, withdrawn, or zoomed",
                    state
                ))),
            },
            ("withdraw", []) => {
                wm.state = "withdrawn".to_owned();
                Ok(String::new())
            }
            ("deiconify", []) => {
                wm.state = "normal".to_owned();
                Ok(String::new())
            }
            ("protocol", []) => Ok(merge(wm.protocols.iter().map(|(name, _)| name))),
            ("protocol", [name]) => Ok(wm
                .protocols
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, command)| command.clone())
                .unwrap_or_default()),
            ("protocol", [name, command]) => {
                wm.protocols.retain(|(n, _)| n != name);
                if !command.is_empty() {
                    wm.protocols.push((name.clone(), command.clone()));
                }
                Ok(String::new())
            }
            (option, _) => Err(TclError::new(format!(
                "bad option \"{}\": must be deiconify, protocol, state, title, or withdraw",
                option
            ))),
        }
    }

    fn widget_command(&mut self, path: &str, args: &[String]) -> Result<Reply> {
        let (subcommand, rest) = match args {
            [subcommand, rest @ ..] => (subcommand.as_str(), rest),
            _ => return Err(TclError::wrong_args(&format!("{} option ?arg ...?", path))),
        };
        let window = self.window_mut(path)?;
        let kind = window.kind;

        match (kind, subcommand, rest) {
            (_, "cget", [option]) => window.options.get(option).map(Reply::from),
            (_, "cget", _) => Err(TclError::wrong_args(&format!("{} cget option", path))),

            (_, "configure", _) => {
                let new_columns = match (&window.tree, find_option(rest, "-columns")) {
                    (Some(_), Some(columns)) if rest.len() > 1 => Some(split_list(columns)?),
                    _ => None,
                };

                let reply = window.options.configure(rest)?;
                if let (Some(tree), Some(columns)) = (&mut window.tree, new_columns) {
                    tree.set_columns(columns)?;
                }
                Ok(Reply::from(reply))
            }

            (WidgetKind::Button, "invoke", []) => {
                if window.options.get("-state")? == "disabled" {
                    return Ok(Reply::empty());
                }
                let command = split_list(window.options.get("-command")?)?;
                if command.is_empty() {
                    Ok(Reply::empty())
                } else {
                    Ok(Reply::Eval(command))
                }
            }

            (WidgetKind::Menu, _, _) => {
                let handled = window
                    .menu
                    .as_mut()
                    .and_then(|menu| menu.command(subcommand, rest));
                handled.unwrap_or_else(|| {
                    Err(TclError::new(format!(
                        "bad option \"{}\": must be {}",
                        subcommand,
                        kind.subcommands()
                    )))
                })
            }

            _ => {
                let handled = match (&mut window.tree, &mut window.entry) {
                    (Some(tree), _) => tree.command(subcommand, rest),
                    (_, Some(entry)) => entry.command(subcommand, rest),
                    _ => None,
                };
                match handled {
                    Some(result) => result.map(Reply::from),
                    None => Err(TclError::new(format!(
                        "bad command \"{}\": must be {}",
                        subcommand,
                        kind.subcommands()
                    ))),
                }
            }
        }
    }
}

/// Replace `%W`-style fields in a binding script. Unknown fields are left alone.
fn substitute(script: &str, fields: &[(char, &str)]) -> String {
    let mut out = String::new();
    let mut chars = script.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(field) => match fields.iter().find(|(name, _)| *name == field) {
                Some((_, value)) => out.push_str(&quote_element(value)),
                None => {
                    out.push('%');
                    out.push(field);
                }
            },
            None => out.push('%'),
        }
    }
    out
}

fn check_sequence(sequence: &str) -> Result<()> {
    let is_pattern = sequence.len() > 2 && sequence.starts_with('<') && sequence.ends_with('>');
    if is_pattern || sequence.chars().count() == 1 {
        Ok(())
    } else {
        Err(TclError::new(format!(
            "bad event type or keysym \"{}\"",
            sequence.trim_matches(|c: char| c == '<' || c == '>')
        )))
    }
}

impl SimState {
    fn bind(&mut self, args: &[String]) -> Result<String> {
        match args {
            [path] => self
                .window(path)
                .map(|window| merge(window.bindings.iter().map(|(sequence, _)| sequence))),
            [path, sequence] => {
                check_sequence(sequence)?;
                Ok(self
                    .window(path)?
                    .bindings
                    .iter()
                    .find(|(s, _)| s == sequence)
                    .map(|(_, script)| script.clone())
                    .unwrap_or_default())
            }
            [path, sequence, script] => {
                check_sequence(sequence)?;
                let bindings = &mut self.window_mut(path)?.bindings;
                if script.is_empty() {
                    bindings.retain(|(s, _)| s != sequence);
                    return Ok(String::new());
                }

                let existing = bindings.iter_mut().find(|(s, _)| s == sequence);
                match (existing, script.strip_prefix('+')) {
                    (Some((_, old)), Some(more)) => {
                        old.push('\n');
                        old.push_str(more);
                    }
                    (Some((_, old)), None) => *old = script.clone(),
                    (None, more) => {
                        bindings.push((sequence.clone(), more.unwrap_or(script.as_str()).to_owned()))
                    }
                }
                Ok(String::new())
            }
            _ => Err(TclError::wrong_args("bind window ?pattern? ?command?")),
        }
    }

    /// The commands `event generate` has to run, one per line of the matching binding script.
    fn generate_event(&self, args: &[String]) -> Result<Vec<Vec<String>>> {
        let (path, sequence, options) = match args {
            [generate, path, sequence, options @ ..] if generate == "generate" => {
                (path, sequence, options)
            }
            _ => return Err(TclError::wrong_args("event generate window event ?-option value ...?")),
        };
        if !self.tk_loaded {
            return Err(TclError::new("invalid command name \"event\""));
        }
        check_sequence(sequence)?;
        if options.len() % 2 != 0 {
            return Err(TclError::new(format!(
                "value for \"{}\" missing",
                options[options.len() - 1]
            )));
        }

        let window = self.window(path)?;
        let script = match window.bindings.iter().find(|(s, _)| s == sequence) {
            Some((_, script)) => script,
            None => return Ok(Vec::new()),
        };

        let fields = [
            ('W', path.as_str()),
            ('x', find_option(options, "-x").unwrap_or("0")),
            ('y', find_option(options, "-y").unwrap_or("0")),
            ('K', find_option(options, "-keysym").unwrap_or("??")),
        ];
        script
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| split_list(&substitute(line, &fields)))
            .collect()
    }

    fn call(&mut self, argv: &[String]) -> Result<Reply> {
        let (command, args) = match argv {
            [command, args @ ..] => (command.as_str(), args),
            [] => return Err(TclError::new("can not call an empty command")),
        };

        let value = match command {
            "set" => self.set(args)?,
            "list" => merge(args),
            "format" => format(args)?,
            "return" => match args {
                [] => String::new(),
                [value] => value.clone(),
                _ => return Err(TclError::wrong_args("return ?value?")),
            },
            "package" => self.package(args)?,

            _ if !self.tk_loaded => {
                return Err(TclError::new(format!(
                    "invalid command name \"{}\"",
                    command
                )))
            }

            "destroy" => self.destroy(args)?,
            "winfo" => self.winfo(args)?,
            "pack" => self.pack(args)?,
            "wm" => self.wm(args)?,
            "bind" => self.bind(args)?,
            "font" => self.fonts.command(args)?,
            _ => {
                if let Some(kind) = WidgetKind::from_command(command) {
                    self.create_widget(kind, args)?
                } else if self.windows.contains_key(command) {
                    return self.widget_command(command, args);
                } else {
                    return Err(TclError::new(format!(
                        "invalid command name \"{}\"",
                        command
                    )));
                }
            }
        };
        Ok(Reply::Value(value))
    }
}

/// The simulated interpreter. See the module documentation.
#[derive(Default)]
pub struct SimTk {
    state: Mutex<SimState>,
    commands: Mutex<HashMap<String, Invoke>>,
}

impl SimTk {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for SimTk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SimTk")
            .field("state", &*self.state.lock())
            .field("commands", &self.commands.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Backend for SimTk {
    fn call(&self, argv: &[String]) -> Result<Reply> {
        trace!("SimTk: {:?}", argv);

        // Commands run unlocked, they may call back into the interpreter.
        let command = argv
            .first()
            .and_then(|name| self.commands.lock().get(name).cloned());
        if let Some(invoke) = command {
            return invoke(&argv[1..]).map(Reply::Value).map_err(TclError::new);
        }

        if argv.first().map(String::as_str) == Some("event") {
            let bound = self.state.lock().generate_event(&argv[1..])?;
            for command in bound {
                // Tk reports errors in bindings as background errors.
                if let Err(err) = self.call(&command) {
                    warn!("error in binding for {}: {}", argv[2], err.message());
                }
            }
            return Ok(Reply::empty());
        }

        self.state.lock().call(argv)
    }

    fn create_command(&self, name: &str, invoke: Invoke) -> Result<()> {
        self.commands.lock().insert(name.to_owned(), invoke);
        Ok(())
    }

    fn delete_command(&self, name: &str) -> Result<()> {
        match self.commands.lock().remove(name) {
            Some(_) => Ok(()),
            None => Err(TclError::new(format!(
                "can't delete \"{}\": command doesn't exist",
                name
            ))),
        }
    }

    fn delete(&self) {
        self.commands.lock().clear();
    }
}
