//! Entries of a simulated `menu`.

use super::options::{
    OptionSpec, OptionTable, CASCADE_ENTRY_OPTIONS, CHECKBUTTON_ENTRY_OPTIONS,
    COMMAND_ENTRY_OPTIONS, RADIOBUTTON_ENTRY_OPTIONS, SEPARATOR_ENTRY_OPTIONS,
};
use crate::{
    backend::Reply,
    error::{Result, TclError},
    list::split_list,
};

fn entry_type(name: &str) -> Result<(&'static str, &'static [OptionSpec])> {
    match name {
        "cascade" => Ok(("cascade", CASCADE_ENTRY_OPTIONS)),
        "checkbutton" => Ok(("checkbutton", CHECKBUTTON_ENTRY_OPTIONS)),
        "command" => Ok(("command", COMMAND_ENTRY_OPTIONS)),
        "radiobutton" => Ok(("radiobutton", RADIOBUTTON_ENTRY_OPTIONS)),
        "separator" => Ok(("separator", SEPARATOR_ENTRY_OPTIONS)),
        other => Err(TclError::new(format!(
            "bad menu entry type \"{}\": must be cascade, checkbutton, command, radiobutton, or \
             separator",
            other
        ))),
    }
}

#[derive(Debug)]
struct MenuEntry {
    kind: &'static str,
    options: OptionTable,
}

#[derive(Debug, Default)]
pub struct MenuState {
    entries: Vec<MenuEntry>,
}

impl MenuState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a menu index. `None` means "no entry", which most subcommands treat as a no-op.
    fn index(&self, index: &str) -> Result<Option<usize>> {
        match index {
            "end" | "last" => Ok(self.entries.len().checked_sub(1)),
            "none" | "" => Ok(None),
            _ => match index.trim().parse::<i64>() {
                Ok(n) if n < 0 => Ok(None),
                Ok(n) => Ok(Some((n as usize).min(self.entries.len().saturating_sub(1)))
                    .filter(|_| !self.entries.is_empty())),
                Err(_) => Err(TclError::new(format!("bad menu entry index \"{}\"", index))),
            },
        }
    }

    fn insert_index(&self, index: &str) -> Result<usize> {
        match index {
            "end" | "last" => Ok(self.entries.len()),
            _ => match index.trim().parse::<i64>() {
                Ok(n) => Ok(n.clamp(0, self.entries.len() as i64) as usize),
                Err(_) => Err(TclError::new(format!("bad menu entry index \"{}\"", index))),
            },
        }
    }

    fn entry(&mut self, index: &str) -> Result<&mut MenuEntry> {
        match self.index(index)? {
            Some(i) => self
                .entries
                .get_mut(i)
                .ok_or_else(|| TclError::new("no entry at that index")),
            None => Err(TclError::new("no entry at that index")),
        }
    }

    fn insert(&mut self, index: usize, args: &[String]) -> Result<()> {
        let (kind, options) = match args {
            [kind, options @ ..] => (kind, options),
            _ => return Err(TclError::wrong_args("pathName insert index type ?-option value ...?")),
        };
        let (kind, specs) = entry_type(kind)?;
        let mut table = OptionTable::new(specs);
        table.set_pairs(options)?;
        self.entries.insert(index, MenuEntry { kind, options: table });
        Ok(())
    }

    fn delete(&mut self, first: &str, last: Option<&str>) -> Result<()> {
        let first = match self.index(first)? {
            Some(first) => first,
            None => return Ok(()),
        };
        let last = match last {
            Some(last) => match self.index(last)? {
                Some(last) => last,
                None => return Ok(()),
            },
            None => first,
        };
        if first <= last {
            self.entries.drain(first..=last);
        }
        Ok(())
    }

    fn invoke(&mut self, index: &str) -> Result<Reply> {
        let entry = match self.index(index)? {
            Some(i) => &self.entries[i],
            None => return Ok(Reply::empty()),
        };
        if entry.kind == "separator" || entry.options.get("-state")? == "disabled" {
            return Ok(Reply::empty());
        }
        if entry.kind == "cascade" {
            return Ok(Reply::empty());
        }

        let command = split_list(entry.options.get("-command")?)?;
        if command.is_empty() {
            Ok(Reply::empty())
        } else {
            Ok(Reply::Eval(command))
        }
    }

    pub fn command(&mut self, subcommand: &str, args: &[String]) -> Option<Result<Reply>> {
        let result = match (subcommand, args) {
            ("add", _) => self
                .insert(self.entries.len(), args)
                .map(|()| Reply::empty()),
            ("insert", [index, rest @ ..]) => self
                .insert_index(index)
                .and_then(|index| self.insert(index, rest))
                .map(|()| Reply::empty()),
            ("insert", _) => Err(TclError::wrong_args("pathName insert index type ?-option value ...?")),

            ("delete", [first]) => self.delete(first, None).map(|()| Reply::empty()),
            ("delete", [first, last]) => self.delete(first, Some(last)).map(|()| Reply::empty()),
            ("delete", _) => Err(TclError::wrong_args("pathName delete first ?last?")),

            ("entrycget", [index, option]) => self
                .entry(index)
                .and_then(|entry| entry.options.get(option).map(Reply::from)),
            ("entrycget", _) => Err(TclError::wrong_args("pathName entrycget index option")),

            ("entryconfigure", [index, rest @ ..]) => self
                .entry(index)
                .and_then(|entry| entry.options.configure(rest))
                .map(Reply::from),
            ("entryconfigure", _) => Err(TclError::wrong_args(
                "pathName entryconfigure index ?-option value ...?",
            )),

            ("index", [index]) => self.index(index).map(|index| {
                Reply::from(index.map_or_else(|| "none".to_owned(), |i| i.to_string()))
            }),
            ("index", _) => Err(TclError::wrong_args("pathName index string")),

            ("type", [index]) => self.entry(index).map(|entry| Reply::from(entry.kind)),
            ("type", _) => Err(TclError::wrong_args("pathName type index")),

            ("invoke", [index]) => self.invoke(index),
            ("invoke", _) => Err(TclError::wrong_args("pathName invoke index")),

            _ => return None,
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(menu: &mut MenuState, command: &str) -> Result<String> {
        let argv = split_list(command).unwrap();
        match menu.command(&argv[0], &argv[1..]).unwrap()? {
            Reply::Value(value) => Ok(value),
            Reply::Eval(argv) => Ok(format!("eval: {}", argv.join(" "))),
        }
    }

    #[test]
    fn test_insert_and_delete() {
        let mut menu = MenuState::new();
        assert_eq!(run(&mut menu, "index end").unwrap(), "none");

        run(&mut menu, "add command -label Open").unwrap();
        run(&mut menu, "add separator").unwrap();
        run(&mut menu, "insert 0 checkbutton -label Wrap").unwrap();
        assert_eq!(run(&mut menu, "index end").unwrap(), "2");
        assert_eq!(run(&mut menu, "type 0").unwrap(), "checkbutton");
        assert_eq!(run(&mut menu, "entrycget 1 -label").unwrap(), "Open");
        assert_eq!(run(&mut menu, "index 17").unwrap(), "2");

        run(&mut menu, "delete 0 1").unwrap();
        assert_eq!(run(&mut menu, "type end").unwrap(), "separator");
        run(&mut menu, "delete none").unwrap();
        assert_eq!(run(&mut menu, "index end").unwrap(), "0");
    }

    #[test]
    fn test_entry_options() {
        let mut menu = MenuState::new();
        assert!(run(&mut menu, "add bogus").is_err());
        assert!(run(&mut menu, "add command -value x").is_err());
        assert_eq!(run(&mut menu, "index end").unwrap(), "none");

        run(&mut menu, "add radiobutton -value a").unwrap();
        run(&mut menu, "entryconfigure 0 -label A").unwrap();
        assert_eq!(run(&mut menu, "entrycget 0 -label").unwrap(), "A");
        assert!(run(&mut menu, "entryconfigure 0 -state bogus").is_err());
        assert!(run(&mut menu, "entrycget 5 -label").is_ok());
        assert!(run(&mut menu, "entrycget none -label").is_err());
    }

    #[test]
    fn test_invoke() {
        let mut menu = MenuState::new();
        run(&mut menu, "add command -command {set x 1}").unwrap();
        run(&mut menu, "add command -command {set x 2} -state disabled").unwrap();
        assert_eq!(run(&mut menu, "invoke 0").unwrap(), "eval: set x 1");
        assert_eq!(run(&mut menu, "invoke 1").unwrap(), "");
        assert_eq!(run(&mut menu, "invoke none").unwrap(), "");
    }
}
