//! Text and insertion cursor of a simulated `ttk::entry`.

use crate::error::{Result, TclError};

#[derive(Debug, Default)]
pub struct EntryState {
    text: Vec<char>,
    cursor: usize,
}

impl EntryState {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(&self, index: &str) -> Result<usize> {
        match index {
            "end" => Ok(self.text.len()),
            "insert" => Ok(self.cursor),
            _ => index
                .trim()
                .parse::<i64>()
                .map(|n| n.clamp(0, self.text.len() as i64) as usize)
                .map_err(|_| TclError::new(format!("Bad entry index \"{}\"", index))),
        }
    }

    fn insert(&mut self, index: &str, text: &str) -> Result<()> {
        let at = self.index(index)?;
        let inserted = text.chars().count();
        self.text.splice(at..at, text.chars());
        if self.cursor >= at {
            self.cursor += inserted;
        }
        Ok(())
    }

    fn delete(&mut self, first: &str, last: Option<&str>) -> Result<()> {
        let first = self.index(first)?;
        let last = match last {
            Some(last) => self.index(last)?,
            None => (first + 1).min(self.text.len()),
        };
        if first >= last {
            return Ok(());
        }

        self.text.drain(first..last);
        if self.cursor >= last {
            self.cursor -= last - first;
        } else if self.cursor > first {
            self.cursor = first;
        }
        Ok(())
    }

    pub fn command(&mut self, subcommand: &str, args: &[String]) -> Option<Result<String>> {
        let result = match (subcommand, args) {
            ("get", []) => Ok(self.text.iter().collect()),
            ("get", _) => Err(TclError::wrong_args("pathName get")),

            ("insert", [index, text]) => self.insert(index, text).map(|()| String::new()),
            ("insert", _) => Err(TclError::wrong_args("pathName insert index text")),

            ("delete", [first]) => self.delete(first, None).map(|()| String::new()),
            ("delete", [first, last]) => self.delete(first, Some(last)).map(|()| String::new()),
            ("delete", _) => Err(TclError::wrong_args("pathName delete firstIndex ?lastIndex?")),

            ("index", [index]) => self.index(index).map(|i| i.to_string()),
            ("index", _) => Err(TclError::wrong_args("pathName index string")),

            ("icursor", [index]) => self.index(index).map(|i| {
                self.cursor = i;
                String::new()
            }),
            ("icursor", _) => Err(TclError::wrong_args("pathName icursor pos")),

            _ => return None,
        };
        Some(result)
    }
}
