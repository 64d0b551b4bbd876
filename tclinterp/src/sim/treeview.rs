//! State and subcommands of a simulated `ttk::treeview`.

use std::collections::HashMap;

use super::options::{OptionTable, COLUMN_OPTIONS, HEADING_OPTIONS, ITEM_OPTIONS};
use crate::{
    error::{Result, TclError},
    list::{merge, split_list},
};

const ROOT: &str = "";
const TREE_COLUMN: &str = "#0";

#[derive(Debug)]
struct Item {
    parent: String,
    children: Vec<String>,
    options: OptionTable,
}

impl Item {
    fn new(parent: &str) -> Self {
        Self {
            parent: parent.to_owned(),
            children: Vec::new(),
            options: OptionTable::new(ITEM_OPTIONS),
        }
    }
}

#[derive(Debug)]
pub struct TreeState {
    items: HashMap<String, Item>,
    columns: Vec<String>,
    column_options: HashMap<String, OptionTable>,
    heading_options: HashMap<String, OptionTable>,
    selection: Vec<String>,
    next_auto_id: u32,
}

fn column_table(id: &str) -> Result<OptionTable> {
    let mut table = OptionTable::new(COLUMN_OPTIONS);
    table.force("-id", id)?;
    Ok(table)
}

fn parse_index(index: &str, len: usize) -> Result<usize> {
    if index == "end" {
        return Ok(len);
    }

    let index = index
        .trim()
        .parse::<i64>()
        .map_err(|_| TclError::expected("integer", index))?;
    Ok(index.clamp(0, len as i64) as usize)
}

impl TreeState {
    pub fn new() -> Result<Self> {
        let mut items = HashMap::new();
        items.insert(ROOT.to_owned(), Item::new(ROOT));

        let mut column_options = HashMap::new();
        column_options.insert(TREE_COLUMN.to_owned(), column_table(TREE_COLUMN)?);
        let mut heading_options = HashMap::new();
        heading_options.insert(TREE_COLUMN.to_owned(), OptionTable::new(HEADING_OPTIONS));

        Ok(Self {
            items,
            columns: Vec::new(),
            column_options,
            heading_options,
            selection: Vec::new(),
            next_auto_id: 1,
        })
    }

    /// Replace the data columns. Every data column starts over with default column and heading
    /// options; the tree column keeps its state.
    pub fn set_columns(&mut self, columns: Vec<String>) -> Result<()> {
        self.column_options.retain(|id, _| id == TREE_COLUMN);
        self.heading_options.retain(|id, _| id == TREE_COLUMN);

        for id in &columns {
            self.column_options.insert(id.clone(), column_table(id)?);
            self.heading_options
                .insert(id.clone(), OptionTable::new(HEADING_OPTIONS));
        }
        self.columns = columns;
        Ok(())
    }

    fn resolve_column(&self, column: &str) -> Result<String> {
        let invalid = || TclError::new(format!("Invalid column index {}", column));

        if column == TREE_COLUMN || self.columns.iter().any(|id| id == column) {
            return Ok(column.to_owned());
        }

        let n = column
            .strip_prefix('#')
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(invalid)?;
        match n.checked_sub(1).and_then(|i| self.columns.get(i)) {
            Some(id) => Ok(id.clone()),
            None => Err(invalid()),
        }
    }

    fn item(&self, id: &str) -> Result<&Item> {
        self.items
            .get(id)
            .ok_or_else(|| TclError::new(format!("Item {} not found", id)))
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut Item> {
        self.items
            .get_mut(id)
            .ok_or_else(|| TclError::new(format!("Item {} not found", id)))
    }

    fn preorder(&self, id: &str, out: &mut Vec<String>) {
        if let Some(item) = self.items.get(id) {
            for child in &item.children {
                out.push(child.clone());
                self.preorder(child, out);
            }
        }
    }

    fn is_ancestor_or_self<'a>(&'a self, ancestor: &str, mut id: &'a str) -> bool {
        loop {
            if id == ancestor {
                return true;
            }
            match self.items.get(id) {
                Some(item) if id != ROOT => id = &item.parent,
                _ => return false,
            }
        }
    }

    fn detach(&mut self, id: &str) {
        let parent = match self.items.get(id) {
            Some(item) => item.parent.clone(),
            None => return,
        };
        if let Some(parent) = self.items.get_mut(&parent) {
            parent.children.retain(|child| child != id);
        }
    }

    fn remove_subtree(&mut self, id: &str) {
        if let Some(item) = self.items.remove(id) {
            for child in item.children {
                self.remove_subtree(&child);
            }
        }
    }

    fn items_in(&self, args: &[String]) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for arg in args {
            for id in split_list(arg)? {
                self.item(&id)?;
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn next_id(&mut self) -> String {
        loop {
            let id = format!("I{:03}", self.next_auto_id);
            self.next_auto_id += 1;
            if !self.items.contains_key(&id) {
                return id;
            }
        }
    }

    fn insert(&mut self, args: &[String]) -> Result<String> {
        let (parent, index, rest) = match args {
            [parent, index, rest @ ..] => (parent, index, rest),
            _ => {
                return Err(TclError::wrong_args(
                    "pathName insert parent index ?-id id? -options...",
                ))
            }
        };

        let len = self.item(parent)?.children.len();
        let index = parse_index(index, len)?;

        let mut id = None;
        let mut options = Vec::new();
        for pair in rest.chunks(2) {
            match pair {
                [key, value] if key == "-id" => id = Some(value.clone()),
                [key, value] => options.extend([key.clone(), value.clone()]),
                _ => {
                    return Err(TclError::new(format!(
                        "value for \"{}\" missing",
                        pair[0]
                    )))
                }
            }
        }

        let id = match id {
            Some(id) if self.items.contains_key(&id) => {
                return Err(TclError::new(format!("Item {} already exists", id)))
            }
            Some(id) => id,
            None => self.next_id(),
        };

        let mut item = Item::new(parent);
        item.options.set_pairs(&options)?;

        self.items.insert(id.clone(), item);
        self.item_mut(parent)?.children.insert(index, id.clone());
        Ok(id)
    }

    fn delete(&mut self, args: &[String]) -> Result<()> {
        let ids = match args {
            [_] => self.items_in(args)?,
            _ => return Err(TclError::wrong_args("pathName delete items")),
        };
        if ids.iter().any(|id| id == ROOT) {
            return Err(TclError::new("Cannot delete root item"));
        }

        for id in &ids {
            self.detach(id);
            self.remove_subtree(id);
        }

        let items = &self.items;
        self.selection.retain(|id| items.contains_key(id));
        Ok(())
    }

    fn move_item(&mut self, args: &[String]) -> Result<()> {
        let (id, parent, index) = match args {
            [id, parent, index] => (id, parent, index),
            _ => return Err(TclError::wrong_args("pathName move item parent index")),
        };

        self.item(id)?;
        self.item(parent)?;
        if id == ROOT {
            return Err(TclError::new("Cannot move root item"));
        }
        if self.is_ancestor_or_self(id, parent) {
            return Err(TclError::new(format!(
                "Cannot insert {} as descendant of itself",
                id
            )));
        }

        self.detach(id);
        let siblings = &mut self.item_mut(parent)?.children;
        let index = parse_index(index, siblings.len())?;
        siblings.insert(index, id.clone());
        self.item_mut(id)?.parent = parent.clone();
        Ok(())
    }

    fn selection(&mut self, args: &[String]) -> Result<String> {
        let (op, rest) = match args {
            [] => {
                let mut all = Vec::new();
                self.preorder(ROOT, &mut all);
                all.retain(|id| self.selection.contains(id));
                return Ok(merge(all));
            }
            [op, rest @ ..] => (op.as_str(), rest),
        };

        let ids = self.items_in(rest)?;
        match op {
            "set" => self.selection = ids,
            "add" => {
                for id in ids {
                    if !self.selection.contains(&id) {
                        self.selection.push(id);
                    }
                }
            }
            "remove" => self.selection.retain(|id| !ids.contains(id)),
            "toggle" => {
                for id in ids {
                    match self.selection.iter().position(|s| *s == id) {
                        Some(i) => {
                            self.selection.remove(i);
                        }
                        None => self.selection.push(id),
                    }
                }
            }
            other => {
                return Err(TclError::new(format!(
                    "bad selection operation \"{}\": must be add, remove, set, or toggle",
                    other
                )))
            }
        }
        Ok(String::new())
    }

    fn view(&self, args: &[String]) -> Result<String> {
        match args {
            [] => Ok("0.0 1.0".to_owned()),
            [op, fraction] if op == "moveto" => fraction
                .trim()
                .parse::<f64>()
                .map(|_| String::new())
                .map_err(|_| TclError::expected("floating-point number", fraction)),
            [op, amount, _units] if op == "scroll" => amount
                .trim()
                .parse::<i64>()
                .map(|_| String::new())
                .map_err(|_| TclError::expected("integer", amount)),
            _ => Err(TclError::wrong_args("pathName xview|yview ?args?")),
        }
    }

    /// Run a treeview-specific subcommand.
    ///
    /// Returns `None` when `subcommand` is not one of them.
    pub fn command(&mut self, subcommand: &str, args: &[String]) -> Option<Result<String>> {
        let result = match (subcommand, args) {
            ("children", [id]) => self.item(id).map(|item| merge(&item.children)),
            ("children", _) => Err(TclError::wrong_args("pathName children item")),

            ("exists", [id]) => Ok(if self.items.contains_key(id) { "1" } else { "0" }.to_owned()),
            ("exists", _) => Err(TclError::wrong_args("pathName exists item")),

            ("index", [id]) => self.item(id).and_then(|item| {
                if id == ROOT {
                    return Ok("0".to_owned());
                }
                let siblings = &self.item(&item.parent)?.children;
                let index = siblings.iter().position(|s| s == id).unwrap_or(0);
                Ok(index.to_string())
            }),
            ("index", _) => Err(TclError::wrong_args("pathName index item")),

            ("parent", [id]) => self.item(id).map(|item| item.parent.clone()),
            ("parent", _) => Err(TclError::wrong_args("pathName parent item")),

            ("insert", _) => self.insert(args),
            ("delete", _) => self.delete(args).map(|()| String::new()),
            ("move", _) => self.move_item(args).map(|()| String::new()),

            ("item", [id, rest @ ..]) => self
                .item_mut(id)
                .and_then(|item| item.options.query(rest)),
            ("item", _) => Err(TclError::wrong_args("pathName item item ?-option ?value??...")),

            ("column", [column, rest @ ..]) => self.resolve_column(column).and_then(|id| {
                match self.column_options.get_mut(&id) {
                    Some(table) => table.query(rest),
                    None => Err(TclError::new(format!("Invalid column index {}", column))),
                }
            }),
            ("column", _) => Err(TclError::wrong_args(
                "pathName column column ?-option ?value??...",
            )),

            ("heading", [column, rest @ ..]) => self.resolve_column(column).and_then(|id| {
                match self.heading_options.get_mut(&id) {
                    Some(table) => table.query(rest),
                    None => Err(TclError::new(format!("Invalid column index {}", column))),
                }
            }),
            ("heading", _) => Err(TclError::wrong_args(
                "pathName heading column ?-option ?value??...",
            )),

            ("selection", _) => self.selection(args),
            ("xview", _) | ("yview", _) => self.view(args),

            _ => return None,
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tree: &mut TreeState, command: &str) -> Result<String> {
        let argv = split_list(command).unwrap();
        tree.command(&argv[0], &argv[1..]).unwrap()
    }

    #[test]
    fn test_insert_and_children() {
        let mut tree = TreeState::new().unwrap();
        assert_eq!(run(&mut tree, "insert {} end -text a").unwrap(), "I001");
        assert_eq!(run(&mut tree, "insert {} 0 -id first").unwrap(), "first");
        assert_eq!(run(&mut tree, "insert {} 99 -id last").unwrap(), "last");
        assert_eq!(run(&mut tree, "children {}").unwrap(), "first I001 last");
        assert_eq!(run(&mut tree, "item I001 -text").unwrap(), "a");

        assert_eq!(
            run(&mut tree, "insert {} end -id first").unwrap_err().message(),
            "Item first already exists"
        );
        assert_eq!(
            run(&mut tree, "insert nope end").unwrap_err().message(),
            "Item nope not found"
        );
        assert!(run(&mut tree, "insert {} end -id x -open maybe").is_err());
        assert_eq!(run(&mut tree, "exists x").unwrap(), "0");
    }

    #[test]
    fn test_move_and_delete() {
        let mut tree = TreeState::new().unwrap();
        for id in ["a", "b", "c"] {
            run(&mut tree, &format!("insert {{}} end -id {}", id)).unwrap();
        }
        run(&mut tree, "insert a end -id a1").unwrap();

        run(&mut tree, "move a {} end").unwrap();
        assert_eq!(run(&mut tree, "children {}").unwrap(), "b c a");
        run(&mut tree, "move a {} 1").unwrap();
        assert_eq!(run(&mut tree, "children {}").unwrap(), "b a c");
        assert_eq!(run(&mut tree, "index a").unwrap(), "1");
        assert_eq!(run(&mut tree, "parent a1").unwrap(), "a");
        assert!(run(&mut tree, "move a a1 0").is_err());

        run(&mut tree, "selection set {a1 c}").unwrap();
        run(&mut tree, "delete a").unwrap();
        assert_eq!(run(&mut tree, "exists a1").unwrap(), "0");
        assert_eq!(run(&mut tree, "selection").unwrap(), "c");
        assert!(run(&mut tree, "delete {{}}").is_err());
    }

    #[test]
    fn test_columns_reset() {
        let mut tree = TreeState::new().unwrap();
        tree.set_columns(vec!["C0".into(), "C1".into()]).unwrap();
        run(&mut tree, "heading C1 -text Size").unwrap();
        run(&mut tree, "heading #0 -text Name").unwrap();
        assert_eq!(run(&mut tree, "heading #2 -text").unwrap(), "Size");
        assert_eq!(run(&mut tree, "column C0 -id").unwrap(), "C0");

        tree.set_columns(vec!["C1".into()]).unwrap();
        assert_eq!(run(&mut tree, "heading C1 -text").unwrap(), "");
        assert_eq!(run(&mut tree, "heading #0 -text").unwrap(), "Name");
        assert_eq!(
            run(&mut tree, "column C0").unwrap_err().message(),
            "Invalid column index C0"
        );
    }

    #[test]
    fn test_selection_order() {
        let mut tree = TreeState::new().unwrap();
        for id in ["a", "b", "c"] {
            run(&mut tree, &format!("insert {{}} end -id {}", id)).unwrap();
        }
        run(&mut tree, "selection add c").unwrap();
        run(&mut tree, "selection add a").unwrap();
        assert_eq!(run(&mut tree, "selection").unwrap(), "a c");
        run(&mut tree, "selection toggle {a b}").unwrap();
        assert_eq!(run(&mut tree, "selection").unwrap(), "b c");
        run(&mut tree, "selection remove c").unwrap();
        assert_eq!(run(&mut tree, "selection").unwrap(), "b");
    }
}
