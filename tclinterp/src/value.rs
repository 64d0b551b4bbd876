//! Decoding of command replies.

use std::fmt;

use crate::{
    error::{Result, TclError},
    list::{parse_boolean, split_list},
    obj::TclObj,
};

/// Describes how the string reply of a command should be interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnType {
    /// Discard the reply.
    Nothing,
    Str,
    Int,
    Bool,
    Float,
    /// A Tcl list whose elements all have the given type.
    List(Box<ReturnType>),
    /// A Tcl list with exactly one element per given type.
    Tuple(Vec<ReturnType>),
    /// A widget path name, to be resolved to a widget object by the caller.
    Widget,
}

impl ReturnType {
    pub fn list_of(item: ReturnType) -> Self {
        ReturnType::List(Box::new(item))
    }

    /// Decode `obj` according to this type.
    ///
    /// Empty replies decode to [`TclValue::None`] for scalar and widget types, because Tk uses
    /// the empty string for "not set". Empty lists stay lists.
    pub fn decode(&self, obj: &TclObj) -> Result<TclValue> {
        let s = obj.as_str();

        match self {
            ReturnType::Nothing => Ok(TclValue::None),
            ReturnType::Str => Ok(TclValue::Str(s.to_owned())),
            ReturnType::Int | ReturnType::Float | ReturnType::Bool | ReturnType::Widget
                if s.is_empty() =>
            {
                Ok(TclValue::None)
            }

            ReturnType::Int => s
                .trim()
                .parse::<i64>()
                .map(TclValue::Int)
                .map_err(|_| TclError::expected("integer", s)),

            ReturnType::Float => s
                .trim()
                .parse::<f64>()
                .map(TclValue::Float)
                .map_err(|_| TclError::expected("floating-point number", s)),

            ReturnType::Bool => parse_boolean(s).map(TclValue::Bool),

            ReturnType::List(item) => split_list(s)?
                .into_iter()
                .map(|element| item.decode_element(element))
                .collect::<Result<Vec<_>>>()
                .map(TclValue::List),

            ReturnType::Tuple(items) => {
                let elements = split_list(s)?;
                if elements.len() != items.len() {
                    return Err(TclError::new(format!(
                        "expected a list of {} elements but got \"{}\"",
                        items.len(),
                        s
                    )));
                }

                items
                    .iter()
                    .zip(elements)
                    .map(|(item, element)| item.decode_element(element))
                    .collect::<Result<Vec<_>>>()
                    .map(TclValue::Tuple)
            }

            ReturnType::Widget => Ok(TclValue::Widget(s.to_owned())),
        }
    }

    fn decode_element(&self, element: String) -> Result<TclValue> {
        self.decode(&TclObj::from(element))
    }
}

/// A decoded command reply.
#[derive(Debug, Clone, PartialEq)]
pub enum TclValue {
    None,
    Str(String),
    Int(i64),
    Bool(bool),
    Float(f64),
    List(Vec<TclValue>),
    Tuple(Vec<TclValue>),
    Widget(String),
}

impl TclValue {
    pub fn is_none(&self) -> bool {
        matches!(self, TclValue::None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TclValue::Str(s) | TclValue::Widget(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TclValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TclValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            TclValue::Float(x) => Some(*x),
            TclValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TclValue]> {
        match self {
            TclValue::List(items) | TclValue::Tuple(items) => Some(items),
            TclValue::None => Some(&[]),
            _ => None,
        }
    }

    /// The elements of a list of strings.
    pub fn to_strings(&self) -> Option<Vec<String>> {
        self.as_list()?
            .iter()
            .map(|item| item.as_str().map(str::to_owned))
            .collect()
    }

    /// Convert the value back to the string form Tcl would use for it.
    pub fn to_tcl_obj(&self) -> TclObj {
        match self {
            TclValue::None => TclObj::empty(),
            TclValue::Str(s) | TclValue::Widget(s) => TclObj::from(s.as_str()),
            TclValue::Int(n) => TclObj::new(n.to_string()),
            TclValue::Bool(b) => TclObj::from(if *b { "1" } else { "0" }),
            TclValue::Float(x) => TclObj::new(x.to_string()),
            TclValue::List(items) | TclValue::Tuple(items) => {
                TclObj::list(items.iter().map(TclValue::to_tcl_obj))
            }
        }
    }
}

impl fmt::Display for TclValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_tcl_obj())
    }
}

impl From<&str> for TclValue {
    fn from(s: &str) -> Self {
        TclValue::Str(s.to_owned())
    }
}

impl From<String> for TclValue {
    fn from(s: String) -> Self {
        TclValue::Str(s)
    }
}

impl From<i64> for TclValue {
    fn from(n: i64) -> Self {
        TclValue::Int(n)
    }
}

impl From<bool> for TclValue {
    fn from(b: bool) -> Self {
        TclValue::Bool(b)
    }
}

impl From<Vec<&str>> for TclValue {
    fn from(items: Vec<&str>) -> Self {
        TclValue::List(items.into_iter().map(TclValue::from).collect())
    }
}

impl PartialEq<&str> for TclValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}
