use std::fmt;

use crate::list;

/// A Tcl value.
///
/// Tcl's universal representation is the string, so that is what travels over the command
/// channel; typed interpretation happens when a reply is decoded (see [`crate::ReturnType`]).
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct TclObj(String);

impl TclObj {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a list object out of anything convertable to Tcl objects.
    pub fn list<I>(it: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToTclObj,
    {
        let elements = it
            .into_iter()
            .map(|item| item.to_tcl_obj().into_string())
            .collect::<Vec<_>>();
        Self(list::merge(&elements))
    }
}

impl From<String> for TclObj {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TclObj {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for TclObj {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TclObj {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("TclObj").field(&self.0).finish()
    }
}

// Is `IntoTclObj` a better name for this?
pub trait ToTclObj {
    fn to_tcl_obj(self) -> TclObj;
}

impl ToTclObj for TclObj {
    fn to_tcl_obj(self) -> TclObj {
        self
    }
}

impl ToTclObj for &TclObj {
    fn to_tcl_obj(self) -> TclObj {
        self.clone()
    }
}

impl ToTclObj for &str {
    fn to_tcl_obj(self) -> TclObj {
        TclObj::from(self)
    }
}

// It's basically meant for iterating over `&[&str]`.
impl ToTclObj for &&str {
    fn to_tcl_obj(self) -> TclObj {
        TclObj::from(*self)
    }
}

impl ToTclObj for String {
    fn to_tcl_obj(self) -> TclObj {
        TclObj(self)
    }
}

impl ToTclObj for &String {
    fn to_tcl_obj(self) -> TclObj {
        TclObj(self.clone())
    }
}

impl ToTclObj for bool {
    fn to_tcl_obj(self) -> TclObj {
        TclObj::from(if self { "1" } else { "0" })
    }
}

macro_rules! display_to_tcl_obj {
    ($($ty:ty),*) => {
        $(
            impl ToTclObj for $ty {
                fn to_tcl_obj(self) -> TclObj {
                    TclObj(self.to_string())
                }
            }
        )*
    };
}

display_to_tcl_obj!(i32, i64, u32, u64, usize, f64, char);

impl<T: ToTclObj> ToTclObj for Vec<T> {
    fn to_tcl_obj(self) -> TclObj {
        TclObj::list(self)
    }
}

impl<T: ToTclObj + Clone> ToTclObj for &[T] {
    fn to_tcl_obj(self) -> TclObj {
        TclObj::list(self.iter().cloned())
    }
}

impl<T: ToTclObj, const N: usize> ToTclObj for [T; N] {
    fn to_tcl_obj(self) -> TclObj {
        TclObj::list(self)
    }
}
