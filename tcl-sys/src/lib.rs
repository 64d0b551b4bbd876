//! Raw bindings to libtcl8.6 and libtk8.6.

#![allow(non_upper_case_globals, non_camel_case_types, non_snake_case)]

#[cfg(feature = "bindgen")]
include!(concat!(env!("OUT_DIR"), "/bindings.rs"));

#[cfg(not(feature = "bindgen"))]
mod bindings;
#[cfg(not(feature = "bindgen"))]
pub use bindings::*;
