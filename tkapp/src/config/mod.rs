//! Dictionary-like access to Tk options.
//!
//! A [`ConfigDict`] knows which options exist, what type their values have and which of them must
//! not be touched directly. The actual reading and writing is done by [`OptionHandler`]s, and a
//! [`Dispatch`] strategy decides which handler gets to do it.

mod dispatch;
mod handlers;

use std::{collections::HashMap, fmt, sync::Arc};

use log::warn;
use parking_lot::{Mutex, RwLock};

use tclinterp::{ReturnType, TclObj, TclValue, ToTclObj};

pub use self::dispatch::{Direct, Dispatch, Fallback, MultiHandler};
pub use self::handlers::{CgetConfigure, CommandTarget, EntryCgetConfigure, OptionCommand};
use crate::{
    app::{AppRef, TkApp},
    callback::Callback,
    error::{Error, Result},
};

/// Something that can read, write and list options.
pub trait OptionHandler: Send + Sync {
    fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue>;
    fn set_option(&self, option: &str, value: &TclObj) -> Result<()>;
    fn list_options(&self) -> Result<Vec<String>>;
}

/// Names of the Tcl commands an object created, deleted along with the object.
pub type CommandList = Arc<Mutex<Vec<String>>>;

struct SpecialOption {
    app: AppRef,
    commands: CommandList,
    callback: Option<Callback>,
}

struct ConfigInner<D> {
    dispatch: D,
    types: RwLock<HashMap<String, ReturnType>>,
    /// Option name -> what to use instead.
    disabled: RwLock<HashMap<String, String>>,
    special: Mutex<HashMap<String, SpecialOption>>,
}

/// The options of one Tk object.
///
/// Cloning gives another handle to the same dict.
pub struct ConfigDict<D> {
    inner: Arc<ConfigInner<D>>,
}

impl<D> Clone for ConfigDict<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub type DirectConfigDict = ConfigDict<Direct>;
pub type FallbackConfigDict = ConfigDict<Fallback>;
pub type MultiHandlerConfigDict = ConfigDict<MultiHandler>;

impl<D: Dispatch> ConfigDict<D> {
    pub fn new(dispatch: D) -> Self {
        Self {
            inner: Arc::new(ConfigInner {
                dispatch,
                types: RwLock::new(HashMap::new()),
                disabled: RwLock::new(HashMap::new()),
                special: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn dispatch(&self) -> &D {
        &self.inner.dispatch
    }

    pub fn same_dict(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn set_type(&self, option: &str, ty: ReturnType) {
        self.inner.types.write().insert(option.to_owned(), ty);
    }

    pub fn set_types<'a, I>(&self, types: I)
    where
        I: IntoIterator<Item = (&'a str, ReturnType)>,
    {
        let mut map = self.inner.types.write();
        for (option, ty) in types {
            map.insert(option.to_owned(), ty);
        }
    }

    /// Refuse direct access to `option`, pointing users to `instruction` instead.
    pub fn disable(&self, option: &str, instruction: &str) {
        self.inner
            .disabled
            .write()
            .insert(option.to_owned(), instruction.to_owned());
    }

    /// Make `option` a callback option: its value is a Tcl command that runs a [`Callback`].
    ///
    /// The command is created on first access through `callback()` and its name is pushed to
    /// `commands`. Adding the same option again keeps the existing callback.
    pub fn add_special(&self, option: &str, app: &TkApp, commands: &CommandList) {
        self.inner
            .special
            .lock()
            .entry(option.to_owned())
            .or_insert_with(|| SpecialOption {
                app: app.downgrade(),
                commands: commands.clone(),
                callback: None,
            });
    }

    fn type_of(&self, option: &str) -> ReturnType {
        self.inner
            .types
            .read()
            .get(option)
            .cloned()
            .unwrap_or(ReturnType::Str)
    }

    fn declared(&self) -> Vec<String> {
        self.inner.types.read().keys().cloned().collect()
    }

    fn check_option(&self, option: &str) -> Result<()> {
        if let Some(instruction) = self.inner.disabled.read().get(option) {
            return Err(Error::DisabledOption {
                option: option.to_owned(),
                instruction: instruction.clone(),
            });
        }

        if self.inner.dispatch.accepts(option, &self.declared())? {
            Ok(())
        } else {
            Err(Error::UnknownOption(option.to_owned()))
        }
    }

    fn check_not_special(&self, option: &str) -> Result<()> {
        if self.inner.special.lock().contains_key(option) {
            return Err(Error::Unsupported(format!(
                "{:?} is a callback option, connect to callback({:?}) instead of setting it",
                option, option
            )));
        }
        Ok(())
    }

    pub fn get(&self, option: &str) -> Result<TclValue> {
        self.check_option(option)?;
        self.inner.dispatch.get(option, &self.type_of(option))
    }

    pub fn set(&self, option: &str, value: impl ToTclObj) -> Result<()> {
        self.check_option(option)?;
        self.check_not_special(option)?;
        self.inner.dispatch.set(option, &value.to_tcl_obj())
    }

    /// Whether `option` can be used with `get()` and `set()`. This never fails: errors count
    /// as "no".
    pub fn contains(&self, option: &str) -> bool {
        self.check_option(option).is_ok()
    }

    /// All usable options, in the order Tk lists them.
    pub fn keys(&self) -> Result<Vec<String>> {
        let disabled = self.inner.disabled.read().clone();
        Ok(self
            .inner
            .dispatch
            .list(&self.declared())?
            .into_iter()
            .filter(|option| !disabled.contains_key(option))
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Every option with its current value.
    pub fn to_vec(&self) -> Result<Vec<(String, TclValue)>> {
        self.keys()?
            .into_iter()
            .map(|option| {
                let value = self.inner.dispatch.get(&option, &self.type_of(&option))?;
                Ok((option, value))
            })
            .collect()
    }

    pub fn update<'a, I, V>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: ToTclObj,
    {
        for (option, value) in pairs {
            self.set(option, value)?;
        }
        Ok(())
    }

    /// Options can't be removed from Tk objects, so this always fails.
    pub fn delete(&self, option: &str) -> Result<()> {
        Err(Error::Unsupported(format!(
            "options can't be deleted, {:?} stays",
            option
        )))
    }

    /// The [`Callback`] behind a callback option.
    pub fn callback(&self, option: &str) -> Result<Callback> {
        self.check_option(option)?;

        let mut special = self.inner.special.lock();
        let entry = special.get_mut(option).ok_or_else(|| {
            Error::Unsupported(format!("{:?} is not a callback option", option))
        })?;

        if let Some(callback) = &entry.callback {
            return Ok(callback.clone());
        }

        let app = entry.app.upgrade()?;
        let callback = Callback::new();
        let command = app.create_command(callback.clone(), &[])?;
        if let Err(err) = self.inner.dispatch.set(option, &TclObj::from(command.as_str())) {
            if let Err(cleanup) = app.delete_command(&command) {
                warn!("Could not delete {} after failing to set {:?}: {}", command, option, cleanup);
            }
            return Err(err);
        }
        entry.commands.lock().push(command);

        entry.callback = Some(callback.clone());
        Ok(callback)
    }

    /// Whether both dicts have the same options with the same values.
    pub fn same_as<E: Dispatch>(&self, other: &ConfigDict<E>) -> Result<bool> {
        let mut mine = self.to_vec()?;
        let mut theirs = other.to_vec()?;
        mine.sort_by(|a, b| a.0.cmp(&b.0));
        theirs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(mine == theirs)
    }
}

impl<D: Dispatch, E: Dispatch> PartialEq<ConfigDict<E>> for ConfigDict<D> {
    fn eq(&self, other: &ConfigDict<E>) -> bool {
        self.same_as(other).unwrap_or(false)
    }
}

impl<D: Dispatch> fmt::Debug for ConfigDict<D> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_vec() {
            Ok(pairs) => f
                .debug_map()
                .entries(pairs.iter().map(|(k, v)| (k, v.to_string())))
                .finish(),
            Err(err) => write!(f, "ConfigDict(<{}>)", err),
        }
    }
}

/// A config dict can be the handler of another config dict.
impl<D: Dispatch> OptionHandler for ConfigDict<D> {
    fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        let ty = match self.inner.types.read().get(option) {
            Some(own) => own.clone(),
            None => ty.clone(),
        };
        self.inner.dispatch.get(option, &ty)
    }

    fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
        self.check_not_special(option)?;
        self.inner.dispatch.set(option, value)
    }

    fn list_options(&self) -> Result<Vec<String>> {
        self.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An in-memory handler with a fixed set of options.
    struct Memory {
        values: Mutex<Vec<(String, String)>>,
        reject: bool,
        read_only: bool,
    }

    impl Memory {
        fn new(options: &[&str]) -> Self {
            Self {
                values: Mutex::new(
                    options
                        .iter()
                        .map(|o| (o.to_string(), String::new()))
                        .collect(),
                ),
                reject: false,
                read_only: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                values: Mutex::new(Vec::new()),
                reject: true,
                read_only: false,
            }
        }

        fn read_only(options: &[&str]) -> Self {
            Self {
                read_only: true,
                ..Self::new(options)
            }
        }

        fn check(&self) -> Result<()> {
            if self.reject {
                Err(Error::Tcl(tclinterp::TclError::new("rejected")))
            } else {
                Ok(())
            }
        }
    }

    impl OptionHandler for Memory {
        fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
            self.check()?;
            let values = self.values.lock();
            let (_, value) = values
                .iter()
                .find(|(o, _)| o == option)
                .ok_or_else(|| Error::Tcl(tclinterp::TclError::unknown_option(option)))?;
            Ok(ty.decode(&TclObj::from(value.as_str()))?)
        }

        fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
            self.check()?;
            if self.read_only {
                return Err(Error::Tcl(tclinterp::TclError::new("read only")));
            }
            let mut values = self.values.lock();
            match values.iter_mut().find(|(o, _)| o == option) {
                Some((_, old)) => *old = value.to_string(),
                None => return Err(Error::Tcl(tclinterp::TclError::unknown_option(option))),
            }
            Ok(())
        }

        fn list_options(&self) -> Result<Vec<String>> {
            self.check()?;
            Ok(self.values.lock().iter().map(|(o, _)| o.clone()).collect())
        }
    }

    #[test]
    fn test_direct_types_and_checks() {
        let config = ConfigDict::new(Direct::new(Memory::new(&["text", "width", "columns"])));
        config.set_type("width", ReturnType::Int);
        config.disable("columns", "use something else");

        config.set("width", 12).unwrap();
        assert_eq!(config.get("width").unwrap(), TclValue::Int(12));
        assert_eq!(config.get("text").unwrap(), TclValue::from(""));

        assert_eq!(
            config.get("columns").unwrap_err(),
            Error::DisabledOption {
                option: "columns".to_owned(),
                instruction: "use something else".to_owned()
            }
        );
        assert_eq!(
            config.set("nope", 1).unwrap_err(),
            Error::UnknownOption("nope".to_owned())
        );
        assert!(config.contains("text"));
        assert!(!config.contains("columns"));
        assert!(!config.contains("Text"));

        assert_eq!(config.keys().unwrap(), vec!["text", "width"]);
        assert_eq!(config.len().unwrap(), 2);
        assert!(matches!(config.delete("text"), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_fallback_uses_cache_on_rejection() {
        let config = ConfigDict::new(Fallback::new(Memory::rejecting()));
        config.set_type("width", ReturnType::Int);

        assert_eq!(config.keys().unwrap(), vec!["width"]);
        assert_eq!(config.get("width").unwrap(), TclValue::None);

        config.set("width", 30).unwrap();
        assert_eq!(config.get("width").unwrap(), TclValue::Int(30));
        assert_eq!(config.dispatch().cached("width"), Some(TclObj::from("30")));
        assert_eq!(config.get("height").unwrap(), TclValue::None);
    }

    #[test]
    fn test_fallback_keeps_undeclared_options_while_rejected() {
        let config = ConfigDict::new(Fallback::new(Memory::rejecting()));
        config.set("test", "x").unwrap();
        assert_eq!(config.get("test").unwrap(), TclValue::from("x"));
        assert_eq!(config.keys().unwrap(), vec!["test"]);

        // once the handler answers, it decides again
        let config = ConfigDict::new(Fallback::new(Memory::new(&["text"])));
        assert_eq!(
            config.set("test", "x").unwrap_err(),
            Error::UnknownOption("test".to_owned())
        );
    }

    #[test]
    fn test_fallback_resync() {
        let memory = Arc::new(Memory::new(&["text", "anchor"]));

        struct Shared(Arc<Memory>);
        impl OptionHandler for Shared {
            fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
                self.0.get_option(option, ty)
            }
            fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
                self.0.set_option(option, value)
            }
            fn list_options(&self) -> Result<Vec<String>> {
                self.0.list_options()
            }
        }

        let config = ConfigDict::new(Fallback::new(Shared(memory.clone())));
        config.set("text", "hello").unwrap();
        config.set("anchor", "w").unwrap();

        for (_, value) in memory.values.lock().iter_mut() {
            value.clear();
        }
        assert_eq!(config.get("text").unwrap(), TclValue::from(""));

        config.dispatch().resync().unwrap();
        assert_eq!(config.get("text").unwrap(), TclValue::from("hello"));
        assert_eq!(config.get("anchor").unwrap(), TclValue::from("w"));
    }

    #[test]
    fn test_multi_handler_routing() {
        let column: Arc<dyn OptionHandler> = Arc::new(Memory::new(&["width", "anchor", "id"]));
        let heading: Arc<dyn OptionHandler> = Arc::new(Memory::new(&["text", "anchor"]));

        let config = ConfigDict::new(
            MultiHandler::new(vec![column.clone()])
                .route("text", vec![heading.clone()])
                .route("anchor", vec![column.clone(), heading.clone()]),
        );

        assert_eq!(config.keys().unwrap(), vec!["width", "anchor", "id", "text"]);

        config.set("anchor", "e").unwrap();
        assert_eq!(
            column.get_option("anchor", &ReturnType::Str).unwrap(),
            TclValue::from("e")
        );
        assert_eq!(
            heading.get_option("anchor", &ReturnType::Str).unwrap(),
            TclValue::from("e")
        );

        config.set("text", "Name").unwrap();
        assert_eq!(config.get("text").unwrap(), TclValue::from("Name"));
        assert!(column.get_option("text", &ReturnType::Str).is_err());
    }

    /// Writes down every get and set it sees.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl OptionHandler for Recorder {
        fn get_option(&self, option: &str, _ty: &ReturnType) -> Result<TclValue> {
            self.log.lock().push(format!("{} get {}", self.name, option));
            Ok(TclValue::from(self.name))
        }

        fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
            self.log
                .lock()
                .push(format!("{} set {}={}", self.name, option, value));
            Ok(())
        }

        fn list_options(&self) -> Result<Vec<String>> {
            Ok(vec!["anchor".to_owned()])
        }
    }

    #[test]
    fn test_multi_handler_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let h1: Arc<dyn OptionHandler> = Arc::new(Recorder {
            name: "h1",
            log: log.clone(),
        });
        let h2: Arc<dyn OptionHandler> = Arc::new(Recorder {
            name: "h2",
            log: log.clone(),
        });
        let config = ConfigDict::new(MultiHandler::new(Vec::new()).route("anchor", vec![h1, h2]));

        config.set("anchor", "e").unwrap();
        assert_eq!(*log.lock(), vec!["h1 set anchor=e", "h2 set anchor=e"]);

        log.lock().clear();
        assert_eq!(config.get("anchor").unwrap(), TclValue::from("h1"));
        assert_eq!(*log.lock(), vec!["h1 get anchor"]);
    }

    #[test]
    fn test_same_dict() {
        let a = ConfigDict::new(Direct::new(Memory::new(&["text"])));
        let b = ConfigDict::new(Direct::new(Memory::new(&["text"])));
        assert!(a.same_dict(&a.clone()));
        assert!(!a.same_dict(&b));
        // equal, but not the same
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality() {
        let a = ConfigDict::new(Direct::new(Memory::new(&["text"])));
        let b = ConfigDict::new(Direct::new(Memory::new(&["text"])));
        assert_eq!(a, b);

        b.set("text", "x").unwrap();
        assert_ne!(a, b);

        let broken = ConfigDict::new(Direct::new(Memory::rejecting()));
        assert_ne!(a, broken);
    }

    #[test]
    fn test_callback_option() {
        let app = TkApp::simulated().unwrap();
        let commands = CommandList::default();
        let config = ConfigDict::new(Direct::new(Memory::new(&["command", "text"])));
        config.add_special("command", &app, &commands);

        assert!(matches!(
            config.set("command", "whatever"),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(config.callback("text"), Err(Error::Unsupported(_))));

        let callback = config.callback("command").unwrap();
        assert!(callback.same_as(&config.callback("command").unwrap()));
        assert_eq!(commands.lock().len(), 1);
        assert_eq!(
            config.get("command").unwrap(),
            TclValue::from(commands.lock()[0].as_str())
        );
    }

    #[test]
    fn test_failed_callback_setup_keeps_the_error() {
        let backend = crate::testing::Rejecting::new();
        let app = backend.app();
        backend.reject_command_deletion(true);

        let commands = CommandList::default();
        let config = ConfigDict::new(Direct::new(Memory::read_only(&["command"])));
        config.add_special("command", &app, &commands);

        assert_eq!(
            config.callback("command").unwrap_err(),
            Error::Tcl(tclinterp::TclError::new("read only"))
        );
        assert!(commands.lock().is_empty());
    }

    #[test]
    fn test_add_special_twice_keeps_the_callback() {
        let app = TkApp::simulated().unwrap();
        let commands = CommandList::default();
        let config = ConfigDict::new(Direct::new(Memory::new(&["command"])));
        config.add_special("command", &app, &commands);
        let callback = config.callback("command").unwrap();

        config.add_special("command", &app, &commands);
        assert!(callback.same_as(&config.callback("command").unwrap()));
        assert_eq!(commands.lock().len(), 1);
    }
}
