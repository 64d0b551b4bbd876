//! How a config dict turns option accesses into handler calls.

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use tclinterp::{ReturnType, TclObj, TclValue};

use super::OptionHandler;
use crate::error::{Error, Result};

pub trait Dispatch: Send + Sync + 'static {
    fn get(&self, option: &str, ty: &ReturnType) -> Result<TclValue>;
    fn set(&self, option: &str, value: &TclObj) -> Result<()>;

    /// The options that exist, in the order Tk reports them. `declared` are the options the
    /// dict has types for.
    fn list(&self, declared: &[String]) -> Result<Vec<String>>;

    /// Whether `option` may be used at all.
    fn accepts(&self, option: &str, declared: &[String]) -> Result<bool> {
        Ok(self.list(declared)?.iter().any(|o| o == option))
    }
}

/// Every access goes straight to one handler and every error is propagated.
pub struct Direct(Arc<dyn OptionHandler>);

impl Direct {
    pub fn new(handler: impl OptionHandler + 'static) -> Self {
        Self(Arc::new(handler))
    }
}

impl Dispatch for Direct {
    fn get(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        self.0.get_option(option, ty)
    }

    fn set(&self, option: &str, value: &TclObj) -> Result<()> {
        self.0.set_option(option, value)
    }

    fn list(&self, _declared: &[String]) -> Result<Vec<String>> {
        self.0.list_options()
    }
}

/// Remembers every value set through it and answers from that memory when Tcl rejects a call.
///
/// This is for options whose Tcl-side storage gets wiped behind our back, like treeview columns
/// after `configure -columns`. `resync()` writes the remembered values back.
///
/// While the handler can't list its options, every option is accepted and lives in the cache
/// only.
pub struct Fallback {
    handler: Arc<dyn OptionHandler>,
    /// Last known values, in the order the options were first set.
    cache: Mutex<Vec<(String, TclObj)>>,
}

impl Fallback {
    pub fn new(handler: impl OptionHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            cache: Mutex::new(Vec::new()),
        }
    }

    /// Remember `value` without sending it anywhere.
    pub fn stage(&self, option: &str, value: TclObj) {
        let mut cache = self.cache.lock();
        match cache.iter_mut().find(|(name, _)| name == option) {
            Some((_, old)) => *old = value,
            None => cache.push((option.to_owned(), value)),
        }
    }

    pub fn cached(&self, option: &str) -> Option<TclObj> {
        self.cache
            .lock()
            .iter()
            .find(|(name, _)| name == option)
            .map(|(_, value)| value.clone())
    }

    /// Send every remembered value to Tcl again, in first-set order.
    pub fn resync(&self) -> Result<()> {
        let cache = self.cache.lock().clone();
        for (option, value) in cache {
            match self.handler.set_option(&option, &value) {
                Err(Error::Tcl(err)) => {
                    warn!("Could not restore {:?} = {:?}: {}", option, value, err)
                }
                result => result?,
            }
        }
        Ok(())
    }
}

impl Dispatch for Fallback {
    fn get(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        match self.handler.get_option(option, ty) {
            Err(Error::Tcl(err)) => {
                warn!("Getting {:?} failed, using the cached value: {}", option, err);
                match self.cached(option) {
                    Some(value) => Ok(ty.decode(&value)?),
                    None => Ok(TclValue::None),
                }
            }
            result => result,
        }
    }

    fn set(&self, option: &str, value: &TclObj) -> Result<()> {
        self.stage(option, value.clone());

        match self.handler.set_option(option, value) {
            Err(Error::Tcl(err)) => {
                warn!("Setting {:?} failed, keeping it cached: {}", option, err);
                Ok(())
            }
            result => result,
        }
    }

    fn list(&self, declared: &[String]) -> Result<Vec<String>> {
        match self.handler.list_options() {
            Err(Error::Tcl(err)) => {
                warn!("Listing options failed, using the known ones: {}", err);
                let mut options = declared.to_vec();
                for (option, _) in self.cache.lock().iter() {
                    if !options.contains(option) {
                        options.push(option.clone());
                    }
                }
                Ok(options)
            }
            result => result,
        }
    }

    fn accepts(&self, option: &str, _declared: &[String]) -> Result<bool> {
        match self.handler.list_options() {
            Ok(options) => Ok(options.iter().any(|o| o == option)),
            Err(Error::Tcl(err)) => {
                debug!("Can't list options ({}), accepting {:?}", err, option);
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }
}

fn same_handler(a: &Arc<dyn OptionHandler>, b: &Arc<dyn OptionHandler>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Routes each option to a list of handlers.
///
/// Setting an option sets it in every handler it is routed to, in order. Getting asks only the
/// first one. Options without a route go to the wildcard handlers.
pub struct MultiHandler {
    routes: Vec<(String, Vec<Arc<dyn OptionHandler>>)>,
    wildcard: Vec<Arc<dyn OptionHandler>>,
}

impl MultiHandler {
    pub fn new(wildcard: Vec<Arc<dyn OptionHandler>>) -> Self {
        Self {
            routes: Vec::new(),
            wildcard,
        }
    }

    pub fn route(mut self, option: &str, handlers: Vec<Arc<dyn OptionHandler>>) -> Self {
        self.routes.retain(|(name, _)| name != option);
        self.routes.push((option.to_owned(), handlers));
        self
    }

    fn handlers_for(&self, option: &str) -> &[Arc<dyn OptionHandler>] {
        self.routes
            .iter()
            .find(|(name, _)| name == option)
            .map(|(_, handlers)| handlers.as_slice())
            .unwrap_or(self.wildcard.as_slice())
    }

    fn first_handler(&self, option: &str) -> Result<&Arc<dyn OptionHandler>> {
        self.handlers_for(option)
            .first()
            .ok_or_else(|| Error::UnknownOption(option.to_owned()))
    }
}

impl Dispatch for MultiHandler {
    fn get(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        self.first_handler(option)?.get_option(option, ty)
    }

    fn set(&self, option: &str, value: &TclObj) -> Result<()> {
        for handler in self.handlers_for(option) {
            handler.set_option(option, value)?;
        }
        Ok(())
    }

    fn list(&self, _declared: &[String]) -> Result<Vec<String>> {
        let mut handlers: Vec<&Arc<dyn OptionHandler>> = Vec::new();
        let all = self
            .wildcard
            .iter()
            .chain(self.routes.iter().flat_map(|(_, routed)| routed));
        for handler in all {
            if !handlers.iter().any(|h| same_handler(h, handler)) {
                handlers.push(handler);
            }
        }

        let mut options = Vec::new();
        for handler in handlers {
            for option in handler.list_options()? {
                let routed_here = match self.handlers_for(&option).first() {
                    Some(first) => same_handler(first, handler),
                    None => false,
                };
                if routed_here && !options.contains(&option) {
                    options.push(option);
                }
            }
        }
        Ok(options)
    }
}
