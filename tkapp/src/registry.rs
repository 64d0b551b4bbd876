use std::collections::HashMap;

use log::debug;
use parking_lot::Mutex;

use crate::{
    error::{Error, Result},
    widgets::AnyWidget,
};

/// Maps widget paths to the one proxy object that represents each widget.
///
/// Every `TkApp` has its own registry. Widgets register themselves when they are created and are
/// forgotten when they are destroyed.
#[derive(Default)]
pub struct Registry {
    widgets: Mutex<HashMap<String, AnyWidget>>,
}

impl Registry {
    /// Fails with `IdentityConflict` if a different proxy already owns the widget's path.
    pub fn register(&self, widget: AnyWidget) -> Result<()> {
        let path = widget.path().to_owned();
        let mut widgets = self.widgets.lock();

        match widgets.get(&path) {
            Some(existing) if existing.same_as(&widget) => Ok(()),
            Some(_) => Err(Error::IdentityConflict(path)),
            None => {
                debug!("Registering {}", path);
                widgets.insert(path, widget);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, path: &str) -> Option<AnyWidget> {
        self.widgets.lock().get(path).cloned()
    }

    /// Look `path` up, building and registering a proxy with `ctor` if there isn't one yet.
    ///
    /// `ctor` runs without the registry locked; if another proxy got registered meanwhile, that
    /// one wins.
    pub fn register_or_lookup<F>(&self, path: &str, ctor: F) -> Result<AnyWidget>
    where
        F: FnOnce() -> Result<AnyWidget>,
    {
        if let Some(widget) = self.lookup(path) {
            return Ok(widget);
        }

        let widget = ctor()?;
        Ok(self
            .widgets
            .lock()
            .entry(path.to_owned())
            .or_insert(widget)
            .clone())
    }

    pub fn forget(&self, path: &str) -> Option<AnyWidget> {
        debug!("Forgetting {}", path);
        self.widgets.lock().remove(path)
    }

    pub fn len(&self) -> usize {
        self.widgets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.widgets.lock().clear();
    }
}
