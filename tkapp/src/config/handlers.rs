use std::sync::Weak;

use tclinterp::{ReturnType, TclObj, TclValue};

use super::OptionHandler;
use crate::{
    app::{AppRef, TkApp},
    error::{Error, Result},
};

fn dashed(option: &str) -> String {
    format!("-{}", option)
}

fn undashed(option: &str) -> String {
    option.strip_prefix('-').unwrap_or(option).to_owned()
}

/// The option names in what `configure` without arguments returns: one
/// `{-name dbName dbClass default value}` list per option.
fn described_options(descriptions: &TclValue) -> Vec<String> {
    descriptions
        .as_list()
        .unwrap_or_default()
        .iter()
        .filter_map(|description| description.as_list()?.first()?.as_str().map(undashed))
        .collect()
}

fn descriptions_type() -> ReturnType {
    ReturnType::list_of(ReturnType::list_of(ReturnType::Str))
}

/// Widget options, through `pathName cget` and `pathName configure`.
pub struct CgetConfigure {
    app: AppRef,
    path: String,
}

impl CgetConfigure {
    pub fn new(app: &TkApp, path: &str) -> Self {
        Self {
            app: app.downgrade(),
            path: path.to_owned(),
        }
    }
}

impl OptionHandler for CgetConfigure {
    fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        self.app.upgrade()?.widget_call(
            &self.path,
            ty,
            vec![self.path.clone(), "cget".to_owned(), dashed(option)],
        )
    }

    fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
        self.app.upgrade()?.widget_call(
            &self.path,
            &ReturnType::Nothing,
            vec![
                TclObj::from(self.path.as_str()),
                TclObj::from("configure"),
                TclObj::from(dashed(option)),
                value.clone(),
            ],
        )?;
        Ok(())
    }

    fn list_options(&self) -> Result<Vec<String>> {
        let descriptions = self.app.upgrade()?.widget_call(
            &self.path,
            &descriptions_type(),
            &[self.path.as_str(), "configure"],
        )?;
        Ok(described_options(&descriptions))
    }
}

/// Something option commands can be pointed at, like a treeview row.
pub trait CommandTarget: Send + Sync {
    /// The app, the path of the widget to call and the id to pass after the verb.
    ///
    /// Fails with `NotAttached` if the target isn't in a widget.
    fn locate(&self) -> Result<(TkApp, String, String)>;
}

fn locate(target: &Weak<dyn CommandTarget>, what: &str) -> Result<(TkApp, String, String)> {
    target
        .upgrade()
        .ok_or_else(|| Error::NotAttached(format!("the {} is gone", what)))?
        .locate()
}

/// Options set through a widget subcommand taking an id, like
/// `pathName item id ?-option ?value??`.
pub struct OptionCommand {
    verb: &'static str,
    target: Weak<dyn CommandTarget>,
}

impl OptionCommand {
    pub fn new(verb: &'static str, target: Weak<dyn CommandTarget>) -> Self {
        Self { verb, target }
    }

    fn locate(&self) -> Result<(TkApp, String, String)> {
        locate(&self.target, self.verb)
    }
}

impl OptionHandler for OptionCommand {
    fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        let (app, path, id) = self.locate()?;
        app.widget_call(
            &path,
            ty,
            vec![path.clone(), self.verb.to_owned(), id, dashed(option)],
        )
    }

    fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
        let (app, path, id) = self.locate()?;
        app.widget_call(
            &path,
            &ReturnType::Nothing,
            vec![
                TclObj::from(path.as_str()),
                TclObj::from(self.verb),
                TclObj::from(id),
                TclObj::from(dashed(option)),
                value.clone(),
            ],
        )?;
        Ok(())
    }

    fn list_options(&self) -> Result<Vec<String>> {
        let (app, path, id) = self.locate()?;
        let flat = app.widget_call(
            &path,
            &ReturnType::list_of(ReturnType::Str),
            vec![path.clone(), self.verb.to_owned(), id],
        )?;

        Ok(flat
            .as_list()
            .unwrap_or_default()
            .iter()
            .step_by(2)
            .filter_map(|option| option.as_str().map(undashed))
            .collect())
    }
}

/// Options of a menu entry, through `pathName entrycget` and `pathName entryconfigure`.
///
/// The target's id is the entry's index.
pub struct EntryCgetConfigure {
    target: Weak<dyn CommandTarget>,
}

impl EntryCgetConfigure {
    pub fn new(target: Weak<dyn CommandTarget>) -> Self {
        Self { target }
    }

    fn locate(&self) -> Result<(TkApp, String, String)> {
        locate(&self.target, "menu item")
    }
}

impl OptionHandler for EntryCgetConfigure {
    fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        let (app, path, index) = self.locate()?;
        app.widget_call(
            &path,
            ty,
            vec![path.clone(), "entrycget".to_owned(), index, dashed(option)],
        )
    }

    fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
        let (app, path, index) = self.locate()?;
        app.widget_call(
            &path,
            &ReturnType::Nothing,
            vec![
                TclObj::from(path.as_str()),
                TclObj::from("entryconfigure"),
                TclObj::from(index),
                TclObj::from(dashed(option)),
                value.clone(),
            ],
        )?;
        Ok(())
    }

    fn list_options(&self) -> Result<Vec<String>> {
        let (app, path, index) = self.locate()?;
        let descriptions = app.widget_call(
            &path,
            &descriptions_type(),
            vec![path.clone(), "entryconfigure".to_owned(), index],
        )?;
        Ok(described_options(&descriptions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    struct Item {
        app: TkApp,
        attached: bool,
    }

    impl CommandTarget for Item {
        fn locate(&self) -> Result<(TkApp, String, String)> {
            if self.attached {
                Ok((self.app.clone(), ".t".to_owned(), "x".to_owned()))
            } else {
                Err(Error::NotAttached("not in a treeview".to_owned()))
            }
        }
    }

    #[test]
    fn test_cget_configure() {
        let app = TkApp::simulated().unwrap();
        app.call(&ReturnType::Nothing, &["ttk::label", ".l"]).unwrap();

        let handler = CgetConfigure::new(&app, ".l");
        handler.set_option("text", &TclObj::from("hello")).unwrap();
        assert_eq!(
            handler.get_option("text", &ReturnType::Str).unwrap(),
            TclValue::from("hello")
        );
        assert_eq!(
            handler.get_option("underline", &ReturnType::Int).unwrap(),
            TclValue::Int(-1)
        );

        let options = handler.list_options().unwrap();
        assert!(options.contains(&"text".to_owned()));
        assert!(options.contains(&"wraplength".to_owned()));

        app.call(&ReturnType::Nothing, &["destroy", ".l"]).unwrap();
        assert!(matches!(
            handler.get_option("text", &ReturnType::Str),
            Err(Error::NotAttached(_))
        ));
    }

    #[test]
    fn test_option_command() {
        let app = TkApp::simulated().unwrap();
        app.call(&ReturnType::Nothing, &["ttk::treeview", ".t"]).unwrap();
        app.call(&ReturnType::Nothing, &[".t", "insert", "", "end", "-id", "x"])
            .unwrap();

        let item: Arc<dyn CommandTarget> = Arc::new(Item {
            app: app.clone(),
            attached: true,
        });
        let handler = OptionCommand::new("item", Arc::downgrade(&item));

        assert_eq!(
            handler.list_options().unwrap(),
            vec!["text", "image", "values", "open", "tags"]
        );
        handler.set_option("open", &TclObj::from("yes")).unwrap();
        assert_eq!(
            handler.get_option("open", &ReturnType::Bool).unwrap(),
            TclValue::Bool(true)
        );
        assert!(matches!(
            handler.set_option("nope", &TclObj::from("1")),
            Err(Error::Tcl(_))
        ));

        let detached: Arc<dyn CommandTarget> = Arc::new(Item {
            app,
            attached: false,
        });
        let handler = OptionCommand::new("item", Arc::downgrade(&detached));
        assert!(matches!(handler.list_options(), Err(Error::NotAttached(_))));

        drop(detached);
        assert!(matches!(handler.list_options(), Err(Error::NotAttached(_))));
    }

    #[test]
    fn test_entry_cget_configure() {
        let app = TkApp::simulated().unwrap();
        app.call(&ReturnType::Nothing, &["menu", ".m"]).unwrap();
        app.call(&ReturnType::Nothing, &[".m", "add", "command", "-label", "Open"])
            .unwrap();

        struct Entry(TkApp);
        impl CommandTarget for Entry {
            fn locate(&self) -> Result<(TkApp, String, String)> {
                Ok((self.0.clone(), ".m".to_owned(), "0".to_owned()))
            }
        }

        let entry: Arc<dyn CommandTarget> = Arc::new(Entry(app.clone()));
        let handler = EntryCgetConfigure::new(Arc::downgrade(&entry));

        assert_eq!(
            handler.get_option("label", &ReturnType::Str).unwrap(),
            TclValue::from("Open")
        );
        handler.set_option("underline", &TclObj::from("2")).unwrap();
        assert_eq!(
            handler.get_option("underline", &ReturnType::Int).unwrap(),
            TclValue::Int(2)
        );

        let options = handler.list_options().unwrap();
        assert!(options.contains(&"accelerator".to_owned()));
        assert!(!options.contains(&"value".to_owned()));
        assert!(matches!(
            handler.set_option("state", &TclObj::from("bogus")),
            Err(Error::Tcl(_))
        ));
    }
}
