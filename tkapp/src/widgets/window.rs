use std::fmt;

use log::warn;

use tclinterp::ReturnType;

use super::{AnyWidget, Menu, TkWidget, Widget, WindowManaged};
use crate::{
    app::TkApp,
    callback::Callback,
    error::{Error, Result},
};

/// A toplevel window.
///
/// Closing a window through the window manager runs [`on_delete_window`]. By default that quits
/// the event loop.
///
/// [`on_delete_window`]: WindowManaged::on_delete_window
#[derive(Clone)]
pub struct Window {
    widget: Widget,
    on_delete_window: Callback,
}

impl Window {
    pub fn new(app: &TkApp) -> Result<Self> {
        let widget = Widget::create(app, ".", "toplevel", "window", "Toplevel", Vec::new())?;
        Self::init(widget)
    }

    /// The proxy of the root window `.`, which every app has.
    pub fn root(app: &TkApp) -> Result<Self> {
        if let Some(existing) = app.registry().lookup(".").and_then(Self::from_any) {
            return Ok(existing);
        }
        Self::init(Widget::wrap(app, ".", "Tk"))
    }

    fn init(widget: Widget) -> Result<Self> {
        let app = widget.app()?;
        widget.config().set_type("menu", ReturnType::Widget);

        let on_delete_window = Callback::new();
        {
            let app = app.downgrade();
            on_delete_window.connect(move |_| {
                if let Err(err) = app.upgrade().and_then(|app| app.quit()) {
                    warn!("Could not quit: {}", err);
                }
            });
        }

        let command = widget.create_command(on_delete_window.clone(), &[])?;
        widget.call(
            &ReturnType::Nothing,
            &["wm", "protocol", widget.path(), "WM_DELETE_WINDOW", command.as_str()],
        )?;

        let window = Self {
            widget,
            on_delete_window,
        };
        app.registry().register(window.clone().into_any())?;
        Ok(window)
    }

    /// Show `menu` as this window's menu bar.
    pub fn set_menu(&self, menu: &Menu) -> Result<()> {
        self.config().set("menu", menu.path())
    }

    /// The menu bar, if there is one.
    pub fn menu(&self) -> Result<Option<Menu>> {
        let value = self.config().get("menu")?;
        match self.app()?.widget_of(&value)? {
            Some(any) => {
                let actual = any.kind();
                Menu::from_any(any).map(Some).ok_or_else(|| Error::TypeMismatch {
                    path: value.to_string(),
                    expected: Menu::KIND,
                    actual: actual.to_owned(),
                })
            }
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Window({:?})", self.widget)
    }
}

impl TkWidget for Window {
    const KIND: &'static str = "Window";

    fn widget(&self) -> &Widget {
        &self.widget
    }

    fn into_any(self) -> AnyWidget {
        AnyWidget::Window(self)
    }

    fn from_any(any: AnyWidget) -> Option<Self> {
        match any {
            AnyWidget::Window(window) => Some(window),
            _ => None,
        }
    }
}

impl WindowManaged for Window {
    fn on_delete_window(&self) -> &Callback {
        &self.on_delete_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use tclinterp::TclValue;

    #[test]
    fn test_root_is_registered() {
        let app = TkApp::simulated().unwrap();
        let root = Window::root(&app).unwrap();
        assert_eq!(root.path(), ".");
        assert!(Window::from_tcl(&app, ".").unwrap().widget().same_as(root.widget()));
        assert_eq!(root.widget().class_name(), "Tk");
    }

    #[test]
    fn test_wm() {
        let app = TkApp::simulated().unwrap();
        let window = Window::new(&app).unwrap();

        assert_eq!(window.title().unwrap(), "tk");
        window.set_title("Hello").unwrap();
        assert_eq!(window.title().unwrap(), "Hello");

        assert_eq!(window.wm_state().unwrap(), "normal");
        window.withdraw().unwrap();
        assert_eq!(window.wm_state().unwrap(), "withdrawn");
        window.deiconify().unwrap();
        assert_eq!(window.wm_state().unwrap(), "normal");
        window.set_wm_state("iconic").unwrap();
        assert_eq!(window.wm_state().unwrap(), "iconic");
        assert!(window.set_wm_state("sideways").is_err());
    }

    #[test]
    fn test_delete_window_protocol() {
        let app = TkApp::simulated().unwrap();
        let window = Window::new(&app).unwrap();

        let closed = Arc::new(AtomicBool::new(false));
        {
            let closed = closed.clone();
            window
                .on_delete_window()
                .connect(move |_| closed.store(true, Ordering::SeqCst));
        }

        let command = app
            .call(
                &ReturnType::Str,
                &["wm", "protocol", window.path(), "WM_DELETE_WINDOW"],
            )
            .unwrap();
        let command = match command {
            TclValue::Str(command) => command,
            other => panic!("unexpected {:?}", other),
        };
        app.call(&ReturnType::Nothing, &[command.as_str()]).unwrap();
        assert!(closed.load(Ordering::SeqCst));

        window.destroy().unwrap();
        assert!(app.call(&ReturnType::Nothing, &[command.as_str()]).is_err());
    }

    #[test]
    fn test_menu_bar() {
        let app = TkApp::simulated().unwrap();
        let window = Window::new(&app).unwrap();
        assert!(window.menu().unwrap().is_none());

        let menu = Menu::new(&window).unwrap();
        window.set_menu(&menu).unwrap();
        let shown = window.menu().unwrap().unwrap();
        assert!(shown.widget().same_as(menu.widget()));

        window.config().set("menu", window.path()).unwrap();
        assert!(matches!(
            window.menu(),
            Err(Error::TypeMismatch { expected: "Menu", .. })
        ));
    }
}
