//! Fonts, through Tk's `font` command.
//!
//! A [`Font`] is either a named font, which can be reconfigured and affects every widget using
//! it, or a plain description like `{Helvetica 12 bold}`.

use std::{fmt, sync::Arc};

use log::debug;

use tclinterp::{ReturnType, TclObj, TclValue, ToTclObj};

use crate::{
    app::{AppRef, TkApp},
    config::{ConfigDict, Direct, DirectConfigDict, OptionHandler},
    error::{Error, Result},
};

/// Everything `font actual` reports about a font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDescription {
    pub family: String,
    /// Points if positive, pixels if negative.
    pub size: i64,
    /// `normal` or `bold`.
    pub weight: String,
    /// `roman` or `italic`.
    pub slant: String,
    pub underline: bool,
    pub overstrike: bool,
}

impl FontDescription {
    pub fn new(family: &str, size: i64) -> Self {
        Self {
            family: family.to_owned(),
            size,
            weight: "normal".to_owned(),
            slant: "roman".to_owned(),
            underline: false,
            overstrike: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = "bold".to_owned();
        self
    }

    pub fn italic(mut self) -> Self {
        self.slant = "italic".to_owned();
        self
    }

    /// `-option value` pairs, as `font create` and `font configure` take them.
    fn to_options(&self) -> Vec<TclObj> {
        vec![
            TclObj::from("-family"),
            TclObj::from(self.family.as_str()),
            TclObj::from("-size"),
            self.size.to_tcl_obj(),
            TclObj::from("-weight"),
            TclObj::from(self.weight.as_str()),
            TclObj::from("-slant"),
            TclObj::from(self.slant.as_str()),
            TclObj::from("-underline"),
            self.underline.to_tcl_obj(),
            TclObj::from("-overstrike"),
            self.overstrike.to_tcl_obj(),
        ]
    }

    fn from_pairs(pairs: &[String]) -> Result<Self> {
        let mut description = Self::new("", 0);
        for pair in pairs.chunks(2) {
            let (option, value) = match pair {
                [option, value] => (option.as_str(), value.as_str()),
                _ => break,
            };
            match option {
                "-family" => description.family = value.to_owned(),
                "-size" => description.size = value.parse().unwrap_or(0),
                "-weight" => description.weight = value.to_owned(),
                "-slant" => description.slant = value.to_owned(),
                "-underline" => description.underline = tclinterp::parse_boolean(value)?,
                "-overstrike" => description.overstrike = tclinterp::parse_boolean(value)?,
                _ => {}
            }
        }
        Ok(description)
    }
}

/// `font metrics` of a font, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    pub ascent: i64,
    pub descent: i64,
    pub linespace: i64,
    /// Whether every character has the same width.
    pub fixed: bool,
}

fn strings(value: &TclValue) -> Vec<String> {
    value.to_strings().unwrap_or_default()
}

/// Options of a named font, through `font configure`.
struct FontConfigure {
    app: AppRef,
    name: String,
}

impl OptionHandler for FontConfigure {
    fn get_option(&self, option: &str, ty: &ReturnType) -> Result<TclValue> {
        self.app.upgrade()?.call(
            ty,
            vec!["font".to_owned(), "configure".to_owned(), self.name.clone(), format!("-{}", option)],
        )
    }

    fn set_option(&self, option: &str, value: &TclObj) -> Result<()> {
        self.app.upgrade()?.call(
            &ReturnType::Nothing,
            vec![
                TclObj::from("font"),
                TclObj::from("configure"),
                TclObj::from(self.name.as_str()),
                TclObj::new(format!("-{}", option)),
                value.clone(),
            ],
        )?;
        Ok(())
    }

    fn list_options(&self) -> Result<Vec<String>> {
        let pairs = self.app.upgrade()?.call(
            &ReturnType::list_of(ReturnType::Str),
            &["font", "configure", self.name.as_str()],
        )?;
        Ok(strings(&pairs)
            .iter()
            .step_by(2)
            .map(|option| option.trim_start_matches('-').to_owned())
            .collect())
    }
}

struct NamedFontData {
    app: AppRef,
    name: String,
    config: DirectConfigDict,
}

/// A font created with `font create`, or one of Tk's standard fonts like `TkDefaultFont`.
///
/// Changing its [`config()`](NamedFont::config) changes every widget that uses it.
#[derive(Clone)]
pub struct NamedFont(Arc<NamedFontData>);

impl NamedFont {
    fn wrap(app: &TkApp, name: &str) -> Self {
        let config = ConfigDict::new(Direct::new(FontConfigure {
            app: app.downgrade(),
            name: name.to_owned(),
        }));
        config.set_types([
            ("size", ReturnType::Int),
            ("underline", ReturnType::Bool),
            ("overstrike", ReturnType::Bool),
        ]);

        Self(Arc::new(NamedFontData {
            app: app.downgrade(),
            name: name.to_owned(),
            config,
        }))
    }

    /// A new named font with a generated name.
    pub fn create(app: &TkApp, description: &FontDescription) -> Result<Self> {
        let mut argv = vec![TclObj::from("font"), TclObj::from("create")];
        argv.extend(description.to_options());
        let name = app.call(&ReturnType::Str, argv)?;
        let name = name.as_str().unwrap_or_default();
        debug!("Created font {}", name);
        Ok(Self::wrap(app, name))
    }

    /// The named font called `name`, which must exist.
    pub fn from_name(app: &TkApp, name: &str) -> Result<Self> {
        if !Self::names(app)?.iter().any(|n| n == name) {
            return Err(Error::NotAttached(format!("there is no font named {:?}", name)));
        }
        Ok(Self::wrap(app, name))
    }

    /// The names of all named fonts.
    pub fn names(app: &TkApp) -> Result<Vec<String>> {
        let names = app.call(&ReturnType::list_of(ReturnType::Str), &["font", "names"])?;
        Ok(strings(&names))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn config(&self) -> &DirectConfigDict {
        &self.0.config
    }

    /// Delete the font. Widgets using it keep their look until Tk picks a replacement.
    pub fn delete(&self) -> Result<()> {
        self.0
            .app
            .upgrade()?
            .call(&ReturnType::Nothing, &["font", "delete", self.name()])?;
        debug!("Deleted font {}", self.name());
        Ok(())
    }

    pub fn same_as(&self, other: &NamedFont) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NamedFont {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NamedFont({:?})", self.name())
    }
}

#[derive(Clone)]
enum Repr {
    Named(NamedFont),
    Description(String),
}

/// A font as widget `font` options use it.
#[derive(Clone)]
pub struct Font {
    app: AppRef,
    repr: Repr,
}

impl Font {
    /// The font for a widget's `font` option value: a named font if `value` names one,
    /// otherwise a font description.
    pub fn from_tcl(app: &TkApp, value: &str) -> Result<Self> {
        let repr = if NamedFont::names(app)?.iter().any(|name| name == value) {
            Repr::Named(NamedFont::wrap(app, value))
        } else {
            Repr::Description(value.to_owned())
        };
        Ok(Self {
            app: app.downgrade(),
            repr,
        })
    }

    pub fn named(font: &NamedFont) -> Self {
        Self {
            app: font.0.app.clone(),
            repr: Repr::Named(font.clone()),
        }
    }

    /// A font that is only a description, like `{Courier 12 bold}`.
    pub fn from_description(app: &TkApp, description: &FontDescription) -> Self {
        let value = TclObj::list(description.to_options());
        Self {
            app: app.downgrade(),
            repr: Repr::Description(value.as_str().to_owned()),
        }
    }

    /// The named font, if this is one.
    pub fn as_named(&self) -> Option<&NamedFont> {
        match &self.repr {
            Repr::Named(font) => Some(font),
            Repr::Description(_) => None,
        }
    }

    pub fn to_tcl(&self) -> &str {
        match &self.repr {
            Repr::Named(font) => font.name(),
            Repr::Description(value) => value,
        }
    }

    /// What Tk actually uses for this font, which may differ from what was asked for.
    pub fn actual(&self) -> Result<FontDescription> {
        let pairs = self.app.upgrade()?.call(
            &ReturnType::list_of(ReturnType::Str),
            &["font", "actual", self.to_tcl()],
        )?;
        FontDescription::from_pairs(&strings(&pairs))
    }

    /// How many pixels wide `text` is in this font.
    pub fn measure(&self, text: &str) -> Result<i64> {
        let width = self
            .app
            .upgrade()?
            .call(&ReturnType::Int, &["font", "measure", self.to_tcl(), text])?;
        Ok(width.as_int().unwrap_or(0))
    }

    pub fn metrics(&self) -> Result<FontMetrics> {
        let pairs = self.app.upgrade()?.call(
            &ReturnType::list_of(ReturnType::Str),
            &["font", "metrics", self.to_tcl()],
        )?;
        let pairs = strings(&pairs);
        let metric = |name: &str| -> i64 {
            pairs
                .chunks(2)
                .find(|pair| pair[0] == name)
                .and_then(|pair| pair.get(1))
                .and_then(|value| value.parse().ok())
                .unwrap_or(0)
        };
        Ok(FontMetrics {
            ascent: metric("-ascent"),
            descent: metric("-descent"),
            linespace: metric("-linespace"),
            fixed: metric("-fixed") != 0,
        })
    }

    /// Every font family Tk knows about.
    pub fn families(app: &TkApp) -> Result<Vec<String>> {
        let families = app.call(&ReturnType::list_of(ReturnType::Str), &["font", "families"])?;
        Ok(strings(&families))
    }
}

impl ToTclObj for &Font {
    fn to_tcl_obj(self) -> TclObj {
        TclObj::from(self.to_tcl())
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.repr {
            Repr::Named(font) => write!(f, "Font({:?})", font),
            Repr::Description(value) => write!(f, "Font({:?})", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::widgets::{Label, TkWidget, Window};

    #[test]
    fn test_description_fonts() {
        let app = TkApp::simulated().unwrap();
        let font = Font::from_tcl(&app, "Helvetica 10").unwrap();
        assert!(font.as_named().is_none());
        assert_eq!(font.measure("hello").unwrap(), 30);

        let courier = Font::from_description(&app, &FontDescription::new("Courier", 12).bold());
        let actual = courier.actual().unwrap();
        assert_eq!(actual, FontDescription::new("Courier", 12).bold());
        assert!(courier.metrics().unwrap().fixed);

        assert!(Font::families(&app).unwrap().contains(&"Times".to_owned()));
        assert!(Font::from_tcl(&app, "Courier huge").unwrap().actual().is_err());
    }

    #[test]
    fn test_standard_fonts() {
        let app = TkApp::simulated().unwrap();
        let fixed = Font::from_tcl(&app, "TkFixedFont").unwrap();
        assert_eq!(fixed.as_named().unwrap().name(), "TkFixedFont");
        assert_eq!(
            fixed.metrics().unwrap(),
            FontMetrics {
                ascent: 10,
                descent: 2,
                linespace: 12,
                fixed: true,
            }
        );
        assert!(matches!(
            NamedFont::from_name(&app, "NoSuchFont"),
            Err(Error::NotAttached(_))
        ));
    }

    #[test]
    fn test_named_font() {
        let app = TkApp::simulated().unwrap();
        let title = NamedFont::create(&app, &FontDescription::new("Times", 14).italic()).unwrap();
        assert!(NamedFont::names(&app).unwrap().contains(&title.name().to_owned()));

        assert_eq!(title.config().get("size").unwrap(), TclValue::Int(14));
        title.config().set("size", 20).unwrap();
        title.config().set("underline", true).unwrap();
        assert_eq!(title.config().get("underline").unwrap(), TclValue::Bool(true));
        assert!(title.config().keys().unwrap().contains(&"overstrike".to_owned()));
        assert!(matches!(
            title.config().set("size", "big"),
            Err(Error::Tcl(_))
        ));

        let font = Font::named(&title);
        assert_eq!(font.actual().unwrap().size, 20);
        assert_eq!(font.actual().unwrap().slant, "italic");

        let window = Window::new(&app).unwrap();
        let label = Label::new(&window, "big").unwrap();
        label.config().set("font", &font).unwrap();
        let used = label.config().get("font").unwrap();
        let used = Font::from_tcl(&app, used.as_str().unwrap()).unwrap();
        assert!(used.as_named().unwrap().name() == title.name());

        title.delete().unwrap();
        assert!(title.config().get("size").is_err());
        assert!(title.delete().is_err());
    }
}
