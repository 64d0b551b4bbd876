//! The `font` command, with made-up but consistent metrics.

use std::collections::BTreeMap;

use crate::{
    error::{Result, TclError},
    list::{merge, split_list},
};

const FAMILIES: &[&str] = &["Courier", "DejaVu Sans", "Helvetica", "Times"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct FontSpec {
    family: String,
    size: i64,
    weight: String,
    slant: String,
    underline: bool,
    overstrike: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Helvetica".to_owned(),
            size: 10,
            weight: "normal".to_owned(),
            slant: "roman".to_owned(),
            underline: false,
            overstrike: false,
        }
    }
}

fn flag(b: bool) -> String {
    String::from(if b { "1" } else { "0" })
}

impl FontSpec {
    fn with_family(family: &str, size: i64, weight: &str) -> Self {
        Self {
            family: family.to_owned(),
            size,
            weight: weight.to_owned(),
            ..Self::default()
        }
    }

    fn get(&self, option: &str) -> Result<String> {
        match option {
            "-family" => Ok(self.family.clone()),
            "-size" => Ok(self.size.to_string()),
            "-weight" => Ok(self.weight.clone()),
            "-slant" => Ok(self.slant.clone()),
            "-underline" => Ok(flag(self.underline)),
            "-overstrike" => Ok(flag(self.overstrike)),
            other => Err(TclError::new(format!(
                "bad option \"{}\": must be -family, -size, -weight, -slant, -underline, or \
                 -overstrike",
                other
            ))),
        }
    }

    fn flat(&self) -> String {
        merge(
            ["-family", "-size", "-weight", "-slant", "-underline", "-overstrike"]
                .iter()
                .flat_map(|option| {
                    vec![(*option).to_owned(), self.get(option).unwrap_or_default()]
                }),
        )
    }

    fn set(&mut self, option: &str, value: &str) -> Result<()> {
        match option {
            "-family" => self.family = value.to_owned(),
            "-size" => {
                self.size = value
                    .trim()
                    .parse()
                    .map_err(|_| TclError::expected("integer", value))?
            }
            "-weight" => match value {
                "normal" | "bold" => self.weight = value.to_owned(),
                _ => {
                    return Err(TclError::new(format!(
                        "bad -weight value \"{}\": must be normal, or bold",
                        value
                    )))
                }
            },
            "-slant" => match value {
                "roman" | "italic" => self.slant = value.to_owned(),
                _ => {
                    return Err(TclError::new(format!(
                        "bad -slant value \"{}\": must be roman, or italic",
                        value
                    )))
                }
            },
            "-underline" => self.underline = crate::list::parse_boolean(value)?,
            "-overstrike" => self.overstrike = crate::list::parse_boolean(value)?,
            other => {
                self.get(other)?;
            }
        }
        Ok(())
    }

    fn set_pairs(&mut self, args: &[String]) -> Result<()> {
        if args.len() % 2 != 0 {
            return Err(TclError::new(format!(
                "value for \"{}\" missing",
                args[args.len() - 1]
            )));
        }
        let mut staged = self.clone();
        for pair in args.chunks(2) {
            staged.set(&pair[0], &pair[1])?;
        }
        *self = staged;
        Ok(())
    }

    /// `{family size style...}` or `-option value ...`.
    fn parse(description: &str) -> Result<Self> {
        let words = split_list(description)?;
        let mut spec = Self::default();
        if words.first().map_or(false, |w| w.starts_with('-')) {
            spec.set_pairs(&words)?;
            return Ok(spec);
        }

        let mut words = words.into_iter();
        match words.next() {
            Some(family) => spec.family = family,
            None => return Err(TclError::new("font \"\" doesn't exist")),
        }
        if let Some(size) = words.next() {
            spec.set("-size", &size)?;
        }
        for style in words {
            match style.as_str() {
                "normal" | "bold" => spec.weight = style,
                "roman" | "italic" => spec.slant = style,
                "underline" => spec.underline = true,
                "overstrike" => spec.overstrike = true,
                _ => {
                    return Err(TclError::new(format!(
                        "unknown font style \"{}\"",
                        style
                    )))
                }
            }
        }
        Ok(spec)
    }
}

#[derive(Debug)]
pub struct Fonts {
    named: BTreeMap<String, FontSpec>,
    counter: u64,
}

impl Default for Fonts {
    fn default() -> Self {
        let mut named = BTreeMap::new();
        named.insert("TkDefaultFont".to_owned(), FontSpec::default());
        named.insert("TkTextFont".to_owned(), FontSpec::default());
        named.insert("TkFixedFont".to_owned(), FontSpec::with_family("Courier", 10, "normal"));
        named.insert(
            "TkHeadingFont".to_owned(),
            FontSpec::with_family("Helvetica", 10, "bold"),
        );
        named.insert("TkMenuFont".to_owned(), FontSpec::default());
        Self { named, counter: 0 }
    }
}

impl Fonts {
    fn resolve(&self, font: &str) -> Result<FontSpec> {
        match self.named.get(font) {
            Some(spec) => Ok(spec.clone()),
            None => FontSpec::parse(font),
        }
    }

    fn named_mut(&mut self, name: &str) -> Result<&mut FontSpec> {
        self.named
            .get_mut(name)
            .ok_or_else(|| TclError::new(format!("named font \"{}\" doesn't exist", name)))
    }

    fn create(&mut self, args: &[String]) -> Result<String> {
        let (name, options) = match args {
            [name, options @ ..] if !name.starts_with('-') => (name.clone(), options),
            _ => {
                self.counter += 1;
                (format!("font{}", self.counter), args)
            }
        };
        if self.named.contains_key(&name) {
            return Err(TclError::new(format!("named font \"{}\" already exists", name)));
        }

        let mut spec = FontSpec::default();
        spec.set_pairs(options)?;
        self.named.insert(name.clone(), spec);
        Ok(name)
    }

    pub fn command(&mut self, args: &[String]) -> Result<String> {
        let (subcommand, rest) = match args {
            [subcommand, rest @ ..] => (subcommand.as_str(), rest),
            _ => return Err(TclError::wrong_args("font option ?arg?")),
        };

        match (subcommand, rest) {
            ("actual", [font]) => self.resolve(font).map(|spec| spec.flat()),
            ("actual", [font, option]) => self.resolve(font)?.get(option),
            ("actual", _) => Err(TclError::wrong_args("font actual font ?-option?")),

            ("configure", [name]) => self.named_mut(name).map(|spec| spec.flat()),
            ("configure", [name, option]) => self.named_mut(name)?.get(option),
            ("configure", [name, options @ ..]) => self
                .named_mut(name)?
                .set_pairs(options)
                .map(|()| String::new()),
            ("configure", _) => Err(TclError::wrong_args("font configure fontname ?-option value ...?")),

            ("create", _) => self.create(rest),

            ("delete", names) => {
                for name in names {
                    self.named_mut(name)?;
                    self.named.remove(name.as_str());
                }
                Ok(String::new())
            }

            ("families", []) => Ok(merge(FAMILIES)),
            ("names", []) => Ok(merge(self.named.keys())),

            ("measure", [font, text]) => {
                let spec = self.resolve(font)?;
                let width = (spec.size.abs() * 3 + 4) / 5;
                Ok((text.chars().count() as i64 * width).to_string())
            }
            ("measure", _) => Err(TclError::wrong_args("font measure font text")),

            ("metrics", [font, rest @ ..]) => {
                let spec = self.resolve(font)?;
                let size = spec.size.abs();
                let metrics = [
                    ("-ascent", size),
                    ("-descent", size / 4),
                    ("-linespace", size + size / 4),
                    ("-fixed", i64::from(spec.family == "Courier")),
                ];
                match rest {
                    [] => Ok(merge(metrics.iter().flat_map(|(name, value)| {
                        vec![(*name).to_owned(), value.to_string()]
                    }))),
                    [option] => metrics
                        .iter()
                        .find(|(name, _)| *name == option.as_str())
                        .map(|(_, value)| value.to_string())
                        .ok_or_else(|| {
                            TclError::new(format!(
                                "bad metric \"{}\": must be -ascent, -descent, -linespace, or \
                                 -fixed",
                                option
                            ))
                        }),
                    _ => Err(TclError::wrong_args("font metrics font ?-metric?")),
                }
            }
            ("metrics", _) => Err(TclError::wrong_args("font metrics font ?-metric?")),

            (other, _) => Err(TclError::new(format!(
                "bad option \"{}\": must be actual, configure, create, delete, families, \
                 measure, metrics, or names",
                other
            ))),
        }
    }
}
