use std::any::Any;

use super::*;
use crate::backend::Invoke;

pub type Command = fn(&CommandData, &[&str]) -> Result<TclObj, TclObj>;

/// Everything a Rust-implemented Tcl command needs when it runs.
pub struct CommandData {
    pub name: String,
    pub cmd: Command,
    pub data: Box<dyn Any + Send + Sync>,
}

impl TclInterp {
    /// Register a Tcl command implemented in Rust.
    ///
    /// Commands created this way shadow other commands with the same name. When the command is
    /// invoked, `cmd` gets the `data` given here and the arguments without the command name.
    pub fn createcommand(
        &self,
        name: &str,
        data: Box<dyn Any + Send + Sync>,
        cmd: Command,
    ) -> Result<()> {
        self.check_alive()?;
        if name.is_empty() {
            return Err(TclError::new("name must not be empty."));
        }

        let name = name.to_owned();
        self.on_main(move |interp| {
            debug!("Creating command {:?}", name);

            let command_data = Arc::new(CommandData {
                name: name.clone(),
                cmd,
                data,
            });

            {
                let mut inner = interp.0.lock();
                if inner.commands.contains_key(&name) {
                    return Err(TclError::new(format!(
                        "Command with name {:?} already exists.",
                        name
                    )));
                }
                inner.commands.insert(name.clone(), command_data.clone());
            }

            let invoke: Invoke = Arc::new(move |args: &[String]| {
                let args = args.iter().map(String::as_str).collect::<Vec<_>>();
                (command_data.cmd)(&command_data, &args)
                    .map(TclObj::into_string)
                    .map_err(TclObj::into_string)
            });

            interp.backend().create_command(&name, invoke).map_err(|err| {
                attr!(interp.commands).remove(&name);
                err
            })
        })
    }

    pub fn deletecommand(&self, name: &str) -> Result<()> {
        self.check_alive()?;

        let name = name.to_owned();
        self.on_main(move |interp| {
            debug!("Deleting command {:?}", name);

            // `backend()` locks too, so the guard must be gone first.
            let removed = attr!(interp.commands).remove(&name);
            match removed {
                Some(_) => interp.backend().delete_command(&name),
                None => Err(TclError::new(format!(
                    "Command with name {:?} does not exist.",
                    name
                ))),
            }
        })
    }

    pub fn has_command(&self, name: &str) -> bool {
        attr!(self.commands).contains_key(name)
    }
}
