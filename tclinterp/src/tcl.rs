//! The real interpreter, through `tcl-sys`.

use std::{
    ffi::{CStr, CString},
    os::raw::{c_char, c_int},
    panic,
    ptr::{self, NonNull},
    slice,
    sync::Once,
    thread,
};

use log::{debug, trace, warn};

use crate::{
    backend::{Backend, Invoke, Reply},
    error::{Result, TclError},
};

static FIND_EXECUTABLE: Once = Once::new();

fn init_library() {
    FIND_EXECUTABLE.call_once(|| unsafe { tcl_sys::Tcl_FindExecutable(ptr::null()) });
}

fn c_string(s: &str, what: &str) -> Result<CString> {
    CString::new(s).map_err(|_| TclError::new(format!("{} must not contain NUL bytes.", what)))
}

fn status_ok(status: c_int) -> bool {
    status == tcl_sys::TCL_OK as c_int
}

const FILE: &str = concat!(file!(), "\0");

/// Copy the string representation of `obj`.
unsafe fn obj_to_string(obj: *mut tcl_sys::Tcl_Obj) -> String {
    if obj.is_null() {
        return String::new();
    }

    let mut length: c_int = 0;
    let data = tcl_sys::Tcl_GetStringFromObj(obj, &mut length);
    if data.is_null() {
        return String::new();
    }
    String::from_utf8_lossy(slice::from_raw_parts(data as *const u8, length as usize)).into_owned()
}

fn new_string_obj(s: &str) -> *mut tcl_sys::Tcl_Obj {
    // `Tcl_NewStringObj` copies its argument.
    unsafe { tcl_sys::Tcl_NewStringObj(s.as_ptr() as *const c_char, s.len() as c_int) }
}

unsafe fn interp_result(interp: *mut tcl_sys::Tcl_Interp) -> String {
    obj_to_string(tcl_sys::Tcl_GetObjResult(interp))
}

/// Argument objects for `Tcl_EvalObjv`. They are released when this is dropped.
struct Objv(Vec<*mut tcl_sys::Tcl_Obj>);

impl Objv {
    fn new(argv: &[String]) -> Self {
        Self(
            argv.iter()
                .map(|arg| {
                    let obj = new_string_obj(arg);
                    unsafe {
                        tcl_sys::Tcl_DbIncrRefCount(obj, FILE.as_ptr() as *const c_char, line!() as c_int)
                    };
                    obj
                })
                .collect(),
        )
    }

    fn len(&self) -> c_int {
        self.0.len() as c_int
    }

    fn as_ptr(&self) -> *const *mut tcl_sys::Tcl_Obj {
        self.0.as_ptr()
    }
}

impl Drop for Objv {
    fn drop(&mut self) {
        for &obj in &self.0 {
            unsafe {
                tcl_sys::Tcl_DbDecrRefCount(obj, FILE.as_ptr() as *const c_char, line!() as c_int)
            };
        }
    }
}

/// A bare interpreter for the list and boolean parsers, which want one for their error messages.
struct Scratch(NonNull<tcl_sys::Tcl_Interp>);

impl Drop for Scratch {
    fn drop(&mut self) {
        unsafe { tcl_sys::Tcl_DeleteInterp(self.0.as_ptr()) };
    }
}

thread_local! {
    static SCRATCH: Option<Scratch> = {
        init_library();
        NonNull::new(unsafe { tcl_sys::Tcl_CreateInterp() }).map(Scratch)
    };
}

fn with_scratch<T>(f: impl FnOnce(*mut tcl_sys::Tcl_Interp) -> Result<T>) -> Result<T> {
    SCRATCH.with(|scratch| match scratch {
        Some(scratch) => f(scratch.0.as_ptr()),
        None => Err(TclError::new("Tcl_CreateInterp() returned NULL")),
    })
}

/// Split a Tcl list into its elements with `Tcl_SplitList`.
pub fn split_list(list: &str) -> Result<Vec<String>> {
    let c_list = c_string(list, "list")?;

    with_scratch(|interp| unsafe {
        let mut argc: c_int = 0;
        let mut argv: *mut *const c_char = ptr::null_mut();

        if !status_ok(tcl_sys::Tcl_SplitList(
            interp,
            c_list.as_ptr(),
            &mut argc,
            &mut argv,
        )) {
            return Err(TclError::new(interp_result(interp)));
        }

        let elements = if argv.is_null() || argc == 0 {
            Vec::new()
        } else {
            slice::from_raw_parts(argv, argc as usize)
                .iter()
                .map(|&element| CStr::from_ptr(element).to_string_lossy().into_owned())
                .collect()
        };

        if !argv.is_null() {
            tcl_sys::Tcl_Free(argv as *mut c_char);
        }
        Ok(elements)
    })
}

/// Convert a Tcl boolean to a Rust bool with `Tcl_GetBoolean`.
pub fn parse_boolean(s: &str) -> Result<bool> {
    let c_s = c_string(s, "Argument")?;

    with_scratch(|interp| unsafe {
        let mut value: c_int = 0;
        if status_ok(tcl_sys::Tcl_GetBoolean(interp, c_s.as_ptr(), &mut value)) {
            Ok(value != 0)
        } else {
            Err(TclError::new(interp_result(interp)))
        }
    })
}

unsafe extern "C" fn run_command(
    client_data: tcl_sys::ClientData,
    interp: *mut tcl_sys::Tcl_Interp,
    objc: c_int,
    objv: *const *mut tcl_sys::Tcl_Obj,
) -> c_int {
    let invoke = &*(client_data as *const Invoke);

    let args = slice::from_raw_parts(objv, objc as usize)
        .iter()
        .skip(1)
        .map(|&obj| obj_to_string(obj))
        .collect::<Vec<_>>();
    trace!("Tcl is calling a Rust command with {:?}", args);

    // Unwinding into C is undefined behaviour.
    let (status, result) = match panic::catch_unwind(panic::AssertUnwindSafe(|| invoke(&args))) {
        Ok(Ok(value)) => (tcl_sys::TCL_OK, value),
        Ok(Err(message)) => (tcl_sys::TCL_ERROR, message),
        Err(_) => (tcl_sys::TCL_ERROR, String::from("a Rust command panicked")),
    };

    if tcl_sys::Tcl_InterpDeleted(interp) == 0 {
        tcl_sys::Tcl_SetObjResult(interp, new_string_obj(&result));
    }
    status as c_int
}

unsafe extern "C" fn drop_command(client_data: tcl_sys::ClientData) {
    drop(Box::from_raw(client_data as *mut Invoke));
}

/// A `*Tcl_Interp` created with `Tcl_CreateInterp()`.
pub struct TclBackend {
    interp: NonNull<tcl_sys::Tcl_Interp>,
    owner: thread::ThreadId,
}

// The pointer is only used on `owner`, `TclInterp` posts calls from other threads there.
unsafe impl Send for TclBackend {}
unsafe impl Sync for TclBackend {}

impl TclBackend {
    /// Create a new Tcl interpreter owned by the calling thread.
    ///
    /// # Errors
    /// This fails if `Tcl_CreateInterp()` returns a null pointer or if `Tcl_Init()` fails.
    pub fn new() -> Result<Self> {
        init_library();

        let interp = NonNull::new(unsafe { tcl_sys::Tcl_CreateInterp() })
            .ok_or_else(|| TclError::new("Tcl_CreateInterp() returned NULL"))?;
        let backend = Self {
            interp,
            owner: thread::current().id(),
        };

        backend.check(unsafe { tcl_sys::Tcl_Init(interp.as_ptr()) })?;
        backend.eval("rename exit {}")?;
        debug!("Created a Tcl interpreter");

        Ok(backend)
    }

    fn interp_ptr(&self) -> Result<*mut tcl_sys::Tcl_Interp> {
        debug_assert_eq!(thread::current().id(), self.owner);

        if self.deleted() {
            return Err(TclError::new("Tried to use interpreter after deletion"));
        }
        Ok(self.interp.as_ptr())
    }

    fn deleted(&self) -> bool {
        unsafe { tcl_sys::Tcl_InterpDeleted(self.interp.as_ptr()) != 0 }
    }

    fn check(&self, status: c_int) -> Result<()> {
        if status_ok(status) {
            Ok(())
        } else {
            Err(TclError::new(unsafe { interp_result(self.interp.as_ptr()) }))
        }
    }

    fn result(&self) -> Reply {
        Reply::Value(unsafe { interp_result(self.interp.as_ptr()) })
    }
}

impl Backend for TclBackend {
    fn call(&self, argv: &[String]) -> Result<Reply> {
        let interp = self.interp_ptr()?;
        let objv = Objv::new(argv);

        self.check(unsafe { tcl_sys::Tcl_EvalObjv(interp, objv.len(), objv.as_ptr(), 0) })?;
        Ok(self.result())
    }

    fn eval(&self, code: &str) -> Result<Reply> {
        let interp = self.interp_ptr()?;

        self.check(unsafe {
            tcl_sys::Tcl_EvalEx(
                interp,
                code.as_ptr() as *const c_char,
                code.len() as c_int,
                0,
            )
        })?;
        Ok(self.result())
    }

    fn init_tk(&self) -> Result<()> {
        let interp = self.interp_ptr()?;
        self.check(unsafe { tcl_sys::Tk_Init(interp) })
    }

    fn create_command(&self, name: &str, invoke: Invoke) -> Result<()> {
        let interp = self.interp_ptr()?;
        let c_name = c_string(name, "name")?;
        let client_data = Box::into_raw(Box::new(invoke));

        let token = unsafe {
            tcl_sys::Tcl_CreateObjCommand(
                interp,
                c_name.as_ptr(),
                Some(run_command),
                client_data as tcl_sys::ClientData,
                Some(drop_command),
            )
        };

        if token.is_null() {
            drop(unsafe { Box::from_raw(client_data) });
            return Err(TclError::new("Tcl_CreateObjCommand() returned NULL"));
        }
        Ok(())
    }

    fn delete_command(&self, name: &str) -> Result<()> {
        let interp = self.interp_ptr()?;
        let c_name = c_string(name, "name")?;

        match unsafe { tcl_sys::Tcl_DeleteCommand(interp, c_name.as_ptr()) } {
            0 => Ok(()),
            _ => Err(TclError::new(format!(
                "Command with name {:?} does not exist.",
                name
            ))),
        }
    }

    fn do_one_event(&self) -> bool {
        if self.deleted() {
            return false;
        }
        unsafe { tcl_sys::Tcl_DoOneEvent(tcl_sys::TCL_DONT_WAIT as c_int) != 0 }
    }

    fn delete(&self) {
        if !self.deleted() {
            debug!("Deleting the Tcl interpreter");
            unsafe { tcl_sys::Tcl_DeleteInterp(self.interp.as_ptr()) };
        }
    }
}

impl Drop for TclBackend {
    fn drop(&mut self) {
        if thread::current().id() == self.owner {
            self.delete();
        } else {
            warn!("A Tcl interpreter was dropped outside of its thread and can not be deleted");
        }
    }
}
