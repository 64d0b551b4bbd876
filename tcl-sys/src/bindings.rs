//! The part of `tcl.h` and `tk.h` that `tclinterp` uses, written the way bindgen writes it.

use std::os::raw::{c_char, c_int, c_void};

pub const TCL_OK: u32 = 0;
pub const TCL_ERROR: u32 = 1;
pub const TCL_DONT_WAIT: u32 = 2;
pub const TCL_ALL_EVENTS: i32 = -3;

#[repr(C)]
pub struct Tcl_Interp {
    _private: [u8; 0],
}

#[repr(C)]
pub struct Tcl_Obj {
    _private: [u8; 0],
}

#[repr(C)]
pub struct Tcl_Command_ {
    _private: [u8; 0],
}

pub type Tcl_Command = *mut Tcl_Command_;
pub type ClientData = *mut c_void;

pub type Tcl_ObjCmdProc = Option<
    unsafe extern "C" fn(
        clientData: ClientData,
        interp: *mut Tcl_Interp,
        objc: c_int,
        objv: *const *mut Tcl_Obj,
    ) -> c_int,
>;
pub type Tcl_CmdDeleteProc = Option<unsafe extern "C" fn(clientData: ClientData)>;

extern "C" {
    pub fn Tcl_FindExecutable(argv0: *const c_char);

    pub fn Tcl_CreateInterp() -> *mut Tcl_Interp;
    pub fn Tcl_Init(interp: *mut Tcl_Interp) -> c_int;
    pub fn Tcl_DeleteInterp(interp: *mut Tcl_Interp);
    pub fn Tcl_InterpDeleted(interp: *mut Tcl_Interp) -> c_int;

    pub fn Tcl_EvalEx(
        interp: *mut Tcl_Interp,
        script: *const c_char,
        numBytes: c_int,
        flags: c_int,
    ) -> c_int;
    pub fn Tcl_EvalObjv(
        interp: *mut Tcl_Interp,
        objc: c_int,
        objv: *const *mut Tcl_Obj,
        flags: c_int,
    ) -> c_int;
    pub fn Tcl_GetObjResult(interp: *mut Tcl_Interp) -> *mut Tcl_Obj;
    pub fn Tcl_SetObjResult(interp: *mut Tcl_Interp, resultObjPtr: *mut Tcl_Obj);

    pub fn Tcl_NewStringObj(bytes: *const c_char, length: c_int) -> *mut Tcl_Obj;
    pub fn Tcl_GetStringFromObj(objPtr: *mut Tcl_Obj, lengthPtr: *mut c_int) -> *mut c_char;
    pub fn Tcl_DbIncrRefCount(objPtr: *mut Tcl_Obj, file: *const c_char, line: c_int);
    pub fn Tcl_DbDecrRefCount(objPtr: *mut Tcl_Obj, file: *const c_char, line: c_int);

    pub fn Tcl_SplitList(
        interp: *mut Tcl_Interp,
        listStr: *const c_char,
        argcPtr: *mut c_int,
        argvPtr: *mut *mut *const c_char,
    ) -> c_int;
    pub fn Tcl_GetBoolean(
        interp: *mut Tcl_Interp,
        src: *const c_char,
        boolPtr: *mut c_int,
    ) -> c_int;
    pub fn Tcl_Free(ptr: *mut c_char);

    pub fn Tcl_CreateObjCommand(
        interp: *mut Tcl_Interp,
        cmdName: *const c_char,
        proc_: Tcl_ObjCmdProc,
        clientData: ClientData,
        deleteProc: Tcl_CmdDeleteProc,
    ) -> Tcl_Command;
    pub fn Tcl_DeleteCommand(interp: *mut Tcl_Interp, cmdName: *const c_char) -> c_int;

    pub fn Tcl_DoOneEvent(flags: c_int) -> c_int;

    pub fn Tk_Init(interp: *mut Tcl_Interp) -> c_int;
}
