fn main() {
    println!("cargo:rustc-link-lib=tcl8.6");
    println!("cargo:rustc-link-lib=tk8.6");
    println!("cargo:rerun-if-changed=wrapper.h");

    #[cfg(feature = "bindgen")]
    generate();
}

#[cfg(feature = "bindgen")]
fn generate() {
    use std::{env, path::PathBuf};

    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_arg("-I/usr/include/tcl8.6/")
        .allowlist_function("Tcl_.*|Tk_Init")
        .allowlist_var("TCL_.*")
        .generate()
        .expect("Unable to generate bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("bindings.rs"))
        .expect("Couldn't write bindings!");
}
