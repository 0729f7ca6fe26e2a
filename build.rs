fn main() {
    // Stable Rust cannot define C-variadic functions, so the `...` entry
    // points live in a small C shim that forwards a `va_list*` to Rust.
    cc::Build::new()
        .file("csrc/mpy_varargs.c")
        .flag_if_supported("-std=c99")
        .flag_if_supported("-O2")
        .warnings(true)
        .compile("mpy_varargs");

    println!("cargo:rerun-if-changed=csrc/mpy_varargs.c");
}
