fn main() {
    // macOS: the geo_ao Python module resolves CPython symbols from the host
    // interpreter at load time, so leave them undefined at link time.
    #[cfg(target_os = "macos")]
    {
        if std::env::var_os("CARGO_FEATURE_EXTENSION_MODULE").is_some() {
            println!("cargo:rustc-link-arg=-undefined");
            println!("cargo:rustc-link-arg=dynamic_lookup");
        }
    }
    println!("cargo:rerun-if-changed=build.rs");
}
