fn main() {
    // Release CI sets VERSION to the tag being built; the binary's default
    // current version has to match it for the update gate to work.
    let version =
        std::env::var("VERSION").unwrap_or_else(|_| std::env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rustc-env=CARGO_PKG_VERSION={version}");
    println!("cargo:rerun-if-env-changed=VERSION");
}
