use std::env;
use std::path::PathBuf;

fn main() {
    // IMPORTANT: Initialize the ESP-IDF build system
    embuild::espidf::sysenv::output();

    // Find the workspace root
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR");
    let workspace_root = PathBuf::from(&manifest_dir)
        .parent()
        .expect("smart_hub lives inside the workspace")
        .to_path_buf();

    // secrets.toml holds the Wi-Fi credentials and the control endpoint
    let secrets_path = workspace_root.join("secrets.toml");
    println!("cargo:rerun-if-changed={}", secrets_path.display());

    if !secrets_path.exists() {
        panic!(
            "\n\n\
            ERROR: secrets.toml not found!\n\
            \n\
            Expected in: {}\n\
            \n\
            Create the file:\n\
            cp secrets.toml.example secrets.toml\n\
            ",
            secrets_path.display()
        );
    }
}
