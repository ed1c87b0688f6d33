use std::env;
use std::fs;
use std::path::PathBuf;

use stick_syntax::FilesystemLoader;
use stickgen::Generator;

const TEMPLATES: &[&str] = &[
    "hello.twig",
    "cond.twig",
    "layout/base.twig",
    "page.twig",
    "profile.twig",
    "shadowing.twig",
];

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    let root = PathBuf::from(manifest_dir).join("templates");
    println!("cargo:rerun-if-changed={}", root.display());

    let generator = Generator::new(FilesystemLoader::new(&root));
    let unit = match generator.generate_all(TEMPLATES) {
        Ok(unit) => unit,
        Err(err) => panic!("failed to compile templates: {}", err),
    };

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let out = PathBuf::from(out_dir).join("templates.rs");
    fs::write(&out, unit.to_source())
        .unwrap_or_else(|err| panic!("cannot write {}: {}", out.display(), err));
}
