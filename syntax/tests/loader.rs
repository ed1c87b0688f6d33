use std::fs;

use stick_syntax::{FilesystemLoader, LoadError, Loader, MemoryLoader};

#[test]
fn memory_loader_serves_inserted_templates() {
    let loader = MemoryLoader::new().with("hello", "Hello, World!");
    assert_eq!(loader.load("hello").unwrap(), "Hello, World!");
    assert!(matches!(loader.load("missing"), Err(LoadError::NotFound(name)) if name == "missing"));
}

#[test]
fn filesystem_loader_reads_nested_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("layouts")).unwrap();
    fs::write(dir.path().join("layouts/base.twig"), "{% block body %}{% endblock %}").unwrap();

    let loader = FilesystemLoader::new(dir.path());
    assert_eq!(
        loader.load("layouts/base.twig").unwrap(),
        "{% block body %}{% endblock %}"
    );
}

#[test]
fn filesystem_loader_reports_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let loader = FilesystemLoader::new(dir.path());
    let err = loader.load("nope.twig").unwrap_err();
    assert_eq!(err.to_string(), "template not found: nope.twig");
}

#[test]
fn filesystem_loader_refuses_to_leave_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("templates")).unwrap();
    fs::write(dir.path().join("secret.txt"), "secret").unwrap();

    let loader = FilesystemLoader::new(dir.path().join("templates"));
    assert!(matches!(loader.load("../secret.txt"), Err(LoadError::NotFound(_))));
    assert!(matches!(loader.load(""), Err(LoadError::NotFound(_))));
}

#[test]
fn loader_references_are_loaders() {
    fn load_via<L: Loader>(loader: L) -> String {
        loader.load("a").unwrap()
    }
    let loader = MemoryLoader::new().with("a", "A");
    assert_eq!(load_via(&loader), "A");
}
