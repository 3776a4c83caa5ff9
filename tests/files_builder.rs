// tests/files_builder.rs

use std::path::{Path, PathBuf};

use pipework::errors::PipeworkError;
use pipework::files::{Files, FilesBuilder};
use pipework::fs::mock::MockFileSystem;
use pipework::paths::AbsolutePath;

fn dir(path: &str) -> AbsolutePath {
    AbsolutePath::new(path).unwrap()
}

#[test]
fn build_sorts_and_deduplicates() {
    let mut builder = FilesBuilder::new(dir("/project"));
    builder
        .add("src/b.rs")
        .unwrap()
        .add("src/a.rs")
        .unwrap()
        .add("/project/src/b.rs")
        .unwrap()
        .add("README.md")
        .unwrap();

    let files = builder.build().unwrap();

    assert_eq!(
        files.to_vec(),
        vec![
            PathBuf::from("README.md"),
            PathBuf::from("src/a.rs"),
            PathBuf::from("src/b.rs"),
        ]
    );
    assert_eq!(files.directory(), &dir("/project"));
}

#[test]
fn insertion_order_does_not_matter() {
    let mut forward = FilesBuilder::new(dir("/p"));
    forward.add_all(["a", "b/c", "d"]).unwrap();

    let mut backward = FilesBuilder::new(dir("/p"));
    backward.add_all(["d", "b/c", "a", "a"]).unwrap();

    assert_eq!(forward.build().unwrap(), backward.build().unwrap());
}

#[test]
fn paths_outside_the_directory_are_rejected() {
    let mut builder = FilesBuilder::new(dir("/project/src"));

    for bad in ["../Cargo.toml", "/etc/passwd", "/project/src", "a/../../b"] {
        let err = builder.add(bad).unwrap_err();
        assert!(
            matches!(err, PipeworkError::PathOutsideDirectory { .. }),
            "{bad}: unexpected {err:?}"
        );
    }

    // Normalized paths that stay inside are fine.
    builder.add("a/../b.rs").unwrap();
    assert_eq!(builder.build().unwrap().to_vec(), vec![PathBuf::from("b.rs")]);
}

#[test]
fn builder_is_frozen_after_build() {
    let mut builder = FilesBuilder::new(dir("/p"));
    builder.add("x").unwrap();
    let first = builder.build().unwrap();

    assert!(matches!(builder.add("y"), Err(PipeworkError::BuilderFrozen)));
    assert!(matches!(builder.build(), Err(PipeworkError::BuilderFrozen)));
    assert!(matches!(
        builder.write_with(&MockFileSystem::new(), "z", "z"),
        Err(PipeworkError::BuilderFrozen)
    ));

    // The built value is unaffected.
    assert_eq!(first.len(), 1);
}

#[test]
fn copies_of_the_paths_do_not_write_through() {
    let mut builder = FilesBuilder::new(dir("/project"));
    builder.add_all(["b.rs", "a.rs", "c.rs"]).unwrap();
    let files = builder.build().unwrap();
    let copy_of_files = files.clone();
    let before = files.to_vec();

    let mut paths = files.to_vec();
    paths.push(PathBuf::from("injected.rs"));
    paths.retain(|p| p != Path::new("a.rs"));
    paths.sort_by(|a, b| b.cmp(a));

    let mut iterated: Vec<&Path> = files.iter().collect();
    iterated.clear();

    for view in [&files, &copy_of_files] {
        assert_eq!(view.to_vec(), before);
        assert_eq!(view.len(), 3);
        assert!(view.contains("a.rs"));
        assert!(!view.contains("injected.rs"));
    }
    assert_eq!(files, copy_of_files);
}

#[test]
fn merge_requires_containment() {
    let mut src = FilesBuilder::new(dir("/project/src"));
    src.add("main.rs").unwrap();
    let src = src.build().unwrap();

    let mut wide = FilesBuilder::new(dir("/project"));
    wide.merge(&src).unwrap();
    assert_eq!(wide.build().unwrap().to_vec(), vec![PathBuf::from("src/main.rs")]);

    let mut narrow = FilesBuilder::new(dir("/project/tests"));
    assert!(matches!(
        narrow.merge(&src),
        Err(PipeworkError::PathOutsideDirectory { .. })
    ));
}

#[test]
fn absolute_paths_and_mappings_follow_relative_order() {
    let mut builder = Files::builder(dir("/root/app"));
    builder.add_all(["z.txt", "a/b.txt"]).unwrap();
    let files = builder.build().unwrap();

    let absolute: Vec<PathBuf> = files.absolute_paths().map(|p| p.into_path_buf()).collect();
    assert_eq!(
        absolute,
        vec![
            PathBuf::from("/root/app/a/b.txt"),
            PathBuf::from("/root/app/z.txt"),
        ]
    );

    let mappings: Vec<(&Path, AbsolutePath)> = files.path_mappings().collect();
    assert_eq!(mappings[0].0, Path::new("a/b.txt"));
    assert_eq!(mappings[0].1, dir("/root/app/a/b.txt"));

    assert!(files.contains("z.txt"));
    assert!(files.contains("/root/app/a/b.txt"));
    assert!(!files.contains("missing"));
    assert!(!files.contains("/elsewhere/z.txt"));
}

#[test]
fn empty_files_have_a_directory() {
    let files = Files::empty(dir("/p"));
    assert!(files.is_empty());
    assert_eq!(files.iter().count(), 0);
    assert_eq!(files.directory(), &dir("/p"));
}

#[test]
fn write_with_mock_filesystem_adds_the_file() {
    let fs = MockFileSystem::new();
    let mut builder = FilesBuilder::new(dir("/out"));

    let written = builder.write_with(&fs, "gen/code.rs", "fn main() {}").unwrap();

    assert_eq!(written, dir("/out/gen/code.rs"));
    assert_eq!(fs.contents("/out/gen/code.rs").unwrap(), b"fn main() {}");
    assert_eq!(builder.build().unwrap().to_vec(), vec![PathBuf::from("gen/code.rs")]);
}

#[test]
fn write_outside_the_directory_touches_nothing() {
    let fs = MockFileSystem::new();
    let mut builder = FilesBuilder::new(dir("/out"));

    assert!(builder.write_with(&fs, "../escape.txt", "x").is_err());
    assert!(fs.contents("/escape.txt").is_none());
}

#[test]
fn write_creates_real_files() {
    let tmp = tempfile::tempdir().unwrap();
    let root = AbsolutePath::new(tmp.path()).unwrap();
    let mut builder = FilesBuilder::new(root.clone());

    let written = builder.write("nested/dir/out.txt", "hello").unwrap();

    assert_eq!(std::fs::read_to_string(&written).unwrap(), "hello");
    assert!(builder.build().unwrap().contains("nested/dir/out.txt"));
}
