// tests/find_files.rs

use std::path::PathBuf;

use pipework::build::BuildDefinition;
use pipework::errors::PipeworkError;
use pipework::files::{find, FindOptions};
use pipework::fs::mock::MockFileSystem;
use pipework::paths::AbsolutePath;
use pipework_test_utils::{build_file_in, init_tracing, test_log_context, with_timeout};

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/project/src/main.rs", "fn main() {}");
    fs.add_file("/project/src/lib.rs", "pub fn lib() {}");
    fs.add_file("/project/src/gen/tmp.rs", "// generated");
    fs.add_file("/project/README.md", "# Readme");
    fs.add_file("/project/target/debug/app", "binary");
    fs
}

fn root() -> AbsolutePath {
    AbsolutePath::new("/project").unwrap()
}

#[test]
fn find_matches_relative_globs() {
    let files = find(&project(), &root(), &["src/**/*.rs"], &FindOptions::default()).unwrap();

    assert_eq!(files.directory(), &root());
    assert_eq!(
        files.to_vec(),
        vec![
            PathBuf::from("src/gen/tmp.rs"),
            PathBuf::from("src/lib.rs"),
            PathBuf::from("src/main.rs"),
        ]
    );
}

#[test]
fn ignore_patterns_win_over_includes() {
    let options = FindOptions::default().ignore("src/gen/**").ignore("**/main.rs");
    let files = find(&project(), &root(), &["**/*.rs", "*.md"], &options).unwrap();

    assert_eq!(
        files.to_vec(),
        vec![PathBuf::from("README.md"), PathBuf::from("src/lib.rs")]
    );
}

#[test]
fn find_in_a_subdirectory_is_rooted_there() {
    let src = root().join("src");
    let files = find(&project(), &src, &["*.rs"], &FindOptions::default()).unwrap();

    assert_eq!(files.directory(), &src);
    assert_eq!(
        files.to_vec(),
        vec![PathBuf::from("lib.rs"), PathBuf::from("main.rs")]
    );
}

#[test]
fn missing_directory_finds_nothing() {
    let files = find(
        &project(),
        &AbsolutePath::new("/nowhere").unwrap(),
        &["**/*"],
        &FindOptions::default(),
    )
    .unwrap();
    assert!(files.is_empty());
}

#[test]
fn invalid_globs_are_errors() {
    let err = find(&project(), &root(), &["src/[".to_string()], &FindOptions::default())
        .unwrap_err();
    assert!(matches!(err, PipeworkError::Glob(_)));
}

#[tokio::test]
async fn context_find_resolves_against_the_build_dir() {
    with_timeout(async {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("assets/icons")).unwrap();
        std::fs::write(tmp.path().join("assets/icons/a.svg"), "<svg/>").unwrap();
        std::fs::write(tmp.path().join("assets/logo.png"), "png").unwrap();

        let build = BuildDefinition::new(build_file_in(tmp.path(), "Pipework.toml"))
            .task("icons", |ctx| async move {
                ctx.find("@assets", &["**/*.svg"], FindOptions::default()).await
            })
            .compile_in(&test_log_context(), AbsolutePath::new("/").unwrap());

        let files = build.call("icons").await.unwrap().unwrap();
        assert_eq!(files.to_vec(), vec![PathBuf::from("icons/a.svg")]);
        assert_eq!(files.directory().as_path(), tmp.path().join("assets"));
    })
    .await
}

#[cfg(unix)]
#[test]
fn linked_directories_are_not_walked() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("src")).unwrap();
    std::fs::write(tmp.path().join("src/lib.rs"), "").unwrap();
    std::fs::write(tmp.path().join("notes.txt"), "").unwrap();
    // A link back to the search root, and a linked file.
    std::os::unix::fs::symlink(tmp.path(), tmp.path().join("src/loop")).unwrap();
    std::os::unix::fs::symlink(tmp.path().join("notes.txt"), tmp.path().join("src/notes.rs"))
        .unwrap();

    let files = find(
        &pipework::fs::RealFileSystem,
        &AbsolutePath::new(tmp.path()).unwrap(),
        &["**/*.rs"],
        &FindOptions::default(),
    )
    .unwrap();

    assert_eq!(
        files.to_vec(),
        vec![PathBuf::from("src/lib.rs"), PathBuf::from("src/notes.rs")]
    );
}
