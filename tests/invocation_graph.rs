// tests/invocation_graph.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipework::build::{Build, BuildDefinition};
use pipework::errors::PipeworkError;
use pipework::files::{Files, FilesBuilder};
use pipework::paths::AbsolutePath;
use pipework_test_utils::{build_file_in, init_tracing, test_log_context, with_timeout, Counter};

fn cwd() -> AbsolutePath {
    AbsolutePath::new("/work").unwrap()
}

fn compile(definition: BuildDefinition) -> Build {
    definition.compile_in(&test_log_context(), cwd())
}

fn files_in(dir: &str, names: &[&str]) -> Files {
    let mut builder = FilesBuilder::new(AbsolutePath::new(dir).unwrap());
    builder.add_all(names).unwrap();
    builder.build().unwrap()
}

/// `top` runs `left` and `right` in parallel; both run `leaf`.
fn diamond(counter: &Counter) -> Build {
    let leaf_counter = counter.clone();
    compile(
        BuildDefinition::new(build_file_in("/project", "Pipework.toml"))
            .task("leaf", move |_ctx| {
                let counter = leaf_counter.clone();
                async move {
                    counter.bump();
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(Some(files_in("/project", &["leaf.txt"])))
                }
            })
            .task("left", |ctx| async move { ctx.run("leaf").await })
            .task("right", |ctx| async move { ctx.run("leaf").await })
            .task("top", |ctx| async move {
                let results = ctx.parallel(&["left", "right"]).await?;
                assert_eq!(results[0], results[1]);
                Ok(results[0].clone())
            }),
    )
}

#[tokio::test]
async fn shared_dependency_runs_once_per_invocation() {
    with_timeout(async {
        init_tracing();
        let counter = Counter::new();
        let build = diamond(&counter);

        let result = build.call("top").await.unwrap().unwrap();

        assert_eq!(counter.get(), 1);
        assert_eq!(result.to_vec(), vec![PathBuf::from("leaf.txt")]);
    })
    .await
}

#[tokio::test]
async fn every_top_level_call_gets_fresh_state() {
    with_timeout(async {
        init_tracing();
        let counter = Counter::new();
        let build = diamond(&counter);

        build.call("top").await.unwrap();
        build.call("top").await.unwrap();
        build.call("leaf").await.unwrap();

        assert_eq!(counter.get(), 3);
    })
    .await
}

#[tokio::test]
async fn concurrent_top_level_calls_do_not_share_state() {
    with_timeout(async {
        init_tracing();
        let counter = Counter::new();
        let build = diamond(&counter);

        let (a, b) = tokio::join!(build.call("top"), build.call("top"));
        a.unwrap();
        b.unwrap();

        assert_eq!(counter.get(), 2);
    })
    .await
}

#[tokio::test]
async fn circular_invocation_reports_the_chain() {
    with_timeout(async {
        init_tracing();
        let build = compile(
            BuildDefinition::new(build_file_in("/project", "Pipework.toml"))
                .task("a", |ctx| async move { ctx.run("b").await })
                .task("b", |ctx| async move { ctx.run("c").await })
                .task("c", |ctx| async move { ctx.run("a").await }),
        );

        let err = build.call("a").await.unwrap_err();
        match err {
            PipeworkError::CircularInvocation { chain } => {
                assert_eq!(chain, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected a circular invocation, got {other:?}"),
        }
    })
    .await
}

#[tokio::test]
async fn task_calling_itself_is_circular() {
    with_timeout(async {
        init_tracing();
        let build = compile(
            BuildDefinition::new(build_file_in("/project", "Pipework.toml"))
                .task("self", |ctx| async move { ctx.run("self").await }),
        );

        let err = build.call("self").await.unwrap_err();
        assert_eq!(err.to_string(), "circular invocation: self -> self");
    })
    .await
}

#[tokio::test]
async fn unknown_task_names_fail() {
    with_timeout(async {
        init_tracing();
        let build = compile(
            BuildDefinition::new(build_file_in("/project", "Pipework.toml"))
                .task("a", |ctx| async move { ctx.run("missing").await }),
        );

        assert!(matches!(
            build.call("nope").await,
            Err(PipeworkError::TaskNotFound(name)) if name == "nope"
        ));
        assert!(matches!(
            build.call("a").await,
            Err(PipeworkError::TaskNotFound(name)) if name == "missing"
        ));
    })
    .await
}

#[tokio::test]
async fn failures_are_cached_and_shared_by_dependents() {
    with_timeout(async {
        init_tracing();
        let counter = Counter::new();
        let fail_counter = counter.clone();
        let build = compile(
            BuildDefinition::new(build_file_in("/project", "Pipework.toml"))
                .task("broken", move |ctx| {
                    let counter = fail_counter.clone();
                    async move {
                        counter.bump();
                        Err(ctx.log().fail("nothing works"))
                    }
                })
                .task("x", |ctx| async move { ctx.run("broken").await })
                .task("y", |ctx| async move { ctx.run("broken").await })
                .task("all", |ctx| async move {
                    ctx.parallel(&["x", "y"]).await?;
                    Ok(None)
                }),
        );

        let err = build.call("all").await.unwrap_err();
        assert!(err.is_reported());
        assert_eq!(counter.get(), 1);
    })
    .await
}

#[tokio::test]
async fn anyhow_errors_from_bodies_surface_unreported() {
    with_timeout(async {
        init_tracing();
        let build = compile(
            BuildDefinition::new(build_file_in("/project", "Pipework.toml")).task(
                "oops",
                |_ctx| async move { Err(PipeworkError::from(anyhow::anyhow!("disk on fire"))) },
            ),
        );

        let err = build.call("oops").await.unwrap_err();
        assert!(!err.is_reported());
        assert_eq!(err.to_string(), "disk on fire");
    })
    .await
}

#[tokio::test]
async fn series_runs_in_order_and_parallel_keeps_argument_order() {
    with_timeout(async {
        init_tracing();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut definition = BuildDefinition::new(build_file_in("/project", "Pipework.toml"));
        for (name, delay) in [("slow", 30u64), ("fast", 0)] {
            let order = order.clone();
            definition = definition.task(name, move |ctx| {
                let order = order.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    order.lock().unwrap().push(ctx.task_name().to_string());
                    Ok(Some(files_in("/project", &[ctx.task_name()])))
                }
            });
        }
        let build = compile(
            definition
                .task("in-series", |ctx| async move {
                    ctx.series(&["slow", "fast"]).await?;
                    Ok(None)
                })
                .task("in-parallel", |ctx| async move {
                    let results = ctx.parallel(&["slow", "fast"]).await?;
                    let names: Vec<PathBuf> = results
                        .into_iter()
                        .flatten()
                        .flat_map(|files| files.to_vec())
                        .collect();
                    assert_eq!(names, vec![PathBuf::from("slow"), PathBuf::from("fast")]);
                    Ok(None)
                }),
        );

        build.call("in-series").await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["slow", "fast"]);

        order.lock().unwrap().clear();
        build.call("in-parallel").await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["fast", "slow"]);
    })
    .await
}

#[tokio::test]
async fn merge_roots_results_at_their_common_directory() {
    with_timeout(async {
        init_tracing();
        let build = compile(
            BuildDefinition::new(build_file_in("/project", "Pipework.toml"))
                .task("src", |_ctx| async move {
                    Ok(Some(files_in("/project/src", &["main.rs", "lib.rs"])))
                })
                .task("tests", |_ctx| async move {
                    Ok(Some(files_in("/project/tests", &["it.rs"])))
                })
                .task("nothing", |_ctx| async move { Ok(None) })
                .task("all", |ctx| async move {
                    Ok(Some(ctx.merge(&["src", "nothing", "tests"]).await?))
                })
                .task("none", |ctx| async move {
                    Ok(Some(ctx.merge(&["nothing"]).await?))
                }),
        );

        let all = build.call("all").await.unwrap().unwrap();
        assert_eq!(all.directory(), &AbsolutePath::new("/project").unwrap());
        assert_eq!(
            all.to_vec(),
            vec![
                PathBuf::from("src/lib.rs"),
                PathBuf::from("src/main.rs"),
                PathBuf::from("tests/it.rs"),
            ]
        );

        let none = build.call("none").await.unwrap().unwrap();
        assert!(none.is_empty());
        assert_eq!(none.directory(), &cwd());
    })
    .await
}

#[tokio::test]
async fn imported_tasks_share_identity_and_keep_their_build_dir() {
    with_timeout(async {
        init_tracing();
        let counter = Counter::new();
        let lib_counter = counter.clone();

        let library = compile(
            BuildDefinition::new(build_file_in("/lib", "Pipework.toml"))
                .task("helper", |_ctx| async move { Ok(None) })
                .task("generate", move |ctx| {
                    let counter = lib_counter.clone();
                    async move {
                        counter.bump();
                        // Sibling names resolve in the defining build.
                        ctx.run("helper").await?;
                        Ok(Some(Files::empty(ctx.resolve("@out"))))
                    }
                }),
        );

        let app = compile(
            BuildDefinition::new(build_file_in("/app", "Pipework.toml"))
                .import("gen", &library, "generate")
                .unwrap()
                .import("gen-again", &library, "generate")
                .unwrap()
                .task("main", |ctx| async move {
                    let results = ctx.parallel(&["gen", "gen-again"]).await?;
                    Ok(results[0].clone())
                }),
        );

        assert_eq!(
            app.task("gen").unwrap().id(),
            library.task("generate").unwrap().id()
        );

        // Two imports from one build keep a single handle on it.
        assert_eq!(app.context().imports().len(), 1);
        assert!(Arc::ptr_eq(&app.context().imports()[0], library.context()));

        let out = app.call("main").await.unwrap().unwrap();
        assert_eq!(counter.get(), 1);
        assert_eq!(out.directory(), &AbsolutePath::new("/lib/out").unwrap());
        assert!(!app.contains("helper"));
    })
    .await
}

#[test]
fn importing_a_missing_task_fails() {
    let library = compile(BuildDefinition::new(build_file_in("/lib", "Pipework.toml")));
    let result = BuildDefinition::new(build_file_in("/app", "Pipework.toml"))
        .import("x", &library, "nope");
    assert!(matches!(result, Err(PipeworkError::TaskNotFound(_))));
}

#[tokio::test]
async fn imported_build_outlives_its_handle() {
    with_timeout(async {
        init_tracing();
        let app = {
            let library = compile(
                BuildDefinition::new(build_file_in("/lib", "Pipework.toml"))
                    .task("dir", |ctx| async move { Ok(Some(Files::empty(ctx.resolve("@")))) }),
            );
            compile(
                BuildDefinition::new(build_file_in("/app", "Pipework.toml"))
                    .import("dir", &library, "dir")
                    .unwrap(),
            )
        };

        let out = app.call("dir").await.unwrap().unwrap();
        assert_eq!(out.directory(), &AbsolutePath::new("/lib").unwrap());
    })
    .await
}

#[tokio::test]
async fn context_exposes_stack_and_state() {
    with_timeout(async {
        init_tracing();
        let build = compile(
            BuildDefinition::new(build_file_in("/project", "Pipework.toml"))
                .task("inner", |ctx| async move {
                    assert_eq!(ctx.stack().names(), vec!["outer", "inner"]);
                    assert_eq!(ctx.current_run().task_name(), "inner");
                    Ok(None)
                })
                .task("outer", |ctx| async move {
                    assert_eq!(ctx.stack().depth(), 1);
                    ctx.run("inner").await?;
                    assert_eq!(ctx.state().len(), 2);
                    Ok(None)
                }),
        );

        build.call("outer").await.unwrap();
        assert_eq!(build.task_names().collect::<Vec<_>>(), vec!["inner", "outer"]);
    })
    .await
}
