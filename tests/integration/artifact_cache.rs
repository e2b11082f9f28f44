//! Compiled artifact caching against real directories.

use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use vellum::compiler::{ARTIFACT_FORMAT, CompileCounts, Program, artifact_key};
use vellum::store::FileArtifactStore;
use vellum::test_utils::{ViewFixture, init_test_logging};

use crate::common::data;

fn artifact_path(fixture: &ViewFixture, name: &str) -> PathBuf {
    FileArtifactStore::new(fixture.cache_dir()).path_for(&artifact_key(name))
}

fn age_artifact(fixture: &ViewFixture, name: &str) {
    let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
    fs::File::options()
        .write(true)
        .open(artifact_path(fixture, name))
        .unwrap()
        .set_modified(an_hour_ago)
        .unwrap();
}

#[test]
fn test_compiles_once_then_reuses() {
    init_test_logging(None);
    let fixture = ViewFixture::new().unwrap();
    fixture.write("home", "Hi {{ $name }}").unwrap();
    let renderer = fixture.renderer().unwrap();

    assert!(renderer.compiler().is_expired("home").unwrap());
    assert_eq!(renderer.render("home", &data(json!({"name": "a"}))).unwrap(), "Hi a");
    assert!(artifact_path(&fixture, "home").is_file());
    assert!(!renderer.compiler().is_expired("home").unwrap());

    assert_eq!(renderer.render("home", &data(json!({"name": "b"}))).unwrap(), "Hi b");
    assert_eq!(renderer.compiler().stats(), CompileCounts {
        compiled: 1,
        reused: 1,
    });
}

#[test]
fn test_artifact_is_shared_between_renderers() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("home", "static").unwrap();

    fixture.renderer().unwrap().render("home", &data(json!({}))).unwrap();

    let second = fixture.renderer().unwrap();
    second.render("home", &data(json!({}))).unwrap();
    assert_eq!(second.compiler().stats().compiled, 0);
    assert_eq!(second.compiler().stats().reused, 1);
}

#[test]
fn test_stale_artifact_is_recompiled() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("page", "version one").unwrap();
    let renderer = fixture.renderer().unwrap();
    assert_eq!(renderer.render("page", &data(json!({}))).unwrap(), "version one");

    fixture.write("page", "version two").unwrap();
    age_artifact(&fixture, "page");
    assert!(renderer.compiler().is_expired("page").unwrap());

    assert_eq!(renderer.render("page", &data(json!({}))).unwrap(), "version two");
    assert_eq!(renderer.compiler().stats().compiled, 2);

    renderer.render("page", &data(json!({}))).unwrap();
    assert_eq!(renderer.compiler().stats().compiled, 2);
}

#[test]
fn test_parent_staleness_is_checked_separately() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("layout", "A[@yield('content')]").unwrap();
    fixture.write("page", "@extends('layout')x").unwrap();
    let renderer = fixture.renderer().unwrap();
    assert_eq!(renderer.render("page", &data(json!({}))).unwrap(), "A[x]");

    fixture.write("layout", "B[@yield('content')]").unwrap();
    age_artifact(&fixture, "layout");
    assert_eq!(renderer.render("page", &data(json!({}))).unwrap(), "B[x]");
    assert!(!renderer.compiler().is_expired("page").unwrap());
}

#[test]
fn test_artifact_with_equal_timestamp_is_fresh() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("t", "same").unwrap();
    let renderer = fixture.renderer().unwrap();
    renderer.render("t", &data(json!({}))).unwrap();

    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    fixture.set_source_mtime("t", stamp).unwrap();
    fs::File::options()
        .write(true)
        .open(artifact_path(&fixture, "t"))
        .unwrap()
        .set_modified(stamp)
        .unwrap();
    assert!(!renderer.compiler().is_expired("t").unwrap());
}

#[test]
fn test_corrupt_artifact_is_replaced() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("t", "good {{ $v }}").unwrap();
    let renderer = fixture.renderer().unwrap();
    renderer.render("t", &data(json!({"v": 1}))).unwrap();

    let path = artifact_path(&fixture, "t");
    fs::write(&path, "{ not a program").unwrap();

    assert_eq!(renderer.render("t", &data(json!({"v": 2}))).unwrap(), "good 2");
    let code = fs::read_to_string(&path).unwrap();
    let program = Program::from_code(&code).unwrap();
    assert_eq!(program.format, ARTIFACT_FORMAT);
    assert_eq!(program.template, "t");
}

#[test]
fn test_forced_compile_is_byte_identical() {
    let fixture = ViewFixture::new().unwrap();
    fixture
        .write("t", "@if($a) {{ $a }} @else none @endif @foreach($xs as $x){!! $x !!}@endforeach")
        .unwrap();
    let renderer = fixture.renderer().unwrap();

    renderer.compiler().compile("t").unwrap();
    let first = fs::read(artifact_path(&fixture, "t")).unwrap();
    renderer.compiler().compile("t").unwrap();
    let second = fs::read(artifact_path(&fixture, "t")).unwrap();
    assert_eq!(first, second);
    assert_eq!(renderer.compiler().stats().compiled, 2);
}

#[test]
fn test_compile_error_leaves_no_artifact() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("bad", "@if(true) unterminated").unwrap();
    let renderer = fixture.renderer().unwrap();

    assert!(renderer.render("bad", &data(json!({}))).is_err());
    assert!(!artifact_path(&fixture, "bad").exists());
}

#[test]
fn test_cleanup_removes_artifacts() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("a", "a").unwrap();
    fixture.write("b", "b").unwrap();
    let renderer = fixture.renderer().unwrap();
    renderer.render("a", &data(json!({}))).unwrap();
    renderer.render("b", &data(json!({}))).unwrap();
    assert_eq!(fixture.artifact_count(), 2);

    assert_eq!(renderer.cleanup().unwrap(), 2);
    assert_eq!(fixture.artifact_count(), 0);
    assert_eq!(renderer.cleanup().unwrap(), 0);

    assert_eq!(renderer.render("a", &data(json!({}))).unwrap(), "a");
    assert_eq!(fixture.artifact_count(), 1);
}

#[test]
fn test_concurrent_renders_compile_once() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("layout", "<main>@yield('content')</main>").unwrap();
    fixture.write("page", "@extends('layout'){{ $n }}").unwrap();
    let renderer = Arc::new(fixture.renderer().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let renderer = Arc::clone(&renderer);
            thread::spawn(move || renderer.render("page", &data(json!({"n": n}))).unwrap())
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("<main>{n}</main>"));
    }
    assert_eq!(renderer.compiler().stats().compiled, 2);
    assert_eq!(fixture.artifact_count(), 2);
}

#[test]
fn test_deeply_nested_artifact_is_reused() {
    let fixture = ViewFixture::new().unwrap();
    let sum = vec!["1"; 100].join(" + ");
    let source = format!("{}{{{{ {sum} }}}}{}", "@if(true)".repeat(40), " @endif".repeat(40));
    fixture.write("deep", &source).unwrap();
    let renderer = fixture.renderer().unwrap();

    let first = renderer.render("deep", &data(json!({}))).unwrap();
    assert_eq!(first.trim(), "100");
    assert_eq!(renderer.render("deep", &data(json!({}))).unwrap(), first);
    assert_eq!(renderer.compiler().stats(), CompileCounts {
        compiled: 1,
        reused: 1,
    });
}
