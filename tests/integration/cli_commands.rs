//! The `vellum` binary.

use predicates::prelude::*;
use std::fs;
use vellum::test_utils::ViewFixture;

use crate::common::vellum;

fn fixture_with_pages() -> ViewFixture {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("layouts.app", "<h1>@yield('title', 'Untitled')</h1>@yield('content')").unwrap();
    fixture
        .write(
            "pages.home",
            "@extends('layouts.app')@section('title', $title)@section('content')<ul>@foreach($items as $i)<li>{{ $i }}</li>@endforeach</ul>@stop",
        )
        .unwrap();
    fixture
}

#[test]
fn test_render_with_set_values() {
    let fixture = fixture_with_pages();
    vellum(&fixture)
        .args(["render", "pages.home", "--set", "title=Home", "--set", "items=[1,2]"])
        .assert()
        .success()
        .stdout("<h1>Home</h1><ul><li>1</li><li>2</li></ul>");
}

#[test]
fn test_render_with_data_file() {
    let fixture = fixture_with_pages();
    fs::write(fixture.root().join("home.json"), r#"{"title": "From file", "items": ["<x>"]}"#).unwrap();

    vellum(&fixture)
        .args(["render", "pages.home", "--data", "home.json", "--set", "title=Override"])
        .assert()
        .success()
        .stdout("<h1>Override</h1><ul><li>&lt;x&gt;</li></ul>");
}

#[test]
fn test_render_missing_template_fails_with_suggestion() {
    let fixture = fixture_with_pages();
    vellum(&fixture)
        .args(["render", "pages.nope"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Template 'pages.nope' not found"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_render_undefined_variable_names_location() {
    let fixture = fixture_with_pages();
    vellum(&fixture)
        .args(["render", "pages.home", "--set", "items=[]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Undefined variable '$title' in 'pages.home' at line 1"));
}

#[test]
fn test_compile_print_emits_program() {
    let fixture = fixture_with_pages();
    vellum(&fixture)
        .args(["compile", "layouts.app", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"format\": \"vellum-program/1\""))
        .stdout(predicate::str::contains("\"template\": \"layouts.app\""));
    assert_eq!(fixture.artifact_count(), 1);
}

#[test]
fn test_compile_reports_syntax_errors() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("bad", "line\n@foreach($xs) @endforeach").unwrap();
    vellum(&fixture)
        .args(["compile", "bad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'bad' at line 2"));
}

#[test]
fn test_check_reports_freshness() {
    let fixture = fixture_with_pages();
    vellum(&fixture)
        .args(["check", "layouts.app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("layouts.app compiles"))
        .stdout(predicate::str::contains("missing or stale"));

    vellum(&fixture).args(["compile", "layouts.app"]).assert().success();

    vellum(&fixture)
        .args(["check", "layouts.app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("artifact is fresh"));
}

#[test]
fn test_check_missing_template() {
    let fixture = fixture_with_pages();
    vellum(&fixture)
        .args(["check", "pages.gone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_clear_removes_artifacts() {
    let fixture = fixture_with_pages();
    vellum(&fixture)
        .args(["render", "pages.home", "--set", "title=x", "--set", "items=[]"])
        .assert()
        .success();
    assert_eq!(fixture.artifact_count(), 2);

    vellum(&fixture)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2 compiled artifact(s)"));
    assert_eq!(fixture.artifact_count(), 0);
}

#[test]
fn test_config_file_in_working_directory() {
    let fixture = ViewFixture::new().unwrap();
    fs::write(fixture.root().join("vellum.toml"), "suffix = \".html\"\necho_format = \"upper({})\"\n")
        .unwrap();
    fs::write(fixture.views_dir().join("shout.html"), "{{ $word }}!").unwrap();

    vellum(&fixture)
        .args(["render", "shout", "--set", "word=hey"])
        .assert()
        .success()
        .stdout("HEY!");
}

#[test]
fn test_invalid_config_file() {
    let fixture = ViewFixture::new().unwrap();
    let config = fixture.root().join("broken.toml");
    fs::write(&config, "echo_format = \"no placeholder\"\n").unwrap();

    vellum(&fixture)
        .arg("--config")
        .arg(&config)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}
