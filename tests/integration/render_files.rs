//! Rendering templates stored on disk.

use serde_json::json;
use vellum::core::ViewError;
use vellum::test_utils::ViewFixture;

use crate::common::data;

#[test]
fn test_dotted_names_map_to_nested_files() {
    let fixture = ViewFixture::new().unwrap();
    fixture
        .write("layouts.app", "<html><title>@yield('title')</title>@yield('content')</html>")
        .unwrap();
    let page = fixture
        .write(
            "pages.home",
            "@extends('layouts.app')@section('title', 'Home')@section('content')<p>{{ $msg }}</p>@stop",
        )
        .unwrap();
    assert!(page.ends_with("pages/home.tpl.html"));

    let renderer = fixture.renderer().unwrap();
    let out = renderer.render("pages.home", &data(json!({"msg": "hi"}))).unwrap();
    assert_eq!(out, "<html><title>Home</title><p>hi</p></html>");

    // slash-separated names resolve to the same file
    assert_eq!(renderer.render("pages/home", &data(json!({"msg": "hi"}))).unwrap(), out);
}

#[test]
fn test_custom_suffix() {
    let fixture = ViewFixture::new().unwrap().with_config(|config| config.suffix = ".html".into());
    let path = fixture.write("mail", "Dear {{ $to }}").unwrap();
    assert!(path.ends_with("mail.html"));

    let out = fixture.renderer().unwrap().render("mail", &data(json!({"to": "Bo"}))).unwrap();
    assert_eq!(out, "Dear Bo");
}

#[test]
fn test_invalid_names_are_rejected() {
    let fixture = ViewFixture::new().unwrap();
    let renderer = fixture.renderer().unwrap();
    for name in ["../secret", "/etc/passwd", "a..b", "", "c:\\x"] {
        let err = renderer.render(name, &data(json!({}))).unwrap_err();
        assert!(matches!(err, ViewError::InvalidTemplateName { .. }), "{name}: {err:?}");
    }
}

#[test]
fn test_missing_file_reports_path() {
    let fixture = ViewFixture::new().unwrap();
    let err = fixture.renderer().unwrap().render("pages.gone", &data(json!({}))).unwrap_err();
    match err {
        ViewError::TemplateNotFound {
            name,
            path,
        } => {
            assert_eq!(name, "pages.gone");
            assert!(path.ends_with("pages/gone.tpl.html"));
        }
        other => panic!("expected TemplateNotFound, got {other:?}"),
    }
}

#[test]
fn test_render_to_writer() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("t", "@foreach($xs as $x){{ $x }}@endforeach").unwrap();
    fixture.write("broken", "ok {{ $missing }}").unwrap();
    let renderer = fixture.renderer().unwrap();

    let mut out = Vec::new();
    renderer.render_to("t", &data(json!({"xs": [1, 2, 3]})), &mut out).unwrap();
    assert_eq!(out, b"123");

    let mut out = Vec::new();
    assert!(renderer.render_to("broken", &data(json!({})), &mut out).is_err());
    assert!(out.is_empty());
}

#[test]
fn test_exists() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("partials.nav", "nav").unwrap();
    let renderer = fixture.renderer().unwrap();
    assert!(renderer.exists("partials.nav"));
    assert!(!renderer.exists("partials.footer"));
    assert!(!renderer.exists("../partials.nav"));
}

#[test]
fn test_multiline_template_with_includes() {
    let fixture = ViewFixture::new().unwrap();
    fixture.write("partials.row", "<tr><td>{{ $row['name'] }}</td></tr>\n").unwrap();
    fixture
        .write(
            "report",
            "<table>\n@foreach($rows as $row)\n@include('partials.row')\n@endforeach\n</table>\n",
        )
        .unwrap();

    let out = fixture
        .renderer()
        .unwrap()
        .render("report", &data(json!({"rows": [{"name": "a"}, {"name": "<b>"}]})))
        .unwrap();
    assert!(out.contains("<tr><td>a</td></tr>"));
    assert!(out.contains("<tr><td>&lt;b&gt;</td></tr>"));
    assert!(out.starts_with("<table>\n"));
    assert!(out.trim_end().ends_with("</table>"));
}
