//! Sections, yields, layout inheritance and includes.

use serde_json::json;

use crate::common::{data, memory_renderer, squash};

const LAYOUT: &str = "<title>@yield('title', 'Site')</title><main>@yield('body')</main>";

#[test]
fn test_child_fills_layout_blocks() {
    let renderer = memory_renderer(&[
        ("layouts.app", LAYOUT),
        (
            "pages.home",
            "@extends('layouts.app')\n@section('title', 'Home')\n@section('body')Hi {{ $name }}@stop",
        ),
    ]);
    let out = renderer.render("pages.home", &data(json!({"name": "Ada"}))).unwrap();
    assert_eq!(out, "<title>Home</title><main>Hi Ada</main>");
}

#[test]
fn test_layout_defaults_when_child_skips_block() {
    let renderer = memory_renderer(&[
        ("layouts.app", LAYOUT),
        ("pages.bare", "@extends('layouts.app') @section('body')only body @stop"),
    ]);
    let out = renderer.render("pages.bare", &data(json!({}))).unwrap();
    assert_eq!(out, "<title>Site</title><main>only body </main>");
}

#[test]
fn test_inline_section_value_is_escaped() {
    let renderer = memory_renderer(&[
        ("layouts.app", LAYOUT),
        ("page", "@extends('layouts.app') @section('title', $title) @section('body') @stop"),
    ]);
    let out = renderer.render("page", &data(json!({"title": "Q&A"}))).unwrap();
    assert!(out.starts_with("<title>Q&amp;A</title>"), "{out}");
}

#[test]
fn test_three_level_inheritance() {
    let renderer = memory_renderer(&[
        ("base", "[@yield('content')]"),
        ("layout", "@extends('base')@section('content')<nav/>@yield('body')@stop"),
        ("page", "@extends('layout')@section('body')page body @stop"),
    ]);
    let out = renderer.render("page", &data(json!({}))).unwrap();
    assert_eq!(out, "[<nav/>page body ]");
}

#[test]
fn test_append_and_overwrite_in_one_template() {
    let renderer = memory_renderer(&[
        ("appending", "@section('s')one @stop @section('s')two @append @yield('s')"),
        ("overwriting", "@section('s')one @stop @section('s')two @overwrite @yield('s')"),
    ]);
    assert_eq!(squash(&renderer.render("appending", &data(json!({}))).unwrap()), "one two");
    assert_eq!(squash(&renderer.render("overwriting", &data(json!({}))).unwrap()), "two");
}

#[test]
fn test_show_writes_the_section_in_place() {
    let renderer = memory_renderer(&[("t", "<@section('sidebar')links @show>")]);
    assert_eq!(renderer.render("t", &data(json!({}))).unwrap(), "<links >");
}

#[test]
fn test_layout_section_show_after_child_content() {
    let renderer = memory_renderer(&[
        ("layout", "@section('scripts')base.js @show"),
        ("page", "@extends('layout') @section('scripts')page.js @stop"),
    ]);
    let out = renderer.render("page", &data(json!({}))).unwrap();
    assert_eq!(squash(&out), "page.js base.js");
}

#[test]
fn test_explicit_content_section_replaces_loose_output() {
    let renderer = memory_renderer(&[
        ("layout", "<body>@yield('content')</body>"),
        ("page", "@extends('layout') ignored @section('content')kept @stop ignored too"),
    ]);
    let out = renderer.render("page", &data(json!({}))).unwrap();
    assert_eq!(out, "<body>kept </body>");
}

#[test]
fn test_loose_child_output_becomes_content() {
    let renderer = memory_renderer(&[
        ("layout", "<body>@yield('content')</body>"),
        ("page", "@extends('layout')loose"),
    ]);
    assert_eq!(renderer.render("page", &data(json!({}))).unwrap(), "<body>loose</body>");
}

#[test]
fn test_include_shares_variables() {
    let renderer = memory_renderer(&[
        ("partials.item", "<li>{{ $item }}</li>"),
        ("list", "<ul>@foreach($items as $item)@include('partials.item')@endforeach</ul>"),
    ]);
    let out = renderer.render("list", &data(json!({"items": ["a", "b"]}))).unwrap();
    assert_eq!(out, "<ul><li>a</li><li>b</li></ul>");
}

#[test]
fn test_include_can_define_sections() {
    let renderer = memory_renderer(&[
        ("layout", "@yield('head')|@yield('body')"),
        ("partials.head", "@section('head')meta @stop"),
        ("page", "@extends('layout') @include('partials.head') @section('body')b @stop"),
    ]);
    let out = renderer.render("page", &data(json!({}))).unwrap();
    assert_eq!(squash(&out), "meta |b");
}

#[test]
fn test_extends_inside_include_is_ignored() {
    let renderer = memory_renderer(&[
        ("other", "WRONG"),
        ("partial", "@extends('other')partial"),
        ("page", "[@include('partial')]"),
    ]);
    assert_eq!(renderer.render("page", &data(json!({}))).unwrap(), "[partial]");
}

#[test]
fn test_blocks_do_not_leak_between_renders() {
    let renderer = memory_renderer(&[
        ("layout", "@yield('title', 'none')"),
        ("a", "@extends('layout') @section('title', 'A')"),
        ("b", "@extends('layout')"),
    ]);
    assert_eq!(renderer.render("a", &data(json!({}))).unwrap(), "A");
    assert_eq!(renderer.render("b", &data(json!({}))).unwrap(), "none");
}

#[test]
fn test_dynamic_template_names() {
    let renderer = memory_renderer(&[
        ("themes.dark", "dark:@yield('body')"),
        ("page", "@extends('themes.' + $theme) @section('body')x @stop"),
    ]);
    let out = renderer.render("page", &data(json!({"theme": "dark"}))).unwrap();
    assert_eq!(out, "dark:x ");
}

#[test]
fn test_retrieve_with_serializable_data() {
    #[derive(serde::Serialize)]
    struct Page<'a> {
        title: &'a str,
        tags: Vec<&'a str>,
    }

    let renderer = memory_renderer(&[("t", "{{ $title }} ({{ count($tags) }})")]);
    let out = renderer
        .retrieve("t", &Page {
            title: "Notes",
            tags: vec!["a", "b"],
        })
        .unwrap();
    assert_eq!(out, "Notes (2)");
}

#[test]
fn test_included_content_section_keeps_includer_output() {
    let renderer = memory_renderer(&[
        ("part", "@section('content')P @stop"),
        ("page", "loose @include('part')"),
    ]);
    assert_eq!(renderer.render("page", &data(json!({}))).unwrap(), "loose ");
}
