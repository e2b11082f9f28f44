//! Echo forms, escaping and comments.

use serde_json::json;
use vellum::config::{EchoFormat, ViewConfig};

use crate::common::{data, memory_renderer, memory_renderer_with};

fn render_one(template: &str, vars: serde_json::Value) -> String {
    memory_renderer(&[("t", template)]).render("t", &data(vars)).unwrap()
}

#[test]
fn test_regular_echo_escapes_html() {
    let out = render_one("<p>{{ $bio }}</p>", json!({"bio": "<b>\"Tom\" & 'Jerry'</b>"}));
    assert_eq!(out, "<p>&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;</p>");
}

#[test]
fn test_triple_brace_escapes_and_raw_does_not() {
    let vars = json!({"html": "<i>x</i>"});
    assert_eq!(render_one("{{{ $html }}}", vars.clone()), "&lt;i&gt;x&lt;/i&gt;");
    assert_eq!(render_one("{!! $html !!}", vars), "<i>x</i>");
}

#[test]
fn test_at_prefixed_echo_is_literal() {
    assert_eq!(render_one("var x = @{{ name }};", json!({})), "var x = {{ name }};");
}

#[test]
fn test_or_fallback() {
    let template = "Hello, {{ $name or 'Guest' }}!";
    assert_eq!(render_one(template, json!({})), "Hello, Guest!");
    assert_eq!(render_one(template, json!({"name": "Ada"})), "Hello, Ada!");
    assert_eq!(render_one(template, json!({"name": null})), "Hello, Guest!");
}

#[test]
fn test_comments_are_dropped_with_their_contents() {
    let out = render_one("a{{-- @if($x) {{ $y }} --}}b", json!({}));
    assert_eq!(out, "ab");
}

#[test]
fn test_value_rendering() {
    let out = render_one(
        "{{ $flag }}|{{ $n }}|{{ $missing ?? 'none' }}|{!! json($list) !!}|{{ count($list) }}",
        json!({"flag": true, "n": 2.5, "list": [1, 2]}),
    );
    assert_eq!(out, "true|2.5|none|[1,2]|2");
}

#[test]
fn test_member_access_and_builtins() {
    let out = render_one(
        "{{ upper($user->name) }} {{ $user['tags'][1] }} {{ join($user->tags, ', ') }}",
        json!({"user": {"name": "ada", "tags": ["math", "engines"]}}),
    );
    assert_eq!(out, "ADA engines math, engines");
}

#[test]
fn test_custom_echo_format() {
    let config = ViewConfig {
        echo_format: EchoFormat::new("upper({})").unwrap(),
        ..ViewConfig::default()
    };
    let renderer = memory_renderer_with(&[("t", "{{ $x }} {!! $x !!}")], config);
    let out = renderer.render("t", &data(json!({"x": "<a>"}))).unwrap();
    assert_eq!(out, "<A> <a>");
}
