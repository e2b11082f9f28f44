//! Error reporting: locations, suggestions and limits.

use serde_json::json;
use vellum::config::ViewConfig;
use vellum::core::{ViewError, user_friendly_error};

use crate::common::{data, memory_renderer, memory_renderer_with};

fn render_err(templates: &[(&str, &str)], name: &str) -> ViewError {
    memory_renderer(templates).render(name, &data(json!({}))).unwrap_err()
}

#[test]
fn test_undefined_variable_suggests_close_names() {
    let renderer = memory_renderer(&[("t", "first\n{{ $nam }}")]);
    let err = renderer.render("t", &data(json!({"name": "Ada", "count": 1}))).unwrap_err();
    match &err {
        ViewError::UndefinedVariable {
            template,
            line,
            variable,
            suggestions,
        } => {
            assert_eq!(template, "t");
            assert_eq!(*line, 2);
            assert_eq!(variable, "nam");
            assert_eq!(suggestions, &vec!["name".to_string()]);
        }
        other => panic!("expected UndefinedVariable, got {other:?}"),
    }

    let friendly = user_friendly_error(err.into()).to_string();
    assert!(friendly.contains("Did you mean $name?"), "{friendly}");
}

#[test]
fn test_unknown_function_hint() {
    let renderer = memory_renderer(&[("t", "{{ uper($x) }}")]);
    let err = renderer.render("t", &data(json!({"x": "a"}))).unwrap_err();
    assert!(
        matches!(&err, ViewError::Evaluation { message, .. } if message.contains("did you mean 'upper'")),
        "{err:?}"
    );
}

#[test]
fn test_expression_syntax_error_location() {
    let err = render_err(&[("t", "one\ntwo\n{{ $a + }}")], "t");
    assert!(matches!(err, ViewError::ExpressionSyntax { ref template, line: 3, .. } if template == "t"), "{err:?}");
}

#[test]
fn test_malformed_structures() {
    for template in [
        "@if(true) never closed",
        "stray @endif",
        "@if($a) @else @elseif($b) @endif",
        "@foreach($xs as $x) @endif",
        "@if($a",
    ] {
        let err = render_err(&[("t", template)], "t");
        assert!(matches!(err, ViewError::MalformedDirective { .. }), "{template}: {err:?}");
    }
}

#[test]
fn test_section_errors() {
    assert!(matches!(
        render_err(&[("t", "@section('a') never closed")], "t"),
        ViewError::UnclosedBlock { ref name, .. } if name == "a"
    ));
    assert!(matches!(render_err(&[("t", "text @stop")], "t"), ViewError::MalformedDirective { .. }));
}

#[test]
fn test_include_cannot_close_callers_section() {
    let err = render_err(
        &[("closer", "@stop"), ("t", "@section('a') @include('closer') @stop")],
        "t",
    );
    assert!(
        matches!(err, ViewError::MalformedDirective { ref template, .. } if template == "closer"),
        "{err:?}"
    );
}

#[test]
fn test_inheritance_cycle_reports_chain() {
    let err = render_err(&[("a", "@extends('b')"), ("b", "@extends('a')")], "a");
    match err {
        ViewError::InheritanceCycle {
            chain,
        } => assert_eq!(chain, vec!["a", "b", "a"]),
        other => panic!("expected InheritanceCycle, got {other:?}"),
    }
}

#[test]
fn test_inheritance_depth_limit() {
    let config = ViewConfig {
        max_inheritance_depth: 2,
        ..ViewConfig::default()
    };
    let templates = [
        ("t0", "@extends('t1')"),
        ("t1", "@extends('t2')"),
        ("t2", "top"),
        ("u0", "@extends('u1')"),
        ("u1", "@extends('u2')"),
        ("u2", "@extends('u3')"),
        ("u3", "top"),
    ];
    let renderer = memory_renderer_with(&templates, config);

    assert_eq!(renderer.render("t0", &data(json!({}))).unwrap(), "top");
    let err = renderer.render("u0", &data(json!({}))).unwrap_err();
    assert!(
        matches!(err, ViewError::DepthExceeded { kind: "inheritance", limit: 2, ref template } if template == "u3"),
        "{err:?}"
    );
}

#[test]
fn test_recursive_include_hits_depth_limit() {
    let config = ViewConfig {
        max_include_depth: 4,
        ..ViewConfig::default()
    };
    let renderer = memory_renderer_with(&[("loop", "x @include('loop')")], config);
    let err = renderer.render("loop", &data(json!({}))).unwrap_err();
    assert!(matches!(err, ViewError::DepthExceeded { kind: "include", limit: 4, .. }), "{err:?}");
}

#[test]
fn test_strict_blocks_reject_reading_open_section() {
    let template = "@section('a')@yield('a')@stop";
    let lenient = memory_renderer(&[("t", template)]);
    assert!(lenient.render("t", &data(json!({}))).is_ok());

    let strict = memory_renderer_with(&[("t", template)], ViewConfig {
        strict_blocks: true,
        ..ViewConfig::default()
    });
    let err = strict.render("t", &data(json!({}))).unwrap_err();
    assert!(matches!(err, ViewError::BlockReadWhileOpen { ref name } if name == "a"));
}

#[test]
fn test_missing_templates() {
    assert!(matches!(render_err(&[], "nope"), ViewError::TemplateNotFound { .. }));
    assert!(matches!(
        render_err(&[("t", "@include('gone')")], "t"),
        ViewError::TemplateNotFound { ref name, .. } if name == "gone"
    ));
}

#[test]
fn test_non_object_data_is_rejected() {
    let renderer = memory_renderer(&[("t", "x")]);
    let err = renderer.retrieve("t", &vec![1, 2]).unwrap_err();
    assert!(matches!(err, ViewError::Evaluation { line: 0, .. }), "{err:?}");
}

#[test]
fn test_deeply_nested_echo_is_a_syntax_error() {
    let echo = format!("{{{{ {}1{} }}}}", "(".repeat(50_000), ")".repeat(50_000));
    let err = render_err(&[("t", echo.as_str())], "t");
    match err {
        ViewError::ExpressionSyntax {
            message,
            ..
        } => assert!(message.contains("nested too deeply"), "{message}"),
        other => panic!("expected ExpressionSyntax, got {other:?}"),
    }
}
