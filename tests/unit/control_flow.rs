//! Conditionals and loops.

use serde_json::json;
use vellum::config::ViewConfig;
use vellum::core::ViewError;

use crate::common::{data, memory_renderer, memory_renderer_with, squash};

fn render_one(template: &str, vars: serde_json::Value) -> String {
    memory_renderer(&[("t", template)]).render("t", &data(vars)).unwrap()
}

#[test]
fn test_if_elseif_else_chain() {
    let template = "@if($n > 10) big @elseif($n > 1) medium @else small @endif";
    assert_eq!(squash(&render_one(template, json!({"n": 50}))), "big");
    assert_eq!(squash(&render_one(template, json!({"n": 5}))), "medium");
    assert_eq!(squash(&render_one(template, json!({"n": 0}))), "small");
}

#[test]
fn test_unless() {
    let template = "@unless($user['admin']) visitor @else admin @endunless";
    assert_eq!(squash(&render_one(template, json!({"user": {"admin": false}}))), "visitor");
    assert_eq!(squash(&render_one(template, json!({"user": {"admin": true}}))), "admin");
}

#[test]
fn test_nested_conditionals() {
    let template = "@if($a) A @if($b) B @endif @else X @endif";
    assert_eq!(squash(&render_one(template, json!({"a": true, "b": true}))), "A B");
    assert_eq!(squash(&render_one(template, json!({"a": true, "b": false}))), "A");
    assert_eq!(squash(&render_one(template, json!({"a": false, "b": true}))), "X");
}

#[test]
fn test_foreach_over_list_with_keys() {
    let out = render_one(
        "@foreach($items as $i => $item){{ $i }}:{{ $item }};@endforeach",
        json!({"items": ["a", "b", "c"]}),
    );
    assert_eq!(out, "0:a;1:b;2:c;");
}

#[test]
fn test_foreach_over_objects_in_list() {
    let out = render_one(
        "@foreach($orders as $order)[{{ $order->id }}]@endforeach",
        json!({"orders": [{"id": 7}, {"id": 9}]}),
    );
    assert_eq!(out, "[7][9]");
}

#[test]
fn test_foreach_over_null_renders_nothing() {
    assert_eq!(render_one("<@foreach($none as $x){{ $x }}@endforeach>", json!({"none": null})), "<>");
}

#[test]
fn test_foreach_over_scalar_fails() {
    let renderer = memory_renderer(&[("t", "@foreach($n as $x) @endforeach")]);
    let err = renderer.render("t", &data(json!({"n": 3}))).unwrap_err();
    assert!(matches!(err, ViewError::Evaluation { ref message, .. } if message.contains("cannot iterate")));
}

#[test]
fn test_for_loop_with_init_condition_step() {
    assert_eq!(render_one("@for($i = 0; $i < 3; $i++){{ $i }}@endfor", json!({})), "012");
    assert_eq!(render_one("@for($i = 10; $i > 0; $i -= 4){{ $i }},@endfor", json!({})), "10,6,2,");
}

#[test]
fn test_loop_variables_leak_into_following_markup() {
    let out = render_one("@foreach($xs as $x) @endforeach last={{ $x }}", json!({"xs": [1, 2]}));
    assert_eq!(squash(&out), "last=2");
}

#[test]
fn test_while_false_never_runs() {
    assert_eq!(render_one("[@while($go) x @endwhile]", json!({"go": false})), "[]");
}

#[test]
fn test_runaway_loop_is_stopped() {
    let config = ViewConfig {
        max_loop_iterations: 5,
        ..ViewConfig::default()
    };
    let renderer = memory_renderer_with(&[("t", "line one\n@while(true) x @endwhile")], config);
    let err = renderer.render("t", &data(json!({}))).unwrap_err();
    match err {
        ViewError::LoopLimitExceeded {
            template,
            line,
            limit,
        } => {
            assert_eq!(template, "t");
            assert_eq!(line, 2);
            assert_eq!(limit, 5);
        }
        other => panic!("expected LoopLimitExceeded, got {other:?}"),
    }
}

#[test]
fn test_range_in_foreach() {
    assert_eq!(render_one("@foreach(range(1, 4) as $n){{ $n }}@endforeach", json!({})), "1234");
}
