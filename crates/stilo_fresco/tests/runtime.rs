//! Runtime behaviour across the synchronous and asynchronous paths.

use futures::executor::block_on;
use serde_json::{json, Value};
use stilo_fresco::{
    use_inline_task, use_inline_task_with, Captures, RenderError, ResourceRef, SignalRef,
};

#[test]
fn test_capture_free_call_is_synchronous() {
    let element = use_inline_task("() => { console.log('hi'); }");
    assert_eq!(element.tag(), "script");
    assert_eq!(element.inner_html(), "(() => { console.log('hi'); })()");
}

#[test]
fn test_plain_captures_serialise_in_order() {
    let captures = Captures::new()
        .with("b", json!(1))
        .with("a", json!("two"));
    let output = use_inline_task_with("(__scope) => __scope.b", captures).unwrap();
    let element = output.ready().expect("synchronous path");
    assert_eq!(
        element.inner_html(),
        r#"((__scope) => __scope.b)({"b":1,"a":"two"})"#
    );
}

#[test]
fn test_signal_captures_take_their_sample() {
    let captures = Captures::new().with("count", SignalRef::new(json!(7)));
    let output = use_inline_task_with("(s) => s.count", captures).unwrap();
    let element = output.ready().unwrap();
    assert!(element.inner_html().contains(r#"{"count":7}"#));
}

#[test]
fn test_resolved_resource_is_synchronous() {
    let captures = Captures::new().with("d", ResourceRef::resolved(json!([1, 2])));
    let output = use_inline_task_with("(s) => s.d", captures).unwrap();
    assert!(output.is_ready());
    let element = output.ready().unwrap();
    assert!(element.inner_html().contains(r#"{"d":[1,2]}"#));
}

#[test]
fn test_pending_resource_defers_the_element() {
    let captures = Captures::new().with(
        "d",
        ResourceRef::pending(futures::future::ready(Ok(json!(42)))),
    );
    let output = use_inline_task_with("(s) => s.d", captures).unwrap();
    assert!(!output.is_ready());

    let element = block_on(output.resolve()).unwrap();
    assert!(element.inner_html().contains(r#""d":42"#));
}

#[test]
fn test_async_path_matches_sync_output() {
    let sync_captures = Captures::new()
        .with("a", json!(1))
        .with("d", ResourceRef::resolved(json!(42)));
    let sync_element = use_inline_task_with("(s) => s.d", sync_captures)
        .unwrap()
        .ready()
        .unwrap();

    let async_captures = Captures::new()
        .with("a", json!(1))
        .with("d", ResourceRef::pending(futures::future::ready(Ok(json!(42)))));
    let async_element = block_on(
        use_inline_task_with("(s) => s.d", async_captures)
            .unwrap()
            .resolve(),
    )
    .unwrap();

    assert_eq!(sync_element, async_element);
}

#[test]
fn test_rejected_resource_rejects_the_future() {
    let captures = Captures::new().with("d", ResourceRef::rejected("fetch failed"));
    let output = use_inline_task_with("(s) => s.d", captures).unwrap();
    assert!(!output.is_ready());

    let result = block_on(output.resolve());
    assert!(matches!(result, Err(RenderError::ResourceRejected(_))));
}

#[test]
fn test_undefined_captures_vanish() {
    let captures = Captures::new()
        .with("gone", stilo_fresco::CaptureValue::Undefined)
        .with("kept", json!(true));
    let element = use_inline_task_with("(s) => s.kept", captures)
        .unwrap()
        .ready()
        .unwrap();
    assert!(element.inner_html().contains(r#"{"kept":true}"#));
    assert!(!element.inner_html().contains("gone"));
}

#[test]
fn test_non_finite_numbers_become_null() {
    let captures = Captures::new().with("n", Value::from(f64::NAN));
    let element = use_inline_task_with("(s) => s.n", captures)
        .unwrap()
        .ready()
        .unwrap();
    assert!(element.inner_html().contains(r#"{"n":null}"#));
}

#[test]
fn test_script_breakout_is_escaped() {
    let captures = Captures::new().with("s", json!("</script><script>alert(1)</script>"));
    let element = use_inline_task_with("(s) => s.s", captures)
        .unwrap()
        .ready()
        .unwrap();

    let body = element.inner_html();
    assert!(!body.contains("</"));
    assert!(!body.to_ascii_lowercase().contains("</script"));
    assert!(body.contains("<\\/script>"));
}

#[test]
fn test_comment_open_in_captures_is_escaped() {
    let captures = Captures::new().with("s", json!("<!-- sneaky"));
    let element = use_inline_task_with("(s) => s.s", captures)
        .unwrap()
        .ready()
        .unwrap();
    assert!(!element.inner_html().contains("<!--"));
}

#[test]
fn test_to_html_embeds_the_body() {
    let element = use_inline_task("() => {}");
    assert_eq!(element.to_html(), "<script>(() => {})()</script>");
}
