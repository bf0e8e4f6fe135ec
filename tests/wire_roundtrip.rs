#![expect(
    clippy::unwrap_used,
    clippy::panic,
    reason = "test code uses unwrap/panic for concise assertions"
)]

use structured_error::{
    DecodeError, ErrorList, Kind, RenderMode, Stacktrace, StructuredError, decode,
    decode_or_warning, decode_str, encode, encode_to_string,
};

fn load_fixture(filename: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = format!("{manifest_dir}/tests/fixtures/{filename}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

fn messages(err: &StructuredError) -> Vec<&str> {
    err.chain().map(StructuredError::message).collect()
}

#[test]
fn golden_payload_round_trips_byte_for_byte() {
    let json = load_fixture("order_failure.json");
    let json = json.trim();
    let err = decode_str(json).unwrap();
    assert_eq!(encode_to_string(&err), json);
    assert_eq!(serde_json::to_string(&err).unwrap(), json);
}

#[test]
fn golden_payload_fields() {
    let err = decode_str(&load_fixture("order_failure.json")).unwrap();
    assert_eq!(err.kind(), Some(Kind::Unavailable));
    assert_eq!(err.meta().values("attempt").unwrap(), ["1", "2"]);
    assert_eq!(err.stacktrace(), &Stacktrace::new("orders::place", "src/orders.rs", 88));
    assert_eq!(
        messages(&err),
        [
            "order service unavailable",
            "inventory lookup timed out",
            "connection reset by peer"
        ]
    );
    let root = err.root_cause();
    assert_eq!(root.id(), "");
    assert!(root.stacktrace().is_unknown());
}

#[test]
fn golden_payload_detailed_render() {
    let err = decode_str(&load_fixture("order_failure.json")).unwrap();
    let expected = "ID      = [7d3f0c1e9a2b4c5d8e6f0a1b2c3d4e5f]
CN      = [503][***SERVICE UNAVAILABLE***]
MESSAGE = order service unavailable
META    = attempt : 1, 2
          region : eu-west-1
STACK   = orders::place src/orders.rs:88
CAUSE   = inventory lookup timed out
        = connection reset by peer";
    assert_eq!(err.format(RenderMode::Detailed), expected);
    assert_eq!(err.format(RenderMode::Compact), "order service unavailable");
}

#[test]
fn sparse_payload_fills_defaults() {
    let err = decode_str(&load_fixture("sparse_payload.json")).unwrap();
    assert_eq!(err.id(), "");
    assert_eq!(err.code(), 418);
    assert_eq!(err.name(), "");
    assert_eq!(err.kind(), None);
    assert_eq!(err.meta().keys().collect::<Vec<_>>(), ["origin", "tag"]);
    assert_eq!(err.meta().values("tag").unwrap(), ["b", "a"]);
    assert!(err.stacktrace().is_unknown());

    let cause = err.cause().unwrap();
    assert_eq!(cause.message(), "upstream said no");
    assert_eq!(cause.stacktrace().function, "proxy::forward");
    assert_eq!(cause.stacktrace().file, "");
    assert_eq!(cause.stacktrace().line, 0);
}

#[test]
fn nested_causes_render_and_search() {
    let err = StructuredError::service_error("foo").with_cause(
        StructuredError::service_error("bar").with_cause(StructuredError::service_error("baz")),
    );
    assert_eq!(err.format(RenderMode::Compact), "foo");

    let detailed = err.format(RenderMode::Detailed);
    let message_at = detailed.find("MESSAGE = foo").unwrap();
    let bar_at = detailed.find("CAUSE   = bar").unwrap();
    let baz_at = detailed.find("        = baz").unwrap();
    assert!(message_at < bar_at && bar_at < baz_at, "{detailed}");
    assert!(err.contains(&std::io::Error::other("baz")));

    let back = decode(&encode(&err)).unwrap();
    assert_eq!(back, err);
    assert_eq!(back.format(RenderMode::Detailed), detailed);
}

#[test]
fn malformed_payloads_fail_safely() {
    assert!(matches!(decode_str("{\"message\": 5}"), Err(DecodeError::Json(_))));
    assert!(matches!(decode_str("[]"), Err(DecodeError::NotAnObject { .. })));

    let warning = decode_or_warning(b"\x00\x01garbage");
    assert_eq!(warning.kind(), Some(Kind::Warning));
    assert_eq!(warning.message(), "decode structured error failed");
    assert!(warning.cause().is_some());
}

#[test]
fn aggregated_failures_travel_as_one_chain() {
    let mut list = ErrorList::new();
    for i in 0..3 {
        list.push(StructuredError::from_kind_at(
            Kind::ServiceError,
            i.to_string(),
            Stacktrace::unknown(),
        ));
    }
    let err = StructuredError::unavailable("batch failed").with_cause(list);
    let back = decode(&encode(&err)).unwrap();
    assert_eq!(messages(&back), ["batch failed", "0", "1", "2"]);
}

#[test]
fn deep_chains_survive_every_chain_operation() {
    let depth = 100_000;
    let list: ErrorList = (0..depth)
        .map(|i| {
            StructuredError::from_kind_at(Kind::ServiceError, i.to_string(), Stacktrace::unknown())
        })
        .collect();
    let err = list.into_error().unwrap();
    assert_eq!(err.depth(), depth);
    assert_eq!(err.root_cause().message(), (depth - 1).to_string());

    let copy = err.clone();
    assert_eq!(copy, err);

    let detailed = err.format(RenderMode::Detailed);
    assert_eq!(detailed.lines().count(), 4 + depth - 1);
    assert!(!err.render_chain().is_empty());

    let bytes = encode(&err);
    assert_eq!(bytes.iter().filter(|b| **b == b'{').count(), depth * 2);
    assert_eq!(serde_json::to_vec(&err).unwrap(), bytes);

    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, err);
    let through_serde: StructuredError = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(through_serde, err);

    drop(copy);
    drop(err);
}
