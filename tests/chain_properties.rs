#![expect(clippy::unwrap_used, reason = "test code uses unwrap for concise assertions")]

use proptest::prelude::*;
use strum::IntoEnumIterator;

use structured_error::{
    ErrorList, Kind, RenderMode, Stacktrace, StructuredError, decode, encode, encode_to_string,
};

#[derive(Debug, Clone)]
struct Level {
    kind: Kind,
    message: String,
    meta: Vec<(String, String)>,
    line: u32,
}

impl Level {
    fn build(&self) -> StructuredError {
        let at = Stacktrace::new("app::handler", "src/handler.rs", self.line);
        self.meta.iter().fold(
            StructuredError::from_kind_at(self.kind, self.message.clone(), at),
            |err, (key, value)| err.with_meta(key.clone(), value.clone()),
        )
    }
}

fn arb_kind() -> impl Strategy<Value = Kind> {
    prop::sample::select(Kind::iter().collect::<Vec<_>>())
}

fn arb_level() -> impl Strategy<Value = Level> {
    (
        arb_kind(),
        "[a-z][a-z ]{0,15}",
        prop::collection::vec(("[a-z]{1,4}", "\\PC{0,8}"), 0..4),
        0u32..5_000,
    )
        .prop_map(|(kind, message, meta, line)| Level {
            kind,
            message,
            meta,
            line,
        })
}

fn arb_levels() -> impl Strategy<Value = Vec<Level>> {
    prop::collection::vec(arb_level(), 1..8)
}

fn build_chain(levels: &[Level]) -> StructuredError {
    levels
        .iter()
        .map(Level::build)
        .collect::<ErrorList>()
        .into_error()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn decode_inverts_encode(levels in arb_levels()) {
        let err = build_chain(&levels);
        let back = decode(&encode(&err)).unwrap();
        prop_assert_eq!(back, err);
    }

    #[test]
    fn serde_output_matches_encoder(levels in arb_levels()) {
        let err = build_chain(&levels);
        prop_assert_eq!(serde_json::to_string(&err).unwrap(), encode_to_string(&err));
    }

    #[test]
    fn chain_keeps_attachment_order(levels in arb_levels()) {
        let err = build_chain(&levels);
        let got: Vec<&str> = err.chain().map(StructuredError::message).collect();
        let expected: Vec<&str> = levels.iter().map(|l| l.message.as_str()).collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(err.depth(), levels.len());
    }

    #[test]
    fn every_level_is_contained(levels in arb_levels()) {
        let err = build_chain(&levels);
        for level in &levels {
            prop_assert!(err.contains_message(&level.message));
            prop_assert!(err.contains(&std::io::Error::other(level.message.clone())));
            prop_assert!(err.contains_kind(level.kind));
        }
        prop_assert!(!err.contains_message("NOT-IN-ANY-LEVEL"));
        prop_assert!(!err.contains_opt(None));
    }

    #[test]
    fn with_meta_last_write_wins(key in "[a-z]{1,6}", first in "\\PC{0,8}", second in "\\PC{0,8}") {
        let err = StructuredError::from_kind_at(Kind::Warning, "m", Stacktrace::unknown())
            .with_meta(key.clone(), first)
            .with_meta(key.clone(), second.clone());
        prop_assert_eq!(err.meta().len(), 1);
        prop_assert_eq!(err.meta().values(&key).unwrap(), &[second][..]);
    }

    #[test]
    fn rendering_is_deterministic(levels in arb_levels()) {
        let err = build_chain(&levels);
        let detailed = err.format(RenderMode::Detailed);
        prop_assert_eq!(&detailed, &err.format(RenderMode::Detailed));
        prop_assert_eq!(err.format(RenderMode::Compact), levels[0].message.clone());
        let message_line = format!("MESSAGE = {}", levels[0].message);
        prop_assert!(detailed.lines().any(|line| line == message_line));
        prop_assert_eq!(
            detailed.lines().filter(|line| line.starts_with("CAUSE   = ")).count(),
            usize::from(levels.len() > 1)
        );
    }

    #[test]
    fn attaching_none_changes_nothing(levels in arb_levels()) {
        let err = build_chain(&levels);
        let same = err.clone().with_cause_opt(None::<StructuredError>);
        prop_assert_eq!(same, err);
    }
}
