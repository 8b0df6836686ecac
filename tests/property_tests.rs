//! Property-based tests for the scalar codec and document serializer.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use metabump::store::{scalar, Document, KeyValues};

/// Strategy for values the codec must represent: any printable string
/// without a triple-quote run (the one documented unrepresentable shape).
fn representable_value() -> impl Strategy<Value = String> {
    "[ -~\\t\\n\\r]{0,40}".prop_filter("must not contain triple quote", |s| !s.contains("'''"))
}

/// Strategy for version-like values (what the file actually stores).
fn version_like() -> impl Strategy<Value = String> {
    "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}(-[a-z0-9]{1,8})?"
}

proptest! {
    /// decode(encode(v)) == v for every representable value.
    #[test]
    fn codec_round_trips(value in representable_value()) {
        let raw = scalar::encode(&value).unwrap();
        prop_assert_eq!(scalar::decode(&raw), value);
    }

    /// encode never emits a raw form that decodes to something else,
    /// even for plain unquoted-looking values.
    #[test]
    fn encode_is_unambiguous(value in version_like()) {
        let raw = scalar::encode(&value).unwrap();
        prop_assert_eq!(scalar::decode(&raw), value);
        // version-like values always fit the basic form
        prop_assert!(raw.starts_with('"') && raw.ends_with('"'));
    }

    /// An update followed by an identical update changes nothing the
    /// second time, and rendering is stable across both.
    #[test]
    fn update_is_idempotent(old in version_like(), new in version_like()) {
        let text = format!("[pkg]\nVERSION = \"{old}\"\n");
        let mut doc = Document::parse(&text);
        let changes = KeyValues::from([("VERSION".to_string(), new.clone())]);

        let first = doc.update("pkg", &changes).unwrap();
        prop_assert_eq!(first.is_empty(), old == new);

        let rendered = doc.render();
        let second = doc.update("pkg", &changes).unwrap();
        prop_assert!(second.is_empty());
        prop_assert_eq!(doc.render(), rendered);
    }

    /// Canonical documents survive a parse/render cycle byte for byte.
    #[test]
    fn parse_render_is_stable(
        names in prop::collection::vec("[a-z][a-z0-9-]{0,10}", 1..4),
        value in version_like(),
    ) {
        let mut text = String::from("# generated header\n");
        for name in &names {
            text.push_str(&format!("[{name}]\nVERSION = \"{value}\"\n\n"));
        }
        // drop the trailing blank line so the text is in rendered shape
        text.truncate(text.len() - 1);
        prop_assert_eq!(Document::parse(&text).render(), text);
    }
}
