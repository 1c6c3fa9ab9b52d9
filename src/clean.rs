//! String sanitation for outbound records.
//!
//! Legacy payloads (base64 image dumps especially) arrive with stray NUL and
//! control bytes that the platform API's database rejects. Cleaning strips
//! those bytes from every string field before a record is POSTed.

use serde_json::Value;

/// Object fields whose substructure is never cleaned.
///
/// `founders` entries are rebuilt by the founder sub-import from
/// already-cleaned names and freshly fetched images, so re-walking them here
/// would be redundant.
pub const DEFAULT_EXEMPT_FIELDS: &[&str] = &["founders"];

/// Strip NUL and control bytes from a string, then trim whitespace.
///
/// Removes exactly the ranges 0x00-0x08, 0x0B, 0x0C, 0x0E-0x1F and 0x7F.
/// Tab and newline survive. Idempotent.
pub fn clean_text(s: &str) -> String {
    let stripped: String = s.chars().filter(|c| !is_stripped_control(*c)).collect();
    stripped.trim().to_string()
}

fn is_stripped_control(c: char) -> bool {
    matches!(
        c,
        '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}'
    )
}

/// Recursively clean every string field of a JSON value in place.
///
/// Numbers, booleans and null pass through untouched. Fields named in
/// [`DEFAULT_EXEMPT_FIELDS`] are left exactly as given.
pub fn clean_value(value: &mut Value) {
    clean_value_with_exemptions(value, DEFAULT_EXEMPT_FIELDS);
}

/// Like [`clean_value`] but with an explicit set of exempt field names.
pub fn clean_value_with_exemptions(value: &mut Value, exempt: &[&str]) {
    match value {
        Value::String(s) => *s = clean_text(s),
        Value::Array(items) => {
            for item in items {
                clean_value_with_exemptions(item, exempt);
            }
        }
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if exempt.contains(&key.as_str()) {
                    continue;
                }
                clean_value_with_exemptions(field, exempt);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_control_bytes_and_trims() {
        assert_eq!(clean_text("\x00abc\x1Fdef\x7F"), "abcdef");
        assert_eq!(clean_text("  padded \x0b "), "padded");
    }

    #[test]
    fn keeps_tabs_and_newlines() {
        assert_eq!(clean_text("a\tb\nc"), "a\tb\nc");
    }

    #[test]
    fn clean_text_is_idempotent() {
        let samples = ["\x00abc\x1Fdef\x7F", "  x  ", "plain", "\x01\x02\x03"];
        for s in samples {
            let once = clean_text(s);
            assert_eq!(clean_text(&once), once);
        }
    }

    #[test]
    fn cleans_nested_strings_only() {
        let mut v = json!({
            "name": "\x00Acme\x1F",
            "rank": 3,
            "active": true,
            "missing": null,
            "tags": ["\x01alpha", "beta"],
            "nested": {"bio": " spaced \x7F"}
        });
        clean_value(&mut v);
        assert_eq!(v["name"], "Acme");
        assert_eq!(v["rank"], 3);
        assert_eq!(v["active"], true);
        assert_eq!(v["missing"], Value::Null);
        assert_eq!(v["tags"][0], "alpha");
        assert_eq!(v["tags"][1], "beta");
        assert_eq!(v["nested"]["bio"], "spaced");
    }

    #[test]
    fn founders_field_is_exempt() {
        let original = json!({"founders": ["\x00dirty", {"name": "\x01raw"}]});
        let mut v = original.clone();
        clean_value(&mut v);
        assert_eq!(v, original);
    }

    #[test]
    fn exemption_set_is_configurable() {
        let mut v = json!({"founders": ["\x00dirty"]});
        clean_value_with_exemptions(&mut v, &[]);
        assert_eq!(v["founders"][0], "dirty");
    }
}
