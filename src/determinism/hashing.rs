//! The canonical hasher.
//!
//! This module defines the one true byte encoding used to turn a fact's
//! `(fields, predecessors)` into its content-address. Every
//! implementation of the historical fact graph must agree on this
//! encoding bit-for-bit, so the rules here are deliberately explicit and
//! verbose rather than delegated to `serde_json`'s default formatting
//! (which makes no ordering or number-formatting guarantees across
//! versions).
//!
//! Canonical form:
//! - field names in lexicographic order
//! - values: null, booleans, integers/decimals without trailing zeros,
//!   UTF-8 strings with a fixed escape table
//! - predecessors in lexicographic role order; sequence-valued roles are
//!   sorted by `(type, hash)` ascending and deduplicated before encoding
//! - each predecessor reference is encoded as `type` then `hash`
//!
//! The digest algorithm is SHA-512; the external identity is the
//! standard (padded) base64 encoding of the 64-byte digest.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use sha2::{Digest, Sha512};

use crate::errors::{FactError, FactResult};
use crate::model::fact::{FactReference, FieldMap, FieldValue, PredecessorMap, PredecessorValue};

/// Hash a fact's fields and predecessors, returning its base64 digest.
///
/// This is the only function that should be used to assign a `hash` to
/// a freshly constructed `FactRecord`; everything else in the crate
/// treats `hash` as an opaque, already-assigned identity.
pub fn hash_fact(fields: &FieldMap, predecessors: &PredecessorMap) -> FactResult<String> {
    let mut buf = String::new();
    buf.push('{');
    buf.push_str("\"fields\":");
    encode_fields(fields, &mut buf)?;
    buf.push(',');
    buf.push_str("\"predecessors\":");
    encode_predecessors(predecessors, &mut buf);
    buf.push('}');

    Ok(hash_bytes_base64(buf.as_bytes()))
}

/// Hash arbitrary already-canonicalized bytes to a base64 digest. Used
/// for fact hashing above, and reused as-is by `crate::spec::skeleton`
/// and `crate::runtime::feed` to hash canonical skeleton/feed-identifier
/// encodings under the same algorithm and external representation.
pub fn hash_bytes_base64(bytes: &[u8]) -> String {
    let digest = Sha512::digest(bytes);
    BASE64_STANDARD.encode(digest)
}

fn encode_fields(fields: &FieldMap, out: &mut String) -> FactResult<()> {
    out.push('{');
    let mut first = true;
    // `FieldMap` is a `BTreeMap`, so iteration is already in
    // lexicographic key order — no extra sort needed.
    for (name, value) in fields {
        if !first {
            out.push(',');
        }
        first = false;
        encode_string(name, out);
        out.push(':');
        encode_value(value, out)?;
    }
    out.push('}');
    Ok(())
}

fn encode_value(value: &FieldValue, out: &mut String) -> FactResult<()> {
    match value {
        FieldValue::Null => out.push_str("null"),
        FieldValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        FieldValue::Number(n) => encode_number(n, out)?,
        FieldValue::String(s) => encode_string(s, out),
    }
    Ok(())
}

/// Encode a number without trailing zeros. `serde_json::Number`'s own
/// textual representation already satisfies this (integers print with
/// no decimal point; floats print their shortest round-tripping form),
/// but we reject non-finite values explicitly since they cannot appear
/// in a canonical encoding.
fn encode_number(n: &serde_json::Number, out: &mut String) -> FactResult<()> {
    if n.as_f64().map(|f| f.is_finite()).unwrap_or(true) {
        out.push_str(&n.to_string());
        Ok(())
    } else {
        Err(FactError::invalid_fact("non-finite number in fact field"))
    }
}

/// Encode a string with a fixed escape table matching the subset of
/// JSON string escaping relevant to canonical hashing: quote,
/// backslash, and the C0 control characters.
///
/// `pub(crate)` so `crate::spec::skeleton` and `crate::runtime::feed`
/// can reuse the same escape table when canonicalizing skeletons and
/// feed identifiers, rather than hashing a `{:?}` debug rendering.
pub(crate) fn encode_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn encode_predecessors(predecessors: &PredecessorMap, out: &mut String) {
    out.push('{');
    let mut first = true;
    // `PredecessorMap` is a `BTreeMap`, so role names are already in
    // lexicographic order.
    for (role, value) in predecessors {
        if !first {
            out.push(',');
        }
        first = false;
        encode_string(role, out);
        out.push(':');
        match value {
            PredecessorValue::Single(r) => encode_reference(r, out),
            PredecessorValue::Many(refs) => {
                let mut sorted = refs.clone();
                sorted.sort_by(|a, b| (&a.fact_type, &a.hash).cmp(&(&b.fact_type, &b.hash)));
                sorted.dedup_by(|a, b| a.fact_type == b.fact_type && a.hash == b.hash);

                out.push('[');
                for (i, r) in sorted.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    encode_reference(r, out);
                }
                out.push(']');
            }
        }
    }
    out.push('}');
}

pub(crate) fn encode_reference(r: &FactReference, out: &mut String) {
    out.push('{');
    out.push_str("\"type\":");
    encode_string(&r.fact_type, out);
    out.push(',');
    out.push_str("\"hash\":");
    encode_string(&r.hash, out);
    out.push('}');
}
