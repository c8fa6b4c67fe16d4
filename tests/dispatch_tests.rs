// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dispatch integration tests.
//!
//! Tests cover:
//! - Binary documents reproduced exactly against the paired writer
//! - Absent destinations rejected before any input is read
//! - Malformed extended JSON leaving the destination untouched
//! - Recovery of the pooled decoders after failed decodes
//! - Canonical and relaxed mode agreeing on shared inputs
//! - Registry-resolved destinations and custom registries
//! - Linear decode time in the number of keys

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use bsoncodec::encoding::{default_registry, BsonReader, ExtJsonReader};
use bsoncodec::{
    decode, decode_extended, decode_extended_with_context, decode_extended_with_registry,
    decode_from_reader, decode_with_registry, Bson, CaptureSlot, CodecError, CodecRegistry,
    DecodeContext, Decoder, DecoderPool, Document, Target,
};

use common::{bson_bytes, outer_document, record_fixture, Inner, Outer, Record, Sample, OUTER_JSON};

// ============================================================================
// Binary documents
// ============================================================================

#[test]
fn test_binary_round_trip_typed() {
    let (expected, doc) = record_fixture();
    let bytes = bson_bytes(&doc);

    let mut record = Record::default();
    decode(&bytes, &mut record).unwrap();
    assert_eq!(record, expected);
}

#[test]
fn test_binary_round_trip_generic() {
    let (_, doc) = record_fixture();
    let bytes = bson_bytes(&doc);

    let mut out = Document::new();
    decode(&bytes, &mut out).unwrap();
    assert_eq!(out, doc);
}

#[test]
fn test_truncated_binary_document() {
    let (_, doc) = record_fixture();
    let bytes = bson_bytes(&doc);

    let mut out = Document::new();
    let err = decode(&bytes[..bytes.len() - 3], &mut out).unwrap_err();
    assert!(matches!(err, CodecError::BufferTooShort { .. }));
}

#[test]
fn test_unknown_fields_are_skipped() {
    let mut doc = outer_document();
    doc.insert("ignored", vec![Bson::Int32(1), Bson::Document(Document::new())]);
    let bytes = bson_bytes(&doc);

    let mut out = Outer::default();
    decode(&bytes, &mut out).unwrap();
    assert_eq!(out.a, "123");
    assert_eq!(out.b, Inner { b: 123 });
}

// ============================================================================
// Invalid destinations
// ============================================================================

#[test]
fn test_absent_destination_any_input() {
    let inputs: [&[u8]; 3] = [b"", b"\x05\x00\x00\x00\x00", b"garbage"];
    for input in inputs {
        let err = decode(input, None::<&mut Outer>).unwrap_err();
        assert!(matches!(err, CodecError::InvalidDestination { .. }));

        let err = decode(input, Target::Absent).unwrap_err();
        assert!(matches!(err, CodecError::InvalidDestination { .. }));

        let err = decode_extended(input, false, None::<&mut Document>).unwrap_err();
        assert!(matches!(err, CodecError::InvalidDestination { .. }));
    }
}

// ============================================================================
// Malformed extended JSON
// ============================================================================

#[test]
fn test_unterminated_literal_leaves_destination_untouched() {
    let mut out = Outer {
        a: "before".to_string(),
        b: Inner { b: 1 },
    };
    let err = decode_extended(br#"{"a": "unterminated"#, true, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::MalformedInput { .. }));
    assert_eq!(out.a, "before");
    assert_eq!(out.b.b, 1);
}

#[test]
fn test_malformed_wrapper_leaves_destination_untouched() {
    let mut out = Document::new();
    out.insert("keep", true);
    let err = decode_extended(br#"{"a": {"$numberInt": "nope"}}"#, false, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::MalformedInput { .. }));
    assert_eq!(out.get("keep"), Some(&Bson::Boolean(true)));
}

// ============================================================================
// Pool recovery
// ============================================================================

#[test]
fn test_valid_decode_after_failures() {
    for _ in 0..16 {
        let mut out = Outer::default();
        assert!(decode_extended(br#"{"a": 1}"#, false, &mut out).is_err());
        assert!(decode(b"\x10\x00\x00\x00", &mut out).is_err());
        assert!(decode_extended(br#"{"b": {"b": {"deep": "#, false, &mut out).is_err());
    }

    let mut out = Outer::default();
    decode_extended(OUTER_JSON.as_bytes(), true, &mut out).unwrap();
    assert_eq!(out.a, "123");
    assert_eq!(out.b, Inner { b: 123 });
}

#[test]
fn test_same_slot_different_shapes() {
    let pool = bsoncodec::DecoderPool::with_capacity(1);

    {
        let mut dec = pool.acquire();
        dec.reset(Box::new(
            ExtJsonReader::new(OUTER_JSON.as_bytes(), true).unwrap(),
        ))
        .unwrap();
        dec.set_context(DecodeContext::default()).unwrap();
        let mut outer = Outer::default();
        dec.decode(&mut outer).unwrap();
        assert_eq!(outer.b.b, 123);
    }

    {
        let mut dec = pool.acquire();
        dec.reset(Box::new(
            ExtJsonReader::new(&br#"{"values": [3, 4]}"#[..], true).unwrap(),
        ))
        .unwrap();
        dec.set_context(DecodeContext::default()).unwrap();
        let mut sample = Sample::default();
        dec.decode(&mut sample).unwrap();
        assert_eq!(sample, Sample { values: vec![3, 4], label: None });
        assert_eq!(dec.uses(), 2);
    }

    assert_eq!(pool.total_allocations(), 1);
}

#[test]
fn test_aborted_lookahead_does_not_leak() {
    let pool = bsoncodec::DecoderPool::with_capacity(1);

    {
        // Fails partway through, leaving unread tokens behind.
        let mut dec = pool.acquire();
        dec.reset(Box::new(
            ExtJsonReader::new(&br#"{"values": [1], "label": 5}"#[..], false).unwrap(),
        ))
        .unwrap();
        dec.set_context(DecodeContext::default()).unwrap();
        let mut sample = Sample::default();
        assert!(dec.decode(&mut sample).is_err());
    }

    let mut dec = pool.acquire();
    dec.reset(Box::new(
        ExtJsonReader::new(&br#"{"label": "ok"}"#[..], false).unwrap(),
    ))
    .unwrap();
    dec.set_context(DecodeContext::default()).unwrap();
    let mut sample = Sample::default();
    dec.decode(&mut sample).unwrap();
    assert_eq!(sample.label.as_deref(), Some("ok"));
}

#[test]
fn test_failed_capture_does_not_leak_into_next_decode() {
    let pool = DecoderPool::with_capacity(1);

    let mut first: Document = [("untouched", true)].into_iter().collect();
    {
        // Fails inside "b", with both capture frames still open.
        let mut dec = pool.acquire();
        dec.reset(Box::new(
            ExtJsonReader::new(
                &br#"{"a": "stale", "b": {"b": "wrong", "c": [1, 2]}}"#[..],
                true,
            )
            .unwrap(),
        ))
        .unwrap();
        dec.set_context(DecodeContext::with_capture(
            default_registry(),
            CaptureSlot::Document(&mut first),
        ))
        .unwrap();
        let mut out = Outer::default();
        assert!(dec.decode(&mut out).is_err());
        assert!(dec.depth() > 0);
    }
    assert_eq!(first.len(), 1);
    assert_eq!(first.get("untouched"), Some(&Bson::Boolean(true)));

    let mut second = Document::new();
    {
        let mut dec = pool.acquire();
        dec.reset(Box::new(
            ExtJsonReader::new(OUTER_JSON.as_bytes(), true).unwrap(),
        ))
        .unwrap();
        dec.set_context(DecodeContext::with_capture(
            default_registry(),
            CaptureSlot::Document(&mut second),
        ))
        .unwrap();
        let mut out = Outer::default();
        dec.decode(&mut out).unwrap();
        assert_eq!(out.a, "123");
        assert_eq!(dec.uses(), 2);
    }

    assert_eq!(second, outer_document());
    assert_eq!(pool.total_allocations(), 1);
}

// ============================================================================
// Canonical and relaxed mode
// ============================================================================

#[test]
fn test_canonical_flag_does_not_change_values() {
    let inputs = [
        OUTER_JSON,
        r#"{"n": {"$numberLong": "9000000000"}, "d": {"$numberDouble": "-0.5"}}"#,
        r#"{"t": {"$date": {"$numberLong": "1600000000000"}}, "o": {"$oid": "5f1d7a2b9c8e4f0a1b2c3d4e"}}"#,
        r#"{"bin": {"$binary": {"base64": "AQID", "subType": "05"}}, "list": [1, 2.5, null]}"#,
    ];
    for input in inputs {
        let mut canonical = Document::new();
        let mut relaxed = Document::new();
        decode_extended(input.as_bytes(), true, &mut canonical).unwrap();
        decode_extended(input.as_bytes(), false, &mut relaxed).unwrap();
        assert_eq!(canonical, relaxed, "modes disagree on {input}");
    }
}

#[test]
fn test_relaxed_only_literals() {
    let input = br#"{"t": {"$date": "2020-09-13T12:26:40Z"}}"#;

    let mut out = Document::new();
    decode_extended(input, false, &mut out).unwrap();
    assert_eq!(out.get("t"), Some(&Bson::DateTime(1_600_000_000_000)));

    let err = decode_extended(input, true, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::MalformedInput { .. }));
}

// ============================================================================
// Registries and readers
// ============================================================================

#[derive(Debug, Default, PartialEq)]
struct Celsius(f64);

#[test]
fn test_custom_registry_rule() {
    let registry = Arc::new(CodecRegistry::new());
    registry.register_rule(|dec: &mut Decoder<'_>, out: &mut Celsius| {
        out.0 = dec.decode_field::<f64>()? - 273.15;
        Ok(())
    });

    let mut temp = Celsius::default();
    decode_extended_with_registry(&registry, b"300", false, Target::registered(&mut temp)).unwrap();
    assert!((temp.0 - 26.85).abs() < 1e-9);
}

#[test]
fn test_missing_rule_is_no_decoder() {
    let registry = Arc::new(CodecRegistry::new());
    let bytes = bson_bytes(&outer_document());

    let mut out = Document::new();
    let err = decode_with_registry(&registry, &bytes, Target::registered(&mut out)).unwrap_err();
    assert!(matches!(err, CodecError::NoDecoder { .. }));

    // Self-decoding destinations never consult the registry.
    decode_with_registry(&registry, &bytes, &mut out).unwrap();
    assert_eq!(out, outer_document());
}

#[test]
fn test_context_with_dual_output_but_no_slot() {
    let mut ctx = DecodeContext::default();
    ctx.dual_output = true;
    let mut out = Outer::default();
    let err = decode_extended_with_context(ctx, OUTER_JSON.as_bytes(), true, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::InvalidContext { .. }));
    assert_eq!(out, Outer::default());
}

#[test]
fn test_decode_from_caller_reader() {
    let bytes = bson_bytes(&outer_document());
    let mut out = Outer::default();
    decode_from_reader(DecodeContext::default(), BsonReader::new(&bytes), &mut out).unwrap();
    assert_eq!(out.b.b, 123);
}

#[test]
fn test_type_mismatch_reports_field_path() {
    let mut out = Outer::default();
    let err = decode_extended(br#"{"a": "x", "b": {"b": true}}"#, false, &mut out).unwrap_err();
    assert_eq!(err.field_path(), vec!["b", "b"]);
    assert!(err.to_string().contains("expected int32"));
}

#[test]
fn test_unmodelled_types_rejected_on_both_formats() {
    let mut out = Document::new();
    let err = decode_extended(br#"{"x": {"$numberDecimal": "1.5"}}"#, true, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::Unsupported { .. }));

    let err = decode_extended(br#"{"t": {"$timestamp": {"t": 1, "i": 2}}}"#, false, &mut out)
        .unwrap_err();
    assert!(matches!(err, CodecError::Unsupported { .. }));

    // {"x": decimal128(0)}
    let mut bytes = vec![24, 0, 0, 0, 0x13, b'x', 0];
    bytes.extend_from_slice(&[0; 16]);
    bytes.push(0);
    let err = decode(&bytes, &mut out).unwrap_err();
    assert!(matches!(err, CodecError::Unsupported { .. }));
    assert!(out.is_empty());
}

// ============================================================================
// Wide documents
// ============================================================================

fn wide_document(keys: usize) -> Vec<u8> {
    let mut doc = Document::new();
    for i in 0..keys {
        doc.insert(format!("key{i}"), i as i64);
    }
    bson_bytes(&doc)
}

fn best_decode_time(bytes: &[u8], keys: usize) -> Duration {
    (0..3)
        .map(|_| {
            let mut out = Document::new();
            let start = Instant::now();
            decode(bytes, &mut out).unwrap();
            let elapsed = start.elapsed();
            assert_eq!(out.len(), keys);
            elapsed
        })
        .min()
        .unwrap_or_default()
}

#[test]
fn test_decode_time_grows_linearly_with_keys() {
    let small = wide_document(10_000);
    let large = wide_document(40_000);

    let small_time = best_decode_time(&small, 10_000);
    let large_time = best_decode_time(&large, 40_000);

    // Four times the keys; quadratic inserts would take about sixteen times as long.
    assert!(
        large_time < small_time * 10,
        "10k keys took {small_time:?}, 40k keys took {large_time:?}"
    );
}
