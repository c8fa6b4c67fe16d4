// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Concurrency integration tests.
//!
//! Parallel decodes share the global decoder pool and the default registry;
//! each must see only its own destination and input.

mod common;

use std::thread;

use rayon::prelude::*;

use bsoncodec::{decode, decode_extended, decode_extended_with_capture, Document};

use common::{bson_bytes, outer_document, record_fixture, Outer, Record, Sample, OUTER_JSON};

#[test]
fn test_parallel_decodes_of_same_document() {
    let (expected, doc) = record_fixture();
    let bytes = bson_bytes(&doc);

    let results: Vec<Record> = (0..100)
        .into_par_iter()
        .map(|_| {
            let mut record = Record::default();
            decode(&bytes, &mut record).unwrap();
            record
        })
        .collect();

    assert_eq!(results.len(), 100);
    assert!(results.iter().all(|r| *r == expected));
}

#[test]
fn test_parallel_mixed_shapes_and_failures() {
    let outcomes: Vec<bool> = (0..200)
        .into_par_iter()
        .map(|i| match i % 4 {
            0 => {
                let mut out = Outer::default();
                decode_extended(OUTER_JSON.as_bytes(), true, &mut out).is_ok() && out.b.b == 123
            }
            1 => {
                let json = format!(r#"{{"values": [{i}], "label": "n{i}"}}"#);
                let mut out = Sample::default();
                decode_extended(json.as_bytes(), false, &mut out).is_ok()
                    && out.values == vec![i as i32]
                    && out.label == Some(format!("n{i}"))
            }
            2 => {
                let mut out = Outer::default();
                decode_extended(br#"{"a": [1, 2"#, false, &mut out).is_err()
            }
            _ => {
                let mut typed = Outer::default();
                let mut generic = Document::new();
                decode_extended_with_capture(OUTER_JSON.as_bytes(), true, &mut typed, &mut generic)
                    .is_ok()
                    && generic == outer_document()
            }
        })
        .collect();

    assert!(outcomes.iter().all(|ok| *ok));
}

#[test]
fn test_threads_see_their_own_input() {
    let handles: Vec<_> = (0..8)
        .map(|t| {
            thread::spawn(move || {
                for n in 0..50 {
                    let mut doc = Document::new();
                    doc.insert("t", t);
                    doc.insert("n", n);
                    let bytes = bson_bytes(&doc);

                    let mut out = Document::new();
                    decode(&bytes, &mut out).unwrap();
                    assert_eq!(out, doc);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
