//! Index Consistency Tests
//!
//! Tests for index invariants:
//! - Indexed lookups return exactly what a full scan returns
//! - Unindexed tables answer from a scan of the files on disk
//! - Tag queries have AND semantics
//! - Results are identical across repeated queries and reopen

use folio::{Database, FieldValue, RecordId, StoreConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const AUTHORS: [&str; 3] = ["alice", "bob", "carol"];
const TAGS: [&str; 4] = ["go", "db", "rust", "web"];

fn create_root() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    fs::create_dir(temp.path().join("posts")).unwrap();
    temp
}

/// Indexed handle and a scan-only handle over the same files
fn open_pair(temp: &TempDir) -> (Database, Database) {
    let indexed =
        Database::open(StoreConfig::new(temp.path()).with_index("posts", ["author", "score", "tags"]))
            .unwrap();
    let scanning = Database::open(StoreConfig::new(temp.path())).unwrap();
    (indexed, scanning)
}

fn random_post(rng: &mut StdRng) -> Value {
    let author = AUTHORS[rng.gen_range(0..AUTHORS.len())];
    // Integral floats and integers must land in the same bucket
    let score = if rng.gen_bool(0.5) {
        json!(rng.gen_range(1..4))
    } else {
        json!(rng.gen_range(1..4) as f64)
    };
    let tags: Vec<&str> = TAGS.iter().copied().filter(|_| rng.gen_bool(0.4)).collect();
    json!({"author": author, "score": score, "tags": tags})
}

fn expected_for_field(model: &BTreeMap<RecordId, Value>, field: &str, value: &FieldValue) -> Vec<RecordId> {
    model
        .iter()
        .filter(|(_, doc)| FieldValue::from_json(&doc[field]).as_ref() == Some(value))
        .map(|(id, _)| *id)
        .collect()
}

fn expected_for_tags(model: &BTreeMap<RecordId, Value>, wanted: &[&str]) -> Vec<RecordId> {
    if wanted.is_empty() {
        return Vec::new();
    }
    model
        .iter()
        .filter(|(_, doc)| {
            let tags = doc["tags"].as_array().unwrap();
            wanted.iter().all(|w| tags.iter().any(|t| t == w))
        })
        .map(|(id, _)| *id)
        .collect()
}

fn assert_consistent(indexed: &Database, scanning: &Database, model: &BTreeMap<RecordId, Value>) {
    let ids: Vec<RecordId> = model.keys().copied().collect();
    assert_eq!(indexed.find_all_ids("posts").unwrap(), ids);
    assert_eq!(scanning.find_all_ids("posts").unwrap(), ids);

    for author in AUTHORS {
        let value = FieldValue::from(author);
        let expected = expected_for_field(model, "author", &value);
        assert_eq!(indexed.find_all_ids_for_field("posts", "author", author).unwrap(), expected);
        assert_eq!(scanning.find_all_ids_for_field("posts", "author", author).unwrap(), expected);
    }

    for score in 1..4i64 {
        let expected = expected_for_field(model, "score", &FieldValue::Int(score));
        assert_eq!(indexed.find_all_ids_for_field("posts", "score", score).unwrap(), expected);
        assert_eq!(
            scanning.find_all_ids_for_field("posts", "score", score as f64).unwrap(),
            expected
        );
    }

    let requests: [&[&str]; 5] = [&["go"], &["db"], &["go", "db"], &["rust", "web", "go"], &[]];
    for wanted in requests {
        let expected = expected_for_tags(model, wanted);
        assert_eq!(indexed.find_all_ids_for_tags("posts", wanted.iter()).unwrap(), expected);
        assert_eq!(scanning.find_all_ids_for_tags("posts", wanted.iter()).unwrap(), expected);
    }
}

// =============================================================================
// Index vs Scan Equivalence
// =============================================================================

/// Every reachable table state answers the same through index and scan.
#[test]
fn test_index_matches_scan_through_mutations() {
    let temp = create_root();
    let (indexed, scanning) = open_pair(&temp);
    let mut rng = StdRng::seed_from_u64(7);
    let mut model = BTreeMap::new();

    for _ in 0..60 {
        match rng.gen_range(0..10) {
            0..=4 => {
                let post = random_post(&mut rng);
                let id = indexed.create("posts", &post).unwrap();
                model.insert(id, post);
            }
            5..=7 if !model.is_empty() => {
                let id = *model.keys().nth(rng.gen_range(0..model.len())).unwrap();
                let post = random_post(&mut rng);
                indexed.update("posts", &post, id).unwrap();
                model.insert(id, post);
            }
            _ if !model.is_empty() => {
                let id = *model.keys().nth(rng.gen_range(0..model.len())).unwrap();
                indexed.delete("posts", id).unwrap();
                model.remove(&id);
            }
            _ => {}
        }
        assert!(!indexed.is_index_stale("posts").unwrap());
        assert_consistent(&indexed, &scanning, &model);
    }

    let snap = indexed.metrics();
    assert!(snap.indexed_lookups > 0);
    assert_eq!(snap.scan_lookups, 0);
    assert!(scanning.metrics().scan_lookups > 0);
}

/// Reopening rebuilds the same indexes from the files.
#[test]
fn test_reopen_rebuilds_identical_indexes() {
    let temp = create_root();
    let mut rng = StdRng::seed_from_u64(42);
    let mut model = BTreeMap::new();
    {
        let (indexed, _) = open_pair(&temp);
        for _ in 0..20 {
            let post = random_post(&mut rng);
            model.insert(indexed.create("posts", &post).unwrap(), post);
        }
        indexed.close();
    }

    let (indexed, scanning) = open_pair(&temp);
    assert_consistent(&indexed, &scanning, &model);
}

/// Repeated queries return the same ordered result.
#[test]
fn test_queries_are_deterministic() {
    let temp = create_root();
    let (db, _) = open_pair(&temp);
    for author in ["bob", "alice", "bob", "carol", "bob"] {
        db.create("posts", &json!({"author": author, "score": 1, "tags": ["go"]})).unwrap();
    }

    let first = db.find_all_ids_for_field("posts", "author", "bob").unwrap();
    for _ in 0..5 {
        assert_eq!(db.find_all_ids_for_field("posts", "author", "bob").unwrap(), first);
    }
    let raw: Vec<u64> = first.iter().map(|id| id.get()).collect();
    assert_eq!(raw, vec![1, 3, 5]);
}

// =============================================================================
// Tag Semantics
// =============================================================================

fn tag_fixture(db: &Database) {
    db.create("posts", &json!({"author": "a", "score": 1, "tags": ["a", "b"]})).unwrap();
    db.create("posts", &json!({"author": "a", "score": 1, "tags": ["a"]})).unwrap();
    db.create("posts", &json!({"author": "a", "score": 1, "tags": ["b", "c"]})).unwrap();
}

fn raw(ids: Vec<RecordId>) -> Vec<u64> {
    ids.into_iter().map(RecordId::get).collect()
}

#[test]
fn test_tag_queries_require_every_tag() {
    let temp = create_root();
    let (indexed, scanning) = open_pair(&temp);
    tag_fixture(&indexed);

    for db in [&indexed, &scanning] {
        assert_eq!(raw(db.find_all_ids_for_tags("posts", ["a"]).unwrap()), vec![1, 2]);
        assert_eq!(raw(db.find_all_ids_for_tags("posts", ["a", "b"]).unwrap()), vec![1]);
        assert_eq!(raw(db.find_all_ids_for_tags("posts", ["b"]).unwrap()), vec![1, 3]);
        assert!(db.find_all_ids_for_tags("posts", ["a", "c"]).unwrap().is_empty());
        assert!(db.find_all_ids_for_tags("posts", ["zzz"]).unwrap().is_empty());
    }
}

#[test]
fn test_duplicate_requested_tags_collapse() {
    let temp = create_root();
    let (indexed, scanning) = open_pair(&temp);
    tag_fixture(&indexed);

    for db in [&indexed, &scanning] {
        assert_eq!(raw(db.find_all_ids_for_tags("posts", ["a", "a"]).unwrap()), vec![1, 2]);
    }
}

#[test]
fn test_empty_tag_request_is_empty() {
    let temp = create_root();
    let (indexed, scanning) = open_pair(&temp);
    tag_fixture(&indexed);

    let none: [&str; 0] = [];
    assert!(indexed.find_all_ids_for_tags("posts", none).unwrap().is_empty());
    assert!(scanning.find_all_ids_for_tags("posts", none).unwrap().is_empty());
}

// =============================================================================
// Unindexed Tables
// =============================================================================

/// Scan results follow the files even when they change outside the store.
#[test]
fn test_unindexed_table_reads_current_files() {
    let temp = create_root();
    let db = Database::open(StoreConfig::new(temp.path())).unwrap();

    fs::write(temp.path().join("posts/3.json"), br#"{"author": "dave", "tags": ["x"]}"#).unwrap();
    fs::write(temp.path().join("posts/8.json"), br#"{"author": "dave"}"#).unwrap();

    assert_eq!(raw(db.find_all_ids_for_field("posts", "author", "dave").unwrap()), vec![3, 8]);
    // A record without tags simply does not match
    assert_eq!(raw(db.find_all_ids_for_tags("posts", ["x"]).unwrap()), vec![3]);
    assert!(db.find_all_ids_for_field("posts", "missing", "dave").unwrap().is_empty());
}

/// Values of different types never compare equal.
#[test]
fn test_no_cross_type_equality() {
    let temp = create_root();
    let (indexed, scanning) = open_pair(&temp);
    indexed.create("posts", &json!({"author": "1", "score": 1, "tags": []})).unwrap();
    indexed.create("posts", &json!({"author": "x", "score": "1", "tags": []})).unwrap();
    indexed.create("posts", &json!({"author": "x", "score": true, "tags": []})).unwrap();

    for db in [&indexed, &scanning] {
        assert_eq!(raw(db.find_all_ids_for_field("posts", "score", 1).unwrap()), vec![1]);
        assert_eq!(raw(db.find_all_ids_for_field("posts", "score", "1").unwrap()), vec![2]);
        assert_eq!(raw(db.find_all_ids_for_field("posts", "score", true).unwrap()), vec![3]);
        assert!(db.find_all_ids_for_field("posts", "author", 1).unwrap().is_empty());
    }
}
