//! Integration tests for minting and path resolution.
//!
//! These tests drive a real minter against file and in-memory state stores
//! and check the identifiers it hands out end to end.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use regex::Regex;
use tempfile::TempDir;

use noid_minter::config::{RepositoryConfig, TreeifyConfig};
use noid_minter::domain::check_digit;
use noid_minter::{
    FileStateStore, MemoryObjectStore, MemoryStateStore, Minter, MinterState, NoidError, ObjectStore,
    PathResolver, Settings, StateStore, Template,
};

// ============================================================================
// Test Harness
// ============================================================================

fn memory_minter(template: &str) -> (Minter, Arc<MemoryObjectStore>) {
    let objects = Arc::new(MemoryObjectStore::new());
    let minter = Minter::new(
        Template::parse(template).expect("valid template"),
        Arc::new(MemoryStateStore::new()),
        objects.clone(),
    );
    (minter, objects)
}

fn file_minter(template: &str, dir: &TempDir, objects: Arc<MemoryObjectStore>) -> Minter {
    Minter::new(
        Template::parse(template).expect("valid template"),
        Arc::new(FileStateStore::new(dir.path().join("minter-state"))),
        objects,
    )
}

// ============================================================================
// Identifier Format
// ============================================================================

#[test]
fn test_default_template_shape() {
    let (minter, _) = memory_minter(".reeddeeddk");
    let shape = Regex::new(
        r"^[0-9bcdfghjkmnpqrstvwxz]{2}[0-9]{2}[0-9bcdfghjkmnpqrstvwxz]{2}[0-9]{2}[0-9bcdfghjkmnpqrstvwxz]$",
    )
    .unwrap();

    for id in minter.mint_many(50).unwrap() {
        assert!(shape.is_match(&id), "{id}");
        assert_eq!(id.chars().last(), Some(check_digit(&id[..8])));
        assert!(minter.validate(&id));
    }
}

#[test]
fn test_prefix_is_kept() {
    let (minter, _) = memory_minter("fk4.sdddk");
    let id = minter.mint().unwrap();
    assert!(id.starts_with("fk4000"));
    assert_eq!(id.len(), 7);
}

// ============================================================================
// Sequence Exhaustion
// ============================================================================

#[test]
fn test_two_digit_template_exhausts_on_101st_mint() {
    let (minter, _) = memory_minter(".sdd");
    let ids: HashSet<String> = minter.mint_many(100).unwrap().into_iter().collect();
    assert_eq!(ids.len(), 100);

    assert!(matches!(minter.mint(), Err(NoidError::SequenceExhausted(_))));
    assert!(matches!(minter.mint(), Err(NoidError::SequenceExhausted(_))));
}

#[test]
fn test_random_template_covers_space_without_repeats() {
    let (minter, _) = memory_minter(".rdek");
    let ids: HashSet<String> = minter.mint_many(290).unwrap().into_iter().collect();
    assert_eq!(ids.len(), 290);
    assert!(matches!(minter.mint(), Err(NoidError::SequenceExhausted(_))));
}

// ============================================================================
// Collision Freedom
// ============================================================================

#[test]
fn test_minted_ids_are_never_reserved() {
    let (minter, objects) = memory_minter(".reedk");
    let (probe, _) = memory_minter(".reedk");

    // Both walk the same permutation.
    let state = MinterState::with_seed(minter.template().clone(), 1234);
    minter.restore(&state).unwrap();
    probe.restore(&state).unwrap();

    // Reserve two thirds of the first candidates the minter would produce.
    for (i, id) in probe.mint_many(300).unwrap().into_iter().enumerate() {
        match i % 3 {
            0 => objects.insert(id),
            1 => objects.tombstone(&id),
            _ => {}
        }
    }

    for _ in 0..200 {
        let id = minter.mint().unwrap();
        assert!(!objects.exists(&id), "{id} exists");
        assert!(!objects.is_tombstoned(&id), "{id} is tombstoned");
        objects.insert(id);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_mints_are_distinct() {
    let (minter, _) = memory_minter(".reeddeeddk");
    let minter = Arc::new(minter);

    let ids: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..1000)
            .map(|_| {
                let minter = Arc::clone(&minter);
                scope.spawn(move || minter.mint().unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 1000);
    assert_eq!(minter.read_state().unwrap().sequence, 1000);
}

#[test]
fn test_concurrent_mints_with_file_state() {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());
    let minter = Arc::new(file_minter(".sddddk", &dir, objects.clone()));

    let ids: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let minter = Arc::clone(&minter);
                let objects = Arc::clone(&objects);
                scope.spawn(move || {
                    (0..50)
                        .map(|_| {
                            let id = minter.mint().unwrap();
                            objects.insert(id.clone());
                            id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 400);
    assert_eq!(objects.len(), 400);
}

#[test]
fn test_minters_on_one_state_file_never_repeat() {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());
    let first = file_minter(".sdddd", &dir, objects.clone());
    let second = file_minter(".sdddd", &dir, objects);

    let ids: Vec<String> = thread::scope(|scope| {
        let a = scope.spawn(|| first.mint_many(200).unwrap());
        let b = scope.spawn(|| second.mint_many(200).unwrap());
        let mut ids = a.join().unwrap();
        ids.extend(b.join().unwrap());
        ids
    });

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 400);
    assert_eq!(first.read_state().unwrap().sequence, 400);
}

#[test]
fn test_settings_minters_share_state_file() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::builder()
        .template(".sddd")
        .statefile(dir.path().join("state.json"))
        .build()
        .unwrap();
    let objects = Arc::new(MemoryObjectStore::new());

    let ids: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let objects = objects.clone();
                let settings = &settings;
                scope.spawn(move || Minter::from_settings(settings, objects).mint_many(50).unwrap())
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    let unique: HashSet<&String> = ids.iter().collect();
    assert_eq!(unique.len(), 200);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_resume_after_restart() {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());

    let first: Vec<String> = {
        let minter = file_minter(".sddk", &dir, objects.clone());
        minter.mint_many(5).unwrap()
    };

    let minter = file_minter(".sddk", &dir, objects);
    let next = minter.mint().unwrap();
    assert!(!first.contains(&next));
    assert_eq!(next, format!("05{}", check_digit("05")));
    assert_eq!(minter.read_state().unwrap().sequence, 6);
}

#[test]
fn test_random_order_survives_restart() {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());

    let before = file_minter(".reedd", &dir, objects.clone()).mint_many(20).unwrap();
    let after = file_minter(".reedd", &dir, objects).mint_many(20).unwrap();

    let all: HashSet<&String> = before.iter().chain(after.iter()).collect();
    assert_eq!(all.len(), 40);
}

#[test]
fn test_state_file_belongs_to_one_template() {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());

    file_minter(".sdd", &dir, objects.clone()).mint().unwrap();

    let err = file_minter(".sddd", &dir, objects).mint().unwrap_err();
    assert!(matches!(err, NoidError::TemplateMismatch { .. }));
}

#[test]
fn test_migrate_between_stores() {
    let dir = TempDir::new().unwrap();
    let objects = Arc::new(MemoryObjectStore::new());

    let (memory, _) = memory_minter(".sdd");
    memory.mint_many(7).unwrap();

    let file = file_minter(".sdd", &dir, objects);
    file.restore(&memory.read_state().unwrap()).unwrap();
    assert_eq!(file.mint().unwrap(), "07");

    let store = FileStateStore::new(dir.path().join("minter-state"));
    let template = Template::parse(".sdd").unwrap();
    assert_eq!(store.read(&template).unwrap().counters, vec![0, 8]);
}

// ============================================================================
// Path Resolution
// ============================================================================

#[test]
fn test_minted_ids_roundtrip_through_uris() {
    let (minter, _) = memory_minter(".reeddeeddk");
    let resolver = PathResolver::new(
        &RepositoryConfig {
            host: "http://localhost:8984".to_string(),
            base_path: "/rest/prod".to_string(),
        },
        TreeifyConfig {
            segment_width: 2,
            depth: 4,
        },
    )
    .unwrap();

    for id in minter.mint_many(100).unwrap() {
        let uri = resolver.uri_from_id(&id);
        assert!(uri.starts_with("http://localhost:8984/rest/prod/"));
        assert!(uri.ends_with(&format!("/{id}")));
        assert_eq!(resolver.id_from_uri(&uri).unwrap(), id);
    }
}

#[test]
fn test_prefixed_ids_roundtrip_through_uris() {
    let resolver = PathResolver::default();

    for template in ["ark-1.sddk", "a_b~c.reek", "X9.zd"] {
        let (minter, _) = memory_minter(template);
        for id in minter.mint_many(30).unwrap() {
            let uri = resolver.uri_from_id(&id);
            assert_eq!(resolver.id_from_uri(&uri).unwrap(), id, "{uri}");
        }
    }
}

#[test]
fn test_prefixes_unsafe_in_uris_are_rejected() {
    for template in ["a b.sd", "\u{e9}.sd", "q?.sd", "h#.sd", "p%.sd"] {
        assert!(
            matches!(Template::parse(template), Err(NoidError::InvalidTemplate(_))),
            "{template}"
        );
    }
}

#[test]
fn test_settings_roundtrip() {
    let settings = Settings::default();
    let (minter, _) = memory_minter(settings.template().as_str());

    for id in minter.mint_many(20).unwrap() {
        let segments = settings.treeify(&id);
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(|s| s.len() == 1));
        assert_eq!(settings.id_from_uri(&settings.uri_from_id(&id)).unwrap(), id);
    }
}

#[test]
fn test_treeify_spreads_ids() {
    let (minter, _) = memory_minter(".sdddd");
    let resolver = PathResolver::default();

    let first_levels: HashSet<String> = minter
        .mint_many(500)
        .unwrap()
        .iter()
        .map(|id| resolver.treeify(id)[0].clone())
        .collect();

    assert_eq!(first_levels.len(), 16);
}
