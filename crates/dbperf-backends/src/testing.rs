//! Contract checks shared by the backend unit tests.

use std::path::Path;

use dbperf_core::{Entity, Executable, IdAllocation};

pub(crate) fn sample(count: usize) -> Vec<Entity> {
    (0..count).map(Entity::numbered).collect()
}

/// Drive one backend through every contract operation.
pub(crate) fn check_contract<E: Executable>(mut backend: E, dir: &Path)
where
    E::Error: std::fmt::Debug,
{
    backend.init().unwrap();
    assert!(dir.is_dir());

    // bulk insert assigns dense ids
    let mut items = sample(150);
    backend.put_bulk(&mut items).unwrap();
    assert!(items.iter().all(Entity::has_id));
    if backend.id_allocation() == IdAllocation::Dense {
        for pair in items.windows(2) {
            assert_eq!(pair[1].id, pair[0].id + 1);
        }
    }

    let mut stored = backend.read_all().unwrap();
    assert_eq!(stored.len(), 150);
    assert_eq!(stored[0], items[0]);

    // update in place
    for item in stored.iter_mut() {
        item.int64 *= 2;
    }
    backend.put_bulk(&mut stored).unwrap();
    let updated = backend.read_all().unwrap();
    assert_eq!(updated.len(), 150);
    assert_eq!(updated[10].int64, 20);

    let (min, max) = (items[50].id, items[149].id);
    assert_eq!(backend.query_id_between(min, max).unwrap().len(), 100);

    // "Entity no. 1", 10..=19, 100..=149
    let matches = backend.query_string_prefix("Entity no. 1").unwrap();
    assert_eq!(matches.len(), 61);
    assert!(matches.iter().all(|e| e.text.starts_with("Entity no. 1")));
    assert!(backend.query_string_prefix("entity").unwrap().is_empty());

    assert!(backend.size().unwrap() > 0);

    backend.remove_all().unwrap();
    assert!(backend.read_all().unwrap().is_empty());

    // fresh ids after clearing
    let old_ids: Vec<u64> = items.iter().map(|e| e.id).collect();
    for item in items.iter_mut() {
        item.id = 0;
    }
    backend.put_bulk(&mut items).unwrap();
    assert!(items.iter().all(|e| !old_ids.contains(&e.id)));
    backend.remove_bulk(&items[..100]).unwrap();
    assert_eq!(backend.read_all().unwrap().len(), 50);
    backend.remove_bulk(&items[100..]).unwrap();
    assert!(backend.read_all().unwrap().is_empty());

    // async puts become visible after await
    let mut queued = sample(20);
    for item in queued.iter_mut() {
        backend.put_async(item).unwrap();
    }
    backend.await_async_completion().unwrap();
    assert!(queued.iter().all(Entity::has_id));
    assert_eq!(backend.read_all().unwrap().len(), 20);

    backend.close().unwrap();
    assert!(!dir.exists());
}
