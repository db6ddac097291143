//! In-memory key-value store implementation.

use super::{AnnotationRecord, BoxFuture, KeyValueStore, PersistError, PersistResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, AnnotationRecord>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'_, PersistResult<AnnotationRecord>> {
        let key = key.to_string();
        Box::pin(async move {
            let records = self
                .records
                .read()
                .map_err(|e| PersistError::Other(format!("Lock error: {}", e)))?;
            records
                .get(&key)
                .cloned()
                .ok_or(PersistError::NotFound(key))
        })
    }

    fn put(&self, key: &str, record: &AnnotationRecord) -> BoxFuture<'_, PersistResult<()>> {
        let key = key.to_string();
        let record = record.clone();
        Box::pin(async move {
            let mut records = self
                .records
                .write()
                .map_err(|e| PersistError::Other(format!("Lock error: {}", e)))?;
            records.insert(key, record);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, PersistResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut records = self
                .records
                .write()
                .map_err(|e| PersistError::Other(format!("Lock error: {}", e)))?;
            records.remove(&key);
            Ok(())
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Simple blocking executor for storage tests.
    pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(result) => return result,
                Poll::Pending => {}
            }
        }
    }

    fn record(data: &str) -> AnnotationRecord {
        AnnotationRecord {
            stroke_data: data.to_string(),
            margin_height: 0.0,
            last_modified: 1,
        }
    }

    #[test]
    fn test_put_and_get() {
        let store = MemoryStore::new();

        block_on(store.put("john:3", &record("[]"))).unwrap();
        let loaded = block_on(store.get("john:3")).unwrap();

        assert_eq!(loaded.stroke_data, "[]");
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.get("nonexistent"));

        assert!(matches!(result, Err(PersistError::NotFound(_))));
    }

    #[test]
    fn test_put_replaces() {
        let store = MemoryStore::new();

        block_on(store.put("mark:1", &record("[]"))).unwrap();
        block_on(store.put("mark:1", &record("[{}]"))).unwrap();

        let loaded = block_on(store.get("mark:1")).unwrap();
        assert_eq!(loaded.stroke_data, "[{}]");
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();

        block_on(store.put("acts:2", &record("[]"))).unwrap();
        block_on(store.delete("acts:2")).unwrap();

        assert!(matches!(
            block_on(store.get("acts:2")),
            Err(PersistError::NotFound(_))
        ));

        // Deleting an absent key is not an error.
        block_on(store.delete("acts:2")).unwrap();
    }
}
