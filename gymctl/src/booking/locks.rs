//! Per-class serialization.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::types::ClassId;

/// One mutex per gym class.
///
/// Booking operations hold the class lock across their whole unit of work so
/// seat decisions for a class never interleave. Entries are created on first
/// use and live for the process lifetime; the set of classes is small.
#[derive(Clone, Default)]
pub struct ClassLocks {
    locks: Arc<DashMap<ClassId, Arc<Mutex<()>>>>,
}

impl ClassLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `class_id`, created on first use.
    pub fn lock_for(&self, class_id: ClassId) -> Arc<Mutex<()>> {
        self.locks
            .entry(class_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_class_same_lock() {
        let locks = ClassLocks::new();

        let a = locks.lock_for(1);
        let b = locks.lock_for(1);
        let other = locks.lock_for(2);

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn test_clones_share_the_map() {
        let locks = ClassLocks::new();
        let cloned = locks.clone();

        let a = locks.lock_for(7);
        let b = cloned.lock_for(7);

        assert!(Arc::ptr_eq(&a, &b));
    }
}
