//! Per-recipe serialization
//!
//! Every read-modify-write of a recipe runs while holding that recipe's
//! guard, so concurrent feedback, recompute and review calls on the same
//! recipe cannot lose each other's updates. Different recipes never block
//! one another.
//!
//! An entry lives only while some caller holds or waits for it; the last
//! guard to drop removes it, so ids that never resolve leave nothing behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = HashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Default)]
pub struct RecipeLocks {
    locks: Arc<StdMutex<LockTable>>,
}

/// Exclusive access to one recipe, released on drop
#[derive(Debug)]
pub struct RecipeGuard {
    recipe_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    table: Arc<StdMutex<LockTable>>,
}

/// The table is only touched in short synchronous sections
fn lock_table(table: &StdMutex<LockTable>) -> MutexGuard<'_, LockTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecipeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `recipe_id`
    pub async fn acquire(&self, recipe_id: &str) -> RecipeGuard {
        let lock = {
            let mut locks = lock_table(&self.locks);
            locks
                .entry(recipe_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        RecipeGuard {
            recipe_id: recipe_id.to_string(),
            guard: Some(lock.lock_owned().await),
            table: Arc::clone(&self.locks),
        }
    }

    /// Recipes currently held or waited on
    pub fn tracked(&self) -> usize {
        lock_table(&self.locks).len()
    }
}

impl Drop for RecipeGuard {
    fn drop(&mut self) {
        // Release first so the table holds the only remaining reference
        // unless another caller is waiting
        self.guard.take();
        let mut locks = lock_table(&self.table);
        let idle = locks
            .get(&self.recipe_id)
            .map(|lock| Arc::strong_count(lock) == 1)
            .unwrap_or(false);
        if idle {
            locks.remove(&self.recipe_id);
        }
    }
}
