//! In-memory drink store

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::{Drink, NewDrink};

use super::{DrinkStore, RepoError, RepoResult};

#[derive(Default)]
struct Inner {
    drinks: BTreeMap<i64, Drink>,
    next_id: i64,
}

impl Inner {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }

    fn push(&mut self, drink: NewDrink) -> Drink {
        self.next_id += 1;
        let drink = Drink {
            id: self.next_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        self.drinks.insert(drink.id, drink.clone());
        drink
    }
}

/// Drink store backed by a process-local map
///
/// Enforces the same unique-title rule as the `drinks` table.
#[derive(Default)]
pub struct MemoryDrinkStore {
    inner: RwLock<Inner>,
}

impl MemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every drink, restart ids at 1 and insert `seed`
    pub fn reset(&self, seed: &[NewDrink]) -> RepoResult<()> {
        let mut inner = self.inner.write();
        *inner = Inner::default();
        for drink in seed {
            if inner.title_taken(&drink.title, None) {
                return Err(RepoError::Constraint(format!(
                    "duplicate title '{}'",
                    drink.title
                )));
            }
            inner.push(drink.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl DrinkStore for MemoryDrinkStore {
    async fn list_all(&self) -> RepoResult<Vec<Drink>> {
        Ok(self.inner.read().drinks.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Drink>> {
        Ok(self.inner.read().drinks.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> RepoResult<Drink> {
        let mut inner = self.inner.write();
        if inner.title_taken(&drink.title, None) {
            return Err(RepoError::Constraint(format!(
                "duplicate title '{}'",
                drink.title
            )));
        }
        Ok(inner.push(drink))
    }

    async fn update(&self, drink: &Drink) -> RepoResult<()> {
        let mut inner = self.inner.write();
        if !inner.drinks.contains_key(&drink.id) {
            return Err(RepoError::NotFound(format!("drink {}", drink.id)));
        }
        if inner.title_taken(&drink.title, Some(drink.id)) {
            return Err(RepoError::Constraint(format!(
                "duplicate title '{}'",
                drink.title
            )));
        }
        inner.drinks.insert(drink.id, drink.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        match self.inner.write().drinks.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound(format!("drink {id}"))),
        }
    }
}
