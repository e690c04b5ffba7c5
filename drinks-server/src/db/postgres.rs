//! PostgreSQL drink store

use async_trait::async_trait;
use shared::{Drink, NewDrink};
use sqlx::PgPool;

use super::{DrinkStore, RepoError, RepoResult};

#[derive(Clone)]
pub struct PgDrinkStore {
    pool: PgPool,
}

impl PgDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Drop every drink, restart ids at 1 and insert `seed`
    pub async fn reset(&self, seed: &[NewDrink]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("TRUNCATE drinks RESTART IDENTITY")
            .execute(&mut *tx)
            .await?;
        for drink in seed {
            sqlx::query("INSERT INTO drinks (title, recipe) VALUES ($1, $2)")
                .bind(&drink.title)
                .bind(&drink.recipe)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    async fn list_all(&self) -> RepoResult<Vec<Drink>> {
        let drinks: Vec<Drink> = sqlx::query_as("SELECT id, title, recipe FROM drinks ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(drinks)
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<Drink>> {
        let drink: Option<Drink> = sqlx::query_as("SELECT id, title, recipe FROM drinks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(drink)
    }

    async fn insert(&self, drink: NewDrink) -> RepoResult<Drink> {
        let created: Drink = sqlx::query_as(
            "INSERT INTO drinks (title, recipe) VALUES ($1, $2) RETURNING id, title, recipe",
        )
        .bind(drink.title)
        .bind(drink.recipe)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, drink: &Drink) -> RepoResult<()> {
        let rows = sqlx::query("UPDATE drinks SET title = $1, recipe = $2 WHERE id = $3")
            .bind(&drink.title)
            .bind(&drink.recipe)
            .bind(drink.id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(RepoError::NotFound(format!("drink {}", drink.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let rows = sqlx::query("DELETE FROM drinks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if rows == 0 {
            return Err(RepoError::NotFound(format!("drink {id}")));
        }
        Ok(())
    }
}
