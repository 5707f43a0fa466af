//! In-memory collaborators
//!
//! Used by `--in-memory` runs and the test suites. State is lost on drop.

use std::collections::HashMap;

use async_trait::async_trait;
use goldrec_common::Result;
use tokio::sync::RwLock;

use super::{FeedbackStore, RecipeRepository, UserDirectory};
use crate::models::{QualityFeedbackRecord, Recipe, User};

/// Recipes in registration order
#[derive(Debug, Default)]
pub struct InMemoryRecipeRepository {
    recipes: RwLock<Vec<Recipe>>,
}

impl InMemoryRecipeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn get_by_id(&self, id: &str) -> Result<Option<Recipe>> {
        let recipes = self.recipes.read().await;
        Ok(recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn save(&self, recipe: &Recipe) -> Result<()> {
        let mut recipes = self.recipes.write().await;
        match recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(existing) => *existing = recipe.clone(),
            None => recipes.push(recipe.clone()),
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Recipe>> {
        Ok(self.recipes.read().await.clone())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    records: RwLock<Vec<QualityFeedbackRecord>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn append(&self, record: &QualityFeedbackRecord) -> Result<()> {
        record.validate()?;
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn query_by_recipe(&self, recipe_id: &str) -> Result<Vec<QualityFeedbackRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.recipe_id == recipe_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        self.users
            .write()
            .await
            .insert(user.id.clone(), user.clone());
        Ok(())
    }
}
