//! In-memory storage implementing every repository trait, for running
//! without PostgreSQL and for tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use jiff::Timestamp;
use rustc_hash::FxHashMap;

use crate::{
    auth::{AuthServiceError, TokenHash, TokenRecord, TokenScope, TokensRepository},
    permissions::{Permissions, PermissionsError, PermissionsRepository},
    products::{NewProduct, Product, ProductId, ProductsError, ProductsRepository},
    users::{NewUser, User, UserId, UsersError, UsersRepository},
};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    tokens: FxHashMap<TokenHash, TokenRecord>,
    permissions: BTreeMap<UserId, BTreeSet<String>>,
    products: BTreeMap<ProductId, Product>,
    last_user_id: i64,
    last_product_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of token records currently stored.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.state().tokens.len()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, UsersError> {
        let mut state = self.state();

        if state
            .users
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(UsersError::DuplicateEmail);
        }

        state.last_user_id += 1;

        let created = User {
            id: UserId::new(state.last_user_id),
            created_at: Timestamp::now(),
            name: user.name,
            email: user.email,
            password: user.password,
            activated: user.activated,
            version: 1,
        };

        state.users.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, UsersError> {
        self.state()
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or(UsersError::NotFound)
    }

    async fn update_user(&self, user: &User) -> Result<User, UsersError> {
        let mut state = self.state();

        let email_taken = state.users.values().any(|existing| {
            existing.id != user.id && existing.email.eq_ignore_ascii_case(&user.email)
        });

        if email_taken {
            return Err(UsersError::DuplicateEmail);
        }

        let stored = state
            .users
            .get_mut(&user.id)
            .filter(|stored| stored.version == user.version)
            .ok_or(UsersError::EditConflict)?;

        *stored = User {
            version: user.version + 1,
            ..user.clone()
        };

        Ok(stored.clone())
    }
}

#[async_trait]
impl TokensRepository for MemoryStore {
    async fn insert_token(&self, token: &TokenRecord) -> Result<(), AuthServiceError> {
        let mut state = self.state();

        if state.tokens.contains_key(&token.hash) {
            return Err(AuthServiceError::Duplicate);
        }

        state.tokens.insert(token.hash, *token);

        Ok(())
    }

    async fn find_user_for_token(
        &self,
        scope: TokenScope,
        hash: &TokenHash,
        now: Timestamp,
    ) -> Result<User, AuthServiceError> {
        let state = self.state();

        state
            .tokens
            .get(hash)
            .filter(|record| record.scope == scope && record.is_live_at(now))
            .and_then(|record| state.users.get(&record.user_id))
            .cloned()
            .ok_or(AuthServiceError::NotFound)
    }

    async fn delete_tokens_for_user(
        &self,
        scope: TokenScope,
        user_id: UserId,
    ) -> Result<(), AuthServiceError> {
        self.state()
            .tokens
            .retain(|_hash, record| !(record.scope == scope && record.user_id == user_id));

        Ok(())
    }
}

#[async_trait]
impl PermissionsRepository for MemoryStore {
    async fn permissions_for_user(&self, user_id: UserId) -> Result<Permissions, PermissionsError> {
        Ok(self
            .state()
            .permissions
            .get(&user_id)
            .map(|codes| codes.iter().map(String::as_str).collect())
            .unwrap_or_default())
    }

    async fn grant_permissions(
        &self,
        user_id: UserId,
        codes: &[String],
    ) -> Result<(), PermissionsError> {
        self.state()
            .permissions
            .entry(user_id)
            .or_default()
            .extend(codes.iter().cloned());

        Ok(())
    }
}

#[async_trait]
impl ProductsRepository for MemoryStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, ProductsError> {
        if product.title.is_empty() || product.price == 0 {
            return Err(ProductsError::InvalidData);
        }

        let mut state = self.state();

        state.last_product_id += 1;

        let created = Product {
            id: ProductId::new(state.last_product_id),
            title: product.title,
            price: product.price,
            version: 1,
            created_at: Timestamp::now(),
        };

        state.products.insert(created.id, created.clone());

        Ok(created)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, ProductsError> {
        self.state()
            .products
            .get(&id)
            .cloned()
            .ok_or(ProductsError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::users::PasswordHash;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password: PasswordHash::from_phc("$argon2id$stub".to_string()),
            activated: false,
        }
    }

    #[tokio::test]
    async fn user_ids_start_at_one() -> TestResult {
        let store = MemoryStore::new();

        let first = store.insert_user(new_user("a@example.com")).await?;
        let second = store.insert_user(new_user("b@example.com")).await?;

        assert_eq!(first.id, UserId::new(1));
        assert_eq!(second.id, UserId::new(2));

        Ok(())
    }

    #[tokio::test]
    async fn emails_are_unique_ignoring_case() -> TestResult {
        let store = MemoryStore::new();

        store.insert_user(new_user("alice@example.com")).await?;

        let result = store.insert_user(new_user("ALICE@example.com")).await;

        assert!(matches!(result, Err(UsersError::DuplicateEmail)));

        Ok(())
    }

    #[tokio::test]
    async fn stale_update_is_an_edit_conflict() -> TestResult {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("alice@example.com")).await?;

        let updated = store
            .update_user(&User {
                activated: true,
                ..user.clone()
            })
            .await?;

        assert_eq!(updated.version, 2);
        assert!(updated.activated, "change was written");

        let stale = store.update_user(&user).await;

        assert!(matches!(stale, Err(UsersError::EditConflict)));

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_token_hash_is_rejected() -> TestResult {
        let store = MemoryStore::new();
        let record = TokenRecord {
            hash: TokenHash::of("abc"),
            user_id: UserId::new(1),
            expiry: Timestamp::MAX,
            scope: TokenScope::Authentication,
        };

        store.insert_token(&record).await?;

        let result = store.insert_token(&record).await;

        assert!(matches!(result, Err(AuthServiceError::Duplicate)));
        assert_eq!(store.token_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let store = MemoryStore::new();

        let result = store.get_product(ProductId::new(9)).await;

        assert!(matches!(result, Err(ProductsError::NotFound)));
    }
}
