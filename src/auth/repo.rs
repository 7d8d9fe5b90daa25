use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Persistence seam for user records.
///
/// Only the credential column is ever written by this service; account
/// creation happens elsewhere (apart from the development seed).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Replace the stored password hash. Returns `false` when no row matched.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool>;
    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use axum::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::UserStore;
    use crate::auth::repo_types::User;

    /// In-memory store used by handler and service tests.
    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<HashMap<Uuid, User>>,
        updates: AtomicUsize,
        pub fail_lookups: AtomicBool,
    }

    impl MemoryUserStore {
        pub fn insert(&self, email: &str, password_hash: &str) -> User {
            let user = User {
                id: Uuid::new_v4(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                created_at: OffsetDateTime::now_utc(),
            };
            self.users.lock().unwrap().insert(user.id, user.clone());
            user
        }

        pub fn get(&self, id: Uuid) -> Option<User> {
            self.users.lock().unwrap().get(&id).cloned()
        }

        pub fn remove(&self, id: Uuid) {
            self.users.lock().unwrap().remove(&id);
        }

        pub fn update_count(&self) -> usize {
            self.updates.load(Ordering::SeqCst)
        }

        fn check_available(&self) -> anyhow::Result<()> {
            if self.fail_lookups.load(Ordering::SeqCst) {
                anyhow::bail!("store unavailable");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
            self.check_available()?;
            Ok(self.get(id))
        }

        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            self.check_available()?;
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.email == email)
                .cloned())
        }

        async fn update_password_hash(
            &self,
            id: Uuid,
            password_hash: &str,
        ) -> anyhow::Result<bool> {
            self.check_available()?;
            self.updates.fetch_add(1, Ordering::SeqCst);
            let mut users = self.users.lock().unwrap();
            match users.get_mut(&id) {
                Some(user) => {
                    user.password_hash = password_hash.to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn create(&self, email: &str, password_hash: &str) -> anyhow::Result<User> {
            self.check_available()?;
            Ok(self.insert(email, password_hash))
        }
    }
}
