//! In-Memory Repository Implementation
//!
//! Substitutes the PostgreSQL repositories in tests and single-process
//! development runs. Failure injection flags let tests exercise the
//! compensation paths without a real storage outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::{
    auth_log::AuthLog, credentials::Credentials, provider_link::ProviderLink, user::User,
};
use crate::domain::repository::{
    AuthLogRepository, CredentialsRepository, ProviderLinkRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    ids::{BusinessId, UserId},
    provider::Provider,
    public_id::PublicId,
    user_name::UserName,
};
use crate::error::{AuthError, AuthResult};

/// In-memory auth repository
#[derive(Default)]
pub struct MemoryAuthRepository {
    users: RwLock<HashMap<Uuid, User>>,
    credentials: RwLock<HashMap<Uuid, Credentials>>,
    auth_logs: RwLock<HashMap<Uuid, AuthLog>>,
    provider_links: RwLock<Vec<ProviderLink>>,
    /// When set, the next auth-log insert fails once.
    fail_next_log_insert: AtomicBool,
    /// When set, the next user update fails once.
    fail_next_user_update: AtomicBool,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next auth-log insert fail (compensation-path testing).
    pub fn fail_next_log_insert(&self) {
        self.fail_next_log_insert.store(true, Ordering::SeqCst);
    }

    /// Make the next user update fail (compensation-path testing).
    pub fn fail_next_user_update(&self) {
        self.fail_next_user_update.store(true, Ordering::SeqCst);
    }

    fn injected_failure(flag: &AtomicBool) -> AuthResult<()> {
        if flag.swap(false, Ordering::SeqCst) {
            Err(AuthError::Internal("Injected storage failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl UserRepository for MemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        self.users
            .write()
            .await
            .insert(*user.user_id.as_uuid(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(user_id.as_uuid()).cloned())
    }

    async fn find_by_public_id(
        &self,
        business_id: &BusinessId,
        public_id: &PublicId,
    ) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.business_id == *business_id && u.public_id == *public_id)
            .cloned())
    }

    async fn find_by_user_name(
        &self,
        business_id: &BusinessId,
        user_name: &UserName,
    ) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| {
                u.business_id == *business_id
                    && u.user_name.canonical() == user_name.canonical()
            })
            .cloned())
    }

    async fn find_by_email(
        &self,
        business_id: &BusinessId,
        email: &Email,
    ) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.business_id == *business_id && u.email == *email)
            .cloned())
    }

    async fn exists_by_user_name(
        &self,
        business_id: &BusinessId,
        user_name: &UserName,
    ) -> AuthResult<bool> {
        Ok(self.find_by_user_name(business_id, user_name).await?.is_some())
    }

    async fn is_email_taken(
        &self,
        business_id: &BusinessId,
        email: &Email,
        exclude: Option<&UserId>,
    ) -> AuthResult<bool> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .any(|u| {
                u.business_id == *business_id
                    && u.email == *email
                    && Some(&u.user_id) != exclude
            }))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        Self::injected_failure(&self.fail_next_user_update)?;

        let mut users = self.users.write().await;
        match users.get_mut(user.user_id.as_uuid()) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        self.users.write().await.remove(user_id.as_uuid());
        Ok(())
    }
}

impl CredentialsRepository for MemoryAuthRepository {
    async fn create(&self, credentials: &Credentials) -> AuthResult<()> {
        self.credentials
            .write()
            .await
            .insert(*credentials.user_id.as_uuid(), credentials.clone());
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        Ok(self
            .credentials
            .read()
            .await
            .get(user_id.as_uuid())
            .cloned())
    }

    async fn update(&self, credentials: &Credentials) -> AuthResult<()> {
        let mut map = self.credentials.write().await;
        match map.get_mut(credentials.user_id.as_uuid()) {
            Some(existing) => {
                *existing = credentials.clone();
                Ok(())
            }
            None => Err(AuthError::Internal("Credentials not found".to_string())),
        }
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        self.credentials.write().await.remove(user_id.as_uuid());
        Ok(())
    }

    async fn mark_recovery_code_used(&self, user_id: &UserId, code: &str) -> AuthResult<bool> {
        let mut map = self.credentials.write().await;
        match map.get_mut(user_id.as_uuid()) {
            Some(credentials) => Ok(credentials.recovery_codes.consume(code)),
            None => Ok(false),
        }
    }
}

impl AuthLogRepository for MemoryAuthRepository {
    async fn create(&self, log: &AuthLog) -> AuthResult<()> {
        Self::injected_failure(&self.fail_next_log_insert)?;
        self.auth_logs.write().await.insert(log.id, log.clone());
        Ok(())
    }

    async fn count_online(&self, user_id: &UserId) -> AuthResult<i64> {
        Ok(self
            .auth_logs
            .read()
            .await
            .values()
            .filter(|l| l.user_id == *user_id && l.online)
            .count() as i64)
    }

    async fn find_online_by_user(&self, user_id: &UserId) -> AuthResult<Vec<AuthLog>> {
        let mut logs: Vec<AuthLog> = self
            .auth_logs
            .read()
            .await
            .values()
            .filter(|l| l.user_id == *user_id && l.online)
            .cloned()
            .collect();
        logs.sort_by_key(|l| std::cmp::Reverse(l.last_activity_at));
        Ok(logs)
    }

    async fn find_by_token(&self, session_token: &str) -> AuthResult<Option<AuthLog>> {
        Ok(self
            .auth_logs
            .read()
            .await
            .values()
            .find(|l| l.session_token == session_token)
            .cloned())
    }

    async fn update(&self, log: &AuthLog) -> AuthResult<()> {
        let mut logs = self.auth_logs.write().await;
        match logs.get_mut(&log.id) {
            Some(existing) => {
                *existing = log.clone();
                Ok(())
            }
            None => Err(AuthError::Internal("Auth log not found".to_string())),
        }
    }

    async fn close_by_token(&self, user_id: &UserId, session_token: &str) -> AuthResult<u64> {
        let mut closed = 0;
        for log in self.auth_logs.write().await.values_mut() {
            if log.user_id == *user_id && log.session_token == session_token && log.online {
                log.close();
                closed += 1;
            }
        }
        Ok(closed)
    }

    async fn close_all_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut closed = 0;
        for log in self.auth_logs.write().await.values_mut() {
            if log.user_id == *user_id && log.online {
                log.close();
                closed += 1;
            }
        }
        Ok(closed)
    }
}

impl ProviderLinkRepository for MemoryAuthRepository {
    async fn find_by_subject(
        &self,
        provider: Provider,
        subject_id: &str,
    ) -> AuthResult<Option<ProviderLink>> {
        Ok(self
            .provider_links
            .read()
            .await
            .iter()
            .find(|l| l.provider == provider && l.subject_id == subject_id)
            .cloned())
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        provider: Provider,
    ) -> AuthResult<Option<ProviderLink>> {
        Ok(self
            .provider_links
            .read()
            .await
            .iter()
            .find(|l| l.user_id == *user_id && l.provider == provider)
            .cloned())
    }

    async fn create(&self, link: &ProviderLink) -> AuthResult<()> {
        self.provider_links.write().await.push(link.clone());
        Ok(())
    }

    async fn update(&self, link: &ProviderLink) -> AuthResult<()> {
        let mut links = self.provider_links.write().await;
        match links
            .iter_mut()
            .find(|l| l.user_id == link.user_id && l.provider == link.provider)
        {
            Some(existing) => {
                *existing = link.clone();
                Ok(())
            }
            None => Err(AuthError::Internal("Provider link not found".to_string())),
        }
    }
}
