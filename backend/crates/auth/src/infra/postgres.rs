//! PostgreSQL Repository Implementations
//!
//! Every query is tenant-scoped where a tenant-level lookup is involved;
//! primary-key lookups go through the UUID directly.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    auth_log::{AuthLog, LoginMethod},
    credentials::Credentials,
    provider_link::ProviderLink,
    user::User,
};
use crate::domain::repository::{
    AuthLogRepository, CredentialsRepository, ProviderLinkRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    ids::{BusinessId, UserId},
    provider::Provider,
    public_id::PublicId,
    recovery_codes::RecoveryCodes,
    totp_secret::TotpSecret,
    user_name::UserName,
    user_password::UserPassword,
    user_status::UserStatus,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Startup sweep: flip online rows whose activity is older than the
    /// cutoff offline, so restarts do not leave ghost sessions holding
    /// concurrency slots.
    pub async fn close_stale_sessions(&self, older_than_minutes: i64) -> AuthResult<u64> {
        let cutoff = Utc::now() - chrono::Duration::minutes(older_than_minutes);

        let closed = sqlx::query(
            r#"
            UPDATE auth_logs SET
                online = FALSE,
                logged_out_at = NOW()
            WHERE online = TRUE AND last_activity_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        tracing::info!(sessions_closed = closed, "Closed stale auth sessions");
        Ok(closed)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

const USER_COLUMNS: &str = r#"
    user_id,
    public_id,
    business_id,
    user_name,
    email,
    status,
    email_verified_at,
    settings,
    session_token,
    remember_token,
    device_token,
    last_login_at,
    created_at,
    updated_at
"#;

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                public_id,
                business_id,
                user_name,
                user_name_canonical,
                email,
                status,
                email_verified_at,
                settings,
                session_token,
                remember_token,
                device_token,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.public_id.as_str())
        .bind(user.business_id.as_uuid())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.email.as_str())
        .bind(user.status.id())
        .bind(user.email_verified_at)
        .bind(&user.settings)
        .bind(&user.session_token)
        .bind(&user.remember_token)
        .bind(&user.device_token)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_public_id(
        &self,
        business_id: &BusinessId,
        public_id: &PublicId,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE business_id = $1 AND public_id = $2"
        ))
        .bind(business_id.as_uuid())
        .bind(public_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_user_name(
        &self,
        business_id: &BusinessId,
        user_name: &UserName,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE business_id = $1 AND user_name_canonical = $2"
        ))
        .bind(business_id.as_uuid())
        .bind(user_name.canonical())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(
        &self,
        business_id: &BusinessId,
        email: &Email,
    ) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE business_id = $1 AND email = $2"
        ))
        .bind(business_id.as_uuid())
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_user_name(
        &self,
        business_id: &BusinessId,
        user_name: &UserName,
    ) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE business_id = $1 AND user_name_canonical = $2)",
        )
        .bind(business_id.as_uuid())
        .bind(user_name.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn is_email_taken(
        &self,
        business_id: &BusinessId,
        email: &Email,
        exclude: Option<&UserId>,
    ) -> AuthResult<bool> {
        let taken = match exclude {
            Some(user_id) => {
                sqlx::query_scalar::<_, bool>(
                    r#"
                    SELECT EXISTS(
                        SELECT 1 FROM users
                        WHERE business_id = $1 AND email = $2 AND user_id != $3
                    )
                    "#,
                )
                .bind(business_id.as_uuid())
                .bind(email.as_str())
                .bind(user_id.as_uuid())
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM users WHERE business_id = $1 AND email = $2)",
                )
                .bind(business_id.as_uuid())
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(taken)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                user_name = $2,
                user_name_canonical = $3,
                email = $4,
                status = $5,
                email_verified_at = $6,
                settings = $7,
                session_token = $8,
                remember_token = $9,
                device_token = $10,
                last_login_at = $11,
                updated_at = $12
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.user_name.original())
        .bind(user.user_name.canonical())
        .bind(user.email.as_str())
        .bind(user.status.id())
        .bind(user.email_verified_at)
        .bind(&user.settings)
        .bind(&user.session_token)
        .bind(&user.remember_token)
        .bind(&user.device_token)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Credentials Repository Implementation
// ============================================================================

impl CredentialsRepository for PgAuthRepository {
    async fn create(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_credentials (
                user_id,
                password_hash,
                password_changed_at,
                failed_login_count,
                locked_at,
                otp_hash,
                otp_expires_at,
                totp_secret,
                totp_enabled,
                recovery_codes,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.password_changed_at)
        .bind(credentials.failed_login_count as i16)
        .bind(credentials.locked_at)
        .bind(&credentials.otp_hash)
        .bind(credentials.otp_expires_at)
        .bind(credentials.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(credentials.totp_enabled)
        .bind(credentials.recovery_codes.to_value())
        .bind(credentials.created_at)
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &UserId) -> AuthResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT
                user_id,
                password_hash,
                password_changed_at,
                failed_login_count,
                locked_at,
                otp_hash,
                otp_expires_at,
                totp_secret,
                totp_enabled,
                recovery_codes,
                created_at,
                updated_at
            FROM auth_credentials
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_credentials()).transpose()
    }

    async fn update(&self, credentials: &Credentials) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_credentials SET
                password_hash = $2,
                password_changed_at = $3,
                failed_login_count = $4,
                locked_at = $5,
                otp_hash = $6,
                otp_expires_at = $7,
                totp_secret = $8,
                totp_enabled = $9,
                recovery_codes = $10,
                updated_at = $11
            WHERE user_id = $1
            "#,
        )
        .bind(credentials.user_id.as_uuid())
        .bind(credentials.password_hash.as_phc_string())
        .bind(credentials.password_changed_at)
        .bind(credentials.failed_login_count as i16)
        .bind(credentials.locked_at)
        .bind(&credentials.otp_hash)
        .bind(credentials.otp_expires_at)
        .bind(credentials.totp_secret.as_ref().map(|s| s.as_base32()))
        .bind(credentials.totp_enabled)
        .bind(credentials.recovery_codes.to_value())
        .bind(credentials.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_credentials WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_recovery_code_used(&self, user_id: &UserId, code: &str) -> AuthResult<bool> {
        // Conditional write: only an existing unused entry flips, so a
        // concurrent duplicate submission loses.
        let affected = sqlx::query(
            r#"
            UPDATE auth_credentials SET
                recovery_codes = jsonb_set(recovery_codes, ARRAY[$2], 'true'::jsonb),
                updated_at = NOW()
            WHERE user_id = $1 AND recovery_codes->>$2 = 'false'
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(code)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }
}

// ============================================================================
// Auth Log Repository Implementation
// ============================================================================

const AUTH_LOG_COLUMNS: &str = r#"
    id,
    user_id,
    business_id,
    session_token,
    device,
    ip_address,
    method,
    online,
    logged_in_at,
    logged_out_at,
    last_activity_at
"#;

impl AuthLogRepository for PgAuthRepository {
    async fn create(&self, log: &AuthLog) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_logs (
                id,
                user_id,
                business_id,
                session_token,
                device,
                ip_address,
                method,
                online,
                logged_in_at,
                logged_out_at,
                last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(log.id)
        .bind(log.user_id.as_uuid())
        .bind(log.business_id.as_uuid())
        .bind(&log.session_token)
        .bind(&log.device)
        .bind(&log.ip_address)
        .bind(log.method.as_str())
        .bind(log.online)
        .bind(log.logged_in_at)
        .bind(log.logged_out_at)
        .bind(log.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_online(&self, user_id: &UserId) -> AuthResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM auth_logs WHERE user_id = $1 AND online = TRUE",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn find_online_by_user(&self, user_id: &UserId) -> AuthResult<Vec<AuthLog>> {
        let rows = sqlx::query_as::<_, AuthLogRow>(&format!(
            r#"
            SELECT {AUTH_LOG_COLUMNS} FROM auth_logs
            WHERE user_id = $1 AND online = TRUE
            ORDER BY last_activity_at DESC
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_log()).collect())
    }

    async fn find_by_token(&self, session_token: &str) -> AuthResult<Option<AuthLog>> {
        let row = sqlx::query_as::<_, AuthLogRow>(&format!(
            "SELECT {AUTH_LOG_COLUMNS} FROM auth_logs WHERE session_token = $1"
        ))
        .bind(session_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_log()))
    }

    async fn update(&self, log: &AuthLog) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE auth_logs SET
                online = $2,
                logged_out_at = $3,
                last_activity_at = $4
            WHERE id = $1
            "#,
        )
        .bind(log.id)
        .bind(log.online)
        .bind(log.logged_out_at)
        .bind(log.last_activity_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn close_by_token(&self, user_id: &UserId, session_token: &str) -> AuthResult<u64> {
        let closed = sqlx::query(
            r#"
            UPDATE auth_logs SET
                online = FALSE,
                logged_out_at = NOW()
            WHERE user_id = $1 AND session_token = $2 AND online = TRUE
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(session_token)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(closed)
    }

    async fn close_all_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let closed = sqlx::query(
            r#"
            UPDATE auth_logs SET
                online = FALSE,
                logged_out_at = NOW()
            WHERE user_id = $1 AND online = TRUE
            "#,
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(closed)
    }
}

// ============================================================================
// Provider Link Repository Implementation
// ============================================================================

const PROVIDER_LINK_COLUMNS: &str = r#"
    user_id,
    provider,
    subject_id,
    access_token,
    refresh_token,
    expires_at,
    created_at,
    updated_at
"#;

impl ProviderLinkRepository for PgAuthRepository {
    async fn find_by_subject(
        &self,
        provider: Provider,
        subject_id: &str,
    ) -> AuthResult<Option<ProviderLink>> {
        let row = sqlx::query_as::<_, ProviderLinkRow>(&format!(
            "SELECT {PROVIDER_LINK_COLUMNS} FROM provider_links WHERE provider = $1 AND subject_id = $2"
        ))
        .bind(provider.as_str())
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_link()).transpose()
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        provider: Provider,
    ) -> AuthResult<Option<ProviderLink>> {
        let row = sqlx::query_as::<_, ProviderLinkRow>(&format!(
            "SELECT {PROVIDER_LINK_COLUMNS} FROM provider_links WHERE user_id = $1 AND provider = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_link()).transpose()
    }

    async fn create(&self, link: &ProviderLink) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO provider_links (
                user_id,
                provider,
                subject_id,
                access_token,
                refresh_token,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(link.user_id.as_uuid())
        .bind(link.provider.as_str())
        .bind(&link.subject_id)
        .bind(&link.access_token)
        .bind(&link.refresh_token)
        .bind(link.expires_at)
        .bind(link.created_at)
        .bind(link.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, link: &ProviderLink) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE provider_links SET
                subject_id = $3,
                access_token = $4,
                refresh_token = $5,
                expires_at = $6,
                updated_at = $7
            WHERE user_id = $1 AND provider = $2
            "#,
        )
        .bind(link.user_id.as_uuid())
        .bind(link.provider.as_str())
        .bind(&link.subject_id)
        .bind(&link.access_token)
        .bind(&link.refresh_token)
        .bind(link.expires_at)
        .bind(link.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    public_id: String,
    business_id: Uuid,
    user_name: String,
    email: String,
    status: i16,
    email_verified_at: Option<DateTime<Utc>>,
    settings: Option<Value>,
    session_token: Option<String>,
    remember_token: Option<String>,
    device_token: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let public_id = PublicId::parse_str(&self.public_id)
            .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            public_id,
            business_id: BusinessId::from_uuid(self.business_id),
            user_name: UserName::from_db(self.user_name),
            email: Email::from_db(self.email),
            status: UserStatus::from_id(self.status),
            email_verified_at: self.email_verified_at,
            settings: self.settings,
            session_token: self.session_token,
            remember_token: self.remember_token,
            device_token: self.device_token,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    user_id: Uuid,
    password_hash: String,
    password_changed_at: DateTime<Utc>,
    failed_login_count: i16,
    locked_at: Option<DateTime<Utc>>,
    otp_hash: Option<String>,
    otp_expires_at: Option<DateTime<Utc>>,
    totp_secret: Option<String>,
    totp_enabled: bool,
    recovery_codes: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialsRow {
    fn into_credentials(self) -> AuthResult<Credentials> {
        let password_hash = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        let totp_secret = self
            .totp_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| AuthError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        let recovery_codes = RecoveryCodes::from_value(&self.recovery_codes)
            .map_err(|e| AuthError::Internal(format!("Invalid recovery codes: {}", e)))?;

        Ok(Credentials {
            user_id: UserId::from_uuid(self.user_id),
            password_hash,
            password_changed_at: self.password_changed_at,
            failed_login_count: self.failed_login_count as u16,
            locked_at: self.locked_at,
            otp_hash: self.otp_hash,
            otp_expires_at: self.otp_expires_at,
            totp_secret,
            totp_enabled: self.totp_enabled,
            recovery_codes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AuthLogRow {
    id: Uuid,
    user_id: Uuid,
    business_id: Uuid,
    session_token: String,
    device: Option<String>,
    ip_address: Option<String>,
    method: String,
    online: bool,
    logged_in_at: DateTime<Utc>,
    logged_out_at: Option<DateTime<Utc>>,
    last_activity_at: DateTime<Utc>,
}

impl AuthLogRow {
    fn into_log(self) -> AuthLog {
        AuthLog {
            id: self.id,
            user_id: UserId::from_uuid(self.user_id),
            business_id: BusinessId::from_uuid(self.business_id),
            session_token: self.session_token,
            device: self.device,
            ip_address: self.ip_address,
            method: LoginMethod::from_db(&self.method),
            online: self.online,
            logged_in_at: self.logged_in_at,
            logged_out_at: self.logged_out_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProviderLinkRow {
    user_id: Uuid,
    provider: String,
    subject_id: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProviderLinkRow {
    fn into_link(self) -> AuthResult<ProviderLink> {
        let provider = Provider::parse(&self.provider)
            .map_err(|e| AuthError::Internal(format!("Invalid provider: {}", e)))?;

        Ok(ProviderLink {
            user_id: UserId::from_uuid(self.user_id),
            provider,
            subject_id: self.subject_id,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
