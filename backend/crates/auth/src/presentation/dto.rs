//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Register
// ============================================================================

/// Register request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

/// Register response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub public_id: String,
    /// A verification code was emailed; login completes after verify-email
    pub verification_required: bool,
}

// ============================================================================
// Sign In
// ============================================================================

/// Sign in request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// User name or email
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
    /// Second-factor code (TOTP or recovery) if already prompted
    pub two_factor_code: Option<String>,
}

/// Sign in response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub public_id: String,
    /// True if a second factor must be submitted
    pub requires_2fa: bool,
    /// True if the email must be verified first (a fresh code was sent)
    pub requires_email_verification: bool,
}

// ============================================================================
// Email verification
// ============================================================================

/// Verify email request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Resend verification code request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendOtpRequest {
    pub email: String,
}

// ============================================================================
// Password reset
// ============================================================================

/// Forgot password request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset password request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// Generic acknowledgement used by enumeration-safe endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedResponse {
    pub message: &'static str,
}

impl AcceptedResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

// ============================================================================
// Social sign in
// ============================================================================

/// Social sign in request: the verified provider assertion
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSignInRequest {
    /// Provider name (google, facebook, linkedin, twitter)
    pub provider: String,
    /// Provider-assigned subject ID
    pub subject_id: String,
    /// Email attested by the provider
    pub email: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Access token expiry (Unix timestamp seconds)
    pub expires_at: Option<i64>,
    /// Second-factor code if already prompted
    pub two_factor_code: Option<String>,
}

// ============================================================================
// Session status / device list
// ============================================================================

/// Session status response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub public_id: Option<String>,
    pub user_name: Option<String>,
}

/// One online session/device
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub device: Option<String>,
    pub ip_address: Option<String>,
    pub method: String,
    pub logged_in_at: i64,
    pub last_activity_at: i64,
    pub is_current: bool,
}

/// Device list response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListResponse {
    pub sessions: Vec<SessionEntry>,
}

// ============================================================================
// Two-factor enrollment
// ============================================================================

/// 2FA setup response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetupResponse {
    /// QR code as base64-encoded PNG
    pub qr_code: String,
    /// Secret for manual entry
    pub secret: String,
    /// otpauth:// URL
    pub otpauth_url: String,
}

/// 2FA confirm request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorConfirmRequest {
    pub code: String,
}

/// 2FA confirm response: recovery codes, shown exactly once
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorConfirmResponse {
    pub recovery_codes: Vec<String>,
}

/// 2FA disable request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorDisableRequest {
    /// Current TOTP or recovery code to confirm disable
    pub code: String,
}
