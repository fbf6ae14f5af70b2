//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod credential_gate;
pub mod otp;
pub mod password_reset;
pub mod register;
pub mod session;
pub mod sign_in;
pub mod sign_out;
pub mod social;
pub mod two_factor;
pub mod verify_email;

// Re-exports
pub use check_session::{ActiveSession, CheckSessionUseCase};
pub use config::AuthConfig;
pub use credential_gate::{AuthenticatedUser, CredentialGate};
pub use otp::{OtpPurpose, OtpService};
pub use password_reset::PasswordResetUseCase;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use session::{CompletedSession, SessionManager};
pub use sign_in::{SignInInput, SignInOutcome, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use social::{ProviderAssertion, SocialIdentityLinker, SocialSignInUseCase};
pub use two_factor::{TwoFactorService, TwoFactorSetupOutput};
pub use verify_email::{VerifyEmailOutput, VerifyEmailUseCase};
