//! Email/password identity.
//!
//! [`IdentityProvider`] is the contract the rest of mimicoach signs in
//! through. [`local::LocalIdentityProvider`] keeps accounts on this machine;
//! its failures use the same [`AuthErrorCode`]s a hosted identity service
//! reports, so messages stay the same whichever provider is behind it.

pub mod local;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::Receiver;
use thiserror::Error;

use crate::settings::Language;

pub use local::LocalIdentityProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    EmailAlreadyInUse,
    WeakPassword,
    InvalidEmail,
    TooManyRequests,
    NetworkRequestFailed,
    Unknown,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::UserNotFound => "auth/user-not-found",
            AuthErrorCode::WrongPassword => "auth/wrong-password",
            AuthErrorCode::EmailAlreadyInUse => "auth/email-already-in-use",
            AuthErrorCode::WeakPassword => "auth/weak-password",
            AuthErrorCode::InvalidEmail => "auth/invalid-email",
            AuthErrorCode::TooManyRequests => "auth/too-many-requests",
            AuthErrorCode::NetworkRequestFailed => "auth/network-request-failed",
            AuthErrorCode::Unknown => "auth/unknown",
        }
    }

    /// Map a provider error code string. Unrecognized codes are `Unknown`.
    pub fn from_code(code: &str) -> Self {
        match code.strip_prefix("auth/").unwrap_or(code) {
            "user-not-found" => AuthErrorCode::UserNotFound,
            "wrong-password" => AuthErrorCode::WrongPassword,
            "email-already-in-use" => AuthErrorCode::EmailAlreadyInUse,
            "weak-password" => AuthErrorCode::WeakPassword,
            "invalid-email" => AuthErrorCode::InvalidEmail,
            "too-many-requests" => AuthErrorCode::TooManyRequests,
            "network-request-failed" => AuthErrorCode::NetworkRequestFailed,
            _ => AuthErrorCode::Unknown,
        }
    }

    pub fn message(&self, language: Language) -> &'static str {
        match (self, language) {
            (AuthErrorCode::UserNotFound, Language::Ja) => {
                "このメールアドレスは登録されていません。"
            }
            (AuthErrorCode::UserNotFound, Language::En) => {
                "No account is registered with this email address."
            }
            (AuthErrorCode::WrongPassword, Language::Ja) => "パスワードが間違っています。",
            (AuthErrorCode::WrongPassword, Language::En) => "The password is incorrect.",
            (AuthErrorCode::EmailAlreadyInUse, Language::Ja) => {
                "このメールアドレスは既に使用されています。"
            }
            (AuthErrorCode::EmailAlreadyInUse, Language::En) => {
                "This email address is already in use."
            }
            (AuthErrorCode::WeakPassword, Language::Ja) => {
                "パスワードは6文字以上で入力してください。"
            }
            (AuthErrorCode::WeakPassword, Language::En) => {
                "Passwords must be at least 6 characters long."
            }
            (AuthErrorCode::InvalidEmail, Language::Ja) => {
                "メールアドレスの形式が正しくありません。"
            }
            (AuthErrorCode::InvalidEmail, Language::En) => "The email address is not valid.",
            (AuthErrorCode::TooManyRequests, Language::Ja) => {
                "試行回数が多すぎます。しばらく時間をおいてから再度お試しください。"
            }
            (AuthErrorCode::TooManyRequests, Language::En) => {
                "Too many attempts. Please wait a while and try again."
            }
            (AuthErrorCode::NetworkRequestFailed, Language::Ja) => {
                "ネットワークエラーが発生しました。接続を確認してください。"
            }
            (AuthErrorCode::NetworkRequestFailed, Language::En) => {
                "A network error occurred. Please check your connection."
            }
            (AuthErrorCode::Unknown, Language::Ja) => {
                "認証エラーが発生しました。しばらく時間をおいてから再度お試しください。"
            }
            (AuthErrorCode::Unknown, Language::En) => {
                "An authentication error occurred. Please try again later."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} ({})", .code.message(Language::default()), .code.as_str())]
pub struct AuthError {
    pub code: AuthErrorCode,
}

impl AuthError {
    pub fn new(code: AuthErrorCode) -> Self {
        Self { code }
    }

    pub fn localized(&self, language: Language) -> &'static str {
        self.code.message(language)
    }
}

impl From<AuthErrorCode> for AuthError {
    fn from(code: AuthErrorCode) -> Self {
        Self::new(code)
    }
}

pub trait IdentityProvider {
    fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, AuthError>;

    fn register(&mut self, email: &str, password: &str, name: &str) -> Result<UserProfile, AuthError>;

    fn logout(&mut self) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<UserProfile>;

    /// Receive the signed-in user (or `None`) now and after every change.
    fn on_auth_state_change(&mut self) -> Receiver<Option<UserProfile>>;
}
