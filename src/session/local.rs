//! Accounts kept in the state directory.
//!
//! `accounts.json` holds every registered account with a salted SHA-256
//! password digest; `session.json` names the signed-in user, so a login
//! survives between command invocations until `account logout`.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use super::{AuthError, AuthErrorCode, IdentityProvider, UserProfile};
use crate::common::constants::{
    ACCOUNTS_FILE_NAME, LOGIN_LOCKOUT_MINUTES, MAXIMUM_FAILED_LOGINS, MINIMUM_PASSWORD_LENGTH,
    SESSION_FILE_NAME,
};
use crate::state::{read_json, write_json_atomic};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    profile: UserProfile,
    salt: String,
    password_digest: String,
    #[serde(default)]
    failed_logins: u32,
    #[serde(default)]
    locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Session {
    user_id: String,
    signed_in_at: DateTime<Utc>,
}

pub struct LocalIdentityProvider {
    accounts_path: PathBuf,
    session_path: PathBuf,
    accounts: Vec<Account>,
    current: Option<UserProfile>,
    listeners: Vec<Sender<Option<UserProfile>>>,
}

impl LocalIdentityProvider {
    pub fn open(state_dir: &Path) -> Result<Self, AuthError> {
        let accounts_path = state_dir.join(ACCOUNTS_FILE_NAME);
        let session_path = state_dir.join(SESSION_FILE_NAME);

        let accounts: Vec<Account> = read_json(&accounts_path)
            .map_err(|_| AuthError::new(AuthErrorCode::Unknown))?
            .unwrap_or_default();

        // A session for a deleted account is simply signed out
        let current = read_json::<Session>(&session_path)
            .ok()
            .flatten()
            .and_then(|session| {
                accounts
                    .iter()
                    .find(|a| a.profile.id == session.user_id)
                    .map(|a| a.profile.clone())
            });

        Ok(Self {
            accounts_path,
            session_path,
            accounts,
            current,
            listeners: Vec::new(),
        })
    }

    fn save_accounts(&self) -> Result<(), AuthError> {
        write_json_atomic(&self.accounts_path, &self.accounts)
            .map_err(|_| AuthError::new(AuthErrorCode::Unknown))
    }

    fn sign_in(&mut self, profile: UserProfile) -> Result<UserProfile, AuthError> {
        let session = Session {
            user_id: profile.id.clone(),
            signed_in_at: Utc::now(),
        };
        write_json_atomic(&self.session_path, &session)
            .map_err(|_| AuthError::new(AuthErrorCode::Unknown))?;
        self.current = Some(profile.clone());
        self.notify();
        Ok(profile)
    }

    pub(crate) fn login_at(
        &mut self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, AuthError> {
        let email = normalize_email(email)?;
        let index = self
            .accounts
            .iter()
            .position(|a| a.profile.email == email)
            .ok_or(AuthErrorCode::UserNotFound)?;

        let account = &mut self.accounts[index];
        let mut dirty = false;
        if let Some(until) = account.locked_until {
            if now < until {
                return Err(AuthErrorCode::TooManyRequests.into());
            }
            account.locked_until = None;
            account.failed_logins = 0;
            dirty = true;
        }

        if digest_password(&account.salt, password) != account.password_digest {
            account.failed_logins += 1;
            if account.failed_logins >= MAXIMUM_FAILED_LOGINS {
                account.locked_until = Some(now + Duration::minutes(LOGIN_LOCKOUT_MINUTES));
            }
            self.save_accounts()?;
            return Err(AuthErrorCode::WrongPassword.into());
        }

        let profile = account.profile.clone();
        if account.failed_logins > 0 {
            account.failed_logins = 0;
            dirty = true;
        }
        if dirty {
            self.save_accounts()?;
        }
        self.sign_in(profile)
    }

    fn notify(&mut self) {
        let current = self.current.clone();
        self.listeners.retain(|tx| tx.send(current.clone()).is_ok());
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn login(&mut self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        self.login_at(email, password, Utc::now())
    }

    fn register(&mut self, email: &str, password: &str, name: &str) -> Result<UserProfile, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MINIMUM_PASSWORD_LENGTH {
            return Err(AuthErrorCode::WeakPassword.into());
        }
        if self.accounts.iter().any(|a| a.profile.email == email) {
            return Err(AuthErrorCode::EmailAlreadyInUse.into());
        }

        let created_at = Utc::now();
        let name = match name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let seed = format!(
            "{email}:{}:{}",
            created_at.timestamp_nanos_opt().unwrap_or_default(),
            std::process::id()
        );
        let profile = UserProfile {
            id: sha256::digest(seed.as_bytes())[..20].to_string(),
            email,
            name,
            created_at,
        };
        let salt = sha256::digest(format!("{seed}:salt").as_bytes())[..16].to_string();

        self.accounts.push(Account {
            profile: profile.clone(),
            password_digest: digest_password(&salt, password),
            salt,
            failed_logins: 0,
            locked_until: None,
        });
        self.save_accounts()?;
        self.sign_in(profile)
    }

    fn logout(&mut self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.session_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(_) => return Err(AuthErrorCode::Unknown.into()),
        }
        if self.current.take().is_some() {
            self.notify();
        }
        Ok(())
    }

    fn current_user(&self) -> Option<UserProfile> {
        self.current.clone()
    }

    fn on_auth_state_change(&mut self) -> Receiver<Option<UserProfile>> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.current.clone());
        self.listeners.push(tx);
        rx
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if EMAIL_PATTERN.is_match(&email) {
        Ok(email)
    } else {
        Err(AuthErrorCode::InvalidEmail.into())
    }
}

fn digest_password(salt: &str, password: &str) -> String {
    sha256::digest(format!("{salt}:{password}").as_bytes())
}
