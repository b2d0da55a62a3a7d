//! Registration, login and credential management against the `users` collection

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use shared::{normalize_required, NewUser, User, UserPatch, ValidationError};

use crate::api::{ApiClient, USERS};
use crate::error::ClientError;
use crate::session::{generate_token, SessionContext};
use crate::slice::SliceState;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: String,
    pub surname: String,
    pub cell_number: String,
}

/// Credential change request; `old_password` is always re-verified
#[derive(Debug, Clone, Default)]
pub struct CredentialsUpdate {
    pub old_password: String,
    pub new_email: Option<String>,
    pub new_password: Option<String>,
}

/// Non-credential profile fields
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub cell_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub token: String,
}

pub fn hash_password(password: &str) -> Result<String, ClientError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ClientError::Hash(e.to_string()))
}

/// Unparseable hashes never verify
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

fn require_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    Ok(())
}

pub struct AuthSlice {
    api: ApiClient,
    state: SliceState,
    profile: Option<User>,
}

impl AuthSlice {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: SliceState::default(),
            profile: None,
        }
    }

    pub fn state(&self) -> &SliceState {
        &self.state
    }

    /// Last profile fetched or updated through this slice
    pub fn profile(&self) -> Option<&User> {
        self.profile.as_ref()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Create an account. Does not log in; the caller gets the new user and a
    /// token to use if it wants to.
    pub async fn register(&mut self, form: &mut RegisterForm) -> Result<Registration, ClientError> {
        self.state.begin();
        let result = self.submit_registration(form).await;
        let registration = self.state.settle(result, "Registration failed")?;

        form.password.clear();
        tracing::info!("Registered {}", registration.user.email);
        Ok(registration)
    }

    async fn submit_registration(&self, form: &RegisterForm) -> Result<Registration, ClientError> {
        let email = normalize_required(&form.email, "Email")?;
        require_password(&form.password)?;

        let existing: Vec<User> = self.api.list(USERS, &[("email", email.as_str())]).await?;
        if !existing.is_empty() {
            return Err(ClientError::DuplicateEmail);
        }

        let new_user = NewUser {
            email,
            password_hash: hash_password(&form.password)?,
            name: form.name.trim().to_string(),
            surname: form.surname.trim().to_string(),
            cell_number: form.cell_number.trim().to_string(),
        };
        let user: User = self.api.create(USERS, &new_user).await?;
        let token = generate_token(&user);

        Ok(Registration {
            user: user.without_secret(),
            token,
        })
    }

    // ========================================================================
    // Login / logout
    // ========================================================================

    /// Verify the password and persist a fresh session. A failed attempt also
    /// clears any session that was there before.
    pub async fn login(&mut self, session: &mut SessionContext, form: &mut LoginForm) -> Result<User, ClientError> {
        self.state.begin();
        let result = self.authenticate(form).await;

        match self.state.settle(result, "Login failed") {
            Ok(user) => {
                let token = generate_token(&user);
                session.begin(&user, token)?;
                form.password.clear();
                tracing::info!("Logged in as {}", user.email);
                Ok(user.without_secret())
            }
            Err(e) => {
                if let Err(clear_err) = session.end() {
                    tracing::warn!("Could not clear session: {}", clear_err);
                }
                Err(e)
            }
        }
    }

    async fn authenticate(&self, form: &LoginForm) -> Result<User, ClientError> {
        let email = normalize_required(&form.email, "Email")?;
        require_password(&form.password)?;

        let users: Vec<User> = self.api.list(USERS, &[("email", email.as_str())]).await?;
        let user = users.into_iter().next().ok_or(ClientError::InvalidCredentials)?;
        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or(ClientError::InvalidCredentials)?;

        if !verify_password(&form.password, stored_hash) {
            return Err(ClientError::InvalidCredentials);
        }
        Ok(user)
    }

    pub fn logout(&mut self, session: &mut SessionContext) -> Result<(), ClientError> {
        self.profile = None;
        self.state = SliceState::default();
        session.end()?;
        tracing::info!("Logged out");
        Ok(())
    }

    // ========================================================================
    // Credentials
    // ========================================================================

    /// Change email and/or password. Returns `None` when nothing would change;
    /// a request with neither field set, or that only repeats the logged-in
    /// user's email, makes no network call at all.
    pub async fn update_credentials(
        &mut self,
        session: &mut SessionContext,
        user_id: &str,
        update: &CredentialsUpdate,
    ) -> Result<Option<User>, ClientError> {
        let session_email = session
            .current_user()
            .filter(|user| user.id == user_id)
            .map(|user| user.email.clone());
        let new_email = update
            .new_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .filter(|email| session_email.as_deref() != Some(*email));
        let new_password = update
            .new_password
            .as_deref()
            .filter(|password| !password.trim().is_empty());

        if new_email.is_none() && new_password.is_none() {
            return Ok(None);
        }

        self.state.begin();
        let result = self
            .apply_credentials(user_id, &update.old_password, new_email, new_password)
            .await;
        let updated = self.state.settle(result, "Failed to update credentials")?;

        if let Some(user) = &updated {
            session.refresh_user(user)?;
            self.profile = Some(user.without_secret());
            tracing::info!("Updated credentials for user {}", user.id);
        }
        Ok(updated)
    }

    async fn apply_credentials(
        &self,
        user_id: &str,
        old_password: &str,
        new_email: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<Option<User>, ClientError> {
        let user: User = self.api.get(USERS, user_id).await?;
        let stored_hash = user
            .password_hash
            .as_deref()
            .ok_or(ClientError::WrongOldPassword)?;
        if !verify_password(old_password, stored_hash) {
            return Err(ClientError::WrongOldPassword);
        }

        let mut patch = UserPatch::default();

        if let Some(email) = new_email.filter(|email| *email != user.email) {
            let holders: Vec<User> = self.api.list(USERS, &[("email", email)]).await?;
            if holders.iter().any(|holder| holder.id != user.id) {
                return Err(ClientError::EmailTaken);
            }
            patch.email = Some(email.to_string());
        }

        if let Some(password) = new_password {
            patch.password_hash = Some(hash_password(password)?);
        }

        if patch.is_empty() {
            return Ok(None);
        }

        let updated: User = self.api.patch(USERS, user_id, &patch).await?;
        Ok(Some(updated.without_secret()))
    }

    // ========================================================================
    // Profile
    // ========================================================================

    pub async fn fetch_profile(&mut self, user_id: &str) -> Result<User, ClientError> {
        self.state.begin();
        let result = self.api.get::<User>(USERS, user_id).await;
        let user = self.state.settle(result, "Failed to load profile")?.without_secret();
        self.profile = Some(user.clone());
        Ok(user)
    }

    /// Patch name, surname and cell number. An empty update is a no-op.
    pub async fn update_profile(
        &mut self,
        session: &mut SessionContext,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, ClientError> {
        let patch = UserPatch {
            name: update.name.as_deref().map(|s| s.trim().to_string()),
            surname: update.surname.as_deref().map(|s| s.trim().to_string()),
            cell_number: update.cell_number.as_deref().map(|s| s.trim().to_string()),
            ..UserPatch::default()
        };
        if patch.is_empty() {
            return Ok(None);
        }

        self.state.begin();
        let result = self.api.patch::<_, User>(USERS, user_id, &patch).await;
        let user = self.state.settle(result, "Failed to update profile")?.without_secret();

        session.refresh_user(&user)?;
        self.profile = Some(user.clone());
        Ok(Some(user))
    }
}
