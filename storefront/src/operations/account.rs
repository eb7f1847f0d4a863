//! Registration, login, sessions and profile

use uuid::Uuid;

use shared::{Role, UserId};

use crate::core::credentials;
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::{LoginRequest, NewUser, PasswordChange, ProfileUpdate, RegisterRequest, User, UserPatch};

const COMPONENT: &str = "account";

fn normalize_email(email: &str) -> StorefrontResult<String> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(StorefrontError::invalid(format!("{email:?} is not a valid email address")));
    }
    Ok(email)
}

fn required(field: &str, value: &str) -> StorefrontResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StorefrontError::invalid(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

impl Storefront {
    /// Register a customer account
    pub async fn register(&self, request: RegisterRequest) -> StorefrontResult<User> {
        let email = normalize_email(&request.email)?;
        credentials::validate_password(&request.password)?;
        let full_name = required("full name", &request.full_name)?;

        let user = self
            .store
            .insert_user(NewUser {
                email,
                password_hash: credentials::hash_password(&request.password),
                full_name,
                phone: request.phone.trim().to_string(),
                address: request.address.trim().to_string(),
                role: Role::Customer,
            })
            .await?;

        shared::component_info!(COMPONENT, "👤 Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Check credentials and bind the user to a freshly rotated session.
    /// Returns the user and the new session id.
    pub async fn login(&self, session_id: Uuid, request: LoginRequest) -> StorefrontResult<(User, Uuid)> {
        let email = request.email.trim().to_lowercase();
        let user = match self.store.user_by_email(&email).await? {
            Some(user) if credentials::verify_password(&request.password, &user.password_hash) => user,
            _ => {
                shared::component_warn!(COMPONENT, "🔒 Failed login for {}", email);
                return Err(StorefrontError::Unauthorized);
            }
        };
        if user.locked {
            return Err(StorefrontError::forbidden("account is locked"));
        }

        // Rotating keeps the anonymous cart
        let mut session = match self.sessions.rotate(session_id).await {
            Some(session) => session,
            None => self.sessions.create().await,
        };
        session.user_id = Some(user.id);
        let new_id = session.id;
        self.sessions.save(session).await;

        shared::component_info!(COMPONENT, "🔑 User {} logged in", user.id);
        Ok((user, new_id))
    }

    pub async fn logout(&self, session_id: Uuid) {
        self.sessions.destroy(session_id).await;
    }

    /// Logged-in user of a session
    pub async fn current_user(&self, session_id: Uuid) -> StorefrontResult<User> {
        let user_id = self
            .sessions
            .get(session_id)
            .await
            .and_then(|session| session.user_id)
            .ok_or(StorefrontError::Unauthorized)?;
        self.active_user(user_id).await
    }

    /// Fresh copy of an account that may still act
    pub async fn active_user(&self, user_id: UserId) -> StorefrontResult<User> {
        let user = self.store.user(user_id).await?.ok_or(StorefrontError::Unauthorized)?;
        if user.locked {
            return Err(StorefrontError::forbidden("account is locked"));
        }
        Ok(user)
    }

    pub async fn update_profile(&self, user: &User, update: ProfileUpdate) -> StorefrontResult<User> {
        let patch = UserPatch {
            full_name: update.full_name.as_deref().map(|name| required("full name", name)).transpose()?,
            phone: update.phone.map(|phone| phone.trim().to_string()),
            address: update.address.map(|address| address.trim().to_string()),
            ..UserPatch::default()
        };
        self.store.patch_user(user.id, patch).await
    }

    pub async fn change_password(&self, user: &User, change: PasswordChange) -> StorefrontResult<()> {
        if !credentials::verify_password(&change.current_password, &user.password_hash) {
            return Err(StorefrontError::forbidden("current password is incorrect"));
        }
        credentials::validate_password(&change.new_password)?;

        let patch = UserPatch {
            password_hash: Some(credentials::hash_password(&change.new_password)),
            ..UserPatch::default()
        };
        self.store.patch_user(user.id, patch).await?;

        shared::component_info!(COMPONENT, "🔑 User {} changed password", user.id);
        Ok(())
    }

    /// Create the configured admin account if no user has that email yet
    pub(crate) async fn bootstrap_admin(&self) -> StorefrontResult<()> {
        let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password) else {
            return Ok(());
        };
        let email = normalize_email(email)?;
        credentials::validate_password(password)?;

        if let Some(existing) = self.store.user_by_email(&email).await? {
            if existing.role != Role::Admin {
                shared::component_warn!(COMPONENT, "⚠️ Bootstrap admin {} exists with role {}", email, existing.role);
            }
            return Ok(());
        }

        let admin = self
            .store
            .insert_user(NewUser {
                email,
                password_hash: credentials::hash_password(password),
                full_name: "Administrator".to_string(),
                phone: String::new(),
                address: String::new(),
                role: Role::Admin,
            })
            .await?;
        shared::logging::log_success(COMPONENT, &format!("Created bootstrap admin {}", admin.email));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("ana@").is_err());
    }
}
