//! Back-office: dashboard and user management

use chrono::Utc;

use shared::{HubEvent, Role, UserId};

use crate::core::{DashboardStats, catalog};
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::{Page, User, UserListQuery, UserPatch, UserView};

const COMPONENT: &str = "admin";

impl Storefront {
    pub async fn dashboard(&self) -> StorefrontResult<DashboardStats> {
        let orders = self.store.orders().await?;
        let products = self.store.products().await?;
        let users = self.store.users().await?;
        Ok(self.analytics.dashboard(&orders, &products, &users, Utc::now()))
    }

    /// Users by id, filtered by role and email substring
    pub async fn list_users(&self, query: &UserListQuery) -> StorefrontResult<Page<UserView>> {
        let needle = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut users: Vec<User> = self
            .store
            .users()
            .await?
            .into_iter()
            .filter(|u| query.role.is_none_or(|role| u.role == role))
            .filter(|u| needle.as_deref().is_none_or(|needle| u.email.contains(needle)))
            .collect();
        users.sort_by_key(|u| u.id);

        Ok(catalog::paginate(users, query.page, query.page_size).map(|u| UserView::from(&u)))
    }

    async fn managed_user(&self, admin: &User, user_id: UserId) -> StorefrontResult<User> {
        if admin.id == user_id {
            return Err(StorefrontError::forbidden("admins cannot change their own role or lock state"));
        }
        self.store
            .user(user_id)
            .await?
            .ok_or_else(|| StorefrontError::not_found("user", user_id))
    }

    pub async fn set_role(&self, admin: &User, user_id: UserId, role: Role) -> StorefrontResult<UserView> {
        let previous = self.managed_user(admin, user_id).await?.role;
        let patch = UserPatch {
            role: Some(role),
            ..UserPatch::default()
        };
        let user = self.store.patch_user(user_id, patch).await?;

        shared::component_info!(COMPONENT, "🛡️ Admin {} changed user {} from {} to {}", admin.id, user.id, previous, role);
        Ok(UserView::from(&user))
    }

    /// Lock or unlock an account; a locked user's sessions stop authenticating
    /// and their open chat connections are dropped
    pub async fn set_locked(&self, admin: &User, user_id: UserId, locked: bool) -> StorefrontResult<UserView> {
        self.managed_user(admin, user_id).await?;
        let patch = UserPatch {
            locked: Some(locked),
            ..UserPatch::default()
        };
        let user = self.store.patch_user(user_id, patch).await?;

        if locked {
            let dropped = self
                .hub
                .evict(
                    user.id,
                    None,
                    HubEvent::Error {
                        message: "account is locked".to_string(),
                    },
                )
                .await;
            if dropped > 0 {
                shared::component_info!(COMPONENT, "🔌 Dropped {} chat connection(s) of locked user {}", dropped, user.id);
            }
        }

        let verb = if locked { "locked" } else { "unlocked" };
        shared::component_info!(COMPONENT, "🛡️ Admin {} {} user {}", admin.id, verb, user.id);
        Ok(UserView::from(&user))
    }
}
