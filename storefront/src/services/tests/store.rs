//! Tests for the Store service

use super::fixtures::*;
use super::helpers::*;
use crate::core::order_flow::{self, Actor, OrderAction};
use crate::error::StorefrontError;
use crate::services::RealStore;
use crate::traits::Store;
use crate::types::{ProductPatch, UserPatch};
use shared::{OrderStatus, Role};

mod users {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = RealStore::in_memory();
        store.insert_user(new_user("ana@example.com", Role::Customer)).await.unwrap();

        let result = store.insert_user(new_user("ana@example.com", Role::Customer)).await;
        assert!(matches!(result, Err(StorefrontError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let store = RealStore::in_memory();
        let a = store.insert_user(new_user("a@example.com", Role::Customer)).await.unwrap();
        let b = store.insert_user(new_user("b@example.com", Role::Shipper)).await.unwrap();

        assert!(b.id > a.id);
        assert_eq!(store.user_by_email("b@example.com").await.unwrap().unwrap().role, Role::Shipper);
    }

    #[tokio::test]
    async fn test_patch_user_leaves_other_fields_alone() {
        let store = RealStore::in_memory();
        let user = store.insert_user(new_user("ana@example.com", Role::Customer)).await.unwrap();

        let locked = UserPatch {
            locked: Some(true),
            ..UserPatch::default()
        };
        store.patch_user(user.id, locked).await.unwrap();

        // A profile edit prepared before the lock must not undo it
        let profile = UserPatch {
            full_name: Some("Ana Renamed".to_string()),
            phone: Some("555-0199".to_string()),
            ..UserPatch::default()
        };
        let patched = store.patch_user(user.id, profile).await.unwrap();

        assert!(patched.locked);
        assert_eq!(patched.full_name, "Ana Renamed");
        assert_eq!(patched.role, Role::Customer);
        assert_eq!(patched.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_patch_unknown_user_is_not_found() {
        let store = RealStore::in_memory();
        let result = store.patch_user(shared::UserId(99), UserPatch::default()).await;
        assert!(matches!(result, Err(StorefrontError::NotFound { .. })));
    }
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn test_category_with_products_cannot_be_deleted() {
        let seeded = seeded_store().await;

        let result = seeded.store.delete_category(seeded.category.id).await;
        assert!(matches!(result, Err(StorefrontError::Conflict { .. })));

        seeded.store.delete_product(seeded.tea.id).await.unwrap();
        seeded.store.delete_product(seeded.beans.id).await.unwrap();
        seeded.store.delete_category(seeded.category.id).await.unwrap();
        assert!(seeded.store.categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_product_slug_must_be_unique() {
        let seeded = seeded_store().await;
        let result = seeded
            .store
            .insert_product(product_draft(seeded.category.id, "Green Tea", 100, 1))
            .await;
        assert!(matches!(result, Err(StorefrontError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_product_in_open_order_cannot_be_deleted() {
        let seeded = seeded_store().await;
        seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.tea, 1)]))
            .await
            .unwrap();

        let result = seeded.store.delete_product(seeded.tea.id).await;
        assert!(matches!(result, Err(StorefrontError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_image_patch_keeps_reserved_stock() {
        let seeded = seeded_store().await;
        // The caller read the product before this order reserved 3 units
        let stale = seeded.store.product(seeded.tea.id).await.unwrap().unwrap();
        seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.tea, 3)]))
            .await
            .unwrap();

        let change = seeded
            .store
            .patch_product(stale.id, ProductPatch::image("/uploads/tea.png".to_string()))
            .await
            .unwrap();

        assert_eq!(change.before.image_path, None);
        assert_eq!(change.after.image_path.as_deref(), Some("/uploads/tea.png"));
        assert_eq!(change.after.stock, 7);
        assert_eq!(change.after.sold, 3);
    }

    #[tokio::test]
    async fn test_patch_product_checks_slug_and_category() {
        let seeded = seeded_store().await;

        let taken = ProductPatch {
            slug: Some(seeded.beans.slug.clone()),
            ..ProductPatch::default()
        };
        let result = seeded.store.patch_product(seeded.tea.id, taken).await;
        assert!(matches!(result, Err(StorefrontError::Conflict { .. })));

        let orphan = ProductPatch {
            category_id: Some(shared::CategoryId(42)),
            ..ProductPatch::default()
        };
        let result = seeded.store.patch_product(seeded.tea.id, orphan).await;
        assert!(matches!(result, Err(StorefrontError::NotFound { .. })));

        let tea = seeded.store.product(seeded.tea.id).await.unwrap().unwrap();
        assert_eq!(tea, seeded.tea);
    }
}

mod orders {
    use super::*;

    #[tokio::test]
    async fn test_create_order_reserves_stock() {
        let seeded = seeded_store().await;
        let order = seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.tea, 4), (&seeded.beans, 1)]))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.history.len(), 1);

        let tea = seeded.store.product(seeded.tea.id).await.unwrap().unwrap();
        assert_eq!(tea.stock, 6);
        assert_eq!(tea.sold, 4);
    }

    #[tokio::test]
    async fn test_create_order_is_all_or_nothing() {
        let seeded = seeded_store().await;
        let result = seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.tea, 2), (&seeded.beans, 4)]))
            .await;

        assert!(matches!(
            result,
            Err(StorefrontError::OutOfStock {
                requested: 4,
                available: 3,
                ..
            })
        ));
        let tea = seeded.store.product(seeded.tea.id).await.unwrap().unwrap();
        assert_eq!(tea.stock, 10);
        assert!(seeded.store.orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_order_compare_and_set() {
        let seeded = seeded_store().await;
        let order = seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.beans, 3)]))
            .await
            .unwrap();

        let actor = Actor::System;
        let cancel = OrderAction::Cancel {
            reason: "payment failed".to_string(),
        };
        let transition = order_flow::plan(&order, &actor, &cancel).unwrap();
        let cancelled = order_flow::apply(&order, &transition, &actor, chrono::Utc::now());

        seeded
            .store
            .commit_order(OrderStatus::Pending, cancelled.clone(), true)
            .await
            .unwrap();
        let beans = seeded.store.product(seeded.beans.id).await.unwrap().unwrap();
        assert_eq!(beans.stock, 3);
        assert_eq!(beans.sold, 0);

        // A second writer that planned from Pending loses and restocks nothing
        let stale = seeded.store.commit_order(OrderStatus::Pending, cancelled, true).await;
        assert!(matches!(stale, Err(StorefrontError::Conflict { .. })));
        let beans = seeded.store.product(seeded.beans.id).await.unwrap().unwrap();
        assert_eq!(beans.stock, 3);
    }

    #[tokio::test]
    async fn test_concurrent_orders_never_oversell() {
        let seeded = seeded_store().await;
        let mut handles = Vec::new();
        for _ in 0..5 {
            let store = seeded.store.clone();
            let draft = order_draft(seeded.customer, &[(&seeded.beans, 1)]);
            handles.push(tokio::spawn(async move { store.create_order(draft).await }));
        }

        let mut placed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                placed += 1;
            }
        }

        assert_eq!(placed, 3);
        let beans = seeded.store.product(seeded.beans.id).await.unwrap().unwrap();
        assert_eq!(beans.stock, 0);
    }
}

mod messages {
    use super::*;

    #[tokio::test]
    async fn test_messages_are_ordered_per_order() {
        let seeded = seeded_store().await;
        let first = seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.tea, 1)]))
            .await
            .unwrap();
        let second = seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.tea, 1)]))
            .await
            .unwrap();

        for body in ["one", "two", "three"] {
            seeded
                .store
                .append_message(chat_draft(&first, seeded.customer, Role::Customer, body))
                .await
                .unwrap();
        }
        seeded
            .store
            .append_message(chat_draft(&second, seeded.customer, Role::Customer, "other"))
            .await
            .unwrap();

        let bodies: Vec<String> = seeded
            .store
            .messages(first.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_message_for_unknown_order_rejected() {
        let seeded = seeded_store().await;
        let order = seeded
            .store
            .create_order(order_draft(seeded.customer, &[(&seeded.tea, 1)]))
            .await
            .unwrap();
        let mut draft = chat_draft(&order, seeded.customer, Role::Customer, "hi");
        draft.order_id = shared::OrderId(999);

        let result = seeded.store.append_message(draft).await;
        assert!(matches!(result, Err(StorefrontError::NotFound { .. })));
    }
}

mod snapshot {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("store.json");

        let store = RealStore::open(&path).await.unwrap();
        let user = store.insert_user(new_user("ana@example.com", Role::Customer)).await.unwrap();
        let category = store.insert_category(category_draft("Drinks")).await.unwrap();
        let tea = store
            .insert_product(product_draft(category.id, "Green Tea", 450, 10))
            .await
            .unwrap();
        store.create_order(order_draft(user.id, &[(&tea, 2)])).await.unwrap();
        assert!(path.exists());

        let reopened = RealStore::open(&path).await.unwrap();
        assert_eq!(reopened.orders().await.unwrap().len(), 1);
        assert_eq!(reopened.product(tea.id).await.unwrap().unwrap().stock, 8);

        // Counters continue after the persisted ids
        let next = reopened.insert_user(new_user("bo@example.com", Role::Customer)).await.unwrap();
        assert!(next.id > user.id);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = RealStore::open(dir.path().join("store.json")).await.unwrap();
        assert!(store.users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, b"{not json").unwrap();

        assert!(matches!(RealStore::open(&path).await, Err(StorefrontError::Json(_))));
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_discards_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = RealStore::open(&path).await.unwrap();
        let user = store.insert_user(new_user("ana@example.com", Role::Customer)).await.unwrap();
        let category = store.insert_category(category_draft("Drinks")).await.unwrap();
        let tea = store
            .insert_product(product_draft(category.id, "Green Tea", 450, 10))
            .await
            .unwrap();

        // A directory where the temp file goes makes the write fail
        let tmp = path.with_extension("json.tmp");
        std::fs::create_dir(&tmp).unwrap();

        let result = store.create_order(order_draft(user.id, &[(&tea, 4)])).await;
        assert!(matches!(result, Err(StorefrontError::Io(_))));
        assert_eq!(store.product(tea.id).await.unwrap().unwrap().stock, 10);
        assert!(store.orders().await.unwrap().is_empty());

        std::fs::remove_dir(&tmp).unwrap();
        let order = store.create_order(order_draft(user.id, &[(&tea, 4)])).await.unwrap();
        assert_eq!(store.product(tea.id).await.unwrap().unwrap().stock, 6);

        let reopened = RealStore::open(&path).await.unwrap();
        assert_eq!(reopened.orders().await.unwrap(), vec![order]);
    }
}
