// ABOUTME: Tests for the storage layer against a migrated SQLite database
// ABOUTME: Covers accounts, favorite toggling, rating lifecycle, and cascade cleanup

#[cfg(test)]
mod tests {
    use super::super::catalog::MovieCatalog;
    use super::super::entities::{favorite, movie, rating};
    use super::super::error::{AppError, Result};
    use super::super::password::Passwords;
    use super::super::storage::*;
    use super::super::types::*;
    use async_trait::async_trait;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let passwords = Passwords::new(1024, 1).unwrap();
        let storage = Storage::connect(&db_url, passwords).await.unwrap();

        (storage, temp_dir)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: format!("{}-password", username),
            first_name: format!("{}F", username.to_uppercase()),
            last_name: format!("{}L", username.to_uppercase()),
            email: format!("{}@email.com", username),
            profile_image: Some(format!("{}.jpg", username)),
            is_admin: false,
        }
    }

    async fn create_user(storage: &Storage, username: &str) -> UserProfile {
        storage.register(new_user(username)).await.unwrap()
    }

    async fn movie_rows(storage: &Storage) -> u64 {
        movie::Entity::find().count(&storage.db).await.unwrap()
    }

    /// Returns `{"id": movie_id}` for every lookup, or fails for ids in `broken`.
    struct StubCatalog {
        broken: Vec<i32>,
    }

    #[async_trait]
    impl MovieCatalog for StubCatalog {
        async fn search(&self, _title: &str) -> Result<Vec<Value>> {
            Ok(vec![])
        }

        async fn popular(&self) -> Result<Vec<Value>> {
            Ok(vec![])
        }

        async fn details(&self, movie_id: i32) -> Result<Value> {
            if self.broken.contains(&movie_id) {
                return Err(AppError::Catalog(format!("movie {} unavailable", movie_id)));
            }
            Ok(json!({ "id": movie_id }))
        }

        async fn trailer(&self, _movie_id: i32) -> Result<Option<Value>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_register_and_get_user() {
        let (storage, _temp_dir) = create_test_storage().await;

        let created = create_user(&storage, "u1").await;
        assert_eq!(created.username, "u1");
        assert_eq!(created.first_name, "U1F");
        assert!(!created.is_admin);

        let fetched = storage.get_user(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (storage, _temp_dir) = create_test_storage().await;

        let first = create_user(&storage, "u1").await;

        let mut again = new_user("u1");
        again.first_name = "Impostor".to_string();
        let result = storage.register(again).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let unchanged = storage.get_user(first.id).await.unwrap();
        assert_eq!(unchanged.first_name, "U1F");
        assert_eq!(storage.find_all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_keeps_admin_flag() {
        let (storage, _temp_dir) = create_test_storage().await;

        let mut admin = new_user("admin");
        admin.is_admin = true;
        let created = storage.register(admin).await.unwrap();
        assert!(created.is_admin);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (storage, _temp_dir) = create_test_storage().await;
        let created = create_user(&storage, "u1").await;

        let profile = storage.authenticate("u1", "u1-password").await.unwrap();
        assert_eq!(profile, created);

        let serialized = serde_json::to_value(&profile).unwrap();
        assert!(serialized.get("password").is_none());
        assert!(serialized.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let (storage, _temp_dir) = create_test_storage().await;
        create_user(&storage, "u1").await;

        let wrong_password = storage.authenticate("u1", "nope").await.unwrap_err();
        let unknown_user = storage.authenticate("ghost", "u1-password").await.unwrap_err();

        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
        assert!(matches!(unknown_user, AppError::Unauthorized(_)));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_unknown_username_pays_for_a_verification() {
        let (storage, _temp_dir) = create_test_storage().await;
        create_user(&storage, "u1").await;

        let before = storage.passwords.verifications();
        storage.authenticate("u1", "nope").await.unwrap_err();
        assert_eq!(storage.passwords.verifications(), before + 1);

        storage.authenticate("ghost", "nope").await.unwrap_err();
        assert_eq!(storage.passwords.verifications(), before + 2);
    }

    #[tokio::test]
    async fn test_find_all_users_sorted_by_username() {
        let (storage, _temp_dir) = create_test_storage().await;
        for name in ["carol", "alice", "bob"] {
            create_user(&storage, name).await;
        }

        let names: Vec<String> = storage
            .find_all_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let (storage, _temp_dir) = create_test_storage().await;

        let result = storage.get_user(9999).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (storage, _temp_dir) = create_test_storage().await;
        let created = create_user(&storage, "u1").await;

        let changes = UserChanges {
            first_name: Some("New".to_string()),
            ..Default::default()
        };
        let updated = storage.update_user(created.id, changes).await.unwrap();

        assert_eq!(updated.first_name, "New");
        assert_eq!(updated.last_name, created.last_name);
        assert_eq!(updated.email, created.email);
    }

    #[tokio::test]
    async fn test_update_password_is_rehashed() {
        let (storage, _temp_dir) = create_test_storage().await;
        let created = create_user(&storage, "u1").await;

        let changes = UserChanges {
            password: Some("brand-new".to_string()),
            ..Default::default()
        };
        storage.update_user(created.id, changes).await.unwrap();

        assert!(storage.authenticate("u1", "brand-new").await.is_ok());
        assert!(storage.authenticate("u1", "u1-password").await.is_err());
    }

    #[tokio::test]
    async fn test_update_cannot_grant_admin() {
        let (storage, _temp_dir) = create_test_storage().await;
        let created = create_user(&storage, "u1").await;

        let request = UpdateUserRequest {
            is_admin: Some(true),
            first_name: Some("Sneaky".to_string()),
            ..Default::default()
        };
        let updated = storage
            .update_user(created.id, request.validate().unwrap())
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Sneaky");
        assert!(!updated.is_admin);
        assert!(!storage.get_user(created.id).await.unwrap().is_admin);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let (storage, _temp_dir) = create_test_storage().await;

        let changes = UserChanges {
            email: Some("x@email.com".to_string()),
            ..Default::default()
        };
        let result = storage.update_user(9999, changes).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_user() {
        let (storage, _temp_dir) = create_test_storage().await;
        let created = create_user(&storage, "u1").await;

        storage.remove_user(created.id).await.unwrap();
        assert!(matches!(
            storage.get_user(created.id).await,
            Err(AppError::NotFound(_))
        ));

        let again = storage.remove_user(created.id).await;
        assert!(matches!(again, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_favorite_toggle_cycle() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;

        assert!(!storage.is_favorite(user.id, 668489).await.unwrap());

        let first = storage.toggle_favorite(user.id, 668489).await.unwrap();
        assert!(first.is_favorite);
        assert!(storage.is_favorite(user.id, 668489).await.unwrap());

        let second = storage.toggle_favorite(user.id, 668489).await.unwrap();
        assert!(!second.is_favorite);
        assert!(!storage.is_favorite(user.id, 668489).await.unwrap());

        // Still a single join row and a single movie reference
        let rows = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user.id))
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(movie_rows(&storage).await, 1);
    }

    #[tokio::test]
    async fn test_favorites_are_per_user() {
        let (storage, _temp_dir) = create_test_storage().await;
        let u1 = create_user(&storage, "u1").await;
        let u2 = create_user(&storage, "u2").await;

        storage.toggle_favorite(u1.id, 550).await.unwrap();

        assert!(storage.is_favorite(u1.id, 550).await.unwrap());
        assert!(!storage.is_favorite(u2.id, 550).await.unwrap());

        // u2's first toggle creates their own row set to true
        assert!(storage.toggle_favorite(u2.id, 550).await.unwrap().is_favorite);
        assert_eq!(movie_rows(&storage).await, 1);
    }

    #[tokio::test]
    async fn test_favorite_missing_user() {
        let (storage, _temp_dir) = create_test_storage().await;

        let toggled = storage.toggle_favorite(9999, 550).await;
        assert!(matches!(toggled, Err(AppError::NotFound(_))));

        // The transaction rolled back the lazily created reference
        assert_eq!(movie_rows(&storage).await, 0);

        let checked = storage.is_favorite(9999, 550).await;
        assert!(matches!(checked, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_all_favorites_order_and_filter() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;
        let catalog = StubCatalog { broken: vec![] };

        for movie_id in [101, 102, 103] {
            storage.toggle_favorite(user.id, movie_id).await.unwrap();
            tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        }

        // Unfavorite 102, then re-toggle 101 so it becomes the newest
        storage.toggle_favorite(user.id, 102).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        storage.toggle_favorite(user.id, 101).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
        storage.toggle_favorite(user.id, 101).await.unwrap();

        let favorites = storage.all_favorites(user.id, &catalog).await.unwrap();
        let ids: Vec<i64> = favorites
            .iter()
            .map(|movie| movie["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![101, 103]);
    }

    #[tokio::test]
    async fn test_all_favorites_empty_and_missing_user() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;
        let catalog = StubCatalog { broken: vec![] };

        assert!(storage.all_favorites(user.id, &catalog).await.unwrap().is_empty());

        let missing = storage.all_favorites(9999, &catalog).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_all_favorites_fails_when_any_fetch_fails() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;
        let catalog = StubCatalog { broken: vec![202] };

        storage.toggle_favorite(user.id, 201).await.unwrap();
        storage.toggle_favorite(user.id, 202).await.unwrap();

        let result = storage.all_favorites(user.id, &catalog).await;
        assert!(matches!(result, Err(AppError::Catalog(_))));
    }

    #[tokio::test]
    async fn test_create_and_get_rating() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;

        let created = storage
            .create_rating(NewRating {
                user_id: user.id,
                movie_id: 1197306,
                rating: 4.5,
            })
            .await
            .unwrap();
        assert_eq!(created.user_id, user.id);
        assert_eq!(created.movie_id, 1197306);
        assert_eq!(created.rating, 4.5);

        let fetched = storage.get_rating(user.id, 1197306).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_duplicate_rating_is_rejected() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;

        storage
            .create_rating(NewRating {
                user_id: user.id,
                movie_id: 1197306,
                rating: 4.5,
            })
            .await
            .unwrap();

        let second = storage
            .create_rating(NewRating {
                user_id: user.id,
                movie_id: 1197306,
                rating: 2.5,
            })
            .await;
        assert!(matches!(second, Err(AppError::BadRequest(_))));

        let stored = storage.get_rating(user.id, 1197306).await.unwrap().unwrap();
        assert_eq!(stored.rating, 4.5);
    }

    #[tokio::test]
    async fn test_rating_missing_user() {
        let (storage, _temp_dir) = create_test_storage().await;

        let created = storage
            .create_rating(NewRating {
                user_id: 9999,
                movie_id: 1197306,
                rating: 4.5,
            })
            .await;
        assert!(matches!(created, Err(AppError::NotFound(_))));
        assert_eq!(movie_rows(&storage).await, 0);

        assert!(matches!(
            storage.get_rating(9999, 1197306).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            storage.update_rating(9999, 1197306, 3.0).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            storage.remove_rating(9999, 1197306).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_rating_when_unrated_is_none() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;

        // Movie known through a favorite but never rated
        storage.toggle_favorite(user.id, 550).await.unwrap();

        assert_eq!(storage.get_rating(user.id, 550).await.unwrap(), None);
        assert_eq!(storage.get_rating(user.id, 551).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_rating() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;

        let missing = storage.update_rating(user.id, 1197306, 3.0).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        storage
            .create_rating(NewRating {
                user_id: user.id,
                movie_id: 1197306,
                rating: 4.5,
            })
            .await
            .unwrap();

        let updated = storage.update_rating(user.id, 1197306, 3.0).await.unwrap();
        assert_eq!(updated.rating, 3.0);

        let fetched = storage.get_rating(user.id, 1197306).await.unwrap().unwrap();
        assert_eq!(fetched.rating, 3.0);
        assert_eq!(fetched.id, updated.id);
    }

    #[tokio::test]
    async fn test_update_rating_only_touches_own_row() {
        let (storage, _temp_dir) = create_test_storage().await;
        let u1 = create_user(&storage, "u1").await;
        let u2 = create_user(&storage, "u2").await;

        for (user_id, score) in [(u1.id, 1.0), (u2.id, 2.0)] {
            storage
                .create_rating(NewRating {
                    user_id,
                    movie_id: 550,
                    rating: score,
                })
                .await
                .unwrap();
        }

        storage.update_rating(u1.id, 550, 5.0).await.unwrap();

        let other = storage.get_rating(u2.id, 550).await.unwrap().unwrap();
        assert_eq!(other.rating, 2.0);
    }

    #[tokio::test]
    async fn test_remove_rating() {
        let (storage, _temp_dir) = create_test_storage().await;
        let user = create_user(&storage, "u1").await;

        let missing = storage.remove_rating(user.id, 1197306).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        storage
            .create_rating(NewRating {
                user_id: user.id,
                movie_id: 1197306,
                rating: 4.5,
            })
            .await
            .unwrap();

        storage.remove_rating(user.id, 1197306).await.unwrap();
        assert_eq!(storage.get_rating(user.id, 1197306).await.unwrap(), None);

        // Rating again after removal is allowed
        let again = storage
            .create_rating(NewRating {
                user_id: user.id,
                movie_id: 1197306,
                rating: 1.5,
            })
            .await
            .unwrap();
        assert_eq!(again.rating, 1.5);
    }

    #[tokio::test]
    async fn test_remove_user_cascades() {
        let (storage, _temp_dir) = create_test_storage().await;
        let u1 = create_user(&storage, "u1").await;
        let u2 = create_user(&storage, "u2").await;

        for movie_id in [668489, 1197306] {
            storage.toggle_favorite(u1.id, movie_id).await.unwrap();
            storage
                .create_rating(NewRating {
                    user_id: u1.id,
                    movie_id,
                    rating: 4.0,
                })
                .await
                .unwrap();
        }
        storage.toggle_favorite(u2.id, 668489).await.unwrap();

        storage.remove_user(u1.id).await.unwrap();

        let favorites_left = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(u1.id))
            .count(&storage.db)
            .await
            .unwrap();
        let ratings_left = rating::Entity::find()
            .filter(rating::Column::UserId.eq(u1.id))
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(favorites_left, 0);
        assert_eq!(ratings_left, 0);

        // Other users' data is untouched
        assert!(storage.is_favorite(u2.id, 668489).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_converge() {
        let (storage, _temp_dir) = create_test_storage().await;
        let storage = Arc::new(storage);
        let user_id = create_user(&storage, "u1").await.id;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.toggle_favorite(user_id, 777).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // An even number of flips lands back on "not favorite"
        assert!(!storage.is_favorite(user_id, 777).await.unwrap());
        assert_eq!(movie_rows(&storage).await, 1);

        let rows = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_ratings_keep_one_row() {
        let (storage, _temp_dir) = create_test_storage().await;
        let storage = Arc::new(storage);
        let user_id = create_user(&storage, "u1").await.id;

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let storage = storage.clone();
                tokio::spawn(async move {
                    storage
                        .create_rating(NewRating {
                            user_id: user_id,
                            movie_id: 888,
                            rating: (i % 10) as f64 * 0.5,
                        })
                        .await
                })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::BadRequest(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 9);
        assert_eq!(movie_rows(&storage).await, 1);

        let rows = rating::Entity::find()
            .filter(rating::Column::UserId.eq(user_id))
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_keep_one_account() {
        let (storage, _temp_dir) = create_test_storage().await;
        let storage = Arc::new(storage);

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.register(new_user("racer")).await })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::BadRequest(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 5);
        assert_eq!(storage.find_all_users().await.unwrap().len(), 1);
    }
}
