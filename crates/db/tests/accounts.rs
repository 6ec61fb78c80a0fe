//! Integration tests for user provisioning and soft delete.

use breedid_core::roles::Role;
use breedid_db::models::user::{CreateUser, UpdateUser};
use breedid_db::repositories::{DirectoryRepo, UserRepo};
use sqlx::PgPool;

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        username: "bella".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role: Role::User,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_user_provisions_root_directory(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("root@example.com")).await.unwrap();
    let dir_id = user.directory_id.expect("root directory should be linked");

    let dir = DirectoryRepo::find_owned(&pool, dir_id, user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(dir.parent_id, None);
    assert_eq!(dir.creator_id, user.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_email_is_rejected(pool: PgPool) {
    UserRepo::create(&pool, &new_user("dup@example.com")).await.unwrap();
    let err = UserRepo::create(&pool, &new_user("dup@example.com"))
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.code().as_deref(), Some("23505"));
    assert_eq!(db_err.constraint(), Some("uq_users_email"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_deleted_user_is_hidden(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("gone@example.com")).await.unwrap();

    assert!(UserRepo::soft_delete(&pool, user.id).await.unwrap());
    assert!(!UserRepo::soft_delete(&pool, user.id).await.unwrap());
    assert!(UserRepo::find_by_id(&pool, user.id).await.unwrap().is_none());
    assert!(UserRepo::find_by_email(&pool, "gone@example.com")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_only_touches_given_fields(pool: PgPool) {
    let user = UserRepo::create(&pool, &new_user("upd@example.com")).await.unwrap();
    let updated = UserRepo::update(
        &pool,
        user.id,
        &UpdateUser {
            username: Some("luna".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.username, "luna");
    assert_eq!(updated.password_hash, user.password_hash);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guest_is_created_once_under_concurrency(pool: PgPool) {
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                UserRepo::find_or_create_guest(&pool, "guest@dogbreedid.com", "guest", "x").await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let roots: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM directories WHERE creator_id = $1 AND parent_id IS NULL",
    )
    .bind(ids[0])
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(roots, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_guest_is_marked_and_distinct_from_regular_accounts(pool: PgPool) {
    let regular = UserRepo::create(&pool, &new_user("someone@example.com")).await.unwrap();
    assert!(!regular.is_guest);

    let guest = UserRepo::find_or_create_guest(&pool, "guest@dogbreedid.com", "guest", "x")
        .await
        .unwrap();
    assert!(guest.is_guest);
    assert_ne!(guest.id, regular.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_regular_account_with_guest_email_is_never_the_guest(pool: PgPool) {
    let squatter = UserRepo::create(&pool, &new_user("guest@dogbreedid.com")).await.unwrap();

    let result = UserRepo::find_or_create_guest(&pool, "guest@dogbreedid.com", "guest", "x").await;
    assert!(matches!(result, Err(sqlx::Error::RowNotFound)));

    let still_regular = UserRepo::find_by_id(&pool, squatter.id).await.unwrap().unwrap();
    assert!(!still_regular.is_guest);
}
