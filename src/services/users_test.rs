//! Account administration and profile guard tests against a live database
//! (`--features live-db-tests`).

use super::*;
use crate::services::live_support::{TEST_PASSWORD, admin, pool, seed_client, seed_user, unique_email};

fn team_member(client_id: Uuid) -> NewUser {
    NewUser {
        email: unique_email("team"),
        password: TEST_PASSWORD.into(),
        full_name: "Team Member".into(),
        role: Role::ClientTeam,
        client_id: Some(client_id),
    }
}

async fn credential_exists(pool: &PgPool, id: Uuid) -> bool {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM auth_users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// role guard trigger
// =============================================================================

#[tokio::test]
async fn guard_trigger_blocks_self_promotion_in_sql() {
    let pool = pool().await;
    let client_id = seed_client(&pool).await;
    let member = seed_user(&pool, Role::ClientTeam, Some(client_id)).await;

    let mut tx = db::begin_scoped(&pool, &member).await.unwrap();
    let err = sqlx::query("UPDATE user_profiles SET role = 'Super Admin' WHERE id = $1")
        .bind(member.user_id)
        .execute(&mut *tx)
        .await
        .unwrap_err();
    assert!(matches!(StoreError::from(err), StoreError::Forbidden(_)));
    tx.rollback().await.unwrap();

    let profile = get_profile(&pool, &admin(), member.user_id).await.unwrap();
    assert_eq!(profile.role, Role::ClientTeam);
}

#[tokio::test]
async fn guard_trigger_blocks_moving_oneself_to_another_client() {
    let pool = pool().await;
    let mine = seed_client(&pool).await;
    let theirs = seed_client(&pool).await;
    let member = seed_user(&pool, Role::ClientAdmin, Some(mine)).await;

    let mut tx = db::begin_scoped(&pool, &member).await.unwrap();
    let err = sqlx::query("UPDATE user_profiles SET client_id = $2 WHERE id = $1")
        .bind(member.user_id)
        .bind(theirs)
        .execute(&mut *tx)
        .await
        .unwrap_err();
    assert!(matches!(StoreError::from(err), StoreError::Forbidden(_)));
}

#[tokio::test]
async fn owners_edit_their_own_name_but_not_their_role() {
    let pool = pool().await;
    let client_id = seed_client(&pool).await;
    let member = seed_user(&pool, Role::ClientTeam, Some(client_id)).await;

    let rename = ProfilePatch { full_name: Some("  Renamed  ".into()), ..ProfilePatch::default() };
    let updated = update_profile(&pool, &member, member.user_id, &rename).await.unwrap();
    assert_eq!(updated.full_name, "Renamed");

    let promote = ProfilePatch { role: Some(Role::SuperAdmin), ..ProfilePatch::default() };
    assert!(matches!(
        update_profile(&pool, &member, member.user_id, &promote).await,
        Err(StoreError::Forbidden(_))
    ));
}

#[tokio::test]
async fn promoting_to_staff_clears_client() {
    let pool = pool().await;
    let client_id = seed_client(&pool).await;
    let member = seed_user(&pool, Role::ClientAdmin, Some(client_id)).await;

    let promote = ProfilePatch { role: Some(Role::Team), ..ProfilePatch::default() };
    let updated = update_profile(&pool, &admin(), member.user_id, &promote).await.unwrap();
    assert_eq!(updated.role, Role::Team);
    assert_eq!(updated.client_id, None);
}

// =============================================================================
// client admin account management
// =============================================================================

#[tokio::test]
async fn client_admin_adds_and_removes_own_team_members() {
    let pool = pool().await;
    let client_id = seed_client(&pool).await;
    let client_admin = seed_user(&pool, Role::ClientAdmin, Some(client_id)).await;

    let created = create_user(&pool, &client_admin, &team_member(client_id)).await.unwrap();
    assert_eq!(created.role, Role::ClientTeam);
    assert_eq!(created.client_id, Some(client_id));

    delete_user(&pool, &client_admin, created.id).await.unwrap();
    assert!(matches!(get_profile(&pool, &admin(), created.id).await, Err(StoreError::NotFound(..))));
    assert!(!credential_exists(&pool, created.id).await);
}

#[tokio::test]
async fn client_admin_cannot_add_members_to_another_client() {
    let pool = pool().await;
    let mine = seed_client(&pool).await;
    let theirs = seed_client(&pool).await;
    let client_admin = seed_user(&pool, Role::ClientAdmin, Some(mine)).await;

    assert!(matches!(
        create_user(&pool, &client_admin, &team_member(theirs)).await,
        Err(StoreError::Forbidden(_))
    ));

    let mut peer = team_member(mine);
    peer.role = Role::ClientAdmin;
    assert!(matches!(create_user(&pool, &client_admin, &peer).await, Err(StoreError::Forbidden(_))));
}

#[tokio::test]
async fn insert_policy_rejects_profiles_for_another_client() {
    let pool = pool().await;
    let mine = seed_client(&pool).await;
    let theirs = seed_client(&pool).await;
    let client_admin = seed_user(&pool, Role::ClientAdmin, Some(mine)).await;

    let mut tx = db::begin_scoped(&pool, &client_admin).await.unwrap();
    let (user_id, email) = auth::insert_auth_user(&mut tx, &unique_email("raw"), TEST_PASSWORD).await.unwrap();
    let err = sqlx::query("INSERT INTO user_profiles (id, email, full_name, role, client_id) VALUES ($1, $2, 'Raw', 'Client Team', $3)")
        .bind(user_id)
        .bind(&email)
        .bind(theirs)
        .execute(&mut *tx)
        .await
        .unwrap_err();
    assert!(matches!(StoreError::from(err), StoreError::Forbidden(_)));
}

#[tokio::test]
async fn client_admin_cannot_remove_other_clients_members() {
    let pool = pool().await;
    let mine = seed_client(&pool).await;
    let theirs = seed_client(&pool).await;
    let client_admin = seed_user(&pool, Role::ClientAdmin, Some(mine)).await;
    let outsider = seed_user(&pool, Role::ClientTeam, Some(theirs)).await;

    assert!(matches!(
        delete_user(&pool, &client_admin, outsider.user_id).await,
        Err(StoreError::NotFound(..) | StoreError::Forbidden(_))
    ));
    assert!(get_profile(&pool, &admin(), outsider.user_id).await.is_ok());
    assert!(credential_exists(&pool, outsider.user_id).await);
}

#[tokio::test]
async fn client_admin_cannot_remove_a_fellow_admin() {
    let pool = pool().await;
    let client_id = seed_client(&pool).await;
    let client_admin = seed_user(&pool, Role::ClientAdmin, Some(client_id)).await;
    let fellow = seed_user(&pool, Role::ClientAdmin, Some(client_id)).await;

    assert!(matches!(
        delete_user(&pool, &client_admin, fellow.user_id).await,
        Err(StoreError::Forbidden(_))
    ));
}

#[tokio::test]
async fn duplicate_email_is_invalid() {
    let pool = pool().await;
    let client_id = seed_client(&pool).await;
    let input = team_member(client_id);
    create_user(&pool, &admin(), &input).await.unwrap();

    let mut again = input.clone();
    again.email = input.email.to_uppercase();
    assert!(matches!(create_user(&pool, &admin(), &again).await, Err(StoreError::Invalid(_))));
}
