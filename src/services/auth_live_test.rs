//! Sign-up, sign-in, and demo gate tests against a live database
//! (`--features live-db-tests`).

use super::*;
use crate::services::demo::{self, DEMO_ACCOUNTS, DEMO_PASSWORD};
use crate::services::live_support::{pool, unique_email};

const PASSWORD: &str = "correct horse battery";

#[tokio::test]
async fn sign_up_then_sign_in_with_real_credentials() {
    let pool = pool().await;
    let email = unique_email("signup");

    let user_id = sign_up(&pool, true, &email.to_uppercase(), PASSWORD, "  New Person ").await.unwrap();
    let profile = load_profile(&pool, user_id).await.unwrap().expect("profile created with account");
    assert_eq!(profile.email, email);
    assert_eq!(profile.full_name, "New Person");
    assert_eq!(profile.role, Role::ClientTeam);
    assert_eq!(profile.client_id, None);

    let signed_in = sign_in(&pool, &email, PASSWORD, false).await.unwrap();
    assert_eq!(signed_in, SignIn { user_id, demo: false });
    assert!(matches!(
        sign_in(&pool, &email, "wrong password", false).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn sign_up_rejects_taken_email_without_leaving_rows() {
    let pool = pool().await;
    let email = unique_email("taken");
    sign_up(&pool, true, &email, PASSWORD, "First").await.unwrap();

    assert!(matches!(sign_up(&pool, true, &email, PASSWORD, "Second").await, Err(AuthError::EmailTaken)));
    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM auth_users WHERE email = $1")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn sign_up_checks_flag_and_password_before_writing() {
    let pool = pool().await;
    let email = unique_email("gated");
    assert!(matches!(sign_up(&pool, false, &email, PASSWORD, "").await, Err(AuthError::SignupDisabled)));
    assert!(matches!(sign_up(&pool, true, &email, "short", "").await, Err(AuthError::WeakPassword)));
    assert!(matches!(sign_in(&pool, &email, PASSWORD, false).await, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn seeded_demo_accounts_only_sign_in_through_the_demo_gate() {
    let pool = pool().await;
    let account = &DEMO_ACCOUNTS[0];

    demo::seed(&pool).await.unwrap();
    // A real hash left behind by an older seed must be reset.
    sqlx::query("UPDATE auth_users SET password_hash = $2 WHERE id = $1")
        .bind(account.user_id)
        .bind(hash_password(DEMO_PASSWORD).unwrap())
        .execute(&pool)
        .await
        .unwrap();
    demo::seed(&pool).await.unwrap();

    assert!(matches!(
        sign_in(&pool, account.email, DEMO_PASSWORD, false).await,
        Err(AuthError::InvalidCredentials)
    ));

    let signed_in = sign_in(&pool, account.email, DEMO_PASSWORD, true).await.unwrap();
    assert_eq!(signed_in, SignIn { user_id: account.user_id, demo: true });
    let profile = load_profile(&pool, signed_in.user_id).await.unwrap().expect("demo profile seeded");
    assert_eq!(profile.role, Role::SuperAdmin);
}
