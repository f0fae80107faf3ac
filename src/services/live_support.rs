//! Fixtures shared by the `live-db-tests` suites. They require
//! `TEST_DATABASE_URL` pointing at a disposable Postgres database.

use sqlx::PgPool;
use uuid::Uuid;

use super::{clients, users};
use crate::access::Caller;
use crate::db;
use crate::models::{ClientStatus, NewClient, NewUser, Role};

pub const TEST_PASSWORD: &str = "live-test-password";

pub async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for live-db-tests");
    db::init_pool(&url, 2).await.expect("connect test database")
}

/// A Super Admin scope with no backing profile.
pub fn admin() -> Caller {
    Caller::new(Uuid::new_v4(), Role::SuperAdmin, None)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@sentra.test", Uuid::new_v4().simple())
}

pub async fn seed_client(pool: &PgPool) -> Uuid {
    let input = NewClient {
        business_name: format!("Live Co {}", Uuid::new_v4()),
        status: Some(ClientStatus::Active),
        ..NewClient::default()
    };
    clients::create_client(pool, &admin(), &input).await.expect("create client").id
}

/// Create a real account and return the scope it signs in with.
pub async fn seed_user(pool: &PgPool, role: Role, client_id: Option<Uuid>) -> Caller {
    let input = NewUser {
        email: unique_email("user"),
        password: TEST_PASSWORD.into(),
        full_name: format!("{role} user"),
        role,
        client_id,
    };
    let profile = users::create_user(pool, &admin(), &input).await.expect("create user");
    Caller::new(profile.id, profile.role, profile.client_id)
}
