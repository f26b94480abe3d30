use accounts_api::auth::responses::Role;
use accounts_api::auth::routes::login;
use accounts_api::routes::users::{
    UserListResponse, activate_user, change_password, current_user, deactivate_user, list_users,
    update_profile,
};
use accounts_api::test_support::{TestDatabase, TestFixtures, TestRocketBuilder, test_auth_state};
use rocket::http::{ContentType, Header, Status};
use rocket::routes;
use serde_json::{Value, json};

fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

#[tokio::test]
async fn admin_listing_is_paginated_and_role_gated() {
    let test_db = TestDatabase::new()
        .await
        .expect("failed to provision test database");
    let pool = test_db.pool_clone();
    let state = test_auth_state();
    let fixtures = TestFixtures::new(test_db.pool());

    let hash = state
        .password_service
        .hash_password("password123")
        .expect("hash");

    let admin_id = fixtures
        .insert_user("Root", "root@test.com", "admin", "active", &hash)
        .await
        .expect("insert admin");
    let mut member_ids = Vec::new();
    for n in 0..12 {
        let id = fixtures
            .insert_user(
                &format!("Member {n}"),
                &format!("member{n}@test.com"),
                "user",
                "active",
                &hash,
            )
            .await
            .expect("insert member");
        member_ids.push(id);
    }

    let admin_token = state
        .jwt_service
        .issue_token(admin_id, Role::Admin, 0)
        .expect("issue admin token")
        .token;
    let member_token = state
        .jwt_service
        .issue_token(member_ids[0], Role::User, 0)
        .expect("issue member token")
        .token;

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool)
        .manage_auth_state(state)
        .mount_api_routes(routes![list_users])
        .async_client()
        .await;

    // A non-admin is refused outright.
    let response = client
        .get("/api/users")
        .header(bearer(&member_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    // 13 accounts at 10 per page -> two pages.
    let response = client
        .get("/api/users?page=2&limit=10")
        .header(bearer(&admin_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let listing: UserListResponse = response.into_json().await.expect("listing deserializes");
    assert_eq!(listing.page, 2);
    assert_eq!(listing.limit, 10);
    assert_eq!(listing.total_users, 13);
    assert_eq!(listing.total_pages, 2);
    assert_eq!(listing.users.len(), 3);

    // Oversized limits collapse to the cap instead of erroring.
    let response = client
        .get("/api/users?limit=1000")
        .header(bearer(&admin_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let listing: UserListResponse = response.into_json().await.expect("listing deserializes");
    assert_eq!(listing.limit, 100);
    assert_eq!(listing.users.len(), 13);
}

#[tokio::test]
async fn deactivation_takes_effect_on_the_next_request() {
    let test_db = TestDatabase::new()
        .await
        .expect("failed to provision test database");
    let pool = test_db.pool_clone();
    let state = test_auth_state();
    let fixtures = TestFixtures::new(test_db.pool());

    let hash = state
        .password_service
        .hash_password("password123")
        .expect("hash");
    let admin_id = fixtures
        .insert_user("Root", "root@test.com", "admin", "active", &hash)
        .await
        .expect("insert admin");
    let member_id = fixtures
        .insert_user("Member", "member@test.com", "user", "active", &hash)
        .await
        .expect("insert member");

    let admin_token = state
        .jwt_service
        .issue_token(admin_id, Role::Admin, 0)
        .expect("issue")
        .token;
    let member_token = state
        .jwt_service
        .issue_token(member_id, Role::User, 0)
        .expect("issue")
        .token;

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool)
        .manage_auth_state(state)
        .mount_api_routes(routes![current_user, activate_user, deactivate_user, login])
        .async_client()
        .await;

    // The member's token works before the toggle.
    let response = client
        .get("/api/users/me")
        .header(bearer(&member_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .patch(format!("/api/users/{member_id}/deactivate"))
        .header(bearer(&admin_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // Same still-unexpired token, next request: refused. Status is read from
    // the store per request, not from the token.
    let response = client
        .get("/api/users/me")
        .header(bearer(&member_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    // Logging in again does not bypass the flag either.
    let response = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(json!({"email": "member@test.com", "password": "password123"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    // Re-activation restores admission for the original token.
    let response = client
        .patch(format!("/api/users/{member_id}/activate"))
        .header(bearer(&admin_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .get("/api/users/me")
        .header(bearer(&member_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // Unknown targets are 404s.
    let response = client
        .patch("/api/users/999999/deactivate")
        .header(bearer(&admin_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[tokio::test]
async fn admin_accounts_cannot_be_deactivated() {
    let test_db = TestDatabase::new()
        .await
        .expect("failed to provision test database");
    let pool = test_db.pool_clone();
    let state = test_auth_state();
    let fixtures = TestFixtures::new(test_db.pool());

    let hash = state
        .password_service
        .hash_password("password123")
        .expect("hash");
    let first_admin = fixtures
        .insert_user("Root", "root@test.com", "admin", "active", &hash)
        .await
        .expect("insert admin");
    let second_admin = fixtures
        .insert_user("Backup Root", "backup@test.com", "admin", "active", &hash)
        .await
        .expect("insert admin");

    let token = state
        .jwt_service
        .issue_token(first_admin, Role::Admin, 0)
        .expect("issue")
        .token;

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_auth_state(state)
        .mount_api_routes(routes![activate_user, deactivate_user])
        .async_client()
        .await;

    let response = client
        .patch(format!("/api/users/{second_admin}/deactivate"))
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let status: String = sqlx::query_scalar("SELECT status FROM users WHERE id = $1")
        .bind(second_admin)
        .fetch_one(&pool)
        .await
        .expect("status lookup");
    assert_eq!(status, "active");

    // Activating an admin remains allowed.
    let response = client
        .patch(format!("/api/users/{second_admin}/activate"))
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}

#[tokio::test]
async fn password_change_verifies_old_and_revokes_outstanding_tokens() {
    let test_db = TestDatabase::new()
        .await
        .expect("failed to provision test database");
    let pool = test_db.pool_clone();
    let state = test_auth_state();
    let fixtures = TestFixtures::new(test_db.pool());

    let hash = state
        .password_service
        .hash_password("old-password")
        .expect("hash");
    let member_id = fixtures
        .insert_user("Member", "member@test.com", "user", "active", &hash)
        .await
        .expect("insert member");

    let token = state
        .jwt_service
        .issue_token(member_id, Role::User, 0)
        .expect("issue")
        .token;

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool)
        .manage_auth_state(state)
        .mount_api_routes(routes![current_user, change_password, login])
        .async_client()
        .await;

    // Too-short replacement is rejected before any credential check.
    let response = client
        .put("/api/users/me/password")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({"oldPassword": "old-password", "newPassword": "short"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    // A wrong old password leaves the stored hash untouched.
    let response = client
        .put("/api/users/me/password")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({"oldPassword": "not-the-password", "newPassword": "new-password-1"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(json!({"email": "member@test.com", "password": "old-password"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok, "old password still valid");

    // Correct old password replaces the hash.
    let response = client
        .put("/api/users/me/password")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({"oldPassword": "old-password", "newPassword": "new-password-1"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    // The pre-change token carries a stale version and is now refused.
    let response = client
        .get("/api/users/me")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    // Old credentials are dead; the new ones log in and yield a live token.
    let response = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(json!({"email": "member@test.com", "password": "old-password"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .post("/api/auth/login")
        .header(ContentType::JSON)
        .body(json!({"email": "member@test.com", "password": "new-password-1"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let payload: Value = response.into_json().await.expect("login payload");
    let fresh_token = payload["token"].as_str().expect("token string");

    let response = client
        .get("/api/users/me")
        .header(bearer(fresh_token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}

#[tokio::test]
async fn profile_update_enforces_email_uniqueness() {
    let test_db = TestDatabase::new()
        .await
        .expect("failed to provision test database");
    let pool = test_db.pool_clone();
    let state = test_auth_state();
    let fixtures = TestFixtures::new(test_db.pool());

    let hash = state
        .password_service
        .hash_password("password123")
        .expect("hash");
    let first = fixtures
        .insert_user("First", "first@test.com", "user", "active", &hash)
        .await
        .expect("insert");
    fixtures
        .insert_user("Second", "second@test.com", "user", "active", &hash)
        .await
        .expect("insert");

    let token = state
        .jwt_service
        .issue_token(first, Role::User, 0)
        .expect("issue")
        .token;

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool)
        .manage_auth_state(state)
        .mount_api_routes(routes![current_user, update_profile])
        .async_client()
        .await;

    // Claiming another account's address is a conflict, case-insensitively.
    let response = client
        .put("/api/users/me")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({"fullName": "First", "email": "SECOND@test.com"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    // Keeping your own address while renaming is fine.
    let response = client
        .put("/api/users/me")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({"fullName": "First Renamed", "email": "first@test.com"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body: Value = response.into_json().await.expect("update payload");
    assert_eq!(body["user"]["fullName"], "First Renamed");

    // A fresh address is applied and visible on the next /me.
    let response = client
        .put("/api/users/me")
        .header(bearer(&token))
        .header(ContentType::JSON)
        .body(json!({"fullName": "First Renamed", "email": "renamed@test.com"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .get("/api/users/me")
        .header(bearer(&token))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let me: Value = response.into_json().await.expect("me payload");
    assert_eq!(me["email"], "renamed@test.com");
}
