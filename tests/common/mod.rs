//! Shared fixtures for the GraphQL integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_graphql::{Request, Response};
use serde_json::Value;

use campus::config::Config;
use campus::db::users::ROLE_ADMIN;
use campus::db::{CreateUser, Database, UserRecord};
use campus::graphql::{AuthUser, CampusSchema, build_schema};

pub const ACCESS_URL_ID: i64 = 1;

pub struct TestApp {
    pub db: Database,
    pub schema: CampusSchema,
}

pub fn test_config() -> Config {
    Config {
        host: None,
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        jwt_secret: "test-secret".to_string(),
        access_url_id: ACCESS_URL_ID,
    }
}

pub async fn setup() -> TestApp {
    let db = Database::connect_in_memory().await.expect("in-memory database");
    let schema = build_schema(db.clone(), Arc::new(test_config()));
    TestApp { db, schema }
}

pub fn auth(user: &UserRecord) -> AuthUser {
    AuthUser {
        user_id: user.id,
        username: Some(user.username.clone()),
        email: user.email.clone(),
        role: Some(user.role.clone()),
    }
}

pub async fn create_user(db: &Database, username: &str, firstname: &str, lastname: &str) -> UserRecord {
    db.users()
        .create(CreateUser {
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            email: Some(format!("{username}@example.com")),
            ..CreateUser::student(username)
        })
        .await
        .expect("create user")
}

pub async fn create_admin(db: &Database) -> UserRecord {
    db.users()
        .create(CreateUser {
            role: ROLE_ADMIN.to_string(),
            ..CreateUser::student("admin")
        })
        .await
        .expect("create admin")
}

/// Execute a GraphQL document, optionally as an authenticated user
pub async fn execute(app: &TestApp, query: &str, user: Option<AuthUser>) -> Response {
    let mut request = Request::new(query);
    if let Some(user) = user {
        request = request.data(user);
    }
    app.schema.execute(request).await
}

/// Response data as JSON, panicking on GraphQL errors
pub fn data(response: Response) -> Value {
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().expect("json data")
}

/// `code` extension of the first error
pub fn error_code(response: &Response) -> Option<String> {
    let json = serde_json::to_value(response).ok()?;
    json["errors"][0]["extensions"]["code"].as_str().map(str::to_string)
}
