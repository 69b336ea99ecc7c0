//! GraphQL authentication and authorization
//!
//! Provides JWT token verification and user context for GraphQL operations.
//!
//! ## Guards
//!
//! Use `AuthGuard` to require authentication on any GraphQL operation:
//!
//! ```ignore
//! #[graphql(guard = "AuthGuard")]
//! async fn protected_query(&self, ctx: &Context<'_>) -> Result<String> { ... }
//! ```

use async_graphql::{Context, ErrorExtensions, Result};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::security::voter::ROLE_ADMIN;

/// User context extracted from JWT, available in GraphQL resolvers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ROLE_ADMIN)
    }
}

/// Claims carried by access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Verify a JWT token and extract user info
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.validate_aud = false;

    let token_data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.trim().as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        async_graphql::Error::new(format!("Invalid token: {}", e))
            .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
    })?;

    let claims = token_data.claims;
    let user_id = claims.sub.parse::<i64>().map_err(|_| {
        async_graphql::Error::new("Invalid token subject")
            .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
    })?;

    tracing::debug!(user_id, "JWT verified");

    Ok(AuthUser {
        user_id,
        username: Some(claims.username),
        email: claims.email,
        role: Some(claims.role),
    })
}

/// Extension trait to get authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or return an error if not authenticated
    fn auth_user(&self) -> Result<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>().ok_or_else(|| {
            async_graphql::Error::new("Authentication required")
                .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
        })
    }
}

/// Only the user themself or an administrator may read a user's private data
pub fn protect_current_user_data(ctx: &Context<'_>, user_id: i64) -> Result<()> {
    let auth = ctx.auth_user()?;
    if auth.user_id == user_id || auth.is_admin() {
        return Ok(());
    }

    tracing::warn!(caller = auth.user_id, user_id, "Denied access to another user's data");
    Err(async_graphql::Error::new("Not allowed to read this user's data")
        .extend_with(|_, e| e.set("code", "FORBIDDEN")))
}

/// Guard that requires authentication for GraphQL operations.
///
/// Use with `#[graphql(guard = "AuthGuard")]` on queries or mutations.
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.auth_user().map(|_| ());
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};

    use super::*;

    fn token(sub: &str, secret: &str, exp_offset: i64) -> String {
        token_with_role(sub, secret, exp_offset, "ROLE_STUDENT")
    }

    fn token_with_role(sub: &str, secret: &str, exp_offset: i64, role: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: sub.to_string(),
            username: "ana".to_string(),
            role: role.to_string(),
            email: Some("ana@example.com".to_string()),
            exp: now + exp_offset,
            iat: now,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_verify_token_round_trip() {
        let user = verify_token(&token("42", "s3cret", 3600), "s3cret").unwrap();
        assert_eq!(user.user_id, 42);
        assert_eq!(user.username.as_deref(), Some("ana"));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_verify_token_rejects_bad_input() {
        assert!(verify_token(&token("42", "other", 3600), "s3cret").is_err());
        assert!(verify_token(&token("42", "s3cret", -3600), "s3cret").is_err());
        assert!(verify_token(&token("not-a-number", "s3cret", 3600), "s3cret").is_err());
    }

    #[test]
    fn test_admin_role_is_shared_with_the_voter() {
        use crate::db::UserRecord;
        use crate::security::ResourceNodeVoter;
        use crate::security::voter::EDIT;

        let user = verify_token(&token_with_role("1", "s3cret", 3600, ROLE_ADMIN), "s3cret").unwrap();
        assert!(user.is_admin());

        let role = user.role.unwrap();
        assert!(ResourceNodeVoter::is_granted(&[role.as_str()], &[], EDIT));

        let record = UserRecord {
            id: 1,
            username: "admin".into(),
            firstname: String::new(),
            lastname: String::new(),
            email: None,
            role,
            active: true,
            created_at: chrono::Utc::now(),
        };
        assert!(record.is_admin());
    }
}
