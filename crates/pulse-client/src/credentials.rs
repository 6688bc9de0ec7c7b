//! Credentials provider seam
//!
//! The original client read its bearer token out of ambient browser
//! storage. Here the token source is injected at construction so tests and
//! embedders can substitute their own without global state.

use async_trait::async_trait;

/// Source of the bearer token attached to backend requests.
///
/// Returning `None` is valid: anonymous endpoints tolerate the missing
/// `Authorization` header.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, e.g. one obtained out of band from the login flow.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialsProvider for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// No credentials; every request goes out unauthenticated.
pub struct Anonymous;

#[async_trait]
impl CredentialsProvider for Anonymous {
    async fn bearer_token(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("abc123");
        assert_eq!(provider.bearer_token().await.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_anonymous() {
        assert!(Anonymous.bearer_token().await.is_none());
    }
}
