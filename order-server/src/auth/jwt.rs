//! JWT 令牌服务
//!
//! HS256 tokens for staff and customers. Staff tokens carry the tenant ids
//! their [`AuthScope`] is built from.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scope::{Actor, AuthScope, GuardError};

const ISSUER: &str = "order-server";
const DEFAULT_EXPIRATION_MINUTES: i64 = 12 * 60;

/// Principal type carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Staff,
    Customer,
}

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff user id or customer id
    pub sub: String,
    pub kind: PrincipalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<i64>,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("无效令牌: {0}")]
    InvalidToken(String),

    #[error("令牌已过期")]
    ExpiredToken,

    #[error("无效签名")]
    InvalidSignature,

    #[error("令牌生成失败: {0}")]
    GenerationFailed(String),

    #[error("invalid principal: {0}")]
    InvalidPrincipal(#[from] GuardError),
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_minutes: i64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_minutes", &self.expiration_minutes)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
        }
    }

    pub fn with_expiration_minutes(mut self, minutes: i64) -> Self {
        self.expiration_minutes = minutes;
        self
    }

    fn issue(
        &self,
        sub: i64,
        kind: PrincipalKind,
        restaurant_id: Option<i64>,
        branch_id: Option<i64>,
    ) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            kind,
            restaurant_id,
            branch_id,
            exp: (now + Duration::minutes(self.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Issue a staff token. At least one of the tenant ids must be present.
    pub fn issue_staff(
        &self,
        user_id: i64,
        restaurant_id: Option<i64>,
        branch_id: Option<i64>,
    ) -> Result<String, JwtError> {
        AuthScope::from_claims(restaurant_id, branch_id)?;
        self.issue(user_id, PrincipalKind::Staff, restaurant_id, branch_id)
    }

    pub fn issue_customer(&self, customer_id: i64) -> Result<String, JwtError> {
        self.issue(customer_id, PrincipalKind::Customer, None, None)
    }

    /// 验证并解码令牌
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            }
        })?;
        Ok(data.claims)
    }

    /// Validate a token and resolve the acting principal in one step
    pub fn authenticate(&self, token: &str) -> Result<Actor, JwtError> {
        Actor::try_from(self.validate_token(token)?)
    }

    /// 从 Authorization 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
    }
}

impl TryFrom<Claims> for Actor {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id: i64 = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("non-numeric subject '{}'", claims.sub)))?;
        match claims.kind {
            PrincipalKind::Customer => Ok(Actor::customer(id)),
            PrincipalKind::Staff => {
                let scope = AuthScope::from_claims(claims.restaurant_id, claims.branch_id)?;
                Ok(Actor::staff(id, scope))
            }
        }
    }
}
