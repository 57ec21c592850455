use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 外部认证服务签发的访问令牌声明
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // auth user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// 校验通过后放入请求扩展中的调用者身份
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    audience: Option<String>,
}

impl JwtService {
    pub fn new(secret: &str, audience: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience,
        }
    }

    /// 签发令牌，仅用于本地调试与测试；线上令牌由认证服务签发
    pub fn issue_token(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        expires_in: i64,
    ) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            aud: self.audience.clone(),
            exp: (now + Duration::seconds(expires_in)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::AuthError("Invalid subject in access token".to_string()))?;
        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_authenticate() {
        let svc = JwtService::new("test-secret", Some("authenticated".into()));
        let user_id = Uuid::new_v4();
        let token = svc.issue_token(user_id, Some("a@gym.test"), 60).unwrap();

        let user = svc.authenticate(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email.as_deref(), Some("a@gym.test"));
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired() {
        let svc = JwtService::new("test-secret", None);
        let other = JwtService::new("other-secret", None);
        let token = other.issue_token(Uuid::new_v4(), None, 60).unwrap();
        assert!(svc.authenticate(&token).is_err());

        let expired = svc.issue_token(Uuid::new_v4(), None, -3600).unwrap();
        assert!(svc.authenticate(&expired).is_err());
    }
}
