use std::env;
use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use anyhow::anyhow;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::User;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub exp: i64,
    pub iss: String,
    pub sub: String,
    pub user_id: i32,
    pub roles: Vec<String>,
}

pub fn generate_token(user: &User) -> anyhow::Result<(String, i64)> {
    let header = Header::new(Algorithm::HS256);
    let access_duration = env::var("ACCESS_TOKEN_EXP_SEC")
        .expect("ACCESS_TOKEN_EXP_SEC must be set.")
        .parse()
        .expect("ACCESS_TOKEN_EXP_SEC must be a number.");
    let duration = chrono::Duration::seconds(access_duration);
    let expiration = chrono::Utc::now() + duration;

    let mut roles = vec!["USER".to_string()];
    if user.admin {
        roles.push("ADMIN".to_string());
    }
    let claims = TokenClaims {
        sub: "FilmLibraryClient".to_string(),
        iss: "FilmLibraryBackend".to_string(),
        exp: expiration.timestamp(),
        user_id: user.id,
        roles,
    };
    let access_token = encode(
        &header,
        &claims,
        &EncodingKey::from_secret(get_secret().as_ref()),
    )
    .map_err(|e| anyhow!("{}", e))?;

    let expires_in = expiration.timestamp() - chrono::Utc::now().timestamp();

    Ok((access_token, expires_in))
}

pub fn get_claims_and_validate(token: &str) -> anyhow::Result<TokenClaims> {
    let secret_key = get_secret();
    let token = token.replace("Bearer ", "");
    let claims = decode::<TokenClaims>(
        &token,
        &DecodingKey::from_secret(secret_key.as_ref()),
        &Validation::default(),
    )?;
    Ok(claims.claims)
}

/// The caller identity attached to a request, recovered from its bearer
/// token. Extraction fails with 401 when the header is missing or the token
/// does not validate.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub admin: bool,
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let bearer = BearerAuth::from_request(req, payload).into_inner();
        ready(match bearer {
            Ok(credentials) => from_token(credentials.token()).map_err(actix_web::Error::from),
            Err(_) => Err(ApiError::Unauthorized.into()),
        })
    }
}

fn from_token(token: &str) -> Result<AuthenticatedUser, ApiError> {
    let claims = get_claims_and_validate(token).map_err(|_| ApiError::Unauthorized)?;
    Ok(AuthenticatedUser {
        user_id: claims.user_id,
        admin: claims
            .roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case("ADMIN")),
    })
}

fn get_secret() -> String {
    env::var("SECRET").expect("SECRET must be set")
}
