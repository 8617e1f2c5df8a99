use actix_web::{post, web, HttpResponse};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ApiError, Result};
use crate::{auth, db_user, DbPool};

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub nickname: String,
    pub password: String,
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub age: Option<i32>,
    pub admin: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[post("/register")]
pub async fn register_user(
    pool: web::Data<DbPool>,
    new_user: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let new_user = new_user.into_inner();
    if new_user.nickname.chars().count() < 5 {
        return Err(ApiError::InvalidArgument(format!(
            "Nickname {} is too small.",
            new_user.nickname
        )));
    }
    if new_user.password.chars().count() < 7 {
        return Err(ApiError::InvalidArgument(
            "Password is too small.".to_string(),
        ));
    }

    let user_id = web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        db_user::register_user(&mut conn, new_user)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({
        "users": { "id": user_id, "message": "Successfully register" }
    })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub nickname: String,
    pub password: String,
}

#[post("/login")]
pub async fn login(
    pool: web::Data<DbPool>,
    login_request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let LoginRequest { nickname, password } = login_request.into_inner();

    let user = web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        db_user::verify_user(&mut conn, &nickname, &password)
    })
    .await?
    .map_err(|e| match e {
        // An unknown nickname and a wrong password look the same to the
        // client; only the store distinguishes them.
        ApiError::NotFound(_) | ApiError::InvalidCredentials => ApiError::InvalidCredentials,
        e => e,
    })?;

    let (access_token, expires_in) = auth::generate_token(&user)?;
    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        expires_in,
    }))
}
