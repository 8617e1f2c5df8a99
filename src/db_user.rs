use anyhow::anyhow;
use bcrypt::{hash, verify, DEFAULT_COST};
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper,
    SqliteConnection,
};

use crate::error::{ApiError, Result};
use crate::model::{NewUserRecord, User};
use crate::schema::users;
use crate::users::RegisterRequest;

/// Salted one-way bcrypt hash; the salt is embedded in the digest.
pub fn hash_password(password: &str) -> Result<String> {
    let digest = hash(password, DEFAULT_COST).map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(digest)
}

/// Looks the user up by nickname and checks the password against the stored
/// digest. An unknown nickname and a wrong password are distinct failures;
/// the login handler collapses them into one response.
pub fn verify_user(conn: &mut SqliteConnection, nickname: &str, password: &str) -> Result<User> {
    let user = users::table
        .filter(users::nickname.eq(nickname))
        .select(User::as_select())
        .first(conn)
        .optional()
        .map_err(|e| anyhow!("{}", e))?
        .ok_or_else(|| ApiError::NotFound("Incorrect nickname".to_string()))?;

    let matches = verify(password, &user.password_hash).map_err(|e| anyhow!("{}", e))?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }
    Ok(user)
}

pub fn register_user(conn: &mut SqliteConnection, new_user: RegisterRequest) -> Result<i32> {
    let nickname_taken = users::table
        .filter(users::nickname.eq(&new_user.nickname))
        .select(User::as_select())
        .first(conn)
        .optional()
        .map_err(|e| anyhow!("{}", e))?;
    if nickname_taken.is_some() {
        return Err(ApiError::Conflict(format!(
            "User {} is already registered.",
            new_user.nickname
        )));
    }

    let email_taken = users::table
        .filter(users::email.eq(&new_user.email))
        .select(User::as_select())
        .first(conn)
        .optional()
        .map_err(|e| anyhow!("{}", e))?;
    if email_taken.is_some() {
        return Err(ApiError::Conflict(format!(
            "User {} is already registered.",
            new_user.email
        )));
    }

    let record = NewUserRecord {
        password_hash: hash_password(&new_user.password)?,
        nickname: new_user.nickname,
        email: new_user.email,
        first_name: new_user.first_name,
        surname: new_user.surname,
        age: new_user.age,
        admin: new_user.admin.unwrap_or(false),
    };

    // The unique constraints on nickname and email catch a concurrent
    // registration that slips past the checks above.
    let user: User = diesel::insert_into(users::table)
        .values(&record)
        .returning(User::as_returning())
        .get_result(conn)?;

    Ok(user.id)
}
