use actix_web::{delete, get, post, put, web, HttpResponse};
use anyhow::anyhow;
use diesel::SqliteConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, Result};
use crate::model::{FilmChanges, NewFilmRecord};
use crate::search::{SearchParams, SearchQuery};
use crate::{db_film, search, DbPool};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Only the film's creator or an admin may change or delete it.
fn authorize_film_access(
    conn: &mut SqliteConnection,
    user: &AuthenticatedUser,
    film_id: i32,
) -> Result<()> {
    let creator = db_film::film_creator(conn, film_id)?;
    if creator != user.user_id && !user.admin {
        return Err(ApiError::Forbidden(format!(
            "You can modify the films created by you only, id: {}",
            user.user_id
        )));
    }
    Ok(())
}

#[get("/films")]
pub async fn search_films(
    pool: web::Data<DbPool>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let params = SearchParams::from_query(query.into_inner())?;

    let films = web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        search::search_films(&mut conn, &params)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({ "films": films })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFilmRequest {
    pub film_name: String,
    pub description: Option<String>,
    pub release_date: String,
    pub poster_link: Option<String>,
    pub genre_names: Option<Vec<String>>,
    pub director_names: Option<Vec<String>>,
}

#[post("/films")]
pub async fn create_film(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
    body: web::Json<CreateFilmRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let record = NewFilmRecord {
        user_id: user.user_id,
        film_name: body.film_name,
        description: body.description,
        release_date: db_film::parse_date(&body.release_date)?,
        poster_link: body.poster_link,
    };
    let genre_names = body.genre_names.unwrap_or_default();
    let director_names = body.director_names.unwrap_or_default();

    let film = web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        db_film::insert_film(&mut conn, record, &genre_names, &director_names)
    })
    .await??;

    Ok(HttpResponse::Created().json(json!({ "films": film })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditFilmRequest {
    pub film_id: i32,
    pub film_name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub poster_link: Option<String>,
    pub genre_names: Option<Vec<String>>,
    pub director_names: Option<Vec<String>>,
}

#[put("/films")]
pub async fn edit_film(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
    body: web::Json<EditFilmRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let release_date = match non_empty(body.release_date) {
        Some(raw) => Some(db_film::parse_date(&raw)?),
        None => None,
    };
    let changes = FilmChanges {
        film_name: non_empty(body.film_name),
        description: non_empty(body.description),
        release_date,
        poster_link: non_empty(body.poster_link),
    };
    let film_id = body.film_id;
    let genre_names = body.genre_names.unwrap_or_default();
    let director_names = body.director_names.unwrap_or_default();

    let film = web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        authorize_film_access(&mut conn, &user, film_id)?;
        db_film::edit_film(&mut conn, film_id, changes, &genre_names, &director_names)
    })
    .await??;

    Ok(HttpResponse::Created().json(json!({ "films": film })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteFilmRequest {
    pub id: i32,
}

#[delete("/films")]
pub async fn delete_film(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
    body: web::Json<DeleteFilmRequest>,
) -> Result<HttpResponse> {
    let film_id = body.id;

    web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        authorize_film_access(&mut conn, &user, film_id)?;
        db_film::delete_film(&mut conn, film_id)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({
        "deletes": { "message": "Successfully deleted" }
    })))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteDirectorRequest {
    pub director_name: String,
}

#[delete("/directors")]
pub async fn delete_director(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
    body: web::Json<DeleteDirectorRequest>,
) -> Result<HttpResponse> {
    if !user.admin {
        return Err(ApiError::Forbidden(
            "You can't modify directors".to_string(),
        ));
    }
    let name = body.into_inner().director_name;

    web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        db_film::delete_director(&mut conn, &name)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({
        "deletes": { "message": "Successfully deleted" }
    })))
}

#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub film_id: i32,
    pub user_rate: i32,
}

#[get("/film/rate")]
pub async fn rate_film(
    pool: web::Data<DbPool>,
    query: web::Query<RateQuery>,
) -> Result<HttpResponse> {
    let RateQuery { film_id, user_rate } = query.into_inner();
    if !(1..=5).contains(&user_rate) {
        return Err(ApiError::InvalidArgument("Wrong rate value".to_string()));
    }

    let film = web::block(move || {
        let mut conn = pool
            .get()
            .map_err(|_| anyhow!("Couldn't get db connection from pool."))?;
        db_film::rate_film(&mut conn, film_id, user_rate)
    })
    .await??;

    Ok(HttpResponse::Ok().json(json!({ "films": film })))
}
