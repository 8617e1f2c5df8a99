use chrono::NaiveDate;
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

use crate::schema::*;

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub nickname: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub age: Option<i32>,
    pub admin: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewUserRecord {
    pub nickname: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub age: Option<i32>,
    pub admin: bool,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = films)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Film {
    pub id: i32,
    pub user_id: i32,
    pub film_name: String,
    pub description: Option<String>,
    pub rating: f64,
    pub number_of_rated_users: i32,
    pub release_date: NaiveDate,
    pub poster_link: Option<String>,
}

/// Rating and vote count are left to their column defaults on insert.
#[derive(Debug, Insertable)]
#[diesel(table_name = films)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewFilmRecord {
    pub user_id: i32,
    pub film_name: String,
    pub description: Option<String>,
    pub release_date: NaiveDate,
    pub poster_link: Option<String>,
}

/// Partial update for a film row. `None` fields are left untouched.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = films)]
pub struct FilmChanges {
    pub film_name: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub poster_link: Option<String>,
}

impl FilmChanges {
    pub fn is_empty(&self) -> bool {
        self.film_name.is_none()
            && self.description.is_none()
            && self.release_date.is_none()
            && self.poster_link.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = directors)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Director {
    pub id: i32,
    pub director_name: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = genres)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Genre {
    pub id: i32,
    pub genre_name: String,
}

/// Display format used for release dates on the wire.
pub const DATE_DISPLAY_FORMAT: &str = "%Y.%m.%d";

/// A film hydrated with its resolved director and genre names, ready for JSON
/// output. Empty name lists render as `["unknown"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmResponse {
    pub film_id: i32,
    pub user_id: i32,
    pub film_name: String,
    pub description: Option<String>,
    pub rating: f64,
    pub number_of_rated_users: i32,
    pub release_date: String,
    pub poster_link: Option<String>,
    pub director_names: Vec<String>,
    pub genre_names: Vec<String>,
}

impl FilmResponse {
    pub fn new(film: Film, mut director_names: Vec<String>, mut genre_names: Vec<String>) -> Self {
        if director_names.is_empty() {
            director_names.push("unknown".to_string());
        }
        if genre_names.is_empty() {
            genre_names.push("unknown".to_string());
        }
        Self {
            film_id: film.id,
            user_id: film.user_id,
            film_name: film.film_name,
            description: film.description,
            rating: film.rating,
            number_of_rated_users: film.number_of_rated_users,
            release_date: film.release_date.format(DATE_DISPLAY_FORMAT).to_string(),
            poster_link: film.poster_link,
            director_names,
            genre_names,
        }
    }
}
