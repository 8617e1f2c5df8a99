#![allow(dead_code)]

use diesel::connection::SimpleConnection;
use diesel::{Connection, SqliteConnection};
use tempfile::TempDir;

use film_library::model::{FilmResponse, NewFilmRecord};
use film_library::users::RegisterRequest;
use film_library::{db_film, db_user, run_migrations};

/// Fresh file-backed database. The `TempDir` must stay alive as long as the
/// connection is used.
pub fn connect() -> (TempDir, SqliteConnection) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("film_library.db");
    let mut conn = SqliteConnection::establish(path.to_str().unwrap()).unwrap();
    conn.batch_execute("PRAGMA foreign_keys = ON;").unwrap();
    run_migrations(&mut conn).unwrap();
    (dir, conn)
}

pub fn register(
    conn: &mut SqliteConnection,
    nickname: &str,
    password: &str,
    email: &str,
    admin: bool,
) -> i32 {
    db_user::register_user(
        conn,
        RegisterRequest {
            nickname: nickname.to_string(),
            password: password.to_string(),
            email: email.to_string(),
            first_name: None,
            surname: None,
            age: None,
            admin: Some(admin),
        },
    )
    .unwrap()
}

pub fn create_film(
    conn: &mut SqliteConnection,
    user_id: i32,
    film_name: &str,
    description: &str,
    release_date: &str,
    poster_link: Option<&str>,
    genre_names: &[&str],
    director_names: &[&str],
) -> FilmResponse {
    let record = NewFilmRecord {
        user_id,
        film_name: film_name.to_string(),
        description: Some(description.to_string()),
        release_date: db_film::parse_date(release_date).unwrap(),
        poster_link: poster_link.map(|s| s.to_string()),
    };
    let genre_names: Vec<String> = genre_names.iter().map(|s| s.to_string()).collect();
    let director_names: Vec<String> = director_names.iter().map(|s| s.to_string()).collect();
    db_film::insert_film(conn, record, &genre_names, &director_names).unwrap()
}

pub struct Fixture {
    pub yurii: i32,
    pub maxmax: i32,
    pub matrix: i32,
    pub die_hard: i32,
}

/// The fixture set most tests run against: an admin, a regular user and two
/// linked films.
pub fn seed(conn: &mut SqliteConnection) -> Fixture {
    let yurii = register(conn, "yurii", "password", "email1@gmail.com", true);
    let maxmax = register(conn, "maxmax", "Password", "email2@gmail.com", false);
    let matrix = create_film(
        conn,
        yurii,
        "matrix",
        "some description",
        "2003-12-12",
        Some("link1"),
        &["thriller", "fantastic"],
        &["dir1", "dir2"],
    );
    let die_hard = create_film(
        conn,
        maxmax,
        "die hard",
        "description some",
        "1995-10-10",
        Some("link2"),
        &["thriller", "detective"],
        &["dir3"],
    );
    Fixture {
        yurii,
        maxmax,
        matrix: matrix.film_id,
        die_hard: die_hard.film_id,
    }
}
