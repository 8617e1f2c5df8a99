use chrono::NaiveDate;
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper,
    SqliteConnection,
};

use crate::error::{ApiError, Result};
use crate::model::{Director, Film, FilmChanges, FilmResponse, Genre, NewFilmRecord};
use crate::schema::{directors, film_directors, film_genres, films, genres};

/// Wire format for release dates coming in from requests.
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, DATE_INPUT_FORMAT).map_err(|_| {
        ApiError::InvalidArgument("Wrong date format or not correct input".to_string())
    })
}

pub fn get_film(conn: &mut SqliteConnection, film_id: i32) -> Result<Film> {
    let film = films::table
        .filter(films::id.eq(film_id))
        .select(Film::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("No film with this id".to_string()))?;
    Ok(film)
}

/// The id of the user who created the film, for ownership checks.
pub fn film_creator(conn: &mut SqliteConnection, film_id: i32) -> Result<i32> {
    Ok(get_film(conn, film_id)?.user_id)
}

/// Get-or-create by unique name. The conflict-tolerant insert makes two
/// concurrent resolutions of a new name converge on one row.
pub fn resolve_genre(conn: &mut SqliteConnection, name: &str) -> Result<Genre> {
    diesel::insert_into(genres::table)
        .values(genres::genre_name.eq(name))
        .on_conflict(genres::genre_name)
        .do_nothing()
        .execute(conn)?;
    let genre = genres::table
        .filter(genres::genre_name.eq(name))
        .select(Genre::as_select())
        .first(conn)?;
    Ok(genre)
}

pub fn resolve_director(conn: &mut SqliteConnection, name: &str) -> Result<Director> {
    diesel::insert_into(directors::table)
        .values(directors::director_name.eq(name))
        .on_conflict(directors::director_name)
        .do_nothing()
        .execute(conn)?;
    let director = directors::table
        .filter(directors::director_name.eq(name))
        .select(Director::as_select())
        .first(conn)?;
    Ok(director)
}

fn link_genres(conn: &mut SqliteConnection, film_id: i32, names: &[String]) -> Result<()> {
    for name in names {
        let genre = resolve_genre(conn, name)?;
        diesel::insert_into(film_genres::table)
            .values((
                film_genres::film_id.eq(film_id),
                film_genres::genre_id.eq(genre.id),
            ))
            .on_conflict_do_nothing()
            .execute(conn)?;
    }
    Ok(())
}

fn link_directors(conn: &mut SqliteConnection, film_id: i32, names: &[String]) -> Result<()> {
    for name in names {
        let director = resolve_director(conn, name)?;
        diesel::insert_into(film_directors::table)
            .values((
                film_directors::film_id.eq(film_id),
                film_directors::director_id.eq(director.id),
            ))
            .on_conflict_do_nothing()
            .execute(conn)?;
    }
    Ok(())
}

pub fn get_genre_names(conn: &mut SqliteConnection, film_id: i32) -> Result<Vec<String>> {
    let names = film_genres::table
        .inner_join(genres::table)
        .filter(film_genres::film_id.eq(film_id))
        .order(genres::id.asc())
        .select(genres::genre_name)
        .load(conn)?;
    Ok(names)
}

pub fn get_director_names(conn: &mut SqliteConnection, film_id: i32) -> Result<Vec<String>> {
    let names = film_directors::table
        .inner_join(directors::table)
        .filter(film_directors::film_id.eq(film_id))
        .order(directors::id.asc())
        .select(directors::director_name)
        .load(conn)?;
    Ok(names)
}

/// Resolves the film's genre and director name lists for output.
pub fn hydrate(conn: &mut SqliteConnection, film: Film) -> Result<FilmResponse> {
    let director_names = get_director_names(conn, film.id)?;
    let genre_names = get_genre_names(conn, film.id)?;
    Ok(FilmResponse::new(film, director_names, genre_names))
}

/// Inserts a film with its genre and director links as one unit. A failed
/// link insert rolls the film row back with it.
pub fn insert_film(
    conn: &mut SqliteConnection,
    record: NewFilmRecord,
    genre_names: &[String],
    director_names: &[String],
) -> Result<FilmResponse> {
    conn.immediate_transaction::<_, ApiError, _>(|conn| {
        let duplicate = films::table
            .filter(films::film_name.eq(&record.film_name))
            .filter(films::release_date.eq(record.release_date))
            .select(Film::as_select())
            .first(conn)
            .optional()?;
        if duplicate.is_some() {
            return Err(ApiError::Conflict(format!(
                "Film with {} name and same release year already exist",
                record.film_name
            )));
        }

        let film: Film = diesel::insert_into(films::table)
            .values(&record)
            .returning(Film::as_returning())
            .get_result(conn)?;

        link_genres(conn, film.id, genre_names)?;
        link_directors(conn, film.id, director_names)?;

        hydrate(conn, film)
    })
}

/// Applies a partial update. Supplied genre and director names are additive:
/// existing links stay, new names are resolved or created and linked.
pub fn edit_film(
    conn: &mut SqliteConnection,
    film_id: i32,
    changes: FilmChanges,
    genre_names: &[String],
    director_names: &[String],
) -> Result<FilmResponse> {
    conn.immediate_transaction::<_, ApiError, _>(|conn| {
        get_film(conn, film_id)?;

        if !changes.is_empty() {
            diesel::update(films::table.filter(films::id.eq(film_id)))
                .set(&changes)
                .execute(conn)?;
        }
        link_genres(conn, film_id, genre_names)?;
        link_directors(conn, film_id, director_names)?;

        let film = get_film(conn, film_id)?;
        hydrate(conn, film)
    })
}

pub fn delete_film(conn: &mut SqliteConnection, film_id: i32) -> Result<()> {
    conn.immediate_transaction::<_, ApiError, _>(|conn| {
        get_film(conn, film_id)?;
        diesel::delete(film_genres::table.filter(film_genres::film_id.eq(film_id)))
            .execute(conn)?;
        diesel::delete(film_directors::table.filter(film_directors::film_id.eq(film_id)))
            .execute(conn)?;
        diesel::delete(films::table.filter(films::id.eq(film_id))).execute(conn)?;
        Ok(())
    })
}

/// Detaches the director from every film, then removes the director row.
/// The films themselves are untouched.
pub fn delete_director(conn: &mut SqliteConnection, name: &str) -> Result<()> {
    conn.immediate_transaction::<_, ApiError, _>(|conn| {
        let director = directors::table
            .filter(directors::director_name.eq(name))
            .select(Director::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("No director with this name".to_string()))?;
        diesel::delete(film_directors::table.filter(film_directors::director_id.eq(director.id)))
            .execute(conn)?;
        diesel::delete(directors::table.filter(directors::id.eq(director.id))).execute(conn)?;
        Ok(())
    })
}

fn next_rating(rating: f64, count: i32, score: i32) -> f64 {
    (rating * count as f64 + score as f64) / (count + 1) as f64
}

/// Folds one score into the film's running mean. The read and the write of
/// the rating fields happen inside one immediate transaction so two
/// concurrent raters cannot overwrite each other's increment.
pub fn rate_film(conn: &mut SqliteConnection, film_id: i32, user_rate: i32) -> Result<FilmResponse> {
    if !(1..=5).contains(&user_rate) {
        return Err(ApiError::InvalidArgument("Wrong rate value".to_string()));
    }
    conn.immediate_transaction::<_, ApiError, _>(|conn| {
        let film = get_film(conn, film_id)?;
        let new_rating = next_rating(film.rating, film.number_of_rated_users, user_rate);
        diesel::update(films::table.filter(films::id.eq(film_id)))
            .set((
                films::rating.eq(new_rating),
                films::number_of_rated_users.eq(film.number_of_rated_users + 1),
            ))
            .execute(conn)?;
        let film = get_film(conn, film_id)?;
        hydrate(conn, film)
    })
}
