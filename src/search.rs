use chrono::NaiveDate;
use diesel::{
    ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper, SqliteConnection,
    TextExpressionMethods,
};
use serde::Deserialize;

use crate::db_film::{self, parse_date};
use crate::error::{ApiError, Result};
use crate::model::{Film, FilmResponse};
use crate::schema::{directors, film_directors, film_genres, films, genres};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
const EARLIEST_RELEASE: &str = "1900-01-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rating,
    ReleaseDate,
}

impl SortKey {
    /// Anything other than the two known keys means unspecified order.
    fn from_raw(raw: Option<&str>) -> Option<SortKey> {
        match raw {
            Some("rating") => Some(SortKey::Rating),
            Some("release_date") => Some(SortKey::ReleaseDate),
            _ => None,
        }
    }
}

/// Raw query-string arguments of `GET /films`. Name lists arrive
/// comma-separated without spaces, the release range as `"start,end"`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub film_mask: Option<String>,
    pub release_range: Option<String>,
    pub director_names: Option<String>,
    pub genre_names: Option<String>,
    pub pagination: Option<i64>,
    pub page_number: Option<i64>,
    pub sorting: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub film_mask: String,
    pub release_range: (NaiveDate, NaiveDate),
    pub director_names: Option<Vec<String>>,
    pub genre_names: Option<Vec<String>>,
    pub page_size: i64,
    pub page_number: i64,
    pub sorting: Option<SortKey>,
}

impl SearchParams {
    pub fn from_query(query: SearchQuery) -> Result<Self> {
        let release_range = match query.release_range.as_deref().filter(|s| !s.is_empty()) {
            None => (
                parse_date(EARLIEST_RELEASE)?,
                chrono::Local::now().date_naive(),
            ),
            Some(raw) => {
                let (start, end) = raw.split_once(',').ok_or_else(|| {
                    ApiError::InvalidArgument(
                        "release_range must be two dates separated by a comma".to_string(),
                    )
                })?;
                (parse_date(start)?, parse_date(end)?)
            }
        };
        Ok(Self {
            film_mask: query.film_mask.unwrap_or_default(),
            release_range,
            director_names: split_names(query.director_names),
            genre_names: split_names(query.genre_names),
            page_size: query.pagination.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            page_number: query.page_number.unwrap_or(1).max(1),
            sorting: SortKey::from_raw(query.sorting.as_deref()),
        })
    }
}

fn split_names(raw: Option<String>) -> Option<Vec<String>> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    Some(raw.split(',').map(|s| s.trim().to_string()).collect())
}

/// Joins films against their genre and director links, filters, sorts and
/// slices one page, then hydrates each hit.
///
/// The inner joins require every result to carry at least one genre and one
/// director link, even when no name filter was requested. Films with zero
/// links of either kind never show up, matching the behavior of omitted
/// filters defaulting to "all known names".
pub fn search_films(
    conn: &mut SqliteConnection,
    params: &SearchParams,
) -> Result<Vec<FilmResponse>> {
    // SQLite LIKE is case-insensitive for ASCII, which covers the
    // case-insensitive mask contract.
    let pattern = format!("%{}%", params.film_mask);
    let (start, end) = params.release_range;

    let mut query = films::table
        .inner_join(film_genres::table.inner_join(genres::table))
        .inner_join(film_directors::table.inner_join(directors::table))
        .filter(films::film_name.like(pattern))
        .filter(films::release_date.between(start, end))
        .select(Film::as_select())
        .distinct()
        .into_boxed();

    if let Some(names) = &params.genre_names {
        query = query.filter(genres::genre_name.eq_any(names));
    }
    if let Some(names) = &params.director_names {
        query = query.filter(directors::director_name.eq_any(names));
    }

    query = match params.sorting {
        Some(SortKey::Rating) => query.order(films::rating.desc()),
        Some(SortKey::ReleaseDate) => query.order(films::release_date.desc()),
        None => query.order(films::id.asc()),
    };

    // Both page arguments come straight off the query string, so the offset
    // saturates instead of overflowing on absurd page numbers.
    let offset = (params.page_number - 1).saturating_mul(params.page_size);
    let page = query
        .limit(params.page_size)
        .offset(offset)
        .load::<Film>(conn)?;

    page.into_iter()
        .map(|film| db_film::hydrate(conn, film))
        .collect()
}
