use actix_web::{test, web, App};
use serde_json::{json, Value};

use film_library::{build_pool, films, run_migrations, users, DbPool};

fn setup() -> (tempfile::TempDir, DbPool) {
    std::env::set_var("SECRET", "test-secret");
    std::env::set_var("ACCESS_TOKEN_EXP_SEC", "3600");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("film_library.db");
    let pool = build_pool(path.to_str().unwrap()).unwrap();
    {
        let mut conn = pool.get().unwrap();
        run_migrations(&mut conn).unwrap();
    }
    (dir, pool)
}

macro_rules! init_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .service(users::register_user)
                .service(users::login)
                .service(films::search_films)
                .service(films::create_film)
                .service(films::edit_film)
                .service(films::delete_film)
                .service(films::delete_director)
                .service(films::rate_film),
        )
        .await
    };
}

macro_rules! register_and_login {
    ($app:expr, $nickname:expr, $email:expr, $admin:expr) => {{
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "nickname": $nickname,
                "password": "password",
                "email": $email,
                "admin": $admin,
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), 200);

        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "nickname": $nickname, "password": "password" }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), 200);
        let body: Value = test::read_body_json(resp).await;
        body["accessToken"].as_str().unwrap().to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn register_create_search_and_rate_flow() {
    let (_dir, pool) = setup();
    let app = init_app!(pool);
    let token = register_and_login!(app, "yurii", "email1@gmail.com", false);

    let req = test::TestRequest::post()
        .uri("/films")
        .insert_header(bearer(&token))
        .set_json(json!({
            "film_name": "matrix",
            "description": "some description",
            "release_date": "2003-12-12",
            "poster_link": "link1",
            "genre_names": ["thriller", "fantastic"],
            "director_names": ["dir1", "dir2"],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let film_id = body["films"]["film_id"].as_i64().unwrap();
    assert_eq!(body["films"]["film_name"], "matrix");
    assert_eq!(body["films"]["release_date"], "2003.12.12");

    let req = test::TestRequest::post()
        .uri("/films")
        .insert_header(bearer(&token))
        .set_json(json!({
            "film_name": "die hard",
            "description": "description some",
            "release_date": "1995-10-10",
            "poster_link": "link2",
            "genre_names": ["thriller", "detective"],
            "director_names": ["dir3"],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::get()
        .uri("/films?film_mask=die")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let hits = body["films"].as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["film_name"], "die hard");

    let req = test::TestRequest::get()
        .uri(&format!("/film/rate?film_id={}&user_rate=5", film_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["films"]["rating"].as_f64().unwrap(), 5.0);
    assert_eq!(body["films"]["number_of_rated_users"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/film/rate?film_id={}&user_rate=4", film_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["films"]["rating"].as_f64().unwrap(), 4.5);
    assert_eq!(body["films"]["number_of_rated_users"], 2);
}

#[actix_web::test]
async fn mutating_films_requires_a_token() {
    let (_dir, pool) = setup();
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/films")
        .set_json(json!({
            "film_name": "matrix",
            "release_date": "2003-12-12",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::delete()
        .uri("/films")
        .insert_header(bearer("garbage"))
        .set_json(json!({ "id": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn register_validates_nickname_and_password_length() {
    let (_dir, pool) = setup();
    let app = init_app!(pool);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "nickname": "pet",
            "password": "password",
            "email": "pet@gmail.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "nickname": "peter1",
            "password": "short",
            "email": "pet@gmail.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // Lengths are counted in characters, not UTF-8 bytes: two multibyte
    // characters are still a too-short nickname, and five are enough.
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "nickname": "日本",
            "password": "password",
            "email": "short@gmail.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "nickname": "peter2",
            "password": "пароль",
            "email": "pet2@gmail.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "nickname": "ユーザー名",
            "password": "password",
            "email": "long@gmail.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn login_failures_collapse_to_one_status() {
    let (_dir, pool) = setup();
    let app = init_app!(pool);
    register_and_login!(app, "yurii", "email1@gmail.com", false);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "nickname": "yurii", "password": "password1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "nickname": "nobody", "password": "password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn only_the_creator_or_an_admin_may_modify_a_film() {
    let (_dir, pool) = setup();
    let app = init_app!(pool);
    let owner = register_and_login!(app, "yurii", "email1@gmail.com", false);
    let other = register_and_login!(app, "maxmax", "email2@gmail.com", false);
    let admin = register_and_login!(app, "admin1", "email3@gmail.com", true);

    let req = test::TestRequest::post()
        .uri("/films")
        .insert_header(bearer(&owner))
        .set_json(json!({
            "film_name": "matrix",
            "release_date": "2003-12-12",
            "director_names": ["dir1"],
            "genre_names": ["thriller"],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let film_id = body["films"]["film_id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri("/films")
        .insert_header(bearer(&other))
        .set_json(json!({ "film_id": film_id, "film_name": "hijacked" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::put()
        .uri("/films")
        .insert_header(bearer(&admin))
        .set_json(json!({ "film_id": film_id, "film_name": "matrix reloaded" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::delete()
        .uri("/directors")
        .insert_header(bearer(&other))
        .set_json(json!({ "director_name": "dir1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::delete()
        .uri("/directors")
        .insert_header(bearer(&admin))
        .set_json(json!({ "director_name": "dir1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::delete()
        .uri("/films")
        .insert_header(bearer(&owner))
        .set_json(json!({ "id": film_id }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn duplicate_film_and_bad_arguments_are_rejected() {
    let (_dir, pool) = setup();
    let app = init_app!(pool);
    let token = register_and_login!(app, "yurii", "email1@gmail.com", false);

    let film = json!({
        "film_name": "matrix",
        "release_date": "2003-12-12",
        "director_names": ["dir1"],
        "genre_names": ["thriller"],
    });
    let req = test::TestRequest::post()
        .uri("/films")
        .insert_header(bearer(&token))
        .set_json(film.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    let req = test::TestRequest::post()
        .uri("/films")
        .insert_header(bearer(&token))
        .set_json(film)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/films")
        .insert_header(bearer(&token))
        .set_json(json!({ "film_name": "badly dated", "release_date": "12.12.2003" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::get()
        .uri("/film/rate?film_id=1&user_rate=6")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::get()
        .uri("/film/rate?film_id=111&user_rate=3")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
