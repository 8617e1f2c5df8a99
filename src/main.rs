use std::env;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use dotenvy::dotenv;
use env_logger::Env;

use film_library::{build_pool, films, run_migrations, users};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set.");
    let pool = build_pool(&database_url).expect("Failed to create pool.");

    {
        let mut conn = pool.get().expect("Couldn't get db connection from pool.");
        run_migrations(&mut conn).expect("Failed to apply database schema.");
    }

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .service(users::register_user)
            .service(users::login)
            .service(films::search_films)
            .service(films::create_film)
            .service(films::edit_film)
            .service(films::delete_film)
            .service(films::delete_director)
            .service(films::rate_film)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
