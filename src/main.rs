extern crate actix_files;
extern crate actix_multipart;
extern crate actix_web;
extern crate bytes;
extern crate chrono;
extern crate dotenv;
extern crate env_logger;
extern crate futures_util;
extern crate jsonwebtoken;
extern crate lettre;
extern crate log;
extern crate rand;
extern crate serde;
extern crate serde_json;
extern crate sqlx;
extern crate thiserror;
extern crate tokio;
extern crate uuid;

mod context;
mod core;
mod error;
mod handlers;
mod impls;
mod models;
mod notify;
mod response;
mod retention;
mod uploads;

use actix_files::Files;
use actix_web::web::{delete, get, post, put, resource, Data};
use actix_web::{App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use crate::impls::mailer::smtp::SmtpMailer;
use crate::impls::tokener::jwt::JWT;
use crate::uploads::UploadStore;

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let database_url = dotenv::var("DATABASE_URL").expect("environment variable DATABASE_URL not been set");
    let jwt_secret = dotenv::var("JWT_SECRET").expect("environment variable JWT_SECRET not been set");
    let mail_account = dotenv::var("USER_EMAIL").expect("environment variable USER_EMAIL not been set");
    let mail_password = dotenv::var("USER_PASSWORD").expect("environment variable USER_PASSWORD not been set");
    let smtp_host = dotenv::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_owned());
    let upload_path = dotenv::var("UPLOAD_PATH").unwrap_or_else(|_| "uploads".to_owned());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    sqlx::migrate!().run(&pool).await.expect("failed to run database migrations");

    let mailer = SmtpMailer::new(&smtp_host, mail_account, mail_password).expect("failed to build mail transport");
    let tokener = JWT::new(jwt_secret.into_bytes());
    let store = UploadStore::new(&upload_path);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(tokener.clone()))
            .app_data(Data::new(mailer.clone()))
            .app_data(Data::new(store.clone()))
            .service(
                resource("/iccr")
                    .route(post().to(handlers::application::submit))
                    .route(get().to(handlers::application::list)),
            )
            .service(resource("/iccr/{id}").route(get().to(handlers::application::detail)))
            .service(
                resource("/iccrform1")
                    .route(post().to(handlers::application::submit_form_v1))
                    .route(get().to(handlers::application::list_form_v1)),
            )
            .service(resource("/totalStudents").route(get().to(handlers::student::total)))
            .service(
                resource("/students")
                    .route(post().to(handlers::student::create::<SmtpMailer>))
                    .route(get().to(handlers::student::list)),
            )
            .service(resource("/studentlogin").route(post().to(handlers::student::login)))
            .service(
                resource("/students/{id}")
                    .route(get().to(handlers::student::detail))
                    .route(put().to(handlers::student::update))
                    .route(delete().to(handlers::student::delete_student)),
            )
            .service(resource("/student/profile").route(get().to(handlers::student::profile)))
            .service(Files::new("/uploads", store.root()))
    })
    .bind(("0.0.0.0", 8000))?
    .run()
    .await
}
