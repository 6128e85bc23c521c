#![allow(dead_code)]

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App, Error,
};
use chrono::{TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use blogbench::api::posts;
use blogbench::app_state::AppState;
use blogbench::config::Config;
use blogbench::database::models::{account, blog, post};
use blogbench::database::schema;

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");
    schema::create_all(&db).await.expect("create schema");
    db
}

pub fn test_state(db: DatabaseConnection, benchmarking: bool, bulk_ops: bool) -> AppState {
    AppState {
        db,
        config: Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            benchmarking: Some(benchmarking),
            bulk_ops: Some(bulk_ops),
            ensure_schema: Some(false),
        },
    }
}

pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .service(web::scope("/api").configure(posts::init_routes))
}

pub async fn seed_blog(db: &DatabaseConnection, name: &str, is_premium: bool) -> blog::Model {
    let account = account::ActiveModel {
        details: Set(serde_json::json!({ "is_premium": is_premium })),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert account");

    blog::ActiveModel {
        name: Set(name.to_string()),
        account_id: Set(account.id),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert blog")
}

pub async fn seed_post(
    db: &DatabaseConnection,
    blog_id: i32,
    title: &str,
    year: i32,
) -> post::Model {
    post::ActiveModel {
        blog_id: Set(blog_id),
        title: Set(title.to_string()),
        content: Set("Lorem ipsum".to_string()),
        published_on: Set(Utc.with_ymd_and_hms(year, 5, 15, 10, 30, 0).unwrap()),
        archived: Set(false),
        banner: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert post")
}
