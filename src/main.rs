use actix_web::{middleware, web, App, HttpServer};
use dotenvy::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod app_state;
mod config;
mod database;
mod errors;

use crate::api::posts;
use crate::app_state::AppState;
use crate::config::Config;
use crate::database::models::{account, blog, post, AccountDetails};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().expect("Failed to load configuration");
    let db = database::connect().await?;

    if config.ensure_schema_enabled() {
        database::schema::create_all(&db)
            .await
            .expect("Failed to create schema");
        database::schema::seed_baseline(&db)
            .await
            .expect("Failed to seed baseline data");
    }

    #[derive(OpenApi)]
    #[openapi(
        paths(
            posts::get_posts,
            posts::get_post,
            posts::insert_post,
            posts::update_post,
            posts::delete_post,
            posts::archive_posts,
            posts::delete_posts,
            posts::insert_posts,
        ),
        components(
            schemas(
                post::Model,
                blog::Model,
                account::Model,
                AccountDetails,
                posts::CreatePostDto,
                posts::UpdatePostDto,
                posts::PostWithBlog,
                posts::RowsAffected,
            )
        ),
        tags(
            (name = "Posts", description = "Benchmark CRUD endpoints over the posts table")
        )
    )]
    struct ApiDoc;

    let host = config.host.clone();
    let port = config.port;

    if config.benchmarking_enabled() {
        log::info!("Benchmarking mode: all write transactions will be rolled back");
    }
    if config.bulk_ops_enabled() {
        log::info!("Bulk archive/delete will run as set-based statements");
    }
    log::info!("Starting server at http://{}:{}", host, port);
    log::info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::NormalizePath::trim())
            .app_data(web::Data::new(AppState {
                db: db.clone(),
                config: config.clone(),
            }))
            .service(web::scope("/api").configure(posts::init_routes))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
