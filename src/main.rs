use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use event_vote_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AdminGuard, AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.expires_in);

    let user_service = UserService::new(pool.clone());
    let event_service = EventService::new(pool.clone());
    let vote_service = VoteService::new(pool.clone());
    let statistics_service = StatisticsService::new(pool.clone());

    let admin_secret = config.admin.secret.clone();

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(event_service.clone()))
            .app_data(web::Data::new(vote_service.clone()))
            .app_data(web::Data::new(statistics_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/admin")
                            .wrap(AdminGuard::new(&admin_secret))
                            .configure(handlers::admin_event_config)
                            .configure(handlers::admin_user_config),
                    )
                    .configure(handlers::event_config)
                    .configure(handlers::user_config)
                    .configure(handlers::statistics_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
