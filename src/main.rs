use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines
use serde_json::json;

use apollon_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": { "status": "ok" } }))
}

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

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let auth_service = AuthService::new(pool.clone(), jwt_service.clone(), config.otp.clone());
    if let Err(e) = auth_service.ensure_admin(&config.bootstrap).await {
        log::error!("Failed to bootstrap admin account: {e:?}");
    }

    let user_service = UserService::new(pool.clone());
    let apollonyar_service = ApollonyarService::new(pool.clone());
    let course_service = CourseService::new(pool.clone());
    let curriculum_service = CurriculumService::new(pool.clone());
    let medal_service = MedalService::new(pool.clone());
    let discount_code_service = DiscountCodeService::new(pool.clone());
    let profile_service = ProfileService::new(pool.clone());
    let assignment_service = AssignmentService::new(pool.clone());
    let call_service = CallService::new(pool.clone());
    let payment_service = PaymentService::new(pool.clone());
    let log_service = LogService::new(pool.clone());

    tasks::spawn_all(auth_service.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(apollonyar_service.clone()))
            .app_data(web::Data::new(course_service.clone()))
            .app_data(web::Data::new(curriculum_service.clone()))
            .app_data(web::Data::new(medal_service.clone()))
            .app_data(web::Data::new(discount_code_service.clone()))
            .app_data(web::Data::new(profile_service.clone()))
            .app_data(web::Data::new(assignment_service.clone()))
            .app_data(web::Data::new(call_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(log_service.clone()))
            .configure(handlers::extractor_config)
            .configure(swagger_config)
            .route("/health", web::get().to(health))
            .service(web::scope("/api/v1").configure(handlers::api_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
