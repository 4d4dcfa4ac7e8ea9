use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use classroom_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let state = app_state.clone();
        let sweep_interval = Duration::from_secs(config.session_sweep_secs);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(sweep_interval).await;
                let evicted = state.session_service.sweep().await;
                if evicted > 0 {
                    info!(evicted, "Swept finished quiz sessions");
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let api = Router::new()
        .route(
            "/api/classrooms",
            get(routes::classroom::list_teacher_classrooms)
                .post(routes::classroom::create_classroom),
        )
        .route("/api/classrooms/join", post(routes::classroom::join_classroom))
        .route(
            "/api/classrooms/enrolled",
            get(routes::classroom::list_student_classrooms),
        )
        .route("/api/classrooms/:id", get(routes::classroom::get_classroom))
        .route("/api/classrooms/:id/roster", get(routes::classroom::get_roster))
        .route(
            "/api/classrooms/:id/quizzes",
            get(routes::quiz::list_quizzes).post(routes::quiz::create_quiz),
        )
        .route(
            "/api/classrooms/:id/materials",
            get(routes::material::list_materials).post(routes::material::create_material),
        )
        .route(
            "/api/classrooms/:id/assignments",
            get(routes::assignment::list_assignments)
                .post(routes::assignment::create_assignment),
        )
        .route(
            "/api/assignments",
            get(routes::assignment::list_student_assignments),
        )
        .route(
            "/api/classrooms/:id/announcements",
            get(routes::announcement::list_announcements)
                .post(routes::announcement::post_announcement),
        )
        .route(
            "/api/classrooms/:id/report",
            get(routes::analytics::classroom_report),
        )
        .route(
            "/api/materials/:id/view",
            post(routes::material::record_view),
        )
        .route(
            "/api/announcements/:id/comments",
            post(routes::announcement::add_comment),
        )
        .route(
            "/api/quizzes/:id/review",
            get(routes::quiz::attempt_review),
        )
        .route("/api/sessions", post(routes::session::start_session))
        .route(
            "/api/sessions/:id/answer",
            axum::routing::patch(routes::session::record_answer),
        )
        .route(
            "/api/sessions/:id/navigate",
            post(routes::session::navigate),
        )
        .route("/api/sessions/:id/submit", post(routes::session::submit_session))
        .route("/api/sessions/:id/status", get(routes::session::session_status))
        .route("/api/progress", get(routes::analytics::student_progress));

    let app = base_routes
        .merge(api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
