pub mod config;
pub mod database;
pub mod dto;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::{
    analytics_service::AnalyticsService, announcement_service::AnnouncementService,
    assignment_service::AssignmentService, classroom_service::ClassroomService,
    material_service::MaterialService, progress_service::ProgressService,
    quiz_service::QuizService, session_service::SessionService,
};
use crate::store::PgStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub classroom_service: ClassroomService,
    pub quiz_service: QuizService,
    pub session_service: SessionService,
    pub material_service: MaterialService,
    pub announcement_service: AnnouncementService,
    pub assignment_service: AssignmentService,
    pub analytics_service: AnalyticsService,
    pub progress_service: ProgressService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));

        let classroom_service = ClassroomService::new(pool.clone());
        let quiz_service = QuizService::new(pool.clone());
        let session_service = SessionService::new(store.clone());
        let material_service = MaterialService::new(pool.clone());
        let announcement_service = AnnouncementService::new(pool.clone());
        let assignment_service = AssignmentService::new(pool.clone());
        let analytics_service = AnalyticsService::new(store);
        let progress_service = ProgressService::new(pool.clone());

        Self {
            pool,
            classroom_service,
            quiz_service,
            session_service,
            material_service,
            announcement_service,
            assignment_service,
            analytics_service,
            progress_service,
        }
    }
}
