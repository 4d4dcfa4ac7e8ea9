//! Persistence collaborator consumed by the quiz session engine and the
//! engagement aggregator. Everything else in the app talks to Postgres
//! directly through its service; the core goes through these traits so its
//! behavior can be pinned down against mocks.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::attempt::{NewAnswer, NewAttempt, QuizAttempt};
use crate::models::classroom::RosterEntry;
use crate::models::material::{Material, ViewRecord};
use crate::models::quiz::{Question, Quiz, QuizDigest};

pub mod pg;

pub use pg::PgStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn fetch_quiz(&self, quiz_id: Uuid) -> Result<Option<Quiz>>;
    async fn fetch_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>>;
    async fn find_attempt(&self, quiz_id: Uuid, student_id: Uuid) -> Result<Option<QuizAttempt>>;
    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<QuizAttempt>;
    async fn insert_answers(&self, attempt_id: Uuid, answers: Vec<NewAnswer>) -> Result<()>;
    /// Compensating delete for an attempt whose answer batch failed to land.
    async fn delete_attempt(&self, attempt_id: Uuid) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementStore: Send + Sync {
    async fn fetch_roster(&self, classroom_id: Uuid) -> Result<Vec<RosterEntry>>;
    async fn fetch_materials(&self, classroom_id: Uuid) -> Result<Vec<Material>>;
    async fn fetch_material_views(&self, classroom_id: Uuid) -> Result<Vec<ViewRecord>>;
    async fn fetch_video_views(&self, classroom_id: Uuid) -> Result<Vec<ViewRecord>>;
    async fn fetch_quizzes(&self, classroom_id: Uuid) -> Result<Vec<QuizDigest>>;
    async fn fetch_attempts_for_quizzes(&self, quiz_ids: Vec<Uuid>) -> Result<Vec<QuizAttempt>>;
}
