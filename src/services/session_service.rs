use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::engine::session::{Direction, QuizSession, SessionState, TickOutcome};
use crate::error::{Error, Result};
use crate::models::attempt::NewAttempt;
use crate::models::quiz::{AnswerValue, Question, Quiz};
use crate::store::QuizStore;

/// Everything the start handler needs to render the quiz to the student.
#[derive(Debug)]
pub struct StartedSession {
    pub session_id: Uuid,
    pub quiz: Quiz,
    pub questions: Vec<Question>,
    pub remaining_seconds: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub attempt_id: Uuid,
    pub score: i32,
    pub total_questions: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: &'static str,
    pub remaining_seconds: u32,
    pub current_index: usize,
    pub questions_answered: usize,
    pub total_questions: usize,
}

struct SessionEntry {
    session: Arc<Mutex<QuizSession>>,
    ticker: Option<JoinHandle<()>>,
    result: Option<SubmissionResult>,
}

impl Drop for SessionEntry {
    // The countdown task must not outlive its session, whichever way the
    // session leaves the registry.
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

/// Holds the live quiz sessions and drives their countdowns. One session per
/// (student, quiz) attempt; finished sessions are evicted by the sweeper.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn QuizStore>,
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self {
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load the quiz, refuse anything a student may not attempt, and open a
    /// fresh in-progress session with its countdown running.
    pub async fn start_session(&self, quiz_id: Uuid, student_id: Uuid) -> Result<StartedSession> {
        let quiz = self
            .store
            .fetch_quiz(quiz_id)
            .await?
            .filter(|q| q.is_published)
            .ok_or_else(|| Error::NotFound("Quiz not found".to_string()))?;

        let questions = self.store.fetch_questions(quiz_id).await?;
        if questions.is_empty() {
            return Err(Error::NotFound("Quiz has no questions".to_string()));
        }

        if self.store.find_attempt(quiz_id, student_id).await?.is_some() {
            return Err(Error::Conflict(
                "This quiz has already been attempted".to_string(),
            ));
        }

        let session = QuizSession::new(quiz.clone(), questions.clone(), student_id);
        let session_id = session.id;
        let remaining_seconds = session.remaining_seconds();
        let started_at = session.started_at();

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                session_id,
                SessionEntry {
                    session: Arc::new(Mutex::new(session)),
                    ticker: None,
                    result: None,
                },
            );
        }
        let ticker = self.spawn_ticker(session_id);
        {
            let mut sessions = self.sessions.write().await;
            if let Some(entry) = sessions.get_mut(&session_id) {
                entry.ticker = Some(ticker);
            } else {
                ticker.abort();
            }
        }

        tracing::info!(%quiz_id, %student_id, %session_id, "Quiz session started");
        Ok(StartedSession {
            session_id,
            quiz,
            questions,
            remaining_seconds,
            started_at,
        })
    }

    pub async fn record_answer(
        &self,
        session_id: Uuid,
        question_id: Uuid,
        value: AnswerValue,
    ) -> Result<()> {
        let session = self.get_session(session_id).await?;
        let mut guard = session.lock().await;
        guard.record_answer(question_id, value)
    }

    pub async fn navigate(&self, session_id: Uuid, direction: Direction) -> Result<usize> {
        let session = self.get_session(session_id).await?;
        let mut guard = session.lock().await;
        Ok(guard.advance(direction))
    }

    pub async fn status(&self, session_id: Uuid) -> Result<SessionStatus> {
        let session = self.get_session(session_id).await?;
        let guard = session.lock().await;
        Ok(SessionStatus {
            state: guard.state().label(),
            remaining_seconds: guard.remaining_seconds(),
            current_index: guard.cursor(),
            questions_answered: guard.answered_count(),
            total_questions: guard.questions().len(),
        })
    }

    /// Grade and persist the session's attempt. Exactly one attempt and one
    /// answer batch land per session: racing calls while a write is in
    /// flight get a conflict, and calls after success get the stored result
    /// back. A failed write leaves the session retryable.
    pub async fn submit_session(&self, session_id: Uuid) -> Result<SubmissionResult> {
        let (session, finished) = {
            let sessions = self.sessions.read().await;
            let entry = sessions
                .get(&session_id)
                .ok_or_else(|| Error::NotFound("Quiz session not found".to_string()))?;
            (entry.session.clone(), entry.result.clone())
        };
        if let Some(result) = finished {
            return Ok(result);
        }

        let (graded, quiz_id, student_id, total_questions) = {
            let mut guard = session.lock().await;
            let graded = guard.begin_submit().ok_or_else(|| {
                Error::Conflict("Quiz submission already in progress".to_string())
            })?;
            (
                graded,
                guard.quiz().id,
                guard.student_id,
                guard.questions().len(),
            )
        };

        let attempt = match self
            .store
            .insert_attempt(NewAttempt {
                quiz_id,
                student_id,
                score: graded.score,
                completed_at: Utc::now(),
            })
            .await
        {
            Ok(attempt) => attempt,
            Err(err) => {
                session.lock().await.submit_failed();
                tracing::error!(%session_id, error = %err, "Failed to persist quiz attempt");
                return Err(err);
            }
        };

        if let Err(err) = self.store.insert_answers(attempt.id, graded.answers).await {
            // The attempt landed but the answers did not; delete the orphan
            // so a retry still produces exactly one attempt.
            if let Err(del_err) = self.store.delete_attempt(attempt.id).await {
                tracing::error!(
                    attempt_id = %attempt.id,
                    error = %del_err,
                    "Failed to delete orphan attempt after answer write failure"
                );
            }
            session.lock().await.submit_failed();
            tracing::error!(%session_id, error = %err, "Failed to persist quiz answers");
            return Err(err);
        }

        session.lock().await.submit_succeeded(graded.score);

        let percentage = if total_questions > 0 {
            graded.score as f64 / total_questions as f64 * 100.0
        } else {
            0.0
        };
        let result = SubmissionResult {
            attempt_id: attempt.id,
            score: graded.score,
            total_questions,
            percentage,
        };
        {
            let mut sessions = self.sessions.write().await;
            if let Some(entry) = sessions.get_mut(&session_id) {
                entry.result = Some(result.clone());
            }
        }
        tracing::info!(%session_id, score = graded.score, total_questions, "Quiz submitted");
        Ok(result)
    }

    /// Evict finished sessions. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let mut keep = HashMap::new();
        for (id, entry) in sessions.drain() {
            let finished = matches!(
                entry.session.try_lock().map(|s| s.state()),
                Ok(SessionState::Finished { .. })
            );
            if !finished {
                keep.insert(id, entry);
            }
        }
        *sessions = keep;
        before - sessions.len()
    }

    async fn get_session(&self, session_id: Uuid) -> Result<Arc<Mutex<QuizSession>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session_id)
            .map(|entry| entry.session.clone())
            .ok_or_else(|| Error::NotFound("Quiz session not found".to_string()))
    }

    fn spawn_ticker(&self, session_id: Uuid) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let mut clock = tokio::time::interval(Duration::from_secs(1));
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick completes immediately.
            clock.tick().await;
            loop {
                clock.tick().await;
                if !service.tick_session(session_id).await {
                    break;
                }
            }
        })
    }

    /// One countdown step. Returns false once the ticker must stop.
    async fn tick_session(&self, session_id: Uuid) -> bool {
        let Ok(session) = self.get_session(session_id).await else {
            return false;
        };
        let outcome = session.lock().await.tick();
        match outcome {
            TickOutcome::Running { .. } => true,
            TickOutcome::Halted => false,
            TickOutcome::TimeExpired => {
                tracing::info!(%session_id, "Quiz time expired, submitting recorded answers");
                if let Err(err) = self.submit_session(session_id).await {
                    // Session stays retryable; the student can submit manually.
                    tracing::error!(%session_id, error = %err, "Auto-submit on expiry failed");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::{Question, QuestionType};
    use crate::store::MockQuizStore;
    use sqlx::types::Json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quiz_fixture(time_limit_minutes: i32, correct: &[i32]) -> (Quiz, Vec<Question>) {
        let questions: Vec<Question> = correct
            .iter()
            .enumerate()
            .map(|(i, &c)| Question {
                id: Uuid::new_v4(),
                question_text: format!("q{}", i),
                question_type: QuestionType::Mcq,
                options: Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
                correct_option: Some(c),
                correct_answer: None,
            })
            .collect();
        let quiz = Quiz {
            id: Uuid::new_v4(),
            classroom_id: Uuid::new_v4(),
            title: "fixture".into(),
            questions: Json(questions.clone()),
            time_limit_minutes,
            is_published: true,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        (quiz, questions)
    }

    fn loaded_store(quiz: &Quiz, questions: &[Question]) -> MockQuizStore {
        let mut store = MockQuizStore::new();
        let quiz_clone = quiz.clone();
        store
            .expect_fetch_quiz()
            .returning(move |_| Ok(Some(quiz_clone.clone())));
        let questions_clone = questions.to_vec();
        store
            .expect_fetch_questions()
            .returning(move |_| Ok(questions_clone.clone()));
        store.expect_find_attempt().returning(|_, _| Ok(None));
        store
    }

    fn stored_attempt(new: &NewAttempt) -> crate::models::attempt::QuizAttempt {
        crate::models::attempt::QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id: new.quiz_id,
            student_id: new.student_id,
            score: new.score,
            completed_at: new.completed_at,
        }
    }

    #[tokio::test]
    async fn start_rejects_missing_or_unpublished_quiz() {
        let mut store = MockQuizStore::new();
        store.expect_fetch_quiz().returning(|_| Ok(None));
        let service = SessionService::new(Arc::new(store));
        let err = service
            .start_session(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn start_rejects_prior_attempt() {
        let (quiz, questions) = quiz_fixture(10, &[0]);
        let mut store = MockQuizStore::new();
        let quiz_clone = quiz.clone();
        store
            .expect_fetch_quiz()
            .returning(move |_| Ok(Some(quiz_clone.clone())));
        let questions_clone = questions.clone();
        store
            .expect_fetch_questions()
            .returning(move |_| Ok(questions_clone.clone()));
        store.expect_find_attempt().returning(|quiz_id, student_id| {
            Ok(Some(crate::models::attempt::QuizAttempt {
                id: Uuid::new_v4(),
                quiz_id,
                student_id,
                score: 1,
                completed_at: Utc::now(),
            }))
        });

        let service = SessionService::new(Arc::new(store));
        let err = service
            .start_session(quiz.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn full_flow_persists_exactly_one_attempt_and_batch() {
        let (quiz, questions) = quiz_fixture(10, &[1, 0, 2, 3]);
        let mut store = loaded_store(&quiz, &questions);
        store
            .expect_insert_attempt()
            .times(1)
            .returning(|new| Ok(stored_attempt(&new)));
        store
            .expect_insert_answers()
            .times(1)
            .withf(|_, answers| answers.len() == 4)
            .returning(|_, _| Ok(()));

        let service = SessionService::new(Arc::new(store));
        let started = service
            .start_session(quiz.id, Uuid::new_v4())
            .await
            .unwrap();

        // Answer [1, 0, 2, 2]: three correct against the key [1, 0, 2, 3].
        for (question, given) in started.questions.iter().zip([1, 0, 2, 2]) {
            service
                .record_answer(started.session_id, question.id, AnswerValue::Choice(given))
                .await
                .unwrap();
        }

        let first = service.submit_session(started.session_id).await.unwrap();
        assert_eq!(first.score, 3);
        assert_eq!(first.total_questions, 4);
        assert!((first.percentage - 75.0).abs() < f64::EPSILON);

        // Submitting again is a no-op returning the same result.
        let second = service.submit_session(started.session_id).await.unwrap();
        assert_eq!(second.attempt_id, first.attempt_id);
        assert_eq!(second.score, 3);

        let status = service.status(started.session_id).await.unwrap();
        assert_eq!(status.state, "finished");
    }

    #[tokio::test]
    async fn answer_write_failure_compensates_and_allows_retry() {
        let (quiz, questions) = quiz_fixture(10, &[0]);
        let mut store = loaded_store(&quiz, &questions);
        store
            .expect_insert_attempt()
            .times(2)
            .returning(|new| Ok(stored_attempt(&new)));
        let calls = AtomicUsize::new(0);
        store
            .expect_insert_answers()
            .times(2)
            .returning(move |_, _| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(Error::Internal("answer batch write failed".to_string()))
                } else {
                    Ok(())
                }
            });
        store
            .expect_delete_attempt()
            .times(1)
            .returning(|_| Ok(()));

        let service = SessionService::new(Arc::new(store));
        let started = service
            .start_session(quiz.id, Uuid::new_v4())
            .await
            .unwrap();

        assert!(service.submit_session(started.session_id).await.is_err());
        let status = service.status(started.session_id).await.unwrap();
        assert_eq!(status.state, "submitting");

        let retried = service.submit_session(started.session_id).await.unwrap();
        assert_eq!(retried.score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expiry_auto_submits_unanswered_quiz_once() {
        let (quiz, questions) = quiz_fixture(1, &[0, 1]);
        let mut store = loaded_store(&quiz, &questions);
        store
            .expect_insert_attempt()
            .times(1)
            .withf(|new| new.score == 0)
            .returning(|new| Ok(stored_attempt(&new)));
        store
            .expect_insert_answers()
            .times(1)
            .withf(|_, answers| answers.iter().all(|a| !a.is_correct))
            .returning(|_, _| Ok(()));

        let service = SessionService::new(Arc::new(store));
        let started = service
            .start_session(quiz.id, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(started.remaining_seconds, 60);

        // Virtual time; the ticker drains the full minute and auto-submits.
        tokio::time::sleep(Duration::from_secs(65)).await;

        let status = service.status(started.session_id).await.unwrap();
        assert_eq!(status.state, "finished");
        assert_eq!(status.remaining_seconds, 0);

        assert_eq!(service.sweep().await, 1);
        assert!(service.status(started.session_id).await.is_err());
    }
}
