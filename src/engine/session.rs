use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::grading::{self, GradedSubmission};
use crate::error::{Error, Result};
use crate::models::quiz::{AnswerValue, Question, Quiz};

/// Lifecycle of one attempt. States are never revisited; `Finished` is
/// terminal. A failed persistence pass clears `in_flight` so submission can
/// be retried without re-entering `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress,
    Submitting { in_flight: bool },
    Finished { score: i32 },
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::InProgress => "in_progress",
            SessionState::Submitting { .. } => "submitting",
            SessionState::Finished { .. } => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Previous,
    Next,
}

/// What one second of countdown produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running { remaining_seconds: u32 },
    /// Countdown hit zero while in progress; the caller must submit once.
    TimeExpired,
    /// The session left `InProgress`; the ticker must stop permanently.
    Halted,
}

/// Drives exactly one student through exactly one quiz attempt, from load to
/// graded submission. Purely in-memory; persistence happens around it.
pub struct QuizSession {
    pub id: Uuid,
    pub student_id: Uuid,
    quiz: Quiz,
    questions: Vec<Question>,
    answers: HashMap<Uuid, AnswerValue>,
    cursor: usize,
    remaining_seconds: u32,
    state: SessionState,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    pub fn new(quiz: Quiz, questions: Vec<Question>, student_id: Uuid) -> Self {
        let remaining_seconds = (quiz.time_limit_minutes.max(0) as u32) * 60;
        Self {
            id: Uuid::new_v4(),
            student_id,
            quiz,
            questions,
            answers: HashMap::new(),
            cursor: 0,
            remaining_seconds,
            state: SessionState::InProgress,
            started_at: Utc::now(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Store or overwrite the answer for a question. The value is not
    /// checked against the question type here; grading settles it.
    pub fn record_answer(&mut self, question_id: Uuid, value: AnswerValue) -> Result<()> {
        if self.state != SessionState::InProgress {
            return Err(Error::Conflict(
                "Quiz session is no longer accepting answers".to_string(),
            ));
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(Error::NotFound(
                "Question does not belong to this quiz".to_string(),
            ));
        }
        self.answers.insert(question_id, value);
        Ok(())
    }

    /// Move the current-question cursor by one, clamped to the question
    /// range. Pure navigation; touches neither timer nor answers.
    pub fn advance(&mut self, direction: Direction) -> usize {
        let last = self.questions.len().saturating_sub(1);
        self.cursor = match direction {
            Direction::Previous => self.cursor.saturating_sub(1),
            Direction::Next => (self.cursor + 1).min(last),
        };
        self.cursor
    }

    /// One second of countdown. Only `InProgress` decrements; any other
    /// state tells the ticker to stop for good.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != SessionState::InProgress {
            return TickOutcome::Halted;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            TickOutcome::TimeExpired
        } else {
            TickOutcome::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }

    /// Claim the submission. Grades the recorded answers and moves to
    /// `Submitting` with a write in flight. Returns `None` when a write is
    /// already in flight or the session is finished, so racing calls (double
    /// click, timer firing alongside a manual submit) collapse to one.
    pub fn begin_submit(&mut self) -> Option<GradedSubmission> {
        match self.state {
            SessionState::InProgress | SessionState::Submitting { in_flight: false } => {
                self.state = SessionState::Submitting { in_flight: true };
                Some(grading::grade(&self.questions, &self.answers))
            }
            SessionState::Submitting { in_flight: true } | SessionState::Finished { .. } => None,
        }
    }

    /// The persistence pass failed; stay in `Submitting` but allow a retry.
    pub fn submit_failed(&mut self) {
        if let SessionState::Submitting { .. } = self.state {
            self.state = SessionState::Submitting { in_flight: false };
        }
    }

    pub fn submit_succeeded(&mut self, score: i32) {
        self.state = SessionState::Finished { score };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuestionType;
    use sqlx::types::Json;

    fn fixture(time_limit_minutes: i32, question_total: usize) -> QuizSession {
        let questions: Vec<Question> = (0..question_total)
            .map(|i| Question {
                id: Uuid::new_v4(),
                question_text: format!("q{}", i),
                question_type: QuestionType::Mcq,
                options: Some(vec!["a".into(), "b".into()]),
                correct_option: Some(0),
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
        QuizSession::new(quiz, questions, Uuid::new_v4())
    }

    #[test]
    fn countdown_starts_at_time_limit_in_seconds() {
        let session = fixture(5, 3);
        assert_eq!(session.remaining_seconds(), 300);
        assert_eq!(session.state(), SessionState::InProgress);
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut session = fixture(5, 3);
        assert_eq!(session.advance(Direction::Previous), 0);
        assert_eq!(session.advance(Direction::Next), 1);
        assert_eq!(session.advance(Direction::Next), 2);
        assert_eq!(session.advance(Direction::Next), 2);
        assert_eq!(session.advance(Direction::Previous), 1);
    }

    #[test]
    fn answers_overwrite_and_only_while_in_progress() {
        let mut session = fixture(5, 2);
        let qid = session.questions()[0].id;
        session.record_answer(qid, AnswerValue::Choice(1)).unwrap();
        session.record_answer(qid, AnswerValue::Choice(0)).unwrap();
        assert_eq!(session.answered_count(), 1);

        session.begin_submit().unwrap();
        let err = session
            .record_answer(qid, AnswerValue::Choice(1))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn recording_against_a_foreign_question_is_rejected() {
        let mut session = fixture(5, 1);
        let err = session
            .record_answer(Uuid::new_v4(), AnswerValue::Choice(0))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn second_submit_claim_is_a_no_op_while_in_flight() {
        let mut session = fixture(5, 2);
        assert!(session.begin_submit().is_some());
        assert!(session.begin_submit().is_none());
    }

    #[test]
    fn failed_write_rearms_submission_without_reopening_answers() {
        let mut session = fixture(5, 2);
        session.begin_submit().unwrap();
        session.submit_failed();
        assert_eq!(
            session.state(),
            SessionState::Submitting { in_flight: false }
        );
        // Retry grades again; answers stayed frozen.
        assert!(session.begin_submit().is_some());
        session.submit_succeeded(1);
        assert!(session.begin_submit().is_none());
    }

    #[test]
    fn tick_counts_down_and_expires_exactly_at_zero() {
        let mut session = fixture(1, 1);
        for expected in (1..60).rev() {
            assert_eq!(
                session.tick(),
                TickOutcome::Running {
                    remaining_seconds: expected
                }
            );
        }
        assert_eq!(session.tick(), TickOutcome::TimeExpired);
        // Submission claimed by the expiry path; further ticks halt.
        session.begin_submit().unwrap();
        assert_eq!(session.tick(), TickOutcome::Halted);
    }

    #[test]
    fn no_state_mutation_after_finished() {
        let mut session = fixture(1, 1);
        session.begin_submit().unwrap();
        session.submit_succeeded(0);
        assert_eq!(session.tick(), TickOutcome::Halted);
        assert!(session.begin_submit().is_none());
        let qid = session.questions()[0].id;
        assert!(session.record_answer(qid, AnswerValue::Choice(0)).is_err());
        assert_eq!(session.state(), SessionState::Finished { score: 0 });
    }
}
