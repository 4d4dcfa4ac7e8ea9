use std::collections::HashMap;

use uuid::Uuid;

use crate::models::attempt::NewAnswer;
use crate::models::quiz::{AnswerValue, Question, QuestionType};

/// The graded outcome of one submission: the raw score plus the answer rows
/// to persist, one per question in the quiz.
#[derive(Debug, Clone)]
pub struct GradedSubmission {
    pub score: i32,
    pub answers: Vec<NewAnswer>,
}

/// Case-fold and trim surrounding whitespace. Short answers are compared in
/// this form only; nothing else is forgiven.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn grade_question(question: &Question, recorded: Option<&AnswerValue>) -> (String, bool) {
    let stored = recorded.map(AnswerValue::as_stored).unwrap_or_default();
    let is_correct = match question.question_type {
        QuestionType::Mcq => match (recorded, question.correct_option) {
            (Some(AnswerValue::Choice(idx)), Some(correct)) => *idx == correct,
            // Unanswered, or free text recorded against an mcq question.
            _ => false,
        },
        QuestionType::ShortAnswer => {
            let expected = question.correct_answer.as_deref().unwrap_or_default();
            recorded.is_some() && normalize(&stored) == normalize(expected)
        }
    };
    (stored, is_correct)
}

/// Grade every question in the quiz against the recorded answer map.
/// Unanswered questions grade as incorrect; they never error.
pub fn grade(questions: &[Question], answers: &HashMap<Uuid, AnswerValue>) -> GradedSubmission {
    let mut score = 0;
    let graded = questions
        .iter()
        .map(|question| {
            let (stored, is_correct) = grade_question(question, answers.get(&question.id));
            if is_correct {
                score += 1;
            }
            NewAnswer {
                question_id: question.id,
                answer: stored,
                is_correct,
            }
        })
        .collect();

    GradedSubmission {
        score,
        answers: graded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq(correct: i32) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_text: "pick one".into(),
            question_type: QuestionType::Mcq,
            options: Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
            correct_option: Some(correct),
            correct_answer: None,
        }
    }

    fn short(expected: &str) -> Question {
        Question {
            id: Uuid::new_v4(),
            question_text: "write it".into(),
            question_type: QuestionType::ShortAnswer,
            options: None,
            correct_option: None,
            correct_answer: Some(expected.to_string()),
        }
    }

    #[test]
    fn mcq_correct_iff_index_matches() {
        let q = mcq(2);
        let mut answers = HashMap::new();
        answers.insert(q.id, AnswerValue::Choice(2));
        let graded = grade(std::slice::from_ref(&q), &answers);
        assert_eq!(graded.score, 1);
        assert!(graded.answers[0].is_correct);

        answers.insert(q.id, AnswerValue::Choice(1));
        let graded = grade(std::slice::from_ref(&q), &answers);
        assert_eq!(graded.score, 0);
    }

    #[test]
    fn unanswered_mcq_is_incorrect_not_an_error() {
        let q = mcq(0);
        let graded = grade(std::slice::from_ref(&q), &HashMap::new());
        assert_eq!(graded.score, 0);
        assert_eq!(graded.answers.len(), 1);
        assert_eq!(graded.answers[0].answer, "");
        assert!(!graded.answers[0].is_correct);
    }

    #[test]
    fn text_recorded_against_mcq_never_matches() {
        let q = mcq(1);
        let mut answers = HashMap::new();
        answers.insert(q.id, AnswerValue::Text("1".into()));
        let graded = grade(std::slice::from_ref(&q), &answers);
        assert!(!graded.answers[0].is_correct);
    }

    #[test]
    fn short_answer_trims_and_case_folds() {
        let q = short("Paris");
        let mut answers = HashMap::new();
        answers.insert(q.id, AnswerValue::Text(" paris ".into()));
        let graded = grade(std::slice::from_ref(&q), &answers);
        assert!(graded.answers[0].is_correct);
        assert_eq!(graded.answers[0].answer, " paris ");
    }

    #[test]
    fn short_answer_wrong_text_is_incorrect() {
        let q = short("Paris");
        let mut answers = HashMap::new();
        answers.insert(q.id, AnswerValue::Text("London".into()));
        let graded = grade(std::slice::from_ref(&q), &answers);
        assert!(!graded.answers[0].is_correct);
    }

    #[test]
    fn unanswered_short_answer_is_incorrect() {
        let q = short("Paris");
        let graded = grade(std::slice::from_ref(&q), &HashMap::new());
        assert!(!graded.answers[0].is_correct);
    }

    #[test]
    fn score_counts_correct_answers_across_a_quiz() {
        // Four mcq questions keyed [1, 0, 2, 3]; answered [1, 0, 2, 2].
        let questions: Vec<Question> = [1, 0, 2, 3].into_iter().map(mcq).collect();
        let mut answers = HashMap::new();
        for (q, given) in questions.iter().zip([1, 0, 2, 2]) {
            answers.insert(q.id, AnswerValue::Choice(given));
        }
        let graded = grade(&questions, &answers);
        assert_eq!(graded.score, 3);
        assert_eq!(graded.answers.len(), 4);
        assert!(graded.score as usize <= questions.len());
    }

    #[test]
    fn every_question_gets_exactly_one_answer_row() {
        let questions = vec![mcq(0), short("x"), mcq(3)];
        let graded = grade(&questions, &HashMap::new());
        let ids: Vec<Uuid> = graded.answers.iter().map(|a| a.question_id).collect();
        let expected: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, expected);
    }
}
