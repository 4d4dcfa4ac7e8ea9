use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::attempt::QuizAttempt;
use crate::models::classroom::RosterEntry;
use crate::models::material::{Material, ViewRecord};
use crate::models::quiz::QuizDigest;
use crate::store::EngagementStore;

const QUIZ_WEIGHT: f64 = 0.6;
const MATERIAL_WEIGHT: f64 = 0.2;
const VIDEO_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Serialize)]
pub struct StudentMetrics {
    pub student_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub materials_viewed: usize,
    pub videos_watched: usize,
    pub material_pct: f64,
    pub video_pct: f64,
    pub quiz_avg: f64,
    pub overall_score: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassAverages {
    pub material_pct: f64,
    pub video_pct: f64,
    pub quiz_avg: f64,
    pub overall: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassroomReport {
    pub students: Vec<StudentMetrics>,
    pub averages: ClassAverages,
}

/// Computes the ranked engagement/performance table for a classroom. Inputs
/// are pulled fresh on every call; any read failure aborts the whole
/// computation rather than rendering a partial table.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn EngagementStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn EngagementStore>) -> Self {
        Self { store }
    }

    pub async fn classroom_report(&self, classroom_id: Uuid) -> Result<ClassroomReport> {
        let roster = self.store.fetch_roster(classroom_id).await?;
        let materials = self.store.fetch_materials(classroom_id).await?;
        let material_views = self.store.fetch_material_views(classroom_id).await?;
        let video_views = self.store.fetch_video_views(classroom_id).await?;
        let quizzes = self.store.fetch_quizzes(classroom_id).await?;
        let quiz_ids: Vec<Uuid> = quizzes.iter().map(|q| q.id).collect();
        let attempts = self.store.fetch_attempts_for_quizzes(quiz_ids).await?;

        Ok(compute_classroom_report(
            &roster,
            &materials,
            &material_views,
            &video_views,
            &quizzes,
            &attempts,
        ))
    }
}

fn clamp_pct(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}

fn coverage_pct(viewed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    clamp_pct(viewed as f64 / total as f64 * 100.0)
}

/// Distinct resources each student has viewed, regardless of how many raw
/// event rows a double click produced.
fn distinct_views(views: &[ViewRecord]) -> HashMap<Uuid, HashSet<Uuid>> {
    let mut by_student: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for view in views {
        by_student
            .entry(view.student_id)
            .or_default()
            .insert(view.material_id);
    }
    by_student
}

pub fn compute_classroom_report(
    roster: &[RosterEntry],
    materials: &[Material],
    material_views: &[ViewRecord],
    video_views: &[ViewRecord],
    quizzes: &[QuizDigest],
    attempts: &[QuizAttempt],
) -> ClassroomReport {
    let total_materials = materials.iter().filter(|m| !m.is_video()).count();
    let total_videos = materials.iter().filter(|m| m.is_video()).count();

    let materials_by_student = distinct_views(material_views);
    let videos_by_student = distinct_views(video_views);

    let question_counts: HashMap<Uuid, i32> =
        quizzes.iter().map(|q| (q.id, q.question_count)).collect();
    let mut attempts_by_student: HashMap<Uuid, Vec<&QuizAttempt>> = HashMap::new();
    for attempt in attempts {
        attempts_by_student
            .entry(attempt.student_id)
            .or_default()
            .push(attempt);
    }

    let mut students: Vec<StudentMetrics> = roster
        .iter()
        .map(|entry| {
            let materials_viewed = materials_by_student
                .get(&entry.student_id)
                .map_or(0, HashSet::len);
            let videos_watched = videos_by_student
                .get(&entry.student_id)
                .map_or(0, HashSet::len);

            let material_pct = coverage_pct(materials_viewed, total_materials);
            let video_pct = coverage_pct(videos_watched, total_videos);

            // Percentage is always derived from the raw score; no stored
            // percentage field exists to drift from it.
            let quiz_avg = attempts_by_student
                .get(&entry.student_id)
                .filter(|list| !list.is_empty())
                .map(|list| {
                    let sum: f64 = list
                        .iter()
                        .map(|attempt| {
                            let total = question_counts
                                .get(&attempt.quiz_id)
                                .copied()
                                .unwrap_or_default();
                            if total > 0 {
                                attempt.score as f64 / total as f64 * 100.0
                            } else {
                                0.0
                            }
                        })
                        .sum();
                    sum / list.len() as f64
                })
                .unwrap_or(0.0);

            let overall = quiz_avg * QUIZ_WEIGHT
                + material_pct * MATERIAL_WEIGHT
                + video_pct * VIDEO_WEIGHT;

            StudentMetrics {
                student_id: entry.student_id,
                full_name: entry.full_name.clone(),
                email: entry.email.clone(),
                materials_viewed,
                videos_watched,
                material_pct,
                video_pct,
                quiz_avg,
                overall_score: overall.round() as i64,
            }
        })
        .collect();

    // Rank: overall descending, ties by name ascending, case-insensitive.
    students.sort_by(|a, b| {
        b.overall_score
            .cmp(&a.overall_score)
            .then_with(|| a.full_name.to_lowercase().cmp(&b.full_name.to_lowercase()))
    });

    let averages = if students.is_empty() {
        ClassAverages::default()
    } else {
        let count = students.len() as f64;
        ClassAverages {
            material_pct: students.iter().map(|s| s.material_pct).sum::<f64>() / count,
            video_pct: students.iter().map(|s| s.video_pct).sum::<f64>() / count,
            quiz_avg: students.iter().map(|s| s.quiz_avg).sum::<f64>() / count,
            overall: students.iter().map(|s| s.overall_score as f64).sum::<f64>() / count,
        }
    };

    ClassroomReport { students, averages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MockEngagementStore;
    use chrono::Utc;

    fn student(name: &str) -> RosterEntry {
        RosterEntry {
            student_id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            joined_at: Utc::now(),
        }
    }

    fn material(classroom_id: Uuid, kind: &str) -> Material {
        Material {
            id: Uuid::new_v4(),
            classroom_id,
            title: "m".into(),
            kind: kind.to_string(),
            url: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    fn view(student_id: Uuid, material_id: Uuid, classroom_id: Uuid) -> ViewRecord {
        ViewRecord {
            student_id,
            material_id,
            classroom_id,
            viewed_at: Utc::now(),
        }
    }

    fn attempt(quiz_id: Uuid, student_id: Uuid, score: i32) -> QuizAttempt {
        QuizAttempt {
            id: Uuid::new_v4(),
            quiz_id,
            student_id,
            score,
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn material_pct_from_distinct_views() {
        let classroom_id = Uuid::new_v4();
        let alice = student("Alice");
        let materials: Vec<Material> = (0..5)
            .map(|_| material(classroom_id, "document"))
            .collect();
        let views: Vec<ViewRecord> = materials[..3]
            .iter()
            .map(|m| view(alice.student_id, m.id, classroom_id))
            .collect();

        let report =
            compute_classroom_report(&[alice], &materials, &views, &[], &[], &[]);
        assert_eq!(report.students[0].materials_viewed, 3);
        assert!((report.students[0].material_pct - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_views_neither_inflate_nor_exceed_cap() {
        let classroom_id = Uuid::new_v4();
        let alice = student("Alice");
        let doc = material(classroom_id, "document");
        // The same material viewed four times, simulating a double click.
        let views: Vec<ViewRecord> = (0..4)
            .map(|_| view(alice.student_id, doc.id, classroom_id))
            .collect();

        let report = compute_classroom_report(
            &[alice],
            std::slice::from_ref(&doc),
            &views,
            &[],
            &[],
            &[],
        );
        assert_eq!(report.students[0].materials_viewed, 1);
        assert!((report.students[0].material_pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_denominators_yield_zero_not_nan() {
        let alice = student("Alice");
        let report = compute_classroom_report(&[alice], &[], &[], &[], &[], &[]);
        let metrics = &report.students[0];
        assert_eq!(metrics.material_pct, 0.0);
        assert_eq!(metrics.video_pct, 0.0);
        assert_eq!(metrics.quiz_avg, 0.0);
        assert_eq!(metrics.overall_score, 0);
    }

    #[test]
    fn overall_blends_weights_and_rounds() {
        let classroom_id = Uuid::new_v4();
        let alice = student("Alice");
        let doc = material(classroom_id, "document");
        let vid = material(classroom_id, "video");
        let quiz = QuizDigest {
            id: Uuid::new_v4(),
            title: "quiz".into(),
            question_count: 4,
        };
        let attempts = vec![attempt(quiz.id, alice.student_id, 3)];
        let material_views = vec![view(alice.student_id, doc.id, classroom_id)];
        let video_views = vec![view(alice.student_id, vid.id, classroom_id)];

        let report = compute_classroom_report(
            &[alice],
            &[doc, vid],
            &material_views,
            &video_views,
            &[quiz],
            &attempts,
        );
        let metrics = &report.students[0];
        // 75 * 0.6 + 100 * 0.2 + 100 * 0.2 = 85
        assert!((metrics.quiz_avg - 75.0).abs() < f64::EPSILON);
        assert_eq!(metrics.overall_score, 85);
    }

    #[test]
    fn no_attempts_leaves_only_engagement_weight() {
        let classroom_id = Uuid::new_v4();
        let alice = student("Alice");
        let doc = material(classroom_id, "document");
        let material_views = vec![view(alice.student_id, doc.id, classroom_id)];

        let report = compute_classroom_report(
            &[alice],
            std::slice::from_ref(&doc),
            &material_views,
            &[],
            &[],
            &[],
        );
        let metrics = &report.students[0];
        assert_eq!(metrics.quiz_avg, 0.0);
        // 0 * 0.6 + 100 * 0.2 + 0 * 0.2
        assert_eq!(metrics.overall_score, 20);
    }

    #[test]
    fn ranking_sorts_overall_desc_with_name_tiebreak() {
        let quiz = QuizDigest {
            id: Uuid::new_v4(),
            title: "quiz".into(),
            question_count: 2,
        };
        let zoe = student("zoe");
        let bob = student("Bob");
        let amy = student("amy");
        let attempts = vec![
            attempt(quiz.id, zoe.student_id, 1),
            attempt(quiz.id, bob.student_id, 2),
            attempt(quiz.id, amy.student_id, 1),
        ];

        let report = compute_classroom_report(
            &[zoe.clone(), bob.clone(), amy.clone()],
            &[],
            &[],
            &[],
            std::slice::from_ref(&quiz),
            &attempts,
        );
        let names: Vec<&str> = report
            .students
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["Bob", "amy", "zoe"]);
    }

    #[test]
    fn class_averages_are_means_of_student_metrics() {
        let quiz = QuizDigest {
            id: Uuid::new_v4(),
            title: "quiz".into(),
            question_count: 2,
        };
        let a = student("A");
        let b = student("B");
        let attempts = vec![
            attempt(quiz.id, a.student_id, 2),
            attempt(quiz.id, b.student_id, 1),
        ];
        let report = compute_classroom_report(
            &[a, b],
            &[],
            &[],
            &[],
            std::slice::from_ref(&quiz),
            &attempts,
        );
        assert!((report.averages.quiz_avg - 75.0).abs() < f64::EPSILON);
        assert!((report.averages.overall - 45.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_roster_yields_empty_report() {
        let report = compute_classroom_report(&[], &[], &[], &[], &[], &[]);
        assert!(report.students.is_empty());
        assert_eq!(report.averages.overall, 0.0);
    }

    #[tokio::test]
    async fn any_read_failure_aborts_the_computation() {
        let mut store = MockEngagementStore::new();
        store.expect_fetch_roster().returning(|_| {
            Ok(vec![RosterEntry {
                student_id: Uuid::new_v4(),
                full_name: "Alice".into(),
                email: "alice@example.com".into(),
                joined_at: Utc::now(),
            }])
        });
        store
            .expect_fetch_materials()
            .returning(|_| Err(Error::Internal("materials read failed".to_string())));

        let service = AnalyticsService::new(Arc::new(store));
        assert!(service.classroom_report(Uuid::new_v4()).await.is_err());
    }
}
