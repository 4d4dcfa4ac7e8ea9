use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::announcement::{Announcement, AnnouncementComment};

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementWithComments {
    #[serde(flatten)]
    pub announcement: Announcement,
    pub comments: Vec<AnnouncementComment>,
}

#[derive(Clone)]
pub struct AnnouncementService {
    pool: PgPool,
}

impl AnnouncementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn post_announcement(
        &self,
        classroom_id: Uuid,
        author_id: Uuid,
        title: String,
        content: String,
    ) -> Result<Announcement> {
        let announcement = sqlx::query_as::<_, Announcement>(
            r#"
            INSERT INTO announcements (classroom_id, author_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, classroom_id, author_id, title, content, created_at
            "#,
        )
        .bind(classroom_id)
        .bind(author_id)
        .bind(&title)
        .bind(&content)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(announcement_id = %announcement.id, %classroom_id, "Announcement posted");
        Ok(announcement)
    }

    /// Announcements newest first, each with its comments oldest first.
    pub async fn list_with_comments(
        &self,
        classroom_id: Uuid,
    ) -> Result<Vec<AnnouncementWithComments>> {
        let announcements = sqlx::query_as::<_, Announcement>(
            r#"SELECT id, classroom_id, author_id, title, content, created_at
               FROM announcements
               WHERE classroom_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;

        let comments = sqlx::query_as::<_, AnnouncementComment>(
            r#"
            SELECT ac.id, ac.announcement_id, ac.author_id, ac.content, ac.created_at
            FROM announcement_comments ac
            JOIN announcements a ON a.id = ac.announcement_id
            WHERE a.classroom_id = $1
            ORDER BY ac.created_at ASC
            "#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(announcements
            .into_iter()
            .map(|announcement| {
                let own = comments
                    .iter()
                    .filter(|c| c.announcement_id == announcement.id)
                    .cloned()
                    .collect();
                AnnouncementWithComments {
                    announcement,
                    comments: own,
                }
            })
            .collect())
    }

    pub async fn add_comment(
        &self,
        announcement_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<AnnouncementComment> {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM announcements WHERE id = $1")
                .bind(announcement_id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(Error::NotFound("Announcement not found".to_string()));
        }

        let comment = sqlx::query_as::<_, AnnouncementComment>(
            r#"
            INSERT INTO announcement_comments (announcement_id, author_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, announcement_id, author_id, content, created_at
            "#,
        )
        .bind(announcement_id)
        .bind(author_id)
        .bind(&content)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }
}
