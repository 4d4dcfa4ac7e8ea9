use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::material_dto::CreateMaterialRequest;
use crate::error::{Error, Result};
use crate::models::material::{Material, MATERIAL_KINDS};

#[derive(Clone)]
pub struct MaterialService {
    pool: PgPool,
}

impl MaterialService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_material(
        &self,
        classroom_id: Uuid,
        payload: CreateMaterialRequest,
    ) -> Result<Material> {
        if !MATERIAL_KINDS.contains(&payload.kind.as_str()) {
            return Err(Error::BadRequest(format!(
                "Unknown material kind '{}'",
                payload.kind
            )));
        }
        let material = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (classroom_id, title, kind, url, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, classroom_id, title, kind, url, created_by, created_at
            "#,
        )
        .bind(classroom_id)
        .bind(&payload.title)
        .bind(&payload.kind)
        .bind(&payload.url)
        .bind(payload.teacher_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(material_id = %material.id, %classroom_id, "Material created");
        Ok(material)
    }

    pub async fn list_materials(&self, classroom_id: Uuid) -> Result<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(
            r#"SELECT id, classroom_id, title, kind, url, created_by, created_at
               FROM materials
               WHERE classroom_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(classroom_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(materials)
    }

    /// Marks a material as viewed by a student. Repeat views are dropped at
    /// the database so engagement coverage counts each material once.
    pub async fn record_view(&self, material_id: Uuid, student_id: Uuid) -> Result<()> {
        let material = sqlx::query_as::<_, Material>(
            r#"SELECT id, classroom_id, title, kind, url, created_by, created_at
               FROM materials WHERE id = $1"#,
        )
        .bind(material_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Material not found".to_string()))?;

        let table = if material.is_video() {
            "video_views"
        } else {
            "material_views"
        };
        let sql = format!(
            "INSERT INTO {} (material_id, classroom_id, student_id) VALUES ($1, $2, $3)
             ON CONFLICT (material_id, student_id) DO NOTHING",
            table
        );
        sqlx::query(&sql)
            .bind(material_id)
            .bind(material.classroom_id)
            .bind(student_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
