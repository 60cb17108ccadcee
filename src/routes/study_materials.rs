use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::TryStreamExt;
use mongodb::bson::doc;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::db::models::StudyMaterial;
use crate::error::{AppError, AppResult};
use crate::routes::parse_object_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/studyMaterials", get(list).post(create))
        .route("/studyMaterials/{id}", get(get_by_id).delete(delete_by_id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStudyMaterial {
    subject_name: Option<String>,
    subject_code: Option<String>,
    faculty_name: Option<String>,
    #[serde(rename = "type")]
    material_type: Option<String>,
    file_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StudyMaterialResponse {
    #[serde(rename = "_id")]
    id: String,
    subject_name: String,
    subject_code: String,
    faculty_name: String,
    #[serde(rename = "type")]
    material_type: String,
    file_url: String,
}

impl StudyMaterialResponse {
    fn from_material(material: StudyMaterial) -> Self {
        Self {
            id: material.id.map(|id| id.to_hex()).unwrap_or_default(),
            subject_name: material.subject_name,
            subject_code: material.subject_code,
            faculty_name: material.faculty_name,
            material_type: material.material_type,
            file_url: material.file_url,
        }
    }
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<StudyMaterialResponse>>> {
    let materials: Vec<StudyMaterial> = db::study_materials(&state.db)
        .find(doc! {})
        .await?
        .try_collect()
        .await?;

    Ok(Json(
        materials
            .into_iter()
            .map(StudyMaterialResponse::from_material)
            .collect(),
    ))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<StudyMaterialResponse>> {
    let id = parse_object_id(&id)?;
    let material = db::study_materials(&state.db)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| AppError::NotFound("Material not found".into()))?;

    Ok(Json(StudyMaterialResponse::from_material(material)))
}

/// POST /studyMaterials — every field is required; there is no update
/// operation, records are replaced by delete + create.
async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateStudyMaterial>,
) -> AppResult<Response> {
    let material = body.into_material()?;
    let result = db::study_materials(&state.db).insert_one(&material).await?;
    let id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::Internal("unexpected inserted id type".into()))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Study material added",
            "id": id.to_hex(),
        })),
    )
        .into_response())
}

async fn delete_by_id(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let id = parse_object_id(&id)?;
    let result = db::study_materials(&state.db)
        .delete_one(doc! { "_id": id })
        .await?;

    if result.deleted_count == 0 {
        return Err(AppError::NotFound("Material not found".into()));
    }

    Ok(Json(serde_json::json!({ "message": "Study material deleted" })).into_response())
}

impl CreateStudyMaterial {
    fn into_material(self) -> Result<StudyMaterial, AppError> {
        match (
            self.subject_name,
            self.subject_code,
            self.faculty_name,
            self.material_type,
            self.file_url,
        ) {
            (
                Some(subject_name),
                Some(subject_code),
                Some(faculty_name),
                Some(material_type),
                Some(file_url),
            ) if !subject_name.is_empty()
                && !subject_code.is_empty()
                && !faculty_name.is_empty()
                && !material_type.is_empty()
                && !file_url.is_empty() =>
            {
                Ok(StudyMaterial {
                    id: None,
                    subject_name,
                    subject_code,
                    faculty_name,
                    material_type,
                    file_url,
                })
            }
            _ => Err(AppError::BadRequest("All fields are required".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_body() -> CreateStudyMaterial {
        CreateStudyMaterial {
            subject_name: Some("Physics".into()),
            subject_code: Some("PHY101".into()),
            faculty_name: Some("Dr. Rao".into()),
            material_type: Some("notes".into()),
            file_url: Some("https://example.com/notes.pdf".into()),
        }
    }

    #[test]
    fn create_requires_every_field() {
        assert!(full_body().into_material().is_ok());

        let mut missing = full_body();
        missing.file_url = None;
        assert!(missing.into_material().is_err());

        let mut empty = full_body();
        empty.subject_code = Some("".into());
        assert!(empty.into_material().is_err());
    }

    #[test]
    fn create_maps_the_type_field() {
        let material = full_body().into_material().unwrap();
        assert_eq!(material.material_type, "notes");

        let value = serde_json::to_value(StudyMaterialResponse::from_material(material)).unwrap();
        assert_eq!(value["type"], "notes");
        assert_eq!(value["subjectName"], "Physics");
    }
}
