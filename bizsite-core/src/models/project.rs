use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{max_len, optional, required};
use crate::error::AppResult;

/// A portfolio case study shown on the public site.
///
/// `orden` is the ascending display key of the public listing. Inactive
/// projects stay visible to administrators only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub titulo: String,
    pub descripcion_problema: String,
    pub descripcion_solucion: String,
    pub resultados: String,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub activo: bool,
    pub orden: i64,
    pub cliente: Option<String>,
    pub tecnologias: Option<String>,
    pub duracion: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
}

/// Create request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInput {
    pub titulo: Option<String>,
    pub descripcion_problema: Option<String>,
    pub descripcion_solucion: Option<String>,
    pub resultados: Option<String>,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub activo: Option<bool>,
    pub orden: Option<i64>,
    pub cliente: Option<String>,
    pub tecnologias: Option<String>,
    pub duracion: Option<String>,
}

/// Validated project ready for insertion.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub titulo: String,
    pub descripcion_problema: String,
    pub descripcion_solucion: String,
    pub resultados: String,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub activo: bool,
    pub orden: i64,
    pub cliente: Option<String>,
    pub tecnologias: Option<String>,
    pub duracion: Option<String>,
}

impl ProjectInput {
    pub fn validate(self) -> AppResult<NewProject> {
        let titulo = required("titulo", self.titulo)?;
        max_len("titulo", &titulo, 200)?;
        Ok(NewProject {
            titulo,
            descripcion_problema: required("descripcion_problema", self.descripcion_problema)?,
            descripcion_solucion: required("descripcion_solucion", self.descripcion_solucion)?,
            resultados: required("resultados", self.resultados)?,
            imagen_url: optional(self.imagen_url),
            categoria: optional(self.categoria),
            activo: self.activo.unwrap_or(true),
            orden: self.orden.unwrap_or(0),
            cliente: optional(self.cliente),
            tecnologias: optional(self.tecnologias),
            duracion: optional(self.duracion),
        })
    }
}

impl NewProject {
    /// Applies an update request on top of an existing row. Absent fields
    /// keep their value; blank optional fields are cleared.
    pub fn merged(current: Project, changes: ProjectInput) -> AppResult<NewProject> {
        let pick = |field: &str, change: Option<String>, current: String| -> AppResult<String> {
            match change {
                Some(value) => required(field, Some(value)),
                None => Ok(current),
            }
        };
        let titulo = pick("titulo", changes.titulo, current.titulo)?;
        max_len("titulo", &titulo, 200)?;

        Ok(NewProject {
            titulo,
            descripcion_problema: pick(
                "descripcion_problema",
                changes.descripcion_problema,
                current.descripcion_problema,
            )?,
            descripcion_solucion: pick(
                "descripcion_solucion",
                changes.descripcion_solucion,
                current.descripcion_solucion,
            )?,
            resultados: pick("resultados", changes.resultados, current.resultados)?,
            imagen_url: keep_or_clear(changes.imagen_url, current.imagen_url),
            categoria: keep_or_clear(changes.categoria, current.categoria),
            activo: changes.activo.unwrap_or(current.activo),
            orden: changes.orden.unwrap_or(current.orden),
            cliente: keep_or_clear(changes.cliente, current.cliente),
            tecnologias: keep_or_clear(changes.tecnologias, current.tecnologias),
            duracion: keep_or_clear(changes.duracion, current.duracion),
        })
    }
}

/// `None` keeps the current value, `Some("")` clears it.
pub(crate) fn keep_or_clear(change: Option<String>, current: Option<String>) -> Option<String> {
    match change {
        Some(value) => optional(Some(value)),
        None => current,
    }
}

/// Public projection of an active project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPublic {
    pub id: i64,
    pub titulo: String,
    pub descripcion_problema: String,
    pub descripcion_solucion: String,
    pub resultados: String,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub cliente: Option<String>,
    pub tecnologias: Option<String>,
    pub duracion: Option<String>,
}

impl From<Project> for ProjectPublic {
    fn from(project: Project) -> Self {
        ProjectPublic {
            id: project.id,
            titulo: project.titulo,
            descripcion_problema: project.descripcion_problema,
            descripcion_solucion: project.descripcion_solucion,
            resultados: project.resultados,
            imagen_url: project.imagen_url,
            categoria: project.categoria,
            cliente: project.cliente,
            tecnologias: project.tecnologias,
            duracion: project.duracion,
        }
    }
}
