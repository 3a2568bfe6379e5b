use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::project::keep_or_clear;
use super::{optional, required};
use crate::error::{AppError, AppResult};

/// Accepted range for `calificacion`. Storage does not enforce it.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Testimonial {
    pub id: i64,
    pub nombre_cliente: String,
    pub empresa: Option<String>,
    pub cargo: Option<String>,
    pub testimonio: String,
    pub imagen_url: Option<String>,
    pub activo: bool,
    pub orden: i64,
    pub calificacion: i64,
    pub proyecto_relacionado: Option<String>,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestimonialInput {
    pub nombre_cliente: Option<String>,
    pub empresa: Option<String>,
    pub cargo: Option<String>,
    pub testimonio: Option<String>,
    pub imagen_url: Option<String>,
    pub activo: Option<bool>,
    pub orden: Option<i64>,
    pub calificacion: Option<i64>,
    pub proyecto_relacionado: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub nombre_cliente: String,
    pub empresa: Option<String>,
    pub cargo: Option<String>,
    pub testimonio: String,
    pub imagen_url: Option<String>,
    pub activo: bool,
    pub orden: i64,
    pub calificacion: i64,
    pub proyecto_relacionado: Option<String>,
}

fn check_rating(calificacion: i64) -> AppResult<i64> {
    if RATING_RANGE.contains(&calificacion) {
        Ok(calificacion)
    } else {
        Err(AppError::invalid(
            "calificacion",
            "The rating must be between 1 and 5",
        ))
    }
}

impl TestimonialInput {
    pub fn validate(self) -> AppResult<NewTestimonial> {
        Ok(NewTestimonial {
            nombre_cliente: required("nombre_cliente", self.nombre_cliente)?,
            empresa: optional(self.empresa),
            cargo: optional(self.cargo),
            testimonio: required("testimonio", self.testimonio)?,
            imagen_url: optional(self.imagen_url),
            activo: self.activo.unwrap_or(true),
            orden: self.orden.unwrap_or(0),
            calificacion: check_rating(self.calificacion.unwrap_or(5))?,
            proyecto_relacionado: optional(self.proyecto_relacionado),
        })
    }
}

impl NewTestimonial {
    pub fn merged(current: Testimonial, changes: TestimonialInput) -> AppResult<NewTestimonial> {
        let nombre_cliente = match changes.nombre_cliente {
            Some(value) => required("nombre_cliente", Some(value))?,
            None => current.nombre_cliente,
        };
        let testimonio = match changes.testimonio {
            Some(value) => required("testimonio", Some(value))?,
            None => current.testimonio,
        };

        Ok(NewTestimonial {
            nombre_cliente,
            empresa: keep_or_clear(changes.empresa, current.empresa),
            cargo: keep_or_clear(changes.cargo, current.cargo),
            testimonio,
            imagen_url: keep_or_clear(changes.imagen_url, current.imagen_url),
            activo: changes.activo.unwrap_or(current.activo),
            orden: changes.orden.unwrap_or(current.orden),
            calificacion: check_rating(changes.calificacion.unwrap_or(current.calificacion))?,
            proyecto_relacionado: keep_or_clear(
                changes.proyecto_relacionado,
                current.proyecto_relacionado,
            ),
        })
    }
}

/// Public projection of an active testimonial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestimonialPublic {
    pub id: i64,
    pub nombre_cliente: String,
    pub empresa: Option<String>,
    pub cargo: Option<String>,
    pub testimonio: String,
    pub imagen_url: Option<String>,
    pub calificacion: i64,
    pub proyecto_relacionado: Option<String>,
}

impl From<Testimonial> for TestimonialPublic {
    fn from(t: Testimonial) -> Self {
        TestimonialPublic {
            id: t.id,
            nombre_cliente: t.nombre_cliente,
            empresa: t.empresa,
            cargo: t.cargo,
            testimonio: t.testimonio,
            imagen_url: t.imagen_url,
            calificacion: t.calificacion,
            proyecto_relacionado: t.proyecto_relacionado,
        }
    }
}
