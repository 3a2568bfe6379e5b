use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{max_len, optional, required};
use crate::error::{AppError, AppResult};

/// An inbound contact-form submission.
///
/// Maps to the `contact_message` table. `fecha` is written once at insert;
/// `leido` only ever moves from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: i64,
    pub nombre: String,
    pub email: String,
    pub telefono: Option<String>,
    pub servicio: String,
    pub mensaje: String,
    pub leido: bool,
    pub fecha: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub respuesta: Option<String>,
    pub fecha_respuesta: Option<DateTime<Utc>>,
}

/// Raw contact-form body. Every field is optional so that missing fields
/// surface as validation errors naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactForm {
    pub nombre: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub servicio: Option<String>,
    pub mensaje: Option<String>,
}

/// A validated submission ready for insertion.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub nombre: String,
    pub email: String,
    pub telefono: Option<String>,
    pub servicio: String,
    pub mensaje: String,
    pub ip_address: Option<String>,
}

impl ContactForm {
    /// Checks required fields in order (nombre, email, servicio, mensaje),
    /// then formats and lengths.
    pub fn validate(self, ip_address: Option<String>) -> AppResult<NewContactMessage> {
        let nombre = required("nombre", self.nombre)?;
        let email = required("email", self.email)?;
        let servicio = required("servicio", self.servicio)?;
        let mensaje = required("mensaje", self.mensaje)?;
        let telefono = optional(self.telefono);

        if !is_plausible_email(&email) {
            return Err(AppError::invalid("email", "The email address is not valid"));
        }

        max_len("nombre", &nombre, 100)?;
        max_len("email", &email, 120)?;
        max_len("servicio", &servicio, 50)?;
        if let Some(ref telefono) = telefono {
            max_len("telefono", telefono, 20)?;
        }

        Ok(NewContactMessage {
            nombre,
            email,
            telefono,
            servicio,
            mensaje,
            ip_address,
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Reply written by an administrator.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyRequest {
    pub respuesta: Option<String>,
}

/// Compact message row for dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSummary {
    pub id: i64,
    pub nombre: String,
    pub email: String,
    pub servicio: String,
    pub fecha: DateTime<Utc>,
    pub leido: bool,
}

impl From<ContactMessage> for MessageSummary {
    fn from(message: ContactMessage) -> Self {
        MessageSummary {
            id: message.id,
            nombre: message.nombre,
            email: message.email,
            servicio: message.servicio,
            fecha: message.fecha,
            leido: message.leido,
        }
    }
}
