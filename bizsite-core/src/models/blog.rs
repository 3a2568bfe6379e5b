use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::project::keep_or_clear;
use super::{max_len, optional, required};
use crate::error::{AppError, AppResult};

/// Author recorded when a post does not name one.
pub const DEFAULT_AUTHOR: &str = "Site Owner";

const WORDS_PER_MINUTE: usize = 200;

/// Lowercase ASCII words joined by single hyphens.
static SLUG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug pattern"));

/// Blog article. `publicado` alone decides public visibility.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub titulo: String,
    pub slug: String,
    pub contenido: String,
    pub resumen: Option<String>,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub tags: Option<String>,
    pub publicado: bool,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_publicacion: Option<DateTime<Utc>>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub vistas: i64,
    pub autor: String,
    pub tiempo_lectura: Option<i64>,
}

impl BlogPost {
    /// Tags split out of the comma-delimited column.
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(self.tags.as_deref())
    }
}

pub fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Tags may arrive as a JSON list or as a comma-delimited string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Joined(String),
}

impl TagsInput {
    fn normalized(self) -> Option<String> {
        let tags = match self {
            TagsInput::List(list) => list,
            TagsInput::Joined(raw) => split_tags(Some(&raw)),
        };
        let joined = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogPostInput {
    pub titulo: Option<String>,
    pub slug: Option<String>,
    pub contenido: Option<String>,
    pub resumen: Option<String>,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub tags: Option<TagsInput>,
    pub publicado: Option<bool>,
    pub fecha_publicacion: Option<DateTime<Utc>>,
    pub autor: Option<String>,
    pub tiempo_lectura: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub titulo: String,
    pub slug: String,
    pub contenido: String,
    pub resumen: Option<String>,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub tags: Option<String>,
    pub publicado: bool,
    pub fecha_publicacion: Option<DateTime<Utc>>,
    pub autor: String,
    pub tiempo_lectura: Option<i64>,
}

impl BlogPostInput {
    /// Validates a new post. A missing slug is derived from the title; a
    /// published post without a publication date is stamped with `now`.
    pub fn validate(self, now: DateTime<Utc>) -> AppResult<NewBlogPost> {
        let titulo = required("titulo", self.titulo)?;
        max_len("titulo", &titulo, 200)?;
        let contenido = required("contenido", self.contenido)?;

        let slug = match optional(self.slug) {
            Some(slug) => slug,
            None => slugify(&titulo),
        };
        check_slug(&slug)?;

        let publicado = self.publicado.unwrap_or(false);
        let fecha_publicacion = match self.fecha_publicacion {
            Some(date) => Some(date),
            None if publicado => Some(now),
            None => None,
        };
        let tiempo_lectura = self
            .tiempo_lectura
            .or_else(|| Some(reading_time(&contenido)));

        Ok(NewBlogPost {
            titulo,
            slug,
            contenido,
            resumen: optional(self.resumen),
            imagen_url: optional(self.imagen_url),
            categoria: optional(self.categoria),
            tags: self.tags.and_then(TagsInput::normalized),
            publicado,
            fecha_publicacion,
            autor: optional(self.autor).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            tiempo_lectura,
        })
    }
}

impl NewBlogPost {
    pub fn merged(current: BlogPost, changes: BlogPostInput, now: DateTime<Utc>) -> AppResult<NewBlogPost> {
        let titulo = match changes.titulo {
            Some(value) => required("titulo", Some(value))?,
            None => current.titulo,
        };
        max_len("titulo", &titulo, 200)?;

        let content_changed = changes.contenido.is_some();
        let contenido = match changes.contenido {
            Some(value) => required("contenido", Some(value))?,
            None => current.contenido,
        };

        let slug = match changes.slug {
            Some(value) => required("slug", Some(value))?,
            None => current.slug,
        };
        check_slug(&slug)?;

        let publicado = changes.publicado.unwrap_or(current.publicado);
        let fecha_publicacion = match changes.fecha_publicacion.or(current.fecha_publicacion) {
            Some(date) => Some(date),
            None if publicado => Some(now),
            None => None,
        };

        let tiempo_lectura = match changes.tiempo_lectura {
            Some(minutes) => Some(minutes),
            None if content_changed => Some(reading_time(&contenido)),
            None => current.tiempo_lectura,
        };

        let tags = match changes.tags {
            Some(tags) => tags.normalized(),
            None => current.tags,
        };

        Ok(NewBlogPost {
            titulo,
            slug,
            contenido,
            resumen: keep_or_clear(changes.resumen, current.resumen),
            imagen_url: keep_or_clear(changes.imagen_url, current.imagen_url),
            categoria: keep_or_clear(changes.categoria, current.categoria),
            tags,
            publicado,
            fecha_publicacion,
            autor: optional(changes.autor).unwrap_or(current.autor),
            tiempo_lectura,
        })
    }
}

pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

fn check_slug(slug: &str) -> AppResult<()> {
    max_len("slug", slug, 200)?;
    if !is_valid_slug(slug) {
        return Err(AppError::invalid(
            "slug",
            "The slug may only contain lowercase letters, digits and single hyphens",
        ));
    }
    Ok(())
}

/// Derives a URL slug from a title, folding common accented letters.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        };
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Whole minutes at 200 words per minute, at least one.
pub fn reading_time(contenido: &str) -> i64 {
    let words = contenido.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as i64
}

/// Public list entry; omits `contenido`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogSummary {
    pub id: i64,
    pub titulo: String,
    pub slug: String,
    pub resumen: Option<String>,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub tags: Vec<String>,
    pub fecha_publicacion: Option<DateTime<Utc>>,
    pub autor: String,
    pub tiempo_lectura: Option<i64>,
    pub vistas: i64,
}

impl From<BlogPost> for BlogSummary {
    fn from(post: BlogPost) -> Self {
        let tags = post.tag_list();
        BlogSummary {
            id: post.id,
            titulo: post.titulo,
            slug: post.slug,
            resumen: post.resumen,
            imagen_url: post.imagen_url,
            categoria: post.categoria,
            tags,
            fecha_publicacion: post.fecha_publicacion,
            autor: post.autor,
            tiempo_lectura: post.tiempo_lectura,
            vistas: post.vistas,
        }
    }
}

/// Public single-post projection, including the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogDetail {
    #[serde(flatten)]
    pub summary: BlogSummary,
    pub contenido: String,
}

impl From<BlogPost> for BlogDetail {
    fn from(mut post: BlogPost) -> Self {
        let contenido = std::mem::take(&mut post.contenido);
        BlogDetail {
            summary: BlogSummary::from(post),
            contenido,
        }
    }
}

/// Administrative view: every column, tags as a list.
#[derive(Debug, Clone, Serialize)]
pub struct BlogPostView {
    pub id: i64,
    pub titulo: String,
    pub slug: String,
    pub resumen: Option<String>,
    pub contenido: String,
    pub imagen_url: Option<String>,
    pub categoria: Option<String>,
    pub tags: Vec<String>,
    pub publicado: bool,
    pub vistas: i64,
    pub autor: String,
    pub tiempo_lectura: Option<i64>,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_publicacion: Option<DateTime<Utc>>,
    pub fecha_actualizacion: DateTime<Utc>,
}

impl From<BlogPost> for BlogPostView {
    fn from(post: BlogPost) -> Self {
        let tags = post.tag_list();
        BlogPostView {
            id: post.id,
            titulo: post.titulo,
            slug: post.slug,
            resumen: post.resumen,
            contenido: post.contenido,
            imagen_url: post.imagen_url,
            categoria: post.categoria,
            tags,
            publicado: post.publicado,
            vistas: post.vistas,
            autor: post.autor,
            tiempo_lectura: post.tiempo_lectura,
            fecha_creacion: post.fecha_creacion,
            fecha_publicacion: post.fecha_publicacion,
            fecha_actualizacion: post.fecha_actualizacion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_folds_accents_and_punctuation() {
        assert_eq!(slugify("Automatización de Reportes!"), "automatizacion-de-reportes");
        assert_eq!(slugify("  POS -- para   farmacia "), "pos-para-farmacia");
        assert!(is_valid_slug(&slugify("Año nuevo, código nuevo")));
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("hello-world-2"));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug("double--dash"));
        assert!(!is_valid_slug("-leading"));
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time("one two"), 1);
        assert_eq!(reading_time(&"word ".repeat(401)), 3);
    }

    #[test]
    fn test_tags_normalized_from_either_form() {
        assert_eq!(
            TagsInput::List(vec![" rust ".into(), "".into(), "web".into()]).normalized(),
            Some("rust,web".to_string())
        );
        assert_eq!(TagsInput::Joined(" , ".into()).normalized(), None);
        assert_eq!(split_tags(Some("a, b,,c")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_publishing_stamps_publication_date() {
        let now = Utc::now();
        let post = BlogPostInput {
            titulo: Some("Hola Mundo".into()),
            contenido: Some("texto".into()),
            publicado: Some(true),
            ..Default::default()
        }
        .validate(now)
        .unwrap();
        assert_eq!(post.slug, "hola-mundo");
        assert_eq!(post.fecha_publicacion, Some(now));
        assert_eq!(post.autor, DEFAULT_AUTHOR);
        assert_eq!(post.tiempo_lectura, Some(1));
    }

    #[test]
    fn test_draft_has_no_publication_date() {
        let post = BlogPostInput {
            titulo: Some("Draft".into()),
            contenido: Some("texto".into()),
            ..Default::default()
        }
        .validate(Utc::now())
        .unwrap();
        assert!(!post.publicado);
        assert_eq!(post.fecha_publicacion, None);
    }
}
