use sqlx::{QueryBuilder, Sqlite};

use super::{FilterSpec, Listed};
use crate::models::{BlogPost, ContactMessage, Project, Testimonial};

/// `read` filter over `contact_message.leido`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadFilter {
    /// Unknown values mean no filtering.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("unread") => ReadFilter::Unread,
            Some("read") => ReadFilter::Read,
            _ => ReadFilter::All,
        }
    }

    fn flag(self) -> Option<bool> {
        match self {
            ReadFilter::All => None,
            ReadFilter::Unread => Some(false),
            ReadFilter::Read => Some(true),
        }
    }
}

/// `active` filter over the `activo` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl ActiveFilter {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("active") => ActiveFilter::Active,
            Some("inactive") => ActiveFilter::Inactive,
            _ => ActiveFilter::All,
        }
    }

    fn flag(self) -> Option<bool> {
        match self {
            ActiveFilter::All => None,
            ActiveFilter::Active => Some(true),
            ActiveFilter::Inactive => Some(false),
        }
    }
}

/// `published` filter over `blog_post.publicado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishedFilter {
    #[default]
    All,
    Published,
    Draft,
}

impl PublishedFilter {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("published") => PublishedFilter::Published,
            Some("draft") => PublishedFilter::Draft,
            _ => PublishedFilter::All,
        }
    }

    fn flag(self) -> Option<bool> {
        match self {
            PublishedFilter::All => None,
            PublishedFilter::Published => Some(true),
            PublishedFilter::Draft => Some(false),
        }
    }
}

/// Exact-match filter over a free-text discriminator column
/// (`servicio`, `categoria`). `all` and blank values disable it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Discriminator {
    #[default]
    All,
    Exact(String),
}

impl Discriminator {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if !value.is_empty() && value != "all" => {
                Discriminator::Exact(value.to_string())
            }
            _ => Discriminator::All,
        }
    }
}

fn push_flag(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, flag: Option<bool>) {
    if let Some(flag) = flag {
        qb.push(format!(" AND {} = ", column)).push_bind(flag);
    }
}

fn push_exact(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, value: &Discriminator) {
    if let Discriminator::Exact(value) = value {
        qb.push(format!(" AND {} = ", column)).push_bind(value.clone());
    }
}

impl Listed for ContactMessage {
    const TABLE: &'static str = "contact_message";
    const CREATED_COLUMN: &'static str = "fecha";
}

impl Listed for Project {
    const TABLE: &'static str = "project";
    const CREATED_COLUMN: &'static str = "fecha_creacion";
}

impl Listed for Testimonial {
    const TABLE: &'static str = "testimonial";
    const CREATED_COLUMN: &'static str = "fecha_creacion";
}

impl Listed for BlogPost {
    const TABLE: &'static str = "blog_post";
    const CREATED_COLUMN: &'static str = "fecha_creacion";
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFilter {
    pub read: ReadFilter,
    pub service: Discriminator,
}

impl FilterSpec for MessageFilter {
    type Entity = ContactMessage;

    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        push_flag(qb, "leido", self.read.flag());
        push_exact(qb, "servicio", &self.service);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub active: ActiveFilter,
    pub category: Discriminator,
}

impl ProjectFilter {
    pub fn visible() -> Self {
        Self {
            active: ActiveFilter::Active,
            category: Discriminator::All,
        }
    }
}

impl FilterSpec for ProjectFilter {
    type Entity = Project;

    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        push_flag(qb, "activo", self.active.flag());
        push_exact(qb, "categoria", &self.category);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestimonialFilter {
    pub active: ActiveFilter,
}

impl TestimonialFilter {
    pub fn visible() -> Self {
        Self {
            active: ActiveFilter::Active,
        }
    }
}

impl FilterSpec for TestimonialFilter {
    type Entity = Testimonial;

    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        push_flag(qb, "activo", self.active.flag());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilter {
    pub published: PublishedFilter,
    pub category: Discriminator,
}

impl BlogFilter {
    pub fn visible() -> Self {
        Self {
            published: PublishedFilter::Published,
            category: Discriminator::All,
        }
    }
}

impl FilterSpec for BlogFilter {
    type Entity = BlogPost;

    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        push_flag(qb, "publicado", self.published.flag());
        push_exact(qb, "categoria", &self.category);
    }
}
