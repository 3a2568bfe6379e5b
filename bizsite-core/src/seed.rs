use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::models::project::ProjectInput;
use crate::models::testimonial::TestimonialInput;
use crate::models::user::NewUser;
use crate::repo::{projects, testimonials, users};

/// What a bootstrap run changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub projects_created: usize,
    pub testimonials_created: usize,
}

/// Creates the configured administrator if missing and fills an empty
/// portfolio with sample content. Safe to run on every start.
pub async fn bootstrap(pool: &SqlitePool, config: &Config) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();

    if users::find_by_username(pool, &config.admin.username).await?.is_none() {
        users::create(
            pool,
            &NewUser {
                username: config.admin.username.clone(),
                email: config.admin.email.clone(),
                password: config.admin.password.clone(),
                is_admin: true,
            },
            config.bcrypt_cost,
        )
        .await?;
        report.admin_created = true;
        info!("Created administrator {}", config.admin.username);
    }

    if config.is_production() && config.admin.uses_default_password() {
        warn!(
            "SECURITY: the administrator password is the shipped default. \
             Set ADMIN_PASSWORD to a strong value."
        );
    }

    if projects::count(pool).await? == 0 {
        for input in sample_projects() {
            projects::create(pool, &input.validate()?).await?;
            report.projects_created += 1;
        }
        for input in sample_testimonials() {
            testimonials::create(pool, &input.validate()?).await?;
            report.testimonials_created += 1;
        }
        info!(
            "Inserted {} sample projects and {} sample testimonials",
            report.projects_created, report.testimonials_created
        );
    }

    Ok(report)
}

fn sample_projects() -> Vec<ProjectInput> {
    vec![
        ProjectInput {
            titulo: Some("Point of sale for a neighbourhood pharmacy".into()),
            descripcion_problema: Some(
                "Stock was tracked on paper and expired products were found too late.".into(),
            ),
            descripcion_solucion: Some(
                "A point of sale with batch and expiry tracking plus low-stock alerts.".into(),
            ),
            resultados: Some("Shrinkage dropped by a third in the first quarter.".into()),
            categoria: Some("POS".into()),
            orden: Some(1),
            cliente: Some("Local pharmacy".into()),
            tecnologias: Some("Rust, SQLite".into()),
            duracion: Some("6 weeks".into()),
            ..Default::default()
        },
        ProjectInput {
            titulo: Some("Automated monthly reporting".into()),
            descripcion_problema: Some(
                "Sales reports were assembled by hand from several spreadsheets.".into(),
            ),
            descripcion_solucion: Some(
                "A scheduled job that consolidates the sheets and emails a summary.".into(),
            ),
            resultados: Some("Two working days saved every month.".into()),
            categoria: Some("Automation".into()),
            orden: Some(2),
            cliente: Some("Regional distributor".into()),
            tecnologias: Some("Python, Excel".into()),
            duracion: Some("3 weeks".into()),
            ..Default::default()
        },
        ProjectInput {
            titulo: Some("Booking website for a dental clinic".into()),
            descripcion_problema: Some("Appointments were only taken by phone.".into()),
            descripcion_solucion: Some(
                "A responsive site with online booking and reminder messages.".into(),
            ),
            resultados: Some("Forty percent of bookings now arrive online.".into()),
            categoria: Some("Web".into()),
            orden: Some(3),
            cliente: Some("Dental clinic".into()),
            tecnologias: Some("HTML, CSS, JavaScript".into()),
            duracion: Some("4 weeks".into()),
            ..Default::default()
        },
    ]
}

fn sample_testimonials() -> Vec<TestimonialInput> {
    vec![
        TestimonialInput {
            nombre_cliente: Some("Laura Gómez".into()),
            empresa: Some("Farmacia Central".into()),
            cargo: Some("Owner".into()),
            testimonio: Some("We finally know what is on our shelves without counting by hand.".into()),
            calificacion: Some(5),
            orden: Some(1),
            proyecto_relacionado: Some("Point of sale for a neighbourhood pharmacy".into()),
            ..Default::default()
        },
        TestimonialInput {
            nombre_cliente: Some("Carlos Ruiz".into()),
            empresa: Some("Distribuidora Norte".into()),
            cargo: Some("Operations manager".into()),
            testimonio: Some("The monthly report now lands in my inbox before I ask for it.".into()),
            calificacion: Some(5),
            orden: Some(2),
            proyecto_relacionado: Some("Automated monthly reporting".into()),
            ..Default::default()
        },
    ]
}
