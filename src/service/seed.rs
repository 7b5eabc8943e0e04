use chrono::NaiveDate;
use tracing::info;

use crate::error::FolioError;
use crate::gateway::{Backend, EXPERIENCES_TABLE, PROJECTS_TABLE};
use crate::models::{Experience, NewExperience, NewProject, Project, ProjectType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub projects: usize,
    pub experiences: usize,
}

fn tools(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

pub fn sample_projects() -> Vec<NewProject> {
    vec![
        NewProject {
            title: "E-Commerce Platform".into(),
            description: "Full-stack shop with authentication, product management, cart and Stripe payments.".into(),
            image_url: "https://images.unsplash.com/photo-1556742049-0cfed4f6a45d?w=500&h=300&fit=crop".into(),
            link: Some("https://github.com/johndoe/ecommerce-platform".into()),
            project_type: ProjectType::Client,
            tools: tools(&["React", "Node.js", "PostgreSQL", "Stripe", "Express.js"]),
            display_order: Some(1),
        },
        NewProject {
            title: "Task Management App".into(),
            description: "Collaborative task board with real-time updates and drag-and-drop.".into(),
            image_url: "https://images.unsplash.com/photo-1611224923853-80b023f02d71?w=500&h=300&fit=crop".into(),
            link: Some("https://github.com/johndoe/task-manager".into()),
            project_type: ProjectType::Personal,
            tools: tools(&["React", "TypeScript", "Socket.io", "Tailwind CSS", "MongoDB"]),
            display_order: Some(2),
        },
        NewProject {
            title: "Weather Dashboard".into(),
            description: "Responsive dashboard of current conditions and forecasts with interactive charts.".into(),
            image_url: "https://images.unsplash.com/photo-1504608524841-42fe6f032b4?w=500&h=300&fit=crop".into(),
            link: Some("https://github.com/johndoe/weather-dashboard".into()),
            project_type: ProjectType::Personal,
            tools: tools(&["JavaScript", "Chart.js", "OpenWeather API"]),
            display_order: Some(3),
        },
        NewProject {
            title: "Blog CMS".into(),
            description: "Blog content management with rich text editing, image uploads and SEO tooling.".into(),
            image_url: "https://images.unsplash.com/photo-1499750310107-5fef28a66643?w=500&h=300&fit=crop".into(),
            link: Some("https://github.com/johndoe/blog-cms".into()),
            project_type: ProjectType::Company,
            tools: tools(&["Next.js", "Prisma", "Vercel", "TypeScript", "PostgreSQL"]),
            display_order: Some(4),
        },
    ]
}

pub fn sample_experiences() -> Vec<NewExperience> {
    vec![
        NewExperience {
            role: "Senior Full-Stack Developer".into(),
            company: "TechCorp Solutions".into(),
            description: "Led development of several web applications and set up CI/CD pipelines.".into(),
            start_date: date(2022, 1, 1),
            end_date: None,
        },
        NewExperience {
            role: "Frontend Developer".into(),
            company: "Digital Agency Inc.".into(),
            description: "Built responsive, mobile-first interfaces with React and TypeScript.".into(),
            start_date: date(2020, 6, 1),
            end_date: Some(date(2021, 12, 31)),
        },
        NewExperience {
            role: "Junior Web Developer".into(),
            company: "StartupXYZ".into(),
            description: "Maintained the company website and internal tools.".into(),
            start_date: date(2019, 3, 1),
            end_date: Some(date(2020, 5, 31)),
        },
    ]
}

/// Insert the sample projects, then the sample experiences. Stops at the
/// first table that fails.
pub async fn seed_database<B: Backend>(backend: &B) -> Result<SeedReport, FolioError> {
    info!("seeding projects");
    let projects: Vec<Project> = backend
        .insert_many(PROJECTS_TABLE, &sample_projects())
        .await?;
    info!(count = projects.len(), "seeded projects");

    info!("seeding experiences");
    let experiences: Vec<Experience> = backend
        .insert_many(EXPERIENCES_TABLE, &sample_experiences())
        .await?;
    info!(count = experiences.len(), "seeded experiences");

    Ok(SeedReport {
        projects: projects.len(),
        experiences: experiences.len(),
    })
}
