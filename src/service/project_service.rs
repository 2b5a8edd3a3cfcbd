use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::Datelike;
use tracing::{error, info, instrument, warn};

use crate::model::actor::Actor;
use crate::model::project::Project;
use crate::model::quote::Quote;
use crate::repository::project_repo::ProjectRepository;
use crate::repository::quote_repo::QuoteRepository;
use crate::util::error::ServiceError;

#[async_trait]
pub trait ProjectService: Send + Sync {
    /// Promote an approved quote into a Project. One-way and exactly-once:
    /// a second call fails with "already started", and concurrent callers
    /// race on a conditional write so only one Project is ever created.
    async fn start_project(&self, actor: &Actor, quote_id: ObjectId)
        -> Result<Project, ServiceError>;

    async fn get_project(&self, id: ObjectId) -> Result<Project, ServiceError>;
    async fn list_projects(&self) -> Result<Vec<Project>, ServiceError>;
}

pub struct ProjectServiceImpl {
    quote_repo: Arc<dyn QuoteRepository>,
    project_repo: Arc<dyn ProjectRepository>,
}

impl ProjectServiceImpl {
    pub fn new(
        quote_repo: Arc<dyn QuoteRepository>,
        project_repo: Arc<dyn ProjectRepository>,
    ) -> Self {
        ProjectServiceImpl {
            quote_repo,
            project_repo,
        }
    }

    /// Snapshot the quote's descriptive fields. Later edits to the quote
    /// do not propagate to the project.
    fn snapshot(quote: &Quote, project_id: ObjectId, quote_id: ObjectId) -> Project {
        let title = quote
            .project_type
            .clone()
            .unwrap_or_else(|| "General construction".to_string());

        let mut highlights = Vec::new();
        if let Some(size) = &quote.size {
            highlights.push(format!("Size: {}", size));
        }
        if let Some(timeline) = &quote.timeline {
            highlights.push(format!("Timeline: {}", timeline));
        }
        if let Some(budget) = &quote.budget {
            highlights.push(format!("Budget: {}", budget));
        }

        Project {
            id: Some(project_id),
            quote_id,
            title,
            category: quote.project_type.clone(),
            location: quote.location.clone(),
            year: chrono::Utc::now().year(),
            description: quote.description.clone(),
            estimated_price: quote.estimated_price,
            highlights,
            images: quote.attachments.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait]
impl ProjectService for ProjectServiceImpl {
    #[instrument(skip(self, actor), fields(quote_id = %quote_id))]
    async fn start_project(
        &self,
        actor: &Actor,
        quote_id: ObjectId,
    ) -> Result<Project, ServiceError> {
        actor.require_staff()?;

        let quote = self
            .quote_repo
            .get_by_id(quote_id)
            .await
            .map_err(ServiceError::from)?;

        if quote.project_id.is_some() {
            return Err(ServiceError::IllegalState(
                "project already started for this quote".to_string(),
            ));
        }
        if !quote.is_approved() {
            return Err(ServiceError::IllegalState(
                "only an approved quote can be promoted to a project".to_string(),
            ));
        }

        // Linking the pre-generated id with a conditional write on
        // `project_id == null` is the atomic gate: exactly one concurrent
        // caller wins, and only the winner inserts the project document.
        let project_id = ObjectId::new();
        let linked = self
            .quote_repo
            .link_project(quote_id, project_id)
            .await
            .map_err(ServiceError::from)?;

        let project = Self::snapshot(&linked, project_id, quote_id);
        match self.project_repo.create(project.clone()).await {
            Ok(created) => {
                info!(project_id = %project_id, "Project started from quote");
                Ok(created)
            }
            Err(e) => {
                error!("Project insert failed after linking, rolling back link: {e}");
                if let Err(unlink_err) =
                    self.quote_repo.unlink_project(quote_id, project_id).await
                {
                    warn!("Failed to roll back project link: {unlink_err}");
                }
                Err(ServiceError::from(e))
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_project(&self, id: ObjectId) -> Result<Project, ServiceError> {
        self.project_repo
            .get_by_id(id)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<Vec<Project>, ServiceError> {
        self.project_repo.list().await.map_err(ServiceError::from)
    }
}
