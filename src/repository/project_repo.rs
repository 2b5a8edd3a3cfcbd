use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::project::Project;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a project under a caller-chosen id. Promotion generates the
    /// id before linking it onto the quote, so creation must honor it.
    async fn create(&self, project: Project) -> RepositoryResult<Project>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Project>;
    async fn list(&self) -> RepositoryResult<Vec<Project>>;
}

pub struct MongoProjectRepository {
    collection: mongodb::Collection<Project>,
}

impl MongoProjectRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = super::connect(config).await?;
        Ok(MongoProjectRepository {
            collection: db.collection::<Project>("projects"),
        })
    }
}

#[async_trait]
impl ProjectRepository for MongoProjectRepository {
    #[tracing::instrument(skip(self, project))]
    async fn create(&self, project: Project) -> RepositoryResult<Project> {
        if project.id.is_none() {
            return Err(RepositoryError::validation(
                "project id must be set before insertion",
            ));
        }
        match self.collection.insert_one(project.clone(), None).await {
            Ok(_) => {
                info!(project_id = %project.id.unwrap(), "Project created");
                Ok(project)
            }
            Err(e) => {
                error!("Failed to create project: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Project> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(project)) => Ok(project),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Project not found for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to fetch project by ID: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> RepositoryResult<Vec<Project>> {
        let mut cursor = self
            .collection
            .find(None, None)
            .await
            .map_err(RepositoryError::from)?;
        let mut projects = Vec::new();
        while let Some(project) = cursor.next().await {
            projects.push(project.map_err(RepositoryError::from)?);
        }
        Ok(projects)
    }
}
