use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::StreamExt;
use tracing::{error, info};

use crate::config::mongo_conf::MongoConfig;
use crate::model::contract::Contract;
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn create(&self, contract: Contract) -> RepositoryResult<Contract>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Contract>;
    async fn list(&self) -> RepositoryResult<Vec<Contract>>;
}

pub struct MongoContractRepository {
    collection: mongodb::Collection<Contract>,
}

impl MongoContractRepository {
    pub async fn new(config: &MongoConfig) -> Result<Self, mongodb::error::Error> {
        let db = super::connect(config).await?;
        Ok(MongoContractRepository {
            collection: db.collection::<Contract>("contracts"),
        })
    }
}

#[async_trait]
impl ContractRepository for MongoContractRepository {
    #[tracing::instrument(skip(self, contract))]
    async fn create(&self, contract: Contract) -> RepositoryResult<Contract> {
        let mut new_contract = contract;
        new_contract.id = Some(ObjectId::new());
        new_contract.created_at = Some(chrono::Utc::now().to_rfc3339());

        match self.collection.insert_one(new_contract.clone(), None).await {
            Ok(_) => {
                info!("Contract template created");
                Ok(new_contract)
            }
            Err(e) => {
                error!("Failed to create contract: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<Contract> {
        let filter = doc! { "_id": id };
        match self.collection.find_one(filter, None).await {
            Ok(Some(contract)) => Ok(contract),
            Ok(None) => Err(RepositoryError::not_found(format!(
                "Contract not found for ID: {}",
                id
            ))),
            Err(e) => {
                error!("Failed to fetch contract by ID: {}", e);
                Err(RepositoryError::from(e))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> RepositoryResult<Vec<Contract>> {
        let mut cursor = self
            .collection
            .find(None, None)
            .await
            .map_err(RepositoryError::from)?;
        let mut contracts = Vec::new();
        while let Some(contract) = cursor.next().await {
            contracts.push(contract.map_err(RepositoryError::from)?);
        }
        Ok(contracts)
    }
}
