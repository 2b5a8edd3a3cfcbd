use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tracing::{info, instrument};

use crate::dto::contract_dto::CreateContractRequest;
use crate::model::actor::Actor;
use crate::model::contract::Contract;
use crate::repository::contract_repo::ContractRepository;
use crate::util::error::ServiceError;

#[async_trait]
pub trait ContractService: Send + Sync {
    async fn create_contract(
        &self,
        actor: &Actor,
        request: CreateContractRequest,
    ) -> Result<Contract, ServiceError>;
    async fn get_contract(&self, actor: &Actor, id: ObjectId) -> Result<Contract, ServiceError>;
    async fn list_contracts(&self, actor: &Actor) -> Result<Vec<Contract>, ServiceError>;
}

pub struct ContractServiceImpl {
    contract_repo: Arc<dyn ContractRepository>,
}

impl ContractServiceImpl {
    pub fn new(contract_repo: Arc<dyn ContractRepository>) -> Self {
        ContractServiceImpl { contract_repo }
    }
}

#[async_trait]
impl ContractService for ContractServiceImpl {
    #[instrument(skip(self, actor, request))]
    async fn create_contract(
        &self,
        actor: &Actor,
        request: CreateContractRequest,
    ) -> Result<Contract, ServiceError> {
        actor.require_staff()?;

        if request.document_url.is_none() && request.body.is_none() {
            return Err(ServiceError::InvalidInput(
                "a contract template needs a document URL or a text body".to_string(),
            ));
        }

        let contract = Contract {
            id: None,
            title: request.title,
            document_url: request.document_url,
            body: request.body,
            created_at: None,
        };
        let created = self
            .contract_repo
            .create(contract)
            .await
            .map_err(ServiceError::from)?;
        info!("Contract template created");
        Ok(created)
    }

    #[instrument(skip(self, actor), fields(id = %id))]
    async fn get_contract(&self, actor: &Actor, id: ObjectId) -> Result<Contract, ServiceError> {
        actor.require_staff()?;
        self.contract_repo
            .get_by_id(id)
            .await
            .map_err(ServiceError::from)
    }

    #[instrument(skip(self, actor))]
    async fn list_contracts(&self, actor: &Actor) -> Result<Vec<Contract>, ServiceError> {
        actor.require_staff()?;
        self.contract_repo.list().await.map_err(ServiceError::from)
    }
}
