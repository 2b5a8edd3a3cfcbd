use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::config::{AppConfig, JwtConfig, MinioConfig, MongoConfig, StripeConfig};
use crate::middlewares::auth_middleware::AuthState;
use crate::repository::contract_repo::MongoContractRepository;
use crate::repository::payment_repo::MongoPaymentRepository;
use crate::repository::project_repo::MongoProjectRepository;
use crate::repository::quote_repo::MongoQuoteRepository;
use crate::router::contract_router::contract_router;
use crate::router::payment_router::payment_router;
use crate::router::project_router::project_router;
use crate::router::quote_router::quote_router;
use crate::service::contract_service::{ContractService, ContractServiceImpl};
use crate::service::payment_service::{PaymentService, PaymentServiceImpl};
use crate::service::project_service::{ProjectService, ProjectServiceImpl};
use crate::service::quote_service::{QuoteService, QuoteServiceImpl};
use crate::util::jwt::JwtTokenUtilsImpl;
use crate::util::minio::{BlobStore, MinioService};
use crate::util::stripe::{PaymentProcessor, StripeGateway};

pub struct App {
    config: AppConfig,
    router: Router,
}

impl App {
    pub async fn new() -> Self {
        let config = AppConfig::from_env();
        let jwt_config = JwtConfig::from_env().expect("JWT config error");
        let mongo_config = MongoConfig::from_env().expect("Mongo config error");
        let minio_config = MinioConfig::from_env().expect("Minio config error");
        let stripe_config = StripeConfig::from_env().expect("Stripe config error");

        let quote_repo = Arc::new(
            MongoQuoteRepository::new(&mongo_config)
                .await
                .expect("Quote repo error"),
        );
        let contract_repo = Arc::new(
            MongoContractRepository::new(&mongo_config)
                .await
                .expect("Contract repo error"),
        );
        let payment_repo = Arc::new(
            MongoPaymentRepository::new(&mongo_config)
                .await
                .expect("Payment repo error"),
        );
        let project_repo = Arc::new(
            MongoProjectRepository::new(&mongo_config)
                .await
                .expect("Project repo error"),
        );

        let blob_store = Arc::new(
            MinioService::new(minio_config)
                .await
                .expect("Minio service error"),
        ) as Arc<dyn BlobStore>;
        let currency = stripe_config.currency.clone();
        let processor = Arc::new(StripeGateway::new(stripe_config)) as Arc<dyn PaymentProcessor>;

        let quote_service = Arc::new(QuoteServiceImpl::new(
            quote_repo.clone(),
            contract_repo.clone(),
            blob_store,
        )) as Arc<dyn QuoteService>;
        let payment_service = Arc::new(PaymentServiceImpl::new(
            quote_repo.clone(),
            payment_repo,
            processor,
            currency,
        )) as Arc<dyn PaymentService>;
        let project_service = Arc::new(ProjectServiceImpl::new(quote_repo, project_repo))
            as Arc<dyn ProjectService>;
        let contract_service =
            Arc::new(ContractServiceImpl::new(contract_repo)) as Arc<dyn ContractService>;

        let jwt_utils = Arc::new(JwtTokenUtilsImpl::new(jwt_config));
        let auth_state = Arc::new(AuthState { jwt_utils });

        let router = Router::new()
            .merge(quote_router(quote_service, auth_state.clone()))
            .merge(payment_router(payment_service, auth_state.clone()))
            .merge(project_router(project_service, auth_state.clone()))
            .merge(contract_router(contract_service, auth_state))
            .route("/health", get(|| async { "OK" }));

        App { config, router }
    }

    pub async fn start(self) {
        let addr = SocketAddr::new(
            self.config.host.parse().expect("Invalid host"),
            self.config.port,
        );
        info!("🚀 Server running at http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind address");
        axum::serve(listener, self.router).await.expect("Failed to start server");
    }
}
