use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use studio_atoms::media::ImageOptimizer;

pub mod auth;
pub mod config;
pub mod logging;
pub mod storage;

pub use config::AppConfig;
pub use storage::S3Storage;

/// Clients and settings shared by every request of a warm Lambda
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub storage: S3Storage,
    pub optimizer: ImageOptimizer,
    pub config: AppConfig,
}

impl AppState {
    pub async fn from_env() -> Self {
        let config = AppConfig::from_env();
        let aws_config = aws_config::load_from_env().await;

        let dynamo_client = DynamoClient::new(&aws_config);
        let storage = S3Storage::new(
            S3Client::new(&aws_config),
            &config.region,
            config.public_asset_base_url.clone(),
        );

        tracing::info!(
            "🔧 State ready - table: {} bucket: {} region: {}",
            config.table_name,
            config.bucket_name,
            config.region
        );

        Self {
            dynamo_client,
            storage,
            optimizer: ImageOptimizer::raster(),
            config,
        }
    }
}
