use a11y_service::error::ServiceError;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    a11y_service::app::run().await
}
