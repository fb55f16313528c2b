use airflow::AirflowProvider;
use std::env;
use std::path::PathBuf;
use tfplug::ProviderServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // stdout carries the go-plugin handshake; logs go to stderr.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let mut server = ProviderServer::new(AirflowProvider::new());

    // TLS is optional for local plugin traffic; Terraform accepts plaintext
    // gRPC on the loopback interface.
    if let (Ok(cert), Ok(key)) = (
        env::var("AIRFLOW_PROVIDER_TLS_CERT"),
        env::var("AIRFLOW_PROVIDER_TLS_KEY"),
    ) {
        server = server.with_tls(PathBuf::from(cert), PathBuf::from(key));
    }

    server.run().await?;

    Ok(())
}
