//! CLI module for s3mini
//!
//! A thin command-line front end over [`S3Client`], mostly useful for poking
//! at a MinIO or other S3-compatible server by hand.
//!
//! # Usage
//!
//! ```bash
//! # List buckets
//! s3mini --endpoint http://localhost:9000 ls
//!
//! # Create a public bucket
//! s3mini mb s3://photos --acl public-read
//!
//! # Object info
//! s3mini stat s3://photos/cat.jpg
//!
//! # Read the first KiB of an object
//! s3mini cat s3://photos/notes.txt --length 1024
//!
//! # Download the tail of an object
//! s3mini get s3://photos/video.mp4 tail.mp4 --offset 1048576
//! ```

pub mod args;
pub mod commands;

use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::{debug, info};

use crate::config::{self, Config};
use crate::s3::{Credentials, S3Client};
use args::{Cli, Commands};

/// Run one CLI command, returning the process exit code
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let client = build_client(&cli)?;

    debug!(
        endpoint = %client.endpoint(),
        anonymous = client.is_anonymous(),
        "client ready"
    );

    dispatch(&client, cli.command).await
}

/// Execute a parsed command against a client.
///
/// `exists` exits non-zero when the bucket is absent so scripts can test it.
pub async fn dispatch(client: &S3Client, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Ls => commands::cmd_ls(client).await?,
        Commands::Exists { bucket } => {
            if !commands::cmd_exists(client, &bucket).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Mb { bucket, acl } => commands::cmd_mb(client, &bucket, acl).await?,
        Commands::Rb { bucket } => commands::cmd_rb(client, &bucket).await?,
        Commands::Acl { action } => commands::cmd_acl(client, action).await?,
        Commands::Stat { path } => commands::cmd_stat(client, &path).await?,
        Commands::Cat { path, range } => commands::cmd_cat(client, &path, range).await?,
        Commands::Get { path, dest, range } => {
            commands::cmd_get(client, &path, &dest, range).await?
        }
    }

    info!("Command completed successfully");
    Ok(ExitCode::SUCCESS)
}

/// Build the client from CLI args, environment, or config file
///
/// Priority: CLI args > environment variables > config file > defaults
pub fn build_client(cli: &Cli) -> Result<S3Client> {
    let config = match config::load_config(cli.config.as_deref(), cli.profile.as_deref()) {
        Ok(config) => config,
        // No config file and no S3MINI_ENDPOINT, but --endpoint names the service
        Err(e) if cli.config.is_none() && cli.endpoint.is_some() => {
            debug!("No environment profile, using --endpoint: {:#}", e);
            Config::new()
        }
        Err(e) => return Err(e),
    };

    let profile = config.get_profile(None);

    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| profile.map(|p| p.endpoint.clone()))
        .ok_or_else(|| anyhow::anyhow!("No endpoint configured (use --endpoint, --config or S3MINI_ENDPOINT)"))?;

    let credentials = if cli.anonymous {
        None
    } else {
        match (&cli.access_key, &cli.secret_key) {
            (Some(access), Some(secret)) => Some(Credentials::new(access.clone(), secret.clone())),
            _ => profile.and_then(|p| p.credentials()),
        }
    };

    let mut client_config = config.client.clone();
    if let Some(region) = &cli.region {
        client_config.region = region.clone();
    }
    if cli.insecure {
        client_config.insecure_tls = true;
    }

    S3Client::with_config(&endpoint, credentials, client_config)
        .with_context(|| format!("Failed to create S3 client for {}", endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crate::s3::{HttpRequest, HttpResponse, Transport};
    use async_trait::async_trait;
    use hyper::header::HeaderMap;
    use hyper::StatusCode;
    use serial_test::serial;
    use std::io::Write;
    use std::sync::Arc;

    /// Answers every request with the same status and an empty body
    struct FixedStatus(StatusCode);

    #[async_trait]
    impl Transport for FixedStatus {
        async fn send(&self, _request: HttpRequest) -> crate::s3::Result<HttpResponse> {
            Ok(HttpResponse::from_bytes(self.0, HeaderMap::new(), ""))
        }
    }

    fn client_answering(status: StatusCode) -> S3Client {
        S3Client::anonymous("http://localhost:9000")
            .unwrap()
            .with_transport(Arc::new(FixedStatus(status)))
    }

    #[tokio::test]
    async fn test_exists_sets_exit_code() {
        let exists = Commands::Exists { bucket: "s3://photos".to_string() };
        let code = dispatch(&client_answering(StatusCode::OK), exists).await.unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let exists = Commands::Exists { bucket: "s3://photos".to_string() };
        let code = dispatch(&client_answering(StatusCode::NOT_FOUND), exists).await.unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn test_command_errors_propagate() {
        let rb = Commands::Rb { bucket: "s3://photos".to_string() };
        assert!(dispatch(&client_answering(StatusCode::CONFLICT), rb).await.is_err());
    }

    fn write_config(yaml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    const CONFIG: &str = r#"
profiles:
  minio:
    endpoint: http://localhost:9000
    access_key: minioadmin
    secret_key: minioadmin
  public:
    endpoint: https://play.min.io
default_profile: minio
client:
  region: eu-central-1
"#;

    #[test]
    #[serial]
    fn test_build_client_from_profile() {
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");
        std::env::remove_var("AWS_REGION");

        let file = write_config(CONFIG);
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["s3mini", "--config", path, "ls"]).unwrap();
        let client = build_client(&cli).unwrap();
        assert_eq!(client.endpoint().root(), "http://localhost:9000/");
        assert_eq!(client.config().region, "eu-central-1");
        assert!(!client.is_anonymous());

        let cli = Cli::try_parse_from(["s3mini", "--config", path, "--profile", "public", "ls"]).unwrap();
        let client = build_client(&cli).unwrap();
        assert_eq!(client.endpoint().root(), "https://play.min.io:443/");
        assert!(client.is_anonymous());
    }

    #[test]
    #[serial]
    fn test_cli_flags_override_profile() {
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");
        std::env::remove_var("AWS_REGION");

        let file = write_config(CONFIG);
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "s3mini",
            "--config",
            path,
            "--endpoint",
            "http://127.0.0.1:9100",
            "--region",
            "us-east-1",
            "--anonymous",
            "ls",
        ])
        .unwrap();
        let client = build_client(&cli).unwrap();
        assert_eq!(client.endpoint().root(), "http://127.0.0.1:9100/");
        assert_eq!(client.config().region, "us-east-1");
        assert!(client.is_anonymous());
    }

    #[test]
    #[serial]
    fn test_endpoint_flag_without_config() {
        std::env::remove_var("S3MINI_ENDPOINT");
        std::env::remove_var("S3MINI_CONFIG");
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");

        let cli = Cli::try_parse_from(["s3mini", "--endpoint", "http://localhost:9000", "ls"]).unwrap();
        let client = build_client(&cli).unwrap();
        assert!(client.is_anonymous());

        let cli = Cli::try_parse_from(["s3mini", "--endpoint", "http://localhost:9000/bucket", "ls"]).unwrap();
        assert!(build_client(&cli).is_err());
    }
}
