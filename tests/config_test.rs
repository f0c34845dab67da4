use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

/// Test loading configuration from YAML file
#[test]
fn test_load_yaml_config() {
    let yaml = r#"
profiles:
  minio:
    endpoint: http://localhost:9000
    access_key: minioadmin
    secret_key: minioadmin
  aws:
    endpoint: https://s3.us-west-2.amazonaws.com
    access_key: AKIATEST
    secret_key: secrettest

default_profile: aws

client:
  region: us-west-2
  user_agent: "nightly-backup/1.0"
  connect_timeout_secs: 5
  pool_idle_timeout_secs: 30
  pool_max_idle_per_host: 8
  insecure_tls: true
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = s3mini::config::load_from_yaml(&config_path).unwrap();

    assert_eq!(config.profiles.len(), 2);
    assert!(config.profiles.contains_key("minio"));

    let profile = config.get_profile(None).unwrap();
    assert_eq!(profile.endpoint, "https://s3.us-west-2.amazonaws.com");
    assert_eq!(profile.access_key.as_deref(), Some("AKIATEST"));
    assert_eq!(profile.secret_key.as_deref(), Some("secrettest"));

    assert_eq!(config.client.region, "us-west-2");
    assert_eq!(config.client.user_agent, "nightly-backup/1.0");
    assert_eq!(config.client.connect_timeout_secs, 5);
    assert_eq!(config.client.pool_idle_timeout_secs, 30);
    assert_eq!(config.client.pool_max_idle_per_host, 8);
    assert!(config.client.insecure_tls);
}

/// Test default values
#[test]
fn test_default_values() {
    let yaml = r#"
profiles:
  minimal:
    endpoint: http://localhost:9000
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = s3mini::config::load_from_yaml(&config_path).unwrap();

    let profile = config.profiles.get("minimal").unwrap();
    // No keys means anonymous access
    assert!(profile.credentials().is_none());
    assert_eq!(config.default_profile, None);

    assert_eq!(config.client.region, "us-west-2");
    assert!(config.client.user_agent.starts_with("s3mini/"));
    assert_eq!(config.client.part_size, s3mini::config::MIN_PART_SIZE);
    assert_eq!(config.client.connect_timeout_secs, 10);
    assert_eq!(config.client.pool_idle_timeout_secs, 90);
    assert_eq!(config.client.pool_max_idle_per_host, 64);
    assert!(!config.client.insecure_tls);
}

/// Invalid client settings are rejected at load time
#[test]
fn test_invalid_client_config() {
    let yaml = r#"
profiles:
  minio:
    endpoint: http://localhost:9000
client:
  part_size: 1048576
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let err = s3mini::config::load_from_yaml(&config_path).unwrap_err();
    assert!(format!("{:#}", err).contains("part size"));
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = s3mini::config::load_from_yaml(temp_dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

/// Test loading configuration from environment variables (AWS standard format)
#[test]
#[serial]
fn test_load_env_config_aws_format() {
    let saved = save_env(&[
        "S3MINI_ENDPOINT",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "AWS_REGION",
        "S3MINI_USER_AGENT",
    ]);

    env::set_var("S3MINI_ENDPOINT", " http://localhost:9000 ");
    env::set_var("AWS_ACCESS_KEY_ID", "test_key");
    env::set_var("AWS_SECRET_ACCESS_KEY", "test_secret");
    env::set_var("AWS_REGION", "eu-west-1");
    env::set_var("S3MINI_USER_AGENT", "env-agent/0.1");

    let config = s3mini::config::load_from_env().unwrap();

    assert_eq!(config.profiles.len(), 1);
    assert_eq!(config.default_profile.as_deref(), Some("default"));

    let profile = config.get_profile(None).unwrap();
    assert_eq!(profile.endpoint, "http://localhost:9000");
    let credentials = profile.credentials().unwrap();
    assert_eq!(credentials.access_key, "test_key");
    assert_eq!(credentials.secret_key, "test_secret");

    assert_eq!(config.client.region, "eu-west-1");
    assert_eq!(config.client.user_agent, "env-agent/0.1");

    restore_env(saved);
}

/// Test loading configuration from environment variables (legacy format)
#[test]
#[serial]
fn test_load_env_config_legacy_format() {
    let saved = save_env(&[
        "S3MINI_ENDPOINT",
        "AWS_ACCESS_KEY_ID",
        "AWS_SECRET_ACCESS_KEY",
        "S3_KEY",
        "S3_SECRET",
        "AWS_REGION",
    ]);

    env::remove_var("AWS_ACCESS_KEY_ID");
    env::remove_var("AWS_SECRET_ACCESS_KEY");
    env::remove_var("AWS_REGION");
    env::set_var("S3MINI_ENDPOINT", "https://play.min.io");
    env::set_var("S3_KEY", "legacy_key");
    env::set_var("S3_SECRET", "legacy_secret");

    let config = s3mini::config::load_from_env().unwrap();

    let profile = config.profiles.get("default").unwrap();
    assert_eq!(profile.access_key.as_deref(), Some("legacy_key"));
    assert_eq!(profile.secret_key.as_deref(), Some("legacy_secret"));
    // Should use default region when not specified
    assert_eq!(config.client.region, "us-west-2");

    restore_env(saved);
}

#[test]
#[serial]
fn test_load_env_requires_endpoint() {
    let saved = save_env(&["S3MINI_ENDPOINT"]);
    env::remove_var("S3MINI_ENDPOINT");

    let err = s3mini::config::load_from_env().unwrap_err();
    assert!(err.to_string().contains("S3MINI_ENDPOINT"));

    restore_env(saved);
}

/// Test load_config profile selection
#[test]
fn test_load_config_profile() {
    let yaml = r#"
profiles:
  prod:
    endpoint: https://s3-prod.test.com
    access_key: prod_key
    secret_key: prod_secret
  dev:
    endpoint: http://s3-dev.test.com:9000
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();
    let path = config_path.to_str().unwrap();

    let config = s3mini::config::load_config(Some(path), Some("dev")).unwrap();
    assert_eq!(config.default_profile.as_deref(), Some("dev"));
    let profile = config.get_profile(None).unwrap();
    assert_eq!(profile.endpoint, "http://s3-dev.test.com:9000");
    assert!(profile.credentials().is_none());

    let prod = config.get_profile(Some("prod")).unwrap();
    assert_eq!(prod.access_key.as_deref(), Some("prod_key"));

    // Get non-existent profile
    assert!(config.get_profile(Some("nonexistent")).is_none());
    let err = s3mini::config::load_config(Some(path), Some("staging")).unwrap_err();
    assert!(err.to_string().contains("staging"));
}

/// A loaded profile is enough to build a client
#[test]
fn test_profile_builds_client() {
    let yaml = r#"
profiles:
  minio:
    endpoint: http://localhost:9000
    access_key: minioadmin
    secret_key: minioadmin
client:
  region: ap-south-1
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = s3mini::config::load_from_yaml(&config_path).unwrap();
    let profile = config.get_profile(None).unwrap();

    let client = s3mini::S3Client::with_config(
        &profile.endpoint,
        profile.credentials(),
        config.client.clone(),
    )
    .unwrap();

    assert_eq!(client.endpoint().host(), "localhost");
    assert_eq!(client.endpoint().port(), 9000);
    assert_eq!(client.config().region, "ap-south-1");
    assert!(!client.is_anonymous());
}

fn save_env(keys: &[&'static str]) -> Vec<(&'static str, Option<String>)> {
    keys.iter().map(|k| (*k, env::var(k).ok())).collect()
}

/// Helper function to restore environment variables
fn restore_env(saved: Vec<(&'static str, Option<String>)>) {
    for (key, orig_val) in saved {
        match orig_val {
            Some(val) => env::set_var(key, val),
            None => env::remove_var(key),
        }
    }
}
