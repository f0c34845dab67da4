use clap::{Parser, Subcommand};

use crate::s3::{Acl, ByteRange};

/// s3mini - small client for S3-compatible object stores
#[derive(Parser, Debug)]
#[command(name = "s3mini")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (YAML); the environment is used when omitted
    #[arg(long, global = true, env = "S3MINI_CONFIG")]
    pub config: Option<String>,

    /// Profile to use from config
    #[arg(long, global = true, env = "S3MINI_PROFILE")]
    pub profile: Option<String>,

    /// Service base URL, overrides the profile endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// AWS Access Key ID, overrides the profile
    #[arg(long, global = true, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key: Option<String>,

    /// AWS Secret Access Key, overrides the profile
    #[arg(long, global = true, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// AWS Region, overrides the configured region
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Send unsigned requests even when credentials are configured
    #[arg(long, global = true)]
    pub anonymous: bool,

    /// Disable SSL certificate verification (like mc --insecure)
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List buckets
    Ls,

    /// Check whether a bucket exists
    Exists {
        /// Bucket (s3://bucket)
        #[arg(value_name = "BUCKET")]
        bucket: String,
    },

    /// Create a bucket (mc mb compatible)
    Mb {
        /// Bucket (s3://bucket)
        #[arg(value_name = "BUCKET")]
        bucket: String,

        /// Canned ACL (private, public-read, public-read-write, authenticated-read)
        #[arg(long, default_value = "private")]
        acl: Acl,
    },

    /// Remove an empty bucket (mc rb compatible)
    Rb {
        /// Bucket (s3://bucket)
        #[arg(value_name = "BUCKET")]
        bucket: String,
    },

    /// Read or change a bucket's canned ACL
    Acl {
        #[command(subcommand)]
        action: AclAction,
    },

    /// Show object statistics (mc stat compatible)
    Stat {
        /// S3 path (s3://bucket/key)
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Write an object to stdout (mc cat compatible)
    Cat {
        /// S3 path (s3://bucket/key)
        #[arg(value_name = "PATH")]
        path: String,

        #[command(flatten)]
        range: RangeArgs,
    },

    /// Download an object to a local file
    Get {
        /// S3 path (s3://bucket/key)
        #[arg(value_name = "PATH")]
        path: String,

        /// Local destination file
        #[arg(value_name = "DEST")]
        dest: String,

        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum AclAction {
    /// Show the bucket ACL
    Get {
        #[arg(value_name = "BUCKET")]
        bucket: String,
    },

    /// Apply a canned ACL to the bucket
    Set {
        #[arg(value_name = "BUCKET")]
        bucket: String,

        #[arg(value_name = "ACL")]
        acl: Acl,
    },
}

/// Byte range selection for reads
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct RangeArgs {
    /// First byte to read
    #[arg(long)]
    pub offset: Option<u64>,

    /// Number of bytes to read
    #[arg(long)]
    pub length: Option<u64>,
}

impl RangeArgs {
    /// Range to request, `None` for the whole object
    pub fn to_range(self) -> anyhow::Result<Option<ByteRange>> {
        match (self.offset, self.length) {
            (None, None) => Ok(None),
            (offset, None) => Ok(Some(ByteRange::from_offset(offset.unwrap_or(0)))),
            (offset, Some(length)) => Ok(Some(ByteRange::new(offset.unwrap_or(0), length)?)),
        }
    }
}

/// Parse S3 path into bucket and key components
///
/// Accepts both mc-compatible `s3/bucket/key` and URI-style `s3://bucket/key`.
pub fn parse_s3_path(path: &str) -> anyhow::Result<(String, Option<String>)> {
    let path = path.trim();

    let stripped = if let Some(p) = path.strip_prefix("s3://") {
        p
    } else if let Some(p) = path.strip_prefix("s3/") {
        p
    } else {
        anyhow::bail!("Invalid S3 path format. Expected: s3://bucket/key");
    };

    let (bucket, key) = match stripped.split_once('/') {
        Some((bucket, key)) => (bucket, key),
        None => (stripped, ""),
    };

    if bucket.is_empty() {
        anyhow::bail!("Bucket name cannot be empty");
    }

    let key = if key.is_empty() { None } else { Some(key.to_string()) };

    Ok((bucket.to_string(), key))
}

/// Bucket name from a path; a key part is rejected
pub fn parse_bucket(path: &str) -> anyhow::Result<String> {
    match parse_s3_path(path)? {
        (bucket, None) => Ok(bucket),
        (_, Some(key)) => anyhow::bail!("Expected a bucket, got object key '{}'", key),
    }
}

/// Bucket and key from a path; the key is required
pub fn parse_object(path: &str) -> anyhow::Result<(String, String)> {
    let (bucket, key) = parse_s3_path(path)?;
    let key = key.ok_or_else(|| anyhow::anyhow!("Object key is required: {}", path))?;
    Ok((bucket, key))
}
