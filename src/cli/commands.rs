use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::io::Write;
use tokio::io::AsyncWriteExt;

use crate::cli::args::{parse_bucket, parse_object, AclAction, RangeArgs};
use crate::s3::{Acl, S3Client, S3Error};

// ============================================================================
// Utility functions
// ============================================================================

/// Format bytes in human-readable form (B, KB, MB, GB, TB) - verbose
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exponent = (bytes_f64.ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);

    let value = bytes_f64 / 1024_f64.powi(exponent as i32);

    if exponent == 0 {
        format!("{} {}", bytes, UNITS[exponent])
    } else {
        format!("{:.2} {}", value, UNITS[exponent])
    }
}

/// Format an ISO-8601 timestamp as `[YYYY-MM-DD HH:MM:SS UTC]`
pub fn format_s3_date(date: &str) -> String {
    let mut buf = String::with_capacity(26);
    // Input is like "2026-01-22T20:44:33.219Z"
    match date.split_once('T') {
        Some((day, rest)) => {
            let time = rest.get(..8).unwrap_or_else(|| rest.trim_end_matches('Z'));
            let _ = write!(buf, "[{} {} UTC]", day, time);
        }
        None if date.is_empty() => buf.push_str("[                       ]"),
        None => {
            let _ = write!(buf, "[{}]", date);
        }
    }
    buf
}

// ============================================================================
// Commands
// ============================================================================

/// List buckets
pub async fn cmd_ls(client: &S3Client) -> Result<()> {
    let listing = client.list_buckets().await.context("Failed to list buckets")?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    for bucket in &listing.buckets {
        writeln!(out, "{} {}/", format_s3_date(&bucket.creation_date), bucket.name)?;
    }
    out.flush()?;

    tracing::debug!(count = listing.buckets.len(), "listed buckets");
    Ok(())
}

/// Bucket existence check; prints `true` or `false`
pub async fn cmd_exists(client: &S3Client, bucket: &str) -> Result<bool> {
    let bucket = parse_bucket(bucket)?;
    let exists = client.bucket_exists(&bucket).await?;
    println!("{}", exists);
    Ok(exists)
}

/// Make bucket command
pub async fn cmd_mb(client: &S3Client, bucket: &str, acl: Acl) -> Result<()> {
    let bucket = parse_bucket(bucket)?;
    client
        .make_bucket(&bucket, acl)
        .await
        .with_context(|| format!("Failed to create bucket s3://{}", bucket))?;

    println!("Bucket created: s3://{} ({})", bucket, acl);
    Ok(())
}

/// Remove bucket command
pub async fn cmd_rb(client: &S3Client, bucket: &str) -> Result<()> {
    let bucket = parse_bucket(bucket)?;
    client
        .remove_bucket(&bucket)
        .await
        .with_context(|| format!("Failed to remove bucket s3://{}", bucket))?;

    println!("Bucket removed: s3://{}", bucket);
    Ok(())
}

/// Bucket ACL get/set
pub async fn cmd_acl(client: &S3Client, action: AclAction) -> Result<()> {
    match action {
        AclAction::Get { bucket } => {
            let bucket = parse_bucket(&bucket)?;
            match client.get_bucket_acl(&bucket).await {
                Ok(acl) => println!("s3://{}: {}", bucket, acl),
                Err(S3Error::Unimplemented(what)) => {
                    anyhow::bail!("Reading bucket ACLs is not supported yet ({})", what)
                }
                Err(e) => return Err(e).context(format!("Failed to read ACL of s3://{}", bucket)),
            }
        }
        AclAction::Set { bucket, acl } => {
            let bucket = parse_bucket(&bucket)?;
            client
                .set_bucket_acl(&bucket, acl)
                .await
                .with_context(|| format!("Failed to set ACL of s3://{}", bucket))?;
            println!("ACL set: s3://{} ({})", bucket, acl);
        }
    }
    Ok(())
}

/// Stat command
pub async fn cmd_stat(client: &S3Client, path: &str) -> Result<()> {
    let (bucket, key) = parse_object(path)?;
    let stat = client.stat_object(&bucket, &key).await.map_err(|e| {
        if e.is_not_found() {
            anyhow::anyhow!("Object not found: s3://{}/{}", bucket, key)
        } else {
            anyhow::Error::new(e)
        }
    })?;

    println!("Object: s3://{}/{}", bucket, stat.key);
    println!("Size: {} ({})", format_bytes(stat.size), stat.size);
    println!("Last Modified: {}", stat.last_modified.as_deref().unwrap_or("Unknown"));
    if !stat.etag.is_empty() {
        println!("ETag: {}", stat.etag);
    }

    Ok(())
}

/// Stream an object (or a range of it) to stdout
pub async fn cmd_cat(client: &S3Client, path: &str, range: RangeArgs) -> Result<()> {
    let (bucket, key) = parse_object(path)?;
    let stream = client
        .get_object_with_range(&bucket, &key, range.to_range()?)
        .await
        .with_context(|| format!("Failed to read s3://{}/{}", bucket, key))?;

    let mut stdout = tokio::io::stdout();
    let written = stream.write_to(&mut stdout).await?;
    stdout.flush().await?;

    tracing::debug!(bytes = written, "object written to stdout");
    Ok(())
}

/// Download an object (or a range of it) to a local file
pub async fn cmd_get(client: &S3Client, path: &str, dest: &str, range: RangeArgs) -> Result<()> {
    let (bucket, key) = parse_object(path)?;
    let stream = client
        .get_object_with_range(&bucket, &key, range.to_range()?)
        .await
        .with_context(|| format!("Failed to read s3://{}/{}", bucket, key))?;

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create {}", dest))?;
    let written = stream.write_to(&mut file).await?;

    println!("s3://{}/{} -> {} ({})", bucket, key, dest, format_bytes(written));
    Ok(())
}
