pub mod config;
pub mod jobs;
pub mod storage;

/// Picks the S3 bucket when one is configured, the output folder otherwise.
pub fn storage_from(cli: &config::Cli, runtime: tokio::runtime::Handle) -> anyhow::Result<Box<dyn storage::ClipStorage>> {
    match cli.s3.bucket.as_ref() {
        Some(bucket) => {
            tracing::info!(bucket = %bucket, prefix = %cli.s3.prefix, "Exporting to S3");
            let storage = storage::S3Storage::new(
                bucket,
                &cli.s3.prefix,
                cli.s3.region(),
                cli.s3.credentials()?,
                runtime,
            )?;
            Ok(Box::new(storage))
        }
        None => {
            tracing::info!(folder = ?cli.output, "Exporting to folder");
            Ok(Box::new(storage::FileStorage::new(cli.output.clone())))
        }
    }
}
