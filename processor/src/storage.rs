use analysis::voice::{SinkError, VoiceSink};

/// A [`VoiceSink`] that can be handed to several session workers.
pub trait ClipStorage: VoiceSink + Send + Sync {
    fn duplicate(&self) -> Box<dyn ClipStorage>;

    /// Removes everything previously exported to this storage.
    fn clear(&self) -> Result<(), SinkError>;
}

/// Keys end up as file names, so they must not be able to leave the session folder.
fn file_name(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

pub struct FileStorage {
    folder: std::sync::Arc<std::path::PathBuf>,
}

impl FileStorage {
    pub fn new<P>(folder: P) -> Self
    where
        P: Into<std::path::PathBuf>,
    {
        Self {
            folder: std::sync::Arc::new(folder.into()),
        }
    }

    pub fn session_folder(&self, session_id: &str) -> std::path::PathBuf {
        self.folder.join(file_name(session_id))
    }
}

impl VoiceSink for FileStorage {
    fn write(&self, session_id: &str, key: &str, data: &[u8]) -> Result<(), SinkError> {
        let io_err = |source| SinkError::Io {
            key: key.to_owned(),
            source,
        };

        let session_folder = self.session_folder(session_id);
        if !session_folder.is_dir() {
            std::fs::create_dir_all(&session_folder).map_err(io_err)?;
            tracing::debug!("Created session folder {:?}", session_folder);
        }

        std::fs::write(session_folder.join(file_name(key)), data).map_err(io_err)
    }
}

impl ClipStorage for FileStorage {
    fn duplicate(&self) -> Box<dyn ClipStorage> {
        Box::new(Self {
            folder: self.folder.clone(),
        })
    }

    fn clear(&self) -> Result<(), SinkError> {
        let folder = self.folder.as_path();
        if !folder.exists() {
            tracing::info!("Output folder {:?} does not exist, nothing to clear", folder);
            return Ok(());
        }

        let io_err = |path: &std::path::Path| {
            let key = path.display().to_string();
            move |source: std::io::Error| SinkError::Io { key, source }
        };

        for entry in std::fs::read_dir(folder).map_err(io_err(folder))? {
            let path = entry.map_err(io_err(folder))?.path();
            if path.is_dir() {
                std::fs::remove_dir_all(&path).map_err(io_err(&path))?;
            } else {
                std::fs::remove_file(&path).map_err(io_err(&path))?;
            }
        }

        Ok(())
    }
}

/// Object key of `key` in session `session_id`, below `prefix` if there is one.
fn object_key(prefix: &str, session_id: &str, key: &str) -> String {
    match prefix.trim_matches('/') {
        "" => format!("{}/{}", session_id, key),
        prefix => format!("{}/{}/{}", prefix, session_id, key),
    }
}

/// Listing prefix covering every export, `None` when that would be the whole bucket.
fn clear_prefix(prefix: &str) -> Option<String> {
    match prefix.trim_matches('/') {
        "" => None,
        prefix => Some(format!("{}/", prefix)),
    }
}

pub struct S3Storage {
    bucket: std::sync::Arc<s3::Bucket>,
    prefix: std::sync::Arc<str>,
    runtime: tokio::runtime::Handle,
}

impl S3Storage {
    /// Blocking writes are driven on `runtime`, so they must come from outside of it,
    /// e.g. from a `spawn_blocking` worker. Every object is stored below `prefix`.
    pub fn new(
        bucket_name: &str,
        prefix: &str,
        region: s3::region::Region,
        credentials: s3::creds::Credentials,
        runtime: tokio::runtime::Handle,
    ) -> Result<Self, s3::error::S3Error> {
        let mut bucket = s3::bucket::Bucket::new(bucket_name, region, credentials)?;
        bucket.set_path_style();

        Ok(Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            runtime,
        })
    }
}

impl VoiceSink for S3Storage {
    fn write(&self, session_id: &str, key: &str, data: &[u8]) -> Result<(), SinkError> {
        let path = object_key(&self.prefix, session_id, key);
        let remote_err = |reason: String| SinkError::Remote {
            key: path.clone(),
            reason,
        };

        let resp = self
            .runtime
            .block_on(self.bucket.put_object(&path, data))
            .map_err(|e| remote_err(format!("{:?}", e)))?;

        if !(200..300).contains(&resp.status_code()) {
            return Err(remote_err(format!("Status code {}", resp.status_code())));
        }

        Ok(())
    }
}

impl ClipStorage for S3Storage {
    fn duplicate(&self) -> Box<dyn ClipStorage> {
        Box::new(Self {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            runtime: self.runtime.clone(),
        })
    }

    fn clear(&self) -> Result<(), SinkError> {
        let remote_err = |key: &str| {
            let key = key.to_owned();
            move |e: s3::error::S3Error| SinkError::Remote {
                key,
                reason: format!("{:?}", e),
            }
        };

        let prefix = clear_prefix(&self.prefix).ok_or_else(|| SinkError::Remote {
            key: String::new(),
            reason: "Refusing to clear a bucket without a key prefix".to_owned(),
        })?;
        tracing::info!(%prefix, "Clearing exported clips");

        self.runtime.block_on(async {
            let listing = self
                .bucket
                .list(prefix.clone(), None)
                .await
                .map_err(remote_err(&prefix))?;

            for object in listing.into_iter().flat_map(|l| l.contents) {
                self.bucket
                    .delete_object(&object.key)
                    .await
                    .map_err(remote_err(&object.key))?;
            }

            Ok::<(), SinkError>(())
        })
    }
}
