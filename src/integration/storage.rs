use std::env;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use log::debug;

const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Clone)]
pub struct Config {
    dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

impl Config {
    pub fn env() -> super::Result<Self> {
        let dir = env::var("UPLOADS_DIR")?;
        Ok(Self { dir: dir.into() })
    }

    pub fn connect(&self) -> super::Result<Uploads> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(Uploads::new(self.dir.clone()))
    }
}

/// Local directory that stores uploaded images and hands back their public path.
#[derive(Clone)]
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn save(&self, file_name: Option<&str>, data: &[u8]) -> super::Result<String> {
        let id = uuid::Uuid::new_v4();
        let name = match extension(file_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), data).await?;
        debug!("stored upload {name} ({} bytes)", data.len());

        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }

    /// Stores the file sent as `field_name` in a multipart body.
    pub async fn save_field(
        &self,
        mut multipart: Multipart,
        field_name: &'static str,
    ) -> crate::Result<String> {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some(field_name) {
                continue;
            }

            let file_name = field.file_name().map(str::to_owned);
            let data = field.bytes().await?;
            if data.is_empty() {
                break;
            }

            return Ok(self.save(file_name.as_deref(), &data).await?);
        }

        Err(crate::Error::MissingField(field_name))
    }
}

fn extension(file_name: Option<&str>) -> Option<String> {
    let ext = Path::new(file_name?).extension()?.to_str()?;

    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}
