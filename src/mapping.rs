use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

/// Interview id to uploaded resume path. Callers hand the store in explicitly.
pub trait MappingStore {
    async fn set(&self, interview_id: &str, file_path: &str) -> anyhow::Result<()>;
    async fn get(&self, interview_id: &str) -> anyhow::Result<Option<String>>;
    async fn remove(&self, interview_id: &str) -> anyhow::Result<bool>;
    async fn all(&self) -> anyhow::Result<BTreeMap<String, String>>;
}

pub struct PgMappingStore {
    pool: PgPool,
}

impl PgMappingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl MappingStore for PgMappingStore {
    async fn set(&self, interview_id: &str, file_path: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO hire_signal.resume_mappings (interview_id, file_path, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (interview_id) DO UPDATE
            SET file_path = EXCLUDED.file_path, updated_at = NOW()
            "#,
        )
        .bind(interview_id)
        .bind(file_path)
        .execute(&self.pool)
        .await?;

        info!(interview_id, file_path, "resume mapping saved");
        Ok(())
    }

    async fn get(&self, interview_id: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query(
            "SELECT file_path FROM hire_signal.resume_mappings WHERE interview_id = $1",
        )
        .bind(interview_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.get("file_path")))
    }

    async fn remove(&self, interview_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM hire_signal.resume_mappings WHERE interview_id = $1")
            .bind(interview_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let rows = sqlx::query(
            "SELECT interview_id, file_path FROM hire_signal.resume_mappings ORDER BY interview_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("interview_id"), row.get("file_path")))
            .collect())
    }
}

/// Mappings kept in a pretty-printed JSON object on disk.
pub struct JsonFileMappingStore {
    path: PathBuf,
}

impl JsonFileMappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => serde_json::from_str(&data)
                .with_context(|| format!("{} is not a JSON object of paths", self.path.display())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no mapping file yet");
                Ok(BTreeMap::new())
            }
            Err(err) => Err(err).with_context(|| format!("failed to read {}", self.path.display())),
        }
    }

    async fn save(&self, mappings: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(mappings)?;
        tokio::fs::write(&self.path, data)
            .await
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl MappingStore for JsonFileMappingStore {
    async fn set(&self, interview_id: &str, file_path: &str) -> anyhow::Result<()> {
        let mut mappings = self.load().await?;
        mappings.insert(interview_id.to_string(), file_path.to_string());
        self.save(&mappings).await?;

        info!(interview_id, file_path, "resume mapping saved");
        Ok(())
    }

    async fn get(&self, interview_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self.load().await?.remove(interview_id))
    }

    async fn remove(&self, interview_id: &str) -> anyhow::Result<bool> {
        let mut mappings = self.load().await?;
        if mappings.remove(interview_id).is_none() {
            return Ok(false);
        }

        self.save(&mappings).await?;
        Ok(true)
    }

    async fn all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn scratch_store() -> JsonFileMappingStore {
        let path = std::env::temp_dir().join(format!("hire-signal-{}.json", Uuid::new_v4()));
        JsonFileMappingStore::new(path)
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let store = scratch_store();
        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(store.get("interview-1").await.unwrap(), None);
        assert!(!store.remove("interview-1").await.unwrap());
    }

    #[tokio::test]
    async fn set_get_and_remove() {
        let store = scratch_store();
        store.set("interview-1", "resumes/a.pdf").await.unwrap();
        store.set("interview-2", "resumes/b.pdf").await.unwrap();
        store.set("interview-1", "resumes/c.pdf").await.unwrap();

        assert_eq!(
            store.get("interview-1").await.unwrap().as_deref(),
            Some("resumes/c.pdf")
        );
        assert_eq!(store.all().await.unwrap().len(), 2);

        assert!(store.remove("interview-2").await.unwrap());
        assert_eq!(store.get("interview-2").await.unwrap(), None);

        let reopened = JsonFileMappingStore::new(store.path.clone());
        assert_eq!(reopened.all().await.unwrap().len(), 1);

        let _ = std::fs::remove_file(&store.path);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let store = scratch_store();
        std::fs::write(&store.path, "not json").unwrap();
        assert!(store.get("interview-1").await.is_err());
        let _ = std::fs::remove_file(&store.path);
    }
}
