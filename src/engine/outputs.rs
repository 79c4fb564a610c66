//! Deployed stack outputs
//!
//! Each deployed stack leaves a `<stack>.outputs.json` record next to its
//! template. Exports are looked up across every record in the directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{GatelinkError, Result};
use crate::topology::StackIdentity;

const OUTPUTS_SUFFIX: &str = ".outputs.json";

/// One resolved output value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedOutput {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_name: Option<String>,
}

/// Everything a deployment published for one stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackOutputsRecord {
    pub stack: StackIdentity,
    pub outputs: BTreeMap<String, DeployedOutput>,
}

impl StackOutputsRecord {
    pub fn exports(&self) -> impl Iterator<Item = (&str, &DeployedOutput)> {
        self.outputs
            .values()
            .filter_map(|o| o.export_name.as_deref().map(|name| (name, o)))
    }
}

/// Reads and writes output records under one directory
#[derive(Debug, Clone)]
pub struct OutputRegistry {
    dir: PathBuf,
}

impl OutputRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, stack_name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", stack_name, OUTPUTS_SUFFIX))
    }

    /// Outputs of one stack. Fails with `NotFound` when it was never deployed.
    pub async fn read(&self, stack_name: &str) -> Result<StackOutputsRecord> {
        let path = self.path_for(stack_name);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatelinkError::not_found("deployed stack", stack_name));
            }
            Err(e) => {
                return Err(GatelinkError::io(format!("Failed to read {}", path.display()), e))
            }
        };
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the record for `record.stack`, written atomically
    pub async fn write(&self, record: &StackOutputsRecord) -> Result<PathBuf> {
        let path = self.path_for(&record.stack.name);
        write_atomic(&path, serde_json::to_string_pretty(record)?.as_bytes()).await?;
        debug!(path = %path.display(), outputs = record.outputs.len(), "Stack outputs recorded");
        Ok(path)
    }

    /// Every record in the directory; a missing directory holds none
    pub async fn list(&self) -> Result<Vec<StackOutputsRecord>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GatelinkError::io(format!("Failed to list {}", self.dir.display()), e))
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| GatelinkError::io(format!("Failed to list {}", self.dir.display()), e))?
        {
            let file_name = entry.file_name();
            let Some(stack_name) =
                file_name.to_str().and_then(|name| name.strip_suffix(OUTPUTS_SUFFIX))
            else {
                continue;
            };
            records.push(self.read(stack_name).await?);
        }
        records.sort_by(|a, b| a.stack.name.cmp(&b.stack.name));
        Ok(records)
    }

    /// Which stack exports `export_name`, and its value
    pub async fn find_export(&self, export_name: &str) -> Result<Option<(String, DeployedOutput)>> {
        for record in self.list().await? {
            if let Some((_, output)) = record.exports().find(|(name, _)| *name == export_name) {
                return Ok(Some((record.stack.name.clone(), output.clone())));
            }
        }
        Ok(None)
    }
}

/// Write through a sibling temp file and rename over the target
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| GatelinkError::io(format!("Failed to create {}", parent.display()), e))?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    tokio::fs::write(&temp, contents)
        .await
        .map_err(|e| GatelinkError::io(format!("Failed to write {}", temp.display()), e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| GatelinkError::io(format!("Failed to replace {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(stack: &str, export: Option<&str>) -> StackOutputsRecord {
        let mut outputs = BTreeMap::new();
        outputs.insert(
            "ApiGatewayURL".to_string(),
            DeployedOutput {
                value: format!("https://{}.example/DEV/", stack),
                export_name: export.map(str::to_string),
            },
        );
        StackOutputsRecord {
            stack: StackIdentity::new(stack, "us-east-1", "123456789012"),
            outputs,
        }
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let registry = OutputRegistry::new(dir.path());
        let original = record("StackA", Some("ApiGatewayURL"));

        let path = registry.write(&original).await.unwrap();
        assert!(path.ends_with("StackA.outputs.json"));
        assert_eq!(registry.read("StackA").await.unwrap(), original);
    }

    #[tokio::test]
    async fn missing_stack_is_not_found() {
        let dir = TempDir::new().unwrap();
        let registry = OutputRegistry::new(dir.path());
        let err = registry.read("Nope").await.unwrap_err();
        assert!(matches!(err, GatelinkError::NotFound { .. }));
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let registry = OutputRegistry::new(dir.path().join("absent"));
        assert!(registry.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finds_export_across_stacks() {
        let dir = TempDir::new().unwrap();
        let registry = OutputRegistry::new(dir.path());
        registry.write(&record("StackA", None)).await.unwrap();
        registry.write(&record("StackB", Some("SharedUrl"))).await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();

        let (stack, output) = registry.find_export("SharedUrl").await.unwrap().unwrap();
        assert_eq!(stack, "StackB");
        assert_eq!(output.value, "https://StackB.example/DEV/");
        assert!(registry.find_export("Other").await.unwrap().is_none());
    }
}
