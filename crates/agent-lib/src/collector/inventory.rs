//! Inventory-file backed instance source
//!
//! Reads a JSON document describing instances and their metric series.
//! The file is read once per collection pass through `snapshot`, so an
//! external exporter can refresh it between cycles without tearing a pass.

use super::InstanceSource;
use crate::models::{Datapoint, InstanceDescriptor, InstanceUtilization};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Instance state reported for instances that can take workloads
pub const RUNNING_STATE: &str = "running";

/// Inventory document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub instances: Vec<InventoryInstance>,
}

/// One instance entry of the inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryInstance {
    pub instance_id: String,
    pub instance_class: String,
    pub availability_zone: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(flatten)]
    pub utilization: InstanceUtilization,
}

fn default_state() -> String {
    RUNNING_STATE.to_string()
}

impl InventoryInstance {
    pub fn running(
        instance_id: impl Into<String>,
        instance_class: impl Into<String>,
        availability_zone: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            instance_class: instance_class.into(),
            availability_zone: availability_zone.into(),
            state: default_state(),
            utilization: InstanceUtilization::default(),
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// Append a CPU datapoint
    pub fn with_cpu(mut self, timestamp: i64, value: f64) -> Self {
        self.utilization.cpu.push(Datapoint { timestamp, value });
        self
    }

    /// Append a memory datapoint
    pub fn with_memory(mut self, timestamp: i64, value: f64) -> Self {
        self.utilization.memory.push(Datapoint { timestamp, value });
        self
    }

    fn is_running(&self) -> bool {
        self.state == RUNNING_STATE
    }

    fn descriptor(&self) -> InstanceDescriptor {
        InstanceDescriptor {
            instance_id: self.instance_id.clone(),
            instance_class: self.instance_class.clone(),
            availability_zone: self.availability_zone.clone(),
        }
    }
}

impl Inventory {
    pub fn new(instances: Vec<InventoryInstance>) -> Self {
        Self { instances }
    }

    fn running(&self) -> Vec<InstanceDescriptor> {
        self.instances
            .iter()
            .filter(|i| i.is_running())
            .map(InventoryInstance::descriptor)
            .collect()
    }

    fn utilization_of(&self, instance_id: &str) -> Option<InstanceUtilization> {
        self.instances
            .iter()
            .find(|i| i.instance_id == instance_id)
            .map(|i| i.utilization.clone())
    }
}

enum Backing {
    File(PathBuf),
    Memory(Inventory),
}

/// Instance source over an inventory document
pub struct InventorySource {
    backing: Backing,
}

impl InventorySource {
    /// Source that reads `path` on every call or snapshot
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File(path.into()),
        }
    }

    /// Source over a fixed in-memory inventory
    pub fn from_inventory(inventory: Inventory) -> Self {
        Self {
            backing: Backing::Memory(inventory),
        }
    }

}

async fn read_inventory(path: &Path) -> Result<Inventory> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read inventory {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse inventory {}", path.display()))
}

#[async_trait]
impl InstanceSource for InventorySource {
    async fn list_running(&self) -> Result<Vec<InstanceDescriptor>> {
        match &self.backing {
            Backing::File(path) => Ok(read_inventory(path).await?.running()),
            Backing::Memory(inventory) => Ok(inventory.running()),
        }
    }

    async fn utilization(&self, instance: &InstanceDescriptor) -> Result<InstanceUtilization> {
        let utilization = match &self.backing {
            Backing::File(path) => read_inventory(path)
                .await?
                .utilization_of(&instance.instance_id),
            Backing::Memory(inventory) => inventory.utilization_of(&instance.instance_id),
        };
        utilization.ok_or_else(|| anyhow::anyhow!("Instance not found: {}", instance.instance_id))
    }

    async fn snapshot(&self) -> Result<Option<Box<dyn InstanceSource>>> {
        match &self.backing {
            Backing::File(path) => {
                let inventory = read_inventory(path).await?;
                Ok(Some(Box::new(Self::from_inventory(inventory))))
            }
            Backing::Memory(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_running_instances_are_listed() {
        let source = InventorySource::from_inventory(Inventory::new(vec![
            InventoryInstance::running("i-1", "t3.micro", "us-east-1a"),
            InventoryInstance::running("i-2", "t3.micro", "us-east-1b").with_state("stopped"),
            InventoryInstance::running("i-3", "t2.small", "eu-west-1c"),
        ]));

        let running = source.list_running().await.unwrap();
        let ids: Vec<_> = running.iter().map(|d| d.instance_id.as_str()).collect();

        assert_eq!(ids, vec!["i-1", "i-3"]);
        assert_eq!(running[1].region(), "eu-west-1");
    }

    #[tokio::test]
    async fn test_unknown_instance_is_an_error() {
        let source = InventorySource::from_inventory(Inventory::default());
        let descriptor = InstanceDescriptor {
            instance_id: "i-missing".to_string(),
            instance_class: "t3.micro".to_string(),
            availability_zone: "us-east-1a".to_string(),
        };

        assert!(source.utilization(&descriptor).await.is_err());
    }

    #[test]
    fn test_inventory_state_defaults_to_running() {
        let json = r#"{"instances":[{"instance_id":"i-1","instance_class":"t3.small","availability_zone":"us-east-1a","cpu":[{"timestamp":1,"value":40.0}]}]}"#;
        let inventory: Inventory = serde_json::from_str(json).unwrap();

        assert_eq!(inventory.instances[0].state, RUNNING_STATE);
        assert_eq!(inventory.instances[0].utilization.cpu.len(), 1);
        assert!(inventory.instances[0].utilization.memory.is_empty());
    }
}
