//! In-memory store for tests and ephemeral runs.

use std::{collections::BTreeMap, sync::Mutex};

use {async_trait::async_trait, crosslink_channels::ChannelRef};

use crate::{Result, store::ForwardStore, types::ForwardTarget};

/// Store backed by a `BTreeMap`. Nothing survives the process.
#[derive(Default)]
pub struct MemoryForwardStore {
    channels: Mutex<BTreeMap<ChannelRef, Vec<ForwardTarget>>>,
}

impl MemoryForwardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ForwardStore for MemoryForwardStore {
    async fn get_targets(&self, channel: &ChannelRef) -> Result<Option<Vec<ForwardTarget>>> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Ok(channels.get(channel).cloned())
    }

    async fn upsert_targets(&self, channel: &ChannelRef, targets: &[ForwardTarget]) -> Result<()> {
        let mut channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        channels.insert(channel.clone(), targets.to_vec());
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelRef>> {
        let channels = self.channels.lock().unwrap_or_else(|e| e.into_inner());
        Ok(channels
            .iter()
            .filter(|(_, targets)| !targets.is_empty())
            .map(|(channel, _)| channel.clone())
            .collect())
    }
}
