//! Node Command Gateway (C2): serialises and executes control-plane text
//! commands per node.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;

use crate::node::NodeId;

/// The node command channel: run a routing-control-plane diagnostic command
/// on a node and get back raw text. Implemented by the host application
/// (e.g. over SSH, or a local process channel); the collector never spawns
/// processes itself.
#[async_trait]
pub trait NodeExec: Send + Sync {
    /// Runs `command` on `node`. Should return promptly; the `Gateway`
    /// applies its own timeout on top of this call.
    async fn exec(&self, node: &NodeId, command: &str) -> String;
}

/// Wraps a `NodeExec` with per-node serialisation and a hard timeout,
/// matching the C2 contract: concurrent calls to different nodes are
/// independent, calls to the same node are serialised, and a call that
/// exceeds `COMMAND_TIMEOUT` returns `("", false)`.
pub struct Gateway<E: NodeExec> {
    exec: E,
    command_timeout: Duration,
    locks: RwLock<HashMap<NodeId, Arc<Mutex<()>>>>,
}

impl<E: NodeExec> Gateway<E> {
    pub fn new(exec: E, command_timeout: Duration) -> Self {
        Gateway {
            exec,
            command_timeout,
            locks: RwLock::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, node: &NodeId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(node) {
            return lock.clone();
        }
        let mut locks = self.locks.write().await;
        locks.entry(node.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Runs `command` on `node`, serialised against other calls to the same
    /// node. Returns `(text, ok)`; `ok=false` only on timeout, per §4.1 —
    /// a non-zero exit or control-plane error text is still `ok=true`,
    /// since interpreting it belongs to the parsers.
    pub async fn exec(&self, node: &NodeId, command: &str) -> (String, bool) {
        let lock = self.lock_for(node).await;
        let _guard = lock.lock().await;
        match tokio::time::timeout(self.command_timeout, self.exec.exec(node, command)).await {
            Ok(text) => (text, true),
            Err(_) => (String::new(), false),
        }
    }
}
