//! In-memory registry of open wizard sessions, one per advisor tab.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;

use crate::gateway::BackendGateway;

use super::wizard::{SimulationWizard, WizardError};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WizardSessionId(pub String);

impl WizardSessionId {
    pub fn new(value: impl Into<String>) -> Self {
        WizardSessionId(value.into())
    }

    fn next() -> Self {
        let n = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        WizardSessionId(format!("wiz-{n:06}"))
    }
}

impl fmt::Display for WizardSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Session store. The outer lock only guards the map; each wizard sits
/// behind its own async lock so sessions never block each other.
pub struct WizardSessions<G> {
    sessions: Mutex<HashMap<WizardSessionId, Arc<AsyncMutex<SimulationWizard<G>>>>>,
}

impl<G: BackendGateway> WizardSessions<G> {
    pub fn new() -> Self {
        WizardSessions {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn create(
        &self,
        gateway: Arc<G>,
    ) -> Result<(WizardSessionId, Arc<AsyncMutex<SimulationWizard<G>>>), WizardError> {
        let wizard = SimulationWizard::start(gateway).await?;
        let id = WizardSessionId::next();
        let slot = Arc::new(AsyncMutex::new(wizard));
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(id.clone(), Arc::clone(&slot));
        Ok((id, slot))
    }

    pub fn get(&self, id: &WizardSessionId) -> Option<Arc<AsyncMutex<SimulationWizard<G>>>> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.get(id).map(Arc::clone)
    }

    pub fn remove(&self, id: &WizardSessionId) -> Option<Arc<AsyncMutex<SimulationWizard<G>>>> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<G: BackendGateway> Default for WizardSessions<G> {
    fn default() -> Self {
        WizardSessions::new()
    }
}
