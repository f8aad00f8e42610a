//! In-process gateway with failure injection

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{GatewayError, PersistenceGateway};
use crate::entry::Entry;
use crate::wire::{self, Payload};

#[derive(Debug, Default)]
struct MemoryState {
    /// Encoded store per location
    stored: HashMap<PathBuf, String>,
    /// Raw load responses that take precedence over `stored`
    seeded: HashMap<PathBuf, Payload>,
    /// Every save call, in the order it ran
    saves: Vec<Vec<Entry>>,
    fail_saves: bool,
}

/// Gateway that keeps the store in memory and records every save
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer loads at `location` with a fixed payload
    pub fn seed(&self, location: &Path, payload: Payload) {
        self.state().seeded.insert(location.to_path_buf(), payload);
    }

    /// Make subsequent saves fail (or succeed again)
    pub fn set_failing(&self, fail: bool) {
        self.state().fail_saves = fail;
    }

    /// Every save attempted so far, including rejected ones
    pub fn saves(&self) -> Vec<Vec<Entry>> {
        self.state().saves.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not wedge the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PersistenceGateway for MemoryGateway {
    fn save(&self, location: &Path, entries: &[Entry]) -> Result<(), GatewayError> {
        let mut state = self.state();
        state.saves.push(entries.to_vec());

        if state.fail_saves {
            return Err(GatewayError::Rejected("injected failure".to_string()));
        }

        let text = wire::encode(entries)?;
        state.seeded.remove(location);
        state.stored.insert(location.to_path_buf(), text);
        Ok(())
    }

    fn load(&self, location: &Path) -> Result<Payload, GatewayError> {
        let state = self.state();
        if let Some(payload) = state.seeded.get(location) {
            return Ok(payload.clone());
        }
        Ok(state
            .stored
            .get(location)
            .map(|text| Payload::Text(text.clone()))
            .unwrap_or_else(Payload::empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let gateway = MemoryGateway::new();
        let location = Path::new("/vault");
        let entries = vec![Entry::new("b", "2"), Entry::new("a", "1")];

        gateway.save(location, &entries).unwrap();
        let loaded = wire::decode(gateway.load(location).unwrap()).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_failing_saves_are_recorded_but_not_stored() {
        let gateway = MemoryGateway::new();
        let location = Path::new("/vault");
        gateway.set_failing(true);

        assert!(gateway.save(location, &[Entry::new("a", "1")]).is_err());
        assert_eq!(gateway.saves().len(), 1);
        assert_eq!(gateway.load(location).unwrap(), Payload::empty());
    }

    #[test]
    fn test_seeded_payload() {
        let gateway = MemoryGateway::new();
        let location = Path::new("/vault");
        gateway.seed(location, Payload::Text("garbage".into()));
        assert_eq!(
            gateway.load(location).unwrap(),
            Payload::Text("garbage".into())
        );
    }
}
