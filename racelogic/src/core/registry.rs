use crate::core::competitor::{Competitor, CompetitorPars};
use std::collections::HashMap;

/// Stable index of a competitor inside the registry. Handles are never invalidated because
/// competitors are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Registry owns all competitor records in registration order and resolves feed ids to handles.
#[derive(Debug, Default)]
pub struct Registry {
    competitors: Vec<Competitor>,
    ids: HashMap<String, Handle>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Returns `None` if the id is already registered.
    pub fn add(&mut self, pars: &CompetitorPars) -> Option<Handle> {
        if self.ids.contains_key(&pars.id) {
            return None;
        }
        let handle = Handle(self.competitors.len());
        self.competitors.push(Competitor::new(pars));
        self.ids.insert(pars.id.to_owned(), handle);
        Some(handle)
    }

    pub fn handle(&self, id: &str) -> Option<Handle> {
        self.ids.get(id).copied()
    }

    pub fn get(&self, handle: Handle) -> &Competitor {
        &self.competitors[handle.0]
    }

    pub fn get_mut(&mut self, handle: Handle) -> &mut Competitor {
        &mut self.competitors[handle.0]
    }

    pub fn by_id(&self, id: &str) -> Option<&Competitor> {
        self.handle(id).map(|handle| self.get(handle))
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> {
        (0..self.competitors.len()).map(Handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Competitor> {
        self.competitors.iter()
    }

    pub fn as_slice(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }
}
