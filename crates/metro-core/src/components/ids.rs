//! Engine-scoped identifier allocation.

use metro_events::PassengerId;

/// Hands out passenger ids in creation order.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next_passenger: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_passenger(&mut self) -> PassengerId {
        let id = PassengerId(self.next_passenger);
        self.next_passenger += 1;
        id
    }

    /// Number of passenger ids issued so far.
    pub fn passengers_issued(&self) -> u64 {
        self.next_passenger
    }
}
