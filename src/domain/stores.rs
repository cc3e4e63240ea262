//! Store traits for cards and configurations
//!
//! The engine owns no long-lived storage. It borrows the card and
//! configuration lists from these collaborators for the duration of one pass
//! and hands a transformed card list back; all I/O stays with the host.

use anyhow::Result;

use crate::domain::card::Card;
use crate::domain::configuration::Configuration;

/// External card persistence owned by the host application
pub trait CardStore {
    fn load(&self) -> Result<Vec<Card>>;
    fn save(&mut self, cards: &[Card]) -> Result<()>;
}

/// External configuration persistence; read-only to this engine
pub trait ConfigurationStore {
    fn load(&self) -> Result<Vec<Configuration>>;
}

/// In-memory store, for tests and embedding hosts without persistence
#[derive(Debug, Clone, Default)]
pub struct InMemoryCardStore {
    cards: Vec<Card>,
}

impl InMemoryCardStore {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

impl CardStore for InMemoryCardStore {
    fn load(&self) -> Result<Vec<Card>> {
        Ok(self.cards.clone())
    }

    fn save(&mut self, cards: &[Card]) -> Result<()> {
        self.cards = cards.to_vec();
        Ok(())
    }
}

/// In-memory configuration store, for tests and embedding hosts
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigurationStore {
    configurations: Vec<Configuration>,
}

impl InMemoryConfigurationStore {
    pub fn new(configurations: Vec<Configuration>) -> Self {
        Self { configurations }
    }
}

impl ConfigurationStore for InMemoryConfigurationStore {
    fn load(&self) -> Result<Vec<Configuration>> {
        Ok(self.configurations.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::CardType;

    #[test]
    fn in_memory_store_round_trips_cards() {
        let mut store = InMemoryCardStore::default();
        let cards = vec![Card::new("F100", CardType::Feature, 1)];

        store.save(&cards).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].sku, "F100");
    }
}
