//! Shopping cart.
//!
//! [`CartState`] is a plain value: every operation consumes it and returns
//! the next state. [`CartStore`] owns the current state and writes the full
//! line list to storage after each mutation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::GameRecord;
use crate::storage::{self, KeyValueStore, CART_KEY};

/// One cart entry. Quantity is always at least 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub game: GameRecord,
    pub quantity: u32,
}

impl CartLine {
    pub fn id(&self) -> &str {
        &self.game.id
    }

    pub fn subtotal(&self) -> f64 {
        self.game.effective_price() * f64::from(self.quantity)
    }
}

/// Round to whole cents
fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    lines: Vec<CartLine>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a state from persisted lines, dropping anything that breaks
    /// the invariants (zero quantity, empty or repeated ids).
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut state = Self::new();
        for line in lines {
            if line.quantity == 0 || line.game.id.is_empty() || state.contains(&line.game.id) {
                tracing::debug!("Dropping invalid persisted cart line '{}'", line.game.id);
                continue;
            }
            state.lines.push(line);
        }
        state
    }

    /// Increment the matching line or append a new one with quantity 1.
    /// A record without an id leaves the cart unchanged.
    pub fn add(mut self, game: GameRecord) -> Self {
        if game.id.is_empty() {
            tracing::warn!("Ignoring add to cart for '{}' without an id", game.name);
            return self;
        }

        match self.lines.iter_mut().find(|line| line.game.id == game.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine { game, quantity: 1 }),
        }
        self
    }

    pub fn remove(mut self, id: &str) -> Self {
        self.lines.retain(|line| line.game.id != id);
        self
    }

    /// Set (not adjust) the quantity; zero or below removes the line
    pub fn update_quantity(mut self, id: &str, quantity: i64) -> Self {
        if quantity <= 0 {
            return self.remove(id);
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.lines.iter_mut().find(|line| line.game.id == id) {
            line.quantity = quantity;
        }
        self
    }

    pub fn clear(self) -> Self {
        Self::new()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lines.iter().any(|line| line.game.id == id)
    }

    pub fn quantity_of(&self, id: &str) -> u32 {
        self.lines
            .iter()
            .find(|line| line.game.id == id)
            .map_or(0, |line| line.quantity)
    }

    /// Sum of price x quantity, missing prices counted as 0
    pub fn total(&self) -> f64 {
        round_cents(self.lines.iter().map(CartLine::subtotal).sum())
    }

    /// Sum of quantities, not the number of lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// Cart state bound to durable storage
pub struct CartStore {
    state: CartState,
    storage: Arc<dyn KeyValueStore>,
}

impl CartStore {
    /// Load the persisted cart; missing or corrupted data yields an empty cart
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = Self::read(storage.as_ref());
        tracing::debug!("Loaded cart with {} line(s)", state.lines().len());
        Self { state, storage }
    }

    fn read(storage: &dyn KeyValueStore) -> CartState {
        storage::load_json::<Vec<CartLine>>(storage, CART_KEY)
            .map(CartState::from_lines)
            .unwrap_or_default()
    }

    /// Re-read the cart from storage, discarding in-memory state
    pub fn reload(&mut self) -> &CartState {
        self.state = Self::read(self.storage.as_ref());
        &self.state
    }

    fn apply(&mut self, op: impl FnOnce(CartState) -> CartState) -> &CartState {
        let current = std::mem::take(&mut self.state);
        self.state = op(current);
        storage::save_json(self.storage.as_ref(), CART_KEY, self.state.lines());
        &self.state
    }

    pub fn add_to_cart(&mut self, game: GameRecord) -> &CartState {
        self.apply(|state| state.add(game))
    }

    pub fn remove_from_cart(&mut self, id: &str) -> &CartState {
        self.apply(|state| state.remove(id))
    }

    pub fn update_quantity(&mut self, id: &str, quantity: i64) -> &CartState {
        self.apply(|state| state.update_quantity(id, quantity))
    }

    pub fn clear_cart(&mut self) -> &CartState {
        self.apply(CartState::clear)
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    pub fn lines(&self) -> &[CartLine] {
        self.state.lines()
    }

    pub fn cart_total(&self) -> f64 {
        self.state.total()
    }

    pub fn cart_item_count(&self) -> u32 {
        self.state.item_count()
    }
}
