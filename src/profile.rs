//! Session and profile data: user, orders, addresses, payment methods and
//! favorites, persisted as one bundle.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cart::CartLine;
use crate::core::GameRecord;
use crate::storage::{self, KeyValueStore, AUTH_KEY, CART_KEY};

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Timestamp-based local id, e.g. `addr_1718000000000_004`.
/// The trailing counter keeps ids distinct within the same millisecond.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 1000;
    format!("{}_{}_{:03}", prefix, millis, seq)
}

/// Shallow-merge the fields of a JSON object into a record. The id is never
/// overwritten. Returns `None` if the result no longer fits the type.
pub fn merge_patch<T: Serialize + DeserializeOwned>(item: &T, patch: &Value) -> Option<T> {
    let Value::Object(patch) = patch else {
        tracing::warn!("Ignoring non-object patch");
        return None;
    };
    let Ok(Value::Object(mut fields)) = serde_json::to_value(item) else {
        return None;
    };

    for (key, value) in patch {
        if key != "id" {
            fields.insert(key.clone(), value.clone());
        }
    }

    match serde_json::from_value(Value::Object(fields)) {
        Ok(merged) => Some(merged),
        Err(e) => {
            tracing::warn!("Ignoring invalid patch: {}", e);
            None
        }
    }
}

/// Records stored in a [`Collection`]
pub trait Identified {
    /// Prefix for generated ids
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// Records of which exactly one per non-empty collection is the default
pub trait Defaultable: Identified {
    fn is_default(&self) -> bool;

    fn set_default(&mut self, is_default: bool);
}

/// Ordered list of records keyed by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Collection<T>
where
    T: Identified + Serialize + DeserializeOwned + Clone,
{
    /// Append a record, generating an id when it has none or when its id is
    /// already taken. Returns the id.
    pub fn add(&mut self, mut item: T) -> String {
        if self.contains(item.id()) {
            tracing::debug!("Id {} already taken, generating a new one", item.id());
        }
        while item.id().is_empty() || self.contains(item.id()) {
            item.set_id(generate_id(T::ID_PREFIX));
        }
        let id = item.id().to_string();
        self.items.push(item);
        id
    }

    /// Partial merge by id. Unknown ids and invalid patches change nothing.
    pub fn update(&mut self, id: &str, patch: &Value) -> bool {
        let Some(slot) = self.items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };
        match merge_patch(&*slot, patch) {
            Some(merged) => {
                *slot = merged;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        self.items.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Collection<T>
where
    T: Defaultable + Serialize + DeserializeOwned + Clone,
{
    /// Add a record; it is the default only if the collection was empty
    pub fn add_keep_default(&mut self, mut item: T) -> String {
        item.set_default(self.is_empty());
        self.add(item)
    }

    /// Partial merge that cannot break the single default. `is_default: true`
    /// makes the record the default; `is_default: false` is ignored.
    pub fn update_keep_default(&mut self, id: &str, patch: &Value) -> bool {
        let mut patch = patch.clone();
        let make_default = match patch.as_object_mut() {
            Some(fields) => fields.remove("is_default").and_then(|v| v.as_bool()) == Some(true),
            None => false,
        };

        let updated = self.update(id, &patch);
        if updated && make_default {
            self.set_default(id);
        }
        updated
    }

    /// Remove a record; removing the default promotes the first remaining one
    pub fn remove_keep_default(&mut self, id: &str) -> bool {
        let was_default = self.get(id).is_some_and(|item| item.is_default());
        if !self.remove(id) {
            return false;
        }
        if was_default {
            if let Some(first) = self.items.first_mut() {
                first.set_default(true);
            }
        }
        true
    }

    pub fn set_default(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        for item in self.items.iter_mut() {
            let is_default = item.id() == id;
            item.set_default(is_default);
        }
        true
    }

    pub fn default_item(&self) -> Option<&T> {
        self.items.iter().find(|item| item.is_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: generate_id("user"),
            name: name.into(),
            email: email.into(),
            avatar: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: String,
    pub lines: Vec<CartLine>,
    pub total: f64,
    pub item_count: u32,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub address_id: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Identified for Order {
    const ID_PREFIX: &'static str = "order";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Address {
    pub id: String,
    pub label: String,
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

impl Defaultable for Address {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl Identified for Address {
    const ID_PREFIX: &'static str = "addr";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Saved card. Only the last four digits are ever kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PaymentMethod {
    pub id: String,
    pub brand: String,
    pub last4: String,
    /// `MM/YY`
    pub expiry: String,
    pub holder: String,
    pub is_default: bool,
}

impl PaymentMethod {
    /// Build from a full card number, keeping only its last four digits
    pub fn from_card(
        brand: impl Into<String>,
        number: &str,
        expiry: impl Into<String>,
        holder: impl Into<String>,
    ) -> Self {
        let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
        let last4: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        Self {
            id: String::new(),
            brand: brand.into(),
            last4,
            expiry: expiry.into(),
            holder: holder.into(),
            is_default: false,
        }
    }
}

impl Defaultable for PaymentMethod {
    fn is_default(&self) -> bool {
        self.is_default
    }

    fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl Identified for PaymentMethod {
    const ID_PREFIX: &'static str = "pm";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Persisted session/profile bundle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileState {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub orders: Collection<Order>,
    pub addresses: Collection<Address>,
    pub payment_methods: Collection<PaymentMethod>,
    pub favorites: Vec<GameRecord>,
}

/// Profile state bound to durable storage
pub struct ProfileStore {
    state: ProfileState,
    storage: Arc<dyn KeyValueStore>,
}

impl ProfileStore {
    /// Load the persisted bundle; missing or corrupted data yields defaults
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = storage::load_json(storage.as_ref(), AUTH_KEY).unwrap_or_default();
        Self { state, storage }
    }

    fn persist(&self) {
        storage::save_json(self.storage.as_ref(), AUTH_KEY, &self.state);
    }

    fn mutate<R>(&mut self, op: impl FnOnce(&mut ProfileState) -> R) -> R {
        let result = op(&mut self.state);
        self.persist();
        result
    }

    pub fn state(&self) -> &ProfileState {
        &self.state
    }

    // Session

    pub fn login(&mut self, user: User) {
        tracing::info!("User {} logged in", user.email);
        self.mutate(|state| {
            state.is_authenticated = true;
            state.user = Some(user);
        });
    }

    /// End the session and drop the persisted cart
    pub fn logout(&mut self) {
        self.mutate(|state| {
            state.is_authenticated = false;
            state.user = None;
        });
        storage::remove_key(self.storage.as_ref(), CART_KEY);
        tracing::info!("User logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    /// Partial merge into the logged-in user; false when nobody is logged in
    pub fn update_user(&mut self, patch: &Value) -> bool {
        let Some(merged) = self.state.user.as_ref().and_then(|user| merge_patch(user, patch)) else {
            return false;
        };
        self.mutate(|state| state.user = Some(merged));
        true
    }

    // Orders

    pub fn add_order(&mut self, order: Order) -> String {
        self.mutate(|state| state.orders.add(order))
    }

    pub fn update_order(&mut self, id: &str, patch: &Value) -> bool {
        self.mutate(|state| state.orders.update(id, patch))
    }

    pub fn remove_order(&mut self, id: &str) -> bool {
        self.mutate(|state| state.orders.remove(id))
    }

    pub fn orders(&self) -> &[Order] {
        self.state.orders.list()
    }

    // Addresses

    /// The first saved address becomes the default
    pub fn add_address(&mut self, address: Address) -> String {
        self.mutate(|state| state.addresses.add_keep_default(address))
    }

    pub fn update_address(&mut self, id: &str, patch: &Value) -> bool {
        self.mutate(|state| state.addresses.update_keep_default(id, patch))
    }

    pub fn remove_address(&mut self, id: &str) -> bool {
        self.mutate(|state| state.addresses.remove_keep_default(id))
    }

    pub fn addresses(&self) -> &[Address] {
        self.state.addresses.list()
    }

    pub fn set_default_address(&mut self, id: &str) -> bool {
        if !self.state.addresses.contains(id) {
            return false;
        }
        self.mutate(|state| state.addresses.set_default(id))
    }

    pub fn default_address(&self) -> Option<&Address> {
        self.state.addresses.default_item()
    }

    // Payment methods

    /// The first saved payment method becomes the default
    pub fn add_payment_method(&mut self, method: PaymentMethod) -> String {
        self.mutate(|state| state.payment_methods.add_keep_default(method))
    }

    pub fn update_payment_method(&mut self, id: &str, patch: &Value) -> bool {
        self.mutate(|state| state.payment_methods.update_keep_default(id, patch))
    }

    pub fn remove_payment_method(&mut self, id: &str) -> bool {
        self.mutate(|state| state.payment_methods.remove_keep_default(id))
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        self.state.payment_methods.list()
    }

    pub fn set_default_payment_method(&mut self, id: &str) -> bool {
        if !self.state.payment_methods.contains(id) {
            return false;
        }
        self.mutate(|state| state.payment_methods.set_default(id))
    }

    pub fn default_payment_method(&self) -> Option<&PaymentMethod> {
        self.state.payment_methods.default_item()
    }

    // Favorites

    /// Add or remove a favorite. Returns whether the game is now a favorite.
    pub fn toggle_favorite(&mut self, game: GameRecord) -> bool {
        if game.id.is_empty() {
            tracing::warn!("Ignoring favorite toggle for '{}' without an id", game.name);
            return false;
        }
        self.mutate(|state| {
            if let Some(pos) = state.favorites.iter().position(|fav| fav.id == game.id) {
                state.favorites.remove(pos);
                false
            } else {
                state.favorites.push(game);
                true
            }
        })
    }

    pub fn remove_favorite(&mut self, id: &str) -> bool {
        self.mutate(|state| {
            let before = state.favorites.len();
            state.favorites.retain(|fav| fav.id != id);
            state.favorites.len() != before
        })
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.state.favorites.iter().any(|fav| fav.id == id)
    }

    pub fn favorites(&self) -> &[GameRecord] {
        &self.state.favorites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SourceKind;
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn store() -> (ProfileStore, Arc<dyn KeyValueStore>) {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (ProfileStore::load(storage.clone()), storage)
    }

    fn address(label: &str) -> Address {
        Address {
            label: label.to_string(),
            full_name: "Ada Lovelace".to_string(),
            street: "12 Analytical Row".to_string(),
            city: "London".to_string(),
            postal_code: "NW1".to_string(),
            country: "UK".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_id("addr");
        let b = generate_id("addr");
        assert_ne!(a, b);
        assert!(a.starts_with("addr_"));
    }

    #[test]
    fn test_address_crud_with_partial_update() {
        let (mut profile, _) = store();
        let home = profile.add_address(address("Home"));
        let work = profile.add_address(address("Work"));
        assert_eq!(profile.addresses().len(), 2);
        assert!(profile.addresses()[0].is_default);
        assert!(!profile.addresses()[1].is_default);

        assert!(profile.update_address(&work, &json!({"city": "Cambridge", "id": "hijack"})));
        let updated = profile.addresses().iter().find(|a| a.id == work).unwrap();
        assert_eq!(updated.city, "Cambridge");
        assert_eq!(updated.label, "Work");

        assert!(!profile.update_address("missing", &json!({"city": "Paris"})));
        assert!(!profile.update_address(&work, &json!({"city": 42})));

        assert!(profile.set_default_address(&work));
        assert_eq!(profile.default_address().unwrap().id, work);

        assert!(profile.remove_address(&home));
        assert!(!profile.remove_address(&home));
        assert_eq!(profile.addresses().len(), 1);
    }

    fn default_count(profile: &ProfileStore) -> usize {
        profile.addresses().iter().filter(|a| a.is_default).count()
    }

    #[test]
    fn test_exactly_one_default_address() {
        let (mut profile, _) = store();
        let home = profile.add_address(address("Home"));
        let work = profile.add_address(address("Work"));

        assert!(profile.update_address(&work, &json!({"is_default": true, "city": "Leeds"})));
        assert_eq!(default_count(&profile), 1);
        assert_eq!(profile.default_address().unwrap().id, work);
        assert_eq!(profile.default_address().unwrap().city, "Leeds");

        // Unsetting directly would leave no default
        assert!(profile.update_address(&work, &json!({"is_default": false})));
        assert_eq!(profile.default_address().unwrap().id, work);

        let preset = Address {
            is_default: true,
            ..address("Cabin")
        };
        let cabin = profile.add_address(preset);
        assert_eq!(default_count(&profile), 1);
        assert!(!profile.addresses().iter().find(|a| a.id == cabin).unwrap().is_default);

        assert!(profile.remove_address(&work));
        assert_eq!(default_count(&profile), 1);
        assert_eq!(profile.default_address().unwrap().id, home);
    }

    #[test]
    fn test_add_with_taken_id_gets_a_new_one() {
        let (mut profile, _) = store();
        let home = profile.add_address(address("Home"));

        let clash = Address {
            id: home.clone(),
            ..address("Clash")
        };
        let assigned = profile.add_address(clash);
        assert_ne!(assigned, home);
        assert_eq!(profile.addresses().iter().filter(|a| a.id == home).count(), 1);
        assert_eq!(profile.addresses().len(), 2);
    }

    #[test]
    fn test_default_payment_method_moves_on_remove() {
        let (mut profile, _) = store();
        let visa = profile.add_payment_method(PaymentMethod::from_card("visa", "4242", "12/29", "Ada"));
        let amex = profile.add_payment_method(PaymentMethod::from_card("amex", "0005", "01/30", "Ada"));

        assert!(profile.update_payment_method(&amex, &json!({"is_default": true})));
        assert_eq!(profile.default_payment_method().unwrap().id, amex);
        assert_eq!(profile.payment_methods().iter().filter(|m| m.is_default).count(), 1);

        assert!(profile.remove_payment_method(&amex));
        assert_eq!(profile.default_payment_method().unwrap().id, visa);
    }

    #[test]
    fn test_payment_method_keeps_last_four_only() {
        let (mut profile, _) = store();
        let card = PaymentMethod::from_card("visa", "4111 1111 1111 1234", "12/29", "Ada Lovelace");
        assert_eq!(card.last4, "1234");

        let id = profile.add_payment_method(card);
        assert!(profile.payment_methods()[0].is_default);
        assert!(profile.update_payment_method(&id, &json!({"expiry": "01/30"})));
        assert_eq!(profile.payment_methods()[0].expiry, "01/30");

        let stored = serde_json::to_string(profile.state()).unwrap();
        assert!(!stored.contains("4111"));
    }

    #[test]
    fn test_toggle_favorite() {
        let (mut profile, _) = store();
        let game = GameRecord::new(SourceKind::Static, "4", "Hades");

        assert!(profile.toggle_favorite(game.clone()));
        assert!(profile.is_favorite("4"));
        assert!(!profile.toggle_favorite(game));
        assert!(!profile.is_favorite("4"));
        assert!(!profile.toggle_favorite(GameRecord::new(SourceKind::Static, "", "No id")));
    }

    #[test]
    fn test_login_logout_clears_persisted_cart() {
        let (mut profile, storage) = store();
        storage.set(CART_KEY, "[]").unwrap();

        profile.login(User::new("Ada", "ada@example.com"));
        assert!(profile.is_authenticated());
        assert!(profile.update_user(&json!({"avatar": "/a.png"})));
        assert_eq!(profile.user().unwrap().avatar.as_deref(), Some("/a.png"));

        profile.logout();
        assert!(!profile.is_authenticated());
        assert!(profile.user().is_none());
        assert_eq!(storage.get(CART_KEY).unwrap(), None);
        assert!(!profile.update_user(&json!({"name": "Nobody"})));
    }

    #[test]
    fn test_state_persists_and_survives_corruption() {
        let (mut profile, storage) = store();
        profile.add_address(address("Home"));
        profile.login(User::new("Ada", "ada@example.com"));

        let reloaded = ProfileStore::load(storage.clone());
        assert_eq!(reloaded.state(), profile.state());

        storage.set(AUTH_KEY, "not json at all").unwrap();
        let reset = ProfileStore::load(storage);
        assert_eq!(reset.state(), &ProfileState::default());
    }
}
