use chrono::Utc;
use std::sync::Arc;

use crate::cart::CartStore;
use crate::catalog::{CatalogStore, SourceSet};
use crate::config::StorefrontConfig;
use crate::error::{Result, StorefrontError};
use crate::profile::{Order, OrderStatus, ProfileStore};
use crate::storage::{KeyValueStore, SqliteStore};
use crate::theme::ThemeStore;

/// Application context owning every store and the shared storage handle.
///
/// Handed to UI code explicitly; each store is mutated only through its
/// named methods.
pub struct AppContext {
    config: StorefrontConfig,
    storage: Arc<dyn KeyValueStore>,
    cart: CartStore,
    catalog: CatalogStore,
    profile: ProfileStore,
    theme: ThemeStore,
}

impl AppContext {
    /// Open storage at the configured path and build the network sources
    pub fn new(config: StorefrontConfig) -> Result<Self> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open(&config.storage_path)?);
        let sources = SourceSet::from_config(&config)?;
        Ok(Self::with_parts(config, storage, sources))
    }

    /// Build from explicit storage and sources
    pub fn with_parts(
        config: StorefrontConfig,
        storage: Arc<dyn KeyValueStore>,
        sources: SourceSet,
    ) -> Self {
        let cart = CartStore::load(Arc::clone(&storage));
        let profile = ProfileStore::load(Arc::clone(&storage));
        let theme = ThemeStore::load(Arc::clone(&storage));
        let catalog = CatalogStore::with_sources(&config, sources);

        tracing::info!(
            "🛒 Storefront ready: source={} network={} cart_items={}",
            config.initial_source,
            config.network_enabled,
            cart.cart_item_count()
        );

        Self {
            config,
            storage,
            cart,
            catalog,
            profile,
            theme,
        }
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut CatalogStore {
        &mut self.catalog
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut ProfileStore {
        &mut self.profile
    }

    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    pub fn theme_mut(&mut self) -> &mut ThemeStore {
        &mut self.theme
    }

    /// Add a game from the loaded catalog page by id. False if not loaded.
    pub fn add_to_cart_by_id(&mut self, id: &str) -> bool {
        match self.catalog.find_game(id) {
            Some(game) => {
                let game = game.clone();
                self.cart.add_to_cart(game);
                true
            }
            None => {
                tracing::debug!("Game {} not in the loaded catalog", id);
                false
            }
        }
    }

    /// End the session. The persisted cart is dropped, so the in-memory
    /// cart is reloaded to match.
    pub fn logout(&mut self) {
        self.profile.logout();
        self.cart.reload();
    }

    /// Turn the cart into a pending order and empty the cart.
    ///
    /// Without an explicit address the default address (if any) is used.
    pub fn checkout(
        &mut self,
        address_id: Option<&str>,
        payment_method_id: Option<&str>,
    ) -> Result<Order> {
        if self.cart.state().is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        let address_id = match address_id {
            Some(id) if !self.profile.addresses().iter().any(|a| a.id == id) => {
                return Err(StorefrontError::Checkout(format!("unknown address '{}'", id)));
            }
            Some(id) => Some(id.to_string()),
            None => self.profile.default_address().map(|a| a.id.clone()),
        };

        if let Some(id) = payment_method_id {
            if !self.profile.payment_methods().iter().any(|m| m.id == id) {
                return Err(StorefrontError::Checkout(format!("unknown payment method '{}'", id)));
            }
        }

        let order = Order {
            id: String::new(),
            lines: self.cart.lines().to_vec(),
            total: self.cart.cart_total(),
            item_count: self.cart.cart_item_count(),
            status: OrderStatus::Pending,
            address_id,
            payment_method_id: payment_method_id.map(str::to_string),
            created_at: Utc::now(),
        };

        let id = self.profile.add_order(order.clone());
        self.cart.clear_cart();

        tracing::info!("✅ Order {} placed: {} item(s), {:.2}", id, order.item_count, order.total);

        Ok(Order { id, ..order })
    }
}
