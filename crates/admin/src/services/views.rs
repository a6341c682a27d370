//! Tab switching and view models.
//!
//! [`ViewController::switch_tab`] marks exactly one tab active and runs that
//! tab's loader once. Loaders fetch through [`CatalogData`] (cached, bounded
//! wait) and hand the collections to the pure [`CatalogFormat`] methods, so
//! formatting can be tested without any I/O.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use catalog_desk_core::{Customer, Order, OrderId, Product, ProductId, pending_count};

use crate::catalog::{CatalogData, DataError};
use crate::config::CatalogConfig;
use crate::services::SettingsStore;

/// Thumbnail shown when a product has no image or its image fails to load.
pub const FALLBACK_THUMBNAIL: &str = "https://via.placeholder.com/50";

/// Number of orders shown on the dashboard.
pub const RECENT_ORDER_COUNT: usize = 5;

/// Shown in place of a stored API key.
const MASKED_KEY: &str = "••••••••••••";

/// Admin panel tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Dashboard,
    Products,
    Customers,
    Orders,
    Settings,
}

impl Tab {
    /// Every tab, in navigation order.
    pub const ALL: [Self; 5] = [
        Self::Dashboard,
        Self::Products,
        Self::Customers,
        Self::Orders,
        Self::Settings,
    ];

    /// Name used in URLs and element ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Products => "products",
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::Settings => "settings",
        }
    }

    /// Navigation label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Products => "Products",
            Self::Customers => "Customers",
            Self::Orders => "Orders",
            Self::Settings => "Settings",
        }
    }

    /// Route that renders this tab.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Products => "/products",
            Self::Customers => "/customers",
            Self::Orders => "/orders",
            Self::Settings => "/settings",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a tab name that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tab '{0}'")]
pub struct UnknownTab(pub String);

impl FromStr for Tab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == s.trim())
            .ok_or_else(|| UnknownTab(s.to_string()))
    }
}

/// A navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabLink {
    pub tab: Tab,
    pub active: bool,
}

/// Navigation entries with only `active` marked.
#[must_use]
pub fn tab_links(active: Tab) -> Vec<TabLink> {
    Tab::ALL
        .into_iter()
        .map(|tab| TabLink {
            tab,
            active: tab == active,
        })
        .collect()
}

/// Loader result for a tab section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section<T> {
    Ready(T),
    /// The collection loaded but has no rows.
    Empty,
    /// The collection could not be loaded in time.
    Unavailable(String),
}

impl<T> Section<T> {
    /// Split into content and error message; both are `None` when empty.
    pub fn into_parts(self) -> (Option<T>, Option<String>) {
        match self {
            Self::Ready(value) => (Some(value), None),
            Self::Empty => (None, None),
            Self::Unavailable(message) => (None, Some(message)),
        }
    }
}

fn rows_section<T>(rows: Vec<T>) -> Section<Vec<T>> {
    if rows.is_empty() {
        Section::Empty
    } else {
        Section::Ready(rows)
    }
}

fn partial_error(collection: &str, err: &DataError) -> String {
    tracing::warn!(collection, error = %err, "dashboard collection unavailable");
    format!("{collection} unavailable: {err}")
}

fn unavailable<T>(err: &DataError) -> Section<T> {
    tracing::warn!(error = %err, "tab data unavailable");
    Section::Unavailable(format!("Catalog unavailable: {err}"))
}

/// One row of the products table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: String,
    pub quantity: u32,
    /// Image URL, or [`FALLBACK_THUMBNAIL`] when the product has none.
    pub image: String,
}

/// One row of an orders table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: OrderId,
    pub customer_name: String,
    pub date: String,
    pub item_count: u32,
    pub total: String,
    pub status: String,
    pub badge_class: String,
}

/// Dashboard statistics.
///
/// Only the product count is required. Customer and order figures are `None`
/// when their sheet could not be read, with the reason in the matching
/// `*_error` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub total_products: usize,
    pub total_customers: Option<usize>,
    pub total_orders: Option<usize>,
    pub pending_orders: Option<usize>,
    /// First rows of the orders sheet; empty renders the "no orders yet" state.
    pub recent_orders: Vec<OrderRow>,
    pub customers_error: Option<String>,
    pub orders_error: Option<String>,
}

/// Settings tab state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsView {
    /// Mask shown when a key is stored; the key itself is never rendered.
    pub masked_image_key: Option<&'static str>,
}

/// Content of the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabView {
    Dashboard(Section<DashboardView>),
    Products(Section<Vec<ProductRow>>),
    Customers(Section<Vec<Customer>>),
    Orders(Section<Vec<OrderRow>>),
    Settings(SettingsView),
}

impl TabView {
    /// The tab this content belongs to.
    #[must_use]
    pub const fn tab(&self) -> Tab {
        match self {
            Self::Dashboard(_) => Tab::Dashboard,
            Self::Products(_) => Tab::Products,
            Self::Customers(_) => Tab::Customers,
            Self::Orders(_) => Tab::Orders,
            Self::Settings(_) => Tab::Settings,
        }
    }
}

/// Result of switching tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSwitch {
    pub links: Vec<TabLink>,
    pub view: TabView,
}

impl TabSwitch {
    /// The single active tab.
    #[must_use]
    pub const fn active(&self) -> Tab {
        self.view.tab()
    }
}

/// Deterministic formatting of catalog values.
#[derive(Debug, Clone)]
pub struct CatalogFormat {
    currency_symbol: String,
    categories: BTreeMap<String, String>,
}

impl CatalogFormat {
    /// Formatting rules from the catalog config.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            currency_symbol: config.currency_symbol.clone(),
            categories: config.categories.clone(),
        }
    }

    /// Category label, falling back to the raw key.
    #[must_use]
    pub fn category_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.categories.get(key).map_or(key, String::as_str)
    }

    /// Categories as `(key, label)` pairs for the product form.
    #[must_use]
    pub fn categories(&self) -> Vec<(String, String)> {
        self.categories
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[must_use]
    pub fn product_row(&self, product: &Product) -> ProductRow {
        let fields = &product.fields;
        ProductRow {
            id: product.id,
            name: fields.name.clone(),
            category: self.category_label(&fields.category).to_string(),
            price: fields.price.display(&self.currency_symbol),
            quantity: fields.quantity,
            image: if fields.image.is_empty() {
                FALLBACK_THUMBNAIL.to_string()
            } else {
                fields.image.clone()
            },
        }
    }

    #[must_use]
    pub fn order_row(&self, order: &Order) -> OrderRow {
        OrderRow {
            id: order.id,
            customer_name: order.customer_name.clone(),
            date: order.date.clone(),
            item_count: order.item_count,
            total: order.total.display(&self.currency_symbol),
            status: order.status.as_str().to_string(),
            badge_class: badge_class(order.status.as_str()),
        }
    }

    /// Dashboard statistics over the loaded collections.
    ///
    /// `None` for customers or orders means that collection is unavailable.
    #[must_use]
    pub fn dashboard(
        &self,
        products: &[Product],
        customers: Option<&[Customer]>,
        orders: Option<&[Order]>,
    ) -> DashboardView {
        DashboardView {
            total_products: products.len(),
            total_customers: customers.map(<[Customer]>::len),
            total_orders: orders.map(<[Order]>::len),
            pending_orders: orders.map(pending_count),
            recent_orders: orders
                .unwrap_or_default()
                .iter()
                .take(RECENT_ORDER_COUNT)
                .map(|o| self.order_row(o))
                .collect(),
            customers_error: None,
            orders_error: None,
        }
    }
}

/// `badge badge-<status>`, with the status reduced to a safe class name.
#[must_use]
pub fn badge_class(status: &str) -> String {
    let slug: String = status
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("badge badge-{slug}")
}

/// Maps tabs to loaders and view models.
#[derive(Clone)]
pub struct ViewController {
    data: CatalogData,
    settings: SettingsStore,
    format: Arc<CatalogFormat>,
}

impl ViewController {
    #[must_use]
    pub fn new(data: CatalogData, settings: SettingsStore, format: CatalogFormat) -> Self {
        Self {
            data,
            settings,
            format: Arc::new(format),
        }
    }

    /// Formatting rules used by this controller.
    #[must_use]
    pub fn format(&self) -> &CatalogFormat {
        &self.format
    }

    /// Switch to a tab by name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTab` for a name that is not a tab; nothing is loaded.
    pub async fn switch_tab(&self, name: &str) -> Result<TabSwitch, UnknownTab> {
        let tab: Tab = name.parse()?;
        Ok(self.open(tab).await)
    }

    /// Activate `tab` and run its loader once.
    #[instrument(skip(self))]
    pub async fn open(&self, tab: Tab) -> TabSwitch {
        let view = match tab {
            Tab::Dashboard => TabView::Dashboard(self.load_dashboard().await),
            Tab::Products => TabView::Products(self.load_products().await),
            Tab::Customers => TabView::Customers(self.load_customers().await),
            Tab::Orders => TabView::Orders(self.load_orders().await),
            Tab::Settings => TabView::Settings(self.load_settings().await),
        };
        TabSwitch {
            links: tab_links(tab),
            view,
        }
    }

    /// Dashboard stats. Fails only when products cannot be loaded; a missing
    /// customers or orders sheet is reported inside the view.
    pub async fn load_dashboard(&self) -> Section<DashboardView> {
        let (products, customers, orders) =
            tokio::join!(self.data.products(), self.data.customers(), self.data.orders());
        let products = match products {
            Ok(products) => products,
            Err(e) => return unavailable(&e),
        };

        let customers = customers.map_err(|e| partial_error("customers", &e));
        let orders = orders.map_err(|e| partial_error("orders", &e));
        let mut view = self.format.dashboard(
            &products,
            customers.as_deref().ok().map(Vec::as_slice),
            orders.as_deref().ok().map(Vec::as_slice),
        );
        view.customers_error = customers.err();
        view.orders_error = orders.err();
        Section::Ready(view)
    }

    pub async fn load_products(&self) -> Section<Vec<ProductRow>> {
        match self.data.products().await {
            Ok(products) => rows_section(
                products.iter().map(|p| self.format.product_row(p)).collect(),
            ),
            Err(e) => unavailable(&e),
        }
    }

    pub async fn load_customers(&self) -> Section<Vec<Customer>> {
        match self.data.customers().await {
            Ok(customers) => rows_section(customers.to_vec()),
            Err(e) => unavailable(&e),
        }
    }

    pub async fn load_orders(&self) -> Section<Vec<OrderRow>> {
        match self.data.orders().await {
            Ok(orders) => {
                rows_section(orders.iter().map(|o| self.format.order_row(o)).collect())
            }
            Err(e) => unavailable(&e),
        }
    }

    pub async fn load_settings(&self) -> SettingsView {
        SettingsView {
            masked_image_key: self
                .settings
                .image_host_api_key()
                .await
                .map(|_| MASKED_KEY),
        }
    }

    /// A single order for the detail page.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the orders cannot be loaded.
    pub async fn find_order(&self, id: OrderId) -> Result<Option<OrderRow>, DataError> {
        let orders = self.data.orders().await?;
        Ok(orders
            .iter()
            .find(|o| o.id == id)
            .map(|o| self.format.order_row(o)))
    }
}
