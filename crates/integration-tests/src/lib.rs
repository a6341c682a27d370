//! Integration test support for Catalog Desk.
//!
//! The tests under `tests/` drive the admin crate end to end against
//! in-process fakes of the three remote services, so they need no network,
//! spreadsheet or image host.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-desk-integration-tests
//! ```
//!
//! # Fakes
//!
//! - [`FakeReader`] - serves fixed rows and counts fetches per collection
//! - [`RecordingCatalog`] - records every write and answers with a scripted reply
//! - [`RecordingImages`] - counts uploads and answers with a scripted reply
//!
//! [`TestApp`] wires them into an [`AppState`] the same way the server does.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use url::Url;

use catalog_desk_admin::catalog::{
    CatalogAck, CatalogAction, CatalogError, CatalogReader, CatalogStore, CatalogWrite,
};
use catalog_desk_admin::config::{AdminAuthConfig, AdminConfig, CatalogConfig, ImageHostConfig};
use catalog_desk_admin::images::{ImageStore, ImageStoreError, ImageUpload};
use catalog_desk_admin::services::{SettingsStore, hash_password};
use catalog_desk_admin::state::{AppState, Remotes};
use catalog_desk_core::{
    Customer, Order, OrderId, OrderStatus, Price, Product, ProductDraft, ProductId,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const UPLOADED_URL: &str = "https://i.ibb.co/fake/uploaded.jpg";

// ============================================================================
// Catalog reader
// ============================================================================

/// Serves fixed collections and counts how often each one is fetched.
#[derive(Default)]
pub struct FakeReader {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub orders: Vec<Order>,
    /// Applied before answering any fetch.
    pub delay: Duration,
    /// Answer order fetches the way the values API does for a missing sheet.
    pub missing_orders_sheet: bool,
    pub product_fetches: AtomicUsize,
    pub customer_fetches: AtomicUsize,
    pub order_fetches: AtomicUsize,
}

impl FakeReader {
    /// A reader with two products, one customer and two orders.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            products: vec![
                product(1, "Mango Pickle", "pickles", "249.50"),
                product(2, "Lime Pickle", "pickles", "199"),
            ],
            customers: vec![Customer {
                name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
                phone: "555-0100".to_string(),
                join_date: "2024-01-15".to_string(),
                order_count: 2,
            }],
            orders: vec![
                order(1001, "Asha Rao", OrderStatus::Pending),
                order(1002, "Asha Rao", OrderStatus::Delivered),
            ],
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub const fn without_orders_sheet(mut self) -> Self {
        self.missing_orders_sheet = true;
        self
    }

    /// Fetch counts as `(products, customers, orders)`.
    #[must_use]
    pub fn fetch_counts(&self) -> (usize, usize, usize) {
        (
            self.product_fetches.load(Ordering::SeqCst),
            self.customer_fetches.load(Ordering::SeqCst),
            self.order_fetches.load(Ordering::SeqCst),
        )
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl CatalogReader for FakeReader {
    async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.product_fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.products.clone())
    }

    async fn fetch_customers(&self) -> Result<Vec<Customer>, CatalogError> {
        self.customer_fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        Ok(self.customers.clone())
    }

    async fn fetch_orders(&self) -> Result<Vec<Order>, CatalogError> {
        self.order_fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.missing_orders_sheet {
            return Err(CatalogError::Api {
                status: 400,
                message: "Unable to parse range: Orders!A2:F".to_string(),
            });
        }
        Ok(self.orders.clone())
    }
}

// ============================================================================
// Catalog store
// ============================================================================

/// Scripted answer for [`RecordingCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogReply {
    /// `{success: true}` with the given new id.
    Accept(Option<i64>),
    /// `{success: false, error: "..."}`.
    Reject,
    /// 2xx with no readable body.
    Unconfirmed,
}

/// Records every catalog write.
pub struct RecordingCatalog {
    reply: CatalogReply,
    writes: Mutex<Vec<CatalogWrite>>,
}

impl RecordingCatalog {
    #[must_use]
    pub const fn new(reply: CatalogReply) -> Self {
        Self {
            reply,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every write received so far, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<CatalogWrite> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CatalogStore for RecordingCatalog {
    async fn write(&self, request: &CatalogWrite) -> Result<CatalogAck, CatalogError> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        match self.reply {
            CatalogReply::Accept(id) => Ok(CatalogAck {
                id: id.map(ProductId::new),
                confirmed: true,
            }),
            CatalogReply::Reject => Err(CatalogError::Rejected {
                action: request.action,
                message: "Sheet is protected".to_string(),
            }),
            CatalogReply::Unconfirmed => Ok(CatalogAck {
                id: None,
                confirmed: false,
            }),
        }
    }
}

// ============================================================================
// Image store
// ============================================================================

/// Counts uploads and either returns [`UPLOADED_URL`] or fails.
pub struct RecordingImages {
    fail: bool,
    uploads: AtomicUsize,
}

impl RecordingImages {
    #[must_use]
    pub const fn succeeding() -> Self {
        Self {
            fail: false,
            uploads: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub const fn failing() -> Self {
        Self {
            fail: true,
            uploads: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageStore for RecordingImages {
    async fn upload(
        &self,
        _api_key: &SecretString,
        _image: &ImageUpload,
    ) -> Result<String, ImageStoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ImageStoreError::Rejected("Invalid API v1 key.".to_string()));
        }
        Ok(UPLOADED_URL.to_string())
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// Application state built over fakes, with handles on each fake.
pub struct TestApp {
    pub state: AppState,
    pub reader: Arc<FakeReader>,
    pub catalog: Arc<RecordingCatalog>,
    pub images: Arc<RecordingImages>,
}

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    reader: FakeReader,
    reply: CatalogReply,
    images: RecordingImages,
    image_key: Option<String>,
    ready_timeout: Duration,
    reload_delay: Duration,
}

impl TestApp {
    /// Seeded reader, accepting catalog, succeeding image host, key configured.
    #[must_use]
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            reader: FakeReader::seeded(),
            reply: CatalogReply::Accept(Some(3)),
            images: RecordingImages::succeeding(),
            image_key: Some("test-image-key".to_string()),
            ready_timeout: Duration::from_secs(5),
            reload_delay: Duration::from_millis(10),
        }
    }
}

impl TestAppBuilder {
    #[must_use]
    pub fn reader(mut self, reader: FakeReader) -> Self {
        self.reader = reader;
        self
    }

    #[must_use]
    pub const fn catalog_reply(mut self, reply: CatalogReply) -> Self {
        self.reply = reply;
        self
    }

    #[must_use]
    pub fn images(mut self, images: RecordingImages) -> Self {
        self.images = images;
        self
    }

    #[must_use]
    pub fn without_image_key(mut self) -> Self {
        self.image_key = None;
        self
    }

    #[must_use]
    pub const fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    /// Build the state. Must run inside a Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if the image key cannot be stored in the in-memory settings.
    pub async fn build(self) -> TestApp {
        let reader = Arc::new(self.reader);
        let catalog = Arc::new(RecordingCatalog::new(self.reply));
        let images = Arc::new(self.images);

        let settings = SettingsStore::in_memory();
        if let Some(key) = &self.image_key {
            settings
                .save_image_host_api_key(key)
                .await
                .expect("in-memory settings accept a non-empty key");
        }

        let remotes = Remotes {
            reader: Arc::clone(&reader) as Arc<dyn CatalogReader>,
            catalog: Arc::clone(&catalog) as Arc<dyn CatalogStore>,
            images: Arc::clone(&images) as Arc<dyn ImageStore>,
        };
        let config = test_config(self.ready_timeout, self.reload_delay);
        let state = AppState::with_remotes(config, remotes, settings);

        TestApp {
            state,
            reader,
            catalog,
            images,
        }
    }
}

/// Configuration pointing at unreachable hosts; nothing in it is contacted.
///
/// # Panics
///
/// Panics if the admin password cannot be hashed.
#[must_use]
pub fn test_config(ready_timeout: Duration, reload_delay: Duration) -> AdminConfig {
    let password_hash = hash_password(ADMIN_PASSWORD).expect("argon2 hashes a fixed password");

    AdminConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3001".to_string(),
        auth: AdminAuthConfig {
            username: ADMIN_USERNAME.to_string(),
            password_hash: SecretString::from(password_hash),
        },
        catalog: CatalogConfig {
            script_url: fixed_url("http://catalog.invalid/exec"),
            spreadsheet_id: "test-sheet".to_string(),
            sheets_api_key: SecretString::from("test-sheets-key"),
            currency_symbol: "₹".to_string(),
            categories: BTreeMap::from([
                ("pickles".to_string(), "Pickles".to_string()),
                ("spices".to_string(), "Spices".to_string()),
            ]),
            ready_timeout,
            reload_delay,
        },
        image_host: ImageHostConfig {
            upload_url: fixed_url("http://images.invalid/1/upload"),
        },
        settings_path: PathBuf::from("unused-settings.json"),
        remote_timeout: Duration::from_secs(1),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

fn fixed_url(raw: &str) -> Url {
    Url::parse(raw).expect("fixed test URL parses")
}

// ============================================================================
// Fixtures
// ============================================================================

/// A product with an existing image.
///
/// # Panics
///
/// Panics if `price` is not a valid price.
#[must_use]
pub fn product(id: i64, name: &str, category: &str, price: &str) -> Product {
    let price = Price::parse(price).expect("fixture price parses");
    Product {
        id: ProductId::new(id),
        fields: ProductDraft {
            name: name.to_string(),
            category: category.to_string(),
            price,
            quantity: 10,
            description: format!("{name} in a glass jar"),
            features: vec!["Handmade".to_string(), "No preservatives".to_string()],
            image: format!("https://i.ibb.co/fixture/{id}.jpg"),
        },
    }
}

/// An order for two items totalling 448.50.
#[must_use]
pub fn order(id: i64, customer: &str, status: OrderStatus) -> Order {
    let total = Price::parse("448.50").expect("fixture total parses");
    Order {
        id: OrderId::new(id),
        customer_name: customer.to_string(),
        date: "2024-03-02".to_string(),
        item_count: 2,
        total,
        status,
    }
}

/// A small in-memory image.
#[must_use]
pub fn image(len: usize) -> ImageUpload {
    ImageUpload {
        file_name: "photo.jpg".to_string(),
        content_type: Some("image/jpeg".to_string()),
        bytes: vec![0xFF; len],
    }
}

/// Whether `action` is the action of the only recorded write.
#[must_use]
pub fn single_write_is(catalog: &RecordingCatalog, action: CatalogAction) -> bool {
    matches!(catalog.writes().as_slice(), [w] if w.action == action)
}

// ============================================================================
// HTTP helpers
// ============================================================================

/// Requests against the full router, without opening a socket.
pub mod http {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::response::Response;
    use tower::ServiceExt;

    use catalog_desk_admin::middleware::SESSION_COOKIE_NAME;

    use super::{ADMIN_PASSWORD, ADMIN_USERNAME};

    const BOUNDARY: &str = "catalog-desk-test-boundary";

    /// Send one request through a clone of `router`.
    ///
    /// # Panics
    ///
    /// Panics if the router itself errors (it is infallible).
    pub async fn send(router: &Router, request: Request<Body>) -> Response {
        router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// A GET request, optionally carrying a session cookie.
    ///
    /// # Panics
    ///
    /// Panics if `uri` is not a valid request target.
    #[must_use]
    pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).expect("valid GET request")
    }

    /// A urlencoded form POST.
    ///
    /// # Panics
    ///
    /// Panics if `uri` is not a valid request target.
    #[must_use]
    pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("valid form request")
    }

    /// A `multipart/form-data` POST with text fields and an optional file
    /// under `file_field`.
    ///
    /// # Panics
    ///
    /// Panics if `uri` is not a valid request target.
    #[must_use]
    pub fn post_multipart(
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, Vec<u8>)>,
        cookie: &str,
    ) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((name, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"photo.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .expect("valid multipart request")
    }

    /// The `Location` header of a redirect.
    ///
    /// # Panics
    ///
    /// Panics if the response is not a redirect.
    #[must_use]
    pub fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .expect("redirect has a location")
            .to_str()
            .expect("location is ASCII")
    }

    /// `name=value` of the session cookie set by `response`.
    ///
    /// # Panics
    ///
    /// Panics if the response sets no session cookie.
    #[must_use]
    pub fn session_cookie(response: &Response) -> String {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(SESSION_COOKIE_NAME))
            .and_then(|v| v.split(';').next())
            .expect("session cookie is set")
            .to_string()
    }

    /// The whole response body as text.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read or is not UTF-8.
    pub async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
    }

    /// Log in as the configured admin and return the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the login is not accepted.
    pub async fn logged_in(router: &Router) -> String {
        let body = format!(
            "username={ADMIN_USERNAME}&password={}",
            ADMIN_PASSWORD.replace(' ', "+")
        );
        let response = send(router, post_form("/auth/login", &body, None)).await;
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        session_cookie(&response)
    }
}
