//! Products tab, product form and delete confirmation.

use askama::Template;
use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use catalog_desk_core::ProductId;

use crate::error::AppError;
use crate::filters;
use crate::images::{ImageUpload, MAX_IMAGE_BYTES};
use crate::middleware::{RequireAdminAuth, set_flash};
use crate::models::Flash;
use crate::services::views::FALLBACK_THUMBNAIL;
use crate::services::{ProductForm, ProductRow, Section, SyncError, Tab};
use crate::state::AppState;

use super::{PageChrome, render};

/// Multipart name of the image file input.
const IMAGE_FIELD: &str = "image_file";

/// Room for the form fields on top of the largest accepted image.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the products router (the list lives in the tab router).
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            post(save).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route("/products/new", get(new_product))
        .route("/products/{id}/edit", get(edit_product))
        .route("/products/{id}/delete", get(confirm_delete).post(delete))
}

// =============================================================================
// Templates
// =============================================================================

/// Products list template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: PageChrome,
    pub products: Vec<ProductRow>,
    pub error: Option<String>,
    pub fallback_thumbnail: &'static str,
}

/// Category option for the form select.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub key: String,
    pub label: String,
    pub selected: bool,
}

/// Create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub chrome: PageChrome,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub is_edit: bool,
    /// Set when the submitted file was dropped and must be chosen again.
    pub file_cleared: bool,
}

/// Delete confirmation template.
#[derive(Template)]
#[template(path = "products/delete.html")]
pub struct ProductDeleteTemplate {
    pub chrome: PageChrome,
    pub product: ProductRow,
    pub fallback_thumbnail: &'static str,
}

/// Render the products tab.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn list_page(
    chrome: PageChrome,
    section: Section<Vec<ProductRow>>,
) -> Result<Html<String>, AppError> {
    let (products, error) = section.into_parts();
    render(&ProductsIndexTemplate {
        chrome,
        products: products.unwrap_or_default(),
        error,
        fallback_thumbnail: FALLBACK_THUMBNAIL,
    })
}

fn form_page(
    state: &AppState,
    chrome: PageChrome,
    form: ProductForm,
    error: Option<&SyncError>,
) -> Result<Html<String>, AppError> {
    let format = state.views().format();
    let mut categories: Vec<CategoryOption> = format
        .categories()
        .into_iter()
        .map(|(key, label)| CategoryOption {
            selected: key == form.category,
            key,
            label,
        })
        .collect();
    // Keep a category the lookup does not know about selectable
    if !form.category.is_empty() && !categories.iter().any(|c| c.selected) {
        categories.push(CategoryOption {
            key: form.category.clone(),
            label: form.category.clone(),
            selected: true,
        });
    }

    let chrome = match error {
        Some(e) => chrome.with_flash(Flash::error(e.to_string())),
        None => chrome,
    };

    render(&ProductFormTemplate {
        chrome,
        is_edit: !form.editing_product_id.trim().is_empty(),
        form,
        categories,
        file_cleared: error.is_some_and(SyncError::clears_file_input),
    })
}

async fn loaded_product(
    state: &AppState,
    id: &str,
) -> Result<(ProductRow, ProductForm), AppError> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("product {id}")))?;
    let product = state
        .data()
        .find_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let row = state.views().format().product_row(&product);
    let form = ProductForm::for_product(id, &product.fields);
    Ok((row, form))
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /products/new
#[instrument(skip_all)]
async fn new_product(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let chrome = PageChrome::load(&admin, &session, Tab::Products).await;
    form_page(&state, chrome, ProductForm::default(), None)
}

/// GET /products/{id}/edit
#[instrument(skip(admin, session, state))]
async fn edit_product(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let (_, form) = loaded_product(&state, &id).await?;
    let chrome = PageChrome::load(&admin, &session, Tab::Products).await;
    form_page(&state, chrome, form, None)
}

/// POST /products
///
/// Creates or updates depending on `editing_product_id`. On failure the form
/// is shown again with the typed values and the error.
#[instrument(skip_all)]
async fn save(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (form, image) = match read_product_form(multipart).await {
        Ok(parts) => parts,
        Err(e) => {
            tracing::info!(error = %e, "product form rejected");
            let chrome = PageChrome::load(&admin, &session, Tab::Products).await;
            let page = form_page(&state, chrome, e.form, Some(&e.error))?;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    match state.sync().save_product(&form, image).await {
        Ok(outcome) => {
            set_flash(&session, Flash::success(outcome.message())).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            let status = match &e {
                e if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
                SyncError::Configuration(_) => StatusCode::CONFLICT,
                _ => {
                    tracing::error!(error = %e, "product save failed");
                    StatusCode::BAD_GATEWAY
                }
            };
            let chrome = PageChrome::load(&admin, &session, Tab::Products).await;
            let page = form_page(&state, chrome, form, Some(&e))?;
            Ok((status, page).into_response())
        }
    }
}

/// GET /products/{id}/delete
#[instrument(skip(admin, session, state))]
async fn confirm_delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let (product, _) = loaded_product(&state, &id).await?;
    render(&ProductDeleteTemplate {
        chrome: PageChrome::load(&admin, &session, Tab::Products).await,
        product,
        fallback_thumbnail: FALLBACK_THUMBNAIL,
    })
}

/// Delete confirmation form.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub confirm: String,
}

/// POST /products/{id}/delete
#[instrument(skip_all, fields(id = %id))]
async fn delete(
    RequireAdminAuth(_admin): RequireAdminAuth,
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    let id: ProductId = id
        .parse()
        .map_err(|_| AppError::NotFound(format!("product {id}")))?;
    let confirmed = form.confirm == "yes";

    match state.sync().delete_product(id, confirmed).await {
        Ok(()) => set_flash(&session, Flash::success("Product deleted successfully!")).await,
        Err(SyncError::UserCancelled) => {}
        Err(e) => {
            tracing::error!(%id, error = %e, "product delete failed");
            set_flash(&session, Flash::error(e.to_string())).await;
        }
    }
    Ok(Redirect::to("/products").into_response())
}

// =============================================================================
// Multipart parsing
// =============================================================================

/// A form that could not be read, with whatever fields arrived.
#[derive(Debug)]
struct FormReadError {
    form: ProductForm,
    error: SyncError,
}

impl std::fmt::Display for FormReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

/// Read the multipart product form and optional image file.
async fn read_product_form(
    mut multipart: Multipart,
) -> Result<(ProductForm, Option<ImageUpload>), FormReadError> {
    let mut form = ProductForm::default();
    let mut image = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(form, &e)),
        };
        let name = field.name().unwrap_or_default().to_string();

        if name == IMAGE_FIELD {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(ToString::to_string);
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => return Err(multipart_error(form, &e)),
            };
            if !bytes.is_empty() {
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            continue;
        }

        let value = match field.text().await {
            Ok(value) => value,
            Err(e) => return Err(multipart_error(form, &e)),
        };
        match name.as_str() {
            "editing_product_id" => form.editing_product_id = value,
            "name" => form.name = value,
            "category" => form.category = value,
            "price" => form.price = value,
            "quantity" => form.quantity = value,
            "description" => form.description = value,
            "features" => form.features = value,
            "image" => form.image = value,
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok((form, image))
}

fn multipart_error(form: ProductForm, err: &MultipartError) -> FormReadError {
    let error = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        SyncError::ImageTooLarge {
            size: MAX_IMAGE_BYTES + FORM_OVERHEAD_BYTES,
        }
    } else {
        SyncError::Validation(format!("Could not read the form: {}", err.body_text()))
    };
    FormReadError { form, error }
}
