// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact routes for signed-in users.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{ContactForm, DisplayContact};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Contact routes (require a session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contacts", get(index))
        .route("/contacts/new", get(new_contact))
        .route("/contacts/create", post(create_contact))
        .route("/contacts/edit/{contact_id}", get(edit_contact))
        .route("/contacts/update/{contact_id}", post(update_contact))
        .route("/contacts/delete/{contact_id}", post(delete_contact))
}

/// Home view: connection status plus the first page of contacts.
#[derive(Serialize)]
pub struct IndexResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub contacts: Vec<DisplayContact>,
}

async fn index(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<IndexResponse>> {
    let Some(connection) = state.contacts.find_connection(&user.username).await? else {
        // Not connected yet; the page offers the connect link.
        return Ok(Json(IndexResponse {
            connected: false,
            user_email: None,
            contacts: Vec::new(),
        }));
    };

    let contacts = state.contacts.list_contacts(&user.username).await?;

    Ok(Json(IndexResponse {
        connected: true,
        user_email: Some(connection.user_email),
        contacts,
    }))
}

/// Blank contact for the "new contact" form.
async fn new_contact() -> Json<DisplayContact> {
    Json(DisplayContact::default())
}

async fn create_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<ContactForm>,
) -> Result<Redirect> {
    let contact = form.into_contact()?;
    state
        .contacts
        .create_contact(&user.username, &contact)
        .await?;

    tracing::info!(username = %user.username, "Contact created");
    Ok(Redirect::to("/contacts"))
}

async fn edit_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(contact_id): Path<String>,
) -> Result<Json<DisplayContact>> {
    let contact = state
        .contacts
        .get_contact(&user.username, &contact_id)
        .await?;
    Ok(Json(contact))
}

async fn update_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(contact_id): Path<String>,
    Form(form): Form<ContactForm>,
) -> Result<Redirect> {
    let contact = form.into_contact()?;
    state
        .contacts
        .update_contact(&user.username, &contact_id, &contact)
        .await?;

    tracing::info!(username = %user.username, "Contact updated");
    Ok(Redirect::to("/contacts"))
}

async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(contact_id): Path<String>,
) -> Result<Redirect> {
    state
        .contacts
        .delete_contact(&user.username, &contact_id)
        .await?;

    tracing::info!(username = %user.username, "Contact deleted");
    Ok(Redirect::to("/contacts"))
}
