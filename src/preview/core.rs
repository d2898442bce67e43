//! Shared logic for the preview servers.
//!
//! Framework-agnostic types and dispatch used by both the Axum and the
//! standalone adapters.

use serde::Serialize;

use crate::admin::{self, RequestUrl};
use crate::auth::Principal;
use crate::error::PreviewError;
use crate::handler::{PreviewHandler, PreviewRequest, PreviewResponse, PREVIEW_ACTION};

// ============================================================================
// Response Types
// ============================================================================

/// One registered email type for the JSON API.
#[derive(Debug, Serialize)]
pub struct EmailTypeInfo {
    pub key: String,
    pub template_id: String,
    /// Whether the template is in the active set.
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Wrapper for JSON list response.
#[derive(Debug, Serialize)]
pub struct EmailTypesResponse {
    pub data: Vec<EmailTypeInfo>,
    pub latest_order: Option<u64>,
}

// ============================================================================
// Service Functions
// ============================================================================

/// Registered email types, sorted by key.
pub fn list_email_types(handler: &PreviewHandler) -> EmailTypesResponse {
    let templates = handler.renderer().templates();

    let data = handler
        .registry()
        .entries()
        .into_iter()
        .map(|(key, id)| {
            let template = templates.get(id);
            EmailTypeInfo {
                key: key.to_string(),
                template_id: id.to_string(),
                active: template.is_some(),
                title: template.as_ref().map(|t| t.title().to_string()),
                recipient: template.as_ref().map(|t| t.recipient().to_string()),
                content_type: template.as_ref().map(|t| t.content_type().to_string()),
            }
        })
        .collect();

    EmailTypesResponse {
        data,
        latest_order: handler.renderer().orders().latest().map(|o| o.id),
    }
}

/// `GET /`: the preview when `action=preview_email`, the settings page
/// otherwise.
pub fn index(
    handler: &PreviewHandler,
    principal: &Principal,
    query: &str,
    url: &RequestUrl,
) -> PreviewResponse {
    let lang = match PreviewRequest::from_query(query) {
        Ok(request) => {
            if let Some(response) = handler.handle(principal, &request) {
                return response;
            }
            request.lang.filter(|l| !l.is_empty())
        }
        Err(e) if requests_preview(query) => {
            if !principal.can_manage_store() {
                return PreviewResponse::error(&PreviewError::Unauthorized);
            }
            return PreviewResponse::error(&e);
        }
        Err(_) => None,
    };

    PreviewResponse {
        status: 200,
        content_type: "text/html; charset=utf-8",
        body: admin::render_settings_page(handler, url, lang.as_deref()),
    }
}

/// Whether the raw query carries `action=preview_email`.
fn requests_preview(query: &str) -> bool {
    serde_urlencoded::from_str::<Vec<(String, String)>>(query)
        .map(|pairs| {
            pairs
                .iter()
                .any(|(key, value)| key == "action" && value == PREVIEW_ACTION)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{MemoryOrderStore, Order};
    use crate::registry::TemplateId;
    use chrono::Utc;

    #[test]
    fn test_list_marks_inactive_templates() {
        let handler = PreviewHandler::builder("secret", MemoryOrderStore::shared())
            .configure_registry(|r| {
                r.register("made_up", TemplateId::new("WC_Email_Made_Up"));
            })
            .build();

        let list = list_email_types(&handler);
        assert_eq!(list.latest_order, None);

        let made_up = list.data.iter().find(|t| t.key == "made_up").unwrap();
        assert!(!made_up.active);
        assert!(made_up.title.is_none());

        let new_order = list.data.iter().find(|t| t.key == "new_order").unwrap();
        assert!(new_order.active);
        assert_eq!(new_order.template_id, "WC_Email_New_Order");
    }

    #[test]
    fn test_index_without_action_renders_settings() {
        let orders = MemoryOrderStore::shared();
        orders.insert(Order::new(5, Utc::now()));
        let handler = PreviewHandler::builder("secret", orders).build();
        let url = RequestUrl::new(false, "localhost", "/");

        let response = index(&handler, &Principal::store_manager("1"), "", &url);
        assert_eq!(response.status, 200);
        assert!(response.body.contains("Email notifications"));
        assert!(response.body.contains("action=preview_email"));
        assert!(response.body.contains("order=5"));
    }

    #[test]
    fn test_index_bad_preview_query() {
        let handler = PreviewHandler::builder("secret", MemoryOrderStore::shared()).build();
        let url = RequestUrl::new(false, "localhost", "/");
        let query = "action=preview_email&type=a&type=b";

        let response = index(&handler, &Principal::store_manager("1"), query, &url);
        assert_eq!(response.status, 400);

        let response = index(&handler, &Principal::new("customer"), query, &url);
        assert_eq!(response.status, 403);
        assert_eq!(response.body, "Invalid request");
    }

    #[test]
    fn test_index_bad_query_without_action_renders_settings() {
        let orders = MemoryOrderStore::shared();
        orders.insert(Order::new(5, Utc::now()));
        let handler = PreviewHandler::builder("secret", orders).build();
        let url = RequestUrl::new(false, "localhost", "/");

        let response = index(&handler, &Principal::store_manager("1"), "lang=nl&lang=de", &url);
        assert_eq!(response.status, 200);
        assert!(response.body.contains("Email notifications"));
        assert!(!response.body.contains("lang="));
    }
}
