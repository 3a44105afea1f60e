//! Referential diagnostics over a routing document.
//!
//! Nothing here blocks a write: the editor accepts whatever pairings it is
//! handed. The checks exist for the `validate` command and for operators
//! inspecting a hand-edited file.
use serde_yaml::Value;

use crate::core::document::{RoutingDocument, first_server_url, string_list};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, DocumentIssue>;

/// Problems found in a routing document
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DocumentIssue {
    #[error("Router '{router}' has no service")]
    MissingServiceField { router: String },

    #[error("Router '{router}' points at undefined service '{service}'")]
    MissingService { router: String, service: String },

    #[error("Router '{router}' uses undefined middleware '{middleware}'")]
    UnknownMiddleware { router: String, middleware: String },

    #[error("Service '{service}' has no server URL")]
    NoServers { service: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Routing document validator
pub struct DocumentValidator;

impl DocumentValidator {
    /// Validate the whole document, folding every issue into one error
    pub fn validate(doc: &RoutingDocument) -> ValidationResult<()> {
        let mut issues = Self::collect_issues(doc);
        match issues.len() {
            0 => Ok(()),
            1 => Err(issues.remove(0)),
            _ => Err(DocumentIssue::ValidationFailed {
                message: Self::format_multiple_issues(&issues),
            }),
        }
    }

    /// Every issue in document order: routers first, then services
    pub fn collect_issues(doc: &RoutingDocument) -> Vec<DocumentIssue> {
        let mut issues = Vec::new();

        for (key, entry) in doc.routers().into_iter().flatten() {
            if let Some(router) = key.as_str() {
                Self::check_router(doc, router, entry, &mut issues);
            }
        }

        for (key, entry) in doc.services().into_iter().flatten() {
            if let Some(service) = key.as_str() {
                if first_server_url(entry).is_none() {
                    issues.push(DocumentIssue::NoServers {
                        service: service.to_string(),
                    });
                }
            }
        }

        issues
    }

    fn check_router(
        doc: &RoutingDocument,
        router: &str,
        entry: &Value,
        issues: &mut Vec<DocumentIssue>,
    ) {
        match entry.get("service").and_then(Value::as_str) {
            None => issues.push(DocumentIssue::MissingServiceField {
                router: router.to_string(),
            }),
            // `name@provider` lives in another provider's configuration
            Some(service) if service.contains('@') => {}
            Some(service) if doc.service(service).is_none() => {
                issues.push(DocumentIssue::MissingService {
                    router: router.to_string(),
                    service: service.to_string(),
                });
            }
            Some(_) => {}
        }

        for middleware in string_list(entry, "middlewares") {
            if !middleware.contains('@') && doc.middleware(&middleware).is_none() {
                issues.push(DocumentIssue::UnknownMiddleware {
                    router: router.to_string(),
                    middleware,
                });
            }
        }
    }

    fn format_multiple_issues(issues: &[DocumentIssue]) -> String {
        let mut message = format!("Found {} issues:\n", issues.len());
        for (i, issue) in issues.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, issue));
        }
        message
    }
}
