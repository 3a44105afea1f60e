pub mod document;
pub mod editor;
pub mod error;
pub mod forms;
pub mod validation;
pub mod views;

pub use document::{RouterEntry, RoutingDocument, ServiceEntry};
pub use editor::RoutingEditor;
pub use error::{EditorError, EditorResult};
pub use forms::{MiddlewareForm, RouteForm};
pub use validation::{DocumentIssue, DocumentValidator};
pub use views::{MiddlewareView, RouteView};
