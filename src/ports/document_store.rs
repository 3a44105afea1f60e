use crate::core::{document::RoutingDocument, error::EditorResult};

/// DocumentStore defines the port (interface) for persisting the routing
/// document
pub trait DocumentStore: Send + Sync + 'static {
    /// Load the current document
    ///
    /// # Returns
    /// The stored document, or the default empty document when nothing has
    /// been stored yet
    fn load(&self) -> EditorResult<RoutingDocument>;

    /// Replace the stored document
    ///
    /// Readers must never observe a partially written document.
    fn save(&self, doc: &RoutingDocument) -> EditorResult<()>;
}
