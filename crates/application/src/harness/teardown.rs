//! Deferred cleanup actions.

use std::fmt;
use std::sync::Arc;

use crate::client::AuthenticatedClient;

/// Deletes a record a scenario created.
///
/// Teardowns run in reverse registration order once the scenario body
/// finishes, whatever its outcome. A 404 counts as success: the scenario
/// may have deleted the record itself.
pub struct Teardown {
    label: String,
    path: String,
    client: Arc<AuthenticatedClient>,
}

impl Teardown {
    /// Creates a teardown that sends `DELETE path` with the given client.
    #[must_use]
    pub fn delete(
        client: Arc<AuthenticatedClient>,
        path: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            client,
        }
    }

    /// Runs the teardown.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure; callers record it and move on.
    pub async fn run(self) -> Result<(), String> {
        match self.client.delete(&self.path).await {
            Ok(response) if response.is_success() || response.status == 404 => Ok(()),
            Ok(response) => Err(format!(
                "{}: DELETE {} returned {}: {}",
                self.label,
                self.path,
                response.status,
                response.body_preview(200)
            )),
            Err(e) => Err(format!("{}: DELETE {} failed: {e}", self.label, self.path)),
        }
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("label", &self.label)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
