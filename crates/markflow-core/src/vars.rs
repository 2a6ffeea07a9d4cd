//! Path variables and their substitution into destination patterns.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// The named values substituted into destination patterns.
///
/// Derived once per `(document, image name)` pair; purely computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathVariables {
    /// Document base name with extension, e.g. `note.md`.
    pub document_file_name: String,

    /// Document base name without extension, e.g. `note`.
    pub document_base_name: String,

    /// Document extension without the leading dot, e.g. `md`.
    pub document_ext_name: String,

    /// Name (not path) of the document's immediate containing directory.
    pub document_dir_name: String,

    /// Absolute path of the enclosing workspace root, or the document's
    /// own directory when no root is known.
    pub document_workspace_folder: String,

    /// The image's file name, supplied by the caller.
    pub file_name: String,
}

impl PathVariables {
    /// Derive the variable set for a document and image name.
    pub fn derive(
        document_path: &Path,
        image_file_name: &str,
        workspace_root: Option<&Path>,
    ) -> Self {
        let document_dir = document_path.parent().unwrap_or_else(|| Path::new(""));
        let workspace_folder = workspace_root.unwrap_or(document_dir);

        Self {
            document_file_name: component_string(document_path.file_name()),
            document_base_name: component_string(document_path.file_stem()),
            document_ext_name: component_string(document_path.extension()),
            document_dir_name: component_string(document_dir.file_name()),
            document_workspace_folder: workspace_folder.to_string_lossy().into_owned(),
            file_name: image_file_name.to_string(),
        }
    }

    /// Substitute every `${name}` occurrence of each recognized variable
    /// into `pattern`. Unrecognized tokens are left verbatim.
    pub fn resolve(&self, pattern: &str) -> String {
        let mut resolved = pattern.to_string();
        for (name, value) in self.entries() {
            resolved = resolved.replace(&format!("${{{name}}}"), value);
        }
        resolved
    }

    /// The `(token name, value)` pairs in substitution order.
    pub fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("documentFileName", &self.document_file_name),
            ("documentBaseName", &self.document_base_name),
            ("documentExtName", &self.document_ext_name),
            ("documentDirName", &self.document_dir_name),
            ("documentWorkspaceFolder", &self.document_workspace_folder),
            ("fileName", &self.file_name),
        ]
    }
}

fn component_string(component: Option<&std::ffi::OsStr>) -> String {
    component
        .map(|c| c.to_string_lossy().into_owned())
        .unwrap_or_default()
}
