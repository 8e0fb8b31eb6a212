//! Upload planning: remote path construction and request payload shape.
//!
//! For a classified file, the planner computes the remote content path
//! (mirroring the relative directory structure under the repository's base
//! path) and builds the category-specific Sling request: primary-type
//! metadata plus either a file payload or a symlink-target field.

use std::path::Component;

use tracing::debug;

use crate::error::PlanError;
use crate::scan::FileEntry;

/// The closed set of upload categories. Determines the request shape built
/// by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Modules,
    Resources,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Modules => "modules",
            Category::Resources => "resources",
        }
    }
}

/// Request payload: nothing (metadata-only node), or one file part read from
/// disk at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    None,
    FileBytes {
        part_name: String,
        content_type: Option<&'static str>,
        source: std::path::PathBuf,
    },
}

/// One planned POST against the content repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Reported node kind: `module`, `resource`, `symlink` or `workspace`.
    pub label: &'static str,
    pub url: String,
    pub fields: Vec<(String, String)>,
    pub payload: Payload,
}

/// Builds upload requests for one repository (or sandbox) target.
#[derive(Debug)]
pub struct Planner {
    base_url: String,
}

impl Planner {
    /// `base_url` becomes `{server}/content/sandbox/{user}` or
    /// `{server}/content/repositories/{repository}`.
    pub fn new(server: &str, sandbox: bool, repository: &str) -> Self {
        let content_root = if sandbox { "sandbox" } else { "repositories" };
        Planner {
            base_url: format!("{server}/content/{content_root}/{repository}"),
        }
    }

    /// The workspace node carrying the configured attribute file, posted to
    /// the repository root before any file upload.
    pub fn workspace(&self, attribute_file: Option<&str>) -> UploadRequest {
        let mut fields = vec![("jcr:primaryType".to_string(), "pant:workspace".to_string())];
        if let Some(attr) = attribute_file {
            fields.push(("pant:attributeFile".to_string(), attr.to_string()));
        }
        UploadRequest {
            label: "workspace",
            url: self.base_url.clone(),
            fields,
            payload: Payload::None,
        }
    }

    /// Plans the request for one classified entry.
    ///
    /// Fails with [`PlanError::Structural`] when the entry sits under a
    /// hidden ancestor (the scanner should never produce one; this is a
    /// recheck) and with [`PlanError::Resource`] for absolute symlink
    /// targets. Either failure skips the file without aborting the run.
    pub fn plan(&self, entry: &FileEntry, category: Category) -> Result<UploadRequest, PlanError> {
        if has_hidden_component(entry) {
            return Err(PlanError::Structural {
                path: entry.rel_path.clone(),
            });
        }

        let name = entry.file_name();
        let url = match parent_rel(entry) {
            Some(parent) => format!("{}/{parent}/{name}", self.base_url),
            None => format!("{}/{name}", self.base_url),
        };
        debug!(url = %url, category = category.label(), "planned target url");

        let request = match category {
            Category::Modules => self.plan_module(entry, url),
            Category::Resources => match &entry.symlink_target {
                Some(target) => self.plan_symlink(entry, target, url)?,
                None => self.plan_generic(entry, url),
            },
        };
        Ok(request)
    }

    fn plan_module(&self, entry: &FileEntry, url: String) -> UploadRequest {
        let stem = entry.file_stem();
        let fields = vec![
            ("jcr:primaryType".to_string(), "pant:module".to_string()),
            ("jcr:title".to_string(), stem.clone()),
            ("jcr:description".to_string(), stem),
            ("pant:originalName".to_string(), entry.file_name()),
            ("asciidoc@TypeHint".to_string(), "nt:file".to_string()),
            // Required for the server to create a new module version.
            (":operation".to_string(), "pant:newModuleVersion".to_string()),
        ];
        UploadRequest {
            label: "module",
            url,
            fields,
            payload: Payload::FileBytes {
                part_name: "asciidoc".to_string(),
                content_type: Some("text/x-asciidoc"),
                source: entry.path.clone(),
            },
        }
    }

    fn plan_generic(&self, entry: &FileEntry, url: String) -> UploadRequest {
        let content_type = match entry.path.extension().and_then(|e| e.to_str()) {
            Some("adoc") | Some("asciidoc") => Some("text/x-asciidoc"),
            _ => None,
        };
        UploadRequest {
            label: "resource",
            url,
            fields: Vec::new(),
            payload: Payload::FileBytes {
                part_name: entry.file_name(),
                content_type,
                source: entry.path.clone(),
            },
        }
    }

    fn plan_symlink(
        &self,
        entry: &FileEntry,
        target: &std::path::Path,
        url: String,
    ) -> Result<UploadRequest, PlanError> {
        let target_str = target.to_string_lossy().into_owned();
        if target.is_absolute() {
            return Err(PlanError::Resource {
                path: entry.rel_path.clone(),
                target: target_str,
            });
        }
        let fields = vec![
            ("jcr:primaryType".to_string(), "pant:symlink".to_string()),
            ("pant:target".to_string(), target_str),
        ];
        Ok(UploadRequest {
            label: "symlink",
            url,
            fields,
            payload: Payload::None,
        })
    }
}

fn has_hidden_component(entry: &FileEntry) -> bool {
    entry.rel_path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

fn parent_rel(entry: &FileEntry) -> Option<String> {
    let parent = entry.rel_path.parent()?;
    if parent.as_os_str().is_empty() {
        return None;
    }
    let segments: Vec<String> = parent
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(segments.join("/"))
}
