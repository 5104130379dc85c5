//! Static marker name → template table loaded at startup.

use std::collections::HashMap;

use livingbooks_core::content::{TemplateRef, TemplateResolver};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One row of the storybook binding table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBinding {
    /// Reference image name.
    pub marker: String,
    /// Content to spawn for it.
    pub template: TemplateRef,
}

impl TemplateBinding {
    #[must_use]
    pub fn new(marker: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            template: TemplateRef::new(template),
        }
    }
}

/// Problems found while building a [`TemplateTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingIssue {
    /// Row `index` has an empty marker or template.
    Incomplete { index: usize },
    /// `marker` appears `occurrences` times; none of its rows are used.
    DuplicateMarker { marker: String, occurrences: usize },
}

/// Resolves marker names through a fixed table.
///
/// Names are trimmed. A name bound more than once is a configuration error
/// and resolves to nothing.
#[derive(Debug, Clone, Default)]
pub struct TemplateTable {
    templates: HashMap<String, TemplateRef>,
    issues: Vec<BindingIssue>,
}

impl TemplateTable {
    /// Builds the table, logging one warning per rejected row or name.
    #[must_use]
    pub fn from_bindings(bindings: impl IntoIterator<Item = TemplateBinding>) -> Self {
        let mut rows: HashMap<String, Vec<TemplateRef>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut issues = Vec::new();

        for (index, binding) in bindings.into_iter().enumerate() {
            let marker = binding.marker.trim();
            let template = binding.template.as_str().trim();
            if marker.is_empty() || template.is_empty() {
                warn!(index, "skipping incomplete template binding");
                issues.push(BindingIssue::Incomplete { index });
                continue;
            }
            let entry = rows.entry(marker.to_owned()).or_default();
            if entry.is_empty() {
                order.push(marker.to_owned());
            }
            entry.push(TemplateRef::new(template));
        }

        let mut templates = HashMap::new();
        for marker in order {
            let Some(mut refs) = rows.remove(&marker) else {
                continue;
            };
            if refs.len() > 1 {
                warn!(
                    marker = %marker,
                    occurrences = refs.len(),
                    "marker bound more than once; no content will be spawned for it"
                );
                issues.push(BindingIssue::DuplicateMarker {
                    marker,
                    occurrences: refs.len(),
                });
            } else if let Some(template) = refs.pop() {
                templates.insert(marker, template);
            }
        }

        Self { templates, issues }
    }

    #[must_use]
    pub fn issues(&self) -> &[BindingIssue] {
        &self.issues
    }

    /// Bound marker names, sorted.
    #[must_use]
    pub fn markers(&self) -> Vec<&str> {
        let mut markers: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        markers.sort_unstable();
        markers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl TemplateResolver for TemplateTable {
    fn resolve(&self, marker_name: &str) -> Option<TemplateRef> {
        self.templates.get(marker_name.trim()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_trimmed_names() {
        let table = TemplateTable::from_bindings([
            TemplateBinding::new(" fox ", "scenes/fox"),
            TemplateBinding::new("owl", "scenes/owl"),
        ]);

        assert_eq!(table.resolve("fox"), Some(TemplateRef::new("scenes/fox")));
        assert_eq!(table.resolve("owl"), Some(TemplateRef::new("scenes/owl")));
        assert!(table.resolve("bear").is_none());
        assert!(table.issues().is_empty());
        assert_eq!(table.markers(), vec!["fox", "owl"]);
    }

    #[test]
    fn test_duplicate_marker_is_rejected_entirely() {
        let table = TemplateTable::from_bindings([
            TemplateBinding::new("fox", "scenes/fox"),
            TemplateBinding::new("owl", "scenes/owl"),
            TemplateBinding::new("fox", "scenes/fox_alt"),
        ]);

        assert!(table.resolve("fox").is_none());
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.issues(),
            &[BindingIssue::DuplicateMarker {
                marker: "fox".to_owned(),
                occurrences: 2,
            }]
        );
    }

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let table = TemplateTable::from_bindings([
            TemplateBinding::new("", "scenes/nothing"),
            TemplateBinding::new("owl", "  "),
            TemplateBinding::new("fox", "scenes/fox"),
        ]);

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.issues(),
            &[
                BindingIssue::Incomplete { index: 0 },
                BindingIssue::Incomplete { index: 1 },
            ]
        );
    }

    #[test]
    fn test_bindings_deserialize_from_yaml() {
        let yaml = "- marker: fox\n  template: scenes/fox\n- marker: owl\n  template: scenes/owl\n";

        let bindings: Vec<TemplateBinding> = serde_yaml::from_str(yaml).unwrap();
        let table = TemplateTable::from_bindings(bindings);

        assert_eq!(table.markers(), vec!["fox", "owl"]);
    }
}
