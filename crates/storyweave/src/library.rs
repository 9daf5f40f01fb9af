//! Content-type registry.
//!
//! The registry answers the only question the tree model and layout engine
//! have about a library: how to label it. Field schemas are handled by the
//! [`translations`](crate::translations) collaborator.

use indexmap::IndexMap;
use serde::Deserialize;

use storyweave_core::content::machine_name;

/// A content library authors can place in a scenario.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Library {
    name: String,
    title: String,
}

impl Library {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
        }
    }

    /// Library identifier, usually with a version suffix (`"H5P.Text 1.1"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable title (`"Text"`).
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Lookup of library metadata by identifier, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryRegistry {
    libraries: IndexMap<String, Library>,
}

impl LibraryRegistry {
    /// Creates a registry; a later entry with the same name replaces an
    /// earlier one in place.
    pub fn new(libraries: Vec<Library>) -> Self {
        Self {
            libraries: libraries
                .into_iter()
                .map(|library| (library.name.clone(), library))
                .collect(),
        }
    }

    /// Returns the metadata for `library`.
    ///
    /// An exact identifier match wins; otherwise the first library with the
    /// same machine name is used, so a node saved with an older version still
    /// finds its title.
    pub fn get(&self, library: &str) -> Option<&Library> {
        self.libraries.get(library).or_else(|| {
            let wanted = machine_name(library);
            self.libraries
                .values()
                .find(|candidate| machine_name(&candidate.name) == wanted)
        })
    }

    /// Display title for `library`, falling back to its machine name.
    pub fn display_title<'a>(&'a self, library: &'a str) -> &'a str {
        self.get(library)
            .map_or_else(|| machine_name(library), Library::title)
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Library> {
        self.libraries.values()
    }
}

impl From<&[Library]> for LibraryRegistry {
    fn from(libraries: &[Library]) -> Self {
        Self::new(libraries.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LibraryRegistry {
        LibraryRegistry::new(vec![
            Library::new("H5P.Text 1.1", "Text"),
            Library::new("H5P.BranchingQuestion 1.0", "Branching Question"),
        ])
    }

    #[test]
    fn test_exact_match() {
        assert_eq!(registry().display_title("H5P.Text 1.1"), "Text");
    }

    #[test]
    fn test_machine_name_match() {
        assert_eq!(registry().display_title("H5P.Text 1.3"), "Text");
    }

    #[test]
    fn test_iteration_keeps_registration_order() {
        let registry = LibraryRegistry::new(vec![
            Library::new("H5P.Text 1.1", "Text"),
            Library::new("H5P.Image 1.1", "Image"),
            Library::new("H5P.Text 1.1", "Plain text"),
        ]);

        assert_eq!(registry.len(), 2);
        let titles: Vec<_> = registry.iter().map(Library::title).collect();
        assert_eq!(titles, vec!["Plain text", "Image"]);
    }

    #[test]
    fn test_unknown_library_falls_back_to_machine_name() {
        assert_eq!(registry().display_title("H5P.Video 1.5"), "H5P.Video");
        assert!(registry().get("H5P.Video 1.5").is_none());
    }
}
