//! Error adapter for converting StoryweaveError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use storyweave::{StoryweaveError, editor::EditorError, tree::TreeError};

/// Adapter rendering a [`StoryweaveError`] as a miette diagnostic.
pub struct ErrorAdapter<'a>(pub &'a StoryweaveError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            StoryweaveError::Io(_) => "storyweave::io",
            StoryweaveError::Json(_) => "storyweave::json",
            StoryweaveError::Content(_) => "storyweave::content",
            StoryweaveError::Tree(_) => "storyweave::tree",
            StoryweaveError::Editor(_) => "storyweave::editor",
            StoryweaveError::Config(_) => "storyweave::config",
            StoryweaveError::Export(_) => "storyweave::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let tree_error = match self.0 {
            StoryweaveError::Tree(err) | StoryweaveError::Editor(EditorError::Tree(err)) => err,
            _ => return None,
        };
        let help = match tree_error {
            TreeError::NoFreeAlternative(_) => {
                "clear one alternative of the branching question before placing it"
            }
            TreeError::BranchingTarget(_) => {
                "remove the links of the branching question's alternatives first"
            }
            TreeError::RootWithParent => "nothing can lead to the root, omit --parent",
            TreeError::RootNotMovable(_) => {
                "the root can only move when it leads to a single successor"
            }
            TreeError::LinkToRoot(_) => "links to the first node are not allowed",
            TreeError::InsideOwnBranches(_) => {
                "pick a dropzone outside the branches of the moved question"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// Wrap a [`StoryweaveError`] for rendering with miette.
pub fn to_reportable(err: &StoryweaveError) -> ErrorAdapter<'_> {
    ErrorAdapter(err)
}

#[cfg(test)]
mod tests {
    use storyweave::content::NodeId;

    use super::*;

    #[test]
    fn test_code_per_variant() {
        let err = StoryweaveError::Config("broken".to_string());
        let reportable = to_reportable(&err);

        assert_eq!(reportable.code().unwrap().to_string(), "storyweave::config");
        assert_eq!(reportable.to_string(), "Configuration error: broken");
        assert!(reportable.help().is_none());
    }

    #[test]
    fn test_tree_error_help() {
        let err = StoryweaveError::Tree(TreeError::NoFreeAlternative(NodeId::new(2)));
        let reportable = to_reportable(&err);

        assert_eq!(reportable.code().unwrap().to_string(), "storyweave::tree");
        assert!(reportable.help().unwrap().to_string().contains("alternative"));
    }

    #[test]
    fn test_editor_tree_error_help() {
        let err = StoryweaveError::Editor(EditorError::Tree(TreeError::RootWithParent));

        assert!(to_reportable(&err).help().is_some());
    }
}
