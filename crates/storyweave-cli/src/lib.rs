//! CLI logic for the Storyweave scenario tool.
//!
//! The CLI reads a scenario content file (the JSON list of nodes), then
//! either renders an SVG preview or applies one structural edit and writes
//! the renumbered content back out.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command, NewNodeArgs, SlotArg, SubjectArg, TargetArg};

use std::fs;

use log::{debug, info, warn};
use serde_json::json;

use storyweave::{
    ScenarioBuilder, StoryweaveError,
    content::{BRANCHING_QUESTION_LIBRARY, ContentType, Node, NodeId, machine_name},
    tree::{ContentTree, Subject},
};

/// Run the Storyweave CLI application
///
/// # Errors
///
/// Returns `StoryweaveError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed scenario content
/// - Rejected structural edits
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), StoryweaveError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let builder = ScenarioBuilder::new(app_config);

    match &args.command {
        Command::Render { input, output } => {
            info!(input_path = input, output_path = output; "Rendering scenario");
            let tree = read_tree(&builder, input)?;
            let svg = builder.render_svg(&tree)?;
            fs::write(output, svg)?;
            info!(output_file = output; "SVG exported successfully");
        }
        Command::Place {
            input,
            subject,
            target,
            parent,
            new_node,
            output,
        } => {
            info!(input_path = input, target_link:% = target; "Placing node");
            let mut tree = read_tree(&builder, input)?;
            let subject = to_subject(subject, new_node)?;
            let placement = tree.place_node(subject, target.0, parent.map(|slot| slot.0))?;
            info!(
                node = placement.node().index(),
                inserted = placement.inserted();
                "Node placed"
            );
            write_tree(&tree, output.as_deref())?;
        }
        Command::Replace {
            input,
            target,
            source,
            new_node,
            output,
        } => {
            info!(input_path = input, target_node = *target; "Replacing node");
            let mut tree = read_tree(&builder, input)?;
            let source = to_subject(source, new_node)?;
            let replacement = tree.delete_and_replace(NodeId::new(*target), source)?;
            info!(node = replacement.node().index(); "Node replaced");
            write_tree(&tree, output.as_deref())?;
        }
        Command::RemoveLeaf {
            input,
            node,
            output,
        } => {
            info!(input_path = input, node = *node; "Removing leaf");
            let mut tree = read_tree(&builder, input)?;
            if !tree.remove_leaf(NodeId::new(*node))? {
                warn!(node = *node; "Node has outgoing links, left unchanged");
            }
            write_tree(&tree, output.as_deref())?;
        }
        Command::Check { input } => {
            let tree = read_tree(&builder, input)?;
            tree.check_consistency()?;
            info!(nodes_len = tree.len(); "Scenario is consistent");
        }
    }

    Ok(())
}

fn read_tree(builder: &ScenarioBuilder, path: &str) -> Result<ContentTree, StoryweaveError> {
    let json = fs::read_to_string(path)?;
    builder.parse(&json)
}

fn write_tree(tree: &ContentTree, output: Option<&str>) -> Result<(), StoryweaveError> {
    let json = tree.to_json()?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            info!(output_file = path; "Scenario written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn to_subject(arg: &SubjectArg, new_node: &NewNodeArgs) -> Result<Subject, StoryweaveError> {
    match arg {
        SubjectArg::Existing(id) => Ok(Subject::Existing(*id)),
        SubjectArg::New(library) => {
            let params = if machine_name(library) == BRANCHING_QUESTION_LIBRARY {
                let alternatives = vec![json!({}); new_node.alternatives];
                json!({ "alternatives": alternatives })
            } else {
                json!({})
            };
            let content_type = ContentType::new(library.as_str(), params);
            let title = new_node
                .title
                .clone()
                .unwrap_or_else(|| content_type.default_title());
            let node = Node::new(content_type, title)?;
            debug!(library = node.library(), title = node.title(); "Created node");
            Ok(Subject::new_node(node))
        }
    }
}
