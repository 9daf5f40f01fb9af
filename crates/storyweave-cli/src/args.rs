//! Command-line argument definitions for the Storyweave CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the configuration file and the
//! logging verbosity; each [`Command`] reads a scenario content file and
//! either renders it or applies one structural edit.

use std::{fmt, str::FromStr};

use clap::{Parser, Subcommand};

use storyweave::{
    content::{Link, NodeId},
    tree::LinkSlot,
};

/// Command-line arguments for the Storyweave scenario tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the scenario as an SVG preview
    Render {
        /// Path to the scenario content file (JSON)
        input: String,

        /// Path to the output SVG file
        #[arg(short, long, default_value = "out.svg")]
        output: String,
    },

    /// Place a node in front of a target link
    Place {
        /// Path to the scenario content file (JSON)
        input: String,

        /// Node to place: `new:<library>` or the position of an existing node
        #[arg(short, long)]
        subject: SubjectArg,

        /// Link the placed node leads to: `end`, `none`, or a node position
        #[arg(short, long)]
        target: TargetArg,

        /// Link slot that leads to the placed node: `<node>` or `<node>:<alternative>`
        #[arg(short, long)]
        parent: Option<SlotArg>,

        #[command(flatten)]
        new_node: NewNodeArgs,

        /// Path to the output JSON file, the scenario is printed if omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace a node, handing its successor to the replacement
    Replace {
        /// Path to the scenario content file (JSON)
        input: String,

        /// Position of the node to replace
        #[arg(short, long)]
        target: usize,

        /// Replacement: `new:<library>` or the position of an existing node
        #[arg(short, long)]
        source: SubjectArg,

        #[command(flatten)]
        new_node: NewNodeArgs,

        /// Path to the output JSON file, the scenario is printed if omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete a node without outgoing links
    RemoveLeaf {
        /// Path to the scenario content file (JSON)
        input: String,

        /// Position of the node to delete
        node: usize,

        /// Path to the output JSON file, the scenario is printed if omitted
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Verify that every link of the scenario resolves
    Check {
        /// Path to the scenario content file (JSON)
        input: String,
    },
}

/// Settings for nodes created with `new:<library>`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct NewNodeArgs {
    /// Title of a new node, defaults to the library's short name
    #[arg(long)]
    pub title: Option<String>,

    /// Number of empty alternatives of a new branching question
    #[arg(long, default_value_t = 2)]
    pub alternatives: usize,
}

/// Node being placed or used as a replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectArg {
    New(String),
    Existing(NodeId),
}

impl FromStr for SubjectArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("new:") {
            Some("") => Err("missing library after `new:`".to_string()),
            Some(library) => Ok(Self::New(library.to_string())),
            None => parse_position(s).map(Self::Existing),
        }
    }
}

/// Target link of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetArg(pub Link);

impl FromStr for TargetArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "end" => Ok(Self(Link::EndScreen)),
            "none" => Ok(Self(Link::None)),
            position => parse_position(position).map(|id| Self(Link::Node(id))),
        }
    }
}

/// Link slot of a parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotArg(pub LinkSlot);

impl FromStr for SlotArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((node, alternative)) => {
                let node = parse_position(node)?;
                let alternative = alternative
                    .parse::<usize>()
                    .map_err(|err| format!("invalid alternative `{alternative}`: {err}"))?;
                Ok(Self(LinkSlot::alternative(node, alternative)))
            }
            None => parse_position(s).map(|node| Self(LinkSlot::next(node))),
        }
    }
}

impl fmt::Display for TargetArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Link::None => write!(f, "none"),
            Link::EndScreen => write!(f, "end"),
            Link::Node(id) => write!(f, "{}", id.index()),
        }
    }
}

fn parse_position(s: &str) -> Result<NodeId, String> {
    s.parse::<usize>()
        .map(NodeId::new)
        .map_err(|err| format!("invalid node position `{s}`: {err}"))
}
