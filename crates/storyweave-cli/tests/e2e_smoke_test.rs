use std::{fs, path::PathBuf};

use tempfile::tempdir;

use storyweave::{
    content::{Link, NodeId},
    tree::{ContentTree, LinkSlot},
};
use storyweave_cli::{Args, Command, NewNodeArgs, SlotArg, SubjectArg, TargetArg, run};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn args(command: Command) -> Args {
    Args {
        config: Some(fixture("config.toml")),
        log_level: "off".to_string(),
        command,
    }
}

fn read(path: &PathBuf) -> ContentTree {
    ContentTree::from_json(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn e2e_render_fixtures() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    for name in ["chain.json", "branching.json"] {
        let output = temp_dir.path().join(format!("{name}.svg"));
        run(&args(Command::Render {
            input: fixture(name),
            output: output.to_string_lossy().to_string(),
        }))
        .unwrap_or_else(|err| panic!("{name} failed: {err}"));

        let svg = fs::read_to_string(&output).unwrap();
        assert!(svg.contains("<svg"), "{name} should render an SVG");
        assert!(svg.contains("Text"), "{name} should use configured library titles");
    }
}

#[test]
fn e2e_place_new_root() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("placed.json");

    run(&args(Command::Place {
        input: fixture("chain.json"),
        subject: SubjectArg::New("H5P.Text 1.1".to_string()),
        target: TargetArg(Link::Node(NodeId::ROOT)),
        parent: None,
        new_node: NewNodeArgs {
            title: Some("D".to_string()),
            alternatives: 2,
        },
        output: Some(output.to_string_lossy().to_string()),
    }))
    .unwrap();

    let tree = read(&output);
    let titles: Vec<_> = tree.nodes().iter().map(|node| node.title()).collect();
    assert_eq!(titles, vec!["D", "A", "B", "C"]);
    tree.check_consistency().unwrap();
}

#[test]
fn e2e_place_new_branching_question_on_alternative() {
    let temp_dir = tempdir().unwrap();
    let output = temp_dir.path().join("placed.json");

    run(&args(Command::Place {
        input: fixture("branching.json"),
        subject: SubjectArg::New("H5P.BranchingQuestion 1.0".to_string()),
        target: TargetArg(Link::Node(NodeId::new(2))),
        parent: Some(SlotArg(LinkSlot::alternative(NodeId::ROOT, 1))),
        new_node: NewNodeArgs {
            title: None,
            alternatives: 3,
        },
        output: Some(output.to_string_lossy().to_string()),
    }))
    .unwrap();

    let tree = read(&output);
    let placed = tree.get(NodeId::new(3)).unwrap();
    assert_eq!(placed.title(), "BranchingQuestion");
    let links: Vec<_> = placed.links().collect();
    assert_eq!(links, vec![Link::Node(NodeId::new(2)), Link::None, Link::None]);
    let root: Vec<_> = tree.root().unwrap().links().collect();
    assert_eq!(root, vec![Link::Node(NodeId::new(1)), Link::Node(NodeId::new(3))]);
}

#[test]
fn e2e_replace_and_remove() {
    let temp_dir = tempdir().unwrap();
    let replaced = temp_dir.path().join("replaced.json");
    let removed = temp_dir.path().join("removed.json");

    run(&args(Command::Replace {
        input: fixture("branching.json"),
        target: 1,
        source: SubjectArg::New("H5P.Text 1.1".to_string()),
        new_node: NewNodeArgs {
            title: Some("Z".to_string()),
            alternatives: 2,
        },
        output: Some(replaced.to_string_lossy().to_string()),
    }))
    .unwrap();

    let tree = read(&replaced);
    assert_eq!(tree.get(NodeId::new(1)).unwrap().title(), "Z");
    assert_eq!(tree.len(), 3);

    run(&args(Command::RemoveLeaf {
        input: replaced.to_string_lossy().to_string(),
        node: 1,
        output: Some(removed.to_string_lossy().to_string()),
    }))
    .unwrap();

    let tree = read(&removed);
    let titles: Vec<_> = tree.nodes().iter().map(|node| node.title()).collect();
    assert_eq!(titles, vec!["Q", "Y"]);
    let root: Vec<_> = tree.root().unwrap().links().collect();
    assert_eq!(root, vec![Link::None, Link::Node(NodeId::new(1))]);
}

#[test]
fn e2e_check_and_errors() {
    run(&args(Command::Check {
        input: fixture("chain.json"),
    }))
    .unwrap();

    let missing = run(&args(Command::Check {
        input: fixture("missing.json"),
    }));
    assert!(missing.is_err(), "Missing input should fail");

    let temp_dir = tempdir().unwrap();
    let rejected = run(&args(Command::Place {
        input: fixture("chain.json"),
        subject: SubjectArg::Existing(NodeId::new(1)),
        target: TargetArg(Link::Node(NodeId::new(1))),
        parent: None,
        new_node: NewNodeArgs::default(),
        output: Some(temp_dir.path().join("x.json").to_string_lossy().to_string()),
    }));
    assert!(rejected.is_err(), "Placing a node in front of itself should fail");
    assert!(!temp_dir.path().join("x.json").exists());
}
