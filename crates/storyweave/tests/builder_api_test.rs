//! Integration tests for the ScenarioBuilder API

use storyweave::{
    ScenarioBuilder, StoryweaveError,
    config::AppConfig,
    content::{ContentType, Link, NodeId},
    editor::Interaction,
    layout::Placing,
};

const SCENARIO: &str = r#"[
    {
        "type": {
            "library": "H5P.BranchingQuestion 1.0",
            "params": {
                "question": "Where to?",
                "alternatives": [
                    {"text": "Left", "nextContentId": 1},
                    {"text": "Right", "nextContentId": -1}
                ]
            },
            "subContentId": "6c1c1e4e-7a2e-4b43-9a86-51d0c2bbf1a5"
        },
        "contentTitle": "Crossroads"
    },
    {
        "type": {"library": "H5P.Text 1.1", "params": {"text": "A forest"}},
        "contentTitle": "Forest",
        "nextContentId": -1
    }
]"#;

fn config() -> AppConfig {
    serde_json::from_value(serde_json::json!({
        "libraries": [
            {"name": "H5P.Text 1.1", "title": "Text"},
            {"name": "H5P.BranchingQuestion 1.0", "title": "Branching Question"}
        ]
    }))
    .expect("Failed to build config")
}

#[test]
fn test_parse_scenario() {
    let builder = ScenarioBuilder::new(config());
    let tree = builder.parse(SCENARIO).expect("Failed to parse scenario");

    assert_eq!(tree.len(), 2);
    let root = tree.root().unwrap();
    assert!(root.is_branching());
    let links: Vec<_> = root.links().collect();
    assert_eq!(links, vec![Link::Node(NodeId::new(1)), Link::EndScreen]);
}

#[test]
fn test_parse_rejects_dangling_link() {
    let json = r#"[
        {"type": {"library": "H5P.Text 1.1", "params": {}}, "contentTitle": "A", "nextContentId": 4}
    ]"#;

    let result = ScenarioBuilder::default().parse(json);
    assert!(matches!(result, Err(StoryweaveError::Tree(_))));
}

#[test]
fn test_parse_rejects_malformed_json() {
    let result = ScenarioBuilder::default().parse("not json");
    assert!(matches!(result, Err(StoryweaveError::Json(_))));
}

#[test]
fn test_render_scenario() {
    let builder = ScenarioBuilder::new(config());
    let tree = builder.parse(SCENARIO).expect("Failed to parse scenario");
    let svg = builder.render_svg(&tree).expect("Failed to render scenario");

    assert!(svg.contains("<svg"), "Output should contain SVG tag");
    assert!(svg.contains("</svg>"), "Output should be complete SVG");
    assert!(svg.contains("Crossroads"));
    assert!(svg.contains("Branching Question"));
    assert!(svg.contains("data-placeholder=\"end\""));
}

#[test]
fn test_json_roundtrip_keeps_alternatives_in_params() {
    let builder = ScenarioBuilder::new(config());
    let tree = builder.parse(SCENARIO).expect("Failed to parse scenario");

    let json = tree.to_json().expect("Failed to serialize scenario");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value[0]["type"]["params"]["alternatives"][1]["nextContentId"],
        serde_json::json!(-1)
    );
    assert_eq!(value[0]["type"]["params"]["question"], "Where to?");
    assert_eq!(builder.parse(&json).unwrap(), tree);
}

#[test]
fn test_layout_uses_configured_dimensions() {
    let config: AppConfig = serde_json::from_value(serde_json::json!({
        "layout": {"node_width": 200.0}
    }))
    .unwrap();
    let builder = ScenarioBuilder::new(config);
    let tree = builder.parse(SCENARIO).unwrap();

    let layout = builder.layout(&tree, None);
    let forest = layout.node(NodeId::new(1)).unwrap();
    assert_eq!(forest.size().width(), 200.0);
    assert!(!layout.is_loading());
}

#[test]
fn test_editor_session() {
    let builder = ScenarioBuilder::new(config());
    let tree = builder.parse(SCENARIO).unwrap();
    let mut editor = builder.editor(tree);

    editor.start_inserting(ContentType::new("H5P.Text 1.1", serde_json::json!({})));
    assert_eq!(editor.interaction(), Interaction::Placing(Placing::New));

    let layout = editor.layout();
    let dropzone = *layout
        .dropzones()
        .find(|dropzone| dropzone.target() == Link::Node(NodeId::new(1)))
        .expect("Dropzone above the forest");
    let placement = editor.drop_on(&dropzone).expect("Failed to drop node");

    assert!(placement.inserted());
    assert_eq!(editor.interaction(), Interaction::Idle);
    let tree = editor.tree();
    assert_eq!(tree.len(), 3);
    let left = tree.root().unwrap().alternatives().unwrap()[0].next();
    assert_eq!(left, Link::Node(placement.node()));
    tree.check_consistency().unwrap();
}
