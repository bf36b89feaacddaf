//! Document codec tests
//!
//! Round trips over realistic documents and the failure messages of malformed ones.
mod common;
use common::*;
use serde_json::{Value, json};
use studio_graph::graph::{self, GraphIssue, Nullable};
use studio_graph::prelude::*;

#[cfg(test)]
mod codec_tests {
    use super::*;

    fn round_trip(document: &Value) -> Value {
        let parsed = graph::parse(&document.to_string()).expect("parse failed");
        let text = graph::serialize(&parsed).expect("serialize failed");
        serde_json::from_str(&text).expect("serialized text is not JSON")
    }

    #[test]
    fn test_scenario_document_round_trips() {
        let document = scenario_document();
        assert_eq!(round_trip(&document), document);
    }

    #[test]
    fn test_quoted_and_unicode_values_survive() {
        let mut document = scenario_document();
        document["Graph"]["ModuleNodes"][1]["ModuleParameters"][0]["Value"] =
            json!("say \"hi\"\n\tQualität ✓");
        assert_eq!(round_trip(&document), document);
    }

    #[test]
    fn test_null_and_missing_fields_stay_distinct() {
        let mut document = scenario_document();
        document["Graph"]["ModuleNodes"][0]["Comment"] = Value::Null;
        document["Graph"]["ModuleNodes"][2]
            .as_object_mut()
            .unwrap()
            .remove("Comment");
        document["Graph"]["ModuleNodes"][1]["ModuleParameters"][0]["Value"] = Value::Null;

        let parsed = graph::parse(&document.to_string()).unwrap();
        let nodes = &parsed.graph.module_nodes;
        assert_eq!(nodes[0].comment, Nullable::Null);
        assert_eq!(nodes[2].comment, Nullable::Absent);
        assert_eq!(nodes[0].comment(), None);

        assert_eq!(round_trip(&document), document);
    }

    #[test]
    fn test_unknown_fields_are_carried_through() {
        let parsed = graph::parse(&scenario_raw()).unwrap();
        assert_eq!(parsed.extra["ExperimentId"], json!(EXPERIMENT_ID));
        assert_eq!(parsed.graph.extra["SerializedClientData"], json!("<Layout/>"));
        assert_eq!(
            parsed.graph.module_nodes[0].extra["ModuleId"],
            json!("module://reader")
        );
        assert_eq!(
            parsed.graph.module_nodes[0].parameters()[0].extra["ValueType"],
            json!("Literal")
        );
    }

    #[test]
    fn test_missing_sections_are_named() {
        let cases = [
            (json!({"Description": "no graph"}), "`Graph`"),
            (json!({"Graph": {"EdgesInternal": []}}), "`Graph.ModuleNodes`"),
            (json!({"Graph": {"ModuleNodes": []}}), "`Graph.EdgesInternal`"),
            (json!({"Graph": {"ModuleNodes": {}, "EdgesInternal": []}}), "`Graph.ModuleNodes`"),
        ];

        for (document, section) in cases {
            match graph::parse(&document.to_string()) {
                Err(StudioError::MalformedDocument(message)) => {
                    assert!(message.contains(section), "'{}' does not name {}", message, section)
                }
                other => panic!("expected MalformedDocument for {}, got {:?}", section, other),
            }
        }
    }

    #[test]
    fn test_truncated_text_is_malformed() {
        let raw = scenario_raw();
        let truncated = &raw[..raw.len() / 2];
        assert!(matches!(
            graph::parse(truncated),
            Err(StudioError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_scenario_document_is_consistent() {
        let parsed = graph::parse(&scenario_raw()).unwrap();
        assert!(graph::validate(&parsed).is_empty());
    }

    #[test]
    fn test_validate_reports_dangling_edges() {
        let mut document = scenario_document();
        document["Graph"]["EdgesInternal"]
            .as_array_mut()
            .unwrap()
            .push(json!({
                "SourceOutputPortId": "node-c:Transformed dataset",
                "DestinationInputPortId": "node-z:Dataset"
            }));
        let parsed = graph::parse(&document.to_string()).unwrap();

        let issues = graph::validate(&parsed);
        assert_eq!(
            issues,
            vec![GraphIssue::DanglingPort {
                edge: 1,
                port: PortRef::new("node-z", "Dataset"),
                role: PortRole::Input,
            }]
        );
    }
}
