//! Tests for Node construction and schema validation

#[cfg(test)]
mod tests {
    use crate::models::{
        core_schema_registry, Node, NodeInit, PropertyKind, PropertyValue, SchemaRegistry,
        SchemaValidationError,
    };

    fn registry() -> SchemaRegistry {
        core_schema_registry().unwrap()
    }

    fn text(s: &str) -> PropertyValue {
        PropertyValue::Text(s.to_string())
    }

    #[test]
    fn test_valid_properties_read_back() {
        let node = Node::detached(
            &registry(),
            NodeInit::new("heading")
                .with_id("h1")
                .with_property("content", text("Intro"))
                .with_property("level", PropertyValue::Number(2.0)),
        )
        .unwrap();

        assert_eq!(node.id(), "h1");
        assert_eq!(node.type_name(), "heading");
        assert_eq!(node.get("content"), Some(&text("Intro")));
        assert_eq!(node.get("level").and_then(PropertyValue::as_number), Some(2.0));
        assert!(node.is_detached());
    }

    #[test]
    fn test_wrong_kind_fails_for_every_declared_kind() {
        let registry = registry();
        let cases = [
            ("paragraph", "content", PropertyValue::String("plain".into())),
            ("heading", "level", text("2")),
            ("figure", "label", text("Fig. 1")),
            ("container", "nodes", PropertyValue::Id("p1".into())),
            ("strong", "node", PropertyValue::IdList(vec!["p1".into()])),
            ("strong", "start", PropertyValue::Bool(true)),
        ];

        for (node_type, property, value) in cases {
            let result = Node::detached(
                &registry,
                NodeInit::new(node_type).with_property(property, value),
            );
            assert!(
                matches!(result, Err(SchemaValidationError::KindMismatch { .. })),
                "{}.{} should reject the value: {:?}",
                node_type,
                property,
                result
            );
        }
    }

    #[test]
    fn test_kind_mismatch_reports_expected_and_actual() {
        let err = Node::detached(
            &registry(),
            NodeInit::new("paragraph").with_property("content", PropertyValue::Number(1.0)),
        )
        .unwrap_err();

        assert_eq!(
            err,
            SchemaValidationError::kind_mismatch(
                "paragraph",
                "content",
                PropertyKind::Text,
                PropertyKind::Number
            )
        );
        assert!(err.to_string().contains("expects text, got number"));
    }

    #[test]
    fn test_figure_defaults_applied_for_omitted_properties() {
        let figure = Node::detached(
            &registry(),
            NodeInit::new("figure")
                .with_property("label", PropertyValue::String("Fig. 1".into())),
        )
        .unwrap();

        assert_eq!(
            figure.get("label"),
            Some(&PropertyValue::String("Fig. 1".into()))
        );
        assert_eq!(figure.get("title"), Some(&text("")));
        assert_eq!(figure.get("caption"), Some(&text("")));
    }

    #[test]
    fn test_required_property_without_default_fails() {
        let err = Node::detached(
            &registry(),
            NodeInit::new("image-figure")
                .with_property("label", PropertyValue::String("Fig. 1".into())),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SchemaValidationError::missing_required("image-figure", "src")
        );

        let image = Node::detached(
            &registry(),
            NodeInit::new("image-figure")
                .with_property("src", PropertyValue::String("cat.png".into())),
        )
        .unwrap();
        assert_eq!(image.get("caption"), Some(&text("")));
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = Node::detached(&registry(), NodeInit::new("table")).unwrap_err();
        assert_eq!(err, SchemaValidationError::unknown_node_type("table"));
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let registry = registry();
        let a = Node::detached(&registry, NodeInit::new("paragraph")).unwrap();
        let b = Node::detached(&registry, NodeInit::new("paragraph")).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_categories_are_type_level() {
        let registry = registry();
        let a = Node::detached(&registry, NodeInit::new("paragraph")).unwrap();
        let b = Node::detached(
            &registry,
            NodeInit::new("paragraph").with_property("content", text("other")),
        )
        .unwrap();

        assert_eq!(a.node_type().categories(), b.node_type().categories());
        assert!(a.is_block() && a.is_text());
        assert!(!a.is_property_annotation() && !a.is_inline() && !a.is_container_annotation());
    }

    #[test]
    fn test_leaf_has_no_children() {
        let node = Node::detached(&registry(), NodeInit::new("paragraph")).unwrap();
        assert!(!node.has_children());
        assert_eq!(node.child_count(), 0);
        assert!(node.child_ids().is_empty());
    }

    #[test]
    fn test_container_children_follow_list() {
        let node = Node::detached(
            &registry(),
            NodeInit::new("container").with_property(
                "nodes",
                PropertyValue::IdList(vec!["p1".into(), "p2".into()]),
            ),
        )
        .unwrap();
        assert!(node.has_children());
        assert_eq!(node.child_count(), 2);

        let empty = Node::detached(&registry(), NodeInit::new("container")).unwrap();
        assert!(!empty.has_children());
    }

    #[test]
    fn test_detached_set_checks_schema() {
        let mut node = Node::detached(&registry(), NodeInit::new("paragraph")).unwrap();

        let old = node.set("content", text("a")).unwrap();
        assert_eq!(old, Some(text("")));
        assert!(matches!(
            node.set("content", PropertyValue::Bool(true)),
            Err(SchemaValidationError::KindMismatch { .. })
        ));
        assert!(matches!(
            node.set("missing", text("x")),
            Err(SchemaValidationError::UndeclaredProperty { .. })
        ));
    }
}
