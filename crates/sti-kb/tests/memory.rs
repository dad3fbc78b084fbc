use sti_kb::{InMemoryKnowledgeBase, KbCall, KbError, KnowledgeBase};
use sti_model::{Attribute, Clazz, Entity};

fn fixture_json() -> &'static str {
    r#"{
        "entities": [
            {"id": "ex:Paris", "label": "Paris",
             "types": [{"id": "ex:City", "label": "City"}],
             "attributes": [{"relation_uri": "ex:capitalOf", "value": "France"}]},
            {"id": "ex:Paris_Hilton", "label": "Paris Hilton",
             "types": [{"id": "ex:Person", "label": "Person"}]},
            {"id": "ex:France", "label": "France",
             "types": [{"id": "ex:Country", "label": "Country"}]}
        ],
        "parents": {"ex:City": "ex:Place"}
    }"#
}

#[test]
fn search_matches_label_tokens() {
    let kb = InMemoryKnowledgeBase::from_json_str(fixture_json()).expect("parse fixture");
    let found = kb.find_entity_candidates("paris").expect("search");
    let ids: Vec<&str> = found.items.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ex:Paris", "ex:Paris_Hilton"]);
    assert!(found.warnings.is_empty());
}

#[test]
fn typed_search_filters_candidates() {
    let kb = InMemoryKnowledgeBase::from_json_str(fixture_json()).expect("parse fixture");
    let found = kb
        .find_entity_candidates_of_types("Paris", &["ex:Person".to_string()])
        .expect("search");
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].id, "ex:Paris_Hilton");
}

#[test]
fn lazy_attributes_are_fetched_separately() {
    let kb = InMemoryKnowledgeBase::from_json_str(fixture_json())
        .expect("parse fixture")
        .with_lazy_attributes(true);
    let found = kb.find_entity_candidates("Paris").expect("search");
    assert!(found.items[0].attributes.is_empty());
    let attributes = kb.find_attributes_of_entity(&found.items[0]).expect("attributes");
    assert_eq!(attributes.items, vec![Attribute::new("ex:capitalOf", "France")]);

    let unknown = kb
        .find_attributes_of_entity(&Entity::new("ex:Nowhere", "Nowhere"))
        .expect("attributes");
    assert!(unknown.items.is_empty());
    assert_eq!(unknown.warnings.len(), 1);
}

#[test]
fn parents_and_call_log() {
    let kb = InMemoryKnowledgeBase::from_entities(vec![
        Entity::new("ex:Rome", "Rome").with_types(vec![Clazz::new("ex:City", "City")]),
    ])
    .with_parent("ex:City", "ex:Place");
    assert_eq!(
        kb.find_parent_clazz("ex:City").expect("parent"),
        Some("ex:Place".to_string())
    );
    assert_eq!(kb.find_parent_clazz("ex:Place").expect("parent"), None);
    assert_eq!(
        kb.calls(),
        vec![
            KbCall::Parent {
                clazz: "ex:City".to_string()
            },
            KbCall::Parent {
                clazz: "ex:Place".to_string()
            },
        ]
    );
    kb.reset_calls();
    assert_eq!(kb.call_count(), 0);
}

#[test]
fn failing_queries_surface_proxy_errors() {
    let kb = InMemoryKnowledgeBase::from_json_str(fixture_json())
        .expect("parse fixture")
        .failing_on("France");
    let err = kb.find_entity_candidates("france").unwrap_err();
    assert!(matches!(err, KbError::Proxy { .. }));
    assert!(kb.find_entity_candidates("Paris").is_ok());
}
