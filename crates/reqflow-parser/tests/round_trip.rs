//! Property tests: serializing a parsed document and parsing it again
//! yields a field-for-field equal document.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use reqflow_core::Value;
use reqflow_parser::{
    parse_document, serialize, AlternativePath, ContractStatement, Document, FlowStep,
    Frontmatter, InvariantStatement, Priority, Scope, Section, SectionLabel, Status, TestCase,
    Tolerance, ValidateBlock,
};

fn words() -> impl Strategy<Value = String> {
    "[a-z]{1,10}( [a-z]{1,10}){0,4}"
}

fn req_id() -> impl Strategy<Value = String> {
    "[A-Z]{2,5}-[0-9]{1,3}"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-10_000i64..10_000).prop_map(Value::Int),
        "[a-z0-9]{1,12}".prop_map(Value::String),
    ]
}

fn value_map() -> impl Strategy<Value = BTreeMap<String, Value>> {
    proptest::collection::btree_map("[a-z_]{1,8}", scalar(), 1..4)
}

fn alternative() -> impl Strategy<Value = AlternativePath> {
    (prop_oneof!["If", "When", "On"], words(), words()).prop_map(|(cue, cond, outcome)| {
        AlternativePath {
            condition: format!("{cue} {cond}"),
            outcome,
        }
    })
}

fn flow() -> impl Strategy<Value = Vec<FlowStep>> {
    proptest::collection::vec((words(), proptest::collection::vec(alternative(), 0..3)), 1..6)
        .prop_map(|steps| {
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (text, alternatives))| FlowStep {
                    number: (i + 1) as u32,
                    text,
                    alternatives,
                })
                .collect()
        })
}

fn sections() -> impl Strategy<Value = Vec<Section>> {
    proptest::collection::vec(
        (
            prop_oneof![
                Just(SectionLabel::Api),
                Just(SectionLabel::Performance),
                Just(SectionLabel::Security),
                Just(SectionLabel::Data),
                Just(SectionLabel::Rule),
            ],
            words(),
        )
            .prop_map(|(label, body)| Section { label, body }),
        0..4,
    )
    .prop_filter("one section per label", |sections| {
        let labels: BTreeSet<String> = sections.iter().map(|s| s.label.as_str().into()).collect();
        labels.len() == sections.len()
    })
}

fn test_cases() -> impl Strategy<Value = Vec<TestCase>> {
    proptest::collection::vec(
        (value_map(), value_map()).prop_map(|(input, expect)| TestCase { input, expect }),
        0..3,
    )
}

fn invariants() -> impl Strategy<Value = Vec<InvariantStatement>> {
    proptest::collection::vec(
        prop_oneof![
            words().prop_map(|text| InvariantStatement {
                scope: Scope::OwnDocument,
                text,
            }),
            (req_id(), words()).prop_map(|(id, text)| InvariantStatement {
                scope: Scope::Foreign(id),
                text,
            }),
        ],
        0..3,
    )
}

fn contracts() -> impl Strategy<Value = Vec<ContractStatement>> {
    proptest::collection::vec(
        prop_oneof![
            words().prop_map(|text| ContractStatement {
                text,
                tolerance: None,
            }),
            (words(), 1u16..5000, "[a-z]{1,3}").prop_map(|(text, value, unit)| {
                ContractStatement {
                    text: format!("{text} ± {value} {unit}"),
                    tolerance: Some(Tolerance {
                        value: value as f64,
                        unit,
                    }),
                }
            }),
        ],
        0..3,
    )
}

fn validate_block() -> impl Strategy<Value = Option<ValidateBlock>> {
    proptest::option::of(
        (test_cases(), test_cases(), invariants(), contracts()).prop_map(
            |(happy_path, boundaries, invariants, contracts)| ValidateBlock {
                happy_path,
                boundaries,
                invariants,
                contracts,
            },
        ),
    )
}

prop_compose! {
    fn document()(
        id in req_id(),
        user in words(),
        context in words(),
        trigger in words(),
        user_outcome in words(),
        business_outcome in proptest::option::of(words()),
        priority in proptest::option::of(prop_oneof![
            Just(Priority::Critical), Just(Priority::High),
            Just(Priority::Medium), Just(Priority::Low),
        ]),
        status in proptest::option::of(prop_oneof![
            Just(Status::Draft), Just(Status::Approved), Just(Status::Implemented),
        ]),
        estimate in proptest::option::of("[0-9]{1,2}[dhw]"),
        depends_on in proptest::collection::btree_set(req_id(), 0..3),
        tags in proptest::collection::btree_set("[a-z]{2,8}", 0..3),
        flow in flow(),
        sections in sections(),
        validate in validate_block(),
    ) -> Document {
        let frontmatter = Frontmatter {
            id: id.clone(),
            user,
            context,
            trigger,
            user_outcome,
            business_outcome,
            priority,
            status,
            estimate,
            depends_on: depends_on.into_iter().collect(),
            tags,
            extensions: BTreeMap::new(),
        };
        Document { id, frontmatter, flow, sections, validate }
    }
}

proptest! {
    #[test]
    fn round_trip_preserves_documents(doc in document()) {
        let rendered = serialize(&doc);
        let outcome = parse_document(&rendered)
            .unwrap_or_else(|e| panic!("reparse failed:\n{rendered}\n{e}"));
        prop_assert_eq!(&outcome.document, &doc);

        // A second trip is stable as well.
        let again = serialize(&outcome.document);
        prop_assert_eq!(again, rendered);
    }

    #[test]
    fn alternatives_stay_with_their_step(doc in document()) {
        let rendered = serialize(&doc);
        let reparsed = parse_document(&rendered).unwrap().document;
        for (a, b) in doc.flow.iter().zip(reparsed.flow.iter()) {
            prop_assert_eq!(&a.alternatives, &b.alternatives);
        }
    }
}
