#[path = "common/mod.rs"]
mod support;

use custom_elements::{Document, DomError, NodeId, RegistryId};
use support::{RecordingClass, change, define_recording, get_html};
use std::rc::Rc;

fn observed_element(markup: &str, observed: &[&str]) -> (Document, NodeId, Rc<RecordingClass>) {
    let mut doc = Document::new();
    let class = define_recording(&mut doc, RegistryId::GLOBAL, "x-foo", observed);
    let body = doc.body();
    let el = get_html(&mut doc, markup, body);
    assert!(doc.is_upgraded(el));
    (doc, el, class)
}

#[test]
fn set_attribute_reports_old_and_new_values() {
    let (mut doc, el, class) = observed_element("<x-foo></x-foo>", &["foo"]);
    doc.set_attribute(el, "foo", "bar").unwrap();
    doc.set_attribute(el, "foo", "baz").unwrap();
    doc.set_attribute(el, "other", "ignored").unwrap();

    let expected = vec![
        change("foo", None, Some("bar")),
        change("foo", Some("bar"), Some("baz")),
    ];
    assert_eq!(doc.changed_attributes(el), expected.as_slice());
    assert_eq!(class.changes_for(el), expected);
    assert_eq!(doc.get_attribute(el, "other"), Some("ignored"));
}

#[test]
fn remove_attribute_reports_removal_and_ignores_absent_names() {
    let (mut doc, el, _) = observed_element("<x-foo></x-foo>", &["foo"]);
    doc.set_attribute(el, "foo", "bar").unwrap();
    doc.remove_attribute(el, "foo").unwrap();
    doc.remove_attribute(el, "foo").unwrap();

    assert_eq!(
        doc.changed_attributes(el),
        &[
            change("foo", None, Some("bar")),
            change("foo", Some("bar"), None),
        ]
    );
}

#[test]
fn upgrade_reports_present_observed_attributes_in_attribute_order() {
    let (doc, el, class) = observed_element(
        r#"<x-foo bar="2" skipped="x" foo="1"></x-foo>"#,
        &["foo", "bar"],
    );
    let expected = vec![change("bar", None, Some("2")), change("foo", None, Some("1"))];
    assert_eq!(doc.changed_attributes(el), expected.as_slice());
    assert_eq!(class.changes_for(el), expected);
}

#[test]
fn observed_names_compare_case_sensitively() {
    let (mut doc, el, class) = observed_element(r#"<x-foo Foo="1"></x-foo>"#, &["Foo"]);
    doc.set_attribute(el, "FOO", "bar").unwrap();
    doc.set_attribute(el, "Foo", "baz").unwrap();
    assert_eq!(doc.get_attribute(el, "foo"), Some("baz"));
    assert!(doc.changed_attributes(el).is_empty());
    assert!(class.changes_for(el).is_empty());

    let (mut doc, el, _) = observed_element(r#"<x-foo foo="1"></x-foo>"#, &["Foo", "foo"]);
    doc.set_attribute(el, "FOO", "2").unwrap();
    assert_eq!(
        doc.changed_attributes(el),
        &[change("foo", None, Some("1")), change("foo", Some("1"), Some("2"))]
    );
}

#[test]
fn toggle_attribute_reports_each_transition() {
    let (mut doc, el, _) = observed_element("<x-foo></x-foo>", &["foo"]);
    assert_eq!(doc.toggle_attribute(el, "foo", None), Ok(true));
    assert_eq!(doc.toggle_attribute(el, "foo", Some(true)), Ok(true));
    assert_eq!(doc.toggle_attribute(el, "foo", None), Ok(false));
    assert_eq!(doc.toggle_attribute(el, "foo", Some(false)), Ok(false));

    assert_eq!(
        doc.changed_attributes(el),
        &[change("foo", None, Some("")), change("foo", Some(""), None)]
    );
}

#[test]
fn attribute_node_writes_alias_the_element() {
    let (mut doc, el, _) = observed_element("<x-foo></x-foo>", &["foo"]);
    let attr = doc.create_attribute("foo").unwrap();
    doc.set_attr_value(attr, "bar").unwrap();
    assert_eq!(doc.set_attribute_node(el, attr), Ok(None));
    doc.set_attr_value(attr, "baz").unwrap();

    assert_eq!(
        doc.changed_attributes(el),
        &[
            change("foo", None, Some("bar")),
            change("foo", Some("bar"), Some("baz")),
        ]
    );
    assert_eq!(doc.get_attribute(el, "foo"), Some("baz"));
    assert_eq!(doc.owner_element(attr), Some(el));
}

#[test]
fn set_attribute_node_replaces_existing_attributes() {
    let (mut doc, el, _) =
        observed_element(r#"<x-foo foo="1" bar="2"></x-foo>"#, &["foo", "bar"]);
    let replacement = doc.create_attribute("foo").unwrap();
    doc.set_attr_value(replacement, "3").unwrap();
    let previous = doc.set_attribute_node(el, replacement).unwrap().unwrap();

    let bar = doc.get_attribute_node(el, "bar").unwrap();
    doc.set_attr_value(bar, "4").unwrap();

    assert_eq!(
        &doc.changed_attributes(el)[2..],
        &[
            change("foo", Some("1"), Some("3")),
            change("bar", Some("2"), Some("4")),
        ]
    );
    assert_eq!(doc.owner_element(previous), None);
    assert_eq!(doc.attr_value(previous), Some("1"));
    assert_eq!(doc.attributes(el), vec![replacement, bar]);

    doc.set_attr_value(previous, "ignored").unwrap();
    assert_eq!(doc.changed_attributes(el).len(), 4);
}

#[test]
fn mutating_values_while_iterating_reports_in_iteration_order() {
    let (mut doc, el, _) = observed_element(
        r#"<x-foo foo="1" skipped="2" bar="3"></x-foo>"#,
        &["foo", "bar"],
    );
    for attr in doc.attributes(el) {
        let next = format!("{}!", doc.attr_value(attr).unwrap());
        doc.set_attr_value(attr, &next).unwrap();
    }

    assert_eq!(
        &doc.changed_attributes(el)[2..],
        &[
            change("foo", Some("1"), Some("1!")),
            change("bar", Some("3"), Some("3!")),
        ]
    );
    assert_eq!(doc.get_attribute(el, "skipped"), Some("2!"));
}

#[test]
fn remove_attribute_node_reports_removal() {
    let (mut doc, el, _) = observed_element("<x-foo></x-foo>", &["foo"]);
    doc.set_attribute(el, "foo", "value").unwrap();
    let attr = doc.get_attribute_node(el, "foo").unwrap();
    assert_eq!(doc.remove_attribute_node(el, attr), Ok(attr));

    assert_eq!(
        doc.changed_attributes(el),
        &[
            change("foo", None, Some("value")),
            change("foo", Some("value"), None),
        ]
    );
    assert!(!doc.has_attribute(el, "foo"));
    assert_eq!(doc.remove_attribute_node(el, attr), Err(DomError::NotFound));

    doc.set_attr_value(attr, "detached").unwrap();
    assert_eq!(doc.changed_attributes(el).len(), 2);
}

#[test]
fn attribute_nodes_belong_to_one_element() {
    let (mut doc, el, _) = observed_element("<x-foo></x-foo>", &["foo"]);
    let body = doc.body();
    let other = get_html(&mut doc, "<x-foo></x-foo>", body);
    let attr = doc.create_attribute("foo").unwrap();
    doc.set_attribute_node(el, attr).unwrap();

    assert_eq!(
        doc.set_attribute_node(other, attr),
        Err(DomError::InUseAttribute(attr))
    );
    assert_eq!(doc.set_attribute_node(el, attr), Ok(Some(attr)));
    assert!(doc.changed_attributes(other).is_empty());
}

#[test]
fn plain_elements_record_nothing_until_upgraded() {
    let mut doc = Document::new();
    let body = doc.body();
    let el = get_html(&mut doc, "<x-foo></x-foo>", body);
    doc.set_attribute(el, "foo", "early").unwrap();
    doc.set_attribute(el, "foo", "later").unwrap();
    assert!(doc.changed_attributes(el).is_empty());

    let class = define_recording(&mut doc, RegistryId::GLOBAL, "x-foo", &["foo"]);
    assert_eq!(doc.changed_attributes(el), &[change("foo", None, Some("later"))]);
    assert_eq!(class.changes_for(el).len(), 1);
}
