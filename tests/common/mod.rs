#![allow(dead_code)]

use form_assist::dom::document::{Document, NodeId};
use form_assist::dom::snapshot::{SnapshotNode, el, select_with_options, text};

/// Wrap body content in `<html><body>`.
pub fn page(body: Vec<SnapshotNode>) -> Document {
    Document::from_snapshot(&page_snapshot(body))
}

pub fn page_snapshot(body: Vec<SnapshotNode>) -> SnapshotNode {
    el("html").child(el("body").children(body))
}

/// Hidden csrf, labelled email, placeholder nickname, labelled select,
/// wrapped checkbox, captioned textarea, submit.
pub fn contact_form() -> SnapshotNode {
    el("form")
        .attr("id", "contact")
        .attr("action", "/submit")
        .attr("method", "POST")
        .children([
            el("input").attr("type", "hidden").attr("name", "csrf").attr("value", "t0k3n"),
            el("label").attr("for", "email").text("Email address"),
            el("input").attr("type", "email").attr("id", "email").attr("name", "email"),
            el("input").attr("type", "text").attr("name", "nickname").attr("placeholder", "Nickname"),
            el("label").attr("for", "color").text("Favourite colour"),
            select_with_options(&["Red", "Green", "Blue"]).attr("id", "color").attr("name", "color"),
            el("label").children([
                el("input").attr("type", "checkbox").attr("name", "subscribe"),
                text(" Subscribe to newsletter "),
            ]),
            el("p").children([text("Message"), el("textarea").attr("name", "message")]),
            el("input").attr("type", "submit").attr("value", "Send"),
        ])
}

/// The single-form page: placeholder-only text input and a colour select.
pub fn email_and_color_page() -> Document {
    page(vec![el("form").children([
        el("input").attr("type", "text").attr("placeholder", "Email"),
        select_with_options(&["Red", "Green", "Blue"]),
    ])])
}

/// First element with the given `name` attribute.
pub fn by_name(doc: &Document, tag: &str, name: &str) -> NodeId {
    doc.elements_by_tag(tag)
        .into_iter()
        .find(|&n| doc.attr(n, "name") == Some(name))
        .unwrap_or_else(|| panic!("no <{}> named {}", tag, name))
}

pub fn selected_text(doc: &Document, select: NodeId) -> String {
    doc.option_text(doc.selected_option(select).expect("select has options"))
}
