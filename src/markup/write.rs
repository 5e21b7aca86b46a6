use quick_xml::escape::{escape, partial_escape};

use super::{Fragment, NodeId};

pub(super) fn to_markup(fragment: &Fragment) -> String {
    let mut out = String::new();
    write_element(fragment, fragment.root(), &mut out);
    out
}

fn write_element(fragment: &Fragment, id: NodeId, out: &mut String) {
    let element = fragment.get(id);
    out.push('<');
    out.push_str(&element.tag);
    for attr in &element.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&escape(attr.value.as_str()));
        out.push('"');
    }
    if element.text.is_empty() && element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    out.push_str(&partial_escape(element.text.as_str()));
    for &child in &element.children {
        write_element(fragment, child, out);
        out.push_str(&partial_escape(fragment.get(child).tail.as_str()));
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}
