use crate::markup::Fragment;

/// Collect the text content of every element whose `class` attribute equals
/// `class_value`, in document order.
///
/// Compound values such as `"tei-title teia-level__m"` are compared as whole
/// attribute strings: token order and spacing must match exactly.
///
/// The content of a match never includes its own tail (the text after its
/// closing tag), but does include the tails of its descendants.
pub fn extract(fragment: &Fragment, class_value: &str) -> Vec<String> {
    fragment
        .descendants(fragment.root())
        .filter(|&id| fragment.get(id).class() == Some(class_value))
        .map(|id| fragment.text_content(id))
        .collect()
}
