//! Rewriting an annotated fragment into a TEI `<bibl>` element.

use crate::annotation::Annotation;
use crate::config::TEI_ROOT_TAG;
use crate::markup::Fragment;

/// Build the TEI tree for `fragment` without touching the input.
///
/// The root becomes `<bibl>`. Every element carrying a `class` attribute gets
/// its [`Annotation`] applied and loses the `class` attribute. Elements without
/// a class are copied unchanged. Text and tails are never altered.
pub fn rewrite(fragment: &Fragment) -> Fragment {
    let mut out = fragment.clone();
    out.get_mut(out.root()).tag = TEI_ROOT_TAG.to_string();
    for id in fragment.descendants(fragment.root()) {
        let element = out.get_mut(id);
        let Some(class_value) = element.remove_attr("class") else {
            continue;
        };
        let annotation = Annotation::parse(&class_value);
        if let Some(tag) = annotation.tag {
            element.tag = tag;
        }
        for (name, value) in &annotation.attributes {
            element.set_attr(name, value);
        }
    }
    out
}

/// Serialized TEI for `fragment`.
pub fn to_tei(fragment: &Fragment) -> String {
    rewrite(fragment).to_markup()
}
