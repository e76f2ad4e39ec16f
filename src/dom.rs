//! Explicit lookups over a parsed document tree.
//!
//! CSS selectors cover "element inside element"; the pages we read also need
//! "heading with this exact text" and "the next sibling after it", which is what
//! these helpers provide. Every lookup returns `Option` so a missing node is a
//! branch at the call site.

use scraper::ElementRef;

/// First descendant (excluding `root` itself) with the given tag that satisfies `pred`.
pub fn find_first<'a, P>(root: ElementRef<'a>, tag: &str, pred: P) -> Option<ElementRef<'a>>
where
    P: Fn(&ElementRef<'a>) -> bool,
{
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag && pred(el))
}

/// First following sibling with the given tag that satisfies `pred`.
pub fn next_sibling<'a, P>(el: ElementRef<'a>, tag: &str, pred: P) -> Option<ElementRef<'a>>
where
    P: Fn(&ElementRef<'a>) -> bool,
{
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sib| sib.value().name() == tag && pred(sib))
}

/// All text below `el`, trimmed.
pub fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// True when the element's trimmed text is exactly `text`.
pub fn has_text(el: &ElementRef, text: &str) -> bool {
    element_text(el) == text
}

pub fn has_class(el: &ElementRef, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub fn has_attr(el: &ElementRef, name: &str, value: &str) -> bool {
    el.value().attr(name) == Some(value)
}

/// Always-true predicate for lookups that only care about the tag.
pub fn any(_: &ElementRef) -> bool {
    true
}
