use log::debug;
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text is never recipe content
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Pull the readable recipe text out of a page.
///
/// The container is the first element whose class mentions "recipe", then
/// the first whose id does, then the first `<article>`, then `<body>`.
/// Text nodes are trimmed and joined one per line.
pub fn extract_recipe_text(html: &str) -> String {
    let document = Html::parse_document(html);

    match find_recipe_container(&document) {
        Some(container) => element_text(container),
        None => {
            debug!("Specific recipe container not found, falling back to full document text");
            element_text(document.root_element())
        }
    }
}

fn find_recipe_container(document: &Html) -> Option<ElementRef<'_>> {
    let any = Selector::parse("*").ok()?;

    document
        .select(&any)
        .find(|el| {
            el.value()
                .classes()
                .any(|class| class.to_lowercase().contains("recipe"))
        })
        .or_else(|| {
            document.select(&any).find(|el| {
                el.value()
                    .id()
                    .is_some_and(|id| id.to_lowercase().contains("recipe"))
            })
        })
        .or_else(|| first_element(document, "article"))
        .or_else(|| first_element(document, "body"))
}

fn first_element<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn is_skipped(element: &scraper::node::Element) -> bool {
    SKIPPED_ELEMENTS.contains(&element.name())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .ancestors()
                    .any(|ancestor| ancestor.value().as_element().is_some_and(is_skipped));
                (!hidden).then(|| text.trim())
            }
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
