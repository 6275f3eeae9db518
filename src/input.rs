use reqwest::Url;

/// Sample inputs mixing recipe URLs, a recipe and two ingredient lists
const DEMO_INPUTS: &str = include_str!("demo_inputs.txt");

/// Represents one thing the user handed in
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    /// A recipe page to download
    Url(String),
    /// A recipe or ingredient list given directly
    Text(String),
}

impl InputItem {
    /// Decide how an input is processed; blank input yields `None`
    pub fn classify(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if !trimmed.contains(char::is_whitespace) {
            if let Ok(url) = Url::parse(trimmed) {
                if matches!(url.scheme(), "http" | "https") {
                    return Some(InputItem::Url(trimmed.to_string()));
                }
            }
        }

        Some(InputItem::Text(trimmed.to_string()))
    }

    /// Short label for logs and the skipped-input report
    pub fn source(&self) -> String {
        match self {
            InputItem::Url(url) => url.clone(),
            InputItem::Text(text) => {
                let first_line = text.lines().next().unwrap_or_default().trim();
                let mut label: String = first_line.chars().take(60).collect();
                if label.len() < first_line.len() || text.lines().nth(1).is_some() {
                    label.push_str("...");
                }
                label
            }
        }
    }
}

/// Split a multi-item text on lines holding only `---`
pub fn split_items(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if line.trim() == "---" {
            items.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    items.push(current.join("\n"));

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// The built-in sample inputs
pub fn demo_inputs() -> Vec<String> {
    split_items(DEMO_INPUTS)
}
