use std::collections::BTreeMap;

/// Render a label map as a Kubernetes equality-based selector (`a=1,b=2`)
///
/// Keys are emitted in sorted order so the same map always renders the same
/// string. An empty map renders as an empty string, which selects everything.
pub fn render_label_selector(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
