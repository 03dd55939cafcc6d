//! Diff-to-text rendering
//!
//! Walks a diff tree and emits one line per changed, named field, formatted
//! with the templates from `DiffSettings`.

use serde_json::Value;
use std::sync::Arc;

use super::tree::{ChangeState, DiffNode, DiffTree, FieldMeta};
use crate::config::settings::DiffSettings;
use crate::expr::functions::ValueFunctionRegistry;
use crate::expr::path::value_text;

/// Rendered in place of a diff when the two graphs are identical
pub const NO_DIFF_MARKER: &str = "__DIFF_IS_NULL";

/// Renders diff trees into change descriptions
#[derive(Clone)]
pub struct DiffRenderer {
    settings: DiffSettings,
    functions: Arc<dyn ValueFunctionRegistry>,
}

impl DiffRenderer {
    pub fn new(settings: DiffSettings, functions: Arc<dyn ValueFunctionRegistry>) -> Self {
        Self {
            settings,
            functions,
        }
    }

    pub fn settings(&self) -> &DiffSettings {
        &self.settings
    }

    /// Render the changes between `before` and `after`
    ///
    /// Returns [`NO_DIFF_MARKER`] when the tree records no change at all.
    pub fn render(&self, tree: &DiffTree, before: Option<&Value>, after: Option<&Value>) -> String {
        if !tree.has_changes() {
            return NO_DIFF_MARKER.to_string();
        }

        let separator = &self.settings.field_separator;
        let mut output = String::new();
        for node in tree.walk() {
            if let Some(line) = self.render_node(node, before, after) {
                if !line.is_empty() {
                    output.push_str(&line);
                    output.push_str(separator);
                }
            }
        }

        match output.strip_suffix(separator.as_str()) {
            Some(trimmed) if !separator.is_empty() => trimmed.to_string(),
            _ => output,
        }
    }

    fn render_node(
        &self,
        node: DiffNode<'_>,
        before: Option<&Value>,
        after: Option<&Value>,
    ) -> Option<String> {
        // nested objects are reported through their own fields
        if node.is_root() || node.is_nested() {
            return None;
        }
        let meta = node.meta().filter(|meta| !meta.name.is_empty())?;
        let name = self.display_name(node, meta);

        let before_value = before.and_then(|graph| node.value_in(graph));
        let after_value = after.and_then(|graph| node.value_in(graph));

        let is_list = match (before_value, after_value) {
            (Some(b), Some(a)) => b.is_array() && a.is_array(),
            (Some(value), None) | (None, Some(value)) => value.is_array(),
            (None, None) => false,
        };
        if is_list {
            return Some(self.render_list(&name, meta, before_value, after_value));
        }

        match node.state() {
            ChangeState::Added => Some(
                self.settings
                    .format_add(&name, &self.transform(after_value?, &meta.function)),
            ),
            ChangeState::Changed => Some(self.settings.format_update(
                &name,
                &self.transform(before_value?, &meta.function),
                &self.transform(after_value?, &meta.function),
            )),
            ChangeState::Removed => Some(
                self.settings
                    .format_deleted(&name, &self.transform(before_value?, &meta.function)),
            ),
            ChangeState::Unchanged => None,
        }
    }

    /// Ancestor names, farthest first, each followed by the "of" word
    fn display_name(&self, node: DiffNode<'_>, meta: &FieldMeta) -> String {
        let mut name = meta.name.clone();
        for ancestor in node.ancestors() {
            if let Some(parent) = ancestor.meta().filter(|m| !m.name.is_empty()) {
                name = format!("{}{}{}", parent.name, self.settings.of_word, name);
            }
        }
        name
    }

    fn render_list(
        &self,
        name: &str,
        meta: &FieldMeta,
        before: Option<&Value>,
        after: Option<&Value>,
    ) -> String {
        let before_items = list_items(before);
        let after_items = list_items(after);

        let added = self.list_content(&subtract(after_items, before_items), &meta.function);
        let removed = self.list_content(&subtract(before_items, after_items), &meta.function);
        self.settings.format_list(name, &added, &removed)
    }

    fn list_content(&self, items: &[&Value], function: &str) -> String {
        items
            .iter()
            .map(|item| self.transform(item, function))
            .collect::<Vec<_>>()
            .join(&self.settings.list_item_separator)
    }

    fn transform(&self, value: &Value, function: &str) -> String {
        let text = value_text(value);
        if function.is_empty() {
            text
        } else {
            self.functions.apply(function, &text)
        }
    }
}

impl std::fmt::Debug for DiffRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffRenderer")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn list_items(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Elements of `minuend` with no equal element in `subtrahend`, in order
fn subtract<'v>(minuend: &'v [Value], subtrahend: &[Value]) -> Vec<&'v Value> {
    minuend
        .iter()
        .filter(|item| !subtrahend.contains(item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::provider::{DiffSchema, FieldSpec, JsonDiffProvider};
    use crate::expr::functions::FunctionRegistry;
    use serde_json::json;

    fn renderer() -> DiffRenderer {
        let mut functions = FunctionRegistry::new();
        functions.register("userName", |id| format!("user#{}", id));
        DiffRenderer::new(DiffSettings::default(), Arc::new(functions))
    }

    fn schema() -> DiffSchema {
        DiffSchema::new()
            .field("title", FieldSpec::named("Title"))
            .field("note", FieldSpec::named("Note"))
            .field("owner", FieldSpec::named("Owner").with_function("userName"))
            .field("tags", FieldSpec::named("Tags"))
            .field("internal", FieldSpec::default())
            .field(
                "receiver",
                FieldSpec::named("Receiver").with_fields(
                    DiffSchema::new().field(
                        "address",
                        FieldSpec::default().with_fields(
                            DiffSchema::new().field("city", FieldSpec::named("City")),
                        ),
                    ),
                ),
            )
    }

    fn render(before: Value, after: Value) -> String {
        let tree = JsonDiffProvider::diff(Some(&before), Some(&after), &schema());
        renderer().render(&tree, Some(&before), Some(&after))
    }

    #[test]
    fn test_identical_objects_render_marker() {
        let value = json!({"title": "A", "tags": ["x"]});
        assert_eq!(render(value.clone(), value), NO_DIFF_MARKER);
    }

    #[test]
    fn test_changed_field() {
        assert_eq!(
            render(json!({"title": "Old"}), json!({"title": "New"})),
            "[Title] changed from [Old] to [New]"
        );
    }

    #[test]
    fn test_added_and_removed_fields() {
        let output = render(json!({"note": "bye"}), json!({"title": "Hi"}));
        assert_eq!(output, "[Note] removed: [bye];[Title] added: [Hi]");
    }

    #[test]
    fn test_function_transforms_values() {
        assert_eq!(
            render(json!({"owner": 1}), json!({"owner": 2})),
            "[Owner] changed from [user#1] to [user#2]"
        );
    }

    #[test]
    fn test_collection_add_and_remove() {
        let output = render(json!({"tags": ["a", "b", "c"]}), json!({"tags": ["b", "c", "d"]}));
        assert_eq!(output, "[Tags] added [d] [Tags] removed [a]");
        assert!(!output.contains("[b"));
    }

    #[test]
    fn test_collection_only_additions() {
        let output = render(json!({"tags": []}), json!({"tags": ["x", "y"]}));
        assert_eq!(output, "[Tags] added [x,y]");
    }

    #[test]
    fn test_reordered_collection_renders_marker() {
        assert_eq!(
            render(json!({"tags": ["a", "b"]}), json!({"tags": ["b", "a"]})),
            NO_DIFF_MARKER
        );
    }

    #[test]
    fn test_collection_replaced_by_scalar() {
        assert_eq!(
            render(json!({"tags": ["a"]}), json!({"tags": "x"})),
            r#"[Tags] changed from [["a"]] to [x]"#
        );
    }

    #[test]
    fn test_unnamed_fields_are_skipped() {
        assert_eq!(
            render(json!({"internal": 1, "title": "A"}), json!({"internal": 2, "title": "A"})),
            ""
        );
    }

    #[test]
    fn test_nested_name_skips_unnamed_ancestors() {
        let before = json!({"receiver": {"address": {"city": "Oslo"}}});
        let after = json!({"receiver": {"address": {"city": "Bergen"}}});
        assert_eq!(
            render(before, after),
            "[Receiver's City] changed from [Oslo] to [Bergen]"
        );
    }

    #[test]
    fn test_custom_separator_trimmed_once() {
        let settings = DiffSettings {
            field_separator: " | ".into(),
            ..DiffSettings::default()
        };
        let renderer = DiffRenderer::new(settings, Arc::new(FunctionRegistry::new()));
        let before = json!({"title": "A", "note": "x"});
        let after = json!({"title": "B", "note": "y"});
        let tree = JsonDiffProvider::diff(Some(&before), Some(&after), &schema());
        assert_eq!(
            renderer.render(&tree, Some(&before), Some(&after)),
            "[Note] changed from [x] to [y] | [Title] changed from [A] to [B]"
        );
    }

    #[test]
    fn test_subtract_keeps_order() {
        let a = vec![json!(1), json!(2), json!(3), json!(2)];
        let b = vec![json!(2)];
        assert_eq!(subtract(&a, &b), vec![&json!(1), &json!(3)]);
    }
}
