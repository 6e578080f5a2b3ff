//! Tag and content filtering of the todo list

use super::reducer::OptimisticTodo;
use std::collections::HashSet;

/// Distinct tags across `todos`, in first-seen order
pub fn available_tags(todos: &[OptimisticTodo]) -> Vec<String> {
    let mut seen = HashSet::new();

    todos
        .iter()
        .flat_map(|row| row.todo.tags.iter())
        .filter(|tag| seen.insert(*tag))
        .cloned()
        .collect()
}

/// Current tag selection and search text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub selected_tags: Vec<String>,
    pub query: String,
}

impl TodoFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag` to the selection, or remove it if already selected
    pub fn toggle_tag(&mut self, tag: &str) {
        match self.selected_tags.iter().position(|t| t == tag) {
            Some(index) => {
                self.selected_tags.remove(index);
            }
            None => self.selected_tags.push(tag.to_string()),
        }
    }

    pub fn matches(&self, row: &OptimisticTodo) -> bool {
        let tags_match = self.selected_tags.is_empty()
            || row.todo.tags.iter().any(|tag| self.selected_tags.contains(tag));

        tags_match
            && row
                .todo
                .content
                .to_lowercase()
                .contains(&self.query.to_lowercase())
    }

    /// Rows passing both filters, in their original order
    pub fn apply<'a>(&self, todos: &'a [OptimisticTodo]) -> Vec<&'a OptimisticTodo> {
        todos.iter().filter(|row| self.matches(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TodoPage;

    fn row(id: i64, content: &str, tags: &[&str]) -> OptimisticTodo {
        OptimisticTodo::settled(TodoPage {
            id,
            content: content.into(),
            attachment: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    fn todos() -> Vec<OptimisticTodo> {
        vec![
            row(1, "Buy milk", &["shop", "home"]),
            row(2, "Call mom", &["family"]),
            row(3, "Buy stamps", &["shop"]),
            row(4, "Read", &[]),
        ]
    }

    fn ids(rows: Vec<&OptimisticTodo>) -> Vec<i64> {
        rows.into_iter().map(OptimisticTodo::id).collect()
    }

    #[test]
    fn test_available_tags_first_seen_order() {
        assert_eq!(available_tags(&todos()), vec!["shop", "home", "family"]);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        assert_eq!(ids(TodoFilter::new().apply(&todos())), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_tag_filter_intersects_selection() {
        let mut filter = TodoFilter::new();
        filter.toggle_tag("home");
        filter.toggle_tag("family");

        assert_eq!(ids(filter.apply(&todos())), vec![1, 2]);
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let filter = TodoFilter {
            selected_tags: Vec::new(),
            query: "bUY".into(),
        };

        assert_eq!(ids(filter.apply(&todos())), vec![1, 3]);
    }

    #[test]
    fn test_tag_and_query_combine() {
        let filter = TodoFilter {
            selected_tags: vec!["shop".into()],
            query: "stamps".into(),
        };

        assert_eq!(ids(filter.apply(&todos())), vec![3]);
    }

    #[test]
    fn test_toggle_tag_twice_deselects() {
        let mut filter = TodoFilter::new();
        filter.toggle_tag("shop");
        filter.toggle_tag("shop");

        assert!(filter.selected_tags.is_empty());
    }
}
