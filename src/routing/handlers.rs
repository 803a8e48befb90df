//! Handler registry — the fixed set of specialists work can be routed to.

use std::collections::HashMap;

use crate::routing::classifier::Category;

/// A named specialist and the category of work it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSpec {
    /// Handler name used in work orders ("Developer", "QA", ...).
    pub name: &'static str,
    /// Category this handler accepts.
    pub category: Category,
    /// One-line description of what the handler is for.
    pub description: &'static str,
    /// Step 2 of the work order instructions.
    pub work_step: &'static str,
}

const DEFAULT_HANDLERS: &[HandlerSpec] = &[
    HandlerSpec {
        name: "Developer",
        category: Category::Development,
        description: "Specialist for coding tasks, bug fixes, and technical implementations",
        work_step: "Analyze the requirements, then implement the change or fix the bug, \
                    breaking the work into subtasks if needed",
    },
    HandlerSpec {
        name: "Writer",
        category: Category::Documentation,
        description: "Specialist for documentation, guides, and content creation",
        work_step: "Identify the audience and purpose, then write or improve the \
                    documentation with clear structure",
    },
    HandlerSpec {
        name: "QA",
        category: Category::Testing,
        description: "Specialist for testing, quality assurance, and bug verification",
        work_step: "Work out what needs testing, create test scenarios, and verify \
                    the behavior, documenting every finding",
    },
    HandlerSpec {
        name: "Research",
        category: Category::Research,
        description: "Specialist for research, analysis, and information gathering",
        work_step: "Define the research objectives, gather and analyze the relevant \
                    information, and state clear conclusions",
    },
];

/// Registry of handlers, keyed by the category they accept.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    by_category: HashMap<Category, HandlerSpec>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            by_category: HashMap::new(),
        }
    }

    /// Registry with the four standard handlers.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for spec in DEFAULT_HANDLERS {
            registry.register(spec.clone());
        }
        registry
    }

    /// Register a handler. `Unknown` is never routable and is ignored.
    ///
    /// A later registration for the same category replaces the earlier one.
    pub fn register(&mut self, spec: HandlerSpec) {
        if spec.category == Category::Unknown {
            tracing::warn!(handler = spec.name, "Refusing to register handler for unknown category");
            return;
        }
        tracing::debug!(handler = spec.name, category = %spec.category, "Registered handler");
        self.by_category.insert(spec.category, spec);
    }

    /// Handler accepting `category`, if any.
    pub fn for_category(&self, category: Category) -> Option<&HandlerSpec> {
        self.by_category.get(&category)
    }

    /// Handler by name.
    pub fn by_name(&self, name: &str) -> Option<&HandlerSpec> {
        self.by_category.values().find(|spec| spec.name == name)
    }

    /// Handler names in category check order.
    pub fn names(&self) -> Vec<&'static str> {
        Category::ROUTABLE
            .iter()
            .filter_map(|c| self.for_category(*c))
            .map(|spec| spec.name)
            .collect()
    }

    /// Number of registered handlers.
    pub fn count(&self) -> usize {
        self.by_category.len()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.count(), 4);
        assert_eq!(registry.for_category(Category::Development).unwrap().name, "Developer");
        assert_eq!(registry.for_category(Category::Documentation).unwrap().name, "Writer");
        assert_eq!(registry.for_category(Category::Testing).unwrap().name, "QA");
        assert_eq!(registry.for_category(Category::Research).unwrap().name, "Research");
        assert!(registry.for_category(Category::Unknown).is_none());
    }

    #[test]
    fn names_in_check_order() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.names(), vec!["Developer", "Writer", "QA", "Research"]);
    }

    #[test]
    fn unknown_category_is_not_registered() {
        let mut registry = HandlerRegistry::empty();
        registry.register(HandlerSpec {
            name: "Catchall",
            category: Category::Unknown,
            description: "",
            work_step: "",
        });
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn lookup_by_name() {
        let registry = HandlerRegistry::standard();
        assert_eq!(registry.by_name("QA").unwrap().category, Category::Testing);
        assert!(registry.by_name("Designer").is_none());
    }
}
