#![forbid(unsafe_code)]

//! Element handles a host binds to a widget.

use pnl_runtime::{Document, ElementId};

/// The elements the search controller works with.
///
/// All handles are optional and non-owning. A missing handle degrades the
/// matching behavior (no focus move, no outside-click detection) and never
/// fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchElements {
    /// The button that opens the overlay and regains focus on close.
    pub trigger: Option<ElementId>,
    /// The text input that receives focus on open.
    pub input: Option<ElementId>,
    /// The overlay container; clicks inside it never dismiss.
    pub container: Option<ElementId>,
}

impl SearchElements {
    /// No elements bound.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trigger: None,
            input: None,
            container: None,
        }
    }

    /// Set the trigger button (builder).
    #[must_use]
    pub const fn trigger(mut self, id: ElementId) -> Self {
        self.trigger = Some(id);
        self
    }

    /// Set the text input (builder).
    #[must_use]
    pub const fn input(mut self, id: ElementId) -> Self {
        self.input = Some(id);
        self
    }

    /// Set the overlay container (builder).
    #[must_use]
    pub const fn container(mut self, id: ElementId) -> Self {
        self.container = Some(id);
        self
    }

    /// Trigger and container, if both are still attached to `document`.
    ///
    /// Outside-click detection needs both.
    #[must_use]
    pub fn dismiss_bounds(&self, document: &Document) -> Option<(ElementId, ElementId)> {
        let container = self.container.filter(|id| document.is_attached(*id))?;
        let trigger = self.trigger.filter(|id| document.is_attached(*id))?;
        Some((container, trigger))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_handles() {
        let doc = Document::new();
        let trigger = doc.create_element("trigger", None);
        let input = doc.create_element("input", None);
        let elements = SearchElements::new().trigger(trigger).input(input);
        assert_eq!(elements.trigger, Some(trigger));
        assert_eq!(elements.input, Some(input));
        assert_eq!(elements.container, None);
    }

    #[test]
    fn dismiss_bounds_need_both_attached() {
        let doc = Document::new();
        let trigger = doc.create_element("trigger", None);
        let container = doc.create_element("container", None);
        let elements = SearchElements::new().trigger(trigger).container(container);
        assert_eq!(elements.dismiss_bounds(&doc), Some((container, trigger)));
        assert_eq!(SearchElements::new().trigger(trigger).dismiss_bounds(&doc), None);
        doc.remove_element(container);
        assert_eq!(elements.dismiss_bounds(&doc), None);
    }
}
