#![forbid(unsafe_code)]

//! Views: anything a stack can show.
//!
//! [`View`] is a small capability trait. A raw [`NodeId`] is a view, and so
//! is any wrapper that owns a node, such as [`ViewBase`] or
//! [`Control`](crate::Control). Lifecycle hooks default to no-ops.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use joui_core::{NodeId, Surface, SurfaceError, SurfaceHandle, create_styled};
use serde_json::Value;

/// Something with a surface node and optional lifecycle hooks.
pub trait View {
    /// The node to mount, or `None` when the view has nothing to show.
    fn as_surface_node(&self) -> Option<NodeId>;

    /// Called after the view becomes the stack's active entry.
    fn activate(&self) {}

    /// Called after the view is popped off a stack.
    fn deactivate(&self) {}

    /// Human-readable title.
    fn title(&self) -> Option<String> {
        None
    }
}

impl View for NodeId {
    fn as_surface_node(&self) -> Option<NodeId> {
        Some(*self)
    }
}

/// Whether two views are the same entry: the same object, or two handles to
/// the same node.
pub fn same_view(a: &Rc<dyn View>, b: &Rc<dyn View>) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    match (a.as_surface_node(), b.as_surface_node()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Render a data value as node text.
pub fn display_text(data: &Value) -> String {
    match data {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A node plus the data it displays.
///
/// The node is created on first use unless a style was supplied up front.
pub struct ViewBase {
    surface: SurfaceHandle,
    tag: String,
    container: Cell<Option<NodeId>>,
    data: RefCell<Value>,
    title: RefCell<Option<String>>,
}

impl ViewBase {
    /// A view whose node will be created with `tag`.
    pub fn new(surface: SurfaceHandle, tag: impl Into<String>) -> Self {
        Self {
            surface,
            tag: tag.into(),
            container: Cell::new(None),
            data: RefCell::new(Value::Null),
            title: RefCell::new(None),
        }
    }

    /// A view whose node is created immediately and styled.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] when `style` is not a class name or a flat
    /// property map.
    pub fn styled(
        surface: SurfaceHandle,
        tag: impl Into<String>,
        style: Option<&Value>,
    ) -> Result<Self, SurfaceError> {
        let view = Self::new(surface, tag);
        let node = create_styled(view.surface.as_ref(), &view.tag, style)?;
        view.container.set(Some(node));
        Ok(view)
    }

    /// The surface this view draws on.
    pub fn surface(&self) -> &dyn Surface {
        self.surface.as_ref()
    }

    /// Shared surface handle.
    pub fn surface_handle(&self) -> &SurfaceHandle {
        &self.surface
    }

    /// The view's node, created on first call.
    pub fn container(&self) -> NodeId {
        match self.container.get() {
            Some(node) => node,
            None => {
                let node = self.surface.create_element(&self.tag);
                self.container.set(Some(node));
                node
            }
        }
    }

    /// Current data.
    pub fn data(&self) -> Value {
        self.data.borrow().clone()
    }

    /// Store `data` and redraw. Returns whether the value changed.
    pub fn set_data(&self, data: Value) -> bool {
        let changed = *self.data.borrow() != data;
        *self.data.borrow_mut() = data;
        self.draw();
        changed
    }

    /// Store `data` without redrawing.
    pub fn store_data(&self, data: Value) {
        *self.data.borrow_mut() = data;
    }

    /// Write the current data into the node's content.
    pub fn draw(&self) {
        let text = display_text(&self.data.borrow());
        self.surface.set_content(self.container(), &text);
    }

    pub fn set_title(&self, title: Option<String>) {
        *self.title.borrow_mut() = title;
    }

    pub fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }
}

impl std::fmt::Debug for ViewBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewBase")
            .field("tag", &self.tag)
            .field("container", &self.container.get())
            .field("data", &self.data.borrow())
            .finish()
    }
}

impl View for ViewBase {
    fn as_surface_node(&self) -> Option<NodeId> {
        Some(self.container())
    }

    fn title(&self) -> Option<String> {
        ViewBase::title(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joui_core::HeadlessSurface;
    use serde_json::json;

    fn surface() -> (Rc<HeadlessSurface>, SurfaceHandle) {
        let s = Rc::new(HeadlessSurface::new());
        let h: SurfaceHandle = s.clone();
        (s, h)
    }

    #[test]
    fn container_is_created_once() {
        let (s, h) = surface();
        let v = ViewBase::new(h, "jocard");
        let a = v.container();
        let b = v.container();
        assert_eq!(a, b);
        assert_eq!(s.node_count(), 1);
        assert_eq!(s.tag(a).as_deref(), Some("jocard"));
    }

    #[test]
    fn set_data_draws_and_reports_change() {
        let (s, h) = surface();
        let v = ViewBase::new(h, "jotitle");
        assert!(v.set_data(json!("Inbox")));
        assert_eq!(s.content(v.container()), "Inbox");
        assert!(!v.set_data(json!("Inbox")));
        v.set_data(json!(12));
        assert_eq!(s.content(v.container()), "12");
    }

    #[test]
    fn styled_rejects_bad_style() {
        let (s, h) = surface();
        let err = ViewBase::styled(h, "jocard", Some(&json!([1]))).unwrap_err();
        assert_eq!(err, SurfaceError::UnrecognizedStyle { found: "array" });
        assert_eq!(s.node_count(), 0);
    }

    #[test]
    fn styled_applies_class() {
        let (s, h) = surface();
        let v = ViewBase::styled(h, "jocard", Some(&json!("wide"))).unwrap();
        assert!(s.has_class(v.container(), "wide"));
    }

    #[test]
    fn node_views_compare_by_node() {
        let a: Rc<dyn View> = Rc::new(NodeId::from_raw(1));
        let a2: Rc<dyn View> = Rc::new(NodeId::from_raw(1));
        let b: Rc<dyn View> = Rc::new(NodeId::from_raw(2));
        assert!(same_view(&a, &a));
        assert!(same_view(&a, &a2));
        assert!(!same_view(&a, &b));
    }

    #[test]
    fn display_text_forms() {
        assert_eq!(display_text(&Value::Null), "");
        assert_eq!(display_text(&json!("x")), "x");
        assert_eq!(display_text(&json!(true)), "true");
    }
}
