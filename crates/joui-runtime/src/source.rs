#![forbid(unsafe_code)]

//! Data sources: values a control can bind to.
//!
//! Anything implementing [`DataSource`] exposes a current value, accepts new
//! values, and announces changes through a [`Channel`]. Two concrete sources
//! are provided:
//!
//! - [`Property`]: a single value cell.
//! - [`Record`]: a keyed object whose fields can be bound one at a time
//!   through [`RecordProperty`].
//!
//! All provided sources skip the change notification when the new value
//! equals the stored one. Bidirectional bindings rely on that guard to stop
//! echoing updates back and forth.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::channel::{Channel, Subscription};

/// A bindable value with change notification.
pub trait DataSource {
    /// Current value.
    fn get_data(&self) -> Value;

    /// Replace the value. Implementations fire
    /// [`change_event`](Self::change_event) when it actually changed.
    fn set_data(&self, data: Value);

    /// Fired with the new value after every change.
    fn change_event(&self) -> &Channel<Value>;
}

/// Treat JavaScript-style falsy values as null.
///
/// `false`, `0`, `""` and `null` all collapse to [`Value::Null`]; anything
/// else is returned unchanged.
#[must_use]
pub fn or_null(value: Value) -> Value {
    let falsy = match &value {
        Value::Null => true,
        Value::Bool(b) => !*b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    if falsy { Value::Null } else { value }
}

// ---------------------------------------------------------------------------
// Property
// ---------------------------------------------------------------------------

/// A single observable value.
pub struct Property {
    value: RefCell<Value>,
    change_event: Channel<Value>,
}

impl Property {
    /// Create a property holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: RefCell::new(value.into()),
            change_event: Channel::new("property.change"),
        }
    }

    /// Create a shared property.
    pub fn shared(value: impl Into<Value>) -> Rc<Self> {
        Rc::new(Self::new(value))
    }
}

impl Default for Property {
    fn default() -> Self {
        Self::new(Value::Null)
    }
}

impl std::fmt::Debug for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.value.borrow())
            .finish()
    }
}

impl DataSource for Property {
    fn get_data(&self) -> Value {
        self.value.borrow().clone()
    }

    fn set_data(&self, data: Value) {
        if *self.value.borrow() == data {
            return;
        }
        *self.value.borrow_mut() = data.clone();
        self.change_event.fire(&data);
    }

    fn change_event(&self) -> &Channel<Value> {
        &self.change_event
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A keyed object.
///
/// As a [`DataSource`] the whole record reads and writes as a JSON object.
/// Individual fields are bound through [`Record::property`].
pub struct Record {
    fields: RefCell<Map<String, Value>>,
    change_event: Channel<Value>,
}

impl Record {
    /// Create a shared record from an object. Non-object values yield an
    /// empty record.
    pub fn new(fields: Value) -> Rc<Self> {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Rc::new(Self {
            fields: RefCell::new(fields),
            change_event: Channel::new("record.change"),
        })
    }

    /// Value of one field, [`Value::Null`] when absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Value {
        self.fields.borrow().get(key).cloned().unwrap_or(Value::Null)
    }

    /// Set one field, firing the record's change event when it changed.
    pub fn set(&self, key: &str, value: Value) {
        let snapshot = {
            let mut fields = self.fields.borrow_mut();
            if fields.get(key) == Some(&value) {
                return;
            }
            fields.insert(key.to_owned(), value);
            Value::Object(fields.clone())
        };
        tracing::trace!(key, "record field changed");
        self.change_event.fire(&snapshot);
    }

    /// A data source bound to a single field of this record.
    pub fn property(self: &Rc<Self>, key: impl Into<String>) -> Rc<RecordProperty> {
        RecordProperty::new(Rc::clone(self), key.into())
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("fields", &self.fields.borrow())
            .finish()
    }
}

impl DataSource for Record {
    fn get_data(&self) -> Value {
        Value::Object(self.fields.borrow().clone())
    }

    fn set_data(&self, data: Value) {
        let Value::Object(map) = data else {
            tracing::warn!("record data must be an object; ignoring");
            return;
        };
        {
            let mut fields = self.fields.borrow_mut();
            if *fields == map {
                return;
            }
            *fields = map.clone();
        }
        self.change_event.fire(&Value::Object(map));
    }

    fn change_event(&self) -> &Channel<Value> {
        &self.change_event
    }
}

/// One field of a [`Record`], usable as a standalone [`DataSource`].
///
/// Fires only when its own field changes, not when sibling fields do.
pub struct RecordProperty {
    record: Rc<Record>,
    key: String,
    change_event: Channel<Value>,
    _link: Subscription,
}

impl RecordProperty {
    fn new(record: Rc<Record>, key: String) -> Rc<Self> {
        let change_event = Channel::new(format!("record.{key}.change"));
        let last = Rc::new(RefCell::new(record.get(&key)));

        let out = change_event.clone();
        let field = key.clone();
        let link = record.change_event.subscribe(move |fields: &Value| {
            let current = fields.get(&field).cloned().unwrap_or(Value::Null);
            if *last.borrow() == current {
                return;
            }
            *last.borrow_mut() = current.clone();
            out.fire(&current);
        });

        Rc::new(Self {
            record,
            key,
            change_event,
            _link: link,
        })
    }

    /// Field name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Debug for RecordProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordProperty")
            .field("key", &self.key)
            .field("value", &self.record.get(&self.key))
            .finish()
    }
}

impl DataSource for RecordProperty {
    fn get_data(&self) -> Value {
        self.record.get(&self.key)
    }

    fn set_data(&self, data: Value) {
        self.record.set(&self.key, data);
    }

    fn change_event(&self) -> &Channel<Value> {
        &self.change_event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use tracing_test::traced_test;

    fn collect(ch: &Channel<Value>) -> (Rc<RefCell<Vec<Value>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let sub = ch.subscribe(move |v| l.borrow_mut().push(v.clone()));
        (log, sub)
    }

    #[test]
    fn or_null_collapses_falsy() {
        assert_eq!(or_null(json!(false)), Value::Null);
        assert_eq!(or_null(json!(0)), Value::Null);
        assert_eq!(or_null(json!(0.0)), Value::Null);
        assert_eq!(or_null(json!("")), Value::Null);
        assert_eq!(or_null(json!("hello")), json!("hello"));
        assert_eq!(or_null(json!(3)), json!(3));
        assert_eq!(or_null(json!([])), json!([]));
    }

    #[test]
    fn property_fires_on_change_only() {
        let p = Property::new("a");
        let (log, _sub) = collect(p.change_event());

        p.set_data(json!("a"));
        p.set_data(json!("b"));
        p.set_data(json!("b"));

        assert_eq!(*log.borrow(), vec![json!("b")]);
        assert_eq!(p.get_data(), json!("b"));
    }

    #[test]
    fn property_subscriber_can_read_new_value() {
        let p = Property::shared(1);
        let seen = Rc::new(RefCell::new(Value::Null));
        let (p2, s) = (Rc::clone(&p), Rc::clone(&seen));
        let _sub = p.change_event().subscribe(move |_| *s.borrow_mut() = p2.get_data());
        p.set_data(json!(2));
        assert_eq!(*seen.borrow(), json!(2));
    }

    #[test]
    fn record_field_roundtrip() {
        let r = Record::new(json!({ "name": "jo", "age": 3 }));
        assert_eq!(r.get("name"), json!("jo"));
        assert_eq!(r.get("missing"), Value::Null);

        let (log, _sub) = collect(r.change_event());
        r.set("age", json!(4));
        r.set("age", json!(4));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0]["age"], json!(4));
    }

    #[test]
    #[traced_test]
    fn record_set_data_requires_object() {
        let r = Record::new(json!({ "a": 1 }));
        r.set_data(json!("nope"));
        assert_eq!(r.get_data(), json!({ "a": 1 }));
        assert!(logs_contain("record data must be an object"));

        r.set_data(json!({ "b": 2 }));
        assert_eq!(r.get("a"), Value::Null);
        assert_eq!(r.get("b"), json!(2));
    }

    #[test]
    fn record_property_tracks_its_field() {
        let r = Record::new(json!({ "title": "one", "other": 0 }));
        let title = r.property("title");
        assert_eq!(title.key(), "title");
        assert_eq!(title.get_data(), json!("one"));

        let (log, _sub) = collect(title.change_event());
        r.set("other", json!(1));
        assert!(log.borrow().is_empty(), "sibling field change is ignored");

        r.set("title", json!("two"));
        title.set_data(json!("three"));
        assert_eq!(*log.borrow(), vec![json!("two"), json!("three")]);
        assert_eq!(r.get("title"), json!("three"));
    }

    #[test]
    fn dropped_record_property_unlinks() {
        let r = Record::new(json!({}));
        let before = r.change_event().subscriber_count();
        let p = r.property("x");
        assert_eq!(r.change_event().subscriber_count(), before + 1);
        drop(p);
        assert_eq!(r.change_event().subscriber_count(), before);
    }

    #[test]
    fn equality_guard_breaks_cycles() {
        let a = Property::shared(0);
        let b = Property::shared(0);
        let hops = Rc::new(Cell::new(0));

        let (b2, h) = (Rc::clone(&b), Rc::clone(&hops));
        let _ab = a.change_event().subscribe(move |v| {
            h.set(h.get() + 1);
            b2.set_data(v.clone());
        });
        let (a2, h) = (Rc::clone(&a), Rc::clone(&hops));
        let _ba = b.change_event().subscribe(move |v| {
            h.set(h.get() + 1);
            a2.set_data(v.clone());
        });

        a.set_data(json!(5));
        assert_eq!(b.get_data(), json!(5));
        assert_eq!(hops.get(), 2);
    }
}
