/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Dynamic values browsed by the viewer.
//!
//! Scalars are held inline. Composites live behind `Rc` with interior
//! mutability, so one allocation can be reachable from several
//! parents (shared references) or from itself (cycles). Every
//! composite has an [`Identity`]: the address of its allocation.
//! Clones share identity; separately built but structurally equal
//! composites do not.
//!
//! `Debug` output is shallow: composites print their kind and length,
//! never their children, so cyclic values can be logged safely.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::rc::Weak;

use indexmap::IndexMap;

use crate::error::SerializeError;
use crate::path::PathSegment;

/// A `(key, child)` pair yielded by a collection's child accessor.
pub type Entry = (PathSegment, Value);

/// Ordered items of an array or set.
pub type List = RefCell<Vec<Value>>;

/// Ordered key/value pairs of a map.
pub type Pairs = RefCell<Vec<(Value, Value)>>;

/// Source text and optional name of a function value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: Option<String>,
    pub source: String,
}

/// A symbol. Each allocation is a distinct symbol, even when two share
/// a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub description: Option<String>,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "Symbol({desc})"),
            None => f.write_str("Symbol()"),
        }
    }
}

/// An object with insertion-ordered properties.
///
/// `type_name` is `None` for plain objects and names the custom type
/// otherwise.
#[derive(Default)]
pub struct Object {
    pub type_name: Option<String>,
    pub properties: RefCell<IndexMap<String, Value>>,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("len", &self.properties.borrow().len())
            .finish()
    }
}

/// Caller-defined composite types.
///
/// Host values are classified as custom-typed objects unless an
/// extension claims them.
pub trait HostValue: fmt::Debug {
    /// Name shown as the type label.
    fn type_name(&self) -> &str;

    /// Children shown when no extension claims the value.
    fn entries(&self) -> Vec<Entry> {
        Vec::new()
    }

    /// Strict JSON form, if the type has one.
    fn to_json(&self) -> Option<serde_json::Value> {
        None
    }

    /// Downcasting hook for extension predicates.
    fn as_any(&self) -> &dyn Any;
}

/// A dynamically typed value.
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(Rc<str>),
    Symbol(Rc<Symbol>),
    Function(Rc<Function>),
    Array(Rc<List>),
    Object(Rc<Object>),
    Set(Rc<List>),
    Map(Rc<Pairs>),
    Host(Rc<dyn HostValue>),
}

/// Reference identity of a composite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(usize);

/// A non-owning handle on a composite's allocation.
#[derive(Clone)]
pub struct WeakAnchor(WeakInner);

#[derive(Clone)]
enum WeakInner {
    List(Weak<List>),
    Object(Weak<Object>),
    Pairs(Weak<Pairs>),
    Host(Weak<dyn HostValue>),
}

impl WeakAnchor {
    /// Whether the anchored value still has owners.
    pub fn is_alive(&self) -> bool {
        match &self.0 {
            WeakInner::List(w) => w.strong_count() > 0,
            WeakInner::Object(w) => w.strong_count() > 0,
            WeakInner::Pairs(w) => w.strong_count() > 0,
            WeakInner::Host(w) => w.strong_count() > 0,
        }
    }
}

impl fmt::Debug for WeakAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakAnchor")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// A plain object.
    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(Rc::new(Object {
            type_name: None,
            properties: RefCell::new(properties.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }))
    }

    /// An object of a custom type.
    pub fn instance<K: Into<String>>(
        type_name: impl Into<String>,
        properties: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Value::Object(Rc::new(Object {
            type_name: Some(type_name.into()),
            properties: RefCell::new(properties.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }))
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    pub fn map(pairs: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Map(Rc::new(RefCell::new(pairs.into_iter().collect())))
    }

    pub fn function(name: Option<&str>, source: impl Into<String>) -> Self {
        Value::Function(Rc::new(Function {
            name: name.map(str::to_string),
            source: source.into(),
        }))
    }

    pub fn symbol(description: Option<&str>) -> Self {
        Value::Symbol(Rc::new(Symbol {
            description: description.map(str::to_string),
        }))
    }

    pub fn host(value: impl HostValue + 'static) -> Self {
        Value::Host(Rc::new(value))
    }

    /// Append to an array or set. Returns `false` for other values.
    pub fn push(&self, item: Value) -> bool {
        match self {
            Value::Array(items) | Value::Set(items) => {
                items.borrow_mut().push(item);
                true
            }
            _ => false,
        }
    }

    /// Insert or replace an object property. Returns `false` for
    /// non-objects.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> bool {
        match self {
            Value::Object(obj) => {
                obj.properties.borrow_mut().insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Append a map entry. Returns `false` for non-maps.
    pub fn insert_entry(&self, key: Value, value: Value) -> bool {
        match self {
            Value::Map(pairs) => {
                pairs.borrow_mut().push((key, value));
                true
            }
            _ => false,
        }
    }

    pub fn is_composite(&self) -> bool {
        self.identity().is_some()
    }

    /// Reference identity for composites, `None` for scalars.
    pub fn identity(&self) -> Option<Identity> {
        let ptr: *const () = match self {
            Value::Array(rc) | Value::Set(rc) => Rc::as_ptr(rc) as *const (),
            Value::Object(rc) => Rc::as_ptr(rc) as *const (),
            Value::Map(rc) => Rc::as_ptr(rc) as *const (),
            Value::Host(rc) => Rc::as_ptr(rc) as *const (),
            _ => return None,
        };
        Some(Identity(ptr as usize))
    }

    /// Weak handle on a composite, `None` for scalars.
    pub fn downgrade(&self) -> Option<WeakAnchor> {
        let inner = match self {
            Value::Array(rc) | Value::Set(rc) => WeakInner::List(Rc::downgrade(rc)),
            Value::Object(rc) => WeakInner::Object(Rc::downgrade(rc)),
            Value::Map(rc) => WeakInner::Pairs(Rc::downgrade(rc)),
            Value::Host(rc) => WeakInner::Host(Rc::downgrade(rc)),
            _ => return None,
        };
        Some(WeakAnchor(inner))
    }

    /// Same-value comparison: identity for composites, functions and
    /// symbols; bitwise for numbers (so `NaN` equals itself); by
    /// content for other scalars.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.to_bits() == b.to_bits(),
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (a, b) => match (a.identity(), b.identity()) {
                (Some(x), Some(y)) => {
                    x == y && std::mem::discriminant(a) == std::mem::discriminant(b)
                }
                _ => false,
            },
        }
    }

    /// Number of direct items for arrays, objects, sets and maps.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(items) | Value::Set(items) => Some(items.borrow().len()),
            Value::Object(obj) => Some(obj.properties.borrow().len()),
            Value::Map(pairs) => Some(pairs.borrow().len()),
            _ => None,
        }
    }

    /// The value's `typeof` name.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::Null
            | Value::Array(_)
            | Value::Object(_)
            | Value::Set(_)
            | Value::Map(_)
            | Value::Host(_) => "object",
        }
    }

    /// Custom type name of an object or host value.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Object(obj) => obj.type_name.as_deref(),
            Value::Host(host) => Some(host.type_name()),
            Value::Set(_) => Some("Set"),
            Value::Map(_) => Some("Map"),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_host<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Host(host) => host.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// String conversion used for non-string map keys.
    pub fn key_text(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_text(*n),
            Value::BigInt(n) => n.to_string(),
            Value::String(s) => s.to_string(),
            Value::Symbol(sym) => sym.to_string(),
            Value::Function(f) => f.source.clone(),
            Value::Array(_) | Value::Set(_) | Value::Map(_) | Value::Object(_) | Value::Host(_) => {
                format!("[object {}]", self.type_name().unwrap_or("Object"))
            }
        }
    }

    /// Strict JSON serialization.
    ///
    /// `Ok(None)` means the value has no JSON text at all (a top-level
    /// undefined, function or symbol).
    pub fn to_json(&self) -> Result<Option<serde_json::Value>, SerializeError> {
        let mut ancestors = Vec::new();
        self.to_json_inner(&mut ancestors)
    }

    /// Whether [`Value::to_json`] succeeds.
    pub fn is_json_safe(&self) -> bool {
        self.to_json().is_ok()
    }

    fn to_json_inner(
        &self,
        ancestors: &mut Vec<Identity>,
    ) -> Result<Option<serde_json::Value>, SerializeError> {
        use serde_json::Value as Json;

        let json = match self {
            Value::Undefined | Value::Function(_) | Value::Symbol(_) => return Ok(None),
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_json(*n),
            Value::BigInt(_) => return Err(SerializeError::BigInt),
            Value::String(s) => Json::String(s.to_string()),
            composite => {
                let Some(id) = composite.identity() else {
                    return Ok(None);
                };
                if ancestors.contains(&id) {
                    return Err(SerializeError::Cycle);
                }
                ancestors.push(id);
                let result = composite.composite_json(ancestors);
                ancestors.pop();
                result?
            }
        };
        Ok(Some(json))
    }

    fn composite_json(
        &self,
        ancestors: &mut Vec<Identity>,
    ) -> Result<serde_json::Value, SerializeError> {
        use serde_json::Value as Json;

        match self {
            Value::Array(items) => {
                let items = items.borrow();
                let mut out = Vec::with_capacity(items.len());
                for item in items.iter() {
                    out.push(item.to_json_inner(ancestors)?.unwrap_or(Json::Null));
                }
                Ok(Json::Array(out))
            }
            Value::Object(obj) => {
                let properties = obj.properties.borrow();
                let mut out = serde_json::Map::new();
                for (key, value) in properties.iter() {
                    if let Some(json) = value.to_json_inner(ancestors)? {
                        out.insert(key.clone(), json);
                    }
                }
                Ok(Json::Object(out))
            }
            Value::Set(_) | Value::Map(_) => Ok(Json::Object(serde_json::Map::new())),
            Value::Host(host) => host
                .to_json()
                .ok_or_else(|| SerializeError::Opaque(host.type_name().to_string())),
            _ => Ok(Json::Null),
        }
    }
}

/// Display text of a number the way script engines print it.
pub(crate) fn number_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

fn number_json(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::BigInt(n) => write!(f, "BigInt({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Symbol(sym) => write!(f, "{sym}"),
            Value::Function(func) => write!(f, "Function({:?})", func.name),
            Value::Array(items) => write!(f, "Array(len={})", items.borrow().len()),
            Value::Object(obj) => write!(
                f,
                "Object({}, len={})",
                obj.type_name.as_deref().unwrap_or("plain"),
                obj.properties.borrow().len()
            ),
            Value::Set(items) => write!(f, "Set(len={})", items.borrow().len()),
            Value::Map(pairs) => write!(f, "Map(len={})", pairs.borrow().len()),
            Value::Host(host) => write!(f, "Host({})", host.type_name()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::string(s),
            Json::Array(items) => Value::array(items.into_iter().map(Value::from)),
            Json::Object(map) => Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v)))),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}
