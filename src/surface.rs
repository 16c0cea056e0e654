//! Patching getters and methods on a shared request surface.
//!
//! A `Surface` plays the role a prototype plays for a host object: a table
//! of named properties shared by every instance of a request type. Instances
//! read properties and call methods through it, so replacing a slot changes
//! the behavior of all of them at once.
//!
//! The two patch primitives keep a handle on the slot they replace, letting
//! the replacement fall back to native behavior. They have no memory of
//! earlier calls; applying one twice wraps twice. Callers that need
//! once-only patching track that with [`Surface::set_marker`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::value::Value;

/// A getter slot: computes a property value for an instance.
pub type Getter<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// A method slot: called with an instance and positional arguments.
pub type Method<T> = Arc<dyn Fn(&T, Vec<Value>) -> Value + Send + Sync>;

/// A named property on a `Surface`.
pub enum Property<T> {
    /// An accessor property.
    Getter(Getter<T>),
    /// A callable property.
    Method(Method<T>),
    /// A plain data property.
    Data(Value),
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        match self {
            Property::Getter(g) => Property::Getter(g.clone()),
            Property::Method(m) => Property::Method(m.clone()),
            Property::Data(v) => Property::Data(v.clone()),
        }
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Property::Getter(_) => f.write_str("Getter"),
            Property::Method(_) => f.write_str("Method"),
            Property::Data(v) => f.debug_tuple("Data").field(v).finish(),
        }
    }
}

/// A shared table of properties for instances of type `T`.
pub struct Surface<T> {
    properties: RwLock<HashMap<String, Property<T>>>,
    markers: RwLock<HashSet<String>>,
}

impl<T> Surface<T> {
    /// An empty surface.
    pub fn new() -> Surface<T> {
        Surface {
            properties: RwLock::new(HashMap::new()),
            markers: RwLock::new(HashSet::new()),
        }
    }

    /// Defines (or redefines) a property.
    pub fn define(&self, name: impl Into<String>, property: Property<T>) {
        self.properties
            .write()
            .unwrap()
            .insert(name.into(), property);
    }

    /// Defines a getter property.
    pub fn define_getter<F>(&self, name: impl Into<String>, getter: F)
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.define(name, Property::Getter(Arc::new(getter)));
    }

    /// Defines a method property.
    pub fn define_method<F>(&self, name: impl Into<String>, method: F)
    where
        F: Fn(&T, Vec<Value>) -> Value + Send + Sync + 'static,
    {
        self.define(name, Property::Method(Arc::new(method)));
    }

    /// Returns a copy of the named property.
    pub fn property(&self, name: &str) -> Option<Property<T>> {
        self.properties.read().unwrap().get(name).cloned()
    }

    /// Reads a getter property for `this`.
    ///
    /// # Errors
    ///
    /// Fails if the property is missing or is not a getter.
    pub fn get(&self, this: &T, name: &str) -> crate::Result<Value> {
        match self.property(name) {
            Some(Property::Getter(getter)) => Ok(getter(this)),
            _ => Err(crate::error::not_a_getter(name)),
        }
    }

    /// Calls a method property on `this`.
    ///
    /// # Errors
    ///
    /// Fails if the property is missing or is not a method.
    pub fn call(&self, this: &T, name: &str, args: Vec<Value>) -> crate::Result<Value> {
        match self.property(name) {
            Some(Property::Method(method)) => Ok(method(this, args)),
            _ => Err(crate::error::not_a_method(name)),
        }
    }

    /// Returns true if the named marker has been set.
    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.read().unwrap().contains(marker)
    }

    /// Sets the named marker. Returns false if it was already set.
    pub fn set_marker(&self, marker: &str) -> bool {
        self.markers.write().unwrap().insert(marker.to_owned())
    }
}

impl<T: 'static> Surface<T> {
    /// Replaces the getter `name`.
    ///
    /// The replacement receives the instance and a thunk that runs the
    /// original getter for that instance.
    ///
    /// # Errors
    ///
    /// Fails with a "not a getter" error if `name` is not a getter; the
    /// surface is left unchanged.
    pub fn patch_getter<F>(&self, name: &str, replacement: F) -> crate::Result<()>
    where
        F: Fn(&T, &dyn Fn() -> Value) -> Value + Send + Sync + 'static,
    {
        let mut properties = self.properties.write().unwrap();
        let original = match properties.get(name) {
            Some(Property::Getter(getter)) => getter.clone(),
            _ => return Err(crate::error::not_a_getter(name)),
        };

        let patched: Getter<T> = Arc::new(move |this: &T| {
            let native = || original(this);
            replacement(this, &native)
        });
        properties.insert(name.to_owned(), Property::Getter(patched));
        Ok(())
    }

    /// Replaces the method `name`.
    ///
    /// The replacement receives the instance, the original method, and the
    /// forwarded arguments. It decides whether to call the original.
    ///
    /// # Errors
    ///
    /// Fails with a "not a method" error if `name` is not a method; the
    /// surface is left unchanged.
    pub fn patch_method<F>(&self, name: &str, replacement: F) -> crate::Result<()>
    where
        F: Fn(&T, &Method<T>, Vec<Value>) -> Value + Send + Sync + 'static,
    {
        let mut properties = self.properties.write().unwrap();
        let original = match properties.get(name) {
            Some(Property::Method(method)) => method.clone(),
            _ => return Err(crate::error::not_a_method(name)),
        };

        let patched: Method<T> =
            Arc::new(move |this: &T, args: Vec<Value>| replacement(this, &original, args));
        properties.insert(name.to_owned(), Property::Method(patched));
        Ok(())
    }
}

impl<T> Default for Surface<T> {
    fn default() -> Self {
        Surface::new()
    }
}

impl<T> fmt::Debug for Surface<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let properties = self.properties.read().unwrap();
        let mut names: Vec<_> = properties.keys().collect();
        names.sort();
        f.debug_struct("Surface")
            .field("properties", &names)
            .field("markers", &*self.markers.read().unwrap())
            .finish()
    }
}
