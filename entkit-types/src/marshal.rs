//! Typed struct ↔ [`Record`] marshaling through explicit mapping tables.
//!
//! A type opts in by implementing [`Marshal`] and describing its wire shape
//! with a [`RecordMapping`]: one entry per field (wire name plus accessor
//! pair), an optional overflow map that absorbs unknown keys, and embedded
//! structs whose fields are flattened into the parent record.
//!
//! A mapping tree holds at most one overflow map, either on the type itself
//! or inside one embedded struct. Unknown keys could not be routed back to
//! the right map otherwise.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Contact {
//!     id: String,
//!     nickname: Option<String>,
//!     extra: Record,
//! }
//!
//! impl Marshal for Contact {
//!     fn mapping() -> RecordMapping<Self> {
//!         RecordMapping::<Self>::new()
//!             .field("id", |c| &c.id, |c| &mut c.id)
//!             .optional("nickname", |c| &c.nickname, |c| &mut c.nickname)
//!             .overflow(|c| &c.extra, |c| &mut c.extra)
//!     }
//! }
//! ```

use crate::{FromValue, IntoValue, MarshalResult, Record, Value};

/// A type with an explicit record mapping.
pub trait Marshal: Default + 'static {
    fn mapping() -> RecordMapping<Self>;
}

/// Describes how a type `T` maps onto a [`Record`].
pub struct RecordMapping<T> {
    fields: Vec<Box<dyn FieldSlot<T>>>,
    embedded: Vec<Box<dyn EmbeddedSlot<T>>>,
    overflow: Option<OverflowSlot<T>>,
}

struct OverflowSlot<T> {
    get: fn(&T) -> &Record,
    get_mut: fn(&mut T) -> &mut Record,
}

trait FieldSlot<T> {
    fn wire_name(&self) -> &str;
    fn write(&self, src: &T, out: &mut Record);
    fn read(&self, target: &mut T, value: Value) -> MarshalResult<()>;
}

trait EmbeddedSlot<T> {
    fn wire_names(&self) -> Vec<&str>;
    fn write(&self, src: &T, out: &mut Record);
    fn take(&self, target: &mut T, rest: &mut Record) -> MarshalResult<()>;
    fn has_overflow(&self) -> bool;
    fn overflow_mut<'a>(&self, target: &'a mut T) -> Option<&'a mut Record>;
}

struct Required<T, F> {
    name: String,
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T, F: IntoValue + FromValue> FieldSlot<T> for Required<T, F> {
    fn wire_name(&self) -> &str {
        &self.name
    }

    fn write(&self, src: &T, out: &mut Record) {
        out.insert(self.name.clone(), (self.get)(src).to_value());
    }

    fn read(&self, target: &mut T, value: Value) -> MarshalResult<()> {
        *(self.get_mut)(target) = F::from_value(value).map_err(|e| e.in_field(&self.name))?;
        Ok(())
    }
}

/// An `Option` field that is left out of the record entirely when `None`.
struct Omittable<T, F> {
    name: String,
    get: fn(&T) -> &Option<F>,
    get_mut: fn(&mut T) -> &mut Option<F>,
}

impl<T, F: IntoValue + FromValue> FieldSlot<T> for Omittable<T, F> {
    fn wire_name(&self) -> &str {
        &self.name
    }

    fn write(&self, src: &T, out: &mut Record) {
        if let Some(value) = (self.get)(src) {
            out.insert(self.name.clone(), value.to_value());
        }
    }

    fn read(&self, target: &mut T, value: Value) -> MarshalResult<()> {
        *(self.get_mut)(target) =
            Option::<F>::from_value(value).map_err(|e| e.in_field(&self.name))?;
        Ok(())
    }
}

struct Embedded<T, E> {
    get: fn(&T) -> &E,
    get_mut: fn(&mut T) -> &mut E,
    inner: RecordMapping<E>,
}

impl<T, E: 'static> EmbeddedSlot<T> for Embedded<T, E> {
    fn wire_names(&self) -> Vec<&str> {
        self.inner.wire_names()
    }

    fn write(&self, src: &T, out: &mut Record) {
        self.inner.write((self.get)(src), out);
    }

    fn take(&self, target: &mut T, rest: &mut Record) -> MarshalResult<()> {
        self.inner.take_declared((self.get_mut)(target), rest)
    }

    fn has_overflow(&self) -> bool {
        self.inner.has_overflow()
    }

    fn overflow_mut<'a>(&self, target: &'a mut T) -> Option<&'a mut Record> {
        self.inner.overflow_mut((self.get_mut)(target))
    }
}

impl<T: 'static> RecordMapping<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            embedded: Vec::new(),
            overflow: None,
        }
    }

    /// Maps a field under `wire_name`. An `Option` field mapped here is
    /// written as an explicit `Null` when empty.
    #[must_use]
    pub fn field<F>(
        mut self,
        wire_name: impl Into<String>,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self
    where
        F: IntoValue + FromValue + 'static,
    {
        self.fields.push(Box::new(Required {
            name: wire_name.into(),
            get,
            get_mut,
        }));
        self
    }

    /// Maps an `Option` field that is omitted from the record when `None`.
    #[must_use]
    pub fn optional<F>(
        mut self,
        wire_name: impl Into<String>,
        get: fn(&T) -> &Option<F>,
        get_mut: fn(&mut T) -> &mut Option<F>,
    ) -> Self
    where
        F: IntoValue + FromValue + 'static,
    {
        self.fields.push(Box::new(Omittable {
            name: wire_name.into(),
            get,
            get_mut,
        }));
        self
    }

    /// Flattens an embedded struct's fields into this record. An overflow
    /// map inside the embedded struct receives this record's unknown keys.
    ///
    /// # Panics
    ///
    /// Panics if both this mapping and the embedded one carry an overflow
    /// map.
    #[must_use]
    pub fn embed<E: Marshal>(mut self, get: fn(&T) -> &E, get_mut: fn(&mut T) -> &mut E) -> Self {
        let inner = E::mapping();
        assert!(
            !(self.has_overflow() && inner.has_overflow()),
            "record mapping declares more than one overflow map"
        );
        self.embedded.push(Box::new(Embedded {
            get,
            get_mut,
            inner,
        }));
        self
    }

    /// Designates the overflow map. Replaces any previous designation on
    /// this type.
    ///
    /// # Panics
    ///
    /// Panics if an embedded struct already carries an overflow map.
    #[must_use]
    pub fn overflow(mut self, get: fn(&T) -> &Record, get_mut: fn(&mut T) -> &mut Record) -> Self {
        assert!(
            !self.embedded.iter().any(|e| e.has_overflow()),
            "record mapping declares more than one overflow map"
        );
        self.overflow = Some(OverflowSlot { get, get_mut });
        self
    }
}

impl<T: 'static> Default for RecordMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordMapping<T> {
    /// Wire names of every declared field, embedded ones included.
    #[must_use]
    pub fn wire_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.iter().map(|f| f.wire_name()).collect();
        for embedded in &self.embedded {
            names.extend(embedded.wire_names());
        }
        names
    }

    /// True if this type or one of its embedded structs has an overflow map.
    #[must_use]
    pub fn has_overflow(&self) -> bool {
        self.overflow.is_some() || self.embedded.iter().any(|e| e.has_overflow())
    }

    fn write(&self, src: &T, out: &mut Record) {
        // Overflow first: a declared field always wins a key collision.
        if let Some(overflow) = &self.overflow {
            for (key, value) in (overflow.get)(src) {
                out.insert(key.clone(), value.clone());
            }
        }
        for embedded in &self.embedded {
            embedded.write(src, out);
        }
        for field in &self.fields {
            field.write(src, out);
        }
    }

    fn take_declared(&self, target: &mut T, rest: &mut Record) -> MarshalResult<()> {
        for field in &self.fields {
            if let Some(value) = rest.remove(field.wire_name()) {
                field.read(target, value)?;
            }
        }
        for embedded in &self.embedded {
            embedded.take(target, rest)?;
        }
        Ok(())
    }

    fn overflow_mut<'a>(&self, target: &'a mut T) -> Option<&'a mut Record> {
        if let Some(overflow) = &self.overflow {
            return Some((overflow.get_mut)(target));
        }
        self.embedded
            .iter()
            .find(|e| e.has_overflow())
            .and_then(|e| e.overflow_mut(target))
    }
}

/// Converts a typed value into its record form.
///
/// Overflow entries are flattened into the top level, omittable fields that
/// are `None` are skipped.
pub fn record_from_typed<T: Marshal>(src: &T) -> Record {
    let mut out = Record::new();
    T::mapping().write(src, &mut out);
    out
}

/// Builds a typed value from a record.
///
/// Keys matching a declared wire name are converted into the field's type.
/// Every other key goes to the overflow map if the mapping tree has one,
/// and is dropped otherwise.
pub fn typed_from_record<T: Marshal>(src: &Record) -> MarshalResult<T> {
    let mapping = T::mapping();
    let mut target = T::default();
    let mut rest = src.clone();
    mapping.take_declared(&mut target, &mut rest)?;
    if !rest.is_empty() {
        if let Some(overflow) = mapping.overflow_mut(&mut target) {
            overflow.extend(rest);
        }
    }
    Ok(target)
}

/// Lifts the map stored under `key` into the top level of `record`.
///
/// Existing top-level keys are kept. Returns `false` (and leaves the record
/// untouched) when `key` is absent or does not hold a map.
pub fn flatten_overflow(record: &mut Record, key: &str) -> bool {
    match record.remove(key) {
        Some(Value::Map(inner)) => {
            for (k, v) in inner {
                record.entry(k).or_insert(v);
            }
            true
        }
        Some(other) => {
            record.insert(key, other);
            false
        }
        None => false,
    }
}
