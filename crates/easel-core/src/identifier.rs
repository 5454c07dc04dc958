//! Identifier management using string interning for efficient storage and comparison
//!
//! This module provides the interned [`Id`] type and the typed identifiers built on
//! top of it ([`ShapeId`], [`ConnectorId`], [`PointId`], ...). Typed identifiers keep
//! shape ids, connector ids and connection point ids from being mixed up at compile
//! time while sharing one cheap `Copy` representation.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for efficient identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<T>(f: impl FnOnce(&mut DefaultStringInterner) -> T) -> T {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Efficient identifier type using string interning
///
/// # Examples
///
/// ```
/// use easel_core::identifier::Id;
///
/// let shape = Id::new("3f2c9a1e-7b4d-4c1a-9e55-0d6f1b2a8c77");
/// let same = Id::new("3f2c9a1e-7b4d-4c1a-9e55-0d6f1b2a8c77");
/// assert_eq!(shape, same);
///
/// let generated = Id::from_anonymous(0);
/// assert_eq!(generated, "__0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Creates an internal `Id` from a counter value.
    ///
    /// Used for entities created on the canvas before the data-access layer
    /// assigns them a permanent identity.
    pub fn from_anonymous(idx: usize) -> Self {
        let name = format!("__{idx}");
        Self::new(&name)
    }

    /// Returns the interned string as an owned `String`.
    pub fn as_string(&self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_string()
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl std::str::FromStr for Id {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "string"`
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                == other
        })
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::new(&name))
    }
}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Id);

        impl $name {
            /// Creates the identifier from its string form.
            pub fn new(name: &str) -> Self {
                Self(Id::new(name))
            }

            /// Returns the untyped interned identifier.
            pub fn id(self) -> Id {
                self.0
            }
        }

        impl From<Id> for $name {
            fn from(id: Id) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self::new(name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

typed_id!(
    /// Stable identifier of a shape; never changes over the shape's lifetime.
    ShapeId
);
typed_id!(
    /// Identifier of a connector.
    ConnectorId
);
typed_id!(
    /// Identifier of a connection point, scoped to a shape kind (not globally unique).
    PointId
);
typed_id!(
    /// Identifier of a diagram; scopes command histories.
    DiagramId
);
typed_id!(
    /// Key of a connector tool in a diagram variant's catalog.
    ConnectorTypeId
);
typed_id!(
    /// Visibility group a shape may belong to.
    OverlayTag
);

/// A connection point on a specific shape.
///
/// Carried through the interaction pipeline as a structured pair rather than
/// an encoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    shape: ShapeId,
    point: PointId,
}

impl PortRef {
    pub fn new(shape: ShapeId, point: PointId) -> Self {
        Self { shape, point }
    }

    /// Returns the shape owning the point
    pub fn shape(self) -> ShapeId {
        self.shape
    }

    /// Returns the point id, scoped to the shape's kind
    pub fn point(self) -> PointId {
        self.point
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.shape, self.point)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_new() {
        let id1 = Id::new("Rectangle");
        let id2 = Id::new("Rectangle");
        let id3 = Id::new("Oval");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1, "Rectangle");
    }

    #[test]
    fn test_from_anonymous() {
        assert_ne!(Id::from_anonymous(0), Id::from_anonymous(1));
        assert_eq!(Id::from_anonymous(7), Id::from_anonymous(7));
    }

    #[test]
    fn test_display_trait() {
        let id = Id::new("display_test");
        assert_eq!(format!("{}", id), "display_test");
    }

    #[test]
    fn test_hash_and_eq() {
        let mut map = HashMap::new();
        map.insert(Id::new("key1"), "value1");
        map.insert(Id::new("key2"), "value2");

        assert_eq!(map.get(&Id::new("key1")), Some(&"value1"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_typed_ids_share_interned_strings() {
        let shape = ShapeId::new("a");
        let connector = ConnectorId::new("a");
        assert_eq!(shape.id(), connector.id());
        assert_eq!(shape, "a");
        assert_eq!(shape.to_string(), "a");
    }

    #[test]
    fn test_uuid_like_ids_round_trip_without_splitting() {
        let uuid = "0b9d6a55-1f7e-4c2d-9a3b-5e6f7a8b9c0d";
        let port = PortRef::new(ShapeId::new(uuid), PointId::new("right-3"));
        assert_eq!(port.shape(), uuid);
        assert_eq!(port.point(), "right-3");
        assert_eq!(port.to_string(), format!("{uuid}#right-3"));
    }
}
