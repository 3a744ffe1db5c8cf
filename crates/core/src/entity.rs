//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog and grant records are replaced wholesale on mutation; the identifier
/// is the only thing that stays stable, so deduplication and grouping key on it.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
