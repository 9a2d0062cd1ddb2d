/// Identifies one dynamic entity subtype.
///
/// The binding registry remembers the last bound table per kind, so code
/// that keeps several independently bound dynamic entities alive in one
/// process gives each its own zero-sized marker type:
///
/// ```
/// use dyn_entity::entity::kind::EntityKind;
///
/// struct Imports;
///
/// impl EntityKind for Imports {
///     const NAME: &'static str = "imports";
/// }
/// ```
pub trait EntityKind: 'static {
    /// Registry key for this kind. Must be unique per kind within the
    /// process.
    const NAME: &'static str;
}

/// The kind used when callers don't declare their own.
pub struct DefaultKind;

impl EntityKind for DefaultKind {
    const NAME: &'static str = "default";
}
