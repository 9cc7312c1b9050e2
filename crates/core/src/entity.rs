//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Sections, items and history records are all entities: two values with the
/// same id are the same row even if their fields differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Position of the entity with `id` in `rows`, if present.
pub fn position_of<E: Entity>(rows: &[E], id: E::Id) -> Option<usize> {
    rows.iter().position(|row| row.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row(u32);

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn position_of_finds_rows_by_identity() {
        let rows = vec![Row(4), Row(9), Row(2)];
        assert_eq!(position_of(&rows, 9), Some(1));
        assert_eq!(position_of(&rows, 7), None);
    }
}
