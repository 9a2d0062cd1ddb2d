//! Process-wide registry of the last bound table per entity kind.
//!
//! The query hydration, replication and bulk-delete paths all construct
//! fresh entity instances without the original caller around to re-supply
//! the table name. They recover it from here instead, keyed by
//! [`EntityKind::NAME`](crate::entity::kind::EntityKind::NAME).
//!
//! Known limitation: the registry holds one slot per kind. Two tasks
//! concurrently binding the *same* kind to *different* tables overwrite
//! each other, and the loser's rebind resolves to the wrong table. Callers
//! are expected to keep one table per kind at a time; use distinct kinds
//! otherwise.

use std::{
    collections::HashMap,
    sync::{OnceLock, PoisonError, RwLock},
};

use tracing::debug;

use crate::{entity::kind::EntityKind, error::Error};

#[derive(Debug, Clone)]
pub(crate) struct LastBound {
    pub(crate) table: String,
    pub(crate) connection: Option<String>,
}

fn slots() -> &'static RwLock<HashMap<&'static str, LastBound>> {
    static SLOTS: OnceLock<RwLock<HashMap<&'static str, LastBound>>> = OnceLock::new();
    SLOTS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Record the table a kind was just bound to, overwriting any previous
/// entry for that kind.
pub(crate) fn record<K: EntityKind>(table: &str, connection: Option<&str>) {
    let mut slots = slots().write().unwrap_or_else(PoisonError::into_inner);

    if let Some(previous) = slots.get(K::NAME)
        && previous.table != table
    {
        debug!(
            kind = K::NAME,
            from = %previous.table,
            to = %table,
            "rebinding entity kind to a different table"
        );
    }

    slots.insert(
        K::NAME,
        LastBound {
            table: table.to_string(),
            connection: connection.map(ToString::to_string),
        },
    );
}

/// The table the kind was last bound to.
///
/// # Errors
///
/// [`Error::Unbound`] when no instance of the kind has been bound yet.
pub(crate) fn last_bound<K: EntityKind>() -> Result<LastBound, Error> {
    slots()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(K::NAME)
        .cloned()
        .ok_or(Error::Unbound(K::NAME))
}

#[cfg(test)]
mod test {
    use super::{last_bound, record};
    use crate::{entity::kind::EntityKind, error::Error};

    struct KindA;
    struct KindB;

    impl EntityKind for KindA {
        const NAME: &'static str = "registry_test_a";
    }

    impl EntityKind for KindB {
        const NAME: &'static str = "registry_test_b";
    }

    struct NeverBound;

    impl EntityKind for NeverBound {
        const NAME: &'static str = "registry_test_never_bound";
    }

    #[test]
    fn test_kinds_do_not_interfere() {
        record::<KindA>("widgets", None);
        record::<KindB>("tags", Some("analytics"));

        let a = last_bound::<KindA>().expect("KindA should be bound");
        assert_eq!(a.table, "widgets");
        assert_eq!(a.connection, None);

        let b = last_bound::<KindB>().expect("KindB should be bound");
        assert_eq!(b.table, "tags");
        assert_eq!(b.connection.as_deref(), Some("analytics"));
    }

    #[test]
    fn test_rebinding_overwrites() {
        struct Churn;

        impl EntityKind for Churn {
            const NAME: &'static str = "registry_test_churn";
        }

        record::<Churn>("first", None);
        record::<Churn>("second", None);

        assert_eq!(
            last_bound::<Churn>().expect("Churn should be bound").table,
            "second"
        );
    }

    #[test]
    fn test_unbound_kind_errors() {
        assert!(matches!(
            last_bound::<NeverBound>(),
            Err(Error::Unbound("registry_test_never_bound"))
        ));
    }
}
