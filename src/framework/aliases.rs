//! Moniker alias tables.
//!
//! Two directionally distinct mappings. The search table narrows WHICH
//! catalog to look in: a virtual or compatibility moniker redirects to the
//! real monikers whose installed catalogs should be searched in order. The
//! runtime table broadens WHICH monikers a discovered catalog satisfies:
//! when the dynamic strategy finds a real framework folder, every listed
//! alias resolves to that same catalog.
//!
//! Both tables are immutable and injected at resolver construction, so
//! tests can substitute alternates without touching shared state.

use std::collections::HashMap;

use crate::framework::moniker::{identifiers, FrameworkMoniker, FrameworkVersion};

/// The alias tables consulted during framework resolution.
#[derive(Debug, Clone)]
pub struct AliasTables {
    /// Virtual/compat moniker -> real monikers to search, in order.
    pub search: HashMap<FrameworkMoniker, Vec<FrameworkMoniker>>,

    /// Discovered real moniker -> virtual monikers satisfied by its catalog.
    pub runtime: HashMap<FrameworkMoniker, Vec<FrameworkMoniker>>,
}

impl AliasTables {
    /// An empty table set (no aliasing at all).
    pub fn empty() -> Self {
        AliasTables {
            search: HashMap::new(),
            runtime: HashMap::new(),
        }
    }

    /// Real monikers to search for `moniker`, if it is aliased.
    pub fn search_targets(&self, moniker: &FrameworkMoniker) -> Option<&[FrameworkMoniker]> {
        self.search.get(moniker).map(Vec::as_slice)
    }

    /// Virtual monikers satisfied by a discovered `moniker`'s catalog.
    pub fn runtime_aliases(&self, moniker: &FrameworkMoniker) -> &[FrameworkMoniker] {
        self.runtime.get(moniker).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for AliasTables {
    fn default() -> Self {
        let net451 = FrameworkMoniker::new(
            identifiers::NET_FRAMEWORK,
            FrameworkVersion::with_build(4, 5, 1),
        );
        let dnx451 =
            FrameworkMoniker::new(identifiers::DNX, FrameworkVersion::with_build(4, 5, 1));
        let aspnet50 = FrameworkMoniker::new(identifiers::ASPNET, FrameworkVersion::new(5, 0));

        let mut search = HashMap::new();
        search.insert(aspnet50.clone(), vec![net451.clone()]);
        search.insert(dnx451.clone(), vec![net451.clone()]);

        let mut runtime = HashMap::new();
        runtime.insert(net451, vec![dnx451, aspnet50]);

        AliasTables { search, runtime }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_are_disjoint_in_purpose() {
        let tables = AliasTables::default();

        let aspnet50 = FrameworkMoniker::new(identifiers::ASPNET, FrameworkVersion::new(5, 0));
        let net451 = FrameworkMoniker::new(
            identifiers::NET_FRAMEWORK,
            FrameworkVersion::with_build(4, 5, 1),
        );

        // Virtual moniker redirects to the real catalog.
        let targets = tables.search_targets(&aspnet50).unwrap();
        assert_eq!(targets, &[net451.clone()]);

        // The real moniker broadens back to its virtual aliases.
        let aliases = tables.runtime_aliases(&net451);
        assert_eq!(aliases.len(), 2);
        assert!(aliases.contains(&aspnet50));

        // A real moniker is never itself search-aliased.
        assert!(tables.search_targets(&net451).is_none());
    }

    #[test]
    fn test_unaliased_moniker() {
        let tables = AliasTables::default();
        let other = FrameworkMoniker::new("MyFx", FrameworkVersion::new(5, 0));
        assert!(tables.search_targets(&other).is_none());
        assert!(tables.runtime_aliases(&other).is_empty());
    }
}
