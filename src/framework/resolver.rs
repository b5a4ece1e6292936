//! Framework reference resolution.
//!
//! Resolves a framework moniker to its catalog of assemblies, its path and
//! its display name. Catalogs are discovered by pluggable strategies tried
//! in a fixed order: the reference-catalog strategy reads a pre-installed
//! catalog tree described by redist manifests, while the runtime-layout
//! strategy enumerates the library folders of the running runtime itself.
//! Results - including misses - are memoized per moniker for the process
//! lifetime.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::framework::aliases::AliasTables;
use crate::framework::metadata::read_file_version;
use crate::framework::moniker::{identifiers, FrameworkMoniker, FrameworkVersion};
use crate::framework::redist;

/// Install-root variable consulted first (64-bit installs).
pub const REFERENCE_ROOT_ENV_X64: &str = "STEVEDORE_REFERENCE_ASSEMBLIES_X64";

/// Install-root variable consulted second.
pub const REFERENCE_ROOT_ENV: &str = "STEVEDORE_REFERENCE_ASSEMBLIES";

/// File extension of assembly libraries.
const ASSEMBLY_EXTENSION: &str = "dll";

/// Subdirectory holding facade assemblies, probed after the catalog root.
const FACADES_DIR: &str = "Facades";

/// Lazy probe state of an assembly entry field.
///
/// Once a field leaves `Unprobed` it is never recomputed; a miss is as
/// final as a hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// Not probed yet.
    Unprobed,
    /// Probed and found.
    Found(T),
    /// Probed and not found.
    Absent,
}

impl<T> Probe<T> {
    /// Whether this field has not been probed yet.
    pub fn is_unprobed(&self) -> bool {
        matches!(self, Probe::Unprobed)
    }

    /// The probed value, if one was found.
    pub fn found(&self) -> Option<&T> {
        match self {
            Probe::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// One assembly of a catalog.
#[derive(Debug, Clone)]
struct AssemblyEntry {
    path: Probe<PathBuf>,
    version: Probe<FrameworkVersion>,
}

impl AssemblyEntry {
    /// Entry declared by a manifest: no path yet, version only if declared.
    fn from_manifest(version: Option<FrameworkVersion>) -> Self {
        AssemblyEntry {
            path: Probe::Unprobed,
            version: match version {
                Some(v) => Probe::Found(v),
                None => Probe::Unprobed,
            },
        }
    }

    /// Entry discovered on disk: path known, version read lazily.
    fn at_path(path: PathBuf) -> Self {
        AssemblyEntry {
            path: Probe::Found(path),
            version: Probe::Unprobed,
        }
    }
}

/// A successful assembly lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAssembly {
    /// Resolved file path.
    pub path: PathBuf,

    /// Resolved version, when one is known.
    pub version: Option<FrameworkVersion>,
}

/// Cached catalog information for one framework moniker.
///
/// Shared read-only after discovery, except for the assembly map whose
/// entries complete lazily under the map's own lock. The lock is scoped to
/// this catalog so unrelated monikers resolve in parallel.
#[derive(Debug)]
pub struct FrameworkInformation {
    path: PathBuf,
    redist_path: Option<PathBuf>,
    name: Option<String>,
    assemblies: Mutex<HashMap<String, AssemblyEntry>>,
}

impl FrameworkInformation {
    /// The catalog's assembly directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the catalog's redist list, if it has one.
    pub fn redist_path(&self) -> Option<&Path> {
        self.redist_path.as_deref()
    }

    /// Display name declared by the catalog's manifest.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Look up an assembly, lazily completing its path and version.
    ///
    /// Only assemblies the catalog declares are candidates; an unknown name
    /// is never probed. Completion happens at most once per entry.
    pub fn lookup(&self, assembly_name: &str) -> Option<ResolvedAssembly> {
        let mut assemblies = self.assemblies.lock().unwrap();
        let entry = assemblies.get_mut(assembly_name)?;

        if entry.path.is_unprobed() {
            entry.path = match probe_assembly_path(&self.path, assembly_name) {
                Some(path) => Probe::Found(path),
                None => Probe::Absent,
            };
        }

        let path = entry.path.found()?.clone();

        if entry.version.is_unprobed() {
            entry.version = match read_file_version(&path) {
                Ok(Some(version)) => Probe::Found(version),
                Ok(None) => Probe::Absent,
                Err(e) => {
                    tracing::debug!(
                        "failed to read version from {}: {}",
                        path.display(),
                        e
                    );
                    Probe::Absent
                }
            };
        }

        Some(ResolvedAssembly {
            path,
            version: entry.version.found().copied(),
        })
    }
}

/// Probe a catalog directory, then its facades, for an assembly file.
fn probe_assembly_path(catalog_dir: &Path, assembly_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.{}", assembly_name, ASSEMBLY_EXTENSION);

    let direct = catalog_dir.join(&file_name);
    if direct.is_file() {
        return Some(direct);
    }

    let facade = catalog_dir.join(FACADES_DIR).join(&file_name);
    if facade.is_file() {
        return Some(facade);
    }

    None
}

/// A way of discovering the catalog for a moniker.
///
/// Strategies are tried in the order the resolver was constructed with;
/// the first hit wins.
pub trait DiscoveryStrategy: Send + Sync {
    /// Discover the catalog for `moniker`, or `None` if this strategy
    /// cannot satisfy it.
    fn discover(&self, moniker: &FrameworkMoniker) -> Option<Arc<FrameworkInformation>>;
}

/// Discovers catalogs in a pre-installed reference-assembly tree.
///
/// The tree root comes from the environment ([`REFERENCE_ROOT_ENV_X64`]
/// first, then [`REFERENCE_ROOT_ENV`]); without either, every discovery
/// fails. Catalogs live at `root/{identifier}/v{version}` with an optional
/// `Profile/{profile}` suffix and are described by their redist list.
pub struct ReferenceCatalogStrategy {
    root: Option<PathBuf>,
    aliases: AliasTables,
}

impl ReferenceCatalogStrategy {
    /// Root the strategy from the environment.
    pub fn from_env(aliases: AliasTables) -> Self {
        let root = env::var_os(REFERENCE_ROOT_ENV_X64)
            .filter(|v| !v.is_empty())
            .or_else(|| env::var_os(REFERENCE_ROOT_ENV).filter(|v| !v.is_empty()))
            .map(PathBuf::from);

        ReferenceCatalogStrategy { root, aliases }
    }

    /// Root the strategy at an explicit directory.
    pub fn with_root(root: PathBuf, aliases: AliasTables) -> Self {
        ReferenceCatalogStrategy {
            root: Some(root),
            aliases,
        }
    }

    fn discover_direct(&self, moniker: &FrameworkMoniker) -> Option<Arc<FrameworkInformation>> {
        let root = self.root.as_ref()?;

        let mut catalog_dir = root
            .join(&moniker.identifier)
            .join(format!("v{}", moniker.version));
        if let Some(profile) = &moniker.profile {
            catalog_dir = catalog_dir.join("Profile").join(profile);
        }

        if !catalog_dir.is_dir() {
            return None;
        }

        let (redist_path, list) = match redist::load(&catalog_dir) {
            Ok(Some((path, list))) => (Some(path), list),
            Ok(None) => (None, redist::RedistList::default()),
            Err(e) => {
                tracing::debug!(
                    "unusable redist list under {}: {:#}",
                    catalog_dir.display(),
                    e
                );
                return None;
            }
        };

        let assemblies = list
            .assemblies
            .into_iter()
            .map(|a| (a.name, AssemblyEntry::from_manifest(a.version)))
            .collect();

        Some(Arc::new(FrameworkInformation {
            path: catalog_dir,
            redist_path,
            name: list.name,
            assemblies: Mutex::new(assemblies),
        }))
    }
}

impl DiscoveryStrategy for ReferenceCatalogStrategy {
    fn discover(&self, moniker: &FrameworkMoniker) -> Option<Arc<FrameworkInformation>> {
        self.root.as_ref()?;

        // A search-aliased moniker is only satisfied through its targets,
        // never by a catalog under its own identifier.
        if let Some(targets) = self.aliases.search_targets(moniker) {
            return targets.iter().find_map(|t| self.discover_direct(t));
        }

        self.discover_direct(moniker)
    }
}

/// Version labels supported by the runtime-layout strategy, with the
/// physical folder each resolves to. Point releases share one folder.
const SUPPORTED_VERSIONS: [(FrameworkVersion, &str); 5] = [
    (
        FrameworkVersion {
            major: 4,
            minor: 6,
            build: None,
            revision: None,
        },
        "4.5",
    ),
    (
        FrameworkVersion {
            major: 4,
            minor: 5,
            build: Some(3),
            revision: None,
        },
        "4.5",
    ),
    (
        FrameworkVersion {
            major: 4,
            minor: 5,
            build: Some(1),
            revision: None,
        },
        "4.5",
    ),
    (
        FrameworkVersion {
            major: 4,
            minor: 5,
            build: None,
            revision: None,
        },
        "4.5",
    ),
    (
        FrameworkVersion {
            major: 4,
            minor: 0,
            build: None,
            revision: None,
        },
        "4.0",
    ),
];

/// Discovers catalogs relative to a running runtime's own library layout.
///
/// Used when executing under an alternate runtime implementation that ships
/// its framework libraries beside itself instead of installing reference
/// catalogs. Catalogs carry no manifest; assemblies are enumerated from the
/// folder and its facades, and versions are read from the files lazily.
/// Distinct version labels mapping to one physical folder share a single
/// catalog instance.
pub struct RuntimeLayoutStrategy {
    lib_dir: PathBuf,
    aliases: AliasTables,
    folders: Mutex<HashMap<PathBuf, Arc<FrameworkInformation>>>,
}

impl RuntimeLayoutStrategy {
    /// Create a strategy over an explicit library directory.
    pub fn new(lib_dir: PathBuf, aliases: AliasTables) -> Self {
        RuntimeLayoutStrategy {
            lib_dir,
            aliases,
            folders: Mutex::new(HashMap::new()),
        }
    }

    /// Derive the library directory from the location of a well-known
    /// always-loaded library: the layout places version folders two levels
    /// above it.
    pub fn from_anchor(anchor_assembly: &Path, aliases: AliasTables) -> Option<Self> {
        let lib_dir = anchor_assembly.parent()?.parent()?.to_path_buf();
        Some(RuntimeLayoutStrategy::new(lib_dir, aliases))
    }

    /// The real framework moniker this strategy would satisfy `moniker`
    /// with, if any.
    fn real_moniker_for(&self, moniker: &FrameworkMoniker) -> Option<FrameworkMoniker> {
        if moniker.profile.is_none()
            && moniker.has_identifier(identifiers::NET_FRAMEWORK)
            && SUPPORTED_VERSIONS.iter().any(|(v, _)| *v == moniker.version)
        {
            return Some(moniker.clone());
        }

        // A virtual moniker resolves to whichever discovered real moniker
        // lists it as a runtime alias.
        self.aliases
            .runtime
            .iter()
            .find(|(_, virtuals)| virtuals.contains(moniker))
            .map(|(real, _)| real.clone())
    }

    /// Get or build the shared catalog for a physical folder.
    fn catalog_for_folder(&self, folder: PathBuf) -> Option<Arc<FrameworkInformation>> {
        if !folder.is_dir() {
            return None;
        }

        let mut folders = self.folders.lock().unwrap();
        if let Some(info) = folders.get(&folder) {
            return Some(info.clone());
        }

        let mut assemblies = HashMap::new();
        collect_assemblies(&folder, &mut assemblies);
        collect_assemblies(&folder.join(FACADES_DIR), &mut assemblies);

        let info = Arc::new(FrameworkInformation {
            path: folder.clone(),
            redist_path: None,
            name: None,
            assemblies: Mutex::new(assemblies),
        });
        folders.insert(folder, info.clone());
        Some(info)
    }
}

impl DiscoveryStrategy for RuntimeLayoutStrategy {
    fn discover(&self, moniker: &FrameworkMoniker) -> Option<Arc<FrameworkInformation>> {
        let real = self.real_moniker_for(moniker)?;
        let folder_name = SUPPORTED_VERSIONS
            .iter()
            .find(|(v, _)| *v == real.version)
            .map(|(_, folder)| folder)?;

        self.catalog_for_folder(self.lib_dir.join(folder_name))
    }
}

/// Enumerate assembly files directly inside `dir` into the map.
fn collect_assemblies(dir: &Path, assemblies: &mut HashMap<String, AssemblyEntry>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_assembly = path
            .extension()
            .map_or(false, |e| e.eq_ignore_ascii_case(ASSEMBLY_EXTENSION));
        if !is_assembly || !path.is_file() {
            continue;
        }

        let name = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => continue,
        };
        assemblies.insert(name, AssemblyEntry::at_path(path));
    }
}

/// Resolves framework monikers to catalogs, memoizing every outcome.
pub struct FrameworkResolver {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
    cache: RwLock<HashMap<FrameworkMoniker, Option<Arc<FrameworkInformation>>>>,
}

impl FrameworkResolver {
    /// Resolver over the environment-rooted reference catalogs with the
    /// default alias tables.
    pub fn new() -> Self {
        FrameworkResolver::with_strategies(vec![Box::new(ReferenceCatalogStrategy::from_env(
            AliasTables::default(),
        ))])
    }

    /// Resolver over explicit strategies, tried in order.
    pub fn with_strategies(strategies: Vec<Box<dyn DiscoveryStrategy>>) -> Self {
        FrameworkResolver {
            strategies,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a moniker to its catalog.
    ///
    /// Misses are memoized too: an unsupported moniker costs one discovery
    /// attempt for the process lifetime.
    pub fn resolve(&self, moniker: &FrameworkMoniker) -> Option<Arc<FrameworkInformation>> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(cached) = cache.get(moniker) {
                return cached.clone();
            }
        }

        let mut cache = self.cache.write().unwrap();

        // Double-check after acquiring the write lock.
        if let Some(cached) = cache.get(moniker) {
            return cached.clone();
        }

        let discovered = self
            .strategies
            .iter()
            .find_map(|strategy| strategy.discover(moniker));

        if discovered.is_none() {
            tracing::debug!("no catalog for {}", moniker);
        }

        cache.insert(moniker.clone(), discovered.clone());
        discovered
    }

    /// Look up a named assembly for a moniker.
    pub fn lookup_assembly(
        &self,
        moniker: &FrameworkMoniker,
        assembly_name: &str,
    ) -> Option<ResolvedAssembly> {
        self.resolve(moniker)?.lookup(assembly_name)
    }

    /// The catalog's assembly directory.
    pub fn framework_path(&self, moniker: &FrameworkMoniker) -> Option<PathBuf> {
        self.resolve(moniker).map(|info| info.path().to_path_buf())
    }

    /// Path of the catalog's redist list, if it has one.
    pub fn redist_list_path(&self, moniker: &FrameworkMoniker) -> Option<PathBuf> {
        self.resolve(moniker)?
            .redist_path()
            .map(Path::to_path_buf)
    }

    /// A human-readable name for a moniker.
    ///
    /// A few identifiers have no installed catalog to carry a name, so
    /// theirs are fixed here; everything else prefers the manifest-declared
    /// name and falls back to the moniker's own string form.
    pub fn friendly_name(&self, moniker: &FrameworkMoniker) -> String {
        if moniker.has_identifier(identifiers::CORE_LEGACY) {
            return ".NET Core Framework 4.5".to_string();
        }
        if moniker.has_identifier(identifiers::ASPNETCORE) {
            return "ASP.NET Core 5.0".to_string();
        }
        if moniker.has_identifier(identifiers::ASPNET) {
            return "ASP.NET 5.0".to_string();
        }
        if moniker.has_identifier(identifiers::DNXCORE) {
            return "DNX Core 5.0".to_string();
        }
        if moniker.has_identifier(identifiers::DNX) {
            return format!("DNX {}", moniker.version);
        }

        match self.resolve(moniker) {
            Some(info) => info
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| moniker.to_string()),
            None => moniker.to_string(),
        }
    }
}

impl Default for FrameworkResolver {
    fn default() -> Self {
        FrameworkResolver::new()
    }
}
