//! Framework monikers - WHAT framework (identifier + version + profile).
//!
//! A moniker names a target framework/runtime combination and is the key of
//! the resolver's catalog cache. Equality is structural.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Well-known framework identifiers.
pub mod identifiers {
    /// The full desktop framework whose reference catalogs are installed
    /// on disk.
    pub const NET_FRAMEWORK: &str = ".NETFramework";

    /// Legacy core-profile identifier, kept for compatibility.
    pub const CORE_LEGACY: &str = "K";

    /// Compatibility identifier for the full web stack.
    pub const ASPNET: &str = "Asp.Net";

    /// Compatibility identifier for the core web stack.
    pub const ASPNETCORE: &str = "Asp.NetCore";

    /// The cross-platform execution environment.
    pub const DNX: &str = "DNX";

    /// The core-profile execution environment.
    pub const DNXCORE: &str = "DNXCore";
}

/// Error parsing a [`FrameworkVersion`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionParseError {
    #[error("framework version is empty")]
    Empty,

    #[error("framework version has {0} segments, expected 2 to 4")]
    SegmentCount(usize),

    #[error("invalid version segment `{0}`")]
    InvalidSegment(String),
}

/// A dotted numeric framework or assembly version of 2 to 4 segments.
///
/// Framework catalogs live under two-segment directories (`v4.5`) while
/// manifest assembly versions carry four segments (`4.0.0.0`), so this is
/// deliberately not a semver version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameworkVersion {
    /// Major version number.
    pub major: u32,

    /// Minor version number.
    pub minor: u32,

    /// Optional third segment.
    pub build: Option<u32>,

    /// Optional fourth segment.
    pub revision: Option<u32>,
}

impl FrameworkVersion {
    /// Create a two-segment version.
    pub fn new(major: u32, minor: u32) -> Self {
        FrameworkVersion {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    /// Create a three-segment version.
    pub fn with_build(major: u32, minor: u32, build: u32) -> Self {
        FrameworkVersion {
            major,
            minor,
            build: Some(build),
            revision: None,
        }
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
        }
        if let Some(revision) = self.revision {
            write!(f, ".{}", revision)?;
        }
        Ok(())
    }
}

impl FromStr for FrameworkVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let segments: Vec<&str> = s.split('.').collect();
        if !(2..=4).contains(&segments.len()) {
            return Err(VersionParseError::SegmentCount(segments.len()));
        }

        let parse = |segment: &str| {
            segment
                .parse::<u32>()
                .map_err(|_| VersionParseError::InvalidSegment(segment.to_string()))
        };

        Ok(FrameworkVersion {
            major: parse(segments[0])?,
            minor: parse(segments[1])?,
            build: segments.get(2).map(|s| parse(s)).transpose()?,
            revision: segments.get(3).map(|s| parse(s)).transpose()?,
        })
    }
}

/// A target framework moniker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameworkMoniker {
    /// Framework family identifier.
    pub identifier: String,

    /// Framework version.
    pub version: FrameworkVersion,

    /// Optional profile narrowing the catalog (e.g. a client profile).
    pub profile: Option<String>,
}

impl FrameworkMoniker {
    /// Create a moniker without a profile.
    pub fn new(identifier: impl Into<String>, version: FrameworkVersion) -> Self {
        FrameworkMoniker {
            identifier: identifier.into(),
            version,
            profile: None,
        }
    }

    /// Create a moniker with a profile.
    pub fn with_profile(
        identifier: impl Into<String>,
        version: FrameworkVersion,
        profile: impl Into<String>,
    ) -> Self {
        FrameworkMoniker {
            identifier: identifier.into(),
            version,
            profile: Some(profile.into()),
        }
    }

    /// Whether this moniker's identifier matches, ignoring ASCII case.
    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.identifier.eq_ignore_ascii_case(identifier)
    }
}

impl fmt::Display for FrameworkMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},Version=v{}", self.identifier, self.version)?;
        if let Some(profile) = &self.profile {
            write!(f, ",Profile={}", profile)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse_two_segments() {
        let v: FrameworkVersion = "4.5".parse().unwrap();
        assert_eq!(v, FrameworkVersion::new(4, 5));
        assert_eq!(v.to_string(), "4.5");
    }

    #[test]
    fn test_version_parse_four_segments() {
        let v: FrameworkVersion = "4.0.0.0".parse().unwrap();
        assert_eq!(v.build, Some(0));
        assert_eq!(v.revision, Some(0));
        assert_eq!(v.to_string(), "4.0.0.0");
    }

    #[test]
    fn test_version_parse_rejects_one_segment() {
        assert_eq!(
            "4".parse::<FrameworkVersion>(),
            Err(VersionParseError::SegmentCount(1))
        );
    }

    #[test]
    fn test_version_parse_rejects_garbage() {
        assert!(matches!(
            "4.x".parse::<FrameworkVersion>(),
            Err(VersionParseError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_version_ordering() {
        let v45: FrameworkVersion = "4.5".parse().unwrap();
        let v451: FrameworkVersion = "4.5.1".parse().unwrap();
        let v46: FrameworkVersion = "4.6".parse().unwrap();
        assert!(v45 < v451);
        assert!(v451 < v46);
    }

    #[test]
    fn test_moniker_display() {
        let m = FrameworkMoniker::new("MyFx", FrameworkVersion::new(5, 0));
        assert_eq!(m.to_string(), "MyFx,Version=v5.0");

        let m = FrameworkMoniker::with_profile(
            identifiers::NET_FRAMEWORK,
            FrameworkVersion::new(4, 0),
            "Client",
        );
        assert_eq!(m.to_string(), ".NETFramework,Version=v4.0,Profile=Client");
    }

    #[test]
    fn test_moniker_equality_is_structural() {
        let a = FrameworkMoniker::new("DNX", "4.5.1".parse().unwrap());
        let b = FrameworkMoniker::new("DNX", "4.5.1".parse().unwrap());
        assert_eq!(a, b);

        let c = FrameworkMoniker::with_profile("DNX", "4.5.1".parse().unwrap(), "Client");
        assert_ne!(a, c);
    }
}
