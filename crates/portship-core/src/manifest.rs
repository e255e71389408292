//! Port manifest and build-recipe generation.
//!
//! The manifest (`vcpkg.json`) is a serde document written into the
//! source checkout; the recipe (`portfile.cmake`) is rendered text whose
//! only Rust-side interpolation is the content hash -- vcpkg substitutes
//! `${VERSION}` from the manifest at build time.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::domain::error::Result;
use crate::domain::release::{ContentHash, ReleaseTag};

/// Static identity of the port being published.
#[derive(Debug, Clone)]
pub struct PortDefinition {
    /// Port name in the vcpkg registry.
    pub name: String,

    /// GitHub `owner/name` slug of the packaged library.
    pub repo: String,

    pub description: String,
    pub homepage: String,
    pub license: String,

    /// vcpkg platform-support expression.
    pub supports: String,

    /// Port dependencies (plain library names).
    pub dependencies: Vec<String>,

    /// Host-only build-tool dependencies.
    pub host_dependencies: Vec<String>,

    /// Branch vcpkg falls back to for HEAD builds.
    pub head_ref: String,

    /// License file installed as the port's copyright.
    pub license_file: String,
}

impl PortDefinition {
    /// The port this tool ships: the quayside C++ library.
    pub fn quayside() -> Self {
        Self {
            name: "quayside".to_string(),
            repo: "stevedores-org/quayside".to_string(),
            description: "A C++ realtime messaging gateway library built on asynchronous coroutines."
                .to_string(),
            homepage: "https://docs.stevedores.org/quayside".to_string(),
            license: "Apache-2.0".to_string(),
            supports: "(windows & x64 & !xbox) | (linux & x64)".to_string(),
            dependencies: vec![
                "fmt".to_string(),
                "openssl".to_string(),
                "zlib".to_string(),
            ],
            host_dependencies: vec![
                "vcpkg-cmake".to_string(),
                "vcpkg-cmake-config".to_string(),
            ],
            head_ref: "main".to_string(),
            license_file: "LICENSE".to_string(),
        }
    }

    /// Registry version-bucket directory for this port (`q-` for
    /// quayside).
    pub fn version_bucket(&self) -> String {
        let first = self.name.chars().next().unwrap_or('_');
        format!("{first}-")
    }
}

/// One entry of the manifest's `dependencies` array.
///
/// vcpkg mixes bare strings and `{ "name": ..., "host": true }` objects
/// in the same array; `untagged` reproduces that shape.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
enum ManifestDependency {
    Simple(String),
    Host { name: String, host: bool },
}

/// The manifest document written to `vcpkg.json`.
///
/// Never contains the content hash; only the recipe does.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PortManifest {
    name: String,
    version: String,
    description: String,
    homepage: String,
    license: String,
    supports: String,
    dependencies: Vec<ManifestDependency>,
}

impl PortManifest {
    /// Build the manifest for one release of the port.
    pub fn new(def: &PortDefinition, tag: &ReleaseTag) -> Self {
        let mut dependencies: Vec<ManifestDependency> = def
            .dependencies
            .iter()
            .cloned()
            .map(ManifestDependency::Simple)
            .collect();
        dependencies.extend(def.host_dependencies.iter().map(|name| {
            ManifestDependency::Host {
                name: name.clone(),
                host: true,
            }
        }));

        Self {
            name: def.name.clone(),
            version: tag.version().to_string(),
            description: def.description.clone(),
            homepage: def.homepage.clone(),
            license: def.license.clone(),
            supports: def.supports.clone(),
            dependencies,
        }
    }

    /// Pretty-printed JSON, as vcpkg's own tooling formats manifests.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Render the portfile for `def` with the given content hash.
///
/// `${VERSION}` and the other `${...}` references are CMake variables
/// resolved by vcpkg when the recipe runs; the hash is the only value
/// interpolated here.
pub fn render_portfile(def: &PortDefinition, hash: &ContentHash) -> String {
    format!(
        r#"if(VCPKG_TARGET_IS_LINUX)
    message(WARNING "{name} requires g++ 12 or newer on linux.")
endif()

vcpkg_from_github(
    OUT_SOURCE_PATH SOURCE_PATH
    REPO {repo}
    REF "v${{VERSION}}"
    SHA512 {hash}
    HEAD_REF {head_ref}
)

vcpkg_cmake_configure(
    SOURCE_PATH "${{SOURCE_PATH}}"
)

vcpkg_cmake_install()

vcpkg_cmake_config_fixup(NO_PREFIX_CORRECTION)

file(REMOVE_RECURSE "${{CURRENT_PACKAGES_DIR}}/debug/include" "${{CURRENT_PACKAGES_DIR}}/debug/share")

if(VCPKG_LIBRARY_LINKAGE STREQUAL "static")
    file(REMOVE_RECURSE "${{CURRENT_PACKAGES_DIR}}/bin" "${{CURRENT_PACKAGES_DIR}}/debug/bin")
endif()

vcpkg_install_copyright(FILE_LIST "${{SOURCE_PATH}}/{license_file}")
"#,
        name = def.name,
        repo = def.repo,
        hash = hash.as_str(),
        head_ref = def.head_ref,
        license_file = def.license_file,
    )
}

/// The two port artifacts inside the source checkout.
pub struct PortFiles<'a> {
    def: &'a PortDefinition,
    checkout: PathBuf,
}

impl<'a> PortFiles<'a> {
    pub fn new(def: &'a PortDefinition, checkout: impl Into<PathBuf>) -> Self {
        Self {
            def,
            checkout: checkout.into(),
        }
    }

    /// `Vcpkg/ports` inside the checkout (all locally tracked ports).
    pub fn ports_dir(&self) -> PathBuf {
        self.checkout.join("Vcpkg").join("ports")
    }

    /// This port's directory inside the checkout.
    pub fn port_dir(&self) -> PathBuf {
        self.ports_dir().join(&self.def.name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.port_dir().join("vcpkg.json")
    }

    pub fn portfile_path(&self) -> PathBuf {
        self.port_dir().join("portfile.cmake")
    }

    /// `Vcpkg/versions/<bucket>` inside the checkout.
    pub fn versions_dir(&self) -> PathBuf {
        self.checkout
            .join("Vcpkg")
            .join("versions")
            .join(self.def.version_bucket())
    }

    /// The version-registration record copied back from vcpkg's tooling.
    pub fn version_record_path(&self) -> PathBuf {
        self.versions_dir().join(format!("{}.json", self.def.name))
    }

    /// Write the manifest for `tag` and return the recipe rendered with
    /// `hash`.
    ///
    /// Called twice per run -- once with the placeholder, once with the
    /// real hash. The manifest is identical across the two calls; only
    /// the recipe text changes.
    pub fn generate(&self, tag: &ReleaseTag, hash: &ContentHash) -> Result<String> {
        let manifest = PortManifest::new(self.def, tag);
        std::fs::create_dir_all(self.port_dir())?;
        std::fs::write(self.manifest_path(), manifest.to_json()?)?;
        Ok(render_portfile(self.def, hash))
    }

    /// Write a previously rendered recipe into the checkout.
    pub fn write_portfile(&self, recipe: &str) -> Result<()> {
        std::fs::create_dir_all(self.port_dir())?;
        std::fs::write(self.portfile_path(), recipe)?;
        Ok(())
    }

    pub fn checkout_dir(&self) -> &Path {
        &self.checkout
    }
}
