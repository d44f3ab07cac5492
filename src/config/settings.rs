//! Process-wide settings.
//!
//! Settings are initialized once per process: either explicitly with
//! [`install`] or, on the first call to [`current`], from [`AppConfig::load`]
//! with the built-in defaults as fallback. They cannot change afterwards, so
//! overrides have to be installed before anything reads them.
//!
//! The treeifier and the two URI translators are plain function values; a
//! deployment replaces them through [`SettingsBuilder`] rather than by
//! wrapping the resolver.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::warn;

use super::AppConfig;
use crate::domain::Template;
use crate::error::{NoidError, Result};
use crate::service::resolver::PathResolver;

/// Identifier to bucket segments.
pub type Treeifier = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Repository URI to identifier.
pub type IdFromUri = Arc<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Identifier to repository URI.
pub type UriFromId = Arc<dyn Fn(&str) -> String + Send + Sync>;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Install the process-wide settings.
///
/// # Errors
///
/// Returns `AlreadyConfigured` if settings were installed or read before.
pub fn install(settings: Settings) -> Result<()> {
    SETTINGS
        .set(settings)
        .map_err(|_| NoidError::AlreadyConfigured)
}

/// The process-wide settings, initializing them on first use.
pub fn current() -> &'static Settings {
    SETTINGS.get_or_init(|| {
        match AppConfig::load()
            .map_err(|e| NoidError::InvalidConfig(e.to_string()))
            .and_then(|config| Settings::from_config(&config))
        {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Falling back to default NOID settings");
                Settings::default()
            }
        }
    })
}

/// Template, state location and path translation functions.
#[derive(Clone)]
pub struct Settings {
    template: Template,
    statefile: PathBuf,
    treeifier: Treeifier,
    id_from_uri: IdFromUri,
    uri_from_id: UriFromId,
}

impl Settings {
    /// Start building settings from the default configuration.
    #[must_use]
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::default()
    }

    /// Settings derived from a loaded configuration, with no overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the template or the resolver configuration is
    /// invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::builder().config(config.clone()).build()
    }

    /// Template new minters use.
    #[must_use]
    pub const fn template(&self) -> &Template {
        &self.template
    }

    /// State file location.
    #[must_use]
    pub fn statefile(&self) -> &Path {
        &self.statefile
    }

    /// Bucket segments for `id`.
    #[must_use]
    pub fn treeify(&self, id: &str) -> Vec<String> {
        (self.treeifier)(id)
    }

    /// Identifier addressed by `uri`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedUri` if `uri` does not have the expected shape.
    pub fn id_from_uri(&self, uri: &str) -> Result<String> {
        (self.id_from_uri)(uri)
    }

    /// Repository URI of `id`.
    #[must_use]
    pub fn uri_from_id(&self, id: &str) -> String {
        (self.uri_from_id)(id)
    }
}

impl Default for Settings {
    fn default() -> Self {
        let resolver = Arc::new(PathResolver::default());
        let treeifier = resolver_treeifier(&resolver);
        Self {
            template: Template::default(),
            statefile: super::MinterConfig::default().statefile,
            uri_from_id: composed_uri_from_id(&resolver, &treeifier),
            id_from_uri: resolver_id_from_uri(&resolver),
            treeifier,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("template", &self.template.as_str())
            .field("statefile", &self.statefile)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Settings`].
#[derive(Default)]
pub struct SettingsBuilder {
    config: AppConfig,
    template: Option<String>,
    statefile: Option<PathBuf>,
    treeifier: Option<Treeifier>,
    id_from_uri: Option<IdFromUri>,
    uri_from_id: Option<UriFromId>,
}

impl SettingsBuilder {
    /// Base configuration for everything not overridden.
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the template.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Override the state file location.
    #[must_use]
    pub fn statefile(mut self, statefile: impl Into<PathBuf>) -> Self {
        self.statefile = Some(statefile.into());
        self
    }

    /// Override the treeifier.
    ///
    /// The default `uri_from_id` picks this up; the default `id_from_uri`
    /// still strips the configured number of levels, so override it too when
    /// the depth differs.
    #[must_use]
    pub fn treeifier<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.treeifier = Some(Arc::new(f));
        self
    }

    /// Override URI to identifier translation.
    #[must_use]
    pub fn id_from_uri<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<String> + Send + Sync + 'static,
    {
        self.id_from_uri = Some(Arc::new(f));
        self
    }

    /// Override identifier to URI translation.
    #[must_use]
    pub fn uri_from_id<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.uri_from_id = Some(Arc::new(f));
        self
    }

    /// Build the settings.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTemplate` for a bad template and `InvalidConfig` for a
    /// bad repository or bucketing configuration.
    pub fn build(self) -> Result<Settings> {
        let template = Template::parse(
            self.template
                .as_deref()
                .unwrap_or(&self.config.minter.template),
        )?;

        let resolver = Arc::new(PathResolver::new(
            &self.config.repository,
            self.config.treeify,
        )?);

        let treeifier = self
            .treeifier
            .unwrap_or_else(|| resolver_treeifier(&resolver));
        let uri_from_id = self
            .uri_from_id
            .unwrap_or_else(|| composed_uri_from_id(&resolver, &treeifier));
        let id_from_uri = self
            .id_from_uri
            .unwrap_or_else(|| resolver_id_from_uri(&resolver));

        Ok(Settings {
            template,
            statefile: self.statefile.unwrap_or(self.config.minter.statefile),
            treeifier,
            id_from_uri,
            uri_from_id,
        })
    }
}

fn resolver_treeifier(resolver: &Arc<PathResolver>) -> Treeifier {
    let resolver = Arc::clone(resolver);
    Arc::new(move |id: &str| resolver.treeify(id))
}

fn resolver_id_from_uri(resolver: &Arc<PathResolver>) -> IdFromUri {
    let resolver = Arc::clone(resolver);
    Arc::new(move |uri: &str| resolver.id_from_uri(uri))
}

fn composed_uri_from_id(resolver: &Arc<PathResolver>, treeifier: &Treeifier) -> UriFromId {
    let resolver = Arc::clone(resolver);
    let treeifier = Arc::clone(treeifier);
    Arc::new(move |id: &str| resolver.compose_uri(&treeifier(id), id))
}
