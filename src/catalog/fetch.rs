//! Catalog loading. Cache first, network when stale.

use std::future::Future;
use std::time::Duration;

use super::cache::CatalogCache;
use super::{CatalogError, DetectableApp, GameCatalog};

/// API version used when the config does not name one.
pub const DEFAULT_API_VERSION: u32 = 10;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// URL of the detectable-applications list for an API version.
pub fn detectable_url(api_version: u32) -> String {
    format!("https://discord.com/api/v{api_version}/applications/detectable")
}

/// How [`load_catalog`] treats the cache.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub api_version: u32,
    /// Cache entries older than this are refreshed.
    pub ttl: Duration,
    /// Fetch even when the cache is fresh.
    pub force_refresh: bool,
}

/// GET the list from `url`.
pub async fn fetch_apps(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<DetectableApp>, CatalogError> {
    tracing::info!(url, "fetching game catalog");
    let apps = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json::<Vec<DetectableApp>>()
        .await?;
    Ok(apps)
}

/// Produce the app list from `cache`, calling `fetch` when the cache is
/// missing, stale, unreadable, or a refresh is forced.
///
/// A successful fetch is written back to the cache (failure to write is
/// only logged). A failed fetch falls back to whatever the cache holds,
/// however old.
pub async fn load_apps<F, Fut>(
    cache: &CatalogCache,
    ttl: Duration,
    force_refresh: bool,
    fetch: F,
) -> Result<Vec<DetectableApp>, CatalogError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<DetectableApp>, CatalogError>>,
{
    if !force_refresh && cache.is_fresh(ttl).await {
        match cache.load().await {
            Ok(apps) if !apps.is_empty() => {
                tracing::debug!(path = %cache.path().display(), count = apps.len(), "catalog cache hit");
                return Ok(apps);
            }
            Ok(_) => tracing::warn!(path = %cache.path().display(), "catalog cache is empty"),
            Err(e) => tracing::warn!(path = %cache.path().display(), error = %e, "catalog cache unreadable"),
        }
    }

    let fetch_error = match fetch().await {
        Ok(apps) if !apps.is_empty() => {
            if let Err(e) = cache.store(&apps).await {
                tracing::warn!(path = %cache.path().display(), error = %e, "failed to write catalog cache");
            }
            return Ok(apps);
        }
        Ok(_) => "fetched catalog is empty".to_string(),
        Err(e) => e.to_string(),
    };

    tracing::warn!(error = %fetch_error, "catalog fetch failed, trying cached copy");
    match cache.load().await {
        Ok(apps) if !apps.is_empty() => {
            tracing::warn!(
                path = %cache.path().display(),
                age = ?cache.age().await,
                "using stale catalog cache"
            );
            Ok(apps)
        }
        Ok(_) => Err(CatalogError::Unavailable(format!(
            "{fetch_error}; cached copy is empty"
        ))),
        Err(e) => Err(CatalogError::Unavailable(format!(
            "{fetch_error}; no cached copy ({e})"
        ))),
    }
}

/// Build the catalog for the daemon: cache or network, then index.
pub async fn load_catalog(
    cache: &CatalogCache,
    opts: &LoadOptions,
) -> Result<GameCatalog, CatalogError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("steam-presenced/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    let url = detectable_url(opts.api_version);

    let apps = load_apps(cache, opts.ttl, opts.force_refresh, || {
        fetch_apps(&client, &url)
    })
    .await?;

    let catalog = GameCatalog::from_apps(&apps);
    if catalog.is_empty() {
        return Err(CatalogError::Unavailable(
            "catalog has no usable names".to_string(),
        ));
    }
    tracing::info!(count = catalog.len(), "indexed known games");
    Ok(catalog)
}
