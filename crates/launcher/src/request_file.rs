//! YAML launch request files.
//!
//! ```yaml
//! accounts: ["1234567890", act_9876543210]
//! stores: [TABO, ECUADOR]
//! start_date: 2026-03-14        # default: tomorrow
//! gender: all                   # all | male | female
//! product: lampara
//! context: LED lamp, rechargeable, 3 light modes
//! destination_url: shop.example.com/products/lampara
//! strategy: ABO                 # ABO | CBO | TEST
//! budget: 40000                 # minor units; per creative under TEST
//! headline: ¡Pide hoy y Paga en Casa!
//! body: ...
//! call_to_action: ORDER_NOW
//! creatives:
//!   files: [hero.jpg, demo.mp4] # relative to this file
//!   urls: [https://cdn.example.com/banner.png]
//! ```

use std::path::{Path, PathBuf};

use chrono::{Days, Local, NaiveDate};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use campaign_launcher_core::{
    AdAccountId, AdCopy, Budget, CallToAction, CampaignRequest, CreativeAsset, FanoutStrategy,
    Gender, MediaKind, StoreKey,
};

const DEFAULT_BUDGET: u64 = 40_000;
const DEFAULT_TEST_BUDGET: u64 = 30_000;

/// Errors loading a request file.
#[derive(Debug, Error)]
pub enum RequestFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid request file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid request file: {0}")]
    Invalid(String),
}

/// A request plus the free-text product context used for copy generation.
#[derive(Debug, Clone)]
pub struct LoadedRequest {
    pub request: CampaignRequest,
    pub context: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestFile {
    accounts: Vec<AccountInput>,
    stores: Vec<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    gender: Gender,
    product: String,
    #[serde(default)]
    context: String,
    destination_url: String,
    strategy: FanoutStrategy,
    #[serde(default)]
    budget: Option<Budget>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    call_to_action: CallToAction,
    #[serde(default)]
    creatives: CreativeInputs,
}

/// Account IDs may be written as bare numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccountInput {
    Number(u64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreativeInputs {
    #[serde(default)]
    files: Vec<PathBuf>,
    #[serde(default)]
    urls: Vec<String>,
}

/// Load a request file, reading every local creative once.
///
/// # Errors
///
/// Returns `RequestFileError` if the file or a creative cannot be read, or
/// the content is malformed.
#[instrument]
pub async fn load(path: &Path) -> Result<LoadedRequest, RequestFileError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| RequestFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    from_yaml(&content, base_dir, Local::now().date_naive()).await
}

/// Parse request YAML; relative creative paths resolve against `base_dir`.
///
/// # Errors
///
/// Returns `RequestFileError` on malformed content or unreadable creatives.
pub async fn from_yaml(
    content: &str,
    base_dir: &Path,
    today: NaiveDate,
) -> Result<LoadedRequest, RequestFileError> {
    let file: RequestFile = serde_yaml::from_str(content)?;

    let account_ids = file
        .accounts
        .iter()
        .map(|input| {
            let raw = match input {
                AccountInput::Number(n) => n.to_string(),
                AccountInput::Text(s) => s.clone(),
            };
            AdAccountId::parse(&raw).map_err(|e| RequestFileError::Invalid(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let product = file.product.trim().to_uppercase();
    let budget = match file.budget {
        Some(budget) => budget,
        None => default_budget(file.strategy)?,
    };

    let mut creatives = Vec::with_capacity(file.creatives.files.len() + file.creatives.urls.len());
    for relative in &file.creatives.files {
        creatives.push(load_local_creative(&base_dir.join(relative), &product).await?);
    }
    for (n, url) in file
        .creatives
        .urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .enumerate()
    {
        let kind = url_media_kind(url);
        creatives.push(CreativeAsset::remote(
            url,
            kind,
            format!("Link {} - {product}", n + 1),
        ));
    }

    let start_date = match file.start_date {
        Some(date) => date,
        None => today
            .checked_add_days(Days::new(1))
            .ok_or_else(|| RequestFileError::Invalid("start date out of range".to_string()))?,
    };

    let request = CampaignRequest {
        account_ids,
        store_keys: file.stores.iter().map(|s| StoreKey::new(s)).collect(),
        start_date,
        gender: file.gender,
        product_name: product,
        destination_url: file.destination_url,
        strategy: file.strategy,
        budget,
        headline: file
            .headline
            .unwrap_or_else(|| AdCopy::DEFAULT_HEADLINE.to_string()),
        body: file.body.unwrap_or_else(|| AdCopy::DEFAULT_BODY.to_string()),
        call_to_action: file.call_to_action,
        creatives,
    };

    Ok(LoadedRequest {
        request,
        context: file.context,
    })
}

fn default_budget(strategy: FanoutStrategy) -> Result<Budget, RequestFileError> {
    let minor_units = if strategy.ad_set_per_creative() {
        DEFAULT_TEST_BUDGET
    } else {
        DEFAULT_BUDGET
    };
    Budget::new(minor_units).map_err(|e| RequestFileError::Invalid(e.to_string()))
}

async fn load_local_creative(path: &Path, product: &str) -> Result<CreativeAsset, RequestFileError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| RequestFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let kind = if mime.type_() == mime_guess::mime::VIDEO {
        MediaKind::Video
    } else {
        MediaKind::Image
    };
    let file_name = path
        .file_name()
        .map_or_else(|| "creative".to_string(), |n| n.to_string_lossy().into_owned());
    let stem = path
        .file_stem()
        .map_or_else(|| file_name.clone(), |s| s.to_string_lossy().into_owned());

    debug!(path = %path.display(), %kind, size = bytes.len(), "Creative loaded");
    Ok(CreativeAsset::local(
        file_name,
        bytes,
        kind,
        mime.essence_str(),
        format!("{stem} - {product}"),
    ))
}

/// Video if the URL path looks like a video file, image otherwise.
fn url_media_kind(url: &str) -> MediaKind {
    let path = url::Url::parse(url).map_or_else(|_| url.to_string(), |u| u.path().to_string());
    let is_video = mime_guess::from_path(&path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::VIDEO);
    if is_video || path.to_ascii_lowercase().ends_with(".mp4") {
        MediaKind::Video
    } else {
        MediaKind::Image
    }
}

#[cfg(test)]
mod tests {
    use campaign_launcher_core::AssetSource;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 13).expect("date")
    }

    const MINIMAL: &str = r"
accounts: [1234, act_5678]
stores: [tabo]
product: lampara
destination_url: shop.example.com/lampara
strategy: TEST
creatives:
  urls:
    - https://cdn.example.com/banner.png
    - https://cdn.example.com/clip.mp4?token=abc
";

    #[tokio::test]
    async fn test_minimal_file_gets_defaults() {
        let loaded = from_yaml(MINIMAL, Path::new("."), today())
            .await
            .expect("valid file");
        let request = loaded.request;

        assert_eq!(request.account_ids[0].as_str(), "act_1234");
        assert_eq!(request.account_ids[1].as_str(), "act_5678");
        assert_eq!(request.store_keys, vec![StoreKey::new("TABO")]);
        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2026, 3, 14).expect("date"));
        assert_eq!(request.product_name, "LAMPARA");
        assert_eq!(request.strategy, FanoutStrategy::PerCreativeTest);
        assert_eq!(request.budget.minor_units(), DEFAULT_TEST_BUDGET);
        assert_eq!(request.headline, AdCopy::DEFAULT_HEADLINE);
        assert_eq!(request.gender, Gender::All);
        assert_eq!(request.call_to_action, CallToAction::OrderNow);
        assert!(loaded.context.is_empty());

        assert_eq!(request.creatives.len(), 2);
        assert_eq!(request.creatives[0].kind, MediaKind::Image);
        assert_eq!(request.creatives[0].display_name, "Link 1 - LAMPARA");
        assert_eq!(request.creatives[1].kind, MediaKind::Video);
        assert_eq!(request.creatives[1].display_name, "Link 2 - LAMPARA");
    }

    #[tokio::test]
    async fn test_local_files_are_read_once() {
        let dir = std::env::temp_dir().join(format!("launcher-req-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.expect("mkdir");
        tokio::fs::write(dir.join("hero.jpg"), b"jpeg-bytes")
            .await
            .expect("write");
        tokio::fs::write(dir.join("demo.mp4"), b"mp4-bytes")
            .await
            .expect("write");

        let yaml = r"
accounts: ['1']
stores: [ECUADOR]
start_date: 2026-04-01
gender: female
product: Reloj
context: reloj inteligente
destination_url: https://shop.example.com/reloj
strategy: CBO
budget: 5000
headline: Nuevo
body: Cuerpo
call_to_action: SHOP_NOW
creatives:
  files: [hero.jpg, demo.mp4]
";
        let loaded = from_yaml(yaml, &dir, today()).await.expect("valid file");
        let request = loaded.request;

        assert_eq!(loaded.context, "reloj inteligente");
        assert_eq!(request.gender, Gender::Female);
        assert_eq!(request.budget.minor_units(), 5000);
        assert_eq!(request.call_to_action, CallToAction::ShopNow);

        let hero = &request.creatives[0];
        assert_eq!(hero.display_name, "hero - RELOJ");
        assert_eq!(hero.kind, MediaKind::Image);
        assert_eq!(hero.mime_type, "image/jpeg");
        let AssetSource::LocalFile { file_name, bytes } = &hero.source else {
            panic!("expected local file");
        };
        assert_eq!(file_name, "hero.jpg");
        assert_eq!(bytes.as_ref(), b"jpeg-bytes");

        let demo = &request.creatives[1];
        assert_eq!(demo.display_name, "demo - RELOJ");
        assert_eq!(demo.kind, MediaKind::Video);
        assert_eq!(demo.mime_type, "video/mp4");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_missing_creative_file() {
        let yaml = r"
accounts: ['1']
stores: [TABO]
product: x
destination_url: x.com
strategy: ABO
creatives:
  files: [does-not-exist.jpg]
";
        let err = from_yaml(yaml, Path::new("/nonexistent"), today())
            .await
            .expect_err("missing file");
        assert!(matches!(err, RequestFileError::Io { .. }));
    }

    #[tokio::test]
    async fn test_bad_values_are_rejected() {
        let zero_budget = MINIMAL.replace("strategy: TEST", "strategy: TEST\nbudget: 0");
        assert!(matches!(
            from_yaml(&zero_budget, Path::new("."), today()).await,
            Err(RequestFileError::Yaml(_))
        ));

        let bad_account = MINIMAL.replace("act_5678", "act_abc");
        assert!(matches!(
            from_yaml(&bad_account, Path::new("."), today()).await,
            Err(RequestFileError::Invalid(_))
        ));

        let typo = format!("{MINIMAL}\nbugdet: 10\n");
        assert!(from_yaml(&typo, Path::new("."), today()).await.is_err());
    }

    #[test]
    fn test_url_media_kind() {
        assert_eq!(url_media_kind("https://cdn.example.com/a.mp4"), MediaKind::Video);
        assert_eq!(url_media_kind("https://cdn.example.com/a.mov?x=1"), MediaKind::Video);
        assert_eq!(url_media_kind("https://cdn.example.com/a.webp"), MediaKind::Image);
        assert_eq!(url_media_kind("not a url"), MediaKind::Image);
    }
}
