//! エンジン本体。設定の検証とリクエスト毎のファサード生成を行う

use std::sync::Arc;

use unic_langid::LanguageIdentifier;

use crate::config::{
    ConfigError,
    I18nOptions,
    ValidationError,
};
use crate::facade::TranslationFacade;
use crate::fs::{
    OsDir,
    TranslationDir,
};
use crate::locale;
use crate::source::TranslationSource;

/// Process-lifetime i18n engine.
///
/// Owns the shared [`TranslationSource`] and the configured supported
/// locales. One engine serves an arbitrary number of request-handling
/// threads; per request it negotiates a locale and hands out a
/// [`TranslationFacade`].
pub struct I18nEngine {
    /// 共有翻訳テーブル
    source: Arc<TranslationSource>,
    /// 対応ロケール（先頭がフォールバック）
    supported: Vec<LanguageIdentifier>,
    /// `supported` と並行した表示名リスト
    locale_names: Vec<String>,
    /// ロケール上書き用クエリパラメータ名
    query_name: String,
    /// ロケール上書き用クッキー名
    cookie_name: String,
}

impl I18nEngine {
    /// Builds an engine from validated options and a directory capability.
    ///
    /// # Errors
    /// Configuration problems are fatal: mismatched locale/name lists or
    /// unparseable locale tags abort construction instead of running
    /// degraded.
    pub fn new(options: &I18nOptions, dir: Box<dyn TranslationDir>) -> Result<Self, ConfigError> {
        options.validate().map_err(ConfigError::ValidationErrors)?;
        let (locales, locale_names) = options.locales_with_names();

        let supported = locales
            .iter()
            .map(|tag| {
                tag.parse::<LanguageIdentifier>().map_err(|e| {
                    ConfigError::ValidationErrors(vec![ValidationError::new(
                        "locales",
                        format!("Invalid locale tag '{tag}': {e:?}"),
                    )])
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(locales = ?locales, "Constructed i18n engine");

        Ok(Self {
            source: Arc::new(TranslationSource::new(dir)),
            supported,
            locale_names,
            query_name: options.query_name.clone(),
            cookie_name: options.cookie_name.clone(),
        })
    }

    /// Builds an engine whose translations live in `options.directory`
    /// on the real filesystem.
    ///
    /// # Errors
    /// In addition to [`new`](Self::new), an unresolvable directory is a
    /// fatal configuration error.
    pub fn from_options(options: &I18nOptions) -> Result<Self, ConfigError> {
        options.validate().map_err(ConfigError::ValidationErrors)?;
        let dir = OsDir::open(&options.directory)?;
        Self::new(options, Box::new(dir))
    }

    /// Negotiates a locale and binds a per-request facade.
    ///
    /// `overrides` are explicit request values (query parameter, cookie)
    /// in priority order; `accept_language` is the raw header value.
    /// Extraction of both stays with the caller. When nothing matches,
    /// the first supported locale wins.
    #[must_use]
    pub fn facade(&self, overrides: &[&str], accept_language: Option<&str>) -> TranslationFacade {
        let mut candidates: Vec<String> =
            overrides.iter().filter(|value| !value.is_empty()).map(ToString::to_string).collect();
        if let Some(header) = accept_language {
            candidates.extend(locale::parse_accept_language(header));
        }

        let index = locale::negotiate(&candidates, &self.supported).unwrap_or(0);
        let locale = self.supported.get(index).map(ToString::to_string).unwrap_or_default();
        let locale_name = self.locale_names.get(index).cloned().unwrap_or_default();
        tracing::debug!(%locale, "Negotiated request locale");

        TranslationFacade::new(Arc::clone(&self.source), locale, locale_name)
    }

    /// Clears the translation table so the next lookup reloads from disk.
    ///
    /// 開発モードでプロセス再起動なしに編集済み翻訳を反映するために使う
    pub fn reload(&self) {
        self.source.reload();
    }

    /// Shared handle to the underlying translation source.
    #[must_use]
    pub fn source(&self) -> Arc<TranslationSource> {
        Arc::clone(&self.source)
    }

    /// Query parameter name the extraction layer should read.
    #[must_use]
    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    /// Cookie name the extraction layer should read.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}

impl std::fmt::Debug for I18nEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nEngine")
            .field("supported", &self.supported)
            .field("query_name", &self.query_name)
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}
