//! Per-request view over a shared translation source.

use std::sync::Arc;

use crate::source::TranslationSource;

/// Short-lived facade binding an active locale to a [`TranslationSource`].
///
/// Created fresh for each request and discarded afterwards; it holds no
/// locks and shares only a read reference to the source.
#[derive(Clone)]
pub struct TranslationFacade {
    /// Shared translation table, outlives the facade.
    source: Arc<TranslationSource>,
    /// Resolved active locale (e.g. `en-US`).
    locale: String,
    /// Display name of the active locale, empty when unmatched.
    locale_name: String,
}

impl TranslationFacade {
    /// Binds a locale to a shared source.
    #[must_use]
    pub fn new(
        source: Arc<TranslationSource>,
        locale: impl Into<String>,
        locale_name: impl Into<String>,
    ) -> Self {
        Self { source, locale: locale.into(), locale_name: locale_name.into() }
    }

    /// The resolved active locale for this request.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Human-readable name of the active locale.
    #[must_use]
    pub fn locale_name(&self) -> &str {
        &self.locale_name
    }

    /// Renders the translation for `key` with positional arguments.
    ///
    /// The lookup key is `locale + "." + key`. A missing translation
    /// renders as `[i18n missing: <key>]` so absence stays visible in the
    /// UI instead of failing the request. Placeholders `{{1}}`, `{{2}}`, …
    /// are replaced by the matching argument wherever they occur;
    /// placeholder-like text inside an argument is not expanded again.
    #[must_use]
    pub fn render(&self, key: &str, args: &[&str]) -> String {
        let full_key = format!("{}.{key}", self.locale);
        let value = self.source.get(&full_key);
        if value.is_empty() {
            return format!("[i18n missing: {full_key}]");
        }
        if args.is_empty() { value } else { substitute_args(&value, args) }
    }
}

impl std::fmt::Debug for TranslationFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationFacade")
            .field("locale", &self.locale)
            .field("locale_name", &self.locale_name)
            .finish_non_exhaustive()
    }
}

/// Single-pass replacement of `{{i}}` placeholders.
///
/// Substituted text is never rescanned, so arguments containing
/// placeholder tokens stay literal. Tokens without a matching argument
/// are left untouched.
fn substitute_args(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some((literal, tail)) = rest.split_at_checked(start) else {
            break;
        };
        out.push_str(literal);
        if let Some((index, remaining)) = parse_placeholder(tail)
            && let Some(arg) = resolve_arg(args, index)
        {
            out.push_str(arg);
            rest = remaining;
        } else {
            // プレースホルダーではない `{{` はそのまま出力する
            out.push_str("{{");
            rest = tail.get(2..).unwrap_or("");
        }
    }
    out.push_str(rest);
    out
}

/// Argument for a 1-based placeholder index.
fn resolve_arg<'a>(args: &[&'a str], index: usize) -> Option<&'a str> {
    args.get(index.checked_sub(1)?).copied()
}

/// Splits a leading `{{i}}` token into its index and the text after it.
fn parse_placeholder(tail: &str) -> Option<(usize, &str)> {
    let inner = tail.strip_prefix("{{")?;
    let (digits, after) = inner.split_once("}}")?;
    let index: usize = digits.parse().ok()?;
    Some((index, after))
}
