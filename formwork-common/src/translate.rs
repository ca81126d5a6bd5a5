//! The translation collaborator.
//!
//! Every user-facing message produced by Formwork is phrased through a
//! [`Translate`] implementation supplied by the host. Messages use positional
//! placeholders `{{1}}`, `{{2}}`, ... which are filled from the argument list.
//!
//! ```
//! use formwork_common::{Translate, Untranslated};
//!
//! let t = Untranslated;
//! let msg = t.translate("{{1}} must be at least {{2}}", &["Age".into(), "18".into()]);
//! assert_eq!(msg, "Age must be at least 18");
//! ```

use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\d+)\}\}").expect("placeholder pattern is valid"));

/// Turns a default (source-language) text plus arguments into a display string.
///
/// Hosts usually wrap a catalog lookup with [`from_fn`] and finish with
/// [`substitute_placeholders`].
pub trait Translate: Send + Sync {
    fn translate(&self, text: &str, args: &[String]) -> String;
}

impl<T: Translate + ?Sized> Translate for &T {
    fn translate(&self, text: &str, args: &[String]) -> String {
        (**self).translate(text, args)
    }
}

impl<T: Translate + ?Sized> Translate for std::sync::Arc<T> {
    fn translate(&self, text: &str, args: &[String]) -> String {
        (**self).translate(text, args)
    }
}

impl<T: Translate + ?Sized> Translate for Box<T> {
    fn translate(&self, text: &str, args: &[String]) -> String {
        (**self).translate(text, args)
    }
}

/// A [`Translate`] backed by a closure. Built with [`from_fn`].
#[derive(Clone, Copy)]
pub struct FnTranslator<F>(F);

impl<F> Translate for FnTranslator<F>
where
    F: Fn(&str, &[String]) -> String + Send + Sync,
{
    fn translate(&self, text: &str, args: &[String]) -> String {
        (self.0)(text, args)
    }
}

impl<F> std::fmt::Debug for FnTranslator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnTranslator")
    }
}

/// Wrap a closure as a translator.
pub fn from_fn<F>(f: F) -> FnTranslator<F>
where
    F: Fn(&str, &[String]) -> String + Send + Sync,
{
    FnTranslator(f)
}

/// Translator that keeps the default text and only fills placeholders.
#[derive(Debug, Default, Clone, Copy)]
pub struct Untranslated;

impl Translate for Untranslated {
    fn translate(&self, text: &str, args: &[String]) -> String {
        substitute_placeholders(text, args)
    }
}

/// Replace `{{n}}` (1-based) with `args[n - 1]`.
///
/// Placeholders without a matching argument are left as written. Substitution
/// is a single pass, so argument text containing `{{n}}` is not expanded again.
pub fn substitute_placeholders(text: &str, args: &[String]) -> String {
    if args.is_empty() {
        return text.to_string();
    }
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| args.get(idx))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Translate `text` with arguments that implement `Display`.
///
/// ```
/// use formwork_common::{tr, Untranslated};
///
/// let msg = tr!(Untranslated, "{{1}} items", 3);
/// assert_eq!(msg, "3 items");
/// ```
#[macro_export]
macro_rules! tr {
    ($translate:expr, $text:expr $(,)?) => {
        $crate::Translate::translate(&$translate, $text, &[])
    };
    ($translate:expr, $text:expr, $($arg:expr),+ $(,)?) => {
        $crate::Translate::translate(&$translate, $text, &[$(($arg).to_string()),+])
    };
}
