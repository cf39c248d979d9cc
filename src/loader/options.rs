use std::{fmt::Debug, sync::Arc};

use serde::Deserialize;

use super::events::{CompletionEvent, ProgressEvent};

pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync + 'static>;
pub type CompleteCallback = Arc<dyn Fn(&CompletionEvent) + Send + Sync + 'static>;

/// The loader's resolved configuration.
#[derive(Clone)]
pub struct LoaderConfig {
    pub auto_start: bool,
    pub parallel: bool,
    pub on_progress: Option<ProgressCallback>,
    pub on_complete: CompleteCallback,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            auto_start: true,
            parallel: true,
            on_progress: None,
            on_complete: Arc::new(|_| {}),
        }
    }
}

impl Debug for LoaderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("auto_start", &self.auto_start)
            .field("parallel", &self.parallel)
            .field("on_progress", &self.on_progress.is_some())
            .finish_non_exhaustive()
    }
}

impl LoaderConfig {
    /// Shallow merge: every key set in `options` overwrites ours.
    pub fn merge(&mut self, options: Options) {
        let Options {
            auto_start,
            parallel,
            on_progress,
            on_complete,
        } = options;

        if let Some(auto_start) = auto_start {
            self.auto_start = auto_start;
        }
        if let Some(parallel) = parallel {
            self.parallel = parallel;
        }
        if on_progress.is_some() {
            self.on_progress = on_progress;
        }
        if let Some(on_complete) = on_complete {
            self.on_complete = on_complete;
        }
    }
}

/// A partial configuration. Unset keys leave the current value alone.
///
/// Only the plain keys can come from a config file; callbacks are set in code.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Options {
    pub auto_start: Option<bool>,
    pub parallel: Option<bool>,
    #[serde(skip)]
    pub on_progress: Option<ProgressCallback>,
    #[serde(skip)]
    pub on_complete: Option<CompleteCallback>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = Some(auto_start);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = Some(parallel);
        self
    }

    pub fn on_progress(mut self, f: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn(&CompletionEvent) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }
}

impl Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("auto_start", &self.auto_start)
            .field("parallel", &self.parallel)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// One or more URLs. A single string is a one-element list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Urls(Vec<String>);

impl Urls {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for Urls {
    fn from(url: &str) -> Self {
        Urls(vec![url.to_owned()])
    }
}

impl From<String> for Urls {
    fn from(url: String) -> Self {
        Urls(vec![url])
    }
}

impl<T: Into<String>> From<Vec<T>> for Urls {
    fn from(urls: Vec<T>) -> Self {
        Urls(urls.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<String> + Clone> From<&[T]> for Urls {
    fn from(urls: &[T]) -> Self {
        Urls(urls.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<String>, const N: usize> From<[T; N]> for Urls {
    fn from(urls: [T; N]) -> Self {
        Urls(urls.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Urls>> From<Option<T>> for Urls {
    fn from(urls: Option<T>) -> Self {
        urls.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_auto_start_and_parallel() {
        let config = LoaderConfig::default();
        assert!(config.auto_start);
        assert!(config.parallel);
        assert!(config.on_progress.is_none());
    }

    #[test]
    fn merge_only_overwrites_set_keys() {
        let mut config = LoaderConfig::default();
        config.merge(Options::new().parallel(false));
        assert!(!config.parallel);
        assert!(config.auto_start);

        config.merge(Options::new().on_progress(|_| {}));
        assert!(!config.parallel, "unset key must not reset an earlier merge");
        assert!(config.on_progress.is_some());

        config.merge(Options::new());
        assert!(config.on_progress.is_some());
    }

    #[test]
    fn options_deserialize_from_toml() {
        let options: Options = toml::from_str("parallel = false\nauto-start = false").unwrap();
        assert_eq!(options.parallel, Some(false));
        assert_eq!(options.auto_start, Some(false));
        assert!(options.on_complete.is_none());

        let empty: Options = toml::from_str("").unwrap();
        assert_eq!(empty.parallel, None);
    }

    #[test]
    fn single_url_is_a_one_element_list() {
        assert_eq!(Urls::from("a.png"), Urls::from(vec!["a.png"]));
        assert_eq!(Urls::from("a.png".to_owned()), Urls::from(["a.png"]));
        assert_eq!(Urls::from(None::<&str>), Urls::none());
        assert_eq!(Urls::from(&["a", "b"][..]).into_vec(), vec!["a", "b"]);
    }
}
