use std::{fmt::Display, path::PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

/// Where the bytes of an image come from, decided from the URL string alone.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum ResourcePath {
    Local(PathBuf),
    URL(String),
    Data(String),
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ResourcePath::*;
        match self {
            Local(path) => f.write_fmt(format_args!("[Local image: {}]", path.display())),
            URL(url) => f.write_fmt(format_args!("[URL: {url}]")),
            Data(_) => f.write_str("[Inline data image]"),
        }
    }
}

const URL_REGEX_SPEC: &str = r"^(http|https)://(.+)$";
const FILE_REGEX_SPEC: &str = r"^file://(.+)$";
const DATA_REGEX_SPEC: &str = r"^data:(.*)$";

impl From<&str> for ResourcePath {
    fn from(value: &str) -> Self {
        static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(URL_REGEX_SPEC).unwrap());
        static FILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(FILE_REGEX_SPEC).unwrap());
        static DATA_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(DATA_REGEX_SPEC).unwrap());

        use ResourcePath::*;

        if URL_REGEX.is_match(value) {
            URL(value.to_owned())
        } else if let Some(captures) = DATA_REGEX.captures(value) {
            Data(captures[1].to_owned())
        } else if let Some(captures) = FILE_REGEX.captures(value) {
            let path = &captures[1];
            // not valid percent-encoding, take the path as written
            let decoded = urlencoding::decode(path)
                .map_or_else(|_| path.to_owned(), |decoded| decoded.into_owned());
            Local(PathBuf::from(decoded))
        } else {
            Local(value.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_remote_urls() {
        assert_eq!(
            ResourcePath::from("https://example.com/a.png"),
            ResourcePath::URL("https://example.com/a.png".to_owned())
        );
        assert_eq!(
            ResourcePath::from("http://example.com/a.png"),
            ResourcePath::URL("http://example.com/a.png".to_owned())
        );
    }

    #[test]
    fn strips_scheme_from_data_and_file_urls() {
        assert_eq!(
            ResourcePath::from("data:image/gif;base64,AAAA"),
            ResourcePath::Data("image/gif;base64,AAAA".to_owned())
        );
        assert_eq!(
            ResourcePath::from("file:///tmp/a.png"),
            ResourcePath::Local(PathBuf::from("/tmp/a.png"))
        );
    }

    #[test]
    fn file_urls_are_percent_decoded() {
        assert_eq!(
            ResourcePath::from("file:///tmp/a%20b.png"),
            ResourcePath::Local(PathBuf::from("/tmp/a b.png"))
        );
        // bare paths are not URLs and stay as written
        assert_eq!(
            ResourcePath::from("a%20b.png"),
            ResourcePath::Local(PathBuf::from("a%20b.png"))
        );
    }

    #[test]
    fn anything_else_is_a_local_path() {
        assert_eq!(
            ResourcePath::from("images/a.png"),
            ResourcePath::Local(PathBuf::from("images/a.png"))
        );
        // scheme match is anchored, so ftp is a (strange) relative path
        assert_eq!(
            ResourcePath::from("ftp://host/a.png"),
            ResourcePath::Local(PathBuf::from("ftp://host/a.png"))
        );
    }
}
