/// Extension-based file categorization.
///
/// This module holds the [`ExtensionMap`], the table that maps a lowercase file
/// extension (with its leading dot, e.g. `.jpg`) to the name of a category
/// directory, along with the rule used to pull an extension out of a file name.
///
/// # Examples
///
/// ```
/// use sortbox::file_category::ExtensionMap;
///
/// let map = ExtensionMap::builtin();
/// assert_eq!(map.classify("holiday.JPG"), Some("image"));
/// assert_eq!(map.classify("report.pdf"), Some("document"));
/// assert_eq!(map.classify("setup.exe"), None);
/// ```
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

/// Entries of the built-in table, used when no configuration file is loaded.
const BUILTIN_ENTRIES: &[(&str, &str)] = &[
    (".txt", "document"),
    (".pdf", "document"),
    (".docx", "document"),
    (".jpg", "image"),
    (".jpeg", "image"),
    (".png", "image"),
    (".gif", "image"),
];

/// Maps lowercase file extensions to category names.
///
/// Keys always carry the leading dot and are stored lowercased, so lookups
/// are case-insensitive. The map is built once per run and then only read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ExtensionMap {
    entries: BTreeMap<String, String>,
}

impl ExtensionMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Returns the built-in table of document and image extensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortbox::file_category::ExtensionMap;
    ///
    /// let map = ExtensionMap::builtin();
    /// assert_eq!(map.len(), 7);
    /// assert_eq!(map.category_for(".docx"), Some("document"));
    /// assert_eq!(map.category_for(".gif"), Some("image"));
    /// ```
    pub fn builtin() -> Self {
        let mut map = Self::new();
        for (extension, category) in BUILTIN_ENTRIES {
            map.insert(extension, category);
        }
        map
    }

    /// Adds an extension to category mapping. The extension is lowercased.
    pub fn insert(&mut self, extension: &str, category: &str) {
        self.entries
            .insert(extension.to_lowercase(), category.to_string());
    }

    /// Looks up the category for an extension such as `.png` or `.PNG`.
    pub fn category_for(&self, extension: &str) -> Option<&str> {
        self.entries
            .get(&extension.to_lowercase())
            .map(String::as_str)
    }

    /// Classifies a file by name, returning its category if the extension is known.
    ///
    /// Names without a `.` never match.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortbox::file_category::ExtensionMap;
    ///
    /// let mut map = ExtensionMap::new();
    /// map.insert(".md", "notes");
    /// assert_eq!(map.classify("readme.MD"), Some("notes"));
    /// assert_eq!(map.classify("README"), None);
    /// ```
    pub fn classify(&self, file_name: &str) -> Option<&str> {
        let extension = extension_of(file_name)?;
        self.entries.get(&extension).map(String::as_str)
    }

    /// Number of known extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no extension is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(extension, category)` pairs in extension order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(extension, category)| (extension.as_str(), category.as_str()))
    }

    /// Rebuilds the map with every key lowercased.
    ///
    /// Keys that collide after lowercasing keep the value of the last key in
    /// sorted order.
    pub(crate) fn normalized(self) -> Self {
        let mut map = Self::new();
        for (extension, category) in self.entries {
            map.insert(&extension, &category);
        }
        map
    }

    /// Returns the first entry whose category is not a usable directory name.
    pub(crate) fn first_invalid_category(&self) -> Option<(&str, &str)> {
        self.iter()
            .find(|(_, category)| !is_valid_category(category))
    }
}

impl Default for ExtensionMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Display for ExtensionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (extension, category)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", extension, category)?;
        }
        write!(f, "}}")
    }
}

/// Extracts the lowercased extension of a file name.
///
/// The extension is everything from the last `.` onwards, dot included, so a
/// dotfile such as `.txt` is its own extension and `archive.tar.gz` yields
/// `.gz`.
///
/// # Examples
///
/// ```
/// use sortbox::file_category::extension_of;
///
/// assert_eq!(extension_of("Photo.JPEG").as_deref(), Some(".jpeg"));
/// assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
/// assert_eq!(extension_of("Makefile"), None);
/// ```
pub fn extension_of(file_name: &str) -> Option<String> {
    file_name
        .rfind('.')
        .map(|index| file_name[index..].to_lowercase())
}

/// Checks that a category names exactly one plain directory level.
///
/// Empty names, `.`/`..` and anything containing a path separator would
/// place files outside `<output>/<category>`, so they are rejected.
pub fn is_valid_category(category: &str) -> bool {
    if category.is_empty() || category.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(category).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
