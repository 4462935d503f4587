//! Listing formatter: turns flat directory entries into view records.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::path::encode_path;

/// Icon used for folders.
pub const FOLDER_ICON: &str = "fa fa-folder";

/// Icon used for files whose extension is not in the media table.
pub const GENERIC_FILE_ICON: &str = "fa fa-file";

/// Media category table: (category, extensions, icon).
const MEDIA_TYPES: &[(&str, &[&str], &str)] = &[
    (
        "image",
        &["png", "jpg", "svg", "jpeg", "gif", "bmp", "raw"],
        "fa fa-file-image",
    ),
    (
        "audio",
        &[
            "mp3", "wav", "ogg", "mpeg", "aac", "3gpp", "3gpp2", "aiff", "x-aiff", "amr", "mpga",
            "m4a", "flac",
        ],
        "fa fa-file-audio",
    ),
    (
        "video",
        &["mp4", "webm", "opgg", "flv", "mov", "mkv"],
        "fa fa-file-video",
    ),
    ("pdf", &["pdf"], "fa fa-file-pdf"),
    ("ppt", &["ppt", "pptx", "odp"], "fa fa-file-powerpoint"),
    ("doc", &["docx", "doc", "odt"], "fa fa-file-word"),
    ("excel", &["xls", "xlsx", "ods"], "fa fa-file-excel"),
    (
        "text",
        &["txt", "rtf", "csv", "log", "xml", "md"],
        "fa fa-file-text",
    ),
    ("compressed", &["zip", "rar", "7z"], "fa fa-file-zip"),
    (
        "code",
        &["css", "scss", "html", "py", "js", "cpp"],
        "fa fa-file-code",
    ),
];

/// One item of a flat folder listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Logical path under the tenant root. Folders end with `/`.
    pub path: String,
    /// Last path segment.
    pub name: String,
    /// Extension without the dot, empty for folders.
    pub extension: String,
    pub is_folder: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Value of the uploader tag, empty when absent.
    pub owner: String,
}

impl DirEntry {
    /// A subfolder entry.
    pub fn folder(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            extension: String::new(),
            is_folder: true,
            size: 0,
            modified: None,
            owner: String::new(),
        }
    }

    /// A file entry. The extension is taken from the name.
    pub fn file(
        path: impl Into<String>,
        name: impl Into<String>,
        size: u64,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        let name = name.into();
        let extension = match name.rfind('.') {
            Some(idx) if idx > 0 => name[idx + 1..].to_string(),
            _ => String::new(),
        };
        Self {
            path: path.into(),
            name,
            extension,
            is_folder: false,
            size,
            modified,
            owner: String::new(),
        }
    }
}

/// Display record rendered by the listing page.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayEntry {
    pub name: String,
    /// Logical path of the entry.
    pub url: String,
    /// Percent-encoded `url` for links.
    pub href: String,
    pub file_type: String,
    pub media_type: String,
    pub icon: String,
    pub is_folder: bool,
    /// Presentation that can be previewed as PDF.
    pub is_presentation: bool,
    pub owner: String,
    /// Formatted modification time, empty for folders.
    pub modified: String,
    /// Human readable size, `---` for folders.
    pub size: String,
    pub size_bytes: u64,
    pub current_dir: String,
    #[serde(skip)]
    sort_name: String,
    #[serde(skip)]
    modified_at: Option<DateTime<Utc>>,
}

/// Column a listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    FileType,
    Modified,
    Size,
}

impl SortKey {
    /// Map a column name from the UI. Unknown columns sort by size.
    pub fn from_column(column: &str) -> Self {
        match column {
            "name" => SortKey::Name,
            "filetype" => SortKey::FileType,
            "data" => SortKey::Modified,
            _ => SortKey::Size,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Look up the media category and icon of an extension.
pub fn media_for_extension(extension: &str) -> Option<(&'static str, &'static str)> {
    let extension = extension.to_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(_, extensions, _)| extensions.contains(&extension.as_str()))
        .map(|(category, _, icon)| (*category, *icon))
}

/// Human readable size: K, M or G with two decimals, 1000 per unit.
pub fn format_size(bytes: u64) -> String {
    let kilo = bytes as f64 / 1024.0;
    if kilo < 1000.0 {
        return format!("{kilo:.2}K");
    }
    let mega = kilo / 1024.0;
    if mega < 1000.0 {
        return format!("{mega:.2}M");
    }
    format!("{:.2}G", mega / 1024.0)
}

/// Cut a name to `max` characters, appending `...` when shortened.
pub fn truncate_name(name: &str, max: usize) -> String {
    if name.chars().count() > max {
        let mut cut: String = name.chars().take(max).collect();
        cut.push_str("...");
        cut
    } else {
        name.to_string()
    }
}

/// Timestamp format used in listings.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%d/%m/%Y %H:%M:%S").to_string()
}

/// Stable sort with folders first for every key and order.
pub fn sort_entries(entries: &mut [DisplayEntry], key: SortKey, order: SortOrder) {
    entries.sort_by(|a, b| {
        let by_kind = b.is_folder.cmp(&a.is_folder);
        if by_kind != Ordering::Equal {
            return by_kind;
        }
        let by_key = match key {
            SortKey::Name => a.sort_name.cmp(&b.sort_name),
            SortKey::FileType => a.file_type.cmp(&b.file_type),
            SortKey::Modified => a.modified_at.cmp(&b.modified_at),
            SortKey::Size => a.size_bytes.cmp(&b.size_bytes),
        };
        match order {
            SortOrder::Asc => by_key,
            SortOrder::Desc => by_key.reverse(),
        }
    });
}

/// Builds display records for one listing page.
#[derive(Debug, Clone, Copy)]
pub struct ListingFormatter {
    max_name_length: usize,
}

impl ListingFormatter {
    pub fn new(max_name_length: usize) -> Self {
        Self { max_name_length }
    }

    /// Convert one entry.
    pub fn display(&self, current_dir: &str, entry: DirEntry) -> DisplayEntry {
        let name = truncate_name(&entry.name, self.max_name_length);
        let sort_name = entry.name.to_lowercase();

        if entry.is_folder {
            return DisplayEntry {
                name,
                href: encode_path(&entry.path),
                url: entry.path,
                file_type: String::new(),
                media_type: String::new(),
                icon: FOLDER_ICON.to_string(),
                is_folder: true,
                is_presentation: false,
                owner: entry.owner,
                modified: String::new(),
                size: "---".to_string(),
                size_bytes: 0,
                current_dir: current_dir.to_string(),
                sort_name,
                modified_at: None,
            };
        }

        let (media_type, icon) = media_for_extension(&entry.extension).unwrap_or(("", GENERIC_FILE_ICON));

        DisplayEntry {
            name,
            href: encode_path(&entry.path),
            url: entry.path,
            file_type: entry.extension,
            media_type: media_type.to_string(),
            icon: icon.to_string(),
            is_folder: false,
            is_presentation: media_type == "ppt",
            owner: entry.owner,
            modified: entry.modified.as_ref().map(format_timestamp).unwrap_or_default(),
            size: format_size(entry.size),
            size_bytes: entry.size,
            current_dir: current_dir.to_string(),
            sort_name,
            modified_at: entry.modified,
        }
    }

    /// Convert and sort a whole listing.
    pub fn format(
        &self,
        current_dir: &str,
        entries: Vec<DirEntry>,
        key: SortKey,
        order: SortOrder,
    ) -> Vec<DisplayEntry> {
        let mut out: Vec<_> = entries
            .into_iter()
            .map(|entry| self.display(current_dir, entry))
            .collect();
        sort_entries(&mut out, key, order);
        out
    }
}

impl Default for ListingFormatter {
    fn default() -> Self {
        Self::new(64)
    }
}

/// One link of the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub url: String,
    pub label: String,
    pub path: String,
}

/// Breadcrumb trail from the home folder down to `current_dir`.
pub fn breadcrumbs(current_dir: &str, home_label: &str) -> Vec<Breadcrumb> {
    let mut trail = vec![Breadcrumb {
        url: "/files/".to_string(),
        label: home_label.to_string(),
        path: "/".to_string(),
    }];

    let mut path = String::new();
    for segment in current_dir.split('/').filter(|s| !s.is_empty()) {
        path.push_str(segment);
        path.push('/');
        trail.push(Breadcrumb {
            url: format!("/files/{}", encode_path(&path)),
            label: segment.to_string(),
            path: path.clone(),
        });
    }
    trail
}
