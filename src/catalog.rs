use jwalk::WalkDir;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;

use crate::error::CatalogError;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "avif"];

/// Stable identity of a catalog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of filter categories an item can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagCategory {
    Type,
    Texture,
    Color,
}

impl TagCategory {
    pub const ALL: [TagCategory; 3] = [TagCategory::Type, TagCategory::Texture, TagCategory::Color];

    pub fn key(&self) -> &'static str {
        match self {
            TagCategory::Type => "type",
            TagCategory::Texture => "texture",
            TagCategory::Color => "color",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TagCategory::Type => "Category",
            TagCategory::Texture => "Material",
            TagCategory::Color => "Color",
        }
    }

    fn slot(&self) -> usize {
        match self {
            TagCategory::Type => 0,
            TagCategory::Texture => 1,
            TagCategory::Color => 2,
        }
    }
}

impl FromStr for TagCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagCategory::ALL
            .into_iter()
            .find(|category| category.key() == s)
            .ok_or_else(|| CatalogError::UnknownTagCategory(s.to_string()))
    }
}

/// Tag values keyed by the closed category set. Validated once at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    values: [Option<String>; 3],
}

impl Tags {
    pub fn get(&self, category: TagCategory) -> Option<&str> {
        self.values[category.slot()].as_deref()
    }

    pub fn set(&mut self, category: TagCategory, value: Option<String>) {
        self.values[category.slot()] = value;
    }

    /// Build from a free-form key/value map, rejecting keys outside the closed set.
    pub fn from_map(raw: HashMap<String, Option<String>>) -> Result<Self, CatalogError> {
        let mut tags = Tags::default();
        for (key, value) in raw {
            let category: TagCategory = key.parse()?;
            let value = value.filter(|v| !v.trim().is_empty());
            tags.set(category, value);
        }
        Ok(tags)
    }
}

/// One product in the catalog. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub src: String,
    pub name: String,
    pub alt: Option<String>,
    pub price: Option<String>,
    pub tags: Tags,
}

impl CatalogItem {
    pub fn new(id: u64, src: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            src: src.into(),
            name: name.into(),
            alt: None,
            price: None,
            tags: Tags::default(),
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Accessible label: alt text, falling back to the display name.
    pub fn label(&self) -> &str {
        self.alt.as_deref().unwrap_or(&self.name)
    }
}

/// On-disk shape of an item before tag validation.
#[derive(Debug, Deserialize)]
struct RawCatalogItem {
    id: u64,
    src: String,
    name: String,
    #[serde(default)]
    alt: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    tags: HashMap<String, Option<String>>,
}

impl TryFrom<RawCatalogItem> for CatalogItem {
    type Error = CatalogError;

    fn try_from(raw: RawCatalogItem) -> Result<Self, Self::Error> {
        Ok(CatalogItem {
            id: ItemId(raw.id),
            src: raw.src,
            name: raw.name,
            alt: raw.alt,
            price: raw.price,
            tags: Tags::from_map(raw.tags)?,
        })
    }
}

/// Ordered, immutable snapshot of the items shown on the canvas.
///
/// Cloning is cheap; the item storage is shared.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: Arc<[CatalogItem]>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.id) {
                return Err(CatalogError::DuplicateId(item.id.0));
            }
            if item.src.trim().is_empty() {
                return Err(CatalogError::EmptySource(item.id.0));
            }
        }
        Ok(Self { items: items.into() })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a JSON array of items. `origin` is only used for error reporting.
    pub fn parse_json(text: &str, origin: &Path) -> Result<Self, CatalogError> {
        let raw: Vec<RawCatalogItem> =
            serde_json::from_str(text).map_err(|source| CatalogError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_raw(raw)
    }

    /// Load a JSON array of items from disk.
    pub fn load_json(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::parse_json(&text, path)?;
        log::info!("Loaded {} catalog items from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    fn from_raw(raw: Vec<RawCatalogItem>) -> Result<Self, CatalogError> {
        let items = raw
            .into_iter()
            .map(CatalogItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter()
    }

    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Sorted distinct tag values per category, for filter menus.
    pub fn tag_options(&self) -> BTreeMap<TagCategory, Vec<String>> {
        TagCategory::ALL
            .into_iter()
            .map(|category| {
                let values: BTreeSet<&str> =
                    self.items.iter().filter_map(|item| item.tags.get(category)).collect();
                (category, values.into_iter().map(str::to_string).collect())
            })
            .collect()
    }
}

/// Where a catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Json(PathBuf),
    Directory(PathBuf),
}

impl CatalogSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            CatalogSource::Directory(path)
        } else {
            CatalogSource::Json(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            CatalogSource::Json(path) | CatalogSource::Directory(path) => path,
        }
    }

    pub fn load(&self) -> Result<Catalog, CatalogError> {
        match self {
            CatalogSource::Json(path) => Catalog::load_json(path),
            CatalogSource::Directory(path) => scan_directory(path),
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Build a catalog from the image files under `root`, ordered by path.
pub fn scan_directory(root: &Path) -> Result<Catalog, CatalogError> {
    if !root.is_dir() {
        return Err(CatalogError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .skip_hidden(false)
        .sort(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| is_image(path))
        .collect();
    paths.sort();

    let items = paths
        .into_iter()
        .enumerate()
        .map(|(i, path)| {
            let name = path
                .file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .replace(['_', '-'], " ");
            CatalogItem::new(i as u64 + 1, path.to_string_lossy(), name)
        })
        .collect();

    let catalog = Catalog::new(items)?;
    log::info!("Scanned {} images under {}", catalog.len(), root.display());
    Ok(catalog)
}

/// Watches a catalog source and reports when it changed on disk.
pub struct CatalogWatcher {
    _watcher: RecommendedWatcher,
    changes: Receiver<()>,
}

impl CatalogWatcher {
    pub fn watch(source: &CatalogSource) -> Result<Self, CatalogError> {
        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(err) => log::warn!("Catalog watch error: {}", err),
            }
        })?;

        let mode = match source {
            CatalogSource::Json(_) => RecursiveMode::NonRecursive,
            CatalogSource::Directory(_) => RecursiveMode::Recursive,
        };
        watcher.watch(source.path(), mode)?;

        Ok(Self {
            _watcher: watcher,
            changes: rx,
        })
    }

    /// Drain pending notifications. Returns true if anything changed since the last poll.
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        loop {
            match self.changes.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"id": 1, "src": "img/a.png", "name": "Oak Chair", "price": "$120",
         "tags": {"type": "chair", "texture": "wood", "color": "brown"}},
        {"id": 2, "src": "img/b.png", "name": "Steel Lamp",
         "tags": {"type": "lamp", "color": "silver"}},
        {"id": 3, "src": "img/c.png", "name": "Linen Sofa",
         "tags": {"type": "sofa", "texture": "linen", "color": "brown"}}
    ]"#;

    #[test]
    fn test_load_json_with_tags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let catalog = Catalog::load_json(file.path()).unwrap();
        assert_eq!(catalog.len(), 3);
        let chair = catalog.get(0).unwrap();
        assert_eq!(chair.price.as_deref(), Some("$120"));
        assert_eq!(chair.tags.get(TagCategory::Texture), Some("wood"));
        assert_eq!(catalog.get(1).unwrap().tags.get(TagCategory::Texture), None);
    }

    #[test]
    fn test_unknown_tag_category_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"id": 1, "src": "a.png", "name": "A", "tags": {"size": "xl"}}]"#)
            .unwrap();

        match Catalog::load_json(file.path()) {
            Err(CatalogError::UnknownTagCategory(key)) => assert_eq!(key, "size"),
            other => panic!("expected unknown tag error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let items = vec![CatalogItem::new(7, "a.png", "A"), CatalogItem::new(7, "b.png", "B")];
        assert!(matches!(Catalog::new(items), Err(CatalogError::DuplicateId(7))));
    }

    #[test]
    fn test_empty_source_rejected() {
        let items = vec![CatalogItem::new(1, "  ", "A")];
        assert!(matches!(Catalog::new(items), Err(CatalogError::EmptySource(1))));
    }

    #[test]
    fn test_malformed_json_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(Catalog::load_json(file.path()), Err(CatalogError::Parse { .. })));
    }

    #[test]
    fn test_tag_options_sorted_and_distinct() {
        let catalog = Catalog::parse_json(SAMPLE, Path::new("sample.json")).unwrap();
        let options = catalog.tag_options();
        assert_eq!(options[&TagCategory::Type], vec!["chair", "lamp", "sofa"]);
        assert_eq!(options[&TagCategory::Color], vec!["brown", "silver"]);
        assert_eq!(options[&TagCategory::Texture], vec!["linen", "wood"]);
    }

    #[test]
    fn test_position_by_id() {
        let catalog = Catalog::parse_json(SAMPLE, Path::new("sample.json")).unwrap();
        assert_eq!(catalog.position(ItemId(3)), Some(2));
        assert_eq!(catalog.position(ItemId(42)), None);
    }

    #[test]
    fn test_scan_directory_picks_images_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_lamp.png"), b"png").unwrap();
        std::fs::write(dir.path().join("a-chair.JPG"), b"jpg").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"txt").unwrap();

        let catalog = scan_directory(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().name, "a chair");
        assert_eq!(catalog.get(1).unwrap().name, "b lamp");
        assert_eq!(catalog.get(0).unwrap().id, ItemId(1));
    }

    #[test]
    fn test_watcher_reports_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let source = CatalogSource::from_path(&path);
        let watcher = CatalogWatcher::watch(&source).unwrap();
        assert!(!watcher.poll_changed());

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        let mut changed = false;
        while !changed {
            assert!(std::time::Instant::now() < deadline, "no change reported");
            std::fs::write(&path, SAMPLE.replace("Oak Chair", "Ash Chair")).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(50));
            changed = watcher.poll_changed();
        }
        assert_eq!(source.load().unwrap().get(0).unwrap().name, "Ash Chair");
    }

    #[test]
    fn test_catalog_source_from_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(CatalogSource::from_path(dir.path()), CatalogSource::Directory(_)));
        let file = dir.path().join("catalog.json");
        assert!(matches!(CatalogSource::from_path(&file), CatalogSource::Json(_)));
    }
}
