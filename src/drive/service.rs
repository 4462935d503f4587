//! Tenant-scoped drive operations.

use std::collections::BTreeSet;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::listing::DirEntry;
use super::path::{remove_accents, RelativePath, TenantRoot};
use crate::storage::{ObjectBody, ObjectInfo, PutBody, SharedStore, DELIMITER, OWNER_TAG};
use crate::{DriveError, Result};

/// Drive operations for one tenant root.
///
/// Keys are never built here by hand: every key goes through
/// [`TenantRoot::key`].
#[derive(Clone)]
pub struct Drive {
    store: SharedStore,
    root: TenantRoot,
    client_area: String,
}

impl Drive {
    /// Create a drive over `root`. `client_area` is the name of the
    /// protected folder shared with external users.
    pub fn new(store: SharedStore, root: TenantRoot, client_area: impl Into<String>) -> Self {
        Self {
            store,
            root,
            client_area: client_area.into(),
        }
    }

    /// Tenant root this drive is scoped to.
    pub fn root(&self) -> &TenantRoot {
        &self.root
    }

    /// Whether this drive is itself a client area (an external login).
    pub fn is_client_area(&self) -> bool {
        self.root.has_segment(&self.client_area)
    }

    /// Label of the home breadcrumb.
    pub fn home_label(&self) -> String {
        if self.is_client_area() {
            self.client_area.replace('_', " ")
        } else {
            "Home".to_string()
        }
    }

    /// Whether `path` is the protected client-area folder.
    pub fn is_system_folder(&self, path: &RelativePath) -> bool {
        !self.is_client_area()
            && path.segments().len() == 1
            && path.name() == Some(self.client_area.as_str())
    }

    /// Create the root marker and the client-area folder on first login.
    pub async fn initialize(&self) -> Result<()> {
        let listing = self.store.list(&self.root.prefix(), Some(DELIMITER)).await?;
        if !listing.objects.is_empty() || !listing.common_prefixes.is_empty() {
            return Ok(());
        }

        self.store.put(&self.root.prefix(), PutBody::Empty).await?;
        if !self.is_client_area() {
            let area = RelativePath::parse_folder(&self.client_area)?;
            self.create_folder(&area).await?;
        }
        info!(tenant = %self.root, "Initialized tenant root");
        Ok(())
    }

    /// Direct children of a folder.
    pub async fn list_folder(&self, path: &RelativePath) -> Result<Vec<DirEntry>> {
        let prefix = self.root.key(&path.clone().into_folder());
        let listing = self.store.list(&prefix, Some(DELIMITER)).await?;

        let mut entries = Vec::with_capacity(listing.objects.len() + listing.common_prefixes.len());
        for common in &listing.common_prefixes {
            if let Some(entry) = self.folder_entry(common) {
                entries.push(entry);
            }
        }
        for object in listing.objects.iter().filter(|o| o.key != prefix) {
            if let Some(entry) = self.file_entry(object) {
                entries.push(entry);
            }
        }

        self.with_owners(entries).await
    }

    /// Recursive, case- and accent-insensitive search on entry names.
    ///
    /// A blank needle finds nothing.
    pub async fn find(&self, path: &RelativePath, needle: &str) -> Result<Vec<DirEntry>> {
        let needle = fold(needle.trim());
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let prefix = self.root.key(&path.clone().into_folder());
        let listing = self.store.list(&prefix, None).await?;

        // Folders come from markers and from every ancestor prefix of a key,
        // so a folder holding only files is found as well.
        let mut folders = BTreeSet::new();
        let mut entries = Vec::new();
        for object in &listing.objects {
            let Some(below) = object.key.strip_prefix(&prefix) else {
                continue;
            };
            for (idx, _) in below.match_indices(DELIMITER) {
                folders.insert(format!("{prefix}{}", &below[..=idx]));
            }
            if below.is_empty() || below.ends_with(DELIMITER) {
                continue;
            }
            if let Some(entry) = self
                .file_entry(object)
                .filter(|e| fold(&e.name).contains(&needle))
            {
                entries.push(entry);
            }
        }
        let mut matched: Vec<DirEntry> = folders
            .iter()
            .filter_map(|key| self.folder_entry(key))
            .filter(|e| fold(&e.name).contains(&needle))
            .collect();
        matched.append(&mut entries);
        let entries = matched;

        debug!(tenant = %self.root, prefix, matches = entries.len(), "Search finished");
        self.with_owners(entries).await
    }

    /// Create a folder marker.
    pub async fn create_folder(&self, path: &RelativePath) -> Result<()> {
        let path = path.clone().into_folder();
        if path.is_root() {
            return Err(DriveError::Validation("folder name is empty".to_string()));
        }
        let key = self.root.key(&path);
        self.store.put(&key, PutBody::Empty).await?;
        info!(tenant = %self.root, key, "Created folder");
        Ok(())
    }

    /// Delete a single file.
    pub async fn delete_file(&self, path: &RelativePath) -> Result<()> {
        if path.is_folder() {
            return Err(DriveError::InvalidPath(path.to_string()));
        }
        let key = self.root.key(path);
        self.store.delete(&key).await?;
        info!(tenant = %self.root, key, "Deleted file");
        Ok(())
    }

    /// Delete a folder with everything below it. Returns the number of
    /// objects removed.
    pub async fn delete_folder(&self, path: &RelativePath) -> Result<usize> {
        let path = path.clone().into_folder();
        if path.is_root() {
            return Err(DriveError::Validation("cannot delete the root folder".to_string()));
        }
        if self.is_system_folder(&path) {
            return Err(DriveError::Validation(format!("{path} is a system folder")));
        }

        let prefix = self.root.key(&path);
        let listing = self.store.list(&prefix, None).await?;

        let mut keys: Vec<String> = listing.objects.into_iter().map(|o| o.key).collect();
        if !keys.contains(&prefix) {
            keys.push(prefix.clone());
        }
        self.store.delete_many(&keys).await?;

        info!(tenant = %self.root, prefix, objects = keys.len(), "Deleted folder");
        Ok(keys.len())
    }

    /// Move or rename a folder.
    ///
    /// Every key under the source is listed before anything is written.
    /// Markers are recreated and files copied under the destination, and
    /// the source objects are deleted only once every copy succeeded. A
    /// failure part way leaves both trees in place; nothing is rolled back.
    ///
    /// Returns `false` when the source holds no objects.
    pub async fn move_folder(&self, from: &RelativePath, to: &RelativePath) -> Result<bool> {
        let from = from.clone().into_folder();
        let to = to.clone().into_folder();

        if from == to {
            return Ok(true);
        }
        if from.is_root() || to.is_root() {
            return Err(DriveError::Validation("cannot move the root folder".to_string()));
        }
        if from.contains(&to) {
            return Err(DriveError::Validation(format!(
                "cannot move {from} into itself"
            )));
        }
        if self.is_system_folder(&from) {
            return Err(DriveError::Validation(format!("{from} is a system folder")));
        }

        let old_prefix = self.root.key(&from);
        let new_prefix = self.root.key(&to);

        let listing = self.store.list(&old_prefix, None).await?;
        if listing.objects.is_empty() {
            debug!(tenant = %self.root, from = %old_prefix, "Nothing to move");
            return Ok(false);
        }

        self.store.put(&new_prefix, PutBody::Empty).await?;
        for object in &listing.objects {
            let Some(rest) = object.key.strip_prefix(&old_prefix) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let target = format!("{new_prefix}{rest}");
            if object.size == 0 {
                self.store.put(&target, PutBody::Empty).await?;
            } else {
                self.store.copy(&object.key, &target).await?;
            }
        }

        let old_keys: Vec<String> = listing.objects.into_iter().map(|o| o.key).collect();
        self.store.delete_many(&old_keys).await?;

        info!(
            tenant = %self.root,
            from = %old_prefix,
            to = %new_prefix,
            objects = old_keys.len(),
            "Moved folder"
        );
        Ok(true)
    }

    /// Move a file into another folder, keeping its name.
    ///
    /// Returns `false` when the destination exists and `override_existing`
    /// is off.
    pub async fn move_file(
        &self,
        from_dir: &RelativePath,
        to_dir: &RelativePath,
        name: &str,
        override_existing: bool,
    ) -> Result<bool> {
        let from = from_dir.clone().into_folder().join(name)?;
        let to = to_dir.clone().into_folder().join(name)?;
        self.relocate(&from, &to, override_existing).await
    }

    /// Rename a file inside its folder.
    ///
    /// Returns `false` when the new name is taken and `override_existing`
    /// is off.
    pub async fn rename_file(
        &self,
        dir: &RelativePath,
        name: &str,
        new_name: &str,
        override_existing: bool,
    ) -> Result<bool> {
        let dir = dir.clone().into_folder();
        let from = dir.join(name)?;
        let to = dir.join(new_name)?;
        self.relocate(&from, &to, override_existing).await
    }

    /// Copy then delete a single object.
    ///
    /// The existence check and the copy are separate requests; a writer
    /// racing in between can still be overwritten.
    async fn relocate(
        &self,
        from: &RelativePath,
        to: &RelativePath,
        override_existing: bool,
    ) -> Result<bool> {
        if from.is_folder() || to.is_folder() {
            return Err(DriveError::InvalidPath(format!("{from} -> {to}")));
        }
        if from == to {
            return Ok(true);
        }

        let from_key = self.root.key(from);
        let to_key = self.root.key(to);

        if self.store.head(&from_key).await?.is_none() {
            return Err(DriveError::NotFound(from.to_string()));
        }
        if !override_existing && self.store.head(&to_key).await?.is_some() {
            debug!(tenant = %self.root, to = %to_key, "Destination exists");
            return Ok(false);
        }

        self.store.copy(&from_key, &to_key).await?;
        self.store.delete(&from_key).await?;

        info!(tenant = %self.root, from = %from_key, to = %to_key, "Moved file");
        Ok(true)
    }

    /// Open a file for streaming.
    pub async fn get(&self, path: &RelativePath) -> Result<Option<ObjectBody>> {
        if path.is_folder() {
            return Ok(None);
        }
        self.store.get(&self.root.key(path)).await
    }

    /// Store a file in `dir` and tag it with the uploading user.
    pub async fn put(
        &self,
        dir: &RelativePath,
        name: &str,
        body: PutBody,
        user: Option<&str>,
    ) -> Result<RelativePath> {
        let path = dir.clone().into_folder().join(name)?;
        if path.is_folder() {
            return Err(DriveError::InvalidPath(name.to_string()));
        }

        let key = self.root.key(&path);
        self.store.put(&key, body).await?;

        if let Some(user) = user.map(str::trim).filter(|u| !u.is_empty()) {
            let tags = [(OWNER_TAG.to_string(), remove_accents(user))];
            self.store.put_tags(&key, &tags).await?;
        }

        info!(tenant = %self.root, key, "Stored file");
        Ok(path)
    }

    fn folder_entry(&self, key: &str) -> Option<DirEntry> {
        let path = self.root.relative(key)?;
        let name = path.trim_end_matches('/').rsplit('/').next()?;
        if name.is_empty() {
            return None;
        }
        Some(DirEntry::folder(path, name))
    }

    fn file_entry(&self, object: &ObjectInfo) -> Option<DirEntry> {
        let path = self.root.relative(&object.key)?;
        let name = path.rsplit('/').next()?;
        if name.is_empty() {
            return None;
        }
        Some(DirEntry::file(path, name, object.size, object.last_modified))
    }

    /// Fill in the uploader tag of each file. Tag lookups that fail leave
    /// the owner empty.
    async fn with_owners(&self, mut entries: Vec<DirEntry>) -> Result<Vec<DirEntry>> {
        let lookups = entries.iter().map(|entry| async move {
            if entry.is_folder {
                return String::new();
            }
            let Ok(path) = RelativePath::parse(&entry.path) else {
                return String::new();
            };
            let key = self.root.key(&path);
            match self.store.get_tags(&key).await {
                Ok(tags) => tags
                    .into_iter()
                    .find(|(k, _)| k == OWNER_TAG)
                    .map(|(_, v)| v)
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(key, error = %e, "Failed to read object tags");
                    String::new()
                }
            }
        });

        let owners = join_all(lookups).await;
        for (entry, owner) in entries.iter_mut().zip(owners) {
            entry.owner = owner;
        }
        Ok(entries)
    }
}

fn fold(s: &str) -> String {
    remove_accents(&s.to_lowercase())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::storage::{drain_pages, storage_error, Listing, MemoryObjectStore, ObjectStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const AREA: &str = "Área_do_Cliente";

    /// Memory store that lists in small pages, records every call and can
    /// fail one copy.
    struct RecordingStore {
        inner: MemoryObjectStore,
        page_size: usize,
        fail_copy_at: Option<usize>,
        copies: AtomicUsize,
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingStore {
        fn new(page_size: usize, fail_copy_at: Option<usize>) -> Self {
            Self {
                inner: MemoryObjectStore::new(),
                page_size,
                fail_copy_at,
                copies: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<Listing> {
            let full = self.inner.list(prefix, delimiter).await?;
            let pages: Vec<Vec<ObjectInfo>> = full
                .objects
                .chunks(self.page_size)
                .map(<[ObjectInfo]>::to_vec)
                .collect();
            let pages = &pages;
            let prefixes = &full.common_prefixes;

            drain_pages(|token: Option<String>| async move {
                self.record("list_page");
                let index: usize = token.as_deref().map_or(0, |t| t.parse().unwrap());
                let page = Listing {
                    objects: pages.get(index).cloned().unwrap_or_default(),
                    common_prefixes: if index == 0 {
                        prefixes.clone()
                    } else {
                        Vec::new()
                    },
                };
                let next = (index + 1 < pages.len()).then(|| (index + 1).to_string());
                Ok::<_, DriveError>((page, next))
            })
            .await
        }

        async fn head(&self, key: &str) -> Result<Option<ObjectInfo>> {
            self.inner.head(key).await
        }

        async fn get(&self, key: &str) -> Result<Option<ObjectBody>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, body: PutBody) -> Result<()> {
            self.record("put");
            self.inner.put(key, body).await
        }

        async fn copy(&self, from: &str, to: &str) -> Result<()> {
            let n = self.copies.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_copy_at == Some(n) {
                return Err(storage_error("copy_object", "connection reset"));
            }
            self.record("copy");
            self.inner.copy(from, to).await
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.record("delete");
            self.inner.delete(key).await
        }

        async fn get_tags(&self, key: &str) -> Result<Vec<(String, String)>> {
            self.inner.get_tags(key).await
        }

        async fn put_tags(&self, key: &str, tags: &[(String, String)]) -> Result<()> {
            self.inner.put_tags(key, tags).await
        }
    }

    async fn recording_drive(
        store: RecordingStore,
        keys: &[&str],
    ) -> (Arc<RecordingStore>, Drive) {
        for key in keys {
            let body = if key.ends_with('/') {
                PutBody::Empty
            } else {
                PutBody::Bytes(Bytes::from(key.to_string()))
            };
            store.inner.put(key, body).await.unwrap();
        }
        let store = Arc::new(store);
        let drive = Drive::new(store.clone(), TenantRoot::new("acme").unwrap(), AREA);
        (store, drive)
    }

    async fn setup(objects: &[(&str, &str)]) -> (Arc<MemoryObjectStore>, Drive) {
        let store = Arc::new(MemoryObjectStore::new());
        for (key, content) in objects {
            let body = if content.is_empty() {
                PutBody::Empty
            } else {
                PutBody::Bytes(Bytes::from(content.to_string()))
            };
            store.put(key, body).await.unwrap();
        }
        let drive = Drive::new(store.clone(), TenantRoot::new("acme").unwrap(), AREA);
        (store, drive)
    }

    fn rel(raw: &str) -> RelativePath {
        RelativePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_creates_markers() {
        let (store, drive) = setup(&[]).await;

        drive.initialize().await.unwrap();

        assert_eq!(
            store.keys().await,
            vec!["acme/".to_string(), format!("acme/{AREA}/")]
        );
    }

    #[tokio::test]
    async fn test_initialize_is_noop_when_populated() {
        let (store, drive) = setup(&[("acme/a.txt", "a")]).await;

        drive.initialize().await.unwrap();

        assert_eq!(store.keys().await, vec!["acme/a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_initialize_client_area_root() {
        let store = Arc::new(MemoryObjectStore::new());
        let root = TenantRoot::new(&format!("acme/{AREA}")).unwrap();
        let drive = Drive::new(store.clone(), root, AREA);

        drive.initialize().await.unwrap();

        assert_eq!(store.keys().await, vec![format!("acme/{AREA}/")]);
        assert!(drive.is_client_area());
        assert_eq!(drive.home_label(), "Área do Cliente");
    }

    #[tokio::test]
    async fn test_list_folder() {
        let (_store, drive) = setup(&[
            ("acme/", ""),
            ("acme/a.txt", "aaa"),
            ("acme/docs/", ""),
            ("acme/docs/b.txt", "b"),
            ("other/secret.txt", "s"),
        ])
        .await;

        let root = drive.list_folder(&RelativePath::root()).await.unwrap();
        let paths: Vec<_> = root.iter().map(|e| (e.path.as_str(), e.is_folder)).collect();
        assert_eq!(paths, vec![("docs/", true), ("a.txt", false)]);
        assert_eq!(root[1].size, 3);
        assert_eq!(root[1].extension, "txt");

        let docs = drive.list_folder(&rel("docs")).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, "docs/b.txt");
        assert_eq!(docs[0].name, "b.txt");
    }

    #[tokio::test]
    async fn test_list_folder_reads_owner_tag() {
        let (_store, drive) = setup(&[]).await;
        drive
            .put(&RelativePath::root(), "a.txt", PutBody::Bytes(Bytes::from_static(b"x")), Some("João"))
            .await
            .unwrap();

        let entries = drive.list_folder(&RelativePath::root()).await.unwrap();
        assert_eq!(entries[0].owner, "Joao");
    }

    #[tokio::test]
    async fn test_find_is_recursive_and_accent_insensitive() {
        let (_store, drive) = setup(&[
            ("acme/", ""),
            ("acme/Relatório.pdf", "r"),
            ("acme/docs/", ""),
            ("acme/docs/relatorio-2024.xlsx", "x"),
            ("acme/docs/other.txt", "o"),
            ("acme/Relatorios/", ""),
        ])
        .await;

        let found = drive.find(&RelativePath::root(), "RELATORIO").await.unwrap();
        let mut paths: Vec<_> = found.iter().map(|e| e.path.as_str()).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec!["Relatorios/", "Relatório.pdf", "docs/relatorio-2024.xlsx"]
        );

        let scoped = drive.find(&rel("docs/"), "relat").await.unwrap();
        assert_eq!(scoped.len(), 1);

        assert!(drive.find(&RelativePath::root(), "  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_folder_without_marker() {
        let (_store, drive) = setup(&[("acme/Relatorios/2024/x.txt", "x")]).await;

        let listed = drive.list_folder(&RelativePath::root()).await.unwrap();
        assert_eq!(listed[0].path, "Relatorios/");

        let found = drive.find(&RelativePath::root(), "relatorios").await.unwrap();
        let paths: Vec<_> = found.iter().map(|e| (e.path.as_str(), e.is_folder)).collect();
        assert_eq!(paths, vec![("Relatorios/", true)]);

        let nested = drive.find(&RelativePath::root(), "2024").await.unwrap();
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].path, "Relatorios/2024/");

        let scoped = drive.find(&rel("Relatorios/"), "relatorios").await.unwrap();
        assert!(scoped.is_empty());
    }

    #[tokio::test]
    async fn test_move_folder() {
        let (store, drive) = setup(&[("acme/X/", ""), ("acme/X/f.txt", "content")]).await;

        let moved = drive.move_folder(&rel("X/"), &rel("Y/")).await.unwrap();

        assert!(moved);
        assert_eq!(
            store.keys().await,
            vec!["acme/Y/".to_string(), "acme/Y/f.txt".to_string()]
        );
        assert_eq!(
            store.read("acme/Y/f.txt").await.unwrap(),
            Bytes::from_static(b"content")
        );
    }

    #[tokio::test]
    async fn test_move_folder_keeps_source_when_a_copy_fails() {
        let keys = ["acme/X/", "acme/X/a.txt", "acme/X/b.txt", "acme/X/c.txt"];
        let (store, drive) = recording_drive(RecordingStore::new(1000, Some(2)), &keys).await;

        let result = drive.move_folder(&rel("X/"), &rel("Y/")).await;

        assert!(matches!(result, Err(DriveError::Storage(_))));
        for key in keys {
            assert!(store.inner.read(key).await.is_some(), "{key} lost");
        }
        assert_eq!(
            store.inner.read("acme/X/b.txt").await.unwrap(),
            Bytes::from_static(b"acme/X/b.txt")
        );
        assert!(!store.calls().contains(&"delete"));
    }

    #[tokio::test]
    async fn test_move_folder_drains_every_page_before_deleting() {
        let keys = [
            "acme/X/",
            "acme/X/1.txt",
            "acme/X/2.txt",
            "acme/X/3.txt",
            "acme/X/sub/",
            "acme/X/sub/4.txt",
        ];
        let (store, drive) = recording_drive(RecordingStore::new(2, None), &keys).await;

        assert!(drive.move_folder(&rel("X/"), &rel("Y/")).await.unwrap());

        let calls = store.calls();
        let pages = calls.iter().filter(|c| **c == "list_page").count();
        assert_eq!(pages, 3);
        let last_page = calls.iter().rposition(|c| *c == "list_page").unwrap();
        let first_write = calls.iter().position(|c| *c != "list_page").unwrap();
        assert!(last_page < first_write);
        let last_copy = calls.iter().rposition(|c| *c == "copy").unwrap();
        let first_delete = calls.iter().position(|c| *c == "delete").unwrap();
        assert!(last_copy < first_delete);
        assert_eq!(calls.iter().filter(|c| **c == "copy").count(), 4);

        assert_eq!(
            store.inner.keys().await,
            vec![
                "acme/Y/",
                "acme/Y/1.txt",
                "acme/Y/2.txt",
                "acme/Y/3.txt",
                "acme/Y/sub/",
                "acme/Y/sub/4.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_move_folder_preserves_tree() {
        let (store, drive) = setup(&[
            ("acme/src/", ""),
            ("acme/src/a.txt", "a"),
            ("acme/src/empty/", ""),
            ("acme/src/nested/", ""),
            ("acme/src/nested/b.bin", "bbb"),
            ("acme/srcx/keep.txt", "k"),
        ])
        .await;

        assert!(drive.move_folder(&rel("src/"), &rel("dst/deep/")).await.unwrap());

        assert_eq!(
            store.keys().await,
            vec![
                "acme/dst/deep/",
                "acme/dst/deep/a.txt",
                "acme/dst/deep/empty/",
                "acme/dst/deep/nested/",
                "acme/dst/deep/nested/b.bin",
                "acme/srcx/keep.txt",
            ]
        );
        assert_eq!(
            store.read("acme/dst/deep/nested/b.bin").await.unwrap(),
            Bytes::from_static(b"bbb")
        );
    }

    #[tokio::test]
    async fn test_move_folder_same_path_is_noop() {
        let (store, drive) = setup(&[("acme/X/", ""), ("acme/X/f.txt", "c")]).await;

        assert!(drive.move_folder(&rel("X/"), &rel("X")).await.unwrap());
        assert_eq!(store.keys().await.len(), 2);
    }

    #[tokio::test]
    async fn test_move_folder_repeated_is_false() {
        let (_store, drive) = setup(&[("acme/X/", ""), ("acme/X/f.txt", "c")]).await;

        assert!(drive.move_folder(&rel("X/"), &rel("Y/")).await.unwrap());
        assert!(!drive.move_folder(&rel("X/"), &rel("Y/")).await.unwrap());
    }

    #[tokio::test]
    async fn test_move_folder_into_itself_is_rejected() {
        let (store, drive) = setup(&[("acme/X/", ""), ("acme/X/f.txt", "c")]).await;

        let err = drive.move_folder(&rel("X/"), &rel("X/sub/")).await.unwrap_err();
        assert!(matches!(err, DriveError::Validation(_)));
        assert_eq!(store.keys().await.len(), 2);
    }

    #[tokio::test]
    async fn test_system_folder_is_protected() {
        let (_store, drive) = setup(&[]).await;
        drive.initialize().await.unwrap();
        let area = RelativePath::parse_folder(AREA).unwrap();

        assert!(drive.is_system_folder(&area));
        assert!(drive.move_folder(&area, &rel("x/")).await.is_err());
        assert!(drive.delete_folder(&area).await.is_err());
        assert!(!drive.is_system_folder(&rel("docs/")));
    }

    #[tokio::test]
    async fn test_delete_folder() {
        let (store, drive) = setup(&[
            ("acme/d/", ""),
            ("acme/d/a.txt", "a"),
            ("acme/d/sub/b.txt", "b"),
            ("acme/dx.txt", "x"),
        ])
        .await;

        let removed = drive.delete_folder(&rel("d/")).await.unwrap();

        assert_eq!(removed, 3);
        assert_eq!(store.keys().await, vec!["acme/dx.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_root_is_rejected() {
        let (_store, drive) = setup(&[("acme/", "")]).await;
        assert!(drive.delete_folder(&RelativePath::root()).await.is_err());
    }

    #[tokio::test]
    async fn test_move_file_collision_leaves_both_untouched() {
        let (store, drive) = setup(&[("acme/a/f.txt", "source"), ("acme/b/f.txt", "dest")]).await;

        let moved = drive.move_file(&rel("a/"), &rel("b/"), "f.txt", false).await.unwrap();

        assert!(!moved);
        assert_eq!(store.read("acme/a/f.txt").await.unwrap(), Bytes::from_static(b"source"));
        assert_eq!(store.read("acme/b/f.txt").await.unwrap(), Bytes::from_static(b"dest"));
    }

    #[tokio::test]
    async fn test_move_file_with_override() {
        let (store, drive) = setup(&[("acme/a/f.txt", "source"), ("acme/b/f.txt", "dest")]).await;

        assert!(drive.move_file(&rel("a/"), &rel("b/"), "f.txt", true).await.unwrap());
        assert_eq!(store.keys().await, vec!["acme/b/f.txt".to_string()]);
        assert_eq!(store.read("acme/b/f.txt").await.unwrap(), Bytes::from_static(b"source"));
    }

    #[tokio::test]
    async fn test_move_file_to_root() {
        let (store, drive) = setup(&[("acme/a/f.txt", "x")]).await;

        assert!(drive
            .move_file(&rel("a/"), &RelativePath::root(), "f.txt", false)
            .await
            .unwrap());
        assert_eq!(store.keys().await, vec!["acme/f.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_move_missing_file_is_not_found() {
        let (_store, drive) = setup(&[]).await;
        let err = drive
            .move_file(&rel("a/"), &rel("b/"), "f.txt", false)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rename_file() {
        let (store, drive) = setup(&[("acme/d/old.txt", "x"), ("acme/d/taken.txt", "y")]).await;

        assert!(!drive.rename_file(&rel("d/"), "old.txt", "taken.txt", false).await.unwrap());
        assert!(drive.rename_file(&rel("d/"), "old.txt", "new.txt", false).await.unwrap());
        assert_eq!(
            store.keys().await,
            vec!["acme/d/new.txt".to_string(), "acme/d/taken.txt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, drive) = setup(&[]).await;

        let path = drive
            .put(&rel("docs/"), "a.txt", PutBody::Bytes(Bytes::from_static(b"hello")), None)
            .await
            .unwrap();
        assert_eq!(path.to_string(), "docs/a.txt");
        assert!(store.get_tags("acme/docs/a.txt").await.unwrap().is_empty());

        let body = drive.get(&path).await.unwrap().unwrap();
        assert_eq!(body.into_bytes().await.unwrap(), b"hello");

        assert!(drive.get(&rel("docs/missing.txt")).await.unwrap().is_none());
        assert!(drive.get(&rel("docs/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_rejects_nested_names() {
        let (_store, drive) = setup(&[]).await;
        let result = drive
            .put(&RelativePath::root(), "../x.txt", PutBody::Empty, None)
            .await;
        assert!(matches!(result, Err(DriveError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_create_and_delete_file() {
        let (store, drive) = setup(&[("acme/a.txt", "a")]).await;

        drive.create_folder(&rel("new")).await.unwrap();
        drive.delete_file(&rel("a.txt")).await.unwrap();

        assert_eq!(store.keys().await, vec!["acme/new/".to_string()]);
        assert!(drive.create_folder(&RelativePath::root()).await.is_err());
    }
}
