//! AttachmentStager - writes uploads to disk under collision-safe names
//!
//! Candidate names for `report.pdf` are `report.pdf`, `report_1.pdf`,
//! `report_2.pdf`, ... bounded by `max_attempts`. A candidate is used when any
//! existing file there can be removed and the payload can be written.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{AttachmentRef, ContractError, SenderIdentity, StagingConfig, UploadedFile};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Name used when an upload carries no usable file name
const FALLBACK_NAME: &str = "attachment";

/// Staging metrics
#[derive(Debug, Default)]
pub struct StagingMetrics {
    /// Files written
    pub files_staged: AtomicU64,

    /// Candidates abandoned (claimed, not removable, or not writable)
    pub candidates_skipped: AtomicU64,

    /// Files that exhausted every candidate
    pub exhausted: AtomicU64,
}

impl StagingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_staged(&self) {
        self.files_staged.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("newsletter_attachments_staged_total").increment(1);
    }

    fn record_skipped(&self, reason: &'static str) {
        self.candidates_skipped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("newsletter_staging_candidates_skipped_total", "reason" => reason)
            .increment(1);
    }

    fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("newsletter_staging_exhausted_total").increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> StagingSnapshot {
        StagingSnapshot {
            files_staged: self.files_staged.load(Ordering::Relaxed),
            candidates_skipped: self.candidates_skipped.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Staging metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StagingSnapshot {
    pub files_staged: u64,
    pub candidates_skipped: u64,
    pub exhausted: u64,
}

/// Materializes uploads inside one directory
#[derive(Debug, Clone)]
pub struct AttachmentStager {
    dir: PathBuf,
    max_attempts: usize,
    metrics: Arc<StagingMetrics>,
}

impl AttachmentStager {
    /// Create a stager writing into `dir`, trying at most `max_attempts` names per file
    pub fn new(dir: impl Into<PathBuf>, max_attempts: usize) -> Self {
        Self {
            dir: dir.into(),
            max_attempts: max_attempts.max(1),
            metrics: Arc::new(StagingMetrics::new()),
        }
    }

    /// Attachment stager from the staging section
    pub fn for_attachments(config: &StagingConfig) -> Self {
        Self::new(&config.attachments_dir, config.max_attempts)
    }

    /// Recipient upload stager, when a recipients directory is configured
    pub fn for_recipients(config: &StagingConfig) -> Option<Self> {
        config
            .recipients_dir
            .as_ref()
            .map(|dir| Self::new(dir, config.max_attempts))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn metrics(&self) -> Arc<StagingMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Stage every upload, returning refs in input order
    ///
    /// Storage paths are unique within the call, even for identical names.
    ///
    /// # Errors
    /// `ContractError::Attachment` for the first file whose candidates are exhausted
    #[instrument(
        name = "attachment_stage",
        skip(self, files),
        fields(dir = %self.dir.display(), files = files.len())
    )]
    pub async fn stage(&self, files: &[UploadedFile]) -> Result<Vec<AttachmentRef>, ContractError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_dir(files[0].file_name.as_str()).await?;

        let mut claimed = HashSet::with_capacity(files.len());
        let mut staged = Vec::with_capacity(files.len());
        for file in files {
            let name = sanitize_file_name(&file.file_name);
            let storage_path = self.place(&name, &file.content, &mut claimed).await?;
            staged.push(AttachmentRef {
                original_name: file.file_name.clone(),
                storage_path,
            });
        }

        info!(staged = staged.len(), "Attachments staged");
        Ok(staged)
    }

    /// Keep a copy of a recipient upload as `<user>_<file name>`
    #[instrument(
        name = "recipient_file_stage",
        skip(self, file),
        fields(dir = %self.dir.display(), sender = %sender)
    )]
    pub async fn stage_recipient_file(
        &self,
        file: &UploadedFile,
        sender: &SenderIdentity,
    ) -> Result<AttachmentRef, ContractError> {
        self.ensure_dir(&file.file_name).await?;

        // 用户名也可能带路径分隔符
        let name = sanitize_file_name(&format!(
            "{}_{}",
            sender.user_name(),
            sanitize_file_name(&file.file_name)
        ));
        let storage_path = self.place(&name, &file.content, &mut HashSet::new()).await?;

        debug!(path = %storage_path.display(), "Recipient file staged");
        Ok(AttachmentRef {
            original_name: file.file_name.clone(),
            storage_path,
        })
    }

    async fn ensure_dir(&self, file_name: &str) -> Result<(), ContractError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            ContractError::attachment(
                file_name,
                0,
                format!("cannot create directory {}: {e}", self.dir.display()),
            )
        })
    }

    /// Walk the candidate sequence for `name` until one accepts the payload
    async fn place(
        &self,
        name: &str,
        content: &Bytes,
        claimed: &mut HashSet<PathBuf>,
    ) -> Result<PathBuf, ContractError> {
        let mut last_error = String::from("every candidate name was already taken");

        for (attempt, candidate) in candidate_names(name, self.max_attempts).enumerate() {
            let path = self.dir.join(&candidate);

            if claimed.contains(&path) {
                self.metrics.record_skipped("claimed");
                continue;
            }

            if let Err(e) = remove_existing(&path).await {
                warn!(attempt, path = %path.display(), error = %e, "Existing file cannot be replaced");
                self.metrics.record_skipped("not_removable");
                last_error = format!("{}: {e}", path.display());
                continue;
            }

            match fs::write(&path, content).await {
                Ok(()) => {
                    debug!(attempt, path = %path.display(), bytes = content.len(), "File staged");
                    self.metrics.record_staged();
                    claimed.insert(path.clone());
                    return Ok(path);
                }
                Err(e) => {
                    warn!(attempt, path = %path.display(), error = %e, "Write failed");
                    self.metrics.record_skipped("not_writable");
                    last_error = format!("{}: {e}", path.display());
                }
            }
        }

        self.metrics.record_exhausted();
        Err(ContractError::attachment(name, self.max_attempts, last_error))
    }
}

/// Remove whatever file sits at `path`; a missing file is fine
async fn remove_existing(path: &Path) -> std::io::Result<()> {
    match fs::symlink_metadata(path).await {
        Ok(_) => fs::remove_file(path).await,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Bounded candidate sequence: `name`, `stem_1.ext`, `stem_2.ext`, ...
pub fn candidate_names(name: &str, max_attempts: usize) -> impl Iterator<Item = String> + '_ {
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let ext = path.extension().and_then(|e| e.to_str());

    (0..max_attempts).map(move |n| match (n, ext) {
        (0, _) => name.to_string(),
        (n, Some(ext)) => format!("{stem}_{n}.{ext}"),
        (n, None) => format!("{stem}_{n}"),
    })
}

/// Final path component of an uploaded name, with either separator style
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match base {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        base => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(name: &str, content: &str) -> UploadedFile {
        UploadedFile::new(name, content.as_bytes().to_vec())
    }

    #[test]
    fn test_candidate_sequence() {
        let names: Vec<_> = candidate_names("report.pdf", 4).collect();
        assert_eq!(
            names,
            vec!["report.pdf", "report_1.pdf", "report_2.pdf", "report_3.pdf"]
        );

        let names: Vec<_> = candidate_names("README", 2).collect();
        assert_eq!(names, vec!["README", "README_1"]);
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name(".."), "attachment");
        assert_eq!(sanitize_file_name("dir/"), "attachment");
    }

    #[tokio::test]
    async fn test_stage_writes_payload() {
        let dir = TempDir::new().unwrap();
        let stager = AttachmentStager::new(dir.path().join("uploads"), 8);

        let refs = stager.stage(&[upload("report.pdf", "pdf-bytes")]).await.unwrap();

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].original_name, "report.pdf");
        assert_eq!(refs[0].storage_path, dir.path().join("uploads/report.pdf"));
        let written = std::fs::read_to_string(&refs[0].storage_path).unwrap();
        assert_eq!(written, "pdf-bytes");
    }

    #[tokio::test]
    async fn test_identical_names_get_unique_paths() {
        let dir = TempDir::new().unwrap();
        let stager = AttachmentStager::new(dir.path(), 8);

        let refs = stager
            .stage(&[
                upload("report.pdf", "one"),
                upload("report.pdf", "two"),
                upload("sub/report.pdf", "three"),
            ])
            .await
            .unwrap();

        let paths: HashSet<_> = refs.iter().map(|r| r.storage_path.clone()).collect();
        assert_eq!(paths.len(), 3);
        assert_eq!(refs[1].storage_path, dir.path().join("report_1.pdf"));
        assert_eq!(refs[2].storage_path, dir.path().join("report_2.pdf"));
        assert_eq!(std::fs::read_to_string(&refs[0].storage_path).unwrap(), "one");
        assert_eq!(std::fs::read_to_string(&refs[2].storage_path).unwrap(), "three");
    }

    #[tokio::test]
    async fn test_existing_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "old").unwrap();
        let stager = AttachmentStager::new(dir.path(), 8);

        let refs = stager.stage(&[upload("notes.txt", "new")]).await.unwrap();

        assert_eq!(refs[0].storage_path, dir.path().join("notes.txt"));
        assert_eq!(std::fs::read_to_string(&refs[0].storage_path).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_unremovable_entry_falls_back_to_next_candidate() {
        let dir = TempDir::new().unwrap();
        // a directory cannot be removed with remove_file
        std::fs::create_dir(dir.path().join("notes.txt")).unwrap();
        let stager = AttachmentStager::new(dir.path(), 8);

        let refs = stager.stage(&[upload("notes.txt", "new")]).await.unwrap();

        assert_eq!(refs[0].storage_path, dir.path().join("notes_1.txt"));
        assert!(dir.path().join("notes.txt").is_dir());
        assert_eq!(stager.metrics().snapshot().candidates_skipped, 1);
    }

    #[tokio::test]
    async fn test_exhaustion_is_attachment_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("notes.txt")).unwrap();
        std::fs::create_dir(dir.path().join("notes_1.txt")).unwrap();
        let stager = AttachmentStager::new(dir.path(), 2);

        let err = stager.stage(&[upload("notes.txt", "new")]).await.unwrap_err();

        match &err {
            ContractError::Attachment {
                file_name,
                attempts,
                ..
            } => {
                assert_eq!(file_name, "notes.txt");
                assert_eq!(*attempts, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_batch_abort());
        assert_eq!(stager.metrics().snapshot().exhausted, 1);
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("inner");
        let stager = AttachmentStager::new(&target, 8);

        let refs = stager.stage(&[upload("../escape.txt", "x")]).await.unwrap();

        assert_eq!(refs[0].storage_path, target.join("escape.txt"));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_recipient_file_is_prefixed_with_sender() {
        let dir = TempDir::new().unwrap();
        let config = StagingConfig {
            attachments_dir: dir.path().join("attachments"),
            recipients_dir: Some(dir.path().join("recipients")),
            max_attempts: 8,
        };
        let stager = AttachmentStager::for_recipients(&config).unwrap();

        let staged = stager
            .stage_recipient_file(
                &upload("list.csv", "Email,Title,Name\n"),
                &SenderIdentity::new("jdoe"),
            )
            .await
            .unwrap();

        assert_eq!(
            staged.storage_path,
            dir.path().join("recipients").join("jdoe_list.csv")
        );
    }

    #[tokio::test]
    async fn test_sender_with_path_segments_stays_inside_dir() {
        let dir = TempDir::new().unwrap();
        let config = StagingConfig {
            attachments_dir: dir.path().join("attachments"),
            recipients_dir: Some(dir.path().join("recipients")),
            max_attempts: 8,
        };
        let stager = AttachmentStager::for_recipients(&config).unwrap();

        let staged = stager
            .stage_recipient_file(
                &upload("list.csv", "Email,Title,Name\n"),
                &SenderIdentity::new("../x"),
            )
            .await
            .unwrap();

        assert_eq!(
            staged.storage_path,
            dir.path().join("recipients").join("x_list.csv")
        );
        assert!(!dir.path().join("x_list.csv").exists());
    }

    #[test]
    fn test_no_recipient_stager_without_dir() {
        assert!(AttachmentStager::for_recipients(&StagingConfig::default()).is_none());
    }
}
