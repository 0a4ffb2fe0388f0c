//! File pairing and admission
//!
//! Advice files arrive in pairs sharing a base name: one account file and
//! one submission file. A file is admitted only when its counterpart is
//! present; a half-delivered pair must not be processed. Singletons stay
//! in the directory untouched until an operator intervenes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use dagen_common::Result;

use crate::models::{AccountActivity, Activity, SubmissionActivity};

/// Both recognized extensions are exactly this long
const EXT_LEN: usize = 4;

/// One admitted advice file
#[derive(Debug, Clone)]
pub struct AdmittedFile {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Account,
    Submission,
}

fn kind_of(name: &str) -> Option<Kind> {
    if name.len() <= EXT_LEN {
        return None;
    }
    if name.ends_with(AccountActivity::FILE_EXT) {
        Some(Kind::Account)
    } else if name.ends_with(SubmissionActivity::FILE_EXT) {
        Some(Kind::Submission)
    } else {
        None
    }
}

/// Scan a directory and split its contents into admitted account and
/// submission files. Each returned list is ordered by modification time,
/// name as tiebreaker, so processing order is deterministic within a
/// round.
pub fn pair_directory(dir: &Path) -> Result<(Vec<AdmittedFile>, Vec<AdmittedFile>)> {
    let mut seen: HashMap<String, (bool, bool)> = HashMap::new();
    let mut candidates: Vec<(Kind, AdmittedFile)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        let Some(kind) = kind_of(&name) else {
            continue;
        };

        let stem = name[..name.len() - EXT_LEN].to_string();
        let flags = seen.entry(stem).or_insert((false, false));
        match kind {
            Kind::Account => flags.0 = true,
            Kind::Submission => flags.1 = true,
        }

        let modified = entry.metadata()?.modified()?;
        candidates.push((
            kind,
            AdmittedFile {
                path: entry.path(),
                name,
                modified,
            },
        ));
    }

    let mut accounts = Vec::new();
    let mut submissions = Vec::new();
    for (kind, file) in candidates {
        let stem = &file.name[..file.name.len() - EXT_LEN];
        if seen.get(stem) != Some(&(true, true)) {
            debug!(file = %file.name, "unpaired advice file, leaving in place");
            continue;
        }
        match kind {
            Kind::Account => accounts.push(file),
            Kind::Submission => submissions.push(file),
        }
    }

    accounts.sort_by(|a, b| (a.modified, &a.name).cmp(&(b.modified, &b.name)));
    submissions.sort_by(|a, b| (a.modified, &a.name).cmp(&(b.modified, &b.name)));

    Ok((accounts, submissions))
}
