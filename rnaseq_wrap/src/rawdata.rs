use regex::Regex;
use rnaseq_types::SetupError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Mate suffix convention for paired-end FASTQ file names.
fn mate_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.R[12]\.fastq\.gz").unwrap())
}

/// Read-end cardinality of the dataset. Classification is dataset-wide:
/// a single paired-end file forces the paired-end classification for all
/// files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadLayout {
    SingleEnd,
    PairedEnd,
}

impl ReadLayout {
    /// 1 = single-end, 2 = paired-end.
    pub fn nends(self) -> u64 {
        match self {
            ReadLayout::SingleEnd => 1,
            ReadLayout::PairedEnd => 2,
        }
    }
}

/// Derived layout of the input dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLayout {
    pub layout: ReadLayout,
    /// Unique sample basenames, first-seen order. Order matters for
    /// reproducible group labeling downstream.
    pub samples: Vec<String>,
}

/// Sample basename: the text before the first occurrence of the mate
/// suffix in the file name. Names that do not match the convention are
/// already-bare basenames.
fn sample_basename(file: &Path) -> String {
    let name = file
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    match mate_suffix().find(&name) {
        Some(m) => name[..m.start()].to_string(),
        None => name,
    }
}

/// Classify the (renamed) working input files as single- or paired-end
/// and derive the ordered unique sample basenames.
///
/// For paired-end data every sample must have both mates; any basename
/// seen exactly once fails the whole run with one combined report. An
/// R2-only sample is reported the same way as an R1-only one.
pub fn analyze_sample_layout(ifiles: &[PathBuf]) -> Result<SampleLayout, SetupError> {
    let layout = if ifiles
        .iter()
        .any(|f| f.to_string_lossy().ends_with(".R2.fastq.gz"))
    {
        ReadLayout::PairedEnd
    } else {
        ReadLayout::SingleEnd
    };

    let mut samples = Vec::new();
    let mut mate_counts: HashMap<String, usize> = HashMap::new();
    for file in ifiles {
        let sample = sample_basename(file);
        if !mate_counts.contains_key(&sample) {
            samples.push(sample.clone());
        }
        *mate_counts.entry(sample).or_insert(0) += 1;
    }

    if layout == ReadLayout::PairedEnd {
        let incomplete: Vec<String> = samples
            .iter()
            .filter(|sample| mate_counts[sample.as_str()] == 1)
            .cloned()
            .collect();
        if !incomplete.is_empty() {
            return Err(SetupError::MissingMate {
                samples: incomplete,
            });
        }
    }

    Ok(SampleLayout { layout, samples })
}

/// Distinct source directories of the raw user-supplied input files,
/// first-seen order, no duplicates. These are the host directories a
/// sandboxed execution environment must bind-mount.
///
/// Symbolic links are followed when the file exists; a file that does not
/// exist still resolves syntactically. No file is opened.
pub fn rawdata_bind_paths(input_files: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut bindpaths = Vec::new();
    for file in input_files {
        let resolved = match file.canonicalize() {
            Ok(path) => path,
            Err(_) => std::path::absolute(file)?,
        };
        let dir = resolved
            .parent()
            .unwrap_or_else(|| Path::new("/"))
            .to_path_buf();
        if !bindpaths.contains(&dir) {
            bindpaths.push(dir);
        }
    }
    Ok(bindpaths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_single_end_layout() {
        let layout = analyze_sample_layout(&paths(&[
            "s1.R1.fastq.gz",
            "s2.R1.fastq.gz",
            "plain.fastq.gz",
        ]))
        .unwrap();
        assert_eq!(layout.layout.nends(), 1);
        assert_eq!(layout.samples, vec!["s1", "s2", "plain.fastq.gz"]);
    }

    #[test]
    fn test_paired_end_layout() {
        let layout = analyze_sample_layout(&paths(&[
            "s1.R1.fastq.gz",
            "s1.R2.fastq.gz",
            "s2.R1.fastq.gz",
            "s2.R2.fastq.gz",
        ]))
        .unwrap();
        assert_eq!(layout.layout.nends(), 2);
        // Each basename exactly once, first-seen order.
        assert_eq!(layout.samples, vec!["s1", "s2"]);
    }

    #[test]
    fn test_missing_mate_names_the_offender() {
        let err = analyze_sample_layout(&paths(&[
            "a.R1.fastq.gz",
            "b.R1.fastq.gz",
            "b.R2.fastq.gz",
        ]))
        .unwrap_err();
        match err {
            SetupError::MissingMate { samples } => assert_eq!(samples, vec!["a"]),
            other => panic!("expected MissingMate, got {other:?}"),
        }
    }

    #[test]
    fn test_r2_only_sample_reported_like_r1_only() {
        let err = analyze_sample_layout(&paths(&[
            "a.R2.fastq.gz",
            "b.R1.fastq.gz",
            "b.R2.fastq.gz",
        ]))
        .unwrap_err();
        match err {
            SetupError::MissingMate { samples } => assert_eq!(samples, vec!["a"]),
            other => panic!("expected MissingMate, got {other:?}"),
        }
    }

    #[test]
    fn test_mate_suffix_stripped_at_first_occurrence() {
        assert_eq!(
            sample_basename(Path::new("/data/odd.R1.fastq.gz.R2.fastq.gz")),
            "odd"
        );
        assert_eq!(sample_basename(Path::new("/data/bare.fq")), "bare.fq");
    }

    #[test]
    fn test_bind_paths_deduplicate_directories() {
        let dir = tempfile::tempdir().unwrap();
        let f1 = dir.path().join("s1.R1.fastq.gz");
        let f2 = dir.path().join("s1.R2.fastq.gz");
        fs::write(&f1, b"").unwrap();
        fs::write(&f2, b"").unwrap();

        let bindpaths = rawdata_bind_paths(&[f1, f2]).unwrap();
        assert_eq!(bindpaths.len(), 1);
        assert_eq!(bindpaths[0], dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_bind_paths_follow_symlinks() {
        let src = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let target = src.path().join("s1.R1.fastq.gz");
        fs::write(&target, b"").unwrap();
        let link = staging.path().join("s1.R1.fastq.gz");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let bindpaths = rawdata_bind_paths(&[link]).unwrap();
        assert_eq!(bindpaths, vec![src.path().canonicalize().unwrap()]);
    }

    #[test]
    fn test_bind_paths_resolve_missing_files_syntactically() {
        let bindpaths =
            rawdata_bind_paths(&paths(&["/no/such/dir/s1.R1.fastq.gz"])).unwrap();
        assert_eq!(bindpaths, vec![PathBuf::from("/no/such/dir")]);
    }
}
