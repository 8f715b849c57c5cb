use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Known cluster environments that ship bundled database templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    Biowulf,
    Frce,
}

impl Cluster {
    pub fn name(self) -> &'static str {
        match self {
            Cluster::Biowulf => "biowulf",
            Cluster::Frce => "frce",
        }
    }

    /// File name of this cluster's database-path overlay template.
    pub fn dbs_template(self) -> String {
        format!("dbs_{}.json", self.name())
    }

    fn from_host(host: &str) -> Option<Cluster> {
        if host.contains("biowulf") {
            Some(Cluster::Biowulf)
        } else if host.contains("fsitgl") {
            Some(Cluster::Frce)
        } else {
            None
        }
    }

    /// Identify the cluster this process is running on, if any.
    pub fn detect() -> Option<Cluster> {
        let host = env::var("HOSTNAME").ok().or_else(|| {
            hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned())
        })?;
        Cluster::from_host(&host)
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Effective temporary directory for a run. An explicit preference always
/// wins; biowulf jobs get node-local lscratch, everything else falls back
/// to the output root.
pub fn resolve_tmp_dir(
    preference: Option<&Path>,
    output_path: &Path,
    cluster: Option<Cluster>,
) -> PathBuf {
    if let Some(dir) = preference {
        return dir.to_path_buf();
    }
    match cluster {
        Some(Cluster::Biowulf) => PathBuf::from("/lscratch/$SLURM_JOBID"),
        _ => output_path.to_path_buf(),
    }
}
