use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort configuration synthesis. Every variant names the
/// specific resource or samples at fault; none of them leave a partial
/// config file behind.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A required template file is absent.
    #[error("required template does not exist: {}", .path.display())]
    ResourceNotFound { path: PathBuf },

    /// The resolved reference-genome descriptor is absent.
    #[error(
        "genome config file does not exist: {}\n\
         Provide the name of a bundled reference genome, or the path to a \
         descriptor produced by the build subcommand.",
        .path.display()
    )]
    ReferenceNotFound { path: PathBuf },

    /// A template file is not a valid JSON object.
    #[error("malformed template {}: {source}", .path.display())]
    MalformedTemplate {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Paired-end data where one or more samples lack a complete mate
    /// pair. One combined report for all offending samples.
    #[error("{}", missing_mate_report(.samples))]
    MissingMate { samples: Vec<String> },

    /// An I/O failure other than a missing resource.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn missing_mate_report(samples: &[String]) -> String {
    format!(
        "detected paired-end data but both mates (R1 and R2) were not provided \
         for the following samples:\n\t{}\n\
         The basename for each sample must be consistent across mates, e.g.\n\
         \tconsistent_basename.R1.fastq.gz\n\
         \tconsistent_basename.R2.fastq.gz\n\
         Running a mixture of single-end and paired-end samples in one \
         invocation is not supported. Please run paired-end samples and \
         single-end samples separately, in two separate output directories.",
        samples.join("\n\t")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_mate_names_every_sample() {
        let err = SetupError::MissingMate {
            samples: vec!["wt_rep1".to_string(), "ko_rep2".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("wt_rep1"));
        assert!(msg.contains("ko_rep2"));
        assert!(msg.contains("not supported"));
    }

    #[test]
    fn test_resource_not_found_names_the_path() {
        let err = SetupError::ResourceNotFound {
            path: PathBuf::from("/out/config/templates/tools.json"),
        };
        assert!(err.to_string().contains("/out/config/templates/tools.json"));
    }
}
