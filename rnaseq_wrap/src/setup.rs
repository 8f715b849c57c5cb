use crate::cluster::{resolve_tmp_dir, Cluster};
use crate::gitinfo;
use crate::rawdata::{analyze_sample_layout, rawdata_bind_paths};
use crate::templates::TemplateLoader;
use anyhow::Result;
use itertools::Itertools;
use rnaseq_types::config::{child_array_mut, child_object_mut};
use rnaseq_types::{PipelineConfig, SetupError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Name of the persisted run configuration within the output directory.
pub const CONFIG_FILE: &str = "config.json";

const TEMPLATE_DIR: &str = "config/templates";
const GENOME_DIR: &str = "config/genomes";

/// Database bundle expected inside a shared-resources directory.
const KRAKEN_DB_DIRNAME: &str = "20180907_standard_kraken2";

/// Run-mode facts collected from the command line.
#[derive(Debug, Clone)]
pub struct RunOpts {
    /// Reference name, or a path to a pre-built descriptor (ends in .json).
    pub genome: String,
    /// Raw user-supplied input FASTQ files.
    pub input: Vec<PathBuf>,
    pub star_2_pass_basic: bool,
    pub small_rna: bool,
    pub wait: bool,
    pub create_nidap_folder: bool,
    pub shared_resources: Option<PathBuf>,
    pub tmp_dir: Option<PathBuf>,
}

/// Supplies resolved container image references for the run. The content
/// is an opaque pass-through from the cache stage; the assembler does not
/// inspect it.
pub trait ImageResolver {
    fn resolve(&self, config: &mut PipelineConfig) -> Result<()>;
}

/// Image references resolved ahead of time by an external cache stage.
#[derive(Debug, Default)]
pub struct PrebuiltImages(pub Map<String, Value>);

impl ImageResolver for PrebuiltImages {
    fn resolve(&self, config: &mut PipelineConfig) -> Result<()> {
        for (key, value) in &self.0 {
            config
                .region_mut("images")
                .insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Builds the run configuration from templates, dataset facts and
/// command-line options, persists it to `<output>/config.json` and
/// returns it. All fatal checks run before the write; a failed run never
/// leaves a partial config behind.
pub struct ConfigAssembler<'a> {
    opts: &'a RunOpts,
    /// Renamed working input files (post-normalization), used for
    /// classification and sample naming.
    ifiles: &'a [PathBuf],
    /// Pipeline installation directory.
    repo_path: &'a Path,
    output_path: &'a Path,
    cluster: Option<Cluster>,
    version: &'a str,
    images: &'a dyn ImageResolver,
}

impl<'a> ConfigAssembler<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        opts: &'a RunOpts,
        ifiles: &'a [PathBuf],
        repo_path: &'a Path,
        output_path: &'a Path,
        cluster: Option<Cluster>,
        version: &'a str,
        images: &'a dyn ImageResolver,
    ) -> Self {
        ConfigAssembler {
            opts,
            ifiles,
            repo_path,
            output_path,
            cluster,
            version,
            images,
        }
    }

    /// Resolve the reference-genome descriptor: either a direct path to a
    /// pre-built descriptor, or a bundled reference selected by name from
    /// the per-cluster genome directory.
    fn genome_config_path(&self) -> Result<PathBuf, SetupError> {
        let path = if self.opts.genome.ends_with(".json") {
            let given = Path::new(&self.opts.genome);
            std::path::absolute(given).map_err(|source| SetupError::Io {
                path: given.to_path_buf(),
                source,
            })?
        } else {
            let mut path = self.output_path.join(GENOME_DIR);
            if let Some(cluster) = self.cluster {
                path.push(cluster.name());
            }
            path.join(format!("{}.json", self.opts.genome))
        };
        if !path.exists() {
            return Err(SetupError::ReferenceNotFound { path });
        }
        Ok(path)
    }

    fn add_user_information(&self, config: &mut PipelineConfig) {
        let home = dirs::home_dir().unwrap_or_default();
        let username = home
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let project = config.project_mut();
        project.insert("userhome".to_string(), path_value(&home));
        project.insert("username".to_string(), Value::from(username));
    }

    fn add_rawdata_information(&self, config: &mut PipelineConfig) -> Result<()> {
        let sample_layout = analyze_sample_layout(self.ifiles)?;
        config
            .project_mut()
            .insert("nends".to_string(), Value::from(sample_layout.layout.nends()));

        let bindpaths = rawdata_bind_paths(&self.opts.input)?;
        let datapath = bindpaths.iter().map(|path| path.display()).join(",");
        config
            .project_mut()
            .insert("datapath".to_string(), Value::from(datapath));

        // Each unique basename once across the three parallel sequences;
        // group and label default to the basename.
        let groups = child_object_mut(config.project_mut(), "groups");
        for key in ["rsamps", "rgroups", "rlabels"] {
            child_array_mut(groups, key)
                .extend(sample_layout.samples.iter().map(|s| Value::from(s.as_str())));
        }
        Ok(())
    }

    pub fn assemble(&self) -> Result<PipelineConfig> {
        let genome_config = self.genome_config_path()?;

        let loader = TemplateLoader::new(self.output_path);
        let mut config = PipelineConfig::from(loader.join(&[
            Path::new(TEMPLATE_DIR).join("project.json"),
            genome_config,
            Path::new(TEMPLATE_DIR).join("tools.json"),
        ])?);

        // Cluster-specific database paths update the tool-parameter
        // mapping in place; this is the one region that is not
        // overwritten whole.
        if let Some(cluster) = self.cluster {
            let dbs = loader.load(&Path::new(TEMPLATE_DIR).join(cluster.dbs_template()))?;
            config.tool_parameters_mut().extend(dbs);
        }

        self.add_user_information(&mut config);
        self.add_rawdata_information(&mut config)?;

        self.images.resolve(&mut config)?;

        let workpath = std::path::absolute(self.output_path)?;
        let organism = self
            .opts
            .genome
            .split('_')
            .next()
            .unwrap_or_default()
            .to_string();
        let project = config.project_mut();
        project.insert("annotation".to_string(), Value::from(self.opts.genome.as_str()));
        project.insert("version".to_string(), Value::from(self.version));
        project.insert("pipelinehome".to_string(), path_value(self.repo_path));
        project.insert("workpath".to_string(), path_value(&workpath));
        project.insert("organism".to_string(), Value::from(organism));

        let tmp_dir = resolve_tmp_dir(
            self.opts.tmp_dir.as_deref(),
            self.output_path,
            self.cluster,
        );
        let options = config.options_mut();
        options.insert(
            "star_2_pass_basic".to_string(),
            bool_flag(self.opts.star_2_pass_basic),
        );
        options.insert("small_rna".to_string(), bool_flag(self.opts.small_rna));
        options.insert("tmp_dir".to_string(), path_value(&tmp_dir));
        options.insert(
            "shared_resources".to_string(),
            match &self.opts.shared_resources {
                Some(dir) => path_value(dir),
                None => Value::Null,
            },
        );
        options.insert("wait".to_string(), bool_flag(self.opts.wait));
        options.insert(
            "create_nidap_folder".to_string(),
            bool_flag(self.opts.create_nidap_folder),
        );

        config.project_mut().insert(
            "git_commit_hash".to_string(),
            Value::from(gitinfo::repo_commit_hash(self.repo_path)),
        );

        if let Some(shared) = &self.opts.shared_resources {
            config.tool_parameters_mut().insert(
                "KRAKENBACDB".to_string(),
                path_value(&shared.join(KRAKEN_DB_DIRNAME)),
            );
        }

        let config_path = self.output_path.join(CONFIG_FILE);
        println!("Generating config file in '{}'...", config_path.display());
        config.write_json(&config_path)?;

        Ok(config)
    }
}

/// The downstream workflow consumes run-mode flags as literal strings.
fn bool_flag(value: bool) -> Value {
    Value::from(if value { "True" } else { "False" })
}

fn path_value(path: &Path) -> Value {
    Value::from(path.display().to_string())
}
