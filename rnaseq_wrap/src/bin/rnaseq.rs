//! rnaseq
#![deny(missing_docs)]

use anyhow::{Context, Result};
use clap::{self, Parser};
use rnaseq_wrap::cluster::Cluster;
use rnaseq_wrap::setup::{ConfigAssembler, PrebuiltImages, RunOpts};
use rnaseq_wrap::utils::{print_error_chain, CliPath};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const CMD: &str = "rnaseq";

fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Build run configurations for the bulk RNA-seq pipeline
#[derive(Parser, Debug)]
#[clap(name = CMD, version = get_version(), before_help = format!("{CMD} {}", get_version()))]
struct Rnaseq {
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Parser, Debug)]
enum SubCommand {
    /// Assemble the run configuration for a pipeline invocation.
    #[clap(name = "run")]
    Run(Run),
}

#[derive(Parser, Debug, Clone)]
struct Run {
    /// Reference genome name, or path to a descriptor (.json) produced
    /// by a previous build.
    #[clap(long, value_name = "GENOME", required = true)]
    genome: String,

    /// Pipeline output directory, created if it does not exist.
    #[clap(long, value_name = "PATH", required = true)]
    output: PathBuf,

    /// Input FASTQ files.
    #[clap(
        long,
        value_name = "PATH",
        required = true,
        value_delimiter = ',',
        num_args = 1..
    )]
    input: Vec<CliPath>,

    /// Use STAR two-pass basic alignment.
    #[clap(long = "star-2-pass-basic")]
    star_2_pass_basic: bool,

    /// Run the small-RNA quantification workflow.
    #[clap(long = "small-rna")]
    small_rna: bool,

    /// Wait until the run completes before returning.
    #[clap(long)]
    wait: bool,

    /// Stage outputs into a NIDAP-compatible folder.
    #[clap(long = "create-nidap-folder")]
    create_nidap_folder: bool,

    /// Directory with shared common databases, used in place of the
    /// bundled defaults.
    #[clap(long = "shared-resources", value_name = "PATH")]
    shared_resources: Option<CliPath>,

    /// Temporary directory preference for the run.
    #[clap(long = "tmp-dir", value_name = "PATH")]
    tmp_dir: Option<PathBuf>,
}

impl Run {
    fn execute(&self) -> Result<ExitCode> {
        let cluster = Cluster::detect();
        match cluster {
            Some(cluster) => println!(
                "Thank you for running {CMD} on {}!",
                cluster.name().to_uppercase()
            ),
            None => println!("Thank you for running {CMD}!"),
        }

        std::fs::create_dir_all(&self.output)
            .with_context(|| format!("creating output directory {}", self.output.display()))?;

        let opts = RunOpts {
            genome: self.genome.clone(),
            input: self.input.iter().map(|p| p.to_path_buf()).collect(),
            star_2_pass_basic: self.star_2_pass_basic,
            small_rna: self.small_rna,
            wait: self.wait,
            create_nidap_folder: self.create_nidap_folder,
            shared_resources: self.shared_resources.as_ref().map(|p| p.to_path_buf()),
            tmp_dir: self.tmp_dir.clone(),
        };

        // The renaming/symlinking normalization stage runs out of band;
        // the raw inputs double as the working file list here.
        let ifiles = opts.input.clone();

        // Path of installation is one above the binary.
        let exe = std::env::current_exe()?;
        let repo_path = exe
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let images = PrebuiltImages::default();
        let assembler = ConfigAssembler::new(
            &opts,
            &ifiles,
            &repo_path,
            &self.output,
            cluster,
            get_version(),
            &images,
        );
        assembler.assemble()?;
        println!("Done!");
        Ok(ExitCode::SUCCESS)
    }
}

fn inner_main() -> Result<ExitCode> {
    env_logger::init();
    let opts = Rnaseq::parse();
    match opts.subcmd {
        SubCommand::Run(run) => run.execute(),
    }
}

fn main() -> ExitCode {
    match inner_main() {
        Ok(exit_code) => exit_code,
        Err(err) => {
            print_error_chain(&err);
            ExitCode::FAILURE
        }
    }
}
