use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use certdata::{Options, Summary};
use clap::Args;
use log::info;

use crate::error::{Error, Result};

const DEFAULT_OUTPUT: &str = "CABundle.pem";

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the Mozilla certificate data file (certdata.txt)
    certdata: PathBuf,

    /// Path of the bundle to write. An existing file is replaced
    #[arg(default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Don't put labels in the output file
    #[arg(short = 'l', long, short_alias = 'L')]
    no_label: bool,
}

impl Config {
    fn options(&self) -> Options {
        Options {
            include_label: !self.no_label,
        }
    }
}

pub(crate) fn execute(config: Config) -> Result<Summary> {
    let input = open_input(&config.certdata)?;
    let output = replace_output(&config.output)?;

    info!("processing {:?}", config.certdata);
    let summary = certdata::convert(
        BufReader::new(input),
        BufWriter::new(output),
        config.options(),
    )?;

    info!(
        "{} certificates written to {:?} ({} certificate objects, {} canceled, {} lines)",
        summary.written, config.output, summary.certificates, summary.canceled, summary.lines
    );
    Ok(summary)
}

fn open_input(path: &Path) -> Result<File> {
    let input_error = |source: io::Error| Error::Input {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(input_error)?;
    if !file.metadata().map_err(input_error)?.is_file() {
        return Err(input_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(file)
}

fn replace_output(path: &Path) -> Result<File> {
    let output_error = |source: io::Error| Error::Output {
        path: path.to_path_buf(),
        source,
    };
    match fs::remove_file(path) {
        Ok(()) => info!("deleted file {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(output_error(e)),
    }
    File::create(path).map_err(output_error)
}
