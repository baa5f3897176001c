use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::exchange::error::{ExchangeError, Result};

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineArgs {
    #[arg(long, short)]
    pub config_path: Option<String>,
    #[arg(long, short)]
    pub num_parts: Option<u32>,
    #[arg(long, short)]
    pub seed: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    partitioning: Partitioning,
    data: MessageData,
    output: Output,
}

impl Config {
    /// Reads the config file if one is given and applies the command line overrides on top.
    pub fn from_args(args: &CommandLineArgs) -> Result<Self> {
        let mut config = match &args.config_path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        if let Some(num_parts) = args.num_parts {
            config.set_partitioning(Partitioning { num_parts });
        }
        if let Some(seed) = args.seed {
            config.set_data(MessageData { seed: Some(seed) });
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let config: Config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.partitioning.num_parts < 1 {
            return Err(ExchangeError::Config(String::from(
                "A ring needs at least one partition",
            )));
        }
        Ok(())
    }

    pub fn partitioning(&self) -> Partitioning {
        self.partitioning.clone()
    }

    pub fn set_partitioning(&mut self, partitioning: Partitioning) {
        self.partitioning = partitioning;
    }

    pub fn data(&self) -> MessageData {
        self.data.clone()
    }

    pub fn set_data(&mut self, data: MessageData) {
        self.data = data;
    }

    pub fn output(&self) -> Output {
        self.output.clone()
    }

    pub fn set_output(&mut self, output: Output) {
        self.output = output;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Partitioning {
    pub num_parts: u32,
}

impl Default for Partitioning {
    fn default() -> Self {
        Partitioning { num_parts: 1 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MessageData {
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Output {
    /// Log files are only written if this is set.
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Output {
    fn default() -> Self {
        Output {
            output_dir: None,
            logging: Logging::Info,
        }
    }
}

/// Have this extra layer of log level enum, as tracing subscriber has no
/// off/none option by default. At least it can't be parsed
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub enum Logging {
    None,
    #[default]
    Info,
    Debug,
}

impl Logging {
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Logging::None => LevelFilter::OFF,
            Logging::Info => LevelFilter::INFO,
            Logging::Debug => LevelFilter::DEBUG,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tracing::level_filters::LevelFilter;

    use crate::exchange::config::{
        CommandLineArgs, Config, Logging, MessageData, Output, Partitioning,
    };
    use crate::exchange::error::ExchangeError;

    #[test]
    fn read_from_yaml() {
        let mut config = Config::default();
        config.set_partitioning(Partitioning { num_parts: 4 });
        config.set_data(MessageData { seed: Some(42) });
        config.set_output(Output {
            output_dir: Some(String::from("./output")),
            logging: Logging::Debug,
        });

        let yaml = serde_yaml::to_string(&config).expect("Failed to serialize yaml");
        let parsed_config: Config = serde_yaml::from_str(&yaml).expect("failed to parse config");

        assert_eq!(config, parsed_config);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let yaml = "partitioning:\n  num_parts: 3\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(3, config.partitioning().num_parts);
        assert_eq!(None, config.data().seed);
        assert_eq!(Output::default(), config.output());
    }

    #[test]
    fn no_config_file() {
        let config = Config::from_args(&CommandLineArgs::default()).unwrap();
        assert_eq!(Config::default(), config);
        assert_eq!(1, config.partitioning().num_parts);
    }

    #[test]
    fn args_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "partitioning:\n  num_parts: 2\ndata:\n  seed: 1\noutput:\n  logging: None"
        )
        .unwrap();

        let args = CommandLineArgs {
            config_path: Some(file.path().to_str().unwrap().to_string()),
            num_parts: Some(6),
            seed: Some(99),
        };
        let config = Config::from_args(&args).unwrap();

        assert_eq!(6, config.partitioning().num_parts);
        assert_eq!(Some(99), config.data().seed);
        assert_eq!(Logging::None, config.output().logging);
    }

    #[test]
    fn zero_parts_rejected() {
        let args = CommandLineArgs {
            num_parts: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            Config::from_args(&args),
            Err(ExchangeError::Config(_))
        ));
    }

    #[test]
    fn missing_file() {
        let result = Config::from_file("/this/path/does/not/exist.yml");
        assert!(matches!(result, Err(ExchangeError::Io(_))));
    }

    #[test]
    fn broken_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "partitioning: [1, 2").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ExchangeError::Yaml(_))
        ));
    }

    #[test]
    fn logging_levels() {
        assert_eq!(LevelFilter::OFF, Logging::None.level_filter());
        assert_eq!(LevelFilter::DEBUG, Logging::Debug.level_filter());
    }
}
