//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use collection_factory::SortBy;

/// Build osu! collection files from beatmap links, set IDs and osu!collector dumps.
///
/// Writes `<output-dir>/<name>.db` in the collection.db layout osu! reads.
#[derive(Parser, Debug)]
#[command(name = "collection-factory")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read defaults from this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve beatmap and set links in a text file
    File(FileArgs),
    /// Dump an osu!collector collection
    Collector(CollectorArgs),
    /// Print the contents of an existing collection file
    Inspect(InspectArgs),
}

/// Where to write the collection.
#[derive(ClapArgs, Debug, Clone)]
pub struct OutputArgs {
    /// Collection name (a trailing .db is ignored)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory the collection file is written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct FileArgs {
    /// Text file with one beatmap link, set link or beatmap ID per line
    #[arg(default_value = "list.txt")]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Skip sets whose beatmaps cannot be listed instead of failing
    #[arg(long)]
    pub ignore_invalid_set_ids: bool,

    /// Skip beatmaps that cannot be looked up instead of failing
    #[arg(long)]
    pub ignore_invalid_map_ids: bool,

    /// osu! OAuth client ID
    #[arg(long, env = "ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// osu! OAuth client secret
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// osu! API base URL
    #[arg(long, hide = true, default_value = collection_factory::gateway::DEFAULT_API_BASE)]
    pub api_base: String,

    /// osu! OAuth token URL
    #[arg(long, hide = true, default_value = collection_factory::gateway::DEFAULT_TOKEN_URL)]
    pub token_url: String,
}

/// Filter attribute accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortByArg {
    /// Beats per minute
    Bpm,
    /// Star rating
    #[value(name = "difficulty_rating", alias = "sr")]
    DifficultyRating,
}

impl From<SortByArg> for SortBy {
    fn from(value: SortByArg) -> Self {
        match value {
            SortByArg::Bpm => SortBy::Bpm,
            SortByArg::DifficultyRating => SortBy::DifficultyRating,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct CollectorArgs {
    /// osu!collector collection ID or URL
    pub collection: String,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Only keep beatmaps within --min..--max of this attribute
    #[arg(long, requires_all = ["min", "max"])]
    pub sort_by: Option<SortByArg>,

    /// Lower bound of the filter
    #[arg(long, requires = "sort_by")]
    pub min: Option<f64>,

    /// Upper bound of the filter
    #[arg(long, requires = "sort_by")]
    pub max: Option<f64>,

    /// osu!collector base URL
    #[arg(long, hide = true, default_value = collection_factory::collector::DEFAULT_COLLECTOR_BASE)]
    pub collector_base: String,
}

#[derive(ClapArgs, Debug)]
pub struct InspectArgs {
    /// Collection file to read
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_file_defaults() {
        let args = Args::try_parse_from(["collection-factory", "file"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        let Command::File(file) = args.command else {
            panic!("expected file subcommand");
        };
        assert_eq!(file.input, PathBuf::from("list.txt"));
        assert!(!file.ignore_invalid_set_ids);
        assert!(!file.ignore_invalid_map_ids);
        assert!(file.output.name.is_none());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["collection-factory", "-vv", "inspect", "x.db"]).unwrap();
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["collection-factory", "inspect", "x.db", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_cli_file_flags() {
        let args = Args::try_parse_from([
            "collection-factory",
            "file",
            "maps.txt",
            "--name",
            "favs",
            "--output-dir",
            "out",
            "--ignore-invalid-set-ids",
            "--client-id",
            "123",
            "--client-secret",
            "s3cret",
        ])
        .unwrap();
        let Command::File(file) = args.command else {
            panic!("expected file subcommand");
        };
        assert_eq!(file.input, PathBuf::from("maps.txt"));
        assert_eq!(file.output.name.as_deref(), Some("favs"));
        assert_eq!(file.output.output_dir, Some(PathBuf::from("out")));
        assert!(file.ignore_invalid_set_ids);
        assert_eq!(file.client_id.as_deref(), Some("123"));
        assert_eq!(file.client_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_cli_collector_filter() {
        let args = Args::try_parse_from([
            "collection-factory",
            "collector",
            "42",
            "--sort-by",
            "bpm",
            "--min",
            "120",
            "--max",
            "180",
        ])
        .unwrap();
        let Command::Collector(collector) = args.command else {
            panic!("expected collector subcommand");
        };
        assert_eq!(collector.collection, "42");
        assert_eq!(collector.sort_by, Some(SortByArg::Bpm));
        assert_eq!(collector.min, Some(120.0));
        assert_eq!(collector.max, Some(180.0));
    }

    #[test]
    fn test_cli_collector_filter_requires_bounds() {
        let result =
            Args::try_parse_from(["collection-factory", "collector", "42", "--sort-by", "bpm"]);
        assert!(result.is_err());

        let result = Args::try_parse_from(["collection-factory", "collector", "42", "--min", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Args::try_parse_from(["collection-factory"]).is_err());
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["collection-factory", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_sort_by_arg_maps_to_library_type() {
        assert_eq!(SortBy::from(SortByArg::Bpm), SortBy::Bpm);
        assert_eq!(
            SortBy::from(SortByArg::DifficultyRating),
            SortBy::DifficultyRating
        );
    }
}
