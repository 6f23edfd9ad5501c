use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipseek")]
#[command(version)]
#[command(about = "Search for keywords inside every entry of a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipseek logs.zip ERROR                   find ERROR in every entry of logs.zip\n  \
  zipseek logs.zip timeout refused -i      several keywords, ignoring case\n  \
  zipseek https://example.com/a.zip key    search a remote archive via Range requests\n  \
  zipseek --interactive                    prompt for keywords and archive")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "ARCHIVE", required_unless_present = "interactive")]
    pub archive: Option<String>,

    /// Keywords to search for
    #[arg(value_name = "KEYWORD", required_unless_present = "interactive")]
    pub keywords: Vec<String>,

    /// Perform case-insensitive search
    #[arg(short = 'i')]
    pub ignore_case: bool,

    /// Prompt for the keywords and the archive
    #[arg(long, conflicts_with_all = ["archive", "keywords"])]
    pub interactive: bool,

    /// Number of worker threads (default: available parallelism)
    #[arg(short = 'j', long = "jobs", value_name = "N")]
    pub jobs: Option<usize>,

    /// Only list entries that contain matches
    #[arg(short = 'q')]
    pub quiet: bool,
}
