use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "safe-dom")]
#[command(about = "Render JSON node trees to escaped HTML", long_about = None)]
pub struct Cli {
    #[arg(long, help = "Path to document files (can be specified multiple times)")]
    pub documents: Vec<PathBuf>,

    #[arg(long, default_value = "out", help = "Output directory")]
    pub out: PathBuf,

    #[arg(long, default_value = "logs", help = "Log directory")]
    pub log_dir: PathBuf,

    #[arg(long, help = "Stop at the first document that fails")]
    pub fail_fast: bool,

    #[arg(long, help = "Validate and render without writing output")]
    pub validate_only: bool,

    #[arg(long, help = "Prefix output files with <!DOCTYPE html>")]
    pub doctype: bool,

    #[arg(long, default_value_t = 10, help = "Number of build logs to keep")]
    pub max_log_builds: usize,
}

impl Cli {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["safe-dom", "--documents", "a.json"]).unwrap();
        assert_eq!(cli.documents, vec![PathBuf::from("a.json")]);
        assert_eq!(cli.out, PathBuf::from("out"));
        assert_eq!(cli.log_dir, PathBuf::from("logs"));
        assert_eq!(cli.max_log_builds, 10);
        assert!(!cli.fail_fast);
    }

    #[test]
    fn test_repeated_documents() {
        let cli = Cli::try_parse_from([
            "safe-dom",
            "--documents",
            "a.json",
            "--documents",
            "b.json",
            "--fail-fast",
            "--doctype",
        ])
        .unwrap();
        assert_eq!(cli.documents.len(), 2);
        assert!(cli.fail_fast);
        assert!(cli.doctype);
    }
}
