use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub path: PathBuf,
    pub text_ui: bool,
    pub batch_cycles: Option<usize>,
    pub trace_json: bool,
    pub verbose: bool,
}

impl From<&crate::cli::Args> for Config {
    fn from(a: &crate::cli::Args) -> Self {
        let (path, text_ui) = match (&a.cli, &a.file) {
            (Some(p), _) => (p.clone(), true),
            (None, Some(p)) => (p.clone(), false),
            // clap's required mode group rules this out.
            (None, None) => (PathBuf::new(), true),
        };
        Self {
            path,
            text_ui,
            batch_cycles: a.run,
            trace_json: a.trace_json,
            verbose: a.verbose,
        }
    }
}
