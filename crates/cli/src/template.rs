use crate::error::CliError;
use model::template::field_spec::{FieldSpec, parse_template};
use std::{fs, path::PathBuf};

const TEMPLATE_DIR: &str = ".sqltail.d";

/// `--template` takes inline JSON, or `@NAME` for a file found in the working
/// directory or in `~/.sqltail.d`.
pub fn load_template(arg: &str) -> Result<Vec<FieldSpec>, CliError> {
    let json = match arg.strip_prefix('@') {
        Some(name) => {
            let path = find_template(name, &search_dirs())
                .ok_or_else(|| CliError::TemplateNotFound(name.to_string()))?;
            fs::read_to_string(&path).map_err(|source| CliError::FileRead { path, source })?
        }
        None => arg.to_string(),
    };

    parse_template(&json).map_err(CliError::TemplateParse)
}

fn search_dirs() -> Vec<PathBuf> {
    let mut search = vec![PathBuf::from(".")];
    if let Some(home) = dirs::home_dir() {
        search.push(home.join(TEMPLATE_DIR));
    }
    search
}

fn find_template(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    dirs.iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}
