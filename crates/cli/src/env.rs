use crate::{args::ConnectionArgs, error::CliError};
use connectors::params::ConnectionParams;
use std::{
    collections::HashMap,
    fs,
    path::Path,
};
use tracing::debug;

pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_USER: &str = "DB_USER";
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DATABASE: &str = "DB_DATABASE";

const CLIENT_SECTION: &str = "client";

/// Default option files under the home directory, lowest precedence first.
const DEFAULT_OPTION_FILES: [&str; 2] = [".sqltail", ".my.cnf"];

/// INI-style option file contents (`[section]` and `key = value` lines), as
/// used by MySQL client tools.
#[derive(Debug, Clone, Default)]
pub struct OptionFile {
    sections: HashMap<String, HashMap<String, String>>,
}

impl OptionFile {
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| CliError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        self.parse_content(&content)
            .map_err(|msg| CliError::Config(format!("{}: {msg}", path.display())))?;
        debug!(path = %path.display(), "Loaded option file");
        Ok(())
    }

    /// Reads whichever default option files exist; values from later files
    /// replace earlier ones.
    pub fn load_defaults(&mut self, home: &Path) -> Result<(), CliError> {
        for name in DEFAULT_OPTION_FILES {
            let path = home.join(name);
            if path.is_file() {
                self.load_from_file(&path)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|values| values.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    fn parse_content(&mut self, content: &str) -> Result<(), String> {
        let mut section: Option<String> = None;

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            // `!include` and `!includedir` directives are not followed.
            if line.starts_with('!') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| format!("malformed section header at line {}", line_num + 1))?;
                section = Some(name.trim().to_string());
                continue;
            }

            let Some(current) = section.as_ref() else {
                return Err(format!(
                    "line {} is outside of any [section]",
                    line_num + 1
                ));
            };

            let (key, value) = match line.find(['=', ':']) {
                Some(pos) => (line[..pos].trim(), Self::unquote_value(&line[pos + 1..])),
                // Bare options such as `skip-ssl`.
                None => (line, String::new()),
            };

            if key.is_empty() {
                return Err(format!("empty key at line {}", line_num + 1));
            }

            self.sections
                .entry(current.clone())
                .or_default()
                .insert(key.to_lowercase(), value);
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            return value[1..value.len() - 1].to_string();
        }

        value.to_string()
    }
}

/// Resolves each connection parameter from the first source that has it:
/// command line flag, environment variable, then `[client]` option file entry.
#[derive(Debug, Clone, Default)]
pub struct ParamResolver {
    env: HashMap<String, String>,
    file: OptionFile,
}

impl ParamResolver {
    pub fn new(env: HashMap<String, String>, file: OptionFile) -> Self {
        Self { env, file }
    }

    /// Process environment plus `config_file`, or the default option files
    /// when none is given.
    pub fn from_system(config_file: Option<&Path>) -> Result<Self, CliError> {
        let mut file = OptionFile::default();
        match config_file {
            Some(path) => file.load_from_file(path)?,
            None => {
                if let Some(home) = dirs::home_dir() {
                    file.load_defaults(&home)?;
                }
            }
        }
        Ok(Self::new(std::env::vars().collect(), file))
    }

    pub fn params(&self, args: &ConnectionArgs) -> Result<ConnectionParams, CliError> {
        let host = self
            .lookup(args.host.as_deref(), ENV_HOST, "host")
            .ok_or(CliError::MissingParameter("host"))?;
        let user = self
            .lookup(args.user.as_deref(), ENV_USER, "user")
            .ok_or(CliError::MissingParameter("user"))?;
        let mut database = self
            .lookup(args.database.as_deref(), ENV_DATABASE, "database")
            .ok_or(CliError::MissingParameter("database"))?;
        if let Some(suffix) = &args.suffix {
            database.push_str(suffix);
        }

        let port = match args.port {
            Some(port) => Some(port),
            None => self
                .lookup(None, ENV_PORT, "port")
                .map(|port| {
                    port.parse::<u16>()
                        .map_err(|_| CliError::Config(format!("invalid port '{port}'")))
                })
                .transpose()?,
        };

        Ok(ConnectionParams {
            host: Some(host),
            port,
            user: Some(user),
            password: self.lookup(args.password.as_deref(), ENV_PASSWORD, "password"),
            database: Some(database),
        })
    }

    fn lookup(&self, flag: Option<&str>, env_key: &str, file_key: &str) -> Option<String> {
        let non_empty = |value: &&str| !value.is_empty();

        flag.filter(non_empty)
            .or_else(|| self.env.get(env_key).map(String::as_str).filter(non_empty))
            .or_else(|| self.file.get(CLIENT_SECTION, file_key).filter(non_empty))
            .map(str::to_string)
    }
}
