//! Plugin repository credentials
//!
//! Resolves the API token used to publish plugins. The token lives in
//! a small TOML file in the user's home directory; when it is absent
//! the user is prompted for their email and password, the remote
//! profile is looked up (or created on first contact), and the
//! returned single-access token is persisted for next time.
//!
//! The remote repository sits behind [`PluginRepository`], and prompts
//! run over caller-supplied reader/writer pairs, so the whole flow is
//! testable without a network or a terminal.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-user credentials file, relative to the home
/// directory
pub const CONFIG_FILE_NAME: &str = ".lumen";

/// An author profile held by the plugin repository
#[derive(Debug, Clone)]
pub struct Profile {
    /// Short login handle
    pub login: String,
    /// Email address the account is registered under
    pub email: String,
    /// Token authorizing publish requests
    pub single_access_token: String,
}

/// Payload for creating a new author account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRequest {
    /// Requested login handle
    pub login: String,
    /// Email address to register
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Password confirmation, verified before the request is sent
    pub password_confirmation: String,
}

/// Remote plugin repository operations used by the credential flow
pub trait PluginRepository {
    /// Fetch the profile for an existing account
    ///
    /// # Errors
    /// [`CredentialsError::LoginNotFound`] when no account exists for
    /// `email`; [`CredentialsError::InvalidPassword`] when the
    /// password is rejected.
    fn login(&mut self, email: &str, password: &str) -> Result<Profile, CredentialsError>;

    /// Create a new author account and return its profile
    fn create_account(&mut self, request: &AccountRequest) -> Result<Profile, CredentialsError>;
}

/// Credential resolution errors
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// The repository rejected the password for a known login
    #[error("invalid password")]
    InvalidPassword,

    /// No account exists for the given email
    #[error("login not found")]
    LoginNotFound,

    /// The confirmation prompt did not match the password
    #[error("password and confirmation don't match")]
    PasswordMismatch,

    /// Any other failure reported by the repository
    #[error("plugin repository error: {0}")]
    Repository(String),

    /// Reading prompts or the config file failed
    #[error("credentials I/O error")]
    Io(#[from] std::io::Error),

    /// The config file exists but is not valid TOML
    #[error("malformed credentials file")]
    MalformedConfig(#[from] toml::de::Error),

    /// The config file could not be serialized
    #[error("could not serialize credentials file")]
    SerializeConfig(#[from] toml::ser::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

/// Interactive credential resolver
///
/// See the module docs for the resolution order. The resolved key is
/// memoized, so repeated [`Credentials::api_key`] calls prompt at most
/// once.
pub struct Credentials<R, I, O> {
    home: PathBuf,
    repository: R,
    input: I,
    output: O,
    api_key: Option<String>,
}

impl<R, I, O> Credentials<R, I, O>
where
    R: PluginRepository,
    I: BufRead,
    O: Write,
{
    /// Create a resolver rooted at the given home directory
    pub fn new(home: impl Into<PathBuf>, repository: R, input: I, output: O) -> Self {
        Self {
            home: home.into(),
            repository,
            input,
            output,
            api_key: None,
        }
    }

    /// Path of the credentials file this resolver reads and writes
    pub fn config_file(&self) -> PathBuf {
        self.home.join(CONFIG_FILE_NAME)
    }

    /// Resolve the API key
    ///
    /// A key already present in the config file wins without any
    /// repository traffic. Otherwise the user is prompted and the
    /// token returned by the repository is persisted before being
    /// handed back.
    ///
    /// # Errors
    /// Prompt I/O failures, config file failures, and every
    /// repository-side rejection.
    pub fn api_key(&mut self) -> Result<String, CredentialsError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        let key = self.find_api_key()?;
        self.api_key = Some(key.clone());
        Ok(key)
    }

    fn find_api_key(&mut self) -> Result<String, CredentialsError> {
        let path = self.config_file();
        let mut file = if path.is_file() {
            toml::from_str::<CredentialsFile>(&std::fs::read_to_string(&path)?)?
        } else {
            CredentialsFile::default()
        };

        if let Some(key) = file.api_key {
            return Ok(key);
        }

        let profile = self.authenticate()?;
        file.api_key = Some(profile.single_access_token.clone());
        std::fs::write(&path, toml::to_string(&file)?)?;
        log::info!("stored plugin repository API key in {}", path.display());
        Ok(profile.single_access_token)
    }

    fn authenticate(&mut self) -> Result<Profile, CredentialsError> {
        let email = self.prompt("Please enter your email address: ")?;
        let password = self.prompt("Please enter your password: ")?;

        match self.repository.login(&email, &password) {
            Err(CredentialsError::LoginNotFound) => self.create_account(email, password),
            other => other,
        }
    }

    fn create_account(
        &mut self,
        email: String,
        password: String,
    ) -> Result<Profile, CredentialsError> {
        let confirmation = self.prompt("Please confirm your password: ")?;
        if confirmation != password {
            return Err(CredentialsError::PasswordMismatch);
        }

        // Default the login handle to the local part of the email.
        let login = match email.find('@') {
            Some(at) => email[..at].to_string(),
            None => email.clone(),
        };
        log::debug!("creating plugin repository account '{login}'");
        self.repository.create_account(&AccountRequest {
            login,
            email,
            password,
            password_confirmation: confirmation,
        })
    }

    fn prompt(&mut self, message: &str) -> Result<String, CredentialsError> {
        self.output.write_all(message.as_bytes())?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Resolve the plugin repository API key in one call
///
/// # Errors
/// See [`Credentials::api_key`].
pub fn get_or_create_api_key<R: PluginRepository>(
    home: impl Into<PathBuf>,
    repository: R,
    input: impl BufRead,
    output: impl Write,
) -> Result<String, CredentialsError> {
    Credentials::new(home, repository, input, output).api_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;

    struct MockRepository {
        known_email: String,
        known_password: String,
        token: String,
        logins: u32,
        created: Vec<AccountRequest>,
    }

    impl MockRepository {
        fn with_account(email: &str, password: &str, token: &str) -> Self {
            Self {
                known_email: email.to_string(),
                known_password: password.to_string(),
                token: token.to_string(),
                logins: 0,
                created: Vec::new(),
            }
        }

        fn empty(token: &str) -> Self {
            Self::with_account("", "", token)
        }
    }

    impl PluginRepository for MockRepository {
        fn login(&mut self, email: &str, password: &str) -> Result<Profile, CredentialsError> {
            self.logins += 1;
            if email != self.known_email {
                return Err(CredentialsError::LoginNotFound);
            }
            if password != self.known_password {
                return Err(CredentialsError::InvalidPassword);
            }
            Ok(Profile {
                login: email.to_string(),
                email: email.to_string(),
                single_access_token: self.token.clone(),
            })
        }

        fn create_account(
            &mut self,
            request: &AccountRequest,
        ) -> Result<Profile, CredentialsError> {
            self.created.push(request.clone());
            Ok(Profile {
                login: request.login.clone(),
                email: request.email.clone(),
                single_access_token: self.token.clone(),
            })
        }
    }

    struct TempHome(PathBuf);

    impl TempHome {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "lumen-credentials-{tag}-{}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&dir);
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }

        fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for TempHome {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn test_existing_config_key_wins_without_repository_traffic() {
        let home = TempHome::new("existing");
        std::fs::write(home.path().join(CONFIG_FILE_NAME), "api_key = \"cached\"\n").unwrap();

        let mut credentials = Credentials::new(
            home.path(),
            MockRepository::empty("unused"),
            Cursor::new(Vec::new()),
            Vec::new(),
        );
        assert_eq!(credentials.api_key().unwrap(), "cached");
        assert_eq!(credentials.repository.logins, 0);
        assert!(credentials.output.is_empty());
    }

    #[test]
    fn test_login_persists_token_and_memoizes() {
        let home = TempHome::new("login");
        let mut credentials = Credentials::new(
            home.path(),
            MockRepository::with_account("dev@example.com", "secret", "tok-123"),
            Cursor::new(b"dev@example.com\nsecret\n".to_vec()),
            Vec::new(),
        );

        assert_eq!(credentials.api_key().unwrap(), "tok-123");
        // Second call answers from memory, not the repository.
        assert_eq!(credentials.api_key().unwrap(), "tok-123");
        assert_eq!(credentials.repository.logins, 1);

        let saved = std::fs::read_to_string(home.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(saved.contains("api_key = \"tok-123\""));

        let transcript = String::from_utf8(credentials.output.clone()).unwrap();
        assert!(transcript.contains("Please enter your email address: "));
        assert!(transcript.contains("Please enter your password: "));
    }

    #[test]
    fn test_unknown_login_creates_account_with_derived_handle() {
        let home = TempHome::new("create");
        let mut credentials = Credentials::new(
            home.path(),
            MockRepository::empty("tok-new"),
            Cursor::new(b"newdev@example.com\npw\npw\n".to_vec()),
            Vec::new(),
        );

        assert_eq!(credentials.api_key().unwrap(), "tok-new");
        assert_eq!(credentials.repository.created.len(), 1);
        let request = &credentials.repository.created[0];
        assert_eq!(request.login, "newdev");
        assert_eq!(request.email, "newdev@example.com");

        let transcript = String::from_utf8(credentials.output.clone()).unwrap();
        assert!(transcript.contains("Please confirm your password: "));
    }

    #[test]
    fn test_password_confirmation_mismatch_errors_and_persists_nothing() {
        let home = TempHome::new("mismatch");
        let mut credentials = Credentials::new(
            home.path(),
            MockRepository::empty("unused"),
            Cursor::new(b"newdev@example.com\npw\ndifferent\n".to_vec()),
            Vec::new(),
        );

        assert!(matches!(
            credentials.api_key(),
            Err(CredentialsError::PasswordMismatch)
        ));
        assert!(credentials.repository.created.is_empty());
        assert!(!home.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_invalid_password_propagates() {
        let home = TempHome::new("badpw");
        let result = get_or_create_api_key(
            home.path(),
            MockRepository::with_account("dev@example.com", "secret", "tok"),
            Cursor::new(b"dev@example.com\nwrong\n".to_vec()),
            Vec::new(),
        );
        assert!(matches!(result, Err(CredentialsError::InvalidPassword)));
    }
}
