//! Collecting authentication details from the operator.
//!
//! The actual terminal I/O sits behind [`Prompter`], so the collection logic can
//! be driven by scripted answers in tests.

use std::io;

use crate::auth::{AuthBackend, AuthDetails};

/// Interactive input capability.
pub trait Prompter {
    /// Ask for a single line. `hidden` answers must not be echoed.
    fn ask(&mut self, message: &str, hidden: bool) -> io::Result<String>;

    /// Let the operator pick one of `options`, returning its index.
    fn select(&mut self, message: &str, options: &[&str]) -> io::Result<usize>;
}

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to read {field:?}")]
    Prompt {
        field: String,
        #[source]
        source: io::Error,
    },
}

/// Ask for every detail `backend` declares, in declared order.
///
/// Stops at the first prompt failure; the partially filled details are
/// dropped, so a caller can never log in with them.
pub fn collect(
    backend: &dyn AuthBackend,
    prompter: &mut dyn Prompter,
) -> Result<AuthDetails, CollectError> {
    let mut details = backend.auth_details();

    for detail in details.iter_mut() {
        let answer = prompter
            .ask(&detail.prompt, detail.hidden)
            .map_err(|source| CollectError::Prompt {
                field: detail.name.clone(),
                source,
            })?;
        detail.set_value(answer);
    }

    tracing::debug!(method = backend.method(), fields = details.len(), "collected auth details");
    Ok(details)
}

/// Prompter backed by the controlling terminal (stderr).
#[cfg(feature = "tui")]
#[derive(Debug, Default)]
pub struct TerminalPrompter;

#[cfg(feature = "tui")]
impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "tui")]
fn into_io(err: dialoguer::Error) -> io::Error {
    match err {
        dialoguer::Error::IO(err) => err,
    }
}

#[cfg(feature = "tui")]
impl Prompter for TerminalPrompter {
    fn ask(&mut self, message: &str, hidden: bool) -> io::Result<String> {
        use dialoguer::console::Term;
        use dialoguer::{theme::ColorfulTheme, Input, Password};

        let theme = ColorfulTheme::default();
        let term = Term::stderr();

        if hidden {
            Password::with_theme(&theme)
                .with_prompt(message)
                .interact_on(&term)
                .map_err(into_io)
        } else {
            Input::<String>::with_theme(&theme)
                .with_prompt(message)
                .interact_on(&term)
                .map_err(into_io)
        }
    }

    fn select(&mut self, message: &str, options: &[&str]) -> io::Result<usize> {
        use dialoguer::console::Term;
        use dialoguer::{theme::ColorfulTheme, Select};

        if options.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "nothing to select from",
            ));
        }

        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .items(options)
            .default(0)
            .interact_on(&Term::stderr())
            .map_err(into_io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use serde_json::{Map, Value};

    use crate::auth::{AuthError, Detail};

    /// Scripted answers; `None` makes that prompt fail.
    struct Scripted {
        answers: Vec<Option<&'static str>>,
        asked: Vec<(String, bool)>,
    }

    impl Scripted {
        fn new(answers: Vec<Option<&'static str>>) -> Self {
            Self {
                answers,
                asked: Vec::new(),
            }
        }
    }

    impl Prompter for Scripted {
        fn ask(&mut self, message: &str, hidden: bool) -> io::Result<String> {
            let index = self.asked.len();
            self.asked.push((message.to_string(), hidden));
            match self.answers.get(index).copied().flatten() {
                Some(answer) => Ok(answer.to_string()),
                None => Err(io::Error::new(io::ErrorKind::Interrupted, "ctrl-c")),
            }
        }

        fn select(&mut self, _message: &str, _options: &[&str]) -> io::Result<usize> {
            Ok(0)
        }
    }

    /// Three-field backend recording whether `data` was ever called.
    struct ThreeFields {
        data_called: Arc<AtomicBool>,
    }

    impl AuthBackend for ThreeFields {
        fn method(&self) -> &str {
            "three"
        }

        fn auth_details(&self) -> AuthDetails {
            AuthDetails::new(vec![
                Detail::new("org", "Organization"),
                Detail::new("user", "User"),
                Detail::hidden("otp", "One-time code"),
            ])
        }

        fn path(&self, details: &AuthDetails) -> Result<String, AuthError> {
            Ok(format!("auth/three/login/{}", details.require("user")?))
        }

        fn data(&self, _details: &AuthDetails) -> Result<Map<String, Value>, AuthError> {
            self.data_called.store(true, Ordering::SeqCst);
            Ok(Map::new())
        }
    }

    #[test]
    fn test_collect_fills_in_declared_order() {
        let backend = ThreeFields {
            data_called: Arc::new(AtomicBool::new(false)),
        };
        let mut prompter = Scripted::new(vec![Some("acme"), Some("alice"), Some("123456")]);

        let details = collect(&backend, &mut prompter).unwrap();

        assert!(details.is_complete());
        assert_eq!(details.require("org"), Ok("acme"));
        assert_eq!(details.require("otp"), Ok("123456"));
        assert_eq!(
            prompter.asked,
            vec![
                ("Organization".to_string(), false),
                ("User".to_string(), false),
                ("One-time code".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_collect_stops_at_first_failure() {
        let data_called = Arc::new(AtomicBool::new(false));
        let backend = ThreeFields {
            data_called: data_called.clone(),
        };
        let mut prompter = Scripted::new(vec![Some("acme"), None, Some("123456")]);

        let err = collect(&backend, &mut prompter).unwrap_err();

        let CollectError::Prompt { field, .. } = err;
        assert_eq!(field, "user");
        // The third field is never asked for and nothing reaches the backend.
        assert_eq!(prompter.asked.len(), 2);
        assert!(!data_called.load(Ordering::SeqCst));
    }
}
