//! Changeset factories.
//!
//! A factory decides who and what a fresh changeset is attributed to. The
//! unit of work calls it when the first change of a transaction arrives.

use warden_audit_types::{Changeset, Trigger, User};

/// Produces fresh changesets carrying the ambient trigger and actors.
pub trait ChangesetFactory: Send + Sync {
    /// A new, empty changeset attributed to the current actors.
    fn create_changeset(&self) -> Changeset;
}

/// Attribution for a changeset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangesetContext {
    /// What caused the change.
    pub trigger: Trigger,
    /// Who the change is attributed to.
    pub author: Option<User>,
    /// Who acted on the author's behalf, if anyone.
    pub impersonator: Option<User>,
}

impl ChangesetContext {
    fn into_changeset(self) -> Changeset {
        Changeset::new(self.trigger)
            .with_author(self.author)
            .with_impersonator(self.impersonator)
    }
}

/// Factory for processes acting on their own: CLI tools, workers, cron jobs.
///
/// The trigger is a CLI trigger with the host name and process arguments.
/// The author is the login user. Under `sudo` the author is the target user
/// and the invoking user becomes the impersonator. Both are identified by
/// login name.
#[derive(Debug, Clone)]
pub struct SystemChangesetFactory {
    context: ChangesetContext,
}

impl SystemChangesetFactory {
    /// Inspect the current process.
    pub fn new() -> Self {
        let host = hostname::get().ok().and_then(|h| h.into_string().ok());
        Self::from_parts(host, std::env::args().collect(), |var| std::env::var(var).ok())
    }

    /// Build from explicit parts; `env` resolves environment variables.
    pub fn from_parts<F>(host: Option<String>, argv: Vec<String>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let login_user = |name: String| User::new(name.clone()).with_name(name);
        let author = env("USER").or_else(|| env("LOGNAME")).map(login_user);
        let impersonator = env("SUDO_USER").map(login_user);

        Self {
            context: ChangesetContext {
                trigger: Trigger::Cli { host, argv },
                author,
                impersonator,
            },
        }
    }

    /// Attribution given to every changeset.
    pub fn context(&self) -> &ChangesetContext {
        &self.context
    }
}

impl Default for SystemChangesetFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangesetFactory for SystemChangesetFactory {
    fn create_changeset(&self) -> Changeset {
        self.context.clone().into_changeset()
    }
}

/// Factory asking a closure for the current context, e.g. the request being
/// served.
pub struct ContextChangesetFactory {
    context: Box<dyn Fn() -> ChangesetContext + Send + Sync>,
}

impl ContextChangesetFactory {
    /// Factory calling `context` for every new changeset.
    pub fn new<F>(context: F) -> Self
    where
        F: Fn() -> ChangesetContext + Send + Sync + 'static,
    {
        Self {
            context: Box::new(context),
        }
    }

    /// Factory attributing every changeset to `context`.
    pub fn fixed(context: ChangesetContext) -> Self {
        Self::new(move || context.clone())
    }
}

impl ChangesetFactory for ContextChangesetFactory {
    fn create_changeset(&self) -> Changeset {
        (self.context)().into_changeset()
    }
}

impl std::fmt::Debug for ContextChangesetFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextChangesetFactory").finish_non_exhaustive()
    }
}
