use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock};

/// Replaced with the working directory of the benchmark process.
pub const CWD_TOKEN: &str = "$(CWD)";

/// Replaced with the PID of a timed out child, only inside timeout commands.
pub const PID_TOKEN: &str = "%pid%";

type WorkingDirSource = dyn Fn() -> String + Send + Sync;

/// Expands the symbolic placeholders that may appear in user supplied strings.
///
/// The working directory is looked up lazily, on first use, and cached for the lifetime of the
/// resolver. Clones share the cache, so the orchestrator creates one resolver and passes it down.
#[derive(Clone)]
pub struct VariableResolver {
    working_dir: Arc<OnceLock<String>>,
    source: Arc<WorkingDirSource>,
}

impl Default for VariableResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for VariableResolver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableResolver")
            .field("working_dir", &self.working_dir.get())
            .finish()
    }
}

impl VariableResolver {
    /// Resolve `$(CWD)` against the current directory of this process.
    pub fn new() -> Self {
        Self::from_source(|| match std::env::current_dir() {
            Ok(dir) => dir.display().to_string(),
            Err(e) => {
                log::warn!("Could not read the current working directory: {e}");
                String::new()
            }
        })
    }

    /// Resolve `$(CWD)` against a fixed directory.
    pub fn with_working_dir(working_dir: impl Into<String>) -> Self {
        let working_dir = working_dir.into();
        Self::from_source(move || working_dir.clone())
    }

    /// Resolve `$(CWD)` with a custom lookup. The lookup runs at most once per resolver.
    pub fn from_source<F>(source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            working_dir: Arc::new(OnceLock::new()),
            source: Arc::new(source),
        }
    }

    pub fn working_dir(&self) -> &str {
        self.working_dir.get_or_init(|| (self.source)())
    }

    /// Replace every `$(CWD)` in `value`.
    pub fn resolve(&self, value: &str) -> String {
        if !value.contains(CWD_TOKEN) {
            return value.to_string();
        }

        value.replace(CWD_TOKEN, self.working_dir())
    }

    /// Replace every `$(CWD)` and every `%pid%` in `value`.
    pub fn resolve_with_pid(&self, value: &str, pid: u32) -> String {
        self.resolve(value).replace(PID_TOKEN, &pid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn replaces_every_cwd_token() {
        let resolver = VariableResolver::with_working_dir("/work");

        assert_eq!("/work/bin", resolver.resolve("$(CWD)/bin"));
        assert_eq!(
            "--in /work/a --out /work/b",
            resolver.resolve("--in $(CWD)/a --out $(CWD)/b")
        );
        assert_eq!("no tokens", resolver.resolve("no tokens"));
    }

    #[test]
    fn pid_is_only_replaced_on_request() {
        let resolver = VariableResolver::with_working_dir("/work");

        assert_eq!("kill %pid%", resolver.resolve("kill %pid%"));
        assert_eq!("kill -9 4242", resolver.resolve_with_pid("kill -9 %pid%", 4242));
        assert_eq!(
            "/work/dump 7 7",
            resolver.resolve_with_pid("$(CWD)/dump %pid% %pid%", 7)
        );
    }

    #[test]
    fn default_resolver_uses_process_working_dir() {
        let resolver = VariableResolver::new();
        let cwd = std::env::current_dir().unwrap().display().to_string();

        assert_eq!(format!("{cwd}/bin"), resolver.resolve("$(CWD)/bin"));
    }

    #[test]
    fn working_dir_is_looked_up_once_across_threads() {
        let lookups = Arc::new(AtomicUsize::new(0));
        let resolver = {
            let lookups = lookups.clone();
            VariableResolver::from_source(move || {
                lookups.fetch_add(1, Ordering::SeqCst);
                "/shared".to_string()
            })
        };

        let handles = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                std::thread::spawn(move || resolver.resolve("$(CWD)/bin"))
            })
            .collect::<Vec<_>>();

        for handle in handles {
            assert_eq!("/shared/bin", handle.join().unwrap());
        }
        assert_eq!("/shared/x", resolver.resolve("$(CWD)/x"));
        assert_eq!(1, lookups.load(Ordering::SeqCst));
    }

    #[test]
    fn lookup_is_lazy() {
        let lookups = Arc::new(AtomicUsize::new(0));
        let resolver = {
            let lookups = lookups.clone();
            VariableResolver::from_source(move || {
                lookups.fetch_add(1, Ordering::SeqCst);
                "/lazy".to_string()
            })
        };

        resolver.resolve("plain");
        assert_eq!(0, lookups.load(Ordering::SeqCst));
        resolver.resolve("$(CWD)");
        assert_eq!(1, lookups.load(Ordering::SeqCst));
    }
}
