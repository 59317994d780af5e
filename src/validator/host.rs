//! Host-declared constants the checker validates against

use serde::{Deserialize, Serialize};

/// The running platform and its mandatory features
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Operating system (e.g. `linux`, `win32`, `macosx`)
    pub os: String,

    /// Windowing system (e.g. `gtk`, `win32`, `cocoa`)
    pub ws: String,

    /// Processor architecture (e.g. `x86_64`, `x86`, `aarch64`)
    pub arch: String,

    /// Plugin ids that must always be contributed by some feature
    pub bootstrap_plugins: Vec<String>,

    /// Feature id that must always be configured
    pub primary_feature: String,
}

impl Host {
    pub fn new(os: impl Into<String>, ws: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            ws: ws.into(),
            arch: arch.into(),
            bootstrap_plugins: Vec::new(),
            primary_feature: String::new(),
        }
    }

    /// The platform this process runs on, in update-site naming
    pub fn current() -> Self {
        Self::new(current_os(), current_ws(), current_arch())
            .with_bootstrap_plugins(["org.eclipse.core.boot", "org.eclipse.core.runtime"])
            .with_primary_feature("org.eclipse.platform")
    }

    pub fn with_bootstrap_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bootstrap_plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_primary_feature(mut self, id: impl Into<String>) -> Self {
        self.primary_feature = id.into();
        self
    }
}

fn current_os() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win32",
        "macos" => "macosx",
        other => other,
    }
}

fn current_ws() -> &'static str {
    match std::env::consts::OS {
        "windows" => "win32",
        "macos" => "cocoa",
        "linux" | "freebsd" | "openbsd" | "netbsd" | "solaris" => "gtk",
        _ => "unknown",
    }
}

fn current_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86" => "x86",
        "powerpc" => "ppc",
        "powerpc64" => "ppc64",
        other => other,
    }
}

/// Optional checks beyond the core constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Installs must carry non-blank license text
    pub require_license: bool,
}
