use std::fmt;
use std::io::Write;

/// Which output stream a diagnostic belongs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Notice,
}

/// One finding from link validation.
///
/// `document` is the site-relative path of the page containing the link,
/// `href` the link as written and `path` the site path it was checked as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The target page does not exist.
    BrokenLink {
        document: String,
        href: String,
        path: String,
    },
    /// The link is marked `.nolink` but its target page exists now.
    /// `path` is the existing page, without the marker.
    StalePending {
        document: String,
        href: String,
        path: String,
    },
    /// The link is marked `.nolink` and the page it waits for is missing.
    /// `path` is the page to create, without the marker.
    CreatablePage { document: String, path: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::BrokenLink { .. } | Diagnostic::StalePending { .. } => Severity::Warning,
            Diagnostic::CreatablePage { .. } => Severity::Notice,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BrokenLink {
                document,
                href,
                path,
            } => write!(f, "Warning: [{document}] href \"{href} ({path})\" not found."),
            Diagnostic::StalePending {
                document,
                href,
                path,
            } => write!(
                f,
                "Warning: [nolinked {document}] href \"{href} ({path})\" found."
            ),
            Diagnostic::CreatablePage { document, path } => {
                write!(f, "Note: You can create {path} for {document}.")
            }
        }
    }
}

/// Receives link diagnostics as they are found.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in memory.
impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Writes warnings to stderr and notices to stdout, one line each.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioSink;

impl DiagnosticSink for StdioSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let result = match diagnostic.severity() {
            Severity::Warning => writeln!(std::io::stderr().lock(), "{diagnostic}"),
            Severity::Notice => writeln!(std::io::stdout().lock(), "{diagnostic}"),
        };
        if let Err(e) = result {
            log::error!("failed to write diagnostic: {e}");
        }
    }
}
