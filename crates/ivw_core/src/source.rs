//! Source location attached to errors

use std::fmt;

/// Where an error was raised.
///
/// Build one with [`source_context!`](crate::source_context) so the module path,
/// file and line are filled in at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceContext {
    caller: &'static str,
    file: &'static str,
    line: u32,
}

impl SourceContext {
    pub const fn new(caller: &'static str, file: &'static str, line: u32) -> Self {
        Self { caller, file, line }
    }

    /// Module path of the code that raised the error
    pub fn caller(&self) -> &'static str {
        self.caller
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.caller, self.file, self.line)
    }
}

/// Capture the current module, file and line as a [`SourceContext`].
#[macro_export]
macro_rules! source_context {
    () => {
        $crate::SourceContext::new(module_path!(), file!(), line!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_captures_location() {
        let ctx = crate::source_context!();
        assert_eq!(ctx.caller(), module_path!());
        assert!(ctx.file().ends_with("source.rs"));
        assert!(ctx.line() > 0);
    }

    #[test]
    fn test_display() {
        let ctx = SourceContext::new("ivw_core::x", "x.rs", 12);
        assert_eq!(ctx.to_string(), "ivw_core::x (x.rs:12)");
    }
}
