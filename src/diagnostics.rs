//! Sinks for non-fatal assembly problems.

use crate::error::Error;

/// Receives errors that do not abort an assembly.
///
/// The assembler calls [`report`](Diagnostics::report) once per skipped item
/// (unsupported image, missing image file, unreadable cover) and carries on.
pub trait Diagnostics {
    fn report(&mut self, error: Error);
}

/// Forwards every report to `log::warn!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, error: Error) {
        log::warn!("{error}");
    }
}

/// Collects reports for later inspection.
impl Diagnostics for Vec<Error> {
    fn report(&mut self, error: Error) {
        log::debug!("collected diagnostic: {error}");
        self.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_vec_collects_reports() {
        let mut sink: Vec<Error> = Vec::new();
        sink.report(Error::MissingImage("a.png".into()));
        sink.report(Error::MissingImage("b.png".into()));
        assert_eq!(sink.len(), 2);
        assert!(sink.iter().all(|e| e.kind() == ErrorKind::ResourceMissing));
    }
}
