//! Attribute schemas and the validator that checks definitions against them.
use crate::logging::Log;

/// Supported and compulsory attribute names for one resource kind.
///
/// Every compulsory attribute is also supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Attributes a definition may provide.
    pub supported: &'static [&'static str],
    /// Attributes a definition must provide.
    pub compulsory: &'static [&'static str],
}

impl Schema {
    /// Check `provided` attribute names against this schema.
    ///
    /// Logs every offending attribute through `log`.
    #[must_use]
    pub fn validate(&self, provided: &[&str], log: &dyn Log) -> bool {
        validate_attributes(provided, self.supported, self.compulsory, log)
    }
}

/// Returns `true` iff every name in `provided` is in `supported` and every
/// name in `compulsory` is in `provided`.
///
/// Never fails; each unknown or missing attribute is reported as a warning.
#[must_use]
pub fn validate_attributes(
    provided: &[&str],
    supported: &[&str],
    compulsory: &[&str],
    log: &dyn Log,
) -> bool {
    let mut valid = true;

    for name in provided.iter().filter(|name| !supported.contains(name)) {
        log.warn(&format!("attribute '{name}' is not supported"));
        valid = false;
    }

    for name in compulsory.iter().filter(|name| !provided.contains(name)) {
        log.warn(&format!("compulsory attribute '{name}' is not provided"));
        valid = false;
    }

    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogEntry, MemoryLog};
    use crate::resources::ResourceKind;

    const SUPPORTED: &[&str] = &["type", "packages", "state"];
    const COMPULSORY: &[&str] = &["type", "packages"];

    #[test]
    fn exact_compulsory_set_is_valid() {
        let log = MemoryLog::new();
        assert!(validate_attributes(&["type", "packages"], SUPPORTED, COMPULSORY, &log));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn optional_attribute_is_valid() {
        let log = MemoryLog::new();
        assert!(validate_attributes(
            &["packages", "state", "type"],
            SUPPORTED,
            COMPULSORY,
            &log
        ));
    }

    #[test]
    fn unknown_attribute_is_named() {
        let log = MemoryLog::new();
        assert!(!validate_attributes(
            &["type", "packages", "colour"],
            SUPPORTED,
            COMPULSORY,
            &log
        ));
        assert_eq!(
            log.entries(),
            vec![LogEntry::Warn("attribute 'colour' is not supported".to_string())]
        );
    }

    #[test]
    fn missing_compulsory_attribute_is_named() {
        let log = MemoryLog::new();
        assert!(!validate_attributes(&["type"], SUPPORTED, COMPULSORY, &log));
        assert!(log.contains("'packages' is not provided"));
    }

    #[test]
    fn every_offender_is_reported() {
        let log = MemoryLog::new();
        assert!(!validate_attributes(&["colour", "shape"], SUPPORTED, COMPULSORY, &log));
        assert_eq!(log.entries().len(), 4);
    }

    #[test]
    fn builtin_schemas_keep_compulsory_within_supported() {
        for kind in ResourceKind::ALL {
            let schema = kind.schema();
            for name in schema.compulsory {
                assert!(
                    schema.supported.contains(name),
                    "{}: compulsory '{name}' is not supported",
                    kind.as_str()
                );
            }
            assert!(schema.supported.contains(&"type"), "{} lacks 'type'", kind.as_str());
        }
    }

    #[test]
    fn builtin_schema_accepts_its_own_compulsory_set() {
        for kind in ResourceKind::ALL {
            let log = MemoryLog::new();
            assert!(kind.schema().validate(kind.schema().compulsory, &log));
        }
    }
}
