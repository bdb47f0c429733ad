use std::str::FromStr;

use rustc_hash::FxHashMap;

use whl_normalize::ExtraName;

use crate::marker::{MarkerVariable, UnknownMarkerVariable};

/// The values marker expressions are evaluated against.
///
/// Holds the extra currently being resolved (if any) and, optionally, a fixed value for some of
/// the marker variables. Variables without a value are left open: a comparison against them
/// holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerEnvironment {
    extra: Option<ExtraName>,
    bindings: FxHashMap<MarkerVariable, String>,
}

impl MarkerEnvironment {
    /// An environment where only `extra` is bound.
    pub fn new(extra: Option<ExtraName>) -> Self {
        Self {
            extra,
            bindings: FxHashMap::default(),
        }
    }

    /// Fix the value of a variable such as `sys_platform` or `python_version`.
    ///
    /// Deprecated dotted names bind their PEP 508 counterpart.
    pub fn with_binding(
        mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<Self, MarkerEnvironmentError> {
        if name == "extra" {
            return Err(MarkerEnvironmentError::ExtraBinding);
        }
        let variable = MarkerVariable::from_str(name)?;
        self.bindings.insert(variable, value.into());
        Ok(self)
    }

    /// The same bindings, with `extra` set to the given value.
    #[must_use]
    pub fn with_extra(&self, extra: Option<ExtraName>) -> Self {
        Self {
            extra,
            bindings: self.bindings.clone(),
        }
    }

    /// The extra currently being resolved, if any.
    pub fn extra(&self) -> Option<&ExtraName> {
        self.extra.as_ref()
    }

    /// The value of the variable, if it's bound.
    pub fn get(&self, variable: MarkerVariable) -> Option<&str> {
        self.bindings.get(&variable).map(String::as_str)
    }

    /// Returns `true` if no variable other than `extra` has a value.
    pub fn is_open(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MarkerEnvironmentError {
    #[error(transparent)]
    UnknownVariable(#[from] UnknownMarkerVariable),
    #[error("`extra` can't be bound directly; request extras instead")]
    ExtraBinding,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use whl_normalize::ExtraName;

    use crate::marker::MarkerVariable;

    use super::{MarkerEnvironment, MarkerEnvironmentError};

    #[test]
    fn deprecated_names_bind_canonical_variable() {
        let env = MarkerEnvironment::new(None)
            .with_binding("sys.platform", "linux")
            .unwrap();
        assert_eq!(env.get(MarkerVariable::SysPlatform), Some("linux"));
        assert_eq!(env.get(MarkerVariable::PythonVersion), None);
    }

    #[test]
    fn rejects_unknown_and_extra() {
        let err = MarkerEnvironment::new(None)
            .with_binding("platform", "linux")
            .unwrap_err();
        insta::assert_snapshot!(err, @"Unknown marker variable `platform`");

        let err = MarkerEnvironment::new(None)
            .with_binding("extra", "dev")
            .unwrap_err();
        assert!(matches!(err, MarkerEnvironmentError::ExtraBinding));
    }

    #[test]
    fn with_extra_keeps_bindings() {
        let env = MarkerEnvironment::new(None)
            .with_binding("python_version", "3.11")
            .unwrap();
        assert!(!env.is_open());
        let dev = env.with_extra(Some(ExtraName::from_str("dev").unwrap()));
        assert_eq!(dev.extra().map(ExtraName::as_str), Some("dev"));
        assert_eq!(dev.get(MarkerVariable::PythonVersion), Some("3.11"));
        assert!(MarkerEnvironment::new(None).is_open());
    }
}
