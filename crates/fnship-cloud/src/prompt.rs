//! Operator interaction

use crate::error::Result;

/// Asks the operator to make a decision.
///
/// Implementations return [`CloudError::UserAborted`](crate::CloudError::UserAborted)
/// when the operator cancels the prompt.
pub trait Prompter: Send + Sync {
    /// Pick one of `options`; returns its index
    fn choose_one(&self, label: &str, options: &[String]) -> Result<usize>;

    /// Yes/no question
    fn confirm(&self, label: &str) -> Result<bool>;
}

/// Answers every confirmation with yes and delegates choices
pub struct AssumeYes<P> {
    inner: P,
}

impl<P: Prompter> AssumeYes<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: Prompter> Prompter for AssumeYes<P> {
    fn choose_one(&self, label: &str, options: &[String]) -> Result<usize> {
        self.inner.choose_one(label, options)
    }

    fn confirm(&self, label: &str) -> Result<bool> {
        tracing::debug!("Assuming yes: {}", label);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloudError;

    struct Refuses;

    impl Prompter for Refuses {
        fn choose_one(&self, _label: &str, _options: &[String]) -> Result<usize> {
            Err(CloudError::UserAborted)
        }

        fn confirm(&self, _label: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_assume_yes_confirms_and_delegates_choices() {
        let prompter = AssumeYes::new(Refuses);
        assert!(prompter.confirm("Deploy?").unwrap());
        assert!(matches!(
            prompter.choose_one("API", &["a".to_string()]),
            Err(CloudError::UserAborted)
        ));
    }
}
